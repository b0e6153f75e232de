//! PEST-based grammar for MENU directive lines and binding expressions
//!
//! `tokenizer` splits a directive line into shell-like tokens, `params`
//! interprets the `key=value` tail most commands accept. The expression half
//! of the grammar is consumed by `interpreter::expressions`.

use pest_derive::Parser;

pub mod params;
pub mod tokenizer;

pub use params::{
    extract_target, format_template, parse_flag, parse_offset, parse_parameters, parse_size,
    quote_token, render_param, split_keywords, to_tokens, ParamMap,
};
pub use tokenizer::{has_directive_prefix, strip_prefix, tokenize, COMMENT_MARKER, DIRECTIVE_PREFIX};

#[cfg(test)]
mod tests;

/* ===================== PEST Parser ===================== */

#[derive(Parser)]
#[grammar = "parser/menu.pest"]
pub struct MenuParser;
