//! Directive line tokenizer
//!
//! Splits on whitespace outside quotes and removes the quote characters, so
//! `text="Hello World"` becomes the single token `text=Hello World`. Lines
//! with broken quoting are still tokenized by a permissive scan that closes
//! the open token at end of line.

use pest::iterators::Pair;
use pest::Parser;
use tracing::warn;

use super::{MenuParser, Rule};

/// Leading keyword that marks a script line as a directive
pub const DIRECTIVE_PREFIX: &str = "menu";

pub const COMMENT_MARKER: char = '#';

/// True when the line starts with the directive keyword followed by whitespace
pub fn has_directive_prefix(line: &str) -> bool {
    let trimmed = line.trim_start();
    match trimmed.strip_prefix(DIRECTIVE_PREFIX) {
        Some(rest) => rest.is_empty() || rest.starts_with(char::is_whitespace),
        None => false,
    }
}

/// Remove the directive keyword, if present
pub fn strip_prefix(line: &str) -> &str {
    let trimmed = line.trim_start();
    if has_directive_prefix(trimmed) {
        &trimmed[DIRECTIVE_PREFIX.len()..]
    } else {
        trimmed
    }
}

/// Tokenize one line; blank and comment lines yield no tokens
pub fn tokenize(line: &str) -> Vec<String> {
    let body = strip_prefix(line).trim();
    if body.is_empty() || body.starts_with(COMMENT_MARKER) {
        return Vec::new();
    }

    match split_strict(body) {
        Ok(tokens) => tokens,
        Err(err) => {
            warn!(line = body, error = %err.variant.message(), "malformed quoting, using permissive scan");
            split_permissive(body)
        }
    }
}

/// Shell-style split; fails on unterminated quotes or a dangling backslash
pub fn split_strict(text: &str) -> Result<Vec<String>, pest::error::Error<Rule>> {
    let mut pairs = MenuParser::parse(Rule::line, text)?;
    let Some(line) = pairs.next() else {
        return Ok(Vec::new());
    };

    Ok(line
        .into_inner()
        .filter(|pair| pair.as_rule() == Rule::token)
        .map(build_token)
        .collect())
}

fn build_token(pair: Pair<Rule>) -> String {
    let mut token = String::new();

    for piece in pair.into_inner() {
        match piece.as_rule() {
            Rule::bare => token.push_str(piece.as_str()),
            Rule::escaped => token.push_str(&piece.as_str()[1..]),
            Rule::single_quoted => {
                for inner in piece.into_inner() {
                    token.push_str(inner.as_str());
                }
            }
            Rule::double_quoted => {
                for inner in piece.into_inner() {
                    match inner.as_rule() {
                        Rule::double_text => token.push_str(inner.as_str()),
                        Rule::double_escape => {
                            // Inside double quotes only a few characters are escapable
                            let escaped = &inner.as_str()[1..];
                            match escaped {
                                "\\" | "\"" | "$" | "`" => token.push_str(escaped),
                                "\n" => {}
                                _ => token.push_str(inner.as_str()),
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    token
}

/// Character scan used when the strict split fails
pub fn split_permissive(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_token = false;

    for ch in text.chars() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_token = true;
            }
            None if ch.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(ch);
                in_token = true;
            }
        }
    }

    if in_token {
        tokens.push(current);
    }

    tokens
}
