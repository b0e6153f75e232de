//! Argument-tail helpers shared by command handlers
//!
//! Most commands take a few positional tokens followed by optional
//! `key=value` tokens and, for commands that produce a value, a trailing
//! `-> target` redirect.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

/// Parameters parsed from `key=value` tokens
pub type ParamMap = BTreeMap<String, String>;

const QUOTES: &[char] = &['"', '\''];

/// Parse `key=value` tokens into a map
///
/// Only the first `=` splits, surrounding quotes are stripped from the value
/// and tokens without `=` are ignored.
pub fn parse_parameters<S: AsRef<str>>(tokens: &[S]) -> ParamMap {
    let mut params = ParamMap::new();
    for token in tokens {
        if let Some((key, value)) = token.as_ref().split_once('=') {
            params.insert(key.trim().to_string(), value.trim_matches(QUOTES).to_string());
        }
    }
    params
}

/// Serialize a map back into `key=value` tokens (inverse of `parse_parameters`)
pub fn to_tokens(params: &ParamMap) -> Vec<String> {
    params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect()
}

/// Split tokens into positional arguments and a parameter map
pub fn split_keywords<S: AsRef<str>>(tokens: &[S]) -> (Vec<String>, ParamMap) {
    let mut positional = Vec::new();
    let mut keyword = Vec::new();
    for token in tokens {
        let token = token.as_ref();
        if token.contains('=') {
            keyword.push(token);
        } else {
            positional.push(token.to_string());
        }
    }
    (positional, parse_parameters(&keyword))
}

/// Strip a `-> target` suffix; returns the remaining args and the target
pub fn extract_target(args: &[String]) -> (Vec<String>, Option<String>) {
    if let Some(arrow) = args.iter().position(|arg| arg == "->") {
        if let Some(target) = args.get(arrow + 1) {
            return (args[..arrow].to_vec(), Some(target.clone()));
        }
    }
    (args.to_vec(), None)
}

/// Parse a `WIDTHxHEIGHT` size string
pub fn parse_size(text: &str) -> Option<(u32, u32)> {
    let (width, height) = text.trim().split_once(['x', 'X'])?;
    Some((width.trim().parse().ok()?, height.trim().parse().ok()?))
}

/// Parse an `X,Y` offset string
pub fn parse_offset(text: &str) -> Option<(i32, i32)> {
    let (x, y) = text.trim().split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

/// Interpret a yes/no style flag
pub fn parse_flag(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Quote a token so the tokenizer reads it back unchanged
pub fn quote_token(token: &str) -> String {
    let needs_quotes = token.is_empty()
        || token
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\'' || c == '\\');
    if !needs_quotes {
        return token.to_string();
    }

    let mut quoted = String::with_capacity(token.len() + 2);
    quoted.push('"');
    for ch in token.chars() {
        if matches!(ch, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

/// Render one `key=value` parameter for a script line
pub fn render_param(key: &str, value: &str) -> String {
    format!("{}={}", key, quote_token(value))
}

/// Substitute `{name}` placeholders from the context
///
/// Only braces around a plain identifier are placeholders; any other brace
/// (JSON bodies, for instance) is copied through. Placeholders with no value
/// in the context are left as written.
pub fn format_template(template: &str, context: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find('}') {
            Some(close) if is_placeholder(&after[..close]) => {
                let name = &after[..close];
                match context.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        warn!(placeholder = name, "no value for template placeholder");
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn is_placeholder(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}
