//! Tokenizer and parameter parser tests

use std::collections::HashMap;

use maplit::{btreemap, hashmap};

use super::params::*;
use super::tokenizer::*;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/* ===================== Tokenizer ===================== */

#[test]
fn test_quoted_token_keeps_embedded_space() {
    let tokens = tokenize(r#"control button b1 text="Hello World" x=10"#);
    assert_eq!(
        tokens,
        strings(&["control", "button", "b1", "text=Hello World", "x=10"])
    );
}

#[test]
fn test_prefix_is_stripped() {
    let tokens = tokenize(r#"menu window main 800 600 "My App""#);
    assert_eq!(tokens, strings(&["window", "main", "800", "600", "My App"]));
}

#[test]
fn test_prefix_requires_word_boundary() {
    assert_eq!(tokenize("menubar x"), strings(&["menubar", "x"]));
    assert!(has_directive_prefix("menu window"));
    assert!(!has_directive_prefix("menuwindow"));
}

#[test]
fn test_single_quotes() {
    let tokens = tokenize("binding b1 click 'result.text = a + b'");
    assert_eq!(
        tokens,
        strings(&["binding", "b1", "click", "result.text = a + b"])
    );
}

#[test]
fn test_blank_and_comment_lines() {
    assert!(tokenize("").is_empty());
    assert!(tokenize("    ").is_empty());
    assert!(tokenize("# a comment").is_empty());
    assert!(tokenize("menu # commented directive").is_empty());
    assert!(tokenize("menu").is_empty());
}

#[test]
fn test_hash_inside_line_is_literal() {
    assert_eq!(
        tokenize("style btn bg=#ff0000"),
        strings(&["style", "btn", "bg=#ff0000"])
    );
}

#[test]
fn test_unterminated_quote_falls_back() {
    let tokens = tokenize(r#"control label l1 text="unfinished value"#);
    assert_eq!(
        tokens,
        strings(&["control", "label", "l1", "text=unfinished value"])
    );
}

#[test]
fn test_escapes() {
    assert_eq!(tokenize(r#"a\ b c"#), strings(&["a b", "c"]));
    assert_eq!(
        tokenize(r#"say "quote \" inside""#),
        strings(&["say", "quote \" inside"])
    );
    // Unknown escapes inside double quotes keep the backslash
    assert_eq!(tokenize(r#"path "C:\dir""#), strings(&["path", r"C:\dir"]));
}

#[test]
fn test_cjk_verbs() {
    assert_eq!(
        tokenize("menu 顯示內容 output 你好"),
        strings(&["顯示內容", "output", "你好"])
    );
}

#[test]
fn test_permissive_scan_closes_open_token() {
    assert_eq!(split_permissive("a 'b c"), strings(&["a", "b c"]));
    assert_eq!(split_permissive("  x   y  "), strings(&["x", "y"]));
    assert_eq!(split_permissive("''"), strings(&[""]));
}

/* ===================== Parameters ===================== */

#[test]
fn test_only_first_equals_splits() {
    let params = parse_parameters(&["x=10", "y=20", "label=\"A=B\""]);
    assert_eq!(
        params,
        btreemap! {
            "x".to_string() => "10".to_string(),
            "y".to_string() => "20".to_string(),
            "label".to_string() => "A=B".to_string(),
        }
    );
}

#[test]
fn test_tokens_without_equals_are_ignored() {
    let params = parse_parameters(&["positional", " k ='v'"]);
    assert_eq!(params.len(), 1);
    assert_eq!(params["k"], "v");
}

#[test]
fn test_parameter_round_trip() {
    let maps = [
        btreemap! {},
        btreemap! { "x".to_string() => "10".to_string() },
        btreemap! {
            "text".to_string() => "Hello World".to_string(),
            "bg".to_string() => "#eee".to_string(),
            "w".to_string() => "".to_string(),
        },
    ];
    for map in maps {
        assert_eq!(parse_parameters(&to_tokens(&map)), map);
    }
}

#[test]
fn test_rendered_params_survive_tokenizer() {
    let map = btreemap! {
        "text".to_string() => "Hello World".to_string(),
        "font".to_string() => "Arial 12".to_string(),
    };
    let line = format!(
        "control label l1 {}",
        map.iter()
            .map(|(k, v)| render_param(k, v))
            .collect::<Vec<_>>()
            .join(" ")
    );
    let tokens = tokenize(&line);
    assert_eq!(parse_parameters(&tokens[3..]), map);
}

#[test]
fn test_split_keywords() {
    let (positional, params) = split_keywords(&["P1", "Settings", "size=300x200"]);
    assert_eq!(positional, strings(&["P1", "Settings"]));
    assert_eq!(params["size"], "300x200");
}

#[test]
fn test_extract_target() {
    let args = strings(&["btn", "api", "GET", "/x", "->", "out.text"]);
    let (rest, target) = extract_target(&args);
    assert_eq!(rest, strings(&["btn", "api", "GET", "/x"]));
    assert_eq!(target.as_deref(), Some("out.text"));

    // A dangling arrow is not a redirect
    let args = strings(&["a", "->"]);
    let (rest, target) = extract_target(&args);
    assert_eq!(rest, args);
    assert!(target.is_none());
}

#[test]
fn test_size_offset_flag() {
    assert_eq!(parse_size("800x600"), Some((800, 600)));
    assert_eq!(parse_size("800*600"), None);
    assert_eq!(parse_offset("-10, 20"), Some((-10, 20)));
    assert_eq!(parse_offset("10"), None);
    assert!(parse_flag("Yes"));
    assert!(parse_flag("1"));
    assert!(!parse_flag("off"));
}

#[test]
fn test_quote_token() {
    assert_eq!(quote_token("plain"), "plain");
    assert_eq!(quote_token("two words"), "\"two words\"");
    assert_eq!(quote_token(""), "\"\"");
    assert_eq!(tokenize(&quote_token(r#"say "hi" \ now"#)), strings(&[r#"say "hi" \ now"#]));
}

/* ===================== Templates ===================== */

#[test]
fn test_format_template() {
    let context: HashMap<String, String> = hashmap! {
        "name".to_string() => "Ada".to_string(),
        "count".to_string() => "3".to_string(),
    };
    assert_eq!(format_template("echo {name} {count}", &context), "echo Ada 3");
    assert_eq!(
        format_template(r#"{"user": "{name}", "n": {count}}"#, &context),
        r#"{"user": "Ada", "n": 3}"#
    );
    assert_eq!(format_template("echo {missing}", &context), "echo {missing}");
    assert_eq!(format_template("{ unbalanced", &context), "{ unbalanced");
}
