use std::io::Write;

use crate::commands::builtin_registry;
use crate::config::Config;
use crate::error::{LoadError, ParseError};
use crate::interpreter::{CommandRegistry, Instruction, ScriptLoader};

fn registry() -> CommandRegistry {
    builtin_registry(&Config::default())
}

#[test]
fn test_only_directive_lines_are_collected() {
    let registry = registry();
    let script = ScriptLoader::new(&registry).load_str(
        "# a comment\n\
         \n\
         menu window main 400 300 Demo\n\
         this line is prose\n\
         menuitem is not a directive\n\
         menu   # directive comment\n\
         menu control button ok text=OK\n",
    );

    let verbs: Vec<&str> = script.instructions.iter().map(|i| i.verb.as_str()).collect();
    assert_eq!(verbs, vec!["window", "control"]);
    assert_eq!(script.instructions[0].line, 3);
    assert_eq!(script.instructions[1].line, 7);
    assert!(script.skipped.is_empty());
}

#[test]
fn test_aliases_are_canonicalized_and_quotes_removed() {
    let registry = registry();
    let script = ScriptLoader::new(&registry)
        .load_str("menu WIN main 400 300 \"My App\"\nmenu ctrl label title text=\"Hello World\"\n");

    assert_eq!(
        script.instructions[0],
        Instruction {
            verb: "window".to_string(),
            args: vec!["main", "400", "300", "My App"]
                .into_iter()
                .map(String::from)
                .collect(),
            line: 1,
        }
    );
    assert_eq!(script.instructions[1].verb, "control");
    assert_eq!(script.instructions[1].args[2], "text=Hello World");
}

#[test]
fn test_unknown_verbs_are_kept_for_the_engine() {
    let registry = registry();
    let script = ScriptLoader::new(&registry).load_str("menu frobnicate a b\n");
    assert_eq!(script.instructions.len(), 1);
    assert_eq!(script.instructions[0].verb, "frobnicate");
}

#[test]
fn test_show_stops_collection() {
    let registry = registry();
    let script = ScriptLoader::new(&registry).load_str(
        "menu window main 400 300 Demo\n\
         menu show\n\
         menu control button late text=Late\n\
         menu style late bg=red\n",
    );

    assert_eq!(script.instructions.len(), 1);
    assert_eq!(script.show.as_ref().map(|show| show.line), Some(2));
    assert_eq!(script.ignored_after_show, 2);
}

#[test]
fn test_invalid_utf8_line_is_skipped() {
    let registry = registry();
    let mut bytes = b"menu window main 400 300 Demo\n".to_vec();
    bytes.extend_from_slice(b"menu control label \xff\xfe\n");
    bytes.extend_from_slice(b"menu style box bg=blue\n");

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&bytes).unwrap();

    let script = ScriptLoader::new(&registry).load_file(file.path()).unwrap();
    assert_eq!(script.instructions.len(), 2);
    assert_eq!(script.skipped, vec![ParseError::InvalidEncoding { line: 2 }]);
}

#[test]
fn test_missing_file_is_not_found() {
    let registry = registry();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.menu");

    match ScriptLoader::new(&registry).load_file(&path) {
        Err(LoadError::NotFound { path: reported }) => assert_eq!(reported, path),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn test_digest_identifies_script_content() {
    let registry = registry();
    let loader = ScriptLoader::new(&registry);
    let first = loader.load_str("menu window main 400 300 Demo\n");
    let same = loader.load_str("menu window main 400 300 Demo\n");
    let other = loader.load_str("menu window main 500 300 Demo\n");

    assert_eq!(first.digest.len(), 64);
    assert_eq!(first.digest, same.digest);
    assert_ne!(first.digest, other.digest);
}

#[test]
fn test_unterminated_quote_still_tokenizes() {
    let registry = registry();
    let script = ScriptLoader::new(&registry).load_str("menu control label t text=\"open ended\n");
    assert_eq!(script.instructions.len(), 1);
    assert_eq!(script.instructions[0].args, vec!["label", "t", "text=open ended"]);
}

#[test]
fn test_instruction_tokens() {
    let instruction = Instruction::new("Control", ["button", "ok"]);
    assert_eq!(instruction.verb, "control");
    assert_eq!(instruction.tokens(), vec!["control", "button", "ok"]);
    assert_eq!(instruction.line, 0);
}
