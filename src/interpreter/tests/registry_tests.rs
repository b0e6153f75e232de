use std::sync::Arc;

use super::helpers::test_state_with;
use crate::commands::{builtin_registry, COMMAND_ALIASES};
use crate::config::Config;
use crate::error::{CommandError, DispatchError};
use crate::interpreter::CommandRegistry;

fn recording_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register_fn("mark", |app, args| {
        app.variables
            .insert("mark".to_string(), serde_json::json!(args.join(" ")));
        Ok(())
    });
    registry
}

#[test]
fn test_every_alias_resolves_to_its_canonical_handler() {
    let registry = builtin_registry(&Config::default());
    assert_eq!(registry.list_aliases().len(), COMMAND_ALIASES.len());

    for (alias, canonical) in registry.list_aliases() {
        let via_alias = registry.resolve(&alias).unwrap();
        let direct = registry.resolve(&canonical).unwrap();
        assert!(Arc::ptr_eq(&via_alias, &direct), "{alias} -> {canonical}");
    }
    assert!(registry.dangling_aliases().is_empty());
}

#[test]
fn test_unknown_verb_resolves_to_none() {
    let registry = builtin_registry(&Config::default());
    assert!(registry.resolve("nonexistent-verb").is_none());
    assert!(!registry.has("nonexistent-verb"));
}

#[test]
fn test_lookup_is_case_insensitive() {
    let registry = builtin_registry(&Config::default());
    assert!(registry.resolve("WINDOW").is_some());
    assert!(registry.resolve("Win").is_some());
    assert_eq!(registry.canonical_name("CTRL"), "control");
    assert_eq!(registry.canonical_name("unknown"), "unknown");
}

#[test]
fn test_last_registration_wins() {
    let mut registry = recording_registry();
    registry.register_fn("mark", |app, _args| {
        app.variables
            .insert("mark".to_string(), serde_json::json!("patched"));
        Ok(())
    });
    assert_eq!(registry.len(), 1);

    let mut app = test_state_with(registry.clone());
    registry
        .execute("mark", &mut app, &["ignored".to_string()])
        .unwrap();
    assert_eq!(app.variables["mark"], "patched");
}

#[test]
fn test_execute_reports_missing_and_failing_handlers() {
    let mut registry = recording_registry();
    registry.register_fn("boom", |_app, _args| Err(CommandError::Failed("broken".to_string())));
    registry.register_fn("panics", |_app, _args| panic!("handler exploded"));
    let mut app = test_state_with(registry.clone());

    assert!(matches!(
        registry.execute("missing", &mut app, &[]),
        Err(DispatchError::NotFound { verb }) if verb == "missing"
    ));
    assert!(matches!(
        registry.execute("boom", &mut app, &[]),
        Err(DispatchError::Handler { source: CommandError::Failed(_), .. })
    ));
    match registry.execute("panics", &mut app, &[]) {
        Err(DispatchError::Handler {
            source: CommandError::Panicked(message),
            ..
        }) => assert_eq!(message, "handler exploded"),
        other => panic!("unexpected result: {other:?}"),
    }

    registry
        .execute("MARK", &mut app, &["a".to_string(), "b".to_string()])
        .unwrap();
    assert_eq!(app.variables["mark"], "a b");
}

#[test]
fn test_administrative_operations() {
    let mut registry = recording_registry();
    registry.add_alias("m", "mark");
    registry.add_alias("ghost", "nothing");

    assert!(registry.has("m"));
    assert_eq!(
        registry.dangling_aliases(),
        vec![("ghost".to_string(), "nothing".to_string())]
    );
    assert!(registry.resolve("ghost").is_none());

    assert!(registry.remove("ghost"));
    assert!(!registry.remove("ghost"));
    assert!(registry.remove("mark"));
    assert!(registry.resolve("m").is_none());
    assert_eq!(registry.list_all(), Vec::<String>::new());

    registry.clear();
    assert!(registry.is_empty());
    assert!(registry.list_aliases().is_empty());
}

#[test]
fn test_builtin_descriptions_and_debug_commands() {
    let registry = builtin_registry(&Config::default());
    assert!(registry.description("win").unwrap().contains("main window"));
    assert!(!registry.has("debug-info"));

    let config = Config {
        debug: true,
        ..Config::default()
    };
    let registry = builtin_registry(&config);
    assert!(registry.has("debug-info"));
    assert!(registry.has("debug-controls"));
}
