//! Test helpers for interpreter tests
//!
//! Builds application state on the headless toolkit and runs script text
//! through the real loader and engine.

use std::sync::Arc;

use crate::api::ApiRegistry;
use crate::application::AppState;
use crate::commands::builtin_registry;
use crate::config::Config;
use crate::interpreter::{CommandRegistry, Engine, RunReport, ScriptLoader};
use crate::toolkit::{HeadlessToolkit, WidgetSnapshot};

/// State with every builtin command and no remote caller
pub fn test_state() -> AppState {
    test_state_with(builtin_registry(&Config::default()))
}

pub fn test_state_with(registry: CommandRegistry) -> AppState {
    AppState::new(
        Config::default(),
        Arc::new(registry),
        Arc::new(ApiRegistry::new()),
        Box::new(HeadlessToolkit::new()),
    )
}

/// Load `source` with the state's registry and run it through every phase
pub fn run_script(app: &mut AppState, source: &str) -> RunReport {
    let registry = app.commands();
    let script = ScriptLoader::new(&registry).load_str(source);
    Engine::new(registry).run(app, script.instructions)
}

/// Snapshot of a named control, display area or popup
pub fn widget(app: &AppState, name: &str) -> WidgetSnapshot {
    let id = app
        .lookup_widget(name)
        .unwrap_or_else(|_| panic!("no widget named {name}"));
    app.toolkit()
        .snapshot(id)
        .unwrap_or_else(|| panic!("widget {name} was destroyed"))
}

/// Current value of a readable widget
pub fn value_of(app: &AppState, name: &str) -> String {
    widget(app, name).value.unwrap_or_default()
}
