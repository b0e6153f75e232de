//! Diagnostic commands, registered only when debug mode is on

use tracing::info;

use crate::application::AppState;
use crate::error::CommandError;
use crate::interpreter::{Builtin, CommandRegistry};
use crate::toolkit::MessageKind;

pub fn register(registry: &mut CommandRegistry) {
    registry.register(
        "debug-info",
        Builtin::new("log and show the size of every collection", debug_info),
    );
    registry.register(
        "debug-controls",
        Builtin::new("log every control with its kind and value", debug_controls),
    );
}

pub fn debug_info(app: &mut AppState, _args: &[String]) -> Result<(), CommandError> {
    let summary = app.summary();
    info!(
        controls = app.controls.len(),
        display_areas = app.display_areas.len(),
        popups = app.popups.len(),
        styles = app.styles.len(),
        exec_bindings = app.exec_bindings.len(),
        event_bindings = app.event_bindings.len(),
        headless = app.headless,
        "debug info"
    );
    let title = app.text("debug_info");
    app.show_message(MessageKind::Info, &title, &summary);
    Ok(())
}

pub fn debug_controls(app: &mut AppState, _args: &[String]) -> Result<(), CommandError> {
    let mut names: Vec<&String> = app.controls.keys().collect();
    names.sort();
    for name in names {
        let id = app.controls[name];
        info!(
            control = %name,
            %id,
            kind = ?app.toolkit().kind(id),
            value = ?app.toolkit().value(id),
            "control"
        );
    }
    Ok(())
}
