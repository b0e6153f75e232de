//! Event and exec bindings
//!
//! Both commands only record what to bind. The engine attaches the recorded
//! bindings to their widgets once every control exists.

use tracing::debug;

use super::require_args;
use crate::application::{AppState, EventBinding};
use crate::error::CommandError;

/// `binding WIDGET EVENT ACTION...`
pub fn binding(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    require_args("binding", args, 3)?;
    let binding = EventBinding {
        widget: args[0].clone(),
        event: args[1].clone(),
        action: args[2..].join(" "),
    };
    debug!(widget = %binding.widget, event = %binding.event, action = %binding.action, "event binding recorded");
    app.event_bindings.push(binding);
    Ok(())
}

/// `exec BUTTON TEMPLATE...`: each template is one shell command
pub fn exec(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    require_args("exec", args, 2)?;
    let templates = app.exec_bindings.entry(args[0].clone()).or_default();
    templates.extend(args[1..].iter().cloned());
    debug!(button = %args[0], commands = templates.len(), "exec binding recorded");
    Ok(())
}
