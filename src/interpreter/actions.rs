//! Binding actions and event callbacks
//!
//! Runs at event-fire time. A binding action is one of:
//!
//! - `name()`: a builtin state method, else a verb run with no arguments
//! - `verb arg...`: a command line run through the registry
//! - `target.attr = expression`: evaluate and assign to a widget attribute
//!
//! Nothing here propagates into the event loop: failures are logged and, for
//! user-triggered commands, shown as messages.

use std::panic::{self, AssertUnwindSafe};
use std::process::Command as Process;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::expressions::safe_eval;
use super::registry::panic_message;
use crate::api::{ApiCallSpec, ApiResponse};
use crate::application::AppState;
use crate::commands::popup;
use crate::error::CommandError;
use crate::parser::{format_template, tokenize};
use crate::toolkit::{toolkit_event, Callback, MessageKind, WidgetId, WidgetKind};

/* ===================== Binding Actions ===================== */

/// Run one binding action, logging any failure
pub fn handle_binding(app: &mut AppState, action: &str) {
    if let Err(err) = run_action(app, action) {
        error!(action, error = %err, "binding action failed");
    }
}

pub fn run_action(app: &mut AppState, action: &str) -> Result<(), CommandError> {
    let action = action.trim();
    if action.is_empty() {
        return Ok(());
    }

    if let Some(name) = action.strip_suffix("()") {
        let name = name.trim();
        if let Some(result) = app.call_builtin(name) {
            return result;
        }
        let commands = app.commands();
        if commands.has(name) {
            return Ok(commands.execute(name, app, &[])?);
        }
        warn!(method = name, "unknown binding method");
        return Ok(());
    }

    let Some((target, expression)) = action.split_once('=') else {
        let tokens = tokenize(action);
        let Some((verb, args)) = tokens.split_first() else {
            return Ok(());
        };
        let commands = app.commands();
        return Ok(commands.execute(verb, app, args)?);
    };

    let target = target.trim();
    let (widget, attr) = target.split_once('.').unwrap_or((target, "value"));
    let id = app.lookup_widget(widget.trim())?;

    let scope = app.evaluation_context();
    let Some(value) = safe_eval(expression.trim(), &scope) else {
        debug!(target, "assignment skipped");
        return Ok(());
    };
    apply_attribute(app, id, attr.trim(), &value.to_string())
}

/// Write `text` to one widget attribute
///
/// `text`, `value` and `content` have dedicated setters; any other attribute
/// goes through the generic property fallback and only warns on failure.
/// `value` on a widget without an input value lands on its caption, or on
/// its content for display areas.
pub fn apply_attribute(
    app: &mut AppState,
    id: WidgetId,
    attr: &str,
    text: &str,
) -> Result<(), CommandError> {
    let toolkit = app.toolkit_mut();
    match attr {
        "text" => toolkit.set_text(id, text)?,
        "value" => match toolkit.kind(id) {
            Some(WidgetKind::Entry | WidgetKind::TextArea) => toolkit.set_value(id, text)?,
            Some(WidgetKind::DisplayArea) => toolkit.set_content(id, text)?,
            _ => toolkit.set_text(id, text)?,
        },
        "content" => toolkit.set_content(id, text)?,
        other => {
            if let Err(err) = toolkit.set_property(id, other, text) {
                warn!(%id, attribute = other, error = %err, "unsupported attribute");
            }
        }
    }
    Ok(())
}

/// Text shown for a JSON value; strings lose their quotes
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Deliver a result to a `-> target`
///
/// `widget.attr` updates the widget; a bare name stores a state variable.
pub fn update_target(app: &mut AppState, target: &str, value: Value) -> Result<(), CommandError> {
    match target.split_once('.') {
        Some((widget, attr)) => {
            let id = app.lookup_widget(widget)?;
            apply_attribute(app, id, attr, &display_value(&value))
        }
        None => {
            debug!(variable = target, "variable stored");
            app.variables.insert(target.to_string(), value);
            Ok(())
        }
    }
}

/* ===================== Callbacks ===================== */

/// Fire an event on a named widget and run the triggered callbacks
pub fn fire_event(app: &mut AppState, widget: &str, event: &str) -> Result<usize, CommandError> {
    let id = app.lookup_widget(widget)?;
    let callbacks = app.toolkit_mut().fire(id, &toolkit_event(event))?;
    let count = callbacks.len();
    for callback in &callbacks {
        invoke_callback(app, callback);
    }
    Ok(count)
}

/// Run one callback; a panic is logged and contained
pub fn invoke_callback(app: &mut AppState, callback: &Callback) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| run_callback(app, callback))) {
        error!(panic = %panic_message(payload.as_ref()), "callback panicked");
    }
}

fn run_callback(app: &mut AppState, callback: &Callback) {
    match callback {
        Callback::Action(action) => handle_binding(app, action),
        Callback::Exec(templates) => run_exec(app, templates),
        Callback::ApiCall(spec) => start_api_call(app, spec),
        Callback::SendData(spec) => {
            if let Err(err) = popup::send_data(app, spec) {
                error!(popup = %spec.popup, error = %err, "popup data transfer failed");
            }
        }
    }
}

fn shell(command: &str) -> Process {
    #[cfg(windows)]
    {
        let mut process = Process::new("cmd");
        process.args(["/C", command]);
        process
    }
    #[cfg(not(windows))]
    {
        let mut process = Process::new("sh");
        process.args(["-c", command]);
        process
    }
}

/// Run exec templates with the current control values substituted
pub fn run_exec(app: &mut AppState, templates: &[String]) {
    let context = app.control_values();

    for template in templates {
        let command = format_template(template, &context);
        info!(command = %command, "running command");

        match shell(&command).output() {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
                let body = if stdout.is_empty() {
                    app.text("command_executed")
                } else {
                    stdout
                };
                let title = app.text("execution_result");
                app.show_message(MessageKind::Info, &title, &body);
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                error!(command = %command, status = %output.status, stderr = %stderr, "command failed");
                let title = app.text("execution_error");
                app.show_message(
                    MessageKind::Error,
                    &title,
                    &format!("{}: {}", output.status, stderr),
                );
            }
            Err(err) => {
                error!(command = %command, error = %err, "command could not start");
                let title = app.text("execution_error");
                app.show_message(MessageKind::Error, &title, &err.to_string());
            }
        }
    }
}

pub fn start_api_call(app: &mut AppState, spec: &ApiCallSpec) {
    let context = app.control_values();
    match app.remote().cloned() {
        Some(remote) => remote.spawn_call(spec, context),
        None => {
            warn!(api = %spec.api, "no background runtime attached, API call dropped");
            let title = app.text("api_error");
            app.show_message(MessageKind::Error, &title, "remote calls are not available");
        }
    }
}

/// Apply a finished API call on the loop thread
pub fn deliver_api_result(app: &mut AppState, api: &str, target: Option<&str>, response: &ApiResponse) {
    match target {
        Some(target) => {
            if let Err(err) = update_target(app, target, response.target_value()) {
                error!(api, target, error = %err, "failed to deliver API result");
            }
        }
        None => {
            let (kind, key) = if response.success {
                (MessageKind::Info, "api_result")
            } else {
                (MessageKind::Error, "api_error")
            };
            let title = app.text(key);
            app.show_message(kind, &title, &response.display_text());
        }
    }
}
