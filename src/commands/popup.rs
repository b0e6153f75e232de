//! Popup windows
//!
//! The engine runs these commands after every basic command, grouped by verb:
//! all popup windows exist before any content is added, and all content
//! exists before any data is sent back.

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::layout::{create_control, place_control};
use super::require_args;
use crate::application::AppState;
use crate::error::CommandError;
use crate::interpreter::actions::update_target;
use crate::parser::{extract_target, parse_flag, parse_offset, parse_parameters, parse_size, split_keywords};
use crate::toolkit::{bind_click, Callback, WidgetId};

pub const POPUP_WINDOW: &str = "popup-window";
pub const POPUP_CONTENT: &str = "popup-content";
pub const POPUP_SEND_DATA: &str = "popup-send-data";

/// Fields to harvest from a popup and where to deliver them
#[derive(Debug, Clone, PartialEq)]
pub struct SendDataSpec {
    pub popup: String,
    pub fields: Vec<String>,
    pub target: String,
    /// Destroy the popup after harvesting
    pub close: bool,
}

fn popup_id(app: &AppState, name: &str) -> Result<WidgetId, CommandError> {
    app.popups
        .get(name)
        .copied()
        .ok_or_else(|| CommandError::UnknownPopup(name.to_string()))
}

/// `popup-window NAME TITLE... [size=WxH] [offset=X,Y]`
pub fn popup_window(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    let (positional, params) = split_keywords(args);
    require_args(POPUP_WINDOW, &positional, 1)?;
    let name = &positional[0];
    let title = if positional.len() > 1 {
        positional[1..].join(" ")
    } else {
        name.clone()
    };

    let ui = &app.config().ui;
    let (width, height) = match params.get("size") {
        Some(size) => parse_size(size).ok_or_else(|| CommandError::invalid("size", size))?,
        None => (ui.popup_width, ui.popup_height),
    };
    let (x, y) = match params.get("offset") {
        Some(offset) => parse_offset(offset).ok_or_else(|| CommandError::invalid("offset", offset))?,
        None => ui.popup_offset(),
    };

    if app.close_popup(name) {
        debug!(popup = %name, "popup window replaced");
    }
    let parent = app.window.as_ref().map(|window| window.id);
    let id = app
        .toolkit_mut()
        .create_popup(parent, &title, width, height, x, y)?;
    app.popups.insert(name.clone(), id);
    app.popup_members.insert(name.clone(), Vec::new());
    info!(popup = %name, title = %title, width, height, "popup window created");
    Ok(())
}

/// `popup-content POPUP TYPE NAME key=value...`
pub fn popup_content(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    require_args(POPUP_CONTENT, args, 3)?;
    let (popup, control_type, name) = (&args[0], &args[1], &args[2]);
    let parent = popup_id(app, popup)?;
    let params = parse_parameters(&args[3..]);

    let id = create_control(app, Some(parent), control_type, &params)?;
    place_control(app, id, &params)?;
    app.controls.insert(name.clone(), id);
    app.popup_members
        .entry(popup.clone())
        .or_default()
        .push(name.clone());
    debug!(popup = %popup, control = %name, control_type = %control_type, "popup control created");
    Ok(())
}

/// `popup-send-data POPUP FIELD[,FIELD...] -> TARGET [button=BTN] [close=true]`
///
/// With `button=` the transfer runs on that button's click, otherwise now.
pub fn popup_send_data(app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
    let (positional, params) = split_keywords(args);
    let (positional, target) = extract_target(&positional);
    let target = target.ok_or(CommandError::MissingTarget(POPUP_SEND_DATA))?;
    require_args(POPUP_SEND_DATA, &positional, 2)?;

    let spec = SendDataSpec {
        popup: positional[0].clone(),
        fields: positional[1]
            .split(',')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(str::to_string)
            .collect(),
        target,
        close: params.get("close").is_some_and(|flag| parse_flag(flag)),
    };
    popup_id(app, &spec.popup)?;

    match params.get("button") {
        Some(button) => {
            let id = app
                .controls
                .get(button)
                .copied()
                .ok_or_else(|| CommandError::UnknownControl(button.clone()))?;
            debug!(popup = %spec.popup, button = %button, "popup data transfer bound");
            bind_click(app.toolkit_mut(), id, Callback::SendData(spec))?;
            Ok(())
        }
        None => send_data(app, &spec),
    }
}

/// Copy popup field values to the transfer target
///
/// One field sends its value as a string; several send an object of
/// name to value.
pub fn send_data(app: &mut AppState, spec: &SendDataSpec) -> Result<(), CommandError> {
    popup_id(app, &spec.popup)?;

    let mut values = Map::new();
    for field in &spec.fields {
        let id = app
            .controls
            .get(field)
            .copied()
            .ok_or_else(|| CommandError::UnknownControl(field.clone()))?;
        let value = app
            .toolkit()
            .value(id)
            .or_else(|| app.toolkit().snapshot(id).map(|snapshot| snapshot.text))
            .unwrap_or_default();
        values.insert(field.clone(), Value::String(value));
    }

    let payload = match (spec.fields.as_slice(), values.len()) {
        ([field], 1) => values.remove(field).unwrap_or(Value::Null),
        _ => Value::Object(values),
    };
    update_target(app, &spec.target, payload)?;

    if spec.close {
        app.close_popup(&spec.popup);
    }
    info!(popup = %spec.popup, fields = spec.fields.len(), target = %spec.target, "popup data sent");
    Ok(())
}
