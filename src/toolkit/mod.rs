//! GUI toolkit collaborator
//!
//! The interpreter never talks to a concrete widget library. It creates,
//! places, reads and writes widgets through the `Toolkit` trait and binds
//! `Callback` values, which the session turns back into actions when an
//! event fires. `HeadlessToolkit` is the in-memory implementation used for
//! headless runs and tests.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::ApiCallSpec;
use crate::commands::popup::SendDataSpec;

pub mod headless;
pub mod throttle;

pub use headless::HeadlessToolkit;
pub use throttle::ResizeThrottle;

#[cfg(test)]
mod tests;

/// Concrete event identifier for a primary button press
pub const PRIMARY_PRESS: &str = "<Button-1>";

/* ===================== Widget Model ===================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WidgetId(pub u64);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    Window,
    Popup,
    Frame,
    Button,
    Label,
    Entry,
    TextArea,
    DisplayArea,
    StatusBar,
    Toolbar,
}

impl WidgetKind {
    /// Map a `control` type token to a widget kind
    pub fn from_control_type(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "button" => Some(WidgetKind::Button),
            "entry" | "edit" => Some(WidgetKind::Entry),
            "label" | "text" => Some(WidgetKind::Label),
            "textarea" | "text-area" | "multiline" => Some(WidgetKind::TextArea),
            _ => None,
        }
    }

    /// The `control` type token that recreates this kind, if any
    pub fn control_type(&self) -> Option<&'static str> {
        match self {
            WidgetKind::Button => Some("button"),
            WidgetKind::Entry => Some("entry"),
            WidgetKind::Label => Some("label"),
            WidgetKind::TextArea => Some("textarea"),
            _ => None,
        }
    }

    /// Kinds whose current value can be read back
    pub fn is_readable(&self) -> bool {
        matches!(
            self,
            WidgetKind::Entry | WidgetKind::TextArea | WidgetKind::DisplayArea
        )
    }
}

/// Visual attributes (`bg`, `fg`, `font`, ...)
pub type Style = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSpec {
    pub kind: WidgetKind,
    /// Caption for buttons and labels, title for display areas
    pub text: String,
    pub style: Style,
}

impl WidgetSpec {
    pub fn new(kind: WidgetKind) -> Self {
        Self {
            kind,
            text: String::new(),
            style: Style::new(),
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Placement {
    Absolute {
        x: i32,
        y: i32,
        width: Option<u32>,
        height: Option<u32>,
    },
    Grid {
        row: u32,
        column: u32,
        rowspan: u32,
        columnspan: u32,
        sticky: String,
        pad: u32,
    },
    Relative {
        relx: f64,
        rely: f64,
        relwidth: Option<f64>,
        relheight: Option<f64>,
        anchor: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridAxis {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MessageKind {
    Info,
    Warning,
    Error,
}

/// A message shown to the user (dialog box in a real toolkit)
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub kind: MessageKind,
    pub title: String,
    pub body: String,
}

/// Read-only view of one widget
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSnapshot {
    pub id: WidgetId,
    pub kind: WidgetKind,
    pub parent: Option<WidgetId>,
    pub text: String,
    pub value: Option<String>,
    pub placement: Option<Placement>,
    pub style: Style,
    pub properties: BTreeMap<String, String>,
}

/* ===================== Callbacks ===================== */

/// What runs when a bound event fires
#[derive(Debug, Clone, PartialEq)]
pub enum Callback {
    /// Binding-action string, evaluated at fire time
    Action(String),
    /// Shell command templates from `exec`
    Exec(Vec<String>),
    /// Background remote call from `api呼叫`
    ApiCall(ApiCallSpec),
    /// Popup harvest from `popup-send-data button=...`
    SendData(SendDataSpec),
}

/* ===================== Errors ===================== */

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolkitError {
    #[error("GUI environment unavailable: {0}")]
    Unavailable(String),

    #[error("unknown widget {0}")]
    UnknownWidget(WidgetId),

    #[error("{kind:?} widget does not support {operation}")]
    Unsupported {
        kind: WidgetKind,
        operation: String,
    },
}

/* ===================== Toolkit Trait ===================== */

pub trait Toolkit {
    fn create_window(
        &mut self,
        title: &str,
        width: u32,
        height: u32,
        style: &Style,
    ) -> Result<WidgetId, ToolkitError>;

    /// Top-level window offset by (`x`, `y`) from its parent
    fn create_popup(
        &mut self,
        parent: Option<WidgetId>,
        title: &str,
        width: u32,
        height: u32,
        x: i32,
        y: i32,
    ) -> Result<WidgetId, ToolkitError>;

    fn create_widget(
        &mut self,
        parent: Option<WidgetId>,
        spec: &WidgetSpec,
    ) -> Result<WidgetId, ToolkitError>;

    fn place(&mut self, id: WidgetId, placement: Placement) -> Result<(), ToolkitError>;

    fn configure_grid(
        &mut self,
        parent: Option<WidgetId>,
        axis: GridAxis,
        index: u32,
        weight: u32,
    ) -> Result<(), ToolkitError>;

    /// Destroy a widget and all of its descendants
    fn destroy(&mut self, id: WidgetId) -> Result<(), ToolkitError>;

    fn kind(&self, id: WidgetId) -> Option<WidgetKind>;

    /// Current value of a readable widget
    fn value(&self, id: WidgetId) -> Option<String>;

    /// Caption or title
    fn set_text(&mut self, id: WidgetId, text: &str) -> Result<(), ToolkitError>;

    /// Replace the value of an input widget
    fn set_value(&mut self, id: WidgetId, value: &str) -> Result<(), ToolkitError>;

    /// Replace the content of a text or display area
    fn set_content(&mut self, id: WidgetId, content: &str) -> Result<(), ToolkitError>;

    fn append_content(&mut self, id: WidgetId, content: &str) -> Result<(), ToolkitError>;

    /// Generic configuration fallback for attributes without a dedicated setter
    fn set_property(&mut self, id: WidgetId, key: &str, value: &str) -> Result<(), ToolkitError>;

    fn bind(&mut self, id: WidgetId, event: &str, callback: Callback) -> Result<(), ToolkitError>;

    /// Button command; replaces any previous command
    fn set_command(&mut self, id: WidgetId, callback: Callback) -> Result<(), ToolkitError>;

    /// Deliver an event and return the callbacks it triggers, in order
    fn fire(&mut self, id: WidgetId, event: &str) -> Result<Vec<Callback>, ToolkitError>;

    fn show_message(&mut self, kind: MessageKind, title: &str, body: &str);

    /// Drain messages recorded since the last call
    fn take_messages(&mut self) -> Vec<Message>;

    fn snapshot(&self, id: WidgetId) -> Option<WidgetSnapshot>;

    /// Every live widget in creation order
    fn widgets(&self) -> Vec<WidgetSnapshot>;
}

/// Bind a click: buttons get a command, anything else a primary-press binding
pub fn bind_click(
    toolkit: &mut dyn Toolkit,
    id: WidgetId,
    callback: Callback,
) -> Result<(), ToolkitError> {
    match toolkit.kind(id) {
        Some(WidgetKind::Button) => toolkit.set_command(id, callback),
        Some(_) => toolkit.bind(id, PRIMARY_PRESS, callback),
        None => Err(ToolkitError::UnknownWidget(id)),
    }
}

/// Translate an abstract event name into the toolkit's event identifier
pub fn toolkit_event(event: &str) -> String {
    match event.to_ascii_lowercase().as_str() {
        "click" => PRIMARY_PRESS.to_string(),
        "doubleclick" => "<Double-Button-1>".to_string(),
        "keyrelease" => "<KeyRelease>".to_string(),
        _ if event.starts_with('<') => event.to_string(),
        _ => format!("<{event}>"),
    }
}
