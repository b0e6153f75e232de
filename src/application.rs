//! Shared application state
//!
//! One `AppState` is threaded through every handler invocation. It holds the
//! named UI collections a script builds up, the toolkit that renders them and
//! the shared registries.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::{ApiRegistry, RemoteCaller};
use crate::codegen;
use crate::config::Config;
use crate::error::CommandError;
use crate::interpreter::expressions::Val;
use crate::interpreter::{CommandRegistry, Instruction};
use crate::language::LanguageManager;
use crate::parser::ParamMap;
use crate::toolkit::{MessageKind, Placement, Toolkit, WidgetId};

/// Zero-argument state methods reachable from binding actions as `name()`
pub const BUILTIN_METHODS: [&str; 4] = [
    "generate_code_view",
    "show_summary",
    "clear_status",
    "close_popups",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridConfig {
    pub rows: u32,
    pub columns: u32,
    pub row_weights: Vec<u32>,
    pub column_weights: Vec<u32>,
    pub pad: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventBinding {
    pub widget: String,
    pub event: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowInfo {
    pub name: String,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub id: WidgetId,
}

/// Absolute geometry captured when adaptive layout was switched on
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveLayout {
    pub base_width: u32,
    pub base_height: u32,
    pub originals: BTreeMap<String, (i32, i32, Option<u32>, Option<u32>)>,
}

pub struct AppState {
    pub controls: HashMap<String, WidgetId>,
    pub styles: HashMap<String, ParamMap>,
    pub grid: Option<GridConfig>,
    pub display_areas: HashMap<String, WidgetId>,
    /// Button name to shell command templates
    pub exec_bindings: BTreeMap<String, Vec<String>>,
    pub event_bindings: Vec<EventBinding>,
    pub popups: HashMap<String, WidgetId>,
    /// Popup name to the controls created inside it
    pub popup_members: HashMap<String, Vec<String>>,
    /// Instructions of the last engine run
    pub instructions: Vec<Instruction>,
    /// Values stored by API results with a bare target name
    pub variables: BTreeMap<String, serde_json::Value>,
    pub window: Option<WindowInfo>,
    pub status_bar: Option<WidgetId>,
    pub toolbar: Option<WidgetId>,
    pub adaptive: Option<AdaptiveLayout>,
    pub language: LanguageManager,
    /// True once window creation fell back to the headless toolkit
    pub headless: bool,
    /// Nesting of `執行指令` calls currently on the stack
    pub(crate) command_depth: usize,
    config: Config,
    toolkit: Box<dyn Toolkit>,
    commands: Arc<CommandRegistry>,
    apis: Arc<ApiRegistry>,
    remote: Option<RemoteCaller>,
}

impl AppState {
    pub fn new(
        config: Config,
        commands: Arc<CommandRegistry>,
        apis: Arc<ApiRegistry>,
        toolkit: Box<dyn Toolkit>,
    ) -> Self {
        Self {
            controls: HashMap::new(),
            styles: HashMap::new(),
            grid: None,
            display_areas: HashMap::new(),
            exec_bindings: BTreeMap::new(),
            event_bindings: Vec::new(),
            popups: HashMap::new(),
            popup_members: HashMap::new(),
            instructions: Vec::new(),
            variables: BTreeMap::new(),
            window: None,
            status_bar: None,
            toolbar: None,
            adaptive: None,
            language: LanguageManager::new(&config.ui.language),
            headless: false,
            command_depth: 0,
            config,
            toolkit,
            commands,
            apis,
            remote: None,
        }
    }

    /* ===================== Collaborators ===================== */

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn toolkit(&self) -> &dyn Toolkit {
        self.toolkit.as_ref()
    }

    pub fn toolkit_mut(&mut self) -> &mut dyn Toolkit {
        self.toolkit.as_mut()
    }

    /// Switch to `toolkit` after the GUI went away
    ///
    /// Widget ids from the old toolkit mean nothing to the new one, so every
    /// collection holding them is dropped.
    pub fn fall_back_to(&mut self, toolkit: Box<dyn Toolkit>) {
        let stale = self.controls.len() + self.display_areas.len() + self.popups.len();
        if stale > 0 {
            warn!(
                controls = self.controls.len(),
                display_areas = self.display_areas.len(),
                popups = self.popups.len(),
                "widgets created before the toolkit switch were dropped"
            );
        }
        self.controls.clear();
        self.display_areas.clear();
        self.popups.clear();
        self.popup_members.clear();
        self.status_bar = None;
        self.toolbar = None;
        self.window = None;
        self.toolkit = toolkit;
        self.headless = true;
    }

    pub fn commands(&self) -> Arc<CommandRegistry> {
        Arc::clone(&self.commands)
    }

    pub fn apis(&self) -> &Arc<ApiRegistry> {
        &self.apis
    }

    pub fn remote(&self) -> Option<&RemoteCaller> {
        self.remote.as_ref()
    }

    pub fn attach_remote(&mut self, remote: RemoteCaller) {
        self.remote = Some(remote);
    }

    /* ===================== Collections ===================== */

    /// Destroy every script-created widget and reset the collections
    pub fn clear(&mut self) {
        let doomed: Vec<WidgetId> = self
            .controls
            .values()
            .chain(self.display_areas.values())
            .chain(self.popups.values())
            .copied()
            .collect();
        for id in doomed {
            // Controls inside a destroyed popup are already gone
            if let Err(err) = self.toolkit.destroy(id) {
                debug!(%id, error = %err, "widget already destroyed");
            }
        }

        self.controls.clear();
        self.styles.clear();
        self.grid = None;
        self.display_areas.clear();
        self.exec_bindings.clear();
        self.event_bindings.clear();
        self.popups.clear();
        self.popup_members.clear();
        self.variables.clear();
        self.adaptive = None;

        let ready = self.text("ready");
        self.set_status(&ready);
        info!("application state cleared");
    }

    /// Destroy one popup and forget the controls created inside it
    pub fn close_popup(&mut self, name: &str) -> bool {
        let Some(id) = self.popups.remove(name) else {
            return false;
        };
        for member in self.popup_members.remove(name).unwrap_or_default() {
            self.controls.remove(&member);
        }
        if let Err(err) = self.toolkit.destroy(id) {
            warn!(popup = name, error = %err, "failed to destroy popup");
        }
        debug!(popup = name, "popup closed");
        true
    }

    /// Controls first, then display areas, then popups
    pub fn lookup_widget(&self, name: &str) -> Result<WidgetId, CommandError> {
        self.controls
            .get(name)
            .or_else(|| self.display_areas.get(name))
            .or_else(|| self.popups.get(name))
            .copied()
            .ok_or_else(|| CommandError::UnknownControl(name.to_string()))
    }

    pub fn read_widget(&self, name: &str) -> Option<String> {
        let id = self.lookup_widget(name).ok()?;
        self.toolkit.value(id)
    }

    /// Current value of every readable control and display area
    pub fn control_values(&self) -> HashMap<String, String> {
        self.controls
            .iter()
            .chain(self.display_areas.iter())
            .filter_map(|(name, id)| Some((name.clone(), self.toolkit.value(*id)?)))
            .collect()
    }

    /// Every widget name the script defined, sorted
    pub fn widget_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .controls
            .keys()
            .chain(self.display_areas.keys())
            .chain(self.popups.keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Scope for binding expressions: control values plus `app`
    pub fn evaluation_context(&self) -> HashMap<String, Val> {
        let mut scope: HashMap<String, Val> = self
            .control_values()
            .into_iter()
            .map(|(name, value)| (name, Val::Str(value)))
            .collect();

        let mut controls: Vec<String> = self.controls.keys().cloned().collect();
        controls.sort();
        let mut popups: Vec<String> = self.popups.keys().cloned().collect();
        popups.sort();

        let mut app = BTreeMap::new();
        let title = self
            .window
            .as_ref()
            .map(|window| window.title.clone())
            .unwrap_or_default();
        app.insert("title".to_string(), Val::Str(title));
        app.insert(
            "controls".to_string(),
            Val::List(controls.into_iter().map(Val::Str).collect()),
        );
        app.insert(
            "popups".to_string(),
            Val::List(popups.into_iter().map(Val::Str).collect()),
        );
        app.insert(
            "language".to_string(),
            Val::Str(self.language.current().to_string()),
        );
        app.insert("headless".to_string(), Val::Bool(self.headless));
        app.insert(
            "vars".to_string(),
            Val::Obj(
                self.variables
                    .iter()
                    .map(|(name, value)| (name.clone(), Val::from_json(value)))
                    .collect(),
            ),
        );
        scope.insert("app".to_string(), Val::Obj(app));
        scope
    }

    /* ===================== Builtin Methods ===================== */

    /// Run a builtin method; `None` if no method has that name
    pub fn call_builtin(&mut self, name: &str) -> Option<Result<(), CommandError>> {
        let result = match name {
            "generate_code_view" => codegen::show_code_view(self, None),
            "show_summary" => {
                let title = self.text("summary");
                let body = self.summary();
                self.show_message(MessageKind::Info, &title, &body);
                Ok(())
            }
            "clear_status" => {
                self.set_status("");
                Ok(())
            }
            "close_popups" => {
                let mut names: Vec<String> = self.popups.keys().cloned().collect();
                names.sort();
                for popup in names {
                    self.close_popup(&popup);
                }
                Ok(())
            }
            _ => return None,
        };
        Some(result)
    }

    pub fn summary(&self) -> String {
        format!(
            "controls: {}, display areas: {}, popups: {}, styles: {}, exec bindings: {}, event bindings: {}, instructions: {}, apis: {}",
            self.controls.len(),
            self.display_areas.len(),
            self.popups.len(),
            self.styles.len(),
            self.exec_bindings.len(),
            self.event_bindings.len(),
            self.instructions.len(),
            self.apis.count()
        )
    }

    /* ===================== UI Helpers ===================== */

    pub fn text(&self, key: &str) -> String {
        self.language.get_text(key)
    }

    pub fn set_status(&mut self, text: &str) {
        if let Some(id) = self.status_bar {
            if let Err(err) = self.toolkit.set_text(id, text) {
                debug!(error = %err, "status bar update failed");
            }
        }
    }

    pub fn show_message(&mut self, kind: MessageKind, title: &str, body: &str) {
        self.toolkit.show_message(kind, title, body);
    }

    /// Record a new window size and rescale adaptive controls
    pub fn relayout(&mut self, width: u32, height: u32) {
        if let Some(window) = self.window.as_mut() {
            window.width = width;
            window.height = height;
        }
        let Some(adaptive) = &self.adaptive else {
            return;
        };
        if adaptive.base_width == 0 || adaptive.base_height == 0 {
            return;
        }

        let sx = f64::from(width) / f64::from(adaptive.base_width);
        let sy = f64::from(height) / f64::from(adaptive.base_height);
        let scale = |v: f64, s: f64| (v * s).round();

        let mut placements = Vec::new();
        for (name, (x, y, w, h)) in &adaptive.originals {
            let Some(id) = self.controls.get(name).copied() else {
                continue;
            };
            placements.push((
                id,
                Placement::Absolute {
                    x: scale(f64::from(*x), sx) as i32,
                    y: scale(f64::from(*y), sy) as i32,
                    width: w.map(|w| scale(f64::from(w), sx) as u32),
                    height: h.map(|h| scale(f64::from(h), sy) as u32),
                },
            ));
        }

        for (id, placement) in placements {
            if let Err(err) = self.toolkit.place(id, placement) {
                warn!(%id, error = %err, "adaptive relayout failed");
            }
        }
        debug!(width, height, "layout rescaled");
    }
}
