//! Execution engine
//!
//! Runs loaded instructions against one `AppState` in five phases:
//!
//! 1. basic commands, in script order
//! 2. commands owned by an attached plugin bus
//! 3. popup commands: every `popup-window`, then every `popup-content`,
//!    then every `popup-send-data`
//! 4. exec bindings recorded in phase 1 are bound to their buttons
//! 5. event bindings recorded in phase 1 are bound to their widgets
//!
//! A failing instruction is logged and counted; the run always continues.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::loader::Instruction;
use super::phase::{FailedInstruction, Phase, RunReport};
use super::registry::{invoke_guarded, CommandRegistry};
use crate::application::AppState;
use crate::commands::popup::{POPUP_CONTENT, POPUP_SEND_DATA, POPUP_WINDOW};
use crate::error::CommandError;
use crate::toolkit::{bind_click, toolkit_event, Callback};

/// Verbs held back until the popup phase, in execution order
pub const POPUP_VERBS: [&str; 3] = [POPUP_WINDOW, POPUP_CONTENT, POPUP_SEND_DATA];

/* ===================== Plugin Bus ===================== */

/// External command bus consulted in phase 2
pub trait PluginBus: Send + Sync {
    fn recognizes(&self, verb: &str) -> bool;

    fn execute(&self, verb: &str, app: &mut AppState, args: &[String]) -> Result<(), CommandError>;
}

/* ===================== Engine ===================== */

pub struct Engine {
    registry: Arc<CommandRegistry>,
    plugins: Option<Arc<dyn PluginBus>>,
}

impl Engine {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self {
            registry,
            plugins: None,
        }
    }

    pub fn with_plugin_bus(mut self, bus: Arc<dyn PluginBus>) -> Self {
        self.plugins = Some(bus);
        self
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Run every phase; the instructions become the state's loaded list
    pub fn run(&self, app: &mut AppState, instructions: Vec<Instruction>) -> RunReport {
        app.instructions = instructions;
        let instructions = app.instructions.clone();
        let mut report = RunReport::new(instructions.len());

        for phase in Phase::ALL {
            debug!(phase = phase.label(), "phase started");
            match phase {
                Phase::Basic => self.run_basic(app, &instructions, &mut report),
                Phase::Plugin => self.run_plugins(app, &instructions, &mut report),
                Phase::Popup => self.run_popups(app, &instructions, &mut report),
                Phase::ExecBindings => self.bind_exec(app, &mut report),
                Phase::EventBindings => self.bind_events(app, &mut report),
            }
        }

        info!(
            processed = report.processed,
            total = report.total,
            failed = report.failed,
            unresolved = report.unresolved,
            "script executed"
        );
        report
    }

    fn is_plugin_verb(&self, verb: &str) -> bool {
        match &self.plugins {
            Some(bus) => !self.registry.has(verb) && bus.recognizes(verb),
            None => false,
        }
    }

    fn run_basic(&self, app: &mut AppState, instructions: &[Instruction], report: &mut RunReport) {
        for instruction in instructions {
            if POPUP_VERBS.contains(&instruction.verb.as_str()) || self.is_plugin_verb(&instruction.verb) {
                continue;
            }
            self.dispatch(app, instruction, Phase::Basic, report);
        }
    }

    fn run_plugins(&self, app: &mut AppState, instructions: &[Instruction], report: &mut RunReport) {
        let Some(bus) = &self.plugins else {
            return;
        };

        for instruction in instructions.iter().filter(|i| self.is_plugin_verb(&i.verb)) {
            report.processed += 1;
            report.plugin_dispatched += 1;
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                bus.execute(&instruction.verb, app, &instruction.args)
            }))
            .unwrap_or_else(|_| Err(CommandError::Panicked("plugin command panicked".to_string())));
            Self::record(instruction, Phase::Plugin, result, report);
        }
    }

    fn run_popups(&self, app: &mut AppState, instructions: &[Instruction], report: &mut RunReport) {
        for verb in POPUP_VERBS {
            for instruction in instructions.iter().filter(|i| i.verb == verb) {
                self.dispatch(app, instruction, Phase::Popup, report);
            }
        }
    }

    fn dispatch(&self, app: &mut AppState, instruction: &Instruction, phase: Phase, report: &mut RunReport) {
        report.processed += 1;
        let Some(handler) = self.registry.resolve(&instruction.verb) else {
            report.unresolved += 1;
            return;
        };
        let result = invoke_guarded(handler.as_ref(), app, &instruction.args);
        Self::record(instruction, phase, result, report);
    }

    fn record(
        instruction: &Instruction,
        phase: Phase,
        result: Result<(), CommandError>,
        report: &mut RunReport,
    ) {
        match result {
            Ok(()) => report.succeeded += 1,
            Err(err) => {
                error!(
                    verb = %instruction.verb,
                    args = ?instruction.args,
                    line = instruction.line,
                    error = %err,
                    "command failed"
                );
                report.failed += 1;
                report.failures.push(FailedInstruction {
                    phase,
                    line: instruction.line,
                    verb: instruction.verb.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    fn bind_exec(&self, app: &mut AppState, report: &mut RunReport) {
        let bindings: Vec<(String, Vec<String>)> = app
            .exec_bindings
            .iter()
            .map(|(button, templates)| (button.clone(), templates.clone()))
            .collect();

        for (button, templates) in bindings {
            let Some(id) = app.controls.get(&button).copied() else {
                warn!(button = %button, "exec binding target not found");
                continue;
            };
            match bind_click(app.toolkit_mut(), id, Callback::Exec(templates)) {
                Ok(()) => report.exec_bound += 1,
                Err(err) => warn!(button = %button, error = %err, "failed to bind exec commands"),
            }
        }
    }

    fn bind_events(&self, app: &mut AppState, report: &mut RunReport) {
        let bindings = app.event_bindings.clone();

        for binding in bindings {
            let Ok(id) = app.lookup_widget(&binding.widget) else {
                warn!(widget = %binding.widget, "event binding target not found");
                continue;
            };
            let event = toolkit_event(&binding.event);
            match app
                .toolkit_mut()
                .bind(id, &event, Callback::Action(binding.action.clone()))
            {
                Ok(()) => {
                    debug!(widget = %binding.widget, event = %event, action = %binding.action, "event bound");
                    report.events_bound += 1;
                }
                Err(err) => warn!(widget = %binding.widget, error = %err, "failed to bind event"),
            }
        }
    }
}
