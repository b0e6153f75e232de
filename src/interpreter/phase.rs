//! Execution phases and the per-run report

use serde::Serialize;

/// Engine phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Basic,
    Plugin,
    Popup,
    ExecBindings,
    EventBindings,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Basic,
        Phase::Plugin,
        Phase::Popup,
        Phase::ExecBindings,
        Phase::EventBindings,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Basic => "basic commands",
            Phase::Plugin => "plugin commands",
            Phase::Popup => "popup commands",
            Phase::ExecBindings => "exec bindings",
            Phase::EventBindings => "event bindings",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedInstruction {
    pub phase: Phase,
    pub line: usize,
    pub verb: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    /// Instructions handed to the engine
    pub total: usize,
    /// Instructions attempted, successful or not
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Verbs with no handler
    pub unresolved: usize,
    pub plugin_dispatched: usize,
    pub exec_bound: usize,
    pub events_bound: usize,
    pub failures: Vec<FailedInstruction>,
}

impl RunReport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{}/{} instructions processed ({} ok, {} failed, {} unknown), {} exec bindings, {} event bindings",
            self.processed,
            self.total,
            self.succeeded,
            self.failed,
            self.unresolved,
            self.exec_bound,
            self.events_bound
        )
    }
}
