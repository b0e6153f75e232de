//! Script interpretation core
//!
//! `loader` turns a script into instructions, `registry` maps verbs to
//! handlers, `engine` runs the instructions in phases and `actions` evaluates
//! binding actions when events fire.

pub mod actions;
pub mod engine;
pub mod expressions;
pub mod loader;
pub mod phase;
pub mod registry;

pub use engine::{Engine, PluginBus};
pub use loader::{Instruction, Script, ScriptLoader, SHOW_VERB};
pub use phase::{FailedInstruction, Phase, RunReport};
pub use registry::{Builtin, Command, CommandRegistry, Handler};

#[cfg(test)]
mod tests;
