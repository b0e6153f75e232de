pub mod api;
pub mod application;
pub mod cli;
pub mod codegen;
pub mod commands;
pub mod config;
pub mod error;
pub mod init;
pub mod interpreter;
pub mod language;
pub mod logging;
pub mod parser;
pub mod runtime;
pub mod toolkit;

// Re-export the types most embedders touch
pub use application::AppState;
pub use config::Config;
pub use error::{CommandError, DispatchError, LoadError, ParseError};
pub use interpreter::{CommandRegistry, Engine, Instruction, RunReport, Script, ScriptLoader};

// Re-export init API for convenience
pub use init::{InitBuilder, InitOptions, Session};
