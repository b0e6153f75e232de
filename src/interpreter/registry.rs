//! Command registry
//!
//! Maps lowercased verbs to handlers, with an alias table in front of it.
//! The registry is built once at startup and shared (`Arc`) with the loader,
//! the engine and the application state.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::AppState;
use crate::error::{CommandError, DispatchError};

/* ===================== Command Trait ===================== */

/// A handler bound to a verb
///
/// Handlers receive the shared application state and the raw argument
/// tokens that followed the verb.
pub trait Command: Send + Sync {
    fn invoke(&self, app: &mut AppState, args: &[String]) -> Result<(), CommandError>;

    /// One-line help shown by `menu commands`
    fn description(&self) -> &str {
        ""
    }
}

impl<F> Command for F
where
    F: Fn(&mut AppState, &[String]) -> Result<(), CommandError> + Send + Sync,
{
    fn invoke(&self, app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
        self(app, args)
    }
}

pub type Handler = Arc<dyn Command>;

/// Plain function handler with a description
#[derive(Clone, Copy)]
pub struct Builtin {
    description: &'static str,
    run: fn(&mut AppState, &[String]) -> Result<(), CommandError>,
}

impl Builtin {
    pub const fn new(
        description: &'static str,
        run: fn(&mut AppState, &[String]) -> Result<(), CommandError>,
    ) -> Self {
        Self { description, run }
    }
}

impl Command for Builtin {
    fn invoke(&self, app: &mut AppState, args: &[String]) -> Result<(), CommandError> {
        (self.run)(app, args)
    }

    fn description(&self) -> &str {
        self.description
    }
}

/* ===================== Registry ===================== */

#[derive(Default, Clone)]
pub struct CommandRegistry {
    handlers: HashMap<String, Handler>,
    aliases: HashMap<String, String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler; an existing verb is silently replaced
    pub fn register<C: Command + 'static>(&mut self, verb: &str, handler: C) {
        self.register_arc(verb, Arc::new(handler));
    }

    pub fn register_arc(&mut self, verb: &str, handler: Handler) {
        let verb = verb.to_lowercase();
        if self.handlers.insert(verb.clone(), handler).is_some() {
            debug!(verb = %verb, "command redefined");
        }
    }

    /// Register a closure handler
    pub fn register_fn<F>(&mut self, verb: &str, handler: F)
    where
        F: Fn(&mut AppState, &[String]) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.register(verb, handler);
    }

    /// Add an alias; the target is not checked until lookup
    pub fn add_alias(&mut self, alias: &str, canonical: &str) {
        self.aliases
            .insert(alias.to_lowercase(), canonical.to_lowercase());
    }

    /// Look up a handler directly, then through the alias table
    pub fn resolve(&self, verb: &str) -> Option<Handler> {
        let verb = verb.to_lowercase();
        if let Some(handler) = self.handlers.get(&verb) {
            return Some(Arc::clone(handler));
        }
        if let Some(handler) = self
            .aliases
            .get(&verb)
            .and_then(|canonical| self.handlers.get(canonical))
        {
            return Some(Arc::clone(handler));
        }
        warn!(verb = %verb, "unknown command");
        None
    }

    /// Lowercased canonical spelling of a verb; handlers win over aliases
    pub fn canonical_name(&self, verb: &str) -> String {
        let verb = verb.to_lowercase();
        if self.handlers.contains_key(&verb) {
            return verb;
        }
        self.aliases.get(&verb).cloned().unwrap_or(verb)
    }

    /// True if the verb is a handler or an alias
    pub fn has(&self, verb: &str) -> bool {
        let verb = verb.to_lowercase();
        self.handlers.contains_key(&verb) || self.aliases.contains_key(&verb)
    }

    /// Remove a handler, or an alias if no handler has that name
    pub fn remove(&mut self, verb: &str) -> bool {
        let verb = verb.to_lowercase();
        self.handlers.remove(&verb).is_some() || self.aliases.remove(&verb).is_some()
    }

    /// Registered verbs, sorted
    pub fn list_all(&self) -> Vec<String> {
        let mut verbs: Vec<String> = self.handlers.keys().cloned().collect();
        verbs.sort();
        verbs
    }

    /// (alias, canonical) pairs, sorted by alias
    pub fn list_aliases(&self) -> Vec<(String, String)> {
        let mut aliases: Vec<(String, String)> = self
            .aliases
            .iter()
            .map(|(alias, canonical)| (alias.clone(), canonical.clone()))
            .collect();
        aliases.sort();
        aliases
    }

    /// Aliases whose target has no handler
    pub fn dangling_aliases(&self) -> Vec<(String, String)> {
        self.list_aliases()
            .into_iter()
            .filter(|(_, canonical)| !self.handlers.contains_key(canonical))
            .collect()
    }

    pub fn description(&self, verb: &str) -> Option<String> {
        self.handlers
            .get(&self.canonical_name(verb))
            .map(|handler| handler.description().to_string())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
        self.aliases.clear();
    }

    /// Resolve and invoke; an unknown verb is an error here
    pub fn execute(
        &self,
        verb: &str,
        app: &mut AppState,
        args: &[String],
    ) -> Result<(), DispatchError> {
        let handler = self.resolve(verb).ok_or_else(|| DispatchError::NotFound {
            verb: verb.to_lowercase(),
        })?;
        invoke_guarded(handler.as_ref(), app, args).map_err(|source| DispatchError::Handler {
            verb: verb.to_lowercase(),
            source,
        })
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("handlers", &self.list_all())
            .field("aliases", &self.list_aliases())
            .finish()
    }
}

/// Invoke a handler, turning a panic into `CommandError::Panicked`
pub(crate) fn invoke_guarded(
    handler: &dyn Command,
    app: &mut AppState,
    args: &[String],
) -> Result<(), CommandError> {
    match panic::catch_unwind(AssertUnwindSafe(|| handler.invoke(app, args))) {
        Ok(result) => result,
        Err(payload) => Err(CommandError::Panicked(panic_message(payload.as_ref()))),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
