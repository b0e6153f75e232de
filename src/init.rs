//! Session setup
//!
//! `InitBuilder` wires the command registry, the API registry, the toolkit,
//! the UI task queue and the background runtime into a `Session`, the one
//! object embedders and the CLI drive.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use menu_core::InitBuilder;
//!
//! let mut session = InitBuilder::new().init()?;
//! let report = session.run_file("demo.menu".as_ref())?;
//! println!("{}", report.summary());
//! session.fire("submit", "click")?;
//! session.wait_idle(Duration::from_secs(5));
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiRegistry, HttpTransport, ReqwestTransport, RemoteCaller};
use crate::application::AppState;
use crate::commands::builtin_registry;
use crate::config::Config;
use crate::error::{CommandError, DispatchError, LoadError};
use crate::interpreter::{actions, CommandRegistry, Engine, PluginBus, RunReport, Script, ScriptLoader};
use crate::parser::tokenize;
use crate::runtime::{ui_channel, EventLoop, UiHandle};
use crate::toolkit::{HeadlessToolkit, Toolkit};

/// Options for building a session
pub struct InitOptions {
    /// Explicit configuration; loaded from file and environment when absent
    pub config: Option<Config>,

    /// GUI collaborator; the headless toolkit when absent
    pub toolkit: Option<Box<dyn Toolkit>>,

    /// HTTP collaborator; reqwest when absent
    pub transport: Option<Arc<dyn HttpTransport>>,

    /// External command bus for phase 2
    pub plugins: Option<Arc<dyn PluginBus>>,

    /// Start the background runtime for remote calls
    pub remote_calls: bool,

    /// Worker threads of the background runtime
    pub worker_threads: usize,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            config: None,
            toolkit: None,
            transport: None,
            plugins: None,
            remote_calls: true,
            worker_threads: 2,
        }
    }
}

/// Builder for constructing a `Session`
#[derive(Default)]
pub struct InitBuilder {
    options: InitOptions,
}

impl InitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: Config) -> Self {
        self.options.config = Some(config);
        self
    }

    pub fn toolkit(mut self, toolkit: Box<dyn Toolkit>) -> Self {
        self.options.toolkit = Some(toolkit);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.options.transport = Some(transport);
        self
    }

    pub fn plugin_bus(mut self, bus: Arc<dyn PluginBus>) -> Self {
        self.options.plugins = Some(bus);
        self
    }

    /// Run without a background runtime; API buttons report an error
    pub fn offline(mut self) -> Self {
        self.options.remote_calls = false;
        self
    }

    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.options.worker_threads = threads.max(1);
        self
    }

    pub fn init(self) -> Result<Session> {
        Session::new(self.options)
    }
}

/* ===================== Session ===================== */

pub struct Session {
    state: AppState,
    engine: Engine,
    events: EventLoop,
    ui: UiHandle,
    runtime: Option<Runtime>,
}

impl Session {
    pub fn builder() -> InitBuilder {
        InitBuilder::new()
    }

    fn new(options: InitOptions) -> Result<Self> {
        let config = match options.config {
            Some(config) => config,
            None => Config::load().context("failed to load configuration")?,
        };

        let registry = Arc::new(builtin_registry(&config));
        for (alias, canonical) in registry.dangling_aliases() {
            warn!(alias = %alias, canonical = %canonical, "alias points at an unregistered command");
        }

        let apis = Arc::new(ApiRegistry::new());
        let toolkit = options
            .toolkit
            .unwrap_or_else(|| Box::new(HeadlessToolkit::new()));
        let (ui, events) = ui_channel(config.ui.resize_debounce());
        let mut state = AppState::new(config.clone(), Arc::clone(&registry), Arc::clone(&apis), toolkit);

        let runtime = if options.remote_calls {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(options.worker_threads)
                .thread_name("menu-remote")
                .enable_all()
                .build()
                .context("failed to start the background runtime")?;

            let transport: Arc<dyn HttpTransport> = match options.transport {
                Some(transport) => transport,
                None => Arc::new(
                    ReqwestTransport::new(config.api.connection_timeout())
                        .context("failed to build the HTTP client")?,
                ),
            };
            let client = Arc::new(ApiClient::new(
                Arc::clone(&apis),
                transport,
                config.api.timeout(),
                config.api.connection_timeout(),
            ));
            state.attach_remote(RemoteCaller::new(client, runtime.handle().clone(), ui.clone()));
            Some(runtime)
        } else {
            None
        };

        let mut engine = Engine::new(registry);
        if let Some(bus) = options.plugins {
            engine = engine.with_plugin_bus(bus);
        }

        info!(
            commands = engine.registry().len(),
            remote_calls = runtime.is_some(),
            "session ready"
        );
        Ok(Self {
            state,
            engine,
            events,
            ui,
            runtime,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        self.engine.registry()
    }

    /// Sender for posting work onto the loop thread
    pub fn ui_handle(&self) -> &UiHandle {
        &self.ui
    }

    /* ===================== Scripts ===================== */

    pub fn load_file(&self, path: &Path) -> Result<Script, LoadError> {
        ScriptLoader::new(self.registry()).load_file(path)
    }

    pub fn run_file(&mut self, path: &Path) -> Result<RunReport, LoadError> {
        let script = self.load_file(path)?;
        Ok(self.run_script(script))
    }

    pub fn run_source(&mut self, source: &str) -> RunReport {
        let script = ScriptLoader::new(self.registry()).load_str(source);
        self.run_script(script)
    }

    pub fn run_script(&mut self, script: Script) -> RunReport {
        let report = self.engine.run(&mut self.state, script.instructions);
        match script.show {
            Some(show) => debug!(line = show.line, "show reached"),
            None => debug!("script has no show command"),
        }
        report
    }

    /// Execute one command line directly; unknown verbs are errors here
    pub fn execute_line(&mut self, line: &str) -> Result<(), DispatchError> {
        let tokens = tokenize(line);
        let Some((verb, args)) = tokens.split_first() else {
            return Ok(());
        };
        let registry = Arc::clone(self.registry());
        registry.execute(verb, &mut self.state, args)
    }

    /* ===================== Events ===================== */

    /// Fire an event on a named widget; returns how many callbacks ran
    pub fn fire(&mut self, widget: &str, event: &str) -> Result<usize, CommandError> {
        actions::fire_event(&mut self.state, widget, event)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.events.resize(&mut self.state, width, height);
    }

    /// Apply queued UI tasks
    pub fn pump(&mut self) -> usize {
        self.events.pump(&mut self.state)
    }

    /// Pump until background calls finish; false on timeout
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        if self.runtime.is_none() {
            self.pump();
            return true;
        }
        self.events.wait_idle(&mut self.state, timeout)
    }
}
