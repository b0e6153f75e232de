use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::init::{InitBuilder, Session};
use crate::interpreter::ScriptLoader;
use crate::logging::init_logging;
use crate::toolkit::{WidgetId, WidgetSnapshot};

/// Scripts tried by `menu run` when none is given
pub const DEFAULT_SCRIPTS: [&str; 3] = ["menu.txt", "demo.menu", "scripts/demo.menu"];

#[derive(Parser)]
#[command(name = "menu")]
#[command(about = "MENU - a line-oriented GUI construction script interpreter", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides menu.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (overrides config file and env vars)
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Enable debug mode and debug commands
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load and execute a script headlessly
    Run {
        /// Script to run (default: first of menu.txt, demo.menu, scripts/demo.menu)
        script: Option<PathBuf>,

        /// Fire an event after the run, as WIDGET:EVENT (repeatable)
        #[arg(long = "fire")]
        fire: Vec<String>,

        /// Seconds to wait for background API calls
        #[arg(long, default_value = "10")]
        wait_secs: u64,

        /// Read further command lines from stdin
        #[arg(short = 'i', long)]
        interactive: bool,
    },

    /// Load a script without executing it
    Check {
        /// Script to check
        script: PathBuf,
    },

    /// List registered commands and aliases
    Commands,

    /// Print the effective configuration
    Config,
}

/// Run the CLI by parsing process arguments
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli)
}

/// Run the CLI with provided arguments
pub fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli)
}

fn run_cli_with_args(cli: Cli) -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let mut builder = Config::builder().debug(cli.debug);
    if let Some(path) = &cli.config {
        builder = builder.config_path(path);
    }
    if let Some(level) = &cli.log_level {
        builder = builder.log_level(level);
    }
    let config = builder.build()?;
    init_logging(&config);

    match cli.command {
        Commands::Run {
            script,
            fire,
            wait_secs,
            interactive,
        } => {
            let path = match script {
                Some(path) => path,
                None => find_default_script()?,
            };
            let mut session = InitBuilder::new()
                .config(config)
                .init()
                .context("failed to initialize session")?;

            let report = session
                .run_file(&path)
                .with_context(|| format!("failed to run {}", path.display()))?;
            println!("{}", report.summary());
            for failure in &report.failures {
                println!(
                    "  line {} [{}] {}: {}",
                    failure.line,
                    failure.phase.label(),
                    failure.verb,
                    failure.error
                );
            }

            for spec in &fire {
                let Some((widget, event)) = spec.split_once(':') else {
                    bail!("invalid --fire value '{spec}', expected WIDGET:EVENT");
                };
                let callbacks = session.fire(widget, event)?;
                println!("fired {event} on {widget}: {callbacks} callback(s)");
            }

            if interactive {
                read_commands(&mut session)?;
            }

            if !session.wait_idle(Duration::from_secs(wait_secs)) {
                eprintln!("warning: background calls still running after {wait_secs}s");
            }
            print_widgets(&session);
            print_messages(&mut session);
        }

        Commands::Check { script } => {
            let session = InitBuilder::new()
                .config(config)
                .offline()
                .init()
                .context("failed to initialize session")?;
            let script = ScriptLoader::new(session.registry())
                .load_file(&script)
                .with_context(|| format!("failed to load {}", script.display()))?;

            println!("digest: {}", script.digest);
            println!("instructions: {}", script.instructions.len());
            for instruction in &script.instructions {
                println!("  {:>4}  {}", instruction.line, instruction.tokens().join(" "));
            }
            if let Some(show) = &script.show {
                println!("show at line {}", show.line);
            }
            if script.ignored_after_show > 0 {
                println!("ignored after show: {}", script.ignored_after_show);
            }
            for skipped in &script.skipped {
                println!("skipped: {skipped}");
            }
        }

        Commands::Commands => {
            let session = InitBuilder::new()
                .config(config)
                .offline()
                .init()
                .context("failed to initialize session")?;
            let registry = session.registry();

            println!("Commands:");
            for verb in registry.list_all() {
                let description = registry.description(&verb).unwrap_or_default();
                println!("  {verb:<18} {description}");
            }
            println!("\nAliases:");
            for (alias, canonical) in registry.list_aliases() {
                println!("  {alias:<18} -> {canonical}");
            }
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn find_default_script() -> Result<PathBuf> {
    DEFAULT_SCRIPTS
        .iter()
        .map(Path::new)
        .find(|path| path.is_file())
        .map(Path::to_path_buf)
        .with_context(|| format!("no script given and none of {} found", DEFAULT_SCRIPTS.join(", ")))
}

/// Execute stdin lines until EOF or `exit`
fn read_commands(session: &mut Session) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("menu> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if matches!(line, "exit" | "quit") {
            break;
        }
        if let Err(err) = session.execute_line(line) {
            eprintln!("error: {err}");
        }
        session.pump();
    }
    Ok(())
}

fn print_widgets(session: &Session) {
    let state = session.state();
    let mut names: HashMap<WidgetId, &str> = HashMap::new();
    for (name, id) in state
        .controls
        .iter()
        .chain(state.display_areas.iter())
        .chain(state.popups.iter())
    {
        names.insert(*id, name);
    }

    let widgets = state.toolkit().widgets();
    let parents: HashMap<WidgetId, Option<WidgetId>> =
        widgets.iter().map(|w| (w.id, w.parent)).collect();
    let depth = |widget: &WidgetSnapshot| {
        let mut depth = 0;
        let mut parent = widget.parent;
        while let Some(id) = parent {
            depth += 1;
            parent = parents.get(&id).copied().flatten();
        }
        depth
    };

    println!("\nWidgets:");
    for widget in &widgets {
        let mut line = format!(
            "{}{:?} {}",
            "  ".repeat(depth(widget) + 1),
            widget.kind,
            widget.id
        );
        if let Some(name) = names.get(&widget.id) {
            line.push_str(&format!(" [{name}]"));
        }
        if !widget.text.is_empty() {
            line.push_str(&format!(" text={:?}", widget.text));
        }
        if let Some(value) = widget.value.as_deref().filter(|value| !value.is_empty()) {
            line.push_str(&format!(" value={value:?}"));
        }
        println!("{line}");
    }

    if !state.variables.is_empty() {
        println!("\nVariables:");
        for (name, value) in &state.variables {
            println!("  {name} = {value}");
        }
    }
}

fn print_messages(session: &mut Session) {
    let messages = session.state_mut().toolkit_mut().take_messages();
    if messages.is_empty() {
        return;
    }
    println!("\nMessages:");
    for message in messages {
        println!("  [{:?}] {}: {}", message.kind, message.title, message.body);
    }
}
