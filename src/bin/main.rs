/// MENU script runner
///
/// Loads a MENU script, builds its interface on the headless toolkit and
/// reports what was built. See `menu --help` for the subcommands.

use menu_core::cli;

fn main() {
    if let Err(e) = cli::run_cli() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
