//! CLI argument parsing and subcommand dispatch.

/// Parse CLI arguments and dispatch to the appropriate subcommand.
///
/// Returns `Ok(true)` if a subcommand was handled, `Ok(false)` if `serve`
/// should be started (handled by the caller).
pub fn dispatch(args: &[String]) -> anyhow::Result<bool> {
    match args.get(1).map(|s| s.as_str()) {
        Some("serve") => Ok(false),
        _ => {
            print_usage();
            Ok(true)
        }
    }
}

fn print_usage() {
    println!("gauntlet-master — suite scheduling master");
    println!();
    println!("Usage:");
    println!("  gauntlet-master serve    Start the master HTTP server");
    println!();
    println!("Configuration is read from the environment (see .env):");
    println!("  GAUNTLET_HOST, GAUNTLET_PORT, GAUNTLET_ADVERTISED_HOST");
    println!("  GAUNTLET_HOME, GAUNTLET_CATALOG_DIR, GAUNTLET_SCHEDULER_TICK_MS");
}
