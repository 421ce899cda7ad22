// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use clap::Parser;
use cli::{Cli, Commands};

mod cli;
mod commands;
mod logging;

fn main() {
    let args = Cli::parse();

    let _logger = match logging::init(&args.log_level) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    match run(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(2);
        }
    }
}

/// Returns `false` when the command ran but its check did not pass.
fn run(args: &Cli) -> Result<bool> {
    match &args.command {
        Commands::Inspect(inspect) => commands::inspect(inspect)?,
        Commands::Claim { input, field } => commands::claim(input, field)?,
        Commands::HasRole { input, roles, all } => {
            return commands::has_role(input, roles, *all);
        }
        Commands::Checkpoints { directives, format } => {
            commands::checkpoints(directives, *format)?
        }
        Commands::Version => {
            println!(
                "{} {} (core {})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                claimgate_core::version()
            );
        }
    }

    Ok(true)
}
