//! rosdep CLI entry point
//!
//! Parses arguments, installs logging and runs the selected command. Errors
//! are rendered with suggestions and the process exits with status 1.

use anyhow::Result;
use clap::Parser;
use rosdep::cli;
use rosdep::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.init_logging();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
