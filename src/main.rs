mod cli;
mod config;
mod daemon;
mod ipc;
mod models;
mod platform;
mod publisher;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{App, Cli, Commands, DaemonCommands};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let app = App::new(cli.config)?;

    match cli.command {
        Commands::Publish(args) => {
            app.publish(&args)?;
        }
        Commands::Clear => {
            app.clear()?;
        }
        Commands::Inspect(args) => {
            app.inspect(&args)?;
        }
        Commands::Status => {
            app.status()?;
        }
        Commands::Daemon { command } => match command {
            DaemonCommands::Start => {
                app.daemon_start()?;
            }
            DaemonCommands::Stop => {
                app.daemon_stop()?;
            }
            DaemonCommands::Status => {
                app.daemon_status()?;
            }
            DaemonCommands::Run => {
                app.daemon_run()?;
            }
        },
    }

    Ok(())
}
