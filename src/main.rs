//! gamedex - Browse the game catalog from the terminal
//!
//! Looks up games through the RAWG API with a local response cache, and keeps
//! favorites, view history and a local profile on disk.

use clap::Parser;
use std::io;
use tracing_subscriber::EnvFilter;

use gamedex::app::App;
use gamedex::cli::Cli;
use gamedex::config::Config;

/// Environment variable controlling log verbosity
const LOG_ENV: &str = "GAMEDEX_LOG";

/// Sets up logging to stderr, `warn` unless `GAMEDEX_LOG` says otherwise
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    let app = App::from_config(&config)?;
    let mut stdout = io::stdout().lock();
    app.run(cli.command, &mut stdout).await?;

    Ok(())
}
