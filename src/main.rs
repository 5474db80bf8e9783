//! ikichat CLI binary entry point.

use clap::Parser;
use ikichat::cli::{self, Cli};
use ikichat::config::ChatConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match ChatConfig::load() {
        Ok(config) => cli::run(cli.command, config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::debug!(category = ?e.category(), error = %e, "ikichat exited with an error");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
