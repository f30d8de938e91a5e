use anyhow::Result;
use clap::Parser;
use once_core::{ServeConfig, serve_file};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Share one file over HTTP. The link dies after the first download or after
/// the timeout (ONCE_TIMEOUT_SECS, default one day).
#[derive(Debug, Parser)]
#[command(name = "once", version)]
struct Cli {
    /// File to share
    file: PathBuf,
}

fn init_logging() {
    // stdout is reserved for the share URL
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("once_core=info,once_cli=info,access=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = ServeConfig::from_env()?;
    let server = serve_file(&cli.file, &config).await?;

    println!("{}", server.entry_url());
    server.shutdown_on_os_signal();

    let report = server.wait().await?;
    tracing::info!("Stopped: {}", report.reason);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
        Err(e) => {
            // --help / --version
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
    };

    init_logging();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
