use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rec_client::config::load_config;
use rec_client::observability::{logging, metrics};
use rec_client::{HostChange, RecClient};

#[derive(Parser)]
#[command(name = "rec-probe")]
#[command(about = "Inspect host health for a recommendation-service client", long_about = None)]
struct Cli {
    /// Client configuration file (TOML).
    #[arg(short, long, default_value = "rec-client.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ping every configured host once
    Ping,
    /// Run the health monitor and report host switches
    Watch {
        /// How long to watch before exiting
        #[arg(short, long, default_value_t = 30)]
        seconds: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init(&config.observability.log_level);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    match cli.command {
        Commands::Ping => {
            let client = RecClient::new(config)?;
            let mut failures = 0;
            for report in client.probe_hosts().await {
                let status = if report.healthy { "ok" } else { "FAIL" };
                if !report.healthy {
                    failures += 1;
                }
                println!("{:<40} {:<5} {:>6} ms", report.host, status, report.elapsed.as_millis());
            }
            client.shutdown();
            if failures > 0 {
                std::process::exit(1);
            }
        }
        Commands::Watch { seconds } => {
            let client = RecClient::builder(config)
                .listener(Arc::new(|change: &HostChange| println!("switch: {change}")))
                .build()?;
            println!("current: {}", client.current_host());

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(seconds)) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted");
                }
            }

            client.shutdown();
            client.stopped().await;
            let snapshot = client.monitor().snapshot();
            println!("final: {}", client.current_host());
            for (host, rate) in &snapshot.available {
                println!("  {host:<40} failure rate {rate:.3}");
            }
        }
    }

    Ok(())
}
