use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use icap_client::config::Config;
use icap_client::scanner::Scanner;
use icap_client::IcapError;

#[derive(Parser)]
#[command(name = "icap-client")]
#[command(about = "Scan files through an ICAP antivirus service", long_about = None)]
struct Cli {
    /// YAML configuration file (overrides ICAP_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// ICAP service URI, e.g. icap://127.0.0.1:1344/avscan
    #[arg(short, long)]
    url: Option<String>,

    /// Per-file scan deadline in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Files to scan
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    if let Some(url) = &cli.url {
        cfg = cfg.with_url(url)?;
    }
    if let Some(secs) = cli.timeout {
        cfg.scan.timeout_secs = secs;
    }

    tokio::select! {
        res = run(&cfg, &cli.files) => res,

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            Ok(ExitCode::from(130))
        }
    }
}

async fn run(cfg: &Config, files: &[PathBuf]) -> anyhow::Result<ExitCode> {
    let mut scanner = Scanner::connect(cfg).await?;
    let mut all_clean = true;

    for path in files {
        match scanner.scan_file(path).await {
            Ok(true) => println!("CLEAN     {}", path.display()),
            Ok(false) => {
                all_clean = false;
                println!("INFECTED  {}", path.display());
            }
            Err(e) => {
                all_clean = false;
                match e.downcast_ref::<IcapError>() {
                    Some(icap) if icap.is_rejection() => {
                        println!("REJECTED  {}", path.display());
                    }
                    _ => {
                        tracing::error!(file = %path.display(), error = %e, "scan failed");
                        println!("ERROR     {}", path.display());
                    }
                }
            }
        }
    }

    Ok(if all_clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
