use anyhow::Result;
use clap::Parser;
use vigil_config::LfdConfig;

/// Local Fault Detector for the vigil replicated counter service.
#[derive(Parser)]
#[command(name = "vigil-lfd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Overrides `HEARTBEAT_INTERVAL_SECS`.
    #[arg(long)]
    heartbeat_interval_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    if let Some(secs) = cli.heartbeat_interval_secs {
        std::env::set_var("HEARTBEAT_INTERVAL_SECS", secs.to_string());
    }

    let config = LfdConfig::from_env()?;
    vigil_lfd::run(config).await?;
    Ok(())
}
