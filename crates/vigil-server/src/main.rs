use anyhow::Result;
use clap::Parser;
use vigil_config::ServerConfig;

/// Server replica for the vigil replicated counter service.
#[derive(Parser)]
#[command(name = "vigil-server")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Overrides `CHECKPOINT_INTERVAL_SECS` (passive mode checkpoint
    /// cadence).
    #[arg(long)]
    checkpoint_interval_secs: Option<u64>,
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
    if let Some(secs) = cli.checkpoint_interval_secs {
        std::env::set_var("CHECKPOINT_INTERVAL_SECS", secs.to_string());
    }

    let config = ServerConfig::from_env()?;
    vigil_server::run(config).await?;
    Ok(())
}
