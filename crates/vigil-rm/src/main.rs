use anyhow::Result;
use clap::Parser;
use vigil_config::RmConfig;

/// Replication Manager for the vigil replicated counter service.
#[derive(Parser)]
#[command(name = "vigil-rm")]
#[command(author, version, about, long_about = None)]
struct Cli {}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    Cli::parse();

    let config = RmConfig::from_env()?;
    vigil_rm::run(config).await?;
    Ok(())
}
