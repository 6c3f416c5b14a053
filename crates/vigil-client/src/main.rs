use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use vigil_client::{ActiveClient, Body, PassiveClient};
use vigil_config::ClientConfig;
use vigil_types::ReplicationMode;

/// Client workload driver for the vigil replicated counter service.
///
/// Reads one operation per line from stdin (`increase`, `decrease`,
/// `update`, `ping`, or `exit`) and prints each reply. The concrete CLI
/// wrapper is intentionally minimal (§1): this binary exists to exercise
/// the replication protocols, not to be a polished front-end.
#[derive(Parser)]
#[command(name = "vigil-client")]
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

    let config = ClientConfig::from_env()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    match config.mode {
        ReplicationMode::Active => {
            let client = ActiveClient::connect(&config);
            while let Some(line) = lines.next_line().await? {
                let Some(make_body) = parse_op(&line) else { break };
                if let Some(make_body) = make_body {
                    match client.send_op(make_body).await {
                        Ok(envelope) => println!("{}: {:?}", envelope.component_id, envelope.body),
                        Err(e) => println!("error: {e}"),
                    }
                }
            }
            client.send_exit();
        }
        ReplicationMode::Passive => {
            let client = PassiveClient::connect(&config);
            while let Some(line) = lines.next_line().await? {
                let Some(make_body) = parse_op(&line) else { break };
                if let Some(make_body) = make_body {
                    match client.send_op(make_body).await {
                        Ok(envelope) => println!("{}: {:?}", envelope.component_id, envelope.body),
                        Err(e) => println!("error: {e}"),
                    }
                }
            }
            client.send_exit().await;
        }
    }

    Ok(())
}

/// Parses one workload line.
///
/// - `None` (outer): the line was `exit` — caller stops reading input.
/// - `Some(None)`: a blank or unrecognized line — skip, keep reading.
/// - `Some(Some(ctor))`: a valid op; `ctor` builds its [`Body`] once a
///   `request_number` has been assigned.
fn parse_op(line: &str) -> Option<Option<fn(u64) -> Body>> {
    match line.trim() {
        "increase" => Some(Some(|n| Body::Increase { request_number: n })),
        "decrease" => Some(Some(|n| Body::Decrease { request_number: n })),
        "update" => Some(Some(|n| Body::Update { request_number: n })),
        "ping" => Some(Some(|n| Body::Ping { request_number: n })),
        "exit" => None,
        "" => Some(None),
        other => {
            println!("unrecognized operation: {other:?}");
            Some(None)
        }
    }
}
