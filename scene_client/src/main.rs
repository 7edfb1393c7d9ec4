//! Standalone client binary.
//!
//! Usage:
//!   cargo run -p scene_client -- [--addr 127.0.0.1:12345] [--count 5] [--interval-ms 1000] [--physics]
//!   cargo run -p scene_client -- [--addr 127.0.0.1:12345] --delete <object_id>
//!
//! By default the client sends `--count` randomly placed objects, each over
//! a fresh connection, and prints the server's reply for each.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use scene_client::{
    payload::{random_create_payload, PayloadOptions},
    CommandClient, Reply,
};
use scene_shared::{config::DEFAULT_PORT, protocol::ObjectId};
use tracing::{info, warn};

struct Args {
    addr: String,
    count: u32,
    interval: Duration,
    physics: bool,
    delete: Option<String>,
}

fn parse_args() -> Args {
    let mut parsed = Args {
        addr: format!("127.0.0.1:{DEFAULT_PORT}"),
        count: 5,
        interval: Duration::from_millis(1000),
        physics: false,
        delete: None,
    };
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" if i + 1 < args.len() => {
                parsed.addr = args[i + 1].clone();
                i += 2;
            }
            "--count" if i + 1 < args.len() => {
                parsed.count = args[i + 1].parse().unwrap_or(5);
                i += 2;
            }
            "--interval-ms" if i + 1 < args.len() => {
                parsed.interval = Duration::from_millis(args[i + 1].parse().unwrap_or(1000));
                i += 2;
            }
            "--delete" if i + 1 < args.len() => {
                parsed.delete = Some(args[i + 1].clone());
                i += 2;
            }
            "--physics" => {
                parsed.physics = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    parsed
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = parse_args();
    let addr: SocketAddr = args.addr.parse().context("parse --addr")?;

    if let Some(id) = args.delete {
        let mut client = CommandClient::connect(addr).await?;
        let reply = client.delete(ObjectId::new(id.clone())).await?;
        info!(object_id = %id, ?reply, "Delete sent");
        return Ok(());
    }

    let opts = PayloadOptions {
        physics: args.physics,
        ..Default::default()
    };
    let mut rng = rand::thread_rng();

    for i in 0..args.count {
        let payload = random_create_payload(&mut rng, &opts);
        info!(n = i + 1, payload = %serde_json::to_string(&payload)?, "Sending object");

        // One connection per object; the server replaces its client each time.
        let result = async {
            let mut client = CommandClient::connect(addr).await?;
            client.create(payload).await
        }
        .await;

        match result {
            Ok(Reply::Ok(id)) => info!(object_id = %id, "Object created"),
            Ok(other) => warn!(reply = ?other, "Server refused object"),
            Err(e) => warn!(error = %e, "Send failed"),
        }

        if i + 1 < args.count {
            tokio::time::sleep(args.interval).await;
        }
    }
    Ok(())
}
