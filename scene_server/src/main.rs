//! Standalone server binary.
//!
//! Usage:
//!   cargo run -p scene_server -- [--addr 0.0.0.0:12345] [--tick-hz 60] [--config server.json]
//!
//! The server polls for a client once per tick, applies each received JSON
//! command to a headless in-memory scene and replies with the object id or an
//! error string.
//!
//! Console commands:
//!   status  - Show server status
//!   list    - List registered objects
//!   kick    - Drop the current client
//!   quit    - Shutdown server

use std::env;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use scene_server::server::SceneServer;
use scene_shared::{config::ServerConfig, scene::InMemoryScene};
use tokio::sync::mpsc;
use tracing::info;

struct Args {
    config: Option<PathBuf>,
    addr: Option<String>,
    tick_hz: Option<u32>,
}

fn parse_args() -> Args {
    let mut parsed = Args {
        config: None,
        addr: None,
        tick_hz: None,
    };
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                parsed.config = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--addr" if i + 1 < args.len() => {
                parsed.addr = Some(args[i + 1].clone());
                i += 2;
            }
            "--tick-hz" if i + 1 < args.len() => {
                parsed.tick_hz = args[i + 1].parse().ok();
                i += 2;
            }
            _ => i += 1,
        }
    }
    parsed
}

fn load_config(args: &Args) -> anyhow::Result<ServerConfig> {
    let mut cfg = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(addr) = &args.addr {
        cfg.listen_addr = addr.clone();
    }
    if let Some(hz) = args.tick_hz {
        cfg.tick_hz = hz;
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = load_config(&parse_args())?;
    info!(addr = %cfg.listen_addr, tick_hz = cfg.tick_hz, id_strategy = ?cfg.id_strategy, "Starting server");

    let host = InMemoryScene::with_assets(&cfg.assets).with_capacity_limit(cfg.max_entities);
    let mut server = SceneServer::bind(cfg, host)
        .await
        .context("create server")?;
    let local = server.local_addr()?;
    info!(%local, "Server listening");

    // Set up console input channel.
    let (console_tx, console_rx) = mpsc::channel::<String>(32);
    server.set_console_input(console_rx);

    // Spawn stdin reader thread.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("] ");
            let _ = stdout.flush();
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    println!("Server ready. Type 'status' for info, 'list' for objects, 'quit' to exit.");
    println!();

    server.run().await?;

    let host = server.shutdown();
    let stats = host.stats();
    info!(
        spawned = stats.spawned,
        destroyed = stats.destroyed,
        alive = host.entity_count(),
        "Scene closed"
    );
    Ok(())
}
