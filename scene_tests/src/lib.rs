//! Helpers for socket-level tests: run a headless server in the background
//! and get it back for inspection once stopped.

use std::{net::SocketAddr, time::Duration};

use scene_server::server::{bind_with, SceneServer};
use scene_shared::{config::ServerConfig, scene::InMemoryScene};
use tokio::{
    sync::oneshot::{self, error::TryRecvError},
    task::JoinHandle,
};

/// Installs a test-friendly subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

/// Localhost config on an ephemeral port.
pub fn local_config() -> ServerConfig {
    ServerConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        ..Default::default()
    }
}

/// A server ticking in a background task.
pub struct RunningServer {
    pub addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<anyhow::Result<SceneServer<InMemoryScene>>>,
}

impl RunningServer {
    /// Stops ticking and returns the server.
    pub async fn stop(self) -> anyhow::Result<SceneServer<InMemoryScene>> {
        let _ = self.stop.send(());
        self.handle.await?
    }
}

/// Binds a server with `cfg` and ticks it every millisecond until stopped.
pub async fn start_server(cfg: ServerConfig) -> anyhow::Result<RunningServer> {
    let (mut server, addr) = bind_with(cfg).await?;
    let (stop, mut stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        loop {
            match stop_rx.try_recv() {
                Err(TryRecvError::Empty) => {}
                _ => break,
            }
            server.step().await?;
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        Ok(server)
    });
    Ok(RunningServer { addr, stop, handle })
}
