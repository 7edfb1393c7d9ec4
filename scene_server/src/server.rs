//! Server implementation.
//!
//! A tick-driven command server. Every tick it:
//! - drains console input,
//! - polls the listener for a new client (a new client replaces the old one),
//! - performs one bounded read on the current client and, if a message came
//!   in, dispatches it and writes the reply back.
//!
//! Nothing here waits longer than the configured poll/write timeouts, so the
//! tick never stalls on a slow or silent client.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use anyhow::Context;
use scene_shared::{
    config::ServerConfig,
    dispatch::Dispatcher,
    host::SceneHost,
    scene::InMemoryScene,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::mpsc,
    time::{self, Instant},
};
use tracing::{debug, info, warn};

/// Connection state of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// No listener (shut down).
    Idle,
    /// Listener bound, no client.
    Listening,
    /// One client connected.
    Connected,
}

/// The single active client.
struct ClientConn {
    stream: TcpStream,
    peer: SocketAddr,
    messages: u64,
}

/// What one read on the client produced.
enum ReadOutcome {
    Nothing,
    Message(usize),
    Closed(String),
}

/// Command server over an injected scene host.
pub struct SceneServer<H> {
    pub cfg: ServerConfig,
    listener: Option<TcpListener>,
    client: Option<ClientConn>,
    dispatcher: Dispatcher<H>,
    state: ServerState,
    tick: u64,
    read_buf: Vec<u8>,

    /// Channel for console commands from stdin.
    console_rx: Option<mpsc::Receiver<String>>,
    quit_requested: bool,
}

impl<H: SceneHost> SceneServer<H> {
    /// Binds the listener. Bind failure is fatal to startup.
    pub async fn bind(cfg: ServerConfig, host: H) -> anyhow::Result<Self> {
        let addr: SocketAddr = cfg.listen_addr.parse().context("parse listen_addr")?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("tcp bind {addr}"))?;
        let dispatcher = Dispatcher::from_config(host, &cfg);
        let read_buf = vec![0u8; cfg.read_buffer_size.max(1)];

        Ok(Self {
            cfg,
            listener: Some(listener),
            client: None,
            dispatcher,
            state: ServerState::Listening,
            tick: 0,
            read_buf,
            console_rx: None,
            quit_requested: false,
        })
    }

    /// Sets the console input receiver.
    pub fn set_console_input(&mut self, rx: mpsc::Receiver<String>) {
        self.console_rx = Some(rx);
    }

    /// Returns the bound address.
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        let listener = self.listener.as_ref().context("listener closed")?;
        Ok(listener.local_addr()?)
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.client.as_ref().map(|c| c.peer)
    }

    pub fn dispatcher(&self) -> &Dispatcher<H> {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher<H> {
        &mut self.dispatcher
    }

    /// True once a `quit` console command was executed.
    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Polls the listener once. A newly accepted client replaces the current
    /// one without notice. No pending connection is `Ok(None)`.
    pub async fn try_accept(&mut self, timeout: Duration) -> anyhow::Result<Option<SocketAddr>> {
        let Some(listener) = self.listener.as_ref() else {
            return Ok(None);
        };
        match time::timeout(timeout, listener.accept()).await {
            Ok(Ok((stream, peer))) => {
                if let Err(e) = stream.set_nodelay(true) {
                    debug!(%peer, error = %e, "set_nodelay failed");
                }
                if let Some(old) = self.client.take() {
                    info!(old = %old.peer, new = %peer, "Replacing previous client");
                }
                self.client = Some(ClientConn {
                    stream,
                    peer,
                    messages: 0,
                });
                self.state = ServerState::Connected;
                info!(%peer, "Client connected");
                Ok(Some(peer))
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Accept failed, retrying next tick");
                Ok(None)
            }
            Err(_) => Ok(None),
        }
    }

    /// Performs one bounded read on the current client. A non-empty read is
    /// one message; its reply is written back and returned.
    pub async fn poll_client(&mut self, timeout: Duration) -> anyhow::Result<Option<String>> {
        let Some(conn) = self.client.as_mut() else {
            return Ok(None);
        };

        let outcome = match time::timeout(timeout, conn.stream.read(&mut self.read_buf)).await {
            Err(_) => ReadOutcome::Nothing,
            Ok(Ok(0)) => ReadOutcome::Closed("closed by peer".to_string()),
            Ok(Ok(n)) => ReadOutcome::Message(n),
            Ok(Err(e)) => ReadOutcome::Closed(format!("read error: {e}")),
        };

        let n = match outcome {
            ReadOutcome::Nothing => return Ok(None),
            ReadOutcome::Closed(reason) => {
                self.disconnect(&reason);
                return Ok(None);
            }
            ReadOutcome::Message(n) => n,
        };

        conn.messages += 1;
        debug!(peer = %conn.peer, bytes = n, "Message received");
        let reply = self.dispatcher.handle_message(&self.read_buf[..n]);

        let write = time::timeout(
            self.cfg.write_timeout(),
            conn.stream.write_all(reply.as_bytes()),
        )
        .await;
        match write {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.disconnect(&format!("write error: {e}")),
            Err(_) => self.disconnect("write timed out"),
        }
        Ok(Some(reply))
    }

    /// Drops the current client, if any.
    pub fn disconnect(&mut self, reason: &str) {
        if let Some(conn) = self.client.take() {
            info!(peer = %conn.peer, messages = conn.messages, %reason, "Client disconnected");
        }
        if self.listener.is_some() {
            self.state = ServerState::Listening;
        }
    }

    /// Executes one tick.
    pub async fn step(&mut self) -> anyhow::Result<()> {
        self.process_console_commands();
        let poll = self.cfg.poll_timeout();
        self.try_accept(poll).await?;
        self.poll_client(poll).await?;
        self.tick += 1;
        Ok(())
    }

    /// Runs the server for a number of paced ticks.
    pub async fn run_for_ticks(&mut self, ticks: u32) -> anyhow::Result<()> {
        let dt = self.cfg.tick_interval();
        let mut next = Instant::now();

        for _ in 0..ticks {
            next += dt;
            self.step().await?;
            time::sleep_until(next).await;
        }
        Ok(())
    }

    /// Runs paced ticks until `quit` is entered on the console.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let dt = self.cfg.tick_interval();
        let mut next = Instant::now();

        while !self.quit_requested {
            next += dt;
            self.step().await?;
            time::sleep_until(next).await;
        }
        Ok(())
    }

    /// Closes every socket and ends the registry session. Returns the host,
    /// which still owns its entities.
    pub fn shutdown(mut self) -> H {
        self.disconnect("server shutdown");
        self.listener = None;
        self.state = ServerState::Idle;
        info!(tick = self.tick, "Server stopped");
        self.dispatcher.teardown()
    }

    fn process_console_commands(&mut self) {
        let lines: Vec<String> = if let Some(ref mut rx) = self.console_rx {
            let mut collected = Vec::new();
            while let Ok(line) = rx.try_recv() {
                collected.push(line);
            }
            collected
        } else {
            Vec::new()
        };

        for line in lines {
            for out in self.exec_console(&line) {
                println!("{out}");
            }
        }
    }

    /// Executes a console command and returns its output lines.
    pub fn exec_console(&mut self, line: &str) -> Vec<String> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&cmd) = tokens.first() else {
            return Vec::new();
        };

        match cmd {
            "status" => {
                let mut out = vec![
                    format!("Server state: {:?}", self.state),
                    format!("Tick: {}", self.tick),
                    format!("Objects: {}", self.dispatcher.registry().len()),
                ];
                if let Ok(addr) = self.local_addr() {
                    out.push(format!("Listening on: {addr}"));
                }
                if let Some(conn) = &self.client {
                    out.push(format!("Client: {} ({} messages)", conn.peer, conn.messages));
                }
                out
            }
            "list" => {
                let host = self.dispatcher.host();
                let entries = self.dispatcher.registry().sorted();
                if entries.is_empty() {
                    return vec!["No objects".to_string()];
                }
                entries
                    .into_iter()
                    .map(|(id, handle)| {
                        let state = if host.is_alive(handle) { "alive" } else { "stale" };
                        format!("  {id}: entity {handle} ({state})")
                    })
                    .collect()
            }
            "kick" => {
                if self.client.is_some() {
                    self.disconnect("kicked from console");
                    vec!["Client dropped".to_string()]
                } else {
                    vec!["No client connected".to_string()]
                }
            }
            "quit" | "exit" => {
                info!("Shutdown requested from console");
                self.quit_requested = true;
                vec!["Shutting down".to_string()]
            }
            "help" => vec!["Commands: status, list, kick, quit".to_string()],
            other => vec![format!("Unknown command: {other}")],
        }
    }
}

/// Helper for tests: a headless server bound to an ephemeral localhost port.
pub async fn bind_ephemeral() -> anyhow::Result<(SceneServer<InMemoryScene>, SocketAddr)> {
    let cfg = ServerConfig {
        listen_addr: format!("{}:{}", IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
        ..Default::default()
    };
    bind_with(cfg).await
}

/// Binds a headless server with the given config and returns its address.
pub async fn bind_with(cfg: ServerConfig) -> anyhow::Result<(SceneServer<InMemoryScene>, SocketAddr)> {
    let host = InMemoryScene::with_assets(&cfg.assets).with_capacity_limit(cfg.max_entities);
    let server = SceneServer::bind(cfg, host).await?;
    let addr = server.local_addr()?;
    Ok((server, addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn idle_tick_is_a_no_op() -> anyhow::Result<()> {
        let (mut server, _addr) = bind_ephemeral().await?;
        server.step().await?;
        server.step().await?;
        assert_eq!(server.state(), ServerState::Listening);
        assert_eq!(server.tick(), 2);
        assert!(server.dispatcher().registry().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn console_status_and_quit() -> anyhow::Result<()> {
        let (mut server, _addr) = bind_ephemeral().await?;
        let out = server.exec_console("status");
        assert!(out.iter().any(|l| l.contains("Listening")), "{out:?}");
        assert_eq!(server.exec_console("list"), vec!["No objects".to_string()]);
        assert_eq!(server.exec_console("kick"), vec!["No client connected".to_string()]);
        assert!(server.exec_console("bogus")[0].starts_with("Unknown command"));
        assert!(server.exec_console("").is_empty());

        server.exec_console("quit");
        assert!(server.quit_requested());
        let host = server.shutdown();
        assert_eq!(host.entity_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn console_lines_are_drained_each_tick() -> anyhow::Result<()> {
        let (mut server, _addr) = bind_ephemeral().await?;
        let (tx, rx) = mpsc::channel(4);
        server.set_console_input(rx);
        tx.send("quit".to_string()).await?;
        server.step().await?;
        assert!(server.quit_requested());
        Ok(())
    }

    #[tokio::test]
    async fn unparsable_listen_addr_fails_bind() -> anyhow::Result<()> {
        let bad = ServerConfig {
            listen_addr: "not an address".to_string(),
            ..Default::default()
        };
        assert!(SceneServer::bind(bad, InMemoryScene::new()).await.is_err());
        Ok(())
    }
}
