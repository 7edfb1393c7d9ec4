//! Client implementation.
//!
//! Speaks the request/response protocol: write one JSON document, read one
//! plain-text reply. The server treats a single read as a whole message, so
//! the client sends each document in one write and waits for the reply
//! before sending the next.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use bytes::BytesMut;
use scene_shared::protocol::{encode_message, CommandMessage, ObjectId, ObjectPayload};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time,
};
use tracing::debug;

/// Default time to wait for a reply.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// A parsed server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The object id the command applied to.
    Ok(ObjectId),
    /// `Invalid: ...`, a client-side problem.
    Invalid(String),
    /// `Error: ...`, a host-side problem.
    Error(String),
}

impl Reply {
    pub fn parse(text: &str) -> Self {
        if let Some(reason) = text.strip_prefix("Invalid: ") {
            Reply::Invalid(reason.to_string())
        } else if let Some(reason) = text.strip_prefix("Error: ") {
            Reply::Error(reason.to_string())
        } else {
            Reply::Ok(ObjectId::from(text))
        }
    }

    pub fn id(&self) -> Option<&ObjectId> {
        match self {
            Reply::Ok(id) => Some(id),
            _ => None,
        }
    }
}

/// One connection to the command server.
pub struct CommandClient {
    stream: TcpStream,
    buf: BytesMut,
    reply_timeout: Duration,
}

impl CommandClient {
    pub async fn connect(addr: SocketAddr) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await.context("tcp connect")?;
        stream.set_nodelay(true).context("set_nodelay")?;
        Ok(Self {
            stream,
            buf: BytesMut::with_capacity(1024),
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        })
    }

    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Sends raw bytes as one message and returns the reply text.
    pub async fn send_raw(&mut self, bytes: &[u8]) -> anyhow::Result<String> {
        self.stream.write_all(bytes).await.context("tcp write")?;
        self.buf.clear();
        let n = time::timeout(self.reply_timeout, self.stream.read_buf(&mut self.buf))
            .await
            .context("timed out waiting for reply")?
            .context("tcp read")?;
        if n == 0 {
            anyhow::bail!("server closed the connection");
        }
        let text = String::from_utf8_lossy(&self.buf[..n]).into_owned();
        debug!(reply = %text, "Reply received");
        Ok(text)
    }

    /// Sends one command and returns the reply text.
    pub async fn send(&mut self, msg: &CommandMessage) -> anyhow::Result<String> {
        let bytes = encode_message(msg)?;
        self.send_raw(&bytes).await
    }

    pub async fn create(&mut self, payload: ObjectPayload) -> anyhow::Result<Reply> {
        let text = self.send(&CommandMessage::create(payload)).await?;
        Ok(Reply::parse(&text))
    }

    pub async fn update(&mut self, id: ObjectId, payload: ObjectPayload) -> anyhow::Result<Reply> {
        let text = self.send(&CommandMessage::update(id, payload)).await?;
        Ok(Reply::parse(&text))
    }

    pub async fn delete(&mut self, id: ObjectId) -> anyhow::Result<Reply> {
        let text = self.send(&CommandMessage::delete(id)).await?;
        Ok(Reply::parse(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replies_are_classified_by_prefix() {
        assert_eq!(Reply::parse("12"), Reply::Ok(ObjectId::from("12")));
        assert_eq!(
            Reply::parse("Invalid: Object not found"),
            Reply::Invalid("Object not found".to_string())
        );
        assert_eq!(
            Reply::parse("Error: Unable to create object"),
            Reply::Error("Unable to create object".to_string())
        );
        assert!(Reply::parse("Error: x").id().is_none());
    }
}
