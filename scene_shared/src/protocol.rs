//! Wire protocol.
//!
//! One JSON document per message, one plain-text reply per message.
//! There is no framing beyond what a single socket read yields.
//!
//! Routing is by field presence: a document with `object_id` is an update,
//! one without is a create. Deletion needs the explicit
//! `"action": "delete_object"` discriminator.

use std::{borrow::Borrow, fmt};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    error::CommandError,
    math::{Rotator, Vec3},
};

/// Client-visible identifier of a scene object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for ObjectId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl Borrow<str> for ObjectId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Optional explicit action tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    AddObject,
    ModifyObject,
    DeleteObject,
    /// Any other string; routing falls back to field presence.
    #[serde(other)]
    Unknown,
}

/// `location` sub-document. Missing axes are 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LocationData {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<LocationData> for Vec3 {
    fn from(d: LocationData) -> Self {
        Vec3::new(d.x, d.y, d.z)
    }
}

/// `rotation` sub-document, degrees. Missing axes are 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RotationData {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl From<RotationData> for Rotator {
    fn from(d: RotationData) -> Self {
        Rotator::new(d.pitch, d.yaw, d.roll)
    }
}

/// `scale` sub-document. Missing axes are 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleData {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for ScaleData {
    fn default() -> Self {
        Self {
            x: 1.0,
            y: 1.0,
            z: 1.0,
        }
    }
}

impl From<ScaleData> for Vec3 {
    fn from(d: ScaleData) -> Self {
        Vec3::new(d.x, d.y, d.z)
    }
}

/// Attributes shared by create and update. Every field is optional and
/// handled by its own applier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ObjectPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<RotationData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physics: Option<bool>,
}

/// A request document as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CommandMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<ObjectId>,
    #[serde(flatten)]
    pub payload: ObjectPayload,
}

impl CommandMessage {
    pub fn create(payload: ObjectPayload) -> Self {
        Self {
            action: None,
            object_id: None,
            payload,
        }
    }

    pub fn update(id: ObjectId, payload: ObjectPayload) -> Self {
        Self {
            action: None,
            object_id: Some(id),
            payload,
        }
    }

    pub fn delete(id: ObjectId) -> Self {
        Self {
            action: Some(Action::DeleteObject),
            object_id: Some(id),
            payload: ObjectPayload::default(),
        }
    }

    /// Routes the document: explicit delete, then update when `object_id`
    /// is present, then create.
    pub fn into_command(self) -> Result<Command, CommandError> {
        match (self.action, self.object_id) {
            (Some(Action::DeleteObject), Some(id)) => Ok(Command::Delete(id)),
            (Some(Action::DeleteObject), None) | (Some(Action::ModifyObject), None) => {
                Err(CommandError::MissingObjectId)
            }
            (_, Some(id)) => Ok(Command::Update(id, self.payload)),
            (_, None) => Ok(Command::Create(self.payload)),
        }
    }
}

/// A routed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create(ObjectPayload),
    Update(ObjectId, ObjectPayload),
    Delete(ObjectId),
}

impl Command {
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Create(_) => "create",
            Command::Update(..) => "update",
            Command::Delete(_) => "delete",
        }
    }
}

/// Decodes raw message bytes. Trailing whitespace and NUL padding are
/// ignored.
pub fn decode_message(bytes: &[u8]) -> Result<CommandMessage, CommandError> {
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace() && *b != 0)
        .map_or(0, |i| i + 1);
    serde_json::from_slice(&bytes[..end]).map_err(|e| CommandError::Protocol(e.to_string()))
}

/// Encodes a request for sending.
pub fn encode_message(msg: &CommandMessage) -> anyhow::Result<Vec<u8>> {
    serde_json::to_vec(msg).context("serialize command")
}
