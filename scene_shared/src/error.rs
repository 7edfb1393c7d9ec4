//! Error taxonomy for command handling.
//!
//! `CommandError` is what a single request can fail with; its `response()`
//! is the exact text sent back to the client. `HostError` comes from the
//! scene host and is either fatal to one request (spawn) or local to one
//! applier (asset resolution).

use crate::{assets::AssetKind, host::EntityHandle, protocol::ObjectId};

/// Failures reported by the scene host.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    /// The host scene is gone (torn down or never started).
    #[error("World is not valid")]
    WorldUnavailable,

    #[error("spawn failed: {0}")]
    SpawnFailed(String),

    /// The handle refers to an entity the host no longer has.
    #[error("entity {0} no longer exists")]
    StaleHandle(EntityHandle),

    #[error("asset path is empty")]
    EmptyAssetPath,

    #[error("failed to load asset: {path}")]
    AssetNotFound { path: String },

    #[error("asset {path} is a {found}, expected a {expected}")]
    AssetKindMismatch {
        path: String,
        expected: AssetKind,
        found: AssetKind,
    },
}

/// Failures of one request, surfaced to the client as text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    /// The message was not a decodable command document.
    #[error("Malformed JSON ({0})")]
    Protocol(String),

    #[error("No object_id provided")]
    MissingObjectId,

    #[error("Object not found")]
    NotFound(ObjectId),

    /// The generated id was already registered when the entry was added.
    #[error("Object id {0} already in use")]
    IdInUse(ObjectId),

    #[error("Unable to create object")]
    Spawn(#[source] HostError),

    /// The host cannot serve the request at all.
    #[error(transparent)]
    Host(#[from] HostError),
}

impl CommandError {
    /// True for failures caused by the client's request rather than the host.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            CommandError::Protocol(_) | CommandError::MissingObjectId | CommandError::NotFound(_)
        )
    }

    /// Text written back to the client: `Invalid: ...` or `Error: ...`.
    pub fn response(&self) -> String {
        match self {
            CommandError::Spawn(HostError::WorldUnavailable) => {
                format!("Error: {}", HostError::WorldUnavailable)
            }
            e if e.is_client_fault() => format!("Invalid: {e}"),
            e => format!("Error: {e}"),
        }
    }
}

/// Failures of registry mutation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("object id {0} is already registered")]
    Occupied(ObjectId),
}
