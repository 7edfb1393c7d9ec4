//! `scene_server`
//!
//! Server-side systems:
//! - Tick-driven TCP listener (one client at a time)
//! - Connection handler: one read = one JSON command, one plain-text reply
//! - Console commands (status, list, kick, quit)
//!
//! Scene mutation itself lives in `scene_shared::dispatch`.

pub mod server;

pub use server::{SceneServer, ServerState};
