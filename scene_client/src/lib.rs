//! `scene_client`
//!
//! Client-side helpers:
//! - `CommandClient`: one TCP connection, one JSON command, one reply
//! - Random create payloads for populating a scene

pub mod client;
pub mod payload;

pub use client::{CommandClient, Reply};
