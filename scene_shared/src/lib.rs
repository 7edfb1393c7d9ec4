//! `scene_shared`
//!
//! The scene command core, used by both server and client.
//!
//! Design goals:
//! - Never block the host's tick; everything here is synchronous and bounded.
//! - The scene host is injected, never global.
//! - The registry maps ids to handles and never owns entities.
//! - No `unsafe`.

pub mod apply;
pub mod assets;
pub mod config;
pub mod dispatch;
pub mod ecs;
pub mod error;
pub mod host;
pub mod math;
pub mod protocol;
pub mod registry;
pub mod scene;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::config::*;
    pub use crate::dispatch::*;
    pub use crate::error::*;
    pub use crate::host::*;
    pub use crate::math::*;
    pub use crate::protocol::*;
    pub use crate::registry::*;
    pub use crate::scene::*;
}
