//! Configuration system.
//!
//! Loads server configuration from JSON strings or files. Every field has a
//! default so a partial document is enough.

use std::{path::Path, time::Duration};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Default TCP port the command server listens on.
pub const DEFAULT_PORT: u16 = 12345;

/// How new object ids are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Decimal count of successful creates; ids are never reused.
    #[default]
    Monotonic,
    /// Decimal of the current registry size. Can collide with a live id after
    /// a delete, in which case the create is refused.
    RegistrySize,
}

/// Asset paths the headless scene knows about at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetSeed {
    #[serde(default)]
    pub meshes: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
}

impl Default for AssetSeed {
    fn default() -> Self {
        Self {
            meshes: [
                "/Game/StarterContent/Shapes/Shape_Cube.Shape_Cube",
                "/Game/StarterContent/Shapes/Shape_Sphere.Shape_Sphere",
                "/Game/StarterContent/Shapes/Shape_Cylinder.Shape_Cylinder",
                "/Game/StarterContent/Shapes/Shape_Pipe_180.Shape_Pipe_180",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            materials: [
                "/Game/StarterContent/Materials/M_Basic_Wall.M_Basic_Wall",
                "/Game/StarterContent/Materials/M_Brick_Clay_New.M_Brick_Clay_New",
                "/Game/StarterContent/Materials/M_Metal_Steel.M_Metal_Steel",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Root configuration of the command server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address, e.g. `0.0.0.0:12345`.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Simulation tick rate; sockets are polled once per tick.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
    /// Size of the single read performed per tick. One read is one message.
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,
    /// Upper bound on how long accept/read may wait inside a tick.
    #[serde(default)]
    pub poll_timeout_ms: u64,
    /// Upper bound on writing a response before the client is dropped.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
    #[serde(default)]
    pub location_min: f32,
    #[serde(default = "default_location_max")]
    pub location_max: f32,
    #[serde(default)]
    pub id_strategy: IdStrategy,
    /// Host capacity; spawning fails once this many entities are alive.
    #[serde(default)]
    pub max_entities: Option<usize>,
    #[serde(default)]
    pub assets: AssetSeed,
}

fn default_listen_addr() -> String {
    format!("0.0.0.0:{DEFAULT_PORT}")
}

fn default_tick_hz() -> u32 {
    60
}

fn default_read_buffer_size() -> usize {
    4096
}

fn default_write_timeout_ms() -> u64 {
    250
}

fn default_location_max() -> f32 {
    500.0
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            tick_hz: default_tick_hz(),
            read_buffer_size: default_read_buffer_size(),
            poll_timeout_ms: 0,
            write_timeout_ms: default_write_timeout_ms(),
            location_min: 0.0,
            location_max: default_location_max(),
            id_strategy: IdStrategy::default(),
            max_entities: None,
            assets: AssetSeed::default(),
        }
    }
}

impl ServerConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_hz.max(1)))
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = ServerConfig::from_json_str(r#"{ "tick_hz": 30, "id_strategy": "registry_size" }"#)
            .unwrap();
        assert_eq!(cfg.tick_hz, 30);
        assert_eq!(cfg.id_strategy, IdStrategy::RegistrySize);
        assert_eq!(cfg.listen_addr, "0.0.0.0:12345");
        assert_eq!(cfg.location_max, 500.0);
        assert!(!cfg.assets.meshes.is_empty());
    }

    #[test]
    fn zero_tick_rate_does_not_divide_by_zero() {
        let cfg = ServerConfig {
            tick_hz: 0,
            ..Default::default()
        };
        assert_eq!(cfg.tick_interval(), Duration::from_secs(1));
    }
}
