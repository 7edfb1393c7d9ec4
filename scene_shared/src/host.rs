//! Scene host abstraction.
//!
//! The command core never owns scene entities. Everything it does to the
//! scene goes through `SceneHost`, which the embedding engine implements.
//! `scene::InMemoryScene` is a headless implementation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    assets::{AssetKind, AssetRef},
    error::HostError,
    math::{Rotator, Vec3},
};

/// Non-owning reference to a host entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityHandle(pub u64);

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags::bitflags! {
    /// Which collision channels a body participates in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CollisionEnabled: u8 {
        const QUERY = 1 << 0;
        const PHYSICS = 1 << 1;
    }
}

impl CollisionEnabled {
    pub const NO_COLLISION: Self = Self::empty();
    pub const QUERY_AND_PHYSICS: Self = Self::QUERY.union(Self::PHYSICS);
}

pub const PROFILE_BLOCK_ALL: &str = "BlockAll";
pub const PROFILE_NO_COLLISION: &str = "NoCollision";

/// Simulate flag, collision channels and collision profile. Always set as
/// one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsSettings {
    pub simulate: bool,
    pub collision: CollisionEnabled,
    pub profile: &'static str,
}

impl PhysicsSettings {
    pub const fn from_enabled(enabled: bool) -> Self {
        if enabled {
            Self {
                simulate: true,
                collision: CollisionEnabled::QUERY_AND_PHYSICS,
                profile: PROFILE_BLOCK_ALL,
            }
        } else {
            Self {
                simulate: false,
                collision: CollisionEnabled::NO_COLLISION,
                profile: PROFILE_NO_COLLISION,
            }
        }
    }
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self::from_enabled(false)
    }
}

/// Operations the command core needs from the scene.
///
/// All calls happen on the tick thread.
pub trait SceneHost {
    /// False once the host scene has been torn down.
    fn is_available(&self) -> bool;

    fn spawn_entity(&mut self) -> Result<EntityHandle, HostError>;
    fn destroy_entity(&mut self, handle: EntityHandle) -> Result<(), HostError>;
    fn is_alive(&self, handle: EntityHandle) -> bool;

    fn set_location(&mut self, handle: EntityHandle, location: Vec3) -> Result<(), HostError>;
    fn set_rotation(&mut self, handle: EntityHandle, rotation: Rotator) -> Result<(), HostError>;
    fn set_scale(&mut self, handle: EntityHandle, scale: Vec3) -> Result<(), HostError>;

    fn resolve_asset(&self, path: &str, kind: AssetKind) -> Result<AssetRef, HostError>;
    fn set_mesh(&mut self, handle: EntityHandle, mesh: &AssetRef) -> Result<(), HostError>;
    fn set_material(
        &mut self,
        handle: EntityHandle,
        slot: usize,
        material: &AssetRef,
    ) -> Result<(), HostError>;

    fn set_physics(
        &mut self,
        handle: EntityHandle,
        settings: PhysicsSettings,
    ) -> Result<(), HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physics_triples_are_all_or_nothing() {
        let on = PhysicsSettings::from_enabled(true);
        assert!(on.simulate);
        assert_eq!(on.collision, CollisionEnabled::QUERY_AND_PHYSICS);
        assert_eq!(on.profile, "BlockAll");

        let off = PhysicsSettings::from_enabled(false);
        assert!(!off.simulate);
        assert_eq!(off.collision, CollisionEnabled::NO_COLLISION);
        assert_eq!(off.profile, "NoCollision");
    }
}
