//! Headless scene host.
//!
//! Implements `SceneHost` on top of the component `World` and an
//! `AssetCatalog`. Every spawned entity gets a transform and a static-mesh
//! component, mirroring the single mesh-bearing actor type the command
//! protocol targets.

use tracing::debug;

use crate::{
    assets::{AssetCatalog, AssetKind, AssetRef},
    config::AssetSeed,
    ecs::{EntityId, World},
    error::HostError,
    host::{EntityHandle, PhysicsSettings, SceneHost},
    math::{Rotator, Transform, Vec3},
};

/// Render + collision state of an entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StaticMeshComponent {
    pub mesh: Option<AssetRef>,
    pub materials: Vec<Option<AssetRef>>,
    pub physics: PhysicsSettings,
}

impl StaticMeshComponent {
    pub fn material(&self, slot: usize) -> Option<&AssetRef> {
        self.materials.get(slot).and_then(Option::as_ref)
    }
}

/// Counters for host calls that matter to callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub spawned: u64,
    pub destroyed: u64,
    pub failed_spawns: u64,
}

/// In-memory scene.
#[derive(Default)]
pub struct InMemoryScene {
    world: World,
    assets: AssetCatalog,
    max_entities: Option<usize>,
    torn_down: bool,
    stats: SceneStats,
}

impl InMemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a scene whose catalog knows the seeded asset paths. Invalid
    /// seed entries are skipped with a debug log.
    pub fn with_assets(seed: &AssetSeed) -> Self {
        let mut scene = Self::new();
        let kinds = seed
            .meshes
            .iter()
            .map(|p| (AssetKind::Mesh, p))
            .chain(seed.materials.iter().map(|p| (AssetKind::Material, p)));
        for (kind, path) in kinds {
            if let Err(e) = scene.assets.register(kind, path) {
                debug!(%path, error = %e, "Skipping asset seed");
            }
        }
        scene
    }

    /// Spawning fails once `max` entities are alive.
    pub fn with_capacity_limit(mut self, max: Option<usize>) -> Self {
        self.max_entities = max;
        self
    }

    /// Marks the scene as ended; every further call fails.
    pub fn tear_down(&mut self) {
        self.torn_down = true;
        self.world = World::default();
    }

    pub fn stats(&self) -> SceneStats {
        self.stats
    }

    pub fn entity_count(&self) -> usize {
        self.world.len()
    }

    pub fn transform(&self, handle: EntityHandle) -> Option<&Transform> {
        self.world.get::<Transform>(EntityId(handle.0))
    }

    pub fn mesh_component(&self, handle: EntityHandle) -> Option<&StaticMeshComponent> {
        self.world.get::<StaticMeshComponent>(EntityId(handle.0))
    }

    fn live(&self, handle: EntityHandle) -> Result<EntityId, HostError> {
        if self.torn_down {
            return Err(HostError::WorldUnavailable);
        }
        let id = EntityId(handle.0);
        if self.world.is_alive(id) {
            Ok(id)
        } else {
            Err(HostError::StaleHandle(handle))
        }
    }

    fn transform_mut(&mut self, handle: EntityHandle) -> Result<&mut Transform, HostError> {
        let id = self.live(handle)?;
        self.world
            .get_mut::<Transform>(id)
            .ok_or(HostError::StaleHandle(handle))
    }

    fn mesh_mut(&mut self, handle: EntityHandle) -> Result<&mut StaticMeshComponent, HostError> {
        let id = self.live(handle)?;
        self.world
            .get_mut::<StaticMeshComponent>(id)
            .ok_or(HostError::StaleHandle(handle))
    }
}

impl SceneHost for InMemoryScene {
    fn is_available(&self) -> bool {
        !self.torn_down
    }

    fn spawn_entity(&mut self) -> Result<EntityHandle, HostError> {
        if self.torn_down {
            return Err(HostError::WorldUnavailable);
        }
        if let Some(max) = self.max_entities {
            if self.world.len() >= max {
                self.stats.failed_spawns += 1;
                return Err(HostError::SpawnFailed(format!(
                    "scene is at capacity ({max} entities)"
                )));
            }
        }
        let id = self.world.spawn();
        self.world.insert(id, Transform::default());
        self.world.insert(id, StaticMeshComponent::default());
        self.stats.spawned += 1;
        Ok(EntityHandle(id.0))
    }

    fn destroy_entity(&mut self, handle: EntityHandle) -> Result<(), HostError> {
        let id = self.live(handle)?;
        self.world.despawn(id);
        self.stats.destroyed += 1;
        Ok(())
    }

    fn is_alive(&self, handle: EntityHandle) -> bool {
        self.live(handle).is_ok()
    }

    fn set_location(&mut self, handle: EntityHandle, location: Vec3) -> Result<(), HostError> {
        self.transform_mut(handle)?.location = location;
        Ok(())
    }

    fn set_rotation(&mut self, handle: EntityHandle, rotation: Rotator) -> Result<(), HostError> {
        self.transform_mut(handle)?.rotation = rotation;
        Ok(())
    }

    fn set_scale(&mut self, handle: EntityHandle, scale: Vec3) -> Result<(), HostError> {
        self.transform_mut(handle)?.scale = scale;
        Ok(())
    }

    fn resolve_asset(&self, path: &str, kind: AssetKind) -> Result<AssetRef, HostError> {
        if self.torn_down {
            return Err(HostError::WorldUnavailable);
        }
        self.assets.resolve(path, kind)
    }

    fn set_mesh(&mut self, handle: EntityHandle, mesh: &AssetRef) -> Result<(), HostError> {
        self.mesh_mut(handle)?.mesh = Some(mesh.clone());
        Ok(())
    }

    fn set_material(
        &mut self,
        handle: EntityHandle,
        slot: usize,
        material: &AssetRef,
    ) -> Result<(), HostError> {
        let component = self.mesh_mut(handle)?;
        if component.materials.len() <= slot {
            component.materials.resize(slot + 1, None);
        }
        component.materials[slot] = Some(material.clone());
        Ok(())
    }

    fn set_physics(
        &mut self,
        handle: EntityHandle,
        settings: PhysicsSettings,
    ) -> Result<(), HostError> {
        self.mesh_mut(handle)?.physics = settings;
        Ok(())
    }
}
