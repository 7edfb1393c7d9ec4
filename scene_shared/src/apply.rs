//! Attribute appliers.
//!
//! Each applier looks at its own optional payload field and pushes it into
//! the scene host. A missing field is a logged no-op; a host failure is
//! logged and stays local to that applier.

use tracing::{debug, error, warn};

use crate::{
    assets::AssetKind,
    host::{EntityHandle, PhysicsSettings, SceneHost},
    math::{Rotator, Vec3},
    protocol::ObjectPayload,
};

/// Result of one applier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyOutcome {
    Applied,
    /// The payload did not carry this attribute.
    #[default]
    Skipped,
    /// The host rejected the attribute.
    Failed,
}

/// Outcome of every applier for one create or update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplyReport {
    pub location: ApplyOutcome,
    pub rotation: ApplyOutcome,
    pub scale: ApplyOutcome,
    pub mesh: ApplyOutcome,
    pub material: ApplyOutcome,
    pub physics: ApplyOutcome,
}

impl ApplyReport {
    pub fn failures(&self) -> usize {
        [
            self.location,
            self.rotation,
            self.scale,
            self.mesh,
            self.material,
            self.physics,
        ]
        .into_iter()
        .filter(|o| *o == ApplyOutcome::Failed)
        .count()
    }
}

/// Closed range each location axis is clamped into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationBounds {
    pub min: f32,
    pub max: f32,
}

impl Default for LocationBounds {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 500.0,
        }
    }
}

impl LocationBounds {
    /// Bounds with `min <= max`; swapped if given in the wrong order.
    pub fn new(min: f32, max: f32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }
}

/// Runs every applier against `handle`.
pub fn apply_all<H: SceneHost>(
    host: &mut H,
    handle: EntityHandle,
    payload: &ObjectPayload,
    bounds: LocationBounds,
) -> ApplyReport {
    let (mesh, material) = apply_mesh_and_material(host, handle, payload);
    ApplyReport {
        location: apply_location(host, handle, payload, bounds),
        rotation: apply_rotation(host, handle, payload),
        scale: apply_scale(host, handle, payload),
        mesh,
        material,
        physics: apply_physics(host, handle, payload),
    }
}

pub fn apply_location<H: SceneHost>(
    host: &mut H,
    handle: EntityHandle,
    payload: &ObjectPayload,
    bounds: LocationBounds,
) -> ApplyOutcome {
    let Some(data) = payload.location else {
        warn!(%handle, "Location data missing in payload");
        return ApplyOutcome::Skipped;
    };
    let location = Vec3::from(data).clamp_each(bounds.min, bounds.max);
    match host.set_location(handle, location) {
        Ok(()) => {
            debug!(%handle, %location, "Location set");
            ApplyOutcome::Applied
        }
        Err(e) => {
            error!(%handle, error = %e, "Failed to set location");
            ApplyOutcome::Failed
        }
    }
}

pub fn apply_rotation<H: SceneHost>(
    host: &mut H,
    handle: EntityHandle,
    payload: &ObjectPayload,
) -> ApplyOutcome {
    let Some(data) = payload.rotation else {
        warn!(%handle, "Rotation data missing in payload");
        return ApplyOutcome::Skipped;
    };
    let rotation = Rotator::from(data);
    match host.set_rotation(handle, rotation) {
        Ok(()) => {
            debug!(%handle, %rotation, "Rotation set");
            ApplyOutcome::Applied
        }
        Err(e) => {
            error!(%handle, error = %e, "Failed to set rotation");
            ApplyOutcome::Failed
        }
    }
}

pub fn apply_scale<H: SceneHost>(
    host: &mut H,
    handle: EntityHandle,
    payload: &ObjectPayload,
) -> ApplyOutcome {
    let Some(data) = payload.scale else {
        warn!(%handle, "Scale data missing in payload");
        return ApplyOutcome::Skipped;
    };
    let scale = Vec3::from(data);
    match host.set_scale(handle, scale) {
        Ok(()) => {
            debug!(%handle, %scale, "Scale set");
            ApplyOutcome::Applied
        }
        Err(e) => {
            error!(%handle, error = %e, "Failed to set scale");
            ApplyOutcome::Failed
        }
    }
}

/// Mesh and material are resolved and bound independently of each other.
pub fn apply_mesh_and_material<H: SceneHost>(
    host: &mut H,
    handle: EntityHandle,
    payload: &ObjectPayload,
) -> (ApplyOutcome, ApplyOutcome) {
    let mesh = match payload.mesh_path.as_deref() {
        None => {
            warn!(%handle, "Mesh path missing in payload");
            ApplyOutcome::Skipped
        }
        Some("") => ApplyOutcome::Skipped,
        Some(path) => match host
            .resolve_asset(path, AssetKind::Mesh)
            .and_then(|asset| host.set_mesh(handle, &asset))
        {
            Ok(()) => {
                debug!(%handle, %path, "Mesh set");
                ApplyOutcome::Applied
            }
            Err(e) => {
                error!(%handle, %path, error = %e, "Failed to load mesh");
                ApplyOutcome::Failed
            }
        },
    };

    let material = match payload.material_path.as_deref() {
        None => {
            warn!(%handle, "Material path missing in payload");
            ApplyOutcome::Skipped
        }
        Some("") => ApplyOutcome::Skipped,
        Some(path) => match host
            .resolve_asset(path, AssetKind::Material)
            .and_then(|asset| host.set_material(handle, 0, &asset))
        {
            Ok(()) => {
                debug!(%handle, %path, "Material set");
                ApplyOutcome::Applied
            }
            Err(e) => {
                error!(%handle, %path, error = %e, "Failed to load material");
                ApplyOutcome::Failed
            }
        },
    };

    (mesh, material)
}

pub fn apply_physics<H: SceneHost>(
    host: &mut H,
    handle: EntityHandle,
    payload: &ObjectPayload,
) -> ApplyOutcome {
    let Some(enabled) = payload.physics else {
        warn!(%handle, "Physics data missing in payload");
        return ApplyOutcome::Skipped;
    };
    match host.set_physics(handle, PhysicsSettings::from_enabled(enabled)) {
        Ok(()) => {
            debug!(
                %handle,
                state = if enabled { "Enabled" } else { "Disabled" },
                "Physics set"
            );
            ApplyOutcome::Applied
        }
        Err(e) => {
            error!(%handle, error = %e, "Failed to set physics");
            ApplyOutcome::Failed
        }
    }
}
