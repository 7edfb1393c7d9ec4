//! Request payload generation.
//!
//! Builds create payloads the way a scripted scene populator would: random
//! placement inside the scene bounds, random orientation and size, and a
//! starter mesh and material.

use rand::Rng;
use scene_shared::protocol::{LocationData, ObjectPayload, RotationData, ScaleData};

pub const STARTER_MESH: &str =
    "StaticMesh'/Game/StarterContent/Shapes/Shape_Pipe_180.Shape_Pipe_180'";
pub const STARTER_MATERIAL: &str =
    "Material'/Game/StarterContent/Materials/M_Brick_Clay_New.M_Brick_Clay_New'";

/// Options for random payloads.
#[derive(Debug, Clone)]
pub struct PayloadOptions {
    pub extent: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub physics: bool,
    pub mesh_path: String,
    pub material_path: String,
}

impl Default for PayloadOptions {
    fn default() -> Self {
        Self {
            extent: 500.0,
            min_scale: 0.5,
            max_scale: 2.0,
            physics: false,
            mesh_path: STARTER_MESH.to_string(),
            material_path: STARTER_MATERIAL.to_string(),
        }
    }
}

/// A create payload with every attribute filled in.
pub fn random_create_payload<R: Rng + ?Sized>(rng: &mut R, opts: &PayloadOptions) -> ObjectPayload {
    let extent = opts.extent.max(f32::EPSILON);
    let (lo, hi) = if opts.min_scale <= opts.max_scale {
        (opts.min_scale, opts.max_scale)
    } else {
        (opts.max_scale, opts.min_scale)
    };
    let mut scale_axis = || if lo < hi { rng.gen_range(lo..=hi) } else { lo };
    let scale = ScaleData {
        x: scale_axis(),
        y: scale_axis(),
        z: scale_axis(),
    };
    ObjectPayload {
        location: Some(LocationData {
            x: rng.gen_range(0.0..extent),
            y: rng.gen_range(0.0..extent),
            z: rng.gen_range(0.0..extent),
        }),
        rotation: Some(RotationData {
            pitch: rng.gen_range(0.0..360.0),
            yaw: rng.gen_range(0.0..360.0),
            roll: rng.gen_range(0.0..360.0),
        }),
        scale: Some(scale),
        mesh_path: Some(opts.mesh_path.clone()),
        material_path: Some(opts.material_path.clone()),
        physics: Some(opts.physics),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn random_payloads_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let opts = PayloadOptions::default();
        for _ in 0..100 {
            let p = random_create_payload(&mut rng, &opts);
            let loc = p.location.unwrap();
            assert!((0.0..500.0).contains(&loc.x));
            assert!((0.0..500.0).contains(&loc.z));
            let scale = p.scale.unwrap();
            assert!((0.5..2.0).contains(&scale.y));
            assert!((0.0..360.0).contains(&p.rotation.unwrap().yaw));
            assert_eq!(p.physics, Some(false));
            assert_eq!(p.mesh_path.as_deref(), Some(STARTER_MESH));
        }
    }

    #[test]
    fn fixed_scale_is_used_as_is() {
        let mut rng = StdRng::seed_from_u64(1);
        let opts = PayloadOptions {
            min_scale: 1000.0,
            max_scale: 1000.0,
            ..Default::default()
        };
        let scale = random_create_payload(&mut rng, &opts).scale.unwrap();
        assert_eq!((scale.x, scale.y, scale.z), (1000.0, 1000.0, 1000.0));
    }

    #[test]
    fn reversed_scale_bounds_are_swapped() {
        let mut rng = StdRng::seed_from_u64(3);
        let opts = PayloadOptions {
            min_scale: 3.0,
            max_scale: 1.0,
            ..Default::default()
        };
        for _ in 0..50 {
            let scale = random_create_payload(&mut rng, &opts).scale.unwrap();
            assert!((1.0..=3.0).contains(&scale.x));
        }
    }
}
