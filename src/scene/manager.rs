//! Asset table and animated instances for a scene

use std::collections::HashMap;

use rayon::prelude::*;

use super::config::SceneConfig;
use crate::animation::{SkeletalModelInstance, SkinnedUploadRing};
use crate::asset::{self, SkinnedMeshAsset};
use crate::core::{Error, Result};

/// Index of an instance within an [`AnimatedScene`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstanceId(pub usize);

/// Skinned models loaded once and the animated instances that use them
///
/// Skeletons are shared read-only between instances; each instance owns its
/// own palette, so instances advance in parallel.
pub struct AnimatedScene {
    models: HashMap<String, SkinnedMeshAsset>,
    instances: Vec<SkeletalModelInstance>,
    upload_rings: Vec<SkinnedUploadRing>,
    frame_resource_count: usize,
    time_scale: f32,
}

impl AnimatedScene {
    /// Create an empty scene
    pub fn new(frame_resource_count: usize, time_scale: f32) -> Result<Self> {
        if frame_resource_count == 0 {
            return Err(Error::InvalidConfig("frame_resource_count must be at least 1".into()));
        }

        Ok(Self {
            models: HashMap::new(),
            instances: Vec::new(),
            upload_rings: Vec::new(),
            frame_resource_count,
            time_scale,
        })
    }

    /// Load the configured model and spawn the configured instances
    pub fn from_config(config: &SceneConfig) -> Result<Self> {
        config.validate()?;

        let mut scene = Self::new(config.frame_resource_count, config.time_scale)?;
        let model = config.model_path.to_string_lossy().into_owned();
        scene.add_model(model.clone(), asset::load_skinned_mesh(&config.model_path)?);

        for _ in 0..config.instance_count {
            scene.spawn(&model, &config.clip_name)?;
        }
        Ok(scene)
    }

    /// Register a loaded model under `name`, replacing any previous one
    pub fn add_model(&mut self, name: impl Into<String>, model: SkinnedMeshAsset) {
        let name = name.into();
        log::info!(
            "Registered model '{}' ({} bones, clips {:?})",
            name,
            model.skeleton.bone_count(),
            model.skeleton.clip_names()
        );
        self.models.insert(name, model);
    }

    pub fn model(&self, name: &str) -> Option<&SkinnedMeshAsset> {
        self.models.get(name)
    }

    /// Spawn an instance of `model` playing `clip_name`
    pub fn spawn(&mut self, model: &str, clip_name: &str) -> Result<InstanceId> {
        let asset = self
            .models
            .get(model)
            .ok_or_else(|| Error::InvalidConfig(format!("model '{}' is not loaded", model)))?;

        let instance = SkeletalModelInstance::new(asset.skeleton.clone(), clip_name)?;
        let mut ring = SkinnedUploadRing::new(self.frame_resource_count)?;
        ring.write(instance.final_transforms())?;

        let id = InstanceId(self.instances.len());
        self.instances.push(instance);
        self.upload_rings.push(ring);

        log::debug!("Spawned instance {:?} of '{}' playing '{}'", id, model, clip_name);
        Ok(id)
    }

    /// Advance every instance by `dt` (scaled) and stage the new palettes
    ///
    /// Each upload ring moves to its next frame slot before being written.
    pub fn tick(&mut self, dt: f32) -> Result<()> {
        let dt = dt * self.time_scale;

        self.instances
            .par_iter_mut()
            .zip(self.upload_rings.par_iter_mut())
            .try_for_each(|(instance, ring)| {
                instance.advance(dt)?;
                ring.advance();
                ring.write(instance.final_transforms())
            })
    }

    pub fn instance(&self, id: InstanceId) -> Option<&SkeletalModelInstance> {
        self.instances.get(id.0)
    }

    pub fn instances(&self) -> &[SkeletalModelInstance] {
        &self.instances
    }

    /// Staged skinning constants for an instance
    pub fn upload_ring(&self, id: InstanceId) -> Option<&SkinnedUploadRing> {
        self.upload_rings.get(id.0)
    }

    pub fn frame_resource_count(&self) -> usize {
        self.frame_resource_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationClip, BoneAnimation, Keyframe, SkinnedSkeleton};
    use glam::{Mat4, Quat, Vec3};
    use std::sync::Arc;

    fn test_model() -> SkinnedMeshAsset {
        let clip = AnimationClip::new(vec![BoneAnimation::new(vec![
            Keyframe::new(0.0, Vec3::ZERO, Vec3::ONE, Quat::IDENTITY),
            Keyframe::new(1.0, Vec3::new(10.0, 0.0, 0.0), Vec3::ONE, Quat::IDENTITY),
        ])
        .unwrap()]);
        let mut animations = HashMap::new();
        animations.insert("walk".to_string(), clip);

        SkinnedMeshAsset {
            vertices: Vec::new(),
            indices: Vec::new(),
            subsets: Vec::new(),
            materials: Vec::new(),
            skeleton: Arc::new(SkinnedSkeleton::new(&[-1], vec![Mat4::IDENTITY], animations).unwrap()),
        }
    }

    #[test]
    fn test_spawn_shares_skeleton() {
        let mut scene = AnimatedScene::new(3, 1.0).unwrap();
        scene.add_model("soldier", test_model());

        let a = scene.spawn("soldier", "walk").unwrap();
        let b = scene.spawn("soldier", "walk").unwrap();

        assert_ne!(a, b);
        assert!(Arc::ptr_eq(
            scene.instance(a).unwrap().skeleton(),
            scene.instance(b).unwrap().skeleton()
        ));
    }

    #[test]
    fn test_spawn_unknown_model_or_clip() {
        let mut scene = AnimatedScene::new(2, 1.0).unwrap();
        scene.add_model("soldier", test_model());

        assert!(scene.spawn("robot", "walk").is_err());
        assert!(scene.spawn("soldier", "fly").unwrap_err().is_clip_not_found());
    }

    #[test]
    fn test_tick_advances_all_instances_with_time_scale() {
        let mut scene = AnimatedScene::new(2, 0.5).unwrap();
        scene.add_model("soldier", test_model());
        for _ in 0..4 {
            scene.spawn("soldier", "walk").unwrap();
        }

        scene.tick(1.0).unwrap();

        for instance in scene.instances() {
            assert!((instance.time() - 0.5).abs() < 1e-6);
            assert!((instance.final_transforms()[0].w_axis.x - 5.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_tick_stages_palette_in_next_slot() {
        let mut scene = AnimatedScene::new(2, 1.0).unwrap();
        scene.add_model("soldier", test_model());
        let id = scene.spawn("soldier", "walk").unwrap();

        scene.tick(0.5).unwrap();

        let ring = scene.upload_ring(id).unwrap();
        assert_eq!(ring.current_index(), 1);
        let staged = ring.current().bone_transforms[0].to_mat4();
        assert!((staged.w_axis.x - 5.0).abs() < 1e-4);

        // Slot 0 still holds the spawn-time pose for the frame in flight
        assert_eq!(ring.slot(0).unwrap().bone_transforms[0].to_mat4(), Mat4::IDENTITY);
    }

    #[test]
    fn test_zero_frame_resources_rejected() {
        assert!(AnimatedScene::new(0, 1.0).is_err());
    }
}
