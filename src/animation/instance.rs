//! Per-entity animation playback state

use super::{BoneAnimation, SkinnedSkeleton};
use crate::core::Result;
use glam::Mat4;
use std::sync::Arc;

/// Playback state for one rendered skinned entity
///
/// The skeleton is shared and read-only; the final transform palette is
/// owned by this instance and rewritten on every [`advance`](Self::advance).
#[derive(Clone, Debug)]
pub struct SkeletalModelInstance {
    skeleton: Arc<SkinnedSkeleton>,
    clip_name: String,
    clip_end_time: f32,
    time: f32,
    final_transforms: Vec<Mat4>,
}

impl SkeletalModelInstance {
    /// Create an instance playing `clip_name` from time 0
    ///
    /// The palette holds the pose at t = 0 until the first `advance`.
    /// Fails with `ClipNotFound` if the skeleton has no such clip.
    pub fn new(skeleton: Arc<SkinnedSkeleton>, clip_name: impl Into<String>) -> Result<Self> {
        let clip_name = clip_name.into();
        let clip_end_time = skeleton.clip_end_time(&clip_name)?;
        let final_transforms = skeleton.final_transforms(&clip_name, 0.0)?;

        Ok(Self {
            skeleton,
            clip_name,
            clip_end_time,
            time: 0.0,
            final_transforms,
        })
    }

    /// Advance playback by `dt` seconds and recompute the palette
    ///
    /// Past the clip end, time restarts at 0 rather than the clip start time.
    pub fn advance(&mut self, dt: f32) -> Result<()> {
        self.time += dt;

        if self.time > self.clip_end_time {
            self.time = 0.0;
        }

        self.skeleton
            .get_final_transforms(&self.clip_name, self.time, &mut self.final_transforms)
    }

    /// Current playback time in seconds
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn clip_name(&self) -> &str {
        &self.clip_name
    }

    /// Get the skeleton reference
    pub fn skeleton(&self) -> &Arc<SkinnedSkeleton> {
        &self.skeleton
    }

    /// Skinning palette from the latest advance, one matrix per bone
    pub fn final_transforms(&self) -> &[Mat4] {
        &self.final_transforms
    }

    /// Get the number of bones in the skeleton
    pub fn bone_count(&self) -> usize {
        self.skeleton.bone_count()
    }
}

/// A single keyframed track driving a rigid object's world matrix
#[derive(Clone, Debug)]
pub struct RigidAnimationInstance {
    animation: BoneAnimation,
    time: f32,
    world: Mat4,
}

impl RigidAnimationInstance {
    pub fn new(animation: BoneAnimation) -> Self {
        let world = animation.interpolate(0.0);
        Self {
            animation,
            time: 0.0,
            world,
        }
    }

    /// Advance by `dt`, looping to 0 once the end time is reached
    pub fn advance(&mut self, dt: f32) {
        self.time += dt;

        if self.time >= self.animation.end_time() {
            self.time = 0.0;
        }

        self.world = self.animation.interpolate(self.time);
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn world(&self) -> Mat4 {
        self.world
    }

    pub fn animation(&self) -> &BoneAnimation {
        &self.animation
    }
}
