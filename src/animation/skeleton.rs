//! Bone hierarchy, bind-pose offsets and named clips for a skinned mesh

use super::AnimationClip;
use crate::core::{Error, Result};
use glam::Mat4;
use std::collections::HashMap;

/// Parent index stored for the root bone
pub const ROOT_PARENT: i32 = -1;

/// Skeleton data shared by every instance of one skinned asset
///
/// Bones are stored in hierarchy order: every bone's parent has a smaller
/// index, so world transforms accumulate in a single forward pass.
/// Immutable once built.
#[derive(Clone, Debug)]
pub struct SkinnedSkeleton {
    /// Parent of each bone, `None` for the root (bone 0)
    parents: Vec<Option<usize>>,
    /// Bind space to bone space, one per bone
    bone_offsets: Vec<Mat4>,
    animations: HashMap<String, AnimationClip>,
}

impl SkinnedSkeleton {
    /// Build a skeleton from a parent-index table, offsets and clips
    ///
    /// `bone_hierarchy[0]` must be negative (the root); every other entry must
    /// reference an earlier bone. Every clip must animate exactly one entry
    /// per bone.
    pub fn new(
        bone_hierarchy: &[i32],
        bone_offsets: Vec<Mat4>,
        animations: HashMap<String, AnimationClip>,
    ) -> Result<Self> {
        if bone_hierarchy.is_empty() {
            return Err(Error::InvalidSkeleton("Skeleton must have at least one bone".into()));
        }

        if bone_hierarchy.len() != bone_offsets.len() {
            return Err(Error::InvalidSkeleton(format!(
                "{} parent indices but {} bone offsets",
                bone_hierarchy.len(),
                bone_offsets.len()
            )));
        }

        let parents = Self::validate_hierarchy(bone_hierarchy)?;

        for (name, clip) in &animations {
            if clip.bone_count() != parents.len() {
                return Err(Error::InvalidAnimation(format!(
                    "clip '{}' animates {} bones, skeleton has {}",
                    name,
                    clip.bone_count(),
                    parents.len()
                )));
            }
        }

        Ok(Self {
            parents,
            bone_offsets,
            animations,
        })
    }

    fn validate_hierarchy(bone_hierarchy: &[i32]) -> Result<Vec<Option<usize>>> {
        let mut parents = Vec::with_capacity(bone_hierarchy.len());

        for (index, &parent) in bone_hierarchy.iter().enumerate() {
            if index == 0 {
                if parent >= 0 {
                    return Err(Error::InvalidSkeleton(format!(
                        "root bone has parent index {}",
                        parent
                    )));
                }
                parents.push(None);
                continue;
            }

            // Parents must precede children for the single-pass composition
            match usize::try_from(parent) {
                Ok(p) if p < index => parents.push(Some(p)),
                _ => {
                    return Err(Error::InvalidSkeleton(format!(
                        "bone {} has parent index {}, expected 0..{}",
                        index, parent, index
                    )));
                }
            }
        }

        Ok(parents)
    }

    /// Get the number of bones in the skeleton
    pub fn bone_count(&self) -> usize {
        self.parents.len()
    }

    /// Get the parent index of a bone
    pub fn parent_index(&self, bone_index: usize) -> Option<usize> {
        self.parents.get(bone_index).copied().flatten()
    }

    /// Parent table as stored in asset files, root marked with [`ROOT_PARENT`]
    pub fn bone_hierarchy(&self) -> Vec<i32> {
        self.parents
            .iter()
            .map(|p| p.map_or(ROOT_PARENT, |p| p as i32))
            .collect()
    }

    pub fn bone_offsets(&self) -> &[Mat4] {
        &self.bone_offsets
    }

    /// Get all children of a bone
    pub fn children(&self, bone_index: usize) -> Vec<usize> {
        self.parents
            .iter()
            .enumerate()
            .filter_map(|(idx, parent)| (*parent == Some(bone_index)).then_some(idx))
            .collect()
    }

    /// Look up a clip by exact name
    pub fn clip(&self, name: &str) -> Result<&AnimationClip> {
        self.animations
            .get(name)
            .ok_or_else(|| Error::ClipNotFound(name.to_string()))
    }

    pub fn has_clip(&self, name: &str) -> bool {
        self.animations.contains_key(name)
    }

    /// Clip names, sorted
    pub fn clip_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.animations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn clip_start_time(&self, name: &str) -> Result<f32> {
        Ok(self.clip(name)?.clip_start_time())
    }

    pub fn clip_end_time(&self, name: &str) -> Result<f32> {
        Ok(self.clip(name)?.clip_end_time())
    }

    /// Compose world transforms from local (to-parent) transforms
    ///
    /// glam multiplies column vectors, so "apply local, then parent's world"
    /// reads `parent_world * local`.
    pub fn calculate_world_transforms(&self, local_transforms: &[Mat4], out: &mut [Mat4]) {
        assert_eq!(
            local_transforms.len(),
            self.bone_count(),
            "Local transforms array must match bone count"
        );
        assert_eq!(out.len(), self.bone_count(), "Output array must match bone count");

        // Parents precede children, so out[parent] is already final here
        for (index, parent) in self.parents.iter().enumerate() {
            out[index] = match parent {
                Some(parent_idx) => out[*parent_idx] * local_transforms[index],
                None => local_transforms[index],
            };
        }
    }

    /// Skinning matrices: remove the bind pose, then apply the animated world pose
    pub fn calculate_skinning_matrices(&self, world_transforms: &[Mat4], out: &mut [Mat4]) {
        assert_eq!(
            world_transforms.len(),
            self.bone_count(),
            "World transforms array must match bone count"
        );
        assert_eq!(out.len(), self.bone_count(), "Output array must match bone count");

        for ((slot, world), offset) in out.iter_mut().zip(world_transforms).zip(&self.bone_offsets) {
            *slot = *world * *offset;
        }
    }

    /// Final per-bone skinning matrices for `clip_name` at `time`
    ///
    /// Fails only when the clip does not exist, and then leaves `out` untouched.
    pub fn get_final_transforms(&self, clip_name: &str, time: f32, out: &mut [Mat4]) -> Result<()> {
        let clip = self.clip(clip_name)?;
        assert_eq!(out.len(), self.bone_count(), "Output array must match bone count");

        let mut to_parent = vec![Mat4::IDENTITY; self.bone_count()];
        clip.interpolate(time, &mut to_parent);

        let mut to_root = vec![Mat4::IDENTITY; self.bone_count()];
        self.calculate_world_transforms(&to_parent, &mut to_root);

        self.calculate_skinning_matrices(&to_root, out);
        Ok(())
    }

    /// Allocating form of [`Self::get_final_transforms`]
    pub fn final_transforms(&self, clip_name: &str, time: f32) -> Result<Vec<Mat4>> {
        let mut out = vec![Mat4::IDENTITY; self.bone_count()];
        self.get_final_transforms(clip_name, time, &mut out)?;
        Ok(out)
    }
}
