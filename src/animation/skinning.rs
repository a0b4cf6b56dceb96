//! Renderer-facing bone palette layout and per-frame upload slots

use crate::core::{Error, Result};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Maximum number of bones per skinned draw (constant buffer limit)
pub const MAX_BONES: usize = 96;

/// GPU-side bone transform (mat4 for skinning matrix), column-major
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuBoneTransform {
    pub matrix: [[f32; 4]; 4],
}

impl GpuBoneTransform {
    /// Create from a glam Mat4
    pub fn from_mat4(matrix: Mat4) -> Self {
        Self {
            matrix: matrix.to_cols_array_2d(),
        }
    }

    /// Create identity transform
    pub fn identity() -> Self {
        Self::from_mat4(Mat4::IDENTITY)
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.matrix)
    }
}

/// Skinning constants for one draw: a fixed-size bone palette
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SkinnedConstants {
    pub bone_transforms: [GpuBoneTransform; MAX_BONES],
}

impl SkinnedConstants {
    /// Palette with every slot set to identity
    pub fn identity() -> Self {
        Self {
            bone_transforms: [GpuBoneTransform::identity(); MAX_BONES],
        }
    }

    /// Copy a palette in; slots past `palette.len()` are identity
    pub fn from_palette(palette: &[Mat4]) -> Result<Self> {
        let mut constants = Self::identity();
        constants.write_palette(palette)?;
        Ok(constants)
    }

    fn write_palette(&mut self, palette: &[Mat4]) -> Result<()> {
        if palette.len() > MAX_BONES {
            return Err(Error::InvalidSkeleton(format!(
                "palette has {} bones, at most {} fit in skinned constants",
                palette.len(),
                MAX_BONES
            )));
        }

        for (slot, matrix) in self.bone_transforms.iter_mut().zip(palette) {
            *slot = GpuBoneTransform::from_mat4(*matrix);
        }
        for slot in &mut self.bone_transforms[palette.len()..] {
            *slot = GpuBoneTransform::identity();
        }
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// One `SkinnedConstants` slot per in-flight frame
///
/// The CPU writes the current slot while the renderer may still be reading
/// the others; `advance` moves to the next slot once a frame is submitted.
pub struct SkinnedUploadRing {
    slots: Vec<SkinnedConstants>,
    current: usize,
}

impl SkinnedUploadRing {
    /// Create a ring with `frame_resource_count` slots
    pub fn new(frame_resource_count: usize) -> Result<Self> {
        if frame_resource_count == 0 {
            return Err(Error::InvalidConfig("frame resource count must be at least 1".into()));
        }

        Ok(Self {
            slots: vec![SkinnedConstants::identity(); frame_resource_count],
            current: 0,
        })
    }

    /// Write `palette` into the current frame's slot
    pub fn write(&mut self, palette: &[Mat4]) -> Result<()> {
        self.slots[self.current].write_palette(palette)
    }

    /// Move to the next frame's slot, wrapping around
    pub fn advance(&mut self) {
        self.current = (self.current + 1) % self.slots.len();
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &SkinnedConstants {
        &self.slots[self.current]
    }

    pub fn slot(&self, index: usize) -> Option<&SkinnedConstants> {
        self.slots.get(index)
    }

    /// Get the number of frame slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
