//! Skeletal animation system

pub mod clip;
pub mod skeleton;
pub mod instance;
pub mod skinning;

pub use clip::{AnimationClip, BoneAnimation, Keyframe};
pub use skeleton::{SkinnedSkeleton, ROOT_PARENT};
pub use instance::{RigidAnimationInstance, SkeletalModelInstance};
pub use skinning::{GpuBoneTransform, SkinnedConstants, SkinnedUploadRing, MAX_BONES};
