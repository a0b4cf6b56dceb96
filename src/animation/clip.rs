//! Animation clip and keyframe system

use crate::core::{Error, Result};
use glam::{Mat4, Quat, Vec3};

/// A single timed pose sample for one bone
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    pub translation: Vec3,
    pub scale: Vec3,
    pub rotation: Quat,
}

impl Keyframe {
    /// Create a new keyframe with the given transform
    pub fn new(time: f32, translation: Vec3, scale: Vec3, rotation: Quat) -> Self {
        Self {
            time,
            translation,
            scale,
            rotation,
        }
    }

    /// Create an identity transform keyframe at the given time
    pub fn identity(time: f32) -> Self {
        Self {
            time,
            translation: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation: Quat::IDENTITY,
        }
    }

    /// Convert this keyframe to a local (to-parent) matrix
    ///
    /// Scale, then rotate about the origin, then translate.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Interpolate between two keyframes
    ///
    /// `frac` 0 reproduces `a` and 1 reproduces `b` exactly; in between,
    /// translation and scale are lerped and rotation takes the shortest-arc slerp.
    pub fn interpolate(a: &Self, b: &Self, frac: f32) -> Self {
        if frac <= 0.0 {
            return *a;
        }
        if frac >= 1.0 {
            return *b;
        }

        Self {
            time: a.time + (b.time - a.time) * frac,
            translation: a.translation.lerp(b.translation, frac),
            scale: a.scale.lerp(b.scale, frac),
            rotation: a.rotation.slerp(b.rotation, frac),
        }
    }
}

impl Default for Keyframe {
    fn default() -> Self {
        Self::identity(0.0)
    }
}

/// Keyframes for a single bone, ordered by time
#[derive(Clone, Debug)]
pub struct BoneAnimation {
    keyframes: Vec<Keyframe>,
}

impl BoneAnimation {
    /// Create a bone animation from time-ordered keyframes
    ///
    /// Fails if `keyframes` is empty, a time is not finite, or times decrease.
    /// Equal adjacent times are accepted and sample as a jump.
    pub fn new(keyframes: Vec<Keyframe>) -> Result<Self> {
        if keyframes.is_empty() {
            return Err(Error::InvalidAnimation("bone animation has no keyframes".into()));
        }

        if let Some(bad) = keyframes.iter().position(|k| !k.time.is_finite()) {
            return Err(Error::InvalidAnimation(format!(
                "keyframe {} has non-finite time {}",
                bad, keyframes[bad].time
            )));
        }

        if let Some(i) = keyframes.windows(2).position(|w| w[1].time < w[0].time) {
            return Err(Error::InvalidAnimation(format!(
                "keyframe {} at t={} precedes keyframe {} at t={}",
                i + 1,
                keyframes[i + 1].time,
                i,
                keyframes[i].time
            )));
        }

        Ok(Self { keyframes })
    }

    /// A single-keyframe animation holding `keyframe` forever
    pub fn constant(keyframe: Keyframe) -> Self {
        Self {
            keyframes: vec![keyframe],
        }
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Time of the first keyframe
    pub fn start_time(&self) -> f32 {
        self.first().time
    }

    /// Time of the last keyframe
    pub fn end_time(&self) -> f32 {
        self.last().time
    }

    /// Sample the pose at `time`, clamping outside the keyframe range
    pub fn sample(&self, time: f32) -> Keyframe {
        let first = self.first();
        if time <= first.time {
            return *first;
        }

        let last = self.last();
        if time >= last.time {
            return *last;
        }

        // First bracketing pair wins, so a repeated time samples the earlier key
        // at that instant and the later key just after it.
        for pair in self.keyframes.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            if time >= current.time && time <= next.time {
                let duration = next.time - current.time;
                let frac = if duration > 0.0 {
                    (time - current.time) / duration
                } else {
                    0.0
                };
                return Keyframe::interpolate(current, next, frac);
            }
        }

        // Unreachable for ordered keyframes: first.time < time < last.time
        *last
    }

    /// Local (to-parent) transform of the bone at `time`
    pub fn interpolate(&self, time: f32) -> Mat4 {
        self.sample(time).to_matrix()
    }

    fn first(&self) -> &Keyframe {
        &self.keyframes[0]
    }

    fn last(&self) -> &Keyframe {
        &self.keyframes[self.keyframes.len() - 1]
    }
}

/// A complete animation clip: one `BoneAnimation` per skeleton bone, in bone order
#[derive(Clone, Debug)]
pub struct AnimationClip {
    bone_animations: Vec<BoneAnimation>,
}

impl AnimationClip {
    /// Create a clip; entry `i` animates bone `i`
    pub fn new(bone_animations: Vec<BoneAnimation>) -> Self {
        Self { bone_animations }
    }

    pub fn bone_animations(&self) -> &[BoneAnimation] {
        &self.bone_animations
    }

    /// Number of bones this clip animates
    pub fn bone_count(&self) -> usize {
        self.bone_animations.len()
    }

    /// Smallest start time over all bones
    pub fn clip_start_time(&self) -> f32 {
        self.bone_animations
            .iter()
            .map(BoneAnimation::start_time)
            .fold(f32::INFINITY, f32::min)
    }

    /// Largest end time over all bones
    pub fn clip_end_time(&self) -> f32 {
        self.bone_animations
            .iter()
            .map(BoneAnimation::end_time)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Write every bone's local transform at `time` into `out`, indexed by bone
    pub fn interpolate(&self, time: f32, out: &mut [Mat4]) {
        assert_eq!(
            out.len(),
            self.bone_animations.len(),
            "Output array must match clip bone count"
        );

        for (slot, animation) in out.iter_mut().zip(&self.bone_animations) {
            *slot = animation.interpolate(time);
        }
    }

    /// Sample all bone local transforms at `time`
    pub fn sample(&self, time: f32) -> Vec<Mat4> {
        let mut transforms = vec![Mat4::IDENTITY; self.bone_animations.len()];
        self.interpolate(time, &mut transforms);
        transforms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn translation_key(time: f32, x: f32) -> Keyframe {
        Keyframe::new(time, Vec3::new(x, 0.0, 0.0), Vec3::ONE, Quat::IDENTITY)
    }

    fn two_key_track() -> BoneAnimation {
        BoneAnimation::new(vec![
            Keyframe::new(0.0, Vec3::ZERO, Vec3::ONE, Quat::IDENTITY),
            Keyframe::new(
                1.0,
                Vec3::new(10.0, 0.0, 0.0),
                Vec3::splat(3.0),
                Quat::from_rotation_z(FRAC_PI_2),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_keyframe_default_is_identity() {
        let kf = Keyframe::default();
        assert_eq!(kf.time, 0.0);
        assert_eq!(kf.translation, Vec3::ZERO);
        assert_eq!(kf.scale, Vec3::ONE);
        assert_eq!(kf.rotation, Quat::IDENTITY);
        assert_eq!(kf.to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_keyframe_to_matrix_order() {
        // Scale 2, rotate 90 deg about Z, translate (1,2,3)
        let kf = Keyframe::new(
            0.0,
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::splat(2.0),
            Quat::from_rotation_z(FRAC_PI_2),
        );
        let p = kf.to_matrix().transform_point3(Vec3::X);

        // (1,0,0) -> (2,0,0) -> (0,2,0) -> (1,4,3)
        assert!((p - Vec3::new(1.0, 4.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn test_empty_bone_animation_rejected() {
        let result = BoneAnimation::new(Vec::new());
        assert!(matches!(result, Err(Error::InvalidAnimation(_))));
    }

    #[test]
    fn test_decreasing_times_rejected() {
        let result = BoneAnimation::new(vec![translation_key(1.0, 0.0), translation_key(0.5, 1.0)]);
        assert!(matches!(result, Err(Error::InvalidAnimation(_))));
    }

    #[test]
    fn test_non_finite_time_rejected() {
        let result = BoneAnimation::new(vec![translation_key(0.0, 0.0), translation_key(f32::NAN, 1.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_start_and_end_time() {
        let track = BoneAnimation::new(vec![
            translation_key(0.25, 0.0),
            translation_key(1.0, 1.0),
            translation_key(2.5, 2.0),
        ])
        .unwrap();

        assert_eq!(track.start_time(), 0.25);
        assert_eq!(track.end_time(), 2.5);
    }

    #[test]
    fn test_sample_clamps_at_boundaries() {
        let track = two_key_track();
        let first = track.keyframes()[0];
        let last = track.keyframes()[1];

        assert_eq!(track.sample(-5.0), first);
        assert_eq!(track.sample(0.0), first);
        assert_eq!(track.sample(1.0), last);
        assert_eq!(track.sample(42.0), last);

        assert_eq!(track.interpolate(-5.0), first.to_matrix());
        assert_eq!(track.interpolate(42.0), last.to_matrix());
    }

    #[test]
    fn test_interior_keyframes_reproduced_exactly() {
        let mid = Keyframe::new(
            1.0,
            Vec3::new(3.0, -1.0, 2.0),
            Vec3::new(1.0, 2.0, 1.0),
            Quat::from_rotation_y(0.7),
        );
        let track = BoneAnimation::new(vec![translation_key(0.0, 0.0), mid, translation_key(2.0, 9.0)]).unwrap();

        assert_eq!(track.sample(1.0), mid);
    }

    #[test]
    fn test_sample_midpoint_lerps_and_slerps() {
        let track = two_key_track();
        let pose = track.sample(0.5);

        assert!((pose.translation - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-5);
        assert!((pose.scale - Vec3::splat(2.0)).length() < 1e-5);

        let expected = Quat::from_rotation_z(FRAC_PI_2 * 0.5);
        assert!(pose.rotation.dot(expected).abs() > 0.9999);
    }

    #[test]
    fn test_slerp_takes_shortest_arc() {
        // q and -q are the same rotation; the midpoint must still be ~45 deg, not ~225 deg
        let end = -Quat::from_rotation_z(FRAC_PI_2);
        let track = BoneAnimation::new(vec![
            Keyframe::new(0.0, Vec3::ZERO, Vec3::ONE, Quat::IDENTITY),
            Keyframe::new(1.0, Vec3::ZERO, Vec3::ONE, end),
        ])
        .unwrap();

        let mid = track.sample(0.5).rotation;
        let p = mid * Vec3::X;
        let expected = Quat::from_rotation_z(FRAC_PI_2 * 0.5) * Vec3::X;
        assert!((p - expected).length() < 1e-4);
    }

    #[test]
    fn test_repeated_time_is_a_jump() {
        let track = BoneAnimation::new(vec![
            translation_key(0.0, 0.0),
            translation_key(1.0, 1.0),
            translation_key(1.0, 5.0),
            translation_key(2.0, 6.0),
        ])
        .unwrap();

        assert_eq!(track.sample(1.0).translation.x, 1.0);
        assert!((track.sample(0.5).translation.x - 0.5).abs() < 1e-6);
        assert!((track.sample(1.5).translation.x - 5.5).abs() < 1e-6);
        assert!(track.sample(1.0).translation.is_finite());
    }

    #[test]
    fn test_repeated_first_time_is_finite() {
        let track = BoneAnimation::new(vec![translation_key(0.0, 1.0), translation_key(0.0, 2.0)]).unwrap();
        assert_eq!(track.sample(0.0).translation.x, 1.0);
        assert_eq!(track.sample(0.1).translation.x, 2.0);
    }

    #[test]
    fn test_constant_track() {
        let kf = translation_key(0.0, 4.0);
        let track = BoneAnimation::constant(kf);
        assert_eq!(track.sample(-1.0), kf);
        assert_eq!(track.sample(10.0), kf);
    }

    #[test]
    fn test_clip_start_and_end_time() {
        let clip = AnimationClip::new(vec![
            BoneAnimation::new(vec![translation_key(0.5, 0.0), translation_key(1.5, 0.0)]).unwrap(),
            BoneAnimation::new(vec![translation_key(-0.25, 0.0), translation_key(1.0, 0.0)]).unwrap(),
            BoneAnimation::new(vec![translation_key(0.0, 0.0), translation_key(2.5, 0.0)]).unwrap(),
        ]);

        assert_eq!(clip.clip_start_time(), -0.25);
        assert_eq!(clip.clip_end_time(), 2.5);
    }

    #[test]
    fn test_clip_interpolates_each_bone_independently() {
        let clip = AnimationClip::new(vec![
            BoneAnimation::new(vec![translation_key(0.0, 0.0), translation_key(1.0, 10.0)]).unwrap(),
            BoneAnimation::new(vec![
                Keyframe::new(0.0, Vec3::ZERO, Vec3::ONE, Quat::IDENTITY),
                Keyframe::new(1.0, Vec3::new(0.0, 5.0, 0.0), Vec3::ONE, Quat::IDENTITY),
            ])
            .unwrap(),
        ]);

        let transforms = clip.sample(0.5);
        assert_eq!(transforms.len(), 2);

        let pos0 = transforms[0].w_axis.truncate();
        let pos1 = transforms[1].w_axis.truncate();
        assert!((pos0 - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-5);
        assert!((pos1 - Vec3::new(0.0, 2.5, 0.0)).length() < 1e-5);
    }

    #[test]
    #[should_panic(expected = "Output array must match clip bone count")]
    fn test_clip_interpolate_checks_output_len() {
        let clip = AnimationClip::new(vec![BoneAnimation::constant(Keyframe::default())]);
        let mut out = vec![Mat4::IDENTITY; 3];
        clip.interpolate(0.0, &mut out);
    }
}
