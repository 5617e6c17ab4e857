use glam::{Vec3, Vec4};

/// Fixed-point scale applied to camera depth before it is folded into a key.
pub const DEFAULT_DEPTH_SCALE: f32 = 65536.0;

/// Fold a camera-relative depth into a sortable key.
///
/// Ascending keys walk from the farthest primitive to the nearest one. The
/// float to integer conversion saturates (negative depths clamp to zero), which
/// matches what WGSL's `u32()` does in the key kernel.
#[inline]
pub fn depth_key(depth: f32, scale: f32) -> u32 {
    u32::MAX - (depth * scale) as u32
}

/// Signed distance of `position` from `eye` along `forward`.
#[inline]
pub fn camera_depth(position: Vec3, eye: Vec3, forward: Vec3) -> f32 {
    (position - eye).dot(forward)
}

/// Host-side key pass: one key per position and the identity permutation.
pub fn fill_depth_keys(
    positions: &[Vec4],
    eye: Vec3,
    forward: Vec3,
    scale: f32,
    keys: &mut [u32],
    values: &mut [u32],
) {
    debug_assert_eq!(positions.len(), keys.len());
    debug_assert_eq!(positions.len(), values.len());
    for (i, ((position, key), value)) in positions
        .iter()
        .zip(keys.iter_mut())
        .zip(values.iter_mut())
        .enumerate()
    {
        *key = depth_key(camera_depth(position.truncate(), eye, forward), scale);
        *value = i as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn farther_depth_gets_smaller_key() {
        let near = depth_key(1.0, DEFAULT_DEPTH_SCALE);
        let far = depth_key(4.0, DEFAULT_DEPTH_SCALE);
        assert!(far < near);
        assert_eq!(near, u32::MAX - 65536);
    }

    #[test]
    fn behind_camera_saturates_to_max() {
        assert_eq!(depth_key(-3.0, DEFAULT_DEPTH_SCALE), u32::MAX);
        assert_eq!(depth_key(0.0, DEFAULT_DEPTH_SCALE), u32::MAX);
    }

    #[test]
    fn very_far_depth_saturates_to_zero() {
        assert_eq!(depth_key(1.0e9, DEFAULT_DEPTH_SCALE), 0);
    }

    #[test]
    fn sub_quantum_depths_collide() {
        let a = depth_key(2.0, DEFAULT_DEPTH_SCALE);
        let b = depth_key(2.0 + 1.0e-6, DEFAULT_DEPTH_SCALE);
        assert_eq!(a, b);
    }

    #[test]
    fn fill_resets_identity_and_is_deterministic() {
        let positions = [
            Vec4::new(0.0, 0.0, -1.0, 1.0),
            Vec4::new(0.0, 0.0, -2.0, 1.0),
            Vec4::new(0.0, 0.0, -3.0, 1.0),
            Vec4::new(0.0, 0.0, -4.0, 1.0),
        ];
        let forward = Vec3::NEG_Z;
        let mut keys = [0u32; 4];
        let mut values = [7u32, 7, 7, 7];
        fill_depth_keys(
            &positions,
            Vec3::ZERO,
            forward,
            DEFAULT_DEPTH_SCALE,
            &mut keys,
            &mut values,
        );
        assert_eq!(values, [0, 1, 2, 3]);

        let mut again = [0u32; 4];
        let mut values_again = [0u32; 4];
        fill_depth_keys(
            &positions,
            Vec3::ZERO,
            forward,
            DEFAULT_DEPTH_SCALE,
            &mut again,
            &mut values_again,
        );
        assert_eq!(keys, again);

        let mut order: Vec<u32> = values.to_vec();
        order.sort_by_key(|&i| keys[i as usize]);
        assert_eq!(order, [3, 2, 1, 0]);
    }
}
