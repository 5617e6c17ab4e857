/// Spread `workgroups_needed` over x, then y, then z so no dimension exceeds
/// `max_dim`. Kernels rebuild the linear id from `num_workgroups`.
pub fn split_dispatch_3d(workgroups_needed: u32, max_dim: u32) -> [u32; 3] {
    let x = workgroups_needed.min(max_dim).max(1);
    let remaining_after_x = workgroups_needed.div_ceil(x);
    let y = remaining_after_x.min(max_dim).max(1);

    let xy = (x as u64) * (y as u64);
    let z = (workgroups_needed as u64).div_ceil(xy).max(1);
    assert!(z <= max_dim as u64, "dispatch exceeds max_dim^3");

    [x, y, z as u32]
}

/// Workgroups covering `items` invocations at `group_size` per group.
pub fn dispatch_for_items(items: u32, group_size: u32, max_dim: u32) -> [u32; 3] {
    split_dispatch_3d(items.div_ceil(group_size), max_dim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_dispatch_stays_one_dimensional() {
        assert_eq!(split_dispatch_3d(3, 65535), [3, 1, 1]);
        assert_eq!(dispatch_for_items(257, 256, 65535), [2, 1, 1]);
        assert_eq!(dispatch_for_items(256, 256, 65535), [1, 1, 1]);
    }

    #[test]
    fn zero_items_still_launches_one_guarded_group() {
        assert_eq!(dispatch_for_items(0, 256, 65535), [1, 1, 1]);
    }

    #[test]
    fn large_dispatch_spills_into_y_and_covers_everything() {
        let [x, y, z] = split_dispatch_3d(70_000, 65535);
        assert_eq!(x, 65535);
        assert_eq!(y, 2);
        assert_eq!(z, 1);
        assert!(x as u64 * y as u64 * z as u64 >= 70_000);
    }

    #[test]
    fn tiny_limit_uses_z() {
        let [x, y, z] = split_dispatch_3d(25, 3);
        assert_eq!([x, y], [3, 3]);
        assert_eq!(z, 3);
        assert!(x * y * z >= 25);
    }
}
