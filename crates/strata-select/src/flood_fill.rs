//! Region growing from a seed voxel, and seed picking along a view ray.

use std::collections::VecDeque;

use glam::{Vec2, Vec3, Vec4};
use strata_core::{divide, Grid3, Result, StrataError, Transform};

const NEIGHBORS: [[isize; 3]; 6] = [
    [-1, 0, 0],
    [1, 0, 0],
    [0, -1, 0],
    [0, 1, 0],
    [0, 0, -1],
    [0, 0, 1],
];

/// Grows a 6-connected region from `seed` (`[z, y, x]`).
///
/// A voxel joins when its value `v` satisfies `s / threshold < v < s * threshold`,
/// where `s` is the seed value. A seed that fails its own test (zero, negative
/// or non-finite value) yields an empty mask.
pub fn flood_fill(data: &Grid3<f32>, seed: [usize; 3], threshold: f32) -> Result<Grid3<bool>> {
    if !threshold.is_finite() || threshold <= 1.0 {
        return Err(StrataError::InvalidThreshold(threshold));
    }
    let shape = data.shape();
    let Some(&seed_value) = data.get(seed) else {
        return Err(StrataError::SeedOutOfRange { seed, shape });
    };

    let low = seed_value / threshold;
    let high = seed_value * threshold;
    let within = |v: f32| low < v && v < high;

    let mut mask = Grid3::filled(shape, false);
    if !within(seed_value) {
        log::debug!("flood fill seed {seed:?} has value {seed_value}, nothing to grow");
        return Ok(mask);
    }

    let mut queue = VecDeque::from([seed]);
    if let Some(m) = mask.get_mut(seed) {
        *m = true;
    }
    while let Some([z, y, x]) = queue.pop_front() {
        for [dz, dy, dx] in NEIGHBORS {
            let (Some(nz), Some(ny), Some(nx)) = (
                z.checked_add_signed(dz),
                y.checked_add_signed(dy),
                x.checked_add_signed(dx),
            ) else {
                continue;
            };
            let next = [nz, ny, nx];
            match (data.get(next), mask.get_mut(next)) {
                (Some(&v), Some(visited)) if !*visited && within(v) => {
                    *visited = true;
                    queue.push_back(next);
                }
                _ => {}
            }
        }
    }

    log::debug!(
        "flood fill from {seed:?} (threshold {threshold}) grew {} voxels",
        mask.count()
    );
    Ok(mask)
}

/// Finds the brightest voxel under a screen position.
///
/// The segment from `depth_range.0` to `depth_range.1` (in the transform's
/// output depth) is unprojected into voxel space and sampled `samples` times
/// (at least two). Returns the `[z, y, x]` index of the largest finite value
/// hit, or `None` if the segment misses the volume.
pub fn brightest_voxel_along_ray(
    data: &Grid3<f32>,
    transform: &Transform,
    screen: Vec2,
    depth_range: (f32, f32),
    samples: usize,
) -> Result<Option<[usize; 3]>> {
    let to_voxel = transform.clone().inverse().simplify()?;
    let near = divide(to_voxel * Vec4::new(screen.x, screen.y, depth_range.0, 1.0));
    let far = divide(to_voxel * Vec4::new(screen.x, screen.y, depth_range.1, 1.0));
    if !near.is_finite() || !far.is_finite() {
        return Ok(None);
    }

    let samples = samples.max(2);
    let mut best: Option<([usize; 3], f32)> = None;
    for i in 0..samples {
        #[allow(clippy::cast_precision_loss)]
        let t = i as f32 / (samples - 1) as f32;
        let Some(index) = voxel_index(near.lerp(far, t), data.shape()) else {
            continue;
        };
        let Some(&value) = data.get(index) else {
            continue;
        };
        if value.is_finite() && best.map_or(true, |(_, b)| value > b) {
            best = Some((index, value));
        }
    }
    Ok(best.map(|(index, _)| index))
}

/// Rounds a voxel-space position to the `[z, y, x]` index of the voxel whose
/// center is nearest, if inside the grid.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn voxel_index(p: Vec3, shape: [usize; 3]) -> Option<[usize; 3]> {
    let r = p.round();
    if r.cmplt(Vec3::ZERO).any() {
        return None;
    }
    let index = [r.z as usize, r.y as usize, r.x as usize];
    (index[0] < shape[0] && index[1] < shape[1] && index[2] < shape[2]).then_some(index)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    /// A 16^3 zero volume with a cube of value 10 at `[4, 12)` on every axis.
    fn block_volume() -> Grid3<f32> {
        Grid3::from_fn([16, 16, 16], |z, y, x| {
            let inside = |i: usize| (4..12).contains(&i);
            if inside(z) && inside(y) && inside(x) {
                10.0
            } else {
                0.0
            }
        })
    }

    #[test]
    fn test_flood_fill_block() {
        let mask = flood_fill(&block_volume(), [4, 4, 4], 2.0).unwrap();
        assert_eq!(mask.count(), 512);
        assert_eq!(mask.get([7, 7, 7]), Some(&true));
        assert_eq!(mask.get([3, 7, 7]), Some(&false));
    }

    #[test]
    fn test_flood_fill_threshold_bounds_are_strict() {
        let data = Grid3::from_vec([1, 1, 3], vec![4.0, 2.0, 7.9]).unwrap();
        // 4 / 2 = 2 is excluded.
        let mask = flood_fill(&data, [0, 0, 0], 2.0).unwrap();
        assert_eq!(mask.as_slice(), [true, false, false]);

        let data = Grid3::from_vec([1, 1, 3], vec![4.0, 7.9, 2.1]).unwrap();
        let mask = flood_fill(&data, [0, 0, 0], 2.0).unwrap();
        assert_eq!(mask.as_slice(), [true, true, true]);
    }

    #[test]
    fn test_flood_fill_no_diagonal_steps() {
        let mut data = Grid3::filled([1, 2, 2], 0.0);
        *data.get_mut([0, 0, 0]).unwrap() = 5.0;
        *data.get_mut([0, 1, 1]).unwrap() = 5.0;
        let mask = flood_fill(&data, [0, 0, 0], 1.5).unwrap();
        assert_eq!(mask.count(), 1);
    }

    #[test]
    fn test_flood_fill_zero_seed_is_empty() {
        let mask = flood_fill(&block_volume(), [0, 0, 0], 2.0).unwrap();
        assert_eq!(mask.count(), 0);
    }

    #[test]
    fn test_flood_fill_errors() {
        let data = block_volume();
        assert!(matches!(
            flood_fill(&data, [16, 0, 0], 2.0),
            Err(StrataError::SeedOutOfRange { .. })
        ));
        assert!(matches!(
            flood_fill(&data, [5, 5, 5], 1.0),
            Err(StrataError::InvalidThreshold(_))
        ));
        assert!(matches!(
            flood_fill(&data, [5, 5, 5], f32::INFINITY),
            Err(StrataError::InvalidThreshold(_))
        ));
    }

    proptest! {
        #[test]
        fn test_flood_fill_any_seed_in_block(z in 4usize..12, y in 4usize..12, x in 4usize..12) {
            let mask = flood_fill(&block_volume(), [z, y, x], 2.0).unwrap();
            prop_assert_eq!(mask.count(), 512);
        }
    }

    #[test]
    fn test_brightest_voxel_identity() {
        let mut data = Grid3::filled([8, 4, 4], 1.0);
        *data.get_mut([5, 2, 3]).unwrap() = 9.0;
        *data.get_mut([1, 2, 3]).unwrap() = 4.0;

        let hit = brightest_voxel_along_ray(
            &data,
            &Transform::Identity,
            Vec2::new(3.0, 2.0),
            (0.0, 7.0),
            64,
        )
        .unwrap();
        assert_eq!(hit, Some([5, 2, 3]));
    }

    #[test]
    fn test_brightest_voxel_through_scale() {
        let mut data = Grid3::filled([4, 4, 4], 0.0);
        *data.get_mut([2, 1, 3]).unwrap() = 1.0;
        let to_screen = Transform::scale_translate(Vec3::splat(0.5), Vec3::splat(-1.0));

        // Voxel (x=3, y=1) maps to screen (0.5, -0.5).
        let hit = brightest_voxel_along_ray(
            &data,
            &to_screen,
            Vec2::new(0.5, -0.5),
            (-1.0, 1.0),
            32,
        )
        .unwrap();
        assert_eq!(hit, Some([2, 1, 3]));
    }

    #[test]
    fn test_brightest_voxel_miss() {
        let data = Grid3::filled([4, 4, 4], 1.0);
        let hit = brightest_voxel_along_ray(
            &data,
            &Transform::Identity,
            Vec2::new(20.0, 20.0),
            (0.0, 3.0),
            8,
        )
        .unwrap();
        assert_eq!(hit, None);
    }

    #[test]
    fn test_brightest_voxel_unsimplifiable() {
        let data = Grid3::filled([2, 2, 2], 1.0);
        let log = Transform::Log { base: Vec3::splat(10.0) };
        assert!(matches!(
            brightest_voxel_along_ray(&data, &log, Vec2::ZERO, (0.0, 1.0), 4),
            Err(StrataError::UnsimplifiableTransform(_))
        ));
    }
}
