//! Mapping data through the transform stack into screen-space masks.

use glam::{Mat4, Vec2, Vec3};
use strata_core::{divide, shape_len, voxel_position, Grid3, Transform};

use crate::region::ScreenRegion;

/// Maps data positions to screen coordinates.
///
/// Uses one flattened matrix when the transform allows it and falls back to
/// per-point mapping otherwise.
enum Projector<'a> {
    Matrix(Mat4),
    PerPoint(&'a Transform),
}

impl<'a> Projector<'a> {
    fn new(transform: &'a Transform) -> Self {
        match transform.simplify() {
            Ok(m) => Self::Matrix(m),
            Err(err) => {
                log::debug!("selection falls back to per-point mapping: {err}");
                Self::PerPoint(transform)
            }
        }
    }

    fn project(&self, p: Vec3) -> Vec2 {
        let h = match self {
            Self::Matrix(m) => *m * p.extend(1.0),
            Self::PerPoint(t) => t.apply(p.extend(1.0)),
        };
        divide(h).truncate()
    }

    fn project_all(&self, points: impl Iterator<Item = Vec3>) -> (Vec<f32>, Vec<f32>) {
        points.map(|p| self.project(p)).map(|s| (s.x, s.y)).unzip()
    }
}

/// Maps positions to screen space (perspective division included).
pub fn screen_coords(positions: &[Vec3], transform: &Transform) -> (Vec<f32>, Vec<f32>) {
    Projector::new(transform).project_all(positions.iter().copied())
}

/// Flags the positions whose screen projection falls inside `region`.
pub fn point_mask(
    positions: &[Vec3],
    transform: &Transform,
    region: &dyn ScreenRegion,
) -> Vec<bool> {
    if region.is_degenerate() {
        return vec![false; positions.len()];
    }
    let (xs, ys) = screen_coords(positions, transform);
    region.contains(&xs, &ys)
}

/// Number of voxels evaluated per chunk for a `chunk_budget`.
///
/// Chunks are whole `[height, width]` slabs when a slab fits the budget, else
/// whole rows of a slab, else runs within a row. The result is never larger
/// than the budget and is at least one.
pub fn chunk_len(shape: [usize; 3], chunk_budget: usize) -> usize {
    let budget = chunk_budget.max(1);
    let row = shape[2].max(1);
    let slab = (shape[1] * shape[2]).max(1);
    if budget >= slab {
        budget / slab * slab
    } else if budget >= row {
        budget / row * row
    } else {
        budget
    }
}

/// Flags the voxels of a `[depth, height, width]` grid whose centers project
/// inside `region`.
///
/// Voxel coordinates are generated one contiguous chunk of [`chunk_len`]
/// voxels at a time, so no more than `chunk_budget` positions exist at once.
/// `progress` receives `0.0` before the first chunk and the completed
/// percentage after each chunk, ending with `100.0`.
pub fn volume_mask(
    shape: [usize; 3],
    transform: &Transform,
    region: &dyn ScreenRegion,
    chunk_budget: usize,
    progress: &mut dyn FnMut(f32),
) -> Grid3<bool> {
    let mut mask = Grid3::filled(shape, false);
    progress(0.0);
    let total = shape_len(shape);
    if region.is_degenerate() || total == 0 {
        progress(100.0);
        return mask;
    }

    let projector = Projector::new(transform);
    let step = chunk_len(shape, chunk_budget);

    let mut start = 0;
    while start < total {
        let end = (start + step).min(total);
        let voxels = (start..end).map(|i| voxel_position(mask.unflatten(i)));
        let (xs, ys) = projector.project_all(voxels);
        let hits = region.contains(&xs, &ys);
        mask.as_mut_slice()[start..end].copy_from_slice(&hits);

        #[allow(clippy::cast_precision_loss)]
        let done = 100.0 * end as f32 / total as f32;
        log::debug!("volume mask: voxels {start}..{end} of {total} ({done:.1}%)");
        progress(done);
        start = end;
    }
    mask
}
