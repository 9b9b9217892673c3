//! Uniform selection over point and volume layers.

use glam::Vec3;
use strata_core::{Grid3, Transform};

use crate::geometry::{point_mask, volume_mask};
use crate::region::ScreenRegion;

/// Something whose elements can be tested against a screen region.
///
/// Point-like layers expose [`positions`](Selectable::positions); volume
/// layers expose [`voxel_shape`](Selectable::voxel_shape). If both are
/// present the positions win.
pub trait Selectable {
    /// Data-space positions, one per element.
    fn positions(&self) -> Option<&[Vec3]> {
        None
    }

    /// `[depth, height, width]` of the voxel grid.
    fn voxel_shape(&self) -> Option<[usize; 3]> {
        None
    }

    /// Full data-to-screen transform.
    fn transform(&self) -> Transform;
}

/// Result of selecting a single layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionMask {
    /// One flag per position of a point layer.
    Points(Vec<bool>),
    /// One flag per voxel, in the layer's `[depth, height, width]` shape.
    Voxels(Grid3<bool>),
}

impl SelectionMask {
    /// Number of selected elements.
    pub fn count(&self) -> usize {
        match self {
            Self::Points(mask) => mask.iter().filter(|&&m| m).count(),
            Self::Voxels(mask) => mask.count(),
        }
    }

    /// Returns true if nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Returns the point mask, if this is one.
    pub fn as_points(&self) -> Option<&[bool]> {
        match self {
            Self::Points(mask) => Some(mask),
            Self::Voxels(_) => None,
        }
    }

    /// Returns the voxel mask, if this is one.
    pub fn as_voxels(&self) -> Option<&Grid3<bool>> {
        match self {
            Self::Voxels(mask) => Some(mask),
            Self::Points(_) => None,
        }
    }
}

/// Selects the elements of `layer` that fall inside `region`.
///
/// Returns `None` for layers with neither positions nor a voxel grid.
/// `progress` is only called for volumes.
pub fn select(
    layer: &dyn Selectable,
    region: &dyn ScreenRegion,
    chunk_budget: usize,
    progress: &mut dyn FnMut(f32),
) -> Option<SelectionMask> {
    let transform = layer.transform();
    if let Some(positions) = layer.positions() {
        return Some(SelectionMask::Points(point_mask(positions, &transform, region)));
    }
    layer.voxel_shape().map(|shape| {
        SelectionMask::Voxels(volume_mask(shape, &transform, region, chunk_budget, progress))
    })
}
