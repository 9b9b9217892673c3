//! A viewer: one point compositor and one volume compositor under a shared
//! view transform.

use glam::{Vec2, Vec3};
use strata_composite::{MultiPointCompositor, MultiVolumeCompositor};
use strata_core::{compose, Grid3, Options, Result, Transform};
use strata_select::{
    brightest_voxel_along_ray, flood_fill, select, ScreenRegion, Selectable, SelectionMask,
};

/// Host-side state for a single 3D view.
#[derive(Debug)]
pub struct Viewer {
    /// Point layers.
    pub points: MultiPointCompositor,
    /// Volume layers over a common voxel grid.
    pub volumes: MultiVolumeCompositor,
    /// World-to-screen transform applied after each layer's own transform.
    pub view: Transform,
}

struct PointTarget<'a> {
    positions: &'a [Vec3],
    transform: Transform,
}

impl Selectable for PointTarget<'_> {
    fn positions(&self) -> Option<&[Vec3]> {
        Some(self.positions)
    }

    fn transform(&self) -> Transform {
        self.transform.clone()
    }
}

struct VoxelTarget {
    shape: [usize; 3],
    transform: Transform,
}

impl Selectable for VoxelTarget {
    fn voxel_shape(&self) -> Option<[usize; 3]> {
        Some(self.shape)
    }

    fn transform(&self) -> Transform {
        self.transform.clone()
    }
}

impl Viewer {
    /// Creates a viewer whose volume layers share `volume_shape`.
    pub fn new(volume_shape: [usize; 3]) -> Self {
        Self::with_options(volume_shape, Options::default())
    }

    /// Creates a viewer with custom options.
    pub fn with_options(volume_shape: [usize; 3], options: Options) -> Self {
        log::info!("creating viewer with volume shape {volume_shape:?}");
        Self {
            points: MultiPointCompositor::with_options(options.clone()),
            volumes: MultiVolumeCompositor::with_options(volume_shape, options),
            view: Transform::Identity,
        }
    }

    /// Settings shared by both compositors.
    pub fn options(&self) -> &Options {
        self.volumes.options()
    }

    /// Full data-to-screen transform for a layer transform.
    pub fn screen_transform(&self, layer_transform: &Transform) -> Transform {
        compose([layer_transform.clone(), self.view.clone()])
    }

    /// Rebuilds whichever compositors have pending changes.
    pub fn refresh(&mut self) {
        if self.points.is_dirty() {
            self.points.rebuild();
        }
        if self.volumes.is_dirty() {
            self.volumes.rebuild();
        }
    }

    /// Selects every visible point layer and every enabled volume layer that
    /// carries data.
    ///
    /// Point masks cover a layer's full position source; points hidden by the
    /// layer's own mask are never selected. `progress` receives the volume
    /// layer label and its completion percentage.
    pub fn select(
        &self,
        region: &dyn ScreenRegion,
        progress: &mut dyn FnMut(&str, f32),
    ) -> Vec<(String, SelectionMask)> {
        let chunk_budget = self.options().chunk_budget;
        let mut out = Vec::new();

        for layer in self.points.layers().in_draw_order() {
            if !layer.visible {
                continue;
            }
            let Ok(positions) = self.points.layer_positions(layer.label()) else {
                continue;
            };
            let target = PointTarget {
                positions,
                transform: self.screen_transform(&layer.transform),
            };
            let Some(SelectionMask::Points(mut mask)) =
                select(&target, region, chunk_budget, &mut |_| {})
            else {
                continue;
            };
            if let Some(visible) = layer.attrs.mask().filter(|m| m.len() == mask.len()) {
                for (m, &v) in mask.iter_mut().zip(visible) {
                    *m &= v;
                }
            }
            out.push((layer.label().to_string(), SelectionMask::Points(mask)));
        }

        for layer in self.volumes.layers().in_allocation_order() {
            if !layer.visible || layer.attrs.data().is_none() {
                continue;
            }
            let target = VoxelTarget {
                shape: self.volumes.shape(),
                transform: self.screen_transform(&layer.transform),
            };
            let label = layer.label();
            if let Some(mask) = select(&target, region, chunk_budget, &mut |p| {
                progress(label, p);
            }) {
                out.push((label.to_string(), mask));
            }
        }

        log::info!(
            "selection hit {} elements across {} layers",
            out.iter().map(|(_, m)| m.count()).sum::<usize>(),
            out.len()
        );
        out
    }

    /// Grows a region in a volume layer from the brightest voxel under
    /// `screen`.
    ///
    /// Returns `Ok(None)` if the layer has no data or the ray misses the
    /// volume.
    pub fn grow_region(
        &self,
        label: &str,
        screen: Vec2,
        depth_range: (f32, f32),
        threshold: f32,
    ) -> Result<Option<Grid3<bool>>> {
        let layer = self.volumes.layers().get(label)?;
        let Some(data) = layer.attrs.data() else {
            return Ok(None);
        };
        let transform = self.screen_transform(&layer.transform);
        let samples = data.shape().into_iter().max().unwrap_or(1) * 2;
        match brightest_voxel_along_ray(data, &transform, screen, depth_range, samples)? {
            Some(seed) => flood_fill(data, seed, threshold).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use strata_select::Rectangle;

    use super::*;

    #[test]
    fn test_screen_transform_applies_view_last() {
        let mut viewer = Viewer::new([1, 1, 1]);
        viewer.view = Transform::scale_translate(Vec3::splat(2.0), Vec3::ZERO);
        let layer = Transform::scale_translate(Vec3::ONE, Vec3::X);
        let m = viewer.screen_transform(&layer).simplify().unwrap();
        assert_eq!(m.transform_point3(Vec3::ZERO), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_select_respects_layer_mask() {
        let mut viewer = Viewer::new([1, 1, 1]);
        viewer.points.set_shared_positions(vec![Vec3::ZERO, Vec3::splat(0.5)]);
        viewer.points.allocate("a").unwrap();
        viewer.points.set_mask("a", Some(vec![false, true])).unwrap();

        let rect = Rectangle::new(Vec2::splat(-1.0), Vec2::splat(1.0));
        let hits = viewer.select(&rect, &mut |_, _| {});
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].1.as_points(), Some(&[false, true][..]));
    }

    #[test]
    fn test_select_uses_compositor_chunk_budget() {
        let options = Options {
            chunk_budget: 16,
            ..Options::default()
        };
        let mut viewer = Viewer::with_options([4, 4, 4], options);
        assert_eq!(viewer.options(), viewer.points.options());
        assert_eq!(viewer.options().chunk_budget, 16);

        viewer.volumes.allocate("v").unwrap();
        viewer
            .volumes
            .set_volume(
                "v",
                Grid3::filled([4, 4, 4], 1.0),
                (0.0, 1.0),
                strata_core::ColorRamp::fade_in(Vec3::ONE),
            )
            .unwrap();
        let rect = Rectangle::new(Vec2::ZERO, Vec2::splat(3.0));
        let mut reports = 0;
        let hits = viewer.select(&rect, &mut |_, _| reports += 1);
        assert_eq!(hits[0].1.count(), 64);
        // 0.0 plus one report per 16-voxel slab.
        assert_eq!(reports, 5);
    }

    #[test]
    fn test_grow_region_without_data() {
        let mut viewer = Viewer::new([2, 2, 2]);
        viewer.volumes.allocate("empty").unwrap();
        let grown = viewer
            .grow_region("empty", Vec2::ZERO, (0.0, 1.0), 2.0)
            .unwrap();
        assert!(grown.is_none());
        assert!(viewer.grow_region("missing", Vec2::ZERO, (0.0, 1.0), 2.0).is_err());
    }
}
