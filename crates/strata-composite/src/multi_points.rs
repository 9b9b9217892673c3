//! Multi-layer scatter compositor.
//!
//! Many labelled point layers, each with its own color, size, alpha, mask,
//! visibility and z-order, are merged into one vertex buffer so the whole
//! scatter plot is drawn in a single call. Layers draw from a shared position
//! source unless they carry their own positions.

use std::ops::Range;

use glam::{Vec3, Vec4};
use strata_core::{Layer, LayerRegistry, Options, Result, Transform};

use crate::notify::RedrawNotifier;
use crate::vertex::PointVertex;

/// Fixed or per-point color.
#[derive(Debug, Clone, PartialEq)]
pub enum PointColor {
    /// One RGBA color for every point.
    Uniform(Vec4),
    /// One RGBA color per source point (before masking).
    PerPoint(Vec<Vec4>),
}

/// Fixed or per-point marker size.
#[derive(Debug, Clone, PartialEq)]
pub enum PointSize {
    /// One size for every point.
    Uniform(f32),
    /// One size per source point (before masking).
    PerPoint(Vec<f32>),
}

/// Style attributes of one point layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PointStyle {
    positions: Option<Vec<Vec3>>,
    mask: Option<Vec<bool>>,
    color: Option<PointColor>,
    size: Option<PointSize>,
    alpha: f32,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            positions: None,
            mask: None,
            color: None,
            size: None,
            alpha: 1.0,
        }
    }
}

impl PointStyle {
    /// Layer-specific positions, if the layer does not use the shared array.
    pub fn positions(&self) -> Option<&[Vec3]> {
        self.positions.as_deref()
    }

    /// Visibility mask over the layer's position source.
    pub fn mask(&self) -> Option<&[bool]> {
        self.mask.as_deref()
    }

    /// Opacity applied to every point of the layer.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

/// The merged output of a [`MultiPointCompositor`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedBuffer {
    /// Vertex positions, layers concatenated in draw order.
    pub positions: Vec<Vec3>,
    /// Per-vertex RGBA colors.
    pub colors: Vec<Vec4>,
    /// Per-vertex marker sizes.
    pub sizes: Vec<f32>,
    /// Vertex range occupied by each contributing layer, in draw order.
    pub ranges: Vec<(String, Range<usize>)>,
}

impl CombinedBuffer {
    /// Returns the number of vertices.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if no layer contributed any vertex.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns the vertex range of a layer, if it contributed.
    pub fn layer_range(&self, label: &str) -> Option<Range<usize>> {
        self.ranges
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, r)| r.clone())
    }

    /// Returns the layer owning a vertex index (e.g. a GPU pick result).
    pub fn layer_at(&self, vertex: usize) -> Option<(&str, usize)> {
        self.ranges
            .iter()
            .find(|(_, r)| r.contains(&vertex))
            .map(|(l, r)| (l.as_str(), vertex - r.start))
    }

    /// Axis-aligned bounds of all vertices.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p))),
        )
    }

    /// Interleaves the buffer into GPU vertices.
    pub fn vertices(&self) -> Vec<PointVertex> {
        self.positions
            .iter()
            .zip(&self.colors)
            .zip(&self.sizes)
            .map(|((p, c), s)| PointVertex {
                position: p.to_array(),
                size: *s,
                color: c.to_array(),
            })
            .collect()
    }
}

/// Merges labelled point layers into one [`CombinedBuffer`].
#[derive(Debug, Default)]
pub struct MultiPointCompositor {
    layers: LayerRegistry<PointStyle>,
    shared_positions: Vec<Vec3>,
    options: Options,
    combined: CombinedBuffer,
    notifier: RedrawNotifier,
}

impl MultiPointCompositor {
    /// Creates an empty compositor with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty compositor with the given options.
    pub fn with_options(options: Options) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Returns the options in use.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Returns the layer registry.
    pub fn layers(&self) -> &LayerRegistry<PointStyle> {
        &self.layers
    }

    /// Allocates a new layer. Fails if the label exists.
    pub fn allocate(&mut self, label: impl Into<String>) -> Result<()> {
        self.layers.allocate(label)?;
        Ok(())
    }

    /// Removes a layer and all of its state.
    pub fn deallocate(&mut self, label: &str) -> Result<()> {
        self.layers.deallocate(label)?;
        Ok(())
    }

    /// Sets the position source used by layers without their own positions.
    pub fn set_shared_positions(&mut self, positions: Vec<Vec3>) {
        self.shared_positions = positions;
        self.layers.mark_dirty();
    }

    /// Returns the shared position source.
    pub fn shared_positions(&self) -> &[Vec3] {
        &self.shared_positions
    }

    /// Gives a layer its own positions, or `None` to use the shared source.
    pub fn set_positions(&mut self, label: &str, positions: Option<Vec<Vec3>>) -> Result<()> {
        self.layers.get_mut(label)?.attrs.positions = positions;
        Ok(())
    }

    /// Sets the subset mask of a layer, or `None` for all points.
    pub fn set_mask(&mut self, label: &str, mask: Option<Vec<bool>>) -> Result<()> {
        self.layers.get_mut(label)?.attrs.mask = mask;
        Ok(())
    }

    /// Sets the color of a layer.
    pub fn set_color(&mut self, label: &str, color: PointColor) -> Result<()> {
        self.layers.get_mut(label)?.attrs.color = Some(color);
        Ok(())
    }

    /// Sets the marker size of a layer.
    pub fn set_size(&mut self, label: &str, size: PointSize) -> Result<()> {
        self.layers.get_mut(label)?.attrs.size = Some(size);
        Ok(())
    }

    /// Sets the layer opacity, multiplied into each color's alpha.
    pub fn set_alpha(&mut self, label: &str, alpha: f32) -> Result<()> {
        self.layers.get_mut(label)?.attrs.alpha = alpha.clamp(0.0, 1.0);
        Ok(())
    }

    /// Sets the draw order key of a layer.
    pub fn set_zorder(&mut self, label: &str, zorder: f32) -> Result<()> {
        self.layers.set_zorder(label, zorder)
    }

    /// Shows or hides a layer.
    pub fn set_visible(&mut self, label: &str, visible: bool) -> Result<()> {
        self.layers.set_visible(label, visible)
    }

    /// Sets the normalization transform of a layer.
    pub fn set_transform(&mut self, label: &str, transform: Transform) -> Result<()> {
        self.layers.set_transform(label, transform)
    }

    /// Returns the full (unmasked) position source of a layer.
    pub fn layer_positions(&self, label: &str) -> Result<&[Vec3]> {
        let layer = self.layers.get(label)?;
        Ok(self.source_of(layer))
    }

    /// Returns the number of points a layer would contribute if visible.
    pub fn active_count(&self, label: &str) -> Result<usize> {
        let layer = self.layers.get(label)?;
        let n = self.source_of(layer).len();
        Ok(match &layer.attrs.mask {
            Some(mask) if mask.len() == n => mask.iter().filter(|&&m| m).count(),
            Some(_) => 0,
            None => n,
        })
    }

    /// Installs a callback run after every rebuild.
    pub fn set_redraw_callback(&mut self, callback: impl FnMut() + 'static) {
        self.notifier.set_callback(callback);
    }

    /// Number of rebuilds performed so far.
    pub fn rebuild_count(&self) -> u64 {
        self.notifier.count()
    }

    /// Returns whether the merged buffer is stale.
    pub fn is_dirty(&self) -> bool {
        self.layers.is_dirty()
    }

    /// Returns the merged buffer, rebuilding first if it is stale.
    pub fn combined(&mut self) -> &CombinedBuffer {
        if self.layers.is_dirty() {
            self.rebuild();
        }
        &self.combined
    }

    /// Merges all visible layers into one buffer and requests a redraw.
    ///
    /// Layers are concatenated by ascending z-order, ties broken by allocation
    /// order. Hidden layers and layers with no active point contribute nothing.
    pub fn rebuild(&mut self) -> &CombinedBuffer {
        let mut out = CombinedBuffer::default();
        for layer in self.layers.in_draw_order() {
            if layer.visible {
                self.append_layer(layer, &mut out);
            }
        }
        log::debug!(
            "rebuilt point buffer: {} vertices from {} layers",
            out.len(),
            out.ranges.len()
        );
        self.combined = out;
        self.layers.clear_dirty();
        self.notifier.notify();
        &self.combined
    }

    fn source_of<'a>(&'a self, layer: &'a Layer<PointStyle>) -> &'a [Vec3] {
        layer
            .attrs
            .positions
            .as_deref()
            .unwrap_or(&self.shared_positions)
    }

    fn append_layer(&self, layer: &Layer<PointStyle>, out: &mut CombinedBuffer) {
        let style = &layer.attrs;
        let source = self.source_of(layer);
        let n = source.len();

        let mask = match &style.mask {
            Some(mask) if mask.len() != n => {
                log::warn!(
                    "layer '{}': mask has {} entries for {} points, skipping",
                    layer.label(),
                    mask.len(),
                    n
                );
                return;
            }
            other => other.as_deref(),
        };

        let fallback_color;
        let colors = match &style.color {
            Some(PointColor::PerPoint(c)) if c.len() != n => {
                log::warn!(
                    "layer '{}': {} colors for {} points, using default color",
                    layer.label(),
                    c.len(),
                    n
                );
                fallback_color = PointColor::Uniform(self.options.default_point_color);
                &fallback_color
            }
            Some(color) => color,
            None => {
                fallback_color = PointColor::Uniform(self.options.default_point_color);
                &fallback_color
            }
        };
        let fallback_size;
        let sizes = match &style.size {
            Some(PointSize::PerPoint(s)) if s.len() != n => {
                log::warn!(
                    "layer '{}': {} sizes for {} points, using default size",
                    layer.label(),
                    s.len(),
                    n
                );
                fallback_size = PointSize::Uniform(self.options.default_point_size);
                &fallback_size
            }
            Some(size) => size,
            None => {
                fallback_size = PointSize::Uniform(self.options.default_point_size);
                &fallback_size
            }
        };

        let start = out.len();
        for (i, position) in source.iter().enumerate() {
            if mask.is_some_and(|m| !m[i]) {
                continue;
            }
            let mut color = match colors {
                PointColor::Uniform(c) => *c,
                PointColor::PerPoint(c) => c[i],
            };
            color.w *= style.alpha;
            out.positions.push(*position);
            out.colors.push(color);
            out.sizes.push(match sizes {
                PointSize::Uniform(s) => *s,
                PointSize::PerPoint(s) => s[i],
            });
        }
        if out.len() > start {
            out.ranges.push((layer.label().to_string(), start..out.len()));
        }
    }
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;

    #[derive(Debug, Clone)]
    enum Op {
        Allocate(usize),
        Deallocate(usize),
        Mask(usize, Option<Vec<bool>>),
        Visible(usize, bool),
        Zorder(usize, f32),
        Alpha(usize, f32),
    }

    const POINTS: usize = 6;

    fn op() -> impl Strategy<Value = Op> {
        let label = 0usize..4;
        prop_oneof![
            label.clone().prop_map(Op::Allocate),
            label.clone().prop_map(Op::Deallocate),
            (
                label.clone(),
                prop::option::of(prop::collection::vec(any::<bool>(), POINTS))
            )
                .prop_map(|(l, m)| Op::Mask(l, m)),
            (label.clone(), any::<bool>()).prop_map(|(l, v)| Op::Visible(l, v)),
            (label.clone(), -5.0f32..5.0).prop_map(|(l, z)| Op::Zorder(l, z)),
            (label, 0.0f32..1.0).prop_map(|(l, a)| Op::Alpha(l, a)),
        ]
    }

    proptest! {
        #[test]
        fn vertex_count_matches_active_points(ops in prop::collection::vec(op(), 0..40)) {
            let mut comp = MultiPointCompositor::new();
            comp.set_shared_positions(vec![Vec3::ZERO; POINTS]);
            for op in ops {
                // Errors from unallocated labels are expected and leave state untouched.
                let _ = match op {
                    Op::Allocate(l) => comp.allocate(format!("l{l}")),
                    Op::Deallocate(l) => comp.deallocate(&format!("l{l}")),
                    Op::Mask(l, m) => comp.set_mask(&format!("l{l}"), m),
                    Op::Visible(l, v) => comp.set_visible(&format!("l{l}"), v),
                    Op::Zorder(l, z) => comp.set_zorder(&format!("l{l}"), z),
                    Op::Alpha(l, a) => comp.set_alpha(&format!("l{l}"), a),
                };
            }
            let expected: usize = comp
                .layers()
                .in_allocation_order()
                .into_iter()
                .filter(|l| l.visible)
                .map(|l| comp.active_count(l.label()).unwrap())
                .sum();
            prop_assert_eq!(comp.rebuild().len(), expected);
        }
    }
}
