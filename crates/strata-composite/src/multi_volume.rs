//! Multi-layer volume compositor.
//!
//! All enabled volume layers are packed into one scalar field so a single
//! ray-marching pass renders them. The base layer is normalized into `[0, 1)`;
//! every further layer (a subset mask, or another volume) claims cells by
//! shifting them into its own band `[k * (1 + D), k * (1 + D) + 1)`, where `D`
//! is the guard gap. A [`CompositeRamp`] maps each band back to that layer's
//! colors and keeps the gaps between bands transparent.
//!
//! Cells are claimed first-come-first-served in allocation order: once a cell
//! has been moved out of the base band, later layers leave it alone.

use glam::{Vec3, Vec4};
use strata_core::{
    ColorRamp, Grid3, Layer, LayerRegistry, Options, Result, StrataError, Transform,
};

use crate::notify::RedrawNotifier;
use crate::vertex::RampTexel;

/// Attributes of one volume layer.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeStyle {
    data: Option<Grid3<f32>>,
    mask: Option<Grid3<bool>>,
    clim: Option<(f32, f32)>,
    ramp: ColorRamp,
    weight: f32,
    multiply: Option<String>,
}

impl Default for VolumeStyle {
    fn default() -> Self {
        Self {
            data: None,
            mask: None,
            clim: None,
            ramp: ColorRamp::fade_in(Vec3::ONE),
            weight: 1.0,
            multiply: None,
        }
    }
}

impl VolumeStyle {
    /// Returns the scalar field, if any.
    pub fn data(&self) -> Option<&Grid3<f32>> {
        self.data.as_ref()
    }

    /// Returns the subset mask, if any.
    pub fn mask(&self) -> Option<&Grid3<bool>> {
        self.mask.as_ref()
    }

    /// Returns the layer weight (opacity scale).
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Clamp range in use: the explicit one, else the finite data range.
    pub fn effective_clim(&self) -> (f32, f32) {
        self.clim
            .or_else(|| self.data.as_ref().and_then(Grid3::finite_range))
            .unwrap_or((0.0, 1.0))
    }

    fn participates(&self) -> bool {
        self.data.is_some() || self.mask.is_some()
    }
}

/// Color source of one ramp stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopColor {
    /// Fully transparent.
    Transparent,
    /// Position `t` in `[0, 1]` along the ramp of band `band`.
    Band { band: usize, t: f32 },
}

/// One control point of a [`CompositeRamp`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampStop {
    /// Position in the packed intensity domain.
    pub position: f32,
    /// Color at this position.
    pub color: StopColor,
}

/// Piecewise transfer function over the packed intensity domain.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompositeRamp {
    stops: Vec<RampStop>,
    band_ramps: Vec<(ColorRamp, f32)>,
}

impl CompositeRamp {
    fn build(band_ramps: Vec<(ColorRamp, f32)>, options: &Options) -> Self {
        let stride = options.band_stride();
        let mut stops = Vec::with_capacity(4 * band_ramps.len() + 2);
        stops.push(RampStop {
            position: -options.guard_gap,
            color: StopColor::Transparent,
        });
        for band in 0..band_ramps.len() {
            #[allow(clippy::cast_precision_loss)]
            let lo = band as f32 * stride;
            stops.extend([
                RampStop {
                    position: lo,
                    color: StopColor::Transparent,
                },
                RampStop {
                    position: lo,
                    color: StopColor::Band { band, t: 0.0 },
                },
                RampStop {
                    position: lo + 1.0,
                    color: StopColor::Band { band, t: 1.0 },
                },
                RampStop {
                    position: lo + 1.0,
                    color: StopColor::Transparent,
                },
            ]);
        }
        #[allow(clippy::cast_precision_loss)]
        let end = band_ramps.len() as f32 * stride;
        stops.push(RampStop {
            position: end,
            color: StopColor::Transparent,
        });
        Self { stops, band_ramps }
    }

    /// Control points, sorted by position.
    pub fn stops(&self) -> &[RampStop] {
        &self.stops
    }

    /// Number of bands described by this ramp.
    pub fn num_bands(&self) -> usize {
        self.band_ramps.len()
    }

    /// Evaluates the transfer function at a packed intensity.
    pub fn sample(&self, value: f32) -> Vec4 {
        let segment = self
            .stops
            .windows(2)
            .find(|w| w[0].position <= value && value < w[1].position);
        let Some([a, b]) = segment else {
            return Vec4::ZERO;
        };
        match (a.color, b.color) {
            (StopColor::Band { band, t: ta }, StopColor::Band { band: other, t: tb })
                if band == other =>
            {
                let frac = (value - a.position) / (b.position - a.position);
                let (ramp, weight) = &self.band_ramps[band];
                let mut color = ramp.sample(ta + (tb - ta) * frac);
                color.w *= weight;
                color
            }
            _ => Vec4::ZERO,
        }
    }

    /// Bakes the transfer function into `texels` evenly spaced samples over
    /// `[0, domain_max]`, e.g. for upload as a 1D lookup texture.
    #[allow(clippy::cast_precision_loss)]
    pub fn bake(&self, texels: usize, domain_max: f32) -> Vec<RampTexel> {
        let step = if texels > 1 {
            domain_max / (texels - 1) as f32
        } else {
            0.0
        };
        (0..texels)
            .map(|i| self.sample(i as f32 * step).to_array())
            .collect()
    }
}

/// The packed output of a [`MultiVolumeCompositor`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CombinedVolumeField {
    /// Packed intensities.
    pub field: Option<Grid3<f32>>,
    /// Transfer function over the packed intensities.
    pub ramp: CompositeRamp,
    /// Layer label of each band, base first.
    pub bands: Vec<String>,
    /// Upper end of the packed domain.
    pub domain_max: f32,
}

impl CombinedVolumeField {
    /// Returns the band index a packed value falls into, if any.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn band_of(&self, value: f32, options: &Options) -> Option<usize> {
        if !(value >= 0.0 && value < self.domain_max) {
            return None;
        }
        let stride = options.band_stride();
        let band = (value / stride).floor();
        (value - band * stride < 1.0).then_some(band as usize)
    }
}

/// Packs labelled volume layers into one [`CombinedVolumeField`].
#[derive(Debug)]
pub struct MultiVolumeCompositor {
    shape: [usize; 3],
    layers: LayerRegistry<VolumeStyle>,
    options: Options,
    downsampled: bool,
    combined: CombinedVolumeField,
    notifier: RedrawNotifier,
}

impl MultiVolumeCompositor {
    /// Creates a compositor for volumes of the given `[depth, height, width]` shape.
    pub fn new(shape: [usize; 3]) -> Self {
        Self::with_options(shape, Options::default())
    }

    /// Creates a compositor with the given options.
    pub fn with_options(shape: [usize; 3], options: Options) -> Self {
        Self {
            shape,
            layers: LayerRegistry::new(),
            options,
            downsampled: false,
            combined: CombinedVolumeField::default(),
            notifier: RedrawNotifier::default(),
        }
    }

    /// Returns the full-resolution volume shape.
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Returns the options in use.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Returns the layer registry.
    pub fn layers(&self) -> &LayerRegistry<VolumeStyle> {
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

    /// Sets the scalar field, clamp range and color ramp of a layer.
    pub fn set_volume(
        &mut self,
        label: &str,
        data: Grid3<f32>,
        clim: (f32, f32),
        ramp: ColorRamp,
    ) -> Result<()> {
        self.layers.get(label)?;
        self.check_shape(data.shape())?;
        check_clim(clim)?;
        let attrs = &mut self.layers.get_mut(label)?.attrs;
        attrs.data = Some(data);
        attrs.clim = Some(clim);
        attrs.ramp = ramp;
        Ok(())
    }

    /// Sets the clamp range, or `None` to use the data's finite range.
    pub fn set_clim(&mut self, label: &str, clim: Option<(f32, f32)>) -> Result<()> {
        self.layers.get(label)?;
        if let Some(clim) = clim {
            check_clim(clim)?;
        }
        self.layers.get_mut(label)?.attrs.clim = clim;
        Ok(())
    }

    /// Sets the color ramp of a layer.
    pub fn set_ramp(&mut self, label: &str, ramp: ColorRamp) -> Result<()> {
        self.layers.get_mut(label)?.attrs.ramp = ramp;
        Ok(())
    }

    /// Sets the opacity scale of a layer.
    pub fn set_weight(&mut self, label: &str, weight: f32) -> Result<()> {
        self.layers.get_mut(label)?.attrs.weight = weight.max(0.0);
        Ok(())
    }

    /// Sets the subset mask of a layer, or `None` to clear it.
    pub fn set_mask(&mut self, label: &str, mask: Option<Grid3<bool>>) -> Result<()> {
        self.layers.get(label)?;
        if let Some(mask) = &mask {
            self.check_shape(mask.shape())?;
        }
        self.layers.get_mut(label)?.attrs.mask = mask;
        Ok(())
    }

    /// Confines a layer to the footprint of another layer, or `None` to unlink.
    pub fn set_multiply(&mut self, label: &str, parent: Option<&str>) -> Result<()> {
        if let Some(parent) = parent {
            self.layers.get(parent)?;
        }
        self.layers.get_mut(label)?.attrs.multiply = parent.map(str::to_string);
        Ok(())
    }

    /// Sets the normalization transform of a layer.
    pub fn set_transform(&mut self, label: &str, transform: Transform) -> Result<()> {
        self.layers.set_transform(label, transform)
    }

    /// Includes a layer in the packed field.
    pub fn enable(&mut self, label: &str) -> Result<()> {
        self.layers.set_visible(label, true)
    }

    /// Excludes a layer from the packed field and the ramp.
    pub fn disable(&mut self, label: &str) -> Result<()> {
        self.layers.set_visible(label, false)
    }

    /// Switches to the coarse interactive resolution. Repeated calls are no-ops.
    pub fn downsample(&mut self) {
        if !self.downsampled {
            self.downsampled = true;
            self.layers.mark_dirty();
        }
    }

    /// Returns to full resolution, however many times `downsample` was called.
    pub fn upsample(&mut self) {
        if self.downsampled {
            self.downsampled = false;
            self.layers.mark_dirty();
        }
    }

    /// Returns whether the coarse resolution is active.
    pub fn is_downsampled(&self) -> bool {
        self.downsampled
    }

    /// Installs a callback run after every rebuild.
    pub fn set_redraw_callback(&mut self, callback: impl FnMut() + 'static) {
        self.notifier.set_callback(callback);
    }

    /// Number of rebuilds performed so far.
    pub fn rebuild_count(&self) -> u64 {
        self.notifier.count()
    }

    /// Returns whether the packed field is stale.
    pub fn is_dirty(&self) -> bool {
        self.layers.is_dirty()
    }

    /// Returns the packed field, rebuilding first if it is stale.
    pub fn combined(&mut self) -> &CombinedVolumeField {
        if self.layers.is_dirty() {
            self.rebuild();
        }
        &self.combined
    }

    /// Packs all enabled layers into one field and requests a redraw.
    pub fn rebuild(&mut self) -> &CombinedVolumeField {
        let combined = self.pack();
        log::debug!(
            "rebuilt volume field: {} bands, downsampled={}",
            combined.bands.len(),
            self.downsampled
        );
        self.combined = combined;
        self.layers.clear_dirty();
        self.notifier.notify();
        &self.combined
    }

    fn pack(&self) -> CombinedVolumeField {
        let participants: Vec<&Layer<VolumeStyle>> = self
            .layers
            .in_allocation_order()
            .into_iter()
            .filter(|l| l.visible && l.attrs.participates())
            .collect();

        let base = participants
            .iter()
            .enumerate()
            .find_map(|(i, l)| l.attrs.data.as_ref().map(|d| (i, *l, d)));
        let Some((base_pos, base, base_data)) = base else {
            return CombinedVolumeField {
                field: None,
                ramp: CompositeRamp::build(Vec::new(), &self.options),
                bands: Vec::new(),
                domain_max: 0.0,
            };
        };
        let ceiling = self.options.base_ceiling;
        let stride = self.options.band_stride();

        let mut field = normalized(base_data, base.attrs.effective_clim(), ceiling);
        let mut bands = vec![base.label().to_string()];
        let mut band_ramps = vec![(base.attrs.ramp.clone(), base.attrs.weight)];

        let extras = participants
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != base_pos)
            .map(|(_, l)| *l);
        for (index, layer) in extras.enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let offset = (index + 1) as f32 * stride;
            self.claim(layer, offset, &mut field);
            bands.push(layer.label().to_string());
            band_ramps.push((layer.attrs.ramp.clone(), layer.attrs.weight));
        }

        #[allow(clippy::cast_precision_loss)]
        let domain_max = bands.len() as f32 * stride;
        let field = if self.downsampled {
            field.downsampled(self.options.downsample_factor)
        } else {
            field
        };
        CombinedVolumeField {
            field: Some(field),
            ramp: CompositeRamp::build(band_ramps, &self.options),
            bands,
            domain_max,
        }
    }

    /// Moves the cells selected by `layer` into its band, skipping claimed cells.
    fn claim(&self, layer: &Layer<VolumeStyle>, offset: f32, field: &mut Grid3<f32>) {
        let ceiling = self.options.base_ceiling;
        let style = &layer.attrs;

        let parent = match &style.multiply {
            Some(name) => match self.layers.get(name) {
                Ok(p) if p.visible && p.attrs.participates() => Some(&p.attrs),
                _ => {
                    log::debug!(
                        "layer '{}': multiply parent '{name}' unavailable, no cells claimed",
                        layer.label()
                    );
                    return;
                }
            },
            None => None,
        };

        let own_norm = style
            .data
            .as_ref()
            .map(|d| normalized(d, style.effective_clim(), ceiling));
        let parent_norm = parent.and_then(|p| {
            p.data
                .as_ref()
                .map(|d| normalized(d, p.effective_clim(), ceiling))
        });

        for (i, cell) in field.as_mut_slice().iter_mut().enumerate() {
            if *cell >= 1.0 {
                continue;
            }
            let own_hit = match (&style.mask, &own_norm) {
                (Some(mask), _) => mask.as_slice()[i],
                (None, Some(norm)) => norm.as_slice()[i] > 0.0,
                (None, None) => false,
            };
            let parent_hit = parent.map_or(true, |p| match (&p.mask, &parent_norm) {
                (Some(mask), _) => mask.as_slice()[i],
                (None, Some(norm)) => norm.as_slice()[i] > 0.0,
                (None, None) => false,
            });
            if !(own_hit && parent_hit) {
                continue;
            }
            let intensity = own_norm
                .as_ref()
                .or(parent_norm.as_ref())
                .map_or(*cell, |norm| norm.as_slice()[i]);
            *cell = intensity + offset;
        }
    }

    fn check_shape(&self, shape: [usize; 3]) -> Result<()> {
        if shape == self.shape {
            Ok(())
        } else {
            Err(StrataError::ShapeMismatch {
                expected: self.shape,
                actual: shape,
            })
        }
    }
}

fn check_clim((low, high): (f32, f32)) -> Result<()> {
    if low.is_finite() && high.is_finite() {
        Ok(())
    } else {
        Err(StrataError::InvalidClim { low, high })
    }
}

/// Maps `data` into `[0, ceiling]` through the clamp range.
fn normalized(data: &Grid3<f32>, (low, high): (f32, f32), ceiling: f32) -> Grid3<f32> {
    let span = high - low;
    data.map(|&x| {
        if !x.is_finite() {
            0.0
        } else if span > 0.0 {
            ((x - low) / span).clamp(0.0, ceiling)
        } else if x > low {
            ceiling
        } else {
            0.0
        }
    })
}

/// Symmetric percentile clamp range, e.g. `99.0` drops the lowest and highest
/// half percent of the finite values.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percentile_clim(data: &Grid3<f32>, percentile: f32) -> Option<(f32, f32)> {
    let mut values: Vec<f32> = data
        .as_slice()
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(f32::total_cmp);
    let exclude = ((100.0 - percentile.clamp(0.0, 100.0)) / 2.0) / 100.0;
    let at = |q: f32| {
        let pos = q * (values.len() - 1) as f32;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        values[lo] + (values[hi] - values[lo]) * (pos - lo as f32)
    };
    Some((at(exclude), at(1.0 - exclude)))
}
