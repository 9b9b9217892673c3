//! strata: multi-layer compositing and picking for embedded 3D data viewers.
//!
//! A host application keeps one [`Viewer`] per 3D view. Each viewer merges any
//! number of labelled point layers into one draw call
//! ([`MultiPointCompositor`]), packs labelled volume layers into one banded
//! field with a matching transfer function ([`MultiVolumeCompositor`]), and
//! turns 2D gestures into per-layer selection masks.
//!
//! # Quick Start
//!
//! ```
//! use strata::*;
//!
//! let mut viewer = Viewer::new([4, 4, 4]);
//! viewer.points.set_shared_positions(vec![Vec3::ZERO, Vec3::X]);
//! viewer.points.allocate("cells").unwrap();
//! viewer.refresh();
//!
//! let rect = Rectangle::new(Vec2::splat(-0.5), Vec2::splat(0.5));
//! let hits = viewer.select(&rect, &mut |_, _| {});
//! assert_eq!(hits[0].1.count(), 1);
//! ```

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

mod viewer;
mod viewers;

pub use viewer::Viewer;
pub use viewers::{ViewerId, ViewerRegistry};

pub use strata_core::{
    builtin_ramps, compose, divide, shape_len, voxel_position, ColorRamp, ColorRampSequence,
    Grid3, Layer, LayerRegistry, Mat4, Options, Result, StrataError, Transform, Vec2, Vec3, Vec4,
};

pub use strata_composite::{
    percentile_clim, CombinedBuffer, CombinedVolumeField, CompositeRamp, MultiPointCompositor,
    MultiVolumeCompositor, PointColor, PointSize, PointStyle, PointVertex, RampStop, RampTexel,
    StopColor, VolumeStyle,
};

pub use strata_select::{
    brightest_voxel_along_ray, flood_fill, point_mask, select, volume_mask, Circle, Polygon,
    Rectangle, ScreenRegion, Selectable, SelectionMask,
};

/// Installs the `env_logger` backend for the `log` macros used throughout
/// strata. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::try_init();
}
