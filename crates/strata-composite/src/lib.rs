//! Multi-layer compositors for strata.
//!
//! - [`MultiPointCompositor`] merges labelled point layers into one vertex buffer.
//! - [`MultiVolumeCompositor`] packs labelled volume layers into one banded
//!   intensity field with a matching transfer function.
//!
//! Both expose plain setters plus an explicit [`rebuild`](MultiPointCompositor::rebuild);
//! deciding when to rebuild is left to the host.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod multi_points;
pub mod multi_volume;
pub mod notify;
pub mod vertex;

pub use multi_points::{CombinedBuffer, MultiPointCompositor, PointColor, PointSize, PointStyle};
pub use multi_volume::{
    percentile_clim, CombinedVolumeField, CompositeRamp, MultiVolumeCompositor, RampStop,
    StopColor, VolumeStyle,
};
pub use notify::RedrawNotifier;
pub use vertex::{PointVertex, RampTexel};
