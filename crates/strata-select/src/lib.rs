//! Screen-space selection for strata.
//!
//! Turns a 2D gesture ([`Rectangle`], [`Circle`] or [`Polygon`]) into boolean
//! masks over point layers and voxel grids, and grows volume regions from a
//! seed with [`flood_fill`].

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod flood_fill;
pub mod geometry;
pub mod region;
pub mod selectable;

pub use flood_fill::{brightest_voxel_along_ray, flood_fill};
pub use geometry::{chunk_len, point_mask, screen_coords, volume_mask};
pub use region::{Circle, Polygon, Rectangle, ScreenRegion};
pub use selectable::{select, Selectable, SelectionMask};
