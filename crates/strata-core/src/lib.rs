//! Core abstractions for strata.
//!
//! This crate provides the building blocks shared by the compositors and the
//! selection code:
//! - [`Transform`] chains with matrix flattening and homogeneous mapping
//! - [`LayerRegistry`] for labelled layers with visibility and z-order
//! - [`Grid3`] dense volumes and voxel masks
//! - [`ColorRamp`] and [`ColorRampSequence`]
//! - [`Options`] and the [`StrataError`] taxonomy

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod color;
pub mod error;
pub mod grid;
pub mod options;
pub mod registry;
pub mod transform;

pub use color::{builtin_ramps, ColorRamp, ColorRampSequence};
pub use error::{Result, StrataError};
pub use grid::{shape_len, voxel_position, Grid3};
pub use options::Options;
pub use registry::{Layer, LayerRegistry};
pub use transform::{compose, divide, Transform};

// Re-export glam types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};
