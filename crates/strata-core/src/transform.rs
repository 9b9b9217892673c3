//! Coordinate transform stack.
//!
//! A [`Transform`] maps data coordinates to screen coordinates. Layers typically
//! carry a normalization transform which is composed with the viewer's shared
//! view/camera transform before mapping or selecting.
//!
//! Matrices follow the glam convention and act on column vectors, so applying
//! `A` and then `B` flattens to `B * A`. Matrices written for row vectors
//! (`p' = p * M`) must go through [`Transform::from_row_vector_matrix`].

use glam::{Mat4, Vec3, Vec4};

use crate::error::{Result, StrataError};

/// Determinants below this magnitude are treated as singular.
const SINGULAR_EPSILON: f32 = 1e-12;

/// A composable 3D coordinate transform.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Transform {
    /// Leaves coordinates unchanged.
    #[default]
    Identity,
    /// Per-axis scale followed by a translation.
    Scale { scale: Vec3, translate: Vec3 },
    /// A generic 4x4 (affine or projective) matrix.
    Matrix(Mat4),
    /// Sub-transforms applied in order, first element first.
    Chain(Vec<Transform>),
    /// The inverse of another transform.
    Inverse(Box<Transform>),
    /// Per-axis logarithm; an axis with a base `<= 0` or `== 1` passes through.
    Log { base: Vec3 },
}

impl Transform {
    /// Scale-then-translate transform.
    #[must_use]
    pub fn scale_translate(scale: Vec3, translate: Vec3) -> Self {
        Self::Scale { scale, translate }
    }

    /// Wraps a matrix authored for row vectors (`p' = p * M`).
    #[must_use]
    pub fn from_row_vector_matrix(rows: [[f32; 4]; 4]) -> Self {
        // Each row of M becomes a column of M^T.
        Self::Matrix(Mat4::from_cols_array_2d(&rows))
    }

    /// Returns the inverse of this transform, collapsing double inverses.
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            Self::Identity => Self::Identity,
            Self::Inverse(inner) => *inner,
            other => Self::Inverse(Box::new(other)),
        }
    }

    /// Returns whether [`Transform::simplify`] can succeed structurally.
    ///
    /// A singular matrix under an inverse still fails at simplification time.
    #[must_use]
    pub fn is_simplifiable(&self) -> bool {
        match self {
            Self::Identity | Self::Scale { .. } | Self::Matrix(_) => true,
            Self::Chain(items) => items.iter().all(Self::is_simplifiable),
            Self::Inverse(inner) => inner.is_simplifiable(),
            Self::Log { .. } => false,
        }
    }

    /// Flattens this transform into a single matrix.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::UnsimplifiableTransform`] if the transform contains a
    /// non-linear leaf or inverts a singular matrix.
    pub fn simplify(&self) -> Result<Mat4> {
        match self {
            Self::Identity => Ok(Mat4::IDENTITY),
            Self::Scale { scale, translate } => {
                Ok(Mat4::from_translation(*translate) * Mat4::from_scale(*scale))
            }
            Self::Matrix(m) => Ok(*m),
            Self::Chain(items) => items
                .iter()
                .try_fold(Mat4::IDENTITY, |acc, t| Ok(t.simplify()? * acc)),
            Self::Inverse(inner) => {
                if let Self::Scale { scale, translate } = inner.as_ref() {
                    if scale.cmpeq(Vec3::ZERO).any() {
                        return Err(singular());
                    }
                    let inv = Vec3::ONE / *scale;
                    return Ok(Mat4::from_translation(-*translate * inv) * Mat4::from_scale(inv));
                }
                let m = inner.simplify()?;
                let det = m.determinant();
                if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
                    return Err(singular());
                }
                Ok(m.inverse())
            }
            Self::Log { base } => Err(StrataError::UnsimplifiableTransform(format!(
                "log transform with base {base}"
            ))),
        }
    }

    /// Maps points to homogeneous coordinates.
    ///
    /// No perspective division is performed; use [`divide`] on each result when
    /// Cartesian coordinates are needed. Simplifiable transforms are applied as
    /// a single matrix, others point by point.
    #[must_use]
    pub fn map(&self, points: &[Vec3]) -> Vec<Vec4> {
        match self.simplify() {
            Ok(m) => points.iter().map(|p| m * p.extend(1.0)).collect(),
            Err(_) => points.iter().map(|p| self.apply(p.extend(1.0))).collect(),
        }
    }

    /// Applies this transform to one homogeneous coordinate.
    #[must_use]
    pub fn apply(&self, p: Vec4) -> Vec4 {
        match self {
            Self::Identity => p,
            Self::Scale { scale, translate } => {
                (p.truncate() * *scale + *translate * p.w).extend(p.w)
            }
            Self::Matrix(m) => *m * p,
            Self::Chain(items) => items.iter().fold(p, |acc, t| t.apply(acc)),
            Self::Inverse(inner) => inner.apply_inverse(p),
            Self::Log { base } => {
                let v = p.truncate() / p.w;
                Vec3::new(
                    log_axis(v.x, base.x),
                    log_axis(v.y, base.y),
                    log_axis(v.z, base.z),
                )
                .extend(1.0)
            }
        }
    }

    fn apply_inverse(&self, p: Vec4) -> Vec4 {
        match self {
            Self::Identity => p,
            Self::Scale { scale, translate } => {
                ((p.truncate() - *translate * p.w) / *scale).extend(p.w)
            }
            Self::Matrix(m) => m.inverse() * p,
            Self::Chain(items) => items.iter().rev().fold(p, |acc, t| t.apply_inverse(acc)),
            Self::Inverse(inner) => inner.apply(p),
            Self::Log { base } => {
                let v = p.truncate() / p.w;
                Vec3::new(
                    exp_axis(v.x, base.x),
                    exp_axis(v.y, base.y),
                    exp_axis(v.z, base.z),
                )
                .extend(1.0)
            }
        }
    }
}

fn singular() -> StrataError {
    StrataError::UnsimplifiableTransform("singular matrix under inverse".to_string())
}

fn log_axis(value: f32, base: f32) -> f32 {
    if base <= 0.0 || base == 1.0 {
        value
    } else {
        value.ln() / base.ln()
    }
}

fn exp_axis(value: f32, base: f32) -> f32 {
    if base <= 0.0 || base == 1.0 {
        value
    } else {
        base.powf(value)
    }
}

/// Composes transforms into one chain, applied in list order.
///
/// Nested chains are flattened and identities dropped.
pub fn compose(transforms: impl IntoIterator<Item = Transform>) -> Transform {
    let mut items = Vec::new();
    for t in transforms {
        match t {
            Transform::Identity => {}
            Transform::Chain(inner) => items.extend(inner),
            other => items.push(other),
        }
    }
    match items.len() {
        0 => Transform::Identity,
        1 => items.remove(0),
        _ => Transform::Chain(items),
    }
}

/// Perspective division of a homogeneous coordinate.
///
/// A zero `w` produces non-finite components, which selection treats as
/// "outside every region".
#[must_use]
pub fn divide(p: Vec4) -> Vec3 {
    p.truncate() / p.w
}
