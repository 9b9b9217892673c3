//! Dense 3D arrays for volume layers and voxel masks.

use glam::Vec3;

use crate::error::{Result, StrataError};

/// A dense 3D array in C order.
///
/// `shape` is `[depth, height, width]`; the first axis varies slowest. Voxel
/// `(z, y, x)` sits at data-space position `Vec3::new(x, y, z)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid3<T> {
    shape: [usize; 3],
    data: Vec<T>,
}

impl<T: Clone> Grid3<T> {
    /// Creates a grid filled with `value`.
    pub fn filled(shape: [usize; 3], value: T) -> Self {
        Self {
            shape,
            data: vec![value; shape_len(shape)],
        }
    }
}

impl<T> Grid3<T> {
    /// Wraps a flat C-order buffer.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::ShapeMismatch`] if `data.len()` is not the
    /// product of `shape`.
    pub fn from_vec(shape: [usize; 3], data: Vec<T>) -> Result<Self> {
        if data.len() != shape_len(shape) {
            return Err(StrataError::ShapeMismatch {
                expected: shape,
                actual: [data.len(), 1, 1],
            });
        }
        Ok(Self { shape, data })
    }

    /// Builds a grid by evaluating `f(z, y, x)` for every voxel.
    pub fn from_fn(shape: [usize; 3], mut f: impl FnMut(usize, usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(shape_len(shape));
        for z in 0..shape[0] {
            for y in 0..shape[1] {
                for x in 0..shape[2] {
                    data.push(f(z, y, x));
                }
            }
        }
        Self { shape, data }
    }

    /// Returns the `[depth, height, width]` shape.
    #[must_use]
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Returns the number of voxels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the grid has no voxels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the flat C-order data.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Returns the flat C-order data mutably.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the grid and returns its flat data.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Returns whether `index` lies inside the grid.
    #[must_use]
    pub fn contains(&self, index: [usize; 3]) -> bool {
        index.iter().zip(self.shape).all(|(&i, n)| i < n)
    }

    /// Flattens a `[z, y, x]` index.
    #[must_use]
    pub fn flat_index(&self, index: [usize; 3]) -> usize {
        (index[0] * self.shape[1] + index[1]) * self.shape[2] + index[2]
    }

    /// Unflattens a flat index into `[z, y, x]`.
    #[must_use]
    pub fn unflatten(&self, flat: usize) -> [usize; 3] {
        let plane = self.shape[1] * self.shape[2];
        [flat / plane, (flat / self.shape[2]) % self.shape[1], flat % self.shape[2]]
    }

    /// Gets the value at `[z, y, x]`.
    #[must_use]
    pub fn get(&self, index: [usize; 3]) -> Option<&T> {
        if self.contains(index) {
            self.data.get(self.flat_index(index))
        } else {
            None
        }
    }

    /// Gets the value at `[z, y, x]` mutably.
    pub fn get_mut(&mut self, index: [usize; 3]) -> Option<&mut T> {
        if self.contains(index) {
            let flat = self.flat_index(index);
            self.data.get_mut(flat)
        } else {
            None
        }
    }

    /// Applies `f` to every voxel.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid3<U> {
        Grid3 {
            shape: self.shape,
            data: self.data.iter().map(f).collect(),
        }
    }
}

impl<T: Clone> Grid3<T> {
    /// Keeps every `stride`-th voxel along each axis.
    ///
    /// A stride of 0 or 1 returns a copy.
    #[must_use]
    pub fn downsampled(&self, stride: usize) -> Self {
        if stride <= 1 {
            return self.clone();
        }
        let shape = self.shape.map(|n| n.div_ceil(stride));
        Self::from_fn(shape, |z, y, x| {
            self.data[self.flat_index([z * stride, y * stride, x * stride])].clone()
        })
    }
}

impl Grid3<bool> {
    /// Number of `true` voxels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

impl Grid3<f32> {
    /// Minimum and maximum of the finite values, if any.
    #[must_use]
    pub fn finite_range(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Data-space position of voxel `[z, y, x]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn voxel_position(index: [usize; 3]) -> Vec3 {
    Vec3::new(index[2] as f32, index[1] as f32, index[0] as f32)
}

/// Total number of voxels for a shape.
#[must_use]
pub fn shape_len(shape: [usize; 3]) -> usize {
    shape[0] * shape[1] * shape[2]
}
