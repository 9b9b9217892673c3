//! Layer registry shared by the compositors.
//!
//! A [`LayerRegistry`] tracks labelled layers together with the attributes every
//! layer kind has (visibility, z-order, normalization transform) and a
//! kind-specific attribute record `A`. Any mutation marks the registry dirty so
//! the owning compositor knows its merged output is stale.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{Result, StrataError};
use crate::transform::Transform;

/// One registered layer.
#[derive(Debug, Clone)]
pub struct Layer<A> {
    label: String,
    serial: u64,
    /// Whether the layer contributes to the merged output.
    pub visible: bool,
    /// Draw order key; higher is drawn later.
    pub zorder: f32,
    /// Normalization transform from layer data space into the shared scene.
    pub transform: Transform,
    /// Kind-specific attributes.
    pub attrs: A,
}

impl<A> Layer<A> {
    /// Returns the layer label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the allocation serial, used to break z-order ties.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    fn draw_order(&self, other: &Self) -> Ordering {
        self.zorder
            .total_cmp(&other.zorder)
            .then(self.serial.cmp(&other.serial))
    }
}

/// Registry of labelled layers with a dirty flag.
#[derive(Debug, Clone)]
pub struct LayerRegistry<A> {
    layers: HashMap<String, Layer<A>>,
    next_serial: u64,
    dirty: bool,
}

impl<A> Default for LayerRegistry<A> {
    fn default() -> Self {
        Self {
            layers: HashMap::new(),
            next_serial: 0,
            dirty: false,
        }
    }
}

impl<A: Default> LayerRegistry<A> {
    /// Allocates a layer with default attributes.
    ///
    /// Returns an error if the label is already allocated.
    pub fn allocate(&mut self, label: impl Into<String>) -> Result<&mut Layer<A>> {
        let label = label.into();
        if self.layers.contains_key(&label) {
            return Err(StrataError::DuplicateLayer(label));
        }
        let serial = self.next_serial;
        self.next_serial += 1;
        self.dirty = true;
        log::debug!("allocated layer '{label}' (serial {serial})");
        Ok(self.layers.entry(label.clone()).or_insert(Layer {
            label,
            serial,
            visible: true,
            zorder: 0.0,
            transform: Transform::Identity,
            attrs: A::default(),
        }))
    }
}

impl<A> LayerRegistry<A> {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes a layer and all of its state.
    pub fn deallocate(&mut self, label: &str) -> Result<Layer<A>> {
        let layer = self
            .layers
            .remove(label)
            .ok_or_else(|| StrataError::UnknownLayer(label.to_string()))?;
        self.dirty = true;
        log::debug!("deallocated layer '{label}'");
        Ok(layer)
    }

    /// Gets a layer by label.
    pub fn get(&self, label: &str) -> Result<&Layer<A>> {
        self.layers
            .get(label)
            .ok_or_else(|| StrataError::UnknownLayer(label.to_string()))
    }

    /// Gets a layer mutably and marks the registry dirty.
    pub fn get_mut(&mut self, label: &str) -> Result<&mut Layer<A>> {
        let layer = self
            .layers
            .get_mut(label)
            .ok_or_else(|| StrataError::UnknownLayer(label.to_string()))?;
        self.dirty = true;
        Ok(layer)
    }

    /// Checks if a layer with the given label exists.
    pub fn contains(&self, label: &str) -> bool {
        self.layers.contains_key(label)
    }

    /// Sets whether a layer contributes to the merged output.
    pub fn set_visible(&mut self, label: &str, visible: bool) -> Result<()> {
        self.get_mut(label)?.visible = visible;
        Ok(())
    }

    /// Sets the draw order key of a layer.
    pub fn set_zorder(&mut self, label: &str, zorder: f32) -> Result<()> {
        self.get_mut(label)?.zorder = zorder;
        Ok(())
    }

    /// Sets the normalization transform of a layer.
    pub fn set_transform(&mut self, label: &str, transform: Transform) -> Result<()> {
        self.get_mut(label)?.transform = transform;
        Ok(())
    }

    /// Returns layers in allocation order.
    pub fn in_allocation_order(&self) -> Vec<&Layer<A>> {
        let mut layers: Vec<_> = self.layers.values().collect();
        layers.sort_by_key(|l| l.serial);
        layers
    }

    /// Returns layers sorted by z-order, ties broken by allocation order.
    pub fn in_draw_order(&self) -> Vec<&Layer<A>> {
        let mut layers: Vec<_> = self.layers.values().collect();
        layers.sort_by(|a, b| a.draw_order(b));
        layers
    }

    /// Returns labels in allocation order.
    pub fn labels(&self) -> Vec<&str> {
        self.in_allocation_order()
            .into_iter()
            .map(Layer::label)
            .collect()
    }

    /// Returns the number of allocated layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns true if no layers are allocated.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Marks the merged output as stale.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether the merged output is stale.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks the merged output as up to date.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}
