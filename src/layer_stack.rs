use crate::history::Snapshot;
use crate::layer::{ContentRef, Layer, LayerId};
use std::collections::HashSet;
use thiserror::Error;

/// Reasons a layer stack operation was rejected. These are guard rejections,
/// not user-facing failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayerError {
    #[error("Layer index {index} out of range for {count} layers")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("Cannot delete the last remaining layer")]
    LastLayer,

    #[error("Layer limit of {0} reached")]
    LimitReached(usize),

    #[error("Move leaves the layer order unchanged")]
    NoChange,
}

/// Result type for layer stack operations
pub type LayerResult<T> = Result<T, LayerError>;

/// Ordered layers (first = bottom) and the active-layer cursor.
///
/// Always holds at least one layer, layer ids are unique, and the cursor
/// always points at an existing layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerStack {
    layers: Vec<Layer>,
    active_index: usize,
    max_layers: usize,
}

impl LayerStack {
    /// Creates a stack holding a single empty layer
    pub fn new(max_layers: usize) -> Self {
        Self {
            layers: vec![Layer::new("Layer 1")],
            active_index: 0,
            max_layers: max_layers.max(1),
        }
    }

    /// Builds a stack from possibly untrusted parts, repairing invariants
    pub fn from_layers(layers: Vec<Layer>, active_index: usize, max_layers: usize) -> Self {
        let mut stack = Self {
            layers: Vec::new(),
            active_index: 0,
            max_layers: max_layers.max(1),
        };
        stack.restore(Snapshot::new(layers, active_index));
        stack
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Always false for a live stack; provided for completeness
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn max_layers(&self) -> usize {
        self.max_layers
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active_layer(&self) -> Option<&Layer> {
        self.layers.get(self.active_index)
    }

    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id() == id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.index_of(id).is_some()
    }

    /// Inserts a new empty layer just above the active one and makes it active
    pub fn add_layer(&mut self) -> LayerResult<usize> {
        if self.layers.len() >= self.max_layers {
            return Err(LayerError::LimitReached(self.max_layers));
        }
        let layer = Layer::new(&self.next_layer_name());
        let index = (self.active_index + 1).min(self.layers.len());
        self.layers.insert(index, layer);
        self.active_index = index;
        Ok(index)
    }

    /// Removes the layer at `index`, keeping at least one layer
    pub fn delete_layer(&mut self, index: usize) -> LayerResult<Layer> {
        self.check_index(index)?;
        if self.layers.len() == 1 {
            return Err(LayerError::LastLayer);
        }
        let removed = self.layers.remove(index);
        if index <= self.active_index {
            self.active_index = self.active_index.min(self.layers.len() - 1);
        }
        Ok(removed)
    }

    /// Moves the layers at `sources` so they sit just before `destination`,
    /// where `destination` indexes the order prior to removal. Sources keep
    /// their relative order and the cursor follows the active layer.
    pub fn move_layers(&mut self, sources: &[usize], destination: usize) -> LayerResult<()> {
        let count = self.layers.len();
        if destination > count {
            return Err(LayerError::IndexOutOfRange {
                index: destination,
                count,
            });
        }
        if let Some(&index) = sources.iter().find(|&&index| index >= count) {
            return Err(LayerError::IndexOutOfRange { index, count });
        }

        let moving: HashSet<usize> = sources.iter().copied().collect();
        if moving.is_empty() {
            return Err(LayerError::NoChange);
        }
        let active_id = self.active_layer().map(Layer::id);
        let original_order: Vec<LayerId> = self.layers.iter().map(Layer::id).collect();

        let mut moved = Vec::with_capacity(moving.len());
        let mut remaining = Vec::with_capacity(count - moving.len());
        for (index, layer) in self.layers.drain(..).enumerate() {
            if moving.contains(&index) {
                moved.push(layer);
            } else {
                remaining.push(layer);
            }
        }
        let removed_before = moving.iter().filter(|&&index| index < destination).count();
        let insert_at = destination - removed_before;
        let above = remaining.split_off(insert_at);
        remaining.extend(moved);
        remaining.extend(above);

        let unchanged = remaining
            .iter()
            .map(Layer::id)
            .eq(original_order.iter().copied());
        self.layers = remaining;
        self.active_index = active_id
            .and_then(|id| self.index_of(id))
            .unwrap_or(0);

        if unchanged {
            return Err(LayerError::NoChange);
        }
        Ok(())
    }

    pub fn set_active(&mut self, index: usize) -> LayerResult<()> {
        self.check_index(index)?;
        self.active_index = index;
        Ok(())
    }

    pub fn toggle_visibility(&mut self, index: usize) -> LayerResult<bool> {
        let layer = self.layer_mut(index)?;
        layer.toggle_visibility();
        Ok(layer.is_visible())
    }

    pub fn rename(&mut self, index: usize, name: String) -> LayerResult<()> {
        self.layer_mut(index)?.set_name(name);
        Ok(())
    }

    pub fn set_opacity(&mut self, index: usize, opacity: f32) -> LayerResult<f32> {
        let layer = self.layer_mut(index)?;
        layer.set_opacity(opacity);
        Ok(layer.opacity())
    }

    /// Replaces a layer's content, returning its new version
    pub fn update_content(&mut self, index: usize, content: impl Into<ContentRef>) -> LayerResult<u64> {
        Ok(self.layer_mut(index)?.replace_content(content))
    }

    /// Captures the layer order and cursor; content blobs are shared
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.layers.clone(), self.active_index)
    }

    /// Makes `snapshot` the live state, repairing an empty layer list,
    /// duplicate ids and an out-of-range cursor
    pub fn restore(&mut self, snapshot: Snapshot) {
        let (mut layers, active_index) = snapshot.into_parts();
        if layers.is_empty() {
            log::warn!("Restoring a snapshot without layers, inserting an empty layer");
            layers.push(Layer::new("Layer 1"));
        }
        let mut seen = HashSet::with_capacity(layers.len());
        for layer in &mut layers {
            if !seen.insert(layer.id()) {
                log::warn!("Duplicate layer id {}, assigning a new one", layer.id());
                layer.reassign_id();
                seen.insert(layer.id());
            }
        }
        self.active_index = active_index.min(layers.len().saturating_sub(1));
        self.layers = layers;
    }

    fn check_index(&self, index: usize) -> LayerResult<()> {
        if index < self.layers.len() {
            Ok(())
        } else {
            Err(LayerError::IndexOutOfRange {
                index,
                count: self.layers.len(),
            })
        }
    }

    fn layer_mut(&mut self, index: usize) -> LayerResult<&mut Layer> {
        let count = self.layers.len();
        self.layers
            .get_mut(index)
            .ok_or(LayerError::IndexOutOfRange { index, count })
    }

    fn next_layer_name(&self) -> String {
        let highest = self
            .layers
            .iter()
            .filter_map(|layer| layer.name().strip_prefix("Layer "))
            .filter_map(|suffix| suffix.parse::<usize>().ok())
            .max()
            .unwrap_or(0);
        format!("Layer {}", highest + 1)
    }
}

impl Default for LayerStack {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_LAYERS)
    }
}
