use crate::config::EditorConfig;
use crate::event::{DocumentEvent, EventBus, EventHandler, HistoryDirection, SubscriptionId};
use crate::history::History;
use crate::layer::{ContentRef, Layer};
use crate::layer_stack::{LayerResult, LayerStack};
use chrono::{DateTime, Utc};
use egui::{Color32, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unmultiplied RGBA background color with channels in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasColor {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

impl CanvasColor {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Clamps every channel into [0, 1]; NaN becomes 0
    pub fn clamped(self) -> Self {
        let clamp = |channel: f32| {
            if channel.is_nan() {
                0.0
            } else {
                channel.clamp(0.0, 1.0)
            }
        };
        Self::new(
            clamp(self.red),
            clamp(self.green),
            clamp(self.blue),
            clamp(self.alpha),
        )
    }

    pub fn to_color32(self) -> Color32 {
        let c = self.clamped();
        let byte = |channel: f32| (channel * 255.0).round() as u8;
        Color32::from_rgba_unmultiplied(byte(c.red), byte(c.green), byte(c.blue), byte(c.alpha))
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let c = self.clamped();
        let byte = |channel: f32| (channel * 255.0).round() as u8;
        [byte(c.red), byte(c.green), byte(c.blue), byte(c.alpha)]
    }
}

impl Default for CanvasColor {
    fn default() -> Self {
        Self::WHITE
    }
}

/// A layered drawing document: canvas metadata, the layer stack and its
/// undo history.
///
/// All mutations go through this type. Layer edits snapshot the stack first
/// and are undoable; document metadata edits are not. Rejected edits leave
/// the document untouched and return `false` (or `None`).
#[derive(Debug)]
pub struct Document {
    id: Uuid,
    name: String,
    canvas_size: Vec2,
    max_canvas_dimension: f32,
    background: CanvasColor,
    layers: LayerStack,
    history: History,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: EventBus,
}

impl Document {
    /// Creates a document with a single empty layer. An oversized canvas is
    /// shrunk to the configured maximum.
    pub fn new(name: &str, canvas_size: Vec2, config: &EditorConfig) -> Self {
        let now = Utc::now();
        let max = config.max_canvas_dimension;
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            canvas_size: initial_canvas_size(canvas_size, max),
            max_canvas_dimension: max,
            background: CanvasColor::WHITE,
            layers: LayerStack::new(config.max_layers),
            history: History::new(config.max_undo_count),
            created_at: now,
            updated_at: now,
            events: EventBus::new(),
        }
    }

    /// Reassembles a loaded document. History starts empty.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: Uuid,
        name: String,
        canvas_size: Vec2,
        background: CanvasColor,
        layers: LayerStack,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        config: &EditorConfig,
    ) -> Self {
        Self {
            id,
            name,
            canvas_size,
            max_canvas_dimension: config.max_canvas_dimension,
            background: background.clamped(),
            layers,
            history: History::new(config.max_undo_count),
            created_at,
            updated_at,
            events: EventBus::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn canvas_size(&self) -> Vec2 {
        self.canvas_size
    }

    pub fn background_color(&self) -> CanvasColor {
        self.background
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn active_layer(&self) -> Option<&Layer> {
        self.layers.active_layer()
    }

    pub fn active_layer_index(&self) -> usize {
        self.layers.active_index()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self, handler: impl EventHandler + 'static) -> SubscriptionId {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn add_layer(&mut self) -> bool {
        let Some(index) = self.apply_undoable("add layer", LayerStack::add_layer) else {
            return false;
        };
        if let Some(layer) = self.layers.get(index) {
            let id = layer.id();
            self.events.emit(DocumentEvent::LayerAdded { index, id });
        }
        true
    }

    /// Deletes a layer. Callers holding a render cache should evict the
    /// removed id, which is also announced as `LayerRemoved`.
    pub fn delete_layer(&mut self, index: usize) -> bool {
        match self.apply_undoable("delete layer", |layers| layers.delete_layer(index)) {
            Some(removed) => {
                self.events.emit(DocumentEvent::LayerRemoved { id: removed.id() });
                true
            }
            None => false,
        }
    }

    /// Reorders layers; see `LayerStack::move_layers`
    pub fn move_layers(&mut self, sources: &[usize], destination: usize) -> bool {
        let moved = self
            .apply_undoable("move layers", |layers| layers.move_layers(sources, destination))
            .is_some();
        if moved {
            self.events.emit(DocumentEvent::LayersReordered);
        }
        moved
    }

    pub fn toggle_layer_visibility(&mut self, index: usize) -> bool {
        self.apply_layer_edit("toggle visibility", index, |layers| {
            layers.toggle_visibility(index).map(drop)
        })
    }

    pub fn rename_layer(&mut self, index: usize, name: &str) -> bool {
        self.apply_layer_edit("rename layer", index, |layers| {
            layers.rename(index, name.to_string())
        })
    }

    pub fn set_layer_opacity(&mut self, index: usize, opacity: f32) -> bool {
        self.apply_layer_edit("set opacity", index, |layers| {
            layers.set_opacity(index, opacity).map(drop)
        })
    }

    /// The stroke commit point: snapshots, then replaces the layer content
    /// and bumps its version. Returns the new version.
    pub fn commit_stroke(&mut self, index: usize, content: impl Into<ContentRef>) -> Option<u64> {
        let content = content.into();
        let version = self.apply_undoable("commit stroke", |layers| {
            layers.update_content(index, content)
        })?;
        if let Some(layer) = self.layers.get(index) {
            let id = layer.id();
            self.events.emit(DocumentEvent::ContentCommitted { id, version });
        }
        Some(version)
    }

    /// Moves the cursor; not recorded in history
    pub fn set_active_layer(&mut self, index: usize) -> bool {
        if let Err(err) = self.layers.set_active(index) {
            log::debug!("set active layer rejected: {err}");
            return false;
        }
        self.touch();
        self.events.emit(DocumentEvent::ActiveLayerChanged { index });
        true
    }

    pub fn undo(&mut self) -> bool {
        if !self.history.undo(&mut self.layers) {
            return false;
        }
        self.touch();
        self.events
            .emit(DocumentEvent::HistoryRestored(HistoryDirection::Undo));
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.history.redo(&mut self.layers) {
            return false;
        }
        self.touch();
        self.events
            .emit(DocumentEvent::HistoryRestored(HistoryDirection::Redo));
        true
    }

    /// Renames the document; not undoable
    pub fn rename(&mut self, name: &str) {
        self.name = name.to_string();
        self.touch();
        self.events.emit(DocumentEvent::MetadataChanged);
    }

    /// Changes the canvas size; rejects non-positive, non-finite or oversized
    /// sizes
    pub fn set_canvas_size(&mut self, size: Vec2) -> bool {
        let Some(size) = sanitize_canvas_size(size, self.max_canvas_dimension) else {
            log::debug!("set canvas size rejected: {size:?}");
            return false;
        };
        self.canvas_size = size;
        self.touch();
        self.events.emit(DocumentEvent::MetadataChanged);
        true
    }

    pub fn set_background_color(&mut self, color: CanvasColor) {
        self.background = color.clamped();
        self.touch();
        self.events.emit(DocumentEvent::MetadataChanged);
    }

    /// Captures the stack, runs `op`, and records the capture only if `op`
    /// succeeded
    fn apply_undoable<T>(
        &mut self,
        label: &str,
        op: impl FnOnce(&mut LayerStack) -> LayerResult<T>,
    ) -> Option<T> {
        let before = self.layers.snapshot();
        match op(&mut self.layers) {
            Ok(value) => {
                self.history.push(before);
                self.touch();
                Some(value)
            }
            Err(err) => {
                log::debug!("{label} rejected: {err}");
                None
            }
        }
    }

    fn apply_layer_edit(
        &mut self,
        label: &str,
        index: usize,
        op: impl FnOnce(&mut LayerStack) -> LayerResult<()>,
    ) -> bool {
        if self.apply_undoable(label, op).is_none() {
            return false;
        }
        if let Some(layer) = self.layers.get(index) {
            let id = layer.id();
            self.events.emit(DocumentEvent::LayerUpdated { id });
        }
        true
    }

    fn touch(&mut self) {
        // Keep updated_at strictly increasing even on coarse clocks.
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + chrono::Duration::microseconds(1)
        };
    }
}

fn initial_canvas_size(size: Vec2, max_dimension: f32) -> Vec2 {
    if size.any_nan() {
        return Vec2::splat(1.0);
    }
    sanitize_canvas_size(size.min(Vec2::splat(max_dimension)), max_dimension)
        .unwrap_or(Vec2::splat(1.0))
}

pub(crate) fn sanitize_canvas_size(size: Vec2, max_dimension: f32) -> Option<Vec2> {
    let in_range = |value: f32| value.is_finite() && value > 0.0 && value <= max_dimension;
    (in_range(size.x) && in_range(size.y)).then_some(size)
}
