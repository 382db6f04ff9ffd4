use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// A unique identifier for a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(Uuid);

impl LayerId {
    /// Creates a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serialized stroke data. Never mutated in place, only replaced wholesale,
/// so clones of a layer share the same blob.
pub type ContentRef = Arc<[u8]>;

/// Represents a single drawable layer in the document
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    id: LayerId,
    name: String,
    visible: bool,
    opacity: f32,
    content: ContentRef,
    version: u64,
}

impl Layer {
    /// Creates an empty, visible, fully opaque layer at version 0
    pub fn new(name: &str) -> Self {
        Self {
            id: LayerId::new(),
            name: name.to_string(),
            visible: true,
            opacity: 1.0,
            content: Arc::from(Vec::new()),
            version: 0,
        }
    }

    /// Rebuilds a layer from persisted fields
    pub(crate) fn restore(
        id: LayerId,
        name: String,
        visible: bool,
        opacity: f32,
        content: Vec<u8>,
        version: u64,
    ) -> Self {
        Self {
            id,
            name,
            visible,
            opacity: clamp_opacity(opacity),
            content: Arc::from(content),
            version,
        }
    }

    pub(crate) fn reassign_id(&mut self) {
        self.id = LayerId::new();
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn content_ref(&self) -> &ContentRef {
        &self.content
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    /// Content version; bumped once per content replacement and never otherwise
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn toggle_visibility(&mut self) {
        self.visible = !self.visible;
    }

    /// Sets opacity, clamped to [0, 1]
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = clamp_opacity(opacity);
    }

    /// Replaces the stroke content and bumps the version by exactly one
    pub fn replace_content(&mut self, content: impl Into<ContentRef>) -> u64 {
        self.content = content.into();
        self.version += 1;
        self.version
    }

    /// True if both layers point at the same content blob
    pub fn shares_content_with(&self, other: &Layer) -> bool {
        Arc::ptr_eq(&self.content, &other.content)
    }
}

/// NaN counts as fully opaque.
pub(crate) fn clamp_opacity(opacity: f32) -> f32 {
    if opacity.is_nan() {
        1.0
    } else {
        opacity.clamp(0.0, 1.0)
    }
}
