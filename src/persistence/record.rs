use super::{PersistenceError, PersistenceResult};
use crate::config::EditorConfig;
use crate::document::{CanvasColor, Document, sanitize_canvas_size};
use crate::layer::{Layer, LayerId};
use crate::layer_stack::LayerStack;
use chrono::{DateTime, Utc};
use egui::Vec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// On-disk form of a document, one JSON file per document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: Uuid,
    pub name: String,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub background_color: ColorRecord,
    pub layers: Vec<LayerRecord>,
    #[serde(default)]
    pub active_layer_index: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRecord {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerRecord {
    pub id: Uuid,
    pub name: String,
    pub is_visible: bool,
    pub opacity: f32,
    #[serde(default, with = "drawing_data")]
    pub drawing_data: Vec<u8>,
    /// Absent in files written before content versioning
    #[serde(default)]
    pub version: u64,
}

impl From<CanvasColor> for ColorRecord {
    fn from(color: CanvasColor) -> Self {
        let color = color.clamped();
        Self {
            red: color.red as f64,
            green: color.green as f64,
            blue: color.blue as f64,
            alpha: color.alpha as f64,
        }
    }
}

impl From<ColorRecord> for CanvasColor {
    fn from(record: ColorRecord) -> Self {
        CanvasColor::new(
            record.red as f32,
            record.green as f32,
            record.blue as f32,
            record.alpha as f32,
        )
        .clamped()
    }
}

impl From<&Layer> for LayerRecord {
    fn from(layer: &Layer) -> Self {
        Self {
            id: layer.id().uuid(),
            name: layer.name().to_string(),
            is_visible: layer.is_visible(),
            opacity: layer.opacity(),
            drawing_data: layer.content().to_vec(),
            version: layer.version(),
        }
    }
}

impl LayerRecord {
    pub fn into_layer(self) -> Layer {
        Layer::restore(
            LayerId::from_uuid(self.id),
            self.name,
            self.is_visible,
            self.opacity,
            self.drawing_data,
            self.version,
        )
    }
}

impl From<&Document> for DocumentRecord {
    fn from(document: &Document) -> Self {
        let size = document.canvas_size();
        Self {
            id: document.id(),
            name: document.name().to_string(),
            canvas_width: size.x as f64,
            canvas_height: size.y as f64,
            background_color: document.background_color().into(),
            layers: document.layers().iter().map(LayerRecord::from).collect(),
            active_layer_index: document.active_layer_index() as i64,
            created_at: document.created_at(),
            updated_at: document.updated_at(),
        }
    }
}

impl DocumentRecord {
    /// Builds a live document, repairing what can be repaired: missing
    /// layers, duplicate ids, an out-of-range cursor. A non-positive or
    /// oversized canvas makes the record invalid.
    pub fn into_document(self, config: &EditorConfig) -> PersistenceResult<Document> {
        let canvas = Vec2::new(self.canvas_width as f32, self.canvas_height as f32);
        let canvas = sanitize_canvas_size(canvas, config.max_canvas_dimension).ok_or_else(|| {
            PersistenceError::InvalidDocument(format!(
                "canvas size {}x{} is outside (0, {}]",
                self.canvas_width, self.canvas_height, config.max_canvas_dimension
            ))
        })?;

        let layers: Vec<Layer> = self.layers.into_iter().map(LayerRecord::into_layer).collect();
        let active_index = self.active_layer_index.max(0) as usize;
        let stack = LayerStack::from_layers(layers, active_index, config.max_layers);

        Ok(Document::from_parts(
            self.id,
            self.name,
            canvas,
            self.background_color.into(),
            stack,
            self.created_at,
            self.updated_at,
            config,
        ))
    }
}

/// Base64 encoding for stroke blobs. A blob that does not decode becomes an
/// empty drawing rather than failing the whole document.
mod drawing_data {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let Some(encoded) = Option::<String>::deserialize(deserializer)? else {
            return Ok(Vec::new());
        };
        Ok(STANDARD.decode(encoded.trim()).unwrap_or_else(|err| {
            log::warn!("Discarding undecodable drawing data: {err}");
            Vec::new()
        }))
    }
}
