#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod document;
pub mod event;
pub mod export;
pub mod history;
pub mod layer;
pub mod layer_stack;
pub mod persistence;
pub mod render;
pub mod session;
pub mod stroke;
pub mod thumbnail_cache;
pub mod util;

pub use config::EditorConfig;
pub use document::{CanvasColor, Document};
pub use event::{DocumentEvent, EventHandler};
pub use export::{ExportError, ExportFormat, ExportOptions, export_document};
pub use history::{History, Snapshot};
pub use layer::{Layer, LayerId};
pub use layer_stack::{LayerError, LayerStack};
pub use persistence::{DocumentStore, PersistenceError};
pub use render::{Rasterizer, StrokeRasterizer};
pub use session::DrawingSession;
pub use stroke::{Drawing, Stroke};
pub use thumbnail_cache::RenderCache;
