use crate::document::Document;
use crate::layer::{Layer, LayerId};
use crate::layer_stack::LayerStack;
use crate::render::{self, Rasterizer};
use image::RgbaImage;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// What a cache entry renders: one layer, or a whole document composite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheScope {
    Layer(LayerId),
    Document(Uuid),
}

/// The per-layer inputs that affect rendered pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerKey {
    pub id: LayerId,
    pub version: u64,
    /// `f32::to_bits` of the opacity, so the key is `Eq`
    pub opacity_bits: u32,
    pub visible: bool,
}

impl LayerKey {
    pub fn of(layer: &Layer) -> Self {
        Self {
            id: layer.id(),
            version: layer.version(),
            opacity_bits: layer.opacity().to_bits(),
            visible: layer.is_visible(),
        }
    }
}

/// Everything a cached raster was derived from. An entry is reused only if
/// its recorded key equals the current one exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderKey {
    Layer {
        layer: LayerKey,
        size: [u32; 2],
    },
    Composite {
        layers: Vec<LayerKey>,
        canvas_bits: [u32; 2],
        background: Option<[u8; 4]>,
        size: [u32; 2],
    },
}

#[derive(Debug)]
struct CacheEntry {
    key: RenderKey,
    /// `None` records that the source was blank
    image: Option<Arc<RgbaImage>>,
}

/// Lazily recomputed thumbnails, one entry per layer or document.
///
/// A stale entry is overwritten rather than kept alongside the new one.
#[derive(Debug, Default)]
pub struct RenderCache {
    entries: HashMap<CacheScope, CacheEntry>,
    /// Number of renders performed, for checking that hits do no work
    recompute_count: u64,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached raster for `scope` if its key matches, otherwise
    /// renders, stores and returns the fresh result
    pub fn get_or_render<F>(&mut self, scope: CacheScope, key: RenderKey, render: F) -> Option<Arc<RgbaImage>>
    where
        F: FnOnce() -> Option<RgbaImage>,
    {
        if let Some(entry) = self.entries.get(&scope) {
            if entry.key == key {
                return entry.image.clone();
            }
        }

        log::debug!("Rendering {scope:?}");
        self.recompute_count += 1;
        let image = render().map(Arc::new);
        self.entries.insert(
            scope,
            CacheEntry {
                key,
                image: image.clone(),
            },
        );
        image
    }

    /// Thumbnail of one layer's drawn region, `None` if the layer is blank
    pub fn layer_thumbnail(
        &mut self,
        layer: &Layer,
        rasterizer: &dyn Rasterizer,
        size: [u32; 2],
    ) -> Option<Arc<RgbaImage>> {
        let key = RenderKey::Layer {
            layer: LayerKey::of(layer),
            size,
        };
        self.get_or_render(CacheScope::Layer(layer.id()), key, || {
            render::render_layer(layer, rasterizer, size)
        })
    }

    /// Composite of the whole document, letterboxed into `size`
    pub fn document_thumbnail(
        &mut self,
        document: &Document,
        rasterizer: &dyn Rasterizer,
        size: [u32; 2],
        include_background: bool,
    ) -> Option<Arc<RgbaImage>> {
        let canvas = document.canvas_size();
        let background = include_background.then(|| document.background_color());
        let key = RenderKey::Composite {
            layers: document.layers().iter().map(LayerKey::of).collect(),
            canvas_bits: [canvas.x.to_bits(), canvas.y.to_bits()],
            background: background.map(|color| color.to_rgba8()),
            size,
        };
        self.get_or_render(CacheScope::Document(document.id()), key, || {
            render::render_composite(
                document.layers().layers(),
                canvas,
                background,
                rasterizer,
                size,
            )
        })
    }

    /// Drops the entry for a removed layer
    pub fn evict_layer(&mut self, id: LayerId) -> bool {
        self.entries.remove(&CacheScope::Layer(id)).is_some()
    }

    pub fn evict_document(&mut self, id: Uuid) -> bool {
        self.entries.remove(&CacheScope::Document(id)).is_some()
    }

    /// Drops layer entries whose layer is no longer in `stack`, e.g. after
    /// an undo removed it
    pub fn retain_layers(&mut self, stack: &LayerStack) {
        self.entries.retain(|scope, _| match scope {
            CacheScope::Layer(id) => stack.contains(*id),
            CacheScope::Document(_) => true,
        });
    }

    pub fn contains(&self, scope: CacheScope) -> bool {
        self.entries.contains_key(&scope)
    }

    /// Clears all entries from the cache
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of entries currently in the cache
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn recompute_count(&self) -> u64 {
        self.recompute_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    // Mock a render function for testing
    fn mock_render() -> Option<RgbaImage> {
        Some(RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255])))
    }

    fn key(version: u64) -> RenderKey {
        RenderKey::Layer {
            layer: LayerKey {
                id: LayerId::from_uuid(Uuid::nil()),
                version,
                opacity_bits: 1.0f32.to_bits(),
                visible: true,
            },
            size: [10, 10],
        }
    }

    #[test]
    fn test_cache_hit() {
        let mut cache = RenderCache::new();
        let scope = CacheScope::Layer(LayerId::new());

        let first = cache.get_or_render(scope, key(1), mock_render).unwrap();
        let second = cache.get_or_render(scope, key(1), mock_render).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.recompute_count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_version_change_overwrites_entry() {
        let mut cache = RenderCache::new();
        let scope = CacheScope::Layer(LayerId::new());

        cache.get_or_render(scope, key(1), mock_render);
        cache.get_or_render(scope, key(2), mock_render);

        assert_eq!(cache.recompute_count(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_blank_result_is_cached() {
        let mut cache = RenderCache::new();
        let scope = CacheScope::Layer(LayerId::new());

        assert!(cache.get_or_render(scope, key(0), || None).is_none());
        assert!(cache.get_or_render(scope, key(0), mock_render).is_none());
        assert_eq!(cache.recompute_count(), 1);
    }

    #[test]
    fn test_eviction_is_per_entry() {
        let mut cache = RenderCache::new();
        let a = LayerId::new();
        let b = LayerId::new();
        cache.get_or_render(CacheScope::Layer(a), key(1), mock_render);
        cache.get_or_render(CacheScope::Layer(b), key(1), mock_render);

        assert!(cache.evict_layer(a));
        assert!(!cache.contains(CacheScope::Layer(a)));
        assert!(cache.contains(CacheScope::Layer(b)));
        assert!(!cache.evict_layer(a));
    }
}
