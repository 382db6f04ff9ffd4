use crate::layer::LayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Undo,
    Redo,
}

/// Notifications emitted by a `Document` after each successful mutation
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    LayerAdded {
        index: usize,
        id: LayerId,
    },
    LayerRemoved {
        id: LayerId,
    },
    LayersReordered,
    /// Name, visibility or opacity changed
    LayerUpdated {
        id: LayerId,
    },
    ContentCommitted {
        id: LayerId,
        version: u64,
    },
    ActiveLayerChanged {
        index: usize,
    },
    /// The whole layer stack was replaced by undo or redo
    HistoryRestored(HistoryDirection),
    /// Document name, canvas size or background changed
    MetadataChanged,
}
