use crate::config::EditorConfig;
use crate::document::Document;
use crate::layer::ContentRef;
use crate::util::debounce::Debouncer;
use std::time::Instant;

/// Bridges the drawing engine's change stream to the document.
///
/// Pointer-move updates only arm the settle timer; the layer content and
/// the undo snapshot change once, when the interaction ends. One completed
/// stroke is one undo step.
#[derive(Debug, Clone)]
pub struct DrawingSession {
    settle: Debouncer,
    in_progress: bool,
}

impl DrawingSession {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            settle: Debouncer::new(config.settle_delay()),
            in_progress: false,
        }
    }

    /// Called for every intermediate drawing change
    pub fn content_changed(&mut self, now: Instant) {
        self.in_progress = true;
        self.settle.notify(now);
    }

    /// Advisory: true once per burst, after the drawing has been quiet for
    /// the settle delay
    pub fn poll_settled(&mut self, now: Instant) -> bool {
        self.settle.poll(now)
    }

    pub fn is_drawing(&self) -> bool {
        self.in_progress
    }

    pub fn settle_pending(&self) -> bool {
        self.settle.is_pending()
    }

    /// The commit point. Cancels any pending settle notification and writes
    /// `content` to the active layer as one undoable step. Returns the new
    /// content version.
    pub fn interaction_ended(
        &mut self,
        document: &mut Document,
        content: impl Into<ContentRef>,
    ) -> Option<u64> {
        self.settle.cancel();
        self.in_progress = false;
        let index = document.active_layer_index();
        document.commit_stroke(index, content)
    }
}
