mod bus;
mod events;

pub use bus::{EventBus, SubscriptionId};
pub use events::{DocumentEvent, HistoryDirection};

/// Receives document events. Closures taking `&DocumentEvent` implement this.
pub trait EventHandler: Send {
    fn handle_event(&mut self, event: &DocumentEvent);
}

impl<F> EventHandler for F
where
    F: FnMut(&DocumentEvent) + Send,
{
    fn handle_event(&mut self, event: &DocumentEvent) {
        self(event)
    }
}
