use tokio::sync::broadcast;

use super::types::ContentEvent;

/// Matches the `EVENT_BUS_CAPACITY` default.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out of content changes to live listeners (the admin panel's SSE
/// stream). Cloning shares the channel. Listeners that fall more than
/// `capacity` events behind lose the backlog and see `Lagged`.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ContentEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns how many listeners got the event. Nobody listening is normal.
    pub fn publish(&self, event: ContentEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ContentEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
