use serde::Serialize;
use tokio::sync::broadcast;

/// Change notification sent after a document write has been persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    Created { xid: String, initiator_id: Option<String> },
    Updated { xid: String, initiator_id: Option<String> },
    Deleted { xid: String, initiator_id: Option<String> },
}

impl Event {
    pub fn xid(&self) -> &str {
        match self {
            Event::Created { xid, .. } | Event::Updated { xid, .. } | Event::Deleted { xid, .. } => xid,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(100);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub fn send(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
