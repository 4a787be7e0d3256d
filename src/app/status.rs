use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, PoisonError, RwLock};

use chrono::Utc;
use tracing::debug;

use crate::app::models::{OperationStatus, StatusEvent};

/// The observable status of the semantic layer. Every transition is recorded
/// and pushed to live subscribers; a subscriber whose receiver was dropped is
/// pruned on the next publish.
pub struct StatusBoard {
    current: RwLock<OperationStatus>,
    subscribers: Mutex<Vec<Sender<StatusEvent>>>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(OperationStatus::Idle),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn current_status(&self) -> OperationStatus {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Receives every status published after this call, in publish order.
    pub fn subscribe(&self) -> Receiver<StatusEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub fn publish(&self, status: OperationStatus, trace_id: &str) {
        // Held across the send so concurrent publishers cannot interleave
        // the stored status and the delivered order.
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = status.clone();
        debug!(trace_id = %trace_id, status = ?status, "operation status");

        let event = StatusEvent {
            status,
            trace_id: trace_id.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        };
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        assert_eq!(StatusBoard::new().current_status(), OperationStatus::Idle);
    }

    #[test]
    fn subscribers_see_transitions_in_order() {
        let board = StatusBoard::new();
        let rx = board.subscribe();

        board.publish(OperationStatus::Executing("Enabling WiFi".to_string()), "t1");
        board.publish(OperationStatus::Success, "t1");

        let first = rx.recv().expect("first");
        let second = rx.recv().expect("second");
        assert_eq!(
            first.status,
            OperationStatus::Executing("Enabling WiFi".to_string())
        );
        assert_eq!(first.trace_id, "t1");
        assert!(chrono::DateTime::parse_from_rfc3339(&first.timestamp).is_ok());
        assert_eq!(second.status, OperationStatus::Success);
        assert_eq!(board.current_status(), OperationStatus::Success);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let board = StatusBoard::new();
        drop(board.subscribe());
        let live = board.subscribe();

        board.publish(OperationStatus::Error("boom".to_string()), "t");

        assert_eq!(board.subscribers.lock().expect("subscribers").len(), 1);
        assert_eq!(
            live.recv().expect("event").status,
            OperationStatus::Error("boom".to_string())
        );
    }
}
