//! Communicator events and subscriber fan-out
//!
//! Events are pushed into per-subscriber unbounded channels while the
//! communicator's state lock is held, so every subscriber observes them in
//! transition order. Subscriber code itself never runs under that lock.

use crate::protocol::status::SocketStatus;
use tokio::sync::mpsc;

/// Status change payload: numeric code plus human-readable name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// Numeric status code
    pub code: u16,
    /// Status name, e.g. `SOCKET_STATUS_CONNECTED`
    pub name: String,
}

impl StatusChange {
    /// Typed status, if the code is known
    pub fn status(&self) -> Option<SocketStatus> {
        SocketStatus::from_code(self.code)
    }
}

impl From<SocketStatus> for StatusChange {
    fn from(status: SocketStatus) -> Self {
        Self {
            code: status.code(),
            name: status.name().to_string(),
        }
    }
}

/// Event published by a communicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommEvent {
    /// Connectivity flipped
    ConnectedChanged(bool),
    /// Transport reported a new status
    StatusChanged(StatusChange),
    /// Bytes arrived, decoded one character per byte
    Response(String),
}

/// Receiving end of a subscription
///
/// Yields `None` once the communicator is disposed.
pub type EventReceiver = mpsc::UnboundedReceiver<CommEvent>;

/// Subscriber registry
#[derive(Debug, Default)]
pub(crate) struct EventBus {
    subscribers: Vec<mpsc::UnboundedSender<CommEvent>>,
}

impl EventBus {
    pub(crate) fn subscribe(&mut self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver to every live subscriber, pruning dropped receivers
    pub(crate) fn publish(&mut self, event: CommEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Drop every sender; receivers drain and then end
    pub(crate) fn close(&mut self) {
        self.subscribers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_preserves_order_per_subscriber() {
        let mut bus = EventBus::default();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(CommEvent::ConnectedChanged(true));
        bus.publish(CommEvent::StatusChanged(SocketStatus::Connected.into()));

        for rx in [&mut a, &mut b] {
            assert_eq!(rx.try_recv().unwrap(), CommEvent::ConnectedChanged(true));
            assert_eq!(
                rx.try_recv().unwrap(),
                CommEvent::StatusChanged(StatusChange {
                    code: 2,
                    name: "SOCKET_STATUS_CONNECTED".to_string()
                })
            );
        }
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let mut bus = EventBus::default();
        let rx = bus.subscribe();
        let _keep = bus.subscribe();
        drop(rx);

        bus.publish(CommEvent::Response("x".into()));
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_close_ends_streams() {
        let mut bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.publish(CommEvent::ConnectedChanged(false));
        bus.close();

        assert_eq!(rx.try_recv().unwrap(), CommEvent::ConnectedChanged(false));
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_status_change_round_trips_code() {
        let change = StatusChange::from(SocketStatus::LinkLost);
        assert_eq!(change.status(), Some(SocketStatus::LinkLost));
    }
}
