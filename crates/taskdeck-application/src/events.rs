//! Outbound event channel to the view layer.

use taskdeck_core::session::{ClientEvent, Notification, Route};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Sends navigation requests and notifications to whoever renders them.
///
/// Sending never fails from the caller's point of view: if the receiving end
/// is gone the event is dropped and logged.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: UnboundedSender<ClientEvent>,
}

impl EventBus {
    pub fn channel() -> (Self, UnboundedReceiver<ClientEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn emit(&self, event: ClientEvent) {
        if let Err(err) = self.sender.send(event) {
            tracing::debug!("[EventBus] No listener, dropped {:?}", err.0);
        }
    }

    pub fn navigate(&self, route: Route) {
        self.emit(ClientEvent::Navigate { route });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.emit(ClientEvent::Notify {
            notification: Notification::Success(message.into()),
        });
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(ClientEvent::Notify {
            notification: Notification::Error(message.into()),
        });
    }
}
