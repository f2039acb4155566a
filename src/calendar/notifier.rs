use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::events::CalendarNotification;

/// Fan-out of calendar notifications to any number of subscribers.
///
/// Slow subscribers lag rather than block the calendar; see
/// [`broadcast::error::RecvError::Lagged`].
#[derive(Clone, Debug)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<CalendarNotification>,
}

impl ChangeNotifier {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CalendarNotification> {
        self.sender.subscribe()
    }

    /// Returns how many subscribers received the notification.
    pub fn publish(&self, notification: CalendarNotification) -> usize {
        match self.sender.send(notification) {
            Ok(receivers) => receivers,
            Err(_) => {
                trace!("No calendar subscribers");
                0
            }
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
