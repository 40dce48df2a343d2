//! Transient user-facing notifications.
//!
//! One slot, last write wins. A message stays visible for a fixed duration
//! after it was published, then dismisses itself. The application root creates
//! the [`Notifier`] and hands clones to whoever needs to publish; exactly one
//! [`NotificationSubscriber`] may render it at a time.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::DEFAULT_NOTIFICATION_DURATION;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    pub shown_at: Instant,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("a notification subscriber is already attached")]
    AlreadySubscribed,
}

struct Shared {
    slot: watch::Sender<Option<Notification>>,
    subscribed: AtomicBool,
    next_id: AtomicU64,
    duration: Duration,
}

/// Publishing half. Cheap to clone.
#[derive(Clone)]
pub struct Notifier {
    shared: Arc<Shared>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_DURATION)
    }
}

impl Notifier {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                slot,
                subscribed: AtomicBool::new(false),
                next_id: AtomicU64::new(1),
                duration,
            }),
        }
    }

    /// Replace whatever is showing with `message`.
    pub fn notify(&self, kind: NotificationKind, message: impl Into<String>) -> u64 {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let notification = Notification {
            id,
            kind,
            message: message.into(),
            shown_at: Instant::now(),
        };
        tracing::debug!(id, message = %notification.message, "Notification");
        self.shared.slot.send_replace(Some(notification));
        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.notify(NotificationKind::Success, message)
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.notify(NotificationKind::Info, message)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.notify(NotificationKind::Error, message)
    }

    /// The visible notification, if it has not yet timed out.
    #[must_use]
    pub fn current(&self) -> Option<Notification> {
        let slot = self.shared.slot.borrow();
        slot.as_ref()
            .filter(|notification| notification.shown_at.elapsed() < self.shared.duration)
            .cloned()
    }

    pub fn dismiss(&self) {
        self.shared.slot.send_replace(None);
    }

    /// Attach the single renderer.
    pub fn subscribe(&self) -> Result<NotificationSubscriber, NotifyError> {
        self.shared
            .subscribed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| NotifyError::AlreadySubscribed)?;
        Ok(NotificationSubscriber {
            slot: self.shared.slot.subscribe(),
            shared: Arc::clone(&self.shared),
            showing: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    Shown(Notification),
    Dismissed(u64),
}

/// Rendering half. Dropping it frees the slot for another subscriber.
pub struct NotificationSubscriber {
    slot: watch::Receiver<Option<Notification>>,
    shared: Arc<Shared>,
    showing: Option<u64>,
}

impl NotificationSubscriber {
    /// Wait for the next show or dismiss transition.
    pub async fn next_event(&mut self) -> Option<NotificationEvent> {
        loop {
            let latest = self.slot.borrow_and_update().clone();
            match (latest, self.showing) {
                (Some(notification), Some(id)) if id == notification.id => {
                    let expires_at = notification.shown_at + self.shared.duration;
                    tokio::select! {
                        changed = self.slot.changed() => changed.ok()?,
                        () = tokio::time::sleep_until(expires_at) => {
                            self.clear_if_current(notification.id);
                            self.showing = None;
                            return Some(NotificationEvent::Dismissed(notification.id));
                        }
                    }
                }
                (Some(notification), _) => {
                    self.showing = Some(notification.id);
                    return Some(NotificationEvent::Shown(notification));
                }
                (None, Some(id)) => {
                    self.showing = None;
                    return Some(NotificationEvent::Dismissed(id));
                }
                (None, None) => self.slot.changed().await.ok()?,
            }
        }
    }

    fn clear_if_current(&self, id: u64) {
        self.shared.slot.send_if_modified(|slot| {
            if slot.as_ref().is_some_and(|current| current.id == id) {
                *slot = None;
                true
            } else {
                false
            }
        });
    }
}

impl Drop for NotificationSubscriber {
    fn drop(&mut self) {
        self.shared.subscribed.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn notification_dismisses_after_duration() {
        let notifier = Notifier::new(Duration::from_secs(3));
        notifier.success("✦ Artwork added to gallery");
        assert_eq!(
            notifier.current().map(|n| n.message),
            Some("✦ Artwork added to gallery".to_string())
        );

        tokio::time::advance(Duration::from_millis(2_900)).await;
        assert!(notifier.current().is_some());

        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(notifier.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_message_replaces_current_one() {
        let notifier = Notifier::default();
        notifier.info("Editing: Dusk");
        tokio::time::advance(Duration::from_secs(2)).await;
        notifier.success("✦ Artwork updated");

        let current = notifier.current().unwrap();
        assert_eq!(current.message, "✦ Artwork updated");

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(notifier.current().unwrap().message, "✦ Artwork updated");
    }

    #[test]
    fn only_one_subscriber_at_a_time() {
        let notifier = Notifier::default();
        let first = notifier.subscribe().unwrap();
        assert_eq!(
            notifier.clone().subscribe().err(),
            Some(NotifyError::AlreadySubscribed)
        );

        drop(first);
        assert!(notifier.subscribe().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn subscriber_sees_show_then_dismiss() {
        let notifier = Notifier::new(Duration::from_secs(3));
        let mut subscriber = notifier.subscribe().unwrap();

        let id = notifier.success("Artwork removed");
        match subscriber.next_event().await {
            Some(NotificationEvent::Shown(notification)) => {
                assert_eq!(notification.id, id);
                assert_eq!(notification.message, "Artwork removed");
            }
            other => panic!("unexpected event: {other:?}"),
        }

        let started = Instant::now();
        assert_eq!(
            subscriber.next_event().await,
            Some(NotificationEvent::Dismissed(id))
        );
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert!(notifier.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn subscriber_switches_to_replacement_immediately() {
        let notifier = Notifier::new(Duration::from_secs(3));
        let mut subscriber = notifier.subscribe().unwrap();

        notifier.info("Editing: Dusk");
        assert!(matches!(
            subscriber.next_event().await,
            Some(NotificationEvent::Shown(_))
        ));

        let publisher = notifier.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            publisher.error("Error: Upload failed");
        });

        match subscriber.next_event().await {
            Some(NotificationEvent::Shown(notification)) => {
                assert_eq!(notification.message, "Error: Upload failed");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
