// ── Feedback channel ──
//
// Process-wide transient message bus. Any service can publish; a UI
// surface subscribes and shows the live message. Single slot, latest
// wins: no queue, and late subscribers do not get the current message
// replayed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::DEFAULT_FEEDBACK_DURATION;
use crate::model::{FeedbackMessage, Severity};
use crate::stream::Feed;
use crate::subscription::{Listener, Subscription};

type MessageListener = Listener<Arc<FeedbackMessage>>;

/// Cheaply cloneable handle to the feedback bus.
#[derive(Clone)]
pub struct NotificationChannel {
    inner: Arc<ChannelInner>,
}

struct ChannelInner {
    duration: Duration,
    next_message: AtomicU64,
    next_listener: AtomicU64,
    current: ArcSwapOption<FeedbackMessage>,
    latest: watch::Sender<Option<Arc<FeedbackMessage>>>,
    listeners: DashMap<u64, Arc<MessageListener>>,
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self::new(DEFAULT_FEEDBACK_DURATION)
    }
}

impl NotificationChannel {
    /// Create a channel whose messages stay live for `duration`.
    pub fn new(duration: Duration) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            inner: Arc::new(ChannelInner {
                duration,
                next_message: AtomicU64::new(1),
                next_listener: AtomicU64::new(1),
                current: ArcSwapOption::empty(),
                latest,
                listeners: DashMap::new(),
            }),
        }
    }

    /// Publish a message, preempting whatever is showing.
    pub fn publish(&self, text: impl Into<String>, severity: Severity) -> Arc<FeedbackMessage> {
        let issued_at = Utc::now();
        let message = Arc::new(FeedbackMessage {
            id: self.inner.next_message.fetch_add(1, Ordering::Relaxed),
            text: text.into(),
            severity,
            issued_at,
            expires_at: issued_at
                + chrono::Duration::from_std(self.inner.duration).unwrap_or(chrono::Duration::zero()),
            deadline: Instant::now() + self.inner.duration,
        });
        debug!(id = message.id, %severity, text = %message.text, "feedback");

        self.inner.current.store(Some(Arc::clone(&message)));
        self.inner.latest.send_replace(Some(Arc::clone(&message)));

        // Snapshot the registry so callbacks run without shard locks held.
        let listeners: Vec<(u64, Arc<MessageListener>)> = self
            .inner
            .listeners
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        for (key, listener) in listeners {
            if !listener.deliver(Arc::clone(&message)) {
                self.inner.listeners.remove(&key);
            }
        }

        message
    }

    pub fn info(&self, text: impl Into<String>) -> Arc<FeedbackMessage> {
        self.publish(text, Severity::Info)
    }

    pub fn error(&self, text: impl Into<String>) -> Arc<FeedbackMessage> {
        self.publish(text, Severity::Error)
    }

    /// Receive every message published after this call.
    pub fn subscribe(&self, on_message: impl FnMut(Arc<FeedbackMessage>) + Send + 'static) -> Subscription {
        let key = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        self.inner
            .listeners
            .insert(key, Arc::new(Listener::new(token.clone(), on_message)));

        let registry: Weak<ChannelInner> = Arc::downgrade(&self.inner);
        Subscription::with_hook(token, move || {
            if let Some(inner) = registry.upgrade() {
                inner.listeners.remove(&key);
            }
        })
    }

    /// Hide the live message, if any.
    pub fn dismiss(&self) {
        if self.inner.current.swap(None).is_some() {
            self.inner.latest.send_replace(None);
        }
    }

    /// The live message, or `None` once dismissed or expired.
    pub fn current(&self) -> Option<Arc<FeedbackMessage>> {
        self.inner
            .current
            .load_full()
            .filter(|message| !message.is_expired())
    }

    /// Feed of the most recently published message (ignores expiry).
    pub fn feed(&self) -> Feed<Option<Arc<FeedbackMessage>>> {
        Feed::new(self.inner.latest.subscribe())
    }

    pub fn duration(&self) -> Duration {
        self.inner.duration
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn recorder(channel: &NotificationChannel) -> (Subscription, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = channel.subscribe(move |m| sink.lock().unwrap().push(m.text.clone()));
        (sub, seen)
    }

    #[tokio::test]
    async fn latest_message_wins() {
        let channel = NotificationChannel::default();
        channel.info("M1");
        channel.error("M2");

        let current = channel.current().unwrap();
        assert_eq!(current.text, "M2");
        assert!(current.is_error());
    }

    #[tokio::test]
    async fn no_replay_to_late_subscribers() {
        let channel = NotificationChannel::default();
        channel.info("before");
        let (_sub, seen) = recorder(&channel);
        channel.info("after");
        assert_eq!(*seen.lock().unwrap(), vec!["after".to_string()]);
    }

    #[tokio::test]
    async fn cancelled_listener_is_removed() {
        let channel = NotificationChannel::default();
        let (sub, seen) = recorder(&channel);
        assert_eq!(channel.listener_count(), 1);

        assert!(sub.cancel());
        assert!(!sub.cancel());
        assert_eq!(channel.listener_count(), 0);

        channel.info("ignored");
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dismiss_clears_current() {
        let channel = NotificationChannel::default();
        channel.info("hello");
        channel.dismiss();
        assert!(channel.current().is_none());
        assert!(channel.feed().current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn messages_expire() {
        let channel = NotificationChannel::new(Duration::from_secs(4));
        let message = channel.info("short lived");
        assert_eq!(message.expires_at - message.issued_at, chrono::Duration::seconds(4));

        tokio::time::advance(Duration::from_millis(3_900)).await;
        assert!(channel.current().is_some());

        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(channel.current().is_none());
    }

    #[tokio::test]
    async fn ids_increase() {
        let channel = NotificationChannel::default();
        let a = channel.info("a");
        let b = channel.info("b");
        assert!(b.id > a.id);
    }
}
