// ── Transient feedback messages ──

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

/// How a feedback message should be presented.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
}

/// A single banner message. At most one is live at a time.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackMessage {
    /// Monotonic per-channel sequence number.
    pub id: u64,
    pub text: String,
    pub severity: Severity,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip)]
    pub(crate) deadline: Instant,
}

impl FeedbackMessage {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Whether the display window has passed.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}
