//! Poll session configuration and handle

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::modules::media::domain::MediaStatus;

/// Default polling interval for status discovery
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);
/// Interval used by analysis-stage call sites
pub const ANALYSIS_POLL_INTERVAL: Duration = Duration::from_millis(5000);
/// Ceiling before a session surfaces a timeout to its owner
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_millis(120_000);

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_duration: Duration,
    /// Additional states the owner treats as terminal for its use case
    pub stop_on: Vec<MediaStatus>,
}

impl PollConfig {
    pub fn status_poll() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_duration: DEFAULT_MAX_DURATION,
            stop_on: Vec::new(),
        }
    }

    pub fn analysis_poll() -> Self {
        Self {
            interval: ANALYSIS_POLL_INTERVAL,
            ..Self::status_poll()
        }
    }

    /// Also stop when `status` is observed (e.g. waiting only for
    /// `transcribed` before requesting analysis).
    pub fn stop_on(mut self, status: MediaStatus) -> Self {
        self.stop_on.push(status);
        self
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::status_poll()
    }
}

/// Handle to a running poll session.
///
/// Cancellation is cooperative: it prevents future ticks from starting, and
/// the result of an in-flight fetch is discarded. `cancel` is idempotent and
/// safe after natural termination.
#[derive(Debug, Clone)]
pub struct PollSession {
    entity_id: Uuid,
    token: CancellationToken,
    active: Arc<AtomicBool>,
}

impl PollSession {
    pub(crate) fn new(entity_id: Uuid) -> Self {
        Self {
            entity_id,
            token: CancellationToken::new(),
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn entity_id(&self) -> Uuid {
        self.entity_id
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) && !self.token.is_cancelled()
    }

    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub(crate) fn mark_finished(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}
