//! Polling reconciliation loop
//!
//! Repeatedly fetches an entity's record, derives the effective status, and
//! reports observed changes to the owner until a terminal state, a fetch
//! failure, the wall-clock ceiling, or cancellation ends the session. Ticks
//! are strictly sequential per session: a tick that would overlap an
//! in-flight fetch is skipped, not queued.

use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::modules::media::domain::{MediaRecord, MediaStatus};
use crate::shared::errors::ClassifiedError;
use crate::shared::utils::logger::LogContext;

use super::session::{PollConfig, PollSession};

/// Fetch of the current record for an entity, already running through the
/// remote invocation client (its retries happen inside this future).
pub type StatusFetch =
    Arc<dyn Fn(Uuid) -> BoxFuture<'static, Result<MediaRecord, ClassifiedError>> + Send + Sync>;

type UpdateFn = Box<dyn Fn(MediaStatus) + Send + Sync>;
type ErrorFn = Box<dyn Fn(ClassifiedError) + Send + Sync>;
type TimeoutFn = Box<dyn Fn() + Send + Sync>;

/// Owner callbacks. All of them run on the session task.
pub struct PollEvents {
    on_update: UpdateFn,
    on_error: ErrorFn,
    on_timeout: TimeoutFn,
}

impl PollEvents {
    pub fn new(on_update: impl Fn(MediaStatus) + Send + Sync + 'static) -> Self {
        Self {
            on_update: Box::new(on_update),
            on_error: Box::new(|_| {}),
            on_timeout: Box::new(|| {}),
        }
    }

    pub fn on_error(mut self, f: impl Fn(ClassifiedError) + Send + Sync + 'static) -> Self {
        self.on_error = Box::new(f);
        self
    }

    pub fn on_timeout(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_timeout = Box::new(f);
        self
    }
}

/// Start polling `entity_id`. The returned session cancels the loop.
pub fn spawn_status_poll(
    entity_id: Uuid,
    config: PollConfig,
    fetch: StatusFetch,
    events: PollEvents,
) -> PollSession {
    let session = PollSession::new(entity_id);
    let handle = session.clone();

    tokio::spawn(async move {
        poll_loop(entity_id, config, fetch, events, &handle).await;
        handle.mark_finished();
    });

    session
}

async fn poll_loop(
    entity_id: Uuid,
    config: PollConfig,
    fetch: StatusFetch,
    events: PollEvents,
    session: &PollSession,
) {
    let token = session.token();
    let deadline = Instant::now() + config.max_duration;
    let mut ticker = interval(config.interval);
    // an overlapping tick is skipped, never queued
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut last_reported: Option<MediaStatus> = None;

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = sleep_until(deadline) => {
                (events.on_timeout)();
                break;
            }
            _ = ticker.tick() => {}
        }

        // race the fetch against cancellation; a cancelled session discards
        // whatever the in-flight fetch would have produced
        let fetched = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            result = (fetch)(entity_id) => result,
        };

        match fetched {
            Ok(record) => {
                let effective = record.effective_status();
                LogContext::poll_observation(&entity_id.to_string(), effective.as_str());

                if last_reported != Some(effective) {
                    (events.on_update)(effective);
                    last_reported = Some(effective);
                }

                if effective.is_terminal() || config.stop_on.contains(&effective) {
                    break;
                }
            }
            Err(error) => {
                // the fetch already exhausted its internal retries; a broken
                // query endpoint must not keep a background loop alive
                (events.on_error)(error);
                break;
            }
        }
    }
}
