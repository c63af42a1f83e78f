//! Media pipeline service
//!
//! Composes the REST client, the function gateway, and the poll registry
//! into the operations callers actually use: fetch a record, kick off
//! transcription or analysis, and watch a record until the pipeline is done
//! with it. Submission of the media bytes themselves happens elsewhere; this
//! service works with an already-created media id.

use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::modules::media::domain::MediaRecord;
use crate::modules::remote::{invoke, FunctionGateway, RestClient, RetryPolicy};
use crate::modules::watch::{PollConfig, PollEvents, PollRegistry, PollSession, StatusFetch};
use crate::shared::config::ClientConfig;
use crate::shared::errors::ClassifiedError;

const MEDIA_TABLE: &str = "media_items";
const MEDIA_COLUMNS: &str =
    "id,title,status,error_message,transcript_text,analysis,created_at,updated_at";

const TRANSCRIBE_FUNCTION: &str = "transcribe-media";
const ANALYZE_FUNCTION: &str = "analyze-transcript";

pub struct MediaService {
    rest: Arc<RestClient>,
    gateway: Arc<FunctionGateway>,
    registry: Arc<PollRegistry>,
    query_policy: RetryPolicy,
}

impl MediaService {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_parts(
            Arc::new(RestClient::new(config)),
            Arc::new(FunctionGateway::from_config(config)),
            Arc::new(PollRegistry::new()),
        )
    }

    pub fn with_parts(
        rest: Arc<RestClient>,
        gateway: Arc<FunctionGateway>,
        registry: Arc<PollRegistry>,
    ) -> Self {
        Self {
            rest,
            gateway,
            registry,
            query_policy: RetryPolicy::query(),
        }
    }

    /// Fetch the current record for a media item.
    pub async fn fetch_media(&self, media_id: Uuid) -> Result<MediaRecord, ClassifiedError> {
        let rest = Arc::clone(&self.rest);
        invoke("media.fetch", &self.query_policy, move || {
            let rest = Arc::clone(&rest);
            async move {
                let row = rest
                    .fetch_row_by_id(MEDIA_TABLE, media_id, MEDIA_COLUMNS)
                    .await?;
                MediaRecord::from_row(row)
            }
        })
        .await
    }

    /// Ask the backend to transcribe a media item.
    pub async fn request_transcription(
        &self,
        media_id: Uuid,
    ) -> Result<Value, ClassifiedError> {
        self.gateway
            .invoke(TRANSCRIBE_FUNCTION, &json!({ "mediaId": media_id }))
            .await
    }

    /// Ask the backend to analyze a transcribed media item.
    pub async fn request_analysis(&self, media_id: Uuid) -> Result<Value, ClassifiedError> {
        self.gateway
            .invoke(ANALYZE_FUNCTION, &json!({ "mediaId": media_id }))
            .await
    }

    /// Watch a media item until the pipeline reaches a terminal state.
    /// Starting a new watch for the same (owner, media) pair replaces the
    /// previous one.
    pub fn watch(
        &self,
        owner: &str,
        media_id: Uuid,
        config: PollConfig,
        events: PollEvents,
    ) -> PollSession {
        let rest = Arc::clone(&self.rest);
        let policy = self.query_policy.clone();

        let fetch: StatusFetch = Arc::new(move |entity_id| {
            let rest = Arc::clone(&rest);
            let policy = policy.clone();
            Box::pin(async move {
                invoke("media.status", &policy, move || {
                    let rest = Arc::clone(&rest);
                    async move {
                        let row = rest
                            .fetch_row_by_id(MEDIA_TABLE, entity_id, MEDIA_COLUMNS)
                            .await?;
                        MediaRecord::from_row(row)
                    }
                })
                .await
            })
        });

        self.registry.start(owner, media_id, config, fetch, events)
    }

    /// Stop an active watch for (owner, media), if any.
    pub fn stop_watching(&self, owner: &str, media_id: Uuid) -> bool {
        self.registry.cancel(owner, media_id)
    }

    /// Cancel every watch this service started.
    pub fn stop_all_watches(&self) {
        self.registry.cancel_all();
    }

    pub fn registry(&self) -> Arc<PollRegistry> {
        Arc::clone(&self.registry)
    }
}
