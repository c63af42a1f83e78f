//! Profile and questionnaire lookups
//!
//! These change slowly, so they go through the TTL cache before touching the
//! network. A cache miss always triggers a fresh fetch through the remote
//! invocation client; nothing is fetched by the cache itself. Mutation paths
//! must call `invalidate_user`, and sign-out clears everything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::modules::cache::TtlCache;
use crate::modules::remote::{invoke, RestClient, RetryPolicy};
use crate::shared::config::ClientConfig;
use crate::shared::errors::{classify, AppError, ClassifiedError, ErrorKind};

const PROFILE_TABLE: &str = "profiles";
const PROFILE_COLUMNS: &str = "id,user_id,display_name,bio,avatar_url,created_at";
const QUESTIONNAIRE_TABLE: &str = "questionnaire_responses";
const QUESTIONNAIRE_COLUMNS: &str = "id,user_id,completed_at";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct ProfileService {
    rest: Arc<RestClient>,
    profiles: TtlCache<ProfileRecord>,
    questionnaire: TtlCache<bool>,
    policy: RetryPolicy,
}

impl ProfileService {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_rest(Arc::new(RestClient::new(config)))
    }

    pub fn with_rest(rest: Arc<RestClient>) -> Self {
        Self {
            rest,
            profiles: TtlCache::default(),
            questionnaire: TtlCache::default(),
            policy: RetryPolicy::query(),
        }
    }

    /// Fetch a user's profile, serving a cached snapshot when fresh.
    /// Absence is an answer, not an error.
    pub async fn get_profile(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ProfileRecord>, ClassifiedError> {
        let key = profile_key(user_id);
        if let Some(profile) = self.profiles.get(&key) {
            return Ok(Some(profile));
        }

        let rows = match self.fetch_rows("profile.fetch", PROFILE_TABLE, user_id, PROFILE_COLUMNS).await
        {
            Ok(rows) => rows,
            Err(classified) if classified.kind() == ErrorKind::NotFound => return Ok(None),
            Err(classified) => return Err(classified),
        };

        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };

        let profile: ProfileRecord = serde_json::from_value(row).map_err(|e| {
            let error = AppError::from(e);
            ClassifiedError {
                classification: classify(&error),
                error,
                attempts: 1,
            }
        })?;

        self.profiles.set(key, profile.clone());
        Ok(Some(profile))
    }

    /// Whether the user completed the onboarding questionnaire. The snapshot
    /// is cached for the TTL window in both directions; submitting a
    /// questionnaire must call `invalidate_user`.
    pub async fn questionnaire_complete(&self, user_id: Uuid) -> Result<bool, ClassifiedError> {
        let key = questionnaire_key(user_id);
        if let Some(complete) = self.questionnaire.get(&key) {
            return Ok(complete);
        }

        let rows = match self
            .fetch_rows(
                "questionnaire.fetch",
                QUESTIONNAIRE_TABLE,
                user_id,
                QUESTIONNAIRE_COLUMNS,
            )
            .await
        {
            Ok(rows) => rows,
            Err(classified) if classified.kind() == ErrorKind::NotFound => {
                self.questionnaire.set(key, false);
                return Ok(false);
            }
            Err(classified) => return Err(classified),
        };

        let complete = rows.iter().any(|row| {
            row.get("completed_at")
                .map_or(false, |value| !value.is_null())
        });

        self.questionnaire.set(key, complete);
        Ok(complete)
    }

    /// Drop cached snapshots for a user after a mutation.
    pub fn invalidate_user(&self, user_id: Uuid) {
        self.profiles.invalidate(&profile_key(user_id));
        self.questionnaire.invalidate(&questionnaire_key(user_id));
    }

    /// Drop every cached snapshot (sign-out).
    pub fn clear(&self) {
        self.profiles.invalidate_all();
        self.questionnaire.invalidate_all();
    }

    async fn fetch_rows(
        &self,
        operation: &str,
        table: &'static str,
        user_id: Uuid,
        columns: &'static str,
    ) -> Result<Vec<Value>, ClassifiedError> {
        let rest = Arc::clone(&self.rest);
        let user = user_id.to_string();
        invoke(operation, &self.policy, move || {
            let rest = Arc::clone(&rest);
            let user = user.clone();
            async move { rest.fetch_rows(table, "user_id", &user, columns).await }
        })
        .await
    }
}

fn profile_key(user_id: Uuid) -> String {
    format!("profile:{}", user_id)
}

fn questionnaire_key(user_id: Uuid) -> String {
    format!("questionnaire:{}", user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_keys_are_scoped_per_user() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_ne!(profile_key(a), profile_key(b));
        assert_ne!(profile_key(a), questionnaire_key(a));
    }
}
