//! Media record entity
//!
//! The client's last-observed copy of a pipeline asset. The backend is the
//! only writer; the client reads it through polling and derives the display
//! status from payload presence when the stored status column lags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::shared::errors::AppResult;

use super::media_status::{derive_status, DerivedFlags, MediaStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    /// Raw status string as stored server-side
    pub status: String,
    /// Present only when the pipeline failed
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub transcript_text: Option<String>,
    #[serde(default)]
    pub analysis: Option<Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MediaRecord {
    /// Parse the stored status string strictly.
    pub fn parse_status(&self) -> Result<MediaStatus, String> {
        self.status.parse()
    }

    /// Raw status, tolerating values this client version does not know:
    /// an unrecognized string means the pipeline still owns the asset, and
    /// the payload-presence flags correct the display state anyway.
    pub fn raw_status(&self) -> MediaStatus {
        self.parse_status().unwrap_or(MediaStatus::Processing)
    }

    pub fn derived_flags(&self) -> DerivedFlags {
        let has_transcript = self
            .transcript_text
            .as_deref()
            .map_or(false, |text| !text.trim().is_empty());

        let has_analysis = match &self.analysis {
            None | Some(Value::Null) => false,
            Some(Value::Object(map)) => !map.is_empty(),
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        };

        DerivedFlags {
            has_transcript,
            has_analysis,
        }
    }

    /// Display status corrected for write-ordering gaps between the status
    /// column and the payload columns.
    pub fn effective_status(&self) -> MediaStatus {
        derive_status(self.raw_status(), self.derived_flags())
    }

    pub fn is_terminal(&self) -> bool {
        self.effective_status().is_terminal()
    }

    /// Deserialize a REST row into a record.
    pub fn from_row(row: Value) -> AppResult<Self> {
        Ok(serde_json::from_value(row)?)
    }
}
