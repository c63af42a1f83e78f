//! Media lifecycle status
//!
//! The backend advances a submitted asset through
//! `uploaded → processing → transcribed → analyzing → analyzed → published`,
//! with `failed` reachable from any non-terminal state. Forward jumps are
//! legal: the backend may skip intermediate states entirely, so no transition
//! table is enforced on observed values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status enum matching the backend's string values (case-sensitive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaStatus {
    Uploaded,
    Processing,
    Transcribed,
    Analyzing,
    Analyzed,
    Published,
    Failed,
}

impl MediaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaStatus::Uploaded => "uploaded",
            MediaStatus::Processing => "processing",
            MediaStatus::Transcribed => "transcribed",
            MediaStatus::Analyzing => "analyzing",
            MediaStatus::Analyzed => "analyzed",
            MediaStatus::Published => "published",
            MediaStatus::Failed => "failed",
        }
    }

    /// Terminal for status discovery: polling stops here. `analyzed` is
    /// included because the move to `published` is a distinct user action,
    /// not something the pipeline does on its own.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MediaStatus::Analyzed | MediaStatus::Published | MediaStatus::Failed
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, MediaStatus::Failed)
    }

    /// Position along the pipeline, used to decide whether a derived state
    /// would move the display backwards.
    fn progress_rank(&self) -> u8 {
        match self {
            MediaStatus::Uploaded => 0,
            MediaStatus::Processing => 1,
            MediaStatus::Transcribed => 2,
            MediaStatus::Analyzing => 3,
            MediaStatus::Analyzed => 4,
            MediaStatus::Published => 5,
            // failure is handled before ranks are ever compared
            MediaStatus::Failed => 6,
        }
    }
}

impl fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(MediaStatus::Uploaded),
            "processing" => Ok(MediaStatus::Processing),
            "transcribed" => Ok(MediaStatus::Transcribed),
            "analyzing" => Ok(MediaStatus::Analyzing),
            "analyzed" => Ok(MediaStatus::Analyzed),
            "published" => Ok(MediaStatus::Published),
            "failed" => Ok(MediaStatus::Failed),
            other => Err(format!("Invalid media status: {}", other)),
        }
    }
}

/// Client-computed payload-presence flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DerivedFlags {
    pub has_transcript: bool,
    pub has_analysis: bool,
}

/// Compute the display status from a raw status plus payload-presence flags.
///
/// The transcript and analysis payloads are written by different backend
/// steps than the one updating the status column, so the two can be
/// transiently inconsistent. Precedence, highest first: a raw `failed`
/// always wins; an analysis payload implies `analyzed`; a transcript implies
/// `transcribed` unless the raw status is already further along; otherwise
/// the raw status stands.
pub fn derive_status(raw: MediaStatus, flags: DerivedFlags) -> MediaStatus {
    if raw.is_failure() {
        return MediaStatus::Failed;
    }
    if flags.has_analysis {
        return MediaStatus::Analyzed;
    }
    if flags.has_transcript && raw.progress_rank() < MediaStatus::Transcribed.progress_rank() {
        return MediaStatus::Transcribed;
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_through_from_str() {
        for status in [
            MediaStatus::Uploaded,
            MediaStatus::Processing,
            MediaStatus::Transcribed,
            MediaStatus::Analyzing,
            MediaStatus::Analyzed,
            MediaStatus::Published,
            MediaStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<MediaStatus>().unwrap(), status);
        }
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert!("Uploaded".parse::<MediaStatus>().is_err());
        assert!("PROCESSING".parse::<MediaStatus>().is_err());
        assert!("draft".parse::<MediaStatus>().is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(MediaStatus::Analyzed.is_terminal());
        assert!(MediaStatus::Published.is_terminal());
        assert!(MediaStatus::Failed.is_terminal());
        assert!(!MediaStatus::Uploaded.is_terminal());
        assert!(!MediaStatus::Analyzing.is_terminal());
    }

    #[test]
    fn analysis_payload_overrides_a_lagging_status() {
        let flags = DerivedFlags {
            has_transcript: true,
            has_analysis: true,
        };
        assert_eq!(
            derive_status(MediaStatus::Processing, flags),
            MediaStatus::Analyzed
        );
        assert_eq!(
            derive_status(MediaStatus::Uploaded, flags),
            MediaStatus::Analyzed
        );
    }

    #[test]
    fn failed_always_wins() {
        let flags = DerivedFlags {
            has_transcript: true,
            has_analysis: true,
        };
        assert_eq!(derive_status(MediaStatus::Failed, flags), MediaStatus::Failed);
    }

    #[test]
    fn transcript_never_moves_the_display_backwards() {
        let flags = DerivedFlags {
            has_transcript: true,
            has_analysis: false,
        };
        assert_eq!(
            derive_status(MediaStatus::Processing, flags),
            MediaStatus::Transcribed
        );
        assert_eq!(
            derive_status(MediaStatus::Analyzing, flags),
            MediaStatus::Analyzing
        );
        assert_eq!(
            derive_status(MediaStatus::Published, flags),
            MediaStatus::Published
        );
    }

    #[test]
    fn no_flags_means_raw_status_stands() {
        let flags = DerivedFlags::default();
        assert_eq!(
            derive_status(MediaStatus::Processing, flags),
            MediaStatus::Processing
        );
        assert_eq!(
            derive_status(MediaStatus::Uploaded, flags),
            MediaStatus::Uploaded
        );
    }
}
