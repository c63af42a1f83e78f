//! pitchline — client library for observing a media pitch pipeline
//!
//! A submitted asset is processed by an opaque backend (upload →
//! transcription → AI analysis → publication) with no push channel; this
//! crate discovers progress by polling. It provides the retrying remote
//! invocation client with dual-transport fallback, the error classifier, a
//! TTL cache for slowly-changing lookups, the media status model with
//! payload-presence derivation, and cancellable polling sessions.

pub mod modules;
pub mod shared;

pub use modules::cache::{CacheStats, TtlCache};
pub use modules::media::{derive_status, DerivedFlags, MediaRecord, MediaService, MediaStatus};
pub use modules::profile::{ProfileRecord, ProfileService};
pub use modules::remote::{
    invoke, FunctionGateway, FunctionTransport, HttpFunctionTransport, RestClient, RetryPolicy,
};
pub use modules::watch::{PollConfig, PollEvents, PollRegistry, PollSession};
pub use shared::config::ClientConfig;
pub use shared::errors::{
    classify, AppError, AppResult, Classification, ClassifiedError, ErrorKind, RecommendedAction,
    Severity,
};
pub use shared::utils::init_logger;
