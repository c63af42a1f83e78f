pub mod application;
pub mod domain;

// Re-exports for easy external access
pub use application::MediaService;
pub use domain::{derive_status, DerivedFlags, MediaRecord, MediaStatus};
