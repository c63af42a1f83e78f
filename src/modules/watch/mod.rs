pub mod registry;
pub mod session;
pub mod watcher;

// Re-exports for easy external access
pub use registry::PollRegistry;
pub use session::{PollConfig, PollSession};
pub use watcher::{spawn_status_poll, PollEvents, StatusFetch};
