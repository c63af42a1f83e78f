pub mod media_record;
pub mod media_status;

pub use media_record::MediaRecord;
pub use media_status::{derive_status, DerivedFlags, MediaStatus};
