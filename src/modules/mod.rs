pub mod cache;
pub mod media;
pub mod profile;
pub mod remote;
pub mod watch;
