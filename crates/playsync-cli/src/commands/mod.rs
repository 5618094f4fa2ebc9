pub mod config;
pub mod format_id;
pub mod sync;
