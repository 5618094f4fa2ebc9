pub mod item_id;
pub mod target_item;
pub mod timestamp;
pub mod user_data;
pub mod watch_record;

pub use item_id::{format_identifier, parse_identifier, IdentifierError, ItemId};
pub use target_item::TargetItem;
pub use timestamp::{format_last_played, parse_source_timestamp};
pub use user_data::{TargetUserData, WatchStatePayload};
pub use watch_record::SourceWatchRecord;
