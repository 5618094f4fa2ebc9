use serde::{Deserialize, Serialize};
use crate::item_id::ItemId;

/// A media item already known to the target library.
///
/// Read-only from the sync's point of view: items are looked up, never created.
/// `path` is carried along so candidate selection and diagnostics can use it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetItem {
    pub id: ItemId,
    pub user_data_key: String,
    pub path: String,
}
