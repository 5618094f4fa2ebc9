use async_trait::async_trait;
use futures::stream::BoxStream;
use media_sync_models::{SourceWatchRecord, TargetItem, TargetUserData, WatchStatePayload};
use crate::error::StoreError;

/// The library play history is read from.
#[async_trait]
pub trait SourceStore: Send + Sync {
    fn store_name(&self) -> &str;

    /// Every file with a play count above zero, streamed in store order.
    fn watched_records(&self) -> BoxStream<'_, Result<SourceWatchRecord, StoreError>>;

    /// Release the connection. Called once after the pass, on every exit path.
    async fn close(&self) {}
}

/// The library whose per-user watch state is brought in line with the source.
#[async_trait]
pub trait TargetStore: Send + Sync {
    fn store_name(&self) -> &str;

    /// All items whose stored path contains `fragment` as an exact,
    /// case-sensitive substring, in the store's default order.
    async fn find_items_containing(&self, fragment: &str) -> Result<Vec<TargetItem>, StoreError>;

    /// The user-data row stored under `key`, whichever user it belongs to.
    async fn get_user_data(&self, key: &str) -> Result<Option<TargetUserData>, StoreError>;

    async fn insert_user_data(&self, key: &str, payload: &WatchStatePayload) -> Result<(), StoreError>;

    /// Overwrite the payload fields (including `userId`) of the row stored
    /// under `key`; other columns are untouched.
    async fn update_user_data(&self, key: &str, payload: &WatchStatePayload) -> Result<(), StoreError>;

    async fn close(&self) {}
}
