//! In-memory stores for exercising the pipeline without a database.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use media_sync_models::{ItemId, SourceWatchRecord, TargetItem, TargetUserData, WatchStatePayload};
use media_sync_stores::{SourceStore, StoreError, TargetStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn item(seed: u8, path: &str, key: &str) -> TargetItem {
    TargetItem {
        id: ItemId::from_bytes([seed; 16]),
        user_data_key: key.to_string(),
        path: path.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub data: TargetUserData,
    /// Stands in for columns the sync never writes (e.g. rating)
    pub rating: Option<f64>,
}

#[derive(Default)]
struct TargetState {
    items: Vec<TargetItem>,
    user_data: HashMap<String, StoredRow>,
}

#[derive(Clone, Default)]
pub struct InMemoryTarget {
    state: Arc<Mutex<TargetState>>,
    fail_queries: Arc<AtomicBool>,
    /// Writes allowed before every further write fails
    write_budget: Arc<Mutex<Option<usize>>>,
    pub inserts: Arc<AtomicUsize>,
    pub updates: Arc<AtomicUsize>,
    pub closed: Arc<AtomicBool>,
}

impl InMemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&self, seed: u8, path: &str, key: &str) {
        self.state.lock().unwrap().items.push(item(seed, path, key));
    }

    pub fn put_row(&self, data: TargetUserData, rating: Option<f64>) {
        let key = data.key.clone();
        self.state.lock().unwrap().user_data.insert(key, StoredRow { data, rating });
    }

    pub fn row(&self, key: &str) -> Option<StoredRow> {
        self.state.lock().unwrap().user_data.get(key).cloned()
    }

    pub fn row_count(&self) -> usize {
        self.state.lock().unwrap().user_data.len()
    }

    pub fn fail_queries(&self) {
        self.fail_queries.store(true, Ordering::SeqCst);
    }

    pub fn fail_writes_after(&self, allowed: usize) {
        *self.write_budget.lock().unwrap() = Some(allowed);
    }

    fn check_query(&self) -> Result<(), StoreError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::query("memory", sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn check_write(&self, key: &str) -> Result<(), StoreError> {
        let mut budget = self.write_budget.lock().unwrap();
        match budget.as_mut() {
            Some(0) => Err(StoreError::Write {
                key: key.to_string(),
                source: sqlx::Error::PoolTimedOut,
            }),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TargetStore for InMemoryTarget {
    fn store_name(&self) -> &str {
        "memory"
    }

    async fn find_items_containing(&self, fragment: &str) -> Result<Vec<TargetItem>, StoreError> {
        self.check_query()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .items
            .iter()
            .filter(|item| item.path.contains(fragment))
            .cloned()
            .collect())
    }

    async fn get_user_data(&self, key: &str) -> Result<Option<TargetUserData>, StoreError> {
        self.check_query()?;
        Ok(self.row(key).map(|row| row.data))
    }

    async fn insert_user_data(&self, key: &str, payload: &WatchStatePayload) -> Result<(), StoreError> {
        self.check_write(key)?;
        let mut state = self.state.lock().unwrap();
        let id = key.to_string();
        if state.user_data.contains_key(&id) {
            // One row per key
            return Err(StoreError::Write {
                key: key.to_string(),
                source: sqlx::Error::Protocol("UNIQUE constraint failed".to_string()),
            });
        }
        state.user_data.insert(
            id,
            StoredRow {
                data: TargetUserData {
                    key: key.to_string(),
                    user_id: payload.user_id,
                    is_favorite: payload.is_favorite,
                    played: payload.played,
                    playback_position_ticks: payload.playback_position_ticks,
                    play_count: payload.play_count,
                    last_played_date: Some(payload.last_played_date.clone()),
                },
                rating: None,
            },
        );
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_user_data(&self, key: &str, payload: &WatchStatePayload) -> Result<(), StoreError> {
        self.check_write(key)?;
        let mut state = self.state.lock().unwrap();
        if let Some(row) = state.user_data.get_mut(key) {
            row.data.user_id = payload.user_id;
            row.data.is_favorite = payload.is_favorite;
            row.data.played = payload.played;
            row.data.playback_position_ticks = payload.playback_position_ticks;
            row.data.play_count = payload.play_count;
            row.data.last_played_date = Some(payload.last_played_date.clone());
        }
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Source that yields a fixed list, optionally failing after `fail_after` records.
#[derive(Clone, Default)]
pub struct VecSource {
    records: Vec<SourceWatchRecord>,
    fail_after: Option<usize>,
    pub closed: Arc<AtomicBool>,
}

impl VecSource {
    pub fn new(records: Vec<SourceWatchRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn failing_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }
}

#[async_trait]
impl SourceStore for VecSource {
    fn store_name(&self) -> &str {
        "memory"
    }

    fn watched_records(&self) -> BoxStream<'_, Result<SourceWatchRecord, StoreError>> {
        let mut items: Vec<Result<SourceWatchRecord, StoreError>> = self.records.iter().cloned().map(Ok).collect();
        if let Some(count) = self.fail_after {
            items.truncate(count);
            items.push(Err(StoreError::query("memory", sqlx::Error::PoolTimedOut)));
        }
        stream::iter(items).boxed()
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
