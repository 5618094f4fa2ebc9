use chrono::{DateTime, Utc};
use media_sync_models::{format_last_played, SourceWatchRecord, TargetItem, WatchStatePayload};
use media_sync_stores::{StoreError, TargetStore};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    Inserted,
    Updated,
}

impl ReconcileAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileAction::Inserted => "inserted",
            ReconcileAction::Updated => "updated",
        }
    }
}

/// Watch state the target should hold for a watched source record.
///
/// Favorite and resume position are always reset; `last_played_date` falls
/// back to `now` when the source never recorded a play time.
pub fn build_payload(record: &SourceWatchRecord, user_id: i64, now: DateTime<Utc>) -> WatchStatePayload {
    let last_played = record.last_played.unwrap_or(now);
    WatchStatePayload::watched(user_id, record.play_count, format_last_played(last_played))
}

/// Upserts target user data for matched pairs: update in place when a row
/// exists for the item's key, insert otherwise. One write per call.
pub struct Reconciler<'a> {
    target: &'a dyn TargetStore,
    user_id: i64,
    dry_run: bool,
    /// Keys a dry run has already reported as inserted
    planned_inserts: Mutex<HashSet<String>>,
}

impl<'a> Reconciler<'a> {
    pub fn new(target: &'a dyn TargetStore, user_id: i64) -> Self {
        Self {
            target,
            user_id,
            dry_run: false,
            planned_inserts: Mutex::new(HashSet::new()),
        }
    }

    /// Decide insert vs update as usual but skip the write.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn reconcile(&self, record: &SourceWatchRecord, item: &TargetItem) -> Result<ReconcileAction, StoreError> {
        let key = item.user_data_key.as_str();
        let existing = self.target.get_user_data(key).await?;
        let payload = build_payload(record, self.user_id, Utc::now());

        let action = match existing {
            Some(previous) => {
                debug!(
                    key,
                    previous_user_id = previous.user_id,
                    previous_play_count = previous.play_count,
                    play_count = payload.play_count,
                    "Existing user data found"
                );
                if !self.dry_run {
                    self.target.update_user_data(key, &payload).await?;
                }
                ReconcileAction::Updated
            }
            None if self.dry_run => {
                // A real run would have inserted the first time and updated since
                let first = self
                    .planned_inserts
                    .lock()
                    .map(|mut planned| planned.insert(key.to_string()))
                    .unwrap_or(true);
                if first {
                    ReconcileAction::Inserted
                } else {
                    ReconcileAction::Updated
                }
            }
            None => {
                self.target.insert_user_data(key, &payload).await?;
                ReconcileAction::Inserted
            }
        };

        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{item, InMemoryTarget};
    use chrono::{Duration, NaiveDateTime, TimeZone};
    use media_sync_models::{parse_source_timestamp, TargetUserData};

    fn record(path: &str, last_played: Option<&str>, play_count: u32) -> SourceWatchRecord {
        SourceWatchRecord::new(path, last_played.and_then(parse_source_timestamp), play_count)
    }

    #[tokio::test]
    async fn test_insert_when_no_row_exists() {
        let target = InMemoryTarget::new();
        let reconciler = Reconciler::new(&target, 1);

        let action = reconciler
            .reconcile(
                &record("Show/S01E01.mkv", Some("2023-01-01 10:00:00"), 3),
                &item(1, "/mnt/media/Show/S01E01.mkv", "abc123"),
            )
            .await
            .unwrap();

        assert_eq!(action, ReconcileAction::Inserted);
        assert_eq!(target.row_count(), 1);
        let row = target.row("abc123").unwrap().data;
        assert_eq!(row.play_count, 3);
        assert!(row.played);
        assert!(!row.is_favorite);
        assert_eq!(row.playback_position_ticks, 0);
        assert_eq!(row.last_played_date.as_deref(), Some("2023-01-01 10:00:00.000Z"));
    }

    #[tokio::test]
    async fn test_update_overwrites_payload_and_keeps_other_fields() {
        let target = InMemoryTarget::new();
        target.put_row(
            TargetUserData {
                key: "abc123".to_string(),
                user_id: 1,
                is_favorite: true,
                played: false,
                playback_position_ticks: 9_000_000,
                play_count: 1,
                last_played_date: Some("2020-01-01 00:00:00.000Z".to_string()),
            },
            Some(7.5),
        );

        let reconciler = Reconciler::new(&target, 1);
        let action = reconciler
            .reconcile(
                &record("Show/S01E01.mkv", Some("2023-01-01 10:00:00"), 4),
                &item(1, "/mnt/media/Show/S01E01.mkv", "abc123"),
            )
            .await
            .unwrap();

        assert_eq!(action, ReconcileAction::Updated);
        let row = target.row("abc123").unwrap();
        assert_eq!(row.rating, Some(7.5));
        assert_eq!(row.data.play_count, 4);
        assert!(row.data.played);
        assert!(!row.data.is_favorite);
        assert_eq!(row.data.playback_position_ticks, 0);
        assert_eq!(row.data.last_played_date.as_deref(), Some("2023-01-01 10:00:00.000Z"));
        assert_eq!(target.row_count(), 1);
    }

    #[tokio::test]
    async fn test_reconcile_twice_is_idempotent() {
        let target = InMemoryTarget::new();
        let reconciler = Reconciler::new(&target, 1);
        let rec = record("a.mkv", Some("2023-06-01 20:30:00"), 2);
        let it = item(1, "/media/a.mkv", "key-a");

        assert_eq!(reconciler.reconcile(&rec, &it).await.unwrap(), ReconcileAction::Inserted);
        let first = target.row("key-a").unwrap();
        assert_eq!(reconciler.reconcile(&rec, &it).await.unwrap(), ReconcileAction::Updated);
        let second = target.row("key-a").unwrap();

        assert_eq!(first, second);
        assert_eq!(target.inserts.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(target.updates.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(target.row_count(), 1);
    }

    #[tokio::test]
    async fn test_row_under_another_user_is_updated_not_duplicated() {
        let target = InMemoryTarget::new();
        target.put_row(
            TargetUserData {
                key: "abc123".to_string(),
                user_id: 2,
                is_favorite: true,
                played: false,
                playback_position_ticks: 500,
                play_count: 1,
                last_played_date: None,
            },
            Some(3.0),
        );

        let action = Reconciler::new(&target, 1)
            .reconcile(
                &record("Show/S01E01.mkv", Some("2023-01-01 10:00:00"), 3),
                &item(1, "/mnt/media/Show/S01E01.mkv", "abc123"),
            )
            .await
            .unwrap();

        assert_eq!(action, ReconcileAction::Updated);
        assert_eq!(target.row_count(), 1);
        assert_eq!(target.inserts.load(std::sync::atomic::Ordering::SeqCst), 0);
        let row = target.row("abc123").unwrap();
        assert_eq!(row.data.user_id, 1);
        assert_eq!(row.data.play_count, 3);
        assert_eq!(row.rating, Some(3.0));
    }

    #[tokio::test]
    async fn test_missing_last_played_falls_back_to_now() {
        let target = InMemoryTarget::new();
        let reconciler = Reconciler::new(&target, 1);

        let before = Utc::now() - Duration::seconds(1);
        reconciler
            .reconcile(&record("a.mkv", None, 1), &item(1, "/media/a.mkv", "key-a"))
            .await
            .unwrap();
        let after = Utc::now() + Duration::seconds(1);

        let written = target.row("key-a").unwrap().data.last_played_date.unwrap();
        assert!(written.ends_with(".000Z"));
        assert_eq!(written.matches(".000Z").count(), 1);

        let parsed = NaiveDateTime::parse_from_str(written.trim_end_matches(".000Z"), "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc();
        assert!(parsed >= before && parsed <= after, "{} not within [{}, {}]", parsed, before, after);
    }

    #[tokio::test]
    async fn test_payload_uses_configured_user() {
        let target = InMemoryTarget::new();
        let reconciler = Reconciler::new(&target, 42);
        reconciler
            .reconcile(&record("a.mkv", None, 1), &item(1, "/media/a.mkv", "key-a"))
            .await
            .unwrap();

        assert_eq!(target.row("key-a").unwrap().data.user_id, 42);
    }

    #[tokio::test]
    async fn test_dry_run_decides_without_writing() {
        let target = InMemoryTarget::new();
        let reconciler = Reconciler::new(&target, 1).with_dry_run(true);

        let action = reconciler
            .reconcile(&record("a.mkv", None, 1), &item(1, "/media/a.mkv", "key-a"))
            .await
            .unwrap();

        assert_eq!(action, ReconcileAction::Inserted);
        assert_eq!(target.row_count(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_counts_repeated_key_as_update() {
        let target = InMemoryTarget::new();
        let reconciler = Reconciler::new(&target, 1).with_dry_run(true);
        let it = item(1, "/media/Show/a.mkv", "key-a");

        let first = reconciler.reconcile(&record("Show/a.mkv", None, 1), &it).await.unwrap();
        let second = reconciler.reconcile(&record("a.mkv", None, 2), &it).await.unwrap();

        assert_eq!(first, ReconcileAction::Inserted);
        assert_eq!(second, ReconcileAction::Updated);
        assert_eq!(target.row_count(), 0);
    }

    #[tokio::test]
    async fn test_write_errors_propagate() {
        let target = InMemoryTarget::new();
        target.fail_writes_after(0);
        let reconciler = Reconciler::new(&target, 1);

        let err = reconciler
            .reconcile(&record("a.mkv", None, 1), &item(1, "/media/a.mkv", "key-a"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Write { ref key, .. } if key == "key-a"));
    }

    #[test]
    fn test_build_payload_formats_source_time() {
        let now = Utc.with_ymd_and_hms(2024, 2, 2, 2, 2, 2).unwrap();
        let payload = build_payload(&record("a.mkv", Some("2023-01-01 10:00:00"), 3), 1, now);
        assert_eq!(payload.last_played_date, "2023-01-01 10:00:00.000Z");

        let payload = build_payload(&record("a.mkv", None, 3), 1, now);
        assert_eq!(payload.last_played_date, "2024-02-02 02:02:02.000Z");
    }
}
