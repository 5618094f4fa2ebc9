use futures::StreamExt;
use media_sync_config::{Config, SyncOptions};
use media_sync_stores::{JellyfinLibrary, KodiLibrary, SourceStore, StoreError, TargetStore};
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, instrument};
use crate::matcher::Matcher;
use crate::reconciler::{ReconcileAction, Reconciler};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to read watched records from source: {0}")]
    Source(#[source] StoreError),
    #[error("failed to match '{file_path}': {source}")]
    Match {
        file_path: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to reconcile '{file_path}' (key '{key}'): {source}")]
    Reconcile {
        file_path: String,
        key: String,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    Inserted { file_path: String, key: String, item_id: String },
    Updated { file_path: String, key: String, item_id: String },
    Skipped { file_path: String },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub watched: usize,
    pub matched: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub dry_run: bool,
    #[serde(skip)]
    pub duration: Duration,
    pub outcomes: Vec<RecordOutcome>,
}

/// Connect to both libraries. If the second connection fails the first is
/// closed before the error is returned.
pub async fn connect_stores(config: &Config) -> Result<(Box<dyn SourceStore>, Box<dyn TargetStore>), StoreError> {
    let source = KodiLibrary::connect(&config.source).await?;
    let target = match JellyfinLibrary::open(&config.target).await {
        Ok(target) => target,
        Err(e) => {
            source.close().await;
            return Err(e);
        }
    };
    Ok((Box::new(source), Box::new(target)))
}

/// Runs one reconciliation pass: read watched records, match each against the
/// target, upsert the target's watch state.
///
/// Records are processed strictly one at a time. The first store error aborts
/// the pass; writes made before it stay committed.
pub struct SyncOrchestrator {
    source: Box<dyn SourceStore>,
    target: Box<dyn TargetStore>,
    options: SyncOptions,
    dry_run: bool,
}

impl SyncOrchestrator {
    pub fn new(source: Box<dyn SourceStore>, target: Box<dyn TargetStore>, options: SyncOptions) -> Self {
        Self {
            source,
            target,
            options,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run the pass, then close both stores whatever the result.
    #[instrument(skip(self), fields(dry_run = self.dry_run))]
    pub async fn sync(self) -> Result<SyncReport, SyncError> {
        let start = Instant::now();
        info!(
            operation = "sync_start",
            source = self.source.store_name(),
            target = self.target.store_name(),
            user_id = self.options.user_id,
            match_policy = self.options.match_policy.as_str(),
            "Starting watch state sync"
        );

        let result = self.run_pass().await;

        self.source.close().await;
        self.target.close().await;

        match result {
            Ok(mut report) => {
                report.duration = start.elapsed();
                info!(
                    operation = "sync_complete",
                    watched = report.watched,
                    matched = report.matched,
                    inserted = report.inserted,
                    updated = report.updated,
                    skipped = report.skipped,
                    dry_run = report.dry_run,
                    duration_ms = report.duration.as_millis() as u64,
                    "Sync completed"
                );
                Ok(report)
            }
            Err(e) => {
                error!(operation = "sync_failed", status = "error", error = %e, "Sync aborted");
                Err(e)
            }
        }
    }

    async fn run_pass(&self) -> Result<SyncReport, SyncError> {
        let matcher = Matcher::new(self.target.as_ref(), self.options.match_policy);
        let reconciler = Reconciler::new(self.target.as_ref(), self.options.user_id).with_dry_run(self.dry_run);
        let mut report = SyncReport {
            dry_run: self.dry_run,
            ..SyncReport::default()
        };

        let mut records = self.source.watched_records();
        while let Some(record) = records.next().await {
            let record = record.map_err(SyncError::Source)?;
            report.watched += 1;

            let item = matcher
                .find_target_item(&record.file_path)
                .await
                .map_err(|source| SyncError::Match {
                    file_path: record.file_path.clone(),
                    source,
                })?;

            let Some(item) = item else {
                debug!(operation = "reconcile", outcome = "skipped", file = %record.file_path, "No target item contains this path");
                report.skipped += 1;
                report.outcomes.push(RecordOutcome::Skipped { file_path: record.file_path });
                continue;
            };
            report.matched += 1;

            let action = reconciler
                .reconcile(&record, &item)
                .await
                .map_err(|source| SyncError::Reconcile {
                    file_path: record.file_path.clone(),
                    key: item.user_data_key.clone(),
                    source,
                })?;

            let item_id = item.id.to_string();
            info!(
                operation = "reconcile",
                outcome = action.as_str(),
                file = %record.file_path,
                key = %item.user_data_key,
                item_id = %item_id,
                play_count = record.play_count,
                dry_run = self.dry_run,
                "Reconciled watch state"
            );

            let (file_path, key) = (record.file_path, item.user_data_key);
            let outcome = match action {
                ReconcileAction::Inserted => {
                    report.inserted += 1;
                    RecordOutcome::Inserted { file_path, key, item_id }
                }
                ReconcileAction::Updated => {
                    report.updated += 1;
                    RecordOutcome::Updated { file_path, key, item_id }
                }
            };
            report.outcomes.push(outcome);
        }

        Ok(report)
    }
}
