//! Source library: a Kodi video database hosted on MySQL/MariaDB.

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use media_sync_config::SourceDbConfig;
use media_sync_models::{parse_source_timestamp, SourceWatchRecord};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;
use tracing::{debug, info, warn};
use crate::error::StoreError;
use crate::traits::SourceStore;

const STORE_NAME: &str = "kodi";

// lastPlayed is TEXT in stock schemas but some installs migrated it to DATETIME.
const WATCHED_FILES_QUERY: &str = r#"
    SELECT strFilename,
           CAST(lastPlayed AS CHAR) AS lastPlayed,
           CAST(playCount AS SIGNED) AS playCount
    FROM files
    WHERE playCount > 0
"#;

pub struct KodiLibrary {
    pool: MySqlPool,
}

impl KodiLibrary {
    pub async fn connect(config: &SourceDbConfig) -> Result<Self, StoreError> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        // One pass, one reader
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|source| StoreError::Connect { store: STORE_NAME, source })?;

        info!(
            operation = "connect",
            store = STORE_NAME,
            host = %config.host,
            database = %config.database,
            "Connected to source library"
        );

        Ok(Self { pool })
    }
}

fn decode_row(row: &MySqlRow) -> Result<Option<SourceWatchRecord>, sqlx::Error> {
    let file_path: Option<String> = row.try_get("strFilename")?;
    let last_played: Option<String> = row.try_get("lastPlayed")?;
    let play_count: Option<i64> = row.try_get("playCount")?;
    Ok(record_from_columns(file_path, last_played, play_count))
}

/// Build a record from the raw projected columns, dropping rows that cannot
/// describe a watched file.
pub(crate) fn record_from_columns(
    file_path: Option<String>,
    last_played: Option<String>,
    play_count: Option<i64>,
) -> Option<SourceWatchRecord> {
    let file_path = file_path.filter(|p| !p.is_empty())?;
    let play_count = play_count
        .filter(|c| *c > 0)
        .and_then(|c| u32::try_from(c).ok())?;

    let parsed = last_played.as_deref().and_then(parse_source_timestamp);
    if parsed.is_none() {
        if let Some(raw) = last_played.as_deref().filter(|raw| !raw.trim().is_empty()) {
            warn!(file = %file_path, last_played = raw, "Unparseable lastPlayed value, treating as absent");
        }
    }

    Some(SourceWatchRecord::new(file_path, parsed, play_count))
}

#[async_trait]
impl SourceStore for KodiLibrary {
    fn store_name(&self) -> &str {
        STORE_NAME
    }

    fn watched_records(&self) -> BoxStream<'_, Result<SourceWatchRecord, StoreError>> {
        sqlx::query(WATCHED_FILES_QUERY)
            .fetch(&self.pool)
            .filter_map(|row| async move {
                match row.and_then(|row| decode_row(&row)) {
                    Ok(Some(record)) => Some(Ok(record)),
                    Ok(None) => {
                        debug!(store = STORE_NAME, "Skipping source row without a usable path or play count");
                        None
                    }
                    Err(e) => Some(Err(StoreError::query(STORE_NAME, e))),
                }
            })
            .boxed()
    }

    async fn close(&self) {
        self.pool.close().await;
        debug!(operation = "close", store = STORE_NAME, "Closed source library connection");
    }
}
