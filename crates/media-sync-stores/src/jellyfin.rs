//! Target library: a Jellyfin `library.db` SQLite file.

use async_trait::async_trait;
use media_sync_config::TargetDbConfig;
use media_sync_models::{ItemId, TargetItem, TargetUserData, WatchStatePayload};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::time::Duration;
use tracing::{debug, info, trace};
use crate::error::StoreError;
use crate::traits::TargetStore;

const STORE_NAME: &str = "jellyfin";

// instr() rather than LIKE: '%' and '_' in file names must not act as wildcards,
// and containment is case-sensitive.
const ITEMS_CONTAINING_QUERY: &str = r#"
    SELECT guid, Path, UserDataKey
    FROM TypedBaseItems
    WHERE Path IS NOT NULL
      AND UserDataKey IS NOT NULL
      AND instr(Path, ?) > 0
"#;

const USER_DATA_QUERY: &str = r#"
    SELECT key, userId, isFavorite, played, playbackPositionTicks, playCount, lastPlayedDate
    FROM UserDatas
    WHERE key = ?
    LIMIT 1
"#;

const INSERT_USER_DATA: &str = r#"
    INSERT INTO UserDatas (key, userId, isFavorite, played, playbackPositionTicks, playCount, lastPlayedDate)
    VALUES (?, ?, ?, ?, ?, ?, ?)
"#;

const UPDATE_USER_DATA: &str = r#"
    UPDATE UserDatas
    SET userId = ?, isFavorite = ?, played = ?, playbackPositionTicks = ?, playCount = ?, lastPlayedDate = ?
    WHERE key = ?
"#;

pub struct JellyfinLibrary {
    pool: SqlitePool,
}

impl JellyfinLibrary {
    /// Open an existing library file. The file is never created.
    pub async fn open(config: &TargetDbConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(&config.database_path)
            .create_if_missing(false)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|source| StoreError::Connect { store: STORE_NAME, source })?;

        info!(
            operation = "connect",
            store = STORE_NAME,
            path = %config.database_path.display(),
            "Opened target library"
        );

        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn decode_item(row: &SqliteRow) -> Result<TargetItem, StoreError> {
    let guid: Vec<u8> = row.try_get("guid").map_err(|e| StoreError::query(STORE_NAME, e))?;
    let path: String = row.try_get("Path").map_err(|e| StoreError::query(STORE_NAME, e))?;
    let user_data_key: String = row
        .try_get("UserDataKey")
        .map_err(|e| StoreError::query(STORE_NAME, e))?;

    let id = ItemId::from_slice(&guid).map_err(|source| StoreError::InvalidIdentifier {
        path: path.clone(),
        source,
    })?;

    Ok(TargetItem { id, user_data_key, path })
}

fn decode_user_data(row: &SqliteRow) -> Result<TargetUserData, sqlx::Error> {
    let flag = |column: &str| -> Result<bool, sqlx::Error> {
        Ok(row.try_get::<Option<i64>, _>(column)?.unwrap_or(0) != 0)
    };

    Ok(TargetUserData {
        key: row.try_get("key")?,
        user_id: row.try_get("userId")?,
        is_favorite: flag("isFavorite")?,
        played: flag("played")?,
        playback_position_ticks: row.try_get::<Option<i64>, _>("playbackPositionTicks")?.unwrap_or(0),
        play_count: row.try_get::<Option<i64>, _>("playCount")?.unwrap_or(0),
        last_played_date: row.try_get("lastPlayedDate")?,
    })
}

#[async_trait]
impl TargetStore for JellyfinLibrary {
    fn store_name(&self) -> &str {
        STORE_NAME
    }

    async fn find_items_containing(&self, fragment: &str) -> Result<Vec<TargetItem>, StoreError> {
        let rows = sqlx::query(ITEMS_CONTAINING_QUERY)
            .bind(fragment)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::query(STORE_NAME, e))?;

        trace!(fragment, candidates = rows.len(), "Path containment lookup");
        rows.iter().map(decode_item).collect()
    }

    async fn get_user_data(&self, key: &str) -> Result<Option<TargetUserData>, StoreError> {
        let row = sqlx::query(USER_DATA_QUERY)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::query(STORE_NAME, e))?;

        row.as_ref()
            .map(decode_user_data)
            .transpose()
            .map_err(|e| StoreError::query(STORE_NAME, e))
    }

    async fn insert_user_data(&self, key: &str, payload: &WatchStatePayload) -> Result<(), StoreError> {
        sqlx::query(INSERT_USER_DATA)
            .bind(key)
            .bind(payload.user_id)
            .bind(payload.is_favorite)
            .bind(payload.played)
            .bind(payload.playback_position_ticks)
            .bind(payload.play_count)
            .bind(&payload.last_played_date)
            .execute(&self.pool)
            .await
            .map_err(|source| StoreError::Write { key: key.to_string(), source })?;
        Ok(())
    }

    async fn update_user_data(&self, key: &str, payload: &WatchStatePayload) -> Result<(), StoreError> {
        sqlx::query(UPDATE_USER_DATA)
            .bind(payload.user_id)
            .bind(payload.is_favorite)
            .bind(payload.played)
            .bind(payload.playback_position_ticks)
            .bind(payload.play_count)
            .bind(&payload.last_played_date)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|source| StoreError::Write { key: key.to_string(), source })?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        debug!(operation = "close", store = STORE_NAME, "Closed target library connection");
    }
}
