use media_sync_models::IdentifierError;
use thiserror::Error;

/// Failures talking to either library. All of them are fatal for the current run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to {store}: {source}")]
    Connect {
        store: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("query against {store} failed: {source}")]
    Query {
        store: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("failed to write user data for key '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("item at '{path}' has a malformed identifier: {source}")]
    InvalidIdentifier {
        path: String,
        #[source]
        source: IdentifierError,
    },
}

impl StoreError {
    pub fn query(store: &'static str, source: sqlx::Error) -> Self {
        StoreError::Query { store, source }
    }
}
