pub mod matcher;
pub mod reconciler;
pub mod sync;

#[cfg(test)]
mod fakes;

pub use matcher::{select_candidate, Matcher};
pub use reconciler::{build_payload, ReconcileAction, Reconciler};
pub use sync::{connect_stores, RecordOutcome, SyncError, SyncOrchestrator, SyncReport};
