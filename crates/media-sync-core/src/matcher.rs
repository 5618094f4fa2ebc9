use media_sync_config::MatchPolicy;
use media_sync_models::TargetItem;
use media_sync_stores::{StoreError, TargetStore};
use tracing::{debug, warn};

/// Finds the target item for a source file by path containment.
///
/// Source and target paths usually differ only in mount prefix, so a target
/// path that *contains* the source path is taken as the same file. Short or
/// generic source paths can hit several items; `policy` decides which one wins.
pub struct Matcher<'a> {
    target: &'a dyn TargetStore,
    policy: MatchPolicy,
}

impl<'a> Matcher<'a> {
    pub fn new(target: &'a dyn TargetStore, policy: MatchPolicy) -> Self {
        Self { target, policy }
    }

    /// `Ok(None)` is the ordinary not-found outcome; only store failures are errors.
    pub async fn find_target_item(&self, source_path: &str) -> Result<Option<TargetItem>, StoreError> {
        // An empty needle is contained in every path
        if source_path.is_empty() {
            return Ok(None);
        }

        let candidates = self.target.find_items_containing(source_path).await?;
        if candidates.len() > 1 {
            warn!(
                operation = "match",
                source_path,
                candidates = candidates.len(),
                policy = self.policy.as_str(),
                "Ambiguous match, several target items contain the source path"
            );
        }

        let selected = select_candidate(candidates, self.policy);
        if let Some(item) = &selected {
            debug!(source_path, target_path = %item.path, key = %item.user_data_key, "Matched target item");
        }
        Ok(selected)
    }
}

/// Pick one item out of the candidates returned by the store (in store order).
pub fn select_candidate(candidates: Vec<TargetItem>, policy: MatchPolicy) -> Option<TargetItem> {
    match policy {
        MatchPolicy::StoreOrder => candidates.into_iter().next(),
        MatchPolicy::ShortestPath => candidates
            .into_iter()
            .min_by(|a, b| a.path.len().cmp(&b.path.len()).then_with(|| a.path.cmp(&b.path))),
    }
}
