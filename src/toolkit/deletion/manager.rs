use std::sync::Arc;

use tracing::info;

use super::count::count_matches;
use super::engine::{DeleteRun, delete_matching};
use super::pacing::{Pacer, TokioPacer};
use super::probe::has_matches;
use crate::core::error::Result;
use crate::db::{Predicate, StoreClient};


pub struct DeletionManager {
    store: Arc<dyn StoreClient>,
    pacer: Arc<dyn Pacer>,
}

impl DeletionManager {
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self::with_pacer(store, Arc::new(TokioPacer))
    }

    pub fn with_pacer(store: Arc<dyn StoreClient>, pacer: Arc<dyn Pacer>) -> Self {
        info!(
            "Initializing DeletionManager (cross_partition={})",
            store.cross_partition()
        );
        Self { store, pacer }
    }

    /// Number of matching documents, or [`super::COUNT_UNKNOWN`] when the store kept failing.
    pub async fn count(&self, predicate: &Predicate) -> i64 {
        count_matches(self.store.as_ref(), self.pacer.as_ref(), predicate).await
    }


    pub async fn has_matches(&self, predicate: &Predicate) -> Result<bool> {
        Ok(has_matches(self.store.as_ref(), predicate).await?)
    }


    pub fn delete<'a>(&'a self, predicate: &'a Predicate) -> DeleteRun<'a> {
        delete_matching(self.store.as_ref(), self.pacer.as_ref(), predicate)
    }
}
