//! In-memory stand-ins for the store and the pacer.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::pacing::Pacer;
use crate::db::{
    DocumentId, DocumentRef, PartitionKeyValue, Projection, QueryOutput, QueryRequest, StoreClient,
    StoreError,
};


#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Query(Projection, bool),
    Delete(String, Option<String>),
}

/// Answers each kind of query from its own script. Pages default to empty, probes to `false`.
#[derive(Default)]
pub struct ScriptedStore {
    cross_partition: bool,
    pages: Mutex<VecDeque<Result<Vec<DocumentRef>, &'static str>>>,
    probes: Mutex<VecDeque<Result<bool, &'static str>>>,
    counts: Mutex<VecDeque<Result<i64, &'static str>>>,
    failing_deletes: HashSet<String>,
    calls: Mutex<Vec<StoreCall>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cross_partition(mut self, enabled: bool) -> Self {
        self.cross_partition = enabled;
        self
    }

    pub fn with_pages<I>(self, pages: I) -> Self
    where
        I: IntoIterator<Item = Result<Vec<DocumentRef>, &'static str>>,
    {
        self.pages.lock().extend(pages);
        self
    }

    pub fn with_probes<I>(self, probes: I) -> Self
    where
        I: IntoIterator<Item = Result<bool, &'static str>>,
    {
        self.probes.lock().extend(probes);
        self
    }

    pub fn with_counts<I>(self, counts: I) -> Self
    where
        I: IntoIterator<Item = Result<i64, &'static str>>,
    {
        self.counts.lock().extend(counts);
        self
    }

    pub fn failing_deletes<'a>(mut self, ids: impl IntoIterator<Item = &'a str>) -> Self {
        self.failing_deletes.extend(ids.into_iter().map(str::to_string));
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    pub fn query_count(&self, projection: Projection) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, StoreCall::Query(p, _) if *p == projection))
            .count()
    }

    pub fn delete_calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                StoreCall::Delete(id, _) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl StoreClient for ScriptedStore {
    async fn query(&self, request: QueryRequest<'_>) -> Result<QueryOutput, StoreError> {
        self.calls
            .lock()
            .push(StoreCall::Query(request.projection, request.cross_partition));

        let failed = |msg: &str| StoreError::Query(msg.to_string());
        match request.projection {
            Projection::Count => {
                let next = self.counts.lock().pop_front().unwrap_or(Err("no count scripted"));
                next.map(QueryOutput::Count).map_err(failed)
            }
            Projection::Exists => {
                let next = self.probes.lock().pop_front().unwrap_or(Ok(false));
                next.map(|found| {
                    let rows = if found { vec![DocumentRef::new("probe")] } else { vec![] };
                    QueryOutput::Documents(rows)
                })
                .map_err(failed)
            }
            Projection::Page { .. } => {
                let next = self.pages.lock().pop_front().unwrap_or(Ok(vec![]));
                next.map(QueryOutput::Documents).map_err(failed)
            }
        }
    }

    async fn delete_one(
        &self,
        id: &DocumentId,
        partition_key: Option<&PartitionKeyValue>,
        _cross_partition: bool,
    ) -> Result<(), StoreError> {
        self.calls.lock().push(StoreCall::Delete(
            id.to_string(),
            partition_key.map(|key| key.to_string()),
        ));

        if self.failing_deletes.contains(id.as_str()) {
            return Err(StoreError::Status {
                status: 503,
                message: format!("delete of {} failed", id),
            });
        }
        Ok(())
    }

    fn cross_partition(&self) -> bool {
        self.cross_partition
    }
}

/// A collection that really shrinks as documents are deleted.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<Vec<(String, bool)>>,
    deleted: Mutex<HashSet<String>>,
    fail_once: Mutex<HashSet<String>>,
    max_page: Mutex<usize>,
}

impl MemoryStore {
    /// `(id, matches_predicate)` pairs, in the order queries return them.
    pub fn with_documents(documents: impl IntoIterator<Item = (String, bool)>) -> Self {
        Self {
            documents: Mutex::new(documents.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn failing_once<'a>(self, ids: impl IntoIterator<Item = &'a str>) -> Self {
        self.fail_once.lock().extend(ids.into_iter().map(str::to_string));
        self
    }

    pub fn remaining(&self) -> usize {
        self.documents.lock().len()
    }

    pub fn remaining_matches(&self) -> usize {
        self.documents.lock().iter().filter(|(_, matches)| *matches).count()
    }

    pub fn was_deleted(&self, id: &str) -> bool {
        self.deleted.lock().contains(id)
    }

    pub fn max_requested_page(&self) -> usize {
        *self.max_page.lock()
    }

    fn matching(&self, limit: usize) -> Vec<DocumentRef> {
        self.documents
            .lock()
            .iter()
            .filter(|(_, matches)| *matches)
            .take(limit)
            .map(|(id, _)| DocumentRef::new(id.as_str()))
            .collect()
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn query(&self, request: QueryRequest<'_>) -> Result<QueryOutput, StoreError> {
        match request.projection {
            Projection::Count => Ok(QueryOutput::Count(self.remaining_matches() as i64)),
            Projection::Exists => Ok(QueryOutput::Documents(self.matching(1))),
            Projection::Page { limit } => {
                let mut max_page = self.max_page.lock();
                *max_page = (*max_page).max(limit);
                drop(max_page);
                Ok(QueryOutput::Documents(self.matching(limit)))
            }
        }
    }

    async fn delete_one(
        &self,
        id: &DocumentId,
        _partition_key: Option<&PartitionKeyValue>,
        _cross_partition: bool,
    ) -> Result<(), StoreError> {
        if self.fail_once.lock().remove(id.as_str()) {
            return Err(StoreError::Throttled(4));
        }

        let mut documents = self.documents.lock();
        let before = documents.len();
        documents.retain(|(doc_id, _)| doc_id != id.as_str());
        if documents.len() == before {
            return Err(StoreError::Status {
                status: 404,
                message: format!("{} not found", id),
            });
        }
        self.deleted.lock().insert(id.to_string());
        Ok(())
    }

    fn cross_partition(&self) -> bool {
        false
    }
}


#[derive(Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPacer {
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().clone()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, duration: Duration) {
        self.pauses.lock().push(duration);
    }
}
