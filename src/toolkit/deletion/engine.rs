//! Delete-by-query loop: fetch a page of matching ids, delete them one by one,
//! pace, then ask the store whether anything still matches.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::stream::{self, BoxStream, Stream, StreamExt};
use tracing::{debug, error, info, warn};

use super::models::{DeletionOutcome, RunCounters, RunStats};
use super::pacing::{DELETE_FAILURE_DELAY, FETCH_RETRY_DELAY, PAGE_DELAY, Pacer};
use super::probe::has_matches;
use crate::core::error::{PurgeError, Result};
use crate::db::{
    DocumentId, DocumentRef, Predicate, Projection, QueryOutput, QueryRequest, StoreClient,
};


pub const PAGE_SIZE: usize = 500;

/// Consecutive failed page fetches that abort the run.
pub const MAX_FETCH_ATTEMPTS: u32 = 10;


enum RunPhase {
    FetchingPage { failures: u32 },
    DeletingPage { rows: std::vec::IntoIter<DocumentRef> },
    Probing,
    Done,
    FatalAbort,
}

struct Run<'a> {
    store: &'a dyn StoreClient,
    pacer: &'a dyn Pacer,
    predicate: &'a Predicate,
    cross_partition: bool,
    counters: Arc<RunCounters>,
    phase: RunPhase,
}

impl<'a> Run<'a> {
    /// Advances the state machine to the next deleted id or error. `None` once the run is over.
    async fn next_item(&mut self) -> Option<Result<DocumentId>> {
        loop {
            match std::mem::replace(&mut self.phase, RunPhase::Done) {
                RunPhase::FetchingPage { failures } => {
                    if let Some(fatal) = self.fetch_page(failures).await {
                        return Some(Err(fatal));
                    }
                }
                RunPhase::DeletingPage { mut rows } => match rows.next() {
                    Some(doc) => {
                        let outcome = self.delete_document(&doc).await;
                        self.phase = RunPhase::DeletingPage { rows };
                        match outcome {
                            DeletionOutcome::Deleted => return Some(Ok(doc.id)),
                            DeletionOutcome::Failed { error } => {
                                warn!("Error while deleting {}, skipping: {}", doc.id, error);
                                self.pacer.pause(DELETE_FAILURE_DELAY).await;
                            }
                        }
                    }
                    None => {
                        self.pacer.pause(PAGE_DELAY).await;
                        self.phase = RunPhase::Probing;
                    }
                },
                RunPhase::Probing => {
                    RunCounters::bump(&self.counters.probes);
                    match has_matches(self.store, self.predicate).await {
                        Ok(true) => {
                            debug!("Documents still match '{}', next page", self.predicate);
                            self.phase = RunPhase::FetchingPage { failures: 0 };
                        }
                        Ok(false) => {
                            info!("Delete run finished: {}", self.counters.snapshot());
                            self.phase = RunPhase::Done;
                            return None;
                        }
                        Err(e) => {
                            error!("Existence probe failed, aborting delete run: {}", e);
                            self.phase = RunPhase::FatalAbort;
                            return Some(Err(PurgeError::Probe(e)));
                        }
                    }
                }
                RunPhase::Done | RunPhase::FatalAbort => return None,
            }
        }
    }

    /// Sets the next phase; returns the fatal error once the fetch retries are used up.
    async fn fetch_page(&mut self, failures: u32) -> Option<PurgeError> {
        let request = QueryRequest {
            predicate: self.predicate,
            projection: Projection::Page { limit: PAGE_SIZE },
            cross_partition: self.cross_partition,
        };

        match self.store.query(request).await.and_then(QueryOutput::into_documents) {
            Ok(rows) => {
                RunCounters::bump(&self.counters.pages_fetched);
                debug!("Fetched page of {} documents", rows.len());
                self.phase = RunPhase::DeletingPage { rows: rows.into_iter() };
                None
            }
            Err(e) => {
                RunCounters::bump(&self.counters.fetch_failures);
                let failures = failures + 1;
                if failures >= MAX_FETCH_ATTEMPTS {
                    error!("Too many retries fetching documents ({} attempts): {}", failures, e);
                    self.phase = RunPhase::FatalAbort;
                    return Some(PurgeError::FetchExhausted {
                        attempts: failures,
                        last_error: e.to_string(),
                    });
                }

                warn!(
                    "Error while fetching documents (attempt {}/{}): {}",
                    failures, MAX_FETCH_ATTEMPTS, e
                );
                self.pacer.pause(FETCH_RETRY_DELAY).await;
                self.phase = RunPhase::FetchingPage { failures };
                None
            }
        }
    }

    async fn delete_document(&self, doc: &DocumentRef) -> DeletionOutcome {
        let partition_key = if self.cross_partition {
            doc.partition_key.as_ref()
        } else {
            None
        };

        match self
            .store
            .delete_one(&doc.id, partition_key, self.cross_partition)
            .await
        {
            Ok(()) => {
                RunCounters::bump(&self.counters.documents_deleted);
                DeletionOutcome::Deleted
            }
            Err(e) => {
                RunCounters::bump(&self.counters.delete_failures);
                DeletionOutcome::Failed { error: e.to_string() }
            }
        }
    }
}

/// A running delete. Yields each id right after the store confirmed its deletion.
///
/// Nothing happens unless the stream is polled; dropping it stops the run
/// between two store calls.
pub struct DeleteRun<'a> {
    inner: BoxStream<'a, Result<DocumentId>>,
    counters: Arc<RunCounters>,
}

impl DeleteRun<'_> {

    pub fn stats(&self) -> RunStats {
        self.counters.snapshot()
    }
}

impl Stream for DeleteRun<'_> {
    type Item = Result<DocumentId>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}


pub fn delete_matching<'a>(
    store: &'a dyn StoreClient,
    pacer: &'a dyn Pacer,
    predicate: &'a Predicate,
) -> DeleteRun<'a> {
    let counters = Arc::new(RunCounters::default());
    let cross_partition = store.cross_partition();
    info!(
        "Starting delete run for '{}' (cross_partition={})",
        predicate, cross_partition
    );

    let run = Run {
        store,
        pacer,
        predicate,
        cross_partition,
        counters: Arc::clone(&counters),
        phase: RunPhase::FetchingPage { failures: 0 },
    };

    let inner = stream::unfold(run, |mut run| async move {
        let item = run.next_item().await?;
        Some((item, run))
    })
    .boxed();

    DeleteRun { inner, counters }
}
