use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};


#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    Deleted,
    /// Left in the store; it shows up again on a later page if it still matches.
    Failed { error: String },
}


#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub pages_fetched: usize,
    pub documents_deleted: usize,
    pub delete_failures: usize,
    pub fetch_failures: usize,
    pub probes: usize,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} deleted, {} failed deletes, {} pages, {} failed fetches, {} probes",
            self.documents_deleted,
            self.delete_failures,
            self.pages_fetched,
            self.fetch_failures,
            self.probes
        )
    }
}

/// Live counters of one run, shared between the run's stream and its handle.
#[derive(Debug, Default)]
pub(crate) struct RunCounters {
    pub pages_fetched: AtomicUsize,
    pub documents_deleted: AtomicUsize,
    pub delete_failures: AtomicUsize,
    pub fetch_failures: AtomicUsize,
    pub probes: AtomicUsize,
}

impl RunCounters {
    pub fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RunStats {
        RunStats {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            documents_deleted: self.documents_deleted.load(Ordering::Relaxed),
            delete_failures: self.delete_failures.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            probes: self.probes.load(Ordering::Relaxed),
        }
    }
}
