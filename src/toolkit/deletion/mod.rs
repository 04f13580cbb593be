pub mod models;
pub mod pacing;
pub mod count;
pub mod probe;
pub mod engine;
pub mod manager;

#[cfg(test)]
pub(crate) mod testing;


pub use models::{DeletionOutcome, RunStats};
pub use pacing::{Pacer, TokioPacer};
pub use count::{count_matches, COUNT_UNKNOWN, MAX_COUNT_ATTEMPTS};
pub use probe::has_matches;
pub use engine::{delete_matching, DeleteRun, MAX_FETCH_ATTEMPTS, PAGE_SIZE};
pub use manager::DeletionManager;
