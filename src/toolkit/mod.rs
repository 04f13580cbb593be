

pub mod deletion;


pub use deletion::{DeleteRun, DeletionManager, DeletionOutcome, Pacer, RunStats, TokioPacer};
