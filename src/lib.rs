

pub mod core;
pub mod db;
pub mod shell;
pub mod toolkit;
pub mod utils;

pub use utils::{single_line, truncate_for_log};


pub use core::config::CosmosConfig;
pub use core::error::{PurgeError, Result};
pub use db::{
    CosmosClient, DocumentId, DocumentRef, PartitionKeyValue, Predicate, StoreClient, StoreError,
};
pub use toolkit::deletion::{DeleteRun, DeletionManager, Pacer, RunStats, TokioPacer};


pub const DEFAULT_ENDPOINT: &str = "https://localhost:8081";

/// Well-known account key of the local Cosmos DB emulator.
pub const EMULATOR_ACCOUNT_KEY: &str =
    "C2y6yDjf5/R+ob0N8A7Cgv30VRDJIWEHLM+4QDU5DE2nQ9nDuVTqobD4b8mGGyPMbIZnqyMsEcaGQy67XIw/Jw==";


pub const DEFAULT_PARTITION_KEY_FIELD: &str = "id";


pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;


pub const DEFAULT_MAX_THROTTLE_RETRIES: u32 = 3;


pub const DEFAULT_MAX_THROTTLE_WAIT_SECS: u64 = 1;
