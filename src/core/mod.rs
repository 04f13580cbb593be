

pub mod config;
pub mod error;

pub use config::CosmosConfig;
pub use error::{PurgeError, Result};
