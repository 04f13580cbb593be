

use thiserror::Error;

use crate::db::StoreError;


#[derive(Error, Debug)]
pub enum PurgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Too many retries fetching documents ({attempts} attempts): {last_error}")]
    FetchExhausted { attempts: u32, last_error: String },

    #[error("Existence probe failed: {0}")]
    Probe(StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PurgeError {
    /// True for the errors that end a delete run before the store reports no matches.
    pub fn is_fatal_abort(&self) -> bool {
        matches!(self, Self::FetchExhausted { .. } | Self::Probe(_))
    }
}

impl From<config::ConfigError> for PurgeError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}


pub type Result<T> = std::result::Result<T, PurgeError>;
