

pub mod auth;
pub mod client;
pub mod models;
pub mod query;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::MasterKeySigner;
pub use client::{CosmosClient, StoreError};
pub use models::{DocumentId, DocumentRef, PartitionKeyValue, Predicate};
pub use store::{Projection, QueryOutput, QueryRequest, StoreClient};
