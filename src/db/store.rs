

use std::sync::Arc;

use async_trait::async_trait;
use strum::IntoStaticStr;

use super::client::StoreError;
use super::models::{DocumentId, DocumentRef, PartitionKeyValue, Predicate};


#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Projection {
    /// `SELECT VALUE COUNT(1)`
    Count,
    /// At most one id, used to answer "anything left?".
    Exists,
    Page { limit: usize },
}

impl Projection {

    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn row_limit(&self) -> Option<usize> {
        match self {
            Self::Count => None,
            Self::Exists => Some(1),
            Self::Page { limit } => Some(*limit),
        }
    }
}


#[derive(Debug, Clone, Copy)]
pub struct QueryRequest<'a> {
    pub predicate: &'a Predicate,
    pub projection: Projection,
    pub cross_partition: bool,
}


#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Count(i64),
    Documents(Vec<DocumentRef>),
}

impl QueryOutput {

    pub fn into_count(self) -> Result<i64, StoreError> {
        match self {
            Self::Count(count) => Ok(count),
            Self::Documents(_) => Err(StoreError::Query(
                "expected a count, store returned documents".to_string(),
            )),
        }
    }


    pub fn into_documents(self) -> Result<Vec<DocumentRef>, StoreError> {
        match self {
            Self::Documents(rows) => Ok(rows),
            Self::Count(_) => Err(StoreError::Query(
                "expected documents, store returned a count".to_string(),
            )),
        }
    }
}

/// The two operations the delete engine needs from a document store.
#[async_trait]
pub trait StoreClient: Send + Sync {

    async fn query(&self, request: QueryRequest<'_>) -> Result<QueryOutput, StoreError>;

    /// `partition_key` is only sent when `cross_partition` is set.
    async fn delete_one(
        &self,
        id: &DocumentId,
        partition_key: Option<&PartitionKeyValue>,
        cross_partition: bool,
    ) -> Result<(), StoreError>;


    fn cross_partition(&self) -> bool;
}


#[async_trait]
impl<T: StoreClient + ?Sized> StoreClient for Arc<T> {
    async fn query(&self, request: QueryRequest<'_>) -> Result<QueryOutput, StoreError> {
        (**self).query(request).await
    }

    async fn delete_one(
        &self,
        id: &DocumentId,
        partition_key: Option<&PartitionKeyValue>,
        cross_partition: bool,
    ) -> Result<(), StoreError> {
        (**self).delete_one(id, partition_key, cross_partition).await
    }

    fn cross_partition(&self) -> bool {
        (**self).cross_partition()
    }
}
