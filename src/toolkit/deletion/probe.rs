use tracing::debug;

use crate::db::{Predicate, Projection, QueryOutput, QueryRequest, StoreClient, StoreError};

/// Whether at least one document still matches. Errors are passed through untouched.
pub async fn has_matches(
    store: &dyn StoreClient,
    predicate: &Predicate,
) -> Result<bool, StoreError> {
    let request = QueryRequest {
        predicate,
        projection: Projection::Exists,
        cross_partition: store.cross_partition(),
    };

    let rows = store.query(request).await.and_then(QueryOutput::into_documents)?;
    debug!("Existence probe for '{}': {}", predicate, !rows.is_empty());
    Ok(!rows.is_empty())
}
