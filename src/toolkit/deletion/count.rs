use tracing::{debug, error, warn};

use super::pacing::{COUNT_RETRY_DELAY, Pacer};
use crate::db::{Predicate, Projection, QueryOutput, QueryRequest, StoreClient};

/// Returned by [`count_matches`] when the store never answered. Not the same as zero matches.
pub const COUNT_UNKNOWN: i64 = -1;

pub const MAX_COUNT_ATTEMPTS: u32 = 10;


pub async fn count_matches(
    store: &dyn StoreClient,
    pacer: &dyn Pacer,
    predicate: &Predicate,
) -> i64 {
    let request = QueryRequest {
        predicate,
        projection: Projection::Count,
        cross_partition: store.cross_partition(),
    };

    for attempt in 1..=MAX_COUNT_ATTEMPTS {
        match store.query(request).await.and_then(QueryOutput::into_count) {
            Ok(count) => {
                debug!("Count for '{}': {}", predicate, count);
                return count;
            }
            Err(e) => {
                warn!("Count query failed (attempt {}/{}): {}", attempt, MAX_COUNT_ATTEMPTS, e);
                if attempt < MAX_COUNT_ATTEMPTS {
                    pacer.pause(COUNT_RETRY_DELAY).await;
                }
            }
        }
    }

    error!("Giving up counting '{}' after {} attempts", predicate, MAX_COUNT_ATTEMPTS);
    COUNT_UNKNOWN
}
