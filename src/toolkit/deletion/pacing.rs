

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;


pub const DELETE_FAILURE_DELAY: Duration = Duration::from_millis(500);

pub const FETCH_RETRY_DELAY: Duration = Duration::from_secs(1);

pub const PAGE_DELAY: Duration = Duration::from_secs(1);

pub const COUNT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Every fixed wait of a run goes through here, so tests can skip the wall clock.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}


#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}


#[async_trait]
impl<T: Pacer + ?Sized> Pacer for Arc<T> {
    async fn pause(&self, duration: Duration) {
        (**self).pause(duration).await
    }
}
