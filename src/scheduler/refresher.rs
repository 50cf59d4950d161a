use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Bulk refresh collaborator invoked once per scheduler cycle.
///
/// Implementations must watch `cancel` and return promptly once it fires;
/// the scheduler cancels it when a cycle runs past its deadline or on stop.
#[async_trait]
pub trait FeedRefresher: Send + Sync + 'static {
    async fn refresh_all(&self, cancel: CancellationToken) -> anyhow::Result<()>;
}
