//! Injectable waiting for poll and retry delays

use async_trait::async_trait;
use std::time::Duration;

/// Something that can wait for a duration
///
/// The poll loop and the retry policy never call `tokio::time::sleep`
/// directly, so tests can substitute an implementation that records the
/// requested delays and returns immediately.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Wait for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Real waiting on the tokio timer
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
