use rand::Rng;
use std::time::Duration;

/// Suspend the current task for `duration`. Zero returns immediately.
pub async fn delay(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// Pick a pause uniformly from `[min_ms, max_ms)`. A collapsed range yields `min_ms`.
pub fn random_pause(min_ms: u64, max_ms: u64) -> Duration {
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rand::thread_rng().gen_range(min_ms..max_ms))
}
