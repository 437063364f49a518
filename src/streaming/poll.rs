//! Turning readiness checks into futures
//!
//! The scene only exposes "is it ready yet?" queries. These adapters poll
//! such a check on the background runtime until it passes.

use std::time::Duration;

/// Resolve once `ready` returns true, checking every `interval`
pub async fn poll_until(mut ready: impl FnMut() -> bool, interval: Duration) {
    while !ready() {
        tokio::time::sleep(interval).await;
    }
}

/// Resolve with the first value `check` produces
pub async fn poll_for<T>(mut check: impl FnMut() -> Option<T>, interval: Duration) -> T {
    loop {
        if let Some(value) = check() {
            return value;
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_poll_until_counts_attempts() {
        let attempts = AtomicU32::new(0);
        poll_until(|| attempts.fetch_add(1, Ordering::SeqCst) >= 3, Duration::from_millis(1)).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_poll_for_value_from_other_task() {
        let flag = Arc::new(AtomicU32::new(0));
        let writer = flag.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            writer.store(42, Ordering::SeqCst);
        });
        let value = poll_for(
            || match flag.load(Ordering::SeqCst) {
                0 => None,
                v => Some(v),
            },
            Duration::from_millis(1),
        )
        .await;
        assert_eq!(value, 42);
    }
}
