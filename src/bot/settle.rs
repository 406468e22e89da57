use std::time::Duration;

/// Waits for the hosting platform to converge after an event before its state is re-read.
///
/// A review submission and the following reviewer/assignee updates are not atomic on the
/// platform, so reading immediately may observe stale lists.
#[derive(Clone, Copy, Debug)]
pub struct SettleDelay {
    duration: Duration,
}

impl SettleDelay {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// Suspends the current task. Other events keep being handled meanwhile.
    pub async fn wait(&self) {
        tracing::debug!("Waiting {}s for the PR state to settle", self.duration.as_secs());
        tokio::time::sleep(self.duration).await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::SettleDelay;

    #[tokio::test(start_paused = true)]
    async fn waits_for_configured_duration() {
        let start = Instant::now();
        SettleDelay::new(Duration::from_secs(180)).wait().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(180));
        assert!(elapsed < Duration::from_secs(181));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_delay_returns_immediately() {
        let start = Instant::now();
        SettleDelay::new(Duration::ZERO).wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
