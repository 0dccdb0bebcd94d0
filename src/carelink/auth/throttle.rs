//! Resend countdown. Advisory only; the backend enforces its own limits.

use std::sync::Arc;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval_at, Duration, Instant},
};
use tracing::debug;

/// Seconds a user must wait before requesting another code.
pub const RESEND_COOLDOWN_SECONDS: u64 = 60;

/// Counts down once per second after each successful send.
#[derive(Debug)]
pub struct ResendThrottle {
    cooldown: u64,
    remaining: Arc<watch::Sender<u64>>,
    ticker: Option<JoinHandle<()>>,
}

impl Default for ResendThrottle {
    fn default() -> Self {
        Self::new(RESEND_COOLDOWN_SECONDS)
    }
}

impl ResendThrottle {
    #[must_use]
    pub fn new(cooldown: u64) -> Self {
        let (remaining, _) = watch::channel(0);
        Self {
            cooldown,
            remaining: Arc::new(remaining),
            ticker: None,
        }
    }

    /// Restarts the countdown at the full cooldown. Must run inside a tokio runtime.
    pub fn start(&mut self) {
        self.stop();
        self.remaining.send_replace(self.cooldown);

        if self.cooldown == 0 {
            return;
        }

        let remaining = Arc::clone(&self.remaining);
        let period = Duration::from_secs(1);
        self.ticker = Some(tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            loop {
                ticks.tick().await;

                let mut finished = false;
                remaining.send_modify(|seconds| {
                    *seconds = seconds.saturating_sub(1);
                    finished = *seconds == 0;
                });

                if finished {
                    debug!("resend countdown finished");
                    break;
                }
            }
        }));
    }

    /// Cancels the countdown and allows resending immediately.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        self.remaining.send_replace(0);
    }

    #[must_use]
    pub fn remaining(&self) -> u64 {
        *self.remaining.borrow()
    }

    #[must_use]
    pub fn can_resend(&self) -> bool {
        self.remaining() == 0
    }

    /// Watch the countdown, e.g. to render it.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.remaining.subscribe()
    }
}

impl Drop for ResendThrottle {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[test]
    fn idle_throttle_allows_resend() {
        let throttle = ResendThrottle::default();
        assert_eq!(throttle.remaining(), 0);
        assert!(throttle.can_resend());
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_once_per_second() {
        let mut throttle = ResendThrottle::default();
        throttle.start();
        assert_eq!(throttle.remaining(), 60);
        assert!(!throttle.can_resend());

        sleep(Duration::from_millis(1_500)).await;
        assert_eq!(throttle.remaining(), 59);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(throttle.remaining(), 49);

        sleep(Duration::from_secs(49)).await;
        assert_eq!(throttle.remaining(), 0);
        assert!(throttle.can_resend());

        // stays at zero
        sleep(Duration::from_secs(5)).await;
        assert_eq!(throttle.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_resets_to_full_cooldown() {
        let mut throttle = ResendThrottle::default();
        throttle.start();
        sleep(Duration::from_millis(20_500)).await;
        assert_eq!(throttle.remaining(), 40);

        throttle.start();
        assert_eq!(throttle.remaining(), 60);
        sleep(Duration::from_millis(1_500)).await;
        assert_eq!(throttle.remaining(), 59);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_clears_countdown() {
        let mut throttle = ResendThrottle::new(30);
        throttle.start();
        assert_eq!(throttle.remaining(), 30);
        throttle.stop();
        assert!(throttle.can_resend());
        sleep(Duration::from_secs(2)).await;
        assert_eq!(throttle.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_ticks() {
        let mut throttle = ResendThrottle::new(3);
        let mut rx = throttle.subscribe();
        throttle.start();
        assert_eq!(*rx.borrow_and_update(), 3);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 2);
    }
}
