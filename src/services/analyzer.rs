use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

use crate::config::AppConfig;

/// Per-image work capability. Returns whether the image was analyzed successfully.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze(&self, image_ref: &str) -> bool;
}

/// Stand-in for a real image analysis call: sleeps for a uniformly random
/// delay, then succeeds with a fixed probability.
#[derive(Debug, Clone)]
pub struct SimulatedAnalyzer {
    min_delay: Duration,
    max_delay: Duration,
    success_rate: f64,
}

impl SimulatedAnalyzer {
    /// `success_rate` is clamped to [0, 1]; `min_delay > max_delay` collapses to `max_delay`.
    pub fn new(min_delay: Duration, max_delay: Duration, success_rate: f64) -> Self {
        Self {
            min_delay: min_delay.min(max_delay),
            max_delay,
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Duration::from_millis(config.analyzer_min_delay_ms),
            Duration::from_millis(config.analyzer_max_delay_ms),
            config.analyzer_success_rate,
        )
    }

    /// Always succeeds after `delay`.
    pub fn always_succeed(delay: Duration) -> Self {
        Self::new(delay, delay, 1.0)
    }

    /// Always fails after `delay`.
    pub fn always_fail(delay: Duration) -> Self {
        Self::new(delay, delay, 0.0)
    }

    fn draw(&self) -> (Duration, bool) {
        let mut rng = rand::rng();
        let min_ms = self.min_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;
        let delay = Duration::from_millis(rng.random_range(min_ms..=max_ms));
        (delay, rng.random_bool(self.success_rate))
    }
}

#[async_trait]
impl ImageAnalyzer for SimulatedAnalyzer {
    async fn analyze(&self, image_ref: &str) -> bool {
        // ThreadRng is !Send, so draw before suspending.
        let (delay, succeeded) = self.draw();
        tokio::time::sleep(delay).await;
        tracing::trace!(
            image_ref,
            delay_ms = delay.as_millis() as u64,
            succeeded,
            "Simulated analysis finished"
        );
        succeeded
    }
}
