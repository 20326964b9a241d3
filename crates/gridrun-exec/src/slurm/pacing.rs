use std::time::Duration;

use gridrun_model::PacingConfig;

/// Adaptive delay between submissions.
///
/// Accepted submissions shrink the delay towards the floor; a submission the
/// front end did not answer with a job id grows it.
#[derive(Debug, Clone)]
pub struct Pacing {
    delay: Duration,
    min: Duration,
    grow: f64,
    shrink: f64,
}

impl Pacing {
    pub fn new(cfg: &PacingConfig) -> Self {
        Self {
            delay: cfg.initial_delay(),
            min: cfg.min_delay(),
            grow: cfg.grow_factor,
            shrink: cfg.shrink_factor,
        }
    }

    /// Current inter-submission delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn on_accepted(&mut self) {
        self.delay = self.delay.mul_f64(self.shrink).max(self.min);
    }

    /// Grow the delay and return how long to back off before retrying.
    pub fn on_rejected(&mut self) -> Duration {
        self.delay = self.delay.mul_f64(self.grow).max(self.min);
        self.delay * 2
    }
}
