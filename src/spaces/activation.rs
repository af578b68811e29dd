//! Wait schedule for an extension that has not finished activating.

use std::time::Duration;

use crate::config::{ActivationConfig, ActivationStrategy};

/// Sequence of waits to perform, re-checking the extension after each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationSchedule {
    waits: Vec<Duration>,
}

impl ActivationSchedule {
    /// Derive the schedule from config.
    ///
    /// `fixed` yields exactly one wait. `backoff` yields `max_attempts`
    /// waits, doubling from `delay_ms` and capped at `max_delay_ms`.
    pub fn from_config(config: &ActivationConfig) -> Self {
        let waits = match config.strategy {
            ActivationStrategy::Fixed => vec![Duration::from_millis(config.delay_ms)],
            ActivationStrategy::Backoff => {
                let cap = config.max_delay_ms.max(config.delay_ms);
                let mut next = config.delay_ms;
                let mut waits = Vec::new();
                for _ in 0..config.max_attempts {
                    waits.push(Duration::from_millis(next));
                    next = next.saturating_mul(2).min(cap);
                }
                waits
            }
        };
        Self { waits }
    }

    /// Waits in order.
    pub fn waits(&self) -> &[Duration] {
        &self.waits
    }

    /// Sum of all waits.
    pub fn total(&self) -> Duration {
        self.waits
            .iter()
            .fold(Duration::ZERO, |acc, w| acc.saturating_add(*w))
    }
}
