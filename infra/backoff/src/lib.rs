//! # Backoff
//!
//! Policies for waiting different amounts of time when retrying something.
//!
//! The schedule-based [`IncreasePolicy`] follows Peter Teichman's
//! "backoff" write-up: every step is randomized into `[0.5 * step, 1.5 * step)`
//! so clients retrying in lockstep drift apart.
//!
//! ```rust
//! use cryptix_backoff::{Backoff, IncreasePolicy};
//! use std::time::Duration;
//!
//! let policy = IncreasePolicy::standard();
//! assert_eq!(policy.duration(0), Duration::ZERO);
//! assert!(policy.duration(100) <= Duration::from_millis(7_500));
//! ```

use rand::Rng;
use std::borrow::Cow;
use std::time::Duration;

/// Retry schedule used by [`IncreasePolicy::standard`], ranging up to 5 seconds.
pub const DEFAULT_MILLIS: [u64; 10] = [0, 10, 10, 100, 100, 500, 500, 3000, 3000, 5000];

/// Upper bound of [`RandomPolicy::default`].
pub const DEFAULT_RANDOM_MAX: Duration = Duration::from_secs(10);

#[cryptix_derive::cryptix_error]
pub enum BackoffError {
    #[error("Invalid backoff configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Maps a retry attempt to the time to wait before it.
pub trait Backoff {
    fn duration(&self, attempt: usize) -> Duration;
}

/// Schedule-driven policy, randomizing its delays and saturating at the final step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncreasePolicy {
    millis: Vec<u64>,
}

impl IncreasePolicy {
    /// Builds a policy from a schedule in milliseconds.
    ///
    /// # Errors
    /// Returns [`BackoffError::InvalidConfiguration`] for an empty schedule.
    pub fn new(millis: impl Into<Vec<u64>>) -> Result<Self, BackoffError> {
        let millis = millis.into();
        if millis.is_empty() {
            return Err(BackoffError::InvalidConfiguration {
                message: "schedule needs at least one step".into(),
                context: None,
            });
        }
        Ok(Self { millis })
    }

    /// The [`DEFAULT_MILLIS`] schedule.
    #[must_use]
    pub fn standard() -> Self {
        Self { millis: DEFAULT_MILLIS.to_vec() }
    }

    #[must_use]
    pub fn steps(&self) -> &[u64] {
        &self.millis
    }
}

impl Default for IncreasePolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl Backoff for IncreasePolicy {
    /// Returns `millis[n]` (saturating at the last step), randomized to avoid thundering herds.
    fn duration(&self, attempt: usize) -> Duration {
        let idx = attempt.min(self.millis.len() - 1);
        Duration::from_millis(jitter(self.millis[idx]))
    }
}

/// Waits a uniformly random time below `max`, independent of the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomPolicy {
    max: Duration,
}

impl RandomPolicy {
    #[must_use]
    pub const fn new(max: Duration) -> Self {
        Self { max }
    }

    #[must_use]
    pub const fn max(&self) -> Duration {
        self.max
    }
}

impl Default for RandomPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RANDOM_MAX)
    }
}

impl Backoff for RandomPolicy {
    fn duration(&self, _attempt: usize) -> Duration {
        let max = u64::try_from(self.max.as_nanos()).unwrap_or(u64::MAX);
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(rand::rng().random_range(0..max))
    }
}

/// Uniformly distributed in `[millis / 2, millis / 2 + millis)`, saturating at `u64::MAX`.
fn jitter(millis: u64) -> u64 {
    if millis == 0 {
        return 0;
    }
    (millis / 2).saturating_add(rand::rng().random_range(0..millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_huge_step_saturates() {
        for _ in 0..64 {
            assert!(jitter(u64::MAX) >= u64::MAX / 2);
        }
    }

    #[test]
    fn test_zero_step_has_no_jitter() {
        assert_eq!(jitter(0), 0);
        assert_eq!(IncreasePolicy::standard().duration(0), Duration::ZERO);
    }

    #[test]
    fn test_empty_schedule_is_rejected() {
        let err = IncreasePolicy::new(Vec::new()).unwrap_err();
        assert!(matches!(err, BackoffError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_saturates_at_last_step() {
        let policy = IncreasePolicy::new([100, 1000]).unwrap();
        for _ in 0..64 {
            let d = policy.duration(57);
            assert!(d >= Duration::from_millis(500), "{d:?} below window");
            assert!(d < Duration::from_millis(1500), "{d:?} above window");
        }
    }

    #[test]
    fn test_random_policy_with_zero_max() {
        assert_eq!(RandomPolicy::new(Duration::ZERO).duration(3), Duration::ZERO);
    }
}
