use std::fmt;
use std::time::Duration;

use log::Level;

use errors::{Error, ErrorKind, KafkaCode};

/// Retry schedule for broker requests.
///
/// Delays grow exponentially from `init_delay` and are capped at `max_delay`.
/// `max_attempts == 0` removes the attempt bound and retries forever.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    init_delay: Duration,
    max_delay: Duration,
    max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(init_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        RetryPolicy {
            init_delay: init_delay,
            max_delay: max_delay,
            max_attempts: max_attempts,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The delay before retry number `attempt + 1`, i.e. `next_delay(0)` is
    /// the wait after the first failure.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let delay = self.init_delay.as_secs_f64() * 2f64.powi(attempt as i32);
        let max = self.max_delay.as_secs_f64();

        if delay.is_finite() && delay < max {
            Duration::from_secs_f64(delay)
        } else {
            self.max_delay
        }
    }

    /// Whether `attempt` failures have used up the attempt budget.
    pub fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts != 0 && attempt >= self.max_attempts
    }

    pub fn should_retry(&self, attempt: u32, err: &Error) -> bool {
        !self.exhausted(attempt) && Self::is_retryable(err)
    }

    /// Transient broker-side conditions are worth retrying; everything else,
    /// including errors that did not come from the broker client at all, is
    /// surfaced to the caller immediately.
    pub fn is_retryable(err: &Error) -> bool {
        match *err.kind() {
            ErrorKind::KafkaUnavailable(_) |
            ErrorKind::IoError(_) => true,
            ErrorKind::KafkaError(code) => {
                match code {
                    KafkaCode::Unknown |
                    KafkaCode::LeaderNotAvailable |
                    KafkaCode::NotLeaderForPartition |
                    KafkaCode::RequestTimedOut |
                    KafkaCode::BrokerNotAvailable |
                    KafkaCode::NetworkException |
                    KafkaCode::GroupLoadInProgress |
                    KafkaCode::GroupCoordinatorNotAvailable |
                    KafkaCode::NotCoordinatorForGroup => true,
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// The level at which failure number `attempt` should be logged.
    ///
    /// Failures log at debug, except the two attempts at a third and at two
    /// thirds of the attempt budget which escalate to warning so a retry
    /// storm leaves a visible trace without flooding the log. The exact
    /// thresholds are arbitrary but fixed; tests rely on them.
    pub fn failure_log_level(&self, attempt: u32) -> Level {
        if self.max_attempts != 0 && attempt > 0 &&
           (attempt == self.max_attempts / 3 || attempt == self.max_attempts * 2 / 3) {
            Level::Warn
        } else {
            Level::Debug
        }
    }

    pub fn log_failure(&self, attempt: u32, who: &fmt::Debug, what: &str, err: &Error) {
        match self.failure_log_level(attempt) {
            Level::Warn => warn!("{:?}: still failing {}: {}", who, what, err),
            _ => debug!("{:?}: failure {}: {}", who, what, err),
        }
    }

    pub fn log_exhausted(&self, who: &fmt::Debug, what: &str, err: &Error) {
        debug!("{:?}: exhausted attempts: {} {}: {}",
               who,
               self.max_attempts,
               what,
               err);
    }
}
