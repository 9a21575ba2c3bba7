use std::time::Duration;

use protocol::PartitionId;
use errors::{ErrorKind, Result};
use consumer::RetryPolicy;

/// The default minimum bytes a fetch should wait for, 64 KiB.
pub const DEFAULT_FETCH_MIN_BYTES: i32 = 64 * 1024;

/// The default fetch long-poll hint, in milliseconds.
pub const DEFAULT_FETCH_MAX_WAIT_MILLIS: i32 = 100;

/// The default initial fetch size, 128 KiB.
pub const DEFAULT_FETCH_BUFFER_BYTES: i32 = 128 * 1024;

/// The default upper bound the fetch size may grow to, 8 MiB.
pub const DEFAULT_MAX_FETCH_BUFFER_BYTES: i32 = 8 * 1024 * 1024;

/// The default message count between automatic commits.
pub const DEFAULT_AUTO_COMMIT_MESSAGE_COUNT: u32 = 100;

/// The default interval between automatic commits, in milliseconds.
pub const DEFAULT_AUTO_COMMIT_INTERVAL_MILLIS: u32 = 5000;

/// The default delay before the first retry of a failed request, in seconds.
pub const DEFAULT_RETRY_INIT_DELAY_SECS: f64 = 0.1;

/// The default cap on the retry backoff, in seconds.
pub const DEFAULT_RETRY_MAX_DELAY_SECS: f64 = 30.0;

/// The default attempt bound for failed requests; `0` retries forever.
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 0;

/// Configuration of a single-partition consumer, immutable once the
/// consumer is constructed.
///
/// The auto-commit knobs are `Option`s so that "unset" can fall back to the
/// defaults when a consumer group is configured while staying disabled for
/// group-less consumers; an explicit positive value without a group is a
/// configuration error.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// The topic to consume.
    pub topic_name: String,

    /// The partition of `topic_name` to consume.
    pub partition: PartitionId,

    /// The consumer group to commit offsets under.
    pub consumer_group: Option<String>,

    /// Opaque metadata stored alongside committed offsets.
    pub commit_metadata: Option<String>,

    /// Commit automatically after this many processed messages.
    pub auto_commit_every_n: Option<u32>,

    /// Commit automatically after this many milliseconds.
    pub auto_commit_every_ms: Option<u32>,

    /// The initial per-fetch size in bytes.
    pub buffer_size: i32,

    /// The bound the per-fetch size may grow to when a message does not fit.
    pub max_buffer_size: i32,

    /// The minimum bytes of messages the broker should accumulate before
    /// answering a fetch.
    pub fetch_min_bytes: i32,

    /// How long the broker may hold a fetch open waiting for
    /// `fetch_min_bytes`, in milliseconds.
    pub fetch_max_wait_time: i32,

    /// The delay before the first retry of a failed request, in seconds.
    pub retry_init_delay: f64,

    /// The cap on the retry backoff, in seconds.
    pub retry_max_delay: f64,

    /// How many attempts a failing request is given; `0` retries forever.
    pub retry_max_attempts: u32,

    /// Register prometheus counters for this consumer.
    pub metrics: bool,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        ConsumerConfig {
            topic_name: String::new(),
            partition: 0,
            consumer_group: None,
            commit_metadata: None,
            auto_commit_every_n: None,
            auto_commit_every_ms: None,
            buffer_size: DEFAULT_FETCH_BUFFER_BYTES,
            max_buffer_size: DEFAULT_MAX_FETCH_BUFFER_BYTES,
            fetch_min_bytes: DEFAULT_FETCH_MIN_BYTES,
            fetch_max_wait_time: DEFAULT_FETCH_MAX_WAIT_MILLIS,
            retry_init_delay: DEFAULT_RETRY_INIT_DELAY_SECS,
            retry_max_delay: DEFAULT_RETRY_MAX_DELAY_SECS,
            retry_max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            metrics: false,
        }
    }
}

impl ConsumerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.partition < 0 {
            bail!(ErrorKind::InvalidConfig(format!("negative partition: {}", self.partition)));
        }

        if self.buffer_size <= 0 || self.max_buffer_size <= 0 {
            bail!(ErrorKind::InvalidConfig(format!("fetch sizes must be positive: {} / {}",
                                                   self.buffer_size,
                                                   self.max_buffer_size)));
        }

        if self.buffer_size > self.max_buffer_size {
            bail!(ErrorKind::InvalidConfig(format!("buffer_size ({}) is greater than \
                                                    max_buffer_size ({})",
                                                   self.buffer_size,
                                                   self.max_buffer_size)));
        }

        if !(self.retry_init_delay > 0.0) || !self.retry_init_delay.is_finite() {
            bail!(ErrorKind::InvalidConfig(format!("retry_init_delay must be positive: {}",
                                                   self.retry_init_delay)));
        }

        if !(self.retry_max_delay >= self.retry_init_delay) ||
           !self.retry_max_delay.is_finite() {
            bail!(ErrorKind::InvalidConfig(format!("retry_max_delay ({}) must be at least \
                                                    retry_init_delay ({})",
                                                   self.retry_max_delay,
                                                   self.retry_init_delay)));
        }

        if self.consumer_group.is_none() {
            if let Some(ms) = self.auto_commit_every_ms {
                if ms > 0 {
                    bail!(ErrorKind::InvalidConfig(format!("auto_commit_every_ms ({}) requires \
                                                            a consumer group",
                                                           ms)));
                }
            }

            if let Some(count) = self.auto_commit_every_n {
                if count > 0 {
                    bail!(ErrorKind::InvalidConfig(format!("auto_commit_every_n ({}) requires \
                                                            a consumer group",
                                                           count)));
                }
            }
        }

        Ok(())
    }

    pub fn retry_init_delay(&self) -> Duration {
        Duration::from_secs_f64(self.retry_init_delay)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_secs_f64(self.retry_max_delay)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_init_delay(),
                         self.retry_max_delay(),
                         self.retry_max_attempts)
    }

    /// The message-count threshold for automatic commits, when enabled.
    pub fn auto_commit_message_count(&self) -> Option<u32> {
        self.consumer_group
            .as_ref()
            .map(|_| {
                     self.auto_commit_every_n
                         .unwrap_or(DEFAULT_AUTO_COMMIT_MESSAGE_COUNT)
                 })
            .filter(|&count| count > 0)
    }

    /// The interval of the periodic commit timer, when enabled.
    pub fn auto_commit_interval(&self) -> Option<Duration> {
        self.consumer_group
            .as_ref()
            .map(|_| {
                     self.auto_commit_every_ms
                         .unwrap_or(DEFAULT_AUTO_COMMIT_INTERVAL_MILLIS)
                 })
            .filter(|&ms| ms > 0)
            .map(|ms| Duration::from_millis(u64::from(ms)))
    }
}
