mod config;
mod retry;
mod processor;
mod offsets;
mod fetch;
mod commit;
mod metrics;
mod consumer;
mod builder;

pub use self::config::{ConsumerConfig, DEFAULT_AUTO_COMMIT_INTERVAL_MILLIS,
                       DEFAULT_AUTO_COMMIT_MESSAGE_COUNT, DEFAULT_FETCH_BUFFER_BYTES,
                       DEFAULT_FETCH_MAX_WAIT_MILLIS, DEFAULT_FETCH_MIN_BYTES,
                       DEFAULT_MAX_FETCH_BUFFER_BYTES, DEFAULT_RETRY_INIT_DELAY_SECS,
                       DEFAULT_RETRY_MAX_ATTEMPTS, DEFAULT_RETRY_MAX_DELAY_SECS};
pub use self::retry::RetryPolicy;
pub use self::processor::{BatchProcessor, Processing, ProcessorGate};
pub use self::offsets::ResolveOffset;
pub use self::fetch::Fetcher;
pub use self::metrics::ConsumerMetrics;
pub use self::consumer::{CommitConsumer, Consumer, OffsetPair, ShutdownConsumer, StartConsumer};
pub use self::builder::ConsumerBuilder;
