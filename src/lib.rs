//! A single-partition Kafka consumer core.
//!
//! The `Consumer` drives three interleaved activities for one
//! (topic, partition) pair on a single-threaded tokio reactor: resolving the
//! initial fetch offset, fetching message batches and feeding them to a
//! user-supplied processor, and committing the last processed offset back to
//! the broker. The broker transport itself is injected through the
//! `BrokerClient` trait.

#![recursion_limit = "128"]

#[macro_use]
extern crate log;
#[macro_use]
extern crate error_chain;
extern crate bytes;
extern crate time;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate prometheus;

extern crate futures;
extern crate tokio_core;
extern crate tokio_timer;

#[macro_use]
pub mod errors;
mod protocol;
mod client;
mod consumer;

pub mod consts {
    pub use consumer::{DEFAULT_AUTO_COMMIT_INTERVAL_MILLIS, DEFAULT_AUTO_COMMIT_MESSAGE_COUNT,
                       DEFAULT_FETCH_BUFFER_BYTES, DEFAULT_FETCH_MAX_WAIT_MILLIS,
                       DEFAULT_FETCH_MIN_BYTES, DEFAULT_MAX_FETCH_BUFFER_BYTES,
                       DEFAULT_RETRY_INIT_DELAY_SECS, DEFAULT_RETRY_MAX_ATTEMPTS,
                       DEFAULT_RETRY_MAX_DELAY_SECS};
}

pub use errors::{Error, ErrorKind, KafkaCode, Result};
pub use protocol::{ErrorCode, FetchRequest, FetchResponse, KAFKA_SUCCESS, Message, MessageSet,
                   MessageTimestamp, OFFSET_EARLIEST, OFFSET_LATEST, Offset, OffsetCommitRequest,
                   OffsetCommitResponse, OffsetFetchRequest, OffsetFetchResponse, OffsetRequest,
                   OffsetResponse, PartitionId, SourcedMessage, StartPosition, TIMESTAMP_INVALID,
                   Timestamp};
pub use client::{BrokerClient, SendFetchRequest, SendOffsetCommitRequest, SendOffsetFetchRequest,
                 SendOffsetRequest, StaticBoxFuture, ToStaticBoxFuture};
pub use consumer::{BatchProcessor, CommitConsumer, Consumer, ConsumerBuilder, ConsumerConfig,
                   ConsumerMetrics, OffsetPair, Processing, ProcessorGate, RetryPolicy,
                   ShutdownConsumer, StartConsumer};
