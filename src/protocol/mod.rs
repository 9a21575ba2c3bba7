use std::fmt;

mod message;

pub use self::message::{Message, MessageSet, MessageTimestamp, SourcedMessage};

/// The position of a message within a partition's log.
pub type Offset = i64;

/// The id of a partition within a topic.
pub type PartitionId = i32;

/// A timestamp in milliseconds since the unix epoch.
pub type Timestamp = i64;

/// The numeric error code carried by broker responses.
pub type ErrorCode = i16;

/// Wire sentinel requesting the earliest available offset.
pub const OFFSET_EARLIEST: Timestamp = -2;

/// Wire sentinel requesting the next offset to be produced.
pub const OFFSET_LATEST: Timestamp = -1;

/// Wire sentinel for "no timestamp" in offset commit requests.
pub const TIMESTAMP_INVALID: Timestamp = -1;

/// The error code of a successful response entry.
pub const KAFKA_SUCCESS: ErrorCode = 0;

/// Where a consumer should begin fetching from.
///
/// The wire protocol expresses the symbolic positions as reserved negative
/// integers; at the API boundary they are a tagged variant so an offset of
/// `-1` can never be mistaken for a request to start at the log head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPosition {
    /// Start from the earliest offset the broker still retains.
    Earliest,
    /// Start from the next offset to be produced.
    Latest,
    /// Resume from the offset last committed under the consumer group.
    Committed,
    /// Start from a literal, non-negative offset.
    Offset(Offset),
}

impl From<Offset> for StartPosition {
    fn from(offset: Offset) -> Self {
        StartPosition::Offset(offset)
    }
}

impl fmt::Display for StartPosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            StartPosition::Earliest => write!(f, "earliest"),
            StartPosition::Latest => write!(f, "latest"),
            StartPosition::Committed => write!(f, "committed"),
            StartPosition::Offset(offset) => write!(f, "offset {}", offset),
        }
    }
}

/// Request for the log offset at a symbolic time of one partition.
#[derive(Clone, Debug, PartialEq)]
pub struct OffsetRequest {
    /// The name of the topic.
    pub topic_name: String,
    /// The id of the partition the request is for.
    pub partition: PartitionId,
    /// `OFFSET_EARLIEST`, `OFFSET_LATEST` or a timestamp in milliseconds.
    pub time: Timestamp,
    /// The maximum number of offsets to return.
    pub max_offsets: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OffsetResponse {
    pub topic_name: String,
    pub partition: PartitionId,
    pub error_code: ErrorCode,
    /// Offsets in descending order, at most `max_offsets` of them.
    pub offsets: Vec<Offset>,
}

/// Request for the offset committed under a consumer group for one partition.
#[derive(Clone, Debug, PartialEq)]
pub struct OffsetFetchRequest {
    pub topic_name: String,
    pub partition: PartitionId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OffsetFetchResponse {
    pub topic_name: String,
    pub partition: PartitionId,
    /// The committed offset, or a negative value when no offset is stored.
    pub offset: Offset,
    pub metadata: Option<String>,
    pub error_code: ErrorCode,
}

/// Request for a slice of one partition's log.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchRequest {
    pub topic_name: String,
    pub partition: PartitionId,
    /// The offset to begin this fetch from.
    pub fetch_offset: Offset,
    /// The maximum bytes to include in the message set for this partition.
    pub max_bytes: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FetchResponse {
    pub topic_name: String,
    pub partition: PartitionId,
    pub error_code: ErrorCode,
    /// The offset at the end of the log for this partition.
    pub highwater_mark_offset: Offset,
    pub message_set: MessageSet,
}

/// Request to record an offset under a consumer group for one partition.
#[derive(Clone, Debug, PartialEq)]
pub struct OffsetCommitRequest {
    pub topic_name: String,
    pub partition: PartitionId,
    pub offset: Offset,
    /// `TIMESTAMP_INVALID` unless the caller supplies an explicit commit time.
    pub timestamp: Timestamp,
    pub metadata: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OffsetCommitResponse {
    pub topic_name: String,
    pub partition: PartitionId,
    pub error_code: ErrorCode,
}
