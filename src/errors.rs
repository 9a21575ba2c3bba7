/// Errors a consumer can observe from a remote Kafka server.
///
/// We use numeric codes to indicate what problem occurred on the server.
/// Only the codes that can reach a partition consumer through the offset,
/// fetch and commit APIs are represented; anything else maps to `Unknown`.
///
/// See also [Kafka Errors](http://kafka.apache.org/protocol.html)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i16)]
pub enum KafkaCode {
    /// The server experienced an unexpected error when processing the request
    Unknown = -1,
    None = 0,
    /// The requested offset is outside the range of offsets
    /// maintained by the server for the given topic/partition
    OffsetOutOfRange = 1,
    /// This indicates that a message contents does not match its CRC
    CorruptMessage = 2,
    /// This request is for a topic or partition that does not exist
    /// on this broker.
    UnknownTopicOrPartition = 3,
    /// The message has a negative size
    InvalidMessageSize = 4,
    /// This error is thrown if we are in the middle of a leadership
    /// election and there is currently no leader for this partition
    /// and hence it is unavailable for writes.
    LeaderNotAvailable = 5,
    /// This error is thrown if the client attempts to send messages
    /// to a replica that is not the leader for some partition. It
    /// indicates that the clients metadata is out of date.
    NotLeaderForPartition = 6,
    /// This error is thrown if the request exceeds the user-specified
    /// time limit in the request.
    RequestTimedOut = 7,
    /// This is not a client facing error and is used mostly by tools
    /// when a broker is not alive.
    BrokerNotAvailable = 8,
    /// If replica is expected on a broker, but is not (this can be
    /// safely ignored).
    ReplicaNotAvailable = 9,
    /// The server has a configurable maximum message size to avoid
    /// unbounded memory allocation. This error is thrown if the
    /// client attempt to produce a message larger than this maximum.
    MessageSizeTooLarge = 10,
    /// If you specify a string larger than configured maximum for
    /// offset metadata
    OffsetMetadataTooLarge = 12,
    /// The server disconnected before a response was received.
    NetworkException = 13,
    /// The broker returns this error code for an offset fetch request
    /// if it is still loading offsets (after a leader change for that
    /// offsets topic partition), or in response to group membership
    /// requests (such as heartbeats) when group metadata is being
    /// loaded by the coordinator.
    GroupLoadInProgress = 14,
    /// The broker returns this error code for group coordinator
    /// requests, offset commits, and most group management requests
    /// if the offsets topic has not yet been created, or if the group
    /// coordinator is not active.
    GroupCoordinatorNotAvailable = 15,
    /// The broker returns this error code if it receives an offset
    /// fetch or commit request for a group that it is not a
    /// coordinator for.
    NotCoordinatorForGroup = 16,
    /// For a request which attempts to access an invalid topic
    /// (e.g. one which has an illegal name), or if an attempt is made
    /// to write to an internal topic (such as the consumer offsets
    /// topic).
    InvalidTopic = 17,
    /// Returned in join group when the groupId is empty or null.
    InvalidGroupId = 24,
    /// This error indicates that an offset commit was rejected because of
    /// oversize metadata.
    InvalidCommitOffsetSize = 28,
    /// Returned by the broker when the client is not authorized to access
    /// the requested topic.
    TopicAuthorizationFailed = 29,
    /// Returned by the broker when the client is not authorized to access
    /// a particular groupId.
    GroupAuthorizationFailed = 30,
}

impl From<i16> for KafkaCode {
    fn from(v: i16) -> Self {
        match v {
            0 => KafkaCode::None,
            1 => KafkaCode::OffsetOutOfRange,
            2 => KafkaCode::CorruptMessage,
            3 => KafkaCode::UnknownTopicOrPartition,
            4 => KafkaCode::InvalidMessageSize,
            5 => KafkaCode::LeaderNotAvailable,
            6 => KafkaCode::NotLeaderForPartition,
            7 => KafkaCode::RequestTimedOut,
            8 => KafkaCode::BrokerNotAvailable,
            9 => KafkaCode::ReplicaNotAvailable,
            10 => KafkaCode::MessageSizeTooLarge,
            12 => KafkaCode::OffsetMetadataTooLarge,
            13 => KafkaCode::NetworkException,
            14 => KafkaCode::GroupLoadInProgress,
            15 => KafkaCode::GroupCoordinatorNotAvailable,
            16 => KafkaCode::NotCoordinatorForGroup,
            17 => KafkaCode::InvalidTopic,
            24 => KafkaCode::InvalidGroupId,
            28 => KafkaCode::InvalidCommitOffsetSize,
            29 => KafkaCode::TopicAuthorizationFailed,
            30 => KafkaCode::GroupAuthorizationFailed,
            _ => KafkaCode::Unknown,
        }
    }
}

error_chain!{
    foreign_links {
        IoError(::std::io::Error);
    }

    errors {
        /// A configuration parameter was rejected at construction.
        InvalidConfig(reason: String) {
            description("invalid configuration")
            display("invalid configuration, {}", reason)
        }
        /// `start()` was called on a consumer that is already started.
        RestartError(reason: &'static str) {
            description("restart error")
            display("{}", reason)
        }
        /// `stop()` or `shutdown()` was called outside the running state.
        RestopError(reason: &'static str) {
            description("restop error")
            display("{}", reason)
        }
        /// The operation requires a consumer group and none is configured.
        InvalidConsumerGroup(reason: String) {
            description("invalid consumer group")
            display("invalid consumer group, {}", reason)
        }
        /// A conflicting operation of the same kind is still in flight.
        OperationInProgress(operation: &'static str) {
            description("operation in progress")
            display("{} already in progress", operation)
        }
        /// A single message does not fit the largest allowed fetch size.
        ConsumerFetchSizeTooSmall(max_bytes: i32) {
            description("consumer fetch size too small")
            display("message exceeds maximum fetch size of {} bytes", max_bytes)
        }
        /// No broker could be reached to serve the request.
        KafkaUnavailable(reason: String) {
            description("kafka unavailable")
            display("kafka unavailable, {}", reason)
        }
        /// The broker answered with a non-success error code.
        KafkaError(code: KafkaCode) {
            description("kafka server error")
            display("kafka server error, {:?}", code)
        }
        /// A pending completion was cancelled before it could resolve.
        Canceled(task: &'static str) {
            description("canceled")
            display("{} canceled", task)
        }
        /// The timer could not schedule a delay or interval.
        TimerError(reason: String) {
            description("timer error")
            display("timer error, {}", reason)
        }
    }
}

impl From<::tokio_timer::TimerError> for Error {
    fn from(err: ::tokio_timer::TimerError) -> Self {
        ErrorKind::TimerError(format!("{:?}", err)).into()
    }
}
