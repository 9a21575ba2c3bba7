use bytes::Bytes;

use time;

use protocol::{Offset, PartitionId, Timestamp};

/// A decoded slice of a partition's log.
///
/// A message in kafka is a key-value pair with a small amount of associated
/// metadata; a message set is a sequence of messages with offset information.
/// Decoding is the broker client's concern: the consumer only ever sees the
/// already-decoded form. When the broker truncates the last message of a set
/// to honor the fetch size limit, the client marks the set `partial` so the
/// consumer can tell "nothing available" apart from "message too large".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MessageSet {
    pub messages: Vec<Message>,
    /// A trailing message was cut off by the fetch `max_bytes`.
    pub partial: bool,
}

impl MessageSet {
    pub fn new(messages: Vec<Message>) -> Self {
        MessageSet {
            messages: messages,
            partial: false,
        }
    }
}

/// A single message as stored in a partition's log.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub offset: Offset,
    pub timestamp: Option<MessageTimestamp>,
    pub key: Option<Bytes>,
    pub value: Option<Bytes>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MessageTimestamp {
    CreateTime(Timestamp),
    LogAppendTime(Timestamp),
}

impl MessageTimestamp {
    pub fn value(&self) -> Timestamp {
        match self {
            &MessageTimestamp::CreateTime(v) |
            &MessageTimestamp::LogAppendTime(v) => v,
        }
    }
}

impl Default for MessageTimestamp {
    fn default() -> Self {
        let ts = time::now_utc().to_timespec();

        MessageTimestamp::CreateTime(ts.sec * 1000 + Timestamp::from(ts.nsec) / 1000_000)
    }
}

/// A message annotated with the (topic, partition) it was fetched from,
/// the unit of delivery to the processor.
#[derive(Clone, Debug, PartialEq)]
pub struct SourcedMessage {
    pub topic_name: String,
    pub partition: PartitionId,
    pub offset: Offset,
    pub message: Message,
}
