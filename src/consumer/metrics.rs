use prometheus::{Counter, Opts};

use errors::{ErrorKind, Result};
use protocol::PartitionId;

/// Per-consumer prometheus counters, registered with the default registry
/// when the `metrics` config flag is set.
pub struct ConsumerMetrics {
    pub batches_dispatched: Counter,
    pub messages_processed: Counter,
    pub offsets_committed: Counter,
    pub request_retries: Counter,
}

impl ConsumerMetrics {
    pub fn new(topic_name: &str, partition: PartitionId) -> Result<Self> {
        Ok(ConsumerMetrics {
               batches_dispatched: register_counter("kafka_consumer_batches_dispatched",
                                                    "Message batches handed to the processor",
                                                    topic_name,
                                                    partition)?,
               messages_processed: register_counter("kafka_consumer_messages_processed",
                                                    "Messages acknowledged by the processor",
                                                    topic_name,
                                                    partition)?,
               offsets_committed: register_counter("kafka_consumer_offsets_committed",
                                                   "Offset commits acknowledged by the broker",
                                                   topic_name,
                                                   partition)?,
               request_retries: register_counter("kafka_consumer_request_retries",
                                                 "Broker requests retried after a transient \
                                                  failure",
                                                 topic_name,
                                                 partition)?,
           })
    }
}

fn register_counter(name: &str,
                    help: &str,
                    topic_name: &str,
                    partition: PartitionId)
                    -> Result<Counter> {
    let opts = Opts::new(name, help)
        .const_label("topic", topic_name)
        .const_label("partition", partition.to_string().as_str());
    let counter = Counter::with_opts(opts)
        .map_err(|err| ErrorKind::Msg(format!("fail to create counter, {}", err)))?;

    ::prometheus::register(Box::new(counter.clone()))
        .map_err(|err| ErrorKind::Msg(format!("fail to register counter, {}", err)))?;

    Ok(counter)
}
