use errors::Result;
use protocol::PartitionId;
use client::BrokerClient;
use consumer::{BatchProcessor, Consumer, ConsumerConfig};

/// Assembles a `Consumer` from its tunables.
///
/// ```ignore
/// let consumer = ConsumerBuilder::new(client, "events", 3, Box::new(processor))
///     .with_consumer_group("audit")
///     .with_auto_commit_every_n(500)
///     .build()?;
/// ```
pub struct ConsumerBuilder<C: BrokerClient> {
    client: C,
    config: ConsumerConfig,
    processor: Box<BatchProcessor<C>>,
}

impl<C: BrokerClient> ConsumerBuilder<C> {
    pub fn new(client: C,
               topic_name: &str,
               partition: PartitionId,
               processor: Box<BatchProcessor<C>>)
               -> Self {
        let config = ConsumerConfig {
            topic_name: topic_name.to_owned(),
            partition: partition,
            ..Default::default()
        };

        ConsumerBuilder {
            client: client,
            config: config,
            processor: processor,
        }
    }

    pub fn with_consumer_group<S: Into<String>>(mut self, consumer_group: S) -> Self {
        self.config.consumer_group = Some(consumer_group.into());
        self
    }

    pub fn with_commit_metadata<S: Into<String>>(mut self, metadata: S) -> Self {
        self.config.commit_metadata = Some(metadata.into());
        self
    }

    pub fn with_auto_commit_every_n(mut self, messages: u32) -> Self {
        self.config.auto_commit_every_n = Some(messages);
        self
    }

    pub fn with_auto_commit_every_ms(mut self, millis: u32) -> Self {
        self.config.auto_commit_every_ms = Some(millis);
        self
    }

    pub fn with_buffer_size(mut self, bytes: i32) -> Self {
        self.config.buffer_size = bytes;
        self
    }

    pub fn with_max_buffer_size(mut self, bytes: i32) -> Self {
        self.config.max_buffer_size = bytes;
        self
    }

    pub fn with_fetch_min_bytes(mut self, bytes: i32) -> Self {
        self.config.fetch_min_bytes = bytes;
        self
    }

    pub fn with_fetch_max_wait_time(mut self, millis: i32) -> Self {
        self.config.fetch_max_wait_time = millis;
        self
    }

    pub fn with_retry_init_delay(mut self, seconds: f64) -> Self {
        self.config.retry_init_delay = seconds;
        self
    }

    pub fn with_retry_max_delay(mut self, seconds: f64) -> Self {
        self.config.retry_max_delay = seconds;
        self
    }

    pub fn with_retry_max_attempts(mut self, attempts: u32) -> Self {
        self.config.retry_max_attempts = attempts;
        self
    }

    pub fn with_metrics(mut self) -> Self {
        self.config.metrics = true;
        self
    }

    pub fn build(self) -> Result<Consumer<C>> {
        Consumer::from_config(self.client, self.config, self.processor)
    }
}
