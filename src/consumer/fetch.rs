use std::cmp;
use std::rc::Rc;

use futures::{Async, Future, Poll, Stream};
use tokio_timer::{Sleep, Timer};

use errors::{Error, ErrorKind, Result};
use protocol::{FetchRequest, FetchResponse, KAFKA_SUCCESS, Offset, SourcedMessage};
use client::{BrokerClient, SendFetchRequest};
use consumer::{Consumer, RetryPolicy};

const WHAT: &'static str = "fetching messages from kafka";

/// The steady-state fetch loop, a stream of message batches.
///
/// Yields non-empty batches in strictly increasing offset order and advances
/// the consumer's fetch offset past each one, so the very next poll issues
/// the follow-up fetch while the previous batch is still being processed.
/// Empty responses refetch immediately (the broker long-polls on our
/// behalf), an undersized fetch limit grows up to `max_buffer_size`, and
/// request failures back off per the retry policy.
pub struct Fetcher<C: BrokerClient> {
    consumer: Consumer<C>,
    policy: RetryPolicy,
    timer: Rc<Timer>,
    offset: Offset,
    buffer_size: i32,
    max_buffer_size: i32,
    attempts: u32,
    state: State,
}

enum State {
    Idle,
    InFlight(SendFetchRequest),
    Backoff(Sleep),
}

enum Handled {
    Batch(Vec<SourcedMessage>),
    Refetch,
}

enum Outcome {
    Issue,
    Responses(Vec<FetchResponse>),
    Failed(Error),
}

impl<C: BrokerClient> Fetcher<C> {
    pub fn new(consumer: Consumer<C>, offset: Offset) -> Self {
        let policy = consumer.retry_policy();
        let timer = consumer.client().timer();
        let buffer_size = consumer.buffer_size();
        let max_buffer_size = consumer.max_buffer_size();

        Fetcher {
            consumer: consumer,
            policy: policy,
            timer: timer,
            offset: offset,
            buffer_size: buffer_size,
            max_buffer_size: max_buffer_size,
            attempts: 0,
            state: State::Idle,
        }
    }

    fn do_fetch(&mut self) {
        if let State::InFlight(_) = self.state {
            debug!("fetch request already outstanding, not issuing another");

            return;
        }

        let request = FetchRequest {
            topic_name: self.consumer.topic().to_owned(),
            partition: self.consumer.partition(),
            fetch_offset: self.offset,
            max_bytes: self.buffer_size,
        };
        let (max_wait_time, min_bytes) = self.consumer.fetch_tuning();

        self.state = State::InFlight(self.consumer
                                         .client()
                                         .send_fetch_request(vec![request],
                                                             max_wait_time,
                                                             min_bytes));
    }

    fn handle_responses(&mut self, responses: Vec<FetchResponse>) -> Result<Handled> {
        let partition = self.consumer.partition();
        let mut found = false;

        for response in responses {
            if response.topic_name != self.consumer.topic() || response.partition != partition {
                warn!("{:?}: got response with partition: {} not our own: {}",
                      self.consumer,
                      response.partition,
                      partition);

                continue;
            }

            found = true;

            if response.error_code != KAFKA_SUCCESS {
                bail!(ErrorKind::KafkaError(response.error_code.into()));
            }

            if response.message_set.messages.is_empty() && response.message_set.partial {
                // The next message alone exceeds the current fetch size.
                if self.buffer_size >= self.max_buffer_size {
                    bail!(ErrorKind::ConsumerFetchSizeTooSmall(self.max_buffer_size));
                }

                let grown = cmp::min(self.buffer_size.saturating_mul(2), self.max_buffer_size);

                debug!("growing fetch size from {} to {} bytes for offset {}",
                       self.buffer_size,
                       grown,
                       self.offset);
                self.buffer_size = grown;

                return Ok(Handled::Refetch);
            }

            let total = response.message_set.messages.len();
            let topic_name = response.topic_name;
            let batch: Vec<SourcedMessage> = response
                .message_set
                .messages
                .into_iter()
                .filter(|message| message.offset >= self.offset)
                .map(|message| {
                         SourcedMessage {
                             topic_name: topic_name.clone(),
                             partition: partition,
                             offset: message.offset,
                             message: message,
                         }
                     })
                .collect();

            if batch.len() < total {
                // Compressed sets may begin before the requested offset.
                debug!("skipped {} messages below fetch offset {}",
                       total - batch.len(),
                       self.offset);
            }

            return if batch.is_empty() {
                       Ok(Handled::Refetch)
                   } else {
                       Ok(Handled::Batch(batch))
                   };
        }

        if !found {
            debug!("fetch response carried no entry for partition {}, treating as empty",
                   partition);
        }

        Ok(Handled::Refetch)
    }

    fn retry(&mut self, err: Error) -> Result<State> {
        self.attempts += 1;

        if !self.policy.should_retry(self.attempts, &err) {
            if self.policy.exhausted(self.attempts) && RetryPolicy::is_retryable(&err) {
                self.policy.log_exhausted(&self.consumer, WHAT, &err);
            }

            return Err(err);
        }

        self.policy.log_failure(self.attempts, &self.consumer, WHAT, &err);
        self.consumer.record_retry();

        let delay = self.policy.next_delay(self.attempts - 1);

        Ok(State::Backoff(self.timer.sleep(delay)))
    }
}

impl<C: BrokerClient> Stream for Fetcher<C> {
    type Item = Vec<SourcedMessage>;
    type Error = Error;

    fn poll(&mut self) -> Poll<Option<Self::Item>, Self::Error> {
        loop {
            if !self.consumer.is_running() {
                return Ok(Async::Ready(None));
            }

            let outcome = match self.state {
                State::Idle => Outcome::Issue,
                State::InFlight(ref mut request) => {
                    match request.poll() {
                        Ok(Async::NotReady) => return Ok(Async::NotReady),
                        Ok(Async::Ready(responses)) => Outcome::Responses(responses),
                        Err(err) => Outcome::Failed(err),
                    }
                }
                State::Backoff(ref mut sleep) => {
                    match sleep.poll() {
                        Ok(Async::NotReady) => return Ok(Async::NotReady),
                        Ok(Async::Ready(())) => Outcome::Issue,
                        Err(err) => return Err(err.into()),
                    }
                }
            };

            match outcome {
                Outcome::Issue => {
                    self.state = State::Idle;
                    self.do_fetch();
                }
                Outcome::Responses(responses) => {
                    self.state = State::Idle;

                    match self.handle_responses(responses) {
                        Ok(Handled::Batch(batch)) => {
                            let next_offset = batch[batch.len() - 1].offset + 1;

                            self.attempts = 0;
                            self.offset = next_offset;
                            self.consumer.set_fetch_offset(next_offset);

                            return Ok(Async::Ready(Some(batch)));
                        }
                        Ok(Handled::Refetch) => {
                            self.attempts = 0;
                        }
                        Err(err) => {
                            // Error codes embedded in the response retry the
                            // same way request-level failures do.
                            self.state = self.retry(err)?;
                        }
                    }
                }
                Outcome::Failed(err) => {
                    self.state = self.retry(err)?;
                }
            }
        }
    }
}
