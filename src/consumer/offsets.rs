use std::rc::Rc;

use futures::{Async, Future, Poll};
use tokio_timer::{Sleep, Timer};

use errors::{Error, ErrorKind, Result};
use protocol::{KAFKA_SUCCESS, OFFSET_EARLIEST, OFFSET_LATEST, Offset, OffsetFetchRequest,
               OffsetRequest, StartPosition, Timestamp};
use client::{BrokerClient, SendOffsetFetchRequest, SendOffsetRequest};
use consumer::{Consumer, RetryPolicy};

const WHAT: &'static str = "fetching offset from kafka";

/// Resolves a symbolic start position into a concrete fetch offset.
///
/// Yields `(fetch_offset, committed)` where `committed` is the offset the
/// consumer group last committed, when the resolution went through one.
/// Broker requests are retried per the consumer's `RetryPolicy`; a stored
/// "no offset" sentinel falls through to an EARLIEST lookup.
pub struct ResolveOffset<C: BrokerClient> {
    consumer: Consumer<C>,
    policy: RetryPolicy,
    timer: Rc<Timer>,
    attempts: u32,
    state: State,
}

enum State {
    Start(StartPosition),
    FetchingCommitted(SendOffsetFetchRequest),
    LookingUp(Timestamp, SendOffsetRequest),
    Backoff(Sleep, Resume),
}

#[derive(Clone, Copy)]
enum Resume {
    FetchCommitted,
    LookUp(Timestamp),
}

impl<C: BrokerClient> ResolveOffset<C> {
    pub fn new(consumer: Consumer<C>, position: StartPosition) -> Self {
        let policy = consumer.retry_policy();
        let timer = consumer.client().timer();

        ResolveOffset {
            consumer: consumer,
            policy: policy,
            timer: timer,
            attempts: 0,
            state: State::Start(position),
        }
    }

    fn look_up(&self, time: Timestamp) -> State {
        let request = OffsetRequest {
            topic_name: self.consumer.topic().to_owned(),
            partition: self.consumer.partition(),
            time: time,
            max_offsets: 1,
        };

        State::LookingUp(time,
                         self.consumer.client().send_offset_request(vec![request]))
    }

    fn fetch_committed(&self) -> Result<State> {
        let group = self.consumer
            .consumer_group()
            .ok_or_else(|| {
                            ErrorKind::InvalidConsumerGroup("committed start position requires \
                                                             a consumer group"
                                                                    .to_owned())
                        })?
            .to_owned();
        let request = OffsetFetchRequest {
            topic_name: self.consumer.topic().to_owned(),
            partition: self.consumer.partition(),
        };

        Ok(State::FetchingCommitted(self.consumer
                                        .client()
                                        .send_offset_fetch_request(&group, vec![request])))
    }

    fn retry(&mut self, err: Error, resume: Resume) -> Result<State> {
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

        Ok(State::Backoff(self.timer.sleep(delay), resume))
    }
}

enum Outcome {
    Begin(StartPosition),
    Committed(Vec<::protocol::OffsetFetchResponse>),
    LookedUp(Timestamp, Vec<::protocol::OffsetResponse>),
    Failed(Error, Resume),
    Resumed(Resume),
}

impl<C: BrokerClient> Future for ResolveOffset<C> {
    type Item = (Offset, Option<Offset>);
    type Error = Error;

    fn poll(&mut self) -> Poll<Self::Item, Self::Error> {
        loop {
            let outcome = match self.state {
                State::Start(position) => Outcome::Begin(position),
                State::FetchingCommitted(ref mut request) => {
                    match request.poll() {
                        Ok(Async::NotReady) => return Ok(Async::NotReady),
                        Ok(Async::Ready(responses)) => Outcome::Committed(responses),
                        Err(err) => Outcome::Failed(err, Resume::FetchCommitted),
                    }
                }
                State::LookingUp(time, ref mut request) => {
                    match request.poll() {
                        Ok(Async::NotReady) => return Ok(Async::NotReady),
                        Ok(Async::Ready(responses)) => Outcome::LookedUp(time, responses),
                        Err(err) => Outcome::Failed(err, Resume::LookUp(time)),
                    }
                }
                State::Backoff(ref mut sleep, resume) => {
                    match sleep.poll() {
                        Ok(Async::NotReady) => return Ok(Async::NotReady),
                        Ok(Async::Ready(())) => Outcome::Resumed(resume),
                        Err(err) => return Err(err.into()),
                    }
                }
            };

            let next = match outcome {
                Outcome::Begin(position) => {
                    match position {
                        StartPosition::Offset(offset) if offset >= 0 => {
                            return Ok(Async::Ready((offset, None)));
                        }
                        StartPosition::Offset(offset) => {
                            bail!(ErrorKind::InvalidConfig(format!("negative start offset: {}",
                                                                   offset)));
                        }
                        StartPosition::Earliest => self.look_up(OFFSET_EARLIEST),
                        StartPosition::Latest => self.look_up(OFFSET_LATEST),
                        StartPosition::Committed => self.fetch_committed()?,
                    }
                }
                Outcome::Committed(responses) => {
                    match committed_offset(&self.consumer, responses) {
                        Ok(Some(committed)) => {
                            return Ok(Async::Ready((committed + 1, Some(committed))));
                        }
                        Ok(None) => {
                            // No offset stored under the group yet.
                            self.attempts = 0;
                            self.look_up(OFFSET_EARLIEST)
                        }
                        Err(err) => self.retry(err, Resume::FetchCommitted)?,
                    }
                }
                Outcome::LookedUp(time, responses) => {
                    match looked_up_offset(&self.consumer, responses) {
                        Ok(offset) => return Ok(Async::Ready((offset, None))),
                        Err(err) => self.retry(err, Resume::LookUp(time))?,
                    }
                }
                Outcome::Failed(err, resume) => self.retry(err, resume)?,
                Outcome::Resumed(resume) => {
                    match resume {
                        Resume::FetchCommitted => self.fetch_committed()?,
                        Resume::LookUp(time) => self.look_up(time),
                    }
                }
            };

            self.state = next;
        }
    }
}

/// Extracts the committed offset for our partition; `None` when the broker
/// has no offset stored under the group.
fn committed_offset<C: BrokerClient>(consumer: &Consumer<C>,
                                     responses: Vec<::protocol::OffsetFetchResponse>)
                                     -> Result<Option<Offset>> {
    let response = responses
        .into_iter()
        .find(|response| {
                  response.partition == consumer.partition() &&
                  response.topic_name == consumer.topic()
              })
        .ok_or_else(|| {
                        ErrorKind::KafkaUnavailable("offset fetch response missing our partition"
                                                        .to_owned())
                    })?;

    if response.error_code != KAFKA_SUCCESS {
        bail!(ErrorKind::KafkaError(response.error_code.into()));
    }

    if response.offset < 0 {
        Ok(None)
    } else {
        Ok(Some(response.offset))
    }
}

fn looked_up_offset<C: BrokerClient>(consumer: &Consumer<C>,
                                     responses: Vec<::protocol::OffsetResponse>)
                                     -> Result<Offset> {
    let response = responses
        .into_iter()
        .find(|response| {
                  response.partition == consumer.partition() &&
                  response.topic_name == consumer.topic()
              })
        .ok_or_else(|| {
                        ErrorKind::KafkaUnavailable("offset response missing our partition"
                                                        .to_owned())
                    })?;

    if response.error_code != KAFKA_SUCCESS {
        bail!(ErrorKind::KafkaError(response.error_code.into()));
    }

    response
        .offsets
        .first()
        .cloned()
        .ok_or_else(|| ErrorKind::KafkaUnavailable("offset response carried no offsets".to_owned())
                        .into())
}
