use std::rc::Rc;
use std::time::Duration;

use futures::{Async, Future, Poll};
use tokio_timer::{Sleep, Timer};

use errors::{Error, ErrorKind, Result};
use protocol::{KAFKA_SUCCESS, Offset, OffsetCommitRequest, OffsetCommitResponse,
               TIMESTAMP_INVALID};
use client::{BrokerClient, SendOffsetCommitRequest};
use consumer::{Consumer, RetryPolicy};

const WHAT: &'static str = "committing offset to kafka";

/// Who asked for a commit, which decides where its failure surfaces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CommitOrigin {
    /// `commit()` caller; the outcome resolves that caller's completion.
    Manual,
    /// Count/time threshold; a terminal failure tears the consumer down
    /// through the start completion.
    Auto,
    /// The commit a shutdown performs last; a terminal failure fails the
    /// shutdown completion while start still resolves with the offsets.
    Final,
}

/// Issues the commit request immediately and spawns a task to see it
/// through. The caller has already marked the commit in flight and, for
/// manual commits, registered its completion waiter.
pub fn submit<C: BrokerClient>(consumer: &Consumer<C>, offset: Offset, origin: CommitOrigin) {
    let task = CommitTask::new(consumer.clone(), offset, origin);

    consumer.client().handle().spawn(task);
}

/// Triggers an automatic commit of the current progress, unless nothing new
/// has been processed or a commit is already on the wire. Returns whether a
/// request actually went out.
pub fn auto_commit<C: BrokerClient>(consumer: &Consumer<C>) -> Result<bool> {
    match consumer.begin_auto_commit() {
        Some(offset) => {
            consumer.reset_commit_timer();
            submit(consumer, offset, CommitOrigin::Auto);

            Ok(true)
        }
        None => Ok(false),
    }
}

/// Drives one committed offset to the broker, retrying transient failures.
pub struct CommitTask<C: BrokerClient> {
    consumer: Consumer<C>,
    policy: RetryPolicy,
    timer: Rc<Timer>,
    offset: Offset,
    origin: CommitOrigin,
    attempts: u32,
    state: State,
}

enum State {
    InFlight(SendOffsetCommitRequest),
    Backoff(Sleep),
}

enum Outcome {
    Responses(Vec<OffsetCommitResponse>),
    Failed(Error),
    Reissue,
}

enum Next {
    Retry(State),
    Done,
}

impl<C: BrokerClient> CommitTask<C> {
    fn new(consumer: Consumer<C>, offset: Offset, origin: CommitOrigin) -> Self {
        let policy = consumer.retry_policy();
        let timer = consumer.client().timer();
        let request = issue(&consumer, offset);

        CommitTask {
            consumer: consumer,
            policy: policy,
            timer: timer,
            offset: offset,
            origin: origin,
            attempts: 0,
            state: State::InFlight(request),
        }
    }

    fn fail(&mut self, err: Error) -> Next {
        self.attempts += 1;

        if self.policy.should_retry(self.attempts, &err) {
            self.policy.log_failure(self.attempts, &self.consumer, WHAT, &err);
            self.consumer.record_retry();

            let delay = self.policy.next_delay(self.attempts - 1);

            return Next::Retry(State::Backoff(self.timer.sleep(delay)));
        }

        if RetryPolicy::is_retryable(&err) {
            self.policy.log_exhausted(&self.consumer, WHAT, &err);
        } else if !is_broker_failure(&err) {
            error!("Unhandleable failure during commit attempt: {}", err);
        }

        self.consumer.commit_failed(self.origin, err);

        Next::Done
    }
}

impl<C: BrokerClient> Future for CommitTask<C> {
    type Item = ();
    type Error = ();

    fn poll(&mut self) -> Poll<(), ()> {
        loop {
            if self.consumer.is_stopped() {
                // stop() already cancelled the waiters; dropping this task
                // drops the in-flight request with it.
                return Ok(Async::Ready(()));
            }

            self.consumer.register_commit_task();

            let outcome = match self.state {
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
                        Ok(Async::Ready(())) => Outcome::Reissue,
                        Err(err) => Outcome::Failed(err.into()),
                    }
                }
            };

            match outcome {
                Outcome::Responses(responses) => {
                    match check_responses(&self.consumer, responses) {
                        Ok(()) => {
                            self.consumer.commit_succeeded(self.offset);

                            return Ok(Async::Ready(()));
                        }
                        Err(err) => {
                            match self.fail(err) {
                                Next::Retry(state) => self.state = state,
                                Next::Done => return Ok(Async::Ready(())),
                            }
                        }
                    }
                }
                Outcome::Failed(err) => {
                    match self.fail(err) {
                        Next::Retry(state) => self.state = state,
                        Next::Done => return Ok(Async::Ready(())),
                    }
                }
                Outcome::Reissue => {
                    self.state = State::InFlight(issue(&self.consumer, self.offset));
                }
            }
        }
    }
}

fn issue<C: BrokerClient>(consumer: &Consumer<C>, offset: Offset) -> SendOffsetCommitRequest {
    let group = consumer.consumer_group().unwrap_or_default().to_owned();
    let request = OffsetCommitRequest {
        topic_name: consumer.topic().to_owned(),
        partition: consumer.partition(),
        offset: offset,
        timestamp: TIMESTAMP_INVALID,
        metadata: consumer.commit_metadata().map(|metadata| metadata.to_owned()),
    };

    consumer
        .client()
        .send_offset_commit_request(&group, vec![request])
}

fn check_responses<C: BrokerClient>(consumer: &Consumer<C>,
                                    responses: Vec<OffsetCommitResponse>)
                                    -> Result<()> {
    let response = responses
        .into_iter()
        .find(|response| {
                  response.partition == consumer.partition() &&
                  response.topic_name == consumer.topic()
              })
        .ok_or_else(|| {
                        ErrorKind::KafkaUnavailable("commit response missing our partition"
                                                        .to_owned())
                    })?;

    if response.error_code != KAFKA_SUCCESS {
        bail!(ErrorKind::KafkaError(response.error_code.into()));
    }

    Ok(())
}

/// Whether the failure was produced by the broker path at all; anything
/// else is a programming error we refuse to retry.
fn is_broker_failure(err: &Error) -> bool {
    match *err.kind() {
        ErrorKind::KafkaError(_) |
        ErrorKind::KafkaUnavailable(_) |
        ErrorKind::IoError(_) |
        ErrorKind::TimerError(_) => true,
        _ => false,
    }
}

/// The periodic auto-commit task.
///
/// Fires every `interval` while the consumer runs. A commit elsewhere wakes
/// the task and restarts the interval from that moment; a failing tick is
/// logged and the timer keeps running.
pub struct CommitTimer<C: BrokerClient> {
    consumer: Consumer<C>,
    timer: Rc<Timer>,
    interval: Duration,
    sleep: Sleep,
    armed_epoch: u64,
}

impl<C: BrokerClient> CommitTimer<C> {
    pub fn new(consumer: Consumer<C>, interval: Duration) -> Self {
        let timer = consumer.client().timer();
        let sleep = timer.sleep(interval);
        let armed_epoch = consumer.commit_epoch();

        CommitTimer {
            consumer: consumer,
            timer: timer,
            interval: interval,
            sleep: sleep,
            armed_epoch: armed_epoch,
        }
    }

    fn rearm(&mut self) {
        self.sleep = self.timer.sleep(self.interval);
        self.armed_epoch = self.consumer.commit_epoch();
    }
}

impl<C: BrokerClient> Future for CommitTimer<C> {
    type Item = ();
    type Error = ();

    fn poll(&mut self) -> Poll<(), ()> {
        loop {
            if !self.consumer.is_running() {
                return Ok(Async::Ready(()));
            }

            self.consumer.register_commit_timer_task();

            // A commit fired since this interval was armed; restart the
            // interval from now instead of letting the stale one elapse.
            if self.consumer.commit_epoch() != self.armed_epoch {
                self.rearm();

                continue;
            }

            match self.sleep.poll() {
                Ok(Async::NotReady) => return Ok(Async::NotReady),
                Ok(Async::Ready(())) => {
                    if let Err(err) = auto_commit(&self.consumer) {
                        warn!("commit timer tick failed: {}, restarting the timer", err);
                    }

                    self.rearm();
                }
                Err(err) => {
                    warn!("commit timer error: {:?}, restarting the timer", err);
                    self.rearm();
                }
            }
        }
    }
}
