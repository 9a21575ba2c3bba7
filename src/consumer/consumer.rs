use std::cell::RefCell;
use std::cmp;
use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::rc::Rc;

use futures::{Async, Future, Poll, Stream};
use futures::task::{self, Task};
use futures::unsync::oneshot;

use errors::{Error, ErrorKind, Result};
use protocol::{Offset, PartitionId, SourcedMessage, StartPosition};
use client::{BrokerClient, StaticBoxFuture, ToStaticBoxFuture};
use consumer::{BatchProcessor, ConsumerConfig, ConsumerMetrics, Fetcher, Processing,
               ProcessorGate, ResolveOffset, RetryPolicy};
use consumer::commit::{self, CommitOrigin, CommitTimer};

/// `(last_processed_offset, last_committed_offset)` at termination.
pub type OffsetPair = (Option<Offset>, Option<Offset>);

/// The future of a started consumer; resolves when the consumer terminates.
pub type StartConsumer = StaticBoxFuture<OffsetPair>;

/// The future of an offset commit; resolves with the committed offset.
pub type CommitConsumer = StaticBoxFuture<Option<Offset>>;

/// The future of a graceful shutdown.
pub type ShutdownConsumer = StaticBoxFuture<OffsetPair>;

/// A long-lived consumer of one (topic, partition).
///
/// Cheap to clone; all clones share the same underlying consumer. The
/// consumer resolves its start position, then interleaves fetching, batch
/// processing and offset commits on the reactor the broker client exposes,
/// until it is stopped, shut down, or hits an unrecoverable failure. That
/// terminal outcome resolves the completion `start()` returned.
pub struct Consumer<C: BrokerClient> {
    inner: Rc<Inner<C>>,
}

impl<C: BrokerClient> Clone for Consumer<C> {
    fn clone(&self) -> Self {
        Consumer { inner: self.inner.clone() }
    }
}

struct Inner<C: BrokerClient> {
    client: C,
    config: ConsumerConfig,
    processor: RefCell<Box<BatchProcessor<C>>>,
    processor_repr: String,
    metrics: Option<Rc<ConsumerMetrics>>,
    state: RefCell<State>,
}

struct State {
    status: Status,
    shutdown_requested: bool,
    fetch_offset: Option<Offset>,
    last_processed_offset: Option<Offset>,
    last_committed_offset: Option<Offset>,
    processor_busy: bool,
    commit_in_flight: bool,
    commit_epoch: u64,
    commit_waiters: Vec<oneshot::Sender<Result<Option<Offset>>>>,
    start_tx: Option<oneshot::Sender<Result<OffsetPair>>>,
    shutdown_tx: Option<oneshot::Sender<Result<OffsetPair>>>,
    daemon: Option<Task>,
    commit_task: Option<Task>,
    commit_timer: Option<Task>,
}

impl State {
    fn new() -> Self {
        State {
            status: Status::Initialized,
            shutdown_requested: false,
            fetch_offset: None,
            last_processed_offset: None,
            last_committed_offset: None,
            processor_busy: false,
            commit_in_flight: false,
            commit_epoch: 0,
            commit_waiters: Vec::new(),
            start_tx: None,
            shutdown_tx: None,
            daemon: None,
            commit_task: None,
            commit_timer: None,
        }
    }

    fn offsets(&self) -> OffsetPair {
        (self.last_processed_offset, self.last_committed_offset)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Status {
    Initialized,
    Running,
    Stopping,
    Stopped,
}

impl Status {
    fn name(&self) -> &'static str {
        match *self {
            Status::Initialized => "initialized",
            Status::Running => "running",
            Status::Stopping => "stopping",
            Status::Stopped => "stopped",
        }
    }
}

impl<C: BrokerClient> Consumer<C> {
    /// Creates a consumer with default tuning; use `ConsumerBuilder` for
    /// anything beyond topic and partition.
    pub fn new(client: C,
               topic_name: &str,
               partition: PartitionId,
               processor: Box<BatchProcessor<C>>)
               -> Result<Consumer<C>> {
        let config = ConsumerConfig {
            topic_name: topic_name.to_owned(),
            partition: partition,
            ..Default::default()
        };

        Consumer::from_config(client, config, processor)
    }

    pub fn from_config(client: C,
                       config: ConsumerConfig,
                       processor: Box<BatchProcessor<C>>)
                       -> Result<Consumer<C>> {
        config.validate()?;

        let metrics = if config.metrics {
            Some(Rc::new(ConsumerMetrics::new(&config.topic_name, config.partition)?))
        } else {
            None
        };
        let processor_repr = format!("{:?}", processor);

        Ok(Consumer {
               inner: Rc::new(Inner {
                                  client: client,
                                  config: config,
                                  processor: RefCell::new(processor),
                                  processor_repr: processor_repr,
                                  metrics: metrics,
                                  state: RefCell::new(State::new()),
                              }),
           })
    }

    pub fn topic(&self) -> &str {
        &self.inner.config.topic_name
    }

    pub fn partition(&self) -> PartitionId {
        self.inner.config.partition
    }

    pub fn consumer_group(&self) -> Option<&str> {
        self.inner.config.consumer_group.as_ref().map(|s| s.as_str())
    }

    pub fn commit_metadata(&self) -> Option<&str> {
        self.inner.config.commit_metadata.as_ref().map(|s| s.as_str())
    }

    /// The configured initial fetch size in bytes.
    pub fn buffer_size(&self) -> i32 {
        self.inner.config.buffer_size
    }

    pub fn max_buffer_size(&self) -> i32 {
        self.inner.config.max_buffer_size
    }

    /// The next offset a fetch will ask for, once known.
    pub fn fetch_offset(&self) -> Option<Offset> {
        self.inner.state.borrow().fetch_offset
    }

    /// The greatest offset the processor has acknowledged.
    pub fn last_processed_offset(&self) -> Option<Offset> {
        self.inner.state.borrow().last_processed_offset
    }

    /// The greatest offset known committed under the consumer group.
    pub fn last_committed_offset(&self) -> Option<Offset> {
        self.inner.state.borrow().last_committed_offset
    }

    pub fn metrics(&self) -> Option<Rc<ConsumerMetrics>> {
        self.inner.metrics.clone()
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.borrow().status == Status::Running
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.state.borrow().status == Status::Stopped
    }

    /// Starts consuming from `position`.
    ///
    /// The returned completion stays pending while the consumer runs and
    /// resolves with `(last_processed_offset, last_committed_offset)` once
    /// it terminates, or fails with whatever tore the consumer down. A
    /// consumer starts at most once.
    pub fn start<P: Into<StartPosition>>(&self, position: P) -> StartConsumer {
        let position = position.into();
        let rx = {
            let mut state = self.inner.state.borrow_mut();

            if state.status != Status::Initialized {
                return ErrorKind::RestartError("Start called on already-started consumer")
                           .into();
            }

            if position == StartPosition::Committed &&
               self.inner.config.consumer_group.is_none() {
                // Fail before any I/O; there is nothing to resume from.
                state.status = Status::Stopped;

                return ErrorKind::InvalidConsumerGroup("committed start position requires a \
                                                        consumer group"
                                                               .to_owned())
                           .into();
            }

            state.status = Status::Running;

            let (tx, rx) = oneshot::channel();

            state.start_tx = Some(tx);

            rx
        };

        debug!("{:?}: starting from {}", self, position);

        let handle = self.inner.client.handle().clone();

        handle.spawn(Daemon::new(self.clone(), position));

        if let Some(interval) = self.inner.config.auto_commit_interval() {
            handle.spawn(CommitTimer::new(self.clone(), interval));
        }

        rx.then(|result| match result {
                    Ok(Ok(offsets)) => Ok(offsets),
                    Ok(Err(err)) => Err(err),
                    Err(_) => Err(ErrorKind::Canceled("consumer start").into()),
                })
            .static_boxed()
    }

    /// Commits the last processed offset under the consumer group.
    ///
    /// Resolves with the committed offset. Without new progress this is a
    /// no-op resolving with the current committed offset; while another
    /// commit is on the wire it fails with `OperationInProgress`.
    pub fn commit(&self) -> CommitConsumer {
        if self.inner.config.consumer_group.is_none() {
            return ErrorKind::InvalidConsumerGroup("no consumer group specified for commit"
                                                       .to_owned())
                       .into();
        }

        let offset = {
            let mut state = self.inner.state.borrow_mut();

            if state.status == Status::Stopped {
                return ErrorKind::Canceled("offset commit").into();
            }

            match state.last_processed_offset {
                None => return StaticBoxFuture::ok(state.last_committed_offset),
                Some(offset) => {
                    if Some(offset) == state.last_committed_offset {
                        return StaticBoxFuture::ok(state.last_committed_offset);
                    }

                    if state.commit_in_flight {
                        return ErrorKind::OperationInProgress("offset commit").into();
                    }

                    state.commit_in_flight = true;

                    offset
                }
            }
        };

        self.reset_commit_timer();

        let (tx, rx) = oneshot::channel();

        self.inner.state.borrow_mut().commit_waiters.push(tx);

        commit::submit(self, offset, CommitOrigin::Manual);

        rx.then(|result| match result {
                    Ok(Ok(offset)) => Ok(offset),
                    Ok(Err(err)) => Err(err),
                    Err(_) => Err(ErrorKind::Canceled("offset commit").into()),
                })
            .static_boxed()
    }

    /// Stops the consumer immediately.
    ///
    /// Cancels the in-flight broker request and processor invocation and
    /// any pending commit completions, then resolves the start completion.
    /// Returns the final `(last_processed_offset, last_committed_offset)`.
    pub fn stop(&self) -> Result<OffsetPair> {
        {
            let state = self.inner.state.borrow();

            match state.status {
                Status::Initialized => {
                    bail!(ErrorKind::RestopError("Stop called on non-running consumer"));
                }
                Status::Stopping => {
                    bail!(ErrorKind::RestopError("Stop called on consumer shutting down"));
                }
                Status::Stopped => {
                    bail!(ErrorKind::RestopError("Stop called on stopped consumer"));
                }
                Status::Running => {}
            }
        }

        debug!("{:?}: stopping", self);

        Ok(self.halt(None))
    }

    /// Shuts the consumer down gracefully.
    ///
    /// Waits for the in-flight processor invocation, performs a final
    /// commit when a group is configured and progress is uncommitted, then
    /// stops. Resolves with the final offsets.
    pub fn shutdown(&self) -> ShutdownConsumer {
        let rx = {
            let mut state = self.inner.state.borrow_mut();

            if state.status != Status::Running {
                return if state.shutdown_requested {
                           ErrorKind::RestopError("Shutdown called more than once.").into()
                       } else {
                           ErrorKind::RestopError("Shutdown called on non-running consumer")
                               .into()
                       };
            }

            state.shutdown_requested = true;
            state.status = Status::Stopping;

            let (tx, rx) = oneshot::channel();

            state.shutdown_tx = Some(tx);

            if let Some(ref task) = state.daemon {
                task.notify();
            }

            rx
        };

        debug!("{:?}: shutting down", self);

        rx.then(|result| match result {
                    Ok(Ok(offsets)) => Ok(offsets),
                    Ok(Err(err)) => Err(err),
                    Err(_) => Err(ErrorKind::Canceled("consumer shutdown").into()),
                })
            .static_boxed()
    }

    pub(crate) fn client(&self) -> &C {
        &self.inner.client
    }

    pub(crate) fn retry_policy(&self) -> RetryPolicy {
        self.inner.config.retry_policy()
    }

    pub(crate) fn fetch_tuning(&self) -> (i32, i32) {
        (self.inner.config.fetch_max_wait_time, self.inner.config.fetch_min_bytes)
    }

    pub(crate) fn status(&self) -> Status {
        self.inner.state.borrow().status
    }

    pub(crate) fn commit_epoch(&self) -> u64 {
        self.inner.state.borrow().commit_epoch
    }

    pub(crate) fn set_fetch_offset(&self, offset: Offset) {
        self.inner.state.borrow_mut().fetch_offset = Some(offset);
    }

    pub(crate) fn register_daemon_task(&self) {
        self.inner.state.borrow_mut().daemon = Some(task::current());
    }

    pub(crate) fn record_retry(&self) {
        if let Some(ref metrics) = self.inner.metrics {
            metrics.request_retries.inc();
        }
    }

    pub(crate) fn register_commit_task(&self) {
        self.inner.state.borrow_mut().commit_task = Some(task::current());
    }

    pub(crate) fn register_commit_timer_task(&self) {
        self.inner.state.borrow_mut().commit_timer = Some(task::current());
    }

    fn offsets_resolved(&self, fetch_offset: Offset, committed: Option<Offset>) {
        {
            let mut state = self.inner.state.borrow_mut();

            state.fetch_offset = Some(fetch_offset);

            if committed.is_some() {
                state.last_committed_offset = committed;
            }
        }

        debug!("{:?}: start position resolved, fetching from offset {}",
               self,
               fetch_offset);
    }

    pub(crate) fn invoke_processor(&self, messages: Vec<SourcedMessage>) -> Processing {
        if let Some(ref metrics) = self.inner.metrics {
            metrics.batches_dispatched.inc();
        }

        let mut processor = self.inner.processor.borrow_mut();

        processor.process(self, messages)
    }

    fn acknowledge(&self, offset: Offset, count: usize) {
        {
            let mut state = self.inner.state.borrow_mut();

            state.last_processed_offset = cmp::max(state.last_processed_offset, Some(offset));
            state.processor_busy = false;
        }

        if let Some(ref metrics) = self.inner.metrics {
            metrics.messages_processed.inc_by(count as f64);
        }

        trace!("{:?}: processed through offset {}", self, offset);
    }

    /// Marks the offset an automatic commit should record, or `None` when
    /// there is nothing (new) to commit or a commit is already in flight.
    pub(crate) fn begin_auto_commit(&self) -> Option<Offset> {
        let mut state = self.inner.state.borrow_mut();

        if state.status != Status::Running || self.inner.config.consumer_group.is_none() {
            return None;
        }

        let offset = state.last_processed_offset?;

        if Some(offset) == state.last_committed_offset {
            return None;
        }

        if state.commit_in_flight {
            trace!("commit request in flight, skipping automatic commit");

            return None;
        }

        state.commit_in_flight = true;

        Some(offset)
    }

    /// Restarts the periodic commit timer's interval from this moment.
    pub(crate) fn reset_commit_timer(&self) {
        let timer = {
            let mut state = self.inner.state.borrow_mut();

            state.commit_epoch += 1;

            state.commit_timer.clone()
        };

        if let Some(task) = timer {
            task.notify();
        }
    }

    pub(crate) fn commit_succeeded(&self, offset: Offset) {
        let waiters = {
            let mut state = self.inner.state.borrow_mut();

            state.last_committed_offset = cmp::max(state.last_committed_offset, Some(offset));
            state.commit_in_flight = false;

            mem::replace(&mut state.commit_waiters, Vec::new())
        };

        self.reset_commit_timer();

        if let Some(ref metrics) = self.inner.metrics {
            metrics.offsets_committed.inc();
        }

        trace!("{:?}: committed offset {}", self, offset);

        for tx in waiters {
            let _ = tx.send(Ok(Some(offset)));
        }

        self.poke_shutdown();
    }

    pub(crate) fn commit_failed(&self, origin: CommitOrigin, err: Error) {
        self.inner.state.borrow_mut().commit_in_flight = false;

        match origin {
            CommitOrigin::Manual => {
                let waiters =
                    mem::replace(&mut self.inner.state.borrow_mut().commit_waiters, Vec::new());
                let mut err = Some(err);

                for tx in waiters {
                    match err.take() {
                        Some(err) => {
                            let _ = tx.send(Err(err));
                        }
                        None => drop(tx),
                    }
                }

                // A shutdown riding this commit still has to converge.
                self.poke_shutdown();
            }
            CommitOrigin::Auto => {
                if self.status() == Status::Stopping {
                    self.fail_shutdown(err);
                } else {
                    self.halt(Some(err));
                }
            }
            CommitOrigin::Final => self.fail_shutdown(err),
        }
    }

    /// Advances a pending shutdown: once the processor is idle, issue the
    /// final commit (or ride the one in flight), then finish.
    pub(crate) fn poke_shutdown(&self) {
        enum Advance {
            Wait,
            Commit(Offset),
            Finish,
        }

        let advance = {
            let mut state = self.inner.state.borrow_mut();

            if state.status != Status::Stopping || state.processor_busy ||
               state.commit_in_flight {
                Advance::Wait
            } else {
                match (self.inner.config.consumer_group.as_ref(), state.last_processed_offset) {
                    (Some(_), Some(processed))
                        if Some(processed) != state.last_committed_offset => {
                        state.commit_in_flight = true;

                        Advance::Commit(processed)
                    }
                    _ => Advance::Finish,
                }
            }
        };

        match advance {
            Advance::Wait => {}
            Advance::Commit(offset) => commit::submit(self, offset, CommitOrigin::Final),
            Advance::Finish => {
                let tx = self.inner.state.borrow_mut().shutdown_tx.take();
                let offsets = self.halt(None);

                if let Some(tx) = tx {
                    let _ = tx.send(Ok(offsets));
                }
            }
        }
    }

    fn fail_shutdown(&self, err: Error) {
        let tx = self.inner.state.borrow_mut().shutdown_tx.take();

        self.halt(None);

        if let Some(tx) = tx {
            let _ = tx.send(Err(err));
        }
    }

    pub(crate) fn fatal(&self, err: Error) {
        self.halt(Some(err));
    }

    /// Enters the terminal state: resolve start (and shutdown) completions,
    /// cancel pending commit completions, wake the background tasks so they
    /// drop their in-flight work.
    fn halt(&self, failure: Option<Error>) -> OffsetPair {
        let (offsets, start_tx, shutdown_tx, waiters, daemon, commit_task, commit_timer) = {
            let mut state = self.inner.state.borrow_mut();

            if state.status == Status::Stopped {
                return state.offsets();
            }

            state.status = Status::Stopped;
            state.processor_busy = false;

            (state.offsets(),
             state.start_tx.take(),
             state.shutdown_tx.take(),
             mem::replace(&mut state.commit_waiters, Vec::new()),
             state.daemon.take(),
             state.commit_task.take(),
             state.commit_timer.take())
        };

        if let Some(tx) = start_tx {
            let _ = match failure {
                Some(err) => tx.send(Err(err)),
                None => tx.send(Ok(offsets)),
            };
        }

        // A shutdown interrupted by stop() or a fatal error still resolves,
        // reporting how far the consumer got.
        if let Some(tx) = shutdown_tx {
            let _ = tx.send(Ok(offsets));
        }

        // Dropping the senders cancels the pending commit completions.
        drop(waiters);

        if let Some(task) = daemon {
            task.notify();
        }

        if let Some(task) = commit_task {
            task.notify();
        }

        if let Some(task) = commit_timer {
            task.notify();
        }

        offsets
    }
}

impl<C: BrokerClient> fmt::Debug for Consumer<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let status = self.inner
            .state
            .try_borrow()
            .map(|state| state.status.name())
            .unwrap_or("busy");

        write!(f,
               "<Consumer [{}] topic={}, partition={}, processor={}>",
               status,
               self.inner.config.topic_name,
               self.inner.config.partition,
               self.inner.processor_repr)
    }
}

/// The consumer's main task: resolves the start position, then pumps the
/// fetch loop into the processor gate, dispatching in blocks and triggering
/// count-based automatic commits.
struct Daemon<C: BrokerClient> {
    consumer: Consumer<C>,
    phase: Phase<C>,
    gate: ProcessorGate,
    backlog: VecDeque<SourcedMessage>,
    block_size: Option<u32>,
    uncommitted: u32,
}

enum Phase<C: BrokerClient> {
    Resolving(ResolveOffset<C>),
    Fetching(Fetcher<C>),
}

enum Transition {
    Resolved(Offset, Option<Offset>),
    Acked(Offset, usize),
    Dispatch,
    Fetched(Vec<SourcedMessage>),
    Fatal(Error),
    Finished,
    Park,
}

impl<C: BrokerClient> Daemon<C> {
    fn new(consumer: Consumer<C>, position: StartPosition) -> Self {
        let resolve = ResolveOffset::new(consumer.clone(), position);
        let block_size = consumer.inner.config.auto_commit_message_count();

        Daemon {
            consumer: consumer,
            phase: Phase::Resolving(resolve),
            gate: ProcessorGate::new(),
            backlog: VecDeque::new(),
            block_size: block_size,
            uncommitted: 0,
        }
    }

    /// Records an acknowledged block and triggers the count-based automatic
    /// commit when the threshold is crossed. A trigger skipped because a
    /// commit is already in flight fires again on the next acknowledgement.
    fn record_ack(&mut self, offset: Offset, count: usize) {
        self.consumer.acknowledge(offset, count);

        if let Some(threshold) = self.block_size {
            self.uncommitted += count as u32;

            if self.uncommitted >= threshold {
                match commit::auto_commit(&self.consumer) {
                    Ok(true) => self.uncommitted = 0,
                    Ok(false) => {}
                    Err(err) => warn!("automatic commit failed to start: {}", err),
                }
            }
        }
    }

    /// Hands the next block of backlogged messages to the processor.
    fn dispatch_block(&mut self) {
        let take = self.block_size
            .map(|threshold| cmp::min(threshold as usize, self.backlog.len()))
            .unwrap_or_else(|| self.backlog.len());
        let block: Vec<SourcedMessage> = self.backlog.drain(..take).collect();

        self.consumer.inner.state.borrow_mut().processor_busy = true;

        let consumer = self.consumer.clone();

        self.gate
            .invoke(block, move |messages| consumer.invoke_processor(messages));

        // The processor may have called stop() or shutdown() on us from
        // inside the invocation; a processor completion returned after such
        // a call is cancelled rather than awaited.
        if self.consumer.status() != Status::Running {
            self.gate.cancel();
            self.consumer.inner.state.borrow_mut().processor_busy = false;
        }
    }
}

impl<C: BrokerClient> Future for Daemon<C> {
    type Item = ();
    type Error = ();

    fn poll(&mut self) -> Poll<(), ()> {
        self.consumer.register_daemon_task();

        loop {
            match self.consumer.status() {
                Status::Stopped => {
                    // Dropping the daemon cancels the in-flight fetch and
                    // processor invocation with it.
                    return Ok(Async::Ready(()));
                }
                Status::Stopping => {
                    match self.gate.poll_acknowledged() {
                        Ok(Async::Ready((offset, count))) => {
                            self.consumer.acknowledge(offset, count);

                            continue;
                        }
                        Ok(Async::NotReady) => {
                            if self.gate.is_idle() {
                                self.consumer.inner.state.borrow_mut().processor_busy = false;
                                self.consumer.poke_shutdown();

                                if self.consumer.status() == Status::Stopped {
                                    continue;
                                }
                            }

                            return Ok(Async::NotReady);
                        }
                        Err(err) => {
                            // The processor failed while a shutdown drains:
                            // the failure goes to start, the shutdown still
                            // resolves with the final offsets.
                            self.consumer.fatal(err);

                            continue;
                        }
                    }
                }
                Status::Initialized | Status::Running => {}
            }

            let transition = match self.phase {
                Phase::Resolving(ref mut resolve) => {
                    match resolve.poll() {
                        Ok(Async::NotReady) => return Ok(Async::NotReady),
                        Ok(Async::Ready((fetch_offset, committed))) => {
                            Transition::Resolved(fetch_offset, committed)
                        }
                        Err(err) => Transition::Fatal(err),
                    }
                }
                Phase::Fetching(ref mut fetcher) => {
                    match self.gate.poll_acknowledged() {
                        Ok(Async::Ready((offset, count))) => Transition::Acked(offset, count),
                        Err(err) => Transition::Fatal(err),
                        Ok(Async::NotReady) => {
                            if self.gate.is_idle() && !self.backlog.is_empty() {
                                Transition::Dispatch
                            } else if self.backlog.is_empty() {
                                // At most one fetched batch is buffered ahead
                                // of the processor; polling here pre-issues
                                // the next fetch as soon as the previous
                                // batch is handed over.
                                match fetcher.poll() {
                                    Ok(Async::Ready(Some(batch))) => Transition::Fetched(batch),
                                    Ok(Async::Ready(None)) => Transition::Finished,
                                    Ok(Async::NotReady) => Transition::Park,
                                    Err(err) => Transition::Fatal(err),
                                }
                            } else {
                                Transition::Park
                            }
                        }
                    }
                }
            };

            match transition {
                Transition::Resolved(fetch_offset, committed) => {
                    self.consumer.offsets_resolved(fetch_offset, committed);
                    self.phase = Phase::Fetching(Fetcher::new(self.consumer.clone(),
                                                              fetch_offset));
                }
                Transition::Acked(offset, count) => self.record_ack(offset, count),
                Transition::Dispatch => self.dispatch_block(),
                Transition::Fetched(batch) => self.backlog.extend(batch),
                Transition::Fatal(err) => self.consumer.fatal(err),
                Transition::Finished => return Ok(Async::Ready(())),
                Transition::Park => return Ok(Async::NotReady),
            }
        }
    }
}
