use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures::{Future, future};
use futures::future::Either;
use futures::unsync::oneshot;
use tokio_core::reactor::{Core, Handle};
use tokio_timer::{self, Timer};

use tokio_kafka_consumer::{BatchProcessor, BrokerClient, Consumer, Error, ErrorKind,
                           FetchRequest, FetchResponse, KAFKA_SUCCESS, Message, MessageSet,
                           Offset, OffsetCommitRequest, OffsetCommitResponse, OffsetFetchRequest,
                           OffsetFetchResponse, OffsetRequest, OffsetResponse, PartitionId,
                           Processing, Result, SendFetchRequest, SendOffsetCommitRequest,
                           SendOffsetFetchRequest, SendOffsetRequest, ShutdownConsumer,
                           SourcedMessage, StaticBoxFuture};

/// A reply a `MockBroker` hands out for one request.
enum Reply<T> {
    Now(Result<T>),
    Defer(oneshot::Receiver<Result<T>>),
}

struct Script<T> {
    replies: VecDeque<Reply<T>>,
}

impl<T: 'static> Script<T> {
    fn new() -> Self {
        Script { replies: VecDeque::new() }
    }

    fn push(&mut self, result: Result<T>) {
        self.replies.push_back(Reply::Now(result));
    }

    fn defer(&mut self) -> oneshot::Sender<Result<T>> {
        let (tx, rx) = oneshot::channel();

        self.replies.push_back(Reply::Defer(rx));

        tx
    }

    /// The next scripted reply; unscripted requests stay pending forever,
    /// like a broker that never answers.
    fn next(&mut self) -> StaticBoxFuture<T> {
        match self.replies.pop_front() {
            Some(Reply::Now(Ok(value))) => StaticBoxFuture::ok(value),
            Some(Reply::Now(Err(err))) => StaticBoxFuture::err(err),
            Some(Reply::Defer(rx)) => {
                StaticBoxFuture::new(rx.then(|received| match received {
                    Ok(result) => result,
                    Err(_) => Err(ErrorKind::Canceled("mock reply").into()),
                }))
            }
            None => StaticBoxFuture::new(future::empty()),
        }
    }
}

struct BrokerState {
    offset_requests: Vec<Vec<OffsetRequest>>,
    offset_fetch_requests: Vec<(String, Vec<OffsetFetchRequest>)>,
    fetch_requests: Vec<(Vec<FetchRequest>, i32, i32)>,
    commit_requests: Vec<(String, Vec<OffsetCommitRequest>)>,
    offset_replies: Script<Vec<OffsetResponse>>,
    offset_fetch_replies: Script<Vec<OffsetFetchResponse>>,
    fetch_replies: Script<Vec<FetchResponse>>,
    commit_replies: Script<Vec<OffsetCommitResponse>>,
}

/// A scripted in-memory stand-in for the broker client: records every
/// request and answers from per-operation reply queues.
#[derive(Clone)]
pub struct MockBroker {
    state: Rc<RefCell<BrokerState>>,
    handle: Handle,
    timer: Rc<Timer>,
}

impl MockBroker {
    pub fn new(handle: Handle) -> Self {
        let timer = tokio_timer::wheel()
            .tick_duration(Duration::from_millis(5))
            .num_slots(4096)
            .build();

        MockBroker {
            state: Rc::new(RefCell::new(BrokerState {
                                            offset_requests: Vec::new(),
                                            offset_fetch_requests: Vec::new(),
                                            fetch_requests: Vec::new(),
                                            commit_requests: Vec::new(),
                                            offset_replies: Script::new(),
                                            offset_fetch_replies: Script::new(),
                                            fetch_replies: Script::new(),
                                            commit_replies: Script::new(),
                                        })),
            handle: handle,
            timer: Rc::new(timer),
        }
    }

    pub fn offsets_reply(&self, result: Result<Vec<OffsetResponse>>) {
        self.state.borrow_mut().offset_replies.push(result);
    }

    pub fn offsets_defer(&self) -> oneshot::Sender<Result<Vec<OffsetResponse>>> {
        self.state.borrow_mut().offset_replies.defer()
    }

    pub fn offset_fetch_reply(&self, result: Result<Vec<OffsetFetchResponse>>) {
        self.state.borrow_mut().offset_fetch_replies.push(result);
    }

    pub fn fetch_reply(&self, result: Result<Vec<FetchResponse>>) {
        self.state.borrow_mut().fetch_replies.push(result);
    }

    pub fn fetch_defer(&self) -> oneshot::Sender<Result<Vec<FetchResponse>>> {
        self.state.borrow_mut().fetch_replies.defer()
    }

    pub fn commit_reply(&self, result: Result<Vec<OffsetCommitResponse>>) {
        self.state.borrow_mut().commit_replies.push(result);
    }

    pub fn commit_defer(&self) -> oneshot::Sender<Result<Vec<OffsetCommitResponse>>> {
        self.state.borrow_mut().commit_replies.defer()
    }

    pub fn offset_requests(&self) -> Vec<Vec<OffsetRequest>> {
        self.state.borrow().offset_requests.clone()
    }

    pub fn offset_fetch_requests(&self) -> Vec<(String, Vec<OffsetFetchRequest>)> {
        self.state.borrow().offset_fetch_requests.clone()
    }

    pub fn fetch_requests(&self) -> Vec<(Vec<FetchRequest>, i32, i32)> {
        self.state.borrow().fetch_requests.clone()
    }

    pub fn commit_requests(&self) -> Vec<(String, Vec<OffsetCommitRequest>)> {
        self.state.borrow().commit_requests.clone()
    }
}

impl BrokerClient for MockBroker {
    fn send_offset_request(&self, requests: Vec<OffsetRequest>) -> SendOffsetRequest {
        let mut state = self.state.borrow_mut();

        state.offset_requests.push(requests);
        state.offset_replies.next()
    }

    fn send_offset_fetch_request(&self,
                                 group: &str,
                                 requests: Vec<OffsetFetchRequest>)
                                 -> SendOffsetFetchRequest {
        let mut state = self.state.borrow_mut();

        state
            .offset_fetch_requests
            .push((group.to_owned(), requests));
        state.offset_fetch_replies.next()
    }

    fn send_fetch_request(&self,
                          requests: Vec<FetchRequest>,
                          max_wait_time: i32,
                          min_bytes: i32)
                          -> SendFetchRequest {
        let mut state = self.state.borrow_mut();

        state.fetch_requests.push((requests, max_wait_time, min_bytes));
        state.fetch_replies.next()
    }

    fn send_offset_commit_request(&self,
                                  group: &str,
                                  requests: Vec<OffsetCommitRequest>)
                                  -> SendOffsetCommitRequest {
        let mut state = self.state.borrow_mut();

        state.commit_requests.push((group.to_owned(), requests));
        state.commit_replies.next()
    }

    fn handle(&self) -> &Handle {
        &self.handle
    }

    fn timer(&self) -> Rc<Timer> {
        self.timer.clone()
    }
}

enum ProcessorReply {
    Resolve,
    Defer(oneshot::Receiver<Result<()>>),
}

struct ProcessorState {
    batches: Vec<Vec<SourcedMessage>>,
    replies: VecDeque<ProcessorReply>,
}

/// Records every delivered batch; completion of each invocation follows a
/// script, and unscripted invocations stay pending forever.
#[derive(Clone)]
pub struct RecordingProcessor {
    state: Rc<RefCell<ProcessorState>>,
}

impl RecordingProcessor {
    pub fn new() -> Self {
        RecordingProcessor {
            state: Rc::new(RefCell::new(ProcessorState {
                                            batches: Vec::new(),
                                            replies: VecDeque::new(),
                                        })),
        }
    }

    pub fn push_ok(&self) {
        self.state
            .borrow_mut()
            .replies
            .push_back(ProcessorReply::Resolve);
    }

    pub fn push_defer(&self) -> oneshot::Sender<Result<()>> {
        let (tx, rx) = oneshot::channel();

        self.state
            .borrow_mut()
            .replies
            .push_back(ProcessorReply::Defer(rx));

        tx
    }

    pub fn batches(&self) -> Vec<Vec<SourcedMessage>> {
        self.state.borrow().batches.clone()
    }
}

impl fmt::Debug for RecordingProcessor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RecordingProcessor")
    }
}

impl<C: BrokerClient> BatchProcessor<C> for RecordingProcessor {
    fn process(&mut self, _consumer: &Consumer<C>, messages: Vec<SourcedMessage>) -> Processing {
        let mut state = self.state.borrow_mut();

        state.batches.push(messages);

        match state.replies.pop_front() {
            Some(ProcessorReply::Resolve) => Processing::ok(()),
            Some(ProcessorReply::Defer(rx)) => {
                Processing::new(rx.then(|received| match received {
                    Ok(result) => result,
                    Err(_) => Err(ErrorKind::Canceled("processing").into()),
                }))
            }
            None => Processing::new(future::empty()),
        }
    }
}

/// Calls `stop()` on the consumer from inside the invocation and hands back
/// a completion that never resolves on its own.
#[derive(Debug)]
pub struct StopProcessor;

impl<C: BrokerClient> BatchProcessor<C> for StopProcessor {
    fn process(&mut self, consumer: &Consumer<C>, _messages: Vec<SourcedMessage>) -> Processing {
        consumer.stop().expect("stop from processor");

        Processing::new(future::empty())
    }
}

/// Calls `shutdown()` on the consumer from inside the invocation, parking
/// the returned completion where the test can reach it.
#[derive(Clone)]
pub struct ShutdownProcessor {
    pub shutdown: Rc<RefCell<Option<ShutdownConsumer>>>,
}

impl ShutdownProcessor {
    pub fn new() -> Self {
        ShutdownProcessor { shutdown: Rc::new(RefCell::new(None)) }
    }
}

impl fmt::Debug for ShutdownProcessor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ShutdownProcessor")
    }
}

impl<C: BrokerClient> BatchProcessor<C> for ShutdownProcessor {
    fn process(&mut self, consumer: &Consumer<C>, _messages: Vec<SourcedMessage>) -> Processing {
        *self.shutdown.borrow_mut() = Some(consumer.shutdown());

        Processing::new(future::empty())
    }
}

pub fn message(offset: Offset, value: &str) -> Message {
    Message {
        offset: offset,
        timestamp: None,
        key: None,
        value: Some(Bytes::from(value.as_bytes().to_vec())),
    }
}

pub fn messages(start: Offset, values: &[&str]) -> Vec<Message> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| message(start + i as Offset, value))
        .collect()
}

pub fn sourced(topic_name: &str, partition: PartitionId, msg: Message) -> SourcedMessage {
    SourcedMessage {
        topic_name: topic_name.to_owned(),
        partition: partition,
        offset: msg.offset,
        message: msg,
    }
}

pub fn fetch_ok(topic_name: &str,
                partition: PartitionId,
                highwater: Offset,
                msgs: Vec<Message>)
                -> FetchResponse {
    FetchResponse {
        topic_name: topic_name.to_owned(),
        partition: partition,
        error_code: KAFKA_SUCCESS,
        highwater_mark_offset: highwater,
        message_set: MessageSet::new(msgs),
    }
}

/// A fetch response whose only message was truncated by `max_bytes`.
pub fn fetch_partial(topic_name: &str, partition: PartitionId, highwater: Offset) -> FetchResponse {
    FetchResponse {
        topic_name: topic_name.to_owned(),
        partition: partition,
        error_code: KAFKA_SUCCESS,
        highwater_mark_offset: highwater,
        message_set: MessageSet {
            messages: Vec::new(),
            partial: true,
        },
    }
}

pub fn offsets_ok(topic_name: &str, partition: PartitionId, offsets: Vec<Offset>) -> Vec<OffsetResponse> {
    vec![OffsetResponse {
             topic_name: topic_name.to_owned(),
             partition: partition,
             error_code: KAFKA_SUCCESS,
             offsets: offsets,
         }]
}

pub fn offset_fetch_ok(topic_name: &str,
                       partition: PartitionId,
                       offset: Offset)
                       -> Vec<OffsetFetchResponse> {
    vec![OffsetFetchResponse {
             topic_name: topic_name.to_owned(),
             partition: partition,
             offset: offset,
             metadata: Some("METADATA".to_owned()),
             error_code: KAFKA_SUCCESS,
         }]
}

pub fn commit_ok(topic_name: &str, partition: PartitionId) -> Vec<OffsetCommitResponse> {
    vec![OffsetCommitResponse {
             topic_name: topic_name.to_owned(),
             partition: partition,
             error_code: KAFKA_SUCCESS,
         }]
}

pub fn commit_request(topic_name: &str,
                      partition: PartitionId,
                      offset: Offset)
                      -> OffsetCommitRequest {
    OffsetCommitRequest {
        topic_name: topic_name.to_owned(),
        partition: partition,
        offset: offset,
        timestamp: ::tokio_kafka_consumer::TIMESTAMP_INVALID,
        metadata: None,
    }
}

pub fn kafka_unavailable() -> Error {
    ErrorKind::KafkaUnavailable("no broker reachable".to_owned()).into()
}

/// Turns the reactor a few times so spawned tasks observe fresh state.
pub fn pump(core: &mut Core, times: usize) {
    for _ in 0..times {
        core.turn(Some(Duration::from_millis(0)));
    }
}

/// Keeps the reactor turning for roughly `ms` of wall-clock time, letting
/// timer-driven work (retries, periodic commits) fire.
pub fn pump_for(core: &mut Core, ms: u64) {
    let deadline = Instant::now() + Duration::from_millis(ms);

    while Instant::now() < deadline {
        core.turn(Some(Duration::from_millis(5)));
    }
}

/// Asserts that `future` does not resolve within `ms`, handing it back so
/// the test can keep waiting on it.
pub fn expect_pending<F>(core: &mut Core, timer: &Rc<Timer>, future: F, ms: u64) -> F
    where F: Future,
          F::Error: fmt::Debug
{
    match core.run(future.select2(timer.sleep(Duration::from_millis(ms)))) {
        Ok(Either::A(_)) => panic!("future resolved while expected to stay pending"),
        Err(Either::A((err, _))) => {
            panic!("future failed while expected to stay pending: {:?}", err)
        }
        Ok(Either::B((_, future))) |
        Err(Either::B((_, future))) => future,
    }
}
