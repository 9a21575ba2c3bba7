use std::rc::Rc;

use futures::{IntoFuture, Poll};
use futures::future::{self, Future};
use tokio_core::reactor::Handle;
use tokio_timer::Timer;

use errors::Error;
use protocol::{FetchRequest, FetchResponse, OffsetCommitRequest, OffsetCommitResponse,
               OffsetFetchRequest, OffsetFetchResponse, OffsetRequest, OffsetResponse};

/// A trait for the broker-facing side of a partition consumer.
///
/// Implementations own connections, metadata and the wire codec; the consumer
/// only funnels one request of each kind at a time through this interface and
/// classifies the failures it gets back. Every operation returns a completion
/// handle that resolves with the per-partition response entries.
pub trait BrokerClient: 'static {
    /// Look up log offsets by symbolic time for the given partitions.
    fn send_offset_request(&self, requests: Vec<OffsetRequest>) -> SendOffsetRequest;

    /// Fetch the offsets committed under a consumer group.
    fn send_offset_fetch_request(&self,
                                 group: &str,
                                 requests: Vec<OffsetFetchRequest>)
                                 -> SendOffsetFetchRequest;

    /// Fetch messages, long-polling up to `max_wait_time` milliseconds until
    /// at least `min_bytes` of data is available.
    fn send_fetch_request(&self,
                          requests: Vec<FetchRequest>,
                          max_wait_time: i32,
                          min_bytes: i32)
                          -> SendFetchRequest;

    /// Record offsets under a consumer group.
    fn send_offset_commit_request(&self,
                                  group: &str,
                                  requests: Vec<OffsetCommitRequest>)
                                  -> SendOffsetCommitRequest;

    /// The reactor handle the consumer schedules its work on.
    fn handle(&self) -> &Handle;

    /// The timer used for retry backoff and periodic commits.
    fn timer(&self) -> Rc<Timer>;
}

/// The future of an offset lookup.
pub type SendOffsetRequest = StaticBoxFuture<Vec<OffsetResponse>>;

/// The future of a committed-offset fetch.
pub type SendOffsetFetchRequest = StaticBoxFuture<Vec<OffsetFetchResponse>>;

/// The future of a message fetch.
pub type SendFetchRequest = StaticBoxFuture<Vec<FetchResponse>>;

/// The future of an offset commit.
pub type SendOffsetCommitRequest = StaticBoxFuture<Vec<OffsetCommitResponse>>;

/// A boxed completion handle, the unit of async composition in this crate.
pub struct StaticBoxFuture<T = (), E = Error>(Box<Future<Item = T, Error = E> + 'static>)
    where T: 'static,
          E: 'static;

impl<T, E> StaticBoxFuture<T, E> {
    pub fn new<F>(inner: F) -> Self
        where F: IntoFuture<Item = T, Error = E>,
              F::Future: 'static,
              T: 'static,
              E: 'static
    {
        StaticBoxFuture(Box::new(inner.into_future()))
    }

    pub fn ok(item: T) -> Self {
        StaticBoxFuture(Box::new(future::ok(item)))
    }

    pub fn err(err: E) -> Self {
        StaticBoxFuture(Box::new(future::err(err)))
    }
}

impl<T, E> From<::errors::ErrorKind> for StaticBoxFuture<T, E>
    where E: From<::errors::ErrorKind>
{
    fn from(err: ::errors::ErrorKind) -> Self {
        Self::err(err.into())
    }
}

impl<T, E> Future for StaticBoxFuture<T, E> {
    type Item = T;
    type Error = E;

    fn poll(&mut self) -> Poll<Self::Item, Self::Error> {
        self.0.poll()
    }
}

pub trait ToStaticBoxFuture<T, E> {
    fn static_boxed(self) -> StaticBoxFuture<T, E>;
}

impl<F, T, E> ToStaticBoxFuture<T, E> for F
    where F: IntoFuture<Item = T, Error = E>,
          F::Future: 'static,
          T: 'static,
          E: 'static
{
    fn static_boxed(self) -> StaticBoxFuture<T, E> {
        StaticBoxFuture::new(self)
    }
}
