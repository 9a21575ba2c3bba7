use std::fmt;

use futures::{Async, Future, Poll};

use errors::Error;
use client::{BrokerClient, StaticBoxFuture};
use protocol::{Offset, SourcedMessage};
use consumer::Consumer;

/// The completion handle returned by a processor invocation.
pub type Processing = StaticBoxFuture<()>;

/// User-supplied handler for fetched message batches.
///
/// Batches arrive non-empty and in strictly increasing offset order. The
/// returned completion resolves when the batch may be considered processed;
/// failing it terminates the consumer. The handle must tolerate being
/// dropped before resolution, which is how `stop()` cancels processing.
///
/// The processor receives the consumer it runs under and may call `stop()`,
/// `shutdown()` or `commit()` on it; such calls take effect once control
/// returns to the reactor.
pub trait BatchProcessor<C: BrokerClient>: fmt::Debug {
    fn process(&mut self, consumer: &Consumer<C>, messages: Vec<SourcedMessage>) -> Processing;
}

/// Serializes processor invocations: at most one runs at any time.
pub struct ProcessorGate {
    in_flight: Option<InFlight>,
}

struct InFlight {
    processing: Processing,
    last_offset: Offset,
    count: usize,
}

impl ProcessorGate {
    pub fn new() -> Self {
        ProcessorGate { in_flight: None }
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none()
    }

    /// Runs `invoke` on the block and tracks the returned completion.
    ///
    /// An empty block resolves immediately without touching the processor,
    /// and a block offered while an invocation is still running is dropped;
    /// the caller redispatches it once the gate is idle again.
    pub fn invoke<F>(&mut self, messages: Vec<SourcedMessage>, invoke: F)
        where F: FnOnce(Vec<SourcedMessage>) -> Processing
    {
        if messages.is_empty() {
            trace!("empty message block, nothing to process");
            return;
        }

        if self.in_flight.is_some() {
            debug!("processor invocation still outstanding, block deferred");
            return;
        }

        let last_offset = messages[messages.len() - 1].offset;
        let count = messages.len();

        self.in_flight = Some(InFlight {
                                  processing: invoke(messages),
                                  last_offset: last_offset,
                                  count: count,
                              });
    }

    /// Completion of the current invocation: `(last offset, message count)`
    /// of the acknowledged block. Not ready while the processor is still
    /// running or the gate is idle.
    pub fn poll_acknowledged(&mut self) -> Poll<(Offset, usize), Error> {
        match self.in_flight.take() {
            Some(mut in_flight) => {
                match in_flight.processing.poll() {
                    Ok(Async::Ready(())) => {
                        Ok(Async::Ready((in_flight.last_offset, in_flight.count)))
                    }
                    Ok(Async::NotReady) => {
                        self.in_flight = Some(in_flight);

                        Ok(Async::NotReady)
                    }
                    Err(err) => Err(err),
                }
            }
            None => Ok(Async::NotReady),
        }
    }

    /// Drops the in-flight completion, cancelling the invocation.
    pub fn cancel(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            trace!("cancelling processor invocation for block ending at offset {}",
                   in_flight.last_offset);
        }
    }
}
