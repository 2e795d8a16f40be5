use crate::Value;
use futures_channel::oneshot;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Outcome of [`ShardedLRU::get_or_subscribe`](super::ShardedLRU::get_or_subscribe).
#[derive(Debug)]
pub enum Lookup {
    /// The cached reply.
    Hit(Value),
    /// A slot was reserved for the caller, who must fetch the reply from the
    /// server and hand it to `update`.
    Miss,
    /// Another caller already reserved the key and its reply is in flight.
    Pending(PendingValue),
}

/// Resolves to the reply another caller is fetching for the same key.
///
/// Resolves to `None` when the pending slot is dropped before its reply
/// arrives (evicted, expired, deleted or flushed); the caller should then go
/// to the server itself.
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct PendingValue {
    receiver: oneshot::Receiver<Value>,
}

impl PendingValue {
    pub(crate) fn new(receiver: oneshot::Receiver<Value>) -> Self {
        PendingValue { receiver }
    }
}

impl Future for PendingValue {
    type Output = Option<Value>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().receiver)
            .poll(cx)
            .map(Result::ok)
    }
}
