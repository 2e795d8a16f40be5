use crate::Value;
use futures_channel::oneshot;
use std::mem::size_of;
use std::time::{Duration, Instant};

/// Fixed bookkeeping cost of one entry: the entry itself, the owned key
/// header and the two recency links of the shard's list node.
pub const ENTRY_OVERHEAD: usize =
    size_of::<Entry>() + size_of::<Vec<u8>>() + 2 * size_of::<usize>();

/// Default minimum charge of an entry.
///
/// Small keys with small replies are all charged this much, which bounds the
/// number of entries a shard can hold to `budget / ENTRY_MIN_SIZE`.
pub const ENTRY_MIN_SIZE: usize = ENTRY_OVERHEAD + 2 * size_of::<Value>();

// Deadlines further out than this are clamped so `Instant` arithmetic cannot overflow.
pub(crate) const MAX_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

pub(crate) enum EntryState {
    /// Slot reserved by a miss, the reply is still in flight.
    Pending { waiters: Vec<oneshot::Sender<Value>> },
    Filled(Value),
}

/// Subscribers released by a fill, with the copy of the reply they are owed.
pub(crate) struct Waiters {
    senders: Vec<oneshot::Sender<Value>>,
    value: Option<Value>,
}

impl Waiters {
    /// Hands the reply to every subscriber. Call without holding the shard lock.
    pub(crate) fn notify(self) {
        let Some(value) = self.value else {
            return;
        };
        for sender in self.senders {
            // A dropped receiver just means the waiter lost interest.
            let _ = sender.send(value.clone());
        }
    }
}

/// Entry keeps the cached reply of one key together with its accounting cost
/// and the deadline fixed when its slot was reserved.
pub(crate) struct Entry {
    state: EntryState,
    size: usize,
    expire_time: Instant,
}

impl Entry {
    pub(crate) fn pending(key: &[u8], entry_min_size: usize, now: Instant, ttl: Duration) -> Self {
        Entry {
            state: EntryState::Pending {
                waiters: Vec::new(),
            },
            size: charged_size(key, None, entry_min_size),
            expire_time: now + ttl.min(MAX_TTL),
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    #[cfg(test)]
    pub(crate) fn expire_time(&self) -> Instant {
        self.expire_time
    }

    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        now >= self.expire_time
    }

    /// Returns the reply if the entry has been filled.
    pub(crate) fn value(&self) -> Option<&Value> {
        match &self.state {
            EntryState::Filled(value) => Some(value),
            EntryState::Pending { .. } => None,
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        matches!(self.state, EntryState::Pending { .. })
    }

    /// Registers interest in the reply of a pending entry.
    pub(crate) fn subscribe(&mut self) -> Option<oneshot::Receiver<Value>> {
        match &mut self.state {
            EntryState::Pending { waiters } => {
                let (sender, receiver) = oneshot::channel();
                waiters.push(sender);
                Some(receiver)
            }
            EntryState::Filled(_) => None,
        }
    }

    /// Moves a pending entry to filled, recomputing its size and pulling its
    /// deadline in to `server_expire_time` when that comes first.
    /// Returns the waiters to notify, or `None` when the entry was already filled.
    /// The reply is only copied when someone subscribed.
    pub(crate) fn fill(
        &mut self,
        key: &[u8],
        value: Value,
        entry_min_size: usize,
        server_expire_time: Option<Instant>,
    ) -> Option<Waiters> {
        let senders = match &mut self.state {
            EntryState::Pending { waiters } => std::mem::take(waiters),
            EntryState::Filled(_) => return None,
        };
        self.size = charged_size(key, Some(&value), entry_min_size);
        if let Some(server_expire_time) = server_expire_time {
            self.expire_time = self.expire_time.min(server_expire_time);
        }
        let shared = (!senders.is_empty()).then(|| value.clone());
        self.state = EntryState::Filled(value);
        Some(Waiters {
            senders,
            value: shared,
        })
    }
}

fn charged_size(key: &[u8], value: Option<&Value>, entry_min_size: usize) -> usize {
    let value_len = value.map_or(0, Value::encoded_len);
    entry_min_size.max(ENTRY_OVERHEAD + key.len() + value_len)
}
