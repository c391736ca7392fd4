//! External input channels and the per-round input store.
//!
//! Hosts allocate a [`Channel`] per kind of external event, encode values
//! into [`InputValue`]s, and hand batches of those to the network. Inside a
//! round, source pulses read the store by channel id.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;

use crate::node::Payload;

static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of an input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(u64);

impl ChannelId {
    fn fresh() -> Self {
        Self(NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Typed handle for injecting external values of type `T`.
///
/// A channel is just an id plus a phantom type; copying one copies the
/// identity, so clones of a channel feed the same source pulses.
pub struct Channel<T> {
    id: ChannelId,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> Channel<T> {
    pub fn new() -> Self {
        Self {
            id: ChannelId::fresh(),
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Wrap a value for injection into a round.
    pub fn encode(&self, value: T) -> InputValue {
        InputValue {
            channel: self.id,
            payload: Rc::new(value),
        }
    }

    /// Read a value back out, if it came from this channel.
    pub fn decode<'a>(&self, input: &'a InputValue) -> Option<&'a T> {
        if input.channel == self.id {
            input.payload.downcast_ref()
        } else {
            None
        }
    }
}

impl<T: 'static> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Derived Clone/Copy would demand T: Clone even though no T is stored.
impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Channel<T> {}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Channel").field(&self.id).finish()
    }
}

/// One externally injected value, tagged with its channel.
#[derive(Clone)]
pub struct InputValue {
    channel: ChannelId,
    payload: Rc<dyn Any>,
}

impl InputValue {
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub(crate) fn into_parts(self) -> (ChannelId, Payload) {
        (self.channel, self.payload)
    }
}

impl fmt::Debug for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputValue")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

/// The channel values visible during one round.
#[derive(Default)]
pub struct InputStore {
    cells: FxHashMap<ChannelId, Payload>,
}

impl InputStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value for a channel. When a batch names the same channel
    /// twice, the later entry replaces the earlier one.
    pub fn insert(&mut self, channel: ChannelId, payload: Payload) {
        self.cells.insert(channel, payload);
    }

    pub fn get(&self, channel: ChannelId) -> Option<&Payload> {
        self.cells.get(&channel)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
