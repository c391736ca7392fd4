//! Round-based push-pull reactive dataflow.
//!
//! A network is a graph of two node kinds. Pulses carry discrete
//! occurrences: in any given round a pulse either occurs with a payload or
//! stays silent. Latches carry values that are available in every round.
//! Hosts drive the network one round at a time by injecting a batch of
//! external inputs and asking for one output pulse; evaluation pulls
//! through the graph on demand, running each node's rule at most once per
//! round.
//!
//! State changes are transactional. Accumulator updates and graph rewiring
//! requested during a round are queued and applied only when the round
//! commits, so a failed round leaves the network exactly as it was.
//!
//! ```
//! use eventide::{downcast, payload, Automaton, Channel, EvalCx};
//!
//! let clicks: Channel<i64> = Channel::new();
//! let mut automaton = Automaton::new(|cx| {
//!     let source = cx.pulse_from_channel("clicks", &clicks);
//!     let doubled = cx.new_pulse("doubled", move |cx: &mut EvalCx<'_>| {
//!         Ok(cx
//!             .pulse_value(source)?
//!             .and_then(|p| downcast::<i64>(&p).map(|n| payload(n * 2))))
//!     });
//!     cx.depend_on(doubled, source);
//!     Ok(doubled)
//! })?;
//!
//! let out = automaton.step(vec![clicks.encode(21)])?;
//! assert_eq!(out.as_ref().and_then(downcast::<i64>), Some(&42));
//! # Ok::<(), eventide::StepError>(())
//! ```

pub mod arena;
pub mod automaton;
pub mod build;
pub mod error;
pub mod eval;
pub mod input;
pub mod monitor;
pub mod network;
pub mod node;
pub mod tick;

pub use automaton::{interpret, Automaton};
pub use build::{BuildCx, LatchUpdater};
pub use error::StepError;
pub use eval::EvalCx;
pub use input::{Channel, ChannelId, InputStore, InputValue};
pub use monitor::{
    GraphSnapshot, LatchKindLabel, LatchSnapshot, PulseSnapshot, UpdaterSnapshot,
};
pub use network::Network;
pub use node::{downcast, payload, LatchId, Payload, PulseId};
pub use tick::Tick;
