//! Node kinds and the type-erased payloads that flow between them.

use std::any::Any;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::error::StepError;
use crate::eval::EvalCx;

/// Type-erased value carried by occurrences and latches.
///
/// Non-atomic reference counting: the engine is single-threaded and rounds
/// never run concurrently, so payload sharing is plain `Rc`.
pub type Payload = Rc<dyn Any>;

/// Box a value into a payload.
pub fn payload<T: 'static>(value: T) -> Payload {
    Rc::new(value)
}

/// Borrow the `T` inside a payload, if that is what it holds.
pub fn downcast<T: 'static>(payload: &Payload) -> Option<&T> {
    payload.downcast_ref()
}

/// Handle to a pulse node. Stays valid for the life of its network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PulseId(pub(crate) u32);

/// Handle to a latch node. Stays valid for the life of its network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LatchId(pub(crate) u32);

pub(crate) type PulseRule =
    Rc<dyn Fn(&mut EvalCx<'_>) -> Result<Option<Payload>, StepError>>;
pub(crate) type LatchRule = Rc<dyn Fn(&mut EvalCx<'_>) -> Result<Payload, StepError>>;
pub(crate) type CombineRule = Rc<dyn Fn(&Payload, &Payload) -> Result<Payload, StepError>>;

/// A discrete-occurrence node: either occurs with a payload or stays silent,
/// decided once per round.
pub(crate) struct PulseNode {
    pub name: &'static str,
    pub rule: PulseRule,
    /// Pulses this node reads, in declaration order. `EvalCx::parent_value`
    /// resolves through this list, so replacing an entry redirects the read.
    pub parents: SmallVec<[PulseId; 4]>,
    /// Pulses reading this one. Maintained for rewiring and introspection,
    /// never for ownership.
    pub dependents: SmallVec<[PulseId; 2]>,
}

impl PulseNode {
    pub fn new(name: &'static str, rule: PulseRule) -> Self {
        Self {
            name,
            rule,
            parents: SmallVec::new(),
            dependents: SmallVec::new(),
        }
    }
}

/// A time-varying cached node: a value available in every round.
pub(crate) struct LatchNode {
    pub name: &'static str,
    pub kind: LatchKind,
}

impl LatchNode {
    pub fn new(name: &'static str, kind: LatchKind) -> Self {
        Self { name, kind }
    }
}

pub(crate) enum LatchKind {
    /// Fixed value.
    Constant { value: Payload },
    /// Pull-combination of other latches, recomputed on first demand each
    /// round and memoized for the rest of it.
    Cached { rule: LatchRule },
    /// Occurrence-driven state. Writes queued during round N commit at its
    /// end and become visible in round N + 1.
    Accumulator { current: Payload },
}
