//! Round evaluation: demand-driven forcing with per-round memoization.
//!
//! A round owns a [`RoundState`]. Rules run inside an [`EvalCx`], which
//! reads the graph, pulls parent values on demand, and queues deferred
//! mutations. Everything a round accumulates lives in the state, so a
//! failed round is rolled back by dropping it.

use rustc_hash::FxHashMap;

use crate::build::{BuildAction, BuildCx};
use crate::error::StepError;
use crate::input::{ChannelId, InputStore};
use crate::network::Graph;
use crate::node::{LatchId, LatchKind, Payload, PulseId};
use crate::tick::Tick;

/// Everything one round accumulates before commit.
///
/// Dropped wholesale when a rule fails, which is what makes a failed step
/// atomic: the graph, the accumulators, and the round counter stay exactly
/// as they were.
pub(crate) struct RoundState {
    pub tick: Tick,
    pub inputs: InputStore,
    pub cache: RoundCache,
    /// Deferred graph mutations, applied at commit.
    pub queue: Vec<BuildAction>,
    /// Accumulator values to install at commit, in arrival order.
    pub latch_writes: Vec<(LatchId, Payload)>,
    /// Stack of pulses currently being forced. The top entry is the pulse
    /// whose rule is running, which is what `parent_value` resolves against.
    pub forcing: Vec<PulseId>,
}

impl RoundState {
    pub fn new(tick: Tick, inputs: InputStore) -> Self {
        Self {
            tick,
            inputs,
            cache: RoundCache::new(),
            queue: Vec::new(),
            latch_writes: Vec::new(),
            forcing: Vec::new(),
        }
    }
}

enum PulseMemo {
    InProgress,
    Done(Option<Payload>),
}

enum LatchMemo {
    InProgress,
    Done(Payload),
}

/// Per-round memo table. A node is computed at most once per round; the
/// `InProgress` marker catches rules that demand their own value.
#[derive(Default)]
pub(crate) struct RoundCache {
    pulses: FxHashMap<PulseId, PulseMemo>,
    latches: FxHashMap<LatchId, LatchMemo>,
}

impl RoundCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn pulse_memo(&self, pulse: PulseId) -> Option<&PulseMemo> {
        self.pulses.get(&pulse)
    }

    fn begin_pulse(&mut self, pulse: PulseId) {
        self.pulses.insert(pulse, PulseMemo::InProgress);
    }

    fn finish_pulse(&mut self, pulse: PulseId, value: Option<Payload>) {
        self.pulses.insert(pulse, PulseMemo::Done(value));
    }

    fn latch_memo(&self, latch: LatchId) -> Option<&LatchMemo> {
        self.latches.get(&latch)
    }

    fn begin_latch(&mut self, latch: LatchId) {
        self.latches.insert(latch, LatchMemo::InProgress);
    }

    fn finish_latch(&mut self, latch: LatchId, value: Payload) {
        self.latches.insert(latch, LatchMemo::Done(value));
    }
}

/// What a rule sees while it runs.
///
/// The graph is read-only during a round; mutations go through the
/// `defer_*` methods and land when the round commits.
pub struct EvalCx<'a> {
    pub(crate) graph: &'a Graph,
    pub(crate) round: &'a mut RoundState,
}

impl EvalCx<'_> {
    /// Number of the round currently evaluating.
    pub fn round(&self) -> Tick {
        self.round.tick
    }

    /// The value this round's batch carried on `channel`, if any.
    pub fn input(&self, channel: ChannelId) -> Option<Payload> {
        self.round.inputs.get(channel).cloned()
    }

    /// Force a pulse and report its occurrence this round.
    ///
    /// The first demand in a round runs the pulse's rule; later demands
    /// replay the memoized outcome, so shared parents evaluate once no
    /// matter how many dependents pull on them.
    pub fn pulse_value(&mut self, pulse: PulseId) -> Result<Option<Payload>, StepError> {
        match self.round.cache.pulse_memo(pulse) {
            Some(PulseMemo::Done(value)) => return Ok(value.clone()),
            Some(PulseMemo::InProgress) => {
                return Err(StepError::IllFounded {
                    name: self.graph.pulse(pulse).name,
                });
            }
            None => {}
        }
        let node = self.graph.pulse(pulse);
        let name = node.name;
        let rule = node.rule.clone();
        log::trace!("round {}: force pulse `{name}`", self.round.tick.0);
        self.round.cache.begin_pulse(pulse);
        self.round.forcing.push(pulse);
        let outcome = (*rule)(&mut *self);
        self.round.forcing.pop();
        let value = outcome?;
        self.round.cache.finish_pulse(pulse, value.clone());
        Ok(value)
    }

    /// Read a latch's value for this round.
    ///
    /// Constants and accumulators answer from stored state; an accumulator
    /// reports the value committed at the end of the previous round even if
    /// an update for it is already queued. Cached latches run their rule on
    /// first demand and memoize for the rest of the round.
    pub fn latch_value(&mut self, latch: LatchId) -> Result<Payload, StepError> {
        match self.round.cache.latch_memo(latch) {
            Some(LatchMemo::Done(value)) => return Ok(value.clone()),
            Some(LatchMemo::InProgress) => {
                return Err(StepError::IllFounded {
                    name: self.graph.latch(latch).name,
                });
            }
            None => {}
        }
        let value = match &self.graph.latch(latch).kind {
            LatchKind::Constant { value } => value.clone(),
            LatchKind::Accumulator { current } => current.clone(),
            LatchKind::Cached { rule } => {
                let rule = rule.clone();
                self.round.cache.begin_latch(latch);
                (*rule)(&mut *self)?
            }
        };
        self.round.cache.finish_latch(latch, value.clone());
        Ok(value)
    }

    /// Force the running pulse's parent at `index` in its parent list.
    ///
    /// The edge is looked up at call time, so a committed `change_parent`
    /// redirects this read from the next round on. Returns no occurrence
    /// when the slot is empty or no pulse is being forced.
    pub fn parent_value(&mut self, index: usize) -> Result<Option<Payload>, StepError> {
        let Some(me) = self.round.forcing.last().copied() else {
            return Ok(None);
        };
        let Some(parent) = self.graph.pulse(me).parents.get(index).copied() else {
            return Ok(None);
        };
        self.pulse_value(parent)
    }

    /// Queue replacement of `child`'s parents with the single `parent`.
    /// Applied at commit, visible from the next round.
    pub fn defer_change_parent(&mut self, child: PulseId, parent: PulseId) {
        self.round
            .queue
            .push(BuildAction::ChangeParent { child, parent });
    }

    /// Queue an extra dependency edge. Applied at commit.
    pub fn defer_depend_on(&mut self, child: PulseId, parent: PulseId) {
        self.round
            .queue
            .push(BuildAction::DependOn { child, parent });
    }

    /// Queue arbitrary graph construction to run at commit, after any
    /// queued edge changes.
    ///
    /// Nodes created this way must not be demanded before the next round;
    /// forcing one in the round that created it is a caller bug the engine
    /// does not detect.
    pub fn defer_build(&mut self, build: impl FnOnce(&mut BuildCx<'_>) + 'static) {
        self.round.queue.push(BuildAction::Build(Box::new(build)));
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::input::Channel;
    use crate::network::Network;
    use crate::node::{downcast, payload};

    fn shift(
        cx: &mut EvalCx<'_>,
        source: PulseId,
        delta: i64,
    ) -> Result<Option<Payload>, StepError> {
        Ok(cx
            .pulse_value(source)?
            .and_then(|p| downcast::<i64>(&p).map(|n| payload(n + delta))))
    }

    #[test]
    fn diamond_forces_shared_parent_once() {
        let mut network = Network::new();
        let numbers: Channel<i64> = Channel::new();
        let evals = Rc::new(Cell::new(0u32));

        let join = network.build(|cx| {
            let count = evals.clone();
            let id = numbers.id();
            let top = cx.new_pulse("top", move |cx: &mut EvalCx<'_>| {
                count.set(count.get() + 1);
                Ok(cx.input(id))
            });
            let left = cx.new_pulse("left", move |cx: &mut EvalCx<'_>| shift(cx, top, 1));
            let right = cx.new_pulse("right", move |cx: &mut EvalCx<'_>| shift(cx, top, 2));
            cx.new_pulse("join", move |cx: &mut EvalCx<'_>| {
                let a = cx.pulse_value(left)?.and_then(|p| downcast::<i64>(&p).copied());
                let b = cx.pulse_value(right)?.and_then(|p| downcast::<i64>(&p).copied());
                Ok(match (a, b) {
                    (Some(a), Some(b)) => Some(payload(a + b)),
                    _ => None,
                })
            })
        });

        let out = network.step(vec![numbers.encode(10)], join).unwrap().unwrap();
        assert_eq!(downcast::<i64>(&out), Some(&23));
        assert_eq!(evals.get(), 1);

        network.step(vec![numbers.encode(1)], join).unwrap();
        assert_eq!(evals.get(), 2);
    }

    #[test]
    fn direct_self_demand_errors() {
        let mut network = Network::new();
        let slot: Rc<Cell<Option<PulseId>>> = Rc::new(Cell::new(None));

        let looped = network.build(|cx| {
            let seen = slot.clone();
            cx.new_pulse("looped", move |cx: &mut EvalCx<'_>| match seen.get() {
                Some(me) => cx.pulse_value(me),
                None => Ok(None),
            })
        });
        slot.set(Some(looped));

        let result = network.step(Vec::new(), looped);
        assert!(matches!(
            result,
            Err(StepError::IllFounded { name: "looped" })
        ));
    }

    #[test]
    fn self_referential_latch_errors() {
        let mut network = Network::new();
        let slot: Rc<Cell<Option<LatchId>>> = Rc::new(Cell::new(None));

        let echo = network.build(|cx| {
            let seen = slot.clone();
            cx.cached_latch("echo", move |cx: &mut EvalCx<'_>| match seen.get() {
                Some(me) => cx.latch_value(me),
                None => Ok(payload(0i64)),
            })
        });
        slot.set(Some(echo));

        let result = network.latch_value(echo);
        assert!(matches!(result, Err(StepError::IllFounded { name: "echo" })));
    }
}
