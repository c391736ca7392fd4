//! Graph construction.
//!
//! All topology changes go through a [`BuildCx`], whether at setup time via
//! [`Network::build`](crate::network::Network::build) or at commit time when
//! a round's deferred actions are applied.

use std::rc::Rc;

use crate::error::StepError;
use crate::eval::EvalCx;
use crate::input::Channel;
use crate::network::{Graph, Updater};
use crate::node::{LatchId, LatchKind, LatchNode, Payload, PulseId, PulseNode};

/// A graph mutation requested during a round, applied when it commits.
/// Edge replacements apply before build closures.
pub(crate) enum BuildAction {
    ChangeParent { child: PulseId, parent: PulseId },
    DependOn { child: PulseId, parent: PulseId },
    Build(Box<dyn FnOnce(&mut BuildCx<'_>)>),
}

/// Exclusive access to the graph for allocating nodes and wiring edges.
pub struct BuildCx<'a> {
    graph: &'a mut Graph,
}

impl<'a> BuildCx<'a> {
    pub(crate) fn new(graph: &'a mut Graph) -> Self {
        Self { graph }
    }

    /// A pulse that never occurs. Useful as an initial switch target.
    pub fn never(&mut self, name: &'static str) -> PulseId {
        self.new_pulse(name, |_: &mut EvalCx<'_>| Ok(None))
    }

    /// Allocate a pulse whose occurrence each round is decided by `rule`.
    pub fn new_pulse<R>(&mut self, name: &'static str, rule: R) -> PulseId
    where
        R: Fn(&mut EvalCx<'_>) -> Result<Option<Payload>, StepError> + 'static,
    {
        self.graph.alloc_pulse(PulseNode::new(name, Rc::new(rule)))
    }

    /// A pulse that occurs whenever the round's batch carries a value on
    /// `channel`.
    pub fn pulse_from_channel<T: 'static>(
        &mut self,
        name: &'static str,
        channel: &Channel<T>,
    ) -> PulseId {
        let id = channel.id();
        self.new_pulse(name, move |cx: &mut EvalCx<'_>| Ok(cx.input(id)))
    }

    /// Record that `child` reads `parent`. Adds `parent` to the child's
    /// parent list, which is what `parent_value` indexes into.
    pub fn depend_on(&mut self, child: PulseId, parent: PulseId) {
        self.graph.depend_on(child, parent);
    }

    /// Replace `child`'s entire parent list with the single `parent`,
    /// updating dependent lists on both sides.
    pub fn change_parent(&mut self, child: PulseId, parent: PulseId) {
        self.graph.change_parent(child, parent);
    }

    /// A latch that always answers with the same value.
    pub fn constant_latch(&mut self, name: &'static str, value: Payload) -> LatchId {
        self.graph
            .alloc_latch(LatchNode::new(name, LatchKind::Constant { value }))
    }

    /// A latch whose value is recomputed from other latches on first demand
    /// each round.
    pub fn cached_latch<R>(&mut self, name: &'static str, rule: R) -> LatchId
    where
        R: Fn(&mut EvalCx<'_>) -> Result<Payload, StepError> + 'static,
    {
        self.graph.alloc_latch(LatchNode::new(
            name,
            LatchKind::Cached { rule: Rc::new(rule) },
        ))
    }

    /// Allocate an accumulator latch holding `initial`.
    ///
    /// The id is handed out before the update step is registered, so rules
    /// wired through the returned [`LatchUpdater`] may read the latch they
    /// feed. That is what makes `count <- accumulate f count`-style
    /// recursion work: the read sees the previous round's value.
    pub fn new_latch(&mut self, name: &'static str, initial: Payload) -> (LatchId, LatchUpdater) {
        let latch = self.graph.alloc_latch(LatchNode::new(
            name,
            LatchKind::Accumulator { current: initial },
        ));
        (latch, LatchUpdater { latch })
    }
}

/// One-shot registration handle for an accumulator's update step.
#[derive(Debug)]
pub struct LatchUpdater {
    latch: LatchId,
}

impl LatchUpdater {
    /// Fold occurrences of `pulse` into the accumulator.
    ///
    /// Each round where `pulse` occurs, `combine(current, occurrence)`
    /// produces the next value. It is queued during the round and committed
    /// at its end, so readers in the same round still see the old value.
    pub fn update_on<F>(self, cx: &mut BuildCx<'_>, pulse: PulseId, combine: F)
    where
        F: Fn(&Payload, &Payload) -> Result<Payload, StepError> + 'static,
    {
        cx.graph.updaters.push(Updater {
            latch: self.latch,
            pulse,
            combine: Rc::new(combine),
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::network::Network;

    #[test]
    fn never_does_not_occur() {
        let mut network = Network::new();
        let silent = network.build(|cx| cx.never("silent"));
        let out = network.step(Vec::new(), silent).unwrap();
        assert!(out.is_none());
    }
}
