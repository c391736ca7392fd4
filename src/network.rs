//! The network: node storage, round driving, and commit.

use crate::arena::Arena;
use crate::build::{BuildAction, BuildCx};
use crate::error::StepError;
use crate::eval::{EvalCx, RoundState};
use crate::input::{InputStore, InputValue};
use crate::monitor::GraphSnapshot;
use crate::node::{CombineRule, LatchId, LatchKind, LatchNode, Payload, PulseId, PulseNode};
use crate::tick::{Tick, TickCounter};

/// Node arenas plus registered update steps. Nodes are never freed, so ids
/// stay valid for the life of the network.
pub(crate) struct Graph {
    pub pulses: Arena<PulseNode>,
    pub latches: Arena<LatchNode>,
    pub updaters: Vec<Updater>,
}

impl Graph {
    pub fn new() -> Self {
        Self {
            pulses: Arena::new(),
            latches: Arena::new(),
            updaters: Vec::new(),
        }
    }

    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            pulses: Arena::with_capacity(nodes),
            latches: Arena::with_capacity(nodes),
            updaters: Vec::new(),
        }
    }

    pub fn alloc_pulse(&mut self, node: PulseNode) -> PulseId {
        PulseId(self.pulses.alloc(node))
    }

    pub fn alloc_latch(&mut self, node: LatchNode) -> LatchId {
        LatchId(self.latches.alloc(node))
    }

    pub fn pulse(&self, id: PulseId) -> &PulseNode {
        self.pulses.get(id.0)
    }

    pub fn latch(&self, id: LatchId) -> &LatchNode {
        self.latches.get(id.0)
    }

    fn pulse_mut(&mut self, id: PulseId) -> &mut PulseNode {
        self.pulses.get_mut(id.0)
    }

    fn latch_mut(&mut self, id: LatchId) -> &mut LatchNode {
        self.latches.get_mut(id.0)
    }

    /// Add a dependency edge. Both the parent list and the dependent list
    /// are kept duplicate-free.
    pub fn depend_on(&mut self, child: PulseId, parent: PulseId) {
        let parents = &mut self.pulse_mut(child).parents;
        if !parents.contains(&parent) {
            parents.push(parent);
        }
        let dependents = &mut self.pulse_mut(parent).dependents;
        if !dependents.contains(&child) {
            dependents.push(child);
        }
    }

    /// Replace `child`'s entire parent list with `parent`, unhooking the
    /// child from every old parent's dependent list. The child's own
    /// dependents are untouched.
    pub fn change_parent(&mut self, child: PulseId, parent: PulseId) {
        let old_parents = std::mem::take(&mut self.pulse_mut(child).parents);
        for old in old_parents {
            self.pulse_mut(old).dependents.retain(|d| *d != child);
        }
        self.pulse_mut(child).parents.push(parent);
        let dependents = &mut self.pulse_mut(parent).dependents;
        if !dependents.contains(&child) {
            dependents.push(child);
        }
    }

    /// Install a committed accumulator value.
    pub fn commit_latch(&mut self, latch: LatchId, value: Payload) {
        if let LatchKind::Accumulator { current } = &mut self.latch_mut(latch).kind {
            *current = value;
        }
    }
}

/// Registered update step: folds one pulse's occurrences into one
/// accumulator latch.
pub(crate) struct Updater {
    pub latch: LatchId,
    pub pulse: PulseId,
    pub combine: CombineRule,
}

/// A reactive network: the graph and its round counter.
pub struct Network {
    pub(crate) graph: Graph,
    ticks: TickCounter,
}

impl Network {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            ticks: TickCounter::new(),
        }
    }

    /// Pre-size the node arenas when the graph's rough size is known.
    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            graph: Graph::with_capacity(nodes),
            ticks: TickCounter::new(),
        }
    }

    /// Run setup-time construction against the graph.
    pub fn build<T>(&mut self, f: impl FnOnce(&mut BuildCx<'_>) -> T) -> T {
        let mut cx = BuildCx::new(&mut self.graph);
        f(&mut cx)
    }

    /// Run one round: inject `batch`, force every update step and the
    /// `output` pulse, then commit.
    ///
    /// On success the return value is `output`'s occurrence this round and
    /// the round counter advances. On failure everything the round did is
    /// discarded and the counter stays put, so the same inputs can be
    /// retried against unchanged state.
    pub fn step(
        &mut self,
        batch: Vec<InputValue>,
        output: PulseId,
    ) -> Result<Option<Payload>, StepError> {
        let tick = self.ticks.current().next();
        let mut inputs = InputStore::new();
        for input in batch {
            let (channel, payload) = input.into_parts();
            inputs.insert(channel, payload);
        }
        log::debug!("round {} begin: {} inputs", tick.0, inputs.len());
        let mut round = RoundState::new(tick, inputs);
        let value = match self.force_roots(&mut round, output) {
            Ok(value) => value,
            Err(err) => {
                log::debug!("round {} discarded: {err}", tick.0);
                return Err(err);
            }
        };
        self.commit(&mut round);
        self.ticks.advance();
        Ok(value)
    }

    /// Read a latch between rounds, answering as of the latest commit.
    /// Cached latch rules run against an empty batch here.
    pub fn latch_value(&self, latch: LatchId) -> Result<Payload, StepError> {
        let mut round = RoundState::new(self.ticks.current(), InputStore::new());
        let mut cx = EvalCx {
            graph: &self.graph,
            round: &mut round,
        };
        cx.latch_value(latch)
    }

    /// How many rounds have committed so far.
    pub fn rounds(&self) -> Tick {
        self.ticks.current()
    }

    /// Capture the current topology for host-side inspection.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::capture(self)
    }

    /// Demand entry points for a round: every registered update step in
    /// registration order, then the requested output pulse.
    fn force_roots(
        &self,
        round: &mut RoundState,
        output: PulseId,
    ) -> Result<Option<Payload>, StepError> {
        for updater in &self.graph.updaters {
            let mut cx = EvalCx {
                graph: &self.graph,
                round: &mut *round,
            };
            if let Some(occurrence) = cx.pulse_value(updater.pulse)? {
                let current = cx.latch_value(updater.latch)?;
                let next = (*updater.combine)(&current, &occurrence)?;
                cx.round.latch_writes.push((updater.latch, next));
            }
        }
        let mut cx = EvalCx {
            graph: &self.graph,
            round,
        };
        cx.pulse_value(output)
    }

    /// Apply what the round queued: edge replacements first, then build
    /// closures, then accumulator writes.
    fn commit(&mut self, round: &mut RoundState) {
        let actions = std::mem::take(&mut round.queue);
        let (edges, builds): (Vec<_>, Vec<_>) = actions
            .into_iter()
            .partition(|action| !matches!(action, BuildAction::Build(_)));
        let total = edges.len() + builds.len();
        for action in edges {
            match action {
                BuildAction::ChangeParent { child, parent } => {
                    self.graph.change_parent(child, parent);
                }
                BuildAction::DependOn { child, parent } => {
                    self.graph.depend_on(child, parent);
                }
                BuildAction::Build(_) => {}
            }
        }
        if !builds.is_empty() {
            let mut cx = BuildCx::new(&mut self.graph);
            for action in builds {
                if let BuildAction::Build(build) = action {
                    build(&mut cx);
                }
            }
        }
        let writes = std::mem::take(&mut round.latch_writes);
        let committed = writes.len();
        for (latch, value) in writes {
            self.graph.commit_latch(latch, value);
        }
        log::debug!(
            "round {} commit: {} build actions, {} latch writes",
            round.tick.0,
            total,
            committed
        );
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{downcast, payload};

    #[test]
    fn constant_latch_reads_between_rounds() {
        let mut network = Network::new();
        let limit = network.build(|cx| cx.constant_latch("limit", payload(99i64)));
        let value = network.latch_value(limit).unwrap();
        assert_eq!(downcast::<i64>(&value), Some(&99));
    }

    #[test]
    fn ticks_advance_only_on_commit() {
        let mut network = Network::new();
        let (ok, broken) = network.build(|cx| {
            let ok = cx.never("ok");
            let broken =
                cx.new_pulse("broken", |_: &mut EvalCx<'_>| Err(StepError::effect("boom")));
            (ok, broken)
        });

        assert_eq!(network.rounds(), Tick(0));
        network.step(Vec::new(), ok).unwrap();
        assert_eq!(network.rounds(), Tick(1));
        assert!(network.step(Vec::new(), broken).is_err());
        assert_eq!(network.rounds(), Tick(1));
    }
}
