//! Topology snapshots for host-side monitors and tooling.

use serde::Serialize;

use crate::network::Network;
use crate::node::LatchKind;

/// Frozen view of a network's wiring at one point in time. Ids match the
/// handles the build API returned, so hosts can correlate.
#[derive(Debug, Clone, Serialize)]
pub struct GraphSnapshot {
    pub round: u64,
    pub pulses: Vec<PulseSnapshot>,
    pub latches: Vec<LatchSnapshot>,
    pub updaters: Vec<UpdaterSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PulseSnapshot {
    pub id: u32,
    pub name: &'static str,
    pub parents: Vec<u32>,
    pub dependents: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatchSnapshot {
    pub id: u32,
    pub name: &'static str,
    pub kind: LatchKindLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LatchKindLabel {
    Constant,
    Cached,
    Accumulator,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct UpdaterSnapshot {
    pub latch: u32,
    pub pulse: u32,
}

impl GraphSnapshot {
    pub(crate) fn capture(network: &Network) -> Self {
        let graph = &network.graph;
        let pulses = graph
            .pulses
            .iter()
            .map(|(id, node)| PulseSnapshot {
                id,
                name: node.name,
                parents: node.parents.iter().map(|p| p.0).collect(),
                dependents: node.dependents.iter().map(|d| d.0).collect(),
            })
            .collect();
        let latches = graph
            .latches
            .iter()
            .map(|(id, node)| LatchSnapshot {
                id,
                name: node.name,
                kind: match &node.kind {
                    LatchKind::Constant { .. } => LatchKindLabel::Constant,
                    LatchKind::Cached { .. } => LatchKindLabel::Cached,
                    LatchKind::Accumulator { .. } => LatchKindLabel::Accumulator,
                },
            })
            .collect();
        let updaters = graph
            .updaters
            .iter()
            .map(|u| UpdaterSnapshot {
                latch: u.latch.0,
                pulse: u.pulse.0,
            })
            .collect();
        Self {
            round: network.rounds().0,
            pulses,
            latches,
            updaters,
        }
    }

    /// Render the snapshot as JSON.
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::EvalCx;
    use crate::network::Network;
    use crate::node::payload;

    fn sample_network() -> Network {
        let mut network = Network::new();
        network.build(|cx| {
            let source = cx.never("source");
            let relay = cx.new_pulse("relay", |cx: &mut EvalCx<'_>| cx.parent_value(0));
            cx.depend_on(relay, source);
            let (_, updater) = cx.new_latch("counter", payload(0i64));
            updater.update_on(cx, relay, |current, _occurrence| Ok(current.clone()));
            cx.constant_latch("limit", payload(10i64));
        });
        network
    }

    #[test]
    fn snapshot_captures_topology() {
        let network = sample_network();
        let snapshot = network.snapshot();

        assert_eq!(snapshot.round, 0);
        assert_eq!(snapshot.pulses.len(), 2);
        assert_eq!(snapshot.latches.len(), 2);
        assert_eq!(snapshot.updaters.len(), 1);

        let source = snapshot.pulses.iter().find(|p| p.name == "source").unwrap();
        let relay = snapshot.pulses.iter().find(|p| p.name == "relay").unwrap();
        assert_eq!(relay.parents, vec![source.id]);
        assert_eq!(source.dependents, vec![relay.id]);

        let kinds: Vec<_> = snapshot.latches.iter().map(|l| l.kind).collect();
        assert!(kinds.contains(&LatchKindLabel::Accumulator));
        assert!(kinds.contains(&LatchKindLabel::Constant));
    }

    #[cfg(feature = "json")]
    #[test]
    fn snapshot_renders_json() {
        let network = sample_network();
        let json = network.snapshot().to_json().unwrap();
        assert!(json.contains("\"relay\""));
        assert!(json.contains("\"pulses\""));
    }
}
