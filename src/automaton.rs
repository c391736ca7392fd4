//! Single-output drivers: an owned network stepped toward one designated
//! pulse, and a scripted harness for exercising graphs round by round.

use crate::build::BuildCx;
use crate::error::StepError;
use crate::input::{Channel, InputValue};
use crate::network::Network;
use crate::node::{downcast, Payload, PulseId};

/// A network bundled with its designated output pulse.
pub struct Automaton {
    network: Network,
    output: PulseId,
}

impl Automaton {
    /// Build a fresh network and designate the pulse `build` returns as its
    /// output.
    pub fn new(
        build: impl FnOnce(&mut BuildCx<'_>) -> Result<PulseId, StepError>,
    ) -> Result<Self, StepError> {
        let mut network = Network::new();
        let output = network.build(build)?;
        Ok(Self { network, output })
    }

    /// Run one round over `batch`, reporting the output's occurrence.
    pub fn step(&mut self, batch: Vec<InputValue>) -> Result<Option<Payload>, StepError> {
        self.network.step(batch, self.output)
    }

    /// The underlying network, for latch reads and snapshots between rounds.
    pub fn network(&self) -> &Network {
        &self.network
    }
}

/// Run a build function over a scripted series of rounds.
///
/// Each entry of `inputs` drives one round: `Some(value)` injects it on the
/// harness channel, `None` runs the round with an empty batch. The result
/// collects the output pulse's occurrence per round, downcast to `O`.
/// Occurrences holding some other type are reported as absent.
pub fn interpret<I, O>(
    build: impl FnOnce(&mut BuildCx<'_>, &Channel<I>) -> Result<PulseId, StepError>,
    inputs: Vec<Option<I>>,
) -> Result<Vec<Option<O>>, StepError>
where
    I: 'static,
    O: Clone + 'static,
{
    let channel: Channel<I> = Channel::new();
    let mut automaton = Automaton::new(|cx| build(cx, &channel))?;
    let mut outputs = Vec::with_capacity(inputs.len());
    for input in inputs {
        let batch = match input {
            Some(value) => vec![channel.encode(value)],
            None => Vec::new(),
        };
        let occurrence = automaton.step(batch)?;
        outputs.push(
            occurrence
                .as_ref()
                .and_then(|payload| downcast::<O>(payload).cloned()),
        );
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echoes_channel_values() {
        let outputs: Vec<Option<i64>> = interpret(
            |cx: &mut BuildCx<'_>, numbers: &Channel<i64>| {
                Ok(cx.pulse_from_channel("numbers", numbers))
            },
            vec![Some(4), None, Some(9)],
        )
        .unwrap();
        assert_eq!(outputs, vec![Some(4), None, Some(9)]);
    }
}
