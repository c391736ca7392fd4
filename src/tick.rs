//! Round numbering.
//!
//! Every step of the network runs in its own tick. The counter only moves
//! when a round commits, so a failed step leaves the numbering untouched.

/// A round number. `Tick::ZERO` means "before the first round"; the first
/// committed round is `Tick(1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// The tick that follows this one.
    pub fn next(self) -> Tick {
        Tick(self.0 + 1)
    }
}

/// Monotonic counter handing out one tick per committed round.
#[derive(Debug, Default)]
pub struct TickCounter {
    current: Tick,
}

impl TickCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit the round in flight, advancing to its tick.
    pub fn advance(&mut self) -> Tick {
        self.current = self.current.next();
        self.current
    }

    /// Tick of the most recently committed round.
    pub fn current(&self) -> Tick {
        self.current
    }
}
