//! Level → pulse conversion for frame control signals.
//!
//! Endpoint layers often expose "transfer in progress" style levels, while
//! the encoder wants single-tick `transfer_requested` / `transfer_finished`
//! pulses. [`EdgeToPulse`] produces a one-tick pulse on each rising edge.

use crate::node::ClockedNode;

/// Rising-edge detector.
///
/// The pulse is combinational: it is high in the same tick the input first
/// reads high, and low on every following tick until the input drops and
/// rises again.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeToPulse {
    last: bool,
}

impl EdgeToPulse {
    pub const fn new() -> Self {
        EdgeToPulse { last: false }
    }

    /// Start with a known previous level, so an input already at that
    /// level does not pulse.
    pub const fn with_level(level: bool) -> Self {
        EdgeToPulse { last: level }
    }

    /// Level seen on the previous tick.
    pub fn last_level(&self) -> bool {
        self.last
    }
}

impl ClockedNode for EdgeToPulse {
    type Input = bool;
    type Output = bool;

    fn step(&mut self, level: &bool) -> bool {
        let pulse = *level && !self.last;
        self.last = *level;
        pulse
    }
}

/// Derives both frame pulses from a single "transfer active" level.
#[derive(Debug, Clone, Copy)]
pub struct FramePulses {
    start: EdgeToPulse,
    end: EdgeToPulse,
}

/// Pulses produced by [`FramePulses`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameEvents {
    pub requested: bool,
    pub finished: bool,
}

impl Default for FramePulses {
    fn default() -> Self {
        Self::new()
    }
}

impl FramePulses {
    pub const fn new() -> Self {
        FramePulses {
            start: EdgeToPulse::new(),
            // Idle is "not active", so the end detector starts high.
            end: EdgeToPulse::with_level(true),
        }
    }
}

impl ClockedNode for FramePulses {
    type Input = bool;
    type Output = FrameEvents;

    fn step(&mut self, active: &bool) -> FrameEvents {
        FrameEvents {
            requested: self.start.step(active),
            finished: self.end.step(&!*active),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_pulse_per_rising_edge() {
        let mut edge = EdgeToPulse::new();
        let levels = [false, true, true, true, false, true, false, false];
        let pulses = levels.map(|l| edge.step(&l));
        assert_eq!(pulses, [false, true, false, false, false, true, false, false]);
    }

    #[test]
    fn high_from_start_pulses_once() {
        let mut edge = EdgeToPulse::new();
        assert!(edge.step(&true));
        assert!(!edge.step(&true));
        assert!(edge.last_level());
    }

    #[test]
    fn frame_pulses_bracket_transfer() {
        let mut frame = FramePulses::new();
        assert_eq!(frame.step(&false), FrameEvents::default());

        let events = [true, true, false, false, true].map(|l| frame.step(&l));
        assert_eq!(
            events.map(|e| (e.requested, e.finished)),
            [
                (true, false),
                (false, false),
                (false, true),
                (false, false),
                (true, false)
            ]
        );
    }
}
