/// Core trait for every clocked component.
///
/// A component advances in discrete ticks. [`step()`](Self::step) computes the
/// tick's outputs from the state at the start of the tick and the current
/// inputs, then commits the next state. Nothing written during a tick is
/// visible in that tick's outputs.
///
/// "Suspension" is simply a step that leaves the state unchanged, e.g. a
/// handshake that did not complete.
pub trait ClockedNode {
    /// Signals sampled this tick.
    type Input;

    /// Signals driven this tick.
    type Output;

    /// Evaluate one tick.
    fn step(&mut self, input: &Self::Input) -> Self::Output;
}
