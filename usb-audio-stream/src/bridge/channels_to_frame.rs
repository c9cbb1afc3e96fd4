//! USB-domain channel samples → audio-domain frames.
//!
//! Decoded samples are routed by channel tag into one queue per channel. On
//! each audio sample strobe one sample is taken from every channel queue; a
//! channel whose queue has drained keeps its previous output value.

use log::trace;

use crate::error::ConfigError;
use crate::node::ClockedNode;
use crate::stream::DecodedSample;

use super::spsc::SpscQueue;
use super::{check_channels, zero_fill_bits};

/// Decoder sample width.
const DECODED_BITS: u8 = 24;

/// Demultiplexes decoded samples into per-channel output frames.
///
/// # Type Parameters
///
/// - `C`: Output channels. Samples tagged `≥ C` are dropped.
/// - `Q`: Per-channel queue slots (`Q - 1` usable).
pub struct ChannelsToFrame<const C: usize, const Q: usize> {
    channels: [SpscQueue<i32, Q>; C],
    outputs: [i32; C],
    /// Right shift that drops the zero-fill bits after sign extension.
    shift: u32,
}

impl<const C: usize, const Q: usize> ChannelsToFrame<C, Q> {
    /// `audio_bits`: sample width expected by the codec (at most 24).
    pub fn new(audio_bits: u8) -> Result<Self, ConfigError> {
        check_channels(C)?;
        let zero_fill = zero_fill_bits(audio_bits, DECODED_BITS)?;
        Ok(ChannelsToFrame {
            channels: core::array::from_fn(|_| SpscQueue::new()),
            outputs: [0; C],
            shift: 8 + zero_fill,
        })
    }

    /// USB side: every channel queue can take a sample.
    pub fn ready(&self) -> bool {
        self.channels.iter().all(|q| !q.is_full())
    }

    /// USB side: route one decoded sample to its channel queue.
    ///
    /// Returns `false` if the sample was dropped (tag out of range or the
    /// channel queue full).
    pub fn accept(&self, sample: DecodedSample) -> bool {
        let Some(queue) = self.channels.get(sample.channel as usize) else {
            trace!("demux: dropped sample for ch{}", sample.channel);
            return false;
        };
        let value = ((sample.value << 8) as i32) >> self.shift;
        queue.push(value).is_ok()
    }

    /// Samples waiting on one channel.
    pub fn pending(&self, channel: usize) -> usize {
        self.channels.get(channel).map_or(0, |q| q.len())
    }

    /// Values currently driven to the codec.
    pub fn outputs(&self) -> &[i32; C] {
        &self.outputs
    }
}

impl<const C: usize, const Q: usize> ClockedNode for ChannelsToFrame<C, Q> {
    /// Audio sample strobe.
    type Input = bool;
    /// Values driven to the codec after this tick.
    type Output = [i32; C];

    fn step(&mut self, strobe: &bool) -> [i32; C] {
        if *strobe {
            for (queue, output) in self.channels.iter().zip(self.outputs.iter_mut()) {
                // A drained channel keeps its last value.
                if let Some(value) = queue.pop() {
                    *output = value;
                }
            }
        }
        self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(channel: u8, value: u32) -> DecodedSample {
        DecodedSample {
            channel,
            value,
            first: channel == 0,
            last: false,
        }
    }

    #[test]
    fn strobe_pops_one_sample_per_channel() {
        let mut demux = ChannelsToFrame::<2, 4>::new(24).unwrap();
        assert!(demux.accept(decoded(0, 1)));
        assert!(demux.accept(decoded(1, 2)));
        assert!(demux.accept(decoded(0, 3)));
        assert!(demux.accept(decoded(1, 4)));

        assert_eq!(demux.step(&false), [0, 0]);
        assert_eq!(demux.step(&true), [1, 2]);
        assert_eq!(demux.step(&true), [3, 4]);
    }

    #[test]
    fn drained_channel_holds_value() {
        let mut demux = ChannelsToFrame::<2, 4>::new(24).unwrap();
        demux.accept(decoded(0, 10));
        demux.accept(decoded(1, 20));
        demux.accept(decoded(0, 11));

        assert_eq!(demux.step(&true), [10, 20]);
        assert_eq!(demux.step(&true), [11, 20]);
        assert_eq!(demux.step(&true), [11, 20]);
        assert_eq!(demux.outputs(), &[11, 20]);
    }

    #[test]
    fn sign_extends_and_drops_zero_fill() {
        let mut demux = ChannelsToFrame::<1, 4>::new(16).unwrap();
        demux.accept(decoded(0, 0xFF_FE00));
        demux.accept(decoded(0, 0x12_3400));
        assert_eq!(demux.step(&true), [-2]);
        assert_eq!(demux.step(&true), [0x1234]);

        let mut full = ChannelsToFrame::<1, 4>::new(24).unwrap();
        full.accept(decoded(0, 0x80_0000));
        assert_eq!(full.step(&true), [-0x80_0000]);
    }

    #[test]
    fn out_of_range_channel_dropped() {
        let demux = ChannelsToFrame::<2, 4>::new(24).unwrap();
        assert!(!demux.accept(decoded(3, 1)));
        assert_eq!(demux.pending(0) + demux.pending(1), 0);
    }

    #[test]
    fn ready_drops_when_any_channel_full() {
        let demux = ChannelsToFrame::<2, 3>::new(24).unwrap();
        assert!(demux.ready());
        demux.accept(decoded(1, 1));
        demux.accept(decoded(1, 2));
        assert!(!demux.ready());
        assert!(!demux.accept(decoded(1, 3)));
        assert_eq!(demux.pending(1), 2);
    }

    #[test]
    fn rejects_wide_audio() {
        assert!(ChannelsToFrame::<2, 4>::new(32).is_err());
    }
}
