//! RX direction: USB byte stream → 24-bit channel samples.
//!
//! [`UsbStreamToChannels`] walks a four-state cycle, one byte per state:
//!
//! | State | Byte | Action |
//! |-------|------|--------|
//! | `B0` | container byte 0 | discarded; `first` resets the channel to 0, otherwise it advances |
//! | `B1` | bits 0..8 | stored |
//! | `B2` | bits 8..16 | stored |
//! | `B3` | bits 16..24 | sample emitted with channel tag |
//!
//! Every transition needs both an incoming byte and a ready consumer; if
//! either is missing the decoder holds its state.
//!
//! The channel index wraps at the next power of two above `max_channels - 1`,
//! and `last` marks the top of that tag space. With a channel count that is
//! not a power of two the `last` marker never coincides with the actual last
//! active channel.

use crate::config::channel_bits;
use crate::constants::MAX_SUPPORTED_CHANNELS;
use crate::error::ConfigError;
use crate::node::ClockedNode;
use crate::stream::{DecodedSample, UsbByte};

/// Position within a 4-byte container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    B0,
    B1,
    B2,
    B3,
}

/// Signals sampled by the decoder each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecoderInput {
    /// Byte offered on the stream.
    pub byte: Option<UsbByte>,
    /// Channel sample consumer is ready.
    pub out_ready: bool,
}

/// Signals driven by the decoder each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecoderOutput {
    /// Ready half of the byte handshake.
    pub byte_ready: bool,
    /// Sample completed this tick.
    pub sample: Option<DecodedSample>,
}

/// De-interleaves a USB byte stream into tagged channel samples.
pub struct UsbStreamToChannels {
    state: DecoderState,
    channel: u8,
    /// Low 16 bits of the sample being assembled.
    accumulator: u16,
    /// Channel tags wrap at this value.
    channel_modulus: u16,
}

impl UsbStreamToChannels {
    pub fn new(max_channels: usize) -> Result<Self, ConfigError> {
        if max_channels == 0 || max_channels > MAX_SUPPORTED_CHANNELS {
            return Err(ConfigError::MaxChannelsOutOfRange {
                requested: max_channels,
                limit: MAX_SUPPORTED_CHANNELS,
            });
        }
        Ok(UsbStreamToChannels {
            state: DecoderState::B0,
            channel: 0,
            accumulator: 0,
            channel_modulus: 1u16 << channel_bits(max_channels),
        })
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Channel of the group in progress.
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Highest channel tag before wrapping; carries the `last` marker.
    pub fn last_channel(&self) -> u8 {
        (self.channel_modulus - 1) as u8
    }

    pub fn reset(&mut self) {
        self.state = DecoderState::B0;
        self.channel = 0;
        self.accumulator = 0;
    }
}

impl ClockedNode for UsbStreamToChannels {
    type Input = DecoderInput;
    type Output = DecoderOutput;

    fn step(&mut self, input: &DecoderInput) -> DecoderOutput {
        let mut out = DecoderOutput {
            byte_ready: input.out_ready,
            sample: None,
        };

        let byte = match (input.byte, input.out_ready) {
            (Some(byte), true) => byte,
            _ => return out,
        };

        self.state = match self.state {
            DecoderState::B0 => {
                self.channel = if byte.first {
                    0
                } else {
                    ((self.channel as u16 + 1) % self.channel_modulus) as u8
                };
                DecoderState::B1
            }
            DecoderState::B1 => {
                self.accumulator = (self.accumulator & 0xFF00) | byte.value as u16;
                DecoderState::B2
            }
            DecoderState::B2 => {
                self.accumulator = (self.accumulator & 0x00FF) | ((byte.value as u16) << 8);
                DecoderState::B3
            }
            DecoderState::B3 => {
                out.sample = Some(DecodedSample {
                    channel: self.channel,
                    value: self.accumulator as u32 | ((byte.value as u32) << 16),
                    first: self.channel == 0,
                    last: self.channel == self.last_channel(),
                });
                DecoderState::B0
            }
        };

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(rx: &mut UsbStreamToChannels, value: u8, first: bool) -> DecoderOutput {
        rx.step(&DecoderInput {
            byte: Some(UsbByte::new(value, first)),
            out_ready: true,
        })
    }

    fn feed_group(rx: &mut UsbStreamToChannels, group: [u8; 4], first: bool) -> DecodedSample {
        for (i, &b) in group[..3].iter().enumerate() {
            let out = feed(rx, b, first && i == 0);
            assert!(out.sample.is_none(), "no output before byte 3");
        }
        feed(rx, group[3], false).sample.expect("sample at byte 3")
    }

    #[test]
    fn rejects_bad_channel_counts() {
        assert!(UsbStreamToChannels::new(0).is_err());
        assert!(UsbStreamToChannels::new(MAX_SUPPORTED_CHANNELS + 1).is_err());
        assert!(UsbStreamToChannels::new(MAX_SUPPORTED_CHANNELS).is_ok());
    }

    #[test]
    fn reassembles_24_bit_value_ignoring_byte_zero() {
        let mut rx = UsbStreamToChannels::new(2).unwrap();
        let sample = feed_group(&mut rx, [0xAA, 0x56, 0x34, 0x12], true);
        assert_eq!(sample.value, 0x12_3456);
        assert_eq!(sample.channel, 0);
        assert!(sample.first);
        assert!(!sample.last);
    }

    #[test]
    fn round_robin_tags_with_first_and_last() {
        let mut rx = UsbStreamToChannels::new(2).unwrap();
        let s0 = feed_group(&mut rx, [0, 1, 0, 0], true);
        let s1 = feed_group(&mut rx, [0, 2, 0, 0], false);
        let s2 = feed_group(&mut rx, [0, 3, 0, 0], false);

        assert_eq!((s0.channel, s0.first, s0.last), (0, true, false));
        assert_eq!((s1.channel, s1.first, s1.last), (1, false, true));
        assert_eq!((s2.channel, s2.value), (0, 3));
    }

    #[test]
    fn first_marker_resynchronizes() {
        let mut rx = UsbStreamToChannels::new(4).unwrap();
        feed_group(&mut rx, [0, 0, 0, 0], true);
        feed_group(&mut rx, [0, 0, 0, 0], false);
        let restarted = feed_group(&mut rx, [0, 9, 0, 0], true);
        assert_eq!(restarted.channel, 0);
        assert_eq!(restarted.value, 9);
    }

    #[test]
    fn stalls_without_both_sides() {
        let mut rx = UsbStreamToChannels::new(2).unwrap();
        feed(&mut rx, 0, true);
        assert_eq!(rx.state(), DecoderState::B1);

        let out = rx.step(&DecoderInput {
            byte: None,
            out_ready: true,
        });
        assert!(out.byte_ready);
        assert_eq!(rx.state(), DecoderState::B1);

        let out = rx.step(&DecoderInput {
            byte: Some(UsbByte::new(0x11, false)),
            out_ready: false,
        });
        assert!(!out.byte_ready);
        assert!(out.sample.is_none());
        assert_eq!(rx.state(), DecoderState::B1);
    }

    #[test]
    fn non_power_of_two_count_wraps_at_next_power() {
        // Three channels share a 2-bit tag space: tag 3 exists and carries
        // `last`; tag 2, the real last channel, does not.
        let mut rx = UsbStreamToChannels::new(3).unwrap();
        assert_eq!(rx.last_channel(), 3);

        let tags = [
            feed_group(&mut rx, [0; 4], true),
            feed_group(&mut rx, [0; 4], false),
            feed_group(&mut rx, [0; 4], false),
            feed_group(&mut rx, [0; 4], false),
            feed_group(&mut rx, [0; 4], false),
        ];
        assert_eq!(tags.map(|s| s.channel), [0, 1, 2, 3, 0]);
        assert_eq!(tags.map(|s| s.last), [false, false, false, true, false]);
    }

    #[test]
    fn single_channel_is_always_first_and_last() {
        let mut rx = UsbStreamToChannels::new(1).unwrap();
        for _ in 0..3 {
            let s = feed_group(&mut rx, [0, 1, 2, 3], false);
            assert_eq!(s.channel, 0);
            assert!(s.first && s.last);
            assert_eq!(s.value, 0x03_0201);
        }
    }

    #[test]
    fn reset_returns_to_b0() {
        let mut rx = UsbStreamToChannels::new(2).unwrap();
        feed(&mut rx, 0, true);
        feed(&mut rx, 1, false);
        rx.reset();
        assert_eq!(rx.state(), DecoderState::B0);
        assert_eq!(rx.channel(), 0);
    }
}
