//! Channel sample → tagged byte serializer.
//!
//! The feeder accepts one channel sample at a time, loads it into a 32-bit
//! shift register (left-justified for 24-bit samples) and emits it as four
//! tagged bytes, least significant first, one per tick.
//!
//! ```text
//!            can_write_group & valid & channel < active
//!   ┌──────┐ ───────────────────────────────────────► ┌──────┐
//!   │ Idle │                                          │ Emit │ ×4 ticks
//!   └──────┘ ◄─────────────────────────────────────── └──────┘
//!                      after byte 3
//! ```

use log::trace;

use crate::config::SampleWidth;
use crate::constants::LAST_BYTE_OF_SAMPLE;
use crate::node::ClockedNode;
use crate::stream::{ChannelSample, WireByte};

/// Feeder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeederState {
    /// Waiting for the next sample.
    Idle,
    /// Pushing the latched sample's four bytes.
    Emit,
}

/// Signals sampled by the feeder each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeederInput {
    /// Sample offered by the producer, if any.
    pub sample: Option<ChannelSample>,
    /// Current active channel count.
    pub active_channels: usize,
    /// The queue can take a full 4-byte group.
    pub can_write_group: bool,
}

/// Signals driven by the feeder each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeederOutput {
    /// Ready half of the sample handshake. An offered sample is consumed
    /// when this is set.
    pub sample_ready: bool,
    /// Byte to push into the queue.
    pub write: Option<WireByte>,
}

/// Serializes channel samples into the TX queue.
pub struct EncoderFeeder {
    width: SampleWidth,
    state: FeederState,
    shift: u32,
    channel: u8,
    byte_pos: u8,
}

impl EncoderFeeder {
    pub const fn new(width: SampleWidth) -> Self {
        EncoderFeeder {
            width,
            state: FeederState::Idle,
            shift: 0,
            channel: 0,
            byte_pos: 0,
        }
    }

    pub fn state(&self) -> FeederState {
        self.state
    }

    /// Channel of the sample most recently latched.
    pub fn current_channel(&self) -> u8 {
        self.channel
    }

    pub fn sample_width(&self) -> SampleWidth {
        self.width
    }

    /// Abandon any in-flight sample.
    pub fn reset(&mut self) {
        self.state = FeederState::Idle;
        self.shift = 0;
        self.byte_pos = 0;
    }
}

impl ClockedNode for EncoderFeeder {
    type Input = FeederInput;
    type Output = FeederOutput;

    fn step(&mut self, input: &FeederInput) -> FeederOutput {
        match self.state {
            FeederState::Idle => {
                let ready = input.can_write_group;
                if let (true, Some(sample)) = (ready, input.sample) {
                    // Channels above the active count are consumed and dropped,
                    // which is what lets a stereo host drive a wider stream.
                    if (sample.channel as usize) < input.active_channels {
                        self.shift = self.width.to_container(sample.value);
                        self.channel = sample.channel;
                        self.byte_pos = 0;
                        self.state = FeederState::Emit;
                        trace!("feeder: latched ch{} = {:#x}", sample.channel, sample.value);
                    } else {
                        trace!(
                            "feeder: dropped ch{} (active {})",
                            sample.channel,
                            input.active_channels
                        );
                    }
                }
                FeederOutput {
                    sample_ready: ready,
                    write: None,
                }
            }
            FeederState::Emit => {
                let write = WireByte::new(self.shift as u8, self.channel);
                self.shift >>= 8;
                if self.byte_pos == LAST_BYTE_OF_SAMPLE {
                    self.byte_pos = 0;
                    self.state = FeederState::Idle;
                } else {
                    self.byte_pos += 1;
                }
                FeederOutput {
                    sample_ready: false,
                    write: Some(write),
                }
            }
        }
    }
}
