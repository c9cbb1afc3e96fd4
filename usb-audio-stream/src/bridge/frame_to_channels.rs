//! Audio-domain frames → USB-domain channel stream.
//!
//! The codec side delivers one frame of `C` samples per sample strobe with
//! [`push_frame()`](FrameToChannels::push_frame). The USB side latches one
//! frame at a time and offers its channels `0..C` in order on the channel
//! stream, zero-filling each sample from the audio width up to the USB width.
//!
//! ## Usage
//!
//! ```ignore
//! // Audio ISR, once per sample strobe:
//! let _ = unpack.push_frame([in0, in1, in2, in3]);
//!
//! // USB clock:
//! let sample = unpack.offered();
//! let out = tx.step(&EncoderInput { sample, ..signals });
//! unpack.step(&out.sample_ready);
//! ```

use crate::config::SampleWidth;
use crate::error::ConfigError;
use crate::node::ClockedNode;
use crate::stream::ChannelSample;

use super::spsc::SpscQueue;
use super::{audio_mask, check_channels, zero_fill_bits};

/// Unpacks multichannel frames into a round-robin channel stream.
///
/// # Type Parameters
///
/// - `C`: Channels per frame.
/// - `Q`: Frame queue slots (`Q - 1` usable).
pub struct FrameToChannels<const C: usize, const Q: usize> {
    frames: SpscQueue<[i32; C], Q>,
    latched: Option<[i32; C]>,
    channel: usize,
    audio_mask: u32,
    zero_fill: u32,
}

impl<const C: usize, const Q: usize> FrameToChannels<C, Q> {
    /// `audio_bits`: sample width delivered by the codec.
    /// `usb_width`: sample width declared on the channel stream.
    pub fn new(audio_bits: u8, usb_width: SampleWidth) -> Result<Self, ConfigError> {
        check_channels(C)?;
        let zero_fill = zero_fill_bits(audio_bits, usb_width.bits())?;
        Ok(FrameToChannels {
            frames: SpscQueue::new(),
            latched: None,
            channel: 0,
            audio_mask: audio_mask(audio_bits),
            zero_fill,
        })
    }

    /// Audio side: queue one frame. Returns it back if the USB side has
    /// fallen behind.
    pub fn push_frame(&self, frame: [i32; C]) -> Result<(), [i32; C]> {
        self.frames.push(frame)
    }

    /// Frames waiting on the USB side.
    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    /// Sample offered on the channel stream this tick.
    pub fn offered(&self) -> Option<ChannelSample> {
        let frame = self.latched.as_ref()?;
        let raw = frame[self.channel] as u32 & self.audio_mask;
        Some(ChannelSample::new(self.channel as u8, raw << self.zero_fill))
    }
}

impl<const C: usize, const Q: usize> ClockedNode for FrameToChannels<C, Q> {
    /// Channel stream consumer was ready this tick.
    type Input = bool;
    /// Sample handed over this tick.
    type Output = Option<ChannelSample>;

    fn step(&mut self, ready: &bool) -> Option<ChannelSample> {
        let Some(sample) = self.offered() else {
            self.latched = self.frames.pop();
            self.channel = 0;
            return None;
        };

        if !*ready {
            return None;
        }

        if self.channel + 1 == C {
            self.latched = None;
            self.channel = 0;
        } else {
            self.channel += 1;
        }
        Some(sample)
    }
}
