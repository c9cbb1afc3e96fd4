//! # usb-audio-stream
//!
//! A `no_std`, zero-allocation, cycle-level model of the framing layer that
//! sits between a multichannel audio sample stream and a USB isochronous
//! audio endpoint.
//!
//! - **TX** ([`encoder`]): N channel sample streams are interleaved into one
//!   byte stream, paced by host transfer requests. A bounded queue decouples
//!   the sample producer from the bursty endpoint, and the drainer recovers
//!   from underrun, misalignment and channel-count changes while always
//!   presenting channel 0 first.
//! - **RX** ([`decoder`]): one byte stream is de-interleaved back into
//!   channel-tagged 24-bit samples.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Config | [`constants`] / [`config`] / [`error`] | Wire constants, `StreamConfig`, `ConfigError` |
//! | Trait | [`node`] | `ClockedNode`: one tick = `(state, inputs) → (state, outputs)` |
//! | Types | [`stream`] | Channel samples, tagged bytes, container helpers |
//! | Queue | [`fifo`] | Bounded first-word-fall-through byte queue |
//! | TX | [`encoder`] | Feeder, drainer, `ChannelsToUsbStream` |
//! | RX | [`decoder`] | `UsbStreamToChannels` |
//! | Signals | [`signal`] | Level → pulse conversion for frame events |
//! | Bridge | [`bridge`] | Codec frames ↔ channel streams (feature-gated) |
//!
//! ## Quick start
//!
//! ```ignore
//! use usb_audio_stream::prelude::*;
//!
//! let mut tx: ChannelsToUsbStream = ChannelsToUsbStream::new(StreamConfig::default())?;
//! let mut rx = UsbStreamToChannels::new(2)?;
//!
//! // Once per USB clock tick:
//! let out = tx.step(&EncoderInput {
//!     sample: next_sample,
//!     out_ready: true,
//!     audio_active: true,
//!     transfer_requested: sof_pulse,
//!     transfer_finished: eot_pulse,
//! });
//! ```
//!
//! ## Timing model
//!
//! Every component is stepped once per tick. Outputs of a tick depend only
//! on the state at the start of the tick and that tick's inputs; state
//! written during a tick is first visible on the next one.
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `bridge` | yes | Codec-side frame packing/unpacking over lock-free queues |

#![no_std]

pub mod constants;
pub mod config;
pub mod error;
pub mod node;
pub mod stream;
pub mod fifo;
pub mod encoder;
pub mod decoder;
pub mod signal;

#[cfg(feature = "bridge")]
pub mod bridge;


/// Commonly used types.
pub mod prelude {
    pub use crate::config::{SampleWidth, StreamConfig};
    pub use crate::decoder::{DecoderInput, DecoderOutput, UsbStreamToChannels};
    pub use crate::encoder::{ChannelsToUsbStream, EncoderInput, EncoderOutput, EncoderStatus};
    pub use crate::error::ConfigError;
    pub use crate::node::ClockedNode;
    pub use crate::signal::{EdgeToPulse, FramePulses};
    pub use crate::stream::{ChannelSample, DecodedSample, UsbByte, WireByte};

    #[cfg(feature = "bridge")]
    pub use crate::bridge::{ChannelsToFrame, FrameToChannels};
}
