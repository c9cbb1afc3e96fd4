//! Bridge between a codec's sample clock and the USB channel streams.
//!
//! | Component | Direction | Audio side | USB side |
//! |-----------|-----------|------------|----------|
//! | [`FrameToChannels`] | codec → host | `push_frame()` per strobe | offers `ChannelSample`s |
//! | [`ChannelsToFrame`] | host → codec | `step(strobe)` yields a frame | `accept()`s `DecodedSample`s |
//!
//! Each crossing goes through a lock-free [`spsc::SpscQueue`], so the two
//! sides may live in different interrupt priorities or threads.
//!
//! When the codec's sample width is narrower than the USB width, samples
//! are zero-filled at the bottom on the way out and the fill is dropped on
//! the way back in.

pub mod spsc;

mod channels_to_frame;
mod frame_to_channels;

pub use channels_to_frame::ChannelsToFrame;
pub use frame_to_channels::FrameToChannels;

use crate::constants::MAX_SUPPORTED_CHANNELS;
use crate::error::ConfigError;

/// Bits of zero padding between an audio sample and a USB sample.
fn zero_fill_bits(audio_bits: u8, usb_bits: u8) -> Result<u32, ConfigError> {
    if audio_bits == 0 {
        return Err(ConfigError::UnsupportedSampleWidth(audio_bits));
    }
    if audio_bits > usb_bits {
        return Err(ConfigError::AudioWiderThanUsb {
            audio: audio_bits,
            usb: usb_bits,
        });
    }
    Ok((usb_bits - audio_bits) as u32)
}

/// Mask of the low `bits` bits.
fn audio_mask(bits: u8) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}

fn check_channels(channels: usize) -> Result<(), ConfigError> {
    if channels == 0 || channels > MAX_SUPPORTED_CHANNELS {
        return Err(ConfigError::MaxChannelsOutOfRange {
            requested: channels,
            limit: MAX_SUPPORTED_CHANNELS,
        });
    }
    Ok(())
}
