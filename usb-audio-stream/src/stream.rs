//! Stream payload types and 4-byte container helpers.
//!
//! ## Wire container
//!
//! Every channel sample travels as 4 bytes, least significant first:
//!
//! ```text
//! byte:    0        1        2        3
//! 16-bit:  s[7:0]   s[15:8]  0        0
//! 24-bit:  0        s[7:0]   s[15:8]  s[23:16]
//! 32-bit:  s[7:0]   s[15:8]  s[23:16] s[31:24]
//! ```
//!
//! Channels are interleaved one container at a time in ascending channel
//! order, channel 0 first.

use crate::config::SampleWidth;
use crate::constants::BYTES_PER_SAMPLE;

/// One sample on a channel stream (TX input).
///
/// `value` holds the raw bits; signed samples are passed as their two's
/// complement bit pattern. Bits above the configured width are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSample {
    pub channel: u8,
    pub value: u32,
}

impl ChannelSample {
    pub const fn new(channel: u8, value: u32) -> Self {
        ChannelSample { channel, value }
    }

    /// Build from a signed sample.
    pub const fn from_signed(channel: u8, value: i32) -> Self {
        ChannelSample {
            channel,
            value: value as u32,
        }
    }
}

/// One byte stored in the TX queue, tagged with the channel it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WireByte {
    pub value: u8,
    pub channel: u8,
}

impl WireByte {
    pub const fn new(value: u8, channel: u8) -> Self {
        WireByte { value, channel }
    }
}

/// One byte on the RX byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UsbByte {
    pub value: u8,
    /// Set on the first byte of a transfer.
    pub first: bool,
}

impl UsbByte {
    pub const fn new(value: u8, first: bool) -> Self {
        UsbByte { value, first }
    }
}

/// A 24-bit sample reassembled by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedSample {
    pub channel: u8,
    /// Unsigned 24-bit payload in bits 0..24.
    pub value: u32,
    /// Channel index is 0.
    pub first: bool,
    /// Channel index is the last in the power-of-two tag space.
    pub last: bool,
}

impl DecodedSample {
    /// Sign-extend the 24-bit payload.
    pub const fn signed(&self) -> i32 {
        ((self.value << 8) as i32) >> 8
    }
}

/// Bytes of one sample's wire container, in transmit order.
pub fn container_bytes(width: SampleWidth, value: u32) -> [u8; BYTES_PER_SAMPLE] {
    width.to_container(value).to_le_bytes()
}

/// Recover a 24-bit payload from a wire container. Byte 0 is ignored.
pub fn sample_from_container(group: &[u8; BYTES_PER_SAMPLE]) -> u32 {
    (group[1] as u32) | ((group[2] as u32) << 8) | ((group[3] as u32) << 16)
}

/// Interleave one frame of per-channel samples into wire containers.
///
/// # Panics
///
/// Debug-asserts that `dest` holds exactly 4 bytes per sample.
pub fn interleave_frame(dest: &mut [u8], width: SampleWidth, samples: &[u32]) {
    debug_assert_eq!(dest.len(), samples.len() * BYTES_PER_SAMPLE);

    for (group, &sample) in dest.chunks_exact_mut(BYTES_PER_SAMPLE).zip(samples) {
        group.copy_from_slice(&container_bytes(width, sample));
    }
}

/// Split interleaved 24-bit-in-32 containers back into per-channel samples.
///
/// # Panics
///
/// Debug-asserts that `src` holds exactly 4 bytes per output sample.
pub fn deinterleave_frame(src: &[u8], samples: &mut [u32]) {
    debug_assert_eq!(src.len(), samples.len() * BYTES_PER_SAMPLE);

    for (group, sample) in src.chunks_exact(BYTES_PER_SAMPLE).zip(samples.iter_mut()) {
        let mut bytes = [0u8; BYTES_PER_SAMPLE];
        bytes.copy_from_slice(group);
        *sample = sample_from_container(&bytes);
    }
}
