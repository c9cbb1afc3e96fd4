//! Stream configuration.
//!
//! [`StreamConfig`] carries the parameters fixed at construction time:
//! how many channels the bus can carry, the declared sample width and the
//! endpoint's max packet size (which sizes the TX queue). The active channel
//! count is not part of it; it is a runtime value set on the encoder.

use crate::constants::{
    BYTES_PER_SAMPLE, DEFAULT_MAX_CHANNELS, DEFAULT_MAX_PACKET_SIZE, MAX_SUPPORTED_CHANNELS,
};
use crate::error::ConfigError;

/// Declared sample width of the channel stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleWidth {
    Bits16,
    #[default]
    Bits24,
    Bits32,
}

impl SampleWidth {
    /// Width in bits.
    pub const fn bits(self) -> u8 {
        match self {
            SampleWidth::Bits16 => 16,
            SampleWidth::Bits24 => 24,
            SampleWidth::Bits32 => 32,
        }
    }

    /// Mask selecting the significant bits of a raw sample value.
    pub const fn mask(self) -> u32 {
        match self {
            SampleWidth::Bits16 => 0x0000_FFFF,
            SampleWidth::Bits24 => 0x00FF_FFFF,
            SampleWidth::Bits32 => 0xFFFF_FFFF,
        }
    }

    /// Left shift applied when loading a sample into the 4-byte container.
    ///
    /// USB audio still moves 32-bit containers when the descriptor says 24,
    /// so 24-bit samples are left-justified. 16 and 32-bit samples are not.
    pub const fn container_shift(self) -> u32 {
        match self {
            SampleWidth::Bits24 => 8,
            SampleWidth::Bits16 | SampleWidth::Bits32 => 0,
        }
    }

    /// Place a raw sample value into its 32-bit wire container.
    pub const fn to_container(self, value: u32) -> u32 {
        (value & self.mask()) << self.container_shift()
    }
}

impl TryFrom<u8> for SampleWidth {
    type Error = ConfigError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            16 => Ok(SampleWidth::Bits16),
            24 => Ok(SampleWidth::Bits24),
            32 => Ok(SampleWidth::Bits32),
            other => Err(ConfigError::UnsupportedSampleWidth(other)),
        }
    }
}

/// Compile-time parameters of a stream direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Maximum number of channels carried on the bus.
    pub max_channels: usize,
    /// Declared width of incoming channel samples.
    pub sample_width: SampleWidth,
    /// Endpoint max packet size in bytes. The TX queue holds two packets.
    pub max_packet_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamConfig {
    /// Stereo, 24-bit, 256-byte packets.
    pub const fn new() -> Self {
        StreamConfig {
            max_channels: DEFAULT_MAX_CHANNELS,
            sample_width: SampleWidth::Bits24,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }

    pub const fn with_max_channels(mut self, max_channels: usize) -> Self {
        self.max_channels = max_channels;
        self
    }

    pub const fn with_sample_width(mut self, sample_width: SampleWidth) -> Self {
        self.sample_width = sample_width;
        self
    }

    pub const fn with_max_packet_size(mut self, max_packet_size: usize) -> Self {
        self.max_packet_size = max_packet_size;
        self
    }

    /// Queue depth in wire bytes: `2 × max_packet_size`, saturating.
    pub const fn fifo_depth(&self) -> usize {
        self.max_packet_size.saturating_mul(2)
    }

    /// Wire bytes in one full round-robin cycle over all channels.
    pub const fn round_bytes(&self) -> usize {
        self.max_channels * BYTES_PER_SAMPLE
    }

    /// Bits needed to encode a channel index in `0..max_channels`.
    pub const fn channel_bits(&self) -> u32 {
        channel_bits(self.max_channels)
    }

    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_channels == 0 || self.max_channels > MAX_SUPPORTED_CHANNELS {
            return Err(ConfigError::MaxChannelsOutOfRange {
                requested: self.max_channels,
                limit: MAX_SUPPORTED_CHANNELS,
            });
        }
        if self.max_packet_size == 0 {
            return Err(ConfigError::ZeroPacketSize);
        }
        let depth = self
            .max_packet_size
            .checked_mul(2)
            .ok_or(ConfigError::PacketSizeTooLarge(self.max_packet_size))?;
        // The feeder keeps one group of headroom, so a full round plus that
        // group must fit.
        let required = self.round_bytes() + BYTES_PER_SAMPLE;
        if depth < required {
            return Err(ConfigError::FifoDepthTooSmall { depth, required });
        }
        Ok(())
    }
}

/// Bit width of the range `0..max_channels`; zero for a single channel.
pub const fn channel_bits(max_channels: usize) -> u32 {
    if max_channels <= 1 {
        0
    } else {
        usize::BITS - (max_channels - 1).leading_zeros()
    }
}
