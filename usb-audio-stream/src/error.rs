//! Configuration errors.
//!
//! Only construction and reconfiguration can fail. Once a pipeline is running
//! every in-band anomaly (overrun, underrun, misalignment) is absorbed by the
//! state machines and never surfaces as an error.

/// Rejected stream configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Sample width other than 16, 24 or 32 bits.
    #[error("unsupported sample width: {0} bits (expected 16, 24 or 32)")]
    UnsupportedSampleWidth(u8),

    /// `max_channels` is zero or larger than the tag space.
    #[error("max channel count {requested} out of range 1..={limit}")]
    MaxChannelsOutOfRange { requested: usize, limit: usize },

    /// Active channel count outside `1..=max_channels`.
    #[error("active channel count {requested} out of range 1..={max}")]
    ActiveChannelsOutOfRange { requested: usize, max: usize },

    /// Packet size of zero.
    #[error("max packet size must be non-zero")]
    ZeroPacketSize,

    /// Packet size whose doubled queue depth does not fit in `usize`.
    #[error("max packet size {0} is too large")]
    PacketSizeTooLarge(usize),

    /// Queue too shallow to hold a single round-robin cycle.
    #[error("fifo depth {depth} cannot hold one round of {required} bytes")]
    FifoDepthTooSmall { depth: usize, required: usize },

    /// Configured depth exceeds the compile-time storage.
    #[error("fifo depth {depth} exceeds storage of {storage} entries")]
    FifoStorageTooSmall { depth: usize, storage: usize },

    /// Audio-side width wider than the USB container width.
    #[error("audio sample width {audio} exceeds usb sample width {usb}")]
    AudioWiderThanUsb { audio: u8, usb: u8 },
}
