/// Bytes in one wire container. Every sample occupies 4 bytes on the bus,
/// whatever its declared width.
pub const BYTES_PER_SAMPLE: usize = 4;

/// Index of the last byte of a container.
pub const LAST_BYTE_OF_SAMPLE: u8 = (BYTES_PER_SAMPLE - 1) as u8;

/// Upper bound on `max_channels` (channel tags are `u8`).
pub const MAX_SUPPORTED_CHANNELS: usize = 256;

/// Default number of channels on the bus.
pub const DEFAULT_MAX_CHANNELS: usize = 2;

/// Default isochronous endpoint max packet size in bytes.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 256;

/// Default FIFO storage: room for two max-size packets.
pub const DEFAULT_FIFO_STORAGE: usize = 2 * DEFAULT_MAX_PACKET_SIZE;
