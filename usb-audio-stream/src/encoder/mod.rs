//! TX direction: channel samples → USB byte stream.
//!
//! ```text
//!  channel samples ┌────────┐  tagged bytes  ┌────────────┐ ┌─────────┐ bytes
//!  ───────────────►│ Feeder ├───────────────►│ TaggedFifo ├►│ Drainer ├──────►
//!   (ch, value)    └────────┘                └────────────┘ └─────────┘
//!                                                               ▲
//!                          transfer requested / finished, audio active
//! ```
//!
//! [`ChannelsToUsbStream`] owns the queue and both state machines and steps
//! them together. Within a tick both sides see the queue as it was at the
//! start of the tick; the drainer's read and the feeder's write are applied
//! afterwards.
//!
//! ## Usage
//!
//! ```ignore
//! let mut tx: ChannelsToUsbStream = ChannelsToUsbStream::new(StreamConfig::default())?;
//!
//! // Once per clock:
//! let out = tx.step(&EncoderInput {
//!     sample: producer.peek(),
//!     out_ready: endpoint.ready(),
//!     audio_active: true,
//!     transfer_requested: sof.requested(),
//!     transfer_finished: sof.finished(),
//! });
//! if out.sample_ready { producer.advance(); }
//! if let (Some(b), true) = (out.byte, endpoint.ready()) { endpoint.send(b); }
//! ```

pub mod drainer;
pub mod feeder;

use log::{debug, warn};

use crate::config::StreamConfig;
use crate::constants::{BYTES_PER_SAMPLE, DEFAULT_FIFO_STORAGE};
use crate::error::ConfigError;
use crate::fifo::TaggedFifo;
use crate::node::ClockedNode;
use crate::stream::ChannelSample;

pub use drainer::{DrainerInput, DrainerOutput, DrainerState, EncoderDrainer, RoundRobinCursor};
pub use feeder::{EncoderFeeder, FeederInput, FeederOutput, FeederState};

/// Signals sampled by the encoder each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncoderInput {
    /// Sample offered on the channel stream.
    pub sample: Option<ChannelSample>,
    /// Byte stream consumer is ready.
    pub out_ready: bool,
    /// Audio path active (level).
    pub audio_active: bool,
    /// Transfer requested (pulse).
    pub transfer_requested: bool,
    /// Transfer finished (pulse).
    pub transfer_finished: bool,
}

/// Signals driven by the encoder each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncoderOutput {
    /// The offered sample was consumed.
    pub sample_ready: bool,
    /// Byte presented on the stream; taken only if `out_ready` was set.
    pub byte: Option<u8>,
    /// Presented byte is silence.
    pub filling: bool,
    /// Queue data is being discarded.
    pub skipping: bool,
    /// Queue head consumed this tick.
    pub fifo_read: bool,
}

/// Read-only snapshot of the encoder's registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderStatus {
    pub level: usize,
    pub depth: usize,
    /// Within one group of the queue depth.
    pub fifo_full: bool,
    /// Less than one round buffered.
    pub fifo_level_insufficient: bool,
    pub feeder_state: FeederState,
    pub drainer_state: DrainerState,
    /// Channel latched by the feeder.
    pub current_channel: u8,
    /// Channel the drainer expects next.
    pub usb_channel: u8,
    pub usb_byte_pos: u8,
    /// Tag of the queue head.
    pub out_channel: Option<u8>,
    /// Bytes sent in the current frame.
    pub transfer_bytes: usize,
    /// A transfer is in progress.
    pub frame_requested_seen: bool,
}

/// Interleaves channel samples into a USB isochronous byte stream.
///
/// # Type Parameters
///
/// - `N`: Queue storage in bytes. Must be at least `2 × max_packet_size`.
pub struct ChannelsToUsbStream<const N: usize = DEFAULT_FIFO_STORAGE> {
    config: StreamConfig,
    active_channels: usize,
    fifo: TaggedFifo<N>,
    feeder: EncoderFeeder,
    drainer: EncoderDrainer,
}

impl<const N: usize> ChannelsToUsbStream<N> {
    /// Create an encoder with all `max_channels` channels active.
    pub fn new(config: StreamConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let fifo = TaggedFifo::with_depth(config.fifo_depth())?;
        debug!(
            "encoder: {} channels, {} bit, queue depth {}",
            config.max_channels,
            config.sample_width.bits(),
            fifo.depth()
        );
        Ok(ChannelsToUsbStream {
            config,
            active_channels: config.max_channels,
            fifo,
            feeder: EncoderFeeder::new(config.sample_width),
            drainer: EncoderDrainer::new(),
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn active_channels(&self) -> usize {
        self.active_channels
    }

    /// Change the number of channels taking part in the round-robin.
    ///
    /// Data already queued is left in place; the drainer's alignment guard
    /// and discard logic absorb the transition.
    pub fn set_active_channels(&mut self, active_channels: usize) -> Result<(), ConfigError> {
        if active_channels == 0 || active_channels > self.config.max_channels {
            return Err(ConfigError::ActiveChannelsOutOfRange {
                requested: active_channels,
                max: self.config.max_channels,
            });
        }
        if active_channels != self.active_channels {
            debug!(
                "encoder: active channels {} -> {}",
                self.active_channels, active_channels
            );
            self.active_channels = active_channels;
        }
        Ok(())
    }

    /// The TX queue, for inspection.
    pub fn fifo(&self) -> &TaggedFifo<N> {
        &self.fifo
    }

    /// Queue has room for a complete 4-byte group.
    pub fn can_write_group(&self) -> bool {
        self.fifo.w_rdy() && self.fifo.level() + BYTES_PER_SAMPLE < self.fifo.depth()
    }

    pub fn status(&self) -> EncoderStatus {
        let level = self.fifo.level();
        let depth = self.fifo.depth();
        let cursor = self.drainer.cursor();
        EncoderStatus {
            level,
            depth,
            fifo_full: level + BYTES_PER_SAMPLE >= depth,
            fifo_level_insufficient: level < self.active_channels * BYTES_PER_SAMPLE,
            feeder_state: self.feeder.state(),
            drainer_state: self.drainer.state(),
            current_channel: self.feeder.current_channel(),
            usb_channel: cursor.channel,
            usb_byte_pos: cursor.byte_pos,
            out_channel: self.fifo.head().map(|b| b.channel),
            transfer_bytes: self.drainer.transfer_bytes(),
            frame_requested_seen: self.drainer.frame_requested_seen(),
        }
    }

    /// Return to the power-on state, dropping queued data.
    pub fn reset(&mut self) {
        self.fifo.clear();
        self.feeder.reset();
        self.drainer.reset();
    }
}

impl<const N: usize> ClockedNode for ChannelsToUsbStream<N> {
    type Input = EncoderInput;
    type Output = EncoderOutput;

    fn step(&mut self, input: &EncoderInput) -> EncoderOutput {
        let head = self.fifo.head();
        let level = self.fifo.level();

        let feed = self.feeder.step(&FeederInput {
            sample: input.sample,
            active_channels: self.active_channels,
            can_write_group: self.can_write_group(),
        });

        let drain = self.drainer.step(&DrainerInput {
            head,
            level,
            out_ready: input.out_ready,
            audio_active: input.audio_active,
            transfer_requested: input.transfer_requested,
            transfer_finished: input.transfer_finished,
            active_channels: self.active_channels,
        });

        if drain.read {
            self.fifo.pop();
        }
        if let Some(byte) = feed.write {
            if self.fifo.push(byte).is_err() {
                warn!("encoder: queue full, dropped byte for ch{}", byte.channel);
            }
        }

        EncoderOutput {
            sample_ready: feed.sample_ready,
            byte: drain.byte,
            filling: drain.filling,
            skipping: drain.skipping,
            fifo_read: drain.read,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SampleWidth;
    use crate::stream::WireByte;

    fn offer(sample: Option<ChannelSample>) -> EncoderInput {
        EncoderInput {
            sample,
            out_ready: false,
            audio_active: true,
            ..Default::default()
        }
    }

    /// Feed samples with the byte stream stalled until all are queued.
    fn feed_all<const N: usize>(tx: &mut ChannelsToUsbStream<N>, samples: &[ChannelSample]) {
        let mut next = 0;
        let mut ticks = 0;
        while next < samples.len() || tx.status().feeder_state == FeederState::Emit {
            let out = tx.step(&offer(samples.get(next).copied()));
            if out.sample_ready && next < samples.len() {
                next += 1;
            }
            ticks += 1;
            assert!(ticks < 10_000, "feeder stuck");
        }
    }

    #[test]
    fn new_validates_config() {
        let bad = StreamConfig::new().with_max_channels(0);
        assert!(ChannelsToUsbStream::<512>::new(bad).is_err());

        let too_deep = StreamConfig::new().with_max_packet_size(512);
        assert_eq!(
            ChannelsToUsbStream::<512>::new(too_deep).err(),
            Some(ConfigError::FifoStorageTooSmall {
                depth: 1024,
                storage: 512
            })
        );

        let tx: ChannelsToUsbStream = ChannelsToUsbStream::new(StreamConfig::default()).unwrap();
        assert_eq!(tx.active_channels(), 2);
        assert_eq!(tx.status().depth, 512);
    }

    #[test]
    fn set_active_channels_bounds() {
        let config = StreamConfig::new().with_max_channels(4);
        let mut tx: ChannelsToUsbStream = ChannelsToUsbStream::new(config).unwrap();

        assert!(tx.set_active_channels(2).is_ok());
        assert_eq!(tx.active_channels(), 2);
        assert_eq!(
            tx.set_active_channels(0),
            Err(ConfigError::ActiveChannelsOutOfRange {
                requested: 0,
                max: 4
            })
        );
        assert!(tx.set_active_channels(5).is_err());
        assert_eq!(tx.active_channels(), 2);
    }

    #[test]
    fn stereo_16_bit_concrete_case() {
        let config = StreamConfig::new().with_sample_width(SampleWidth::Bits16);
        let mut tx: ChannelsToUsbStream = ChannelsToUsbStream::new(config).unwrap();

        feed_all(&mut tx, &[ChannelSample::new(0, 100), ChannelSample::new(1, 200)]);

        let expected = [
            WireByte::new(100, 0),
            WireByte::new(0, 0),
            WireByte::new(0, 0),
            WireByte::new(0, 0),
            WireByte::new(200, 1),
            WireByte::new(0, 1),
            WireByte::new(0, 1),
            WireByte::new(0, 1),
        ];
        assert_eq!(tx.fifo().level(), 8);
        for (got, want) in tx.fifo().iter().zip(expected) {
            assert_eq!(got, want);
        }

        tx.step(&EncoderInput {
            transfer_requested: true,
            ..offer(None)
        });

        let mut sent = [0xAAu8; 8];
        for slot in sent.iter_mut() {
            let out = tx.step(&EncoderInput {
                out_ready: true,
                ..offer(None)
            });
            *slot = out.byte.unwrap();
        }
        assert_eq!(sent, [100, 0, 0, 0, 200, 0, 0, 0]);
        assert_eq!(tx.status().transfer_bytes, 8);
        assert!(tx.fifo().is_empty());
    }

    #[test]
    fn backpressure_keeps_one_group_of_headroom() {
        // Depth 12: a stereo round (8) plus one group.
        let config = StreamConfig::new().with_max_packet_size(6);
        let mut tx: ChannelsToUsbStream<12> = ChannelsToUsbStream::new(config).unwrap();

        let sample = Some(ChannelSample::new(0, 0x12_3456));
        let mut accepted = 0;
        for _ in 0..40 {
            let out = tx.step(&offer(sample));
            if out.sample_ready {
                accepted += 1;
            }
            assert!(tx.fifo().level() <= 12);
        }

        assert_eq!(accepted, 2);
        let status = tx.status();
        assert_eq!(status.level, 8);
        assert!(status.fifo_full);
        assert!(!tx.can_write_group());
    }

    #[test]
    fn inactive_channels_never_reach_the_queue() {
        let config = StreamConfig::new().with_max_channels(4);
        let mut tx: ChannelsToUsbStream = ChannelsToUsbStream::new(config).unwrap();
        tx.set_active_channels(2).unwrap();

        feed_all(
            &mut tx,
            &[
                ChannelSample::new(0, 1),
                ChannelSample::new(1, 2),
                ChannelSample::new(2, 3),
                ChannelSample::new(3, 4),
            ],
        );

        assert_eq!(tx.fifo().level(), 8);
        assert!(tx.fifo().iter().all(|b| b.channel < 2));
    }

    #[test]
    fn status_tracks_cursor_and_head() {
        let mut tx: ChannelsToUsbStream = ChannelsToUsbStream::new(StreamConfig::default()).unwrap();
        let status = tx.status();
        assert_eq!(status.out_channel, None);
        assert!(status.fifo_level_insufficient);
        assert_eq!(status.drainer_state, DrainerState::Normal);

        feed_all(&mut tx, &[ChannelSample::new(0, 7), ChannelSample::new(1, 8)]);
        let status = tx.status();
        assert_eq!(status.out_channel, Some(0));
        assert_eq!(status.current_channel, 1);
        assert!(!status.fifo_level_insufficient);

        tx.step(&EncoderInput {
            out_ready: true,
            ..offer(None)
        });
        let status = tx.status();
        assert_eq!(status.usb_channel, 0);
        assert_eq!(status.usb_byte_pos, 1);
    }

    #[test]
    fn reset_clears_queue() {
        let mut tx: ChannelsToUsbStream = ChannelsToUsbStream::new(StreamConfig::default()).unwrap();
        feed_all(&mut tx, &[ChannelSample::new(0, 1)]);
        assert_eq!(tx.fifo().level(), 4);
        tx.reset();
        assert!(tx.fifo().is_empty());
        assert_eq!(tx.status().feeder_state, FeederState::Idle);
    }
}
