//! Queue → byte stream presenter with underrun and resync recovery.
//!
//! The drainer reads the TX queue head and presents it on the outgoing byte
//! stream in strict round-robin channel order, 4 bytes per channel, channel 0
//! first. It owns every recovery policy of the TX path:
//!
//! | State | Output | Queue | Leaves when |
//! |-------|--------|-------|-------------|
//! | `Normal` | head byte, or a zero for a mis-tagged head | read on ready | inactive audio, underrun at round end, frame residue |
//! | `Discard` | nothing | read every tick | audio active and head is channel 0 |
//! | `Fill` | zeros | untouched | frame finished, or level sufficient, cursor at byte 0 and head tag matches cursor |
//!
//! `Discard` has two entry paths (audio inactive, residue after a finished
//! frame). Both resynchronize to a channel-0 boundary. Between transfers the
//! cursor goes back to channel 0; inside a transfer it keeps its place and
//! the alignment filler pads the rest of the host's round, so channel 0 is
//! still the first real channel emitted and every byte stays in its slot.
//!
//! `Fill` is only left on a sample boundary of the expected channel, so a
//! refill never splits a sample across rounds.

use log::debug;

use crate::constants::{BYTES_PER_SAMPLE, LAST_BYTE_OF_SAMPLE};
use crate::node::ClockedNode;
use crate::stream::WireByte;

/// Drainer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainerState {
    /// Pass the queue through.
    Normal,
    /// Silently consume until a channel-0 boundary.
    Discard,
    /// Emit silence until enough data is buffered.
    Fill,
}

/// Position within the 4-bytes-per-channel output cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundRobinCursor {
    pub channel: u8,
    pub byte_pos: u8,
}

impl RoundRobinCursor {
    pub const fn new() -> Self {
        RoundRobinCursor {
            channel: 0,
            byte_pos: 0,
        }
    }

    pub fn is_last_byte(&self) -> bool {
        self.byte_pos == LAST_BYTE_OF_SAMPLE
    }

    /// Move past one emitted byte.
    pub fn advance(&mut self, active_channels: usize) {
        if self.is_last_byte() {
            self.byte_pos = 0;
            self.channel = if self.channel as usize + 1 >= active_channels {
                0
            } else {
                self.channel + 1
            };
        } else {
            self.byte_pos += 1;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Signals sampled by the drainer each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainerInput {
    /// Queue head (first-word-fall-through).
    pub head: Option<WireByte>,
    /// Queue occupancy.
    pub level: usize,
    /// Byte stream consumer is ready.
    pub out_ready: bool,
    /// Audio path active (level signal).
    pub audio_active: bool,
    /// Transfer requested (pulse, frame start).
    pub transfer_requested: bool,
    /// Transfer finished (pulse, frame end).
    pub transfer_finished: bool,
    /// Current active channel count.
    pub active_channels: usize,
}

/// Signals driven by the drainer each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainerOutput {
    /// Byte presented on the stream (valid half of the handshake). It is
    /// taken only if the consumer was ready this tick.
    pub byte: Option<u8>,
    /// Queue head consumed this tick.
    pub read: bool,
    /// Presented byte is silence standing in for the expected channel.
    pub filling: bool,
    /// Queue data is being discarded.
    pub skipping: bool,
}

/// Presents the TX queue on the outgoing byte stream.
pub struct EncoderDrainer {
    state: DrainerState,
    cursor: RoundRobinCursor,
    /// A transfer request arrived since the last finish.
    frame_requested_seen: bool,
    /// A transfer finish arrived since the last request.
    frame_finished_seen: bool,
    /// Handshakes completed since the last transfer request.
    transfer_bytes: usize,
}

impl EncoderDrainer {
    pub const fn new() -> Self {
        EncoderDrainer {
            state: DrainerState::Normal,
            cursor: RoundRobinCursor::new(),
            frame_requested_seen: false,
            frame_finished_seen: false,
            transfer_bytes: 0,
        }
    }

    pub fn state(&self) -> DrainerState {
        self.state
    }

    pub fn cursor(&self) -> RoundRobinCursor {
        self.cursor
    }

    /// Bytes handed to the endpoint in the current frame.
    pub fn transfer_bytes(&self) -> usize {
        self.transfer_bytes
    }

    pub fn frame_requested_seen(&self) -> bool {
        self.frame_requested_seen
    }

    pub fn frame_finished_seen(&self) -> bool {
        self.frame_finished_seen
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn transition(&mut self, next: DrainerState, reason: &str) {
        if next != self.state {
            debug!("drainer: {:?} -> {:?} ({})", self.state, next, reason);
            self.state = next;
        }
    }
}

impl Default for EncoderDrainer {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockedNode for EncoderDrainer {
    type Input = DrainerInput;
    type Output = DrainerOutput;

    fn step(&mut self, input: &DrainerInput) -> DrainerOutput {
        let active = input.active_channels.max(1);
        let head_channel = input.head.map(|b| b.channel);
        let has_data = input.head.is_some();
        let level_sufficient = input.level >= active * BYTES_PER_SAMPLE;

        let mut payload = input.head.map_or(0, |b| b.value);
        let mut valid = false;
        let mut read = false;
        let mut filling = false;
        let mut skipping = false;

        let mut next = (self.state, "");
        let mut drained_residue = false;
        let mut resynced = false;

        match self.state {
            DrainerState::Normal => {
                read = input.out_ready;
                valid = has_data;

                if !input.audio_active && has_data {
                    // Nothing from a stale queue reaches the host.
                    read = false;
                    valid = false;
                    next = (DrainerState::Discard, "audio inactive");
                } else if !self.frame_finished_seen {
                    let last_channel = self.cursor.channel as usize == active - 1;
                    if self.cursor.is_last_byte() && last_channel && !level_sufficient {
                        next = (DrainerState::Fill, "underrun");
                    }

                    // Wrong channel at the head: satisfy the expected channel
                    // with silence and leave the queue alone.
                    if head_channel.is_some_and(|c| c != self.cursor.channel) {
                        read = false;
                        payload = 0;
                        valid = true;
                        filling = true;
                    }
                } else if head_channel.is_some_and(|c| c != 0) {
                    // Residue of a short transfer: consume it unseen.
                    read = true;
                    valid = false;
                    drained_residue = true;
                    next = (DrainerState::Discard, "frame residue");
                }
            }
            DrainerState::Discard => {
                if has_data {
                    read = true;
                    skipping = true;
                    if input.audio_active && head_channel == Some(0) {
                        read = false;
                        resynced = true;
                        next = (DrainerState::Normal, "resynced at channel 0");
                    }
                }
            }
            DrainerState::Fill => {
                let channel_ok = level_sufficient
                    && self.cursor.byte_pos == 0
                    && head_channel == Some(self.cursor.channel);
                if input.transfer_finished {
                    next = (DrainerState::Normal, "frame finished");
                } else if channel_ok {
                    next = (DrainerState::Normal, "buffer refilled");
                } else {
                    payload = 0;
                    valid = true;
                    filling = true;
                }
            }
        }

        let handshake = valid && input.out_ready;

        if handshake {
            self.cursor.advance(active);
            self.transfer_bytes += 1;
        }

        if input.transfer_requested {
            self.cursor.reset();
            self.transfer_bytes = 0;
            self.frame_requested_seen = true;
            self.frame_finished_seen = false;
        }

        if input.transfer_finished {
            self.cursor.reset();
            self.frame_finished_seen = true;
            self.frame_requested_seen = false;
        }

        if drained_residue {
            self.cursor.byte_pos = 0;
            self.frame_finished_seen = false;
        }

        // The queue head is a channel-0 byte. Mid-transfer the host's round
        // is already under way, so only realign between transfers.
        if resynced && !self.frame_requested_seen {
            self.cursor.reset();
        }

        self.transition(next.0, next.1);

        DrainerOutput {
            byte: valid.then_some(payload),
            read: read && has_data,
            filling,
            skipping,
        }
    }
}
