//! MIDI channel-voice decoding
//!
//! Classifies raw MIDI events by status range and exposes their data bytes
//! positionally. Decoding is total: every byte sequence yields a message.

use std::fmt;

/// Channel-voice message kind, selected by the high nibble of the status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    NoteOff,
    NoteOn,
    ControlChange,
    ProgramChange,
    PitchBend,
    /// Anything outside the five ranges above (running status, aftertouch,
    /// system messages, empty input)
    Unknown,
}

/// Classify a status byte
pub fn classify(status: u8) -> MessageKind {
    match status {
        0x80..=0x8F => MessageKind::NoteOff,
        0x90..=0x9F => MessageKind::NoteOn,
        0xB0..=0xBF => MessageKind::ControlChange,
        0xC0..=0xCF => MessageKind::ProgramChange,
        0xE0..=0xEF => MessageKind::PitchBend,
        _ => MessageKind::Unknown,
    }
}

/// Decoded channel-voice message
///
/// Data bytes are passed through unchanged; values above 127 are not clamped.
/// For `PitchBend`, `data1` is the LSB and `data2` the MSB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelVoiceMessage {
    pub kind: MessageKind,
    /// 0-based channel (low nibble of the status byte)
    pub channel: u8,
    pub data1: Option<u8>,
    pub data2: Option<u8>,
    /// The raw status byte, kept for display of unknown messages
    pub status: Option<u8>,
}

impl ChannelVoiceMessage {
    /// Decode a raw event of up to three bytes. Extra bytes are ignored.
    pub fn decode(data: &[u8]) -> Self {
        let Some(&status) = data.first() else {
            return Self {
                kind: MessageKind::Unknown,
                channel: 0,
                data1: None,
                data2: None,
                status: None,
            };
        };

        Self {
            kind: classify(status),
            channel: status & 0x0F,
            data1: data.get(1).copied(),
            data2: data.get(2).copied(),
            status: Some(status),
        }
    }

    /// Build a Control Change message (used by tests and programmatic senders)
    pub fn control_change(channel: u8, cc: u8, value: u8) -> Self {
        Self::decode(&[0xB0 | (channel & 0x0F), cc, value])
    }

    /// Build a Note On message
    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        Self::decode(&[0x90 | (channel & 0x0F), note, velocity])
    }

    /// Channel as shown to users (1-16)
    pub fn display_channel(&self) -> u8 {
        self.channel + 1
    }

    /// `(cc, value)` when this is a complete Control Change
    pub fn as_control_change(&self) -> Option<(u8, u8)> {
        match (self.kind, self.data1, self.data2) {
            (MessageKind::ControlChange, Some(cc), Some(value)) => Some((cc, value)),
            _ => None,
        }
    }

    /// `(note, velocity)` when this is a complete Note On
    pub fn as_note_on(&self) -> Option<(u8, u8)> {
        match (self.kind, self.data1, self.data2) {
            (MessageKind::NoteOn, Some(note), Some(velocity)) => Some((note, velocity)),
            _ => None,
        }
    }
}

/// Combine pitch bend LSB/MSB into the 14-bit value (0-16383, center 8192).
///
/// The decoder leaves the bytes separate; callers that want a bend amount
/// combine them here.
pub fn pitch_bend_value(lsb: u8, msb: u8) -> u16 {
    (((msb & 0x7F) as u16) << 7) | (lsb & 0x7F) as u16
}

impl fmt::Display for ChannelVoiceMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ch = self.display_channel();
        let d1 = OptByte(self.data1);
        let d2 = OptByte(self.data2);
        match self.kind {
            MessageKind::ControlChange => write!(f, "ch:{} CC:{} value:{}", ch, d1, d2),
            MessageKind::NoteOn => write!(f, "ch:{} Note ON note:{} vel:{}", ch, d1, d2),
            MessageKind::NoteOff => write!(f, "ch:{} Note OFF note:{} vel:{}", ch, d1, d2),
            MessageKind::ProgramChange => write!(f, "ch:{} Program Change:{}", ch, d1),
            MessageKind::PitchBend => write!(f, "ch:{} Pitch Bend LSB:{} MSB:{}", ch, d1, d2),
            MessageKind::Unknown => {
                let raw: Vec<u8> = self
                    .status
                    .into_iter()
                    .chain(self.data1)
                    .chain(self.data2)
                    .collect();
                write!(f, "Unknown [{}]", format_hex(&raw))
            }
        }
    }
}

struct OptByte(Option<u8>);

impl fmt::Display for OptByte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(b) => write!(f, "{}", b),
            None => f.write_str("-"),
        }
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
