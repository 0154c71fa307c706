//! Frame extraction from raw cec-client output
//!
//! cec-client prints bus traffic as lines like
//! `TRAFFIC: [  16417]	>> 0f:80:10:00:20:00` interleaved with arbitrary
//! diagnostics. A frame is a directional marker followed by a run of
//! colon-separated, two-digit lowercase hex bytes.

use std::fmt;

use serde::Serialize;

/// Which side of the adapter a frame was seen on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// `>>` - traffic observed on the bus
    Received,
    /// `<<` - traffic transmitted by the local adapter
    Sent,
}

impl Direction {
    pub fn marker(&self) -> &'static str {
        match self {
            Direction::Received => ">>",
            Direction::Sent => "<<",
        }
    }
}

/// One decoded CEC frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub direction: Direction,
    /// Header byte, opcode and operands, in wire order
    pub bytes: Vec<u8>,
}

impl RawFrame {
    /// Decode a colon-separated hex run such as `01:90:00`
    ///
    /// Every group must be exactly two lowercase hex digits. Anything else,
    /// including an empty run or a trailing colon, yields `None`.
    pub fn decode(direction: Direction, text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }

        let mut digits = String::with_capacity(text.len());
        for group in text.split(':') {
            let valid = group.len() == 2
                && group
                    .bytes()
                    .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
            if !valid {
                return None;
            }
            digits.push_str(group);
        }

        let bytes = hex::decode(digits).ok()?;
        Some(Self { direction, bytes })
    }

    /// Initiator/destination header byte
    pub fn header(&self) -> u8 {
        self.bytes[0]
    }

    /// Opcode byte, absent for polling messages
    pub fn opcode(&self) -> Option<u8> {
        self.bytes.get(1).copied()
    }

    /// Bytes after the opcode
    pub fn operands(&self) -> &[u8] {
        self.bytes.get(2..).unwrap_or(&[])
    }

    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.bytes.starts_with(prefix)
    }

    /// Colon-separated lowercase hex, as cec-client prints it
    pub fn hex(&self) -> String {
        self.bytes
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl fmt::Display for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.direction.marker(), self.hex())
    }
}

/// Lazily iterate over the frames contained in a chunk of adapter output
///
/// Frames are yielded in the order they appear. A frame cut by the end of
/// the chunk is decoded from whatever bytes are present, or dropped if the
/// cut leaves a half byte behind.
pub fn frames(chunk: &str) -> Frames<'_> {
    Frames { rest: chunk }
}

/// Iterator returned by [`frames`]
pub struct Frames<'a> {
    rest: &'a str,
}

impl Iterator for Frames<'_> {
    type Item = RawFrame;

    fn next(&mut self) -> Option<RawFrame> {
        loop {
            let (idx, direction) = next_marker(self.rest)?;
            let body = self.rest[idx + 2..].trim_start_matches(|c: char| c == ' ' || c == '\t');
            let len = body
                .find(|c: char| !(c.is_ascii_digit() || ('a'..='f').contains(&c) || c == ':'))
                .unwrap_or(body.len());

            self.rest = &body[len..];

            if let Some(frame) = RawFrame::decode(direction, &body[..len]) {
                return Some(frame);
            }
        }
    }
}

fn next_marker(s: &str) -> Option<(usize, Direction)> {
    match (s.find(">>"), s.find("<<")) {
        (Some(rx), Some(tx)) if tx < rx => Some((tx, Direction::Sent)),
        (Some(rx), _) => Some((rx, Direction::Received)),
        (None, Some(tx)) => Some((tx, Direction::Sent)),
        (None, None) => None,
    }
}
