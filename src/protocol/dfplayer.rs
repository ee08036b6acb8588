//! DFPlayer Mini serial frames
//!
//! Fixed ten byte frames, both directions:
//!
//! ```text
//! 7E FF 06 CMD FB P1 P2 CKH CKL EF
//! ```
//!
//! `FB` asks for an acknowledgement and is always 0 here. The checksum is
//! the two's complement of the sum of bytes 1 to 6.

use crate::system::error::ProtocolError;

pub const FRAME_LEN: usize = 10;

const START: u8 = 0x7E;
const VERSION: u8 = 0xFF;
const LEN: u8 = 0x06;
const END: u8 = 0xEF;

/// Highest volume the module accepts
pub const MAX_VOLUME: u8 = 30;

/// Commands the firmware sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Play track `n` (1 based) from the card root
    Play(u16),
    /// Volume 0-30
    Volume(u8),
    Stop,
    Reset,
    /// Ask for the number of tracks on the card
    QueryTrackCount,
}

impl Command {
    fn code(&self) -> u8 {
        match self {
            Command::Play(_) => 0x03,
            Command::Volume(_) => 0x06,
            Command::Reset => 0x0C,
            Command::Stop => 0x16,
            Command::QueryTrackCount => 0x48,
        }
    }

    fn param(&self) -> u16 {
        match self {
            Command::Play(track) => *track,
            Command::Volume(volume) => u16::from((*volume).min(MAX_VOLUME)),
            Command::Stop | Command::Reset | Command::QueryTrackCount => 0,
        }
    }

    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let [p1, p2] = self.param().to_be_bytes();
        let mut frame = [START, VERSION, LEN, self.code(), 0, p1, p2, 0, 0, END];
        let [ckh, ckl] = checksum(&frame[1..7]).to_be_bytes();
        frame[7] = ckh;
        frame[8] = ckl;
        frame
    }
}

/// Module replies the firmware cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    /// Card tracks, answer to [`Command::QueryTrackCount`]
    TrackCount(u16),
    /// Module reported an error code
    Error(u16),
    /// Card inserted or module ready after reset
    Ready,
    /// Track finished playing
    Finished(u16),
    /// Anything else, command byte and parameter
    Other(u8, u16),
}

/// Two's complement of the byte sum
pub fn checksum(bytes: &[u8]) -> u16 {
    let sum = bytes.iter().fold(0u16, |acc, b| acc.wrapping_add(u16::from(*b)));
    0u16.wrapping_sub(sum)
}

/// Validates and decodes one reply frame
pub fn decode(frame: &[u8]) -> Result<Reply, ProtocolError> {
    let frame = frame.get(..FRAME_LEN).ok_or(ProtocolError::Truncated {
        needed: FRAME_LEN,
        available: frame.len(),
    })?;
    if frame[0] != START {
        return Err(ProtocolError::BadStart(frame[0]));
    }
    if frame[9] != END {
        return Err(ProtocolError::BadEnd(frame[9]));
    }
    let expected = checksum(&frame[1..7]);
    let found = u16::from_be_bytes([frame[7], frame[8]]);
    if expected != found {
        return Err(ProtocolError::Checksum { expected, found });
    }

    let param = u16::from_be_bytes([frame[5], frame[6]]);
    Ok(match frame[3] {
        0x48 => Reply::TrackCount(param),
        0x40 => Reply::Error(param),
        0x3F | 0x3A => Reply::Ready,
        0x3D => Reply::Finished(param),
        other => Reply::Other(other, param),
    })
}
