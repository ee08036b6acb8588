//! Vision co-processor framing
//!
//! The camera and the detection model live on a co-processor reached over a
//! UART. Every message, in either direction, starts with a six byte header:
//!
//! | Byte | Field                    |
//! |------|--------------------------|
//! | 0    | start marker `0xA5`      |
//! | 1    | opcode                   |
//! | 2-5  | payload length, u32 LE   |
//!
//! Requests and their reply payloads:
//! - `STATUS`: `[model_loaded, camera_ok]`
//! - `CAPTURE`: `width u16, height u16`, then `width * height` RGB888 pixels
//! - `INFER` (request payload `size u16` + letterboxed RGB888): `count u8`,
//!   then `count` records of `x1, y1, x2, y2, confidence` as f32 and
//!   `class_id` as u16, all little-endian
//! - `RELEASE`: no reply

use crate::system::error::ProtocolError;
use crate::system::geometry::BoundingBox;
use crate::system::platform::{RawDetection, RawDetections};

/// First byte of every message
pub const START: u8 = 0xA5;

pub const HEADER_LEN: usize = 6;

/// Width and height prefix of a CAPTURE reply
pub const FRAME_INFO_LEN: usize = 4;

/// Size prefix of an INFER request
pub const INFER_PREFIX_LEN: usize = 2;

/// One detection record of an INFER reply
pub const DETECTION_RECORD_LEN: usize = 5 * 4 + 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Opcode {
    Status = 0x01,
    Capture = 0x02,
    Infer = 0x03,
    Release = 0x04,
}

impl TryFrom<u8> for Opcode {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x01 => Ok(Opcode::Status),
            0x02 => Ok(Opcode::Capture),
            0x03 => Ok(Opcode::Infer),
            0x04 => Ok(Opcode::Release),
            other => Err(ProtocolError::UnknownOpcode(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Header {
    pub opcode: Opcode,
    /// Payload bytes following the header
    pub len: u32,
}

impl Header {
    pub const fn new(opcode: Opcode, len: u32) -> Self {
        Self { opcode, len }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let len = self.len.to_le_bytes();
        [START, self.opcode as u8, len[0], len[1], len[2], len[3]]
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let bytes = take(bytes, HEADER_LEN)?;
        if bytes[0] != START {
            return Err(ProtocolError::BadStart(bytes[0]));
        }
        Ok(Self {
            opcode: Opcode::try_from(bytes[1])?,
            len: u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
        })
    }

    /// Checks the reply answers `opcode` and carries `expected` payload bytes
    pub fn expect(&self, opcode: Opcode, expected: Option<u32>) -> Result<(), ProtocolError> {
        if self.opcode != opcode {
            return Err(ProtocolError::UnexpectedReply(self.opcode as u8));
        }
        match expected {
            Some(len) if len != self.len => Err(ProtocolError::Length(self.len)),
            _ => Ok(()),
        }
    }
}

/// Co-processor health as reported by STATUS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    pub model_loaded: bool,
    pub camera_ok: bool,
}

impl Status {
    pub const LEN: u32 = 2;

    pub fn parse(payload: &[u8]) -> Result<Self, ProtocolError> {
        let bytes = take(payload, Self::LEN as usize)?;
        Ok(Self {
            model_loaded: bytes[0] != 0,
            camera_ok: bytes[1] != 0,
        })
    }
}

/// Size of the frame carried by a CAPTURE reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameInfo {
    pub width: u16,
    pub height: u16,
}

impl FrameInfo {
    pub fn parse(payload: &[u8]) -> Result<Self, ProtocolError> {
        let bytes = take(payload, FRAME_INFO_LEN)?;
        Ok(Self {
            width: u16::from_le_bytes([bytes[0], bytes[1]]),
            height: u16::from_le_bytes([bytes[2], bytes[3]]),
        })
    }

    /// RGB888 bytes following the size prefix
    pub const fn pixel_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Checks a CAPTURE payload length against the frame size it announces
    pub fn check_len(&self, payload_len: u32, capacity: usize) -> Result<(), ProtocolError> {
        let expected = FRAME_INFO_LEN + self.pixel_len();
        if payload_len as usize != expected || self.pixel_len() > capacity {
            return Err(ProtocolError::Length(payload_len));
        }
        Ok(())
    }
}

/// Header and size prefix of an INFER request for a `size` x `size` image
pub fn infer_request(size: u16) -> [u8; HEADER_LEN + INFER_PREFIX_LEN] {
    let image = u32::from(size) * u32::from(size) * 3;
    let header = Header::new(Opcode::Infer, INFER_PREFIX_LEN as u32 + image).encode();
    let size = size.to_le_bytes();
    let mut out = [0; HEADER_LEN + INFER_PREFIX_LEN];
    out[..HEADER_LEN].copy_from_slice(&header);
    out[HEADER_LEN..].copy_from_slice(&size);
    out
}

/// Parses an INFER reply payload
///
/// Records beyond the capacity of [`RawDetections`] are dropped.
pub fn parse_detections(payload: &[u8]) -> Result<RawDetections, ProtocolError> {
    let count = usize::from(take(payload, 1)?[0]);
    let records = take(&payload[1..], count * DETECTION_RECORD_LEN)?;

    let mut out = RawDetections::new();
    for record in records.chunks_exact(DETECTION_RECORD_LEN) {
        let f = |i: usize| {
            let at = i * 4;
            f32::from_le_bytes([record[at], record[at + 1], record[at + 2], record[at + 3]])
        };
        let detection = RawDetection {
            bbox: BoundingBox::new(f(0), f(1), f(2), f(3)),
            confidence: f(4),
            class_id: u16::from_le_bytes([record[20], record[21]]),
        };
        if out.push(detection).is_err() {
            debug!("dropping {} detections over capacity", count - out.len());
            break;
        }
    }
    Ok(out)
}

/// Length needed for an INFER reply payload holding `count` records
pub const fn detections_len(count: u8) -> usize {
    1 + count as usize * DETECTION_RECORD_LEN
}

fn take(bytes: &[u8], needed: usize) -> Result<&[u8], ProtocolError> {
    bytes.get(..needed).ok_or(ProtocolError::Truncated {
        needed,
        available: bytes.len(),
    })
}
