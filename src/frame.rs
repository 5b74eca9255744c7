//! Byte-level framing of the SDS011 serial protocol.
//!
//! Command frames (host to sensor) are 19 bytes:
//!
//! ```text
//! AA B4 CMD D1..D12 ID1 ID2 CS AB
//! ```
//!
//! Response frames (sensor to host) are 10 bytes:
//!
//! ```text
//! AA CLASS D1 D2 D3 D4 ID1 ID2 CS AB
//! ```
//!
//! In both directions the checksum is the wrapping sum of every byte between
//! the class byte and the checksum byte.

use core::fmt;

use crate::command::Command;
use crate::config::DeviceId;
use crate::constants::*;
use crate::error::{DecodeError, FrameError, InvalidArgument};

fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

fn check_delimiters(bytes: &[u8], expected_len: usize) -> Result<(), FrameError> {
    if bytes.len() != expected_len {
        return Err(FrameError::Length {
            expected: expected_len,
            got: bytes.len(),
        });
    }
    if bytes[0] != HEAD {
        return Err(FrameError::InvalidHead(bytes[0]));
    }
    if bytes[expected_len - 1] != TAIL {
        return Err(FrameError::InvalidTail(bytes[expected_len - 1]));
    }
    Ok(())
}

/// A complete command frame, ready to be written to the sensor.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame([u8; COMMAND_FRAME_LEN]);

impl CommandFrame {
    /// Encodes `command` addressed to `device_id`.
    ///
    /// Fails if one of the command's arguments is out of range.
    pub fn encode(command: &Command, device_id: DeviceId) -> Result<Self, InvalidArgument> {
        command.validate()?;

        let mut buf = [0u8; COMMAND_FRAME_LEN];
        buf[0] = HEAD;
        buf[1] = COMMAND_ID;
        buf[2] = command.code();
        buf[3..15].copy_from_slice(&command.data());
        buf[15..17].copy_from_slice(&device_id.bytes());
        buf[17] = checksum(&buf[2..17]);
        buf[18] = TAIL;
        Ok(Self(buf))
    }

    /// Validates a raw command frame, as the sensor would on receipt.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        check_delimiters(bytes, COMMAND_FRAME_LEN)?;
        if bytes[1] != COMMAND_ID {
            return Err(FrameError::InvalidClass(bytes[1]).into());
        }
        let computed = checksum(&bytes[2..17]);
        if computed != bytes[17] {
            return Err(DecodeError::Checksum {
                transmitted: bytes[17],
                computed,
            });
        }

        let mut buf = [0u8; COMMAND_FRAME_LEN];
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    pub fn code(&self) -> u8 {
        self.0[2]
    }

    /// The twelve data bytes following the command code.
    pub fn data(&self) -> &[u8] {
        &self.0[3..15]
    }

    pub fn device_id(&self) -> DeviceId {
        DeviceId::new(self.0[15], self.0[16])
    }

    pub fn checksum(&self) -> u8 {
        self.0[17]
    }

    pub fn into_inner(self) -> [u8; COMMAND_FRAME_LEN] {
        self.0
    }
}

impl AsRef<[u8]> for CommandFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandFrame({:02X?})", self.0)
    }
}

/// A validated frame received from the sensor.
///
/// Only the framing has been checked; whether it answers a given command is
/// decided by [`crate::response::parse_response`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ResponseFrame([u8; RESPONSE_FRAME_LEN]);

impl ResponseFrame {
    /// Builds a response frame of class `class` with a correct checksum.
    pub fn new(class: u8, data: [u8; 4], device_id: DeviceId) -> Self {
        let mut buf = [0u8; RESPONSE_FRAME_LEN];
        buf[0] = HEAD;
        buf[1] = class;
        buf[2..6].copy_from_slice(&data);
        buf[6..8].copy_from_slice(&device_id.bytes());
        buf[8] = checksum(&buf[2..8]);
        buf[9] = TAIL;
        Self(buf)
    }

    /// Validates length, head, tail and checksum of `bytes`.
    ///
    /// Length and delimiters are checked first, so a frame with a bad marker
    /// is always reported as a framing error.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        check_delimiters(bytes, RESPONSE_FRAME_LEN)?;
        let computed = checksum(&bytes[2..8]);
        if computed != bytes[8] {
            return Err(DecodeError::Checksum {
                transmitted: bytes[8],
                computed,
            });
        }

        let mut buf = [0u8; RESPONSE_FRAME_LEN];
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    /// Either [`DATA_REPORT_ID`] or [`REPLY_ID`] for frames sent by a sensor.
    pub fn class_id(&self) -> u8 {
        self.0[1]
    }

    /// The four bytes between the class byte and the device id.
    pub fn payload(&self) -> &[u8] {
        &self.0[2..6]
    }

    pub fn device_id(&self) -> DeviceId {
        DeviceId::new(self.0[6], self.0[7])
    }

    pub fn checksum(&self) -> u8 {
        self.0[8]
    }

    pub fn into_inner(self) -> [u8; RESPONSE_FRAME_LEN] {
        self.0
    }
}

impl AsRef<[u8]> for ResponseFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ResponseFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResponseFrame({:02X?})", self.0)
    }
}
