use core::fmt::{self, Display, Formatter};

/// Errors returned by reader operations.
///
/// `E` is the error type of the underlying transport.
#[derive(Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// The transport failed to open, close, read or write.
    Transport(E),
    /// A received frame has the wrong length or wrong head/tail marker.
    Frame(FrameError),
    /// A received frame is well delimited but its checksum does not add up.
    ChecksumMismatch { transmitted: u8, computed: u8 },
    /// A valid frame arrived that does not answer the command in flight.
    UnexpectedResponse(Unexpected),
    /// No answering frame arrived in time.
    ResponseTimeout,
    /// A command argument was out of range; nothing was sent.
    InvalidArgument(InvalidArgument),
}

/// Structural framing problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The frame is not the fixed length for its direction.
    Length { expected: usize, got: usize },
    InvalidHead(u8),
    InvalidTail(u8),
    /// A command frame does not carry the command class byte.
    InvalidClass(u8),
}

/// Failure to decode raw bytes into a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    Frame(FrameError),
    Checksum { transmitted: u8, computed: u8 },
}

/// Ways a valid frame can fail to answer the command in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unexpected {
    /// The frame class (data report or reply) is wrong for the command.
    Class { expected: u8, got: u8 },
    /// A reply frame names a different command code.
    Command { expected: u8, got: u8 },
    /// The frame comes from a device other than the one addressed.
    DeviceId {
        expected: crate::DeviceId,
        got: crate::DeviceId,
    },
    /// A field holds a value outside its defined set.
    Value { offset: usize, value: u8 },
}

/// Command arguments rejected before any I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidArgument {
    /// Working period must be within 0 to 30 minutes.
    WorkingPeriod(u8),
    /// Device ids are exactly two bytes.
    DeviceIdLength(usize),
}

impl<E> From<DecodeError> for Error<E> {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Frame(frame) => Error::Frame(frame),
            DecodeError::Checksum {
                transmitted,
                computed,
            } => Error::ChecksumMismatch {
                transmitted,
                computed,
            },
        }
    }
}

impl<E> From<Unexpected> for Error<E> {
    fn from(err: Unexpected) -> Self {
        Error::UnexpectedResponse(err)
    }
}

impl<E> From<InvalidArgument> for Error<E> {
    fn from(err: InvalidArgument) -> Self {
        Error::InvalidArgument(err)
    }
}

impl From<FrameError> for DecodeError {
    fn from(err: FrameError) -> Self {
        DecodeError::Frame(err)
    }
}

impl<E: Display> Display for Error<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "transport error: {}", err),
            Self::Frame(err) => write!(f, "frame error: {}", err),
            Self::ChecksumMismatch {
                transmitted,
                computed,
            } => write!(
                f,
                "checksum mismatch: frame carries 0x{:02x}, computed 0x{:02x}",
                transmitted, computed
            ),
            Self::UnexpectedResponse(err) => write!(f, "unexpected response: {}", err),
            Self::ResponseTimeout => write!(f, "no response from sensor"),
            Self::InvalidArgument(err) => write!(f, "invalid argument: {}", err),
        }
    }
}

impl Display for FrameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length { expected, got } => {
                write!(f, "expected {} bytes, got {}", expected, got)
            }
            Self::InvalidHead(got) => write!(f, "expected head byte 0xaa, got 0x{:02x}", got),
            Self::InvalidTail(got) => write!(f, "expected tail byte 0xab, got 0x{:02x}", got),
            Self::InvalidClass(got) => {
                write!(f, "expected command class 0xb4, got 0x{:02x}", got)
            }
        }
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frame(err) => Display::fmt(err, f),
            Self::Checksum {
                transmitted,
                computed,
            } => write!(
                f,
                "checksum 0x{:02x} does not match computed 0x{:02x}",
                transmitted, computed
            ),
        }
    }
}

impl Display for Unexpected {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class { expected, got } => write!(
                f,
                "expected frame class 0x{:02x}, got 0x{:02x}",
                expected, got
            ),
            Self::Command { expected, got } => write!(
                f,
                "expected reply to command 0x{:02x}, got 0x{:02x}",
                expected, got
            ),
            Self::DeviceId { expected, got } => write!(
                f,
                "expected device {:02x}{:02x}, got {:02x}{:02x}",
                expected.id1, expected.id2, got.id1, got.id2
            ),
            Self::Value { offset, value } => {
                write!(f, "byte {} holds undefined value 0x{:02x}", offset, value)
            }
        }
    }
}

impl Display for InvalidArgument {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorkingPeriod(period) => {
                write!(f, "working period {} out of range (0-30)", period)
            }
            Self::DeviceIdLength(len) => write!(f, "device id must be 2 bytes, got {}", len),
        }
    }
}

impl<E: fmt::Debug + Display> core::error::Error for Error<E> {}
impl core::error::Error for DecodeError {}
impl core::error::Error for InvalidArgument {}
