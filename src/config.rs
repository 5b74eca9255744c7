use crate::error::InvalidArgument;

/// Represents the reporting mode of the SDS011 sensor.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum ReportingMode {
    /// In Active mode, the sensor automatically reports data.
    Active,
    /// In Querying mode, the sensor only reports data when queried.
    Querying,
}

impl ReportingMode {
    pub(crate) fn to_byte(self) -> u8 {
        match self {
            ReportingMode::Active => 0x00,
            ReportingMode::Querying => 0x01,
        }
    }

    pub(crate) fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(ReportingMode::Active),
            0x01 => Some(ReportingMode::Querying),
            _ => None,
        }
    }
}

/// Represents the 2-byte identifier of the SDS011 sensor.
///
/// [`DeviceId::ALL`] addresses every sensor on the line when sent, and
/// matches any sensor when used to filter replies.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
pub struct DeviceId {
    /// The first byte of the device ID.
    pub id1: u8,
    /// The second byte of the device ID.
    pub id2: u8,
}

impl DeviceId {
    /// The wildcard id.
    pub const ALL: DeviceId = DeviceId {
        id1: 0xff,
        id2: 0xff,
    };

    pub const fn new(id1: u8, id2: u8) -> DeviceId {
        DeviceId { id1, id2 }
    }

    pub const fn bytes(&self) -> [u8; 2] {
        [self.id1, self.id2]
    }

    pub fn is_wildcard(&self) -> bool {
        *self == DeviceId::ALL
    }

    /// Returns `true` if a frame carrying `other` is addressed to this id.
    pub fn matches(&self, other: DeviceId) -> bool {
        self.is_wildcard() || *self == other
    }
}

impl Default for DeviceId {
    /// Returns the wildcard device id.
    fn default() -> DeviceId {
        DeviceId::ALL
    }
}

impl From<[u8; 2]> for DeviceId {
    fn from(bytes: [u8; 2]) -> Self {
        DeviceId::new(bytes[0], bytes[1])
    }
}

impl TryFrom<&[u8]> for DeviceId {
    type Error = InvalidArgument;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        match bytes {
            [id1, id2] => Ok(DeviceId::new(*id1, *id2)),
            _ => Err(InvalidArgument::DeviceIdLength(bytes.len())),
        }
    }
}

/// Configuration settings for a reader.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Config {
    /// The device ID commands are addressed to and replies are filtered by.
    pub target: DeviceId,
    /// Pause between writing a command and reading its reply, in milliseconds.
    pub settle_delay_ms: u32,
    /// In active mode, how many frames may be read and discarded while
    /// waiting for a command acknowledgement.
    pub ack_attempts: u8,
}

impl Config {
    /// Creates a new `Config` instance.
    ///
    /// # Arguments
    ///
    /// * `target` - The `DeviceId` to address.
    /// * `settle_delay_ms` - The delay after each command write, in milliseconds.
    ///
    /// # Returns
    ///
    /// A new `Config` instance with the default acknowledgement bound.
    pub fn new(target: DeviceId, settle_delay_ms: u32) -> Config {
        Config {
            target,
            settle_delay_ms,
            ..Config::default()
        }
    }
    /// Sets the target device ID for the configuration.
    pub fn target(mut self, target: DeviceId) -> Self {
        self.target = target;
        self
    }
    /// Sets the settle delay for the configuration.
    pub fn settle_delay_ms(mut self, settle_delay_ms: u32) -> Self {
        self.settle_delay_ms = settle_delay_ms;
        self
    }
    /// Sets the number of frames active mode reads before giving up on an
    /// acknowledgement.
    pub fn ack_attempts(mut self, ack_attempts: u8) -> Self {
        self.ack_attempts = ack_attempts;
        self
    }
}

/// Provides default configuration values for a reader.
impl Default for Config {
    /// Returns the default configuration.
    ///
    /// The default configuration targets the wildcard device ID `0xFFFF`,
    /// waits one second after each write, and reads at most ten frames while
    /// looking for an acknowledgement in active mode.
    fn default() -> Config {
        Config {
            target: DeviceId::ALL,
            settle_delay_ms: 1000,
            ack_attempts: 10,
        }
    }
}
