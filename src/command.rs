//! SDS011 command catalog.

use crate::config::{DeviceId, ReportingMode};
use crate::constants::*;
use crate::error::{DecodeError, InvalidArgument};
use crate::frame::CommandFrame;

/// Commands understood by the SDS011 sensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Ask for the latest PM2.5/PM10 reading.
    QueryData,
    SetReportingMode(ReportingMode),
    GetReportingMode,
    /// Set the duty cycle in minutes. `0` means continuous operation.
    SetWorkingPeriod(u8),
    GetWorkingPeriod,
    /// Turn off fan and laser.
    SetSleep,
    /// Turn fan and laser back on.
    SetWake,
    GetSleepState,
    /// Assign a new id to the addressed sensor.
    SetDeviceId(DeviceId),
    GetFirmwareVersion,
}

impl Command {
    /// Command code carried in byte 2 of the request and of its reply.
    pub fn code(&self) -> u8 {
        match self {
            Self::QueryData => CMD_QUERY_DATA,
            Self::SetReportingMode(_) | Self::GetReportingMode => CMD_REPORTING_MODE,
            Self::SetWorkingPeriod(_) | Self::GetWorkingPeriod => CMD_WORKING_PERIOD,
            Self::SetSleep | Self::SetWake | Self::GetSleepState => CMD_SLEEP,
            Self::SetDeviceId(_) => CMD_DEVICE_ID,
            Self::GetFirmwareVersion => CMD_FIRMWARE,
        }
    }

    /// Class byte of the frame the sensor answers with.
    pub fn response_class(&self) -> u8 {
        match self {
            Self::QueryData => DATA_REPORT_ID,
            _ => REPLY_ID,
        }
    }

    /// The twelve data bytes following the command code, zero where unused.
    pub fn data(&self) -> [u8; 12] {
        let mut data = [0u8; 12];
        match self {
            Self::QueryData | Self::GetFirmwareVersion => {}
            Self::GetReportingMode | Self::GetWorkingPeriod | Self::GetSleepState => {
                data[0] = OP_QUERY;
            }
            Self::SetReportingMode(mode) => {
                data[0] = OP_SET;
                data[1] = mode.to_byte();
            }
            Self::SetWorkingPeriod(period) => {
                data[0] = OP_SET;
                data[1] = *period;
            }
            Self::SetSleep => {
                data[0] = OP_SET;
                data[1] = 0x00;
            }
            Self::SetWake => {
                data[0] = OP_SET;
                data[1] = 0x01;
            }
            Self::SetDeviceId(new_id) => {
                data[10] = new_id.id1;
                data[11] = new_id.id2;
            }
        }
        data
    }

    /// Checks argument ranges.
    pub fn validate(&self) -> Result<(), InvalidArgument> {
        match self {
            Self::SetWorkingPeriod(period) if *period > MAX_WORKING_PERIOD => {
                Err(InvalidArgument::WorkingPeriod(*period))
            }
            _ => Ok(()),
        }
    }

    /// Encodes the command into a frame addressed to `device_id`.
    pub fn build_request(&self, device_id: DeviceId) -> Result<CommandFrame, InvalidArgument> {
        CommandFrame::encode(self, device_id)
    }

    /// Recovers the command carried by a validated request frame.
    pub fn from_request(frame: &CommandFrame) -> Result<Self, RequestError> {
        let data = frame.data();
        let operation = data[0];
        let value = data[1];
        let undefined = |offset: usize, value: u8| RequestError::UndefinedValue { offset, value };

        let command = match (frame.code(), operation) {
            (CMD_QUERY_DATA, _) => Self::QueryData,
            (CMD_FIRMWARE, _) => Self::GetFirmwareVersion,
            (CMD_DEVICE_ID, _) => Self::SetDeviceId(DeviceId::new(data[10], data[11])),
            (CMD_REPORTING_MODE, OP_QUERY) => Self::GetReportingMode,
            (CMD_REPORTING_MODE, OP_SET) => Self::SetReportingMode(
                ReportingMode::from_byte(value).ok_or(undefined(4, value))?,
            ),
            (CMD_WORKING_PERIOD, OP_QUERY) => Self::GetWorkingPeriod,
            (CMD_WORKING_PERIOD, OP_SET) => Self::SetWorkingPeriod(value),
            (CMD_SLEEP, OP_QUERY) => Self::GetSleepState,
            (CMD_SLEEP, OP_SET) => match value {
                0x00 => Self::SetSleep,
                0x01 => Self::SetWake,
                _ => return Err(undefined(4, value)),
            },
            (CMD_REPORTING_MODE | CMD_WORKING_PERIOD | CMD_SLEEP, _) => {
                return Err(undefined(3, operation))
            }
            (code, _) => return Err(RequestError::UnknownCode(code)),
        };
        Ok(command)
    }

    /// Decodes raw request bytes into the command and the addressed device.
    pub fn parse_request(bytes: &[u8]) -> Result<(Self, DeviceId), RequestError> {
        let frame = CommandFrame::decode(bytes).map_err(RequestError::Decode)?;
        let command = Self::from_request(&frame)?;
        Ok((command, frame.device_id()))
    }
}

/// Failure to interpret raw request bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    Decode(DecodeError),
    UnknownCode(u8),
    /// An operation or value byte outside its defined set.
    UndefinedValue { offset: usize, value: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_COMMANDS: [Command; 14] = [
        Command::QueryData,
        Command::SetReportingMode(ReportingMode::Active),
        Command::SetReportingMode(ReportingMode::Querying),
        Command::GetReportingMode,
        Command::SetWorkingPeriod(0),
        Command::SetWorkingPeriod(1),
        Command::SetWorkingPeriod(30),
        Command::GetWorkingPeriod,
        Command::SetSleep,
        Command::SetWake,
        Command::GetSleepState,
        Command::SetDeviceId(DeviceId::new(0x12, 0x23)),
        Command::GetFirmwareVersion,
        Command::SetWorkingPeriod(10),
    ];

    #[test]
    fn every_command_survives_the_wire() {
        let target = DeviceId::new(0xBB, 0xAA);
        for command in ALL_COMMANDS {
            let frame = command.build_request(target).unwrap();
            assert_eq!(
                Command::parse_request(frame.as_ref()),
                Ok((command, target)),
                "{:?}",
                command
            );
        }
    }

    #[test]
    fn set_device_id_places_new_id_before_target() {
        let frame = Command::SetDeviceId(DeviceId::new(0x12, 0x23))
            .build_request(DeviceId::ALL)
            .unwrap();
        let bytes = frame.as_ref();
        assert_eq!(bytes[2], CMD_DEVICE_ID);
        assert_eq!(&bytes[13..17], &[0x12, 0x23, 0xFF, 0xFF]);
    }

    #[test]
    fn sleep_and_wake_differ_only_in_value_byte() {
        assert_eq!(Command::SetSleep.data()[..2], [OP_SET, 0x00]);
        assert_eq!(Command::SetWake.data()[..2], [OP_SET, 0x01]);
        assert_eq!(Command::GetSleepState.data()[..2], [OP_QUERY, 0x00]);
    }

    #[test]
    fn only_query_data_expects_data_report() {
        for command in ALL_COMMANDS {
            let expected = if command == Command::QueryData {
                DATA_REPORT_ID
            } else {
                REPLY_ID
            };
            assert_eq!(command.response_class(), expected);
        }
    }

    #[test]
    fn working_period_range() {
        for period in [0, 1, 10, 30] {
            assert_eq!(Command::SetWorkingPeriod(period).validate(), Ok(()));
        }
        assert_eq!(
            Command::SetWorkingPeriod(31).validate(),
            Err(InvalidArgument::WorkingPeriod(31))
        );
    }

    #[test]
    fn parse_request_rejects_unknown_code() {
        let mut bytes = Command::GetFirmwareVersion
            .build_request(DeviceId::ALL)
            .unwrap()
            .into_inner();
        bytes[2] = 0x09;
        bytes[17] = bytes[17].wrapping_add(2);
        assert_eq!(
            Command::parse_request(&bytes),
            Err(RequestError::UnknownCode(0x09))
        );
    }
}
