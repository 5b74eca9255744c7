//! Typed replies and the mapping from received frames to them.

use crate::command::Command;
use crate::config::{DeviceId, ReportingMode};
use crate::constants::*;
use crate::error::Unexpected;
use crate::frame::ResponseFrame;

/// Whether a reply acknowledges a change or reports the current setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Query,
    Set,
}

/// Represents the sleep state of the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepState {
    /// Fan and laser are off, commands other than sleep/wake are ignored.
    Asleep,
    /// Sensor is actively taking measurements.
    Awake,
}

/// A single PM2.5/PM10 sample, in µg/m³.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pollutants {
    /// The PM2.5 concentration.
    pub pm25: f32,
    /// The PM10 concentration.
    pub pm10: f32,
    /// The sensor that produced the sample.
    pub device_id: DeviceId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingModeResponse {
    /// Whether the reply acknowledges a change or reports the current mode.
    pub operation: Operation,
    /// The reporting mode the sensor is now in.
    pub mode: ReportingMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepStateResponse {
    /// Whether the reply acknowledges a change or reports the current state.
    pub operation: Operation,
    /// The sleep state the sensor is now in.
    pub state: SleepState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingPeriodResponse {
    /// Whether the reply acknowledges a change or reports the current period.
    pub operation: Operation,
    /// Minutes between measurements, `0` for continuous.
    pub interval: u8,
}

/// Firmware release date, two-digit year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    /// Year of the release, without the century.
    pub year: u8,
    /// Month of the release.
    pub month: u8,
    /// Day of the release.
    pub day: u8,
}

/// A decoded reply, one variant per command family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Response {
    Pollutants(Pollutants),
    ReportingMode(ReportingModeResponse),
    SleepState(SleepStateResponse),
    WorkingPeriod(WorkingPeriodResponse),
    /// The id the sensor now answers to.
    DeviceId(DeviceId),
    FirmwareVersion(FirmwareVersion),
}

impl Response {
    /// Command code of the command family this response answers.
    pub fn command_code(&self) -> u8 {
        match self {
            Self::Pollutants(_) => CMD_QUERY_DATA,
            Self::ReportingMode(_) => CMD_REPORTING_MODE,
            Self::SleepState(_) => CMD_SLEEP,
            Self::WorkingPeriod(_) => CMD_WORKING_PERIOD,
            Self::DeviceId(_) => CMD_DEVICE_ID,
            Self::FirmwareVersion(_) => CMD_FIRMWARE,
        }
    }
}

fn operation(payload: &[u8]) -> Result<Operation, Unexpected> {
    match payload[1] {
        OP_QUERY => Ok(Operation::Query),
        OP_SET => Ok(Operation::Set),
        value => Err(Unexpected::Value { offset: 3, value }),
    }
}

fn concentration(low: u8, high: u8) -> f32 {
    f32::from(u16::from_le_bytes([low, high])) / 10.0
}

/// Interprets `frame` as the answer to `expected`.
///
/// Fails if the frame class or command code belongs to another command, or if
/// a field carries a value the protocol does not define.
pub fn parse_response(frame: &ResponseFrame, expected: &Command) -> Result<Response, Unexpected> {
    let class = expected.response_class();
    if frame.class_id() != class {
        return Err(Unexpected::Class {
            expected: class,
            got: frame.class_id(),
        });
    }

    let p = frame.payload();
    if class == REPLY_ID && p[0] != expected.code() {
        return Err(Unexpected::Command {
            expected: expected.code(),
            got: p[0],
        });
    }

    let response = match expected {
        Command::QueryData => Response::Pollutants(Pollutants {
            pm25: concentration(p[0], p[1]),
            pm10: concentration(p[2], p[3]),
            device_id: frame.device_id(),
        }),
        Command::SetReportingMode(_) | Command::GetReportingMode => {
            let mode = ReportingMode::from_byte(p[2]).ok_or(Unexpected::Value {
                offset: 4,
                value: p[2],
            })?;
            Response::ReportingMode(ReportingModeResponse {
                operation: operation(p)?,
                mode,
            })
        }
        Command::SetSleep | Command::SetWake | Command::GetSleepState => {
            let state = match p[2] {
                0x00 => SleepState::Asleep,
                0x01 => SleepState::Awake,
                value => return Err(Unexpected::Value { offset: 4, value }),
            };
            Response::SleepState(SleepStateResponse {
                operation: operation(p)?,
                state,
            })
        }
        Command::SetWorkingPeriod(_) | Command::GetWorkingPeriod => {
            Response::WorkingPeriod(WorkingPeriodResponse {
                operation: operation(p)?,
                interval: p[2],
            })
        }
        Command::SetDeviceId(_) => Response::DeviceId(frame.device_id()),
        Command::GetFirmwareVersion => Response::FirmwareVersion(FirmwareVersion {
            year: p[1],
            month: p[2],
            day: p[3],
        }),
    };
    Ok(response)
}
