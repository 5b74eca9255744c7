#![cfg_attr(not(test), no_std)]

//! Async driver for the Nova SDS011 particulate-matter sensor.
//!
//! The sensor speaks a fixed-width framed protocol over UART and has two
//! reporting modes which need different read strategies:
//!
//! - in **querying** mode it answers each command with exactly one frame;
//! - in **active** mode it pushes a data report every measurement cycle, and
//!   command acknowledgements arrive interleaved with those pushes.
//!
//! [`Sds011`] is one protocol engine parameterized by a [`Mode`] strategy;
//! [`QueryReader`] and [`ActiveReader`] are the two instantiations.
//!
//! Operations are sequential: each one writes (at most) one command, waits the
//! configured settle delay and reads until it has its answer or the transport
//! times out. Changing the reporting mode always resets the transport
//! connection afterwards, since the sensor's queued replies cannot be trusted
//! across a mode change.

use core::marker::PhantomData;

use embedded_hal_async::delay::DelayNs;
use log::{debug, error, warn};

mod constants;
pub use constants::*;

mod error;
pub use error::*;

mod config;
pub use config::*;

pub mod command;
pub use command::Command;

pub mod frame;
pub use frame::{CommandFrame, ResponseFrame};

pub mod response;
pub use response::*;

mod transport;
pub use transport::Transport;

mod mode;
pub use mode::{ActiveMode, Link, Mode, QueryMode};

#[cfg(test)]
mod mock;

/// Represents an SDS011 air quality sensor.
///
/// # Type Parameters
///
/// * `S`: The transport used to talk to the sensor.
/// * `D`: The delay provider used for the settle delay after each command.
/// * `M`: The reporting mode the sensor is assumed to be in.
pub struct Sds011<S, D, M> {
    link: Link<S, D>,
    _mode: PhantomData<M>,
}

/// A reader for a sensor in querying mode.
pub type QueryReader<S, D> = Sds011<S, D, QueryMode>;

/// A reader for a sensor in active mode.
pub type ActiveReader<S, D> = Sds011<S, D, ActiveMode>;

fn wrong_shape<E>(command: &Command, response: &Response) -> Error<E> {
    error!("{:?} produced a {:?} response", command, response);
    Error::UnexpectedResponse(Unexpected::Command {
        expected: command.code(),
        got: response.command_code(),
    })
}

impl<S, D, M> Sds011<S, D, M>
where
    S: Transport,
    D: DelayNs,
    M: Mode,
{
    /// Creates a new reader.
    ///
    /// Nothing is sent to the sensor; call [`Sds011::init`] to bring it into
    /// the reporting mode the reader expects.
    ///
    /// # Arguments
    ///
    /// * `serial`: The transport connected to the sensor.
    /// * `delay`: The delay provider.
    /// * `config`: The reader configuration.
    pub fn new(serial: S, delay: D, config: Config) -> Self {
        Self {
            link: Link {
                serial,
                delay,
                config,
            },
            _mode: PhantomData,
        }
    }

    pub fn config(&self) -> &Config {
        &self.link.config
    }

    /// The reporting mode this reader assumes the sensor is in.
    pub fn reporting_mode(&self) -> ReportingMode {
        M::REPORTING_MODE
    }

    /// Returns the owned transport and delay provider.
    pub fn into_inner(self) -> (S, D) {
        (self.link.serial, self.link.delay)
    }

    /// Brings a sensor in an unknown state into this reader's reporting mode.
    ///
    /// This involves:
    /// - Waking the sensor without waiting for an answer (see [`Sds011::safe_wake`]).
    /// - Setting the reporting mode. The acknowledgement is searched for the
    ///   way active mode does it, since the sensor may still be pushing data.
    pub async fn init(&mut self) -> Result<(), Error<S::Error>> {
        self.safe_wake().await.map_err(|e| {
            error!("Failed to wake sensor during init: {:?}", e);
            e
        })?;

        let command = Command::SetReportingMode(M::REPORTING_MODE);
        let frame = ActiveMode::exchange(&mut self.link, &command).await;
        self.complete(command, frame).await.map_err(|e| {
            error!(
                "Failed to set reporting mode to {:?} during init: {:?}",
                M::REPORTING_MODE,
                e
            );
            e
        })?;

        debug!("SDS011 init sequence complete.");
        Ok(())
    }

    /// Sends `command` and returns the sensor's decoded answer.
    ///
    /// Arguments are validated before anything is written. A data query does
    /// not write anything in active mode; the next pushed report is returned
    /// instead.
    pub async fn execute(&mut self, command: Command) -> Result<Response, Error<S::Error>> {
        command.validate().map_err(|e| {
            error!("Rejected {:?}: {}", command, e);
            Error::from(e)
        })?;

        let frame = match command {
            Command::QueryData => M::poll(&mut self.link).await,
            _ => M::exchange(&mut self.link, &command).await,
        };
        self.complete(command, frame).await
    }

    // Parses the answer and applies the state changes a command implies.
    async fn complete(
        &mut self,
        command: Command,
        frame: Result<ResponseFrame, Error<S::Error>>,
    ) -> Result<Response, Error<S::Error>> {
        let response = frame.and_then(|frame| {
            parse_response(&frame, &command).map_err(|e| {
                warn!("Unexpected reply to {:?}: {}", command, e);
                Error::from(e)
            })
        });

        match command {
            Command::SetReportingMode(mode) => {
                // Reset the link whatever the outcome of the exchange.
                let reconnected = self.link.reconnect().await;
                let response = response?;
                reconnected.map_err(|e| {
                    error!("Failed to reconnect after reporting mode change: {:?}", e);
                    e
                })?;
                debug!("Reporting mode set to {:?}", mode);
                Ok(response)
            }
            Command::SetDeviceId(new_id) => {
                let response = response?;
                if !self.link.config.target.is_wildcard() {
                    debug!("Retargeting reader to device {:?}", new_id);
                    self.link.config.target = new_id;
                }
                Ok(response)
            }
            _ => response,
        }
    }

    /// Reads a single PM2.5/PM10 sample.
    ///
    /// In querying mode the sensor is asked for data. In active mode the
    /// transport is reset and the next report the sensor pushes is returned.
    pub async fn query(&mut self) -> Result<Pollutants, Error<S::Error>> {
        let command = Command::QueryData;
        match self.execute(command).await? {
            Response::Pollutants(data) => {
                debug!("PM2.5: {}, PM10: {}", data.pm25, data.pm10);
                Ok(data)
            }
            other => Err(wrong_shape(&command, &other)),
        }
    }

    /// Sets the sensor's reporting mode.
    ///
    /// The reader keeps its own read strategy; use [`Sds011::into_mode`] (or
    /// `into_query`/`into_active`) to switch both together. The transport is
    /// reconnected afterwards, even if no acknowledgement arrived.
    pub async fn set_reporting_mode(
        &mut self,
        mode: ReportingMode,
    ) -> Result<ReportingModeResponse, Error<S::Error>> {
        let command = Command::SetReportingMode(mode);
        match self.execute(command).await? {
            Response::ReportingMode(reply) => Ok(reply),
            other => Err(wrong_shape(&command, &other)),
        }
    }

    /// Queries the sensor's current reporting mode.
    pub async fn get_reporting_mode(&mut self) -> Result<ReportingModeResponse, Error<S::Error>> {
        let command = Command::GetReportingMode;
        match self.execute(command).await? {
            Response::ReportingMode(reply) => Ok(reply),
            other => Err(wrong_shape(&command, &other)),
        }
    }

    /// Puts the sensor to sleep, turning off fan and laser.
    pub async fn sleep(&mut self) -> Result<SleepStateResponse, Error<S::Error>> {
        self.sleep_state_command(Command::SetSleep).await
    }

    /// Wakes the sensor up, turning on fan and laser.
    pub async fn wake(&mut self) -> Result<SleepStateResponse, Error<S::Error>> {
        self.sleep_state_command(Command::SetWake).await
    }

    /// Queries whether the sensor is asleep.
    pub async fn get_sleep_state(&mut self) -> Result<SleepStateResponse, Error<S::Error>> {
        self.sleep_state_command(Command::GetSleepState).await
    }

    async fn sleep_state_command(
        &mut self,
        command: Command,
    ) -> Result<SleepStateResponse, Error<S::Error>> {
        match self.execute(command).await? {
            Response::SleepState(reply) => Ok(reply),
            other => Err(wrong_shape(&command, &other)),
        }
    }

    /// Wakes the sensor without expecting an answer.
    ///
    /// Useful when the sensor's mode is unknown: a sleeping sensor in querying
    /// mode answers, one in active mode may push data instead. Whatever it
    /// sends is dropped by resetting the transport after the settle delay.
    pub async fn safe_wake(&mut self) -> Result<(), Error<S::Error>> {
        debug!("Waking sensor without reading a reply");
        self.link.send(&Command::SetWake).await?;
        self.link.settle().await;
        self.link.reconnect().await
    }

    /// Sets the sensor's working period.
    ///
    /// - A value of `0` sets the sensor to continuous working mode.
    /// - Values from `1` to `30` make the sensor work for 30 seconds, then
    ///   sleep for the rest of `period` minutes.
    ///
    /// # Returns
    ///
    /// * `Ok(WorkingPeriodResponse)` echoing the new period.
    /// * `Err(Error::InvalidArgument)` if `period` is greater than 30; nothing
    ///   is sent in that case.
    pub async fn set_working_period(
        &mut self,
        period: u8,
    ) -> Result<WorkingPeriodResponse, Error<S::Error>> {
        let command = Command::SetWorkingPeriod(period);
        match self.execute(command).await? {
            Response::WorkingPeriod(reply) => Ok(reply),
            other => Err(wrong_shape(&command, &other)),
        }
    }

    /// Queries the sensor's current working period.
    pub async fn get_working_period(&mut self) -> Result<WorkingPeriodResponse, Error<S::Error>> {
        let command = Command::GetWorkingPeriod;
        match self.execute(command).await? {
            Response::WorkingPeriod(reply) => Ok(reply),
            other => Err(wrong_shape(&command, &other)),
        }
    }

    /// Assigns a new device ID to the addressed sensor.
    ///
    /// If the reader targets a specific device, it follows that device to its
    /// new ID. A reader targeting all devices keeps doing so.
    ///
    /// # Returns
    ///
    /// * `Ok(DeviceId)` the ID the sensor acknowledged with.
    pub async fn set_device_id(&mut self, new_id: DeviceId) -> Result<DeviceId, Error<S::Error>> {
        let command = Command::SetDeviceId(new_id);
        match self.execute(command).await? {
            Response::DeviceId(id) => Ok(id),
            other => Err(wrong_shape(&command, &other)),
        }
    }

    /// Retrieves the firmware release date of the sensor.
    pub async fn get_firmware_version(&mut self) -> Result<FirmwareVersion, Error<S::Error>> {
        let command = Command::GetFirmwareVersion;
        match self.execute(command).await? {
            Response::FirmwareVersion(version) => {
                debug!(
                    "Firmware version: 20{:02}-{:02}-{:02}",
                    version.year, version.month, version.day
                );
                Ok(version)
            }
            other => Err(wrong_shape(&command, &other)),
        }
    }

    /// Switches the sensor to `N`'s reporting mode and returns a reader for it.
    ///
    /// On failure the unchanged reader is handed back with the error.
    pub async fn into_mode<N: Mode>(
        mut self,
    ) -> Result<Sds011<S, D, N>, (Self, Error<S::Error>)> {
        match self.set_reporting_mode(N::REPORTING_MODE).await {
            Ok(_) => Ok(Sds011 {
                link: self.link,
                _mode: PhantomData,
            }),
            Err(e) => Err((self, e)),
        }
    }
}

impl<S, D> QueryReader<S, D>
where
    S: Transport,
    D: DelayNs,
{
    /// Switches the sensor to active mode.
    pub async fn into_active(self) -> Result<ActiveReader<S, D>, (Self, Error<S::Error>)> {
        self.into_mode().await
    }
}

impl<S, D> ActiveReader<S, D>
where
    S: Transport,
    D: DelayNs,
{
    /// Switches the sensor to querying mode.
    pub async fn into_query(self) -> Result<QueryReader<S, D>, (Self, Error<S::Error>)> {
        self.into_mode().await
    }
}
