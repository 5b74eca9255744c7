//! Reporting-mode strategies.
//!
//! The reader engine is the same in both reporting modes; what differs is how
//! the frame answering a command is obtained. [`QueryMode`] expects exactly
//! one reply per request. [`ActiveMode`] has to pick the reply out of a stream
//! of unsolicited data reports.

use embedded_hal_async::delay::DelayNs;
use log::{debug, error, warn};

use crate::command::Command;
use crate::config::{Config, DeviceId, ReportingMode};
use crate::constants::{REPLY_ID, RESPONSE_FRAME_LEN};
use crate::error::{Error, Unexpected};
use crate::frame::ResponseFrame;
use crate::transport::Transport;

/// Transport, delay provider and configuration shared by every exchange.
///
/// Opaque outside this crate; it only appears in [`Mode`] signatures.
pub struct Link<S, D> {
    pub(crate) serial: S,
    pub(crate) delay: D,
    pub(crate) config: Config,
}

impl<S, D> Link<S, D>
where
    S: Transport,
    D: DelayNs,
{
    // Encodes the command for the configured target and writes it out.
    pub(crate) async fn send(&mut self, command: &Command) -> Result<(), Error<S::Error>> {
        let frame = command.build_request(self.config.target)?;
        debug!("Executing command: {:02X?}", frame.as_ref());
        self.serial
            .write_all(frame.as_ref())
            .await
            .map_err(Error::Transport)?;
        self.serial.flush().await.map_err(Error::Transport)?;
        Ok(())
    }

    pub(crate) async fn settle(&mut self) {
        self.delay.delay_ms(self.config.settle_delay_ms).await;
    }

    pub(crate) async fn reconnect(&mut self) -> Result<(), Error<S::Error>> {
        debug!("Reconnecting transport");
        self.serial.reconnect().await.map_err(Error::Transport)
    }

    // Reads one 10-byte frame. Nothing at all within the transport timeout is
    // a timeout; a partial frame is a framing error.
    pub(crate) async fn read_frame(&mut self) -> Result<ResponseFrame, Error<S::Error>> {
        let mut buf = [0u8; RESPONSE_FRAME_LEN];
        let mut filled = 0;
        while filled < RESPONSE_FRAME_LEN {
            let n = self
                .serial
                .read(&mut buf[filled..])
                .await
                .map_err(Error::Transport)?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            debug!("No frame received before read timeout");
            return Err(Error::ResponseTimeout);
        }

        let frame = ResponseFrame::decode(&buf[..filled]).map_err(|e| {
            warn!("Discarding malformed frame {:02X?}: {}", &buf[..filled], e);
            e
        })?;
        debug!("Received frame: {:02X?}", frame.as_ref());
        Ok(frame)
    }

    // The id a reply to `command` must carry. A sensor acknowledges a new id
    // with that new id.
    pub(crate) fn expected_id(&self, command: &Command) -> DeviceId {
        match command {
            Command::SetDeviceId(new_id) if !self.config.target.is_wildcard() => *new_id,
            _ => self.config.target,
        }
    }
}

/// How a reader obtains the frame that answers a command.
///
/// This trait is sealed in practice: [`Link`] exposes nothing outside this
/// crate, so [`QueryMode`] and [`ActiveMode`] are its only implementations.
/// It is public so it can name the reader's mode parameter.
#[allow(async_fn_in_trait)]
pub trait Mode {
    /// The reporting mode the sensor is assumed to be in.
    const REPORTING_MODE: ReportingMode;

    /// Writes `command` and returns the frame answering it.
    async fn exchange<S: Transport, D: DelayNs>(
        link: &mut Link<S, D>,
        command: &Command,
    ) -> Result<ResponseFrame, Error<S::Error>>;

    /// Returns the next pollutant data frame.
    async fn poll<S: Transport, D: DelayNs>(
        link: &mut Link<S, D>,
    ) -> Result<ResponseFrame, Error<S::Error>>;
}

/// Strict request/response: one write, one frame back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryMode;

impl Mode for QueryMode {
    const REPORTING_MODE: ReportingMode = ReportingMode::Querying;

    async fn exchange<S: Transport, D: DelayNs>(
        link: &mut Link<S, D>,
        command: &Command,
    ) -> Result<ResponseFrame, Error<S::Error>> {
        link.send(command).await?;
        link.settle().await;
        let frame = link.read_frame().await?;

        let expected = link.expected_id(command);
        if !expected.matches(frame.device_id()) {
            warn!(
                "Reply from device {:?} while addressing {:?}",
                frame.device_id(),
                expected
            );
            return Err(Unexpected::DeviceId {
                expected,
                got: frame.device_id(),
            }
            .into());
        }
        Ok(frame)
    }

    async fn poll<S: Transport, D: DelayNs>(
        link: &mut Link<S, D>,
    ) -> Result<ResponseFrame, Error<S::Error>> {
        Self::exchange(link, &Command::QueryData).await
    }
}

/// Continuous push: the sensor emits a data report every measurement cycle,
/// interleaved with any command acknowledgements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveMode;

impl ActiveMode {
    // Reads frames until one could answer `command`, skipping data reports
    // (unless data is what we want), acknowledgements of other commands and
    // frames from other devices. Gives up after `ack_attempts` frames.
    async fn next_relevant<S: Transport, D: DelayNs>(
        link: &mut Link<S, D>,
        command: &Command,
    ) -> Result<ResponseFrame, Error<S::Error>> {
        let expected = link.expected_id(command);
        let class = command.response_class();
        let attempts = link.config.ack_attempts;

        for attempt in 1..=attempts {
            let frame = link.read_frame().await?;
            if frame.class_id() != class {
                debug!(
                    "Skipping frame of class {:#04X} while waiting for {:?} ({}/{})",
                    frame.class_id(),
                    command,
                    attempt,
                    attempts
                );
                continue;
            }
            if class == REPLY_ID && frame.payload()[0] != command.code() {
                debug!(
                    "Skipping stale reply to command {:#04X} while waiting for {:?} ({}/{})",
                    frame.payload()[0],
                    command,
                    attempt,
                    attempts
                );
                continue;
            }
            if !expected.matches(frame.device_id()) {
                debug!(
                    "Skipping frame from device {:?} ({}/{})",
                    frame.device_id(),
                    attempt,
                    attempts
                );
                continue;
            }
            return Ok(frame);
        }

        error!(
            "No answer to {:?} within {} frames in active mode",
            command, attempts
        );
        Err(Error::ResponseTimeout)
    }
}

impl Mode for ActiveMode {
    const REPORTING_MODE: ReportingMode = ReportingMode::Active;

    async fn exchange<S: Transport, D: DelayNs>(
        link: &mut Link<S, D>,
        command: &Command,
    ) -> Result<ResponseFrame, Error<S::Error>> {
        link.reconnect().await?;
        link.send(command).await?;
        link.settle().await;
        Self::next_relevant(link, command).await
    }

    async fn poll<S: Transport, D: DelayNs>(
        link: &mut Link<S, D>,
    ) -> Result<ResponseFrame, Error<S::Error>> {
        link.reconnect().await?;
        Self::next_relevant(link, &Command::QueryData).await
    }
}
