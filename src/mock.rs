//! Test doubles for the transport and delay provider.

use std::collections::VecDeque;

use embedded_hal_async::delay::DelayNs;
use embedded_io_async::{ErrorKind, ErrorType, Read, Write};

use crate::command::Command;
use crate::config::{DeviceId, ReportingMode};
use crate::constants::*;
use crate::frame::ResponseFrame;
use crate::transport::Transport;

// Bytes handed out per read call, so frames arrive in pieces.
const READ_CHUNK: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open,
    Close,
    Write(Vec<u8>),
}

/// A transport that replays pre-loaded bytes and records everything done to it.
#[derive(Debug, Default)]
pub struct ScriptedSerial {
    rx: VecDeque<u8>,
    replies: VecDeque<Vec<u8>>,
    on_open: VecDeque<Vec<u8>>,
    pub events: Vec<Event>,
    pub fail_close: bool,
    /// Number of read calls, including empty ones.
    pub reads: usize,
}

impl ScriptedSerial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes already waiting in the receive buffer.
    pub fn buffered(mut self, bytes: &[u8]) -> Self {
        self.rx.extend(bytes);
        self
    }

    /// Bytes that become readable after the next write.
    pub fn reply(mut self, bytes: &[u8]) -> Self {
        self.replies.push_back(bytes.to_vec());
        self
    }

    /// Bytes that become readable after the next open.
    pub fn after_open(mut self, bytes: &[u8]) -> Self {
        self.on_open.push_back(bytes.to_vec());
        self
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Write(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Event) -> usize {
        self.events.iter().filter(|event| *event == wanted).count()
    }
}

fn read_chunk(rx: &mut VecDeque<u8>, buf: &mut [u8]) -> usize {
    let n = buf.len().min(rx.len()).min(READ_CHUNK);
    for (slot, byte) in buf.iter_mut().zip(rx.drain(..n)) {
        *slot = byte;
    }
    n
}

impl ErrorType for ScriptedSerial {
    type Error = ErrorKind;
}

impl Read for ScriptedSerial {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.reads += 1;
        Ok(read_chunk(&mut self.rx, buf))
    }
}

impl Write for ScriptedSerial {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.events.push(Event::Write(buf.to_vec()));
        if let Some(reply) = self.replies.pop_front() {
            self.rx.extend(reply);
        }
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Transport for ScriptedSerial {
    async fn open(&mut self) -> Result<(), Self::Error> {
        self.events.push(Event::Open);
        if let Some(bytes) = self.on_open.pop_front() {
            self.rx.extend(bytes);
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        if self.fail_close {
            return Err(ErrorKind::BrokenPipe);
        }
        self.events.push(Event::Close);
        self.rx.clear();
        Ok(())
    }
}

/// Behavioural model of an SDS011 sensor on the other end of the line.
///
/// In active mode it pushes a data report ahead of every reply, and whenever
/// the host reads an empty line while the sensor is awake.
#[derive(Debug)]
pub struct Emulator {
    rx: VecDeque<u8>,
    pub mode: ReportingMode,
    pub awake: bool,
    pub working_period: u8,
    pub device_id: DeviceId,
    pub firmware: [u8; 3],
    pub opens: usize,
    pub closes: usize,
    pub writes: usize,
}

impl Emulator {
    /// Factory defaults: active mode, awake, continuous.
    pub fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            mode: ReportingMode::Active,
            awake: true,
            working_period: 0,
            device_id: DeviceId::new(0x01, 0x01),
            firmware: [1, 2, 3],
            opens: 0,
            closes: 0,
            writes: 0,
        }
    }

    pub fn in_mode(mut self, mode: ReportingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn data_report(&self) -> ResponseFrame {
        // 432.5 and 531.1 µg/m³
        ResponseFrame::new(DATA_REPORT_ID, [0xE5, 0x10, 0xBF, 0x14], self.device_id)
    }

    fn reply(&self, data: [u8; 4]) -> ResponseFrame {
        ResponseFrame::new(REPLY_ID, data, self.device_id)
    }

    fn handle(&mut self, command: Command) -> ResponseFrame {
        let sleep_byte = |awake: bool| if awake { 0x01 } else { 0x00 };
        match command {
            Command::QueryData => self.data_report(),
            Command::GetReportingMode => {
                self.reply([CMD_REPORTING_MODE, OP_QUERY, self.mode.to_byte(), 0])
            }
            Command::SetReportingMode(mode) => {
                let frame = self.reply([CMD_REPORTING_MODE, OP_SET, mode.to_byte(), 0]);
                self.mode = mode;
                frame
            }
            Command::GetWorkingPeriod => {
                self.reply([CMD_WORKING_PERIOD, OP_QUERY, self.working_period, 0])
            }
            Command::SetWorkingPeriod(period) => {
                self.working_period = period;
                self.reply([CMD_WORKING_PERIOD, OP_SET, period, 0])
            }
            Command::GetSleepState => self.reply([CMD_SLEEP, OP_QUERY, sleep_byte(self.awake), 0]),
            Command::SetSleep | Command::SetWake => {
                self.awake = command == Command::SetWake;
                self.reply([CMD_SLEEP, OP_SET, sleep_byte(self.awake), 0])
            }
            Command::SetDeviceId(new_id) => {
                self.device_id = new_id;
                self.reply([CMD_DEVICE_ID, 0, 0, 0])
            }
            Command::GetFirmwareVersion => {
                let [year, month, day] = self.firmware;
                self.reply([CMD_FIRMWARE, year, month, day])
            }
        }
    }

    fn push_data_report(&mut self) {
        let frame = self.data_report();
        self.rx.extend(frame.as_ref());
    }
}

impl ErrorType for Emulator {
    type Error = ErrorKind;
}

impl Read for Emulator {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.rx.is_empty() && self.mode == ReportingMode::Active && self.awake {
            self.push_data_report();
        }
        Ok(read_chunk(&mut self.rx, buf))
    }
}

impl Write for Emulator {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.writes += 1;
        let Ok((command, target)) = Command::parse_request(buf) else {
            return Ok(buf.len());
        };
        if !target.matches(self.device_id) {
            return Ok(buf.len());
        }
        // Asleep, the sensor only listens for sleep/wake.
        if !self.awake && !matches!(command, Command::SetSleep | Command::SetWake) {
            return Ok(buf.len());
        }

        let active = self.mode == ReportingMode::Active && self.awake;
        let frame = self.handle(command);
        if active {
            self.push_data_report();
        }
        self.rx.extend(frame.as_ref());
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Transport for Emulator {
    async fn open(&mut self) -> Result<(), Self::Error> {
        self.opens += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.closes += 1;
        self.rx.clear();
        Ok(())
    }
}

/// A delay provider that returns immediately and remembers what was asked.
#[derive(Debug, Default)]
pub struct NoDelay {
    pub requested_ms: Vec<u32>,
}

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, _ns: u32) {}

    async fn delay_ms(&mut self, ms: u32) {
        self.requested_ms.push(ms);
    }
}
