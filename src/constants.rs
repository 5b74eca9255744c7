// HEAD is the byte that marks the beginning of any frame (command or data).
pub const HEAD: u8 = 0xAA;

// TAIL is the byte that marks the end of any frame (command or data).
pub const TAIL: u8 = 0xAB;

// COMMAND_ID is the byte that identifies a command frame sent to the sensor.
pub const COMMAND_ID: u8 = 0xB4;

// DATA_REPORT_ID is the byte that identifies a data report frame received from the sensor.
// This is pushed unsolicited in active reporting mode, and is the reply to a query in
// querying mode.
pub const DATA_REPORT_ID: u8 = 0xC0;

// REPLY_ID is the byte that identifies a reply frame received from the sensor
// in response to any command other than a data query.
pub const REPLY_ID: u8 = 0xC5;

// Total length of a command frame written to the sensor.
pub const COMMAND_FRAME_LEN: usize = 19;

// Total length of any frame read from the sensor.
pub const RESPONSE_FRAME_LEN: usize = 10;

// Command codes, carried in byte 2 of command frames and reply frames.
pub const CMD_REPORTING_MODE: u8 = 0x02;
pub const CMD_QUERY_DATA: u8 = 0x04;
pub const CMD_DEVICE_ID: u8 = 0x05;
pub const CMD_SLEEP: u8 = 0x06;
pub const CMD_FIRMWARE: u8 = 0x07;
pub const CMD_WORKING_PERIOD: u8 = 0x08;

// Operation byte following the command code for get/set style commands.
pub const OP_QUERY: u8 = 0x00;
pub const OP_SET: u8 = 0x01;

// Longest working period the sensor accepts, in minutes.
pub const MAX_WORKING_PERIOD: u8 = 30;
