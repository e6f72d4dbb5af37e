//! [`ArduinoLink`] – line-based serial protocol to the motor/sensor board.
//!
//! Every request is one ASCII line terminated by `\n`; the board answers with
//! exactly one line.  A reply starting with `OK` is a positive
//! acknowledgement.
//!
//! | Command | Request |
//! |---|---|
//! | [`Command::Lift`] | `LIFT` |
//! | [`Command::MoveArm`] | `ARM:<angle>` |
//! | [`Command::Grab`] | `GRAB` |
//! | [`Command::Release`] | `RELEASE` |
//! | [`Command::Walk`] | `WALK:<direction>:<steps>` |
//! | [`Command::Rotate`] | `ROTATE:<direction>:<degrees>` |
//! | range sensor | `DIST` → `OK:<metres>` |
//!
//! A read timeout is treated as an empty (negative) reply so a silent board
//! never stalls the loop; any other I/O error is a hardware fault.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::time::Duration;

use homebot_types::{Command, CommandResult, HomebotError};
use serialport::SerialPort;
use tracing::{debug, info};

use crate::board::{ActuatorSink, ControlBoard, RangeSensor};

/// Encode `command` as its wire request, or `None` for
/// [`Command::Unrecognized`].
pub fn encode(command: &Command) -> Option<String> {
    let line = match command {
        Command::Lift => "LIFT".to_string(),
        Command::MoveArm { angle_deg } => format!("ARM:{angle_deg}"),
        Command::Grab => "GRAB".to_string(),
        Command::Release => "RELEASE".to_string(),
        Command::Walk { direction, steps } => format!("WALK:{direction}:{steps}"),
        Command::Rotate { direction, degrees } => format!("ROTATE:{direction}:{degrees}"),
        Command::Unrecognized => return None,
    };
    Some(line)
}

/// Extract the distance from a `DIST` reply such as `OK:0.42`.
///
/// A negative acknowledgement or a value that is not a number yields `None`.
pub fn parse_distance(reply: &CommandResult) -> Option<f64> {
    if !reply.ok {
        return None;
    }
    reply.response.rsplit(':').next()?.trim().parse::<f64>().ok()
}

/// A connection to the microcontroller over any byte stream.
pub struct ArduinoLink<P: Read + Write> {
    id: String,
    port: BufReader<P>,
}

impl ArduinoLink<Box<dyn SerialPort>> {
    /// Open the serial device at `path` (8N1, no flow control).
    ///
    /// `timeout` bounds every reply read.
    ///
    /// # Errors
    ///
    /// Returns [`HomebotError::HardwareFault`] if the port cannot be opened.
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self, HomebotError> {
        let port = serialport::new(path, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(timeout)
            .open()
            .map_err(|e| HomebotError::hardware(path, format!("cannot open serial port: {e}")))?;
        info!(port = path, baud_rate, "opened serial link to control board");
        Ok(Self::new(path, port))
    }
}

impl<P: Read + Write> ArduinoLink<P> {
    /// Wrap an already-open stream.
    pub fn new(id: impl Into<String>, port: P) -> Self {
        Self {
            id: id.into(),
            port: BufReader::new(port),
        }
    }

    /// Send one request line and wait for the reply line.
    ///
    /// # Errors
    ///
    /// Returns [`HomebotError::HardwareFault`] if writing fails or the reply
    /// cannot be read (other than by timing out).
    pub fn send(&mut self, request: &str) -> Result<CommandResult, HomebotError> {
        let payload = format!("{}\n", request.trim());
        let stream = self.port.get_mut();
        stream
            .write_all(payload.as_bytes())
            .and_then(|()| stream.flush())
            .map_err(|e| fault(&self.id, "write", e))?;

        let mut line = String::new();
        match self.port.read_line(&mut line) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
            Err(e) => return Err(fault(&self.id, "read", e)),
        }

        let response = line.trim().to_string();
        let ok = response.starts_with("OK");
        debug!(board = %self.id, request = request.trim(), %response, ok, "serial exchange");
        Ok(CommandResult { ok, response })
    }

    /// Consume the link and hand back the raw stream.
    pub fn into_inner(self) -> P {
        self.port.into_inner()
    }
}

fn fault(id: &str, op: &str, e: io::Error) -> HomebotError {
    HomebotError::hardware(id, format!("serial {op} failed: {e}"))
}

impl<P: Read + Write + Send> ActuatorSink for ArduinoLink<P> {
    fn execute(&mut self, command: &Command) -> Result<CommandResult, HomebotError> {
        let request = encode(command)
            .ok_or_else(|| HomebotError::UnsupportedCommand(command.name().to_string()))?;
        self.send(&request)
    }
}

impl<P: Read + Write + Send> RangeSensor for ArduinoLink<P> {
    fn read_distance(&mut self) -> Result<Option<f64>, HomebotError> {
        let reply = self.send("DIST")?;
        Ok(parse_distance(&reply))
    }
}

impl<P: Read + Write + Send> ControlBoard for ArduinoLink<P> {
    fn id(&self) -> &str {
        &self.id
    }

    fn close(&mut self) -> Result<(), HomebotError> {
        self.port
            .get_mut()
            .flush()
            .map_err(|e| fault(&self.id, "flush", e))?;
        info!(board = %self.id, "serial link closed");
        Ok(())
    }
}
