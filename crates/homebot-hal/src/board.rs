//! Actuator and range-sensor traits.
//!
//! On the reference robot a single microcontroller board both drives the
//! motors and reads the ultrasonic range sensor, so the control loop holds
//! one [`ControlBoard`] that provides both capabilities.

use homebot_types::{Command, CommandResult, HomebotError};

/// Accepts discrete [`Command`]s and reports the hardware's reply.
pub trait ActuatorSink: Send {
    /// Execute `command` and return the device's acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`HomebotError::UnsupportedCommand`] for
    /// [`Command::Unrecognized`], and [`HomebotError::HardwareFault`] when the
    /// transport fails.  A negative acknowledgement is *not* an error; it is
    /// reported through [`CommandResult::ok`].
    fn execute(&mut self, command: &Command) -> Result<CommandResult, HomebotError>;
}

/// A direct distance sensor.
pub trait RangeSensor: Send {
    /// Read the current distance in metres.
    ///
    /// `Ok(None)` means the sensor gave no usable reading this time.
    ///
    /// # Errors
    ///
    /// Returns [`HomebotError::HardwareFault`] when the transport fails.
    fn read_distance(&mut self) -> Result<Option<f64>, HomebotError>;
}

/// A device that is both an [`ActuatorSink`] and a [`RangeSensor`].
pub trait ControlBoard: ActuatorSink + RangeSensor {
    /// Stable identifier, e.g. the serial port path.
    fn id(&self) -> &str;

    /// Release the underlying transport.  Called once on shutdown.
    fn close(&mut self) -> Result<(), HomebotError> {
        Ok(())
    }
}
