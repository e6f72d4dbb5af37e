//! `homebot-hal` – Hardware Abstraction Layer.
//!
//! The control loop never talks to a device directly.  It holds trait objects
//! for every collaborator and drivers implement those traits:
//!
//! - [`camera`] – [`Camera`][camera::Camera] frame source.
//! - [`classifier`] – [`Classifier`][classifier::Classifier] object-detection
//!   oracle and the total [`LabelTable`][classifier::LabelTable] lookup.
//! - [`board`] – [`ActuatorSink`][board::ActuatorSink],
//!   [`RangeSensor`][board::RangeSensor] and their union
//!   [`ControlBoard`][board::ControlBoard].
//! - [`speech`] – blocking [`SpeechInput`][speech::SpeechInput] /
//!   [`SpeechOutput`][speech::SpeechOutput].
//! - [`arduino`] – [`ArduinoLink`][arduino::ArduinoLink], the line-based
//!   serial protocol spoken by the microcontroller that drives the motors and
//!   the ultrasonic range sensor.
//! - [`sim`] – in-process drivers for headless runs and tests.

pub mod arduino;
pub mod board;
pub mod camera;
pub mod classifier;
pub mod sim;
pub mod speech;

pub use arduino::ArduinoLink;
pub use board::{ActuatorSink, ControlBoard, RangeSensor};
pub use camera::{Camera, CameraFrame};
pub use classifier::{Classifier, LabelTable, RawDetection};
pub use speech::{SpeechInput, SpeechOutput};
