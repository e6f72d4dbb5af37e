//! Generic `Camera` trait and supporting types for image-capture hardware.

use homebot_types::HomebotError;

/// A raw image frame returned by a camera driver.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Raw pixel data (e.g. BGR24 or greyscale).
    pub data: Vec<u8>,
}

/// A camera or image-capture device.
pub trait Camera: Send {
    /// Stable identifier for this camera, e.g. `"front_rgb"` or `"video0"`.
    fn id(&self) -> &str;

    /// Grab the next available frame.
    ///
    /// A frame that cannot be acquired this cycle is `Ok(None)`; the caller
    /// treats it as "nothing seen" and carries on.
    ///
    /// # Errors
    ///
    /// Returns [`HomebotError::HardwareFault`] only when the device itself is
    /// gone (unplugged, closed).
    fn read_frame(&mut self) -> Result<Option<CameraFrame>, HomebotError>;

    /// Release the underlying device.  Called once when the loop shuts down.
    fn release(&mut self) -> Result<(), HomebotError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakyCamera {
        id: String,
        reads: usize,
    }

    impl Camera for FlakyCamera {
        fn id(&self) -> &str {
            &self.id
        }

        fn read_frame(&mut self) -> Result<Option<CameraFrame>, HomebotError> {
            self.reads += 1;
            if self.reads % 2 == 0 {
                return Ok(None);
            }
            Ok(Some(CameraFrame {
                width: 2,
                height: 2,
                data: vec![0u8; 4 * 3], // 2×2 BGR24
            }))
        }
    }

    #[test]
    fn dropped_frames_are_not_errors() {
        let mut cam = FlakyCamera {
            id: "front_rgb".to_string(),
            reads: 0,
        };
        assert_eq!(cam.id(), "front_rgb");
        let frame = cam.read_frame().unwrap().expect("first read yields a frame");
        assert_eq!(frame.data.len(), 12);
        assert!(cam.read_frame().unwrap().is_none());
        cam.release().unwrap();
    }
}
