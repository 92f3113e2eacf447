use super::interface::CameraInterface;
use crate::capture::FrameBuffers;
use crate::config::CameraConfig;
use std::sync::Arc;
use tracing::warn;

pub const UNAVAILABLE_ERROR_TEXT: &str = "Compiled without Intel RealSense library";

/// Stand-in used when the crate is built without the RealSense SDK.
///
/// Never delivers frames; option setters are ignored and getters report false.
pub struct UnavailableInterface {
    buffers: Arc<FrameBuffers>,
}

impl UnavailableInterface {
    pub fn new(config: &CameraConfig) -> Self {
        warn!("{}", UNAVAILABLE_ERROR_TEXT);
        // Nothing is ever written, so a single slot per ring is enough
        Self {
            buffers: Arc::new(FrameBuffers::new(config.width, config.height, 1)),
        }
    }
}

impl CameraInterface for UnavailableInterface {
    fn ok(&self) -> bool {
        false
    }

    fn error_text(&self) -> &str {
        UNAVAILABLE_ERROR_TEXT
    }

    fn set_auto_exposure(&self, _value: bool) {}

    fn set_auto_white_balance(&self, _value: bool) {}

    fn auto_exposure(&self) -> bool {
        false
    }

    fn auto_white_balance(&self) -> bool {
        false
    }

    fn buffers(&self) -> &Arc<FrameBuffers> {
        &self.buffers
    }

    fn is_capturing(&self) -> bool {
        false
    }

    fn stop(&self) {}
}
