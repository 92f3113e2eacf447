use crate::capture::FrameBuffers;
use std::sync::Arc;

/// A depth/color camera feeding fixed-size slot rings.
///
/// Implementations never fail construction: when a device cannot be opened
/// the interface reports `ok() == false` and explains why in `error_text()`.
pub trait CameraInterface: Send + Sync {
    /// Whether the camera initialized and is delivering into the buffers
    fn ok(&self) -> bool;

    /// Reason initialization failed, empty when `ok()`
    fn error_text(&self) -> &str;

    fn set_auto_exposure(&self, value: bool);

    fn set_auto_white_balance(&self, value: bool);

    /// Current auto exposure state, false when unavailable
    fn auto_exposure(&self) -> bool;

    /// Current auto white balance state, false when unavailable
    fn auto_white_balance(&self) -> bool;

    /// Shared color and depth rings
    fn buffers(&self) -> &Arc<FrameBuffers>;

    /// Whether the capture thread is still running
    fn is_capturing(&self) -> bool;

    /// Stop capture; calling it again is a no-op
    fn stop(&self);

    /// Write counter of the newest depth/color pair
    fn latest_depth_index(&self) -> Option<u64> {
        self.buffers().latest_depth_index()
    }
}
