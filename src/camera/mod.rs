mod builder;
mod health;
mod interface;
#[cfg(all(feature = "realsense", unix))]
mod realsense;
mod synthetic;
#[cfg(test)]
mod tests;
mod unavailable;

pub use builder::{open_camera, CameraInterfaceBuilder};
pub use health::{health_check, wait_for_frames, CaptureStatus, HealthCheckResult, HealthStatus};
pub use interface::CameraInterface;
#[cfg(all(feature = "realsense", unix))]
pub use realsense::RealSenseInterface;
pub use synthetic::{fill_color_pattern, fill_depth_pattern, SyntheticInterface};
pub use unavailable::{UnavailableInterface, UNAVAILABLE_ERROR_TEXT};
