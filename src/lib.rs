pub mod camera;
pub mod capture;
pub mod config;
pub mod device;
pub mod error;
pub mod frame;
pub mod ring_buffer;

pub use camera::{
    health_check, open_camera, wait_for_frames, CameraInterface, CameraInterfaceBuilder,
    CaptureStatus, HealthCheckResult, HealthStatus, SyntheticInterface, UnavailableInterface,
};
#[cfg(all(feature = "realsense", unix))]
pub use camera::RealSenseInterface;
pub use capture::{ColorCallback, DepthCallback, FrameBuffers};
pub use config::DepthcamConfig;
pub use device::{query_devices, select_device, DeviceInfo};
pub use error::{CameraError, DepthcamError, Result};
pub use frame::{FramePair, ImageSlot, PixelFormat};
pub use ring_buffer::{SlotRing, SlotRingStatsSnapshot};
