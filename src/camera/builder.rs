use super::interface::CameraInterface;
use super::synthetic::SyntheticInterface;
use crate::config::DepthcamConfig;
use crate::error::{DepthcamError, Result};
use tracing::info;

/// Open the camera variant this build and configuration call for.
///
/// With the `realsense` feature this opens hardware; without it the returned
/// interface reports `ok() == false`. `camera.synthetic` overrides both.
pub fn open_camera(config: &DepthcamConfig) -> Box<dyn CameraInterface> {
    if config.camera.synthetic {
        return Box::new(SyntheticInterface::new(
            &config.camera,
            config.buffer.num_buffers,
        ));
    }

    open_hardware(config)
}

#[cfg(all(feature = "realsense", unix))]
fn open_hardware(config: &DepthcamConfig) -> Box<dyn CameraInterface> {
    Box::new(super::realsense::RealSenseInterface::new(
        &config.camera,
        config.buffer.num_buffers,
    ))
}

#[cfg(not(all(feature = "realsense", unix)))]
fn open_hardware(config: &DepthcamConfig) -> Box<dyn CameraInterface> {
    Box::new(super::unavailable::UnavailableInterface::new(&config.camera))
}

/// Builder for camera interfaces
pub struct CameraInterfaceBuilder {
    config: Option<DepthcamConfig>,
    synthetic: Option<bool>,
}

impl CameraInterfaceBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            synthetic: None,
        }
    }

    pub fn config(mut self, config: DepthcamConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Force the synthetic source on or off regardless of configuration
    pub fn synthetic(mut self, synthetic: bool) -> Self {
        self.synthetic = Some(synthetic);
        self
    }

    pub fn build(self) -> Result<Box<dyn CameraInterface>> {
        let mut config = self
            .config
            .ok_or_else(|| DepthcamError::system("Camera configuration must be specified"))?;

        if let Some(synthetic) = self.synthetic {
            config.camera.synthetic = synthetic;
        }
        config.validate()?;

        info!(
            "Opening camera ({}x{} @ {}fps, {} slots, product line {})",
            config.camera.width,
            config.camera.height,
            config.camera.fps,
            config.buffer.num_buffers,
            config.camera.product_line
        );

        Ok(open_camera(&config))
    }
}

impl Default for CameraInterfaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
