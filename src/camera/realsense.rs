use super::interface::CameraInterface;
use crate::capture::{ColorCallback, DepthCallback, FrameBuffers};
use crate::config::CameraConfig;
use crate::device::{sdk::device_info, select_device, DeviceInfo};
use crate::error::CameraError;
use crate::frame::host_timestamp_us;
use crossbeam::channel::{bounded, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use realsense_rust::{
    config::Config,
    context::Context,
    device::Device,
    frame::{ColorFrame, DepthFrame},
    kind::{Rs2CameraInfo, Rs2Format, Rs2Option, Rs2StreamKind},
    pipeline::{ActivePipeline, InactivePipeline},
};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// RealSense camera streaming Z16 depth and RGB8 color into slot rings
pub struct RealSenseInterface {
    buffers: Arc<FrameBuffers>,
    error_text: String,
    device: Option<Mutex<Device>>,
    // Keeps the SDK context alive for as long as the device handle
    _context: Option<Mutex<Context>>,
    stop_tx: Mutex<Option<Sender<()>>>,
    capture_thread: Mutex<Option<JoinHandle<()>>>,
}

impl RealSenseInterface {
    /// Locate a device, configure both streams and start capturing.
    ///
    /// Failures are logged and leave the interface with `ok() == false`.
    pub fn new(config: &CameraConfig, num_buffers: usize) -> Self {
        info!("Initialize RealSense...");

        let mut interface = Self {
            buffers: Arc::new(FrameBuffers::new(config.width, config.height, num_buffers)),
            error_text: String::new(),
            device: None,
            _context: None,
            stop_tx: Mutex::new(None),
            capture_thread: Mutex::new(None),
        };

        if let Err(e) = interface.initialize(config) {
            error!("{}", e);
            interface.error_text = e.to_string();
            return interface;
        }

        if let Some(value) = config.auto_exposure {
            interface.set_auto_exposure(value);
        }
        if let Some(value) = config.auto_white_balance {
            interface.set_auto_white_balance(value);
        }

        interface
    }

    fn initialize(&mut self, config: &CameraConfig) -> Result<(), CameraError> {
        let context = Context::new().map_err(sdk_error)?;
        let mut devices = context.query_devices(HashSet::new());
        let infos: Vec<DeviceInfo> = devices.iter().map(device_info).collect();
        let index = select_device(&infos, &config.product_line, config.serial.as_deref())?;
        let device = devices.swap_remove(index);

        let mut rs_config = Config::new();
        if let Some(serial) = device.info(Rs2CameraInfo::SerialNumber) {
            rs_config
                .enable_device_from_serial(serial)
                .map_err(sdk_error)?;
        }
        rs_config.disable_all_streams().map_err(sdk_error)?;
        rs_config
            .enable_stream(
                Rs2StreamKind::Depth,
                None,
                config.width as usize,
                config.height as usize,
                Rs2Format::Z16,
                config.fps as usize,
            )
            .map_err(|e| stream_error("depth", e))?;
        rs_config
            .enable_stream(
                Rs2StreamKind::Color,
                None,
                config.width as usize,
                config.height as usize,
                Rs2Format::Rgb8,
                config.fps as usize,
            )
            .map_err(|e| stream_error("color", e))?;

        let pipeline = InactivePipeline::try_from(&context).map_err(sdk_error)?;
        info!("Start pipe...");
        let pipeline = pipeline
            .start(Some(rs_config))
            .map_err(|e| CameraError::PipelineStart {
                details: e.to_string(),
            })?;

        let (stop_tx, stop_rx) = bounded(1);
        let color = ColorCallback::new(Arc::clone(&self.buffers));
        let depth = DepthCallback::new(Arc::clone(&self.buffers));
        let timeout = config.wait_timeout();

        let handle = std::thread::Builder::new()
            .name("realsense-capture".to_string())
            .spawn(move || run_capture_loop(pipeline, stop_rx, color, depth, timeout))
            .map_err(sdk_error)?;

        *self.stop_tx.lock() = Some(stop_tx);
        *self.capture_thread.lock() = Some(handle);
        self.device = Some(Mutex::new(device));
        self._context = Some(Mutex::new(context));

        Ok(())
    }

    /// Set a boolean option on the first sensor that exposes it
    fn set_option(&self, option: Rs2Option, value: bool) -> Result<(), CameraError> {
        let device = self.device.as_ref().ok_or_else(|| CameraError::Sdk {
            details: "No device opened".to_string(),
        })?;
        let device = device.lock();

        for mut sensor in device.sensors() {
            if sensor.get_option(option).is_none() {
                continue;
            }
            return sensor
                .set_option(option, if value { 1.0 } else { 0.0 })
                .map_err(|e| CameraError::OptionSet {
                    option: format!("{:?}", option),
                    details: e.to_string(),
                });
        }

        Err(CameraError::OptionUnsupported {
            option: format!("{:?}", option),
        })
    }

    fn get_option(&self, option: Rs2Option) -> bool {
        let Some(device) = self.device.as_ref() else {
            return false;
        };
        let device = device.lock();
        device
            .sensors()
            .iter()
            .find_map(|sensor| sensor.get_option(option))
            .map_or(false, |value| value != 0.0)
    }
}

impl CameraInterface for RealSenseInterface {
    fn ok(&self) -> bool {
        self.error_text.is_empty()
    }

    fn error_text(&self) -> &str {
        &self.error_text
    }

    fn set_auto_exposure(&self, value: bool) {
        match self.set_option(Rs2Option::EnableAutoExposure, value) {
            Ok(()) => debug!("Auto exposure set to {}", value),
            Err(e) => warn!("Failed to set auto exposure: {}", e),
        }
    }

    fn set_auto_white_balance(&self, value: bool) {
        match self.set_option(Rs2Option::EnableAutoWhiteBalance, value) {
            Ok(()) => debug!("Auto white balance set to {}", value),
            Err(e) => warn!("Failed to set auto white balance: {}", e),
        }
    }

    fn auto_exposure(&self) -> bool {
        self.get_option(Rs2Option::EnableAutoExposure)
    }

    fn auto_white_balance(&self) -> bool {
        self.get_option(Rs2Option::EnableAutoWhiteBalance)
    }

    fn buffers(&self) -> &Arc<FrameBuffers> {
        &self.buffers
    }

    fn is_capturing(&self) -> bool {
        self.capture_thread
            .lock()
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    fn stop(&self) {
        // Dropping the sender disconnects the capture loop's receiver
        if self.stop_tx.lock().take().is_none() {
            return;
        }

        info!("Stopping RealSense capture");
        if let Some(handle) = self.capture_thread.lock().take() {
            if handle.join().is_err() {
                error!("RealSense capture thread panicked");
            }
        }
    }
}

impl Drop for RealSenseInterface {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_capture_loop(
    mut pipeline: ActivePipeline,
    stop_rx: Receiver<()>,
    color: ColorCallback,
    depth: DepthCallback,
    timeout: Duration,
) {
    info!("RealSense capture loop started");
    let mut missed = 0u64;

    loop {
        match stop_rx.try_recv() {
            Err(TryRecvError::Empty) => {}
            Ok(()) | Err(TryRecvError::Disconnected) => break,
        }

        let frames = match pipeline.wait(Some(timeout)) {
            Ok(frames) => frames,
            Err(e) => {
                missed += 1;
                debug!("No frameset within {:?} ({} missed): {}", timeout, missed, e);
                continue;
            }
        };
        let now = host_timestamp_us();

        // Color first so depth pairs with the color frame of the same frameset
        for frame in frames.frames_of_type::<ColorFrame>() {
            let data = unsafe {
                let ptr: *const _ = frame.get_data();
                std::slice::from_raw_parts(ptr.cast::<u8>(), frame.get_data_size())
            };
            if let Err(e) = color.on_frame(data, now) {
                trace!("Color frame rejected: {}", e);
            }
        }

        for frame in frames.frames_of_type::<DepthFrame>() {
            let data = unsafe {
                let ptr: *const _ = frame.get_data();
                std::slice::from_raw_parts(ptr.cast::<u8>(), frame.get_data_size())
            };
            if let Err(e) = depth.on_frame(data, now) {
                trace!("Depth frame rejected: {}", e);
            }
        }
    }

    let _ = pipeline.stop();
    info!("RealSense capture loop stopped");
}

fn sdk_error(e: impl std::fmt::Display) -> CameraError {
    CameraError::Sdk {
        details: e.to_string(),
    }
}

fn stream_error(stream: &str, e: impl std::fmt::Display) -> CameraError {
    CameraError::StreamConfiguration {
        stream: stream.to_string(),
        details: e.to_string(),
    }
}
