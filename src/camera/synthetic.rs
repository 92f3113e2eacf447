use super::interface::CameraInterface;
use crate::capture::{ColorCallback, DepthCallback, FrameBuffers};
use crate::config::CameraConfig;
use crate::frame::{frame_len, host_timestamp_us, PixelFormat};
use crossbeam::channel::{bounded, select, tick, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{error, info, trace};

/// Camera that generates moving test patterns at the configured frame rate
pub struct SyntheticInterface {
    buffers: Arc<FrameBuffers>,
    error_text: String,
    auto_exposure: AtomicBool,
    auto_white_balance: AtomicBool,
    stop_tx: Mutex<Option<Sender<()>>>,
    capture_thread: Mutex<Option<JoinHandle<()>>>,
}

impl SyntheticInterface {
    pub fn new(config: &CameraConfig, num_buffers: usize) -> Self {
        info!(
            "Starting synthetic camera ({}x{} @ {}fps, {} slots)",
            config.width, config.height, config.fps, num_buffers
        );

        let buffers = Arc::new(FrameBuffers::new(config.width, config.height, num_buffers));
        let (stop_tx, stop_rx) = bounded(1);
        let color = ColorCallback::new(Arc::clone(&buffers));
        let depth = DepthCallback::new(Arc::clone(&buffers));
        let (width, height) = (config.width, config.height);
        let period = Duration::from_secs_f64(1.0 / config.fps.max(1) as f64);

        let spawned = std::thread::Builder::new()
            .name("synthetic-capture".to_string())
            .spawn(move || run_synthetic_loop(width, height, period, stop_rx, color, depth));

        let (error_text, handle) = match spawned {
            Ok(handle) => (String::new(), Some(handle)),
            Err(e) => {
                error!("Failed to spawn synthetic capture thread: {}", e);
                (e.to_string(), None)
            }
        };

        Self {
            buffers,
            error_text,
            auto_exposure: AtomicBool::new(config.auto_exposure.unwrap_or(false)),
            auto_white_balance: AtomicBool::new(config.auto_white_balance.unwrap_or(false)),
            stop_tx: Mutex::new(handle.as_ref().map(|_| stop_tx)),
            capture_thread: Mutex::new(handle),
        }
    }
}

impl CameraInterface for SyntheticInterface {
    fn ok(&self) -> bool {
        self.error_text.is_empty()
    }

    fn error_text(&self) -> &str {
        &self.error_text
    }

    fn set_auto_exposure(&self, value: bool) {
        self.auto_exposure.store(value, Ordering::Relaxed);
    }

    fn set_auto_white_balance(&self, value: bool) {
        self.auto_white_balance.store(value, Ordering::Relaxed);
    }

    fn auto_exposure(&self) -> bool {
        self.auto_exposure.load(Ordering::Relaxed)
    }

    fn auto_white_balance(&self) -> bool {
        self.auto_white_balance.load(Ordering::Relaxed)
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
        if self.stop_tx.lock().take().is_none() {
            return;
        }

        info!("Stopping synthetic capture");
        if let Some(handle) = self.capture_thread.lock().take() {
            if handle.join().is_err() {
                error!("Synthetic capture thread panicked");
            }
        }
    }
}

impl Drop for SyntheticInterface {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_synthetic_loop(
    width: u32,
    height: u32,
    period: Duration,
    stop_rx: Receiver<()>,
    color: ColorCallback,
    depth: DepthCallback,
) {
    let ticker = tick(period);
    let mut rgb = vec![0u8; frame_len(width, height, PixelFormat::Rgb8)];
    let mut z16 = vec![0u8; frame_len(width, height, PixelFormat::Z16)];
    let mut sequence = 0u64;

    info!("Synthetic capture loop started");

    loop {
        select! {
            recv(stop_rx) -> _ => break,
            recv(ticker) -> _ => {
                fill_color_pattern(width, sequence, &mut rgb);
                fill_depth_pattern(width, sequence, &mut z16);
                let now = host_timestamp_us();
                if let Err(e) = color.on_frame(&rgb, now) {
                    trace!("Synthetic color frame rejected: {}", e);
                }
                if let Err(e) = depth.on_frame(&z16, now) {
                    trace!("Synthetic depth frame rejected: {}", e);
                }
                sequence += 1;
            }
        }
    }

    info!("Synthetic capture loop stopped after {} frames", sequence);
}

/// Horizontal color gradient that scrolls one pixel per frame
pub fn fill_color_pattern(width: u32, sequence: u64, buf: &mut [u8]) {
    let width = width.max(1) as u64;
    for (i, px) in buf.chunks_exact_mut(3).enumerate() {
        let x = i as u64 % width;
        let y = i as u64 / width;
        px[0] = ((x + sequence) % 256) as u8;
        px[1] = (y % 256) as u8;
        px[2] = (sequence % 256) as u8;
    }
}

/// Depth ramp in millimetres, 500..1500, scrolling one pixel per frame
pub fn fill_depth_pattern(width: u32, sequence: u64, buf: &mut [u8]) {
    let width = width.max(1) as u64;
    for (i, px) in buf.chunks_exact_mut(2).enumerate() {
        let x = i as u64 % width;
        let depth = 500 + ((x + sequence) % 1000) as u16;
        px.copy_from_slice(&depth.to_le_bytes());
    }
}
