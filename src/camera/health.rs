use super::interface::CameraInterface;
use crate::error::{DepthcamError, Result};
use crate::ring_buffer::SlotRingStatsSnapshot;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::info;

/// Point-in-time view of a camera and its buffers
#[derive(Debug, Clone)]
pub struct CaptureStatus {
    pub ok: bool,
    pub error_text: String,
    pub capturing: bool,
    pub latest_depth_index: Option<u64>,
    pub latest_rgb_index: Option<u64>,
    pub depth: SlotRingStatsSnapshot,
    pub rgb: SlotRingStatsSnapshot,
    pub dropped_depth: u64,
    pub dropped_rgb: u64,
    pub last_depth_time: i64,
    pub last_rgb_time: i64,
}

impl CaptureStatus {
    pub fn of(camera: &dyn CameraInterface) -> Self {
        let buffers = camera.buffers();
        Self {
            ok: camera.ok(),
            error_text: camera.error_text().to_string(),
            capturing: camera.is_capturing(),
            latest_depth_index: buffers.latest_depth_index(),
            latest_rgb_index: buffers.latest_rgb_index(),
            depth: buffers.depth_stats(),
            rgb: buffers.rgb_stats(),
            dropped_depth: buffers.dropped_depth(),
            dropped_rgb: buffers.dropped_rgb(),
            last_depth_time: buffers.last_depth_time(),
            last_rgb_time: buffers.last_rgb_time(),
        }
    }
}

/// Health check result
#[derive(Debug, Clone)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}

/// Health status enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Unhealthy,
}

/// Check a camera against the current host time (microseconds)
pub fn health_check(
    camera: &dyn CameraInterface,
    now_us: i64,
    stale_after: Duration,
) -> HealthCheckResult {
    let status = CaptureStatus::of(camera);
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    if !status.ok {
        issues.push(format!("Camera not initialized: {}", status.error_text));
    }

    if status.latest_depth_index.is_none() {
        issues.push("No depth frames received".to_string());
    } else {
        let age_us = now_us.saturating_sub(status.last_depth_time);
        if age_us > stale_after.as_micros() as i64 {
            warnings.push(format!("Last depth frame is {}ms old", age_us / 1000));
        }
    }

    if status.latest_rgb_index.is_none() {
        warnings.push("No color frames received".to_string());
    }

    let dropped = status.dropped_depth + status.dropped_rgb;
    if dropped > 0 {
        warnings.push(format!("Dropped frames: {}", dropped));
    }

    let status = if issues.is_empty() {
        if warnings.is_empty() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Warning
        }
    } else {
        HealthStatus::Unhealthy
    };

    HealthCheckResult {
        status,
        issues,
        warnings,
    }
}

/// Wait until the camera has published at least one depth frame
pub async fn wait_for_frames(
    camera: &dyn CameraInterface,
    timeout_duration: Duration,
) -> Result<u64> {
    info!("Waiting for camera frames (timeout: {:?})", timeout_duration);

    let result = timeout(timeout_duration, async {
        loop {
            if let Some(index) = camera.latest_depth_index() {
                return index;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    match result {
        Ok(index) => {
            info!("First depth frame received (index {})", index);
            Ok(index)
        }
        Err(_) => Err(DepthcamError::system("Timeout waiting for camera frames")),
    }
}
