use super::*;
use crate::config::DepthcamConfig;
use crate::frame::host_timestamp_us;
use std::time::Duration;

fn create_test_config(synthetic: bool) -> DepthcamConfig {
    let mut config = DepthcamConfig::default();
    config.camera.width = 16;
    config.camera.height = 8;
    config.camera.fps = 200;
    config.camera.synthetic = synthetic;
    config.buffer.num_buffers = 4;
    config
}

#[test]
fn test_camera_builder_validation() {
    let result = CameraInterfaceBuilder::new().build();
    assert!(result.is_err());

    if let Err(crate::error::DepthcamError::System { message }) = result {
        assert!(message.contains("Camera configuration must be specified"));
    } else {
        panic!("Expected system error for missing configuration");
    }
}

#[test]
fn test_camera_builder_rejects_invalid_config() {
    let mut config = create_test_config(true);
    config.buffer.num_buffers = 0;

    let result = CameraInterfaceBuilder::new().config(config).build();
    assert!(matches!(result, Err(crate::error::DepthcamError::Config(_))));
}

#[cfg(not(feature = "realsense"))]
#[test]
fn test_unavailable_interface_is_a_no_op() {
    let camera = CameraInterfaceBuilder::new()
        .config(create_test_config(false))
        .build()
        .unwrap();

    assert!(!camera.ok());
    assert_eq!(camera.error_text(), "Compiled without Intel RealSense library");
    assert!(!camera.is_capturing());

    camera.set_auto_exposure(true);
    camera.set_auto_white_balance(true);
    assert!(!camera.auto_exposure());
    assert!(!camera.auto_white_balance());
    assert_eq!(camera.latest_depth_index(), None);

    camera.stop();

    let result = health_check(camera.as_ref(), host_timestamp_us(), Duration::from_secs(1));
    assert_eq!(result.status, HealthStatus::Unhealthy);
    assert_eq!(result.issues.len(), 2);
}

#[tokio::test]
async fn test_synthetic_camera_fills_buffers() {
    let camera = CameraInterfaceBuilder::new()
        .config(create_test_config(false))
        .synthetic(true)
        .build()
        .unwrap();

    assert!(camera.ok());
    assert!(camera.error_text().is_empty());

    let first = wait_for_frames(camera.as_ref(), Duration::from_secs(5))
        .await
        .unwrap();

    // Let the ring wrap at least once
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while camera.latest_depth_index().unwrap_or(0) < first + 8 {
        assert!(tokio::time::Instant::now() < deadline, "synthetic camera stalled");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let buffers = camera.buffers();
    let (index, pair) = buffers.frames().latest().unwrap();
    assert!(index >= first + 8);
    assert_eq!(pair.depth.len(), 16 * 8 * 2);
    assert_eq!(pair.rgb.len(), 16 * 8 * 3);
    let depth = pair.depth_at(16, 0, 0).unwrap();
    assert!((500..1500).contains(&depth));
    assert!(buffers.depth_stats().overwrites > 0);

    camera.stop();
    assert!(!camera.is_capturing());
    let stopped_at = camera.latest_depth_index();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(camera.latest_depth_index(), stopped_at);

    // Second stop is a no-op
    camera.stop();
}

#[tokio::test]
async fn test_synthetic_health_and_staleness() {
    let camera = open_camera(&create_test_config(true));
    wait_for_frames(camera.as_ref(), Duration::from_secs(5))
        .await
        .unwrap();
    // Color and depth are published back to back; give the next tick a chance
    tokio::time::sleep(Duration::from_millis(20)).await;

    let fresh = health_check(camera.as_ref(), host_timestamp_us(), Duration::from_secs(10));
    assert_eq!(fresh.status, HealthStatus::Healthy, "{:?}", fresh);

    camera.stop();
    let later = host_timestamp_us() + 60_000_000;
    let stale = health_check(camera.as_ref(), later, Duration::from_secs(10));
    assert_eq!(stale.status, HealthStatus::Warning);
    assert!(stale.warnings[0].starts_with("Last depth frame is"));

    let status = CaptureStatus::of(camera.as_ref());
    assert!(status.ok);
    assert!(!status.capturing);
    assert_eq!(status.dropped_depth, 0);
    assert!(status.depth.frames_published >= 1);
}

#[test]
fn test_synthetic_options_round_trip() {
    let mut config = create_test_config(true);
    config.camera.auto_exposure = Some(true);
    let camera = open_camera(&config);

    assert!(camera.auto_exposure());
    assert!(!camera.auto_white_balance());

    camera.set_auto_exposure(false);
    camera.set_auto_white_balance(true);
    assert!(!camera.auto_exposure());
    assert!(camera.auto_white_balance());
}

#[tokio::test]
async fn test_wait_for_frames_times_out_without_frames() {
    let buffers_only = UnavailableInterface::new(&create_test_config(false).camera);
    let result = wait_for_frames(&buffers_only, Duration::from_millis(50)).await;

    assert!(result.is_err());
}
