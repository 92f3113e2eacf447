use crate::error::CameraError;
use tracing::{debug, info};

/// Identification strings reported by a connected camera
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: Option<String>,
    pub serial: Option<String>,
    pub product_line: Option<String>,
    pub firmware: Option<String>,
}

impl std::fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (serial {}, product line {}, firmware {})",
            self.name.as_deref().unwrap_or("unknown"),
            self.serial.as_deref().unwrap_or("?"),
            self.product_line.as_deref().unwrap_or("?"),
            self.firmware.as_deref().unwrap_or("?"),
        )
    }
}

/// Pick the first device of `product_line`, optionally pinned to `serial`.
///
/// Returns the index into `devices`.
pub fn select_device(
    devices: &[DeviceInfo],
    product_line: &str,
    serial: Option<&str>,
) -> Result<usize, CameraError> {
    if devices.is_empty() {
        return Err(CameraError::NoDevice);
    }

    for (index, device) in devices.iter().enumerate() {
        if device.product_line.as_deref() != Some(product_line) {
            debug!("Skipping {}: wrong product line", device);
            continue;
        }
        if let Some(serial) = serial {
            if device.serial.as_deref() != Some(serial) {
                debug!("Skipping {}: serial does not match {}", device, serial);
                continue;
            }
        }
        info!("Device found: {}", device);
        return Ok(index);
    }

    Err(CameraError::ProductLineNotFound {
        product_line: product_line.to_string(),
    })
}

/// Enumerate connected RealSense devices
#[cfg(all(feature = "realsense", unix))]
pub fn query_devices() -> Result<Vec<DeviceInfo>, CameraError> {
    use std::collections::HashSet;

    let context = realsense_rust::context::Context::new().map_err(|e| CameraError::Sdk {
        details: e.to_string(),
    })?;
    Ok(context
        .query_devices(HashSet::new())
        .iter()
        .map(sdk::device_info)
        .collect())
}

/// Enumerate connected RealSense devices; always empty without the SDK
#[cfg(not(all(feature = "realsense", unix)))]
pub fn query_devices() -> Result<Vec<DeviceInfo>, CameraError> {
    debug!("Compiled without Intel RealSense library, no devices to query");
    Ok(Vec::new())
}

#[cfg(all(feature = "realsense", unix))]
pub(crate) mod sdk {
    use super::DeviceInfo;
    use realsense_rust::{device::Device, kind::Rs2CameraInfo};

    fn info_string(device: &Device, info: Rs2CameraInfo) -> Option<String> {
        device
            .info(info)
            .map(|value| value.to_string_lossy().into_owned())
    }

    pub(crate) fn device_info(device: &Device) -> DeviceInfo {
        DeviceInfo {
            name: info_string(device, Rs2CameraInfo::Name),
            serial: info_string(device, Rs2CameraInfo::SerialNumber),
            product_line: info_string(device, Rs2CameraInfo::ProductLine),
            firmware: info_string(device, Rs2CameraInfo::FirmwareVersion),
        }
    }
}
