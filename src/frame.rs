use serde::{Deserialize, Serialize};

/// Pixel layouts the capture streams are configured with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 16-bit depth, little endian
    Z16,
    /// 8-bit RGB, packed
    Rgb8,
}

impl PixelFormat {
    /// Get bytes per pixel for the format
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Z16 => 2,
            PixelFormat::Rgb8 => 3,
        }
    }
}

/// Size in bytes of one image of the given format
pub fn frame_len(width: u32, height: u32, format: PixelFormat) -> usize {
    width as usize * height as usize * format.bytes_per_pixel()
}

/// Current host time in microseconds since the UNIX epoch
pub fn host_timestamp_us() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

/// A single color image slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSlot {
    pub data: Vec<u8>,
    /// Host arrival time in microseconds
    pub timestamp: i64,
}

impl ImageSlot {
    /// Allocate a zero-filled slot for the given image size
    pub fn zeroed(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            data: vec![0u8; frame_len(width, height, format)],
            timestamp: 0,
        }
    }
}

/// A depth image paired with the color image that was latest when it arrived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePair {
    pub depth: Vec<u8>,
    pub rgb: Vec<u8>,
    /// Host arrival time of the depth image in microseconds
    pub timestamp: i64,
}

impl FramePair {
    pub fn zeroed(width: u32, height: u32) -> Self {
        Self {
            depth: vec![0u8; frame_len(width, height, PixelFormat::Z16)],
            rgb: vec![0u8; frame_len(width, height, PixelFormat::Rgb8)],
            timestamp: 0,
        }
    }

    /// Depth value at (x, y), or `None` outside the image
    pub fn depth_at(&self, width: u32, x: u32, y: u32) -> Option<u16> {
        if x >= width {
            return None;
        }
        let offset = (y as usize * width as usize + x as usize) * 2;
        let bytes = self.depth.get(offset..offset + 2)?;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }
}
