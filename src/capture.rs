//! Frame callbacks that copy incoming camera frames into the shared slot rings.
//!
//! Both callbacks are driven from the capture thread. Color frames land in
//! their own ring; every depth frame is paired with whichever color image was
//! latest when it arrived.

use crate::error::CameraError;
use crate::frame::{frame_len, FramePair, ImageSlot, PixelFormat};
use crate::ring_buffer::{SlotRing, SlotRingStatsSnapshot};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{trace, warn};

/// Pre-allocated color and depth rings shared between the capture thread and readers
pub struct FrameBuffers {
    width: u32,
    height: u32,
    rgb: SlotRing<ImageSlot>,
    frames: SlotRing<FramePair>,
    last_rgb_time: AtomicI64,
    last_depth_time: AtomicI64,
    dropped_rgb: AtomicU64,
    dropped_depth: AtomicU64,
}

impl FrameBuffers {
    /// Allocate `num_buffers` color slots and `num_buffers` depth/color pairs
    pub fn new(width: u32, height: u32, num_buffers: usize) -> Self {
        Self {
            width,
            height,
            rgb: SlotRing::new(num_buffers, || {
                ImageSlot::zeroed(width, height, PixelFormat::Rgb8)
            }),
            frames: SlotRing::new(num_buffers, || FramePair::zeroed(width, height)),
            last_rgb_time: AtomicI64::new(0),
            last_depth_time: AtomicI64::new(0),
            dropped_rgb: AtomicU64::new(0),
            dropped_depth: AtomicU64::new(0),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color ring
    pub fn rgb(&self) -> &SlotRing<ImageSlot> {
        &self.rgb
    }

    /// Depth ring; each slot carries its paired color image
    pub fn frames(&self) -> &SlotRing<FramePair> {
        &self.frames
    }

    pub fn latest_depth_index(&self) -> Option<u64> {
        self.frames.latest_index()
    }

    pub fn latest_rgb_index(&self) -> Option<u64> {
        self.rgb.latest_index()
    }

    /// Host time of the last accepted color frame, 0 if none
    pub fn last_rgb_time(&self) -> i64 {
        self.last_rgb_time.load(Ordering::Acquire)
    }

    /// Host time of the last accepted depth frame, 0 if none
    pub fn last_depth_time(&self) -> i64 {
        self.last_depth_time.load(Ordering::Acquire)
    }

    pub fn dropped_rgb(&self) -> u64 {
        self.dropped_rgb.load(Ordering::Relaxed)
    }

    pub fn dropped_depth(&self) -> u64 {
        self.dropped_depth.load(Ordering::Relaxed)
    }

    pub fn rgb_stats(&self) -> SlotRingStatsSnapshot {
        self.rgb.stats()
    }

    pub fn depth_stats(&self) -> SlotRingStatsSnapshot {
        self.frames.stats()
    }

    fn check_len(
        &self,
        stream: &str,
        format: PixelFormat,
        actual: usize,
        dropped: &AtomicU64,
    ) -> Result<(), CameraError> {
        let expected = frame_len(self.width, self.height, format);
        if actual == expected {
            return Ok(());
        }

        let total = dropped.fetch_add(1, Ordering::Relaxed) + 1;
        warn!(
            "Dropping {} frame: {} bytes, expected {} ({} dropped so far)",
            stream, actual, expected, total
        );
        Err(CameraError::FrameSize {
            stream: stream.to_string(),
            expected,
            actual,
        })
    }
}

/// Copies color frames into the next color slot
#[derive(Clone)]
pub struct ColorCallback {
    buffers: Arc<FrameBuffers>,
}

impl ColorCallback {
    pub fn new(buffers: Arc<FrameBuffers>) -> Self {
        Self { buffers }
    }

    /// Accept one packed RGB8 frame; returns the write counter it was published at
    pub fn on_frame(&self, data: &[u8], timestamp: i64) -> Result<u64, CameraError> {
        let buffers = &self.buffers;
        buffers.check_len("color", PixelFormat::Rgb8, data.len(), &buffers.dropped_rgb)?;

        // Stored ahead of the publish so a visible index always has a time
        buffers.last_rgb_time.store(timestamp, Ordering::Release);
        let (index, ()) = buffers.rgb.publish(|slot| {
            slot.data.copy_from_slice(data);
            slot.timestamp = timestamp;
        });

        trace!("Color frame {} stored at {}", index, timestamp);
        Ok(index)
    }
}

/// Copies depth frames, paired with the latest color image, into the next depth slot
#[derive(Clone)]
pub struct DepthCallback {
    buffers: Arc<FrameBuffers>,
}

impl DepthCallback {
    pub fn new(buffers: Arc<FrameBuffers>) -> Self {
        Self { buffers }
    }

    /// Accept one Z16 frame; returns the write counter it was published at
    pub fn on_frame(&self, data: &[u8], timestamp: i64) -> Result<u64, CameraError> {
        let buffers = &self.buffers;
        buffers.check_len("depth", PixelFormat::Z16, data.len(), &buffers.dropped_depth)?;

        buffers.last_depth_time.store(timestamp, Ordering::Release);
        let (index, paired) = buffers.frames.publish(|pair| {
            pair.depth.copy_from_slice(data);
            pair.timestamp = timestamp;
            match buffers.rgb.peek_latest(|img| pair.rgb.copy_from_slice(&img.data)) {
                Some((rgb_index, ())) => Some(rgb_index),
                None => {
                    pair.rgb.fill(0);
                    None
                }
            }
        });

        trace!(
            "Depth frame {} stored at {} (paired color {:?})",
            index,
            timestamp,
            paired
        );
        Ok(index)
    }
}
