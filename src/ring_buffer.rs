use parking_lot::RwLock;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use tracing::{debug, trace};

/// A pre-allocated slot tagged with the write counter that last filled it
struct Slot<T> {
    seq: i64,
    value: T,
}

/// Fixed-size ring of pre-allocated slots with a monotonic latest index.
///
/// Slots are allocated once and written in place. The write counter only ever
/// grows; counter `n` lives in slot `n % capacity`. Each ring expects a single
/// writer, readers may run on any thread.
pub struct SlotRing<T> {
    slots: Vec<RwLock<Slot<T>>>,
    /// Last published write counter, -1 before the first publish
    latest: AtomicI64,
    capacity: usize,
    stats: SlotRingStats,
}

/// Statistics for slot ring monitoring
#[derive(Debug)]
pub struct SlotRingStats {
    /// Total frames published into the ring
    pub frames_published: AtomicU64,
    /// Successful reads through the public read methods.
    /// Copies the capture thread makes while pairing frames are not counted.
    pub frames_read: AtomicU64,
    /// Publishes that replaced a previously written slot
    pub overwrites: AtomicU64,
}

impl SlotRingStats {
    fn new() -> Self {
        Self {
            frames_published: AtomicU64::new(0),
            frames_read: AtomicU64::new(0),
            overwrites: AtomicU64::new(0),
        }
    }

    /// Get current statistics as a snapshot
    pub fn snapshot(&self) -> SlotRingStatsSnapshot {
        SlotRingStatsSnapshot {
            frames_published: self.frames_published.load(Ordering::Relaxed),
            frames_read: self.frames_read.load(Ordering::Relaxed),
            overwrites: self.overwrites.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of slot ring statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotRingStatsSnapshot {
    pub frames_published: u64,
    pub frames_read: u64,
    pub overwrites: u64,
}

impl<T> SlotRing<T> {
    /// Create a ring with `capacity` slots, each produced by `init`
    ///
    /// # Example
    /// ```
    /// use depthcam::ring_buffer::SlotRing;
    ///
    /// let ring = SlotRing::new(10, || vec![0u8; 16]);
    /// assert_eq!(ring.capacity(), 10);
    /// assert!(ring.latest_index().is_none());
    /// ```
    pub fn new(capacity: usize, mut init: impl FnMut() -> T) -> Self {
        if capacity == 0 {
            panic!("Slot ring capacity must be greater than 0");
        }

        let slots = (0..capacity)
            .map(|_| {
                RwLock::new(Slot {
                    seq: -1,
                    value: init(),
                })
            })
            .collect();

        debug!("Created slot ring with capacity {}", capacity);

        Self {
            slots,
            latest: AtomicI64::new(-1),
            capacity,
            stats: SlotRingStats::new(),
        }
    }

    /// Fill the next slot in place and make it the latest.
    ///
    /// The closure receives the slot's previous contents. The new index only
    /// becomes visible to readers after the closure returns.
    pub fn publish<R>(&self, write: impl FnOnce(&mut T) -> R) -> (u64, R) {
        let next = self.latest.load(Ordering::Acquire) + 1;
        let index = next as usize % self.capacity;

        let result = {
            let mut slot = self.slots[index].write();
            if slot.seq >= 0 {
                self.stats.overwrites.fetch_add(1, Ordering::Relaxed);
                trace!("Overwriting slot {} (seq {} -> {})", index, slot.seq, next);
            }
            let result = write(&mut slot.value);
            slot.seq = next;
            result
        };

        self.latest.store(next, Ordering::Release);
        self.stats.frames_published.fetch_add(1, Ordering::Relaxed);

        (next as u64, result)
    }

    /// Latest published write counter, `None` before the first publish
    pub fn latest_index(&self) -> Option<u64> {
        let latest = self.latest.load(Ordering::Acquire);
        (latest >= 0).then_some(latest as u64)
    }

    /// Slot position a write counter maps to
    pub fn slot_of(&self, index: u64) -> usize {
        (index % self.capacity as u64) as usize
    }

    /// Read the slot written at counter `index`.
    ///
    /// Returns `None` if nothing was written at `index` yet, or if the slot
    /// has since been overwritten by a later publish.
    pub fn read<R>(&self, index: u64, f: impl FnOnce(&T) -> R) -> Option<R> {
        let slot = self.slots[self.slot_of(index)].read();
        if slot.seq < 0 || slot.seq as u64 != index {
            return None;
        }

        self.stats.frames_read.fetch_add(1, Ordering::Relaxed);
        Some(f(&slot.value))
    }

    /// Read the latest published slot along with its index
    pub fn read_latest<R>(&self, f: impl FnOnce(&T) -> R) -> Option<(u64, R)> {
        let result = self.peek_latest(f);
        if result.is_some() {
            self.stats.frames_read.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    /// Same as `read_latest` but leaves `frames_read` untouched
    pub(crate) fn peek_latest<R>(&self, f: impl FnOnce(&T) -> R) -> Option<(u64, R)> {
        let mut f = Some(f);
        loop {
            let index = self.latest_index()?;
            let slot = self.slots[self.slot_of(index)].read();
            // The writer lapped the ring between loading the index and locking
            if slot.seq as u64 != index {
                continue;
            }
            let f = f.take()?;
            return Some((index, f(&slot.value)));
        }
    }

    /// Get the number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get current ring statistics
    pub fn stats(&self) -> SlotRingStatsSnapshot {
        self.stats.snapshot()
    }
}

impl<T: Clone> SlotRing<T> {
    /// Clone out the latest slot
    pub fn latest(&self) -> Option<(u64, T)> {
        self.read_latest(T::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_ring_creation() {
        let ring = SlotRing::new(10, || 0u32);
        assert_eq!(ring.capacity(), 10);
        assert!(ring.latest_index().is_none());
        assert!(ring.latest().is_none());
        assert_eq!(ring.stats(), SlotRingStatsSnapshot::default());
    }

    #[test]
    #[should_panic(expected = "capacity must be greater than 0")]
    fn test_zero_capacity_panics() {
        let _ = SlotRing::new(0, || 0u8);
    }

    #[test]
    fn test_publish_and_read_latest() {
        let ring = SlotRing::new(3, || 0u32);

        let (index, ()) = ring.publish(|v| *v = 7);
        assert_eq!(index, 0);
        assert_eq!(ring.latest_index(), Some(0));
        assert_eq!(ring.latest(), Some((0, 7)));

        let (index, ()) = ring.publish(|v| *v = 8);
        assert_eq!(index, 1);
        assert_eq!(ring.read(0, |v| *v), Some(7));
        assert_eq!(ring.read(1, |v| *v), Some(8));
        assert_eq!(ring.read(2, |v| *v), None);
    }

    #[test]
    fn test_peek_latest_is_not_counted_as_read() {
        let ring = SlotRing::new(2, || 0u32);
        ring.publish(|v| *v = 3);

        assert_eq!(ring.peek_latest(|v| *v), Some((0, 3)));
        assert_eq!(ring.stats().frames_read, 0);

        assert_eq!(ring.read_latest(|v| *v), Some((0, 3)));
        assert_eq!(ring.stats().frames_read, 1);
    }

    #[test]
    fn test_wraparound_detects_overwritten_slots() {
        let ring = SlotRing::new(3, || 0u64);

        for i in 0..5u64 {
            ring.publish(|v| *v = i * 10);
        }

        assert_eq!(ring.latest_index(), Some(4));
        assert_eq!(ring.slot_of(4), 1);
        assert_eq!(ring.latest(), Some((4, 40)));

        // Counters 0 and 1 were overwritten by 3 and 4
        assert_eq!(ring.read(0, |v| *v), None);
        assert_eq!(ring.read(1, |v| *v), None);
        assert_eq!(ring.read(2, |v| *v), Some(20));
        assert_eq!(ring.read(3, |v| *v), Some(30));

        let stats = ring.stats();
        assert_eq!(stats.frames_published, 5);
        assert_eq!(stats.overwrites, 2);
    }

    #[test]
    fn test_publish_reuses_slot_allocation() {
        let ring = SlotRing::new(2, || vec![0u8; 64]);
        let (_, first) = ring.publish(|v| {
            v.fill(1);
            v.as_ptr() as usize
        });
        ring.publish(|v| v.fill(2));
        let (_, third) = ring.publish(|v| {
            assert!(v.iter().all(|b| *b == 1), "slot keeps previous contents");
            v.fill(3);
            v.as_ptr() as usize
        });

        assert_eq!(first, third);
    }

    #[test]
    fn test_concurrent_reader_never_sees_torn_slot() {
        let ring = Arc::new(SlotRing::new(4, || vec![0u8; 4096]));
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let ring = Arc::clone(&ring);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                for i in 0..2000u32 {
                    ring.publish(|v| v.fill((i % 251) as u8));
                }
                done.store(true, Ordering::Release);
            })
        };

        let readers: Vec<_> = (0..3)
            .map(|_| {
                let ring = Arc::clone(&ring);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    while !done.load(Ordering::Acquire) {
                        if let Some((index, consistent)) =
                            ring.read_latest(|v| v.iter().all(|b| *b == v[0]))
                        {
                            assert!(consistent, "torn read at index {}", index);
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }

        assert_eq!(ring.latest_index(), Some(1999));
        assert_eq!(ring.stats().frames_published, 2000);
    }
}
