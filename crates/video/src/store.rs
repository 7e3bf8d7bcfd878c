use {
    crate::FrameSink,
    base::Vec2,
    image::DecodedFrame,
    std::{
        sync::{Arc, Mutex, MutexGuard},
        time::Instant,
    },
};

/// Copy of the store taken under its lock.
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Latest installed frame, `None` until the first one after a reset.
    pub frame: Option<Arc<DecodedFrame>>,
    /// Milliseconds since the last install or reset.
    pub age_ms: u64,
    /// No frame installed since the last start or stop.
    pub is_first: bool,
    /// Number of frames installed over the store's lifetime.
    pub sequence: u64,
}

struct Slot {
    frame: Option<Arc<DecodedFrame>>,
    updated: Instant,
    is_first: bool,
    sequence: u64,
    extent: Vec2<usize>,
}

/// Single-slot, last-writer-wins holder of the current frame.
///
/// Written by the receiver task, read by the render tick. Everything lives
/// behind one mutex, so a snapshot never mixes a frame with the freshness
/// data of another.
pub struct FrameStore {
    slot: Mutex<Slot>,
}

impl FrameStore {
    pub fn new(extent: Vec2<usize>) -> Self {
        Self {
            slot: Mutex::new(Slot {
                frame: None,
                updated: Instant::now(),
                is_first: true,
                sequence: 0,
                extent,
            }),
        }
    }

    // a panicking writer leaves the slot consistent, so poisoning is ignored
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the current frame, restart the freshness clock and clear the
    /// first-frame flag.
    ///
    /// Returns `false` and leaves the store untouched when the frame was
    /// decoded for a different extent than the current one.
    pub fn install(&self, frame: DecodedFrame) -> bool {
        let frame = Arc::new(frame);
        let previous = {
            let mut slot = self.lock();
            if frame.size() != slot.extent {
                return false;
            }
            slot.updated = Instant::now();
            slot.is_first = false;
            slot.sequence += 1;
            slot.frame.replace(frame)
        };
        // last reference to the old frame is released outside the lock
        drop(previous);
        true
    }

    /// Set the first-frame flag, drop the current frame and restart the
    /// freshness clock. Called on stream start and stop.
    pub fn mark_first_frame_reset(&self) {
        let previous = {
            let mut slot = self.lock();
            slot.is_first = true;
            slot.updated = Instant::now();
            slot.frame.take()
        };
        drop(previous);
    }

    pub fn snapshot(&self) -> Snapshot {
        let slot = self.lock();
        Snapshot {
            frame: slot.frame.clone(),
            age_ms: slot.updated.elapsed().as_millis() as u64,
            is_first: slot.is_first,
            sequence: slot.sequence,
        }
    }

    /// Change the extent frames must have to be installed. The current frame
    /// stays until a frame of the new extent replaces it.
    pub fn set_extent(&self, extent: Vec2<usize>) {
        let mut slot = self.lock();
        if slot.extent != extent {
            log::debug!("frame store: extent {} -> {}", slot.extent, extent);
            slot.extent = extent;
        }
    }

    pub fn extent(&self) -> Vec2<usize> {
        self.lock().extent
    }
}

impl FrameSink for FrameStore {
    fn on_frame(&self, frame: DecodedFrame) {
        let size = frame.size();
        if !self.install(frame) {
            log::debug!("frame store: dropping {} frame after resize", size);
        }
    }

    fn on_stopped(&self) {
        self.mark_first_frame_reset();
    }

    fn extent(&self) -> Vec2<usize> {
        FrameStore::extent(self)
    }
}
