//! Debounced resize negotiation between the UI thread and the render thread.
//!
//! The UI thread publishes the most recent (width, height, preserve-aspect)
//! request through a seqlock-style generation word, so the render thread
//! never observes a torn triple. Arming is an integer pending count rather
//! than a boolean: each new request sets it to [`RESIZE_SETTLE_TICKS`], and
//! the render thread decrements it at most once per tick, applying the
//! settled request on every tick that observes a positive count. Applying
//! twice absorbs the known race where a toolkit layout pass delivers another
//! resize notification between the observation and the application.

#[cfg(all(feature = "loom", test))]
use loom::sync::atomic::AtomicU32;
#[cfg(not(all(feature = "loom", test)))]
use std::sync::atomic::AtomicU32;

use std::sync::atomic::Ordering;

use crate::extent::SurfaceExtent;

/// Number of consecutive ticks a freshly armed request is applied for.
pub const RESIZE_SETTLE_TICKS: u32 = 2;

/// Internal bit used to mark `generation` as "being updated".
///
/// Published generation values never have this bit set and increment by 1
/// per completed publish.
const GENERATION_BUSY_BIT: u32 = 1 << 31;

/// One settled resize request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeRequest {
    pub width: u32,
    pub height: u32,
    pub preserve_aspect: bool,
}

impl ResizeRequest {
    pub fn new(width: u32, height: u32, preserve_aspect: bool) -> Self {
        Self {
            width,
            height,
            preserve_aspect,
        }
    }

    /// The request with its extent clamped to the 1x1 render-target minimum.
    pub fn clamped(self) -> Self {
        let extent = self.extent().clamped();
        Self {
            width: extent.width,
            height: extent.height,
            preserve_aspect: self.preserve_aspect,
        }
    }

    pub fn extent(self) -> SurfaceExtent {
        SurfaceExtent::new(self.width, self.height)
    }
}

/// Shared resize mailbox. The UI side writes, the render side drains.
pub struct ResizeSignal {
    generation: AtomicU32,
    width: AtomicU32,
    height: AtomicU32,
    preserve_aspect: AtomicU32,
    pending: AtomicU32,
}

impl ResizeSignal {
    /// A new signal starts armed at 1x1 so the first render ticks build the
    /// initial transfer channel without waiting for a UI notification.
    pub fn new() -> Self {
        Self {
            generation: AtomicU32::new(0),
            width: AtomicU32::new(1),
            height: AtomicU32::new(1),
            preserve_aspect: AtomicU32::new(0),
            pending: AtomicU32::new(RESIZE_SETTLE_TICKS),
        }
    }

    /// Record a resize notification from the UI side.
    ///
    /// The extent is clamped to 1x1, identical repeats of the stored request
    /// are ignored, and anything else overwrites the stored request and arms
    /// the pending count to [`RESIZE_SETTLE_TICKS`]. Returns whether the
    /// signal was (re)armed.
    pub fn request(&self, request: ResizeRequest) -> bool {
        let request = request.clamped();
        if request == self.snapshot() {
            return false;
        }

        self.publish(request);
        self.pending.store(RESIZE_SETTLE_TICKS, Ordering::SeqCst);
        true
    }

    /// Re-arm the signal so the currently stored request is applied again.
    pub fn rearm(&self) {
        self.pending.store(RESIZE_SETTLE_TICKS, Ordering::SeqCst);
    }

    /// Render-tick drain: decrement the pending count once and return the
    /// stored request if the count was positive. Call at most once per tick.
    pub fn take_tick(&self) -> Option<ResizeRequest> {
        let mut pending = self.pending.load(Ordering::SeqCst);
        loop {
            if pending == 0 {
                return None;
            }
            match self.pending.compare_exchange_weak(
                pending,
                pending - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Some(self.snapshot()),
                Err(actual) => pending = actual,
            }
        }
    }

    pub fn pending(&self) -> u32 {
        self.pending.load(Ordering::SeqCst)
    }

    /// Publish a complete request.
    ///
    /// Protocol:
    /// 1) Mark the payload as "in progress" by setting the busy bit.
    /// 2) Store the non-generation fields.
    /// 3) Increment `generation` (busy bit cleared) as the final step.
    fn publish(&self, request: ResizeRequest) {
        let mut start = self.generation.load(Ordering::SeqCst);
        loop {
            if start & GENERATION_BUSY_BIT != 0 {
                spin_hint();
                start = self.generation.load(Ordering::SeqCst);
                continue;
            }

            match self.generation.compare_exchange_weak(
                start,
                start | GENERATION_BUSY_BIT,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(actual) => start = actual,
            }
        }

        test_yield();

        self.width.store(request.width, Ordering::SeqCst);
        test_yield();
        self.height.store(request.height, Ordering::SeqCst);
        test_yield();
        self.preserve_aspect
            .store(u32::from(request.preserve_aspect), Ordering::SeqCst);

        test_yield();

        let new_generation = start.wrapping_add(1) & !GENERATION_BUSY_BIT;
        self.generation.store(new_generation, Ordering::SeqCst);
    }

    fn snapshot(&self) -> ResizeRequest {
        loop {
            let gen0 = self.generation.load(Ordering::SeqCst);
            if gen0 & GENERATION_BUSY_BIT != 0 {
                // Writer in progress.
                spin_hint();
                continue;
            }

            let width = self.width.load(Ordering::SeqCst);
            let height = self.height.load(Ordering::SeqCst);
            let preserve_aspect = self.preserve_aspect.load(Ordering::SeqCst);

            let gen1 = self.generation.load(Ordering::SeqCst);
            if gen0 != gen1 {
                continue;
            }

            return ResizeRequest {
                width,
                height,
                preserve_aspect: preserve_aspect != 0,
            };
        }
    }
}

impl Default for ResizeSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(feature = "loom", test))]
fn spin_hint() {
    loom::thread::yield_now();
}

#[cfg(not(all(feature = "loom", test)))]
#[inline]
fn spin_hint() {
    std::hint::spin_loop();
}

#[cfg(all(test, feature = "loom"))]
#[inline]
fn test_yield() {
    loom::thread::yield_now();
}

#[cfg(all(test, not(feature = "loom")))]
#[inline]
fn test_yield() {
    std::thread::yield_now();
}

#[cfg(not(test))]
#[inline]
fn test_yield() {}
