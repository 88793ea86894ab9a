use std::num::NonZeroU64;
use std::sync::Arc;

use parking_lot::Mutex;
use winit::window::Window;

/// Handle for one scheduled animation frame.
///
/// Handles are never zero, so a stored request can always be told apart from
/// "nothing scheduled".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(NonZeroU64);

impl FrameRequest {
    pub fn id(self) -> u64 {
        self.0.get()
    }
}

/// Scheduling port between the controller and whatever drives frames.
///
/// A window shell maps this onto redraw requests; tests and the headless mode
/// use [`ManualScheduler`] and invoke the animation step directly.
pub trait FrameScheduler: Send + Sync {
    /// Asks for one animation-frame callback and returns its handle.
    fn request_frame(&self) -> FrameRequest;

    /// Cancels a previously requested frame. Stale or unknown handles are
    /// ignored.
    fn cancel_frame(&self, request: FrameRequest);
}

/// Allocates the next handle from a monotonically increasing counter.
pub(crate) fn next_request(counter: &mut u64) -> FrameRequest {
    *counter += 1;
    // The counter starts at zero and only ever increments.
    FrameRequest(NonZeroU64::new(*counter).unwrap_or(NonZeroU64::MIN))
}

/// Scheduler that hands out handles without any timing source behind them.
///
/// Frames "fire" when the caller invokes the animation step itself, which is
/// exactly what the headless mode and the tests do.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    inner: Mutex<ManualInner>,
}

#[derive(Debug, Default)]
struct ManualInner {
    counter: u64,
    pending: Option<FrameRequest>,
    requested: u64,
    cancelled: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total frames requested so far.
    pub fn requested_frames(&self) -> u64 {
        self.inner.lock().requested
    }

    /// Total cancellations observed, including stale ones.
    pub fn cancelled_frames(&self) -> u64 {
        self.inner.lock().cancelled
    }

    /// Whether a requested frame is still outstanding.
    pub fn has_pending(&self) -> bool {
        self.inner.lock().pending.is_some()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&self) -> FrameRequest {
        let mut inner = self.inner.lock();
        let request = next_request(&mut inner.counter);
        inner.pending = Some(request);
        inner.requested += 1;
        request
    }

    fn cancel_frame(&self, request: FrameRequest) {
        let mut inner = self.inner.lock();
        inner.cancelled += 1;
        if inner.pending == Some(request) {
            inner.pending = None;
        }
    }
}

/// Scheduler that maps frame requests onto a window's redraw queue.
///
/// The window is attached once it exists; requests made before that still
/// mint valid handles, they just have no redraw to ride on yet.
#[derive(Debug, Default)]
pub struct WindowScheduler {
    inner: Mutex<WindowInner>,
}

#[derive(Debug, Default)]
struct WindowInner {
    counter: u64,
    window: Option<Arc<Window>>,
}

impl WindowScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points the scheduler at the live window.
    pub fn attach(&self, window: Arc<Window>) {
        self.inner.lock().window = Some(window);
    }

    /// Drops the window handle; later requests mint handles without side
    /// effects.
    pub fn detach(&self) {
        self.inner.lock().window = None;
    }
}

impl FrameScheduler for WindowScheduler {
    fn request_frame(&self) -> FrameRequest {
        let mut inner = self.inner.lock();
        if let Some(window) = inner.window.as_ref() {
            window.request_redraw();
        }
        next_request(&mut inner.counter)
    }

    fn cancel_frame(&self, _request: FrameRequest) {
        // A queued redraw cannot be withdrawn; the controller sees the
        // eventual wakeup as stale instead.
    }
}
