use std::sync::Arc;

use parking_lot::RwLock;

/// Source of the current viewport dimensions.
///
/// The controller reads this at construction and on every resize instead of
/// holding a window handle, so the same code runs against a real window or a
/// fixed size in tests and headless mode.
pub trait ViewportProvider: Send + Sync {
    /// Current viewport size in logical pixels.
    fn viewport_size(&self) -> (u32, u32);

    /// Device pixel ratio mapping logical to physical pixels.
    fn scale_factor(&self) -> f64 {
        1.0
    }
}

/// Viewport that always reports the same resolution.
#[derive(Debug, Clone, Copy)]
pub struct StaticViewport {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
}

impl StaticViewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scale: 1.0,
        }
    }

    pub const fn with_scale(width: u32, height: u32, scale: f64) -> Self {
        Self {
            width,
            height,
            scale,
        }
    }
}

impl ViewportProvider for StaticViewport {
    fn viewport_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn scale_factor(&self) -> f64 {
        self.scale
    }
}

/// Viewport updated by the window shell as resize events arrive.
#[derive(Debug)]
pub struct SharedViewport {
    inner: RwLock<ViewportInner>,
}

#[derive(Debug)]
struct ViewportInner {
    size: (u32, u32),
    scale: f64,
}

impl SharedViewport {
    pub fn new(width: u32, height: u32, scale: f64) -> Self {
        Self {
            inner: RwLock::new(ViewportInner {
                size: (width.max(1), height.max(1)),
                scale,
            }),
        }
    }

    pub fn update(&self, width: u32, height: u32) {
        self.inner.write().size = (width.max(1), height.max(1));
    }

    pub fn set_scale_factor(&self, scale: f64) {
        self.inner.write().scale = scale;
    }
}

impl ViewportProvider for SharedViewport {
    fn viewport_size(&self) -> (u32, u32) {
        self.inner.read().size
    }

    fn scale_factor(&self) -> f64 {
        self.inner.read().scale
    }
}

impl<T> ViewportProvider for Arc<T>
where
    T: ViewportProvider + ?Sized,
{
    fn viewport_size(&self) -> (u32, u32) {
        (**self).viewport_size()
    }

    fn scale_factor(&self) -> f64 {
        (**self).scale_factor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_viewport_reports_fixed_size() {
        let viewport = StaticViewport::new(800, 600);
        assert_eq!(viewport.viewport_size(), (800, 600));
        assert_eq!(viewport.scale_factor(), 1.0);

        let scaled = StaticViewport::with_scale(800, 600, 2.0);
        assert_eq!(scaled.scale_factor(), 2.0);
    }

    #[test]
    fn shared_viewport_tracks_updates() {
        let viewport = SharedViewport::new(1280, 720, 1.0);
        viewport.update(1024, 768);
        viewport.set_scale_factor(1.5);
        assert_eq!(viewport.viewport_size(), (1024, 768));
        assert_eq!(viewport.scale_factor(), 1.5);
    }

    #[test]
    fn shared_viewport_clamps_zero_to_one() {
        let viewport = SharedViewport::new(0, 0, 1.0);
        assert_eq!(viewport.viewport_size(), (1, 1));
        viewport.update(640, 0);
        assert_eq!(viewport.viewport_size(), (640, 1));
    }
}
