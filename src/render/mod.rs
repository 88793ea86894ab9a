//! Rendering surface abstraction and its implementations.
//!
//! The controller talks to a [`RenderSurface`] and never to the GPU directly;
//! [`native::Renderer`] is the wgpu-backed implementation and [`NullSurface`]
//! stands in for it in tests and headless runs.

use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::camera::PerspectiveCamera;
use crate::scene::Scene;
use crate::stats::FrameStats;

pub mod mesh;
pub mod native;
mod overlay;

pub use mesh::{MeshData, Vertex};
pub use native::Renderer;

/// Physical output size of a rendering surface, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Physical size for a logical viewport under the given device pixel
    /// ratio, rounded the way the platform rounds.
    pub fn from_logical(width: u32, height: u32, scale_factor: f64) -> Self {
        Self::new(
            (width as f64 * scale_factor).round() as u32,
            (height as f64 * scale_factor).round() as u32,
        )
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Output target for one frame of scene rendering.
pub trait RenderSurface {
    /// Reconfigures the output to a new physical size.
    fn resize(&mut self, size: SurfaceSize);

    /// Draws the scene through the camera, then the stats overlay on top.
    fn render(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        stats: &FrameStats,
    ) -> Result<()>;

    /// Releases the underlying graphics context and overlay. Further calls
    /// are no-ops.
    fn release(&mut self);

    /// Current physical output size.
    fn size(&self) -> SurfaceSize;
}

/// Surface that records calls and draws nothing.
///
/// The recorder sits behind a shared handle, so a clone kept outside the
/// controller still observes what the boxed instance was told to do.
#[derive(Debug, Clone)]
pub struct NullSurface {
    inner: Arc<RwLock<NullSurfaceState>>,
}

#[derive(Debug)]
struct NullSurfaceState {
    size: SurfaceSize,
    resizes: Vec<SurfaceSize>,
    renders: u64,
    released: bool,
}

impl NullSurface {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(NullSurfaceState {
                size,
                resizes: Vec::new(),
                renders: 0,
                released: false,
            })),
        }
    }

    pub fn render_count(&self) -> u64 {
        self.inner.read().renders
    }

    pub fn resize_history(&self) -> Vec<SurfaceSize> {
        self.inner.read().resizes.clone()
    }

    pub fn is_released(&self) -> bool {
        self.inner.read().released
    }
}

impl RenderSurface for NullSurface {
    fn resize(&mut self, size: SurfaceSize) {
        let mut inner = self.inner.write();
        inner.size = size;
        inner.resizes.push(size);
    }

    fn render(
        &mut self,
        _scene: &Scene,
        _camera: &PerspectiveCamera,
        _stats: &FrameStats,
    ) -> Result<()> {
        self.inner.write().renders += 1;
        Ok(())
    }

    fn release(&mut self) {
        self.inner.write().released = true;
    }

    fn size(&self) -> SurfaceSize {
        self.inner.read().size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_logical_scales_and_rounds() {
        assert_eq!(
            SurfaceSize::from_logical(800, 600, 1.0),
            SurfaceSize::new(800, 600)
        );
        assert_eq!(
            SurfaceSize::from_logical(800, 600, 2.0),
            SurfaceSize::new(1600, 1200)
        );
        // 1280 * 1.25 = 1600, 720 * 1.25 = 900
        assert_eq!(
            SurfaceSize::from_logical(1280, 720, 1.25),
            SurfaceSize::new(1600, 900)
        );
        // Fractional results round to the nearest pixel.
        assert_eq!(
            SurfaceSize::from_logical(101, 101, 1.5),
            SurfaceSize::new(152, 152)
        );
    }

    #[test]
    fn zero_dimensions_clamp_to_one() {
        let size = SurfaceSize::new(0, 0);
        assert_eq!((size.width, size.height), (1, 1));
        assert_eq!(SurfaceSize::from_logical(0, 600, 1.0).width, 1);
    }

    #[test]
    fn aspect_matches_dimensions() {
        let size = SurfaceSize::new(1600, 900);
        assert!((size.aspect() - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn null_surface_records_calls() {
        let mut surface = NullSurface::new(SurfaceSize::new(800, 600));
        let probe = surface.clone();
        let scene = Scene::demo();
        let camera = PerspectiveCamera::demo(4.0 / 3.0);
        let stats = FrameStats::new();

        surface.render(&scene, &camera, &stats).unwrap();
        surface.resize(SurfaceSize::new(1024, 768));
        surface.render(&scene, &camera, &stats).unwrap();

        assert_eq!(surface.render_count(), 2);
        assert_eq!(surface.resize_history(), &[SurfaceSize::new(1024, 768)]);
        assert_eq!(surface.size(), SurfaceSize::new(1024, 768));
        assert!(!surface.is_released());

        surface.release();
        // The clone shares the recorder with the instance it was taken from.
        assert!(probe.is_released());
        assert_eq!(probe.render_count(), 2);
    }
}
