use std::sync::Arc;

use anyhow::Result;
use log::{debug, info};

use crate::camera::PerspectiveCamera;
use crate::config;
use crate::controls::OrbitControls;
use crate::input::PointerState;
use crate::render::{RenderSurface, SurfaceSize};
use crate::scene::Scene;
use crate::schedule::{FrameRequest, FrameScheduler};
use crate::stats::FrameStats;
use crate::viewport::ViewportProvider;

/// Lifecycle phase of a [`SceneController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Disposed,
}

/// What one [`SceneController::animation_step`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A frame was rendered and the next one requested.
    Rendered,
    /// The callback had no pending request behind it; nothing happened.
    Stale,
}

/// Owns the demo scene and drives it through its whole life.
///
/// Construction populates the scene, places the camera, arms the orbit
/// controls, and requests the first animation frame. Every fired frame comes
/// back in through [`animation_step`](Self::animation_step); window geometry
/// changes come in through [`on_resize`](Self::on_resize); and
/// [`dispose`](Self::dispose) tears the whole thing down exactly once.
///
/// The controller never touches the platform directly. Frames, viewport
/// geometry, and the output surface are all ports, so the same lifecycle runs
/// under a real window or entirely headless.
pub struct SceneController {
    scene: Scene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    stats: FrameStats,
    surface: Box<dyn RenderSurface>,
    scheduler: Arc<dyn FrameScheduler>,
    viewport: Arc<dyn ViewportProvider>,
    pending: Option<FrameRequest>,
    phase: Phase,
}

impl SceneController {
    /// Builds the scene, camera, and controls, sizes the surface to the
    /// viewport, and requests the first frame.
    pub fn new(
        mut surface: Box<dyn RenderSurface>,
        scheduler: Arc<dyn FrameScheduler>,
        viewport: Arc<dyn ViewportProvider>,
        pointer: Arc<PointerState>,
    ) -> Result<Self> {
        let scene = Scene::demo();

        let (width, height) = viewport.viewport_size();
        let camera = PerspectiveCamera::demo(width.max(1) as f32 / height.max(1) as f32);
        surface.resize(SurfaceSize::from_logical(
            width,
            height,
            viewport.scale_factor(),
        ));

        let mut controls = OrbitControls::from_camera(&camera, config::camera::TARGET);
        controls.bind_pointer(pointer);

        let pending = Some(scheduler.request_frame());
        info!(
            "scene controller up: {} nodes, viewport {}x{}",
            scene.len(),
            width,
            height
        );

        Ok(Self {
            scene,
            camera,
            controls,
            stats: FrameStats::new(),
            surface,
            scheduler,
            viewport,
            pending,
            phase: Phase::Running,
        })
    }

    /// Reacts to a viewport change: camera aspect follows the new logical
    /// size, the surface follows the new physical size. A zero-area viewport
    /// (minimized window) is ignored.
    pub fn on_resize(&mut self) {
        let (width, height) = self.viewport.viewport_size();
        if width == 0 || height == 0 {
            debug!("ignoring resize while the viewport has zero area");
            return;
        }
        self.camera.set_aspect(width as f32 / height as f32);
        let size = SurfaceSize::from_logical(width, height, self.viewport.scale_factor());
        self.surface.resize(size);
        debug!("viewport now {}x{} physical", size.width, size.height);
    }

    /// Runs one animation frame: spin the cube, settle the controls, render,
    /// record timing, request the next frame.
    ///
    /// A callback with no pending request behind it (fired after dispose or
    /// cancellation) is reported as [`StepOutcome::Stale`] and does nothing.
    /// Render errors propagate; no further frame is requested in that case.
    pub fn animation_step(&mut self) -> Result<StepOutcome> {
        if self.pending.take().is_none() {
            debug!("stale frame callback ignored");
            return Ok(StepOutcome::Stale);
        }

        self.stats.begin_frame();

        // Fixed spin per frame, frame-counted rather than time-scaled.
        self.scene.update(config::scene::CUBE, |node| {
            node.rotation.x += config::scene::ROTATION_STEP;
            node.rotation.y += config::scene::ROTATION_STEP;
        });

        self.controls.update(&mut self.camera);
        self.surface.render(&self.scene, &self.camera, &self.stats)?;
        self.stats.end_frame();

        self.pending = Some(self.scheduler.request_frame());
        Ok(StepOutcome::Rendered)
    }

    /// Cancels the pending frame, detaches the controls, and releases the
    /// surface. Safe to call any number of times; only the first does work.
    pub fn dispose(&mut self) {
        if self.phase == Phase::Disposed {
            debug!("dispose on a disposed controller is a no-op");
            return;
        }
        if let Some(request) = self.pending.take() {
            self.scheduler.cancel_frame(request);
        }
        self.controls.disconnect();
        self.surface.release();
        self.phase = Phase::Disposed;
        info!("scene controller disposed after {} frames", self.stats.frame_count());
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Handle of the frame request currently outstanding, if any.
    pub fn pending_frame(&self) -> Option<FrameRequest> {
        self.pending
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Current physical size of the output surface.
    pub fn surface_size(&self) -> SurfaceSize {
        self.surface.size()
    }
}
