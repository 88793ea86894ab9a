use std::env;
use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use log::info;
use pollster::block_on;
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use turntable::{
    FrameScheduler, ManualScheduler, MeshShape, NodeKind, NullSurface, PointerButton,
    PointerState, Renderer, Scene, SceneController, SharedViewport, StaticViewport, SurfaceSize,
    ViewportProvider, WindowScheduler,
};

/// Frames the fallback headless run renders when no window can be opened.
const FALLBACK_FRAMES: u64 = 60;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    if let Some(frames) = options.headless {
        return run_headless(&options, frames);
    }
    match run_windowed(&options) {
        Ok(()) => Ok(()),
        Err(err) if err.downcast_ref::<WindowInitError>().is_some() => {
            eprintln!("{err}; falling back to headless mode");
            run_headless(&options, FALLBACK_FRAMES)
        }
        Err(err) => Err(err),
    }
}

fn run_headless(options: &CliOptions, frames: u64) -> Result<()> {
    println!(
        "Running headless for {frames} frame(s) at {}x{}",
        options.width, options.height
    );

    let surface = NullSurface::new(SurfaceSize::new(options.width, options.height));
    let mut controller = SceneController::new(
        Box::new(surface),
        Arc::new(ManualScheduler::new()),
        Arc::new(StaticViewport::new(options.width, options.height)),
        Arc::new(PointerState::new()),
    )?;

    print_scene(controller.scene());
    for _ in 0..frames {
        controller.animation_step()?;
    }
    print_final_state(&controller);
    controller.dispose();
    println!("Disposed scene controller");
    Ok(())
}

fn run_windowed(options: &CliOptions) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|err| WindowInitError::from_error("event loop", err))?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = WindowedApp::new(options);
    event_loop.run_app(&mut app)?;

    if let Some(controller) = app.controller.as_mut() {
        controller.dispose();
    }
    if let Some(err) = app.fatal.take() {
        return Err(err);
    }
    if let Some(controller) = app.controller.as_ref() {
        print_final_state(controller);
    }
    Ok(())
}

/// Window-system initialization failure the shell can fall back from.
#[derive(Debug, Error)]
#[error("failed to initialize {stage}: {reason}")]
struct WindowInitError {
    stage: &'static str,
    reason: String,
}

impl WindowInitError {
    fn from_error(stage: &'static str, err: impl fmt::Display) -> Self {
        Self {
            stage,
            reason: err.to_string(),
        }
    }
}

struct WindowedApp {
    width: u32,
    height: u32,
    title: String,
    window: Option<Arc<Window>>,
    controller: Option<SceneController>,
    scheduler: Arc<WindowScheduler>,
    viewport: Arc<SharedViewport>,
    pointer: Arc<PointerState>,
    fatal: Option<anyhow::Error>,
}

impl WindowedApp {
    fn new(options: &CliOptions) -> Self {
        Self {
            width: options.width,
            height: options.height,
            title: options.title.clone(),
            window: None,
            controller: None,
            scheduler: Arc::new(WindowScheduler::new()),
            viewport: Arc::new(SharedViewport::new(options.width, options.height, 1.0)),
            pointer: Arc::new(PointerState::new()),
            fatal: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.fatal = Some(err);
        event_loop.exit();
    }

    /// Pushes the window's logical size into the shared viewport.
    fn sync_viewport(&self) {
        if let Some(window) = self.window.as_ref() {
            let scale = window.scale_factor();
            let logical: LogicalSize<f64> = window.inner_size().to_logical(scale);
            self.viewport
                .update(logical.width.round() as u32, logical.height.round() as u32);
            self.viewport.set_scale_factor(scale);
        }
    }
}

impl ApplicationHandler for WindowedApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(LogicalSize::new(self.width, self.height));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                let err = WindowInitError::from_error("window", err);
                return self.fail(event_loop, err.into());
            }
        };

        let renderer = match block_on(Renderer::new(Arc::clone(&window), &Scene::demo())) {
            Ok(renderer) => renderer,
            Err(err) => {
                let err = WindowInitError::from_error("graphics device", err);
                return self.fail(event_loop, err.into());
            }
        };

        self.window = Some(window);
        self.sync_viewport();
        if let Some(window) = self.window.as_ref() {
            self.scheduler.attach(Arc::clone(window));
        }

        let controller = match SceneController::new(
            Box::new(renderer),
            Arc::clone(&self.scheduler) as Arc<dyn FrameScheduler>,
            Arc::clone(&self.viewport) as Arc<dyn ViewportProvider>,
            Arc::clone(&self.pointer),
        ) {
            Ok(controller) => controller,
            Err(err) => return self.fail(event_loop, err),
        };

        print_scene(controller.scene());
        info!("window up at scale factor {}", self.viewport.scale_factor());
        self.controller = Some(controller);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.window.as_ref().map(|window| window.id()) != Some(window_id) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                if let Some(controller) = self.controller.as_mut() {
                    controller.dispose();
                }
                self.scheduler.detach();
                event_loop.exit();
            }
            WindowEvent::Resized(_) => {
                self.sync_viewport();
                if let Some(controller) = self.controller.as_mut() {
                    controller.on_resize();
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.viewport.set_scale_factor(scale_factor);
                if let Some(controller) = self.controller.as_mut() {
                    controller.on_resize();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer
                    .move_to(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = map_mouse_button(button);
                match state {
                    ElementState::Pressed => self.pointer.set_button_down(button),
                    ElementState::Released => self.pointer.set_button_up(button),
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => (position.y / 40.0) as f32,
                };
                self.pointer.add_scroll(steps);
            }
            WindowEvent::RedrawRequested => {
                if let Some(controller) = self.controller.as_mut() {
                    if let Err(err) = controller.animation_step() {
                        self.fail(event_loop, err);
                    }
                }
            }
            _ => {}
        }
    }
}

fn map_mouse_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::PRIMARY,
        MouseButton::Right => PointerButton::SECONDARY,
        MouseButton::Middle => PointerButton::new(2),
        MouseButton::Back => PointerButton::new(3),
        MouseButton::Forward => PointerButton::new(4),
        MouseButton::Other(value) => PointerButton::new(value.min(u16::from(u8::MAX)) as u8),
    }
}

fn print_scene(scene: &Scene) {
    println!(
        "Loaded scene with {} nodes ({} lights, {} meshes)",
        scene.len(),
        scene.lights().count(),
        scene.meshes().count()
    );
    for node in &scene.nodes {
        println!(" - {} ({})", node.name, describe_kind(&node.kind));
    }
}

fn describe_kind(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::AmbientLight => "ambient light",
        NodeKind::DirectionalLight => "directional light",
        NodeKind::Mesh(MeshShape::Cube { .. }) => "cube",
        NodeKind::Mesh(MeshShape::Plane { .. }) => "plane",
    }
}

fn print_final_state(controller: &SceneController) {
    let camera = controller.camera();
    println!(
        "Rendered {} frame(s), camera at ({:.2}, {:.2}, {:.2})",
        controller.stats().frame_count(),
        camera.position.x,
        camera.position.y,
        camera.position.z
    );
    println!("Final node states:");
    for node in &controller.scene().nodes {
        println!(
            " - {} pos=({:.2}, {:.2}, {:.2}) rot=({:.2}, {:.2}, {:.2})",
            node.name,
            node.position.x,
            node.position.y,
            node.position.z,
            node.rotation.x,
            node.rotation.y,
            node.rotation.z
        );
    }
}

struct CliOptions {
    width: u32,
    height: u32,
    title: String,
    headless: Option<u64>,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut options = Self {
            width: turntable::config::WINDOW_WIDTH,
            height: turntable::config::WINDOW_HEIGHT,
            title: turntable::config::WINDOW_TITLE.to_string(),
            headless: None,
        };
        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--size" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--size expects WIDTHxHEIGHT"))?;
                    let (width, height) = value
                        .split_once('x')
                        .ok_or_else(|| anyhow!("--size expects WIDTHxHEIGHT, got {value}"))?;
                    options.width = width
                        .parse()
                        .with_context(|| format!("bad width in --size {value}"))?;
                    options.height = height
                        .parse()
                        .with_context(|| format!("bad height in --size {value}"))?;
                    if options.width == 0 || options.height == 0 {
                        return Err(anyhow!("--size dimensions must be positive"));
                    }
                }
                "--headless" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--headless expects a frame count"))?;
                    options.headless = Some(
                        value
                            .parse()
                            .with_context(|| format!("bad frame count {value}"))?,
                    );
                }
                "--title" => {
                    options.title = args.next().ok_or_else(|| anyhow!("--title expects a value"))?;
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Usage: turntable [--size WIDTHxHEIGHT] [--title NAME] [--headless FRAMES]"
                    ));
                }
            }
        }
        Ok(options)
    }
}
