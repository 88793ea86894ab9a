//! Windowed 3D turntable demo: a lit cube over a shadowed ground plane.
//!
//! The crate exposes the scene graph, camera, orbit controls, and the
//! lifecycle controller that ties them together. Platform concerns sit
//! behind small ports (frame scheduling, viewport geometry, render
//! surface), so the same lifecycle runs under a real window or entirely
//! headless in tests and tooling.

pub mod camera;
pub mod config;
pub mod controller;
pub mod controls;
pub mod input;
pub mod render;
pub mod scene;
pub mod schedule;
pub mod stats;
pub mod viewport;

pub use camera::PerspectiveCamera;
pub use controller::{Phase, SceneController, StepOutcome};
pub use controls::OrbitControls;
pub use input::{PointerButton, PointerState};
pub use render::{MeshData, NullSurface, RenderSurface, Renderer, SurfaceSize, Vertex};
pub use scene::{MeshShape, NodeKind, Scene, SceneNode};
pub use schedule::{FrameRequest, FrameScheduler, ManualScheduler, WindowScheduler};
pub use stats::FrameStats;
pub use viewport::{SharedViewport, StaticViewport, ViewportProvider};
