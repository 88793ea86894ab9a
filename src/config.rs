//! Fixed parameters for the demo scene and its controls.
//!
//! The scene content is intentionally static; everything tunable about it
//! lives here rather than being scattered through the modules that use it.

use glam::Vec3;

/// Camera settings shared by the windowed and headless shells.
pub mod camera {
    use glam::Vec3;

    /// Vertical field of view in degrees.
    pub const FOV_Y_DEG: f32 = 75.0;

    /// Near clip plane distance.
    pub const NEAR: f32 = 0.1;

    /// Far clip plane distance.
    pub const FAR: f32 = 1000.0;

    /// Initial camera position.
    pub const INITIAL_POSITION: Vec3 = Vec3::new(2.0, 2.0, 5.0);

    /// Point the camera orbits around and looks at.
    pub const TARGET: Vec3 = Vec3::ZERO;
}

/// Orbit control tuning.
pub mod controls {
    /// Rotation applied per pixel of primary-button drag, in radians.
    pub const ROTATE_SPEED: f32 = 0.005;

    /// Pan applied per pixel of secondary-button drag, scaled by distance.
    pub const PAN_SPEED: f32 = 0.002;

    /// Distance change per scroll step.
    pub const ZOOM_SPEED: f32 = 0.5;

    /// Minimum orbit distance from the target.
    pub const MIN_DISTANCE: f32 = 2.0;

    /// Maximum orbit distance from the target.
    pub const MAX_DISTANCE: f32 = 20.0;

    /// Pitch limit (radians) to keep the camera from flipping over the pole.
    pub const MAX_PITCH: f32 = 1.5;

    /// Fraction of the pending motion applied per frame while damping.
    pub const DAMPING_FACTOR: f32 = 0.05;
}

/// Demo scene population.
pub mod scene {
    use glam::Vec3;

    /// Node names, used to address nodes through [`crate::scene::Scene::update`].
    pub const AMBIENT: &str = "Ambient";
    pub const SUN: &str = "Sun";
    pub const CUBE: &str = "Cube";
    pub const GROUND: &str = "Ground";

    /// Ambient light intensity.
    pub const AMBIENT_INTENSITY: f32 = 0.4;

    /// Directional light intensity.
    pub const SUN_INTENSITY: f32 = 1.0;

    /// Directional light position; the light points from here at the origin.
    pub const SUN_POSITION: Vec3 = Vec3::new(10.0, 10.0, 5.0);

    /// Edge length of the spinning cube.
    pub const CUBE_SIZE: f32 = 1.0;

    pub const CUBE_COLOR: Vec3 = Vec3::new(0.0, 1.0, 0.0);

    /// Side length of the square ground plane.
    pub const GROUND_SIZE: f32 = 10.0;

    pub const GROUND_COLOR: Vec3 = Vec3::new(0.5, 0.5, 0.5);

    /// Vertical offset of the ground below the cube.
    pub const GROUND_HEIGHT: f32 = -1.0;

    /// Cube spin per animation step, in radians, on both X and Y.
    pub const ROTATION_STEP: f32 = 0.01;
}

/// Shadow map parameters for the directional light.
pub mod shadow {
    /// Shadow map resolution (square).
    pub const MAP_SIZE: u32 = 2048;

    /// Half extent of the orthographic light frustum, sized to cover the
    /// ground plane with margin.
    pub const HALF_EXTENT: f32 = 12.0;

    pub const NEAR: f32 = 1.0;
    pub const FAR: f32 = 40.0;
}

/// Performance overlay settings.
pub mod overlay {
    /// Number of frame timing samples kept for averaging.
    pub const FRAME_SAMPLES: usize = 120;
}

/// Default window size when no `--size` flag is given.
pub const WINDOW_WIDTH: u32 = 1280;
pub const WINDOW_HEIGHT: u32 = 720;

pub const WINDOW_TITLE: &str = "Turntable";

/// Background color behind the scene.
pub const CLEAR_COLOR: Vec3 = Vec3::new(0.03, 0.03, 0.05);
