use std::sync::Arc;

use glam::{Vec2, Vec3};

use crate::camera::PerspectiveCamera;
use crate::config;
use crate::input::PointerState;

/// Orbit-style camera controls with inertial damping.
///
/// Pointer motion lands in pending deltas; [`update`](Self::update) applies a
/// damped fraction per frame and writes the result to the camera, so drags
/// ease out over a few frames instead of stopping dead.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    target: Vec3,
    yaw: f32,
    pitch: f32,
    distance: f32,
    pending_yaw: f32,
    pending_pitch: f32,
    pending_pan: Vec2,
    pending_zoom: f32,
    pub damping_enabled: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pointer: Option<Arc<PointerState>>,
}

impl OrbitControls {
    /// Derives orbit angles and distance from the camera's placement
    /// relative to `target`.
    pub fn from_camera(camera: &PerspectiveCamera, target: Vec3) -> Self {
        let offset = camera.position - target;
        let length = offset.length();
        let distance = length.clamp(
            config::controls::MIN_DISTANCE,
            config::controls::MAX_DISTANCE,
        );
        let yaw = offset.x.atan2(offset.z);
        let pitch = (offset.y / length.max(f32::EPSILON))
            .clamp(-1.0, 1.0)
            .asin()
            .clamp(-config::controls::MAX_PITCH, config::controls::MAX_PITCH);
        Self {
            target,
            yaw,
            pitch,
            distance,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            pending_pan: Vec2::ZERO,
            pending_zoom: 0.0,
            damping_enabled: true,
            damping_factor: config::controls::DAMPING_FACTOR,
            rotate_speed: config::controls::ROTATE_SPEED,
            pan_speed: config::controls::PAN_SPEED,
            zoom_speed: config::controls::ZOOM_SPEED,
            min_distance: config::controls::MIN_DISTANCE,
            max_distance: config::controls::MAX_DISTANCE,
            pointer: None,
        }
    }

    /// Attaches a pointer source that gets drained on every update.
    pub fn bind_pointer(&mut self, pointer: Arc<PointerState>) {
        self.pointer = Some(pointer);
    }

    /// Detaches the pointer source and drops pending motion, leaving the
    /// camera wherever the last update put it.
    pub fn disconnect(&mut self) {
        if let Some(pointer) = self.pointer.take() {
            pointer.reset();
        }
        self.pending_yaw = 0.0;
        self.pending_pitch = 0.0;
        self.pending_pan = Vec2::ZERO;
        self.pending_zoom = 0.0;
    }

    /// Queues a rotation from a pointer drag, in pixels.
    pub fn rotate(&mut self, delta: Vec2) {
        self.pending_yaw -= delta.x * self.rotate_speed;
        self.pending_pitch -= delta.y * self.rotate_speed;
    }

    /// Queues a pan from a pointer drag, in pixels.
    pub fn pan(&mut self, delta: Vec2) {
        self.pending_pan += delta;
    }

    /// Queues a zoom; positive steps move the camera closer.
    pub fn zoom(&mut self, steps: f32) {
        self.pending_zoom += steps;
    }

    /// Applies pending motion to the orbit and writes the camera placement.
    /// Returns true if the camera moved this frame.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        if let Some(pointer) = self.pointer.clone() {
            let rotate = pointer.take_rotate_delta();
            if rotate != Vec2::ZERO {
                self.rotate(rotate);
            }
            let pan = pointer.take_pan_delta();
            if pan != Vec2::ZERO {
                self.pan(pan);
            }
            let scroll = pointer.take_scroll_delta();
            if scroll != 0.0 {
                self.zoom(scroll);
            }
        }

        let step = if self.damping_enabled {
            self.damping_factor
        } else {
            1.0
        };
        let keep = 1.0 - step;
        let moved = self.pending_yaw.abs() > MOTION_EPSILON
            || self.pending_pitch.abs() > MOTION_EPSILON
            || self.pending_pan.length_squared() > MOTION_EPSILON
            || self.pending_zoom.abs() > MOTION_EPSILON;

        self.yaw += self.pending_yaw * step;
        self.pitch = (self.pitch + self.pending_pitch * step)
            .clamp(-config::controls::MAX_PITCH, config::controls::MAX_PITCH);
        self.pending_yaw *= keep;
        self.pending_pitch *= keep;

        // Wheel steps apply in full and clamp immediately; zoom does not ease.
        if self.pending_zoom != 0.0 {
            self.distance = (self.distance - self.pending_zoom * self.zoom_speed)
                .clamp(self.min_distance, self.max_distance);
            self.pending_zoom = 0.0;
        }

        let pan_step = self.pending_pan * step;
        if pan_step != Vec2::ZERO {
            // Pan moves the target in the camera's screen plane, scaled by
            // distance so a drag covers more ground when zoomed out.
            let forward = (self.target - camera.position).normalize_or_zero();
            let right = forward.cross(camera.up).normalize_or_zero();
            let up = right.cross(forward);
            self.target +=
                (right * -pan_step.x + up * pan_step.y) * self.pan_speed * self.distance;
        }
        self.pending_pan *= keep;

        camera.position = self.target + self.offset();
        camera.look_at(self.target);
        moved
    }

    /// Camera offset from the target for the current yaw, pitch, and distance.
    fn offset(&self) -> Vec3 {
        Vec3::new(
            self.distance * self.pitch.cos() * self.yaw.sin(),
            self.distance * self.pitch.sin(),
            self.distance * self.pitch.cos() * self.yaw.cos(),
        )
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn is_connected(&self) -> bool {
        self.pointer.is_some()
    }
}

const MOTION_EPSILON: f32 = 1e-5;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PointerButton;
    use approx::assert_relative_eq;

    fn demo_rig() -> (PerspectiveCamera, OrbitControls) {
        let camera = PerspectiveCamera::demo(4.0 / 3.0);
        let controls = OrbitControls::from_camera(&camera, Vec3::ZERO);
        (camera, controls)
    }

    #[test]
    fn derives_orbit_from_initial_placement() {
        let (camera, controls) = demo_rig();
        assert_relative_eq!(controls.distance(), 33.0f32.sqrt(), epsilon = 1e-4);

        // Reapplying the derived orbit reproduces the camera position.
        let mut camera2 = camera.clone();
        let mut controls2 = controls.clone();
        controls2.update(&mut camera2);
        assert!((camera2.position - camera.position).length() < 1e-4);
    }

    #[test]
    fn damping_applies_motion_gradually() {
        let (mut camera, mut controls) = demo_rig();
        let start = controls.yaw();
        controls.rotate(Vec2::new(100.0, 0.0));
        let queued = 100.0 * controls.rotate_speed;

        controls.update(&mut camera);
        let first = (controls.yaw() - start).abs();
        assert_relative_eq!(first, queued * controls.damping_factor, epsilon = 1e-6);

        for _ in 0..400 {
            controls.update(&mut camera);
        }
        assert_relative_eq!((controls.yaw() - start).abs(), queued, epsilon = 1e-3);
    }

    #[test]
    fn disabling_damping_applies_motion_at_once() {
        let (mut camera, mut controls) = demo_rig();
        controls.damping_enabled = false;
        let start = controls.yaw();
        controls.rotate(Vec2::new(40.0, 0.0));
        controls.update(&mut camera);
        assert_relative_eq!(
            start - controls.yaw(),
            40.0 * controls.rotate_speed,
            epsilon = 1e-6
        );
    }

    #[test]
    fn zoom_is_clamped_to_distance_bounds() {
        let (mut camera, mut controls) = demo_rig();
        controls.zoom(1000.0);
        controls.update(&mut camera);
        assert_eq!(controls.distance(), controls.min_distance);

        controls.zoom(-1000.0);
        controls.update(&mut camera);
        assert_eq!(controls.distance(), controls.max_distance);
        assert_relative_eq!(
            camera.position.length(),
            controls.max_distance,
            epsilon = 1e-3
        );
    }

    #[test]
    fn pitch_stops_at_the_pole_clamp() {
        let (mut camera, mut controls) = demo_rig();
        controls.damping_enabled = false;
        controls.rotate(Vec2::new(0.0, -10_000.0));
        controls.update(&mut camera);
        assert_eq!(controls.pitch(), config::controls::MAX_PITCH);
    }

    #[test]
    fn update_drains_bound_pointer() {
        let (mut camera, mut controls) = demo_rig();
        let pointer = Arc::new(PointerState::new());
        controls.bind_pointer(Arc::clone(&pointer));
        pointer.set_button_down(PointerButton::PRIMARY);
        pointer.move_to(Vec2::ZERO);
        pointer.move_to(Vec2::new(50.0, 0.0));

        let before = controls.yaw();
        controls.update(&mut camera);
        assert!(controls.yaw() != before);
        assert_eq!(pointer.take_rotate_delta(), Vec2::ZERO);
    }

    #[test]
    fn disconnect_discards_pending_motion() {
        let (mut camera, mut controls) = demo_rig();
        let pointer = Arc::new(PointerState::new());
        controls.bind_pointer(pointer);
        controls.rotate(Vec2::new(500.0, 0.0));
        controls.disconnect();
        assert!(!controls.is_connected());

        let yaw = controls.yaw();
        controls.update(&mut camera);
        assert_eq!(controls.yaw(), yaw);
    }

    #[test]
    fn pan_moves_the_target_in_the_view_plane() {
        let (mut camera, mut controls) = demo_rig();
        controls.damping_enabled = false;
        controls.pan(Vec2::new(200.0, 0.0));
        controls.update(&mut camera);
        assert!(controls.target() != Vec3::ZERO);
        assert_relative_eq!(
            camera.position.distance(controls.target()),
            controls.distance(),
            epsilon = 1e-4
        );
    }
}
