use std::collections::HashSet;

use glam::Vec2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Identifier for a pointer button (primary button is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointerButton(u8);

impl PointerButton {
    /// Left mouse button; dragging it orbits the camera.
    pub const PRIMARY: Self = Self(0);

    /// Right mouse button; dragging it pans the orbit target.
    pub const SECONDARY: Self = Self(1);

    pub fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

/// Thread-safe pointer snapshot shared between the window shell and the
/// orbit controls.
///
/// Motion is accumulated into per-gesture deltas that the controls drain
/// once per animation step.
#[derive(Debug, Default)]
pub struct PointerState {
    inner: RwLock<PointerInner>,
}

#[derive(Debug, Default)]
struct PointerInner {
    buttons: HashSet<PointerButton>,
    position: Option<Vec2>,
    rotate_delta: Vec2,
    pan_delta: Vec2,
    scroll_delta: f32,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_button_down(&self, button: PointerButton) {
        self.inner.write().buttons.insert(button);
    }

    pub fn set_button_up(&self, button: PointerButton) {
        self.inner.write().buttons.remove(&button);
    }

    pub fn is_button_down(&self, button: PointerButton) -> bool {
        self.inner.read().buttons.contains(&button)
    }

    /// Records a pointer move, attributing the motion to the rotate or pan
    /// gesture depending on which button is held. The first move after
    /// creation or [`reset`](Self::reset) only anchors the position.
    pub fn move_to(&self, position: Vec2) {
        let mut inner = self.inner.write();
        if let Some(previous) = inner.position {
            let delta = position - previous;
            if inner.buttons.contains(&PointerButton::PRIMARY) {
                inner.rotate_delta += delta;
            } else if inner.buttons.contains(&PointerButton::SECONDARY) {
                inner.pan_delta += delta;
            }
        }
        inner.position = Some(position);
    }

    pub fn add_scroll(&self, delta: f32) {
        self.inner.write().scroll_delta += delta;
    }

    pub fn position(&self) -> Option<Vec2> {
        self.inner.read().position
    }

    /// Drains the accumulated primary-drag motion.
    pub fn take_rotate_delta(&self) -> Vec2 {
        std::mem::take(&mut self.inner.write().rotate_delta)
    }

    /// Drains the accumulated secondary-drag motion.
    pub fn take_pan_delta(&self) -> Vec2 {
        std::mem::take(&mut self.inner.write().pan_delta)
    }

    /// Drains the accumulated scroll motion.
    pub fn take_scroll_delta(&self) -> f32 {
        std::mem::take(&mut self.inner.write().scroll_delta)
    }

    /// Forgets held buttons and pending motion, as when listeners detach.
    pub fn reset(&self) {
        *self.inner.write() = PointerInner::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_drag_accumulates_rotation() {
        let state = PointerState::new();
        state.set_button_down(PointerButton::PRIMARY);
        state.move_to(Vec2::new(10.0, 10.0));
        state.move_to(Vec2::new(14.0, 12.0));
        state.move_to(Vec2::new(15.0, 12.0));
        assert_eq!(state.take_rotate_delta(), Vec2::new(5.0, 2.0));
        assert_eq!(state.take_rotate_delta(), Vec2::ZERO);
        assert_eq!(state.take_pan_delta(), Vec2::ZERO);
    }

    #[test]
    fn secondary_drag_accumulates_pan() {
        let state = PointerState::new();
        state.set_button_down(PointerButton::SECONDARY);
        state.move_to(Vec2::ZERO);
        state.move_to(Vec2::new(-3.0, 7.0));
        assert_eq!(state.take_pan_delta(), Vec2::new(-3.0, 7.0));
        assert_eq!(state.take_rotate_delta(), Vec2::ZERO);
    }

    #[test]
    fn motion_without_buttons_is_ignored() {
        let state = PointerState::new();
        state.move_to(Vec2::ZERO);
        state.move_to(Vec2::new(100.0, 100.0));
        assert_eq!(state.take_rotate_delta(), Vec2::ZERO);
        assert_eq!(state.take_pan_delta(), Vec2::ZERO);
        assert_eq!(state.position(), Some(Vec2::new(100.0, 100.0)));
    }

    #[test]
    fn scroll_accumulates_until_taken() {
        let state = PointerState::new();
        state.add_scroll(1.0);
        state.add_scroll(-0.25);
        assert_eq!(state.take_scroll_delta(), 0.75);
        assert_eq!(state.take_scroll_delta(), 0.0);
    }

    #[test]
    fn reset_clears_buttons_and_motion() {
        let state = PointerState::new();
        state.set_button_down(PointerButton::PRIMARY);
        state.move_to(Vec2::ZERO);
        state.move_to(Vec2::new(4.0, 4.0));
        state.reset();
        assert!(!state.is_button_down(PointerButton::PRIMARY));
        assert_eq!(state.take_rotate_delta(), Vec2::ZERO);
        assert_eq!(state.position(), None);
    }
}
