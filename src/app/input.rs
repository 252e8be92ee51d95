use glam::Vec2;
use rustc_hash::FxHashSet;
use winit::event::{ElementState, MouseButton};

/// Per-frame pointer state fed to the controls.
///
/// The host forwards window events through the `handle_*` methods, sets
/// [`hovered`](Self::hovered) from its own hit test against the controlled
/// node, and calls [`end_frame`](Self::end_frame) after the controls ran.
#[derive(Default, Debug, Clone)]
pub struct PointerInput {
    /// Cursor position in window pixels.
    pub cursor_position: Vec2,
    /// Movement since the previous frame.
    pub cursor_delta: Vec2,
    /// Window size in pixels.
    pub screen_size: Vec2,
    /// Whether the cursor is over the controlled node.
    pub hovered: bool,
    buttons: FxHashSet<MouseButton>,
    pressed: FxHashSet<MouseButton>,
    released: FxHashSet<MouseButton>,
    has_position: bool,
}

impl PointerInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the per-frame edges and delta.
    pub fn end_frame(&mut self) {
        self.cursor_delta = Vec2::ZERO;
        self.pressed.clear();
        self.released.clear();
    }

    pub fn handle_resize(&mut self, width: u32, height: u32) {
        self.screen_size = Vec2::new(width as f32, height as f32);
    }

    pub fn handle_cursor_move(&mut self, x: f64, y: f64) {
        let new_pos = Vec2::new(x as f32, y as f32);
        // First sample only establishes the origin.
        if self.has_position {
            self.cursor_delta += new_pos - self.cursor_position;
        }
        self.cursor_position = new_pos;
        self.has_position = true;
    }

    /// Cursor left the window; the next move starts a fresh origin.
    pub fn handle_cursor_left(&mut self) {
        self.has_position = false;
        self.hovered = false;
    }

    pub fn handle_mouse_input(&mut self, state: ElementState, button: MouseButton) {
        match state {
            ElementState::Pressed => {
                if self.buttons.insert(button) {
                    self.pressed.insert(button);
                }
            }
            ElementState::Released => {
                if self.buttons.remove(&button) {
                    self.released.insert(button);
                }
            }
        }
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    #[must_use]
    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    /// Pressed during the current frame.
    #[must_use]
    pub fn just_pressed(&self, button: MouseButton) -> bool {
        self.pressed.contains(&button)
    }

    /// Released during the current frame.
    #[must_use]
    pub fn just_released(&self, button: MouseButton) -> bool {
        self.released.contains(&button)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_move_has_no_delta() {
        let mut input = PointerInput::new();
        input.handle_cursor_move(100.0, 50.0);
        assert_eq!(input.cursor_delta, Vec2::ZERO);
        input.handle_cursor_move(110.0, 45.0);
        assert_eq!(input.cursor_delta, Vec2::new(10.0, -5.0));
    }

    #[test]
    fn button_edges_reset_at_end_of_frame() {
        let mut input = PointerInput::new();
        input.handle_mouse_input(ElementState::Pressed, MouseButton::Left);
        assert!(input.just_pressed(MouseButton::Left));
        input.end_frame();
        assert!(!input.just_pressed(MouseButton::Left));
        assert!(input.is_button_pressed(MouseButton::Left));
        input.handle_mouse_input(ElementState::Released, MouseButton::Left);
        assert!(input.just_released(MouseButton::Left));
        assert!(!input.is_button_pressed(MouseButton::Left));
    }
}
