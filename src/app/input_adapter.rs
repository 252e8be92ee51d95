//! Winit event adapter
//!
//! Feeds winit window events into [`PointerInput`].

use winit::event::WindowEvent;

use super::input::PointerInput;

/// Applies one window event. Events the controls do not use are ignored.
pub fn process_window_event(input: &mut PointerInput, event: &WindowEvent) {
    match event {
        WindowEvent::CursorMoved { position, .. } => {
            input.handle_cursor_move(position.x, position.y);
        }

        WindowEvent::CursorLeft { .. } => {
            input.handle_cursor_left();
        }

        WindowEvent::MouseInput { state, button, .. } => {
            input.handle_mouse_input(*state, *button);
        }

        WindowEvent::Resized(size) => {
            input.handle_resize(size.width, size.height);
        }

        _ => {}
    }
}
