use std::collections::HashSet;

use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Keyboard and mouse state accumulated between frames.
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
    dragging: bool,
    cursor: Option<(f64, f64)>,
    /// Cursor movement while dragging since the last frame, in physical pixels.
    drag_delta: (f64, f64),
    escape: bool,
}

impl InputState {
    pub fn apply(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else { return };
                match event.state {
                    ElementState::Pressed => {
                        if code == KeyCode::Escape {
                            self.escape = true;
                        }
                        self.held.insert(code);
                    }
                    ElementState::Released => {
                        self.held.remove(&code);
                    }
                }
            }
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                self.dragging = *state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let (true, Some((x, y))) = (self.dragging, self.cursor) {
                    self.drag_delta.0 += position.x - x;
                    self.drag_delta.1 += position.y - y;
                }
                self.cursor = Some((position.x, position.y));
            }
            WindowEvent::CursorLeft { .. } => self.cursor = None,
            WindowEvent::Focused(false) => {
                self.held.clear();
                self.dragging = false;
            }
            _ => {}
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held.contains(&code)
    }

    pub fn escape_pressed(&self) -> bool {
        self.escape
    }

    /// Returns and resets the accumulated drag movement.
    pub fn take_drag(&mut self) -> (f32, f32) {
        let (dx, dy) = std::mem::take(&mut self.drag_delta);
        (dx as f32, dy as f32)
    }
}
