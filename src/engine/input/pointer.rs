// Pointer normalisation - mouse and touch reduced to one event shape

use glam::Vec2;
use std::time::Instant;
use winit::event::{ElementState, MouseButton, TouchPhase, WindowEvent};

/// A pointer position in surface coordinates (logical px, y-down) with the
/// time it was observed (seconds since the normaliser started)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub position: Vec2,
    pub timestamp: f64,
}

impl PointerSample {
    pub fn new(x: f32, y: f32, timestamp: f64) -> Self {
        Self {
            position: Vec2::new(x, y),
            timestamp,
        }
    }
}

/// Input events as the interaction controller sees them
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Pressed(PointerSample),
    Moved(PointerSample),
    Released(PointerSample),
    /// Pointer left the surface
    Left,
}

impl PointerEvent {
    pub fn sample(&self) -> Option<PointerSample> {
        match self {
            Self::Pressed(s) | Self::Moved(s) | Self::Released(s) => Some(*s),
            Self::Left => None,
        }
    }
}

/// Converts winit mouse and touch events into [`PointerEvent`]s
#[derive(Debug)]
pub struct PointerNormalizer {
    /// Last cursor position in logical px; mouse buttons carry no position
    cursor: Option<Vec2>,
    /// Physical-to-logical divisor
    scale_factor: f64,
    /// Only the first finger down is followed
    active_touch: Option<u64>,
    origin: Instant,
}

impl PointerNormalizer {
    pub fn new(scale_factor: f64, origin: Instant) -> Self {
        Self {
            cursor: None,
            scale_factor: if scale_factor > 0.0 { scale_factor } else { 1.0 },
            active_touch: None,
            origin,
        }
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        if scale_factor > 0.0 {
            self.scale_factor = scale_factor;
        }
    }

    /// Process a window event; returns `None` for anything that isn't pointer input
    pub fn process_window_event(&mut self, event: &WindowEvent, now: Instant) -> Option<PointerEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => self.cursor_moved(position.x, position.y, now),
            WindowEvent::CursorLeft { .. } => self.cursor_left(),
            WindowEvent::MouseInput { state, button, .. } => self.mouse_button(*button, *state, now),
            WindowEvent::Touch(touch) => {
                self.touch(touch.id, touch.phase, touch.location.x, touch.location.y, now)
            }
            _ => None,
        }
    }

    /// Physical cursor position update
    pub fn cursor_moved(&mut self, x: f64, y: f64, now: Instant) -> Option<PointerEvent> {
        let position = self.to_logical(x, y);
        self.cursor = Some(position);
        Some(PointerEvent::Moved(self.sample(position, now)))
    }

    pub fn cursor_left(&mut self) -> Option<PointerEvent> {
        self.cursor = None;
        Some(PointerEvent::Left)
    }

    /// Only the primary button drives the pet
    pub fn mouse_button(
        &mut self,
        button: MouseButton,
        state: ElementState,
        now: Instant,
    ) -> Option<PointerEvent> {
        if button != MouseButton::Left {
            return None;
        }
        let sample = self.sample(self.cursor?, now);
        Some(match state {
            ElementState::Pressed => PointerEvent::Pressed(sample),
            ElementState::Released => PointerEvent::Released(sample),
        })
    }

    /// Physical touch update
    pub fn touch(&mut self, id: u64, phase: TouchPhase, x: f64, y: f64, now: Instant) -> Option<PointerEvent> {
        let position = self.to_logical(x, y);

        match phase {
            TouchPhase::Started => {
                if self.active_touch.is_some() {
                    return None;
                }
                self.active_touch = Some(id);
                Some(PointerEvent::Pressed(self.sample(position, now)))
            }
            TouchPhase::Moved if self.active_touch == Some(id) => {
                Some(PointerEvent::Moved(self.sample(position, now)))
            }
            TouchPhase::Ended | TouchPhase::Cancelled if self.active_touch == Some(id) => {
                self.active_touch = None;
                Some(PointerEvent::Released(self.sample(position, now)))
            }
            _ => None,
        }
    }

    fn to_logical(&self, x: f64, y: f64) -> Vec2 {
        Vec2::new((x / self.scale_factor) as f32, (y / self.scale_factor) as f32)
    }

    fn sample(&self, position: Vec2, now: Instant) -> PointerSample {
        PointerSample {
            position,
            timestamp: now.saturating_duration_since(self.origin).as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cursor_is_scaled_to_logical() {
        let origin = Instant::now();
        let mut pointer = PointerNormalizer::new(2.0, origin);

        let event = pointer.cursor_moved(200.0, 100.0, origin + Duration::from_millis(500));
        let sample = event.and_then(|e| e.sample()).unwrap();
        assert_eq!(sample.position, Vec2::new(100.0, 50.0));
        assert!((sample.timestamp - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_mouse_press_uses_last_cursor() {
        let origin = Instant::now();
        let mut pointer = PointerNormalizer::new(1.0, origin);

        // No cursor yet: nothing to report
        assert_eq!(pointer.mouse_button(MouseButton::Left, ElementState::Pressed, origin), None);

        pointer.cursor_moved(30.0, 40.0, origin);
        let pressed = pointer.mouse_button(MouseButton::Left, ElementState::Pressed, origin);
        assert!(matches!(pressed, Some(PointerEvent::Pressed(s)) if s.position == Vec2::new(30.0, 40.0)));

        let released = pointer.mouse_button(MouseButton::Left, ElementState::Released, origin);
        assert!(matches!(released, Some(PointerEvent::Released(_))));
    }

    #[test]
    fn test_secondary_buttons_ignored() {
        let origin = Instant::now();
        let mut pointer = PointerNormalizer::new(1.0, origin);
        pointer.cursor_moved(1.0, 1.0, origin);
        assert_eq!(pointer.mouse_button(MouseButton::Right, ElementState::Pressed, origin), None);
    }

    #[test]
    fn test_touch_follows_first_finger() {
        let origin = Instant::now();
        let mut pointer = PointerNormalizer::new(1.0, origin);

        assert!(matches!(
            pointer.touch(1, TouchPhase::Started, 10.0, 10.0, origin),
            Some(PointerEvent::Pressed(_))
        ));
        assert_eq!(pointer.touch(2, TouchPhase::Started, 50.0, 50.0, origin), None);
        assert_eq!(pointer.touch(2, TouchPhase::Moved, 60.0, 60.0, origin), None);
        assert!(matches!(
            pointer.touch(1, TouchPhase::Moved, 20.0, 10.0, origin),
            Some(PointerEvent::Moved(_))
        ));
        assert!(matches!(
            pointer.touch(1, TouchPhase::Cancelled, 20.0, 10.0, origin),
            Some(PointerEvent::Released(_))
        ));
        // A new finger may start once the first is gone
        assert!(pointer.touch(2, TouchPhase::Started, 5.0, 5.0, origin).is_some());
    }

    #[test]
    fn test_cursor_left_clears_position() {
        let origin = Instant::now();
        let mut pointer = PointerNormalizer::new(1.0, origin);
        pointer.cursor_moved(1.0, 1.0, origin);
        assert_eq!(pointer.cursor_left(), Some(PointerEvent::Left));
        assert_eq!(pointer.mouse_button(MouseButton::Left, ElementState::Pressed, origin), None);
    }
}
