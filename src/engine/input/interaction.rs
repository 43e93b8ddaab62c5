// Interaction controller - turns pointer input into drags, throws and clicks
//
// The controller never owns the body it moves. It is handed mutable access for
// the duration of each event and writes straight through, so the next frame
// sees whatever the latest event left behind. What the character does in
// response (idle while held, react to a click) is up to the caller, driven by
// the returned `InteractionOutcome`.

use super::pointer::{PointerEvent, PointerSample};
use crate::engine::physics::PhysicsState;
use glam::Vec2;
use log::debug;

/// Snapshot of the controller's view of the pointer
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InteractionState {
    pub is_dragging: bool,
    /// Pointer minus body position at the moment the drag began (physics space)
    pub drag_anchor: Vec2,
    pub last_pointer: Option<PointerSample>,
    /// Result of the latest hit test
    pub pointer_over: bool,
}

/// What an event did to the pet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionOutcome {
    DragStarted,
    Dragged,
    DragEnded,
    Clicked,
}

#[derive(Debug)]
pub struct InteractionController {
    interactive: bool,
    attached: bool,
    drag_threshold: f32,
    state: InteractionState,
    /// Where the current press went down (physics space)
    press_origin: Vec2,
    /// Set once the pointer has travelled past `drag_threshold` since the press
    crossed_threshold: bool,
}

impl InteractionController {
    pub fn new(interactive: bool, drag_threshold: f32) -> Self {
        Self {
            interactive,
            attached: true,
            drag_threshold: drag_threshold.max(0.0),
            state: InteractionState::default(),
            press_origin: Vec2::ZERO,
            crossed_threshold: false,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn is_dragging(&self) -> bool {
        self.state.is_dragging
    }

    pub fn pointer_over(&self) -> bool {
        self.state.pointer_over
    }

    /// Record the latest hit-test result
    pub fn set_pointer_over(&mut self, over: bool) {
        self.state.pointer_over = over;
    }

    /// Last known pointer position in surface coordinates
    pub fn pointer_position(&self) -> Option<Vec2> {
        self.state.last_pointer.map(|sample| sample.position)
    }

    /// Whether the host should route pointer input to the pet
    pub fn accepts_pointer(&self) -> bool {
        self.attached && self.interactive && (self.state.pointer_over || self.state.is_dragging)
    }

    /// Stop reacting to input; any drag in progress is abandoned
    pub fn detach(&mut self) {
        self.attached = false;
        self.state = InteractionState::default();
    }

    /// Apply one pointer event
    ///
    /// `surface_height` converts the y-down pointer into y-up physics space.
    pub fn handle(
        &mut self,
        event: PointerEvent,
        surface_height: f32,
        body: &mut PhysicsState,
    ) -> Option<InteractionOutcome> {
        if !self.attached {
            return None;
        }

        if !self.interactive {
            // Hover tracking still feeds the hit tester
            self.track_pointer(event);
            return None;
        }

        let outcome = match event {
            PointerEvent::Pressed(sample) => self.press(sample, surface_height, body),
            PointerEvent::Moved(sample) => self.drag_to(sample, surface_height, body),
            PointerEvent::Released(_) => self.release(),
            PointerEvent::Left => None,
        };
        self.track_pointer(event);
        outcome
    }

    fn track_pointer(&mut self, event: PointerEvent) {
        match event.sample() {
            Some(sample) => self.state.last_pointer = Some(sample),
            None if !self.state.is_dragging => self.state.last_pointer = None,
            None => {}
        }
    }

    fn press(
        &mut self,
        sample: PointerSample,
        surface_height: f32,
        body: &mut PhysicsState,
    ) -> Option<InteractionOutcome> {
        if self.state.is_dragging || !self.state.pointer_over {
            return None;
        }

        let pointer = to_physics_space(sample.position, surface_height);
        self.state.is_dragging = true;
        self.state.drag_anchor = pointer - body.position;
        self.press_origin = pointer;
        self.crossed_threshold = false;

        // A caught body stops
        body.velocity = Vec2::ZERO;

        debug!("Drag started at {:?}", pointer);
        Some(InteractionOutcome::DragStarted)
    }

    fn drag_to(
        &mut self,
        sample: PointerSample,
        surface_height: f32,
        body: &mut PhysicsState,
    ) -> Option<InteractionOutcome> {
        if !self.state.is_dragging {
            return None;
        }

        let pointer = to_physics_space(sample.position, surface_height);
        let position = pointer - self.state.drag_anchor;

        if let Some(previous) = self.state.last_pointer {
            let gap = sample.timestamp - previous.timestamp;
            if gap > 0.0 {
                body.velocity = (position - body.position) / gap as f32;
            }
        }
        body.position = position;

        if pointer.distance(self.press_origin) > self.drag_threshold {
            self.crossed_threshold = true;
        }

        Some(InteractionOutcome::Dragged)
    }

    fn release(&mut self) -> Option<InteractionOutcome> {
        if !self.state.is_dragging {
            return None;
        }
        self.state.is_dragging = false;

        if self.crossed_threshold {
            // The last drag velocity carries into physics as a throw
            debug!("Drag ended");
            Some(InteractionOutcome::DragEnded)
        } else {
            debug!("Clicked");
            Some(InteractionOutcome::Clicked)
        }
    }
}

/// Surface coordinates (y-down) to physics space (y-up, floor at 0)
pub fn to_physics_space(surface: Vec2, surface_height: f32) -> Vec2 {
    Vec2::new(surface.x, surface_height - surface.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const HEIGHT: f32 = 600.0;

    fn pressed(x: f32, y: f32, t: f64) -> PointerEvent {
        PointerEvent::Pressed(PointerSample::new(x, y, t))
    }

    fn moved(x: f32, y: f32, t: f64) -> PointerEvent {
        PointerEvent::Moved(PointerSample::new(x, y, t))
    }

    fn released(x: f32, y: f32, t: f64) -> PointerEvent {
        PointerEvent::Released(PointerSample::new(x, y, t))
    }

    fn setup() -> (InteractionController, PhysicsState) {
        let mut controller = InteractionController::new(true, 4.0);
        controller.set_pointer_over(true);
        let body = PhysicsState::new(Vec2::new(100.0, 0.0), Vec2::new(-40.0, 0.0));
        (controller, body)
    }

    #[test]
    fn test_to_physics_space() {
        assert_eq!(to_physics_space(Vec2::new(100.0, 500.0), HEIGHT), Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_press_requires_pointer_over() {
        let (mut controller, mut body) = setup();
        controller.set_pointer_over(false);

        let outcome = controller.handle(pressed(110.0, 590.0, 0.0), HEIGHT, &mut body);
        assert_eq!(outcome, None);
        assert!(!controller.is_dragging());
        assert_eq!(body.velocity, Vec2::new(-40.0, 0.0));
    }

    #[test]
    fn test_press_catches_body() {
        let (mut controller, mut body) = setup();

        let outcome = controller.handle(pressed(110.0, 590.0, 0.0), HEIGHT, &mut body);
        assert_eq!(outcome, Some(InteractionOutcome::DragStarted));
        assert!(controller.is_dragging());
        assert_eq!(controller.state().drag_anchor, Vec2::new(10.0, 10.0));
        assert_eq!(body.velocity, Vec2::ZERO);

        // A second press while held changes nothing
        assert_eq!(controller.handle(pressed(120.0, 580.0, 0.1), HEIGHT, &mut body), None);
    }

    #[test]
    fn test_drag_tracks_pointer_and_velocity() {
        let (mut controller, mut body) = setup();
        controller.handle(pressed(110.0, 590.0, 1.0), HEIGHT, &mut body);

        controller.handle(moved(130.0, 570.0, 1.1), HEIGHT, &mut body);
        assert_eq!(body.position, Vec2::new(120.0, 20.0));
        assert_abs_diff_eq!(body.velocity.x, 200.0, epsilon = 1e-2);
        assert_abs_diff_eq!(body.velocity.y, 200.0, epsilon = 1e-2);

        // Same timestamp: position follows, velocity is left alone
        controller.handle(moved(140.0, 570.0, 1.1), HEIGHT, &mut body);
        assert_eq!(body.position, Vec2::new(130.0, 20.0));
        assert_abs_diff_eq!(body.velocity.x, 200.0, epsilon = 1e-2);
    }

    #[test]
    fn test_release_after_drag_keeps_throw_velocity() {
        let (mut controller, mut body) = setup();
        controller.handle(pressed(110.0, 590.0, 0.0), HEIGHT, &mut body);
        controller.handle(moved(160.0, 590.0, 0.1), HEIGHT, &mut body);

        let outcome = controller.handle(released(160.0, 590.0, 0.15), HEIGHT, &mut body);
        assert_eq!(outcome, Some(InteractionOutcome::DragEnded));
        assert!(!controller.is_dragging());
        assert_abs_diff_eq!(body.velocity.x, 500.0, epsilon = 1e-2);
    }

    #[test]
    fn test_small_motion_is_a_click() {
        let (mut controller, mut body) = setup();
        controller.handle(pressed(110.0, 590.0, 0.0), HEIGHT, &mut body);
        controller.handle(moved(112.0, 589.0, 0.05), HEIGHT, &mut body);

        let outcome = controller.handle(released(112.0, 589.0, 0.1), HEIGHT, &mut body);
        assert_eq!(outcome, Some(InteractionOutcome::Clicked));
        assert!(!controller.is_dragging());
    }

    #[test]
    fn test_moves_without_drag_only_track_pointer() {
        let (mut controller, mut body) = setup();
        let before = body;

        let outcome = controller.handle(moved(300.0, 300.0, 0.0), HEIGHT, &mut body);
        assert_eq!(outcome, None);
        assert_eq!(body, before);
        assert_eq!(controller.pointer_position(), Some(Vec2::new(300.0, 300.0)));

        controller.handle(PointerEvent::Left, HEIGHT, &mut body);
        assert_eq!(controller.pointer_position(), None);
    }

    #[test]
    fn test_passive_mode_never_changes_state() {
        let mut controller = InteractionController::new(false, 4.0);
        controller.set_pointer_over(true);
        let mut body = PhysicsState::at_rest(Vec2::new(100.0, 0.0));

        for event in [pressed(110.0, 590.0, 0.0), moved(200.0, 500.0, 0.1), released(200.0, 500.0, 0.2)] {
            assert_eq!(controller.handle(event, HEIGHT, &mut body), None);
        }
        assert!(!controller.is_dragging());
        assert_eq!(body.position, Vec2::new(100.0, 0.0));
        assert_eq!(controller.pointer_position(), Some(Vec2::new(200.0, 500.0)));
        assert!(!controller.accepts_pointer());
    }

    #[test]
    fn test_detached_controller_ignores_input() {
        let (mut controller, mut body) = setup();
        assert!(controller.accepts_pointer());

        controller.detach();
        assert!(!controller.accepts_pointer());
        assert_eq!(controller.handle(pressed(110.0, 590.0, 0.0), HEIGHT, &mut body), None);
        assert!(!controller.is_dragging());
    }
}
