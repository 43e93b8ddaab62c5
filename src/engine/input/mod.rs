// Input handling system
//
// Pointer input for the pet: mouse and touch events from the window are
// normalised into one event shape, then the interaction controller turns
// them into drags, throws and clicks.
//
// ## Architecture
//
// - `pointer`: winit mouse/touch events -> `PointerEvent` (logical px, y-down)
// - `interaction`: `PointerEvent` -> drag state, throw velocity, click reactions
//
// ## Usage Example
//
// ```rust
// use engine::input::{InteractionController, PointerNormalizer};
//
// let mut pointer = PointerNormalizer::new(window.scale_factor(), Instant::now());
//
// // In your event loop, normalise window events and hand them to the pet
// if let Some(event) = pointer.process_window_event(&window_event, Instant::now()) {
//     pet.handle_pointer(event);
// }
// ```

pub mod interaction;
pub mod pointer;

// Re-export commonly used types
pub use interaction::{InteractionController, InteractionOutcome, InteractionState};
pub use pointer::{PointerEvent, PointerNormalizer, PointerSample};
