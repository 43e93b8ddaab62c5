// The desktop pet
//
// - Actions and facing
// - Capability resolution from a character's animations
// - Probabilistic behavior model
// - Clip-based animation engine
// - Tuning, session snapshots and the per-frame orchestrator

pub mod action;
pub mod animation;
pub mod behavior;
pub mod capability;
pub mod character;
pub mod session;
pub mod tuning;

pub use action::{Action, Facing};
pub use behavior::{BehaviorError, BehaviorModel};
pub use capability::CapabilitySet;
pub use character::{FrameOutcome, Pet, PetOptions};
pub use tuning::PetTuning;

use crate::engine::assets::AssetError;
use crate::engine::renderer::RenderError;

/// Errors surfaced by [`Pet`]
#[derive(Debug, thiserror::Error)]
pub enum PetError {
    #[error("Asset load failed: {0}")]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
