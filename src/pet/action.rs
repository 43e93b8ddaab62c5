// The pet's active action: which animation plays, which way it faces, and
// how long it has been playing

use serde::{Deserialize, Serialize};

/// Idle animation, the fallback for every recovery path
pub const RELAX: &str = "Relax";
/// One-shot reaction to a click
pub const INTERACT: &str = "Interact";
/// Locomotion: the pet walks along the floor
pub const MOVE: &str = "Move";
pub const SIT: &str = "Sit";
pub const SLEEP: &str = "Sleep";
pub const SPECIAL: &str = "Special";

/// Direction the character faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    /// The opposite direction
    pub fn flipped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Unit sign along the x axis (right = +1)
    pub fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    /// Sprites are authored facing right
    pub fn flip_horizontal(self) -> bool {
        self == Self::Left
    }
}

/// Currently playing animation and its local clock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub animation: String,
    pub facing: Facing,
    /// Seconds since this action started
    pub elapsed: f32,
}

impl Action {
    /// Start `animation` from the beginning
    pub fn new(animation: &str, facing: Facing) -> Self {
        Self {
            animation: animation.to_string(),
            facing,
            elapsed: 0.0,
        }
    }

    /// Idle action keeping the given facing
    pub fn idle(facing: Facing) -> Self {
        Self::new(RELAX, facing)
    }

    pub fn is(&self, animation: &str) -> bool {
        self.animation == animation
    }

    pub fn is_locomotion(&self) -> bool {
        self.is(MOVE)
    }

    /// Whether the engine should loop this animation
    ///
    /// Reactions play once; everything else loops until the behavior model
    /// moves on at a loop boundary.
    pub fn looping(&self) -> bool {
        !matches!(self.animation.as_str(), INTERACT | SPECIAL)
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::idle(Facing::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_action_is_idle() {
        let action = Action::default();
        assert_eq!(action.animation, RELAX);
        assert_eq!(action.facing, Facing::Right);
        assert_eq!(action.elapsed, 0.0);
        assert!(action.looping());
    }

    #[test]
    fn test_facing_helpers() {
        assert_eq!(Facing::Left.flipped(), Facing::Right);
        assert_eq!(Facing::Right.flipped(), Facing::Left);
        assert_eq!(Facing::Left.sign(), -1.0);
        assert!(Facing::Left.flip_horizontal());
        assert!(!Facing::Right.flip_horizontal());
    }

    #[test]
    fn test_reactions_play_once() {
        assert!(!Action::new(INTERACT, Facing::Left).looping());
        assert!(!Action::new(SPECIAL, Facing::Left).looping());
        assert!(Action::new(MOVE, Facing::Left).looping());
        assert!(Action::new(SLEEP, Facing::Left).is(SLEEP));
    }
}
