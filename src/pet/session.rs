// Session snapshot: where the pet was and what it was doing

use super::action::Action;
use crate::engine::assets::ModelDescriptor;
use glam::Vec2;
use log::warn;
use serde::{Deserialize, Serialize};

/// Storage key for the snapshot
pub const SESSION_KEY: &str = "pet-session";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub position: [f32; 2],
    pub action: Action,
    pub model: ModelDescriptor,
}

impl SessionSnapshot {
    pub fn new(position: Vec2, action: Action, model: ModelDescriptor) -> Self {
        Self {
            position: position.to_array(),
            action,
            model,
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::from_array(self.position)
    }

    pub fn encode(&self) -> Vec<u8> {
        // Plain data with string keys; serialisation can't fail
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Malformed data counts as no prior session
    pub fn decode(blob: &[u8]) -> Option<Self> {
        match serde_json::from_slice::<Self>(blob) {
            Ok(snapshot) if snapshot.position().is_finite() => Some(snapshot),
            Ok(_) => {
                warn!("Ignoring session snapshot with a non-finite position");
                None
            }
            Err(e) => {
                warn!("Ignoring malformed session snapshot: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pet::action::{Facing, MOVE};

    #[test]
    fn test_snapshot_roundtrip() {
        let mut action = Action::new(MOVE, Facing::Left);
        action.elapsed = 1.25;
        let snapshot = SessionSnapshot::new(Vec2::new(120.0, 0.0), action, ModelDescriptor::new("cat/pet.json"));

        let decoded = SessionSnapshot::decode(&snapshot.encode()).unwrap();
        assert_eq!(decoded, snapshot);
        assert_eq!(decoded.position(), Vec2::new(120.0, 0.0));
    }

    #[test]
    fn test_malformed_snapshot_is_absent() {
        assert_eq!(SessionSnapshot::decode(b""), None);
        assert_eq!(SessionSnapshot::decode(b"{\"position\": [1, 2]}"), None);
        assert_eq!(SessionSnapshot::decode(b"\xff\xfe"), None);
    }
}
