// Pet tuning - every constant the behavior layer reads, in one place
//
// Defaults live in `BASE_TUNING`. A JSON file can override any subset of
// fields; missing fields keep their default.

use crate::engine::physics::{PhysicsParams, DEFAULT_PHYSICS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PetTuning {
    // Physics
    pub physics: PhysicsParams,

    // Behavior
    /// Walking speed (px/s)
    pub move_speed: f32,
    /// Chance of turning around when idle gives way to walking
    pub turn_probability: f64,

    // Interaction
    /// Pointer travel (px) that turns a press into a drag instead of a click
    pub drag_threshold: f32,
    /// Frames between forced hit tests while the pointer is still
    pub hit_test_interval: u32,

    // Presentation
    /// Outline width (px) shown while hovering an interactive pet
    pub outline_width: f32,
    /// Outline colour (RGBA, 0.0 - 1.0)
    pub outline_color: [f32; 4],
    /// Opacity of a non-interactive pet while hovered
    pub hover_alpha: f32,

    // Timing
    /// Seconds between session snapshots
    pub persist_interval: f32,
    /// Largest frame delta (s) fed to the simulation
    pub max_frame_delta: f32,
}

pub const BASE_TUNING: PetTuning = PetTuning {
    physics: DEFAULT_PHYSICS,

    move_speed: 60.0,
    turn_probability: 0.4,

    drag_threshold: 4.0,
    hit_test_interval: 10,

    outline_width: 2.0,
    outline_color: [1.0, 1.0, 0.0, 1.0],
    hover_alpha: 0.5,

    persist_interval: 1.0,
    max_frame_delta: 0.25,
};

/// Longest single frame the simulation will accept (s)
const MAX_FRAME_DELTA_LIMIT: f32 = 1.0;

impl Default for PetTuning {
    fn default() -> Self {
        BASE_TUNING
    }
}

impl PetTuning {
    pub fn standard() -> Self {
        BASE_TUNING
    }

    /// Parse tuning overrides from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let tuning: Self = serde_json::from_str(json).context("Invalid tuning JSON")?;
        Ok(tuning.sanitized())
    }

    /// Pull timing values back into a usable range
    ///
    /// JSON numbers beyond f32 range parse as infinity.
    fn sanitized(mut self) -> Self {
        self.max_frame_delta = if self.max_frame_delta.is_finite() {
            self.max_frame_delta.clamp(0.0, MAX_FRAME_DELTA_LIMIT)
        } else {
            BASE_TUNING.max_frame_delta
        };
        if !self.persist_interval.is_finite() || self.persist_interval < 0.0 {
            self.persist_interval = BASE_TUNING.persist_interval;
        }
        self
    }

    /// Load tuning overrides from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tuning file {}", path.display()))?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning() {
        let tuning = PetTuning::default();
        assert_eq!(tuning.physics.min_velocity, 5.0);
        assert_eq!(tuning.physics.bounce_damping, 0.7);
        assert_eq!(tuning.turn_probability, 0.4);
        assert_eq!(tuning, PetTuning::standard());
    }

    #[test]
    fn test_partial_override() {
        let tuning = PetTuning::from_json(r#"{ "move_speed": 90.0, "physics": { "gravity": -500.0 } }"#).unwrap();
        assert_eq!(tuning.move_speed, 90.0);
        assert_eq!(tuning.physics.gravity, -500.0);
        assert_eq!(tuning.physics.drag, DEFAULT_PHYSICS.drag);
        assert_eq!(tuning.hit_test_interval, BASE_TUNING.hit_test_interval);
    }

    #[test]
    fn test_out_of_range_timing_is_sanitized() {
        let tuning = PetTuning::from_json(r#"{ "max_frame_delta": 1e39, "persist_interval": 1e39 }"#).unwrap();
        assert_eq!(tuning.max_frame_delta, BASE_TUNING.max_frame_delta);
        assert_eq!(tuning.persist_interval, BASE_TUNING.persist_interval);

        let tuning = PetTuning::from_json(r#"{ "max_frame_delta": 30.0 }"#).unwrap();
        assert_eq!(tuning.max_frame_delta, MAX_FRAME_DELTA_LIMIT);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(PetTuning::from_json("{ move_speed: ").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tuning.json");
        std::fs::write(&path, r#"{ "hover_alpha": 0.25 }"#).unwrap();

        let tuning = PetTuning::from_file(&path).unwrap();
        assert_eq!(tuning.hover_alpha, 0.25);
        assert!(PetTuning::from_file(dir.path().join("missing.json")).is_err());
    }
}
