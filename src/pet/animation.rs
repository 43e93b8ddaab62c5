// Character animation engine
//
// The pet drives its animation engine through the `SkeletalEngine` contract:
// start an animation on a track, advance time, collect completion events, and
// apply the resulting pose for the renderer. `ClipEngine` implements it over
// sprite-sheet clips.

use log::warn;
use std::collections::HashMap;

/// Track the behavior layer plays on
pub const BASE_TRACK: usize = 0;

/// A single animation clip laid out on one sprite-sheet row
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    /// Name of the animation (e.g., "Relax", "Move", "Sleep")
    pub name: String,
    /// Number of frames in the animation
    pub frame_count: usize,
    /// Duration of each frame in seconds
    pub frame_duration: f32,
    /// Sprite-sheet row holding the frames
    pub row: u32,
}

impl AnimationClip {
    /// Create a new animation clip
    pub fn new(name: &str, frame_count: usize, fps: f32, row: u32) -> Self {
        Self {
            name: name.to_string(),
            frame_count: frame_count.max(1),
            frame_duration: 1.0 / fps.max(0.001),
            row,
        }
    }
}

/// Emitted when a track reaches the end of its animation
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub track: usize,
    pub animation: String,
    /// True when the animation wrapped around and keeps playing
    pub looped: bool,
}

/// Data needed to render the current animation frame
#[derive(Debug, Clone, PartialEq)]
pub struct PoseFrame {
    pub animation: String,
    pub row: u32,
    pub frame_index: usize,
}

/// Contract between the pet and whatever animates its character
pub trait SkeletalEngine {
    /// Start `name` on `track` from its first frame. Returns false when the
    /// animation doesn't exist; the track is left untouched in that case.
    fn set_animation(&mut self, track: usize, name: &str, looping: bool) -> bool;

    /// Advance every track by `dt` seconds, reporting completions in order
    fn advance(&mut self, dt: f32) -> Vec<Completion>;

    /// Resolve the current pose for rendering
    fn apply_pose(&mut self) -> Option<PoseFrame>;

    fn find_animation(&self, name: &str) -> bool;
}

#[derive(Debug, Clone)]
struct TrackState {
    clip: String,
    frame: usize,
    timer: f32,
    looping: bool,
    finished: bool,
}

/// Sprite-sheet clip player with independent tracks
#[derive(Debug)]
pub struct ClipEngine {
    /// All available animations
    clips: HashMap<String, AnimationClip>,
    /// Per-track playback; higher tracks draw over lower ones
    tracks: Vec<Option<TrackState>>,
}

impl ClipEngine {
    pub fn new(clips: impl IntoIterator<Item = AnimationClip>) -> Self {
        Self {
            clips: clips.into_iter().map(|clip| (clip.name.clone(), clip)).collect(),
            tracks: Vec::new(),
        }
    }
}

impl SkeletalEngine for ClipEngine {
    fn set_animation(&mut self, track: usize, name: &str, looping: bool) -> bool {
        if !self.clips.contains_key(name) {
            warn!("Animation '{}' not found, track {} unchanged", name, track);
            return false;
        }

        if self.tracks.len() <= track {
            self.tracks.resize(track + 1, None);
        }
        self.tracks[track] = Some(TrackState {
            clip: name.to_string(),
            frame: 0,
            timer: 0.0,
            looping,
            finished: false,
        });
        true
    }

    fn advance(&mut self, dt: f32) -> Vec<Completion> {
        let mut completions = Vec::new();

        for (index, slot) in self.tracks.iter_mut().enumerate() {
            let Some(state) = slot else {
                continue;
            };
            if state.finished {
                continue;
            }
            let Some(clip) = self.clips.get(&state.clip) else {
                continue;
            };

            state.timer += dt;

            while state.timer >= clip.frame_duration {
                state.timer -= clip.frame_duration;
                state.frame += 1;

                if state.frame >= clip.frame_count {
                    completions.push(Completion {
                        track: index,
                        animation: clip.name.clone(),
                        looped: state.looping,
                    });

                    if state.looping {
                        state.frame = 0;
                    } else {
                        // Stay on last frame
                        state.frame = clip.frame_count - 1;
                        state.finished = true;
                        state.timer = 0.0;
                        break;
                    }
                }
            }
        }

        completions
    }

    fn apply_pose(&mut self) -> Option<PoseFrame> {
        let state = self.tracks.iter().rev().find_map(Option::as_ref)?;
        let clip = self.clips.get(&state.clip)?;

        Some(PoseFrame {
            animation: clip.name.clone(),
            row: clip.row,
            frame_index: state.frame.min(clip.frame_count - 1),
        })
    }

    fn find_animation(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ClipEngine {
        ClipEngine::new([
            AnimationClip::new("Relax", 4, 10.0, 0),
            AnimationClip::new("Interact", 3, 10.0, 1),
            AnimationClip::new("Move", 6, 12.0, 2),
        ])
    }

    fn frame(engine: &mut ClipEngine) -> Option<usize> {
        engine.apply_pose().map(|pose| pose.frame_index)
    }

    #[test]
    fn test_animation_clip_creation() {
        let clip = AnimationClip::new("Relax", 4, 8.0, 0);
        assert_eq!(clip.name, "Relax");
        assert_eq!(clip.frame_count, 4);
        assert_eq!(clip.frame_duration, 0.125); // 1/8
    }

    #[test]
    fn test_unknown_animation_rejected() {
        let mut engine = engine();
        assert!(!engine.set_animation(BASE_TRACK, "Sleep", true));
        assert_eq!(engine.apply_pose(), None);
        assert!(!engine.find_animation("Sleep"));
        assert!(engine.find_animation("Move"));
    }

    #[test]
    fn test_frames_advance() {
        let mut engine = engine();
        engine.set_animation(BASE_TRACK, "Relax", true);

        engine.advance(0.15); // 1.5 frames worth
        assert_eq!(frame(&mut engine), Some(1));

        engine.advance(0.1);
        assert_eq!(frame(&mut engine), Some(2));
    }

    #[test]
    fn test_loop_boundary_reports_completion() {
        let mut engine = engine();
        engine.set_animation(BASE_TRACK, "Relax", true);

        assert!(engine.advance(0.35).is_empty());
        let completions = engine.advance(0.1);
        assert_eq!(
            completions,
            vec![Completion {
                track: BASE_TRACK,
                animation: "Relax".to_string(),
                looped: true
            }]
        );
        assert_eq!(frame(&mut engine), Some(0));

        // Keeps looping
        assert_eq!(engine.advance(0.4).len(), 1);
    }

    #[test]
    fn test_one_shot_completes_once() {
        let mut engine = engine();
        engine.set_animation(BASE_TRACK, "Interact", false);

        let completions = engine.advance(0.5);
        assert_eq!(completions.len(), 1);
        assert!(!completions[0].looped);
        assert_eq!(frame(&mut engine), Some(2)); // Last frame

        assert!(engine.advance(1.0).is_empty());
        assert_eq!(frame(&mut engine), Some(2));
    }

    #[test]
    fn test_set_animation_restarts() {
        let mut engine = engine();
        engine.set_animation(BASE_TRACK, "Move", true);
        engine.advance(0.2);
        assert!(frame(&mut engine).unwrap() > 0);

        engine.set_animation(BASE_TRACK, "Move", true);
        assert_eq!(frame(&mut engine), Some(0));
    }

    #[test]
    fn test_pose_uses_top_track() {
        let mut engine = engine();
        assert_eq!(engine.apply_pose(), None);

        engine.set_animation(BASE_TRACK, "Relax", true);
        assert_eq!(engine.apply_pose().unwrap().animation, "Relax");

        engine.set_animation(1, "Interact", false);
        let pose = engine.apply_pose().unwrap();
        assert_eq!(pose.animation, "Interact");
        assert_eq!(pose.row, 1);
    }
}
