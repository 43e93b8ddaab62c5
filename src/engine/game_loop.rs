/// Frame timing for the pet's loop
///
/// The host schedules one iteration per display frame; each iteration asks the
/// clock for the wall-clock delta since the previous one. Animation, behavior
/// and locomotion consume that delta directly. Physics runs on a fixed
/// timestep fed from the same delta, so the integrator's velocity snap sees
/// steps of the same size at any display rate.
use std::time::{Duration, Instant};

/// Physics update rate (120 steps per second)
pub const PHYSICS_TIMESTEP: f32 = 1.0 / 120.0;

/// Maximum number of physics steps per frame to prevent spiral of death
const MAX_PHYSICS_STEPS: u32 = 32;

/// Frame delta cap used when the configured one is unusable
const FALLBACK_MAX_DELTA: Duration = Duration::from_millis(250);

/// FPS tracking window (average over last N frames)
const FPS_WINDOW_SIZE: usize = 60;

/// Frame clock state
#[derive(Debug)]
pub struct FrameClock {
    /// Time of last frame, `None` until the first frame begins
    last_frame_time: Option<Instant>,

    /// Largest delta handed out for a single frame
    max_delta: Duration,

    /// Frame timing history for FPS calculation
    frame_times: Vec<Duration>,

    /// Current frame number
    frame_count: u64,

    /// Current FPS (updated periodically)
    current_fps: f32,
}

impl FrameClock {
    /// Create a new clock that caps single-frame deltas at `max_delta_secs`
    pub fn new(max_delta_secs: f32) -> Self {
        Self {
            last_frame_time: None,
            max_delta: Duration::try_from_secs_f32(max_delta_secs.max(0.0)).unwrap_or(FALLBACK_MAX_DELTA),
            frame_times: Vec::with_capacity(FPS_WINDOW_SIZE),
            frame_count: 0,
            current_fps: 0.0,
        }
    }

    /// Begin a new frame at `now`, returning the delta time in seconds
    ///
    /// The first frame yields zero. A clock that goes backwards yields zero.
    pub fn begin_frame(&mut self, now: Instant) -> f32 {
        let frame_time = match self.last_frame_time {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::ZERO,
        };
        self.last_frame_time = Some(now);
        self.frame_count += 1;

        self.frame_times.push(frame_time);
        if self.frame_times.len() > FPS_WINDOW_SIZE {
            self.frame_times.remove(0);
        }

        if self.frame_count % 10 == 0 {
            self.update_fps();
        }

        frame_time.min(self.max_delta).as_secs_f32()
    }

    /// Forget the previous frame so the next delta is zero
    ///
    /// Used after a pause such as a model reload, so the pet doesn't jump.
    pub fn reset(&mut self) {
        self.last_frame_time = None;
    }

    /// Get current FPS
    pub fn fps(&self) -> f32 {
        self.current_fps
    }

    /// Get total number of frames begun
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn update_fps(&mut self) {
        if self.frame_times.is_empty() {
            self.current_fps = 0.0;
            return;
        }

        let total: Duration = self.frame_times.iter().sum();
        let avg_frame_time = total / self.frame_times.len() as u32;

        self.current_fps = if avg_frame_time.as_secs_f32() > 0.0 {
            1.0 / avg_frame_time.as_secs_f32()
        } else {
            0.0
        };
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(0.25)
    }
}

/// Fixed-timestep accumulator: turns variable frame deltas into whole steps
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: f32,
    accumulator: f32,
}

impl FixedStep {
    pub fn new(step_secs: f32) -> Self {
        let step = if step_secs.is_finite() && step_secs > 0.0 {
            step_secs
        } else {
            PHYSICS_TIMESTEP
        };
        Self { step, accumulator: 0.0 }
    }

    /// Seconds per step
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Accumulate `dt` seconds; returns how many steps are due
    pub fn advance(&mut self, dt: f32) -> u32 {
        if dt.is_finite() && dt > 0.0 {
            self.accumulator += dt;
        }

        let mut steps = 0;
        while self.accumulator >= self.step && steps < MAX_PHYSICS_STEPS {
            self.accumulator -= self.step;
            steps += 1;
        }

        // Drop the backlog instead of catching up over later frames
        if steps == MAX_PHYSICS_STEPS {
            self.accumulator = self.accumulator.min(self.step);
        }
        steps
    }

    /// Discard partial time, e.g. while the simulation is suspended
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(PHYSICS_TIMESTEP)
    }
}

/// Time-based throttle: fires at most once per interval
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: f32,
    accumulated: f32,
}

impl Throttle {
    pub fn new(interval_secs: f32) -> Self {
        Self {
            interval: interval_secs.max(0.0),
            accumulated: 0.0,
        }
    }

    /// Accumulate `dt` seconds; returns true when the interval has elapsed
    pub fn tick(&mut self, dt: f32) -> bool {
        self.accumulated += dt;
        if self.accumulated >= self.interval {
            self.accumulated = 0.0;
            true
        } else {
            false
        }
    }
}
