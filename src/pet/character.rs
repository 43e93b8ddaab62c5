// The pet: owns every piece of per-character state and runs one frame at a time
//
// Frame order: clock -> asset poll -> fixed-step physics (unless held) -> locomotion ->
// animation + behavior -> draw -> hit test -> throttled persistence.
// Pointer events arrive between frames and write straight into the same state.

use super::action::{Action, Facing, INTERACT, RELAX};
use super::animation::{AnimationClip, ClipEngine, SkeletalEngine, BASE_TRACK};
use super::behavior::BehaviorModel;
use super::capability::CapabilitySet;
use super::session::{SessionSnapshot, SESSION_KEY};
use super::tuning::PetTuning;
use super::PetError;
use crate::engine::assets::{AssetProvider, CharacterModel, LoadStatus, ModelDescriptor};
use crate::engine::game_loop::{FixedStep, FrameClock, Throttle, PHYSICS_TIMESTEP};
use crate::engine::input::{InteractionController, InteractionOutcome, InteractionState, PointerEvent};
use crate::engine::persistence::SessionStore;
use crate::engine::physics::{self, Bounds, PhysicsState};
use crate::engine::renderer::{hit_test, CompositeUniforms, FrameDraw, HitTester, Renderer, SpriteFrame};
use glam::Vec2;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::sync::Arc;
use std::time::Instant;

/// Construction options
#[derive(Debug, Clone)]
pub struct PetOptions {
    pub tuning: PetTuning,
    /// Passive pets ignore clicks and drags but still react to hover
    pub interactive: bool,
    /// Fixed seed for reproducible behavior
    pub seed: Option<u64>,
}

impl Default for PetOptions {
    fn default() -> Self {
        Self {
            tuning: PetTuning::standard(),
            interactive: true,
            seed: None,
        }
    }
}

/// What a frame did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// The pet was destroyed; stop scheduling frames
    Stopped,
    /// A model load is in flight; behavior is paused
    Loading { fraction: f32 },
    /// No model loaded and none loading
    Unloaded,
    Advanced,
}

pub struct Pet {
    tuning: PetTuning,

    // Character state
    body: PhysicsState,
    action: Action,
    capabilities: CapabilitySet,
    /// Size of one sprite frame in logical pixels
    frame_size: Vec2,
    /// Position is unresolved until the first model loads
    placed: bool,

    behavior: BehaviorModel,
    interaction: InteractionController,
    hit_tester: HitTester,
    clock: FrameClock,
    physics_clock: FixedStep,
    persist_throttle: Throttle,
    rng: Box<dyn RngCore>,

    // Collaborators
    renderer: Box<dyn Renderer>,
    assets: Box<dyn AssetProvider>,
    store: Box<dyn SessionStore>,
    engine: Option<Box<dyn SkeletalEngine>>,

    model: Option<ModelDescriptor>,
    pending: Option<ModelDescriptor>,
    stopped: bool,
}

impl Pet {
    pub fn new(
        options: PetOptions,
        renderer: Box<dyn Renderer>,
        assets: Box<dyn AssetProvider>,
        store: Box<dyn SessionStore>,
    ) -> Self {
        let tuning = options.tuning;
        let rng: Box<dyn RngCore> = match options.seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(StdRng::from_entropy()),
        };

        Self {
            body: PhysicsState::default(),
            action: Action::default(),
            capabilities: CapabilitySet::default(),
            frame_size: Vec2::ZERO,
            placed: false,
            behavior: BehaviorModel::new(Default::default(), tuning.turn_probability),
            interaction: InteractionController::new(options.interactive, tuning.drag_threshold),
            hit_tester: HitTester::new(tuning.hit_test_interval),
            clock: FrameClock::new(tuning.max_frame_delta),
            physics_clock: FixedStep::new(PHYSICS_TIMESTEP),
            persist_throttle: Throttle::new(tuning.persist_interval),
            rng,
            renderer,
            assets,
            store,
            engine: None,
            model: None,
            pending: None,
            stopped: false,
            tuning,
        }
    }

    /// Replace the random source behind behavior sampling and placement
    pub fn with_rng(mut self, rng: impl RngCore + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn body(&self) -> PhysicsState {
        self.body
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn interaction(&self) -> &InteractionState {
        self.interaction.state()
    }

    pub fn model(&self) -> Option<&ModelDescriptor> {
        self.model.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.is_some()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn fps(&self) -> f32 {
        self.clock.fps()
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    /// Whether the host should deliver pointer events to this pet
    pub fn accepts_pointer(&self) -> bool {
        !self.stopped && self.interaction.accepts_pointer()
    }

    /// Start loading a character; behavior pauses until it is ready
    pub fn load_model(&mut self, descriptor: ModelDescriptor) {
        if self.stopped {
            return;
        }
        self.assets.begin_load(&descriptor);
        self.pending = Some(descriptor);
    }

    /// Resize the drawing surface (logical pixels)
    pub fn resize(&mut self, surface: Vec2, pixel_ratio: f32) -> Result<(), PetError> {
        self.renderer.resize(surface, pixel_ratio)?;
        self.hit_tester.invalidate();
        debug!("Pet surface {:?} at {}x", surface, pixel_ratio);
        Ok(())
    }

    /// Apply one pointer event immediately
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<InteractionOutcome> {
        if self.stopped {
            return None;
        }

        // A press may land where the pointer never hovered (touch), so the
        // gate uses the pixel under the press, not the last frame's result
        if let PointerEvent::Pressed(sample) = event {
            let over = hit_test(sample.position, self.renderer.as_ref());
            self.interaction.set_pointer_over(over);
            self.hit_tester.invalidate();
        }

        let surface_height = self.renderer.surface_size().y;
        let outcome = self.interaction.handle(event, surface_height, &mut self.body);

        match outcome {
            Some(InteractionOutcome::DragStarted) => {
                // Whatever the pet was doing is interrupted while it is held
                self.action = Action::idle(self.action.facing);
                self.play_action();
            }
            Some(InteractionOutcome::Clicked) => {
                self.action = Action::new(INTERACT, self.action.facing);
                self.play_action();
            }
            _ => {}
        }
        outcome
    }

    /// Run one frame at wall-clock time `now`
    pub fn frame(&mut self, now: Instant) -> Result<FrameOutcome, PetError> {
        if self.stopped {
            return Ok(FrameOutcome::Stopped);
        }

        let dt = self.clock.begin_frame(now);

        match self.assets.poll() {
            LoadStatus::Idle => {}
            LoadStatus::Loading { fraction } => {
                debug!("Loading {:.0}%", fraction * 100.0);
                // Keep showing whatever was loaded before
                self.render();
                return Ok(FrameOutcome::Loading { fraction });
            }
            LoadStatus::Ready(model) => self.install(*model),
            LoadStatus::Failed(err) => {
                let descriptor = self.pending.take();
                error!(
                    "Failed to load {}: {}",
                    descriptor.map_or_else(|| "character".to_string(), |d| d.to_string()),
                    err
                );
                return Err(err.into());
            }
        }

        if self.engine.is_none() {
            return Ok(FrameOutcome::Unloaded);
        }

        self.advance(dt);
        self.render();

        if self.persist_throttle.tick(dt) {
            self.persist();
        }

        Ok(FrameOutcome::Advanced)
    }

    /// Stop frames, detach input, save, then release rendering resources
    pub fn destroy(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.interaction.detach();
        self.persist();
        self.engine = None;
        self.renderer.release();
        info!("Pet destroyed");
    }

    fn advance(&mut self, dt: f32) {
        self.action.elapsed += dt;
        let held = self.interaction.is_dragging();
        let bounds = self.bounds();

        if held {
            self.physics_clock.reset();
        } else {
            let step = self.physics_clock.step();
            for _ in 0..self.physics_clock.advance(dt) {
                self.body = physics::step(self.body, step, bounds, &self.tuning.physics);
            }
            if self.action.is_locomotion() {
                self.walk(dt, bounds);
            }
        }

        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let completions = engine.advance(dt);

        // A held pet keeps looping its idle animation
        if held {
            return;
        }
        if completions.iter().any(|c| c.track == BASE_TRACK) {
            let next = self
                .behavior
                .next_action_or_idle(&self.action, self.capabilities, &mut *self.rng);
            self.action = next;
            self.play_action();
        }
    }

    /// Locomotion moves at constant speed and turns at the side edges
    fn walk(&mut self, dt: f32, bounds: Bounds) {
        let facing = self.action.facing;
        let mut x = self.body.position.x + self.tuning.move_speed * facing.sign() * dt;

        if x <= 0.0 {
            x = 0.0;
            if facing == Facing::Left {
                self.action.facing = Facing::Right;
            }
        } else if x >= bounds.width {
            x = bounds.width;
            if facing == Facing::Right {
                self.action.facing = Facing::Left;
            }
        }
        self.body.position.x = x;
    }

    /// Tell the engine to play the current action from its start
    fn play_action(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if engine.set_animation(BASE_TRACK, &self.action.animation, self.action.looping()) {
            return;
        }

        warn!("Character has no '{}' animation, idling", self.action.animation);
        self.action = Action::idle(self.action.facing);
        engine.set_animation(BASE_TRACK, RELAX, true);
    }

    fn render(&mut self) {
        let frame = self
            .engine
            .as_mut()
            .and_then(|engine| engine.apply_pose())
            .map(|pose| SpriteFrame {
                row: pose.row,
                frame_index: pose.frame_index,
            });

        self.renderer.draw(&FrameDraw {
            position: self.body.position,
            frame,
            flip_horizontal: self.action.facing.flip_horizontal(),
            uniforms: self.composite_uniforms(),
        });

        let over = self
            .hit_tester
            .update(self.interaction.pointer_position(), self.renderer.as_ref());
        self.interaction.set_pointer_over(over);
    }

    /// Hover cues: outline for an interactive pet, transparency for a passive one
    fn composite_uniforms(&self) -> CompositeUniforms {
        let state = self.interaction.state();
        if self.interaction.is_interactive() {
            if state.pointer_over || state.is_dragging {
                CompositeUniforms::new(self.tuning.outline_color, self.tuning.outline_width, 1.0)
            } else {
                CompositeUniforms::plain()
            }
        } else if state.pointer_over {
            CompositeUniforms::new(self.tuning.outline_color, 0.0, self.tuning.hover_alpha)
        } else {
            CompositeUniforms::plain()
        }
    }

    /// Area the pet's bottom-left corner may occupy
    fn bounds(&self) -> Bounds {
        let surface = self.renderer.surface_size();
        Bounds::new(surface.x - self.frame_size.x, surface.y - self.frame_size.y)
    }

    fn install(&mut self, model: CharacterModel) {
        let engine = ClipEngine::new(
            model
                .animations
                .iter()
                .map(|a| AnimationClip::new(&a.name, a.frames, a.fps, a.row)),
        );
        self.capabilities = CapabilitySet::resolve(|name| engine.find_animation(name));

        let (frame_w, frame_h) = model.sheet.frame_size();
        self.frame_size = Vec2::new(frame_w as f32, frame_h as f32);
        self.renderer.bind_character(Arc::clone(&model.sheet));
        self.engine = Some(Box::new(engine));

        if !self.placed {
            self.place(&model.descriptor);
        }

        let repertoire = self.behavior.repertoire(self.capabilities);
        if !repertoire.contains(&self.action.animation) {
            warn!(
                "'{}' is not in this character's repertoire, idling",
                self.action.animation
            );
            self.action = Action::new(repertoire.idle(), self.action.facing);
        }
        self.play_action();

        info!(
            "Character '{}' ready ({:?}, {} animations)",
            model.name,
            self.capabilities,
            model.animations.len()
        );
        self.hit_tester.invalidate();
        self.clock.reset();
        self.physics_clock.reset();
        self.pending = None;
        self.model = Some(model.descriptor);
    }

    /// Resolve the initial position: the saved session if it matches, else a random spot on the floor
    fn place(&mut self, descriptor: &ModelDescriptor) {
        let bounds = self.bounds();

        match self.restore(descriptor) {
            Some(snapshot) => {
                let position = snapshot.position();
                let x = position.x.clamp(0.0, bounds.width);
                let y = position.y.clamp(0.0, bounds.height);
                self.body = PhysicsState::at_rest(Vec2::new(x, y));
                self.action = snapshot.action;
                info!("Restored session at ({:.0}, {:.0}) doing {}", x, y, self.action.animation);
            }
            None => {
                let x = self.rng.gen::<f32>() * bounds.width;
                self.body = PhysicsState::at_rest(Vec2::new(x, 0.0));
            }
        }
        self.placed = true;
    }

    fn restore(&self, descriptor: &ModelDescriptor) -> Option<SessionSnapshot> {
        let blob = match self.store.load(SESSION_KEY) {
            Ok(blob) => blob?,
            Err(e) => {
                warn!("Failed to read session: {}", e);
                return None;
            }
        };
        SessionSnapshot::decode(&blob).filter(|snapshot| &snapshot.model == descriptor)
    }

    fn persist(&mut self) {
        let Some(model) = &self.model else {
            return;
        };
        let snapshot = SessionSnapshot::new(self.body.position, self.action.clone(), model.clone());
        if let Err(e) = self.store.save(SESSION_KEY, &snapshot.encode()) {
            warn!("Failed to save session: {}", e);
        }
    }
}
