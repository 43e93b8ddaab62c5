use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use log::{error, info, LevelFilter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    dpi::LogicalSize,
    event::{Event, WindowEvent},
    event_loop::EventLoop,
    window::{CursorIcon, Window, WindowBuilder, WindowLevel},
};

mod core;
mod engine;
mod pet;

use engine::assets::{FileAssetProvider, ModelDescriptor};
use engine::input::PointerNormalizer;
use engine::persistence::{FileStore, MemoryStore, SessionStore};
use engine::renderer::{pixel_ratio_for, Presenter, SoftwareRenderer};
use pet::{FrameOutcome, Pet, PetOptions, PetTuning};

/// A draggable, physically simulated desktop pet
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Character manifest (JSON) to load
    #[arg(short, long)]
    model: PathBuf,

    /// Tuning overrides (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for session snapshots; without it nothing survives a restart
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Ignore clicks and drags; the pet only fades when hovered
    #[arg(long)]
    passive: bool,

    /// Seed for reproducible behavior
    #[arg(long)]
    seed: Option<u64>,

    /// Surface width in logical pixels
    #[arg(long, default_value_t = 800.0)]
    width: f64,

    /// Surface height in logical pixels
    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Initialise `env_logger`; `RUST_LOG` still wins over the default level
fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let env = env_logger::Env::default().default_filter_or(level.to_string());

    // Fails only when a logger is already installed
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn surface_size(window: &Window) -> Vec2 {
    let logical = window.inner_size().to_logical::<f32>(window.scale_factor());
    Vec2::new(logical.width, logical.height)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    info!("Starting desktop pet...");

    let tuning = match &args.config {
        Some(path) => PetTuning::from_file(path)?,
        None => PetTuning::standard(),
    };

    let store: Box<dyn SessionStore> = match &args.state_dir {
        Some(dir) => Box::new(
            FileStore::new(dir).with_context(|| format!("Cannot use state directory {}", dir.display()))?,
        ),
        None => Box::new(MemoryStore::new()),
    };

    // Create event loop and window
    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Desktop Pet")
            .with_inner_size(LogicalSize::new(args.width, args.height))
            .with_transparent(true)
            .with_decorations(false)
            .with_window_level(WindowLevel::AlwaysOnTop)
            .build(&event_loop)?,
    );

    info!("Window created successfully");

    let mut presenter = pollster::block_on(Presenter::new(Arc::clone(&window)))?;

    let renderer = SoftwareRenderer::new(surface_size(&window), pixel_ratio_for(window.scale_factor()))?;
    let mut pet = Pet::new(
        PetOptions {
            tuning,
            interactive: !args.passive,
            seed: args.seed,
        },
        Box::new(renderer),
        Box::new(FileAssetProvider::new()),
        store,
    );
    pet.load_model(ModelDescriptor::new(&args.model));

    let mut pointer = PointerNormalizer::new(window.scale_factor(), Instant::now());
    let mut current_cursor = CursorIcon::Default;

    // Main event loop
    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { event, .. } => {
                if let Some(pointer_event) = pointer.process_window_event(&event, Instant::now()) {
                    pet.handle_pointer(pointer_event);
                }

                match event {
                    WindowEvent::CloseRequested => {
                        info!("Close requested, shutting down ({:.0} fps)", pet.fps());
                        pet.destroy();
                        elwt.exit();
                    }
                    WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                        pointer.set_scale_factor(scale_factor);
                    }
                    WindowEvent::Resized(physical_size) => {
                        info!("Window resized to {:?}", physical_size);
                        presenter.resize(physical_size);
                        let ratio = pixel_ratio_for(window.scale_factor());
                        if let Err(e) = pet.resize(surface_size(&window), ratio) {
                            error!("{}", e);
                            pet.destroy();
                            elwt.exit();
                        }
                    }
                    WindowEvent::RedrawRequested => match pet.frame(Instant::now()) {
                        Ok(FrameOutcome::Stopped) => elwt.exit(),
                        outcome => {
                            // The loop keeps running after an error; a later load can recover
                            if let Err(e) = outcome {
                                error!("{}", e);
                            }
                            if let Err(e) = presenter.present(pet.renderer().target()) {
                                error!("Failed to present frame: {}", e);
                            }
                            window.request_redraw();
                        }
                    },
                    _ => {}
                }

                // Cursor shows whether the pet would take a press right now
                let cursor = if pet.interaction().is_dragging {
                    CursorIcon::Grabbing
                } else if pet.accepts_pointer() {
                    CursorIcon::Grab
                } else {
                    CursorIcon::Default
                };
                if current_cursor != cursor {
                    window.set_cursor_icon(cursor);
                    current_cursor = cursor;
                }
            }
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                pet.destroy();
            }
            _ => {}
        })
        .map_err(|e| anyhow::anyhow!("Event loop error: {}", e))?;

    Ok(())
}
