// Engine modules: frame timing, physics, input, rendering, assets, persistence

pub mod assets;
pub mod game_loop;
pub mod input;
pub mod persistence;
pub mod physics;
pub mod renderer;
