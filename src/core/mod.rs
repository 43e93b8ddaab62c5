// Core helpers shared across the engine and pet layers

pub mod math;
