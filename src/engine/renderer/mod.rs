// Render boundary: the pet draws through `Renderer` and reads pixels back for hit testing.
// `Presenter` puts the composited target on the window.

mod present;
mod target;
pub mod texture;

pub use hit_test::{hit_test, map_to_target, HitTester};
pub use present::Presenter;
pub use target::{SoftwareRenderer, MAX_TARGET_DIMENSION};
pub use texture::{SpriteSheet, SpriteSheetConfig};

use glam::Vec2;
use image::RgbaImage;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("render surface unavailable ({width}x{height} at {pixel_ratio}x)")]
    SurfaceUnavailable { width: f32, height: f32, pixel_ratio: f32 },
}

/// Parameters of the compositing pass
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CompositeUniforms {
    pub outline_color: [f32; 4],
    /// Outline width in logical pixels; 0 disables the outline
    pub outline_width: f32,
    pub alpha: f32,
}

impl CompositeUniforms {
    pub fn new(outline_color: [f32; 4], outline_width: f32, alpha: f32) -> Self {
        Self {
            outline_color,
            outline_width: outline_width.max(0.0),
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    /// Plain composite: no outline, fully opaque
    pub fn plain() -> Self {
        Self::new([0.0; 4], 0.0, 1.0)
    }

}

impl Default for CompositeUniforms {
    fn default() -> Self {
        Self::plain()
    }
}

/// Which sprite-sheet frame to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteFrame {
    pub row: u32,
    pub frame_index: usize,
}

/// Everything one frame needs from the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameDraw {
    /// Bottom-left corner of the character in surface space (y-up)
    pub position: Vec2,
    /// `None` clears the target without drawing a character
    pub frame: Option<SpriteFrame>,
    pub flip_horizontal: bool,
    pub uniforms: CompositeUniforms,
}

/// A render target the pet can draw into and sample
pub trait Renderer {
    /// Reallocate the target for a surface of `surface` logical pixels
    fn resize(&mut self, surface: Vec2, pixel_ratio: f32) -> Result<(), RenderError>;

    fn bind_character(&mut self, sheet: Arc<SpriteSheet>);

    /// Offscreen character pass followed by the compositing pass
    fn draw(&mut self, frame: &FrameDraw);

    /// RGBA at target pixel `(x, y)`, row 0 at the bottom. Out of range reads are transparent.
    fn read_pixel(&self, x: u32, y: u32) -> [u8; 4];

    /// The composited frame, row 0 at the bottom; this is what gets presented
    fn target(&self) -> &RgbaImage;

    /// Target size in device pixels
    fn target_size(&self) -> (u32, u32);

    fn pixel_ratio(&self) -> f32;

    /// Surface size in logical pixels
    fn surface_size(&self) -> Vec2;

    /// Drop every GPU/CPU resource; the renderer is unusable afterwards
    fn release(&mut self);
}

/// Device pixels per logical pixel for a window scale factor
pub fn pixel_ratio_for(scale_factor: f64) -> f32 {
    if scale_factor.is_finite() {
        (scale_factor as f32).max(1.0)
    } else {
        1.0
    }
}
