// CPU render target
//
// The target is an RGBA image whose row 0 is the bottom of the surface, the
// same orientation a GPU framebuffer read back with glReadPixels would have.
// Drawing happens in two passes: the character frame is blitted into an
// offscreen layer, then composited onto the target with outline and alpha.

use super::{FrameDraw, RenderError, Renderer, SpriteSheet};
use glam::Vec2;
use image::{Rgba, RgbaImage};
use log::{debug, info};
use std::sync::Arc;

/// Largest target edge in device pixels
pub const MAX_TARGET_DIMENSION: u32 = 16384;

pub struct SoftwareRenderer {
    surface: Vec2,
    pixel_ratio: f32,
    target: RgbaImage,
    /// Offscreen character pass, same size as `target`
    layer: RgbaImage,
    sheet: Option<Arc<SpriteSheet>>,
    released: bool,
}

impl SoftwareRenderer {
    /// Create a renderer for a surface of `surface` logical pixels
    pub fn new(surface: Vec2, pixel_ratio: f32) -> Result<Self, RenderError> {
        let mut renderer = Self {
            surface: Vec2::ZERO,
            pixel_ratio: 1.0,
            target: RgbaImage::new(0, 0),
            layer: RgbaImage::new(0, 0),
            sheet: None,
            released: false,
        };
        renderer.resize(surface, pixel_ratio)?;
        info!(
            "Render target {}x{} (pixel ratio {})",
            renderer.target.width(),
            renderer.target.height(),
            renderer.pixel_ratio
        );
        Ok(renderer)
    }

    fn clear(&mut self) {
        for pixel in self.target.pixels_mut() {
            *pixel = Rgba([0; 4]);
        }
        for pixel in self.layer.pixels_mut() {
            *pixel = Rgba([0; 4]);
        }
    }

    /// Character pass; returns the touched region `(x0, y0, x1, y1)` (exclusive end)
    fn draw_character(&mut self, sheet: &SpriteSheet, draw: &FrameDraw) -> Option<(u32, u32, u32, u32)> {
        let frame = draw.frame?;
        let (frame_w, frame_h) = sheet.frame_size();
        if frame_w == 0 || frame_h == 0 {
            return None;
        }

        let ratio = self.pixel_ratio;
        let (target_w, target_h) = self.layer.dimensions();
        let x0 = ((draw.position.x * ratio).floor().max(0.0) as u32).min(target_w);
        let y0 = ((draw.position.y * ratio).floor().max(0.0) as u32).min(target_h);
        let x1 = (((draw.position.x + frame_w as f32) * ratio).ceil().max(0.0) as u32).min(target_w);
        let y1 = (((draw.position.y + frame_h as f32) * ratio).ceil().max(0.0) as u32).min(target_h);

        for ty in y0..y1 {
            // Pixel centre back in logical space, measured up from the sprite's bottom edge
            let v = (ty as f32 + 0.5) / ratio - draw.position.y;
            if v < 0.0 || v >= frame_h as f32 {
                continue;
            }
            let sheet_y = frame_h - 1 - v as u32;

            for tx in x0..x1 {
                let u = (tx as f32 + 0.5) / ratio - draw.position.x;
                if u < 0.0 || u >= frame_w as f32 {
                    continue;
                }
                let mut sheet_x = u as u32;
                if draw.flip_horizontal {
                    sheet_x = frame_w - 1 - sheet_x;
                }

                let texel = sheet.frame_pixel(frame.row, frame.frame_index, sheet_x, sheet_y);
                if texel[3] != 0 {
                    self.layer.put_pixel(tx, ty, Rgba(texel));
                }
            }
        }

        Some((x0, y0, x1, y1))
    }

    /// Compositing pass over the character's region, grown by the outline
    fn composite(&mut self, region: (u32, u32, u32, u32), draw: &FrameDraw) {
        let uniforms = draw.uniforms;
        let radius = (uniforms.outline_width * self.pixel_ratio).round() as i64;
        let (target_w, target_h) = self.target.dimensions();
        let grow = radius.max(0) as u32;
        let (x0, y0) = (region.0.saturating_sub(grow), region.1.saturating_sub(grow));
        let (x1, y1) = ((region.2 + grow).min(target_w), (region.3 + grow).min(target_h));

        let outline = uniforms.outline_color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);

        for y in y0..y1 {
            for x in x0..x1 {
                let source = self.layer.get_pixel(x, y).0;
                let color = if source[3] != 0 {
                    source
                } else if radius > 0 && self.near_character(x, y, radius) {
                    outline
                } else {
                    continue;
                };

                let alpha = (color[3] as f32 * uniforms.alpha).round() as u8;
                self.target.put_pixel(x, y, Rgba([color[0], color[1], color[2], alpha]));
            }
        }
    }

    /// Whether an opaque character pixel lies within `radius` (square neighbourhood)
    fn near_character(&self, x: u32, y: u32, radius: i64) -> bool {
        let (w, h) = self.layer.dimensions();
        let (cx, cy) = (x as i64, y as i64);
        for ny in (cy - radius).max(0)..=(cy + radius).min(h as i64 - 1) {
            for nx in (cx - radius).max(0)..=(cx + radius).min(w as i64 - 1) {
                if self.layer.get_pixel(nx as u32, ny as u32)[3] != 0 {
                    return true;
                }
            }
        }
        false
    }
}

impl Renderer for SoftwareRenderer {
    fn resize(&mut self, surface: Vec2, pixel_ratio: f32) -> Result<(), RenderError> {
        let unavailable = RenderError::SurfaceUnavailable {
            width: surface.x,
            height: surface.y,
            pixel_ratio,
        };
        if self.released || !surface.is_finite() || !pixel_ratio.is_finite() || pixel_ratio <= 0.0 {
            return Err(unavailable);
        }

        let width = (surface.x * pixel_ratio).round();
        let height = (surface.y * pixel_ratio).round();
        if width < 1.0 || height < 1.0 || width > MAX_TARGET_DIMENSION as f32 || height > MAX_TARGET_DIMENSION as f32 {
            return Err(unavailable);
        }

        self.surface = surface;
        self.pixel_ratio = pixel_ratio;
        self.target = RgbaImage::new(width as u32, height as u32);
        self.layer = RgbaImage::new(width as u32, height as u32);
        debug!("Render target resized to {}x{}", width, height);
        Ok(())
    }

    fn bind_character(&mut self, sheet: Arc<SpriteSheet>) {
        self.sheet = Some(sheet);
    }

    fn draw(&mut self, frame: &FrameDraw) {
        if self.released {
            return;
        }
        self.clear();

        let Some(sheet) = self.sheet.clone() else {
            return;
        };
        if let Some(region) = self.draw_character(&sheet, frame) {
            self.composite(region, frame);
        }
    }

    fn read_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x < self.target.width() && y < self.target.height() {
            self.target.get_pixel(x, y).0
        } else {
            [0; 4]
        }
    }

    fn target(&self) -> &RgbaImage {
        &self.target
    }

    fn target_size(&self) -> (u32, u32) {
        self.target.dimensions()
    }

    fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    fn surface_size(&self) -> Vec2 {
        self.surface
    }

    fn release(&mut self) {
        self.sheet = None;
        self.target = RgbaImage::new(0, 0);
        self.layer = RgbaImage::new(0, 0);
        self.released = true;
        info!("Renderer released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::renderer::{CompositeUniforms, SpriteFrame, SpriteSheetConfig};

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    /// 4x4 frame: left column red, everything else transparent, bottom-right pixel blue
    fn sheet() -> Arc<SpriteSheet> {
        let mut image = RgbaImage::new(4, 4);
        for y in 0..4 {
            image.put_pixel(0, y, Rgba(RED));
        }
        image.put_pixel(3, 3, Rgba(BLUE));
        Arc::new(SpriteSheet::new(image, SpriteSheetConfig::new(4, 4, 1)))
    }

    fn draw_at(position: Vec2, flip: bool, uniforms: CompositeUniforms) -> FrameDraw {
        FrameDraw {
            position,
            frame: Some(SpriteFrame { row: 0, frame_index: 0 }),
            flip_horizontal: flip,
            uniforms,
        }
    }

    #[test]
    fn test_resize_validates_surface() {
        let mut renderer = SoftwareRenderer::new(Vec2::new(20.0, 10.0), 2.0).unwrap();
        assert_eq!(renderer.target_size(), (40, 20));
        assert_eq!(renderer.surface_size(), Vec2::new(20.0, 10.0));

        assert!(renderer.resize(Vec2::new(0.0, 10.0), 1.0).is_err());
        assert!(renderer.resize(Vec2::new(10.0, 10.0), 0.0).is_err());
        assert!(renderer.resize(Vec2::new(20000.0, 10.0), 1.0).is_err());
        // Failed resizes keep the previous target
        assert_eq!(renderer.target_size(), (40, 20));
    }

    #[test]
    fn test_blit_is_bottom_up() {
        let mut renderer = SoftwareRenderer::new(Vec2::new(10.0, 10.0), 1.0).unwrap();
        renderer.bind_character(sheet());
        renderer.draw(&draw_at(Vec2::new(2.0, 0.0), false, CompositeUniforms::plain()));

        // Left column of the frame lands at x = 2 for every row
        for y in 0..4 {
            assert_eq!(renderer.read_pixel(2, y), RED);
        }
        // Sheet bottom-right pixel is the target's bottom row
        assert_eq!(renderer.read_pixel(5, 0), BLUE);
        assert_eq!(renderer.read_pixel(5, 3), [0; 4]);
        assert_eq!(renderer.read_pixel(3, 1), [0; 4]);
        assert_eq!(renderer.read_pixel(2, 4), [0; 4]);
    }

    #[test]
    fn test_flip_mirrors_frame() {
        let mut renderer = SoftwareRenderer::new(Vec2::new(10.0, 10.0), 1.0).unwrap();
        renderer.bind_character(sheet());
        renderer.draw(&draw_at(Vec2::new(2.0, 0.0), true, CompositeUniforms::plain()));

        assert_eq!(renderer.read_pixel(5, 2), RED);
        assert_eq!(renderer.read_pixel(2, 0), BLUE);
        assert_eq!(renderer.read_pixel(2, 2), [0; 4]);
    }

    #[test]
    fn test_pixel_ratio_scales_blit() {
        let mut renderer = SoftwareRenderer::new(Vec2::new(10.0, 10.0), 2.0).unwrap();
        renderer.bind_character(sheet());
        renderer.draw(&draw_at(Vec2::new(1.0, 1.0), false, CompositeUniforms::plain()));

        // Logical x = 1 covers device columns 2 and 3
        assert_eq!(renderer.read_pixel(2, 2), RED);
        assert_eq!(renderer.read_pixel(3, 9), RED);
        assert_eq!(renderer.read_pixel(4, 5), [0; 4]);
        assert_eq!(renderer.read_pixel(1, 2), [0; 4]);
    }

    #[test]
    fn test_outline_and_alpha() {
        let mut renderer = SoftwareRenderer::new(Vec2::new(10.0, 10.0), 1.0).unwrap();
        renderer.bind_character(sheet());
        let uniforms = CompositeUniforms::new([0.0, 1.0, 0.0, 1.0], 1.0, 0.5);
        renderer.draw(&draw_at(Vec2::new(2.0, 2.0), false, uniforms));

        // Character pixels keep their colour at half alpha
        assert_eq!(renderer.read_pixel(2, 3), [255, 0, 0, 128]);
        // Neighbour of the red column is outlined
        assert_eq!(renderer.read_pixel(1, 3), [0, 255, 0, 128]);
        // Two pixels away stays empty
        assert_eq!(renderer.read_pixel(0, 3), [0; 4]);
    }

    #[test]
    fn test_draw_without_frame_clears() {
        let mut renderer = SoftwareRenderer::new(Vec2::new(10.0, 10.0), 1.0).unwrap();
        renderer.bind_character(sheet());
        renderer.draw(&draw_at(Vec2::ZERO, false, CompositeUniforms::plain()));
        assert_eq!(renderer.read_pixel(0, 0), RED);

        renderer.draw(&FrameDraw {
            frame: None,
            ..draw_at(Vec2::ZERO, false, CompositeUniforms::plain())
        });
        assert_eq!(renderer.read_pixel(0, 0), [0; 4]);
    }

    #[test]
    fn test_release() {
        let mut renderer = SoftwareRenderer::new(Vec2::new(10.0, 10.0), 1.0).unwrap();
        renderer.release();
        assert_eq!(renderer.target_size(), (0, 0));
        assert_eq!(renderer.read_pixel(0, 0), [0; 4]);
        assert!(renderer.resize(Vec2::new(10.0, 10.0), 1.0).is_err());
    }
}
