// CPU-side sprite sheet texture

use anyhow::Result;
use image::RgbaImage;

/// Sprite sheet layout for a character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteSheetConfig {
    /// Width of each frame in pixels
    pub frame_width: u32,
    /// Height of each frame in pixels
    pub frame_height: u32,
    /// Number of columns in the sprite sheet
    pub columns: u32,
}

impl SpriteSheetConfig {
    pub fn new(frame_width: u32, frame_height: u32, columns: u32) -> Self {
        Self {
            frame_width,
            frame_height,
            columns: columns.max(1),
        }
    }

    /// Top-left pixel of a frame within the sheet (image coordinates, y-down)
    pub fn frame_origin(&self, row: u32, frame_index: usize) -> (u32, u32) {
        let col = frame_index as u32 % self.columns;
        (col * self.frame_width, row * self.frame_height)
    }
}

/// A decoded sprite sheet with its frame layout
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    pub image: RgbaImage,
    pub layout: SpriteSheetConfig,
}

impl SpriteSheet {
    pub fn new(image: RgbaImage, layout: SpriteSheetConfig) -> Self {
        Self { image, layout }
    }

    /// Decode a sprite sheet from encoded image bytes (PNG, JPEG)
    pub fn from_bytes(bytes: &[u8], layout: SpriteSheetConfig) -> Result<Self> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::new(img.to_rgba8(), layout))
    }

    /// Create a sheet where every pixel has one colour (useful for testing)
    pub fn from_color(width: u32, height: u32, color: [u8; 4], layout: SpriteSheetConfig) -> Self {
        Self::new(RgbaImage::from_pixel(width, height, image::Rgba(color)), layout)
    }

    /// Size of one frame in sheet pixels
    pub fn frame_size(&self) -> (u32, u32) {
        (self.layout.frame_width, self.layout.frame_height)
    }

    /// Pixel `(x, y)` of a frame, with `y` counted down from the frame's top.
    /// Anything outside the sheet is transparent.
    pub fn frame_pixel(&self, row: u32, frame_index: usize, x: u32, y: u32) -> [u8; 4] {
        let (ox, oy) = self.layout.frame_origin(row, frame_index);
        let (sx, sy) = (ox + x, oy + y);
        if x >= self.layout.frame_width
            || y >= self.layout.frame_height
            || sx >= self.image.width()
            || sy >= self.image.height()
        {
            return [0; 4];
        }
        self.image.get_pixel(sx, sy).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_sprite_sheet_frame_origin() {
        let config = SpriteSheetConfig::new(64, 64, 8);
        assert_eq!(config.frame_origin(0, 0), (0, 0));
        assert_eq!(config.frame_origin(0, 1), (64, 0));
        assert_eq!(config.frame_origin(2, 9), (64, 128));
    }

    #[test]
    fn test_frame_pixel_lookup() {
        let mut image = RgbaImage::new(8, 4);
        image.put_pixel(5, 1, Rgba([9, 8, 7, 255]));
        let sheet = SpriteSheet::new(image, SpriteSheetConfig::new(4, 4, 2));

        // Second frame of row 0 starts at x = 4
        assert_eq!(sheet.frame_pixel(0, 1, 1, 1), [9, 8, 7, 255]);
        assert_eq!(sheet.frame_pixel(0, 0, 1, 1), [0, 0, 0, 0]);
        // Row 1 lies outside the 4px tall sheet
        assert_eq!(sheet.frame_pixel(1, 0, 0, 0), [0; 4]);
        // Coordinates past the frame are transparent
        assert_eq!(sheet.frame_pixel(0, 0, 4, 0), [0; 4]);
    }

    #[test]
    fn test_from_bytes_roundtrips_png() {
        let original = SpriteSheet::from_color(2, 2, [1, 2, 3, 4], SpriteSheetConfig::new(2, 2, 1));
        let mut bytes = Vec::new();
        original
            .image
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();

        let decoded = SpriteSheet::from_bytes(&bytes, original.layout).unwrap();
        assert_eq!(decoded.image.get_pixel(1, 1).0, [1, 2, 3, 4]);
        assert_eq!(decoded.frame_size(), (2, 2));
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(SpriteSheet::from_bytes(b"not an image", SpriteSheetConfig::new(1, 1, 1)).is_err());
    }
}
