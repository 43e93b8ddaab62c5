// Character manifest and sprite-sheet loading

use super::AssetError;
use crate::engine::renderer::{SpriteSheet, SpriteSheetConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Identifies a character model; persisted with the session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Path to the character's JSON manifest
    pub manifest: PathBuf,
}

impl ModelDescriptor {
    pub fn new<P: AsRef<Path>>(manifest: P) -> Self {
        Self {
            manifest: manifest.as_ref().to_path_buf(),
        }
    }
}

impl fmt::Display for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.manifest.display())
    }
}

/// One animation as authored in the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationEntry {
    pub name: String,
    /// Sprite-sheet row holding the frames
    pub row: u32,
    pub frames: usize,
    pub fps: f32,
}

/// On-disk character description
///
/// ```json
/// {
///   "name": "cat",
///   "sheet": "cat.png",
///   "frame_width": 64,
///   "frame_height": 64,
///   "columns": 8,
///   "animations": [{ "name": "Relax", "row": 0, "frames": 4, "fps": 8 }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterManifest {
    pub name: String,
    /// Sprite sheet path, relative to the manifest
    pub sheet: PathBuf,
    pub frame_width: u32,
    pub frame_height: u32,
    pub columns: u32,
    pub animations: Vec<AnimationEntry>,
}

impl CharacterManifest {
    pub fn from_json(json: &str) -> Result<Self, AssetError> {
        let manifest: Self = serde_json::from_str(json).map_err(|e| AssetError::Manifest(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn layout(&self) -> SpriteSheetConfig {
        SpriteSheetConfig::new(self.frame_width, self.frame_height, self.columns)
    }

    fn validate(&self) -> Result<(), AssetError> {
        if self.frame_width == 0 || self.frame_height == 0 || self.columns == 0 {
            return Err(AssetError::Manifest(format!(
                "{}: frame size and column count must be positive",
                self.name
            )));
        }
        if self.animations.is_empty() {
            return Err(AssetError::Manifest(format!("{}: no animations", self.name)));
        }
        for entry in &self.animations {
            if entry.frames == 0 || entry.frames > self.columns as usize {
                return Err(AssetError::Manifest(format!(
                    "{}: animation '{}' has {} frames for {} columns",
                    self.name, entry.name, entry.frames, self.columns
                )));
            }
            if entry.fps.is_nan() || entry.fps <= 0.0 {
                return Err(AssetError::Manifest(format!(
                    "{}: animation '{}' needs a positive fps",
                    self.name, entry.name
                )));
            }
        }
        Ok(())
    }

    /// Check the decoded sheet actually holds every authored frame
    fn check_sheet(&self, sheet: &SpriteSheet) -> Result<(), AssetError> {
        let rows = self.animations.iter().map(|a| a.row + 1).max().unwrap_or(0);
        let needed = (self.columns * self.frame_width, rows * self.frame_height);
        let actual = sheet.image.dimensions();
        if actual.0 < needed.0 || actual.1 < needed.1 {
            return Err(AssetError::Image(format!(
                "sheet is {}x{}, manifest needs {}x{}",
                actual.0, actual.1, needed.0, needed.1
            )));
        }
        Ok(())
    }
}

/// A fully loaded character, ready to animate and draw
#[derive(Debug, Clone)]
pub struct CharacterModel {
    pub descriptor: ModelDescriptor,
    pub name: String,
    pub animations: Vec<AnimationEntry>,
    pub sheet: Arc<SpriteSheet>,
}

/// Load a character synchronously, reporting progress in `[0, 1]`
pub fn load_character(
    descriptor: &ModelDescriptor,
    progress: &dyn Fn(f32),
) -> Result<CharacterModel, AssetError> {
    let manifest_json = read_file(&descriptor.manifest)?;
    let manifest_json = String::from_utf8(manifest_json).map_err(|e| AssetError::Manifest(e.to_string()))?;
    let manifest = CharacterManifest::from_json(&manifest_json)?;
    progress(0.1);

    let base = descriptor.manifest.parent().unwrap_or_else(|| Path::new(""));
    let sheet_bytes = read_file(&base.join(&manifest.sheet))?;
    progress(0.5);

    let sheet = SpriteSheet::from_bytes(&sheet_bytes, manifest.layout()).map_err(|e| AssetError::Image(e.to_string()))?;
    manifest.check_sheet(&sheet)?;
    progress(0.9);

    let model = CharacterModel {
        descriptor: descriptor.clone(),
        name: manifest.name,
        animations: manifest.animations,
        sheet: Arc::new(sheet),
    };
    progress(1.0);
    Ok(model)
}

fn read_file(path: &Path) -> Result<Vec<u8>, AssetError> {
    if !path.exists() {
        return Err(AssetError::NotFound(path.to_string_lossy().to_string()));
    }
    Ok(std::fs::read(path)?)
}
