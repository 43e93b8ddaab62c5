// Asset loading
//
// Characters are described by a JSON manifest next to their sprite sheet.
// Loading happens off the frame loop; the pet polls a provider for progress.

mod loader;
mod provider;

pub use loader::{load_character, AnimationEntry, CharacterManifest, CharacterModel, ModelDescriptor};
pub use provider::{AssetProvider, FileAssetProvider, LoadStatus};

/// Asset loading errors
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Invalid character manifest: {0}")]
    Manifest(String),

    #[error("Failed to decode sprite sheet: {0}")]
    Image(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Load cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_error_display() {
        let err = AssetError::NotFound("pet.json".to_string());
        assert_eq!(err.to_string(), "Asset not found: pet.json");
        assert_eq!(AssetError::Cancelled.to_string(), "Load cancelled");
    }
}
