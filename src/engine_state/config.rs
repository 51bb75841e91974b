//! # Editor Configuration
//!
//! Everything an editing session needs to know up front: camera, picking plane,
//! tile geometry, where assets live, and which ones to preload.
//!
//! Natively the configuration is read from [`EditorConfig::FILE_NAME`] in the working
//! directory; any field left out falls back to its default. The web build always
//! uses the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    camera_state::{camera::CameraConfig, PickingConfig},
    rendering::TileGeometry,
    resources::{ResourceKey, ResourceKind},
};

/// Errors raised while reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid configuration JSON
    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings for one editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Camera projection and placement
    pub camera: CameraConfig,
    /// Selection plane used for picking
    pub picking: PickingConfig,
    /// Column and bush geometry
    pub tiles: TileGeometry,
    /// Directory (native) or URL path (web) all resource paths are relative to
    pub asset_root: String,
    /// Map data loaded at startup, relative to `asset_root`
    pub map_path: String,
    /// File the map is written to on export
    pub export_path: String,
    /// Resources requested at startup besides the map
    pub preload: Vec<ResourceKey>,
    /// Scene time speed multiplier
    pub time_speed: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            picking: PickingConfig::default(),
            tiles: TileGeometry::default(),
            asset_root: "assets".to_string(),
            map_path: "gameData.json".to_string(),
            export_path: "gameData.json".to_string(),
            preload: vec![
                ResourceKey::new(ResourceKind::Texture, "texture/noiseTexture.png"),
                ResourceKey::new(ResourceKind::Texture, "texture/matcap01.png"),
                ResourceKey::new(ResourceKind::Audio, "audio/swoosh01.mp3"),
                ResourceKey::new(ResourceKind::Font, "fonts/helvetiker_regular.typeface.json"),
            ],
            time_speed: 1.0,
        }
    }
}

impl EditorConfig {
    /// Configuration file looked up in the working directory.
    pub const FILE_NAME: &'static str = "kub_editor.json";

    /// Reads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Reads a configuration file, falling back to the defaults when it is missing
    /// or invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded configuration from {}", path.display());
                config
            }
            Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No configuration at {}, using defaults", path.display());
                Self::default()
            }
            Err(err) => {
                log::warn!("{}, using defaults", err);
                Self::default()
            }
        }
    }

    /// Key of the map data resource.
    pub fn map_key(&self) -> ResourceKey {
        ResourceKey::new(ResourceKind::MapData, self.map_path.clone())
    }
}
