//! # Resource Cache
//!
//! One keyed cache for every asset the editor loads: textures, models, fonts,
//! audio clips, and the map itself. An entry is keyed by `(kind, path)`, starts out
//! pending when requested, and is settled exactly once when its asynchronous load
//! reports back.
//!
//! The cache does no I/O. The host starts a load whenever [`ResourceCache::request`]
//! returns `true` and hands the outcome back through [`ResourceCache::complete`].
//! Raw bytes are turned into a [`Resource`] with [`decode`].

use std::collections::HashMap;
use std::fmt;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::map::{MapDataError, TileMap};

/// What a resource is and therefore how its bytes are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// PNG image, decoded to RGBA8
    Texture,
    /// glTF JSON model
    Model,
    /// Typeface JSON font
    Font,
    /// Encoded audio clip, kept as bytes for the audio backend
    Audio,
    /// Tile map records
    MapData,
}

/// Identifies one cached resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    /// How the resource is decoded
    pub kind: ResourceKind,
    /// Path relative to the asset root
    pub path: String,
}

impl ResourceKey {
    /// Creates a key.
    pub fn new(kind: ResourceKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} '{}'", self.kind, self.path)
    }
}

/// A decoded resource.
#[derive(Debug, Clone)]
pub enum Resource {
    /// Decoded image
    Texture(RgbaImage),
    /// Parsed JSON document (models, fonts)
    Json(serde_json::Value),
    /// Undecoded bytes (audio)
    Bytes(Vec<u8>),
    /// Imported tile map
    MapData(TileMap),
}

/// Why a resource could not be loaded.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Reading a local file failed
    #[error("Failed to read {path}: {source}")]
    Io {
        /// The file that could not be read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// Fetching over the network failed
    #[error("Failed to fetch {url}: {message}")]
    Fetch {
        /// The requested URL
        url: String,
        /// Description reported by the HTTP client
        message: String,
    },
    /// Handing an exported document to the platform failed
    #[error("Failed to export {path}: {message}")]
    Export {
        /// The export destination
        path: String,
        /// Description reported by the platform
        message: String,
    },
    /// The bytes are not a supported image
    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),
    /// The bytes are not valid JSON
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The bytes are not a valid tile map
    #[error(transparent)]
    MapData(#[from] MapDataError),
}

/// Decodes raw bytes according to `kind`.
pub fn decode(kind: ResourceKind, bytes: Vec<u8>) -> Result<Resource, ResourceError> {
    let resource = match kind {
        ResourceKind::Texture => Resource::Texture(image::load_from_memory(&bytes)?.to_rgba8()),
        ResourceKind::Model | ResourceKind::Font => Resource::Json(serde_json::from_slice(&bytes)?),
        ResourceKind::Audio => Resource::Bytes(bytes),
        ResourceKind::MapData => Resource::MapData(TileMap::from_json_slice(&bytes)?),
    };
    Ok(resource)
}

/// Load state of one entry.
#[derive(Debug)]
pub enum ResourceState {
    /// Requested, load in flight
    Pending,
    /// Loaded and decoded
    Ready(Resource),
    /// Load failed; the message is kept for diagnostics
    Failed(String),
}

/// The keyed cache.
#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: HashMap<ResourceKey, ResourceState>,
    requested: usize,
    settled: usize,
    progress: f32,
}

impl ResourceCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `key` as pending.
    ///
    /// Returns `true` the first time a key is requested, meaning the caller should
    /// start loading it; later requests for the same key return `false`.
    pub fn request(&mut self, key: ResourceKey) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        log::debug!("Requested {}", key);
        self.entries.insert(key, ResourceState::Pending);
        self.requested += 1;
        true
    }

    /// Settles a pending entry with the outcome of its load.
    ///
    /// Outcomes for keys that were never requested, or that already settled, are
    /// dropped with a warning.
    pub fn complete(&mut self, key: ResourceKey, result: Result<Resource, ResourceError>) {
        let Some(state) = self.entries.get_mut(&key) else {
            log::warn!("Dropping result for unrequested resource {}", key);
            return;
        };
        if !matches!(state, ResourceState::Pending) {
            log::warn!("Dropping duplicate result for resource {}", key);
            return;
        }

        *state = match result {
            Ok(resource) => {
                log::info!("Loaded {}", key);
                ResourceState::Ready(resource)
            }
            Err(err) => {
                log::error!("Failed to load {}: {}", key, err);
                ResourceState::Failed(err.to_string())
            }
        };

        self.settled += 1;
        self.progress = self.progress.max(self.settled as f32 / self.requested as f32);
    }

    /// The loaded resource for `key`, if it is ready.
    pub fn get(&self, key: &ResourceKey) -> Option<&Resource> {
        match self.entries.get(key) {
            Some(ResourceState::Ready(resource)) => Some(resource),
            _ => None,
        }
    }

    /// The load state of `key`, or `None` if it was never requested.
    pub fn state(&self, key: &ResourceKey) -> Option<&ResourceState> {
        self.entries.get(key)
    }

    /// Fraction of requested resources that have settled, in `[0, 1]`.
    ///
    /// Never decreases, even when new requests arrive after earlier ones settled.
    /// With nothing requested the cache counts as fully loaded.
    pub fn progress(&self) -> f32 {
        if self.requested == 0 {
            1.0
        } else {
            self.progress
        }
    }

    /// Whether every requested resource has settled.
    pub fn is_settled(&self) -> bool {
        self.settled == self.requested
    }
}
