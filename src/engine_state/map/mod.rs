//! # Tile Map
//!
//! The authoritative, graphics-free record of every placed tile.
//!
//! ## Storage
//!
//! Tiles live in a flat `Vec` and are looked up by a linear scan on their grid
//! coordinate. Maps edited by hand stay small, so the scan is cheaper than keeping
//! a second index in sync. Storage order carries no meaning: removal swaps the last
//! tile into the freed slot.
//!
//! ## Persistence
//!
//! A map is persisted as a JSON array of tile records:
//!
//! ```json
//! [{ "x": 2, "y": 3, "height": 1.0, "hasBush": false }]
//! ```
//!
//! Import also accepts the older document layout `{ "tiles": [...] }`, ignoring any
//! other fields in the document.

pub mod editor;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Height given to freshly placed tiles.
pub const DEFAULT_TILE_HEIGHT: f32 = 1.0;

/// An integer grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Column along the world X axis
    pub x: i32,
    /// Row along the world Z axis
    pub y: i32,
}

impl TileCoord {
    /// Creates a coordinate from its two components.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for TileCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// One placed vertical column on the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Grid column
    pub x: i32,
    /// Grid row
    pub y: i32,
    /// Column height in world units, always positive
    pub height: f32,
    /// Whether a bush decorates the top of the column
    #[serde(rename = "hasBush", default)]
    pub has_bush: bool,
}

impl Tile {
    /// Creates an undecorated tile of default height at `coord`.
    pub fn new(coord: TileCoord) -> Self {
        Self {
            x: coord.x,
            y: coord.y,
            height: DEFAULT_TILE_HEIGHT,
            has_bush: false,
        }
    }

    /// The grid cell this tile occupies.
    pub fn coord(&self) -> TileCoord {
        TileCoord::new(self.x, self.y)
    }

    fn is_at(&self, x: i32, y: i32) -> bool {
        self.x == x && self.y == y
    }
}

/// Errors raised while importing persisted map data.
#[derive(Debug, Error)]
pub enum MapDataError {
    /// The input was not valid JSON or did not match either map layout
    #[error("Malformed map data: {0}")]
    Parse(#[from] serde_json::Error),
    /// Two records share the same grid coordinate
    #[error("Duplicate tile at ({x}, {y})")]
    DuplicateTile {
        /// Grid column of the duplicate
        x: i32,
        /// Grid row of the duplicate
        y: i32,
    },
    /// A record carries a zero, negative, or non-finite height
    #[error("Tile at ({x}, {y}) has invalid height {height}")]
    InvalidHeight {
        /// Grid column of the offending tile
        x: i32,
        /// Grid row of the offending tile
        y: i32,
        /// The rejected height
        height: f32,
    },
}

#[derive(Deserialize)]
struct MapDocument {
    tiles: Vec<Tile>,
}

/// Whether the JSON text starts with an array, after any leading whitespace.
fn is_record_array(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .find(|byte| !byte.is_ascii_whitespace())
        .is_some_and(|&byte| byte == b'[')
}

/// The sparse collection of placed tiles.
///
/// Invariant: no two tiles share the same `(x, y)`. The editor upholds it by
/// checking [`TileMap::find_at`] before every [`TileMap::insert`]; imports are
/// validated in [`TileMap::from_tiles`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileMap {
    tiles: Vec<Tile>,
}

impl TileMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from already-deserialized records, rejecting duplicate
    /// coordinates and invalid heights.
    pub fn from_tiles(tiles: Vec<Tile>) -> Result<Self, MapDataError> {
        let mut map = Self::new();
        for tile in tiles {
            if !(tile.height.is_finite() && tile.height > 0.0) {
                return Err(MapDataError::InvalidHeight {
                    x: tile.x,
                    y: tile.y,
                    height: tile.height,
                });
            }
            if map.contains(tile.x, tile.y) {
                return Err(MapDataError::DuplicateTile {
                    x: tile.x,
                    y: tile.y,
                });
            }
            map.insert(tile);
        }
        Ok(map)
    }

    /// Hydrates a map from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, MapDataError> {
        Self::from_json_slice(json.as_bytes())
    }

    /// Hydrates a map from raw JSON bytes, as delivered by the resource loader.
    ///
    /// A bare array is read as tile records; anything else must be the
    /// `{ "tiles": [...] }` document layout.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, MapDataError> {
        let tiles = if is_record_array(bytes) {
            serde_json::from_slice::<Vec<Tile>>(bytes)?
        } else {
            serde_json::from_slice::<MapDocument>(bytes)?.tiles
        };
        Self::from_tiles(tiles)
    }

    /// Serializes every tile as a compact JSON array.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.tiles)
    }

    /// Serializes every tile as an indented JSON array, used for exports meant to
    /// be read and diffed by people.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.tiles)
    }

    /// Finds the tile at exactly `(x, y)`.
    pub fn find_at(&self, x: i32, y: i32) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.is_at(x, y))
    }

    /// Finds the tile at exactly `(x, y)` for in-place edits such as toggling its bush.
    pub fn find_at_mut(&mut self, x: i32, y: i32) -> Option<&mut Tile> {
        self.tiles.iter_mut().find(|tile| tile.is_at(x, y))
    }

    /// Whether any tile occupies `(x, y)`.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.find_at(x, y).is_some()
    }

    /// Appends a tile.
    ///
    /// The caller must have checked that `(tile.x, tile.y)` is free. The check is not
    /// repeated here outside of debug builds, where a duplicate panics.
    pub fn insert(&mut self, tile: Tile) {
        debug_assert!(
            !self.contains(tile.x, tile.y),
            "tile already present at ({}, {})",
            tile.x,
            tile.y
        );
        self.tiles.push(tile);
    }

    /// Removes and returns the tile at `(x, y)`, or `None` when the cell is empty.
    pub fn remove_at(&mut self, x: i32, y: i32) -> Option<Tile> {
        let index = self.tiles.iter().position(|tile| tile.is_at(x, y))?;
        Some(self.tiles.swap_remove(index))
    }

    /// Every tile, in storage order.
    pub fn all(&self) -> &[Tile] {
        &self.tiles
    }

    /// Number of placed tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the map holds no tiles.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
