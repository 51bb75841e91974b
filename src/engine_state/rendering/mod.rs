//! # Map Scene
//!
//! The rendering side of the editor, reduced to data. [`MapScene`] receives every
//! tile snapshot the editor commits, throws away the previous visuals and builds
//! one [`TileVisual`] per tile. Each frame it also marks the visual under the
//! pointer as hovered.
//!
//! ## Key Components
//!
//! * `TileGeometry` - Sizes and offsets shared by every column and bush
//! * `TileVisual` / `BushVisual` - Placement of one column and its decoration
//! * `MapScene` - The rebuild sink and hover state
//! * `instance` - GPU instance records produced from the scene
//! * `SceneUpdate` - The renderer-facing output: both instance buffers of a rebuild
//!
//! A rebuild is O(tiles) and only happens after an edit, never per frame.

pub mod instance;

use std::f32::consts::TAU;

use cgmath::{ElementWise, Matrix4, Rad, Vector3};
use serde::{Deserialize, Serialize};

use instance::InstanceRaw;

use super::map::{editor::RebuildSink, Tile, TileCoord};

/// Leaves never rise above this offset from the bush root.
const MAX_LEAF_RISE: f32 = 0.1;

/// Leaves get a random yaw within `[-MAX_LEAF_YAW, MAX_LEAF_YAW]`.
const MAX_LEAF_YAW: f32 = 0.1;

/// Shared sizes for the generated map geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileGeometry {
    /// Width and depth of a column, slightly below 1 to leave gaps between cells
    pub footprint: f32,
    /// World Y of the bottom of every column
    pub base_offset: f32,
    /// Size of the central bush leaf
    pub bush_size: f32,
    /// Number of small leaves scattered around the central one
    pub bush_leaf_count: usize,
}

impl Default for TileGeometry {
    fn default() -> Self {
        Self {
            footprint: 0.9,
            base_offset: -2.0,
            bush_size: 0.2,
            bush_leaf_count: 10,
        }
    }
}

/// Material variant assigned to an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    /// Default toon shading for columns
    Toon,
    /// Toon shading with the hover tint
    HoveredToon,
    /// Foliage shading for bush leaves
    Bush,
}

impl MaterialKind {
    /// Stable index written into instance data.
    pub fn index(self) -> u32 {
        match self {
            MaterialKind::Toon => 0,
            MaterialKind::HoveredToon => 1,
            MaterialKind::Bush => 2,
        }
    }
}

/// One leaf of a bush, relative to the bush root.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafVisual {
    /// Offset from the bush root, before the bush yaw is applied
    pub offset: Vector3<f32>,
    /// Non-uniform scale of the unit leaf sphere
    pub scale: Vector3<f32>,
    /// Rotation around the Y axis
    pub yaw: Rad<f32>,
}

/// A bush sitting on top of a column.
#[derive(Debug, Clone, PartialEq)]
pub struct BushVisual {
    /// World position of the bush root (the top centre of the column)
    pub root: Vector3<f32>,
    /// Rotation of the whole bush around the Y axis
    pub yaw: Rad<f32>,
    /// Every leaf, the central one last
    pub leaves: Vec<LeafVisual>,
}

/// Visual representation of one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileVisual {
    /// Grid cell of the tile this visual was built from
    pub coord: TileCoord,
    /// Centre of the column in world space
    pub translation: Vector3<f32>,
    /// Scale of the unit box
    pub scale: Vector3<f32>,
    /// Current material variant
    pub material: MaterialKind,
    /// Decoration, if the tile has a bush
    pub bush: Option<BushVisual>,
}

impl TileVisual {
    fn new(tile: &Tile, geometry: &TileGeometry) -> Self {
        let translation = Vector3::new(
            tile.x as f32,
            tile.height / 2.0 + geometry.base_offset,
            tile.y as f32,
        );
        let bush = tile.has_bush.then(|| {
            let root = Vector3::new(translation.x, tile.height + geometry.base_offset, translation.z);
            generate_bush(tile.coord(), root, geometry)
        });

        Self {
            coord: tile.coord(),
            translation,
            scale: Vector3::new(geometry.footprint, tile.height, geometry.footprint),
            material: MaterialKind::Toon,
            bush,
        }
    }

    fn model(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.translation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// Seeds bush randomness from the cell so a bush keeps its shape across rebuilds.
fn bush_seed(coord: TileCoord) -> u64 {
    ((coord.x as u32 as u64) << 32) | coord.y as u32 as u64
}

fn random_range(rng: &mut fastrand::Rng, min: f32, max: f32) -> f32 {
    rng.f32() * (max - min) + min
}

/// Uniformly distributed unit vector.
fn random_direction(rng: &mut fastrand::Rng) -> Vector3<f32> {
    let u = (rng.f32() - 0.5) * 2.0;
    let t = rng.f32() * TAU;
    let f = (1.0 - u * u).sqrt();
    Vector3::new(f * t.cos(), u, f * t.sin())
}

fn leaf_scale(size: f32) -> Vector3<f32> {
    Vector3::new(1.5 * size, size / 1.5, size)
}

fn generate_bush(coord: TileCoord, root: Vector3<f32>, geometry: &TileGeometry) -> BushVisual {
    let mut rng = fastrand::Rng::with_seed(bush_seed(coord));
    let size = geometry.bush_size;
    let core_scale = leaf_scale(size);

    let mut leaves = Vec::with_capacity(geometry.bush_leaf_count + 1);
    for _ in 0..geometry.bush_leaf_count {
        let offset = loop {
            let candidate = random_direction(&mut rng).mul_element_wise(core_scale);
            if candidate.y <= MAX_LEAF_RISE {
                break candidate;
            }
        };
        leaves.push(LeafVisual {
            offset,
            scale: leaf_scale(size / 2.0),
            yaw: Rad(random_range(&mut rng, -MAX_LEAF_YAW, MAX_LEAF_YAW)),
        });
    }
    leaves.push(LeafVisual {
        offset: Vector3::new(0.0, size / 4.0, 0.0),
        scale: core_scale,
        yaw: Rad(0.0),
    });

    BushVisual {
        root,
        yaw: Rad(random_range(&mut rng, 0.0, TAU)),
        leaves,
    }
}

/// Instance data of one scene rebuild, ready to be uploaded by a renderer.
#[derive(Debug, Clone)]
pub struct SceneUpdate {
    /// Rebuild this data was produced from, see [`MapScene::generation`]
    pub generation: u64,
    /// One instance per column
    pub tile_instances: Vec<InstanceRaw>,
    /// One instance per bush leaf
    pub leaf_instances: Vec<InstanceRaw>,
}

impl SceneUpdate {
    /// Total upload size of both instance buffers.
    pub fn byte_len(&self) -> usize {
        InstanceRaw::as_bytes(&self.tile_instances).len() + InstanceRaw::as_bytes(&self.leaf_instances).len()
    }
}

/// Visual state of the whole map.
#[derive(Debug, Default)]
pub struct MapScene {
    geometry: TileGeometry,
    tiles: Vec<TileVisual>,
    generation: u64,
}

impl MapScene {
    /// Creates an empty scene using `geometry` for every visual it builds.
    pub fn new(geometry: TileGeometry) -> Self {
        Self {
            geometry,
            tiles: Vec::new(),
            generation: 0,
        }
    }

    /// Current tile visuals.
    pub fn tiles(&self) -> &[TileVisual] {
        &self.tiles
    }

    /// Number of rebuilds performed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Marks the visual under `pick` as hovered and every other one as not hovered.
    ///
    /// Returns how many visuals ended up hovered. Without a pick nothing is hovered.
    pub fn update_highlight(&mut self, pick: Option<TileCoord>) -> usize {
        let mut hovered = 0;
        for visual in &mut self.tiles {
            if Some(visual.coord) == pick {
                visual.material = MaterialKind::HoveredToon;
                hovered += 1;
            } else {
                visual.material = MaterialKind::Toon;
            }
        }
        hovered
    }

    /// Both instance buffers for the current visuals.
    pub fn scene_update(&self) -> SceneUpdate {
        SceneUpdate {
            generation: self.generation,
            tile_instances: self.tile_instances(),
            leaf_instances: self.leaf_instances(),
        }
    }

    /// One instance per column.
    pub fn tile_instances(&self) -> Vec<InstanceRaw> {
        self.tiles
            .iter()
            .map(|visual| InstanceRaw::new(visual.model(), visual.material.index()))
            .collect()
    }

    /// One instance per bush leaf, across every decorated column.
    pub fn leaf_instances(&self) -> Vec<InstanceRaw> {
        let material = MaterialKind::Bush.index();
        self.tiles
            .iter()
            .filter_map(|visual| visual.bush.as_ref())
            .flat_map(|bush| {
                let bush_model = Matrix4::from_translation(bush.root) * Matrix4::from_angle_y(bush.yaw);
                bush.leaves.iter().map(move |leaf| {
                    let model = bush_model
                        * Matrix4::from_translation(leaf.offset)
                        * Matrix4::from_angle_y(leaf.yaw)
                        * Matrix4::from_nonuniform_scale(leaf.scale.x, leaf.scale.y, leaf.scale.z);
                    InstanceRaw::new(model, material)
                })
            })
            .collect()
    }
}

impl RebuildSink for MapScene {
    fn rebuild(&mut self, tiles: &[Tile]) {
        self.tiles = tiles
            .iter()
            .map(|tile| TileVisual::new(tile, &self.geometry))
            .collect();
        self.generation += 1;
        log::debug!(
            "Rebuilt map scene #{} with {} tiles",
            self.generation,
            self.tiles.len()
        );
    }
}
