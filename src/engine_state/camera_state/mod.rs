//! # Camera State Management
//!
//! This module turns a pointer position into a grid cell:
//! - `Viewport` letterboxes the canvas inside the window and maps pixels to NDC
//! - `Camera` unprojects NDC into a world ray
//! - `GroundPicker` intersects that ray with the invisible selection plane
//!
//! The result is the editor's pick: the integer cell under the pointer, or `None`.

use cgmath::Vector2;
use serde::{Deserialize, Serialize};
use winit::dpi::PhysicalSize;

use super::map::TileCoord;

pub mod camera;

use camera::{Camera, Ray};

/// Settings of the invisible plane the pointer ray is intersected with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickingConfig {
    /// World Y of the selection plane
    pub plane_height: f32,
    /// Half the side length of the square selection plane, centred on the origin
    pub plane_half_extent: f32,
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self {
            plane_height: -1.0,
            plane_half_extent: 500.0,
        }
    }
}

/// The region of the window the scene is drawn into.
///
/// The canvas keeps the camera's aspect ratio and is centred in the window, leaving
/// bars on two sides when the window's ratio differs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Canvas width in physical pixels
    pub width: f64,
    /// Canvas height in physical pixels
    pub height: f64,
    /// Gap between the window's left edge and the canvas
    pub horizontal_offset: f64,
    /// Gap between the window's top edge and the canvas
    pub vertical_offset: f64,
}

impl Viewport {
    /// Fits a canvas of ratio `aspect` inside a window of `window` size.
    pub fn fit(window: PhysicalSize<u32>, aspect: f32) -> Self {
        let window_width = window.width as f64;
        let window_height = window.height as f64;
        let aspect = aspect as f64;

        if window_height * aspect > window_width {
            let height = window_width / aspect;
            Self {
                width: window_width,
                height,
                horizontal_offset: 0.0,
                vertical_offset: (window_height - height) / 2.0,
            }
        } else {
            let width = window_height * aspect;
            Self {
                width,
                height: window_height,
                horizontal_offset: (window_width - width) / 2.0,
                vertical_offset: 0.0,
            }
        }
    }

    /// The canvas size rounded to whole pixels, for configuring a render surface.
    pub fn canvas_size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.width.round() as u32, self.height.round() as u32)
    }

    /// Converts a window pixel position to normalized device coordinates.
    ///
    /// Returns `None` for positions on the letterbox bars or when the canvas is empty.
    pub fn to_ndc(&self, pointer: (f64, f64)) -> Option<Vector2<f32>> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }

        let x = ((pointer.0 - self.horizontal_offset) / self.width) * 2.0 - 1.0;
        let y = -((pointer.1 - self.vertical_offset) / self.height) * 2.0 + 1.0;

        if !(-1.0..=1.0).contains(&x) || !(-1.0..=1.0).contains(&y) {
            return None;
        }

        Some(Vector2::new(x as f32, y as f32))
    }
}

/// Produces the grid cell under the pointer.
pub trait PickProvider {
    /// Picks the cell under `pointer_ndc` as seen through `camera`, or `None` when
    /// there is no pointer or nothing is hit.
    fn pick(&self, camera: &Camera, pointer_ndc: Option<Vector2<f32>>) -> Option<TileCoord>;
}

/// Picks cells on a bounded horizontal plane.
#[derive(Debug, Clone)]
pub struct GroundPicker {
    plane_height: f32,
    plane_half_extent: f32,
}

impl GroundPicker {
    /// Creates a picker for the plane described by `config`.
    pub fn new(config: &PickingConfig) -> Self {
        Self {
            plane_height: config.plane_height,
            plane_half_extent: config.plane_half_extent,
        }
    }

    /// Intersects `ray` with the plane and snaps the hit to the nearest cell.
    pub fn intersect(&self, ray: &Ray) -> Option<TileCoord> {
        if ray.direction.y.abs() <= f32::EPSILON {
            return None;
        }

        let t = (self.plane_height - ray.origin.y) / ray.direction.y;
        if t < 0.0 {
            return None;
        }

        let hit = ray.at(t);
        if hit.x.abs() > self.plane_half_extent || hit.z.abs() > self.plane_half_extent {
            return None;
        }

        Some(TileCoord::new(round_half_up(hit.x), round_half_up(hit.z)))
    }
}

impl PickProvider for GroundPicker {
    fn pick(&self, camera: &Camera, pointer_ndc: Option<Vector2<f32>>) -> Option<TileCoord> {
        let ray = camera.ray_from_ndc(pointer_ndc?)?;
        self.intersect(&ray)
    }
}

/// Rounds to the nearest integer with halves going towards positive infinity,
/// so `-0.5` becomes `0` and `0.5` becomes `1`.
fn round_half_up(value: f32) -> i32 {
    (value + 0.5).floor() as i32
}
