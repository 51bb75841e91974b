#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Kub Editor
//!
//! A grid-based 3D map editor. The map is a set of tiles, each a column standing on
//! an integer grid cell, optionally decorated with a bush. The pointer picks a cell
//! on a ground plane; the left button adds a tile (or a bush, in bush mode) and the
//! right button removes one. Every edit rebuilds the scene description of the map.
//!
//! ## Key Modules
//!
//! * `application_state` - The winit host: window, input, resource loading
//! * `engine_state` - The editing session: map, editor, scene, camera, resources
//!
//! ## Usage
//!
//! ```ignore
//! fn main() {
//!     kub_editor::run();
//! }
//! ```
//!
//! For web applications, `run_web()` is exported to JavaScript and binds to the
//! canvas with id `wgpu-canvas`.
//!
//! The map model and editor work without a window:
//!
//! ```
//! use kub_editor::{MapEditor, MapScene, SelectionMode, TileCoord, TileGeometry, TileMap};
//!
//! let mut editor = MapEditor::new(TileMap::new(), MapScene::new(TileGeometry::default()));
//! editor.add_at(Some(TileCoord::new(2, 3)));
//! editor.set_mode(SelectionMode::Bush);
//! editor.add_at(Some(TileCoord::new(2, 3)));
//!
//! assert!(editor.map().find_at(2, 3).unwrap().has_bush);
//! assert_eq!(editor.rebuild_sink().tiles().len(), 1);
//! ```

use application_state::ApplicationState;
#[cfg(target_family = "wasm")]
use wasm_bindgen::prelude::wasm_bindgen;

use winit::event_loop::EventLoop;

mod application_state;
mod engine_state;

pub use application_state::{
    input_manager::InputManager,
    input_state::{ButtonState, ProcessedInputState, RawInputState},
    EditorEvent,
};
pub use engine_state::{
    camera_state::{
        camera::{Camera, CameraConfig, ProjectionConfig, Ray},
        GroundPicker, PickProvider, PickingConfig, Viewport,
    },
    config::{ConfigError, EditorConfig},
    map::{
        editor::{EditOutcome, MapEditor, RebuildSink, SelectionMode},
        MapDataError, Tile, TileCoord, TileMap, DEFAULT_TILE_HEIGHT,
    },
    rendering::{
        instance::InstanceRaw, BushVisual, LeafVisual, MapScene, MaterialKind, SceneUpdate, TileGeometry,
        TileVisual,
    },
    resources::{Resource, ResourceCache, ResourceError, ResourceKey, ResourceKind, ResourceState},
    time_state::TimeTracker,
    EngineState,
};

#[cfg(target_family = "wasm")]
const CANVAS_ID: &str = "wgpu-canvas";

/// Runs the editor in a native window, reading settings from
/// [`EditorConfig::FILE_NAME`] when present.
#[cfg(not(target_family = "wasm"))]
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    log::info!("Logger initialized");
    let config = EditorConfig::load_or_default(EditorConfig::FILE_NAME);

    let event_loop = match EventLoop::with_user_event().build() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("Failed to create event loop: {}", err);
            return;
        }
    };

    let mut state = ApplicationState::new(config, event_loop.create_proxy());

    if let Err(err) = event_loop.run_app(&mut state) {
        log::error!("Event loop stopped: {}", err);
    }
}

/// Runs the editor inside the page, bound to the `wgpu-canvas` element.
#[cfg(target_family = "wasm")]
#[wasm_bindgen]
pub fn run_web() {
    use winit::platform::web::EventLoopExtWebSys;

    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    if let Err(err) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::error_1(&format!("Couldn't initialize logger: {}", err).into());
    }

    let event_loop = match EventLoop::with_user_event().build() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("Failed to create event loop: {}", err);
            return;
        }
    };

    let state = ApplicationState::new(EditorConfig::default(), event_loop.create_proxy());

    event_loop.spawn_app(state);
}
