//! # Engine State Module
//!
//! The editing session. Selection mode, resource caches and scene time all live in
//! one [`EngineState`] owned by the host.
//!
//! ## Key Components
//!
//! * `EngineState` - The session object driven once per frame
//! * `map` - Tile map data and the editor that mutates it
//! * `rendering` - The scene rebuilt after every edit
//! * `camera_state` - Camera, viewport and ground picking
//! * `resources` - Keyed cache of asynchronously loaded assets
//! * `config` - Session settings
//! * `time_state` - Scene time
//!
//! ## Frame Order
//!
//! The host calls [`EngineState::process_input`] with the frame's input snapshot,
//! then [`EngineState::update`]. Edits made while processing input are therefore
//! visible to the highlight pass of the same frame.

use web_time::Duration;
use winit::{event::MouseButton, keyboard::KeyCode};

use camera_state::{camera::Camera, GroundPicker, PickProvider, Viewport};
use config::EditorConfig;
use map::{
    editor::{MapEditor, SelectionMode},
    TileCoord, TileMap,
};
use rendering::{MapScene, SceneUpdate};
use resources::{Resource, ResourceCache, ResourceError, ResourceKey, ResourceState};
use time_state::TimeTracker;

use crate::application_state::input_state::ProcessedInputState;

pub mod camera_state;
pub mod config;
pub mod map;
pub mod rendering;
pub mod resources;
pub mod time_state;

/// Keys that select a mode, paired with the mode command they issue.
const MODE_KEYS: [(KeyCode, &str); 2] = [(KeyCode::Digit1, "1"), (KeyCode::Digit2, "2")];

/// The state of one editing session.
pub struct EngineState {
    /// Session settings
    pub config: EditorConfig,
    /// The editor camera
    pub camera: Camera,
    /// Canvas placement inside the window
    pub viewport: Viewport,
    /// Turns the pointer into a grid cell
    pub picker: GroundPicker,
    /// The map editor and, through it, the scene
    pub editor: MapEditor<MapScene>,
    /// Every loaded or loading asset
    pub resources: ResourceCache,
    /// Scene time for animated materials
    pub time_tracker: TimeTracker,
    /// Last known pointer position in window pixels
    pointer_position: Option<(f64, f64)>,
    /// Serialized map waiting to be written by the host
    pending_export: Option<String>,
    /// Last scene generation handed out by `take_scene_update`
    presented_generation: u64,
}

impl EngineState {
    /// Starts a session with an empty map. The configured map is hydrated once it
    /// finishes loading, see [`EngineState::intake_resource`].
    ///
    /// # Arguments
    ///
    /// * `config` - Session settings
    /// * `window_size` - Current inner size of the window
    pub fn new(config: EditorConfig, window_size: winit::dpi::PhysicalSize<u32>) -> Self {
        let camera = Camera::new(&config.camera);
        let viewport = Viewport::fit(window_size, camera.aspect);
        let picker = GroundPicker::new(&config.picking);
        let editor = MapEditor::new(TileMap::new(), MapScene::new(config.tiles.clone()));
        let time_tracker = TimeTracker::new(config.time_speed);

        Self {
            config,
            camera,
            viewport,
            picker,
            editor,
            resources: ResourceCache::new(),
            time_tracker,
            pointer_position: None,
            pending_export: None,
            presented_generation: 0,
        }
    }

    /// Registers the map and every preloaded resource with the cache.
    ///
    /// # Returns
    ///
    /// The keys that were not requested before; the host must start loading them.
    pub fn request_startup_resources(&mut self) -> Vec<ResourceKey> {
        let keys: Vec<ResourceKey> = std::iter::once(self.config.map_key())
            .chain(self.config.preload.iter().cloned())
            .collect();

        keys.into_iter()
            .filter(|key| self.resources.request(key.clone()))
            .collect()
    }

    /// Refits the canvas when the window size changes.
    pub fn resize_surface(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        self.viewport = Viewport::fit(size, self.camera.aspect);
        log::debug!("Canvas resized to {:?}", self.viewport.canvas_size());
    }

    /// The cell under the pointer, if any.
    pub fn current_pick(&self) -> Option<TileCoord> {
        let pointer_ndc = self
            .pointer_position
            .and_then(|position| self.viewport.to_ndc(position));
        self.picker.pick(&self.camera, pointer_ndc)
    }

    /// The active selection mode.
    pub fn selection_mode(&self) -> SelectionMode {
        self.editor.mode()
    }

    /// Applies one frame of input.
    ///
    /// * `1` / `2` switch between tile and bush mode
    /// * `Ctrl+S` queues an export of the map
    /// * The scroll wheel zooms
    /// * Holding the left button adds at the pointer, holding the right button removes
    ///
    /// Edits are ignored while the startup map is still loading, so the loaded map
    /// never overwrites tiles placed in the meantime.
    pub fn process_input(&mut self, input: &ProcessedInputState) {
        self.pointer_position = input.pointer_position();

        for (key, command) in MODE_KEYS {
            if input.get_key_state(key).is_just_pressed() {
                if let Some(mode) = SelectionMode::from_key(command) {
                    self.editor.set_mode(mode);
                }
            }
        }

        let ctrl_held = input.get_key_state(KeyCode::ControlLeft).is_active()
            || input.get_key_state(KeyCode::ControlRight).is_active();
        if ctrl_held && input.get_key_state(KeyCode::KeyS).is_just_pressed() {
            self.queue_export();
        }

        if input.scroll_delta() != 0.0 {
            self.camera.add_zoom(input.scroll_delta());
        }

        if self.is_map_loading() {
            return;
        }

        let adding = input.get_mouse_button_state(MouseButton::Left).is_active();
        let removing = input.get_mouse_button_state(MouseButton::Right).is_active();
        match (adding, removing) {
            (true, false) => {
                let pick = self.current_pick();
                self.editor.add_at(pick);
            }
            (false, true) => {
                let pick = self.current_pick();
                self.editor.remove_at(pick);
            }
            _ => {}
        }
    }

    /// Whether the startup map has been requested and has not settled yet.
    pub fn is_map_loading(&self) -> bool {
        matches!(
            self.resources.state(&self.config.map_key()),
            Some(ResourceState::Pending)
        )
    }

    /// Per-frame update: starts scene time once loading is done and refreshes the
    /// hover highlight.
    pub fn update(&mut self, dt: Duration) {
        if !self.time_tracker.is_enabled() && self.resources.progress() >= 1.0 {
            log::info!("Loading complete");
            self.time_tracker.enable();
        }
        self.time_tracker.advance(dt);

        let pick = self.current_pick();
        self.editor.rebuild_sink_mut().update_highlight(pick);
    }

    /// Settles a finished load. A successfully loaded map replaces the edited one.
    pub fn intake_resource(&mut self, key: ResourceKey, result: Result<Resource, ResourceError>) {
        let is_map = key == self.config.map_key();
        self.resources.complete(key.clone(), result);

        if !is_map {
            return;
        }
        if let Some(Resource::MapData(map)) = self.resources.get(&key) {
            let map = map.clone();
            self.editor.replace_map(map);
        }
    }

    fn queue_export(&mut self) {
        match self.editor.map().to_json_pretty() {
            Ok(json) => self.pending_export = Some(json),
            Err(err) => log::error!("Failed to serialize map: {}", err),
        }
    }

    /// Instance data of the scene if it was rebuilt since the last call.
    ///
    /// Hover changes are not rebuilds; a renderer reads the material of the
    /// hovered column from [`MapScene::tiles`] every frame.
    pub fn take_scene_update(&mut self) -> Option<SceneUpdate> {
        let scene = self.editor.rebuild_sink();
        if scene.generation() == self.presented_generation {
            return None;
        }
        self.presented_generation = scene.generation();
        Some(scene.scene_update())
    }

    /// Takes the serialized map queued by the last `Ctrl+S`, if any.
    pub fn take_export(&mut self) -> Option<String> {
        self.pending_export.take()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use winit::dpi::PhysicalSize;

    use super::*;
    use crate::application_state::input_state::{ButtonState, RawInputState};

    const WINDOW: PhysicalSize<u32> = PhysicalSize::new(1600, 900);

    /// Pixel position that the default camera projects onto cell (-1, -1).
    const CENTER: (f64, f64) = (800.0, 450.0);

    fn engine() -> EngineState {
        EngineState::new(EditorConfig::default(), WINDOW)
    }

    fn pressed(state: RawInputState) -> ButtonState {
        ButtonState {
            state,
            held_for: Duration::ZERO,
        }
    }

    fn input(keys: &[(KeyCode, RawInputState)], buttons: &[(MouseButton, RawInputState)]) -> ProcessedInputState {
        ProcessedInputState {
            keyboard_states: keys.iter().map(|&(key, state)| (key, pressed(state))).collect(),
            mouse_button_states: buttons
                .iter()
                .map(|&(button, state)| (button, pressed(state)))
                .collect::<HashMap<_, _>>(),
            pointer_position: Some(CENTER),
            scroll_delta: 0.0,
            double_clicked: false,
        }
    }

    #[test]
    fn left_button_adds_and_right_button_removes_under_the_pointer() {
        let mut engine = engine();

        engine.process_input(&input(&[], &[(MouseButton::Left, RawInputState::Pressed)]));
        assert!(engine.editor.map().contains(-1, -1));

        engine.process_input(&input(&[], &[(MouseButton::Right, RawInputState::Held)]));
        assert!(engine.editor.map().is_empty());
    }

    #[test]
    fn both_buttons_at_once_do_nothing() {
        let mut engine = engine();

        engine.process_input(&input(
            &[],
            &[
                (MouseButton::Left, RawInputState::Held),
                (MouseButton::Right, RawInputState::Held),
            ],
        ));

        assert!(engine.editor.map().is_empty());
    }

    #[test]
    fn number_keys_switch_mode_on_press_only() {
        let mut engine = engine();

        engine.process_input(&input(&[(KeyCode::Digit2, RawInputState::Pressed)], &[]));
        assert_eq!(engine.selection_mode(), SelectionMode::Bush);

        engine.process_input(&input(&[(KeyCode::Digit1, RawInputState::Held)], &[]));
        assert_eq!(engine.selection_mode(), SelectionMode::Bush);

        engine.process_input(&input(&[(KeyCode::Digit1, RawInputState::Pressed)], &[]));
        assert_eq!(engine.selection_mode(), SelectionMode::Tile);
    }

    #[test]
    fn ctrl_s_queues_one_export() {
        let mut engine = engine();
        engine.process_input(&input(&[], &[(MouseButton::Left, RawInputState::Pressed)]));

        engine.process_input(&input(
            &[
                (KeyCode::ControlLeft, RawInputState::Held),
                (KeyCode::KeyS, RawInputState::Pressed),
            ],
            &[],
        ));

        let export = engine.take_export().unwrap();
        assert_eq!(TileMap::from_json(&export).unwrap(), *engine.editor.map());
        assert!(engine.take_export().is_none());
    }

    #[test]
    fn scrolling_zooms_the_camera() {
        let mut engine = engine();
        let mut scroll = input(&[], &[]);
        scroll.scroll_delta = 2.5;

        engine.process_input(&scroll);

        assert_eq!(engine.camera.zoom(), 12.5);
    }

    #[test]
    fn update_highlights_the_tile_under_the_pointer() {
        let mut engine = engine();
        engine.process_input(&input(&[], &[(MouseButton::Left, RawInputState::Pressed)]));

        engine.update(Duration::from_millis(16));

        let scene = engine.editor.rebuild_sink();
        assert_eq!(scene.tiles()[0].material, rendering::MaterialKind::HoveredToon);
    }

    #[test]
    fn loading_the_map_hydrates_the_editor_and_starts_time() {
        let mut engine = engine();
        let requested = engine.request_startup_resources();
        assert_eq!(requested.len(), 5);
        assert!(engine.request_startup_resources().is_empty());

        engine.update(Duration::from_millis(16));
        assert!(!engine.time_tracker.is_enabled());

        let map = TileMap::from_json(r#"[{"x": 3, "y": 4, "height": 2, "hasBush": true}]"#).unwrap();
        for key in requested {
            let result = if key == engine.config.map_key() {
                Ok(Resource::MapData(map.clone()))
            } else {
                Ok(Resource::Bytes(Vec::new()))
            };
            engine.intake_resource(key, result);
        }

        assert_eq!(engine.editor.map(), &map);
        engine.update(Duration::from_millis(16));
        assert!(engine.time_tracker.is_enabled());
    }

    #[test]
    fn scene_updates_follow_rebuilds_only() {
        let mut engine = engine();
        let initial = engine.take_scene_update().unwrap();
        assert!(initial.tile_instances.is_empty());
        assert!(engine.take_scene_update().is_none());

        engine.process_input(&input(&[], &[(MouseButton::Left, RawInputState::Pressed)]));
        engine.update(Duration::from_millis(16));

        let update = engine.take_scene_update().unwrap();
        assert_eq!(update.tile_instances.len(), 1);
        assert!(engine.take_scene_update().is_none());
    }

    #[test]
    fn edits_wait_for_the_startup_map() {
        let mut engine = engine();
        engine.request_startup_resources();
        assert!(engine.is_map_loading());

        engine.process_input(&input(&[], &[(MouseButton::Left, RawInputState::Pressed)]));
        assert!(engine.editor.map().is_empty());

        let map = TileMap::from_json(r#"[{"x": 9, "y": 9, "height": 1}]"#).unwrap();
        engine.intake_resource(engine.config.map_key(), Ok(Resource::MapData(map)));
        assert!(!engine.is_map_loading());

        engine.process_input(&input(&[], &[(MouseButton::Left, RawInputState::Held)]));
        assert!(engine.editor.map().contains(9, 9));
        assert!(engine.editor.map().contains(-1, -1));
    }

    #[test]
    fn a_failed_map_load_unlocks_editing_on_an_empty_map() {
        let mut engine = engine();
        engine.request_startup_resources();

        let key = engine.config.map_key();
        engine.intake_resource(
            key,
            Err(ResourceError::Fetch {
                url: "gameData.json".to_string(),
                message: "404".to_string(),
            }),
        );
        engine.process_input(&input(&[], &[(MouseButton::Left, RawInputState::Pressed)]));

        assert_eq!(engine.editor.map().len(), 1);
    }
}
