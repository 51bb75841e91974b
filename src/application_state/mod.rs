//! # Application State Management
//!
//! This module hosts the editor inside a winit event loop, including:
//! - Window creation (bound to the page canvas on the web)
//! - Input handling through the poll-based [`InputManager`]
//! - Asynchronous resource loading through the [`ResourceLoader`]
//! - Driving the [`EngineState`] once per frame and saving exports

pub mod input_manager;
pub mod input_state;
pub mod resource_loader;

use std::sync::Arc;

use input_manager::InputManager;
use resource_loader::ResourceLoader;

use web_time::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

use crate::engine_state::{
    config::EditorConfig,
    resources::{Resource, ResourceError, ResourceKey},
    EngineState,
};

/// Time between two editor frames.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Events sent to the event loop from outside of it.
#[derive(Debug)]
pub enum EditorEvent {
    /// A resource load finished
    ResourceLoaded {
        /// The resource that was requested
        key: ResourceKey,
        /// The decoded resource, or why it could not be loaded
        result: Result<Resource, ResourceError>,
    },
}

/// The main application state container that manages the application's lifecycle.
///
/// It holds the editor configuration until the window exists, then the running
/// session. It implements `ApplicationHandler` to handle window and user events.
pub struct ApplicationState {
    /// Settings the session is started with
    pub config: EditorConfig,

    /// Handed to the resource loader so loads can report back
    pub event_loop_proxy: EventLoopProxy<EditorEvent>,

    /// The initialized application state, if the application has started
    pub state: Option<InitializedApplicationState>,
}

/// Represents the fully initialized and running state of the application.
pub struct InitializedApplicationState {
    /// The editing session
    pub engine_state: EngineState,

    /// Handle to the application window
    pub window: Arc<Window>,

    /// Manages input state and event processing
    pub input_manager: InputManager,

    /// Starts resource loads
    pub resource_loader: ResourceLoader,

    /// Timestamp of the last frame for delta time calculations
    pub last_wait_time: Instant,
}

impl ApplicationState {
    /// Creates the host. Nothing happens until the event loop resumes it.
    pub fn new(config: EditorConfig, event_loop_proxy: EventLoopProxy<EditorEvent>) -> Self {
        Self {
            config,
            event_loop_proxy,
            state: None,
        }
    }

    /// Creates the window and starts the session.
    ///
    /// # Arguments
    /// * `event_loop` - The active event loop used to create the window
    fn initialize_application_state(&mut self, event_loop: &ActiveEventLoop) -> Result<(), String> {
        let window = Arc::new(
            event_loop
                .create_window(window_attributes()?)
                .map_err(|err| format!("Failed to create window: {}", err))?,
        );

        let mut engine_state = EngineState::new(self.config.clone(), window.inner_size());
        let resource_loader = ResourceLoader::new(self.event_loop_proxy.clone(), self.config.asset_root.clone());

        for key in engine_state.request_startup_resources() {
            resource_loader.load(key);
        }

        self.state = Some(InitializedApplicationState {
            engine_state,
            window,
            input_manager: InputManager::new(),
            resource_loader,
            last_wait_time: Instant::now(),
        });

        Ok(())
    }
}

#[cfg(not(target_family = "wasm"))]
fn window_attributes() -> Result<winit::window::WindowAttributes, String> {
    Ok(Window::default_attributes().with_title("Kub Editor"))
}

#[cfg(target_family = "wasm")]
fn window_attributes() -> Result<winit::window::WindowAttributes, String> {
    use wasm_bindgen::JsCast;
    use winit::platform::web::WindowAttributesExtWebSys;

    let canvas = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id(crate::CANVAS_ID))
        .ok_or_else(|| format!("No element with id {}", crate::CANVAS_ID))?
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .map_err(|_| format!("Element {} is not a canvas", crate::CANVAS_ID))?;

    Ok(Window::default_attributes().with_canvas(Some(canvas)))
}

fn toggle_fullscreen(window: &Window) {
    if window.fullscreen().is_some() {
        window.set_fullscreen(None);
    } else {
        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
    }
}

impl ApplicationHandler<EditorEvent> for ApplicationState {
    /// Handles window-related events such as resize, focus changes, and input events.
    ///
    /// # Arguments
    /// * `event_loop` - Reference to the active event loop
    /// * `_window_id` - ID of the window that generated the event
    /// * `event` - The window event to process
    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            if matches!(event, WindowEvent::CloseRequested) {
                event_loop.exit();
            }
            return;
        };

        state.input_manager.intake_input(&event, Instant::now());

        match event {
            WindowEvent::Resized(size) => {
                state.engine_state.resize_surface(size);
            }
            WindowEvent::Focused(false) => {
                state.input_manager.release_all();
            }
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            _ => (),
        }
    }

    /// Called when the application is resumed. Creates the window and requests
    /// the startup resources the first time around.
    ///
    /// # Arguments
    /// * `event_loop` - Reference to the active event loop
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        if let Err(err) = self.initialize_application_state(event_loop) {
            log::error!("{}", err);
            event_loop.exit();
        }
    }

    /// Handles finished resource loads.
    ///
    /// # Arguments
    /// * `_event_loop` - Reference to the active event loop
    /// * `event` - The event sent through the proxy
    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: EditorEvent) {
        let Some(state) = &mut self.state else {
            return;
        };

        match event {
            EditorEvent::ResourceLoaded { key, result } => {
                state.engine_state.intake_resource(key, result);
            }
        }
    }

    /// Called before the event loop goes to sleep.
    ///
    /// This is the editor's frame: it drains the input snapshot (a double click
    /// toggles fullscreen), applies it, advances the session, reports scene rebuilds,
    /// saves a pending export, and schedules the next frame.
    ///
    /// # Arguments
    /// * `event_loop` - Reference to the active event loop
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = &mut self.state else {
            return;
        };

        let now = Instant::now();
        let wait_dt = now - state.last_wait_time;

        let processed_input = state.input_manager.get_and_reset_processed_input(now);
        if processed_input.double_clicked() {
            toggle_fullscreen(&state.window);
        }
        state.engine_state.process_input(&processed_input);
        state.engine_state.update(wait_dt);

        if let Some(update) = state.engine_state.take_scene_update() {
            log::debug!(
                "Scene #{}: {} columns, {} leaves, {} instance bytes at scene time {:.2}s",
                update.generation,
                update.tile_instances.len(),
                update.leaf_instances.len(),
                update.byte_len(),
                state.engine_state.time_tracker.elapsed()
            );
        }

        if let Some(export) = state.engine_state.take_export() {
            let path = &state.engine_state.config.export_path;
            if let Err(err) = resource_loader::save_text(path, &export) {
                log::error!("Export failed: {}", err);
            }
        }

        state.last_wait_time = now;
        event_loop.set_control_flow(ControlFlow::WaitUntil(now + FRAME_INTERVAL));
    }
}
