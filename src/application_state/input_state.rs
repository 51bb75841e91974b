//! # Input State
//!
//! This module defines the input state types used by the input manager.
//! A [`ProcessedInputState`] is the per-frame snapshot the editor polls instead of
//! reacting to individual window events.

use std::collections::HashMap;

use web_time::{Duration, Instant};
use winit::{event::MouseButton, keyboard::KeyCode};

/// Represents the state of a key or button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RawInputState {
    /// Key/button is not pressed
    #[default]
    NotPressed,
    /// Key/button was just pressed this frame
    Pressed,
    /// Key/button has been held down for multiple frames
    Held,
    /// Key/button was just released this frame
    Released,
}

impl RawInputState {
    /// Determines if the input is actively down (either pressed or held)
    pub fn is_active(&self) -> bool {
        matches!(self, RawInputState::Pressed | RawInputState::Held)
    }

    /// Determines if the input was just pressed this frame
    pub fn is_just_pressed(&self) -> bool {
        matches!(self, RawInputState::Pressed)
    }

    /// Determines if the input was just released this frame
    pub fn is_just_released(&self) -> bool {
        matches!(self, RawInputState::Released)
    }

    /// Derives the transition from the previous and current raw states
    pub fn from_raw_states(previous: bool, current: bool) -> Self {
        match (previous, current) {
            (false, true) => RawInputState::Pressed,
            (true, true) => RawInputState::Held,
            (true, false) => RawInputState::Released,
            (false, false) => RawInputState::NotPressed,
        }
    }
}

/// A key or button transition together with how long it has been down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonState {
    /// Transition this frame
    pub state: RawInputState,
    /// Time since the press, zero while the input is up
    pub held_for: Duration,
}

/// A snapshot of all tracked inputs for one frame.
#[derive(Debug, Clone, Default)]
pub struct ProcessedInputState {
    /// State of every tracked keyboard key
    pub keyboard_states: HashMap<KeyCode, ButtonState>,

    /// State of every tracked mouse button
    pub mouse_button_states: HashMap<MouseButton, ButtonState>,

    /// Last known pointer position in window pixels, `None` once the cursor left the window
    pub pointer_position: Option<(f64, f64)>,

    /// Scroll accumulated this frame, in zoom units (positive zooms out)
    pub scroll_delta: f32,

    /// Whether the left button was double-clicked since the last frame
    pub double_clicked: bool,
}

impl ProcessedInputState {
    /// Gets the state of a keyboard key
    pub fn get_key_state(&self, key: KeyCode) -> RawInputState {
        self.keyboard_states
            .get(&key)
            .map(|button| button.state)
            .unwrap_or_default()
    }

    /// Gets how long a keyboard key has been held
    pub fn get_key_hold_duration(&self, key: KeyCode) -> Duration {
        self.keyboard_states
            .get(&key)
            .map(|button| button.held_for)
            .unwrap_or_default()
    }

    /// Gets the state of a mouse button
    pub fn get_mouse_button_state(&self, button: MouseButton) -> RawInputState {
        self.mouse_button_states
            .get(&button)
            .map(|button| button.state)
            .unwrap_or_default()
    }

    /// Gets the last known pointer position
    pub fn pointer_position(&self) -> Option<(f64, f64)> {
        self.pointer_position
    }

    /// Gets the scroll accumulated this frame
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }

    /// Whether the left button was double-clicked this frame
    pub fn double_clicked(&self) -> bool {
        self.double_clicked
    }
}

/// Tracks the state of mouse inputs including buttons, scroll, and pointer position.
#[derive(Debug, Default)]
pub struct MouseInput {
    /// Previous state of each mouse button (pressed/released)
    pub mouse_button_inputs_old: HashMap<MouseButton, bool>,
    /// Current state of each mouse button (pressed/released)
    pub mouse_button_inputs_new: HashMap<MouseButton, bool>,

    /// Scroll accumulated since the last frame, in zoom units
    pub mouse_scroll_delta: f32,

    /// Last known pointer position in window pixels
    pub pointer_position: Option<(f64, f64)>,

    /// When the left button last went down, cleared once a double click is seen
    pub last_left_press: Option<Instant>,
    /// A double click waiting to be reported
    pub double_clicked: bool,
}
