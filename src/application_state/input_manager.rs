//! # Input Manager
//!
//! This module handles input processing for the application, including:
//! - Keyboard input state tracking, with hold durations
//! - Mouse button, scroll, and pointer tracking
//! - Turning the raw state into one [`ProcessedInputState`] per frame

use std::collections::HashMap;

use web_time::{Duration, Instant};
use winit::{
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use super::input_state::{ButtonState, MouseInput, ProcessedInputState, RawInputState};

const KEY_CODES: [KeyCode; 5] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::KeyS,
    KeyCode::ControlLeft,
    KeyCode::ControlRight,
];

const MOUSE_BUTTONS: [MouseButton; 3] = [MouseButton::Left, MouseButton::Right, MouseButton::Middle];

/// Longest gap between two left presses that still counts as a double click.
const DOUBLE_CLICK_INTERVAL: Duration = Duration::from_millis(400);

/// Pixel scroll distance that changes the zoom by one unit.
const PIXELS_PER_ZOOM_UNIT: f32 = 100.0;

/// Manages the state of all input devices and processes input events.
///
/// Window events only update raw state; the editor reads a snapshot once per frame
/// through [`InputManager::get_and_reset_processed_input`].
#[derive(Debug)]
pub struct InputManager {
    /// Previous state of all tracked keyboard keys
    pub keyboard_inputs_old: HashMap<KeyCode, bool>,
    /// Current state of all tracked keyboard keys
    pub keyboard_inputs_new: HashMap<KeyCode, bool>,
    /// When each currently pressed key or button went down
    pressed_since: HashMap<PressedInput, Instant>,

    /// Current state of mouse inputs
    pub mouse_inputs: MouseInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PressedInput {
    Key(KeyCode),
    Button(MouseButton),
}

impl InputManager {
    /// Creates a new InputManager with every tracked key and button released.
    pub fn new() -> Self {
        let keyboard_inputs_old = KEY_CODES.iter().map(|&key| (key, false)).collect();
        let keyboard_inputs_new = KEY_CODES.iter().map(|&key| (key, false)).collect();

        let mouse_inputs = MouseInput {
            mouse_button_inputs_old: MOUSE_BUTTONS.iter().map(|&button| (button, false)).collect(),
            mouse_button_inputs_new: MOUSE_BUTTONS.iter().map(|&button| (button, false)).collect(),
            mouse_scroll_delta: 0.0,
            pointer_position: None,
            last_left_press: None,
            double_clicked: false,
        };

        Self {
            keyboard_inputs_old,
            keyboard_inputs_new,
            pressed_since: HashMap::new(),
            mouse_inputs,
        }
    }

    /// Updates the old state with the current state to prepare for the next frame.
    pub fn move_old_states(&mut self) {
        for (key, new_state) in self.keyboard_inputs_new.iter() {
            if let Some(old_state) = self.keyboard_inputs_old.get_mut(key) {
                *old_state = *new_state;
            }
        }

        for (button, new_state) in self.mouse_inputs.mouse_button_inputs_new.iter() {
            if let Some(old_state) = self.mouse_inputs.mouse_button_inputs_old.get_mut(button) {
                *old_state = *new_state;
            }
        }
    }

    /// Processes a window event and updates internal input state.
    ///
    /// # Arguments
    /// * `event` - The window event to process
    /// * `now` - When the event was received, used for hold durations
    pub fn intake_input(&mut self, event: &WindowEvent, now: Instant) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state,
                        physical_key: PhysicalKey::Code(key),
                        ..
                    },
                ..
            } => {
                self.set_key(*key, *state == ElementState::Pressed, now);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.intake_scroll(*delta);
            }
            WindowEvent::MouseInput { button, state, .. } => {
                self.set_mouse_button(*button, *state == ElementState::Pressed, now);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_inputs.pointer_position = Some((position.x, position.y));
            }
            WindowEvent::CursorLeft { .. } => {
                self.mouse_inputs.pointer_position = None;
            }
            _ => {}
        }
    }

    /// Records a key going down or up. Untracked keys and key repeats are ignored.
    pub fn set_key(&mut self, key: KeyCode, pressed: bool, now: Instant) {
        if let Some(key_state) = self.keyboard_inputs_new.get_mut(&key) {
            if pressed && !*key_state {
                self.pressed_since.insert(PressedInput::Key(key), now);
            }
            *key_state = pressed;
        }
    }

    /// Records a mouse button going down or up. Untracked buttons are ignored.
    pub fn set_mouse_button(&mut self, button: MouseButton, pressed: bool, now: Instant) {
        let mut left_pressed = false;
        if let Some(button_state) = self.mouse_inputs.mouse_button_inputs_new.get_mut(&button) {
            if pressed && !*button_state {
                self.pressed_since.insert(PressedInput::Button(button), now);
                left_pressed = button == MouseButton::Left;
            }
            *button_state = pressed;
        }
        if left_pressed {
            self.register_left_press(now);
        }
    }

    fn register_left_press(&mut self, now: Instant) {
        let mouse = &mut self.mouse_inputs;
        match mouse.last_left_press {
            Some(previous) if now.saturating_duration_since(previous) <= DOUBLE_CLICK_INTERVAL => {
                mouse.double_clicked = true;
                mouse.last_left_press = None;
            }
            _ => mouse.last_left_press = Some(now),
        }
    }

    /// Accumulates a scroll event as zoom units. Scrolling down zooms out.
    pub fn intake_scroll(&mut self, delta: MouseScrollDelta) {
        let zoom_delta = match delta {
            MouseScrollDelta::LineDelta(_, lines) => -lines,
            MouseScrollDelta::PixelDelta(position) => -(position.y as f32) / PIXELS_PER_ZOOM_UNIT,
        };
        self.mouse_inputs.mouse_scroll_delta += zoom_delta;
    }

    fn button_state(&self, input: PressedInput, previous: bool, current: bool, now: Instant) -> ButtonState {
        let held_for = match (current, self.pressed_since.get(&input)) {
            (true, Some(since)) => now.saturating_duration_since(*since),
            _ => Duration::ZERO,
        };

        ButtonState {
            state: RawInputState::from_raw_states(previous, current),
            held_for,
        }
    }

    /// Creates a processed input state from the current raw states.
    ///
    /// # Arguments
    /// * `now` - The frame time hold durations are measured against
    pub fn create_processed_input_state(&self, now: Instant) -> ProcessedInputState {
        let keyboard_states = self
            .keyboard_inputs_new
            .iter()
            .map(|(&key, &new_state)| {
                let old_state = self.keyboard_inputs_old.get(&key).copied().unwrap_or(false);
                (key, self.button_state(PressedInput::Key(key), old_state, new_state, now))
            })
            .collect();

        let mouse_button_states = self
            .mouse_inputs
            .mouse_button_inputs_new
            .iter()
            .map(|(&button, &new_state)| {
                let old_state = self
                    .mouse_inputs
                    .mouse_button_inputs_old
                    .get(&button)
                    .copied()
                    .unwrap_or(false);
                (
                    button,
                    self.button_state(PressedInput::Button(button), old_state, new_state, now),
                )
            })
            .collect();

        ProcessedInputState {
            keyboard_states,
            mouse_button_states,
            pointer_position: self.mouse_inputs.pointer_position,
            scroll_delta: self.mouse_inputs.mouse_scroll_delta,
            double_clicked: self.mouse_inputs.double_clicked,
        }
    }

    /// Returns this frame's snapshot and prepares the raw state for the next frame.
    pub fn get_and_reset_processed_input(&mut self, now: Instant) -> ProcessedInputState {
        let processed_input = self.create_processed_input_state(now);
        self.reset_inputs();
        processed_input
    }

    /// Ends the frame: current states become previous states and the scroll resets.
    /// The pointer position is kept until the cursor moves or leaves.
    pub fn reset_inputs(&mut self) {
        self.move_old_states();
        self.mouse_inputs.mouse_scroll_delta = 0.0;
        self.mouse_inputs.double_clicked = false;
    }

    /// Releases every key and button, e.g. when the window loses focus, so nothing
    /// stays stuck down.
    pub fn release_all(&mut self) {
        for key_state in self.keyboard_inputs_new.values_mut() {
            *key_state = false;
        }
        for button_state in self.mouse_inputs.mouse_button_inputs_new.values_mut() {
            *button_state = false;
        }
        self.pressed_since.clear();
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use winit::dpi::PhysicalPosition;

    use super::*;

    #[test]
    fn keys_go_through_every_transition() {
        let mut manager = InputManager::new();
        let start = Instant::now();

        manager.set_key(KeyCode::Digit1, true, start);
        let frame = manager.get_and_reset_processed_input(start);
        assert_eq!(frame.get_key_state(KeyCode::Digit1), RawInputState::Pressed);

        let later = start + Duration::from_millis(250);
        let frame = manager.get_and_reset_processed_input(later);
        assert_eq!(frame.get_key_state(KeyCode::Digit1), RawInputState::Held);
        assert_eq!(frame.get_key_hold_duration(KeyCode::Digit1), Duration::from_millis(250));

        manager.set_key(KeyCode::Digit1, false, later);
        let frame = manager.get_and_reset_processed_input(later);
        assert_eq!(frame.get_key_state(KeyCode::Digit1), RawInputState::Released);
        assert_eq!(frame.get_key_hold_duration(KeyCode::Digit1), Duration::ZERO);

        let frame = manager.get_and_reset_processed_input(later);
        assert_eq!(frame.get_key_state(KeyCode::Digit1), RawInputState::NotPressed);
    }

    #[test]
    fn key_repeats_do_not_restart_the_hold_timer() {
        let mut manager = InputManager::new();
        let start = Instant::now();

        manager.set_key(KeyCode::KeyS, true, start);
        manager.set_key(KeyCode::KeyS, true, start + Duration::from_millis(100));

        let frame = manager.get_and_reset_processed_input(start + Duration::from_millis(300));
        assert_eq!(frame.get_key_hold_duration(KeyCode::KeyS), Duration::from_millis(300));
    }

    #[test]
    fn untracked_keys_are_ignored() {
        let mut manager = InputManager::new();
        manager.set_key(KeyCode::KeyQ, true, Instant::now());

        let frame = manager.get_and_reset_processed_input(Instant::now());
        assert_eq!(frame.get_key_state(KeyCode::KeyQ), RawInputState::NotPressed);
    }

    #[test]
    fn scroll_accumulates_per_frame_and_pointer_persists() {
        let mut manager = InputManager::new();
        manager.mouse_inputs.pointer_position = Some((10.0, 20.0));

        manager.intake_scroll(MouseScrollDelta::LineDelta(0.0, -1.0));
        manager.intake_scroll(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 50.0)));

        let frame = manager.get_and_reset_processed_input(Instant::now());
        assert_eq!(frame.scroll_delta(), 0.5);
        assert_eq!(frame.pointer_position(), Some((10.0, 20.0)));

        let frame = manager.get_and_reset_processed_input(Instant::now());
        assert_eq!(frame.scroll_delta(), 0.0);
        assert_eq!(frame.pointer_position(), Some((10.0, 20.0)));
    }

    #[test]
    fn two_quick_left_presses_make_one_double_click() {
        let mut manager = InputManager::new();
        let start = Instant::now();

        manager.set_mouse_button(MouseButton::Left, true, start);
        manager.set_mouse_button(MouseButton::Left, false, start + Duration::from_millis(50));
        assert!(!manager.get_and_reset_processed_input(start).double_clicked());

        manager.set_mouse_button(MouseButton::Left, true, start + Duration::from_millis(200));
        let frame = manager.get_and_reset_processed_input(start + Duration::from_millis(200));
        assert!(frame.double_clicked());

        let frame = manager.get_and_reset_processed_input(start + Duration::from_millis(216));
        assert!(!frame.double_clicked());

        manager.set_mouse_button(MouseButton::Left, false, start + Duration::from_millis(250));
        manager.set_mouse_button(MouseButton::Left, true, start + Duration::from_millis(300));
        assert!(!manager.get_and_reset_processed_input(start).double_clicked());
    }

    #[test]
    fn slow_or_right_presses_are_not_double_clicks() {
        let mut manager = InputManager::new();
        let start = Instant::now();

        manager.set_mouse_button(MouseButton::Left, true, start);
        manager.set_mouse_button(MouseButton::Left, false, start);
        manager.set_mouse_button(MouseButton::Left, true, start + Duration::from_millis(900));
        manager.set_mouse_button(MouseButton::Right, true, start + Duration::from_millis(950));
        manager.set_mouse_button(MouseButton::Right, false, start + Duration::from_millis(960));
        manager.set_mouse_button(MouseButton::Right, true, start + Duration::from_millis(970));

        assert!(!manager.get_and_reset_processed_input(start).double_clicked());
    }

    #[test]
    fn losing_focus_releases_held_buttons() {
        let mut manager = InputManager::new();
        let now = Instant::now();
        manager.set_mouse_button(MouseButton::Left, true, now);
        let frame = manager.get_and_reset_processed_input(now);
        assert!(frame.get_mouse_button_state(MouseButton::Left).is_active());

        manager.release_all();

        let frame = manager.get_and_reset_processed_input(now);
        assert!(frame
            .get_mouse_button_state(MouseButton::Left)
            .is_just_released());
    }
}
