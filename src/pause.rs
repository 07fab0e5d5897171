//! Gameplay execution state
//!
//! Loads must never leave the game paused or with input frozen. The manager
//! receives a [`PauseController`] instead of touching a global flag.

use std::cell::RefCell;
use std::rc::Rc;

/// Capability to force the game back into a running state
pub trait PauseController {
    /// Unpauses, restores normal time scale, hides pause UI
    fn resume_gameplay(&mut self);

    fn set_input_enabled(&mut self, enabled: bool);

    fn is_paused(&self) -> bool;
}

impl<P: PauseController> PauseController for Rc<RefCell<P>> {
    fn resume_gameplay(&mut self) {
        self.borrow_mut().resume_gameplay();
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.borrow_mut().set_input_enabled(enabled);
    }

    fn is_paused(&self) -> bool {
        self.borrow().is_paused()
    }
}

/// Pause state of a running game
#[derive(Debug, Clone, PartialEq)]
pub struct GameplayState {
    pub paused: bool,
    pub time_scale: f32,
    pub cursor_locked: bool,
    pub input_enabled: bool,
    pub pause_menu_open: bool,
}

impl GameplayState {
    pub fn new() -> Self {
        GameplayState {
            paused: false,
            time_scale: 1.0,
            cursor_locked: true,
            input_enabled: true,
            pause_menu_open: false,
        }
    }

    /// Opens the pause menu and freezes time
    pub fn pause(&mut self) {
        self.paused = true;
        self.time_scale = 0.0;
        self.cursor_locked = false;
        self.pause_menu_open = true;
    }
}

impl Default for GameplayState {
    fn default() -> Self {
        Self::new()
    }
}

impl PauseController for GameplayState {
    fn resume_gameplay(&mut self) {
        self.paused = false;
        self.time_scale = 1.0;
        self.cursor_locked = true;
        self.pause_menu_open = false;
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_clears_pause() {
        let mut state = GameplayState::new();
        state.pause();
        assert!(state.is_paused());

        state.resume_gameplay();
        assert_eq!(state, GameplayState::new());
    }
}
