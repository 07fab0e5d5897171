use super::ensure_finite;
use crate::components::SettingsMenu;
use crate::save::{SaveAdapter, SaveError};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Every player preference, saved and restored as one unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsState {
    pub graphics_quality: i32,
    pub master_vol: f32,
    pub music_vol: f32,
    pub sfx_vol: f32,
    pub vibrate: bool,
    pub brightness: f32,
    pub sensitivity: f32,
}

/// Saves the settings menu
///
/// Restore goes through the menu's own setters so mixer writes and the
/// quality switch happen exactly as if the player had changed them.
pub struct SettingsAdapter {
    menu: Weak<RefCell<SettingsMenu>>,
}

impl SettingsAdapter {
    pub fn new(menu: &Rc<RefCell<SettingsMenu>>) -> Self {
        SettingsAdapter {
            menu: Rc::downgrade(menu),
        }
    }
}

impl SaveAdapter for SettingsAdapter {
    type State = SettingsState;
    const TYPE_TAG: &'static str = "puzzle_save::adapters::SettingsAdapter";

    fn capture_state(&self) -> Option<SettingsState> {
        let menu = self.menu.upgrade()?;
        let m = menu.borrow();

        Some(SettingsState {
            graphics_quality: m.graphics_quality() as i32,
            master_vol: m.master_volume(),
            music_vol: m.music_volume(),
            sfx_vol: m.sfx_volume(),
            vibrate: m.vibrate(),
            brightness: m.brightness(),
            sensitivity: m.sensitivity(),
        })
    }

    fn restore_state(&mut self, state: SettingsState) -> Result<(), SaveError> {
        ensure_finite(
            Self::TYPE_TAG,
            "volume",
            &[
                state.master_vol,
                state.music_vol,
                state.sfx_vol,
                state.brightness,
                state.sensitivity,
            ],
        )?;

        let Some(menu) = self.menu.upgrade() else {
            return Ok(());
        };
        let mut m = menu.borrow_mut();
        m.change_graphics_quality(state.graphics_quality);
        m.change_master_volume(state.master_vol);
        m.change_music_volume(state.music_vol);
        m.change_sfx_volume(state.sfx_vol);
        m.change_vibrate(state.vibrate);
        m.set_brightness(state.brightness);
        m.change_sensitivity(state.sensitivity);
        Ok(())
    }
}
