use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub const MASTER_VOLUME: &str = "MasterVolume";
pub const MUSIC_VOLUME: &str = "MusicVolume";
pub const SFX_VOLUME: &str = "SFXVolume";

/// Audio mixer exposed parameters
pub trait AudioMixer {
    fn set_float(&mut self, param: &str, value: f32);
    fn get_float(&self, param: &str) -> Option<f32>;
}

impl<M: AudioMixer> AudioMixer for Rc<RefCell<M>> {
    fn set_float(&mut self, param: &str, value: f32) {
        self.borrow_mut().set_float(param, value);
    }

    fn get_float(&self, param: &str) -> Option<f32> {
        self.borrow().get_float(param)
    }
}

/// In-process mixer that keeps its parameters and a log of every write
#[derive(Debug, Default)]
pub struct MemoryMixer {
    params: HashMap<String, f32>,
    writes: Vec<(String, f32)>,
}

impl MemoryMixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> &[(String, f32)] {
        &self.writes
    }
}

impl AudioMixer for MemoryMixer {
    fn set_float(&mut self, param: &str, value: f32) {
        self.params.insert(param.to_string(), value);
        self.writes.push((param.to_string(), value));
    }

    fn get_float(&self, param: &str) -> Option<f32> {
        self.params.get(param).copied()
    }
}

/// Player preferences behind the settings screen
///
/// Every change goes through a `change_*`/`set_*` method so the side effects
/// (mixer writes, quality switch) always happen.
pub struct SettingsMenu {
    quality_levels: Vec<String>,
    graphics_quality: usize,
    master_volume: f32,
    music_volume: f32,
    sfx_volume: f32,
    vibrate: bool,
    brightness: f32,
    sensitivity: f32,
    mixer: Box<dyn AudioMixer>,
}

impl SettingsMenu {
    pub fn new(mixer: impl AudioMixer + 'static) -> Self {
        let mut menu = SettingsMenu {
            quality_levels: ["Low", "Medium", "High", "Ultra"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            graphics_quality: 2,
            master_volume: 0.75,
            music_volume: 0.75,
            sfx_volume: 0.75,
            vibrate: true,
            brightness: 0.0,
            sensitivity: 1.0,
            mixer: Box::new(mixer),
        };

        // Push the defaults into the mixer like the menu does on start
        menu.mixer.set_float(MASTER_VOLUME, menu.master_volume);
        menu.mixer.set_float(MUSIC_VOLUME, menu.music_volume);
        menu.mixer.set_float(SFX_VOLUME, menu.sfx_volume);
        menu
    }

    pub fn quality_levels(&self) -> &[String] {
        &self.quality_levels
    }

    pub fn graphics_quality(&self) -> usize {
        self.graphics_quality
    }

    /// Volume as the mixer reports it, falling back to the last value set
    pub fn master_volume(&self) -> f32 {
        self.mixer.get_float(MASTER_VOLUME).unwrap_or(self.master_volume)
    }

    pub fn music_volume(&self) -> f32 {
        self.mixer.get_float(MUSIC_VOLUME).unwrap_or(self.music_volume)
    }

    pub fn sfx_volume(&self) -> f32 {
        self.mixer.get_float(SFX_VOLUME).unwrap_or(self.sfx_volume)
    }

    pub fn vibrate(&self) -> bool {
        self.vibrate
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    /// Switches graphics quality, clamping to the available levels
    pub fn change_graphics_quality(&mut self, level: i32) {
        let max = self.quality_levels.len().saturating_sub(1) as i32;
        self.graphics_quality = level.clamp(0, max) as usize;
    }

    pub fn change_master_volume(&mut self, value: f32) {
        self.master_volume = value;
        self.mixer.set_float(MASTER_VOLUME, value);
    }

    pub fn change_music_volume(&mut self, value: f32) {
        self.music_volume = value;
        self.mixer.set_float(MUSIC_VOLUME, value);
    }

    pub fn change_sfx_volume(&mut self, value: f32) {
        self.sfx_volume = value;
        self.mixer.set_float(SFX_VOLUME, value);
    }

    pub fn change_vibrate(&mut self, vibrate: bool) {
        self.vibrate = vibrate;
    }

    pub fn set_brightness(&mut self, brightness: f32) {
        self.brightness = brightness;
    }

    pub fn change_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity.max(0.0);
    }
}

impl fmt::Debug for SettingsMenu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsMenu")
            .field("graphics_quality", &self.graphics_quality)
            .field("master_volume", &self.master_volume())
            .field("music_volume", &self.music_volume())
            .field("sfx_volume", &self.sfx_volume())
            .field("vibrate", &self.vibrate)
            .field("brightness", &self.brightness)
            .field("sensitivity", &self.sensitivity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_changes_reach_mixer() {
        let mixer = Rc::new(RefCell::new(MemoryMixer::new()));
        let mut menu = SettingsMenu::new(mixer.clone());

        menu.change_music_volume(0.2);

        assert_eq!(mixer.borrow().get_float(MUSIC_VOLUME), Some(0.2));
        assert_eq!(menu.music_volume(), 0.2);
    }

    #[test]
    fn test_graphics_quality_clamped() {
        let mut menu = SettingsMenu::new(MemoryMixer::new());
        menu.change_graphics_quality(99);
        assert_eq!(menu.graphics_quality(), 3);
        menu.change_graphics_quality(-4);
        assert_eq!(menu.graphics_quality(), 0);
    }
}
