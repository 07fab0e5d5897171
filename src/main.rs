use puzzle_save::adapters::{SettingsAdapter, ToggleAdapter, TransformAdapter};
use puzzle_save::components::{
    CharacterController, MemoryMixer, Rigidbody, SettingsMenu, Toggle, Transform,
};
use puzzle_save::math::{Quat, Vec3};
use puzzle_save::save::LoadOutcome;
use puzzle_save::{
    EntityBuilder, GameplayState, SaveConfig, SaveManager, SceneHost, StagedScenes,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const FRAME: Duration = Duration::from_millis(16);
const MAX_LOAD_FRAMES: u32 = 600;
const DEMO_SLOT: u8 = 1;

/// Live objects of the demo level
#[derive(Clone)]
struct Level {
    player: Rc<RefCell<Transform>>,
    body: Rc<RefCell<Rigidbody>>,
    controller: Rc<RefCell<CharacterController>>,
    door: Rc<RefCell<Toggle>>,
    settings: Rc<RefCell<SettingsMenu>>,
}

impl Level {
    fn new() -> Self {
        let door = Rc::new(RefCell::new(Toggle::new(false)));
        door.borrow_mut()
            .on_value_changed(|open| info!(open, "Door state changed"));

        Level {
            player: Rc::new(RefCell::new(Transform::new(Vec3::new(0.0, 1.0, 0.0)))),
            body: Rc::new(RefCell::new(Rigidbody::default())),
            controller: Rc::new(RefCell::new(CharacterController::new(0.4, 1.8))),
            door,
            settings: Rc::new(RefCell::new(SettingsMenu::new(MemoryMixer::new()))),
        }
    }

    fn build(&self) -> Vec<puzzle_save::SaveableEntity> {
        *self.player.borrow_mut() = Transform::new(Vec3::new(0.0, 1.0, 0.0));
        vec![
            EntityBuilder::new("Player")
                .with_id("5f0c1a7e2b9d4c3a8e6f1d2c3b4a5968")
                .with_adapter(
                    TransformAdapter::new(&self.player)
                        .with_rigidbody(&self.body)
                        .with_controller(&self.controller),
                )
                .build(),
            EntityBuilder::new("CellarDoor")
                .with_id("0a9b8c7d6e5f40312a3b4c5d6e7f8091")
                .with_adapter(ToggleAdapter::new(&self.door))
                .build(),
            EntityBuilder::new("Settings")
                .with_id("c3d2e1f0a9b8475665a4b3c2d1e0f9a8")
                .with_adapter(SettingsAdapter::new(&self.settings))
                .build(),
        ]
    }
}

fn main() -> Result<(), String> {
    init_tracing();
    info!("=== Save Demo ===");

    let config = match std::env::args().nth(1) {
        Some(path) => SaveConfig::load_from_file(&path)
            .map_err(|e| format!("Failed to load config {}: {}", path, e))?,
        None => SaveConfig::default(),
    };

    let level = Level::new();
    let mut scenes = StagedScenes::new(3);
    scenes.add_scene("MainMenu", Vec::new);
    let level1 = level.clone();
    scenes.add_scene("Level1", move || level1.build());
    scenes.open("Level1").map_err(|e| e.to_string())?;

    let gameplay = Rc::new(RefCell::new(GameplayState::new()));
    let mut manager = SaveManager::new(config, gameplay.clone()).map_err(|e| e.to_string())?;

    // Play a little, then save
    {
        let mut player = level.player.borrow_mut();
        player.set_position_and_rotation(Vec3::new(4.0, 1.0, -2.5), Quat::from_yaw(135.0));
    }
    level.door.borrow_mut().set_is_on(true);
    level.settings.borrow_mut().change_music_volume(0.4);

    manager
        .save_to_slot(DEMO_SLOT, &scenes)
        .map_err(|e| e.to_string())?;
    manager.dump_snapshot(&scenes, "After save");

    // Back to the menu, paused, then load the slot
    gameplay.borrow_mut().pause();
    scenes.open("MainMenu").map_err(|e| e.to_string())?;

    match manager.load_from_slot(DEMO_SLOT, &mut scenes) {
        Ok(LoadOutcome::EmptySlot) => {
            warn!(slot = DEMO_SLOT, "Nothing to load");
            return Ok(());
        }
        Ok(LoadOutcome::Restored(summary)) => info!(%summary, "Loaded in place"),
        Ok(LoadOutcome::Pending) => {
            let mut frames = 0;
            while !manager.is_idle() && frames < MAX_LOAD_FRAMES {
                scenes.tick().map_err(|e| e.to_string())?;
                if let Some(summary) = manager.update(&mut scenes, FRAME) {
                    info!(%summary, frames, "Load finished");
                }
                frames += 1;
            }
            if !manager.is_idle() {
                manager.cancel_load();
                return Err("Load did not finish in time".to_string());
            }
        }
        Err(e) => {
            error!(error = %e, "Load failed");
            return Err(e.to_string());
        }
    }

    // Let deferred restores land
    scenes.tick().map_err(|e| e.to_string())?;

    info!(
        scene = %scenes.active_scene(),
        player = ?level.player.borrow().position(),
        door_open = level.door.borrow().is_on(),
        music = level.settings.borrow().music_volume(),
        paused = gameplay.borrow().paused,
        "Restored state"
    );

    for slot in manager.slot_infos() {
        info!(
            slot = slot.slot,
            scene = %slot.scene_name,
            saved_at = ?slot.saved_at,
            entities = slot.entity_count,
            "Save slot"
        );
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
