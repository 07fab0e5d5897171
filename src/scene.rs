//! Scene hosting
//!
//! The save system never loads scenes itself. It talks to a [`SceneHost`],
//! which knows the active scene, which scenes can be loaded, how to start an
//! asynchronous load, and which saveable entities are currently live.
//!
//! [`StagedScenes`] is an in-process host: scenes are factories that build
//! their entities, and a load takes a configurable number of frames.

use crate::entity::{EntityBuilder, EntityId, IdRegistry, SaveableEntity};
use crate::save::SaveError;
use std::fmt;
use tracing::{debug, info};

/// The scene-management collaborator
pub trait SceneHost {
    /// Name of the currently active scene
    fn active_scene(&self) -> &str;

    /// Every scene name that can be loaded
    fn loadable_scenes(&self) -> Vec<String>;

    /// Scene names compare case-insensitively
    fn is_loadable(&self, name: &str) -> bool {
        self.loadable_scenes()
            .iter()
            .any(|scene| scene.eq_ignore_ascii_case(name))
    }

    /// Starts loading `name`; completion is reported by [`is_load_complete`](Self::is_load_complete)
    fn begin_load(&mut self, name: &str) -> Result<(), SaveError>;

    /// The scene-ready signal: true once no load is in flight
    fn is_load_complete(&self) -> bool;

    fn entities(&self) -> Box<dyn Iterator<Item = &SaveableEntity> + '_>;

    fn entities_mut(&mut self) -> Box<dyn Iterator<Item = &mut SaveableEntity> + '_>;
}

type SceneFactory = Box<dyn FnMut() -> Vec<SaveableEntity>>;

struct PendingLoad {
    scene: String,
    frames_left: u32,
}

/// Scene host backed by factory closures
pub struct StagedScenes {
    scenes: Vec<(String, SceneFactory)>,
    active: String,
    entities: Vec<SaveableEntity>,
    pending: Option<PendingLoad>,
    load_frames: u32,
    ids: IdRegistry,
    load_history: Vec<String>,
}

impl StagedScenes {
    /// `load_frames` is how many ticks an asynchronous load takes
    pub fn new(load_frames: u32) -> Self {
        StagedScenes {
            scenes: Vec::new(),
            active: String::new(),
            entities: Vec::new(),
            pending: None,
            load_frames,
            ids: IdRegistry::new(),
            load_history: Vec::new(),
        }
    }

    /// Registers a scene. The factory runs on every load of the scene and
    /// must return freshly built entities.
    pub fn add_scene(
        &mut self,
        name: impl Into<String>,
        factory: impl FnMut() -> Vec<SaveableEntity> + 'static,
    ) {
        self.scenes.push((name.into(), Box::new(factory)));
    }

    /// Loads `name` immediately (startup, tests)
    pub fn open(&mut self, name: &str) -> Result<(), SaveError> {
        self.pending = None;
        self.instantiate(name)
    }

    /// Adds a runtime-spawned entity, assigning an identifier if it has none
    pub fn spawn(&mut self, builder: EntityBuilder) -> EntityId {
        let entity = builder.build_with(&mut self.ids);
        let id = entity.id().cloned().unwrap_or_else(EntityId::generate);
        debug!(entity = %entity.name(), id = %id, "Spawned entity");
        self.entities.push(entity);
        id
    }

    /// Removes every live entity named `name`; returns how many were removed
    pub fn despawn(&mut self, name: &str) -> usize {
        let before = self.entities.len();
        self.entities.retain(|e| e.name() != name);
        before - self.entities.len()
    }

    pub fn entity(&self, name: &str) -> Option<&SaveableEntity> {
        self.entities.iter().find(|e| e.name() == name)
    }

    /// Scenes instantiated so far, oldest first
    pub fn load_history(&self) -> &[String] {
        &self.load_history
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Advances one frame: progresses a pending load, then ticks every entity
    pub fn tick(&mut self) -> Result<(), SaveError> {
        if let Some(pending) = &mut self.pending {
            pending.frames_left = pending.frames_left.saturating_sub(1);
            if pending.frames_left == 0 {
                let scene = pending.scene.clone();
                self.pending = None;
                self.instantiate(&scene)?;
            }
        }

        for entity in &mut self.entities {
            entity.tick();
        }
        Ok(())
    }

    fn canonical_name(&self, name: &str) -> Option<String> {
        self.scenes
            .iter()
            .find(|(scene, _)| scene.eq_ignore_ascii_case(name))
            .map(|(scene, _)| scene.clone())
    }

    fn instantiate(&mut self, name: &str) -> Result<(), SaveError> {
        let Some((scene, factory)) = self
            .scenes
            .iter_mut()
            .find(|(scene, _)| scene.eq_ignore_ascii_case(name))
        else {
            return Err(SaveError::SceneUnavailable(name.to_string()));
        };

        let mut entities = factory();
        let scene = scene.clone();
        for entity in &mut entities {
            self.ids.assign_or_get_id(entity);
        }

        info!(scene = %scene, entities = entities.len(), "Scene loaded");
        self.entities = entities;
        self.active = scene.clone();
        self.load_history.push(scene);
        Ok(())
    }
}

impl SceneHost for StagedScenes {
    fn active_scene(&self) -> &str {
        &self.active
    }

    fn loadable_scenes(&self) -> Vec<String> {
        self.scenes.iter().map(|(name, _)| name.clone()).collect()
    }

    fn begin_load(&mut self, name: &str) -> Result<(), SaveError> {
        let scene = self
            .canonical_name(name)
            .ok_or_else(|| SaveError::SceneUnavailable(name.to_string()))?;

        if self.load_frames == 0 {
            return self.instantiate(&scene);
        }

        debug!(scene = %scene, frames = self.load_frames, "Scene load started");
        self.pending = Some(PendingLoad {
            scene,
            frames_left: self.load_frames,
        });
        Ok(())
    }

    fn is_load_complete(&self) -> bool {
        self.pending.is_none()
    }

    fn entities(&self) -> Box<dyn Iterator<Item = &SaveableEntity> + '_> {
        Box::new(self.entities.iter())
    }

    fn entities_mut(&mut self) -> Box<dyn Iterator<Item = &mut SaveableEntity> + '_> {
        Box::new(self.entities.iter_mut())
    }
}

impl fmt::Debug for StagedScenes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedScenes")
            .field("active", &self.active)
            .field("scenes", &self.loadable_scenes())
            .field("entities", &self.entities.len())
            .field("loading", &self.pending.as_ref().map(|p| &p.scene))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> StagedScenes {
        let mut host = StagedScenes::new(2);
        host.add_scene("MainMenu", Vec::new);
        host.add_scene("Level2", || {
            vec![EntityBuilder::new("Crate").with_id("crate-1").build()]
        });
        host
    }

    #[test]
    fn test_load_completes_after_frames() {
        let mut host = host();
        host.open("MainMenu").unwrap();

        host.begin_load("level2").unwrap();
        assert!(!host.is_load_complete());
        assert_eq!(host.active_scene(), "MainMenu");

        host.tick().unwrap();
        assert!(!host.is_load_complete());
        host.tick().unwrap();

        assert!(host.is_load_complete());
        assert_eq!(host.active_scene(), "Level2");
        assert!(host.entity("Crate").is_some());
    }

    #[test]
    fn test_unknown_scene_is_unavailable() {
        let mut host = host();
        assert!(matches!(
            host.begin_load("Level9"),
            Err(SaveError::SceneUnavailable(_))
        ));
        assert!(!host.is_loadable("Level9"));
        assert!(host.is_loadable("MAINMENU"));
    }

    #[test]
    fn test_spawn_assigns_identifier() {
        let mut host = host();
        host.open("MainMenu").unwrap();

        let id = host.spawn(EntityBuilder::new("Player"));

        assert_eq!(host.entity("Player").unwrap().id(), Some(&id));
    }
}
