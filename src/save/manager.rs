//! Save manager: capture, persist and restore a scene's saveable entities
//!
//! Saving is synchronous: walk the live entities, capture every adapter,
//! write the file. Loading is a small state machine driven by [`SaveManager::update`]
//! once per frame, because it may have to wait for a scene load:
//!
//! ```text
//! Idle -> Restoring(SceneLoading) -> Restoring(EntityBinding)
//!      -> Restoring(AdapterApply) -> [Restoring(AwaitingReady)] -> Idle
//! ```
//!
//! Any failure returns the manager to `Idle` with gameplay unpaused.

use super::saveable::Saveable;
use super::store::SlotStore;
use super::types::*;
use crate::config::SaveConfig;
use crate::entity::{self, EntityId, SaveableEntity};
use crate::pause::PauseController;
use crate::scene::SceneHost;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestorePhase {
    /// Waiting for the host's scene-ready signal
    SceneLoading,
    /// Scene is ready; entities are bound on the next update
    EntityBinding,
    AdapterApply,
    /// Records applied; waiting for the ready entity before enabling input
    AwaitingReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Idle,
    Capturing,
    Restoring(RestorePhase),
}

/// Result of starting a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing saved in the slot; no state was touched
    EmptySlot,
    /// The restore continues in [`SaveManager::update`]
    Pending,
    /// The restore finished within the call
    Restored(RestoreSummary),
}

/// Menu-facing description of an occupied slot
#[derive(Debug, Clone, PartialEq)]
pub struct SlotInfo {
    pub slot: u8,
    pub scene_name: String,
    pub saved_at: Option<DateTime<Utc>>,
    pub entity_count: usize,
}

struct PendingRestore {
    slot: u8,
    file: SaveFile,
    waited: Duration,
    summary: RestoreSummary,
}

pub struct SaveManager {
    config: SaveConfig,
    store: SlotStore,
    pause: Box<dyn PauseController>,
    state: ManagerState,
    pending: Option<PendingRestore>,
    last_summary: Option<RestoreSummary>,
}

impl SaveManager {
    /// Creates a manager writing to the configured save directory
    pub fn new(config: SaveConfig, pause: impl PauseController + 'static) -> Result<Self, SaveError> {
        config.validate()?;
        let store = SlotStore::from_config(&config);
        info!(directory = %store.directory().display(), slots = config.slot_count, "Save manager ready");

        Ok(SaveManager {
            config,
            store,
            pause: Box::new(pause),
            state: ManagerState::Idle,
            pending: None,
            last_summary: None,
        })
    }

    pub fn config(&self) -> &SaveConfig {
        &self.config
    }

    pub fn store(&self) -> &SlotStore {
        &self.store
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == ManagerState::Idle
    }

    /// Summary of the most recently completed restore
    pub fn last_summary(&self) -> Option<RestoreSummary> {
        self.last_summary
    }

    pub fn slot_path(&self, slot: u8) -> PathBuf {
        self.store.path_for(self.config.clamp_slot(slot))
    }

    // ===== Save =====

    /// Captures the live scene and writes it to `slot`
    ///
    /// Nothing is written unless the whole capture succeeds.
    pub fn save_to_slot(&mut self, slot: u8, host: &dyn SceneHost) -> Result<PathBuf, SaveError> {
        if !self.is_idle() {
            warn!(slot, "Save refused while a load is in progress");
            return Err(SaveError::LoadInProgress);
        }

        let slot = self.config.clamp_slot(slot);
        self.state = ManagerState::Capturing;
        let result = self.capture(host).and_then(|file| {
            let json = file.to_json()?;
            let path = self.store.write(slot, &json)?;
            Ok((file, path))
        });
        self.state = ManagerState::Idle;

        match result {
            Ok((file, path)) => {
                info!(
                    slot,
                    path = %path.display(),
                    scene = %file.scene_name,
                    entries = file.entries.len(),
                    "Saved slot"
                );
                Ok(path)
            }
            Err(e) => {
                error!(slot, error = %e, "Save failed");
                Err(e)
            }
        }
    }

    /// Builds a save file from every identified entity in the active scene
    ///
    /// Entities whose adapters all capture nothing are left out.
    pub fn capture(&self, host: &dyn SceneHost) -> Result<SaveFile, SaveError> {
        let mut file = SaveFile::new(host.active_scene());

        for (id, entity) in entity::live(host.entities()) {
            if entity.adapters().is_empty() {
                continue;
            }

            let mut record = EntityRecord {
                id: id.clone(),
                name: entity.name().to_string(),
                components: Vec::new(),
            };

            for adapter in entity.adapters() {
                match adapter.capture()? {
                    Some(component) => record.components.push(component),
                    None => debug!(entity = %entity.name(), adapter = adapter.type_tag(), "Adapter captured nothing, skipping"),
                }
            }

            if !record.components.is_empty() {
                file.entries.push(record);
            }
        }

        debug!(scene = %file.scene_name, entries = file.entries.len(), "Capture complete");
        Ok(file)
    }

    // ===== Load =====

    /// Starts restoring `slot`
    ///
    /// Returns `EmptySlot` for a never-saved slot without touching anything.
    /// If the save belongs to another scene, a scene load is started and the
    /// restore continues in [`update`](Self::update) once the scene is ready.
    pub fn load_from_slot(&mut self, slot: u8, host: &mut dyn SceneHost) -> Result<LoadOutcome, SaveError> {
        if !self.is_idle() {
            warn!(slot, "Load refused while another load is in progress");
            return Err(SaveError::LoadInProgress);
        }

        let slot = self.config.clamp_slot(slot);
        let file = match self.read_slot(slot) {
            Ok(file) => file,
            Err(SaveError::EmptySlot(_)) => {
                info!(slot, path = %self.store.path_for(slot).display(), "No save found in slot");
                return Ok(LoadOutcome::EmptySlot);
            }
            Err(e) => {
                error!(slot, error = %e, "Load failed");
                return Err(e);
            }
        };

        let current = host.active_scene().to_string();
        let needs_scene_load = !file.scene_name.is_empty() && file.scene_name != current;
        if needs_scene_load && !host.is_loadable(&file.scene_name) {
            error!(slot, scene = %file.scene_name, "Saved scene is not loadable");
            return Err(SaveError::SceneUnavailable(file.scene_name));
        }

        info!(
            slot,
            scene = %file.scene_name,
            entries = file.entries.len(),
            "Loading slot"
        );

        // Never carry a paused game into a restore
        self.pause.resume_gameplay();
        self.pause.set_input_enabled(false);

        let scene_name = file.scene_name.clone();
        self.pending = Some(PendingRestore {
            slot,
            file,
            waited: Duration::ZERO,
            summary: RestoreSummary::default(),
        });

        if needs_scene_load {
            info!(scene = %scene_name, from = %current, "Loading saved scene");
            if let Err(e) = host.begin_load(&scene_name) {
                error!(slot, scene = %scene_name, error = %e, "Scene load failed to start");
                self.pending = None;
                self.finish();
                return Err(e);
            }
            self.state = ManagerState::Restoring(RestorePhase::SceneLoading);
            return Ok(LoadOutcome::Pending);
        }

        debug!(scene = %current, "Scene already active, restoring in place");
        self.state = ManagerState::Restoring(RestorePhase::EntityBinding);
        Ok(match self.bind_and_apply(host) {
            Some(summary) => LoadOutcome::Restored(summary),
            None => LoadOutcome::Pending,
        })
    }

    /// Advances an in-flight load by one frame
    ///
    /// Returns the restore summary on the frame the load completes.
    pub fn update(&mut self, host: &mut dyn SceneHost, dt: Duration) -> Option<RestoreSummary> {
        match self.state {
            ManagerState::Restoring(RestorePhase::SceneLoading) => {
                if host.is_load_complete() {
                    // Give the new scene one frame to initialize before binding
                    self.state = ManagerState::Restoring(RestorePhase::EntityBinding);
                }
                None
            }
            ManagerState::Restoring(RestorePhase::EntityBinding) => {
                self.pause.resume_gameplay();
                self.bind_and_apply(host)
            }
            ManagerState::Restoring(RestorePhase::AwaitingReady) => {
                let ready = self.ready_entity_present(host);
                let timeout = self.config.ready_timeout();
                let Some(pending) = self.pending.as_mut() else {
                    return self.finish();
                };
                pending.waited += dt;

                if !ready && pending.waited < timeout {
                    return None;
                }
                if !ready {
                    warn!(
                        slot = pending.slot,
                        entity = ?self.config.ready_entity,
                        "Ready entity never appeared, enabling input anyway"
                    );
                }
                self.finish()
            }
            _ => None,
        }
    }

    /// Abandons an in-flight load, leaving the game unpaused and playable
    pub fn cancel_load(&mut self) {
        if let ManagerState::Restoring(phase) = self.state {
            warn!(?phase, "Load cancelled");
            self.pending = None;
            self.finish();
        }
    }

    // ===== Slots =====

    pub fn delete_slot(&mut self, slot: u8) -> Result<(), SaveError> {
        let slot = self.config.clamp_slot(slot);
        match self.store.delete(slot) {
            Ok(true) => info!(slot, "Deleted slot"),
            Ok(false) => debug!(slot, "Slot already empty"),
            Err(e) => {
                error!(slot, error = %e, "Delete failed");
                return Err(e);
            }
        }
        Ok(())
    }

    pub fn slot_exists(&self, slot: u8) -> bool {
        self.store.exists(self.config.clamp_slot(slot))
    }

    /// When the slot was saved; `None` for empty or unreadable slots
    pub fn get_slot_saved_time(&self, slot: u8) -> Option<DateTime<Utc>> {
        let slot = self.config.clamp_slot(slot);
        match self.read_slot(slot) {
            Ok(file) => file.saved_at(),
            Err(e) if !e.is_fatal() => None,
            Err(e) => {
                warn!(slot, error = %e, "Could not read slot time");
                None
            }
        }
    }

    /// Every readable occupied slot, in slot order
    pub fn slot_infos(&self) -> Vec<SlotInfo> {
        (1..=self.config.slot_count)
            .filter_map(|slot| match self.read_slot(slot) {
                Ok(file) => Some(SlotInfo {
                    slot,
                    scene_name: file.scene_name.clone(),
                    saved_at: file.saved_at(),
                    entity_count: file.entries.len(),
                }),
                Err(e) if !e.is_fatal() => None,
                Err(e) => {
                    warn!(slot, error = %e, "Skipping unreadable slot");
                    None
                }
            })
            .collect()
    }

    /// Deletes every slot file; returns how many existed
    pub fn clear_all(&mut self) -> Result<usize, SaveError> {
        let mut deleted = 0;
        for slot in 1..=self.config.slot_count {
            if self.store.delete(slot)? {
                deleted += 1;
            }
        }
        info!(deleted, directory = %self.store.directory().display(), "Cleared save slots");
        Ok(deleted)
    }

    /// Logs every live entity with its identifier and adapters
    pub fn dump_snapshot(&self, host: &dyn SceneHost, label: &str) {
        let total = host.entities().count();
        let with_adapters = host.entities().filter(|e| !e.adapters().is_empty()).count();
        info!(
            label,
            scene = %host.active_scene(),
            entities = total,
            with_adapters,
            directory = %self.store.directory().display(),
            "Snapshot"
        );
        for entity in host.entities() {
            info!(
                entity = %entity.name(),
                id = %entity.id().map(EntityId::as_str).unwrap_or("<none>"),
                adapters = ?entity.adapter_tags(),
                "  entity"
            );
        }
    }

    // ===== Internals =====

    /// Reads and validates a slot's save file
    fn read_slot(&self, slot: u8) -> Result<SaveFile, SaveError> {
        let blob = match self.store.read(slot)? {
            Some(blob) if !blob.trim().is_empty() => blob,
            _ => return Err(SaveError::EmptySlot(slot)),
        };

        let file = SaveFile::from_json(&blob).map_err(|e| SaveError::CorruptSave {
            slot,
            reason: e.to_string(),
        })?;

        if !self
            .config
            .version_policy
            .accepts(&file.version, CURRENT_SAVE_VERSION)
        {
            return Err(SaveError::InvalidVersion(file.version));
        }
        Ok(file)
    }

    /// Binds the fresh scene's entities and applies every record
    ///
    /// Returns the summary if the load is complete, `None` if it now waits for
    /// the ready entity.
    fn bind_and_apply(&mut self, host: &mut dyn SceneHost) -> Option<RestoreSummary> {
        let Some(pending) = self.pending.take() else {
            self.finish();
            return None;
        };

        self.state = ManagerState::Restoring(RestorePhase::AdapterApply);
        let summary = restore_entries(&pending.file, host);
        info!(slot = pending.slot, %summary, "Restore summary");

        self.pending = Some(PendingRestore { summary, ..pending });
        if self.config.ready_entity.is_some() && !self.ready_entity_present(host) {
            self.state = ManagerState::Restoring(RestorePhase::AwaitingReady);
            return None;
        }
        self.finish()
    }

    fn ready_entity_present(&self, host: &dyn SceneHost) -> bool {
        match &self.config.ready_entity {
            Some(name) => host.entities().any(|e| e.name() == name),
            None => true,
        }
    }

    /// Returns to `Idle` with gameplay running
    fn finish(&mut self) -> Option<RestoreSummary> {
        self.pause.resume_gameplay();
        self.pause.set_input_enabled(true);
        self.state = ManagerState::Idle;

        let summary = self.pending.take().map(|p| p.summary);
        if summary.is_some() {
            self.last_summary = summary;
        }
        summary
    }
}

/// Applies `file`'s records to the host's live entities
///
/// Missing entities, missing components and failing adapters are counted and
/// logged; none of them stops the rest of the restore.
fn restore_entries(file: &SaveFile, host: &mut dyn SceneHost) -> RestoreSummary {
    let mut summary = RestoreSummary::default();

    let mut lookup: HashMap<EntityId, &mut SaveableEntity> = HashMap::new();
    for entity in host.entities_mut() {
        let Some(id) = entity.id().cloned() else {
            continue;
        };
        if lookup.contains_key(&id) {
            summary.duplicate_ids += 1;
            warn!(id = %id, entity = %entity.name(), "Duplicate entity id, keeping first match");
            continue;
        }
        lookup.insert(id, entity);
    }

    debug!(entries = file.entries.len(), live = lookup.len(), "Restoring entries");

    for entry in &file.entries {
        let Some(entity) = lookup.get_mut(&entry.id) else {
            let e = SaveError::MissingEntity(entry.id.clone());
            warn!(name_hint = %entry.name, components = entry.components.len(), "{e}");
            summary.record_failure(&e);
            continue;
        };
        warn_duplicate_adapters(entity);

        let mut restored_here = 0;
        for component in &entry.components {
            match restore_component(entity, &entry.id, component) {
                Ok(()) => {
                    summary.components_restored += 1;
                    restored_here += 1;
                }
                Err(e @ SaveError::MissingComponent { .. }) => {
                    warn!(entity = %entity.name(), "{e}");
                    summary.record_failure(&e);
                }
                Err(e) => {
                    error!(entity = %entity.name(), type_tag = %component.type_tag, error = %e, "Restore failed");
                    summary.record_failure(&e);
                }
            }
        }

        if restored_here > 0 {
            summary.entities_restored += 1;
        }
    }

    summary
}

fn restore_component(
    entity: &mut SaveableEntity,
    id: &EntityId,
    component: &ComponentRecord,
) -> Result<(), SaveError> {
    let adapter = entity
        .find_adapter_mut(&component.type_tag)
        .ok_or_else(|| SaveError::MissingComponent {
            entity: id.clone(),
            type_tag: component.type_tag.clone(),
        })?;
    adapter.restore(component)
}

/// Warns once per repeated adapter tag; restore uses the first of each
fn warn_duplicate_adapters(entity: &SaveableEntity) {
    let mut seen = HashSet::new();
    for tag in entity.adapter_tags() {
        if !seen.insert(tag) {
            warn!(entity = %entity.name(), type_tag = tag, "Duplicate adapters, using the first");
        }
    }
}
