//! Entity registry
//!
//! Every persistent object that takes part in save/restore carries an
//! [`EntityId`]: an opaque 128-bit random token rendered as 32 hex digits.
//! Identifiers are assigned once (at authoring time, or on spawn for runtime
//! objects) and never reused, so a save file can address objects across
//! process restarts and scene reloads.
//!
//! # Architecture
//!
//! - [`EntityId`]: the identifier newtype
//! - [`IdRegistry`]: hands out identifiers and rejects collisions
//! - [`SaveableEntity`]: identifier + name + attached adapters
//! - [`EntityBuilder`]: assembles the adapter list up front
//! - [`live`]: walks the identified entities of a loaded scene

use crate::save::Saveable;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// Opaque, globally unique identifier of a persistent object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Draws a fresh random 128-bit identifier
    pub fn generate() -> Self {
        EntityId(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        EntityId(value)
    }
}

/// Hands out identifiers and remembers every one it has seen
///
/// One registry is used per authoring session (or per running game for
/// spawned objects). It never returns an identifier that is already in use:
/// a colliding draw is detected and redrawn.
pub struct IdRegistry {
    used: HashSet<EntityId>,
    generator: Box<dyn FnMut() -> EntityId>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::with_generator(EntityId::generate)
    }

    /// Uses a custom identifier source (deterministic tooling, tests)
    pub fn with_generator(generator: impl FnMut() -> EntityId + 'static) -> Self {
        IdRegistry {
            used: HashSet::new(),
            generator: Box::new(generator),
        }
    }

    /// Returns the entity's identifier, assigning a fresh one if it has none
    ///
    /// Idempotent: a second call on the same entity returns the same id.
    pub fn assign_or_get_id(&mut self, entity: &mut SaveableEntity) -> EntityId {
        if let Some(id) = &entity.id {
            self.used.insert(id.clone());
            return id.clone();
        }

        let id = self.fresh_id();
        debug!(entity = %entity.name, id = %id, "Assigned entity identifier");
        entity.id = Some(id.clone());
        id
    }

    /// Authoring pass over a whole scene
    ///
    /// Assigns identifiers to entities that lack one and re-keys entities whose
    /// identifier is already taken by an earlier entity (copy-pasted objects).
    /// Returns how many entities were changed.
    pub fn ensure_unique(&mut self, entities: &mut [SaveableEntity]) -> usize {
        let mut seen = HashSet::new();
        let mut changed = 0;

        for entity in entities.iter_mut() {
            let needs_new = match &entity.id {
                None => true,
                Some(id) => !seen.insert(id.clone()),
            };

            if needs_new {
                if let Some(old) = &entity.id {
                    warn!(entity = %entity.name, id = %old, "Duplicate identifier, re-keying");
                }
                let id = self.fresh_id();
                seen.insert(id.clone());
                entity.id = Some(id);
                changed += 1;
            }

            if let Some(id) = &entity.id {
                self.used.insert(id.clone());
            }
        }

        changed
    }

    /// Returns true if this registry has handed out or observed `id`
    pub fn contains(&self, id: &EntityId) -> bool {
        self.used.contains(id)
    }

    fn fresh_id(&mut self) -> EntityId {
        loop {
            let candidate = (self.generator)();
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            warn!(id = %candidate, "Identifier collision, regenerating");
        }
    }
}

impl Default for IdRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A persistent object: its identifier paired with the adapters attached to it
pub struct SaveableEntity {
    id: Option<EntityId>,
    name: String,
    adapters: Vec<Box<dyn Saveable>>,
}

impl SaveableEntity {
    pub fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn adapters(&self) -> &[Box<dyn Saveable>] {
        &self.adapters
    }

    pub fn adapters_mut(&mut self) -> &mut [Box<dyn Saveable>] {
        &mut self.adapters
    }

    pub fn adapter_tags(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.type_tag()).collect()
    }

    pub fn has_adapter(&self, type_tag: &str) -> bool {
        self.adapters.iter().any(|a| a.type_tag() == type_tag)
    }

    /// First attached adapter with `type_tag`
    pub fn find_adapter_mut(&mut self, type_tag: &str) -> Option<&mut Box<dyn Saveable>> {
        self.adapters.iter_mut().find(|a| a.type_tag() == type_tag)
    }

    /// Attaches `adapter` unless one with the same type tag is already present
    ///
    /// Returns true if the adapter was added.
    pub fn ensure_adapter(&mut self, adapter: impl Saveable + 'static) -> bool {
        if self.has_adapter(adapter.type_tag()) {
            return false;
        }
        debug!(entity = %self.name, adapter = adapter.type_tag(), "Attached missing adapter");
        self.adapters.push(Box::new(adapter));
        true
    }

    /// Advances any deferred adapter work by one frame
    pub fn tick(&mut self) {
        for adapter in &mut self.adapters {
            adapter.tick();
        }
    }
}

impl fmt::Debug for SaveableEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveableEntity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("adapters", &self.adapter_tags())
            .finish()
    }
}

/// Assembles a [`SaveableEntity`] with its full adapter list
pub struct EntityBuilder {
    id: Option<EntityId>,
    name: String,
    adapters: Vec<Box<dyn Saveable>>,
}

impl EntityBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        EntityBuilder {
            id: None,
            name: name.into(),
            adapters: Vec::new(),
        }
    }

    /// Uses an identifier authored ahead of time
    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_adapter(mut self, adapter: impl Saveable + 'static) -> Self {
        self.adapters.push(Box::new(adapter));
        self
    }

    /// Builds the entity as-is; it may still lack an identifier
    pub fn build(self) -> SaveableEntity {
        SaveableEntity {
            id: self.id,
            name: self.name,
            adapters: self.adapters,
        }
    }

    /// Builds the entity and guarantees it carries an identifier
    pub fn build_with(self, ids: &mut IdRegistry) -> SaveableEntity {
        let mut entity = self.build();
        ids.assign_or_get_id(&mut entity);
        entity
    }
}

/// Identified entities among `entities`; the order follows the input
pub fn live<'a>(
    entities: impl Iterator<Item = &'a SaveableEntity> + 'a,
) -> impl Iterator<Item = (&'a EntityId, &'a SaveableEntity)> + 'a {
    entities.filter_map(|e| e.id.as_ref().map(|id| (id, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::CounterAdapter;
    use crate::components::ButtonStats;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn counter() -> CounterAdapter {
        CounterAdapter::new(&Rc::new(RefCell::new(ButtonStats::new(0))))
    }

    #[test]
    fn test_assign_is_idempotent() {
        let mut ids = IdRegistry::new();
        let mut entity = EntityBuilder::new("Door").build();

        let first = ids.assign_or_get_id(&mut entity);
        let second = ids.assign_or_get_id(&mut entity);

        assert_eq!(first, second);
        assert_eq!(entity.id(), Some(&first));
        assert_eq!(first.as_str().len(), 32);
    }

    #[test]
    fn test_collision_is_regenerated() {
        let mut draws = vec!["b", "a", "a"].into_iter().map(EntityId::from);
        let mut ids = IdRegistry::with_generator(move || draws.next_back().unwrap());

        let mut first = EntityBuilder::new("One").build();
        let mut second = EntityBuilder::new("Two").build();

        assert_eq!(ids.assign_or_get_id(&mut first), EntityId::from("a"));
        // Second draw collides with "a" and is redrawn
        assert_eq!(ids.assign_or_get_id(&mut second), EntityId::from("b"));
    }

    #[test]
    fn test_ensure_unique_rekeys_duplicates() {
        let mut ids = IdRegistry::new();
        let mut entities = vec![
            EntityBuilder::new("A").with_id("same").build(),
            EntityBuilder::new("B").with_id("same").build(),
            EntityBuilder::new("C").build(),
        ];

        let changed = ids.ensure_unique(&mut entities);

        assert_eq!(changed, 2);
        assert_eq!(entities[0].id(), Some(&EntityId::from("same")));
        assert_ne!(entities[1].id(), Some(&EntityId::from("same")));
        assert!(entities[2].id().is_some());
        assert_eq!(ids.ensure_unique(&mut entities), 0);
    }

    #[test]
    fn test_ensure_adapter_refuses_duplicate_tag() {
        let mut entity = EntityBuilder::new("Button").with_adapter(counter()).build();

        assert!(!entity.ensure_adapter(counter()));
        assert_eq!(entity.adapters().len(), 1);
    }

    #[test]
    fn test_live_skips_unidentified() {
        let entities = vec![
            EntityBuilder::new("A").with_id("a").build(),
            EntityBuilder::new("B").build(),
        ];

        let ids: Vec<_> = live(entities.iter()).map(|(id, _)| id.clone()).collect();
        assert_eq!(ids, vec![EntityId::from("a")]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_distinct_entities_get_distinct_ids(count in 1000usize..1200) {
            let mut ids = IdRegistry::new();
            let mut seen = HashSet::new();

            for i in 0..count {
                let mut entity = EntityBuilder::new(format!("e{i}")).build();
                let id = ids.assign_or_get_id(&mut entity);
                prop_assert!(seen.insert(id.clone()));
                prop_assert_eq!(ids.assign_or_get_id(&mut entity), id);
            }
        }
    }
}
