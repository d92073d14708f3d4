//! Named entity store
//!
//! Names are unique: creating an entity under a taken name destroys the
//! previous holder first. The registry is owned by whoever drives the scene
//! (the dice box); there is no process-wide instance.

use super::entity::{Entity, EntityOptions};
use crate::dice::MaterialSet;
use crate::geometry::{ConvexShape, GeometrySource};
use crate::physics::{PhysicsWorld, RigidBody};
use crate::render::{Mesh, MeshId, Renderer};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: BTreeMap<String, Entity>,
    next_mesh_id: u64,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_mesh_id: 1,
        }
    }

    /// Store a fresh, detached entity under `name`
    ///
    /// An existing entity with the same name is destroyed (its `Destroy`
    /// handlers run, its body and mesh are detached) before the new one is
    /// stored. Call [`Entity::create`] on the result to attach it.
    #[allow(clippy::too_many_arguments)]
    pub fn create_or_replace(
        &mut self,
        name: &str,
        geometry: impl Into<GeometrySource>,
        materials: Arc<MaterialSet>,
        shape: Arc<ConvexShape>,
        options: EntityOptions,
        renderer: &mut dyn Renderer,
        world: &mut dyn PhysicsWorld,
    ) -> &mut Entity {
        if let Some(mut previous) = self.entities.remove(name) {
            debug!(entity = name, "replacing entity");
            previous.destroy(renderer, world);
        }

        let id = MeshId(self.next_mesh_id.max(1));
        self.next_mesh_id = id.0 + 1;

        let mesh = Mesh::new(id, geometry.into().resolve(), materials);
        let body = RigidBody::new(shape, options.mass);
        let entity = Entity::new(name.to_string(), mesh, body, options);

        match self.entities.entry(name.to_string()) {
            Entry::Occupied(mut slot) => {
                slot.insert(entity);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(entity),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Destroy and drop the entity; `false` if there was none
    pub fn remove(
        &mut self,
        name: &str,
        renderer: &mut dyn Renderer,
        world: &mut dyn PhysicsWorld,
    ) -> bool {
        match self.entities.remove(name) {
            Some(mut entity) => {
                entity.destroy(renderer, world);
                true
            }
            None => false,
        }
    }

    /// Destroy every entity, in name order
    pub fn clear(&mut self, renderer: &mut dyn Renderer, world: &mut dyn PhysicsWorld) {
        for (_, mut entity) in std::mem::take(&mut self.entities) {
            entity.destroy(renderer, world);
        }
    }

    /// Update the named entities in the given order; unknown names are
    /// skipped
    pub fn update_entities<I, S>(&mut self, names: I, world: &mut dyn PhysicsWorld)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            if let Some(entity) = self.entities.get_mut(name.as_ref()) {
                entity.update(world);
            }
        }
    }

    /// Meshes of attached entities, in name order
    pub fn scene_meshes(&self) -> Vec<&Mesh> {
        self.entities
            .values()
            .filter(|e| e.is_attached())
            .map(Entity::mesh)
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entities.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EntityEvent;
    use crate::physics::SimpleWorld;
    use crate::render::RecordingRenderer;
    use crate::{DieCatalog, DieType};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn add(
        registry: &mut EntityRegistry,
        name: &str,
        renderer: &mut RecordingRenderer,
        world: &mut SimpleWorld,
    ) -> MeshId {
        let d6 = DieCatalog::standard().kind(DieType::D6);
        let entity = registry.create_or_replace(
            name,
            d6.geometry().clone(),
            d6.materials().clone(),
            d6.shape().clone(),
            EntityOptions::with_mass(1.0),
            renderer,
            world,
        );
        entity.create(renderer, world);
        entity.mesh().id
    }

    #[test]
    fn test_replace_destroys_previous() {
        let mut registry = EntityRegistry::new();
        let mut renderer = RecordingRenderer::new();
        let mut world = SimpleWorld::default();

        let first = add(&mut registry, "die", &mut renderer, &mut world);
        let destroyed = Rc::new(RefCell::new(false));
        let flag = destroyed.clone();
        registry
            .get_mut("die")
            .unwrap()
            .on(EntityEvent::Destroy, move |_, _| *flag.borrow_mut() = true);

        let second = add(&mut registry, "die", &mut renderer, &mut world);

        assert!(*destroyed.borrow());
        assert_ne!(first, second);
        assert_eq!(registry.len(), 1);
        assert_eq!(world.body_count(), 1);
        assert_eq!(renderer.scene(), &[second]);
    }

    #[test]
    fn test_missing_names() {
        let mut registry = EntityRegistry::new();
        let mut renderer = RecordingRenderer::new();
        let mut world = SimpleWorld::default();

        assert!(registry.get("nope").is_none());
        assert!(!registry.remove("nope", &mut renderer, &mut world));
        registry.update_entities(["nope"], &mut world);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut registry = EntityRegistry::new();
        let mut renderer = RecordingRenderer::new();
        let mut world = SimpleWorld::default();
        add(&mut registry, "a", &mut renderer, &mut world);
        add(&mut registry, "b", &mut renderer, &mut world);
        add(&mut registry, "c", &mut renderer, &mut world);

        assert!(registry.remove("b", &mut renderer, &mut world));
        assert_eq!(registry.names(), vec!["a", "c"]);
        assert_eq!(world.body_count(), 2);

        registry.clear(&mut renderer, &mut world);
        assert!(registry.is_empty());
        assert_eq!(world.body_count(), 0);
        assert!(renderer.scene().is_empty());
    }

    #[test]
    fn test_scene_meshes_skip_detached() {
        let mut registry = EntityRegistry::new();
        let mut renderer = RecordingRenderer::new();
        let mut world = SimpleWorld::default();
        add(&mut registry, "a", &mut renderer, &mut world);

        let d6 = DieCatalog::standard().kind(DieType::D6);
        registry.create_or_replace(
            "b",
            d6.geometry().clone(),
            d6.materials().clone(),
            d6.shape().clone(),
            EntityOptions::default(),
            &mut renderer,
            &mut world,
        );

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.scene_meshes().len(), 1);
    }
}
