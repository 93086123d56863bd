//! Entity handles and the per-entity records owned by the registry

use std::fmt;

use super::{BitSet, Component, ComponentType, Registry};

/// Entity ID type - dense index into the registry, reused after death
pub type EntityId = u32;

/// Opaque key for an entity.
///
/// The id is recycled once the entity dies; the generation tells a revived
/// entity apart from a stale handle to its previous life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity {
    id: EntityId,
    generation: u32,
}

impl Entity {
    pub(crate) fn new(id: EntityId, generation: u32) -> Self {
        Self { id, generation }
    }

    pub fn id(self) -> EntityId {
        self.id
    }

    pub fn generation(self) -> u32 {
        self.generation
    }

    pub(crate) fn index(self) -> usize {
        self.id as usize
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.id, self.generation)
    }
}

/// Registry-side state for one entity slot
#[derive(Debug, Clone)]
pub(crate) struct EntityRecord {
    pub generation: u32,
    pub alive: bool,
    pub pending_removal: bool,
    pub pending_refresh: bool,
    /// Position in the registry's alive list while alive.
    pub slot: usize,
    pub components: BitSet,
    pub systems: BitSet,
}

impl EntityRecord {
    pub fn new(max_components: usize, max_systems: usize, slot: usize) -> Self {
        Self {
            generation: 0,
            alive: true,
            pending_removal: false,
            pending_refresh: false,
            slot,
            components: BitSet::with_universe(max_components),
            systems: BitSet::with_universe(max_systems),
        }
    }
}

/// Read-only view of an entity
#[derive(Clone, Copy)]
pub struct EntityRef<'w> {
    registry: &'w Registry,
    entity: Entity,
}

impl<'w> EntityRef<'w> {
    pub(crate) fn new(registry: &'w Registry, entity: Entity) -> Self {
        Self { registry, entity }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn id(&self) -> EntityId {
        self.entity.id
    }

    pub fn is_alive(&self) -> bool {
        self.registry.is_alive(self.entity)
    }

    pub fn has(&self, ty: ComponentType) -> bool {
        self.registry.has_component(self.entity, ty)
    }

    pub fn get<T: Component>(&self, ty: ComponentType) -> Option<&'w T> {
        self.registry.get_component(self.entity, ty)
    }
}

/// Mutable view of an entity. Every call is forwarded to the registry, which
/// queues the membership work for the next update.
pub struct EntityMut<'w> {
    registry: &'w mut Registry,
    entity: Entity,
}

impl<'w> EntityMut<'w> {
    pub(crate) fn new(registry: &'w mut Registry, entity: Entity) -> Self {
        Self { registry, entity }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn id(&self) -> EntityId {
        self.entity.id
    }

    pub fn is_alive(&self) -> bool {
        self.registry.is_alive(self.entity)
    }

    pub fn has(&self, ty: ComponentType) -> bool {
        self.registry.has_component(self.entity, ty)
    }

    pub fn get<T: Component>(&self, ty: ComponentType) -> Option<&T> {
        self.registry.get_component(self.entity, ty)
    }

    pub fn get_mut<T: Component>(&mut self, ty: ComponentType) -> Option<&mut T> {
        self.registry.get_component_mut(self.entity, ty)
    }

    pub fn add<T: Component>(&mut self, component: T, ty: ComponentType) -> &mut Self {
        self.registry.add_component(self.entity, component, ty);
        self
    }

    pub fn remove(&mut self, ty: ComponentType) -> &mut Self {
        self.registry.remove_component(self.entity, ty);
        self
    }

    /// Detach every component.
    pub fn clear(&mut self) -> &mut Self {
        self.registry.clear_components(self.entity);
        self
    }

    pub fn kill(&mut self) {
        self.registry.kill(self.entity);
    }

    pub fn refresh(&mut self) {
        self.registry.refresh(self.entity);
    }

    pub fn as_entity_ref(&self) -> EntityRef<'_> {
        EntityRef::new(&*self.registry, self.entity)
    }
}
