//! World - central ECS container

use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use tracing::{debug, trace};

use super::component::ComponentTable;
use super::entity::EntityRecord;
use super::system::SystemEntry;
use super::{
    BitSet, Component, ComponentType, EcsError, Entity, EntityId, EntityMut, EntityRef,
    SharedSystem, System, SystemId,
};
use crate::config::EcsConfig;

/// Entities, their components and the pending queues.
///
/// This is the part of the world systems are handed while they run. Nothing
/// here touches system membership directly: mutations are queued and resolved
/// by [`World::update`].
pub struct Registry {
    config: EcsConfig,
    records: Vec<EntityRecord>,
    alive: Vec<EntityId>,
    dead: Vec<EntityId>,
    removed: Vec<EntityId>,
    refreshed: Vec<EntityId>,
    components: ComponentTable,
}

impl Registry {
    pub fn new(config: EcsConfig) -> Self {
        Self {
            config,
            records: Vec::new(),
            alive: Vec::new(),
            dead: Vec::new(),
            removed: Vec::new(),
            refreshed: Vec::new(),
            components: ComponentTable::new(),
        }
    }

    pub fn config(&self) -> &EcsConfig {
        &self.config
    }

    /// Create an entity, reviving the most recently killed one if any.
    pub fn create(&mut self) -> Entity {
        let slot = self.alive.len();
        let id = if let Some(id) = self.dead.pop() {
            let record = &mut self.records[id as usize];
            record.generation = record.generation.wrapping_add(1);
            record.alive = true;
            record.slot = slot;
            id
        } else {
            let id = self.records.len() as EntityId;
            self.records.push(EntityRecord::new(
                self.config.max_components,
                self.config.max_systems,
                slot,
            ));
            id
        };
        self.alive.push(id);

        let entity = self.handle(id);
        trace!(%entity, "created entity");
        entity
    }

    /// Queue `entity` for removal at the next update.
    pub fn kill(&mut self, entity: Entity) {
        let Some(record) = self.live_record_mut(entity) else {
            trace!(%entity, "ignoring kill of dead entity");
            return;
        };
        if !record.pending_removal {
            record.pending_removal = true;
            self.removed.push(entity.id());
        }
    }

    /// Queue `entity` for membership re-evaluation at the next update.
    pub fn refresh(&mut self, entity: Entity) {
        let Some(record) = self.live_record_mut(entity) else {
            return;
        };
        if !record.pending_refresh {
            record.pending_refresh = true;
            self.refreshed.push(entity.id());
        }
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.live_record(entity).is_some()
    }

    pub fn entity(&self, entity: Entity) -> EntityRef<'_> {
        EntityRef::new(self, entity)
    }

    pub fn entity_mut(&mut self, entity: Entity) -> EntityMut<'_> {
        EntityMut::new(self, entity)
    }

    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T, ty: ComponentType) {
        let Some(record) = self.live_record_mut(entity) else {
            trace!(%entity, ty, "ignoring component added to dead entity");
            return;
        };
        record.components.set(ty, true);
        self.components.insert(entity.id(), ty, component);
        self.refresh(entity);
    }

    pub fn remove_component(&mut self, entity: Entity, ty: ComponentType) {
        let Some(record) = self.live_record_mut(entity) else {
            return;
        };
        record.components.set(ty, false);
        self.components.remove(entity.id(), ty);
        self.refresh(entity);
    }

    pub fn clear_components(&mut self, entity: Entity) {
        let Some(record) = self.live_record_mut(entity) else {
            return;
        };
        record.components.reset();
        self.components.clear_row(entity.id());
        self.refresh(entity);
    }

    pub fn has_component(&self, entity: Entity, ty: ComponentType) -> bool {
        self.live_record(entity)
            .is_some_and(|record| record.components.get(ty))
    }

    /// Attached component of type `ty`, or `None` when it is absent or not a `T`.
    pub fn get_component<T: Component>(&self, entity: Entity, ty: ComponentType) -> Option<&T> {
        if !self.has_component(entity, ty) {
            return None;
        }
        self.components.get(entity.id(), ty)
    }

    pub fn get_component_mut<T: Component>(
        &mut self,
        entity: Entity,
        ty: ComponentType,
    ) -> Option<&mut T> {
        if !self.has_component(entity, ty) {
            return None;
        }
        self.components.get_mut(entity.id(), ty)
    }

    /// Component mask of a live entity
    pub fn component_mask(&self, entity: Entity) -> Option<&BitSet> {
        self.live_record(entity).map(|record| &record.components)
    }

    /// Get number of alive entities
    pub fn entity_count(&self) -> usize {
        self.alive.len()
    }

    pub fn alive_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive.iter().map(|&id| self.handle(id))
    }

    pub fn pending_removals(&self) -> usize {
        self.removed.len()
    }

    pub fn pending_refreshes(&self) -> usize {
        self.refreshed.len()
    }

    fn handle(&self, id: EntityId) -> Entity {
        Entity::new(id, self.records[id as usize].generation)
    }

    fn record(&self, entity: Entity) -> Option<&EntityRecord> {
        self.records
            .get(entity.index())
            .filter(|record| record.generation == entity.generation())
    }

    fn live_record(&self, entity: Entity) -> Option<&EntityRecord> {
        self.record(entity).filter(|record| record.alive)
    }

    fn live_record_mut(&mut self, entity: Entity) -> Option<&mut EntityRecord> {
        self.records
            .get_mut(entity.index())
            .filter(|record| record.generation == entity.generation() && record.alive)
    }

    fn is_member(&self, entity: Entity, system: SystemId) -> bool {
        self.record(entity)
            .is_some_and(|record| record.systems.get(system.index()))
    }

    /// Mark the entity dead and move it to the dead pool. Returns false when
    /// it was already dead.
    fn retire(&mut self, id: EntityId) -> bool {
        let record = &mut self.records[id as usize];
        record.pending_removal = false;
        if !record.alive {
            return false;
        }
        record.alive = false;
        record.components.reset();
        let slot = record.slot;

        self.alive.swap_remove(slot);
        if let Some(&moved) = self.alive.get(slot) {
            self.records[moved as usize].slot = slot;
        }
        self.dead.push(id);
        self.components.clear_row(id);
        true
    }
}

/// World holds all entities, components and systems
pub struct World {
    registry: Registry,
    systems: Vec<SystemEntry>,
}

impl World {
    pub fn new(config: EcsConfig) -> Self {
        Self {
            registry: Registry::new(config),
            systems: Vec::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Register a system. Systems run in registration order.
    ///
    /// Registering the same instance twice fails and leaves the first
    /// registration untouched. Entities that already exist are matched
    /// against the new system at the next update.
    pub fn register_system<S: System + 'static>(
        &mut self,
        system: Rc<RefCell<S>>,
    ) -> Result<SystemId, EcsError> {
        let system: SharedSystem = system;
        if let Some(existing) = self.systems.iter().find(|entry| entry.is(&system)) {
            return Err(EcsError::SystemAlreadyRegistered {
                name: existing.name.clone(),
            });
        }
        let limit = self.registry.config.max_systems;
        if self.systems.len() >= limit {
            return Err(EcsError::SystemLimitReached { limit });
        }

        let mut required = BitSet::with_universe(self.registry.config.max_components);
        for &ty in system.borrow().required_components() {
            required.set(ty, true);
        }

        let id = SystemId(self.systems.len());
        let entry = SystemEntry::new(system, required);
        debug!(system = %entry.name, index = id.index(), "registered system");
        self.systems.push(entry);

        let alive: Vec<Entity> = self.registry.alive_entities().collect();
        for entity in alive {
            self.registry.refresh(entity);
        }

        self.systems[id.index()]
            .system
            .borrow_mut()
            .on_registered(&mut self.registry);
        Ok(id)
    }

    /// Wrap `system` in a shared handle and register it.
    pub fn add_system<S: System + 'static>(
        &mut self,
        system: S,
    ) -> Result<Rc<RefCell<S>>, EcsError> {
        let system = Rc::new(RefCell::new(system));
        self.register_system(system.clone())?;
        Ok(system)
    }

    pub fn create(&mut self) -> Entity {
        self.registry.create()
    }

    pub fn kill(&mut self, entity: Entity) {
        self.registry.kill(entity);
    }

    pub fn refresh(&mut self, entity: Entity) {
        self.registry.refresh(entity);
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.registry.is_alive(entity)
    }

    pub fn entity(&self, entity: Entity) -> EntityRef<'_> {
        self.registry.entity(entity)
    }

    pub fn entity_mut(&mut self, entity: Entity) -> EntityMut<'_> {
        self.registry.entity_mut(entity)
    }

    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T, ty: ComponentType) {
        self.registry.add_component(entity, component, ty);
    }

    pub fn remove_component(&mut self, entity: Entity, ty: ComponentType) {
        self.registry.remove_component(entity, ty);
    }

    pub fn clear_components(&mut self, entity: Entity) {
        self.registry.clear_components(entity);
    }

    pub fn has_component(&self, entity: Entity, ty: ComponentType) -> bool {
        self.registry.has_component(entity, ty)
    }

    pub fn get_component<T: Component>(&self, entity: Entity, ty: ComponentType) -> Option<&T> {
        self.registry.get_component(entity, ty)
    }

    pub fn get_component_mut<T: Component>(
        &mut self,
        entity: Entity,
        ty: ComponentType,
    ) -> Option<&mut T> {
        self.registry.get_component_mut(entity, ty)
    }

    pub fn entity_count(&self) -> usize {
        self.registry.entity_count()
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Entities currently matched by `system`, in unspecified order.
    pub fn system_entities(&self, system: SystemId) -> &[Entity] {
        self.systems
            .get(system.index())
            .map(|entry| entry.entities.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_member(&self, entity: Entity, system: SystemId) -> bool {
        self.registry.is_member(entity, system)
    }

    pub fn set_system_enabled(&mut self, system: SystemId, enabled: bool) {
        if let Some(entry) = self.systems.get_mut(system.index()) {
            entry.enabled = enabled;
        }
    }

    /// False when the world switched the system off or the system reports
    /// itself disabled.
    pub fn is_system_enabled(&self, system: SystemId) -> bool {
        self.systems
            .get(system.index())
            .is_some_and(|entry| entry.enabled && entry.system.borrow().is_enabled())
    }

    /// Resolve pending work, then run every system in registration order.
    pub fn update(&mut self, elapsed: f64) {
        self.flush();
        for entry in &self.systems {
            entry.run(elapsed, &mut self.registry);
        }
    }

    /// Drain the removal queue, then the refresh queue.
    ///
    /// Every removal is finalized before any refresh is looked at, so refreshes
    /// see post-removal component state.
    pub fn flush(&mut self) {
        let removals = self.registry.removed.len();
        let refreshes = self.registry.refreshed.len();
        if removals == 0 && refreshes == 0 {
            return;
        }

        let mut removed = mem::take(&mut self.registry.removed);
        for &id in removed.iter().rev() {
            if self.registry.retire(id) {
                trace!(id, "entity died");
                self.reevaluate(id);
            }
        }
        removed.clear();
        self.registry.removed = removed;

        let mut refreshed = mem::take(&mut self.registry.refreshed);
        for &id in refreshed.iter().rev() {
            self.reevaluate(id);
        }
        refreshed.clear();
        self.registry.refreshed = refreshed;

        debug!(removals, refreshes, alive = self.registry.entity_count(), "flushed queues");
    }

    /// Bring the entity's system memberships in line with its component mask.
    fn reevaluate(&mut self, id: EntityId) {
        let registry = &mut self.registry;
        let entity = registry.handle(id);
        registry.records[id as usize].pending_refresh = false;

        for (index, entry) in self.systems.iter_mut().enumerate() {
            let record = &mut registry.records[id as usize];
            let member = record.systems.get(index);
            let interested = record.components.contains(&entry.required);

            if member && !interested {
                record.systems.set(index, false);
                entry.remove(entity, registry);
            } else if !member && interested {
                record.systems.set(index, true);
                entry.insert(entity, registry);
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(EcsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::IteratingSystem;

    #[derive(Debug, PartialEq)]
    struct Position { x: f32, y: f32 }
    impl Component for Position {}

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Velocity { dx: f32, dy: f32 }
    impl Component for Velocity {}

    const POSITION: ComponentType = 0;
    const VELOCITY: ComponentType = 1;

    #[derive(Debug, Default)]
    struct Movement {
        added: usize,
        removed: usize,
    }

    impl IteratingSystem for Movement {
        fn required_components(&self) -> &[ComponentType] {
            &[POSITION, VELOCITY]
        }

        fn process(&mut self, entity: Entity, elapsed: f64, world: &mut Registry) {
            let Some(&Velocity { dx, dy }) = world.get_component::<Velocity>(entity, VELOCITY)
            else {
                return;
            };
            if let Some(pos) = world.get_component_mut::<Position>(entity, POSITION) {
                pos.x += dx * elapsed as f32;
                pos.y += dy * elapsed as f32;
            }
        }

        fn on_added(&mut self, _entity: Entity, _world: &Registry) {
            self.added += 1;
        }

        fn on_removed(&mut self, _entity: Entity, _world: &Registry) {
            self.removed += 1;
        }
    }

    #[test]
    fn test_world_entity_lifecycle() {
        let mut world = World::default();

        let e1 = world.create();
        let e2 = world.create();
        assert!(world.is_alive(e1));
        assert_eq!(world.entity_count(), 2);

        world.kill(e1);
        assert!(world.is_alive(e1), "kill is deferred until the next update");

        world.update(0.0);
        assert!(!world.is_alive(e1));
        assert!(world.is_alive(e2));
        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.registry().alive_entities().collect::<Vec<_>>(), vec![e2]);
    }

    #[test]
    fn test_world_components() {
        let mut world = World::default();

        let entity = world.create();
        world.add_component(entity, Position { x: 1.0, y: 2.0 }, POSITION);
        world.add_component(entity, Velocity { dx: 0.5, dy: 0.5 }, VELOCITY);

        assert_eq!(world.get_component::<Position>(entity, POSITION).map(|p| p.x), Some(1.0));

        if let Some(vel) = world.get_component_mut::<Velocity>(entity, VELOCITY) {
            vel.dx = 1.0;
        }
        let vel = world.get_component::<Velocity>(entity, VELOCITY).copied();
        assert_eq!(vel, Some(Velocity { dx: 1.0, dy: 0.5 }));

        world.remove_component(entity, VELOCITY);
        assert!(world.get_component::<Velocity>(entity, VELOCITY).is_none());

        world.clear_components(entity);
        assert!(!world.has_component(entity, POSITION));
        assert_eq!(world.registry().pending_refreshes(), 1);
    }

    #[test]
    fn test_update_moves_matching_entities() {
        let mut world = World::default();
        let movement = world.add_system(Movement::default()).unwrap();

        let mover = world.create();
        world
            .entity_mut(mover)
            .add(Position { x: 0.0, y: 0.0 }, POSITION)
            .add(Velocity { dx: 2.0, dy: -1.0 }, VELOCITY);
        let statue = world.create();
        world.add_component(statue, Position { x: 5.0, y: 5.0 }, POSITION);

        world.update(0.5);
        world.update(0.5);

        assert_eq!(
            world.get_component::<Position>(mover, POSITION),
            Some(&Position { x: 2.0, y: -1.0 })
        );
        assert_eq!(
            world.get_component::<Position>(statue, POSITION),
            Some(&Position { x: 5.0, y: 5.0 })
        );
        assert_eq!(movement.borrow().added, 1);
    }

    #[test]
    fn test_removed_swap_keeps_alive_slots() {
        let mut world = World::default();
        let entities: Vec<Entity> = (0..4).map(|_| world.create()).collect();

        world.kill(entities[0]);
        world.kill(entities[2]);
        world.update(0.0);

        let mut alive: Vec<Entity> = world.registry().alive_entities().collect();
        alive.sort();
        assert_eq!(alive, vec![entities[1], entities[3]]);

        world.kill(entities[3]);
        world.update(0.0);
        assert_eq!(world.registry().alive_entities().collect::<Vec<_>>(), vec![entities[1]]);
    }

    #[test]
    fn test_death_releases_component_values() {
        let mut world = World::default();
        let entity = world.create();
        world.add_component(entity, Position { x: 0.0, y: 0.0 }, POSITION);
        world.kill(entity);
        world.update(0.0);

        assert_eq!(world.registry().components.stored(entity.id()), 0);
    }

    #[test]
    fn test_system_limit() {
        let mut world = World::new(EcsConfig {
            max_components: 8,
            max_systems: 1,
        });
        world.add_system(Movement::default()).unwrap();
        let err = world.add_system(Movement::default()).unwrap_err();
        assert_eq!(err, EcsError::SystemLimitReached { limit: 1 });
        assert_eq!(world.registry().config().max_systems, 1);
        assert_eq!(world.system_count(), 1);
    }

    #[test]
    fn test_late_registration_picks_up_existing_entities() {
        let mut world = World::default();
        let entity = world.create();
        world
            .entity_mut(entity)
            .add(Position { x: 0.0, y: 0.0 }, POSITION)
            .add(Velocity { dx: 0.0, dy: 0.0 }, VELOCITY);
        world.update(0.0);

        let id = SystemId(world.system_count());
        world.add_system(Movement::default()).unwrap();
        assert!(world.system_entities(id).is_empty());

        world.update(0.0);
        assert_eq!(world.system_entities(id), &[entity]);
        assert!(world.is_member(entity, id));
    }
}
