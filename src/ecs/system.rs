//! Systems and the per-system bookkeeping kept by the world

use std::cell::RefCell;
use std::rc::Rc;

use super::{BitSet, ComponentType, Entity, Registry};

/// Shared handle to a registered system
pub type SharedSystem = Rc<RefCell<dyn System>>;

/// Index of a system in registration order; also its bit in every entity's
/// system mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SystemId(pub(crate) usize);

impl SystemId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A unit of behavior run once per update over every entity whose components
/// include all of [`System::required_components`].
///
/// All hooks have empty defaults.
pub trait System {
    /// Component types an entity must hold to be processed. Read once, when
    /// the system is registered.
    fn required_components(&self) -> &[ComponentType];

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Checked before every frame. A disabled system keeps its entities but
    /// none of `on_begin`, processing or `on_end` run.
    fn is_enabled(&self) -> bool {
        true
    }

    fn on_registered(&mut self, _world: &mut Registry) {}

    fn on_begin(&mut self, _world: &mut Registry) {}

    fn process_entities(&mut self, _entities: &[Entity], _elapsed: f64, _world: &mut Registry) {}

    fn on_end(&mut self, _world: &mut Registry) {}

    /// Called when `entity` starts matching this system.
    fn on_added(&mut self, _entity: Entity, _world: &Registry) {}

    /// Called when `entity` stops matching this system, including on death.
    fn on_removed(&mut self, _entity: Entity, _world: &Registry) {}
}

/// A system that handles its entities one at a time, in list order.
///
/// Anything implementing this trait is a [`System`].
pub trait IteratingSystem {
    fn required_components(&self) -> &[ComponentType];

    fn process(&mut self, entity: Entity, elapsed: f64, world: &mut Registry);

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn on_registered(&mut self, _world: &mut Registry) {}

    fn on_begin(&mut self, _world: &mut Registry) {}

    fn on_end(&mut self, _world: &mut Registry) {}

    fn on_added(&mut self, _entity: Entity, _world: &Registry) {}

    fn on_removed(&mut self, _entity: Entity, _world: &Registry) {}
}

impl<S: IteratingSystem> System for S {
    fn required_components(&self) -> &[ComponentType] {
        IteratingSystem::required_components(self)
    }

    fn name(&self) -> &str {
        IteratingSystem::name(self)
    }

    fn is_enabled(&self) -> bool {
        IteratingSystem::is_enabled(self)
    }

    fn on_registered(&mut self, world: &mut Registry) {
        IteratingSystem::on_registered(self, world);
    }

    fn on_begin(&mut self, world: &mut Registry) {
        IteratingSystem::on_begin(self, world);
    }

    fn process_entities(&mut self, entities: &[Entity], elapsed: f64, world: &mut Registry) {
        for &entity in entities {
            self.process(entity, elapsed, world);
        }
    }

    fn on_end(&mut self, world: &mut Registry) {
        IteratingSystem::on_end(self, world);
    }

    fn on_added(&mut self, entity: Entity, world: &Registry) {
        IteratingSystem::on_added(self, entity, world);
    }

    fn on_removed(&mut self, entity: Entity, world: &Registry) {
        IteratingSystem::on_removed(self, entity, world);
    }
}

/// World-side state for one registered system
pub(crate) struct SystemEntry {
    pub system: SharedSystem,
    pub name: String,
    pub required: BitSet,
    pub entities: Vec<Entity>,
    pub enabled: bool,
}

impl SystemEntry {
    pub fn new(system: SharedSystem, required: BitSet) -> Self {
        let name = system.borrow().name().to_string();
        Self {
            system,
            name,
            required,
            entities: Vec::new(),
            enabled: true,
        }
    }

    pub fn is(&self, system: &SharedSystem) -> bool {
        Rc::as_ptr(&self.system) as *const () == Rc::as_ptr(system) as *const ()
    }

    /// Start tracking `entity`; no-op if it is already tracked.
    pub fn insert(&mut self, entity: Entity, world: &Registry) {
        if self.entities.contains(&entity) {
            return;
        }
        self.entities.push(entity);
        self.system.borrow_mut().on_added(entity, world);
    }

    /// Stop tracking `entity` by swapping it with the last element.
    pub fn remove(&mut self, entity: Entity, world: &Registry) {
        if let Some(index) = self.entities.iter().position(|e| *e == entity) {
            self.entities.swap_remove(index);
            self.system.borrow_mut().on_removed(entity, world);
        }
    }

    /// Run one frame: begin, process every tracked entity, end.
    pub fn run(&self, elapsed: f64, world: &mut Registry) {
        if !self.enabled {
            return;
        }
        let mut system = self.system.borrow_mut();
        if !system.is_enabled() {
            return;
        }
        system.on_begin(world);
        system.process_entities(&self.entities, elapsed, world);
        system.on_end(world);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EcsConfig;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        processed: Vec<Entity>,
    }

    impl IteratingSystem for Recorder {
        fn required_components(&self) -> &[ComponentType] {
            &[0]
        }

        fn process(&mut self, entity: Entity, _elapsed: f64, _world: &mut Registry) {
            self.processed.push(entity);
        }

        fn on_begin(&mut self, _world: &mut Registry) {
            self.calls.push("begin".into());
        }

        fn on_end(&mut self, _world: &mut Registry) {
            self.calls.push("end".into());
        }

        fn on_added(&mut self, entity: Entity, _world: &Registry) {
            self.calls.push(format!("added {entity}"));
        }

        fn on_removed(&mut self, entity: Entity, _world: &Registry) {
            self.calls.push(format!("removed {entity}"));
        }
    }

    fn entry_for(recorder: &Rc<RefCell<Recorder>>) -> SystemEntry {
        let shared: SharedSystem = recorder.clone();
        SystemEntry::new(shared, BitSet::with_universe(32))
    }

    #[test]
    fn test_insert_is_idempotent() {
        let registry = Registry::new(EcsConfig::default());
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let mut entry = entry_for(&recorder);
        let entity = Entity::new(0, 0);

        entry.insert(entity, &registry);
        entry.insert(entity, &registry);

        assert_eq!(entry.entities, vec![entity]);
        assert_eq!(recorder.borrow().calls, vec!["added 0v0".to_string()]);
    }

    #[test]
    fn test_remove_swaps_with_last() {
        let registry = Registry::new(EcsConfig::default());
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let mut entry = entry_for(&recorder);
        let (a, b, c) = (Entity::new(0, 0), Entity::new(1, 0), Entity::new(2, 0));
        for entity in [a, b, c] {
            entry.insert(entity, &registry);
        }

        entry.remove(a, &registry);
        assert_eq!(entry.entities, vec![c, b]);

        entry.remove(a, &registry);
        let removals = recorder
            .borrow()
            .calls
            .iter()
            .filter(|call| call.starts_with("removed"))
            .count();
        assert_eq!(removals, 1);
    }

    #[test]
    fn test_run_respects_enabled_flag() {
        let mut registry = Registry::new(EcsConfig::default());
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let mut entry = entry_for(&recorder);
        entry.insert(Entity::new(4, 1), &registry);

        entry.enabled = false;
        entry.run(0.016, &mut registry);
        assert!(recorder.borrow().processed.is_empty());

        entry.enabled = true;
        entry.run(0.016, &mut registry);
        let recorder = recorder.borrow();
        assert_eq!(recorder.processed, vec![Entity::new(4, 1)]);
        assert_eq!(recorder.calls[1..], ["begin".to_string(), "end".to_string()]);
    }

    /// Switches itself off after a fixed number of frames.
    struct Countdown {
        frames_left: usize,
        processed: usize,
    }

    impl IteratingSystem for Countdown {
        fn required_components(&self) -> &[ComponentType] {
            &[]
        }

        fn is_enabled(&self) -> bool {
            self.frames_left > 0
        }

        fn process(&mut self, _entity: Entity, _elapsed: f64, _world: &mut Registry) {
            self.processed += 1;
        }

        fn on_end(&mut self, _world: &mut Registry) {
            self.frames_left -= 1;
        }
    }

    #[test]
    fn test_system_can_disable_itself() {
        let mut registry = Registry::new(EcsConfig::default());
        let countdown = Rc::new(RefCell::new(Countdown {
            frames_left: 2,
            processed: 0,
        }));
        let shared: SharedSystem = countdown.clone();
        let mut entry = SystemEntry::new(shared, BitSet::with_universe(32));
        entry.insert(Entity::new(0, 0), &registry);

        for _ in 0..5 {
            entry.run(0.016, &mut registry);
        }

        let countdown = countdown.borrow();
        assert_eq!(countdown.processed, 2);
        assert_eq!(countdown.frames_left, 0);
        assert_eq!(entry.entities, vec![Entity::new(0, 0)]);
    }

    #[test]
    fn test_default_name_is_type_name() {
        let recorder = Recorder::default();
        assert!(System::name(&recorder).ends_with("Recorder"));
    }
}
