//! Component storage keyed by (entity id, component type)

use std::any::Any;

use super::EntityId;

/// Component type id - dense, assigned by the client, bounded by
/// `EcsConfig::max_components`
pub type ComponentType = usize;

/// Trait for components
pub trait Component: Any {}

type Slot = Option<Box<dyn Any>>;

/// Per-entity rows of type-erased components.
///
/// Whether a component is attached is decided by the entity's mask, not by
/// what this table holds; callers check the mask before reading.
#[derive(Default)]
pub(crate) struct ComponentTable {
    rows: Vec<Vec<Slot>>,
}

impl ComponentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Component>(&mut self, id: EntityId, ty: ComponentType, component: T) {
        let index = id as usize;
        if self.rows.len() <= index {
            self.rows.resize_with(index + 1, Vec::new);
        }
        let row = &mut self.rows[index];
        if row.len() <= ty {
            row.resize_with(ty + 1, || None);
        }
        row[ty] = Some(Box::new(component));
    }

    pub fn get<T: Component>(&self, id: EntityId, ty: ComponentType) -> Option<&T> {
        self.rows
            .get(id as usize)?
            .get(ty)?
            .as_ref()?
            .downcast_ref::<T>()
    }

    pub fn get_mut<T: Component>(&mut self, id: EntityId, ty: ComponentType) -> Option<&mut T> {
        self.rows
            .get_mut(id as usize)?
            .get_mut(ty)?
            .as_mut()?
            .downcast_mut::<T>()
    }

    /// Drop the stored value, if any.
    pub fn remove(&mut self, id: EntityId, ty: ComponentType) {
        if let Some(slot) = self.rows.get_mut(id as usize).and_then(|row| row.get_mut(ty)) {
            *slot = None;
        }
    }

    /// Drop every value stored for `id`, keeping the row allocated for reuse.
    pub fn clear_row(&mut self, id: EntityId) {
        if let Some(row) = self.rows.get_mut(id as usize) {
            row.iter_mut().for_each(|slot| *slot = None);
        }
    }

    #[cfg(test)]
    pub fn stored(&self, id: EntityId) -> usize {
        self.rows
            .get(id as usize)
            .map(|row| row.iter().filter(|slot| slot.is_some()).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    impl Component for Position {}

    #[derive(Debug, PartialEq)]
    struct Tag;
    impl Component for Tag {}

    #[test]
    fn test_component_table() {
        let mut table = ComponentTable::new();

        table.insert(3, 1, Position { x: 1.0, y: 2.0 });
        table.insert(0, 4, Tag);

        assert_eq!(table.get::<Position>(3, 1), Some(&Position { x: 1.0, y: 2.0 }));
        assert_eq!(table.get::<Tag>(0, 4), Some(&Tag));
        assert!(table.get::<Position>(3, 0).is_none());
        assert!(table.get::<Position>(9, 1).is_none());
        assert_eq!(table.stored(3), 1);

        if let Some(pos) = table.get_mut::<Position>(3, 1) {
            pos.x += 1.0;
        }
        assert_eq!(table.get::<Position>(3, 1).map(|p| p.x), Some(2.0));

        table.remove(3, 1);
        assert!(table.get::<Position>(3, 1).is_none());
    }

    #[test]
    fn test_wrong_type_reads_as_absent() {
        let mut table = ComponentTable::new();
        table.insert(0, 0, Tag);
        assert!(table.get::<Position>(0, 0).is_none());
    }

    #[test]
    fn test_clear_row() {
        let mut table = ComponentTable::new();
        table.insert(2, 0, Tag);
        table.insert(2, 5, Position { x: 0.0, y: 0.0 });
        assert_eq!(table.stored(2), 2);

        table.clear_row(2);
        assert_eq!(table.stored(2), 0);
        table.clear_row(40);
    }
}
