//! Entity Component System (ECS) implementation
//!
//! Systems declare the component types they need; entities are matched to
//! systems by comparing bitmasks. Membership is resolved lazily: component and
//! lifecycle changes are queued and applied at the start of the next
//! [`World::update`], so systems may mutate the world while they iterate.

pub mod bitset;
pub mod component;
pub mod entity;
mod error;
pub mod system;
pub mod world;

pub use bitset::BitSet;
pub use component::{Component, ComponentType};
pub use entity::{Entity, EntityId, EntityMut, EntityRef};
pub use error::EcsError;
pub use system::{IteratingSystem, SharedSystem, System, SystemId};
pub use world::{Registry, World};
