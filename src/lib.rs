pub mod config;
pub mod ecs;
pub mod sandbox;

pub use config::{EcsConfig, SandboxConfig};
pub use ecs::{
    BitSet, Component, ComponentType, EcsError, Entity, EntityId, EntityMut, EntityRef,
    IteratingSystem, Registry, System, SystemId, World,
};
pub use sandbox::{Sandbox, SandboxReport};
