//! Headless wandering-balls scenario built on the ECS runtime
//!
//! Balls spawn on a walled grid, walk along a heading and pick a new random
//! heading whenever they would step into a wall. A text renderer draws the
//! grid once per frame.

pub mod components;
pub mod grid;
pub mod prefabs;
pub mod systems;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{ensure, Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SandboxConfig;
use crate::ecs::World;
use components::{Position, POSITION, VELOCITY};
use grid::Grid;
use systems::{MovementSystem, TextRenderSystem};

pub struct Sandbox {
    config: SandboxConfig,
    world: World,
    movement: Rc<RefCell<MovementSystem>>,
    renderer: Rc<RefCell<TextRenderSystem>>,
    frame: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SandboxReport {
    pub scenario: String,
    pub frames: u64,
    pub elapsed_seconds: f64,
    pub entities: usize,
    pub bounces: u64,
    pub positions: Vec<Position>,
}

impl Sandbox {
    pub fn new(config: SandboxConfig) -> Result<Self> {
        config.validate()?;
        ensure!(
            config.ecs.max_components > VELOCITY,
            "max_components must be at least {}",
            VELOCITY + 1
        );

        let grid = Grid::from_config(&config.map);
        let mut world = World::new(config.ecs);
        let movement = world.add_system(MovementSystem::new(grid.clone(), config.seed))?;
        let renderer = world.add_system(TextRenderSystem::new(grid.clone()))?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(1));
        for index in 0..config.entities {
            prefabs::wanderer(world.registry_mut(), &grid, &config.spawn, &mut rng)
                .with_context(|| format!("no open cell to place entity {index}"))?;
        }

        info!(
            scenario = %config.name,
            entities = config.entities,
            "sandbox ready"
        );

        Ok(Self {
            config,
            world,
            movement,
            renderer,
            frame: 0,
        })
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Advance one frame of `frame_seconds`.
    pub fn step(&mut self) {
        self.world.update(self.config.frame_seconds);
        self.frame += 1;
    }

    pub fn run(&mut self, frames: u64) -> SandboxReport {
        for _ in 0..frames {
            self.step();
        }
        debug!(frame = self.frame, "sandbox run finished");
        self.report()
    }

    /// Last frame drawn by the text renderer
    pub fn render(&self) -> String {
        self.renderer.borrow().render()
    }

    pub fn report(&self) -> SandboxReport {
        let registry = self.world.registry();
        let positions = registry
            .alive_entities()
            .filter_map(|entity| registry.get_component::<Position>(entity, POSITION).copied())
            .collect();
        SandboxReport {
            scenario: self.config.name.clone(),
            frames: self.frame,
            elapsed_seconds: self.frame as f64 * self.config.frame_seconds,
            entities: self.world.entity_count(),
            bounces: self.movement.borrow().bounces(),
            positions,
        }
    }
}
