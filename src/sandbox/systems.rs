use std::f32::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::components::{Colour, Position, Velocity, COLOUR, POSITION, VELOCITY};
use super::grid::Grid;
use crate::ecs::{ComponentType, Entity, IteratingSystem, Registry};

/// Moves entities along their heading, picking a new random heading whenever
/// the next step would enter a wall.
pub struct MovementSystem {
    grid: Grid,
    rng: ChaCha8Rng,
    bounces: u64,
}

impl MovementSystem {
    pub fn new(grid: Grid, seed: u64) -> Self {
        Self {
            grid,
            rng: ChaCha8Rng::seed_from_u64(seed),
            bounces: 0,
        }
    }

    pub fn bounces(&self) -> u64 {
        self.bounces
    }
}

impl IteratingSystem for MovementSystem {
    fn required_components(&self) -> &[ComponentType] {
        &[POSITION, VELOCITY]
    }

    fn name(&self) -> &str {
        "movement"
    }

    fn process(&mut self, entity: Entity, elapsed: f64, world: &mut Registry) {
        let (Some(&velocity), Some(&position)) = (
            world.get_component::<Velocity>(entity, VELOCITY),
            world.get_component::<Position>(entity, POSITION),
        ) else {
            return;
        };

        let step = velocity.speed * elapsed as f32;
        let mut xo = velocity.dir.sin() * step;
        let mut yo = velocity.dir.cos() * step;

        if self.grid.is_blocked(position.x + xo, position.y + yo) {
            xo = 0.0;
            yo = 0.0;
            let dir = self.rng.gen_range(0.0..TAU);
            if let Some(velocity) = world.get_component_mut::<Velocity>(entity, VELOCITY) {
                velocity.dir = dir;
            }
            self.bounces += 1;
        }

        if let Some(position) = world.get_component_mut::<Position>(entity, POSITION) {
            position.x += xo;
            position.y += yo;
        }
    }
}

/// Draws every coloured entity into a character buffer the size of the grid,
/// one cell per character.
pub struct TextRenderSystem {
    grid: Grid,
    frame: Vec<Vec<char>>,
    frames_drawn: u64,
}

impl TextRenderSystem {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            frame: Vec::new(),
            frames_drawn: 0,
        }
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// The last completed frame, one line per grid row.
    pub fn render(&self) -> String {
        self.frame
            .iter()
            .map(|row| row.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn clear(&mut self) {
        let size = self.grid.cell_size();
        let (width, height) = (self.grid.width(), self.grid.height());
        self.frame.resize_with(height, Vec::new);
        for (y, row) in self.frame.iter_mut().enumerate() {
            row.clear();
            for x in 0..width {
                let (cx, cy) = ((x as f32 + 0.5) * size, (y as f32 + 0.5) * size);
                row.push(if self.grid.is_blocked(cx, cy) { '#' } else { '.' });
            }
        }
    }
}

impl IteratingSystem for TextRenderSystem {
    fn required_components(&self) -> &[ComponentType] {
        &[POSITION, COLOUR]
    }

    fn name(&self) -> &str {
        "text_render"
    }

    fn on_registered(&mut self, _world: &mut Registry) {
        self.clear();
        debug!(
            width = self.grid.width(),
            height = self.grid.height(),
            "text renderer attached"
        );
    }

    fn on_begin(&mut self, _world: &mut Registry) {
        self.clear();
    }

    fn process(&mut self, entity: Entity, _elapsed: f64, world: &mut Registry) {
        let (Some(position), Some(colour)) = (
            world.get_component::<Position>(entity, POSITION),
            world.get_component::<Colour>(entity, COLOUR),
        ) else {
            return;
        };
        if let Some((cx, cy)) = self.grid.cell_at(position.x, position.y) {
            self.frame[cy][cx] = colour.glyph();
        }
    }

    fn on_end(&mut self, _world: &mut Registry) {
        self.frames_drawn += 1;
    }
}
