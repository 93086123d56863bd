use std::f32::consts::TAU;

use rand::Rng;

use super::components::{Colour, Position, Velocity, COLOUR, POSITION, VELOCITY};
use super::grid::Grid;
use crate::config::SpawnConfig;
use crate::ecs::{Entity, Registry};

const PLACEMENT_ATTEMPTS: usize = 64;

/// Spawn a wandering ball at a random open spot inside the spawn area.
///
/// Returns `None` when no open cell was found after a bounded number of
/// attempts; nothing is created in that case.
pub fn wanderer<R: Rng>(
    world: &mut Registry,
    grid: &Grid,
    spawn: &SpawnConfig,
    rng: &mut R,
) -> Option<Entity> {
    let (x, y) = (0..PLACEMENT_ATTEMPTS)
        .map(|_| {
            (
                rng.gen_range(spawn.x[0]..=spawn.x[1]).floor(),
                rng.gen_range(spawn.y[0]..=spawn.y[1]).floor(),
            )
        })
        .find(|&(x, y)| !grid.is_blocked(x, y))?;

    let velocity = Velocity {
        dir: rng.gen_range(0.0..TAU),
        speed: rng.gen_range(0.0..=spawn.max_speed).floor(),
    };

    let entity = world.create();
    world
        .entity_mut(entity)
        .add(Position { x, y }, POSITION)
        .add(velocity, VELOCITY)
        .add(
            Colour {
                colour: spawn.colour.clone(),
            },
            COLOUR,
        );
    Some(entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EcsConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_wanderer_lands_on_open_floor() {
        let grid = Grid::new(10.0, vec![vec![1, 1, 1], vec![1, 0, 1], vec![1, 1, 1]]);
        let spawn = SpawnConfig {
            x: [5.0, 24.0],
            y: [5.0, 24.0],
            ..SpawnConfig::default()
        };
        let mut registry = Registry::new(EcsConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let entity = wanderer(&mut registry, &grid, &spawn, &mut rng).expect("open cell exists");
        let position = registry.get_component::<Position>(entity, POSITION).unwrap();
        assert_eq!(grid.cell_at(position.x, position.y), Some((1, 1)));
        assert!(registry.has_component(entity, VELOCITY));
        assert_eq!(
            registry.get_component::<Colour>(entity, COLOUR).map(|c| c.colour.as_str()),
            Some("#030")
        );
    }

    #[test]
    fn test_wanderer_gives_up_on_solid_area() {
        let grid = Grid::new(10.0, vec![vec![1, 1], vec![1, 1]]);
        let mut registry = Registry::new(EcsConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        assert!(wanderer(&mut registry, &grid, &SpawnConfig::default(), &mut rng).is_none());
        assert_eq!(registry.entity_count(), 0);
    }
}
