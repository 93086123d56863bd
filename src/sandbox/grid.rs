use crate::config::MapConfig;

/// Square-celled wall map
#[derive(Debug, Clone)]
pub struct Grid {
    cell_size: f32,
    cells: Vec<Vec<u8>>,
}

impl Grid {
    pub fn new(cell_size: f32, cells: Vec<Vec<u8>>) -> Self {
        Self { cell_size, cells }
    }

    pub fn from_config(config: &MapConfig) -> Self {
        Self::new(config.cell_size, config.cells.clone())
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn width(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    /// Cell containing the point, truncating toward zero.
    pub fn cell_at(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        let cx = (x / self.cell_size) as i64;
        let cy = (y / self.cell_size) as i64;
        if cx < 0 || cy < 0 {
            return None;
        }
        let (cx, cy) = (cx as usize, cy as usize);
        (cy < self.height() && cx < self.width()).then_some((cx, cy))
    }

    /// Walls and anything off the map block movement.
    pub fn is_blocked(&self, x: f32, y: f32) -> bool {
        self.cell_at(x, y)
            .map_or(true, |(cx, cy)| self.cells[cy][cx] != 0)
    }
}
