use serde::Serialize;

use crate::ecs::{Component, ComponentType};

pub const POSITION: ComponentType = 1;
pub const COLOUR: ComponentType = 2;
pub const VELOCITY: ComponentType = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}
impl Component for Position {}

/// Heading in radians and speed in units per second
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Velocity {
    pub dir: f32,
    pub speed: f32,
}
impl Component for Velocity {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Colour {
    pub colour: String,
}
impl Component for Colour {}

impl Colour {
    /// Glyph used by the text renderer: the first hex digit after `#`, or the
    /// first character of a colour name.
    pub fn glyph(&self) -> char {
        self.colour
            .trim_start_matches('#')
            .chars()
            .next()
            .unwrap_or('*')
    }
}
