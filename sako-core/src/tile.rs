use std::fmt;

use serde::{Deserialize, Serialize};

/// Edge length of a single tile in board pixels.
pub const TILE_SIZE: f64 = 100.0;
/// Edge length of the whole board in board pixels.
pub const BOARD_SIZE: f64 = 8.0 * TILE_SIZE;

/// Basic two dimensional point in board pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn add(self, other: Point) -> Point {
        Point {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    pub fn sub(self, other: Point) -> Point {
        Point {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Linear interpolation, `t = 0` yields `self`.
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

impl From<(f64, f64)> for Point {
    fn from(v: (f64, f64)) -> Self {
        Point { x: v.0, y: v.1 }
    }
}

/// A square on the board. Both coordinates are always in `0..8`; anything
/// off the board is expressed as `Option<Tile>` by the caller.
///
/// On the wire a tile is its board index `x + 8 * y`, the same encoding the
/// rules engine uses.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tile {
    x: u8,
    y: u8,
}

impl Tile {
    pub fn new(x: u8, y: u8) -> Option<Tile> {
        (x < 8 && y < 8).then_some(Tile { x, y })
    }

    pub fn from_index(index: u8) -> Option<Tile> {
        Tile::new(index % 8, index / 8)
    }

    pub fn x(self) -> u8 {
        self.x
    }

    pub fn y(self) -> u8 {
        self.y
    }

    pub fn index(self) -> u8 {
        self.x + 8 * self.y
    }

    /// Parses algebraic names like `e4`.
    pub fn from_name(name: &str) -> Option<Tile> {
        let mut chars = name.chars();
        let file = chars.next()?;
        let rank = chars.next()?;
        if chars.next().is_some() || !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return None;
        }
        Tile::new(file as u8 - b'a', rank as u8 - b'1')
    }

    pub fn name(self) -> String {
        format!("{}{}", (b'a' + self.x) as char, self.y + 1)
    }
}

impl TryFrom<u8> for Tile {
    type Error = String;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Tile::from_index(index).ok_or_else(|| format!("tile index {index} is off the board"))
    }
}

impl From<Tile> for u8 {
    fn from(tile: Tile) -> u8 {
        tile.index()
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tile({})", self.name())
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Which side of the board is drawn at the bottom of the screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardRotation {
    #[default]
    WhiteBottom,
    BlackBottom,
}

/// Top left corner of `tile` in board pixels.
pub fn coordinate_of_tile(tile: Tile, rotation: BoardRotation) -> Point {
    let (col, row) = match rotation {
        BoardRotation::WhiteBottom => (tile.x, 7 - tile.y),
        BoardRotation::BlackBottom => (7 - tile.x, tile.y),
    };
    Point {
        x: col as f64 * TILE_SIZE,
        y: row as f64 * TILE_SIZE,
    }
}

/// Inverse of [`coordinate_of_tile`]: any point inside a tile maps to it.
pub fn tile_of_coordinate(p: Point, rotation: BoardRotation) -> Option<Tile> {
    if !(0.0..BOARD_SIZE).contains(&p.x) || !(0.0..BOARD_SIZE).contains(&p.y) {
        return None;
    }
    let col = (p.x / TILE_SIZE).floor() as u8;
    let row = (p.y / TILE_SIZE).floor() as u8;
    match rotation {
        BoardRotation::WhiteBottom => Tile::new(col, 7 - row),
        BoardRotation::BlackBottom => Tile::new(7 - col, row),
    }
}
