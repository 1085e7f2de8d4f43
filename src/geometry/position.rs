//! Position - a point of the tower lattice in 3D space

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A 3D position. Planar data is lifted to `z = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Create a planar position (z = 0)
    pub fn planar(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0)
    }

    /// Read a `[x, y]` or `[x, y, z]` JSON array.
    ///
    /// Anything else (wrong arity, non-numeric component) yields `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        let items = value.as_array()?;
        let mut coords = [0.0; 3];
        match items.len() {
            2 | 3 => {
                for (slot, item) in coords.iter_mut().zip(items) {
                    *slot = item.as_f64().filter(|v| v.is_finite())?;
                }
            }
            _ => return None,
        }
        Some(Self::new(coords[0], coords[1], coords[2]))
    }

    /// Get the coordinates as an array
    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Calculate distance to another position
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn midpoint(&self, other: &Position) -> Position {
        Position::new(
            (self.x + other.x) / 2.0,
            (self.y + other.y) / 2.0,
            (self.z + other.z) / 2.0,
        )
    }

    /// Exact identity key. Two positions share a key iff every component is
    /// numerically equal.
    pub fn key(&self) -> PositionKey {
        PositionKey([bits(self.x), bits(self.y), bits(self.z)])
    }
}

// -0.0 == 0.0 numerically, so both must map to the same bit pattern.
fn bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0_f64.to_bits()
    } else {
        v.to_bits()
    }
}

impl From<[f64; 3]> for Position {
    fn from(c: [f64; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

impl From<Position> for [f64; 3] {
    fn from(p: Position) -> Self {
        p.coords()
    }
}

/// Hashable identity of a [`Position`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionKey([u64; 3]);

/// Axis-aligned bounding box of a set of positions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Position,
    pub max: Position,
}

impl Bounds {
    pub fn from_positions<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Option<Self> {
        let mut iter = positions.into_iter();
        let first = *iter.next()?;
        let mut bounds = Bounds { min: first, max: first };
        for p in iter {
            bounds.min = Position::new(bounds.min.x.min(p.x), bounds.min.y.min(p.y), bounds.min.z.min(p.z));
            bounds.max = Position::new(bounds.max.x.max(p.x), bounds.max.y.max(p.y), bounds.max.z.max(p.z));
        }
        Some(bounds)
    }

    pub fn center(&self) -> Position {
        self.min.midpoint(&self.max)
    }

    pub fn size(&self) -> [f64; 3] {
        [
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        ]
    }
}
