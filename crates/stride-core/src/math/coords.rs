//! Coordinate selectors
//!
//! Optimization variables only live in the horizontal plane, while
//! states are queried in full 3D. Two small enums keep the two index
//! spaces apart at the type level.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Horizontal coordinate (x or y)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Coord2 {
    X,
    Y,
}

impl Coord2 {
    /// Both horizontal coordinates in storage order
    pub const ALL: [Coord2; 2] = [Coord2::X, Coord2::Y];

    /// Component index into a 2D or 3D vector
    pub const fn index(self) -> usize {
        match self {
            Coord2::X => 0,
            Coord2::Y => 1,
        }
    }
}

impl fmt::Display for Coord2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coord2::X => write!(f, "x"),
            Coord2::Y => write!(f, "y"),
        }
    }
}

/// Cartesian coordinate (x, y or z)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Coord3 {
    X,
    Y,
    Z,
}

impl Coord3 {
    /// All three coordinates in storage order
    pub const ALL: [Coord3; 3] = [Coord3::X, Coord3::Y, Coord3::Z];

    /// Component index into a 3D vector
    pub const fn index(self) -> usize {
        match self {
            Coord3::X => 0,
            Coord3::Y => 1,
            Coord3::Z => 2,
        }
    }

    /// Horizontal part of this coordinate, `None` for z
    pub const fn horizontal(self) -> Option<Coord2> {
        match self {
            Coord3::X => Some(Coord2::X),
            Coord3::Y => Some(Coord2::Y),
            Coord3::Z => None,
        }
    }
}

impl From<Coord2> for Coord3 {
    fn from(c: Coord2) -> Self {
        match c {
            Coord2::X => Coord3::X,
            Coord2::Y => Coord3::Y,
        }
    }
}

impl fmt::Display for Coord3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coord3::X => write!(f, "x"),
            Coord3::Y => write!(f, "y"),
            Coord3::Z => write!(f, "z"),
        }
    }
}
