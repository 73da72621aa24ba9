//! Footholds
//!
//! A contact is the world position where an endeffector touches the
//! ground, tagged with the endeffector it belongs to.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Vec2, Vec3};

/// Identifier of a robot limb's point of ground contact (a foot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EndeffectorId(pub usize);

impl EndeffectorId {
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EndeffectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ee{}", self.0)
    }
}

/// Foothold of one endeffector in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Foothold position [m] (world frame)
    pub position: Vec3,
    /// Endeffector standing on this foothold
    pub ee: EndeffectorId,
}

impl Contact {
    pub fn new(position: Vec3, ee: EndeffectorId) -> Self {
        Self { position, ee }
    }

    /// Horizontal (x, y) part of the position
    pub fn xy(&self) -> Vec2 {
        self.position.xy()
    }

    /// Overwrite the horizontal position, keeping the ground height
    pub fn set_xy(&mut self, xy: &Vec2) {
        self.position.x = xy.x;
        self.position.y = xy.y;
    }
}
