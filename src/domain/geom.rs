/// Grid coordinates and world-plane positions.
///
/// The maze is a grid of cells; actors move continuously on the floor plane
/// in world units, `cell_size` world units per cell. Cell `(x, z)` is centred
/// on world point `(x * cell_size, z * cell_size)`.

use std::fmt;
use std::ops::{Add, Mul, Sub};

/// A grid cell. Signed so that off-grid queries are representable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Coord {
    pub x: i32,
    pub z: i32,
}

impl Coord {
    pub const fn new(x: i32, z: i32) -> Self {
        Coord { x, z }
    }

    pub fn manhattan(self, other: Coord) -> i32 {
        (self.x - other.x).abs() + (self.z - other.z).abs()
    }

    /// The four cardinal neighbours, in a fixed order.
    pub fn neighbors(self) -> [Coord; 4] {
        [
            Coord::new(self.x, self.z + 1),
            Coord::new(self.x, self.z - 1),
            Coord::new(self.x + 1, self.z),
            Coord::new(self.x - 1, self.z),
        ]
    }

    /// World position of the cell centre.
    pub fn center(self, cell_size: f32) -> Vec2 {
        Vec2::new(self.x as f32 * cell_size, self.z as f32 * cell_size)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.x, self.z)
    }
}

/// A point (or direction) on the floor plane, in world units.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vec2 {
    pub x: f32,
    pub z: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, z: 0.0 };

    pub const fn new(x: f32, z: f32) -> Self {
        Vec2 { x, z }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.z * self.z).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction; zero stays zero.
    pub fn normalized(self) -> Vec2 {
        let len = self.length();
        if len <= f32::EPSILON {
            Vec2::ZERO
        } else {
            Vec2::new(self.x / len, self.z / len)
        }
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.z * other.z
    }

    /// Unsigned angle in radians between two directions. Zero vectors give PI.
    pub fn angle_to(self, other: Vec2) -> f32 {
        let denom = self.length() * other.length();
        if denom <= f32::EPSILON {
            return std::f32::consts::PI;
        }
        (self.dot(other) / denom).clamp(-1.0, 1.0).acos()
    }

    /// The cell containing this point: nearest cell centre, halves rounding up.
    pub fn cell(self, cell_size: f32) -> Coord {
        let half = cell_size / 2.0;
        Coord::new(
            ((self.x + half) / cell_size).floor() as i32,
            ((self.z + half) / cell_size).floor() as i32,
        )
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.z * rhs)
    }
}

/// Maximum range of a shot, world units.
pub const FIRE_RANGE: f32 = 20.0;
/// Half-angle of the cone a shot can hit, radians.
pub const FIRE_CONE: f32 = 0.3;

/// Would a shot fired from `origin` along `facing` hit something standing at `target`?
/// Hit detection belongs to the player controller; this is the cone test it uses.
pub fn in_line_of_fire(origin: Vec2, facing: Vec2, target: Vec2) -> bool {
    let to_target = target - origin;
    to_target.length() < FIRE_RANGE && to_target.angle_to(facing) < FIRE_CONE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_rounds_to_nearest_centre() {
        let cs = 4.0;
        assert_eq!(Vec2::new(4.0, 4.0).cell(cs), Coord::new(1, 1));
        assert_eq!(Vec2::new(5.9, 2.1).cell(cs), Coord::new(1, 1));
        assert_eq!(Vec2::new(6.0, 1.9).cell(cs), Coord::new(2, 0));
        assert_eq!(Vec2::new(-2.1, 0.0).cell(cs), Coord::new(-1, 0));
    }

    #[test]
    fn centre_maps_back_to_same_cell() {
        let c = Coord::new(7, 3);
        assert_eq!(c.center(4.0).cell(4.0), c);
    }

    #[test]
    fn normalizing_zero_is_zero() {
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
        let n = Vec2::new(3.0, 4.0).normalized();
        assert!((n.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn fire_cone_respects_range_and_angle() {
        let origin = Vec2::new(0.0, 0.0);
        let east = Vec2::new(1.0, 0.0);
        assert!(in_line_of_fire(origin, east, Vec2::new(10.0, 1.0)));
        assert!(!in_line_of_fire(origin, east, Vec2::new(25.0, 0.0)));
        assert!(!in_line_of_fire(origin, east, Vec2::new(0.0, 5.0)));
        assert!(!in_line_of_fire(origin, east, Vec2::new(-5.0, 0.0)));
    }

    #[test]
    fn coord_displays_as_collection_key() {
        assert_eq!(Coord::new(4, 9).to_string(), "4-9");
    }
}
