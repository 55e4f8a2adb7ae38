/// Bystanders: the characters the player did not pick.
///
/// They amble between random nearby points and die if the pursuer gets
/// close. Dead bystanders stay where they fell.

use rand::Rng;

use crate::config::BystanderTuning;

use super::cell::Cell;
use super::character::CharacterId;
use super::geom::{Coord, Vec2};
use super::maze::Grid;

#[derive(Clone, Debug)]
pub struct Bystander {
    id: CharacterId,
    pos: Vec2,
    target: Vec2,
    alive: bool,
}

impl Bystander {
    /// Drop `id` on a random empty cell. `None` if no such cell turned up.
    pub fn spawn(
        id: CharacterId,
        grid: &Grid,
        tuning: &BystanderTuning,
        cell_size: f32,
        rng: &mut impl Rng,
    ) -> Option<Self> {
        let size = grid.size() as i32;
        if size < 3 {
            return None;
        }
        for _ in 0..tuning.spawn_attempts {
            let c = Coord::new(rng.gen_range(1..size - 1), rng.gen_range(1..size - 1));
            if grid.get(c) == Cell::Empty {
                let pos = c.center(cell_size);
                return Some(Bystander { id, pos, target: pos, alive: true });
            }
        }
        tracing::debug!(who = id.name(), "no room to place bystander");
        None
    }

    pub fn id(&self) -> CharacterId {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.pos
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Advance one frame. Returns `true` on the frame this bystander dies.
    pub fn update(
        &mut self,
        grid: &Grid,
        pursuer: Vec2,
        tuning: &BystanderTuning,
        cell_size: f32,
        dt: f32,
        rng: &mut impl Rng,
    ) -> bool {
        if !self.alive {
            return false;
        }
        if self.pos.distance(pursuer) < tuning.kill_distance {
            self.alive = false;
            return true;
        }

        let to_target = self.target - self.pos;
        if to_target.length() < tuning.arrive_distance {
            let r = tuning.wander_radius;
            let candidate = self.pos + Vec2::new(rng.gen_range(-r..=r), rng.gen_range(-r..=r));
            if grid.is_walkable(candidate.cell(cell_size)) {
                self.target = candidate;
            }
            return false;
        }

        let step = (tuning.speed * dt).min(to_target.length());
        let next = self.pos + to_target.normalized() * step;
        if grid.is_walkable(next.cell(cell_size)) {
            self.pos = next;
        } else {
            // Blocked: give up on this target.
            self.target = self.pos;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const CS: f32 = 4.0;

    fn room() -> Grid {
        Grid::from_rows(&[
            "#######",
            "#S....#",
            "#.....#",
            "#.....#",
            "#.....#",
            "#....E#",
            "#######",
        ])
    }

    #[test]
    fn spawns_on_an_empty_cell() {
        let grid = room();
        let mut rng = StdRng::seed_from_u64(1);
        for id in CharacterId::others(CharacterId::Abdullah) {
            let b = Bystander::spawn(id, &grid, &BystanderTuning::default(), CS, &mut rng).unwrap();
            assert_eq!(grid.get(b.position().cell(CS)), Cell::Empty);
            assert!(b.is_alive());
        }
    }

    #[test]
    fn no_empty_cell_means_no_spawn() {
        let grid = Grid::from_rows(&["###", "#S#", "###"]);
        let mut rng = StdRng::seed_from_u64(2);
        assert!(Bystander::spawn(CharacterId::Qais, &grid, &BystanderTuning::default(), CS, &mut rng).is_none());
    }

    #[test]
    fn wanders_without_leaving_open_floor() {
        let grid = room();
        let tuning = BystanderTuning::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut b = Bystander::spawn(CharacterId::Hamza, &grid, &tuning, CS, &mut rng).unwrap();
        let far = Vec2::new(-100.0, -100.0);
        let origin = b.position();
        let mut moved = false;
        for _ in 0..400 {
            assert!(!b.update(&grid, far, &tuning, CS, 0.05, &mut rng));
            assert!(grid.is_walkable(b.position().cell(CS)));
            moved |= b.position() != origin;
        }
        assert!(moved);
    }

    #[test]
    fn dies_once_when_pursuer_is_close() {
        let grid = room();
        let tuning = BystanderTuning::default();
        let mut rng = StdRng::seed_from_u64(4);
        let mut b = Bystander::spawn(CharacterId::Munther, &grid, &tuning, CS, &mut rng).unwrap();
        let at = b.position();

        assert!(b.update(&grid, at + Vec2::new(1.0, 0.0), &tuning, CS, 0.1, &mut rng));
        assert!(!b.is_alive());
        assert!(!b.update(&grid, at, &tuning, CS, 0.1, &mut rng));
        assert_eq!(b.position(), at);
    }
}
