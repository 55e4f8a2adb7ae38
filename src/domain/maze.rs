/// Procedural maze generation.
///
/// Steps, for a square grid of side `base + 2*level`:
///   1. Fill with walls.
///   2. Recursive-backtracker carve from (1,1) over odd cells → a perfect maze.
///   3. Punch `2*side` random openings for loops and shortcuts.
///   4. START at (1,1); EXIT at (side-2, side-2) with a two-cell approach.
///   5. Re-wall any opening the loop pass left cut off from START.
///   6. Rejection-sample item cells (keys, one weapon, 1–2 ammo).
///
/// The grid is immutable once handed out; pickups are tracked by the session.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::MazeTuning;

use super::cell::Cell;
use super::geom::Coord;

/// Grids smaller than this cannot hold a start, an exit and a border.
const MIN_SIDE: usize = 5;

const CARVE_DIRS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

// ── Grid ──

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn filled(size: usize, cell: Cell) -> Self {
        Grid { size, cells: vec![cell; size * size] }
    }

    /// Build a grid from a diagram. Legend:
    /// `#`=Wall `S`=Start `E`=Exit `k`=Key `w`=Weapon `a`=Ammo, anything else Empty.
    /// Rows shorter than the first are padded with walls.
    pub fn from_rows(rows: &[&str]) -> Self {
        let size = rows.len().max(rows.first().map_or(0, |r| r.chars().count()));
        let mut grid = Grid::filled(size, Cell::Wall);
        for (z, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let cell = match ch {
                    '#' => Cell::Wall,
                    'S' => Cell::Start,
                    'E' => Cell::Exit,
                    'k' => Cell::Key,
                    'w' => Cell::Weapon,
                    'a' => Cell::Ammo,
                    _ => Cell::Empty,
                };
                grid.set(Coord::new(x as i32, z as i32), cell);
            }
        }
        grid
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn in_bounds(&self, c: Coord) -> bool {
        c.x >= 0 && c.z >= 0 && (c.x as usize) < self.size && (c.z as usize) < self.size
    }

    /// Cell at `c`. Out of bounds = wall.
    #[inline]
    pub fn get(&self, c: Coord) -> Cell {
        if self.in_bounds(c) {
            self.cells[c.z as usize * self.size + c.x as usize]
        } else {
            Cell::Wall
        }
    }

    #[inline]
    pub fn is_walkable(&self, c: Coord) -> bool {
        self.get(c).is_walkable()
    }

    fn set(&mut self, c: Coord, cell: Cell) {
        if self.in_bounds(c) {
            self.cells[c.z as usize * self.size + c.x as usize] = cell;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coord, Cell)> + '_ {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &cell)| (Coord::new((i % size) as i32, (i / size) as i32), cell))
    }

    pub fn find(&self, target: Cell) -> Option<Coord> {
        self.iter().find(|&(_, cell)| cell == target).map(|(c, _)| c)
    }

    pub fn count(&self, target: Cell) -> usize {
        self.cells.iter().filter(|&&cell| cell == target).count()
    }

    pub fn start(&self) -> Coord {
        self.find(Cell::Start).unwrap_or(Coord::new(1, 1))
    }

    /// Row-major integer codes, `codes()[z][x]`.
    pub fn codes(&self) -> Vec<Vec<u8>> {
        self.cells.chunks(self.size.max(1)).map(|row| row.iter().map(|c| c.code()).collect()).collect()
    }

    /// Walkable cells reachable from `from` by 4-connected steps.
    pub fn reachable_from(&self, from: Coord) -> Vec<bool> {
        let mut seen = vec![false; self.size * self.size];
        if !self.is_walkable(from) {
            return seen;
        }
        let mut stack = vec![from];
        seen[from.z as usize * self.size + from.x as usize] = true;
        while let Some(c) = stack.pop() {
            for n in c.neighbors() {
                if !self.is_walkable(n) {
                    continue;
                }
                let idx = n.z as usize * self.size + n.x as usize;
                if !seen[idx] {
                    seen[idx] = true;
                    stack.push(n);
                }
            }
        }
        seen
    }
}

// ══════════════════════════════════════════════════════════════
// Generation
// ══════════════════════════════════════════════════════════════

/// Generate the maze for `level`. Not reproducible unless `rng` is seeded.
pub fn generate(level: u32, tuning: &MazeTuning, rng: &mut impl Rng) -> Grid {
    let size = tuning.side_for(level).max(MIN_SIDE);
    let mut grid = Grid::filled(size, Cell::Wall);

    carve(&mut grid, rng);
    punch_loops(&mut grid, tuning.loops_per_side * size, rng);

    let start = Coord::new(1, 1);
    let e = size as i32 - 2;
    let exit = Coord::new(e, e);
    grid.set(start, Cell::Start);
    grid.set(exit, Cell::Empty);
    grid.set(Coord::new(e - 1, e), Cell::Empty);
    grid.set(Coord::new(e, e - 1), Cell::Empty);
    grid.set(exit, Cell::Exit);

    seal_unreachable(&mut grid, start);

    let keys = place_items(&mut grid, Cell::Key, level as usize, tuning, rng);
    let weapons = place_items(&mut grid, Cell::Weapon, 1, tuning, rng);
    let ammo_wanted = rng.gen_range(0..3).max(1);
    let ammo = place_items(&mut grid, Cell::Ammo, ammo_wanted, tuning, rng);

    tracing::debug!(level, size, keys, weapons, ammo, "maze generated");
    grid
}

struct CarveFrame {
    at: Coord,
    dirs: [(i32, i32); 4],
    next: usize,
}

/// Recursive backtracker, unrolled onto an explicit stack so large levels
/// cannot overflow the call stack.
fn carve(grid: &mut Grid, rng: &mut impl Rng) {
    let limit = grid.size as i32 - 1;
    let origin = Coord::new(1, 1);
    grid.set(origin, Cell::Empty);

    let mut stack = vec![shuffled_frame(origin, rng)];
    while let Some(top) = stack.last_mut() {
        if top.next == top.dirs.len() {
            stack.pop();
            continue;
        }
        let (dx, dz) = top.dirs[top.next];
        top.next += 1;
        let here = top.at;

        let next = Coord::new(here.x + dx * 2, here.z + dz * 2);
        if next.x > 0 && next.x < limit && next.z > 0 && next.z < limit && grid.get(next) == Cell::Wall {
            grid.set(Coord::new(here.x + dx, here.z + dz), Cell::Empty);
            grid.set(next, Cell::Empty);
            stack.push(shuffled_frame(next, rng));
        }
    }
}

fn shuffled_frame(at: Coord, rng: &mut impl Rng) -> CarveFrame {
    let mut dirs = CARVE_DIRS;
    dirs.shuffle(rng);
    CarveFrame { at, dirs, next: 0 }
}

fn punch_loops(grid: &mut Grid, count: usize, rng: &mut impl Rng) {
    let hi = grid.size as i32 - 1;
    for _ in 0..count {
        let x = rng.gen_range(1..hi);
        let z = rng.gen_range(1..hi);
        grid.set(Coord::new(x, z), Cell::Empty);
    }
}

/// Openings the loop pass punched into solid rock are walled up again.
fn seal_unreachable(grid: &mut Grid, start: Coord) {
    let reach = grid.reachable_from(start);
    let mut sealed = 0usize;
    for (i, seen) in reach.into_iter().enumerate() {
        if !seen && grid.cells[i] != Cell::Wall {
            grid.cells[i] = Cell::Wall;
            sealed += 1;
        }
    }
    if sealed > 0 {
        tracing::trace!(sealed, "sealed unreachable openings");
    }
}

/// Rejection-sample `count` interior EMPTY cells outside the start square.
/// Returns how many were placed; starvation silently places fewer.
fn place_items(grid: &mut Grid, item: Cell, count: usize, tuning: &MazeTuning, rng: &mut impl Rng) -> usize {
    let hi = grid.size as i32 - 1;
    let clear = tuning.start_clearance as i32;
    let mut placed = 0;
    let mut attempts = 0;
    while placed < count && attempts < tuning.placement_attempts {
        let c = Coord::new(rng.gen_range(1..hi), rng.gen_range(1..hi));
        if grid.get(c) == Cell::Empty && (c.x > clear || c.z > clear) {
            grid.set(c, item);
            placed += 1;
        }
        attempts += 1;
    }
    if placed < count {
        tracing::debug!(?item, requested = count, placed, "item placement starved");
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;

    /// Flood fill written independently of `Grid::reachable_from`.
    fn flood(grid: &Grid, from: Coord) -> std::collections::HashSet<Coord> {
        let mut seen = std::collections::HashSet::new();
        let mut queue = std::collections::VecDeque::from([from]);
        seen.insert(from);
        while let Some(c) = queue.pop_front() {
            for (dx, dz) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let n = Coord::new(c.x + dx, c.z + dz);
                if grid.get(n) != Cell::Wall && seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        seen
    }

    #[rstest]
    fn every_open_cell_is_reachable(#[values(1, 2, 3, 4, 6, 9)] level: u32, #[values(1, 7, 42)] seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let grid = generate(level, &MazeTuning::default(), &mut rng);
        let reached = flood(&grid, grid.start());
        for (c, cell) in grid.iter() {
            if cell != Cell::Wall {
                assert!(reached.contains(&c), "level {level} seed {seed}: {c} ({cell:?}) unreachable");
            }
        }
    }

    #[rstest]
    fn one_start_one_exit_and_solid_border(#[values(1, 2, 5)] level: u32, #[values(3, 11)] seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let grid = generate(level, &MazeTuning::default(), &mut rng);
        let size = grid.size() as i32;

        assert_eq!(grid.size(), 10 + 2 * level as usize);
        assert_eq!(grid.count(Cell::Start), 1);
        assert_eq!(grid.count(Cell::Exit), 1);
        assert_eq!(grid.get(Coord::new(1, 1)), Cell::Start);
        assert_eq!(grid.get(Coord::new(size - 2, size - 2)), Cell::Exit);

        for i in 0..size {
            for c in [Coord::new(i, 0), Coord::new(i, size - 1), Coord::new(0, i), Coord::new(size - 1, i)] {
                assert_eq!(grid.get(c), Cell::Wall, "border cell {c} is open");
            }
        }
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(6)]
    fn item_counts_stay_within_requests(#[case] level: u32) {
        let mut rng = StdRng::seed_from_u64(level as u64 * 31);
        let grid = generate(level, &MazeTuning::default(), &mut rng);

        assert!(grid.count(Cell::Key) <= level as usize);
        assert!(grid.count(Cell::Weapon) <= 1);
        let ammo = grid.count(Cell::Ammo);
        assert!(ammo <= 2);

        for (c, cell) in grid.iter() {
            if cell.is_item() {
                assert!(c.x > 3 || c.z > 3, "{cell:?} placed in start square at {c}");
            }
        }
    }

    #[test]
    fn roomy_levels_get_every_item() {
        let mut rng = StdRng::seed_from_u64(5);
        let grid = generate(4, &MazeTuning::default(), &mut rng);
        assert_eq!(grid.count(Cell::Key), 4);
        assert_eq!(grid.count(Cell::Weapon), 1);
        assert!((1..=2).contains(&grid.count(Cell::Ammo)));
    }

    #[test]
    fn starved_placement_places_fewer_items() {
        // 5x5 grid: every interior cell lies inside the start square.
        let tuning = MazeTuning { base_size: 5, size_per_level: 0, ..MazeTuning::default() };
        let mut rng = StdRng::seed_from_u64(9);
        let grid = generate(3, &tuning, &mut rng);
        assert_eq!(grid.size(), 5);
        assert_eq!(grid.count(Cell::Key), 0);
        assert_eq!(grid.count(Cell::Weapon), 0);
        assert_eq!(grid.count(Cell::Exit), 1);
    }

    #[test]
    fn tiny_configured_side_is_clamped() {
        let tuning = MazeTuning { base_size: 1, size_per_level: 0, ..MazeTuning::default() };
        let mut rng = StdRng::seed_from_u64(0);
        let grid = generate(1, &tuning, &mut rng);
        assert_eq!(grid.size(), MIN_SIDE);
    }

    #[test]
    fn from_rows_reads_the_legend() {
        let grid = Grid::from_rows(&[
            "#####",
            "#S.k#",
            "#.#w#",
            "#a.E#",
            "#####",
        ]);
        assert_eq!(grid.start(), Coord::new(1, 1));
        assert_eq!(grid.find(Cell::Exit), Some(Coord::new(3, 3)));
        assert_eq!(grid.get(Coord::new(3, 1)), Cell::Key);
        assert_eq!(grid.get(Coord::new(9, 9)), Cell::Wall);
        assert_eq!(grid.codes()[3], vec![1, 6, 0, 3, 1]);
    }
}
