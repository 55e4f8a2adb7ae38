/// Game: one maze, one session, one pursuer and the bystanders, stepped together.
///
/// Frame order in [`Game::update`]:
///   1. Session clock (whole-second ticker, due timers)
///   2. Pursuer (may capture or shout)
///   3. Bystanders (may die)
///   4. Drain events for presentation
///
/// The player controller lives outside; it calls [`Game::try_move`] /
/// [`Game::move_player`] and the combat actions.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Tuning;
use crate::domain::cell::Cell;
use crate::domain::character::CharacterId;
use crate::domain::geom::{in_line_of_fire, Coord, Vec2};
use crate::domain::maze::{self, Grid};
use crate::domain::npc::Bystander;
use crate::domain::pursuer::{Boss, Pursuer, PursuerSignal, PursuitView};

use super::event::GameEvent;
use super::session::{Phase, Session};

/// Outcome of pulling the trigger.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Shot {
    /// No weapon, or no ammo.
    Dry,
    Miss,
    Hit(Boss),
}

pub struct Game {
    rng: StdRng,
    session: Session,
    grid: Grid,
    pursuer: Pursuer,
    bystanders: Vec<Bystander>,
    player: Vec2,
    facing: Vec2,
}

// ── Construction ──

impl Game {
    pub fn new(tuning: Tuning) -> Self {
        Self::from_rng(tuning, StdRng::from_entropy())
    }

    /// Deterministic game for tests and demos.
    pub fn with_seed(tuning: Tuning, seed: u64) -> Self {
        Self::from_rng(tuning, StdRng::seed_from_u64(seed))
    }

    fn from_rng(tuning: Tuning, mut rng: StdRng) -> Self {
        let grid = maze::generate(1, &tuning.maze, &mut rng);
        let player = grid.start().center(tuning.maze.cell_size);
        let pursuer = Pursuer::new(player, &tuning.pursuer);
        let mut game = Game {
            rng,
            session: Session::new(tuning),
            grid,
            pursuer,
            bystanders: Vec::new(),
            player,
            facing: Vec2::new(1.0, 0.0),
        };
        game.load_level();
        game
    }

    /// Fresh maze for the session's current level, with everyone re-placed.
    fn load_level(&mut self) {
        let tuning = self.session.tuning();
        let cs = tuning.maze.cell_size;
        let level = self.session.level();

        self.grid = maze::generate(level, &tuning.maze, &mut self.rng);
        let start = self.grid.start();
        self.player = start.center(cs);
        self.facing = Vec2::new(1.0, 0.0);

        let spawn = Pursuer::spawn_cell(&self.grid, start, &tuning.pursuer, &mut self.rng);
        self.pursuer = Pursuer::new(spawn.center(cs), &tuning.pursuer);

        let chosen = self.session.character();
        self.bystanders = CharacterId::others(chosen)
            .filter_map(|id| Bystander::spawn(id, &self.grid, &tuning.bystanders, cs, &mut self.rng))
            .collect();

        tracing::debug!(level, size = self.grid.size(), %spawn, bystanders = self.bystanders.len(), "level loaded");
    }
}

// ── Read access ──

impl Game {
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn pursuer(&self) -> &Pursuer {
        &self.pursuer
    }

    pub fn bystanders(&self) -> &[Bystander] {
        &self.bystanders
    }

    pub fn player(&self) -> Vec2 {
        self.player
    }

    pub fn facing(&self) -> Vec2 {
        self.facing
    }

    pub fn cell_size(&self) -> f32 {
        self.session.tuning().maze.cell_size
    }

    /// Is the item in `cell` still lying on the floor?
    pub fn item_visible(&self, at: Coord) -> bool {
        match self.grid.get(at) {
            Cell::Key | Cell::Ammo => !self.session.is_collected(at),
            Cell::Weapon => !self.session.has_weapon(),
            _ => false,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Commands
// ══════════════════════════════════════════════════════════════

impl Game {
    pub fn select_character(&mut self, who: CharacterId) -> bool {
        if !self.session.select_character(who, &mut self.rng) {
            return false;
        }
        self.load_level();
        true
    }

    pub fn proceed(&mut self) -> bool {
        self.session.proceed()
    }

    pub fn reinitialize(&mut self) -> bool {
        self.session.reinitialize()
    }

    pub fn increment_struggle(&mut self) -> bool {
        self.session.increment_struggle()
    }

    pub fn toggle_light(&mut self) -> bool {
        self.session.toggle_light()
    }

    pub fn fire_weapon(&mut self) -> bool {
        self.session.fire_weapon()
    }

    pub fn apply_hit(&mut self, target: Boss) -> bool {
        self.session.apply_hit(target)
    }

    /// Fire along the facing direction and resolve the hit in one go.
    pub fn shoot(&mut self) -> Shot {
        if self.session.phase() != Phase::Playing {
            return Shot::Dry;
        }
        let target = self.session.boss();
        if !self.fire_weapon() {
            return Shot::Dry;
        }
        if in_line_of_fire(self.player, self.facing, self.pursuer.position()) && self.apply_hit(target) {
            Shot::Hit(target)
        } else {
            Shot::Miss
        }
    }

    /// Collision query for a player about to step to `next`.
    ///
    /// Not a pure predicate: while PLAYING, touching an item collects it and
    /// touching an unlocked exit clears the level. Returns `true` when the
    /// step must not be taken, which includes the frame the player is moved
    /// to the next level's start.
    pub fn try_move(&mut self, next: Vec2) -> bool {
        let at = next.cell(self.cell_size());
        let cell = self.grid.get(at);
        let playing = self.session.phase() == Phase::Playing;

        match cell {
            Cell::Wall => true,
            Cell::Exit => {
                if !playing {
                    return self.session.keys_collected() < self.session.keys_needed();
                }
                if self.session.reach_exit(&mut self.rng) {
                    self.load_level();
                }
                true
            }
            Cell::Key if playing => {
                self.session.collect_key(at);
                false
            }
            Cell::Weapon if playing => {
                self.session.collect_weapon();
                false
            }
            Cell::Ammo if playing => {
                self.session.collect_ammo(at);
                false
            }
            _ => false,
        }
    }

    /// Move by `delta`, one axis at a time so walls can be slid along.
    pub fn move_player(&mut self, delta: Vec2) {
        if self.session.phase() != Phase::Playing {
            return;
        }
        if delta.length() > f32::EPSILON {
            self.facing = delta.normalized();
        }
        let level = self.session.level();

        let along_x = Vec2::new(self.player.x + delta.x, self.player.z);
        if delta.x != 0.0 && !self.try_move(along_x) {
            self.player = along_x;
        }
        if self.session.level() != level {
            return;
        }
        let along_z = Vec2::new(self.player.x, self.player.z + delta.z);
        if delta.z != 0.0 && !self.try_move(along_z) {
            self.player = along_z;
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Per-frame update
// ══════════════════════════════════════════════════════════════

impl Game {
    pub fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        self.session.advance(dt, &mut self.rng);

        if matches!(self.session.phase(), Phase::Playing | Phase::Struggle) {
            self.update_pursuer(dt);
            self.update_bystanders(dt);
        }

        self.session.drain_events()
    }

    fn update_pursuer(&mut self, dt: f32) {
        let view = PursuitView {
            grid: &self.grid,
            player: self.player,
            boss: self.session.boss(),
            stunned: self.session.is_stunned(),
            level: self.session.level(),
            rage: self.session.rage(),
            capture_armed: self.session.capture_armed(),
            struggling: self.session.phase() == Phase::Struggle,
            cell_size: self.session.tuning().maze.cell_size,
        };
        let signals = self.pursuer.update(&view, &self.session.tuning().pursuer, dt, &mut self.rng);

        for signal in signals {
            match signal {
                PursuerSignal::Capture => {
                    self.session.capture();
                }
                PursuerSignal::Shout(boss) => self.session.shout(boss),
            }
        }
    }

    fn update_bystanders(&mut self, dt: f32) {
        let tuning = self.session.tuning();
        let cs = tuning.maze.cell_size;
        let hunter = self.pursuer.position();
        let mut killed = Vec::new();
        for b in &mut self.bystanders {
            if b.update(&self.grid, hunter, &tuning.bystanders, cs, dt, &mut self.rng) {
                killed.push(b.id());
            }
        }
        for who in killed {
            self.session.kill_character(who);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CS: f32 = 4.0;

    fn started(seed: u64) -> Game {
        let mut g = Game::with_seed(Tuning::default(), seed);
        assert!(g.select_character(CharacterId::Abdullah));
        g
    }

    /// A started game moved onto a hand-drawn grid, pursuer parked far away.
    fn on_grid(rows: &[&str]) -> Game {
        let mut g = started(1);
        g.grid = Grid::from_rows(rows);
        g.player = g.grid.start().center(CS);
        g.pursuer = Pursuer::new(Vec2::new(-1000.0, -1000.0), &g.session.tuning().pursuer);
        g.bystanders.clear();
        g
    }

    #[test]
    fn selecting_a_character_builds_level_one() {
        let g = started(3);
        assert_eq!(g.session().phase(), Phase::Playing);
        assert_eq!(g.grid().size(), 12);
        assert_eq!(g.player().cell(CS), g.grid().start());
        assert!(g.grid().is_walkable(g.pursuer().position().cell(CS)));
        assert!(g.bystanders().len() <= 8);
        assert!(g.bystanders().iter().all(|b| b.id() != CharacterId::Abdullah));
    }

    #[test]
    fn walls_block_and_floor_does_not() {
        let mut g = on_grid(&["#####", "#S..#", "#.#.#", "#..E#", "#####"]);
        assert!(g.try_move(Coord::new(0, 1).center(CS)));
        assert!(g.try_move(Coord::new(2, 2).center(CS)));
        assert!(!g.try_move(Coord::new(2, 1).center(CS)));
    }

    #[test]
    fn stepping_on_items_collects_them_once() {
        let mut g = on_grid(&["######", "#Skwa#", "#....#", "#...E#", "######", "######"]);
        assert!(!g.try_move(Coord::new(2, 1).center(CS)));
        assert!(!g.try_move(Coord::new(2, 1).center(CS)));
        assert_eq!(g.session().keys_collected(), 1);
        assert!(!g.item_visible(Coord::new(2, 1)));

        g.try_move(Coord::new(3, 1).center(CS));
        g.try_move(Coord::new(4, 1).center(CS));
        g.try_move(Coord::new(4, 1).center(CS));
        assert!(g.session().has_weapon());
        assert_eq!(g.session().ammo(), 2);
    }

    #[test]
    fn locked_exit_blocks_then_opens_onto_next_level() {
        let mut g = on_grid(&["######", "#Sk..#", "#....#", "#...E#", "######", "######"]);
        let exit = Coord::new(4, 3).center(CS);
        assert!(g.try_move(exit));
        assert_eq!(g.session().level(), 1);

        g.try_move(Coord::new(2, 1).center(CS));
        assert!(g.try_move(exit));
        assert_eq!(g.session().phase(), Phase::WinLevel);
        assert_eq!(g.session().level(), 2);
        assert_eq!(g.grid().size(), 14);
        assert_eq!(g.player().cell(CS), g.grid().start());

        assert!(g.proceed());
        assert_eq!(g.session().phase(), Phase::Playing);
    }

    #[test]
    fn pickups_wait_for_playing_phase() {
        let mut g = Game::with_seed(Tuning::default(), 5);
        g.grid = Grid::from_rows(&["#####", "#Sk.#", "#...#", "#..E#", "#####"]);
        assert_eq!(g.session().phase(), Phase::Menu);
        assert!(!g.try_move(Coord::new(2, 1).center(CS)));
        assert_eq!(g.session().keys_collected(), 0);
    }

    #[test]
    fn movement_slides_along_walls() {
        let mut g = on_grid(&["#####", "#S..#", "#####", "#...#", "#####"]);
        let before = g.player();
        g.move_player(Vec2::new(1.0, -3.0));
        assert_eq!(g.player(), Vec2::new(before.x + 1.0, before.z));
        assert!((g.facing().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn shooting_falah_in_the_sights_starts_transformation() {
        let mut g = on_grid(&["#######", "#S....#", "#.....#", "#....E#", "#######", "#######", "#######"]);
        g.pursuer = Pursuer::new(Coord::new(4, 1).center(CS), &g.session.tuning().pursuer);
        assert_eq!(g.shoot(), Shot::Dry);

        g.session.collect_weapon();
        assert_eq!(g.shoot(), Shot::Hit(Boss::Falah));
        assert_eq!(g.session().boss(), Boss::Transforming);
        assert_eq!(g.shoot(), Shot::Dry);
    }

    #[test]
    fn shooting_away_from_pursuer_misses() {
        let mut g = on_grid(&["#######", "#S....#", "#.....#", "#....E#", "#######", "#######", "#######"]);
        g.pursuer = Pursuer::new(Coord::new(1, 3).center(CS), &g.session.tuning().pursuer);
        g.session.collect_weapon();
        assert_eq!(g.shoot(), Shot::Miss);
        assert_eq!(g.session().boss(), Boss::Falah);
    }

    #[test]
    fn idle_player_is_eventually_caught() {
        let mut g = started(11);
        g.bystanders.clear();
        let mut captured = false;
        for _ in 0..2400 {
            let events = g.update(0.05);
            if events.iter().any(|e| matches!(e, GameEvent::Captured { .. })) {
                captured = true;
                break;
            }
        }
        assert!(captured);
        assert_eq!(g.session().phase(), Phase::Struggle);
    }

    #[test]
    fn bystander_next_to_pursuer_dies_and_is_logged() {
        let mut g = on_grid(&["#######", "#S....#", "#.....#", "#....E#", "#######", "#######", "#######"]);
        let mut rng = StdRng::seed_from_u64(2);
        let tuning = g.session.tuning().bystanders.clone();
        let b = Bystander::spawn(CharacterId::Hamza, &g.grid, &tuning, CS, &mut rng).unwrap();
        g.pursuer = Pursuer::new(b.position(), &g.session.tuning().pursuer);
        g.bystanders.push(b);
        // Keep the pursuer away from the player for this frame.
        g.session.apply_hit(Boss::Falah);

        let events = g.update(0.01);
        assert!(events.contains(&GameEvent::CharacterKilled { who: CharacterId::Hamza }));
        assert!(g.session().is_dead(CharacterId::Hamza));
    }
}
