/// Pursuer AI: grid pathfinding plus a small behaviour machine.
///
/// Per frame, in priority order:
///   1. **Transforming**: the collapse animation plays; nothing else happens.
///   2. **Stunned**: sways in place.
///   3. **Holding**: during a struggle the pursuer is pinned to the player.
///   4. **Chase**: re-plans with A* every `path_refresh_secs`, walks the cached
///      path waypoint by waypoint, and falls back to a straight line toward the
///      player (refusing to step into walls) when the path runs out.
///
/// Capture and the proximity shout are reported as signals; the session
/// decides what they mean.

use rand::Rng;

use crate::config::PursuerTuning;

use super::geom::{Coord, Vec2};
use super::maze::Grid;
use super::pathfind::find_path;

/// The pursuer's identity, orthogonal to the game phase.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Boss {
    Falah,
    /// Death animation between the two identities.
    Transforming,
    /// Second form. Cannot be killed, only stunned.
    Saif,
}

impl Boss {
    pub fn name(self) -> &'static str {
        match self {
            Boss::Falah => "Mr. Falah",
            Boss::Transforming => "...",
            Boss::Saif => "Mr. Saif",
        }
    }
}

/// What the renderer should animate.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Pose {
    Idle,
    Walking,
    Collapsing,
    Swaying,
    Holding,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PursuerSignal {
    /// Close enough to grab the player.
    Capture,
    /// Cosmetic proximity announcement.
    Shout(Boss),
}

/// Read-only slice of the world the pursuer decides on.
#[derive(Clone, Copy, Debug)]
pub struct PursuitView<'a> {
    pub grid: &'a Grid,
    pub player: Vec2,
    pub boss: Boss,
    pub stunned: bool,
    pub level: u32,
    pub rage: f32,
    /// Captures only count while the game phase is PLAYING.
    pub capture_armed: bool,
    pub struggling: bool,
    pub cell_size: f32,
}

/// Movement speed in world units per second.
pub fn speed_for(tuning: &PursuerTuning, boss: Boss, level: u32, rage: f32) -> f32 {
    let base = match boss {
        Boss::Saif => tuning.saif_base_speed,
        Boss::Falah | Boss::Transforming => tuning.falah_base_speed,
    };
    base * (1.0 + tuning.level_speed_factor * level as f32) * rage
}

#[derive(Clone, Debug)]
pub struct Pursuer {
    pos: Vec2,
    path: Vec<Coord>,
    waypoint: usize,
    since_refresh: f32,
    shout_timer: f32,
    pose: Pose,
    /// 0.0 = upright, 1.0 = flat on the floor.
    collapse: f32,
}

impl Pursuer {
    pub fn new(spawn: Vec2, tuning: &PursuerTuning) -> Self {
        Pursuer {
            pos: spawn,
            path: Vec::new(),
            waypoint: 0,
            since_refresh: 0.0,
            shout_timer: tuning.shout_first_secs,
            pose: Pose::Idle,
            collapse: 0.0,
        }
    }

    /// Pick a walkable cell far enough from the start to give the player a head start.
    pub fn spawn_cell(grid: &Grid, start: Coord, tuning: &PursuerTuning, rng: &mut impl Rng) -> Coord {
        let size = grid.size() as i32;
        if size > 2 {
            for _ in 0..tuning.spawn_attempts {
                let c = Coord::new(rng.gen_range(1..size - 1), rng.gen_range(1..size - 1));
                if grid.is_walkable(c) && c.manhattan(start) > tuning.spawn_min_distance {
                    return c;
                }
            }
        }
        Coord::new(size - 2, size - 2)
    }

    pub fn position(&self) -> Vec2 {
        self.pos
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn collapse(&self) -> f32 {
        self.collapse
    }

    /// Remaining waypoints, including the one being walked toward.
    pub fn path_ahead(&self) -> &[Coord] {
        self.path.get(self.waypoint..).unwrap_or(&[])
    }

    pub fn update(
        &mut self,
        view: &PursuitView,
        tuning: &PursuerTuning,
        dt: f32,
        rng: &mut impl Rng,
    ) -> Vec<PursuerSignal> {
        let mut signals = Vec::new();

        // ── Transforming: fall over, nothing else ──
        if view.boss == Boss::Transforming {
            self.pose = Pose::Collapsing;
            let quarter_turn = std::f32::consts::FRAC_PI_2;
            self.collapse = (self.collapse + tuning.collapse_rate * dt / quarter_turn).min(1.0);
            return signals;
        }
        self.collapse = 0.0;

        if view.stunned {
            self.pose = Pose::Swaying;
            return signals;
        }

        if view.struggling {
            self.pose = Pose::Holding;
            self.pos = view.player;
            return signals;
        }

        // ── Proximity shout ──
        let dist = self.pos.distance(view.player);
        if dist < tuning.shout_radius {
            self.shout_timer -= dt;
            if self.shout_timer <= 0.0 {
                signals.push(PursuerSignal::Shout(view.boss));
                self.shout_timer = tuning.shout_min_secs + rng.gen::<f32>() * tuning.shout_jitter_secs;
            }
        }

        // ── Capture ──
        if dist < tuning.capture_distance && view.capture_armed {
            self.pose = Pose::Idle;
            signals.push(PursuerSignal::Capture);
            return signals;
        }

        // ── Re-plan at a throttled cadence ──
        self.since_refresh += dt;
        if self.since_refresh > tuning.path_refresh_secs {
            self.since_refresh = 0.0;
            let from = self.pos.cell(view.cell_size);
            let to = view.player.cell(view.cell_size);
            let fresh = find_path(view.grid, from, to);
            if !fresh.is_empty() {
                self.path = fresh;
                self.waypoint = 1;
            }
        }

        let speed = speed_for(tuning, view.boss, view.level, view.rage);
        self.pose = Pose::Idle;

        if let Some(&next) = self.path.get(self.waypoint) {
            let delta = next.center(view.cell_size) - self.pos;
            let remaining = delta.length();
            if remaining > tuning.waypoint_tolerance {
                let step = (speed * dt).min(remaining);
                self.pos = self.pos + delta.normalized() * step;
                self.pose = Pose::Walking;
            } else {
                self.waypoint += 1;
            }
        } else {
            // Path exhausted or never found: straight at the player.
            let dir = (view.player - self.pos).normalized();
            let next = self.pos + dir * (speed * dt);
            if view.grid.is_walkable(next.cell(view.cell_size)) {
                self.pos = next;
                self.pose = Pose::Walking;
            }
        }

        signals
    }
}
