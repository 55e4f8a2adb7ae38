/// Session: the authoritative game state.
///
/// ## Phases
///
/// ```text
///   MENU ──select──▶ PLAYING ──capture──▶ STRUGGLE ──escape──▶ PLAYING
///                     │  ▲                   │
///          exit+keys  │  │ proceed           │ timeout / health 0
///                     ▼  │                   ▼
///                   WIN_LEVEL            JUMPSCARE ──1.5s──▶ GAME_OVER ──reinit──▶ MENU
/// ```
///
/// The boss identity (FALAH → TRANSFORMING → SAIF) runs alongside the phase,
/// with a stun window overlaid on top.
///
/// All mutation goes through the action methods below. Delayed effects are
/// queued on a [`Scheduler`] and re-validated when they come due.
///
/// Time is a simulated millisecond clock driven by [`Session::advance`].

use std::collections::HashSet;

use rand::Rng;

use crate::config::Tuning;
use crate::domain::character::CharacterId;
use crate::domain::geom::Coord;
use crate::domain::pursuer::Boss;

use super::event::GameEvent;
use super::logbook::{LogBook, LogEntry};
use super::schedule::{ScheduledEvent, Scheduler, Stamp, TimerKind};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Phase {
    Menu,
    Playing,
    Struggle,
    Jumpscare,
    GameOver,
    WinLevel,
}

/// Owned, read-only copy of the state a renderer needs for one frame.
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub level: u32,
    pub health: i32,
    /// Battery rounded to a whole percentage.
    pub battery: u32,
    pub light_on: bool,
    pub keys_collected: u32,
    pub keys_needed: u32,
    pub has_weapon: bool,
    pub ammo: u32,
    pub boss: Boss,
    pub struggle_progress: u32,
    pub stunned: bool,
    pub stun_remaining_ms: u64,
    pub rage: f32,
    pub character: CharacterId,
    pub time_survived: u64,
    pub escapes: u32,
    pub now_ms: u64,
    pub logs: Vec<LogEntry>,
    pub dead: Vec<CharacterId>,
}

pub struct Session {
    tuning: Tuning,

    // ── Phase ──
    phase: Phase,
    /// Bumped on every phase transition.
    version: u64,
    /// Bumped on every level load and full reset.
    epoch: u64,

    // ── Progress ──
    level: u32,
    keys_needed: u32,
    keys_collected: u32,
    collected: HashSet<Coord>,

    // ── Economy ──
    health: i32,
    battery: f32,
    light_on: bool,
    has_weapon: bool,
    ammo: u32,

    // ── Pursuer ──
    boss: Boss,
    struggle_progress: u32,
    stunned_until: u64,
    rage: f32,

    // ── Cast ──
    character: CharacterId,
    dead: Vec<CharacterId>,

    // ── Stats ──
    time_survived: u64,
    escapes: u32,

    // ── Clock ──
    now_ms: u64,
    clock_carry: f64,
    second_carry: u64,

    logs: LogBook,
    scheduler: Scheduler,
    events: Vec<GameEvent>,
}

// ── Construction / queries ──

impl Session {
    pub fn new(tuning: Tuning) -> Self {
        let logs = LogBook::new(tuning.economy.log_capacity);
        let mut s = Session {
            phase: Phase::Menu,
            version: 0,
            epoch: 0,
            level: 1,
            keys_needed: 1,
            keys_collected: 0,
            collected: HashSet::new(),
            health: tuning.economy.max_health,
            battery: tuning.economy.max_battery,
            light_on: false,
            has_weapon: false,
            ammo: 0,
            boss: Boss::Falah,
            struggle_progress: 0,
            stunned_until: 0,
            rage: 1.0,
            character: CharacterId::default(),
            dead: Vec::new(),
            time_survived: 0,
            escapes: 0,
            now_ms: 0,
            clock_carry: 0.0,
            second_carry: 0,
            logs,
            scheduler: Scheduler::new(),
            events: Vec::new(),
            tuning,
        };
        s.full_reset();
        s
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn battery(&self) -> f32 {
        self.battery
    }

    pub fn light_on(&self) -> bool {
        self.light_on
    }

    pub fn keys_collected(&self) -> u32 {
        self.keys_collected
    }

    pub fn keys_needed(&self) -> u32 {
        self.keys_needed
    }

    pub fn has_weapon(&self) -> bool {
        self.has_weapon
    }

    pub fn ammo(&self) -> u32 {
        self.ammo
    }

    pub fn boss(&self) -> Boss {
        self.boss
    }

    pub fn struggle_progress(&self) -> u32 {
        self.struggle_progress
    }

    pub fn rage(&self) -> f32 {
        self.rage
    }

    pub fn character(&self) -> CharacterId {
        self.character
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn time_survived(&self) -> u64 {
        self.time_survived
    }

    pub fn escapes(&self) -> u32 {
        self.escapes
    }

    pub fn is_stunned(&self) -> bool {
        self.now_ms < self.stunned_until
    }

    pub fn is_collected(&self, at: Coord) -> bool {
        self.collected.contains(&at)
    }

    pub fn is_dead(&self, who: CharacterId) -> bool {
        self.dead.contains(&who)
    }

    pub fn logs(&self) -> &LogBook {
        &self.logs
    }

    /// The pursuer may only grab the player while this holds.
    pub fn capture_armed(&self) -> bool {
        self.phase == Phase::Playing && !self.is_stunned() && self.boss != Boss::Transforming
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            level: self.level,
            health: self.health,
            battery: self.battery.round() as u32,
            light_on: self.light_on,
            keys_collected: self.keys_collected,
            keys_needed: self.keys_needed,
            has_weapon: self.has_weapon,
            ammo: self.ammo,
            boss: self.boss,
            struggle_progress: self.struggle_progress,
            stunned: self.is_stunned(),
            stun_remaining_ms: self.stunned_until.saturating_sub(self.now_ms),
            rage: self.rage,
            character: self.character,
            time_survived: self.time_survived,
            escapes: self.escapes,
            now_ms: self.now_ms,
            logs: self.logs.iter().cloned().collect(),
            dead: self.dead.clone(),
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn stamp(&self) -> Stamp {
        Stamp { phase: self.phase, version: self.version, epoch: self.epoch }
    }

    fn set_phase(&mut self, next: Phase) {
        if next == self.phase {
            return;
        }
        tracing::debug!(from = ?self.phase, to = ?next, at_ms = self.now_ms, "phase");
        self.phase = next;
        self.version += 1;
    }

    fn schedule_in(&mut self, kind: TimerKind, delay_ms: u64) {
        let stamp = self.stamp();
        self.scheduler.schedule(kind, stamp, self.now_ms + delay_ms);
    }

    fn schedule_ambient(&mut self, rng: &mut impl Rng) {
        let e = &self.tuning.economy;
        let secs = e.ambient_min_secs + rng.gen::<f32>() * e.ambient_jitter_secs;
        self.schedule_in(TimerKind::AmbientCue, (secs * 1000.0) as u64);
    }
}

// ══════════════════════════════════════════════════════════════
// Phase actions
// ══════════════════════════════════════════════════════════════

impl Session {
    /// MENU → PLAYING with a fresh run.
    pub fn select_character(&mut self, who: CharacterId, rng: &mut impl Rng) -> bool {
        if self.phase != Phase::Menu {
            return false;
        }
        self.full_reset();
        self.character = who;
        self.set_phase(Phase::Playing);
        self.schedule_ambient(rng);
        self.add_log(format!("{} enters the maze", who.name()));
        tracing::info!(character = who.name(), "run started");
        true
    }

    /// WIN_LEVEL → PLAYING.
    pub fn proceed(&mut self) -> bool {
        if self.phase != Phase::WinLevel {
            return false;
        }
        self.set_phase(Phase::Playing);
        true
    }

    /// GAME_OVER → MENU with everything reset.
    pub fn reinitialize(&mut self) -> bool {
        if self.phase != Phase::GameOver {
            return false;
        }
        self.full_reset();
        self.set_phase(Phase::Menu);
        true
    }

    /// Player stands on the exit. Clears the level if enough keys are held.
    pub fn reach_exit(&mut self, rng: &mut impl Rng) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }
        if self.keys_collected < self.keys_needed {
            let missing = self.keys_needed - self.keys_collected;
            if rng.gen_bool(self.tuning.economy.locked_hint_chance.clamp(0.0, 1.0)) {
                self.add_log(format!("The exit is locked. {missing} more key(s)."));
                self.events.push(GameEvent::ExitLocked { missing });
            }
            return false;
        }
        self.advance_level(rng);
        true
    }

    fn advance_level(&mut self, rng: &mut impl Rng) {
        let e = &self.tuning.economy;
        let (battery_cap, battery_bonus) = (e.max_battery, e.level_battery_bonus);
        let (health_cap, health_bonus) = (e.max_health, e.level_health_bonus);

        self.set_phase(Phase::WinLevel);
        self.level += 1;
        self.keys_needed = self.level;
        self.keys_collected = 0;
        self.collected.clear();
        self.battery = (self.battery + battery_bonus).min(battery_cap);
        self.health = (self.health + health_bonus).min(health_cap);
        self.dead.clear();
        self.logs.clear();
        self.stunned_until = 0;
        self.boss = Boss::Falah;
        self.ammo = self.ammo.saturating_sub(1);
        self.escapes += 1;

        self.epoch += 1;
        self.schedule_ambient(rng);
        self.events.push(GameEvent::LevelCleared { next_level: self.level });
        tracing::info!(level = self.level, escapes = self.escapes, "level cleared");
    }

    fn full_reset(&mut self) {
        let e = &self.tuning.economy;
        self.health = e.max_health;
        self.battery = e.max_battery;
        self.level = 1;
        self.keys_needed = 1;
        self.keys_collected = 0;
        self.collected.clear();
        self.light_on = true;
        self.has_weapon = false;
        self.ammo = 0;
        self.boss = Boss::Falah;
        self.struggle_progress = 0;
        self.stunned_until = 0;
        self.rage = 1.0;
        self.dead.clear();
        self.logs.clear();
        self.time_survived = 0;
        self.escapes = 0;
        self.epoch += 1;
        self.scheduler.clear();
    }
}

// ══════════════════════════════════════════════════════════════
// Capture / struggle / combat
// ══════════════════════════════════════════════════════════════

impl Session {
    /// PLAYING → STRUGGLE, if the pursuer is allowed to grab right now.
    pub fn capture(&mut self) -> bool {
        if !self.capture_armed() {
            return false;
        }
        let s = &self.tuning.struggle;
        self.struggle_progress = if self.boss == Boss::Saif { s.start_saif } else { s.start_falah };
        let timeout = s.timeout_ms(self.level);

        self.set_phase(Phase::Struggle);
        self.schedule_in(TimerKind::StruggleTimeout, timeout);
        self.add_log(format!("{} has you!", self.boss.name()));
        self.events.push(GameEvent::Captured { boss: self.boss });
        tracing::info!(boss = ?self.boss, level = self.level, timeout, "captured");
        true
    }

    /// Progress gained per struggle input at the current level and boss.
    pub fn struggle_step(&self) -> u32 {
        let s = &self.tuning.struggle;
        let penalty = self.level + if self.boss == Boss::Saif { s.saif_penalty } else { 0 };
        s.base_increment.saturating_sub(penalty).max(s.min_increment)
    }

    /// One qualifying input during STRUGGLE.
    pub fn increment_struggle(&mut self) -> bool {
        if self.phase != Phase::Struggle {
            return false;
        }
        self.struggle_progress += self.struggle_step();
        if self.struggle_progress < self.tuning.struggle.threshold {
            return true;
        }

        let s = &self.tuning.struggle;
        let damage = if self.boss == Boss::Saif { s.damage_saif } else { s.damage_falah };
        let (grace, bonus) = (s.escape_grace_ms, s.escape_rage_bonus);
        self.health -= damage;

        if self.health <= 0 {
            self.health = 0;
            self.jumpscare();
        } else {
            self.set_phase(Phase::Playing);
            self.struggle_progress = 0;
            self.rage += bonus;
            self.stunned_until = self.now_ms + grace;
            self.add_log("You broke free!");
            self.events.push(GameEvent::Escaped);
            tracing::info!(health = self.health, rage = self.rage, "escaped");
        }
        true
    }

    fn fail_struggle(&mut self) {
        self.health = 0;
        self.jumpscare();
    }

    fn jumpscare(&mut self) {
        self.set_phase(Phase::Jumpscare);
        let delay = self.tuning.struggle.jumpscare_ms;
        self.schedule_in(TimerKind::GameOver, delay);
        self.events.push(GameEvent::Jumpscare);
        tracing::info!(level = self.level, survived = self.time_survived, "caught for good");
    }

    /// Spend a round. `false` if unarmed or out of ammo.
    pub fn fire_weapon(&mut self) -> bool {
        if !self.has_weapon {
            return false;
        }
        if self.ammo == 0 {
            self.add_log("Click. Out of ammo.");
            self.events.push(GameEvent::OutOfAmmo);
            return false;
        }
        self.ammo -= 1;
        self.add_log("Bang!");
        self.events.push(GameEvent::ShotFired);
        true
    }

    /// A shot fired at `target` connected. Ignored if the boss changed form
    /// since the shot.
    pub fn apply_hit(&mut self, target: Boss) -> bool {
        if self.phase != Phase::Playing || target != self.boss {
            return false;
        }
        match self.boss {
            Boss::Falah => {
                self.boss = Boss::Transforming;
                let delay = self.tuning.pursuer.transform_delay_ms;
                self.schedule_in(TimerKind::BossEmerges, delay);
                self.add_log("Mr. Falah is down... something is wrong.");
                self.events.push(GameEvent::BossFelled);
                tracing::info!(at_ms = self.now_ms, "falah down, transforming");
                true
            }
            Boss::Saif => {
                self.stunned_until = self.now_ms + self.tuning.pursuer.saif_stun_ms;
                self.add_log("Mr. Saif staggers!");
                self.events.push(GameEvent::BossStunned { until_ms: self.stunned_until });
                tracing::info!(until_ms = self.stunned_until, "saif stunned");
                true
            }
            Boss::Transforming => false,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Inventory / misc actions
// ══════════════════════════════════════════════════════════════

impl Session {
    pub fn collect_key(&mut self, at: Coord) -> bool {
        if !self.collected.insert(at) {
            return false;
        }
        self.keys_collected += 1;
        self.add_log(format!("Key found ({}/{})", self.keys_collected, self.keys_needed));
        if self.keys_collected == self.keys_needed {
            self.add_log("All keys found. Get to the exit!");
        }
        self.events.push(GameEvent::KeyCollected {
            at,
            collected: self.keys_collected,
            needed: self.keys_needed,
        });
        true
    }

    pub fn collect_weapon(&mut self) -> bool {
        if self.has_weapon {
            return false;
        }
        self.has_weapon = true;
        self.ammo += 1;
        self.add_log("Picked up a weapon");
        self.events.push(GameEvent::WeaponCollected);
        true
    }

    pub fn collect_ammo(&mut self, at: Coord) -> bool {
        if !self.collected.insert(at) {
            return false;
        }
        self.ammo += 1;
        self.add_log("Picked up ammo");
        self.events.push(GameEvent::AmmoCollected { at });
        true
    }

    /// Flip the light. Stays off with an empty battery. Returns the new state.
    pub fn toggle_light(&mut self) -> bool {
        self.light_on = !self.light_on && self.battery > 0.0;
        self.events.push(GameEvent::LightToggled { on: self.light_on });
        self.light_on
    }

    /// Record a bystander's death. Idempotent.
    pub fn kill_character(&mut self, who: CharacterId) -> bool {
        if self.dead.contains(&who) {
            return false;
        }
        self.dead.push(who);
        self.add_log(format!("{} was taken by {}", who.name(), self.boss.name()));
        self.events.push(GameEvent::CharacterKilled { who });
        tracing::debug!(who = who.name(), "bystander killed");
        true
    }

    pub fn add_log(&mut self, message: impl Into<String>) {
        self.logs.push(message, self.now_ms);
    }

    /// Cosmetic pursuer shout, forwarded to presentation.
    pub fn shout(&mut self, boss: Boss) {
        self.events.push(GameEvent::PursuerShout { boss });
    }
}

// ══════════════════════════════════════════════════════════════
// Clock
// ══════════════════════════════════════════════════════════════

impl Session {
    /// Advance the simulated clock by `dt` seconds, then run the whole-second
    /// ticker and every timer that came due.
    pub fn advance(&mut self, dt: f32, rng: &mut impl Rng) {
        self.clock_carry += f64::from(dt.max(0.0)) * 1000.0;
        let whole = self.clock_carry.floor();
        self.clock_carry -= whole;
        let step_ms = whole as u64;
        self.now_ms += step_ms;

        self.second_carry += step_ms;
        while self.second_carry >= 1000 {
            self.second_carry -= 1000;
            self.tick_second();
        }

        for event in self.scheduler.take_due(self.now_ms) {
            self.fire(event, rng);
        }
    }

    fn tick_second(&mut self) {
        if matches!(self.phase, Phase::Playing | Phase::Struggle) {
            self.time_survived += 1;
        }
        if self.phase == Phase::Playing && self.light_on {
            let e = &self.tuning.economy;
            let drain = e.battery_drain_per_sec * self.character.traits().battery;
            self.battery = (self.battery - drain).max(0.0);
            if self.battery <= 0.0 {
                self.light_on = false;
                self.add_log("The light flickers out.");
                self.events.push(GameEvent::LightDied);
            }
        }
    }

    fn fire(&mut self, event: ScheduledEvent, rng: &mut impl Rng) {
        let issued = event.issued;
        match event.kind {
            TimerKind::BossEmerges => {
                if issued.epoch != self.epoch || self.boss != Boss::Transforming {
                    tracing::trace!(?event, "stale boss timer dropped");
                    return;
                }
                self.boss = Boss::Saif;
                self.rage *= self.tuning.pursuer.transform_rage_factor;
                self.add_log("Mr. Saif rises.");
                self.events.push(GameEvent::BossEmerged);
                tracing::info!(rage = self.rage, "saif emerged");
            }
            TimerKind::StruggleTimeout => {
                if issued.version != self.version || issued.phase != self.phase {
                    tracing::trace!(?event, "stale struggle timeout dropped");
                    return;
                }
                self.fail_struggle();
            }
            TimerKind::GameOver => {
                if issued.version != self.version || issued.phase != self.phase {
                    tracing::trace!(?event, "stale game-over timer dropped");
                    return;
                }
                self.set_phase(Phase::GameOver);
                self.events.push(GameEvent::GameOver);
            }
            TimerKind::AmbientCue => {
                if issued.epoch != self.epoch || self.phase == Phase::Menu {
                    return;
                }
                if self.phase == Phase::Playing {
                    self.events.push(GameEvent::AmbientCue);
                }
                self.schedule_ambient(rng);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;

    fn playing() -> (Session, StdRng) {
        let mut rng = StdRng::seed_from_u64(7);
        let mut s = Session::new(Tuning::default());
        assert!(s.select_character(CharacterId::Abdullah, &mut rng));
        (s, rng)
    }

    /// Advance in frame-sized steps.
    fn run(s: &mut Session, rng: &mut StdRng, secs: f32) {
        let frames = (secs / 0.05).round() as usize;
        for _ in 0..frames {
            s.advance(0.05, rng);
        }
    }

    #[test]
    fn starts_in_menu_and_selection_starts_level_one() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = Session::new(Tuning::default());
        assert_eq!(s.phase(), Phase::Menu);
        assert!(s.select_character(CharacterId::Hamza, &mut rng));
        assert_eq!(s.phase(), Phase::Playing);
        assert_eq!((s.level(), s.keys_needed(), s.health()), (1, 1, 100));
        assert!(!s.select_character(CharacterId::Qais, &mut rng));
        assert_eq!(s.character(), CharacterId::Hamza);
    }

    #[test]
    fn key_pickup_is_idempotent_per_coordinate() {
        let (mut s, _) = playing();
        let at = Coord::new(5, 6);
        assert!(s.collect_key(at));
        assert!(!s.collect_key(at));
        assert_eq!(s.keys_collected(), 1);
        assert!(s.collect_key(Coord::new(6, 5)));
        assert_eq!(s.keys_collected(), 2);
    }

    #[test]
    fn ammo_pickup_is_idempotent_and_weapon_is_collected_once() {
        let (mut s, _) = playing();
        assert!(s.collect_ammo(Coord::new(4, 4)));
        assert!(!s.collect_ammo(Coord::new(4, 4)));
        assert!(s.collect_weapon());
        assert!(!s.collect_weapon());
        assert!(s.has_weapon());
        assert_eq!(s.ammo(), 2);
    }

    #[test]
    fn firing_needs_weapon_and_ammo() {
        let (mut s, _) = playing();
        assert!(!s.fire_weapon());
        assert!(!s.drain_events().contains(&GameEvent::OutOfAmmo));

        s.collect_weapon();
        assert!(s.fire_weapon());
        assert_eq!(s.ammo(), 0);
        assert!(!s.fire_weapon());
        assert_eq!(s.ammo(), 0);
        assert_eq!(s.logs().latest().map(|e| e.message.as_str()), Some("Click. Out of ammo."));
        assert!(s.drain_events().contains(&GameEvent::OutOfAmmo));
    }

    #[test]
    fn twelve_struggle_inputs_break_free_at_level_one() {
        let (mut s, _) = playing();
        assert!(s.capture());
        assert_eq!(s.phase(), Phase::Struggle);
        assert_eq!(s.struggle_progress(), 10);
        assert_eq!(s.struggle_step(), 9);

        for _ in 0..9 {
            s.increment_struggle();
        }
        assert_eq!(s.phase(), Phase::Struggle);
        for _ in 0..3 {
            s.increment_struggle();
        }
        assert_eq!(s.phase(), Phase::Playing);
        assert_eq!(s.struggle_progress(), 0);
        assert_eq!(s.health(), 75);
        assert!((s.rage() - 1.1).abs() < 1e-5);
        assert!(s.is_stunned());
        assert!(!s.capture());
    }

    #[rstest]
    #[case(1, Boss::Falah, 9)]
    #[case(3, Boss::Saif, 4)]
    #[case(5, Boss::Saif, 2)]
    #[case(9, Boss::Falah, 2)]
    #[case(20, Boss::Saif, 2)]
    fn struggle_step_shrinks_with_level_and_boss(#[case] level: u32, #[case] boss: Boss, #[case] step: u32) {
        let (mut s, _) = playing();
        s.level = level;
        s.boss = boss;
        assert_eq!(s.struggle_step(), step);
    }

    #[test]
    fn saif_grabs_harder_and_hurts_more() {
        let (mut s, _) = playing();
        s.boss = Boss::Saif;
        assert!(s.capture());
        assert_eq!(s.struggle_progress(), 5);
        while s.phase() == Phase::Struggle {
            s.increment_struggle();
        }
        assert_eq!(s.health(), 60);
    }

    #[test]
    fn struggle_timeout_ends_in_game_over() {
        let (mut s, mut rng) = playing();
        s.capture();
        run(&mut s, &mut rng, 2.7);
        assert_eq!(s.phase(), Phase::Struggle);
        run(&mut s, &mut rng, 0.2);
        assert_eq!(s.phase(), Phase::Jumpscare);
        assert_eq!(s.health(), 0);
        run(&mut s, &mut rng, 1.5);
        assert_eq!(s.phase(), Phase::GameOver);

        assert!(s.reinitialize());
        assert_eq!(s.phase(), Phase::Menu);
        assert_eq!((s.level(), s.health()), (1, 100));
    }

    #[test]
    fn lethal_escape_goes_through_jumpscare() {
        let (mut s, mut rng) = playing();
        s.health = 20;
        s.capture();
        while s.phase() == Phase::Struggle {
            s.increment_struggle();
        }
        assert_eq!(s.phase(), Phase::Jumpscare);
        assert_eq!(s.health(), 0);
        run(&mut s, &mut rng, 1.6);
        assert_eq!(s.phase(), Phase::GameOver);
    }

    #[test]
    fn timeout_from_an_escaped_struggle_is_dropped() {
        let (mut s, mut rng) = playing();
        s.capture();
        while s.phase() == Phase::Struggle {
            s.increment_struggle();
        }
        run(&mut s, &mut rng, 4.5);
        assert_eq!(s.phase(), Phase::Playing);
        assert_eq!(s.health(), 75);
    }

    #[test]
    fn hit_on_falah_transforms_into_saif_after_delay() {
        let (mut s, mut rng) = playing();
        s.rage = 1.2;
        assert!(s.apply_hit(Boss::Falah));
        assert_eq!(s.boss(), Boss::Transforming);
        assert!(!s.capture());

        run(&mut s, &mut rng, 2.9);
        assert_eq!(s.boss(), Boss::Transforming);
        run(&mut s, &mut rng, 0.2);
        assert_eq!(s.boss(), Boss::Saif);
        assert!((s.rage() - 1.8).abs() < 1e-5);
    }

    #[test]
    fn hit_on_saif_stuns_for_five_seconds() {
        let (mut s, mut rng) = playing();
        s.boss = Boss::Saif;
        assert!(s.apply_hit(Boss::Saif));
        assert!(s.is_stunned());
        run(&mut s, &mut rng, 4.9);
        assert!(s.is_stunned());
        run(&mut s, &mut rng, 0.2);
        assert!(!s.is_stunned());
        assert_eq!(s.boss(), Boss::Saif);
    }

    #[test]
    fn hit_reported_for_a_stale_identity_is_ignored() {
        let (mut s, _) = playing();
        s.boss = Boss::Saif;
        assert!(!s.apply_hit(Boss::Falah));
        assert!(!s.is_stunned());
    }

    #[test]
    fn transform_timer_is_dropped_after_level_change() {
        let (mut s, mut rng) = playing();
        s.apply_hit(Boss::Falah);
        s.collect_key(Coord::new(5, 5));
        assert!(s.reach_exit(&mut rng));
        assert_eq!(s.boss(), Boss::Falah);
        assert!(s.proceed());

        run(&mut s, &mut rng, 3.5);
        assert_eq!(s.boss(), Boss::Falah);
        assert!((s.rage() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn clearing_level_one_advances_and_tops_up() {
        let (mut s, mut rng) = playing();
        run(&mut s, &mut rng, 40.0);
        assert!((s.battery() - 20.0).abs() < 1e-3);
        s.health = 90;
        s.collect_weapon();
        s.kill_character(CharacterId::Qais);

        assert!(s.collect_key(Coord::new(7, 2)));
        assert!(s.reach_exit(&mut rng));
        assert_eq!(s.phase(), Phase::WinLevel);
        assert_eq!(s.level(), 2);
        assert_eq!(s.keys_needed(), 2);
        assert_eq!(s.keys_collected(), 0);
        assert!(!s.is_collected(Coord::new(7, 2)));
        assert!((s.battery() - 50.0).abs() < 1e-3);
        assert_eq!(s.health(), 100);
        assert_eq!(s.ammo(), 0);
        assert!(!s.is_dead(CharacterId::Qais));
        assert!(s.logs().is_empty());
        assert_eq!(s.escapes(), 1);

        assert!(s.proceed());
        assert_eq!(s.phase(), Phase::Playing);
    }

    #[test]
    fn locked_exit_keeps_playing() {
        let (mut s, mut rng) = playing();
        for _ in 0..50 {
            assert!(!s.reach_exit(&mut rng));
        }
        assert_eq!(s.phase(), Phase::Playing);
        assert_eq!(s.level(), 1);
    }

    #[test]
    fn empty_battery_forces_light_off() {
        let (mut s, mut rng) = playing();
        s.battery = 1.0;
        run(&mut s, &mut rng, 1.0);
        assert_eq!(s.battery(), 0.0);
        assert!(!s.light_on());
        assert!(s.drain_events().contains(&GameEvent::LightDied));
        assert!(!s.toggle_light());
    }

    #[test]
    fn light_starts_on_and_drains_without_a_toggle() {
        let (mut s, mut rng) = playing();
        assert!(s.light_on());
        run(&mut s, &mut rng, 10.0);
        assert!((s.battery() - 80.0).abs() < 1e-3);

        assert!(!s.toggle_light());
        run(&mut s, &mut rng, 5.0);
        assert!((s.battery() - 80.0).abs() < 1e-3);
        assert!(s.toggle_light());
    }

    #[test]
    fn battery_drain_follows_character_factor() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut s = Session::new(Tuning::default());
        s.select_character(CharacterId::Alayham, &mut rng);
        run(&mut s, &mut rng, 10.0);
        assert!((s.battery() - 90.0).abs() < 1e-3);
    }

    #[test]
    fn time_survived_counts_struggle_but_battery_rests() {
        let (mut s, mut rng) = playing();
        s.capture();
        run(&mut s, &mut rng, 2.0);
        assert_eq!(s.phase(), Phase::Struggle);
        assert_eq!(s.time_survived(), 2);
        assert!((s.battery() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn bystander_deaths_are_recorded_once() {
        let (mut s, _) = playing();
        assert!(s.kill_character(CharacterId::Munther));
        assert!(!s.kill_character(CharacterId::Munther));
        assert_eq!(s.snapshot().dead, vec![CharacterId::Munther]);
    }

    #[test]
    fn log_book_is_bounded_newest_first() {
        let (mut s, _) = playing();
        for i in 0..8 {
            s.add_log(format!("entry {i}"));
        }
        let snap = s.snapshot();
        assert_eq!(snap.logs.len(), 5);
        assert_eq!(snap.logs[0].message, "entry 7");
    }

    #[test]
    fn ambient_cues_play_while_running() {
        let (mut s, mut rng) = playing();
        run(&mut s, &mut rng, 16.0);
        assert!(s.drain_events().contains(&GameEvent::AmbientCue));
    }

    fn pending_cues(s: &mut Session) -> usize {
        s.scheduler.take_due(u64::MAX).iter().filter(|e| e.kind == TimerKind::AmbientCue).count()
    }

    #[test]
    fn ambient_cue_from_a_cleared_level_is_dropped() {
        let (mut s, mut rng) = playing();
        s.collect_key(Coord::new(5, 5));
        assert!(s.reach_exit(&mut rng));
        assert!(s.proceed());

        run(&mut s, &mut rng, 60.0);
        assert!(s.drain_events().contains(&GameEvent::AmbientCue));
        assert_eq!(pending_cues(&mut s), 1);
    }

    #[test]
    fn ambient_cues_stop_back_at_the_menu() {
        let (mut s, mut rng) = playing();
        s.capture();
        run(&mut s, &mut rng, 5.0);
        assert_eq!(s.phase(), Phase::GameOver);
        assert!(s.reinitialize());
        s.drain_events();

        run(&mut s, &mut rng, 30.0);
        assert_eq!(s.phase(), Phase::Menu);
        assert!(!s.drain_events().contains(&GameEvent::AmbientCue));
        assert_eq!(pending_cues(&mut s), 0);
    }
}
