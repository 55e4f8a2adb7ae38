use crate::domain::character::CharacterId;
use crate::domain::geom::Coord;
use crate::domain::pursuer::Boss;

/// Events emitted while the game advances.
/// The presentation layer drains these each frame for sound and HUD flashes.
#[derive(Clone, PartialEq, Debug)]
pub enum GameEvent {
    KeyCollected { at: Coord, collected: u32, needed: u32 },
    WeaponCollected,
    AmmoCollected { at: Coord },
    ShotFired,
    OutOfAmmo,
    /// FALAH went down and started transforming.
    BossFelled,
    BossEmerged,
    BossStunned { until_ms: u64 },
    Captured { boss: Boss },
    Escaped,
    Jumpscare,
    GameOver,
    LevelCleared { next_level: u32 },
    ExitLocked { missing: u32 },
    LightToggled { on: bool },
    LightDied,
    CharacterKilled { who: CharacterId },
    PursuerShout { boss: Boss },
    AmbientCue,
}
