/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Every key is optional: missing sections and fields fall back to the
/// built-in tuning, and a broken file is reported and ignored.
///
/// All gameplay numbers live in [`Tuning`], so behaviour code never carries
/// its own magic constants.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

// ── Errors ──

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config.toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Public Config Struct ──

#[derive(Clone, Debug, Default)]
pub struct GameConfig {
    pub general: GeneralConfig,
    pub tuning: Tuning,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Target frame interval of the terminal front-end.
    pub frame_ms: u64,
    /// Diagnostic log destination. `None` disables diagnostics.
    pub log_file: Option<PathBuf>,
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    pub log_filter: String,
    pub player_walk_speed: f32,
    pub player_sprint_speed: f32,
}

/// Every gameplay constant, grouped the way `config.toml` groups them.
#[derive(Clone, Debug, Default)]
pub struct Tuning {
    pub maze: MazeTuning,
    pub pursuer: PursuerTuning,
    pub struggle: StruggleTuning,
    pub economy: EconomyTuning,
    pub bystanders: BystanderTuning,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MazeTuning {
    pub base_size: usize,
    pub size_per_level: usize,
    /// Random openings punched per unit of side length.
    pub loops_per_side: usize,
    pub placement_attempts: u32,
    /// Items are kept out of the `[0, start_clearance]` square around START.
    pub start_clearance: usize,
    /// World units per grid cell.
    pub cell_size: f32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PursuerTuning {
    pub falah_base_speed: f32,
    pub saif_base_speed: f32,
    pub level_speed_factor: f32,
    pub path_refresh_secs: f32,
    pub capture_distance: f32,
    pub waypoint_tolerance: f32,
    pub shout_radius: f32,
    pub shout_first_secs: f32,
    pub shout_min_secs: f32,
    pub shout_jitter_secs: f32,
    pub collapse_rate: f32,
    pub spawn_min_distance: i32,
    pub spawn_attempts: u32,
    pub transform_delay_ms: u64,
    pub saif_stun_ms: u64,
    pub transform_rage_factor: f32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StruggleTuning {
    pub start_falah: u32,
    pub start_saif: u32,
    pub base_increment: u32,
    pub min_increment: u32,
    pub saif_penalty: u32,
    pub threshold: u32,
    pub damage_falah: i32,
    pub damage_saif: i32,
    pub timeout_base_ms: u64,
    pub timeout_per_level_ms: u64,
    pub timeout_min_ms: u64,
    pub escape_grace_ms: u64,
    pub escape_rage_bonus: f32,
    pub jumpscare_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EconomyTuning {
    pub max_health: i32,
    pub max_battery: f32,
    pub battery_drain_per_sec: f32,
    pub level_battery_bonus: f32,
    pub level_health_bonus: i32,
    pub log_capacity: usize,
    pub locked_hint_chance: f64,
    pub ambient_min_secs: f32,
    pub ambient_jitter_secs: f32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BystanderTuning {
    pub speed: f32,
    pub wander_radius: f32,
    pub arrive_distance: f32,
    pub kill_distance: f32,
    pub spawn_attempts: u32,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct TomlConfig {
    general: GeneralConfig,
    maze: MazeTuning,
    pursuer: PursuerTuning,
    struggle: StruggleTuning,
    economy: EconomyTuning,
    bystanders: BystanderTuning,
}

impl From<TomlConfig> for GameConfig {
    fn from(t: TomlConfig) -> Self {
        GameConfig {
            general: t.general,
            tuning: Tuning {
                maze: t.maze,
                pursuer: t.pursuer,
                struggle: t.struggle,
                economy: t.economy,
                bystanders: t.bystanders,
            },
        }
    }
}

// ── Defaults ──

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            frame_ms: 16,
            log_file: None,
            log_filter: "info".into(),
            player_walk_speed: 3.5,
            player_sprint_speed: 6.0,
        }
    }
}

impl Default for MazeTuning {
    fn default() -> Self {
        MazeTuning {
            base_size: 10,
            size_per_level: 2,
            loops_per_side: 2,
            placement_attempts: 1000,
            start_clearance: 3,
            cell_size: 4.0,
        }
    }
}

impl Default for PursuerTuning {
    fn default() -> Self {
        PursuerTuning {
            falah_base_speed: 4.2,
            saif_base_speed: 5.5,
            level_speed_factor: 0.7,
            path_refresh_secs: 0.5,
            capture_distance: 1.5,
            waypoint_tolerance: 0.1,
            shout_radius: 15.0,
            shout_first_secs: 5.0,
            shout_min_secs: 5.0,
            shout_jitter_secs: 8.0,
            collapse_rate: 3.0,
            spawn_min_distance: 10,
            spawn_attempts: 100,
            transform_delay_ms: 3000,
            saif_stun_ms: 5000,
            transform_rage_factor: 1.5,
        }
    }
}

impl Default for StruggleTuning {
    fn default() -> Self {
        StruggleTuning {
            start_falah: 10,
            start_saif: 5,
            base_increment: 10,
            min_increment: 2,
            saif_penalty: 3,
            threshold: 100,
            damage_falah: 25,
            damage_saif: 40,
            timeout_base_ms: 3000,
            timeout_per_level_ms: 200,
            timeout_min_ms: 1500,
            escape_grace_ms: 4000,
            escape_rage_bonus: 0.1,
            jumpscare_ms: 1500,
        }
    }
}

impl Default for EconomyTuning {
    fn default() -> Self {
        EconomyTuning {
            max_health: 100,
            max_battery: 100.0,
            battery_drain_per_sec: 2.0,
            level_battery_bonus: 30.0,
            level_health_bonus: 20,
            log_capacity: 5,
            locked_hint_chance: 0.05,
            ambient_min_secs: 5.0,
            ambient_jitter_secs: 10.0,
        }
    }
}

impl Default for BystanderTuning {
    fn default() -> Self {
        BystanderTuning {
            speed: 1.5,
            wander_radius: 5.0,
            arrive_distance: 0.2,
            kill_distance: 1.5,
            spawn_attempts: 50,
        }
    }
}

// ── Derived values ──

impl MazeTuning {
    /// Side length of the square grid for `level`.
    pub fn side_for(&self, level: u32) -> usize {
        self.base_size + self.size_per_level * level as usize
    }
}

impl StruggleTuning {
    /// Milliseconds the player has to break free before the jumpscare.
    pub fn timeout_ms(&self, level: u32) -> u64 {
        let cut = self.timeout_per_level_ms * level as u64;
        self.timeout_base_ms.saturating_sub(cut).max(self.timeout_min_ms)
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/mazechase`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        for dir in candidate_dirs() {
            let path = dir.join("config.toml");
            if !path.exists() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(cfg) => {
                    tracing::info!(path = %path.display(), "loaded config");
                    return cfg;
                }
                Err(e @ ConfigError::Parse(_)) => {
                    tracing::warn!("{e}; using default settings");
                    return GameConfig::default();
                }
                Err(e) => tracing::warn!("{e}"),
            }
        }
        GameConfig::default()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(text)?;
        Ok(parsed.into())
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/mazechase");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}
