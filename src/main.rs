/// Entry point and game loop.

mod ui;

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use mazechase::config::{GameConfig, GeneralConfig};
use mazechase::domain::character::CharacterId;
use mazechase::sim::game::{Game, Shot};
use mazechase::sim::session::Phase;
use ui::input::InputState;
use ui::renderer::{Renderer, UiState};
use ui::sound::SoundEngine;

/// Longest simulated step; a stalled terminal must not teleport the pursuer.
const MAX_DT: f32 = 0.1;

fn main() {
    let config = GameConfig::load();
    init_logging(&config.general);

    let mut game = Game::new(config.tuning.clone());
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();
    if sound.is_none() {
        tracing::warn!("no audio output; running silent");
    }

    let result = game_loop(&mut game, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        tracing::error!(error = %e, "game loop aborted");
        eprintln!("Game error: {e}");
    }

    let s = game.session();
    println!();
    println!("You survived {}s and escaped {} time(s).", s.time_survived(), s.escapes());
}

/// The terminal belongs to the renderer, so logs only go to a file.
/// `RUST_LOG` overrides the configured filter.
fn init_logging(general: &GeneralConfig) {
    let Some(path) = &general.log_file else { return };
    let file = match File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Cannot open log file {}: {e}", path.display());
            return;
        }
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| general.log_filter.as_str().into()))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();
}

fn game_loop(
    game: &mut Game,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut ui = UiState::default();
    let frame = Duration::from_millis(config.general.frame_ms.max(1));
    let mut last = Instant::now();

    loop {
        kb.drain_events();
        if kb.quit() {
            break;
        }

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32().min(MAX_DT);
        last = now;

        handle_input(game, &kb, &mut ui, config, dt);

        for event in game.update(dt) {
            tracing::debug!(?event, "game event");
            if let Some(sfx) = sound {
                sfx.play_event(&event);
            }
        }

        renderer.render(game, &ui)?;

        let spent = last.elapsed();
        if spent < frame {
            std::thread::sleep(frame - spent);
        }
    }

    Ok(())
}

fn handle_input(game: &mut Game, kb: &InputState, ui: &mut UiState, config: &GameConfig, dt: f32) {
    match game.session().phase() {
        Phase::Menu => {
            let n = CharacterId::ALL.len() as i32;
            ui.menu_cursor = (ui.menu_cursor as i32 + kb.menu_step()).rem_euclid(n) as usize;
            if kb.confirm() {
                game.select_character(CharacterId::ALL[ui.menu_cursor]);
            }
        }
        Phase::Playing => {
            if kb.sprint_toggle() {
                ui.sprinting = !ui.sprinting;
            }
            if kb.light() {
                game.toggle_light();
            }
            if kb.action() {
                match game.shoot() {
                    Shot::Hit(boss) => tracing::info!(boss = boss.name(), "hit"),
                    Shot::Miss => tracing::debug!("missed"),
                    Shot::Dry => {}
                }
            }
            let general = &config.general;
            let base = if ui.sprinting { general.player_sprint_speed } else { general.player_walk_speed };
            let speed = base * game.session().character().traits().speed;
            let dir = kb.movement();
            game.move_player(dir * (speed * dt));
        }
        Phase::Struggle => {
            if kb.action() {
                game.increment_struggle();
            }
        }
        Phase::WinLevel => {
            if kb.confirm() {
                game.proceed();
            }
        }
        Phase::GameOver => {
            if kb.confirm() {
                game.reinitialize();
                ui.sprinting = false;
            }
        }
        Phase::Jumpscare => {}
    }
}
