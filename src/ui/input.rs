/// Keyboard state tracker.
///
/// Movement keys are level-triggered (held), everything else is
/// edge-triggered (fresh press this frame). Struggle mashing counts each
/// fresh press of Space, so holding the key does nothing.
///
/// Release events are honoured when the terminal supports keyboard
/// enhancement; otherwise a key counts as released once it stops repeating.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use mazechase::domain::geom::Vec2;

/// Without Release events, a key is considered up after this long without a repeat.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const UP: [KeyCode; 3] = [KeyCode::Char('w'), KeyCode::Char('W'), KeyCode::Up];
const DOWN: [KeyCode; 3] = [KeyCode::Char('s'), KeyCode::Char('S'), KeyCode::Down];
const LEFT: [KeyCode; 3] = [KeyCode::Char('a'), KeyCode::Char('A'), KeyCode::Left];
const RIGHT: [KeyCode; 3] = [KeyCode::Char('d'), KeyCode::Char('D'), KeyCode::Right];

pub struct InputState {
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from up to down during the latest `drain_events`.
    fresh_presses: Vec<KeyCode>,
    raw_events: Vec<KeyEvent>,
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Pull every pending terminal event. Call once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            let Ok(Event::Key(key)) = event::read() else { continue };
            self.raw_events.push(key);
            match key.kind {
                KeyEventKind::Release if self.honor_release => {
                    self.last_active.remove(&key.code);
                }
                KeyEventKind::Release => {}
                _ => {
                    let was_held = self.is_held(key.code);
                    self.last_active.insert(key.code, Instant::now());
                    // Space repeats count as fresh mashes only when truly re-pressed.
                    if !was_held {
                        self.fresh_presses.push(key.code);
                    }
                }
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code).is_some_and(|t| t.elapsed() < HOLD_TIMEOUT)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL) && matches!(k.code, KeyCode::Char('c' | 'C'))
        })
    }

    // ── Game bindings ──

    /// Unit-or-zero movement direction on the floor plane. North is -z.
    pub fn movement(&self) -> Vec2 {
        let axis = |neg: &[KeyCode], pos: &[KeyCode]| -> f32 {
            match (self.any_held(neg), self.any_held(pos)) {
                (true, false) => -1.0,
                (false, true) => 1.0,
                _ => 0.0,
            }
        };
        Vec2::new(axis(&LEFT, &RIGHT), axis(&UP, &DOWN)).normalized()
    }

    pub fn quit(&self) -> bool {
        self.any_pressed(&[KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Esc]) || self.ctrl_c_pressed()
    }

    pub fn confirm(&self) -> bool {
        self.was_pressed(KeyCode::Enter)
    }

    pub fn action(&self) -> bool {
        self.was_pressed(KeyCode::Char(' '))
    }

    pub fn light(&self) -> bool {
        self.any_pressed(&[KeyCode::Char('f'), KeyCode::Char('F')])
    }

    pub fn sprint_toggle(&self) -> bool {
        self.was_pressed(KeyCode::Tab)
    }

    /// Menu navigation: -1, 0 or +1.
    pub fn menu_step(&self) -> i32 {
        if self.any_pressed(&UP) || self.any_pressed(&LEFT) {
            -1
        } else if self.any_pressed(&DOWN) || self.any_pressed(&RIGHT) {
            1
        } else {
            0
        }
    }
}
