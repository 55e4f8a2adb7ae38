/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// Each frame:
///   1. Compose the next frame into `front`
///   2. Diff against `back` (the previous frame)
///   3. Queue terminal commands only for changed glyphs, flush once
///   4. Swap front/back
///
/// The maze is drawn top-down, two terminal columns per grid cell, through a
/// dead-zone camera. Without the flashlight the player only sees a couple of
/// cells around them.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use mazechase::domain::cell::Cell;
use mazechase::domain::character::CharacterId;
use mazechase::domain::geom::Coord;
use mazechase::domain::pursuer::{Boss, Pose};
use mazechase::sim::game::Game;
use mazechase::sim::session::{Phase, SessionSnapshot};

const BASE_BG: Color = Color::Rgb { r: 10, g: 10, b: 14 };
const HUD_BG: Color = Color::Rgb { r: 40, g: 8, b: 8 };
const BLOOD: Color = Color::Rgb { r: 200, g: 30, b: 30 };
const BONE: Color = Color::Rgb { r: 220, g: 210, b: 190 };
const DIM: Color = Color::DarkGrey;

/// Terminal columns per grid cell.
const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const LOG_ROWS: usize = 5;
/// HUD, gap, log panel and help bar.
const RESERVED_ROWS: usize = MAP_ROW + 8;

/// Sight radius in cells.
const SIGHT_DARK: i32 = 2;
const SIGHT_LIT: i32 = 5;

// ── Glyph: one terminal cell of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Glyph {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Glyph {
    const BLANK: Glyph = Glyph { ch: ' ', fg: Color::White, bg: BASE_BG };
    /// Never produced by composition, so a back buffer full of these repaints everything.
    const INVALID: Glyph = Glyph { ch: '\u{0}', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Glyph { ch, fg, bg }
    }
}

// ── FrameBuffer ──

struct FrameBuffer {
    width: usize,
    height: usize,
    glyphs: Vec<Glyph>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, glyphs: vec![Glyph::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.glyphs = vec![Glyph::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.glyphs.fill(Glyph::BLANK);
    }

    fn invalidate(&mut self) {
        self.glyphs.fill(Glyph::INVALID);
    }

    fn set(&mut self, x: usize, y: usize, g: Glyph) {
        if x < self.width && y < self.height {
            self.glyphs[y * self.width + x] = g;
        }
    }

    fn get(&self, x: usize, y: usize) -> Glyph {
        if x < self.width && y < self.height {
            self.glyphs[y * self.width + x]
        } else {
            Glyph::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Glyph::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Glyph::new(' ', Color::White, bg));
        }
    }

    fn fill_rect(&mut self, x0: usize, y0: usize, w: usize, h: usize, bg: Color) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                self.set(x, y, Glyph::new(' ', Color::White, bg));
            }
        }
    }
}

// ── Camera ──

/// Viewport into the maze, in grid cells.
#[derive(Clone, Debug, Default)]
pub struct Camera {
    pub x: i32,
    pub z: i32,
    pub view_w: usize,
    pub view_h: usize,
}

impl Camera {
    /// Dead-zone follow: scroll only when the target nears the viewport edge.
    /// Grids smaller than the viewport are centred.
    pub fn follow(&mut self, target: Coord, size: usize) {
        if self.view_w == 0 || self.view_h == 0 {
            return;
        }
        self.x = follow_axis(self.x, target.x, self.view_w, size);
        self.z = follow_axis(self.z, target.z, self.view_h, size);
    }

    pub fn world_to_view(&self, c: Coord) -> Option<(usize, usize)> {
        let vx = c.x - self.x;
        let vz = c.z - self.z;
        if vx >= 0 && vz >= 0 && (vx as usize) < self.view_w && (vz as usize) < self.view_h {
            Some((vx as usize, vz as usize))
        } else {
            None
        }
    }
}

fn follow_axis(origin: i32, target: i32, view: usize, world: usize) -> i32 {
    let view = view as i32;
    let world = world as i32;
    if world <= view {
        return -((view - world) / 2);
    }
    let margin = view / 5;
    let mut origin = origin;
    if target < origin + margin {
        origin = target - margin;
    } else if target > origin + view - margin - 1 {
        origin = target - view + margin + 1;
    }
    origin.clamp(0, world - view)
}

/// Front-end state that is not part of the game.
#[derive(Clone, Debug, Default)]
pub struct UiState {
    pub menu_cursor: usize,
    pub sprinting: bool,
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    camera: Camera,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            camera: Camera::default(),
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;
        self.sync_size(true)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    fn sync_size(&mut self, force: bool) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let (tw, th) = (tw as usize, th as usize);
        if force || tw != self.term_w || th != self.term_h {
            self.term_w = tw;
            self.term_h = th;
            self.front.resize(tw, th);
            self.back.resize(tw, th);
            self.back.invalidate();
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
        }
        Ok(())
    }

    pub fn render(&mut self, game: &Game, ui: &UiState) -> io::Result<()> {
        self.sync_size(false)?;

        let snap = game.session().snapshot();
        if self.last_phase != Some(snap.phase) {
            self.back.invalidate();
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(snap.phase);
        }

        let size = game.grid().size();
        self.camera.view_w = (self.term_w / CELL_W).min(size);
        self.camera.view_h = self.term_h.saturating_sub(RESERVED_ROWS).max(1).min(size);
        self.camera.follow(game.player().cell(game.cell_size()), size);

        self.front.clear();
        match snap.phase {
            Phase::Menu => self.compose_menu(ui),
            Phase::Playing => self.compose_game(game, &snap, ui),
            Phase::Struggle => {
                self.compose_game(game, &snap, ui);
                self.compose_struggle(game, &snap);
            }
            Phase::Jumpscare => self.compose_jumpscare(&snap),
            Phase::WinLevel => {
                self.compose_game(game, &snap, ui);
                self.compose_level_cleared(&snap);
            }
            Phase::GameOver => self.compose_game_over(&snap),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed glyphs ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let g = self.front.get(x, y);
                if g == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if g.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(g.fg))?;
                    last_fg = g.fg;
                }
                if g.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(g.bg))?;
                    last_bg = g.bg;
                }
                queue!(self.writer, Print(g.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ════════════════════════════════════════════════════════════
    //  Compose
    // ════════════════════════════════════════════════════════════

    fn compose_hud(&mut self, snap: &SessionSnapshot, ui: &UiState) {
        let boss = match (snap.boss, snap.stunned) {
            (Boss::Transforming, _) => "??? ".to_string(),
            (b, true) => format!("{} (stunned {:.1}s)", b.name(), snap.stun_remaining_ms as f32 / 1000.0),
            (b, false) => b.name().to_string(),
        };
        let hud = format!(
            " Lv{}  ♥{:>3}  ☼{:>3}%{}  Keys {}/{}  Ammo {}{}  {}  Rage ×{:.2}  {}s{} ",
            snap.level,
            snap.health,
            snap.battery,
            if snap.light_on { "*" } else { " " },
            snap.keys_collected,
            snap.keys_needed,
            snap.ammo,
            if snap.has_weapon { "" } else { " (unarmed)" },
            boss,
            snap.rage,
            snap.time_survived,
            if ui.sprinting { "  SPRINT" } else { "" },
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, BONE, HUD_BG);
    }

    fn compose_game(&mut self, game: &Game, snap: &SessionSnapshot, ui: &UiState) {
        self.compose_hud(snap, ui);

        let cs = game.cell_size();
        let grid = game.grid();
        let me = game.player().cell(cs);
        let sight = if snap.light_on { SIGHT_LIT } else { SIGHT_DARK };
        let unlocked = snap.keys_collected >= snap.keys_needed;

        // ── Terrain and items ──
        for vz in 0..self.camera.view_h {
            for vx in 0..self.camera.view_w {
                let c = Coord::new(self.camera.x + vx as i32, self.camera.z + vz as i32);
                let seen = c.manhattan(me) <= sight;
                let (text, fg, bg) = if !seen {
                    ("  ", DIM, BASE_BG)
                } else {
                    match grid.get(c) {
                        Cell::Wall => ("██", Color::Rgb { r: 70, g: 60, b: 60 }, BASE_BG),
                        Cell::Start => ("░░", DIM, BASE_BG),
                        Cell::Exit if unlocked => ("▓▓", Color::Green, BASE_BG),
                        Cell::Exit => ("▓▓", BLOOD, BASE_BG),
                        Cell::Key if game.item_visible(c) => ("♦ ", Color::Yellow, BASE_BG),
                        Cell::Weapon if game.item_visible(c) => ("¬ ", Color::Cyan, BASE_BG),
                        Cell::Ammo if game.item_visible(c) => ("• ", Color::Cyan, BASE_BG),
                        _ => ("· ", Color::Rgb { r: 35, g: 35, b: 40 }, BASE_BG),
                    }
                };
                self.put_cell(vx, vz, text, fg, bg);
            }
        }

        // ── Actors ──
        for b in game.bystanders() {
            let c = b.position().cell(cs);
            if c.manhattan(me) <= sight {
                let (text, fg) = if b.is_alive() { ("☺ ", BONE) } else { ("x ", BLOOD) };
                self.put_world(c, text, fg);
            }
        }

        let hunter = game.pursuer();
        let hc = hunter.position().cell(cs);
        if hc.manhattan(me) <= sight + 1 || snap.phase == Phase::Struggle {
            let text = match (hunter.pose(), snap.boss) {
                (Pose::Collapsing, _) if hunter.collapse() > 0.5 => "_ ",
                (Pose::Collapsing, _) => "/ ",
                (Pose::Swaying, _) => "z ",
                (_, Boss::Saif) => "Ж ",
                _ => "Ψ ",
            };
            let fg = if snap.boss == Boss::Saif { Color::Magenta } else { BLOOD };
            self.put_world(hc, text, fg);
        }

        self.put_world(me, "@ ", Color::White);

        // ── Log panel ──
        let log_row = MAP_ROW + self.camera.view_h + 1;
        for (i, entry) in snap.logs.iter().take(LOG_ROWS).enumerate() {
            let fg = if i == 0 { BONE } else { DIM };
            let line = format!(" {:>4.0}s  {}", entry.at_ms as f32 / 1000.0, entry.message);
            self.front.put_str(0, log_row + i, &line, fg, BASE_BG);
        }

        let help_row = log_row + LOG_ROWS + 1;
        self.front.put_str(
            0,
            help_row,
            " WASD/↑↓←→ move   F light   Space fire   Tab sprint   Q quit",
            DIM,
            BASE_BG,
        );
    }

    fn put_cell(&mut self, vx: usize, vz: usize, text: &str, fg: Color, bg: Color) {
        self.front.put_str(vx * CELL_W, MAP_ROW + vz, text, fg, bg);
    }

    fn put_world(&mut self, c: Coord, text: &str, fg: Color) {
        if let Some((vx, vz)) = self.camera.world_to_view(c) {
            self.put_cell(vx, vz, text, fg, BASE_BG);
        }
    }

    fn compose_menu(&mut self, ui: &UiState) {
        let title = [
            r" __  __              ___ _                 ",
            r"|  \/  |__ _ ______ / __| |_  __ _ ___ ___ ",
            r"| |\/| / _` |_ / -_) (__| ' \/ _` (_-</ -_)",
            r"|_|  |_\__,_/__\___|\___|_||_\__,_/__/\___|",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 1 + i, line, BLOOD, BASE_BG);
        }
        self.front.put_str(4, 6, "Find the keys. Reach the exit. Do not get caught.", BONE, BASE_BG);
        self.front.put_str(4, 8, "Choose who goes in:", DIM, BASE_BG);

        for (i, who) in CharacterId::ALL.iter().enumerate() {
            let selected = i == ui.menu_cursor;
            let marker = if selected { "▸" } else { " " };
            let t = who.traits();
            let line = format!(
                "{marker} {:<18} spd {:.2}  stm {:.2}  bat {:.2}  stl {:.2}",
                who.name(),
                t.speed,
                t.stamina,
                t.battery,
                t.stealth
            );
            let fg = if selected { Color::White } else { DIM };
            self.front.put_str(4, 10 + i, &line, fg, BASE_BG);
        }

        let chosen = CharacterId::ALL[ui.menu_cursor.min(CharacterId::ALL.len() - 1)];
        self.front.put_str(4, 20, chosen.description(), Color::Yellow, BASE_BG);
        self.front.put_str(4, 22, "↑↓ choose   Enter start   Q quit", DIM, BASE_BG);
    }

    fn compose_struggle(&mut self, game: &Game, snap: &SessionSnapshot) {
        let (bx, by, bw) = (4, MAP_ROW + 2, 44);
        self.front.fill_rect(bx, by, bw, 5, HUD_BG);
        let header = format!("{} HAS YOU", snap.boss.name().to_uppercase());
        self.front.put_str(bx + 2, by + 1, &header, Color::White, HUD_BG);

        let threshold = game.session().tuning().struggle.threshold.max(1);
        let filled = (snap.struggle_progress.min(threshold) as usize * (bw - 6)) / threshold as usize;
        let bar: String = (0..bw - 6).map(|i| if i < filled { '█' } else { '░' }).collect();
        self.front.put_str(bx + 2, by + 2, &bar, BLOOD, HUD_BG);
        self.front.put_str(bx + 2, by + 3, "MASH SPACE!", Color::Yellow, HUD_BG);
    }

    fn compose_jumpscare(&mut self, snap: &SessionSnapshot) {
        for y in 0..self.front.height {
            self.front.fill_row(y, BLOOD);
        }
        let face = [
            r"   .-''''''-.   ",
            r"  /  _    _  \  ",
            r" |  (o)  (o)  | ",
            r" |     /\     | ",
            r"  \  \vvvv/  /  ",
            r"   '-.____.-'   ",
        ];
        let x = self.front.width.saturating_sub(16) / 2;
        let y = self.front.height.saturating_sub(face.len()) / 2;
        for (i, line) in face.iter().enumerate() {
            self.front.put_str(x, y + i, line, Color::Black, BLOOD);
        }
        let name = snap.boss.name().to_uppercase();
        self.front.put_str(x + 8usize.saturating_sub(name.len() / 2), y + face.len() + 1, &name, Color::Black, BLOOD);
    }

    fn compose_level_cleared(&mut self, snap: &SessionSnapshot) {
        let (bx, by) = (4, MAP_ROW + 2);
        self.front.fill_rect(bx, by, 40, 6, Color::Rgb { r: 10, g: 40, b: 10 });
        let bg = Color::Rgb { r: 10, g: 40, b: 10 };
        self.front.put_str(bx + 2, by + 1, "YOU ESCAPED... FOR NOW", Color::Green, bg);
        let next = format!("Level {} needs {} keys.", snap.level, snap.keys_needed);
        self.front.put_str(bx + 2, by + 2, &next, BONE, bg);
        let stats = format!("Health {}  Battery {}%", snap.health, snap.battery);
        self.front.put_str(bx + 2, by + 3, &stats, BONE, bg);
        self.front.put_str(bx + 2, by + 4, "Enter: go deeper", Color::Yellow, bg);
    }

    fn compose_game_over(&mut self, snap: &SessionSnapshot) {
        let box_art = [
            "╔════════════════════════════╗",
            "║         GAME  OVER         ║",
            "╚════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(6, 4 + i, l, BLOOD, BASE_BG);
        }
        let lines = [
            format!("Played as     {}", snap.character.name()),
            format!("Reached level {}", snap.level),
            format!("Escapes       {}", snap.escapes),
            format!("Survived      {}s", snap.time_survived),
            format!("Caught by     {}", snap.boss.name()),
        ];
        for (i, l) in lines.iter().enumerate() {
            self.front.put_str(8, 9 + i, l, BONE, BASE_BG);
        }
        self.front.put_str(8, 15, "Enter: back to menu   Q: quit", DIM, BASE_BG);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_grids_are_centred() {
        let mut cam = Camera { view_w: 20, view_h: 10, ..Camera::default() };
        cam.follow(Coord::new(3, 3), 12);
        assert_eq!(cam.x, -4);
        assert_eq!(cam.z, 0);
    }

    #[test]
    fn camera_scrolls_only_past_dead_zone() {
        let mut cam = Camera { view_w: 10, view_h: 10, ..Camera::default() };
        cam.follow(Coord::new(5, 5), 30);
        assert_eq!((cam.x, cam.z), (0, 0));
        cam.follow(Coord::new(9, 5), 30);
        assert_eq!(cam.x, 2);
        cam.follow(Coord::new(29, 29), 30);
        assert_eq!((cam.x, cam.z), (20, 20));
        assert_eq!(cam.world_to_view(Coord::new(29, 29)), Some((9, 9)));
        assert_eq!(cam.world_to_view(Coord::new(0, 0)), None);
    }
}
