/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame into the `front` buffer (grid of Cell)
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. Batch everything with `queue!` and flush once
///   5. Swap front/back
///
/// The village is laid out in pixels; one terminal cell covers
/// `PX_W × PX_H` pixels, so the default 640×360 screen needs 80×23 cells
/// plus the HUD row.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::anim::{chest_lid, coin_glint, shrine_look, smoke_puff, ShrineLook, CROP_STAGES};
use crate::domain::entity::{Category, Facing, Lifecycle, Pickup, Pose};
use crate::domain::geometry::{Point, Rect};
use crate::sim::world::WorldState;

const PX_W: f64 = 8.0;
const PX_H: f64 = 16.0;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 1;

// ── Cell ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Every cell gets an explicit background so the gaps between rows
    /// match on terminals that paint them with the last cleared colour.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 30, b: 18 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from any composed cell; forces a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Replace the glyph and colour but keep the ground colour underneath.
    fn put(&mut self, x: usize, y: usize, ch: char, fg: Color) {
        let bg = self.get(x, y).bg;
        self.set(x, y, Cell::new(ch, fg, bg));
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill(&mut self, x0: usize, y0: usize, w: usize, h: usize, cell: Cell) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                self.set(x, y, cell);
            }
        }
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect()
    }
}

// ── Pixel → cell mapping ──

fn to_cell(p: Point) -> Option<(usize, usize)> {
    if p.x < 0.0 || p.y < 0.0 {
        return None;
    }
    Some(((p.x / PX_W) as usize, MAP_ROW + (p.y / PX_H) as usize))
}

/// Cells covered by a pixel rect; at least one cell for any visible rect.
fn cells_of(r: Rect) -> Option<(usize, usize, usize, usize)> {
    let (x0, y0) = to_cell(Point::new(r.min_x.max(0) as f64, r.min_y.max(0) as f64))?;
    if r.max_x <= 0 || r.max_y <= 0 {
        return None;
    }
    let x1 = ((r.max_x as f64 / PX_W).ceil() as usize).max(x0 + 1);
    let y1 = (MAP_ROW + (r.max_y as f64 / PX_H).ceil() as usize).max(y0 + 1);
    Some((x0, y0, x1 - x0, y1 - y0))
}

// ── Palette ──

fn ground(scene: u8) -> (char, Color, Color) {
    match scene {
        0 => (' ', Color::Rgb { r: 60, g: 90, b: 50 }, Color::Rgb { r: 34, g: 60, b: 30 }),
        1 => ('·', Color::Rgb { r: 120, g: 110, b: 70 }, Color::Rgb { r: 46, g: 74, b: 36 }),
        2 => ('"', Color::Rgb { r: 70, g: 120, b: 60 }, Color::Rgb { r: 30, g: 52, b: 26 }),
        _ => ('~', Color::Rgb { r: 110, g: 160, b: 210 }, Color::Rgb { r: 24, g: 54, b: 90 }),
    }
}

const GOLD: Color = Color::Rgb { r: 255, g: 210, b: 60 };
const WHEAT: Color = Color::Rgb { r: 230, g: 200, b: 110 };
const TOMATO: Color = Color::Rgb { r: 230, g: 70, b: 60 };
const SPROUT: Color = Color::Rgb { r: 120, g: 200, b: 90 };
const WOOD: Color = Color::Rgb { r: 140, g: 90, b: 50 };
const ROOF: Color = Color::Rgb { r: 170, g: 60, b: 50 };
const NEW_ROOF: Color = Color::Rgb { r: 60, g: 110, b: 170 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 30 };
const PANEL_BG: Color = Color::Rgb { r: 30, g: 40, b: 80 };

fn shrine_colour(look: ShrineLook) -> (char, Color) {
    match look {
        ShrineLook::Weathered => ('Π', Color::Rgb { r: 110, g: 110, b: 100 }),
        ShrineLook::Gray => ('Π', Color::Rgb { r: 170, g: 170, b: 170 }),
        ShrineLook::GrayPearl => ('Ω', Color::Rgb { r: 200, g: 200, b: 220 }),
        ShrineLook::Orange => ('Π', Color::Rgb { r: 240, g: 140, b: 40 }),
        ShrineLook::OrangePearl => ('Ω', GOLD),
    }
}

fn crop_glyph(c: &Pickup) -> (char, Color) {
    let stage = c.sprite.frame.clamp(1, CROP_STAGES);
    let ripe = if c.category == Category::Tomato { TOMATO } else { WHEAT };
    match stage {
        1 => ('.', SPROUT),
        2 => (',', SPROUT),
        3 => (';', SPROUT),
        4 => ('y', ripe),
        _ => if c.category == Category::Tomato { ('ó', ripe) } else { ('Ψ', ripe) },
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_scene: Option<u8>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_scene: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);
        tracing::debug!(cols = tw, rows = th, "terminal ready");

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Whole ground changes on a scene switch; repaint everything.
        if self.last_scene != Some(world.scene) {
            self.back.cells.fill(Cell::INVALID);
            self.last_scene = Some(world.scene);
        }

        compose(&mut self.front, world);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

// ── Compose: build front buffer content ──

fn compose(buf: &mut FrameBuffer, w: &WorldState) {
    buf.cells.fill(Cell::BLANK);

    compose_ground(buf, w);
    for s in w.structures.iter().filter(|s| s.sprite.active) {
        compose_structure(buf, w, s);
    }
    for c in w.crops.iter().filter(|c| c.sprite.active) {
        if let Some((x, y)) = to_cell(c.position()) {
            let (ch, fg) = crop_glyph(c);
            buf.put(x, y, ch, fg);
        }
    }
    let glint = coin_glint(w.anim) >= 20;
    for c in w.coins.iter().filter(|c| c.sprite.active) {
        if let Some((x, y)) = to_cell(c.position()) {
            buf.put(x, y, if glint { '¢' } else { '$' }, GOLD);
        }
    }
    for e in w.eggs.iter().filter(|e| e.sprite.active) {
        if let Some((x, y)) = to_cell(e.position()) {
            buf.put(x, y, 'o', Color::Rgb { r: 245, g: 240, b: 220 });
        }
    }
    for c in w.shrine_items.iter().filter(|c| c.sprite.active) {
        if let Some((x, y)) = to_cell(c.position()) {
            let open = chest_lid(w.anim).min_x > 16;
            buf.put(x, y, if open { '▣' } else { '■' }, WOOD);
        }
    }
    compose_chickens(buf, w);
    compose_workers(buf, w);
    compose_player(buf, w);

    if !w.fullscreen {
        compose_hud(buf, w);
    }
    if w.info_overlay {
        compose_info(buf, w);
    }
    if w.paused {
        compose_pause(buf, w);
    }
}

fn compose_ground(buf: &mut FrameBuffer, w: &WorldState) {
    let (ch, fg, bg) = ground(w.scene);
    let cols = ((w.width / PX_W).ceil() as usize).min(buf.width);
    let rows = (w.height / PX_H).ceil() as usize;
    for row in 0..rows {
        for col in 0..cols {
            // Sparse texture: every few cells, staggered per row.
            let glyph = if (col + row * 3) % 7 == 0 { ch } else { ' ' };
            buf.set(col, MAP_ROW + row, Cell::new(glyph, fg, bg));
        }
    }
}

fn compose_structure(buf: &mut FrameBuffer, w: &WorldState, s: &Pickup) {
    let Some((x, y, cw, ch)) = cells_of(s.hitbox()) else { return };
    let bg = buf.get(x, y).bg;
    match s.category {
        Category::Shrine => {
            let (glyph, fg) = shrine_colour(shrine_look(w.scene, w.shrine_glow > 0, w.anim));
            buf.fill(x, y, cw, ch, Cell::new(glyph, fg, bg));
        }
        Category::ChickenHouse => {
            buf.fill(x, y, cw, ch, Cell::new('#', WOOD, bg));
            buf.put(x, y, '^', ROOF);
        }
        cat => {
            let roof = if cat.is_new_building() { NEW_ROOF } else { ROOF };
            buf.fill(x, y, cw, ch, Cell::new('▒', WOOD, bg));
            for col in x..x + cw {
                buf.put(col, y, '▀', roof);
            }
        }
    }
}

fn compose_chickens(buf: &mut FrameBuffer, w: &WorldState) {
    for c in w.chickens.iter().filter(|c| c.sprite.active) {
        let step = c.sprite.frame_rect.min_x % 32 == 0;
        let Some((x, y)) = to_cell(c.position()) else { continue };
        let fg = if c.state == Lifecycle::Ready {
            Color::White
        } else {
            Color::Rgb { r: 200, g: 190, b: 170 }
        };
        let facing_right = c.destination.x >= c.position().x;
        let glyph = match (facing_right, step) {
            (true, true) => '>',
            (true, false) => '}',
            (false, true) => '<',
            (false, false) => '{',
        };
        buf.put(x, y, glyph, fg);
    }
}

fn compose_workers(buf: &mut FrameBuffer, w: &WorldState) {
    for worker in w.workers.iter().filter(|w| w.sprite.active) {
        let p = worker.position();
        let Some((x, y)) = to_cell(Point::new(p.x + 12.0, p.y + 12.0)) else { continue };
        let glyph = match (worker.coin > 0, worker.pose) {
            (true, _) => 'W',
            (false, Pose::Working) => 'w',
            (false, Pose::Walking) => if worker.sprite.frame_rect.min_x == 0 { 'w' } else { 'ŵ' },
        };
        buf.put(x, y, glyph, Color::Rgb { r: 180, g: 140, b: 220 });
    }
}

fn compose_player(buf: &mut FrameBuffer, w: &WorldState) {
    let p = w.player.position();
    let Some((x, y)) = to_cell(Point::new(p.x + 18.0, p.y + 18.0)) else { return };
    let glyph = match w.player.facing {
        None => '@',
        Some(Facing::Down) => 'v',
        Some(Facing::Up) => '^',
        Some(Facing::Left) => '(',
        Some(Facing::Right) => ')',
    };
    buf.put(x, y, glyph, Color::Rgb { r: 255, g: 255, b: 255 });
    if w.player.chicken_held > 0 && x > 0 {
        buf.put(x - 1, y, '>', Color::White);
    }
    if w.player.egg_held > 0 {
        buf.put(x + 1, y, 'o', Color::White);
    }

    if w.smoke {
        // Puff drifts outward as the phase advances.
        let reach = (smoke_puff(w.anim) / 64) as usize;
        let puff = Color::Rgb { r: 200, g: 200, b: 200 };
        buf.put(x + 1 + reach, y.saturating_sub(1), '*', puff);
        if x > reach {
            buf.put(x - 1 - reach, y.saturating_sub(1), '°', puff);
        }
    }
}

fn compose_hud(buf: &mut FrameBuffer, w: &WorldState) {
    let text = format!(" {}", w.inventory());
    buf.fill(0, HUD_ROW, buf.width, 1, Cell::new(' ', Color::White, HUD_BG));
    buf.put_str(0, HUD_ROW, &text, Color::Rgb { r: 230, g: 230, b: 200 }, HUD_BG);
}

fn panel(buf: &mut FrameBuffer, w: &WorldState, lines: &[(&str, Color)]) {
    let view_cols = ((w.width / PX_W).ceil() as usize).min(buf.width);
    let view_rows = (w.height / PX_H).ceil() as usize;
    let box_w = (lines.iter().map(|(s, _)| s.chars().count()).max().unwrap_or(0) + 4).min(view_cols);
    let box_h = (lines.len() + 2).min(view_rows);
    let box_x = view_cols.saturating_sub(box_w) / 2;
    let box_y = MAP_ROW + view_rows.saturating_sub(box_h) / 2;

    buf.fill(box_x, box_y, box_w, box_h, Cell::new(' ', Color::White, PANEL_BG));
    for (i, (line, fg)) in lines.iter().enumerate() {
        buf.put_str(box_x + 2, box_y + 1 + i, line, *fg, PANEL_BG);
    }
}

fn compose_info(buf: &mut FrameBuffer, w: &WorldState) {
    let key = Color::Rgb { r: 120, g: 200, b: 255 };
    let lines = [
        ("Pay workers, grow crops, visit the shrine.", GOLD),
        ("", key),
        ("Move        arrows / hjkl", key),
        ("Info        a", key),
        ("Pause       Esc", key),
        ("Fullscreen  f", key),
        ("Quit        q", key),
    ];
    panel(buf, w, &lines);
}

fn compose_pause(buf: &mut FrameBuffer, w: &WorldState) {
    let hdr = if w.anim.tick { GOLD } else { Color::Rgb { r: 200, g: 170, b: 40 } };
    let key = Color::Rgb { r: 230, g: 230, b: 120 };
    let lines = [
        ("PAUSED", hdr),
        ("", key),
        ("Resume        Esc", key),
        ("Quit          q", key),
        ("Full screen   f", key),
        ("Action        a", key),
        ("Change scene  0-3", Color::Rgb { r: 200, g: 120, b: 220 }),
    ];
    panel(buf, w, &lines);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::test_world;

    fn frame(w: &WorldState) -> FrameBuffer {
        let mut buf = FrameBuffer::new(80, 24);
        compose(&mut buf, w);
        buf
    }

    #[test]
    fn hud_shows_inventory_unless_fullscreen() {
        let mut w = test_world();
        w.info_overlay = false;
        assert!(frame(&w).row_text(HUD_ROW).contains("Coins 0/2"));
        w.fullscreen = true;
        assert!(!frame(&w).row_text(HUD_ROW).contains("Coins"));
    }

    #[test]
    fn player_glyph_lands_on_its_cell() {
        let mut w = test_world();
        w.info_overlay = false;
        w.player.sprite.position = Point::new(100.0, 100.0);
        let buf = frame(&w);
        // (118, 118) → col 14, row 1 + 7
        assert_eq!(buf.get(14, 8).ch, '@');
    }

    #[test]
    fn offscreen_entities_are_skipped() {
        assert_eq!(to_cell(Point::new(-1.0, 5.0)), None);
        assert_eq!(to_cell(Point::new(639.0, 359.0)), Some((79, 23)));
    }

    #[test]
    fn structures_cover_their_footprint() {
        let r = Rect::new(250, 64, 304, 102);
        assert_eq!(cells_of(r), Some((31, 5, 7, 3)));
    }

    #[test]
    fn pause_panel_is_drawn() {
        let mut w = test_world();
        w.info_overlay = false;
        w.paused = true;
        let buf = frame(&w);
        assert!((0..buf.height).any(|y| buf.row_text(y).contains("PAUSED")));
    }

    #[test]
    fn ripe_crops_look_different_by_kind() {
        let mut w = test_world();
        w.crops[0].sprite.frame = 5;
        w.crops[1].sprite.frame = 5;
        assert_eq!(crop_glyph(&w.crops[0]).0, 'Ψ');
        assert_eq!(crop_glyph(&w.crops[1]).0, 'ó');
    }
}
