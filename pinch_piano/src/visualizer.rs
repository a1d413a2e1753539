//! Software-rendered visualizer using `minifb`.
//!
//! Layout (1280×720):
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │ [Exit] [Select sheet]                              sheet: 3/14     │
//! │                                                                    │
//! │   landmark panel: thumb + index tips, pointer dot                  │
//! │                 ┌──────────────────────┐                           │
//! │                 │  popup (modal modes) │                           │
//! │                 └──────────────────────┘                           │
//! │ status                                                             │
//! │              ┌──┬─┬─┬─┬──┬──┬─┬─┬─┬─┬─┬──┬──┐                      │
//! │              │ C│ D│ E│ F│ G│ A│ B│C5│  keyboard                    │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All drawing goes through [`Canvas`], which has no window attached so
//! frames can be painted and inspected in tests.

use std::sync::mpsc::Sender;
use std::time::Duration;

use hand_pointer::Rect;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use piano_layout::{Button, Mode, PianoKey, SCREEN_H, SCREEN_W};

use crate::app::{AppState, UiState};
use crate::landmarks::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:       usize = SCREEN_W as usize;
pub const WIN_H:       usize = SCREEN_H as usize;
const PANEL:           (i32, i32, i32, i32) = (20, 80, 1240, 350);
const STATUS_Y:        i32   = 445;
const BG_COLOR:        u32   = 0xFF1A1A2E;
const PANEL_BG:        u32   = 0xFF16213E;
const GRID_COLOR:      u32   = 0xFF1F2B4D;
const TEXT_LIGHT:      u32   = 0xFFEEEEEE;
const TEXT_DIM:        u32   = 0xFF888888;
const TEXT_DARK:       u32   = 0xFF000000;

const WHITE_KEY:       u32   = 0xFFF5F5F5;
const WHITE_HOVER:     u32   = 0xFFB8E0FF;
const BLACK_KEY:       u32   = 0xFF202020;
const BLACK_HOVER:     u32   = 0xFF3A5A80;
const KEY_ACTIVE:      u32   = 0xFFFF6B6B;
const KEY_BORDER:      u32   = 0xFF000000;
const EXPECTED_COLOR:  u32   = 0xFFFFD700;  // gold

const BUTTON_COLOR:    u32   = 0xFFC8C8C8;
const BUTTON_HOVER:    u32   = 0xFF4CAF50;
const BUTTON_ACTIVE:   u32   = 0xFFE53935;
const POPUP_BG:        u32   = 0xFFFFFFFF;
const POPUP_BORDER:    u32   = 0xFF1E88E5;
const COMPLETE_BORDER: u32   = 0xFF43A047;

const POINTER_OPEN:    u32   = 0xFF00FF00;
const POINTER_PINCHED: u32   = 0xFFFF0000;
const THUMB_COLOR:     u32   = 0xFF00E5FF;
const INDEX_COLOR:     u32   = 0xFFFF40FF;
const POINTER_R:       i32   = 8;

// ════════════════════════════════════════════════════════════════════════════
// Canvas — clipped drawing primitives over an ARGB buffer
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas {
    w:   usize,
    h:   usize,
    buf: Vec<u32>,
}

impl Canvas {
    pub fn new(w: usize, h: usize) -> Self {
        Canvas { w, h, buf: vec![BG_COLOR; w * h] }
    }

    pub fn buffer(&self) -> &[u32] { &self.buf }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        if x < 0 || y < 0 { return None; }
        let (x, y) = (x as usize, y as usize);
        if x < self.w && y < self.h { Some(self.buf[y * self.w + x]) } else { None }
    }

    pub fn clear(&mut self, color: u32) { self.buf.fill(color); }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.buf[y as usize * self.w + x as usize] = color;
        }
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        let x0 = x.max(0) as usize;
        let y0 = y.max(0) as usize;
        let x1 = (x + w).clamp(0, self.w as i32) as usize;
        let y1 = (y + h).clamp(0, self.h as i32) as usize;
        for row in y0..y1 {
            for col in x0..x1 {
                self.buf[row * self.w + col] = color;
            }
        }
    }

    pub fn draw_border(&mut self, x: i32, y: i32, w: i32, h: i32, thickness: i32, color: u32) {
        let t = thickness.max(1);
        self.fill_rect(x,         y,         w, t, color);
        self.fill_rect(x,         y + h - t, w, t, color);
        self.fill_rect(x,         y,         t, h, color);
        self.fill_rect(x + w - t, y,         t, h, color);
    }

    pub fn fill_circle(&mut self, cx: i32, cy: i32, r: i32, color: u32) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.set_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Bresenham.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        let (dx, dy) = ((x1 - x0).abs(), -(y1 - y0).abs());
        let (sx, sy) = (if x0 < x1 { 1 } else { -1 }, if y0 < y1 { 1 } else { -1 });
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.set_pixel(x, y, color);
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    /// Darken everything already drawn, e.g. behind a modal popup.
    pub fn dim(&mut self, amount: f32) {
        for px in self.buf.iter_mut() {
            *px = blend(*px, 0xFF000000, amount);
        }
    }

    /// 3×5 bitmap font, each glyph cell `scale` pixels per dot.
    pub fn draw_text(&mut self, text: &str, x: i32, y: i32, scale: i32, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3i32 {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row as i32 * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx >= self.w as i32 { break; }
        }
    }

    pub fn draw_text_centered(&mut self, text: &str, r: Rect, scale: i32, color: u32) {
        let (x, y, w, h) = irect(r);
        let tw = text_width(text, scale);
        self.draw_text(text, x + (w - tw) / 2, y + (h - 5 * scale) / 2, scale, color);
    }
}

pub fn text_width(text: &str, scale: i32) -> i32 {
    (text.chars().count() as i32 * 4 - 1).max(0) * scale
}

fn irect(r: Rect) -> (i32, i32, i32, i32) {
    (r.left as i32, r.top as i32, r.width() as i32, r.height() as i32)
}

// ════════════════════════════════════════════════════════════════════════════
// paint — one full frame from the app state
// ════════════════════════════════════════════════════════════════════════════

pub fn paint(c: &mut Canvas, app: &AppState) {
    c.clear(BG_COLOR);
    let layout = app.layout();
    let mode = app.mode();

    // ── Landmark panel ────────────────────────────────────────────────────
    let (px, py, pw, ph) = PANEL;
    c.fill_rect(px, py, pw, ph, PANEL_BG);
    for gx in (px..px + pw).step_by(80) {
        c.fill_rect(gx, py, 1, ph, GRID_COLOR);
    }
    for gy in (py..py + ph).step_by(70) {
        c.fill_rect(px, gy, pw, 1, GRID_COLOR);
    }

    // ── Keyboard: whites, then blacks on top ──────────────────────────────
    let kb = layout.keyboard();
    for key in kb.white_keys().chain(kb.black_keys()) {
        draw_key(c, app, key);
    }
    if let Some(note) = app.expected_note() {
        if let Some(key) = kb.key(note) {
            let (x, y, w, h) = irect(key.rect);
            c.draw_border(x, y, w, h, 4, EXPECTED_COLOR);
        }
    }

    // ── Buttons ───────────────────────────────────────────────────────────
    if mode.keys_active() {
        for b in layout.buttons(mode) {
            draw_button(c, app, b);
        }
    }

    // ── Sheet progress, top right ─────────────────────────────────────────
    if let Some(p) = app.progress() {
        let label = p.label();
        let x = WIN_W as i32 - 20 - text_width(&label, 3);
        c.draw_text(&label, x, 30, 3, EXPECTED_COLOR);
    }

    // ── Status bar ────────────────────────────────────────────────────────
    c.draw_text(mode.label(), 20, STATUS_Y, 2, EXPECTED_COLOR);
    c.draw_text(&app.status, 20 + text_width(mode.label(), 2) + 24, STATUS_Y, 2, TEXT_LIGHT);
    let legend = "point=index tip  pinch=click  q/esc=quit";
    c.draw_text(legend, WIN_W as i32 - 20 - text_width(legend, 2), STATUS_Y, 2, TEXT_DIM);
    if let Some(d) = app.pinch_distance() {
        let gap = format!("pinch {:.3}", d);
        c.draw_text(&gap, WIN_W as i32 - 20 - text_width(&gap, 2), STATUS_Y + 16, 2, TEXT_DIM);
    }

    // ── Modal popups ──────────────────────────────────────────────────────
    match mode {
        Mode::SheetSelect => {
            c.dim(0.5);
            let popup = layout.popup();
            let (x, y, w, h) = irect(popup.rect);
            c.fill_rect(x, y, w, h, POPUP_BG);
            c.draw_border(x, y, w, h, 3, POPUP_BORDER);
            let title = Rect::from_xywh(popup.rect.left, popup.rect.top + 20.0, popup.rect.width(), 40.0);
            c.draw_text_centered("SELECT SHEET", title, 3, TEXT_DARK);
            for item in &popup.items {
                draw_button(c, app, item);
            }
        }
        Mode::Complete => {
            c.dim(0.5);
            let r = layout.complete_rect();
            let (x, y, w, h) = irect(r);
            c.fill_rect(x, y, w, h, POPUP_BG);
            c.draw_border(x, y, w, h, 3, COMPLETE_BORDER);
            let top = Rect::from_xywh(r.left, r.top + 40.0, r.width(), 50.0);
            c.draw_text_centered("COMPLETE!", top, 5, COMPLETE_BORDER);
            if let Some(p) = app.progress() {
                let bottom = Rect::from_xywh(r.left, r.top + 110.0, r.width(), 40.0);
                c.draw_text_centered(&p.sheet().name, bottom, 3, TEXT_DARK);
            }
        }
        Mode::Normal | Mode::SheetPlay => {}
    }

    // ── Fingertips and pointer, always on top ─────────────────────────────
    if let Some(frame) = app.last_frame() {
        if let Some(tips) = frame.fingertips {
            let to_px = |x: f32, y: f32| ((x * WIN_W as f32) as i32, (y * WIN_H as f32) as i32);
            let (tx, ty) = to_px(tips.thumb.x, tips.thumb.y);
            let (ix, iy) = to_px(tips.index.x, tips.index.y);
            c.draw_line(tx, ty, ix, iy, TEXT_DIM);
            c.fill_circle(tx, ty, 4, THUMB_COLOR);
            c.fill_circle(ix, iy, 4, INDEX_COLOR);
        }
        if let Some(p) = frame.pointer.visible_position() {
            let color = if frame.pinched { POINTER_PINCHED } else { POINTER_OPEN };
            c.fill_circle(p.x as i32, p.y as i32, POINTER_R, color);
        }
    }
}

fn draw_key(c: &mut Canvas, app: &AppState, key: &PianoKey) {
    let id = key.region().id;
    let fill = match (app.ui_state(&id), key.is_black) {
        (UiState::Active, _)     => KEY_ACTIVE,
        (UiState::Hover, false)  => WHITE_HOVER,
        (UiState::Hover, true)   => BLACK_HOVER,
        (UiState::Normal, false) => WHITE_KEY,
        (UiState::Normal, true)  => BLACK_KEY,
    };
    let (x, y, w, h) = irect(key.rect);
    c.fill_rect(x, y, w, h, fill);
    c.draw_border(x, y, w, h, 1, KEY_BORDER);

    let label_color = if key.is_black { TEXT_LIGHT } else { TEXT_DARK };
    let label = Rect::from_xywh(key.rect.left, key.rect.bottom - 30.0, key.rect.width(), 20.0);
    c.draw_text_centered(key.note, label, 2, label_color);
}

fn draw_button(c: &mut Canvas, app: &AppState, b: &Button) {
    let fill = match app.ui_state(&b.id) {
        UiState::Active => BUTTON_ACTIVE,
        UiState::Hover  => BUTTON_HOVER,
        UiState::Normal => BUTTON_COLOR,
    };
    let (x, y, w, h) = irect(b.rect);
    c.fill_rect(x, y, w, h, fill);
    c.draw_border(x, y, w, h, 2, TEXT_DARK);
    c.draw_text_centered(&b.label, b.rect, 2, TEXT_DARK);
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer — the window
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    canvas: Canvas,
    /// Present only when the mouse drives the simulated hand.
    sim_tx: Option<Sender<SimInput>>,
}

impl Visualizer {
    pub fn new(sim_tx: Option<Sender<SimInput>>, frame_interval: Duration) -> Result<Self, minifb::Error> {
        let mut window = Window::new(
            "Pinch Piano",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;
        window.limit_update_rate(Some(frame_interval));

        Ok(Visualizer { window, canvas: Canvas::new(WIN_W, WIN_H), sim_tx })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Handle quit keys and, in simulation, forward the mouse as a hand.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        if one_shot(Key::Q) || one_shot(Key::Escape) {
            return false;
        }

        if let Some(tx) = &self.sim_tx {
            let cursor = self.window
                .get_mouse_pos(MouseMode::Discard)
                .map(|(x, y)| (x / WIN_W as f32, y / WIN_H as f32));
            let pinch = self.window.get_mouse_down(MouseButton::Left)
                     || self.window.is_key_down(Key::Space);
            if tx.send(SimInput { cursor, pinch }).is_err() {
                self.sim_tx = None;
            }
        }

        true
    }

    /// Render one frame.
    pub fn render(&mut self, app: &AppState) {
        paint(&mut self.canvas, app);
        self.window.update_with_buffer(self.canvas.buffer(), WIN_W, WIN_H).ok();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0-t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar,br) << 16) | (lerp(ag,bg) << 8) | lerp(ab,bb)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
