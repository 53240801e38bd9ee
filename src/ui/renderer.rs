/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The renderer only reads the session; it never changes game state.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::content;
use crate::domain::countdown::AlertColor;
use crate::domain::progression::Screen;
use crate::domain::reward::RevealLine;
use crate::sim::dialog::{Dialog, DialogKind};
use crate::sim::session::Session;

// ── Palette ──

const AMBER: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const GREEN: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const CYAN: Color = Color::Rgb { r: 100, g: 200, b: 255 };
const RED: Color = Color::Rgb { r: 255, g: 60, b: 60 };
const YELLOW: Color = Color::Rgb { r: 255, g: 230, b: 60 };
const PAPER: Color = Color::Rgb { r: 235, g: 225, b: 200 };
const DIM: Color = Color::DarkGrey;
const PANEL: Color = Color::Rgb { r: 40, g: 40, b: 55 };

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool,    // true = this char occupies 2 terminal columns
    cont: bool,    // true = continuation of previous wide char (skip render)
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, also used
    /// for `Clear`, so row gaps on VTE terminals match the cells.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 4],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell.wide = char_width(c) == 2;
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or(" ")
    }
}

/// Terminal columns taken by `c`: 2 for Hangul, CJK, fullwidth forms and
/// emoji, 0 for joiners and variation selectors, 1 otherwise.
fn char_width(c: char) -> usize {
    match c as u32 {
        0x200D | 0xFE00..=0xFE0F => 0,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x1F300..=0x1F64F
        | 0x1F900..=0x1F9FF
        | 0x1FA70..=0x1FAFF => 2,
        _ => 1,
    }
}

fn str_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

/// `120000` → `120,000`.
pub fn fmt_points(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
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

    /// Write a string at (x, y). Wide chars take two columns; a wide char
    /// that would straddle the right edge is dropped.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            let w = char_width(ch);
            if w == 0 {
                continue;
            }
            if cx + w > self.width {
                break;
            }
            self.set(cx, y, Cell::from_char(ch, fg, bg));
            if w == 2 {
                let mut cont = Cell::WIDE_CONT;
                cont.bg = Cell::norm_bg(bg);
                self.set(cx + 1, y, cont);
            }
            cx += w;
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let x = self.width.saturating_sub(str_width(s)) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    fn fill(&mut self, x: usize, y: usize, w: usize, h: usize, bg: Color) {
        for row in y..y + h {
            for col in x..x + w {
                self.set(col, row, Cell::from_char(' ', Color::Reset, bg));
            }
        }
    }
}

// ── Renderer ──

/// Vertical layout
const HUD_ROW: usize = 0;
const TITLE_ROW: usize = 2;
const BODY_ROW: usize = 4;
const LEFT: usize = 4;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<Screen>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
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
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, session: &Session) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Screen change → clear for clean transition
        let screen = session.screen();
        if self.last_screen != Some(screen) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_screen = Some(screen);
        }

        self.front.clear();
        compose(&mut self.front, session);

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal default.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                // Skip continuation cells (right half of wide chars)
                if cell.cont {
                    if cell != prev { need_move = true; }
                    x += 1;
                    continue;
                }

                // For wide cells, also check if the continuation changed
                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                // Position cursor if needed
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                // Set colors only if changed
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    // Wide char printed: cursor advanced 2 columns
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

// ── Compose: build front buffer content ──

fn compose(buf: &mut FrameBuffer, s: &Session) {
    let screen = s.screen();
    let shake = shake_offset(s);

    if screen.shows_hud() {
        compose_hud(buf, s);
    }

    let title_fg = if screen == Screen::Emergency { RED } else { AMBER };
    buf.put_str(LEFT + shake, TITLE_ROW, content::title(screen), title_fg, Color::Reset);

    let body_fg = if screen.is_letter() { PAPER } else { Color::White };
    let body = content::body(screen);
    if screen != Screen::Epilogue {
        for (i, line) in body.iter().enumerate() {
            buf.put_str(LEFT + shake, BODY_ROW + i, line, body_fg, Color::Reset);
        }
    }
    let below = BODY_ROW + body.len() + 1;

    match screen {
        Screen::Intro => compose_intro(buf, below),
        Screen::Binary | Screen::FinalLogic => compose_answer(buf, s, below, shake),
        Screen::Emergency => {
            compose_countdown(buf, s, below, shake);
            compose_answer(buf, s, below + 2, shake);
        }
        Screen::Scan => compose_scan(buf, s, below),
        Screen::MomLetter | Screen::DadLetter => {
            buf.put_str(LEFT, below + 1, "[ENTER] 다음", CYAN, Color::Reset);
        }
        Screen::Reward => compose_reward(buf, s, below),
        Screen::Epilogue => compose_epilogue(buf, body),
    }

    compose_footer(buf, screen);

    if let Some(dialog) = s.dialog() {
        compose_dialog(buf, dialog);
    }
}

/// Horizontal jitter while the emergency shake runs.
fn shake_offset(s: &Session) -> usize {
    if !s.shaking() {
        return 0;
    }
    const PATTERN: [usize; 6] = [0, 2, 1, 3, 0, 2];
    PATTERN[(s.now_ms() / 50) as usize % PATTERN.len()]
}

fn compose_hud(buf: &mut FrameBuffer, s: &Session) {
    let width = buf.width;
    buf.fill(0, HUD_ROW, width, 1, PANEL);

    let pips: String = (1..=4u8)
        .map(|n| if n <= s.indicator() { '●' } else { '○' })
        .collect();
    let phase = format!(" PHASE {}/4  {}", s.indicator(), pips);
    buf.put_str(0, HUD_ROW, &phase, GREEN, PANEL);

    let score = format!(" SCORE {} ", fmt_points(s.score()));
    let x = width.saturating_sub(str_width(&score) + 1);
    if s.score_flashing() {
        buf.put_str(x, HUD_ROW, &score, Color::Black, YELLOW);
    } else {
        buf.put_str(x, HUD_ROW, &score, AMBER, PANEL);
    }
}

fn compose_intro(buf: &mut FrameBuffer, row: usize) {
    let banner = [
        r" ___ ___ ___ _____   _____ _____   __",
        r"| _ \ __/ __/ _ \ \ / / __| _ \ \ / /",
        r"|   / _| (_| (_) \ V /| _||   /\ V / ",
        r"|_|_\___\___\___/ \_/ |___|_|_\ |_|  ",
    ];
    for (i, line) in banner.iter().enumerate() {
        buf.put_str(LEFT, row + i, line, GREEN, Color::Reset);
    }
}

fn compose_answer(buf: &mut FrameBuffer, s: &Session, row: usize, shake: usize) {
    let failed = s
        .screen()
        .puzzle()
        .is_some_and(|p| s.failure_active(p));
    let frame_fg = if failed { RED } else { CYAN };
    let field = format!("▸ [ {:<16} ]", format!("{}_", s.entry().as_str()));
    buf.put_str(LEFT + shake, row, &field, frame_fg, Color::Reset);
    if failed {
        let x = LEFT + shake + str_width(&field) + 2;
        buf.put_str(x, row, content::SUBMIT_FAILED, Color::White, RED);
    }
}

fn compose_countdown(buf: &mut FrameBuffer, s: &Session, row: usize, shake: usize) {
    let cd = s.countdown();
    let secs = cd.remaining();
    let fg = match cd.alert() {
        _ if !cd.is_running() => DIM,
        Some(AlertColor::Red) => RED,
        Some(AlertColor::Yellow) => YELLOW,
        None => GREEN,
    };
    let clock = format!("삭제까지 {:02}:{:02}", secs / 60, secs % 60);
    buf.put_str(LEFT + shake, row, &clock, fg, Color::Reset);
}

fn compose_scan(buf: &mut FrameBuffer, s: &Session, row: usize) {
    if s.scan_active() {
        let dots = ".".repeat(((s.now_ms() / 400) % 4) as usize);
        let status = format!("◉ 스캔 대기 중{dots}");
        buf.put_str(LEFT, row, &status, GREEN, Color::Reset);
    } else {
        buf.put_str(LEFT, row, "[ENTER] 스캔 시작", CYAN, Color::Reset);
    }
    buf.put_str(LEFT, row + 1, "[M] 관리자 코드", DIM, Color::Reset);
    if s.force_scan_allowed() {
        buf.put_str(LEFT, row + 2, "[F2] 강제 통과 (테스트)", DIM, Color::Reset);
    }
}

fn compose_reward(buf: &mut FrameBuffer, s: &Session, row: usize) {
    let board = s.reward();
    let labels = [
        (RevealLine::Base, "기본 보상"),
        (RevealLine::Cognitive, "인지 보너스"),
        (RevealLine::Time, "시간 보너스"),
    ];
    for (i, (line, label)) in labels.iter().enumerate() {
        if let Some(v) = board.displayed(*line) {
            draw_bill_line(buf, row + i, label, v, Color::White);
        }
    }
    buf.put_str(LEFT, row + 3, &"─".repeat(32), DIM, Color::Reset);
    if let Some(v) = board.displayed(RevealLine::Total) {
        draw_bill_line(buf, row + 4, "총 보상", v, AMBER);
    }
    if s.gate().is_revealed() {
        buf.put_str(LEFT, row + 5, "✔ hidden_message.txt 복구됨", DIM, Color::Reset);
    }
    if board.is_celebrating() {
        compose_fireworks(buf, s.now_ms(), row + 7);
    }
}

fn draw_bill_line(buf: &mut FrameBuffer, row: usize, label: &str, value: u64, fg: Color) {
    buf.put_str(LEFT, row, label, fg, Color::Reset);
    let amount = format!("{} P", fmt_points(value));
    let x = (LEFT + 32).saturating_sub(str_width(&amount));
    buf.put_str(x, row, &amount, fg, Color::Reset);
}

fn compose_fireworks(buf: &mut FrameBuffer, now_ms: u64, row: usize) {
    const BURSTS: [&str; 3] = ["  *   .  ✦   .   *  ", " . ✦  *  .  ✦  * . ", "✦  .  *  ✦  .  *  ✦"];
    const COLORS: [Color; 3] = [AMBER, CYAN, GREEN];
    let phase = (now_ms / 250) as usize;
    for i in 0..3 {
        let k = (phase + i) % BURSTS.len();
        buf.put_centered(row + i, BURSTS[k], COLORS[k], Color::Reset);
    }
    buf.put_centered(row + 4, "🎉 축하합니다! 🎉", AMBER, Color::Reset);
}

fn compose_epilogue(buf: &mut FrameBuffer, body: &[&str]) {
    let w = 48.min(buf.width.saturating_sub(LEFT * 2));
    let h = body.len() + 2;
    buf.fill(LEFT, BODY_ROW - 1, w, h + 1, Color::Black);
    for (i, line) in body.iter().enumerate() {
        let text = format!("> {line}");
        buf.put_str(LEFT + 1, BODY_ROW + i, &text, GREEN, Color::Black);
    }
}

fn compose_footer(buf: &mut FrameBuffer, screen: Screen) {
    let help = match screen {
        Screen::Intro => "ENTER 시작   ESC 종료",
        Screen::Binary | Screen::Emergency | Screen::FinalLogic => {
            "ENTER 제출   ESC 지우기   Ctrl+C 종료"
        }
        Screen::Scan => "ENTER 스캔   M 관리자 코드   Ctrl+C 종료",
        Screen::MomLetter | Screen::DadLetter => "ENTER 다음",
        Screen::Reward => "ESC 종료",
        Screen::Epilogue => "ENTER 로그아웃",
    };
    let row = buf.height.saturating_sub(1);
    buf.put_str(1, row, help, DIM, Color::Reset);
}

fn compose_dialog(buf: &mut FrameBuffer, dialog: &Dialog) {
    let lines: Vec<&str> = dialog.text.lines().collect();
    let text_w = lines.iter().map(|l| str_width(l)).max().unwrap_or(0);
    let box_w = (text_w + 6).max(30).min(buf.width);
    let box_h = lines.len() + 5;
    if box_w < 8 || box_h > buf.height {
        return;
    }
    let box_x = buf.width.saturating_sub(box_w) / 2;
    let box_y = buf.height.saturating_sub(box_h) / 2;

    buf.fill(box_x, box_y, box_w, box_h, PANEL);
    let edge = "─".repeat(box_w.saturating_sub(2));
    buf.put_str(box_x, box_y, &format!("┌{edge}┐"), AMBER, PANEL);
    buf.put_str(box_x, box_y + box_h - 1, &format!("└{edge}┘"), AMBER, PANEL);
    for row in box_y + 1..box_y + box_h - 1 {
        buf.put_str(box_x, row, "│", AMBER, PANEL);
        buf.put_str(box_x + box_w - 1, row, "│", AMBER, PANEL);
    }
    for (i, line) in lines.iter().enumerate() {
        buf.put_str(box_x + 3, box_y + 1 + i, line, Color::White, PANEL);
    }

    let action_row = box_y + lines.len() + 2;
    match &dialog.kind {
        DialogKind::Alert => {
            buf.put_str(box_x + 3, action_row, "[ENTER] 확인", CYAN, PANEL);
        }
        DialogKind::Confirm(_) => {
            buf.put_str(box_x + 3, action_row, "[Y/ENTER] 예   [N/ESC] 아니오", CYAN, PANEL);
        }
        DialogKind::Prompt(_, field) => {
            let entry = format!("▸ {}_", field.as_str());
            buf.put_str(box_x + 3, action_row, &entry, GREEN, PANEL);
            buf.put_str(box_x + 3, action_row + 1, "[ENTER] 입력   [ESC] 취소", DIM, PANEL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_text(buf: &FrameBuffer, y: usize) -> String {
        (0..buf.width)
            .map(|x| buf.get(x, y))
            .filter(|c| !c.cont)
            .map(|c| c.as_str().to_string())
            .collect()
    }

    #[test]
    fn points_get_thousands_separators() {
        assert_eq!(fmt_points(0), "0");
        assert_eq!(fmt_points(999), "999");
        assert_eq!(fmt_points(1_000), "1,000");
        assert_eq!(fmt_points(120_000), "120,000");
        assert_eq!(fmt_points(1_234_567), "1,234,567");
    }

    #[test]
    fn hangul_and_emoji_are_double_width() {
        assert_eq!(str_width("abc"), 3);
        assert_eq!(str_width("제미나이"), 8);
        assert_eq!(str_width("🎉"), 2);
        assert_eq!(str_width("ㅈㅁㄴㅇ"), 8);
    }

    #[test]
    fn wide_chars_reserve_a_continuation_cell() {
        let mut buf = FrameBuffer::new(10, 1);
        buf.put_str(0, 0, "a제b", Color::White, Color::Reset);
        assert!(buf.get(1, 0).wide);
        assert!(buf.get(2, 0).cont);
        assert_eq!(buf.get(3, 0).as_str(), "b");
        assert_eq!(row_text(&buf, 0).trim_end(), "a제b");
    }

    #[test]
    fn wide_char_at_the_edge_is_dropped() {
        let mut buf = FrameBuffer::new(3, 1);
        buf.put_str(0, 0, "ab제", Color::White, Color::Reset);
        assert_eq!(row_text(&buf, 0), "ab ");
    }

    #[test]
    fn dialog_box_shows_text_and_actions() {
        let mut buf = FrameBuffer::new(60, 20);
        compose_dialog(&mut buf, &Dialog::alert("hello\nworld"));
        let all: Vec<String> = (0..20).map(|y| row_text(&buf, y)).collect();
        assert!(all.iter().any(|r| r.contains("hello")));
        assert!(all.iter().any(|r| r.contains("world")));
        assert!(all.iter().any(|r| r.contains("[ENTER]")));
    }
}
