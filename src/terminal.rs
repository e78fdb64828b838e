// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Result, Stdout, Write};
use std::time::{Duration, Instant};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, ExecutableCommand, QueueableCommand,
};
use log::{debug, trace};

use crate::canvas::Canvas;
use crate::frame::{Cell, Frame};
use crate::palette::Palette;
use crate::scheduler::{FrameHost, HostSignal};

/// Attributes the terminal currently has set, so unchanged ones are not
/// re-sent.
#[derive(Default)]
struct Pen {
    fg: Option<Color>,
    bg: Option<Color>,
    bold: bool,
}

impl Pen {
    fn apply(&mut self, out: &mut Stdout, cell: &Cell) -> Result<()> {
        if cell.fg != self.fg {
            out.queue(SetForegroundColor(cell.fg.unwrap_or(Color::Reset)))?;
            self.fg = cell.fg;
        }
        if cell.bg != self.bg {
            out.queue(SetBackgroundColor(cell.bg.unwrap_or(Color::Reset)))?;
            self.bg = cell.bg;
        }
        if cell.bold != self.bold {
            out.queue(SetAttribute(if cell.bold {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            }))?;
            self.bold = cell.bold;
        }
        Ok(())
    }
}

/// A stretch of changed cells in one row that can be printed in one go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Run {
    start: usize,
    len: usize,
}

fn same_style(a: &Cell, b: &Cell) -> bool {
    a.fg == b.fg && a.bg == b.bg && a.bold == b.bold
}

/// Splits the sorted dirty indices of one row into runs, skipping cells the
/// terminal already shows and syncing `shown` as it goes.
fn collect_runs(frame: &Frame, shown: &mut [Cell], row: &[usize], runs: &mut Vec<Run>) {
    runs.clear();
    let mut i = 0;
    while i < row.len() {
        let start = row[i];
        let first = frame.cell_at_index(start);
        i += 1;
        if shown[start] == first {
            continue;
        }
        shown[start] = first;

        let mut len = 1;
        while i < row.len() && row[i] == start + len {
            let cell = frame.cell_at_index(row[i]);
            if shown[row[i]] == cell || !same_style(&cell, &first) {
                break;
            }
            shown[row[i]] = cell;
            len += 1;
            i += 1;
        }
        runs.push(Run { start, len });
    }
}

struct Shown {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Shown {
    fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::blank_with_bg(None); width as usize * height as usize],
        }
    }

    fn fits(&self, frame: &Frame) -> bool {
        self.width == frame.width && self.height == frame.height
    }
}

pub struct Terminal {
    stdout: Stdout,
    shown: Option<Shown>,
    run_buf: String,
    rows: Vec<Vec<usize>>,
    touched_rows: Vec<u16>,
    runs: Vec<Run>,
}

impl Terminal {
    pub fn new() -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            out.execute(SetAttribute(Attribute::Reset))?;
            out.execute(ResetColor)?;
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()?;
            Ok(())
        })();
        if let Err(e) = init {
            restore(&mut out);
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            shown: None,
            run_buf: String::with_capacity(64),
            rows: Vec::new(),
            touched_rows: Vec::new(),
            runs: Vec::new(),
        })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        terminal::size()
    }

    pub fn poll_event(timeout: Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<Event> {
        event::read()
    }

    pub fn draw(&mut self, frame: &mut Frame) -> Result<()> {
        let resized = !self.shown.as_ref().is_some_and(|s| s.fits(frame));
        if resized {
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::All))?;
            self.shown = Some(Shown::new(frame.width, frame.height));
        }

        let total = frame.width as usize * frame.height as usize;
        let dirty_is_large = total > 0 && frame.dirty_indices().len() >= total / 3;
        if resized || frame.is_dirty_all() || dirty_is_large {
            self.draw_full(frame)?;
        } else {
            self.draw_dirty(frame)?;
        }

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()?;
        frame.clear_dirty();
        Ok(())
    }

    fn draw_full(&mut self, frame: &Frame) -> Result<()> {
        let Some(shown) = self.shown.as_mut() else {
            return Ok(());
        };
        let mut pen = Pen::default();
        for y in 0..frame.height {
            self.stdout.queue(cursor::MoveTo(0, y))?;
            for x in 0..frame.width {
                let idx = y as usize * frame.width as usize + x as usize;
                let cell = frame.cell_at_index(idx);
                pen.apply(&mut self.stdout, &cell)?;
                self.stdout.queue(Print(cell.ch))?;
                shown.cells[idx] = cell;
            }
        }
        Ok(())
    }

    fn draw_dirty(&mut self, frame: &Frame) -> Result<()> {
        let Some(shown) = self.shown.as_mut() else {
            return Ok(());
        };
        let width = frame.width as usize;

        if self.rows.len() != frame.height as usize {
            self.rows = vec![Vec::new(); frame.height as usize];
        }
        self.touched_rows.clear();
        for &idx in frame.dirty_indices() {
            let y = idx / width;
            let Some(row) = self.rows.get_mut(y) else {
                continue;
            };
            if row.is_empty() {
                self.touched_rows.push(y as u16);
            }
            row.push(idx);
        }
        self.touched_rows.sort_unstable();

        let mut pen = Pen::default();
        let mut cursor_at: Option<(u16, u16)> = None;
        for &y in &self.touched_rows {
            let row = &mut self.rows[y as usize];
            row.sort_unstable();
            collect_runs(frame, &mut shown.cells, row, &mut self.runs);
            row.clear();

            for run in &self.runs {
                let x = (run.start % width) as u16;
                if cursor_at != Some((x, y)) {
                    self.stdout.queue(cursor::MoveTo(x, y))?;
                }
                let first = frame.cell_at_index(run.start);
                pen.apply(&mut self.stdout, &first)?;

                self.run_buf.clear();
                self.run_buf
                    .extend((run.start..run.start + run.len).map(|i| frame.cell_at_index(i).ch));
                self.stdout.queue(Print(self.run_buf.as_str()))?;

                let next_x = x.saturating_add(run.len as u16);
                cursor_at = (next_x < frame.width).then_some((next_x, y));
            }
        }
        Ok(())
    }
}

fn restore(out: &mut Stdout) {
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}

impl Drop for Terminal {
    fn drop(&mut self) {
        restore(&mut self.stdout);
    }
}

pub fn restore_terminal_best_effort() {
    restore(&mut stdout());
}

/// Esc, `q` and Ctrl-C always quit; in screensaver mode any key does.
fn is_quit_key(key: &KeyEvent, screensaver: bool) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    if screensaver {
        return true;
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Drives a `Canvas` on the real terminal at a fixed refresh rate.
pub struct TerminalHost {
    term: Terminal,
    frame: Frame,
    canvas: Canvas,
    palette: Palette,
    refresh: Duration,
    next_repaint: Instant,
    screensaver: bool,
    draws: u64,
}

impl TerminalHost {
    pub fn new(term: Terminal, palette: Palette, refresh_hz: f64, screensaver: bool) -> Result<Self> {
        let (w, h) = term.size()?;
        let refresh = Duration::from_secs_f64(1.0 / refresh_hz);
        Ok(Self {
            term,
            frame: Frame::new(w, h, palette.bg),
            canvas: Canvas::new(w, h),
            palette,
            refresh,
            next_repaint: Instant::now(),
            screensaver,
            draws: 0,
        })
    }

    pub fn size(&self) -> (u16, u16) {
        (self.frame.width, self.frame.height)
    }

    /// Frames that actually reached the terminal.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Blank canvas and a full redraw, for starting another run.
    pub fn reset(&mut self) {
        let (w, h) = self.size();
        self.canvas = Canvas::new(w, h);
        self.frame = Frame::new(w, h, self.palette.bg);
    }

    fn resize(&mut self, w: u16, h: u16) {
        debug!("terminal resized to {}x{}", w, h);
        self.canvas.resize(w, h);
        self.frame = Frame::new(w, h, self.palette.bg);
    }
}

impl FrameHost for TerminalHost {
    type Surface = Canvas;

    fn wait_repaint(&mut self) -> Result<HostSignal> {
        loop {
            let timeout = self.next_repaint.saturating_duration_since(Instant::now());
            if !Terminal::poll_event(timeout)? {
                break;
            }
            match Terminal::read_event()? {
                Event::Resize(w, h) => self.resize(w, h),
                Event::Key(key) if is_quit_key(&key, self.screensaver) => {
                    debug!("quit requested by {:?}", key.code);
                    return Ok(HostSignal::Quit);
                }
                _ => {}
            }
        }

        self.next_repaint += self.refresh;
        let now = Instant::now();
        if now > self.next_repaint {
            self.next_repaint = now;
        }
        Ok(HostSignal::Repaint)
    }

    fn surface(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    fn present(&mut self) -> Result<()> {
        self.canvas.render(&mut self.frame, &self.palette);
        if self.frame.is_dirty_all() || !self.frame.dirty_indices().is_empty() {
            trace!("drawing {} dirty cells", self.frame.dirty_indices().len());
            self.term.draw(&mut self.frame)?;
            self.draws += 1;
        }
        Ok(())
    }
}
