// Copyright (c) 2026 rezky_nightky

use std::fmt;

use log::debug;
use rand::{
    distr::{Distribution, Uniform},
    rngs::StdRng,
    seq::IndexedRandom,
};

use crate::canvas::{Glow, Paint, Surface};
use crate::charset::{CLASSIC_GLYPHS, HEX_GLYPHS};
use crate::error::{Error, Result};
use crate::palette::{theme, Rgb, Theme};
use crate::runtime::ColorScheme;
use crate::scheduler::{Animation, FrameRate};

/// Keeps freshly spawned drops off the glyph grid until their first reset.
const START_NUDGE: f32 = 0.1337;
/// Reset thresholds are drawn from `[height, height * RESET_SPREAD)`.
const RESET_SPREAD: f32 = 1.667;
const BRIGHT_ROLL: f32 = 0.97;
const RETIRE_ROLL: f32 = 0.90;
const FALL_VEIL: f32 = 0.05;
const DISAPPEAR_VEIL: f32 = 0.5;
const MAX_DISAPPEAR_SECONDS: f64 = 1.0;

pub const DEFAULT_HOLD_TICKS: u32 = 25;
pub const DEFAULT_GLITCH_CHANCE: f32 = 0.75;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Fall,
    Fade,
    Disappear,
    Cleared,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Fall => "fall",
            Phase::Fade => "fade",
            Phase::Disappear => "disappear",
            Phase::Cleared => "cleared",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphMetrics {
    pub size: f32,
    pub hspace: f32,
    pub vspace: f32,
}

impl GlyphMetrics {
    pub fn width(&self) -> f32 {
        self.size * self.hspace
    }

    pub fn height(&self) -> f32 {
        self.size * self.vspace
    }
}

/// Where every column and the message sit, fixed for one run.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
    pub glyph: GlyphMetrics,
    pub num_drops: usize,
    pub padding: f32,
    pub text_left: usize,
    /// Glyph row the message sits on; `text_top` is its baseline.
    pub text_row: i32,
    pub text_top: f32,
    message: Vec<char>,
}

impl Layout {
    pub fn new(width: f32, height: f32, glyph: GlyphMetrics, message: &str) -> Result<Self> {
        let (glyph_w, glyph_h) = (glyph.width(), glyph.height());
        if !(glyph_w > 0.0 && glyph_h > 0.0) || !(width >= glyph_w && height >= glyph_h) {
            return Err(Error::ViewportTooSmall { width, height });
        }

        let message: Vec<char> = message.chars().collect();
        let mut num_drops = (width / glyph_w).floor() as usize;
        // Matching parity lets the message sit exactly in the middle.
        if (num_drops + message.len()) % 2 == 1 {
            num_drops -= 1;
        }
        if message.len() > num_drops {
            return Err(Error::MessageTooWide {
                message_len: message.len(),
                columns: num_drops,
            });
        }
        if num_drops == 0 {
            return Err(Error::ViewportTooSmall { width, height });
        }

        let unused = width - num_drops as f32 * glyph_w + glyph.size * (glyph.hspace - 1.0);
        let text_left = num_drops / 2 - message.len() / 2;
        let text_row = (height / glyph_h / 2.0).floor() as i32;

        Ok(Self {
            width,
            height,
            glyph,
            num_drops,
            padding: unused / 2.0,
            text_left,
            text_row,
            text_top: row_baseline(text_row, glyph_h),
            message,
        })
    }

    pub fn text_right(&self) -> usize {
        self.text_left + self.message.len()
    }

    pub fn column_x(&self, i: usize) -> f32 {
        self.padding + i as f32 * self.glyph.width()
    }

    pub fn message_char(&self, i: usize) -> Option<char> {
        i.checked_sub(self.text_left)
            .and_then(|j| self.message.get(j))
            .copied()
    }

    pub fn is_resolving(&self, i: usize) -> bool {
        self.message_char(i).is_some_and(|c| c != ' ')
    }
}

fn row_baseline(row: i32, glyph_h: f32) -> f32 {
    row as f32 * glyph_h
}

/// One glyph stream. Position is kept as a whole glyph row so a column lands
/// on the message row exactly, however many steps it took to get there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Column {
    pub offset: f32,
    row: i32,
    on_grid: bool,
    pub resolving: bool,
    pub settled: bool,
    pub glyph: Option<char>,
}

impl Column {
    fn move_to(&mut self, row: i32, glyph_h: f32) {
        self.row = row;
        self.on_grid = true;
        self.offset = row_baseline(row, glyph_h);
    }
}

#[derive(Clone, Debug)]
pub struct FieldOptions {
    pub alphabet: Vec<char>,
    pub theme: Theme,
    pub hold_ticks: u32,
    pub glitch_chance: f32,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            alphabet: CLASSIC_GLYPHS.chars().collect(),
            theme: theme(ColorScheme::Green),
            hold_ticks: DEFAULT_HOLD_TICKS,
            glitch_chance: DEFAULT_GLITCH_CHANCE,
        }
    }
}

/// Column state for one run plus the per-phase update rules.
pub struct RainField {
    layout: Layout,
    columns: Vec<Column>,
    phase: Phase,

    alphabet: Vec<char>,
    hex: Vec<char>,
    theme: Theme,
    hold_ticks: u32,
    glitch_chance: f32,
    max_tries: Option<f64>,

    resolving: usize,
    settled: usize,
    should_stop: bool,
    held: u32,
    tries: u32,
    gone: usize,
    cleared: bool,

    rng: StdRng,
    chance: Uniform<f32>,
}

impl RainField {
    pub fn new(layout: Layout, options: FieldOptions, rng: StdRng) -> Self {
        let mut field = Self {
            layout,
            columns: Vec::new(),
            phase: Phase::Fall,
            alphabet: options.alphabet,
            hex: HEX_GLYPHS.chars().collect(),
            theme: options.theme,
            hold_ticks: options.hold_ticks,
            glitch_chance: options.glitch_chance.clamp(0.0, 1.0),
            max_tries: None,
            resolving: 0,
            settled: 0,
            should_stop: false,
            held: 0,
            tries: 0,
            gone: 0,
            cleared: false,
            rng,
            chance: Uniform::new(0.0, 1.0).expect("valid range"),
        };
        if field.alphabet.is_empty() {
            field.alphabet = CLASSIC_GLYPHS.chars().collect();
        }
        field.enter(Phase::Fall);
        field
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[cfg(test)]
    pub fn resolving_count(&self) -> usize {
        self.resolving
    }

    #[cfg(test)]
    pub fn settled_count(&self) -> usize {
        self.settled
    }

    #[cfg(test)]
    pub fn should_stop(&self) -> bool {
        self.should_stop
    }

    /// Bounds the disappear phase to about a second of ticks at `rate`.
    pub fn set_disappear_budget(&mut self, rate: FrameRate) {
        self.max_tries = rate.fps().map(|fps| MAX_DISAPPEAR_SECONDS * fps);
    }

    /// Switches phase and resets whatever that phase counts.
    pub fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        match phase {
            Phase::Fall => self.spawn_columns(),
            Phase::Fade => self.held = 0,
            Phase::Disappear => {
                self.tries = 0;
                self.gone = 0;
                for col in &mut self.columns {
                    col.settled = !col.resolving;
                    col.glyph = None;
                }
            }
            Phase::Cleared => self.cleared = false,
        }
        debug!(
            "{} phase: {} columns, {} resolving",
            phase,
            self.columns.len(),
            self.resolving
        );
    }

    fn roll(&mut self) -> f32 {
        self.chance.sample(&mut self.rng)
    }

    /// Integer-valued draw from `[min, max)`.
    fn rand_int(&mut self, min: f32, max: f32) -> f32 {
        min + (self.roll() * (max - min)).floor()
    }

    fn pick(&mut self, from_hex: bool) -> char {
        let pool = if from_hex { &self.hex } else { &self.alphabet };
        pool.choose(&mut self.rng).copied().unwrap_or('0')
    }

    fn spawn_columns(&mut self) {
        let glyph_h = self.layout.glyph.height();
        let rows = self.layout.height / glyph_h;

        self.columns.clear();
        self.resolving = 0;
        for i in 0..self.layout.num_drops {
            let row = -(self.rand_int(0.0, rows) as i32);
            let resolving = self.layout.is_resolving(i);
            if resolving {
                self.resolving += 1;
            }
            self.columns.push(Column {
                offset: row_baseline(row, glyph_h) + START_NUDGE,
                row,
                on_grid: false,
                resolving,
                settled: false,
                glyph: None,
            });
        }

        self.settled = 0;
        // Nothing would ever settle to raise the flag, so start with it up.
        self.should_stop = self.resolving == 0;
    }

    fn draw_background(&self, surface: &mut dyn Surface, paint: Paint) {
        surface.set_fill(paint);
        let (w, h) = (surface.width(), surface.height());
        surface.fill_rect(0.0, 0.0, w, h);
    }

    fn fall(&mut self, surface: &mut dyn Surface) {
        self.draw_background(surface, Paint::veil(FALL_VEIL));

        let glyph_h = self.layout.glyph.height();
        let height = self.layout.height;

        for i in 0..self.columns.len() {
            let col = self.columns[i];
            let x = self.layout.column_x(i);

            if col.resolving && col.on_grid && col.row == self.layout.text_row {
                let ch = self.layout.message_char(i).unwrap_or(' ');
                if !col.settled {
                    self.columns[i].settled = true;
                    self.settled += 1;
                    if !self.should_stop && self.settled * 2 > self.resolving {
                        debug!("{} of {} letters formed, rain stops", self.settled, self.resolving);
                        self.should_stop = true;
                    }

                    surface.set_glow(Some(Glow {
                        color: self.theme.glow,
                        blur: self.layout.glyph.size * 2.0,
                    }));
                    surface.set_fill(Paint::solid(self.theme.glow));
                    surface.fill_text(ch, x, col.offset);
                    surface.set_glow(None);
                } else {
                    surface.set_fill(Paint::solid(self.theme.bright_a));
                    surface.fill_text(ch, x, col.offset);
                }
            } else if !col.settled {
                let ch = self.pick(false);
                let ink = if self.roll() > BRIGHT_ROLL {
                    self.theme.bright_b
                } else {
                    self.theme.normal
                };
                surface.set_fill(Paint::solid(ink));
                surface.fill_text(ch, x, col.offset);

                let threshold = self.rand_int(height, height * RESET_SPREAD);
                let col = &mut self.columns[i];
                if col.offset > threshold {
                    if self.should_stop && !col.resolving {
                        col.settled = true;
                        self.settled += 1;
                    } else {
                        col.move_to(0, glyph_h);
                    }
                } else {
                    col.move_to(col.row + 1, glyph_h);
                }
            }
        }
    }

    fn draw_message(&self, surface: &mut dyn Surface) {
        surface.set_fill(Paint::solid(self.theme.normal));
        for (i, col) in self.columns.iter().enumerate() {
            if !col.resolving {
                continue;
            }
            if let Some(ch) = self.layout.message_char(i) {
                surface.fill_text(ch, self.layout.column_x(i), col.offset);
            }
        }
    }

    fn fade(&mut self, surface: &mut dyn Surface) {
        self.draw_background(surface, Paint::veil(FALL_VEIL));
        self.draw_message(surface);
        self.held += 1;
    }

    fn disappear(&mut self, surface: &mut dyn Surface) {
        self.tries += 1;
        self.draw_background(surface, Paint::veil(DISAPPEAR_VEIL));
        surface.set_fill(Paint::solid(self.theme.normal));

        let out_of_tries = self
            .max_tries
            .is_some_and(|max| self.tries as f64 > max);

        for i in 0..self.columns.len() {
            let col = self.columns[i];
            if !col.resolving || col.settled {
                continue;
            }

            let mut ch = match col.glyph {
                Some(ch) => ch,
                None => self.layout.message_char(i).unwrap_or(' '),
            };
            if self.roll() < self.glitch_chance {
                ch = self.pick(true);
            }
            surface.fill_text(ch, self.layout.column_x(i), col.offset);

            let retire = self.roll() > RETIRE_ROLL || out_of_tries;
            let col = &mut self.columns[i];
            col.glyph = Some(ch);
            if retire {
                col.settled = true;
                self.gone += 1;
            }
        }
    }

    fn clear(&mut self, surface: &mut dyn Surface) {
        self.draw_background(surface, Paint::solid(Rgb::BLACK));
        self.cleared = true;
    }
}

impl Animation for RainField {
    fn step(&mut self, surface: &mut dyn Surface) {
        match self.phase {
            Phase::Fall => self.fall(surface),
            Phase::Fade => self.fade(surface),
            Phase::Disappear => self.disappear(surface),
            Phase::Cleared => self.clear(surface),
        }
    }

    fn is_done(&self) -> bool {
        match self.phase {
            Phase::Fall => self.settled == self.columns.len(),
            Phase::Fade => self.held >= self.hold_ticks,
            Phase::Disappear => self.gone == self.resolving,
            Phase::Cleared => self.cleared,
        }
    }
}
