// Copyright (c) 2026 rezky_nightky

use crate::frame::{Cell, Frame};
use crate::palette::{Palette, Rgb};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paint {
    pub color: Rgb,
    pub alpha: f32,
}

impl Paint {
    pub const fn solid(color: Rgb) -> Self {
        Self { color, alpha: 1.0 }
    }

    /// Translucent black, used to dim whatever is already on the surface.
    pub const fn veil(alpha: f32) -> Self {
        Self {
            color: Rgb::BLACK,
            alpha,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glow {
    pub color: Rgb,
    pub blur: f32,
}

/// A 2D drawing context. Coordinates are surface units; text is placed with
/// its baseline at `y`, so a glyph at `y` covers `(y - 1, y]` in cell rows.
pub trait Surface {
    fn width(&self) -> f32;
    fn height(&self) -> f32;
    fn set_fill(&mut self, paint: Paint);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32);
    fn fill_text(&mut self, ch: char, x: f32, y: f32);
    fn set_glow(&mut self, glow: Option<Glow>);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Ink {
    ch: char,
    color: Rgb,
    bold: bool,
}

/// Ink this close to the fill colour is gone. Rounding stalls a 5% veil at
/// channel value 10, so the floor must sit above that.
const FADE_FLOOR: u8 = 12;

/// Terminal raster: one cell per surface unit.
pub struct Canvas {
    cols: u16,
    rows: u16,
    ink: Vec<Option<Ink>>,
    fill: Paint,
    glow: Option<Glow>,
}

impl Canvas {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            ink: vec![None; cols as usize * rows as usize],
            fill: Paint::solid(Rgb::BLACK),
            glow: None,
        }
    }

    /// Keeps whatever ink still fits the new size.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        let mut ink = vec![None; cols as usize * rows as usize];
        for y in 0..rows.min(self.rows) {
            for x in 0..cols.min(self.cols) {
                ink[y as usize * cols as usize + x as usize] =
                    self.ink[y as usize * self.cols as usize + x as usize];
            }
        }
        self.cols = cols;
        self.rows = rows;
        self.ink = ink;
    }

    #[cfg(test)]
    pub fn glyph_at(&self, col: u16, row: u16) -> Option<char> {
        self.cell(col as i64, row as i64)
            .and_then(|i| self.ink[i])
            .map(|ink| ink.ch)
    }

    #[cfg(test)]
    fn ink_at(&self, col: u16, row: u16) -> Option<Ink> {
        self.cell(col as i64, row as i64).and_then(|i| self.ink[i])
    }

    /// Text of one row, blanks as spaces.
    #[cfg(test)]
    pub fn row_text(&self, row: u16) -> String {
        (0..self.cols)
            .map(|col| self.glyph_at(col, row).unwrap_or(' '))
            .collect()
    }

    pub fn render(&self, frame: &mut Frame, palette: &Palette) {
        for row in 0..self.rows.min(frame.height) {
            for col in 0..self.cols.min(frame.width) {
                let cell = match self.ink[row as usize * self.cols as usize + col as usize] {
                    Some(ink) => Cell {
                        ch: ink.ch,
                        fg: palette.fg(ink.color),
                        bg: palette.bg,
                        bold: ink.bold,
                    },
                    None => Cell::blank_with_bg(palette.bg),
                };
                frame.set(col, row, cell);
            }
        }
    }

    fn cell(&self, col: i64, row: i64) -> Option<usize> {
        if col < 0 || row < 0 || col >= self.cols as i64 || row >= self.rows as i64 {
            return None;
        }
        Some(row as usize * self.cols as usize + col as usize)
    }
}

impl Surface for Canvas {
    fn width(&self) -> f32 {
        self.cols as f32
    }

    fn height(&self) -> f32 {
        self.rows as f32
    }

    fn set_fill(&mut self, paint: Paint) {
        self.fill = paint;
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let col0 = x.floor().max(0.0) as i64;
        let row0 = y.floor().max(0.0) as i64;
        let col1 = (x + w).ceil().min(self.cols as f32) as i64;
        let row1 = (y + h).ceil().min(self.rows as f32) as i64;
        let paint = self.fill;

        for row in row0..row1 {
            for col in col0..col1 {
                let Some(i) = self.cell(col, row) else {
                    continue;
                };
                let Some(mut ink) = self.ink[i] else {
                    continue;
                };
                ink.color = ink.color.lerp(paint.color, paint.alpha);
                ink.bold = false;
                self.ink[i] = if ink.color.max_channel_diff(paint.color) <= FADE_FLOOR {
                    None
                } else {
                    Some(ink)
                };
            }
        }
    }

    fn fill_text(&mut self, ch: char, x: f32, y: f32) {
        let col = x.floor() as i64;
        let row = y.ceil() as i64 - 1;
        let Some(i) = self.cell(col, row) else {
            return;
        };
        let ink = match self.glow {
            Some(glow) => Ink {
                ch,
                color: glow.color,
                bold: glow.blur > 0.0,
            },
            None => Ink {
                ch,
                color: Rgb::BLACK.lerp(self.fill.color, self.fill.alpha),
                bold: false,
            },
        };
        self.ink[i] = Some(ink);
    }

    fn set_glow(&mut self, glow: Option<Glow>) {
        self.glow = glow;
    }
}

#[cfg(test)]
pub mod testing {
    use super::{Glow, Paint, Surface};

    #[derive(Clone, Debug, PartialEq)]
    pub enum Op {
        Rect(Paint),
        Text {
            ch: char,
            x: f32,
            y: f32,
            paint: Paint,
            glow: bool,
        },
    }

    /// Surface that only remembers what was asked of it.
    pub struct Recorder {
        pub width: f32,
        pub height: f32,
        pub ops: Vec<Op>,
        fill: Paint,
        glow: Option<Glow>,
    }

    impl Recorder {
        pub fn new(width: f32, height: f32) -> Self {
            Self {
                width,
                height,
                ops: Vec::new(),
                fill: Paint::veil(1.0),
                glow: None,
            }
        }

        pub fn texts(&self) -> impl Iterator<Item = &Op> {
            self.ops.iter().filter(|op| matches!(op, Op::Text { .. }))
        }
    }

    impl Surface for Recorder {
        fn width(&self) -> f32 {
            self.width
        }

        fn height(&self) -> f32 {
            self.height
        }

        fn set_fill(&mut self, paint: Paint) {
            self.fill = paint;
        }

        fn fill_rect(&mut self, _x: f32, _y: f32, _w: f32, _h: f32) {
            self.ops.push(Op::Rect(self.fill));
        }

        fn fill_text(&mut self, ch: char, x: f32, y: f32) {
            self.ops.push(Op::Text {
                ch,
                x,
                y,
                paint: self.fill,
                glow: self.glow.is_some(),
            });
        }

        fn set_glow(&mut self, glow: Option<Glow>) {
            self.glow = glow;
        }
    }
}
