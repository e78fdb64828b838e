// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::runtime::{ColorMode, ColorScheme};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channel-wise blend toward `other`; `t = 1.0` yields `other`.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        Rgb::new(
            lerp_u8(self.r, other.r, t),
            lerp_u8(self.g, other.g, t),
            lerp_u8(self.b, other.b, t),
        )
    }

    pub fn max_channel_diff(self, other: Rgb) -> u8 {
        self.r
            .abs_diff(other.r)
            .max(self.g.abs_diff(other.g))
            .max(self.b.abs_diff(other.b))
    }
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let a = a as f32;
    let b = b as f32;
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}

/// The handful of inks a run paints with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme {
    pub normal: Rgb,
    pub bright_a: Rgb,
    pub bright_b: Rgb,
    pub glow: Rgb,
}

pub fn theme(scheme: ColorScheme) -> Theme {
    let (normal, bright_a, bright_b) = match scheme {
        ColorScheme::Green => (
            Rgb::new(0x5C, 0xFF, 0x5C),
            Rgb::new(0x88, 0xFF, 0x88),
            Rgb::new(0xAA, 0xFF, 0xAA),
        ),
        ColorScheme::Gold => (
            Rgb::new(255, 200, 60),
            Rgb::new(255, 220, 130),
            Rgb::new(255, 235, 170),
        ),
        ColorScheme::Cyan => (
            Rgb::new(80, 230, 255),
            Rgb::new(140, 240, 255),
            Rgb::new(180, 245, 255),
        ),
        ColorScheme::Red => (
            Rgb::new(255, 70, 70),
            Rgb::new(255, 130, 130),
            Rgb::new(255, 170, 170),
        ),
        ColorScheme::Purple => (
            Rgb::new(190, 110, 255),
            Rgb::new(210, 160, 255),
            Rgb::new(225, 190, 255),
        ),
        ColorScheme::Gray => (
            Rgb::new(180, 180, 180),
            Rgb::new(215, 215, 215),
            Rgb::new(235, 235, 235),
        ),
    };
    Theme {
        normal,
        bright_a,
        bright_b,
        glow: Rgb::WHITE,
    }
}

/// Maps surface colours onto what the terminal can show.
#[derive(Clone, Copy, Debug)]
pub struct Palette {
    pub mode: ColorMode,
    pub bg: Option<Color>,
}

impl Palette {
    pub fn new(mode: ColorMode, default_background: bool) -> Self {
        let bg = if default_background {
            None
        } else {
            Some(match mode {
                ColorMode::Color16 => Color::Black,
                ColorMode::TrueColor => Color::Rgb { r: 0, g: 0, b: 0 },
                ColorMode::Color256 | ColorMode::Mono => Color::AnsiValue(16),
            })
        };
        Self { mode, bg }
    }

    pub fn fg(&self, c: Rgb) -> Option<Color> {
        match self.mode {
            ColorMode::Mono => None,
            ColorMode::TrueColor => Some(Color::Rgb {
                r: c.r,
                g: c.g,
                b: c.b,
            }),
            ColorMode::Color256 => Some(Color::AnsiValue(rgb_to_ansi256(c))),
            ColorMode::Color16 => Some(rgb_to_color16(c)),
        }
    }
}

fn dist2(a: Rgb, b: Rgb) -> i32 {
    let dr = (a.r as i32) - (b.r as i32);
    let dg = (a.g as i32) - (b.g as i32);
    let db = (a.b as i32) - (b.b as i32);
    (dr * dr) + (dg * dg) + (db * db)
}

fn rgb_to_ansi256(c: Rgb) -> u8 {
    const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    let to6 = |v: u8| ((v as u16 * 5 + 127) / 255) as u8;
    let (r6, g6, b6) = (to6(c.r), to6(c.g), to6(c.b));
    let cube = Rgb::new(
        CUBE_LEVELS[r6 as usize],
        CUBE_LEVELS[g6 as usize],
        CUBE_LEVELS[b6 as usize],
    );
    let cube_idx = 16 + 36 * r6 + 6 * g6 + b6;

    let avg = ((c.r as u16 + c.g as u16 + c.b as u16) / 3) as u8;
    let (gray_idx, gray) = match avg {
        0..=7 => (16, Rgb::BLACK),
        239..=255 => (231, Rgb::WHITE),
        _ => {
            let step = (avg - 8) / 10;
            let v = 8 + 10 * step;
            (232 + step, Rgb::new(v, v, v))
        }
    };

    if dist2(c, gray) < dist2(c, cube) {
        gray_idx
    } else {
        cube_idx
    }
}

fn rgb_to_color16(c: Rgb) -> Color {
    const TABLE: [(Color, Rgb); 16] = [
        (Color::Black, Rgb::new(0, 0, 0)),
        (Color::DarkGrey, Rgb::new(128, 128, 128)),
        (Color::Grey, Rgb::new(192, 192, 192)),
        (Color::White, Rgb::new(255, 255, 255)),
        (Color::DarkRed, Rgb::new(128, 0, 0)),
        (Color::Red, Rgb::new(255, 0, 0)),
        (Color::DarkGreen, Rgb::new(0, 128, 0)),
        (Color::Green, Rgb::new(0, 255, 0)),
        (Color::DarkBlue, Rgb::new(0, 0, 128)),
        (Color::Blue, Rgb::new(0, 0, 255)),
        (Color::DarkCyan, Rgb::new(0, 128, 128)),
        (Color::Cyan, Rgb::new(0, 255, 255)),
        (Color::DarkMagenta, Rgb::new(128, 0, 128)),
        (Color::Magenta, Rgb::new(255, 0, 255)),
        (Color::DarkYellow, Rgb::new(128, 128, 0)),
        (Color::Yellow, Rgb::new(255, 255, 0)),
    ];

    TABLE
        .iter()
        .min_by_key(|(_, rgb)| dist2(c, *rgb))
        .map(|(color, _)| *color)
        .unwrap_or(Color::White)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_reaches_target_at_one() {
        let a = Rgb::new(0x5C, 0xFF, 0x5C);
        assert_eq!(a.lerp(Rgb::BLACK, 1.0), Rgb::BLACK);
        assert_eq!(a.lerp(Rgb::BLACK, 0.0), a);
    }

    #[test]
    fn ansi256_maps_pure_colours_onto_the_cube() {
        assert_eq!(rgb_to_ansi256(Rgb::new(0, 255, 0)), 46);
        assert_eq!(rgb_to_ansi256(Rgb::BLACK), 16);
        assert_eq!(rgb_to_ansi256(Rgb::WHITE), 231);
    }

    #[test]
    fn color16_picks_nearest_entry() {
        assert_eq!(rgb_to_color16(Rgb::new(0x5C, 0xFF, 0x5C)), Color::Green);
    }

    #[test]
    fn mono_mode_leaves_foreground_to_the_terminal() {
        let p = Palette::new(ColorMode::Mono, false);
        assert_eq!(p.fg(Rgb::WHITE), None);
    }
}
