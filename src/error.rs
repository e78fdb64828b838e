// Copyright (c) 2026 rezky_nightky

use crate::rain::Phase;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("message is {message_len} glyphs wide but only {columns} columns fit the screen")]
    MessageTooWide { message_len: usize, columns: usize },

    #[error("viewport {width}x{height} is too small to hold a single glyph column")]
    ViewportTooSmall { width: f32, height: f32 },

    #[error("{phase} phase did not finish within {limit_ms} ms")]
    Timeout { phase: Phase, limit_ms: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
