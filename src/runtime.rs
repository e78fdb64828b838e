// Copyright (c) 2025 rezk_nightky

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    Color16,
    Color256,
    TrueColor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorScheme {
    Green,
    Gold,
    Cyan,
    Red,
    Purple,
    Gray,
}

/// How much of the sequence plays after the message has formed.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Finale {
    /// Hold the message, glitch it into hex and let it disappear.
    #[value(name = "full")]
    Full,
    /// Hold the message, then clear.
    #[value(name = "fade")]
    Fade,
    /// Clear as soon as the message has formed.
    #[value(name = "cut")]
    Cut,
}

/// Screen class used to pick defaults, mirroring phone vs desktop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceClass {
    Compact,
    Wide,
}

impl DeviceClass {
    pub const COMPACT_MAX_COLS: u16 = 79;

    pub fn detect(cols: u16) -> Self {
        if cols <= Self::COMPACT_MAX_COLS {
            DeviceClass::Compact
        } else {
            DeviceClass::Wide
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            DeviceClass::Compact => "WELCOME",
            DeviceClass::Wide => "WELCOME, VISITOR",
        }
    }

    pub fn default_fps(self) -> f64 {
        match self {
            DeviceClass::Compact => 30.0,
            DeviceClass::Wide => 35.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_terminals_are_compact() {
        assert_eq!(DeviceClass::detect(60), DeviceClass::Compact);
        assert_eq!(DeviceClass::detect(79), DeviceClass::Compact);
        assert_eq!(DeviceClass::detect(80), DeviceClass::Wide);
    }

    #[test]
    fn defaults_follow_device_class() {
        assert_eq!(DeviceClass::Compact.default_message(), "WELCOME");
        assert_eq!(DeviceClass::Wide.default_fps(), 35.0);
    }
}
