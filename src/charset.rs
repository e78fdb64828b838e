// Copyright (c) 2026 rezky_nightky

/// Digits followed by the half-width katakana of the classic rain.
pub const CLASSIC_GLYPHS: &str =
    "0123456789ｱｲｳｴｵｶｷｸｹｺｻｼｽｾｿﾀﾁﾂﾃﾄﾅﾆﾇﾈﾉﾊﾋﾌﾍﾎﾏﾐﾑﾒﾓﾔﾕﾖﾗﾘﾙﾚﾛﾜｦﾝ";

/// Glitch glyphs used while the message disappears.
pub const HEX_GLYPHS: &str = "0123456789ABCDEF";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Charset(u32);

impl Charset {
    pub const CLASSIC: Charset = Charset(0x1);
    pub const ENGLISH_LETTERS: Charset = Charset(0x2);
    pub const ENGLISH_DIGITS: Charset = Charset(0x4);
    pub const KATAKANA: Charset = Charset(0x8);
    pub const BINARY: Charset = Charset(0x10);
    pub const HEX: Charset = Charset(0x20);
    pub const GREEK: Charset = Charset(0x40);
    pub const CYRILLIC: Charset = Charset(0x80);
    pub const BRAILLE: Charset = Charset(0x100);
    pub const RUNIC: Charset = Charset(0x200);
    pub const BLOCKS: Charset = Charset(0x400);

    pub const ASCII_SAFE: Charset = Charset(0x6);

    pub fn contains(self, other: Charset) -> bool {
        (self.0 & other.0) != 0
    }
}

pub fn charset_from_str(spec: &str, default_to_ascii: bool) -> Result<Charset, String> {
    let spec = spec.trim().to_ascii_lowercase();
    match spec.as_str() {
        "auto" => Ok(if default_to_ascii {
            Charset::ASCII_SAFE
        } else {
            Charset::CLASSIC
        }),
        "classic" | "matrix" => Ok(Charset::CLASSIC),
        "ascii" => Ok(Charset::ASCII_SAFE),
        "english" => Ok(Charset::ENGLISH_LETTERS),
        "digits" | "dec" | "decimal" => Ok(Charset::ENGLISH_DIGITS),
        "katakana" => Ok(Charset::KATAKANA),
        "bin" | "binary" | "01" => Ok(Charset::BINARY),
        "hex" | "hexadecimal" => Ok(Charset::HEX),
        "greek" => Ok(Charset::GREEK),
        "cyrillic" => Ok(Charset::CYRILLIC),
        "braille" => Ok(Charset::BRAILLE),
        "runic" => Ok(Charset::RUNIC),
        "blocks" => Ok(Charset::BLOCKS),
        _ => Err(format!(
            "unsupported charset: {} (see --list-charsets)",
            spec
        )),
    }
}

fn push_range(out: &mut Vec<char>, start: u32, end: u32) {
    out.extend((start..=end).filter_map(char::from_u32));
}

/// Expands a charset into its glyphs. `custom` replaces the preset entirely.
pub fn build_glyphs(charset: Charset, custom: Option<&str>) -> Vec<char> {
    if let Some(custom) = custom {
        let out: Vec<char> = custom.chars().filter(|c| !c.is_whitespace()).collect();
        if !out.is_empty() {
            return out;
        }
    }

    let mut out: Vec<char> = Vec::new();

    if charset.contains(Charset::CLASSIC) {
        out.extend(CLASSIC_GLYPHS.chars());
    }
    if charset.contains(Charset::ENGLISH_LETTERS) {
        push_range(&mut out, 0x41, 0x5A);
        push_range(&mut out, 0x61, 0x7A);
    }
    if charset.contains(Charset::ENGLISH_DIGITS) {
        push_range(&mut out, 0x30, 0x39);
    }
    if charset.contains(Charset::KATAKANA) {
        push_range(&mut out, 0xFF66, 0xFF9D);
    }
    if charset.contains(Charset::BINARY) {
        push_range(&mut out, 0x30, 0x31);
    }
    if charset.contains(Charset::HEX) {
        out.extend(HEX_GLYPHS.chars());
    }
    if charset.contains(Charset::GREEK) {
        push_range(&mut out, 0x0391, 0x03A9);
        push_range(&mut out, 0x03B1, 0x03C9);
    }
    if charset.contains(Charset::CYRILLIC) {
        push_range(&mut out, 0x0410, 0x044F);
    }
    if charset.contains(Charset::BRAILLE) {
        push_range(&mut out, 0x2800, 0x28FF);
    }
    if charset.contains(Charset::RUNIC) {
        push_range(&mut out, 0x16A0, 0x16EA);
    }
    if charset.contains(Charset::BLOCKS) {
        push_range(&mut out, 0x2580, 0x259F);
    }

    if out.is_empty() {
        out.extend(CLASSIC_GLYPHS.chars());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_alphabet_is_digits_then_katakana() {
        let out = build_glyphs(Charset::CLASSIC, None);
        assert_eq!(&out[..10], &['0', '1', '2', '3', '4', '5', '6', '7', '8', '9']);
        assert_eq!(out.len(), 56);
        assert!(out.contains(&'ﾝ'));
    }

    #[test]
    fn charset_auto_selects_ascii_safe_when_non_utf() {
        assert_eq!(charset_from_str("auto", true).unwrap(), Charset::ASCII_SAFE);
        assert_eq!(charset_from_str("auto", false).unwrap(), Charset::CLASSIC);
    }

    #[test]
    fn custom_glyphs_override_the_preset() {
        let out = build_glyphs(Charset::CLASSIC, Some("01 01"));
        assert_eq!(out, vec!['0', '1', '0', '1']);
    }

    #[test]
    fn blank_custom_glyphs_fall_back_to_the_preset() {
        let out = build_glyphs(Charset::BINARY, Some("   "));
        assert_eq!(out, vec!['0', '1']);
    }

    #[test]
    fn unknown_charset_is_rejected() {
        assert!(charset_from_str("klingon", false).is_err());
    }
}
