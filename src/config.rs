// Copyright (c) 2026 rezky_nightky

use std::io::IsTerminal;

use clap::Parser;

use crate::rain::{DEFAULT_GLITCH_CHANCE, DEFAULT_HOLD_TICKS};
use crate::runtime::Finale;

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  glyphfall --finale full --refresh 120 --hold 25 --glitchpct 75 --hspace 1 --vspace 1 --color green --charset auto --color-bg black";

pub const DEFAULT_REFRESH_HZ: f64 = 120.0;

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn colorize_help_detail(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    for chunk in text.split_inclusive('\n') {
        let (line, nl) = chunk
            .strip_suffix('\n')
            .map(|l| (l, "\n"))
            .unwrap_or((chunk, ""));

        let is_heading =
            !line.starts_with(' ') && line.ends_with(':') && line == line.to_ascii_uppercase();

        let styled = if is_heading {
            format!("\x1b[1;36m{}\x1b[0m", line)
        } else if let Some(rest) = line.strip_prefix("      Example:") {
            format!("      \x1b[32mExample:\x1b[0m{}", rest)
        } else if let Some(rest) = line.strip_prefix("  glyphfall") {
            format!("  \x1b[1;34mglyphfall\x1b[0m{}", rest)
        } else if let Some(rest) = line.strip_prefix("  -") {
            format!("  \x1b[33m-{}\x1b[0m", rest)
        } else {
            line.to_string()
        };
        out.push_str(&styled);
        out.push_str(nl);
    }
    out
}

pub fn default_params_usage_for_help() -> String {
    if color_enabled_stdout() {
        colorize_help_detail(DEFAULT_PARAMS_USAGE)
    } else {
        DEFAULT_PARAMS_USAGE.to_string()
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorBg {
    #[value(name = "black")]
    Black,
    #[value(name = "default-background")]
    DefaultBackground,
    #[value(name = "transparent")]
    Transparent,
}

impl ColorBg {
    pub fn uses_terminal_background(self) -> bool {
        matches!(self, ColorBg::DefaultBackground | ColorBg::Transparent)
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "glyphfall", version, disable_version_flag = true)]
pub struct Args {
    #[arg(
        short = 'm',
        long = "message",
        help_heading = "GENERAL",
        help = "Message the rain resolves into (default: WELCOME, VISITOR; WELCOME under 80 columns)"
    )]
    pub message: Option<String>,

    #[arg(
        long = "finale",
        default_value_t = Finale::Full,
        value_enum,
        help_heading = "GENERAL",
        help = "What follows the formed message (full, fade, cut)"
    )]
    pub finale: Finale,

    #[arg(
        long = "loop",
        help_heading = "GENERAL",
        help = "Replay the sequence until a quit key is pressed"
    )]
    pub repeat: bool,

    #[arg(
        short = 's',
        long = "screensaver",
        help_heading = "GENERAL",
        help = "Screensaver mode (exit on keypress)"
    )]
    pub screensaver: bool,

    #[arg(
        long = "seed",
        help_heading = "GENERAL",
        help = "Seed the random generator for a repeatable run"
    )]
    pub seed: Option<u64>,

    #[arg(
        short = 'c',
        long = "color",
        default_value = "green",
        help_heading = "APPEARANCE",
        help = "Color theme (see --list-colors)"
    )]
    pub color: String,

    #[arg(
        long = "color-bg",
        default_value_t = ColorBg::Black,
        value_enum,
        help_heading = "APPEARANCE",
        help = "Background mode (black, default-background, transparent)"
    )]
    pub color_bg: ColorBg,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,16,8/256,24/32). Default: 24-bit if supported (COLORTERM), else 8-bit (TERM=...256color), else 16-color"
    )]
    pub colormode: Option<u16>,

    #[arg(
        long = "hspace",
        default_value_t = 1.0,
        help_heading = "APPEARANCE",
        help = "Horizontal glyph spacing in cells (min 1 max 4)"
    )]
    pub hspace: f32,

    #[arg(
        long = "vspace",
        default_value_t = 1.0,
        help_heading = "APPEARANCE",
        help = "Vertical glyph spacing in cells (min 1 max 4)"
    )]
    pub vspace: f32,

    #[arg(
        short = 'f',
        long = "fps",
        help_heading = "PERFORMANCE",
        help = "Target FPS (min 1 max 240; default 35, or 30 under 80 columns)"
    )]
    pub fps: Option<f64>,

    #[arg(
        long = "uncapped",
        help_heading = "PERFORMANCE",
        help = "Step on every repaint instead of capping the frame rate"
    )]
    pub uncapped: bool,

    #[arg(
        long = "refresh",
        default_value_t = DEFAULT_REFRESH_HZ,
        help_heading = "PERFORMANCE",
        help = "Terminal repaint rate in Hz (min 10 max 480)"
    )]
    pub refresh: f64,

    #[arg(
        long = "timeout",
        help_heading = "PERFORMANCE",
        help = "Abort if a single phase runs longer than N seconds (min 0.1 max 86400)"
    )]
    pub timeout: Option<f64>,

    #[arg(
        long = "perf-stats",
        help_heading = "PERFORMANCE",
        help = "Print per-phase timing summary on exit"
    )]
    pub perf_stats: bool,

    #[arg(
        long = "hold",
        default_value_t = DEFAULT_HOLD_TICKS,
        help_heading = "FINALE",
        help = "Ticks the formed message is held (min 1 max 1000)"
    )]
    pub hold: u32,

    #[arg(
        short = 'G',
        long = "glitchpct",
        default_value_t = DEFAULT_GLITCH_CHANCE * 100.0,
        help_heading = "FINALE",
        help = "Chance per tick a disappearing letter turns to hex, in percent (min 0 max 100)"
    )]
    pub glitch_pct: f32,

    #[arg(
        long = "charset",
        default_value = "auto",
        help_heading = "CHARSET",
        help = "Charset preset (see --list-charsets)"
    )]
    pub charset: String,

    #[arg(
        long = "chars",
        help_heading = "CHARSET",
        help = "Custom characters override"
    )]
    pub chars: Option<String>,

    #[arg(
        long = "check-bitcolor",
        help_heading = "HELP",
        help = "Print detected terminal color capability and exit"
    )]
    pub check_bitcolor: bool,

    #[arg(
        long = "help-detail",
        help_heading = "HELP",
        help = "Show detailed help for all parameters and exit"
    )]
    pub help_detail: bool,

    #[arg(
        long = "list-charsets",
        help_heading = "HELP",
        help = "List available charset presets and exit"
    )]
    pub list_charsets: bool,

    #[arg(
        long = "list-colors",
        help_heading = "HELP",
        help = "List available color themes and exit"
    )]
    pub list_colors: bool,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

fn list_heading(title: &str, flag: &str) {
    if color_enabled_stdout() {
        println!("\x1b[1;36m{}\x1b[0m", title);
        println!("\x1b[2mNOTE: Use only the VALUE (left side) with {}.\x1b[0m", flag);
    } else {
        println!("{}", title);
        println!("NOTE: Use only the VALUE (left side) with {}.", flag);
    }
    println!();
    println!("VALUE        DESCRIPTION");
}

pub fn print_list_charsets() {
    list_heading("AVAILABLE CHARSET PRESETS:", "--charset");
    println!("auto         Auto-select (ascii when non-UTF, otherwise classic)");
    println!("classic      Digits + half-width katakana (alias: matrix)");
    println!("ascii        Letters + digits");
    println!("english      Letters only");
    println!("digits       Digits only (aliases: dec, decimal)");
    println!("binary       0 and 1 (aliases: bin, 01)");
    println!("hex          0-9 and A-F (alias: hexadecimal)");
    println!("katakana     Half-width katakana");
    println!("greek        Greek");
    println!("cyrillic     Cyrillic");
    println!("braille      Braille");
    println!("runic        Runic");
    println!("blocks       Block elements");
}

pub fn print_list_colors() {
    list_heading("AVAILABLE COLOR THEMES:", "--color");
    println!("green        Green rain, white glow (default)");
    println!("gold         Gold theme (alias: yellow)");
    println!("cyan         Cyan theme (alias: blue)");
    println!("red          Red theme");
    println!("purple       Purple theme");
    println!("gray         Gray theme (alias: grey)");
}

pub fn print_help_detail() {
    let block = format!(
        "{}\n\nUSAGE:\n  glyphfall [OPTIONS]\n\nGENERAL:\n  -m, --message <text>\n      Message the rain resolves into, centred on the middle row.\n      Example: glyphfall -m \"HELLO, WORLD\"\n\n  --finale <full|fade|cut>\n      full: hold, glitch into hex and disappear. fade: hold then clear. cut: clear at once.\n      Example: glyphfall --finale fade\n\n  --loop\n      Replay the sequence with a fresh layout until a quit key is pressed.\n      Example: glyphfall --loop\n\n  -s, --screensaver\n      Screensaver mode (exit on keypress).\n      Example: glyphfall -s --loop\n\n  --seed <number>\n      Seed the random generator for a repeatable run.\n      Example: glyphfall --seed 42\n\nAPPEARANCE:\n  -c, --color <name>\n      Set theme (see --list-colors).\n      Example: glyphfall --color gold\n\n  --colormode <0|16|8|24>\n      Force color mode; otherwise auto-detected from COLORTERM/TERM.\n      Example: glyphfall --colormode 24\n\n  --color-bg <black|default-background|transparent>\n      Background mode.\n      Example: glyphfall --color-bg transparent\n\n  --hspace <number>, --vspace <number>\n      Glyph spacing in cells.\n      Example: glyphfall --hspace 2\n\nPERFORMANCE:\n  -f, --fps <number>\n      Target FPS (min 1 max 240). Disappear runs at half of it.\n      Example: glyphfall --fps 30\n\n  --uncapped\n      Step on every repaint; only --refresh limits the speed.\n      Example: glyphfall --uncapped --refresh 60\n\n  --refresh <hz>\n      Terminal repaint rate (min 10 max 480).\n      Example: glyphfall --refresh 144\n\n  --timeout <seconds>\n      Abort if one phase runs longer than this.\n      Example: glyphfall --timeout 30\n\n  --perf-stats\n      Print per-phase timing summary on exit.\n      Example: glyphfall --perf-stats\n\nFINALE:\n  --hold <ticks>\n      Ticks the formed message is held (min 1 max 1000).\n      Example: glyphfall --hold 50\n\n  -G, --glitchpct <number>\n      Chance per tick a disappearing letter turns to hex (min 0 max 100).\n      Example: glyphfall --glitchpct 25\n\nCHARSET:\n  --charset <name>\n      Charset preset (see --list-charsets).\n      Example: glyphfall --charset binary\n\n  --chars <string>\n      Custom characters override.\n      Example: glyphfall --chars \"01\"\n\nHELP:\n  --check-bitcolor\n      Print detected terminal color capability and exit.\n\n  --help\n      Show short help.\n\n  --help-detail\n      Show this detailed help.\n\n  --list-charsets\n      List available charset presets and exit.\n\n  --list-colors\n      List available color themes and exit.\n\n  -v, --version\n      Print version and exit.\n\n  -i, --info\n      Print version info and exit.\n\nKEYS:\n  q, Esc, Ctrl-C\n      Quit (any key in screensaver mode).\n\nLOGGING:\n  RUST_LOG=debug glyphfall 2>glyphfall.log\n      Log phase transitions to a file; stderr shares the screen.\n\nLIMITS / VALID RANGES:\n",
        DEFAULT_PARAMS_USAGE
    );

    if color_enabled_stdout() {
        print!("{}", colorize_help_detail(&block));
    } else {
        print!("{}", block);
    }
    println!("  --fps <number>           min 1 max 240");
    println!("  --refresh <hz>           min 10 max 480");
    println!("  --timeout <seconds>      min 0.1 max 86400");
    println!("  --hold <ticks>           min 1 max 1000");
    println!("  --glitchpct <number>     min 0 max 100");
    println!("  --hspace / --vspace      min 1 max 4");
    println!("  --colormode <0|16|8|24>  allowed values only (8==256, 24==32)");
    println!();
    print_list_charsets();
    println!();
    print_list_colors();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_sequence() {
        let args = Args::try_parse_from(["glyphfall"]).unwrap();
        assert_eq!(args.finale, Finale::Full);
        assert_eq!(args.hold, 25);
        assert_eq!(args.glitch_pct, 75.0);
        assert_eq!(args.fps, None);
        assert!(!args.uncapped && !args.repeat);
        assert_eq!(args.color_bg, ColorBg::Black);
    }

    #[test]
    fn flags_parse() {
        let args = Args::try_parse_from([
            "glyphfall", "-m", "HI", "--finale", "cut", "--fps", "20", "--loop", "--seed", "7",
        ])
        .unwrap();
        assert_eq!(args.message.as_deref(), Some("HI"));
        assert_eq!(args.finale, Finale::Cut);
        assert_eq!(args.fps, Some(20.0));
        assert!(args.repeat);
        assert_eq!(args.seed, Some(7));
    }

    #[test]
    fn unknown_finale_is_rejected() {
        assert!(Args::try_parse_from(["glyphfall", "--finale", "explode"]).is_err());
    }

    #[test]
    fn help_colouring_marks_headings_and_flags() {
        let out = colorize_help_detail("GENERAL:\n  --loop\nplain\n");
        assert!(out.starts_with("\x1b[1;36mGENERAL:\x1b[0m\n"));
        assert!(out.contains("\x1b[33m--loop\x1b[0m"));
        assert!(out.ends_with("plain\n"));
    }
}
