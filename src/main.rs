// Copyright (c) 2026 rezky_nightky

mod canvas;
mod charset;
mod config;
mod error;
mod frame;
mod palette;
mod rain;
mod runtime;
mod scheduler;
mod sequence;
mod terminal;

use std::env;

#[cfg(unix)]
use std::thread;

use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::charset::{build_glyphs, charset_from_str};
use crate::config::{
    color_enabled_stdout, default_params_usage_for_help, print_help_detail, print_list_charsets,
    print_list_colors, Args,
};
use crate::error::Result;
use crate::palette::{theme, Palette};
use crate::rain::{FieldOptions, GlyphMetrics, Layout, Phase, RainField};
use crate::runtime::{ColorMode, ColorScheme, DeviceClass};
use crate::scheduler::{FrameRate, RunReport, Scheduler, SystemClock};
use crate::sequence::{play, SequenceConfig};
use crate::terminal::{restore_terminal_best_effort, Terminal, TerminalHost};

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

fn build_info() -> String {
    let sha = env!("GLYPHFALL_GIT_SHA");
    if sha.is_empty() {
        env!("GLYPHFALL_BUILD").to_string()
    } else {
        format!("{} {}", env!("GLYPHFALL_BUILD"), sha)
    }
}

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn require_f64_range(name: &str, v: f64, min: f64, max: f64) -> f64 {
    if !v.is_finite() {
        eprintln!("failed to apply {} {} (must be a finite number)", name, v);
        std::process::exit(1);
    }
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn require_f32_range(name: &str, v: f32, min: f32, max: f32) -> f32 {
    require_f64_range(name, v as f64, min as f64, max as f64) as f32
}

fn require_u32_range(name: &str, v: u32, min: u32, max: u32) -> u32 {
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn default_to_ascii() -> bool {
    let lang = env::var("LANG").unwrap_or_default();
    !lang.to_ascii_uppercase().contains("UTF")
}

fn color_mode_from_env(colorterm: &str, term: &str) -> ColorMode {
    let colorterm = colorterm.to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorMode::TrueColor;
    }

    let term = term.to_ascii_lowercase();
    if term == "dumb" {
        return ColorMode::Mono;
    }
    if term.contains("256color") {
        return ColorMode::Color256;
    }

    ColorMode::Color16
}

fn detect_color_mode_auto() -> ColorMode {
    color_mode_from_env(
        &env::var("COLORTERM").unwrap_or_default(),
        &env::var("TERM").unwrap_or_default(),
    )
}

fn color_mode_from_flag(m: u16) -> Option<ColorMode> {
    match m {
        0 => Some(ColorMode::Mono),
        16 => Some(ColorMode::Color16),
        8 | 256 => Some(ColorMode::Color256),
        24 | 32 => Some(ColorMode::TrueColor),
        _ => None,
    }
}

fn detect_color_mode(args: &Args) -> ColorMode {
    if let Some(m) = args.colormode {
        return color_mode_from_flag(m).unwrap_or_else(|| {
            eprintln!("invalid --colormode: {} (allowed: 0,16,8,256,24,32)", m);
            std::process::exit(1);
        });
    }

    detect_color_mode_auto()
}

fn color_mode_label(m: ColorMode) -> &'static str {
    match m {
        ColorMode::TrueColor => "24-bit truecolor",
        ColorMode::Color256 => "8-bit (256-color)",
        ColorMode::Mono => "mono",
        ColorMode::Color16 => "16-color",
    }
}

fn parse_color_scheme(s: &str) -> std::result::Result<ColorScheme, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "green" => Ok(ColorScheme::Green),
        "gold" | "yellow" => Ok(ColorScheme::Gold),
        "cyan" | "blue" => Ok(ColorScheme::Cyan),
        "red" => Ok(ColorScheme::Red),
        "purple" => Ok(ColorScheme::Purple),
        "gray" | "grey" => Ok(ColorScheme::Gray),
        _ => Err(format!("invalid color: {} (see --list-colors)", s)),
    }
}

fn print_perf_stats(runs: &[(Phase, RunReport)], draws: u64, fps: Option<f64>) {
    println!("PERF STATS:");
    match fps {
        Some(fps) => println!("  target_fps: {:.3}", fps),
        None => println!("  target_fps: uncapped"),
    }
    println!("  drawn_frames: {}", draws);
    for (phase, run) in runs {
        let secs = (run.elapsed_ms / 1000.0).max(0.000_001);
        println!(
            "  {:<10} ticks: {:>6}  repaints: {:>6}  elapsed_s: {:>8.3}  avg_fps: {:>8.3}  outcome: {:?}",
            phase.to_string(),
            run.ticks,
            run.repaints,
            secs,
            run.ticks as f64 / secs,
            run.outcome
        );
    }
}

fn main() {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }

    // stderr shares the screen with the rain, so logging is opt-in.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(default_params_usage_for_help());
    let help_template = if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    };
    cmd = cmd.help_template(help_template);
    cmd.build();

    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }
    cmd.build();

    let matches = cmd.get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if args.list_charsets {
        print_list_charsets();
        return;
    }

    if args.list_colors {
        print_list_colors();
        return;
    }

    if args.help_detail {
        print_help_detail();
        return;
    }

    if args.check_bitcolor {
        let colorterm = env::var("COLORTERM").unwrap_or_default();
        let term = env::var("TERM").unwrap_or_default();
        let auto = detect_color_mode_auto();
        let effective = detect_color_mode(&args);

        println!("BITCOLOR CHECK:");
        println!(
            "  COLORTERM: {}",
            if colorterm.is_empty() {
                "(unset)"
            } else {
                &colorterm
            }
        );
        println!(
            "  TERM: {}",
            if term.is_empty() { "(unset)" } else { &term }
        );
        println!("  auto_detected: {}", color_mode_label(auto));
        if args.colormode.is_some() {
            println!("  forced: {}", color_mode_label(effective));
        }
        println!("  effective: {}", color_mode_label(effective));
        return;
    }

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return;
    }

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", build_info());
        println!("Copyright: (c) 2026 {}", env!("CARGO_PKG_AUTHORS"));
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
        return;
    }

    if let Err(e) = run(&args) {
        eprintln!("glyphfall: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let color_mode = detect_color_mode(args);
    let color_scheme = parse_color_scheme(&args.color).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });
    let charset = charset_from_str(&args.charset, default_to_ascii()).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });

    let refresh = require_f64_range("--refresh", args.refresh, 10.0, 480.0);
    let fps = args
        .fps
        .map(|fps| require_f64_range("--fps", fps, 1.0, 240.0));
    let timeout_ms = args
        .timeout
        .map(|s| require_f64_range("--timeout", s, 0.1, 86400.0) * 1000.0);
    let hold = require_u32_range("--hold", args.hold, 1, 1000);
    let glitch_pct = require_f32_range("--glitchpct", args.glitch_pct, 0.0, 100.0);
    let glyph = GlyphMetrics {
        size: 1.0,
        hspace: require_f32_range("--hspace", args.hspace, 1.0, 4.0),
        vspace: require_f32_range("--vspace", args.vspace, 1.0, 4.0),
    };
    let alphabet = build_glyphs(charset, args.chars.as_deref());

    let palette = Palette::new(color_mode, args.color_bg.uses_terminal_background());
    let term = Terminal::new()?;
    let mut host = TerminalHost::new(term, palette, refresh, args.screensaver)?;

    let (w, _) = host.size();
    let device = DeviceClass::detect(w);
    let message = args
        .message
        .clone()
        .unwrap_or_else(|| device.default_message().to_string());
    let fps = fps.unwrap_or_else(|| device.default_fps());
    let rate = if args.uncapped {
        FrameRate::Uncapped
    } else {
        FrameRate::Capped(fps)
    };
    info!(
        "{:?} terminal, {} mode, message {:?}, rate {:?}",
        device,
        color_mode_label(color_mode),
        message,
        rate
    );

    let scheduler = Scheduler::new(SystemClock::new()).with_timeout_ms(timeout_ms);
    let config = SequenceConfig {
        rate,
        finale: args.finale,
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut runs: Vec<(Phase, RunReport)> = Vec::new();
    loop {
        let (w, h) = host.size();
        let layout = Layout::new(w as f32, h as f32, glyph, &message)?;
        let options = FieldOptions {
            alphabet: alphabet.clone(),
            theme: theme(color_scheme),
            hold_ticks: hold,
            glitch_chance: glitch_pct / 100.0,
        };
        let field_rng = StdRng::seed_from_u64(rng.random());
        let mut field = RainField::new(layout, options, field_rng);

        let report = play(&scheduler, &mut host, &mut field, &config)?;
        runs.extend(report.phases);
        if report.cancelled || !args.repeat {
            break;
        }
        host.reset();
    }

    let draws = host.draws();
    drop(host);
    if args.perf_stats {
        print_perf_stats(&runs, draws, rate.fps());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("truecolor", "xterm", ColorMode::TrueColor)]
    #[case("24bit", "", ColorMode::TrueColor)]
    #[case("", "xterm-256color", ColorMode::Color256)]
    #[case("", "dumb", ColorMode::Mono)]
    #[case("", "xterm", ColorMode::Color16)]
    fn color_mode_follows_environment(
        #[case] colorterm: &str,
        #[case] term: &str,
        #[case] expected: ColorMode,
    ) {
        assert_eq!(color_mode_from_env(colorterm, term), expected);
    }

    #[rstest]
    #[case(0, Some(ColorMode::Mono))]
    #[case(16, Some(ColorMode::Color16))]
    #[case(8, Some(ColorMode::Color256))]
    #[case(256, Some(ColorMode::Color256))]
    #[case(32, Some(ColorMode::TrueColor))]
    #[case(12, None)]
    fn colormode_flag_values(#[case] flag: u16, #[case] expected: Option<ColorMode>) {
        assert_eq!(color_mode_from_flag(flag), expected);
    }

    #[test]
    fn color_names_and_aliases() {
        assert_eq!(parse_color_scheme(" Grey "), Ok(ColorScheme::Gray));
        assert_eq!(parse_color_scheme("yellow"), Ok(ColorScheme::Gold));
        assert!(parse_color_scheme("rainbow").is_err());
    }
}
