mod commands;
mod output;

use std::fmt::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{
    ColorChoice, Command, CommandFactory, FromArgMatches, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Color as ClapColor, Style},
    },
};
use colored::{Color as TermColor, control::ShouldColorize};
use historia::HistoriaConfig;

use commands::{
    ExampleGroup, HELP_EXAMPLES,
    check::{CheckArgs, handle_check},
    normalize::{NormalizeArgs, handle_normalize},
    sanitize::{SanitizeArgs, handle_sanitize},
};
use output::{GlobalOptions, OutputFormat, OutputManager, Tone};

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    ("RUST_LOG", "Log filter for diagnostics (e.g. historia=debug)"),
    ("NO_COLOR", "Disable colored output when set"),
];

#[derive(Parser)]
#[command(name = "historia")]
#[command(version)]
#[command(
    about = "Normalize historical search payloads and sanitize GeoJSON for map layers",
    long_about = r#"Historia turns raw search API output into data a map UI can consume:

• Splits results into six buckets and tallies them per year
• Filters envelopes by year and computes combined totals
• Validates and repairs GeoJSON feature collections before rendering

Commands:
  normalize  Parse a search payload into a result envelope
  sanitize   Clean a GeoJSON FeatureCollection for a map layer
  check      Validate a normalized envelope
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Enable verbose output and debug logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Config file (defaults to ./historia.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a raw search payload into a normalized result envelope
    Normalize(NormalizeArgs),

    /// Validate and normalize a GeoJSON FeatureCollection for a map layer
    Sanitize(SanitizeArgs),

    /// Check that a JSON file is a well formed result envelope
    Check(CheckArgs),
}

impl Cli {
    fn parse_with_styles() -> Self {
        let matches = build_cli_command().styles(help_styles()).get_matches();
        Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
    }
}

fn build_cli_command() -> Command {
    let use_color = ShouldColorize::from_env().should_colorize();
    let mut command = Cli::command()
        .after_long_help(render_top_level_appendix(use_color))
        .color(if use_color { ColorChoice::Auto } else { ColorChoice::Never });

    for &(name, groups) in HELP_EXAMPLES {
        if let Some(subcommand) = command.find_subcommand_mut(name) {
            let updated = subcommand.clone().after_long_help(render_examples(groups, use_color));
            *subcommand = updated;
        }
    }
    command
}

fn render_examples(groups: &[ExampleGroup], use_color: bool) -> String {
    let mut buffer = String::new();
    let _ = writeln!(buffer, "{}", Tone::Heading.paint("Examples:", true, use_color));

    for (index, group) in groups.iter().enumerate() {
        let _ = writeln!(buffer, "  {}", Tone::Heading.paint(group.title, false, use_color));
        for command in group.commands {
            let _ = writeln!(
                buffer,
                "    {} {}",
                Tone::Muted.paint(Tone::Muted.icon(), false, use_color),
                Tone::Command.paint(command, false, use_color)
            );
        }
        if index + 1 < groups.len() {
            buffer.push('\n');
        }
    }
    buffer
}

fn render_top_level_appendix(use_color: bool) -> String {
    let mut buffer = String::new();

    let _ = writeln!(buffer, "{}", Tone::Heading.paint("Environment Variables:", true, use_color));
    for (key, description) in ENVIRONMENT_VARIABLES {
        let _ = writeln!(
            buffer,
            "  {}  {}",
            Tone::Label.paint(key, true, use_color),
            Tone::Value.paint(description, false, use_color)
        );
    }

    let _ = writeln!(
        buffer,
        "\n{} {}",
        Tone::Heading.paint("Tip:", true, use_color),
        Tone::Command.paint("historia <command> --help lists sample invocations", false, use_color)
    );
    buffer
}

fn help_styles() -> Styles {
    Styles::styled()
        .usage(clap_style(Tone::Heading).bold())
        .header(clap_style(Tone::Heading).bold())
        .literal(clap_style(Tone::Command))
        .placeholder(clap_style(Tone::Muted))
        .valid(clap_style(Tone::Success))
        .invalid(clap_style(Tone::Warning))
        .error(clap_style(Tone::Error).bold())
}

/// Translates a tone's terminal color into clap's styling model.
fn clap_style(tone: Tone) -> Style {
    let color = match tone.color() {
        TermColor::Red => ClapColor::Ansi(AnsiColor::Red),
        TermColor::Green => ClapColor::Ansi(AnsiColor::Green),
        TermColor::Yellow => ClapColor::Ansi(AnsiColor::Yellow),
        TermColor::Blue => ClapColor::Ansi(AnsiColor::Blue),
        TermColor::Magenta => ClapColor::Ansi(AnsiColor::Magenta),
        TermColor::BrightBlack => ClapColor::Ansi(AnsiColor::BrightBlack),
        TermColor::BrightBlue => ClapColor::Ansi(AnsiColor::BrightBlue),
        TermColor::BrightCyan => ClapColor::Ansi(AnsiColor::BrightCyan),
        _ => ClapColor::Ansi(AnsiColor::White),
    };
    Style::new().fg_color(Some(color))
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

fn load_config(path: Option<&PathBuf>) -> Result<HistoriaConfig> {
    match path {
        Some(path) => HistoriaConfig::from_path(path).context("Failed to load config"),
        None => {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            HistoriaConfig::discover(&current_dir).context("Failed to load config")
        }
    }
}

fn main() {
    let cli = Cli::parse_with_styles();
    init_logging(cli.verbose);

    if let Err(err) = execute(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn execute(cli: Cli) -> Result<()> {
    let output = OutputManager::new(GlobalOptions {
        output_format: cli.output,
        quiet: cli.quiet,
        verbose: cli.verbose,
        no_color: cli.no_color,
    });
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Normalize(args) => handle_normalize(args, &config, &output),
        Commands::Sanitize(args) => handle_sanitize(args, &config, &output),
        Commands::Check(args) => handle_check(args, &output),
    }
}
