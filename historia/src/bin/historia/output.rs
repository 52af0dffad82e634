use anyhow::Result;
use clap::ValueEnum;
use colored::{Color, Colorize};
use comfy_table::{Attribute, Cell, Color as TableColor, Table};
use serde::Serialize;


/// Marker printed before each bullet line.
pub const BULLET: &str = "•";

/// What a piece of terminal text is saying. Each tone has one color and, for
/// status lines, one leading icon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Success,
    Error,
    Warning,
    Info,
    /// Secondary detail: verbose lines, bullets, help placeholders.
    Muted,
    /// Section titles in output and help.
    Heading,
    /// Sample invocations and literals in help.
    Command,
    Label,
    Value,
}

impl Tone {
    pub fn color(self) -> Color {
        match self {
            Tone::Success => Color::Green,
            Tone::Error => Color::Red,
            Tone::Warning => Color::Yellow,
            Tone::Info => Color::Blue,
            Tone::Muted => Color::BrightBlack,
            Tone::Heading => Color::BrightBlue,
            Tone::Command => Color::Magenta,
            Tone::Label => Color::BrightCyan,
            Tone::Value => Color::White,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Tone::Success => "✓",
            Tone::Error => "✗",
            Tone::Warning => "⚠",
            Tone::Info => "ℹ",
            _ => "→",
        }
    }

    /// Applies this tone to `text`, or returns it untouched when color is off.
    pub fn paint(self, text: &str, bold: bool, use_color: bool) -> String {
        match (use_color, bold) {
            (false, _) => text.to_string(),
            (true, true) => text.color(self.color()).bold().to_string(),
            (true, false) => text.color(self.color()).to_string(),
        }
    }
}

/// Output format options for CLI commands
#[derive(Clone, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    /// Formatted table output (default)
    #[default]
    Table,
    /// JSON output for piping into a map layer or another tool
    Json,
    /// Compact single-line output
    Compact,
}

/// Global CLI options that affect output and behavior
#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
    pub no_color: bool,
}

/// Data that knows how to render itself as a table or a one-line summary
pub trait TableDisplay {
    fn to_table(&self, output: &OutputManager) -> Table;
    fn to_compact(&self) -> String;
}

/// Output manager handles formatting and display
pub struct OutputManager {
    pub options: GlobalOptions,
}

impl OutputManager {
    pub fn new(options: GlobalOptions) -> Self {
        Self { options }
    }

    pub fn is_json(&self) -> bool {
        self.options.output_format == OutputFormat::Json
    }

    /// Display data according to the configured output format
    pub fn display<T>(&self, data: &T) -> Result<()>
    where
        T: Serialize + TableDisplay,
    {
        if self.options.quiet {
            return Ok(());
        }

        match self.options.output_format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(data)?;
                println!("{json}");
            }
            OutputFormat::Table => {
                println!("{}", data.to_table(self));
            }
            OutputFormat::Compact => {
                println!("{}", data.to_compact());
            }
        }
        Ok(())
    }

    fn line(&self, tone: Tone, message: &str) -> String {
        let use_color = !self.options.no_color;
        format!("{} {}", tone.paint(tone.icon(), false, use_color), tone.paint(message, false, use_color))
    }

    /// Human-facing chatter is suppressed in quiet and JSON modes so stdout stays parseable.
    fn chatty(&self) -> bool {
        !self.options.quiet && !self.is_json()
    }

    pub fn success(&self, message: &str) {
        if self.chatty() {
            println!("{}", self.line(Tone::Success, message));
        }
    }

    /// Errors always go to stderr, even in quiet mode
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.line(Tone::Error, message));
    }

    pub fn warning(&self, message: &str) {
        if !self.options.quiet {
            eprintln!("{}", self.line(Tone::Warning, message));
        }
    }

    pub fn info(&self, message: &str) {
        if self.chatty() {
            println!("{}", self.line(Tone::Info, message));
        }
    }

    /// Display verbose information (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.options.verbose && !self.options.quiet {
            eprintln!("{}", self.line(Tone::Muted, message));
        }
    }

    pub fn heading(&self, text: &str) {
        if self.chatty() {
            let output = if self.options.no_color {
                format!("\n{text}\n{}", "=".repeat(text.len()))
            } else {
                format!("\n{}", Tone::Heading.paint(text, true, true))
            };
            println!("{output}");
        }
    }

    pub fn key_value(&self, key: &str, value: &str) {
        if self.chatty() {
            let use_color = !self.options.no_color;
            println!(
                "{}: {}",
                Tone::Label.paint(key, true, use_color),
                Tone::Value.paint(value, false, use_color)
            );
        }
    }

    /// Bullets go to stderr so they can accompany an error in any output mode
    pub fn bullet(&self, text: &str) {
        if !self.options.quiet {
            eprintln!("  {} {text}", Tone::Muted.paint(BULLET, false, !self.options.no_color));
        }
    }

    /// Create a themed table with a bold header row
    pub fn table(&self, headers: &[&str]) -> Table {
        let mut table = Table::new();
        if self.options.no_color {
            table.load_preset(comfy_table::presets::ASCII_FULL);
        } else {
            table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
        }

        let header_cells: Vec<Cell> = headers
            .iter()
            .map(|header| {
                let cell = Cell::new(header).add_attribute(Attribute::Bold);
                if self.options.no_color {
                    cell
                } else {
                    cell.fg(TableColor::Cyan)
                }
            })
            .collect();
        table.set_header(header_cells);
        table
    }
}
