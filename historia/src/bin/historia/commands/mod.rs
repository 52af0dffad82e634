pub mod check;
pub mod normalize;
pub mod sanitize;

use std::path::Path;

use anyhow::{Context, Result};
use historia::normalizers::is_year;
use serde_json::Value;

/// A titled set of sample invocations shown under a subcommand's `--help`.
pub struct ExampleGroup {
    pub title: &'static str,
    pub commands: &'static [&'static str],
}

/// Help examples keyed by subcommand name.
pub const HELP_EXAMPLES: &[(&str, &[ExampleGroup])] = &[
    ("normalize", normalize::EXAMPLES),
    ("sanitize", sanitize::EXAMPLES),
    ("check", check::EXAMPLES),
];

/// Read and parse a JSON document from disk.
pub fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {} as JSON", path.display()))
}

/// Warning text for a year argument that is not a plausible four digit calendar year.
///
/// Such values are still used as given; a typo like `190` simply matches nothing.
pub fn unusual_year(flag: &str, year: &Value) -> Option<String> {
    (!is_year(year)).then(|| format!("{flag} {year} does not look like a calendar year"))
}
