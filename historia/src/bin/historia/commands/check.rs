use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Table};
use historia::{Bucket, ResultEnvelope, ValidationIssue};
use serde::Serialize;

use crate::commands::{ExampleGroup, read_json};
use crate::output::{OutputManager, TableDisplay};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Envelope Validation",
    commands: &[
        "historia check envelope.json                  # Verify a normalized envelope",
        "historia --output json check envelope.json    # Issues as JSON",
    ],
}];

#[derive(Args)]
pub struct CheckArgs {
    /// Normalized envelope (JSON), e.g. from `historia --output json normalize`
    pub file: PathBuf,
}

#[derive(Serialize)]
pub struct CheckReport {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl TableDisplay for CheckReport {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.table(&["Field", "Code", "Message"]);
        for issue in &self.issues {
            table.add_row(vec![
                Cell::new(&issue.field),
                Cell::new(&issue.code),
                Cell::new(&issue.message),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        if self.valid {
            "valid".to_string()
        } else {
            format!("invalid issues={}", self.issues.len())
        }
    }
}

pub fn handle_check(args: CheckArgs, output: &OutputManager) -> Result<()> {
    let raw = read_json(&args.file)?;
    // `normalize --output json` wraps the envelope; accept either form.
    let candidate = raw.get("envelope").unwrap_or(&raw);

    match ResultEnvelope::decode(candidate) {
        Ok(envelope) => {
            output.success(&format!(
                "{} is a valid envelope ({} records, {} year rows)",
                args.file.display(),
                envelope.record_count(),
                envelope.counts().len()
            ));
            for bucket in Bucket::ALL {
                output.verbose(&format!("{bucket}: {}", envelope.bucket(bucket).len()));
            }
            output.display(&CheckReport {
                valid: true,
                issues: Vec::new(),
            })
        }
        Err(err) => {
            output.error(&format!(
                "{} is not a valid envelope ({} issue(s))",
                args.file.display(),
                err.issues.len()
            ));
            output.display(&CheckReport {
                valid: false,
                issues: err.issues,
            })?;
            anyhow::bail!("Envelope validation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_summary() {
        let report = CheckReport {
            valid: false,
            issues: vec![ValidationIssue::new("media", "type", "expected an array")],
        };
        assert_eq!(report.to_compact(), "invalid issues=1");
    }
}
