use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use comfy_table::{Cell, Table};
use historia::{Bucket, Count, HistoriaConfig, ResultEnvelope, TotalRowPolicy};
use serde::Serialize;

use crate::commands::{ExampleGroup, read_json, unusual_year};
use crate::output::{OutputManager, TableDisplay};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Normalize",
        commands: &[
            "historia normalize search.json                    # Per-year tallies for a payload",
            "historia normalize search.json --aggregate        # Add the combined row",
        ],
    },
    ExampleGroup {
        title: "Filter",
        commands: &[
            "historia normalize search.json --year 1900        # Only records from 1900",
            "historia --output json normalize search.json      # Full envelope as JSON",
        ],
    },
];

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TotalRowArg {
    /// Drop the API's "Total" row and recompute
    Discard,
    /// Keep the API's "Total" row aside and prefer it
    Retain,
}

impl From<TotalRowArg> for TotalRowPolicy {
    fn from(arg: TotalRowArg) -> Self {
        match arg {
            TotalRowArg::Discard => TotalRowPolicy::Discard,
            TotalRowArg::Retain => TotalRowPolicy::Retain,
        }
    }
}

#[derive(Args)]
pub struct NormalizeArgs {
    /// Raw search payload (JSON)
    pub file: PathBuf,

    /// Keep only records and rows from this year
    #[arg(long)]
    pub year: Option<String>,

    /// Include the combined row across all years
    #[arg(long)]
    pub aggregate: bool,

    /// Override how the API's "Total" row is handled
    #[arg(long, value_enum)]
    pub total_row: Option<TotalRowArg>,
}

/// What `normalize` prints: the envelope plus the derived totals.
#[derive(Serialize)]
pub struct NormalizeReport {
    pub message: String,
    pub envelope: ResultEnvelope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Count>,
}

impl TableDisplay for NormalizeReport {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut headers = vec!["Year"];
        headers.extend(Bucket::ALL.iter().map(|bucket| bucket.name()));
        headers.push("total");

        let mut table = output.table(&headers);
        for row in self.envelope.counts().iter().chain(self.total.iter()) {
            let label = match (&row.year, row.is_aggregate) {
                (_, true) => "All years".to_string(),
                (Some(year), false) => year.clone(),
                (None, false) => "-".to_string(),
            };
            let mut cells = vec![Cell::new(label)];
            cells.extend(Bucket::ALL.iter().map(|bucket| Cell::new(row.tally(*bucket))));
            cells.push(Cell::new(row.total()));
            table.add_row(cells);
        }
        table
    }

    fn to_compact(&self) -> String {
        let mut parts: Vec<String> = Bucket::ALL
            .iter()
            .map(|bucket| format!("{bucket}={}", self.envelope.bucket(*bucket).len()))
            .collect();
        parts.push(format!("years={}", self.envelope.counts().len()));
        if let Some(total) = &self.total {
            parts.push(format!("total={}", total.total()));
        }
        parts.join(" ")
    }
}

pub fn handle_normalize(args: NormalizeArgs, config: &HistoriaConfig, output: &OutputManager) -> Result<()> {
    let raw = read_json(&args.file)?;

    let mut options = config.envelope.parse_options();
    if let Some(total_row) = args.total_row {
        options.total_row = total_row.into();
    }

    let response = ResultEnvelope::parse_with(&raw, options);
    let message = response.message();
    let envelope = match response.into_result() {
        Ok(envelope) => envelope,
        Err(cause) => {
            output.error(&format!("Could not normalize {}: {cause}", args.file.display()));
            for issue in cause.details().map(|details| details.issues.as_slice()).unwrap_or(&[]) {
                output.bullet(&format!("{} ({}): {}", issue.field, issue.code, issue.message));
            }
            anyhow::bail!("{cause}");
        }
    };

    let envelope = match args.year.as_deref() {
        Some(year) => {
            if let Some(warning) = unusual_year("--year", &serde_json::Value::from(year)) {
                output.warning(&warning);
            }
            output.verbose(&format!("Filtering by year {year}"));
            envelope.filter_by_year(year)?
        }
        None => envelope,
    };

    let total = if args.aggregate { envelope.preferred_total() } else { None };

    output.heading("Search Results");
    output.key_value("Status", &message);
    output.key_value("Records", &envelope.record_count().to_string());
    if envelope.is_empty() {
        output.info("No records matched");
    }

    output.display(&NormalizeReport {
        message,
        envelope,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(total: Option<Count>) -> NormalizeReport {
        let payload = json!({
            "results": {"buildings": [{"year": 1900}], "people": [{"year": 1950}]},
            "count": [
                {"year": "1900", "buildings": 1},
                {"year": "1950", "people": 1}
            ]
        });
        let envelope = ResultEnvelope::parse(&payload).into_payload().unwrap();
        let total = total.or_else(|| envelope.aggregate());
        NormalizeReport {
            message: "Success".to_string(),
            envelope,
            total,
        }
    }

    #[test]
    fn compact_summary_lists_buckets_and_total() {
        let compact = report(None).to_compact();
        assert!(compact.contains("structures=1"));
        assert!(compact.contains("people=1"));
        assert!(compact.contains("years=2"));
        assert!(compact.ends_with("total=2"));
    }

    #[test]
    fn table_has_a_row_per_year_plus_total() {
        let output = OutputManager::new(Default::default());
        let table = report(None).to_table(&output);
        assert_eq!(table.row_iter().count(), 3);
        assert!(table.to_string().contains("All years"));
    }
}
