use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Table};
use historia::{GeoFeatureSanitizer, HistoriaConfig, MapSource, SanitizeReport};
use serde::{Serialize, Serializer};

use crate::commands::{ExampleGroup, read_json, unusual_year};
use crate::output::{OutputManager, TableDisplay};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Sanitize GeoJSON",
    commands: &[
        "historia sanitize parcels.geojson                         # Kept/dropped summary",
        "historia --output json sanitize parcels.geojson           # Map layer source",
        "historia sanitize parcels.geojson --inject-year 1900      # Default year for undated features",
        "historia sanitize parcels.geojson --source-id parcels     # Custom layer id",
    ],
}];

#[derive(Args)]
pub struct SanitizeArgs {
    /// Raw GeoJSON FeatureCollection
    pub file: PathBuf,

    /// Identifier stamped on the collection when it has none
    #[arg(long)]
    pub source_id: Option<String>,

    /// Year written into features without one
    #[arg(long)]
    pub inject_year: Option<i64>,
}

/// Result of a sanitize run. Serializes as the map source alone so JSON output can
/// be handed straight to a renderer.
pub struct SanitizeOutcome {
    pub source: MapSource,
    pub report: SanitizeReport,
}

impl Serialize for SanitizeOutcome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.source.serialize(serializer)
    }
}

impl TableDisplay for SanitizeOutcome {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.table(&["Feature", "Outcome"]);
        if let Some(reason) = &self.report.rejected {
            table.add_row(vec![Cell::new("collection"), Cell::new(format!("rejected: {reason}"))]);
            return table;
        }
        for dropped in &self.report.dropped {
            table.add_row(vec![Cell::new(dropped.index), Cell::new(format!("dropped: {}", dropped.reason))]);
        }
        for index in &self.report.repaired {
            table.add_row(vec![Cell::new(index), Cell::new("kept, properties reset to {}")]);
        }
        table.add_row(vec![Cell::new("kept"), Cell::new(self.report.kept)]);
        table
    }

    fn to_compact(&self) -> String {
        format!(
            "id={} kept={} dropped={}{}",
            self.source.source_id().unwrap_or("-"),
            self.report.kept,
            self.report.dropped.len(),
            if self.report.rejected.is_some() { " rejected" } else { "" }
        )
    }
}

pub fn handle_sanitize(args: SanitizeArgs, config: &HistoriaConfig, output: &OutputManager) -> Result<()> {
    let raw = read_json(&args.file)?;

    let mut options = config.geo.clone();
    if let Some(source_id) = args.source_id {
        options.source_id = source_id;
    }
    if args.inject_year.is_some() {
        options.inject_year = args.inject_year;
    }
    if let Some(year) = options.inject_year
        && let Some(warning) = unusual_year("--inject-year", &serde_json::Value::from(year))
    {
        output.warning(&warning);
    }

    let sanitizer = GeoFeatureSanitizer::new(options);
    let (source, report) = sanitizer.sanitize_with_report(raw);

    output.heading("GeoJSON Source");
    match &report.rejected {
        Some(reason) => output.warning(&format!("Collection rejected: {reason}")),
        None if report.dropped.is_empty() => output.success(&format!("All {} features kept", report.kept)),
        None => output.warning(&format!(
            "{} feature(s) dropped, {} kept",
            report.dropped.len(),
            report.kept
        )),
    }

    output.display(&SanitizeOutcome { source, report })
}
