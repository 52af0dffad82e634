//! Per-year tallies across the six record buckets.

use std::fmt;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::errors::{IssueCollector, ValidationResult};

/// Year label the search API uses for its own pre-computed summary row.
pub const TOTAL_ROW_LABEL: &str = "Total";

/// One of the six record categories an envelope is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Structures,
    People,
    ArchivalRecords,
    Documents,
    Narratives,
    Media,
}

impl Bucket {
    pub const ALL: [Bucket; 6] = [
        Bucket::Structures,
        Bucket::People,
        Bucket::ArchivalRecords,
        Bucket::Documents,
        Bucket::Narratives,
        Bucket::Media,
    ];

    /// Name used in the normalized envelope and in serialized counts.
    pub fn name(self) -> &'static str {
        match self {
            Bucket::Structures => "structures",
            Bucket::People => "people",
            Bucket::ArchivalRecords => "archival_records",
            Bucket::Documents => "documents",
            Bucket::Narratives => "narratives",
            Bucket::Media => "media",
        }
    }

    /// Key the search API uses for this bucket in `results` and in `count` rows.
    pub fn source_key(self) -> &'static str {
        match self {
            Bucket::Structures => "buildings",
            Bucket::People => "people",
            Bucket::ArchivalRecords => "census_records",
            Bucket::Documents => "documents",
            Bucket::Narratives => "stories",
            Bucket::Media => "media",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tally row for a single year, or the aggregate of several years.
///
/// `total` is never stored; [`Count::total`] sums the six tallies on every call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Count {
    pub structures: u64,
    pub people: u64,
    pub archival_records: u64,
    pub documents: u64,
    pub narratives: u64,
    pub media: u64,
    pub year: Option<String>,
    pub is_aggregate: bool,
}

impl Count {
    /// Builds a count from a raw API tally, labelling it with `year`.
    ///
    /// Any `year` embedded in `source` is ignored so callers control labelling.
    /// Missing or unusable tallies read as zero.
    pub fn from_source(source: &Value, year: Option<&str>) -> Self {
        let mut count = Count {
            year: year.map(str::to_owned),
            ..Count::default()
        };
        for bucket in Bucket::ALL {
            *count.tally_mut(bucket) = source.get(bucket.source_key()).and_then(tally_value).unwrap_or(0);
        }
        count
    }

    /// Strictly decodes one row of the raw `count` section.
    ///
    /// The row keeps its own year label. `path` prefixes every reported issue.
    pub(crate) fn decode_source_row(row: &Value, path: &str) -> ValidationResult<Self> {
        let mut issues = IssueCollector::default();
        if !row.is_object() {
            issues.push(path, "type", "expected a count object");
            return issues.finish(Count::default());
        }

        let mut count = Count::default();
        for bucket in Bucket::ALL {
            let key = bucket.source_key();
            *count.tally_mut(bucket) = match row.get(key) {
                None | Some(Value::Null) => 0,
                Some(value) => tally_value(value).unwrap_or_else(|| {
                    issues.push(format!("{path}.{key}"), "tally", "expected a non-negative integer");
                    0
                }),
            };
        }

        check_total(&count, path, &mut issues);

        count.year = match row.get("year") {
            None | Some(Value::Null) => None,
            Some(Value::String(label)) if label.is_empty() => None,
            Some(Value::String(label)) => Some(label.clone()),
            Some(Value::Number(number)) => Some(number.to_string()),
            Some(_) => {
                issues.push(format!("{path}.year"), "type", "expected a string or number year label");
                None
            }
        };

        issues.finish(count)
    }

    /// Decodes a normalized count, as produced by serializing a [`Count`].
    ///
    /// All six tallies must be numbers and `year`, if present, must be a string.
    pub fn decode(value: &Value) -> ValidationResult<Self> {
        decode_at(value, "count")
    }

    /// Boolean form of [`Count::decode`].
    pub fn matches_shape(value: &Value) -> bool {
        Count::decode(value).is_ok()
    }

    pub fn tally(&self, bucket: Bucket) -> u64 {
        match bucket {
            Bucket::Structures => self.structures,
            Bucket::People => self.people,
            Bucket::ArchivalRecords => self.archival_records,
            Bucket::Documents => self.documents,
            Bucket::Narratives => self.narratives,
            Bucket::Media => self.media,
        }
    }

    pub fn tally_mut(&mut self, bucket: Bucket) -> &mut u64 {
        match bucket {
            Bucket::Structures => &mut self.structures,
            Bucket::People => &mut self.people,
            Bucket::ArchivalRecords => &mut self.archival_records,
            Bucket::Documents => &mut self.documents,
            Bucket::Narratives => &mut self.narratives,
            Bucket::Media => &mut self.media,
        }
    }

    /// Sum of the six tallies, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        Bucket::ALL
            .iter()
            .fold(0u64, |sum, bucket| sum.saturating_add(self.tally(*bucket)))
    }

    /// Sum of the six tallies, or `None` when it does not fit in a `u64`.
    pub fn checked_total(&self) -> Option<u64> {
        Bucket::ALL
            .iter()
            .try_fold(0u64, |sum, bucket| sum.checked_add(self.tally(*bucket)))
    }

    /// True if this row is the label the API uses for its summary row.
    pub fn is_total_label(label: &str) -> bool {
        label == TOTAL_ROW_LABEL
    }
}

impl AddAssign<&Count> for Count {
    /// Adds tallies only, saturating at `u64::MAX`; year and aggregate flag are left alone.
    fn add_assign(&mut self, rhs: &Count) {
        for bucket in Bucket::ALL {
            let tally = self.tally_mut(bucket);
            *tally = tally.saturating_add(rhs.tally(bucket));
        }
    }
}

#[derive(Serialize)]
struct CountRow<'a> {
    structures: u64,
    people: u64,
    archival_records: u64,
    documents: u64,
    narratives: u64,
    media: u64,
    total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    year: Option<&'a str>,
    is_aggregate: bool,
}

impl Serialize for Count {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        CountRow {
            structures: self.structures,
            people: self.people,
            archival_records: self.archival_records,
            documents: self.documents,
            narratives: self.narratives,
            media: self.media,
            total: self.total(),
            year: self.year.as_deref(),
            is_aggregate: self.is_aggregate,
        }
        .serialize(serializer)
    }
}

pub(crate) fn decode_at(value: &Value, path: &str) -> ValidationResult<Count> {
    let mut issues = IssueCollector::default();
    let Some(object) = value.as_object() else {
        issues.push(path, "type", "expected an object");
        return issues.finish(Count::default());
    };

    let mut count = Count::default();
    for bucket in Bucket::ALL {
        let key = bucket.name();
        match object.get(key) {
            Some(Value::Number(number)) => match tally_number(number) {
                Some(tally) => *count.tally_mut(bucket) = tally,
                None => issues.push(format!("{path}.{key}"), "tally", "expected a non-negative integer"),
            },
            Some(_) => issues.push(format!("{path}.{key}"), "type", "expected a number"),
            None => issues.push(format!("{path}.{key}"), "required", "missing tally"),
        }
    }

    check_total(&count, path, &mut issues);

    match object.get("year") {
        None => {}
        Some(Value::String(label)) => count.year = Some(label.clone()),
        Some(_) => issues.push(format!("{path}.year"), "type", "expected a string or no year"),
    }

    match object.get("is_aggregate") {
        None => {}
        Some(Value::Bool(flag)) => count.is_aggregate = *flag,
        Some(_) => issues.push(format!("{path}.is_aggregate"), "type", "expected a boolean"),
    }

    issues.finish(count)
}

fn check_total(count: &Count, path: &str, issues: &mut IssueCollector) {
    if count.checked_total().is_none() {
        issues.push(format!("{path}.total"), "tally", "tallies sum past the largest representable total");
    }
}

fn tally_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => tally_number(number),
        _ => None,
    }
}

fn tally_number(number: &serde_json::Number) -> Option<u64> {
    if let Some(tally) = number.as_u64() {
        return Some(tally);
    }
    number
        .as_f64()
        .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64)
        .map(|n| n as u64)
}
