//! Normalized search results: six record buckets plus per-year tallies.
//!
//! ```text
//! raw payload ──parse──▶ Response<ResultEnvelope> ──filter_by_year──▶ ResultEnvelope
//!                                               └──aggregate──────▶ Count
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::count::{self, Bucket, Count};
use crate::errors::{EnvelopeError, IssueCollector, ParseError, ValidationError, ValidationResult};
use crate::normalizers::{parse_int_prefix, truthy_field};
use crate::response::{NO_RESULTS_MESSAGE, Response, SUCCESS_MESSAGE};

/// Document category that is routed into the archival records bucket.
pub const CENSUS_CATEGORY: &str = "Census Records";

/// A single search hit. Opaque apart from its integer `year` and, for documents, its `category`.
pub type Record = Value;

/// What to do with the summary row the API labels `"Total"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalRowPolicy {
    /// Drop the row; totals are always recomputed from the per-year rows.
    #[default]
    Discard,
    /// Keep the row aside as [`ResultEnvelope::source_total`]. It never joins `counts`.
    Retain,
}

/// Knobs for [`ResultEnvelope::parse_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub total_row: TotalRowPolicy,
}

/// Immutable bundle of normalized search results.
///
/// Every transformation returns a new envelope; none mutate the receiver.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultEnvelope {
    structures: Vec<Record>,
    people: Vec<Record>,
    archival_records: Vec<Record>,
    documents: Vec<Record>,
    narratives: Vec<Record>,
    media: Vec<Record>,
    counts: Vec<Count>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_total: Option<Count>,
}

impl ResultEnvelope {
    /// Envelope with every bucket and `counts` empty.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a raw search payload with the default options.
    pub fn parse(raw: &Value) -> Response<Self> {
        Self::parse_with(raw, ParseOptions::default())
    }

    /// Parses a raw search payload.
    ///
    /// A payload without a truthy `results` or `count` section is not an error: it
    /// yields an empty envelope with a "no results" message. Malformed sections are
    /// reported through the error variant of the returned [`Response`].
    pub fn parse_with(raw: &Value, options: ParseOptions) -> Response<Self> {
        let (Some(results), Some(count)) = (truthy_field(raw, "results"), truthy_field(raw, "count")) else {
            log::debug!("search payload has no results or count section");
            return Response::success(Self::empty(), NO_RESULTS_MESSAGE);
        };

        let results = match results.as_object() {
            Some(map) if !map.is_empty() => map,
            _ => return Response::failure(ParseError::InvalidResults { details: None }),
        };

        let rows = match count {
            Value::Array(rows) if !rows.is_empty() => rows,
            Value::Object(map) if !map.is_empty() => {
                return Response::failure(ParseError::InvalidCount {
                    details: Some(ValidationError::single(
                        "count",
                        "type",
                        "expected a sequence of count rows",
                    )),
                });
            }
            _ => return Response::failure(ParseError::InvalidCount { details: None }),
        };

        let envelope = match Self::decode_results(results) {
            Ok(envelope) => envelope,
            Err(details) => {
                return Response::failure(ParseError::InvalidResults { details: Some(details) });
            }
        };

        match decode_count_rows(rows, options.total_row) {
            Ok((counts, source_total)) => {
                let envelope = ResultEnvelope {
                    counts,
                    source_total,
                    ..envelope
                };
                log::debug!(
                    "parsed search payload: {} records across {} year rows",
                    envelope.record_count(),
                    envelope.counts.len()
                );
                Response::success(envelope, SUCCESS_MESSAGE)
            }
            Err(details) => Response::failure(ParseError::InvalidCount { details: Some(details) }),
        }
    }

    fn decode_results(results: &Map<String, Value>) -> ValidationResult<Self> {
        let mut issues = IssueCollector::default();
        let mut take = |bucket: Bucket| -> Vec<Record> {
            let key = bucket.source_key();
            match results.get(key) {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(records)) => records.clone(),
                Some(_) => {
                    issues.push(format!("results.{key}"), "type", "expected a sequence of records");
                    Vec::new()
                }
            }
        };

        let structures = take(Bucket::Structures);
        let people = take(Bucket::People);
        let all_documents = take(Bucket::Documents);
        let narratives = take(Bucket::Narratives);
        let media = take(Bucket::Media);

        let (archival_records, documents): (Vec<Record>, Vec<Record>) = all_documents.into_iter().partition(is_census_record);

        issues.finish(ResultEnvelope {
            structures,
            people,
            archival_records,
            documents,
            narratives,
            media,
            ..Self::default()
        })
    }

    /// Decodes a serialized envelope, reporting every structural problem found.
    pub fn decode(value: &Value) -> ValidationResult<Self> {
        let mut issues = IssueCollector::default();
        let Some(object) = value.as_object() else {
            issues.push("envelope", "type", "expected an object");
            return issues.finish(Self::empty());
        };

        let mut envelope = Self::empty();
        for bucket in Bucket::ALL {
            let key = bucket.name();
            match object.get(key) {
                Some(Value::Array(records)) => *envelope.bucket_mut(bucket) = records.clone(),
                Some(_) => issues.push(key, "type", "expected an array"),
                None => issues.push(key, "required", "missing bucket"),
            }
        }

        match object.get("counts") {
            Some(Value::Array(rows)) => {
                for (index, row) in rows.iter().enumerate() {
                    match count::decode_at(row, &format!("counts[{index}]")) {
                        Ok(count) => envelope.counts.push(count),
                        Err(err) => issues.extend(err),
                    }
                }
            }
            Some(_) => issues.push("counts", "type", "expected an array"),
            None => issues.push("counts", "required", "missing counts"),
        }

        if let Some(total) = object.get("source_total") {
            match count::decode_at(total, "source_total") {
                Ok(count) => envelope.source_total = Some(count),
                Err(err) => issues.extend(err),
            }
        }

        issues.finish(envelope)
    }

    /// True if `value` has the structure of a serialized envelope.
    pub fn matches_shape(value: &Value) -> bool {
        Self::decode(value).is_ok()
    }

    /// True if every bucket and `counts` is empty.
    pub fn is_empty(&self) -> bool {
        Bucket::ALL.iter().all(|bucket| self.bucket(*bucket).is_empty()) && self.counts.is_empty()
    }

    /// Keeps only records and count rows belonging to `year`.
    ///
    /// `year` is read with lenient integer parsing; a string with no leading digits
    /// matches nothing and produces an empty envelope. An empty string is a caller
    /// error. Records match only when their `year` is a number equal to the target.
    ///
    /// Count rows carry string labels such as `"1900"`. A strict equality check would
    /// never keep one, so a row is kept when its label parses exactly to the target
    /// integer (`"1900"` matches 1900, `"1900s"` does not). A retained source total is
    /// not carried over, since it spans all years.
    pub fn filter_by_year(&self, year: &str) -> Result<Self, EnvelopeError> {
        if year.is_empty() {
            return Err(EnvelopeError::InvalidYear { value: year.to_string() });
        }

        let target = parse_int_prefix(year);
        log::debug!(
            "filtering envelope by year {year:?} (parsed {target:?}), {} structures before filter",
            self.structures.len()
        );

        let keep = |records: &[Record]| -> Vec<Record> {
            match target {
                Some(target) => records.iter().filter(|record| record_year_is(record, target)).cloned().collect(),
                None => Vec::new(),
            }
        };

        let counts = match target {
            Some(target) => self
                .counts
                .iter()
                .filter(|count| count.year.as_deref().and_then(|label| label.parse::<i64>().ok()) == Some(target))
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        Ok(ResultEnvelope {
            structures: keep(&self.structures),
            people: keep(&self.people),
            archival_records: keep(&self.archival_records),
            documents: keep(&self.documents),
            narratives: keep(&self.narratives),
            media: keep(&self.media),
            counts,
            source_total: None,
        })
    }

    /// Sums every year row into a single aggregate count.
    ///
    /// Returns `None` when there are no rows. Always recomputed from `counts`.
    pub fn aggregate(&self) -> Option<Count> {
        if self.counts.is_empty() {
            return None;
        }

        let mut total = Count {
            is_aggregate: true,
            ..Count::default()
        };
        for row in &self.counts {
            total += row;
        }
        Some(total)
    }

    /// The API's own total when it was retained, otherwise [`ResultEnvelope::aggregate`].
    pub fn preferred_total(&self) -> Option<Count> {
        self.source_total.clone().or_else(|| self.aggregate())
    }

    pub fn bucket(&self, bucket: Bucket) -> &[Record] {
        match bucket {
            Bucket::Structures => &self.structures,
            Bucket::People => &self.people,
            Bucket::ArchivalRecords => &self.archival_records,
            Bucket::Documents => &self.documents,
            Bucket::Narratives => &self.narratives,
            Bucket::Media => &self.media,
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<Record> {
        match bucket {
            Bucket::Structures => &mut self.structures,
            Bucket::People => &mut self.people,
            Bucket::ArchivalRecords => &mut self.archival_records,
            Bucket::Documents => &mut self.documents,
            Bucket::Narratives => &mut self.narratives,
            Bucket::Media => &mut self.media,
        }
    }

    pub fn structures(&self) -> &[Record] {
        &self.structures
    }

    pub fn people(&self) -> &[Record] {
        &self.people
    }

    pub fn archival_records(&self) -> &[Record] {
        &self.archival_records
    }

    pub fn documents(&self) -> &[Record] {
        &self.documents
    }

    pub fn narratives(&self) -> &[Record] {
        &self.narratives
    }

    pub fn media(&self) -> &[Record] {
        &self.media
    }

    pub fn counts(&self) -> &[Count] {
        &self.counts
    }

    /// The API supplied total, present only under [`TotalRowPolicy::Retain`].
    pub fn source_total(&self) -> Option<&Count> {
        self.source_total.as_ref()
    }

    /// Number of records across all six buckets.
    pub fn record_count(&self) -> usize {
        Bucket::ALL.iter().map(|bucket| self.bucket(*bucket).len()).sum()
    }
}

fn is_census_record(record: &Record) -> bool {
    record.get("category").and_then(Value::as_str) == Some(CENSUS_CATEGORY)
}

fn record_year_is(record: &Record, year: i64) -> bool {
    match record.get("year") {
        Some(Value::Number(number)) => number.as_i64() == Some(year) || number.as_f64() == Some(year as f64),
        _ => false,
    }
}

type DecodedRows = (Vec<Count>, Option<Count>);

fn decode_count_rows(rows: &[Value], policy: TotalRowPolicy) -> ValidationResult<DecodedRows> {
    let mut issues = IssueCollector::default();
    let mut counts = Vec::with_capacity(rows.len());
    let mut source_total = None;

    for (index, row) in rows.iter().enumerate() {
        let path = format!("count[{index}]");
        let is_total_row = row.get("year").and_then(Value::as_str).is_some_and(Count::is_total_label);

        if is_total_row && policy == TotalRowPolicy::Discard {
            log::debug!("discarding source total row at {path}");
            continue;
        }

        match Count::decode_source_row(row, &path) {
            Ok(mut count) if is_total_row => {
                count.year = None;
                count.is_aggregate = true;
                source_total = Some(count);
            }
            Ok(count) => counts.push(count),
            Err(err) => issues.extend(err),
        }
    }

    issues.finish((counts, source_total))
}
