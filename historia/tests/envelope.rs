use historia::{Bucket, Count, ParseOptions, ResultEnvelope, Status, TotalRowPolicy};
use serde_json::{Value, json};

fn fixture() -> Value {
    serde_json::from_str(include_str!("fixtures/search_payload.json")).expect("fixture is valid JSON")
}

fn envelope_with_rows(rows: Vec<Count>) -> ResultEnvelope {
    let value = json!({
        "structures": [], "people": [], "archival_records": [], "documents": [],
        "narratives": [], "media": [],
        "counts": rows.iter().map(|row| serde_json::to_value(row).unwrap()).collect::<Vec<_>>(),
    });
    ResultEnvelope::decode(&value).expect("envelope should decode")
}

#[test]
fn parse_fixture_routes_census_records() {
    let response = ResultEnvelope::parse(&fixture());
    assert_eq!(response.status(), Status::Success);
    assert_eq!(response.message(), "Success");

    let envelope = response.into_payload().unwrap();
    let archival: Vec<_> = envelope.archival_records().iter().map(|r| r["id"].clone()).collect();
    assert_eq!(archival, vec![json!("doc-1"), json!("doc-3")]);
    let documents: Vec<_> = envelope.documents().iter().map(|r| r["id"].clone()).collect();
    assert_eq!(documents, vec![json!("doc-2"), json!("doc-4")]);
    assert_eq!(envelope.structures().len(), 2);
    assert_eq!(envelope.people().len(), 2);
    assert_eq!(envelope.media().len(), 1);
    assert_eq!(envelope.narratives().len(), 1);
    assert_eq!(envelope.record_count(), 10);
}

#[test]
fn parse_fixture_drops_total_row() {
    let envelope = ResultEnvelope::parse(&fixture()).into_payload().unwrap();
    let years: Vec<_> = envelope.counts().iter().map(|c| c.year.clone()).collect();
    assert_eq!(years, vec![Some("1900".to_string()), Some("1950".to_string())]);
    assert!(envelope.counts().iter().all(|c| !c.is_aggregate));

    let aggregate = envelope.aggregate().unwrap();
    assert_eq!(aggregate.total(), 10);
    assert_eq!(envelope.preferred_total(), Some(aggregate));
}

#[test]
fn retained_total_row_is_kept_out_of_counts() {
    let options = ParseOptions {
        total_row: TotalRowPolicy::Retain,
    };
    let envelope = ResultEnvelope::parse_with(&fixture(), options).into_payload().unwrap();
    assert_eq!(envelope.counts().len(), 2);
    let source_total = envelope.source_total().unwrap();
    assert!(source_total.is_aggregate);
    assert_eq!(source_total.year, None);
    assert_eq!(source_total.total(), 10);
}

#[test]
fn parse_empty_object_yields_empty_success() {
    let response = ResultEnvelope::parse(&json!({}));
    assert!(!response.is_error());
    assert_eq!(response.message(), "No results found");
    assert!(response.payload().unwrap().is_empty());
}

#[test]
fn parse_null_or_falsy_sections_yield_empty_success() {
    for raw in [json!(null), json!({"results": null, "count": [1]}), json!({"results": {"a": []}, "count": 0})] {
        let response = ResultEnvelope::parse(&raw);
        assert!(!response.is_error());
        assert!(response.payload().unwrap().is_empty());
    }
}

#[test]
fn parse_empty_results_is_invalid_results_format() {
    let response = ResultEnvelope::parse(&json!({"results": {}, "count": []}));
    assert!(response.is_error());
    assert_eq!(response.status(), Status::Error);
    assert_eq!(response.message(), "invalid results format");
    assert!(response.payload().is_none());
}

#[test]
fn parse_results_array_is_invalid_results_format() {
    let response = ResultEnvelope::parse(&json!({"results": [1, 2], "count": [{}]}));
    assert_eq!(response.message(), "invalid results format");
}

#[test]
fn parse_empty_count_is_invalid_count_format() {
    let response = ResultEnvelope::parse(&json!({"results": {"buildings": []}, "count": []}));
    assert!(response.is_error());
    assert_eq!(response.message(), "invalid count format");
}

#[test]
fn parse_bad_tally_is_reported() {
    let payload = json!({
        "results": {"buildings": []},
        "count": [{"year": "1900", "buildings": 1}, {"year": "1950", "media": "many"}]
    });
    let response = ResultEnvelope::parse(&payload);
    let details = response.error().and_then(|cause| cause.details()).unwrap();
    assert!(details.has_field("count[1].media"));
}

#[test]
fn response_serializes_as_descriptor() {
    let value = serde_json::to_value(ResultEnvelope::parse(&json!({"results": {}, "count": [1]}))).unwrap();
    assert_eq!(value["isError"], json!(true));
    assert_eq!(value["status"], json!("Error"));
    assert_eq!(value["payload"], json!(null));
    assert_eq!(value["error"]["message"], json!("invalid results format"));
}

#[test]
fn filter_empty_envelope_never_fails() {
    let filtered = ResultEnvelope::empty().filter_by_year("1900").unwrap();
    assert!(filtered.is_empty());
}

#[test]
fn filter_fixture_by_year() {
    let envelope = ResultEnvelope::parse(&fixture()).into_payload().unwrap();
    let filtered = envelope.filter_by_year("1900").unwrap();

    assert_eq!(filtered.structures().len(), 1);
    assert_eq!(filtered.people().len(), 1);
    assert_eq!(filtered.archival_records().len(), 1);
    assert_eq!(filtered.documents().len(), 1);
    assert_eq!(filtered.media().len(), 1);
    assert!(filtered.narratives().is_empty());
    assert_eq!(filtered.counts().len(), 1);
    assert_eq!(filtered.aggregate().unwrap().total(), 5);

    assert_eq!(envelope.structures().len(), 2);
}

#[test]
fn filter_with_non_numeric_year_matches_nothing() {
    let envelope = ResultEnvelope::parse(&fixture()).into_payload().unwrap();
    let filtered = envelope.filter_by_year("circa").unwrap();
    assert!(filtered.is_empty());
}

#[test]
fn filter_with_trailing_noise_uses_leading_digits() {
    let envelope = ResultEnvelope::parse(&fixture()).into_payload().unwrap();
    let filtered = envelope.filter_by_year("1950s").unwrap();
    assert_eq!(filtered.structures().len(), 1);
    assert_eq!(filtered.structures()[0]["id"], json!("bldg-40"));
}

#[test]
fn filter_with_empty_year_is_an_error() {
    assert!(ResultEnvelope::empty().filter_by_year("").is_err());
}

#[test]
fn aggregate_of_empty_counts_is_none() {
    assert_eq!(ResultEnvelope::empty().aggregate(), None);
}

#[test]
fn aggregate_sums_each_tally() {
    let envelope = envelope_with_rows(vec![
        Count {
            structures: 1,
            people: 2,
            year: Some("1900".to_string()),
            ..Count::default()
        },
        Count {
            structures: 3,
            people: 4,
            year: Some("1950".to_string()),
            ..Count::default()
        },
    ]);

    let aggregate = envelope.aggregate().unwrap();
    assert!(aggregate.is_aggregate);
    assert_eq!(aggregate.structures, 4);
    assert_eq!(aggregate.people, 6);
    assert_eq!(aggregate.total(), 10);
    assert_eq!(aggregate.year, None);
    assert_eq!(envelope.counts().len(), 2);
}

#[test]
fn count_from_source_ignores_embedded_year() {
    let source = json!({"year": "ignored", "buildings": 5, "people": 0, "census_records": 0,
        "documents": 0, "media": 0, "stories": 0});
    let count = Count::from_source(&source, Some("1950"));
    assert_eq!(count.year.as_deref(), Some("1950"));
    assert_eq!(count.tally(Bucket::Structures), 5);
}

#[test]
fn matches_shape_rejects_non_sequence_bucket() {
    let envelope = ResultEnvelope::parse(&fixture()).into_payload().unwrap();
    let mut value = serde_json::to_value(&envelope).unwrap();
    assert!(ResultEnvelope::matches_shape(&value));

    value["people"] = json!({"per-3": {}});
    assert!(!ResultEnvelope::matches_shape(&value));
}

#[test]
fn matches_shape_rejects_non_numeric_tally() {
    let envelope = ResultEnvelope::parse(&fixture()).into_payload().unwrap();
    let mut value = serde_json::to_value(&envelope).unwrap();
    value["counts"][1]["narratives"] = json!("1");
    assert!(!ResultEnvelope::matches_shape(&value));

    let err = ResultEnvelope::decode(&value).unwrap_err();
    assert!(err.has_field("counts[1].narratives"));
}

#[test]
fn matches_shape_rejects_non_objects() {
    assert!(!ResultEnvelope::matches_shape(&json!(null)));
    assert!(!ResultEnvelope::matches_shape(&json!([])));
    assert!(ResultEnvelope::matches_shape(&serde_json::to_value(ResultEnvelope::empty()).unwrap()));
}
