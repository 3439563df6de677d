use std::fs;
use std::path::PathBuf;

use chrono::{TimeZone, Utc};

use crate::errors::{ParserError, Rejection};
use crate::model::{DataType, Measurement};
use crate::reader::{MeasurementReader, ReaderOptions, Row};
use crate::transform::{parse_timestamp, parse_value, RowOutcome, RowTransformer};

fn fixture(path: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_path = base.join("tests/data").join(path);
    fs::read_to_string(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

fn collect_outcomes(
    content: &str,
    kind: DataType,
    skip_interval: usize,
    options: &ReaderOptions,
) -> Vec<RowOutcome> {
    let mut reader =
        MeasurementReader::new(content.as_bytes(), kind, options).expect("reader should open");
    let mut transformer = RowTransformer::new(7, kind, skip_interval);
    let mut outcomes = Vec::new();
    while let Some(row) = reader.next_row().expect("row should read") {
        outcomes.push(transformer.transform(&row));
    }
    outcomes
}

fn accepted(outcomes: &[RowOutcome]) -> Vec<&Measurement> {
    outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            RowOutcome::Accepted(m) => Some(m),
            _ => None,
        })
        .collect()
}

fn row<'a>(timestamp: &'a str, value: &'a str) -> Row<'a> {
    Row::from_text(timestamp, value)
}

#[test]
fn data_type_parses_case_insensitively() {
    assert_eq!("flow".parse::<DataType>().unwrap(), DataType::Flow);
    assert_eq!(" Humidity ".parse::<DataType>().unwrap(), DataType::Humidity);
    assert_eq!("WEIGHT".parse::<DataType>().unwrap(), DataType::Weight);

    let err = "pressure".parse::<DataType>().unwrap_err();
    assert!(matches!(err, ParserError::UnknownDataType(ref name) if name == "pressure"));
}

#[test]
fn humidity_bounds_are_inclusive() {
    assert!(DataType::Humidity.validate(0.0).is_ok());
    assert!(DataType::Humidity.validate(100.0).is_ok());
    assert_eq!(DataType::Humidity.validate(-0.01), Err(Rejection::OutOfRange));
    assert_eq!(DataType::Humidity.validate(100.01), Err(Rejection::OutOfRange));
}

#[test]
fn weight_rejects_negative_values_only() {
    assert!(DataType::Weight.validate(0.0).is_ok());
    assert!(DataType::Weight.validate(88.4).is_ok());
    assert_eq!(DataType::Weight.validate(-1.0), Err(Rejection::OutOfRange));
}

#[test]
fn flow_and_temperature_are_unconstrained_but_must_be_finite() {
    assert!(DataType::Flow.validate(-500.0).is_ok());
    assert!(DataType::Temperature.validate(-40.0).is_ok());
    assert!(DataType::Temperature.validate(1.0e6).is_ok());
    assert_eq!(DataType::Flow.validate(f64::INFINITY), Err(Rejection::NotFinite));
}

#[test]
fn measurement_serializes_to_flat_document() {
    let date = Utc.with_ymd_and_hms(2017, 1, 1, 12, 30, 0).unwrap();
    let measurement = Measurement::new(3, date, DataType::Temperature, 21.5).unwrap();

    let json = serde_json::to_value(&measurement).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "hiveId": 3,
            "date": "2017-01-01T12:30:00.000Z",
            "temperature": 21.5
        })
    );
}

#[test]
fn parses_supported_timestamp_layouts() {
    let expected = Utc.with_ymd_and_hms(2017, 3, 4, 5, 6, 7).unwrap();
    assert_eq!(parse_timestamp("2017-03-04 05:06:07"), Some(expected));
    assert_eq!(parse_timestamp("2017-03-04T05:06:07"), Some(expected));
    assert_eq!(parse_timestamp("2017-03-04T05:06:07Z"), Some(expected));
    assert_eq!(parse_timestamp("2017-03-04T07:06:07+02:00"), Some(expected));
    assert_eq!(
        parse_timestamp("2017-03-04"),
        Some(Utc.with_ymd_and_hms(2017, 3, 4, 0, 0, 0).unwrap())
    );
    assert_eq!(parse_timestamp("yesterday"), None);
    assert_eq!(parse_timestamp(""), None);
}

#[test]
fn non_numeric_values_are_not_numbers() {
    assert_eq!(parse_value(" 12.5 "), Some(12.5));
    assert_eq!(parse_value("abc"), None);
    assert_eq!(parse_value(""), None);
    assert_eq!(parse_value("NaN"), None);
}

#[test]
fn non_numeric_row_is_dropped_not_raised() {
    let mut transformer = RowTransformer::new(1, DataType::Flow, 1);
    let outcome = transformer.transform(&row("2017-01-01 00:00:00", "broken"));
    assert_eq!(outcome, RowOutcome::Rejected(Rejection::InvalidNumber));
}

#[test]
fn bad_timestamp_row_is_dropped() {
    let mut transformer = RowTransformer::new(1, DataType::Flow, 1);
    let outcome = transformer.transform(&row("not a date", "12"));
    assert_eq!(outcome, RowOutcome::Rejected(Rejection::InvalidTimestamp));
}

#[test]
fn skip_interval_selects_every_kth_row() {
    let k = 4;
    let mut transformer = RowTransformer::new(1, DataType::Temperature, k);
    let outcomes: Vec<RowOutcome> = (0..2 * k)
        .map(|_| transformer.transform(&row("2017-01-01 00:00:00", "20")))
        .collect();

    let candidates: Vec<usize> = outcomes
        .iter()
        .enumerate()
        .filter(|(_, outcome)| !matches!(outcome, RowOutcome::Skipped))
        .map(|(idx, _)| idx + 1)
        .collect();
    assert_eq!(candidates, vec![4, 8]);
    assert_eq!(transformer.rows_seen(), 2 * k);
}

#[test]
fn reader_skips_blank_lines_and_drops_dirty_humidity_rows() {
    let content = fixture("humidity_dirty.csv");
    let outcomes = collect_outcomes(&content, DataType::Humidity, 1, &ReaderOptions::default());

    assert_eq!(outcomes.len(), 6);
    let values: Vec<f64> = accepted(&outcomes).iter().map(|m| m.value()).collect();
    assert_eq!(values, vec![54.2, 100.0, 0.0]);
    assert!(accepted(&outcomes).iter().all(|m| m.hive_id() == 7));
    assert_eq!(outcomes[1], RowOutcome::Rejected(Rejection::InvalidNumber));
    assert_eq!(outcomes[3], RowOutcome::Rejected(Rejection::OutOfRange));
}

#[test]
fn reader_honours_delimiter_and_tolerates_ragged_rows() {
    let content = fixture("weight_semicolon.csv");
    let options = ReaderOptions {
        delimiter: b';',
        ..ReaderOptions::default()
    };
    let outcomes = collect_outcomes(&content, DataType::Weight, 1, &options);

    assert_eq!(outcomes.len(), 4);
    let kept = accepted(&outcomes);
    assert_eq!(kept.len(), 2);
    assert_eq!(kept[1].value(), 0.0);
    assert_eq!(
        kept[1].date(),
        Utc.with_ymd_and_hms(2017, 5, 2, 8, 0, 0).unwrap()
    );
    assert_eq!(outcomes[1], RowOutcome::Rejected(Rejection::OutOfRange));
    assert_eq!(outcomes[3], RowOutcome::Rejected(Rejection::MissingField));
}

#[test]
fn reader_matches_headers_case_insensitively_with_downsampling() {
    let content = fixture("flow_downsample.csv");
    let outcomes = collect_outcomes(&content, DataType::Flow, 3, &ReaderOptions::default());

    let values: Vec<f64> = accepted(&outcomes).iter().map(|m| m.value()).collect();
    assert_eq!(values, vec![4.0, 2.0]);
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| matches!(o, RowOutcome::Skipped))
            .count(),
        4
    );
}

#[test]
fn reader_requires_value_column_for_kind() {
    let content = fixture("humidity_dirty.csv");
    let err = MeasurementReader::new(
        content.as_bytes(),
        DataType::Weight,
        &ReaderOptions::default(),
    )
    .err()
        .expect("weight column should be missing");
    assert!(matches!(err, ParserError::MissingColumn { ref column } if column == "weight"));
}

#[test]
fn reader_uses_configured_timestamp_column() {
    let content = "recorded_at,temperature\n2017-01-01 00:00:00,31.2\n";
    let options = ReaderOptions {
        timestamp_column: "recorded_at".into(),
        ..ReaderOptions::default()
    };
    let outcomes = collect_outcomes(content, DataType::Temperature, 1, &options);
    assert_eq!(accepted(&outcomes).len(), 1);

    let err = MeasurementReader::new(
        content.as_bytes(),
        DataType::Temperature,
        &ReaderOptions::default(),
    )
    .err()
        .expect("timestamp column should be missing");
    assert!(matches!(err, ParserError::MissingColumn { ref column } if column == "timestamp"));
}

#[test]
fn invalid_utf8_outside_used_columns_is_ignored() {
    let content = b"timestamp,flow,note\n\
                    2017-01-01 00:00:00,1.0,ok\n\
                    2017-01-01 00:01:00,2.0,\xff\xfe\n\
                    2017-01-01 00:02:00,3.0,ok\n";
    let options = ReaderOptions::default();
    let mut reader =
        MeasurementReader::new(&content[..], DataType::Flow, &options).expect("reader should open");
    let mut transformer = RowTransformer::new(7, DataType::Flow, 1);
    let mut values = Vec::new();
    while let Some(row) = reader.next_row().expect("row should read") {
        if let RowOutcome::Accepted(m) = transformer.transform(&row) {
            values.push(m.value());
        }
    }
    assert_eq!(values, vec![1.0, 2.0, 3.0]);
}

#[test]
fn invalid_utf8_in_value_cell_is_dropped() {
    let mut transformer = RowTransformer::new(7, DataType::Flow, 1);
    let row = Row {
        timestamp: Some(&b"2017-01-01 00:00:00"[..]),
        value: Some(&b"1.\xff"[..]),
    };
    assert_eq!(
        transformer.transform(&row),
        RowOutcome::Rejected(Rejection::InvalidEncoding)
    );
}
