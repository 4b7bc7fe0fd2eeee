use air_sample_ingest::ingestion::csv::{parse_delimited, HeaderMode, DEFAULT_DELIMITERS};
use air_sample_ingest::ingestion::{ingest, ingest_from_path, normalize, IngestionOptions};
use air_sample_ingest::processing::{coerce, reduce};
use air_sample_ingest::types::{CollectionMetadata, Period, RawUpload};
use air_sample_ingest::IngestionError;
use chrono::NaiveDate;

fn meta(site: &str) -> CollectionMetadata {
    CollectionMetadata::new(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(), site, Period::Morning)
}

fn csv_upload(text: &str) -> RawUpload {
    RawUpload::new("upload.csv", text)
}

#[test]
fn ingest_csv_from_path_happy_path() {
    // The extra `hora` column is ignored and the row with a blank temperature is dropped.
    let record = ingest_from_path(
        "tests/fixtures/sala_manha.csv",
        &meta("Sala 12"),
        &IngestionOptions::default(),
    )
    .unwrap();

    assert_eq!(record.temperature(), 22.0);
    assert_eq!(record.humidity(), 56.0);
    assert_eq!(record.co2(), 420.0);
    assert_eq!(record.site(), "Sala 12");
    assert_eq!(record.period(), Period::Morning);
}

#[test]
fn comma_delimiter_selected_for_header_and_two_rows() {
    let (table, strategy) =
        parse_delimited("temperatura,umidade,co2\n10,20,30\n11,21,31", &DEFAULT_DELIMITERS).unwrap();
    assert_eq!(strategy.delimiter, b',');
    assert_eq!(strategy.header, HeaderMode::Header);

    let triple = coerce(&table).unwrap();
    assert_eq!(triple.len(), 2);
}

#[test]
fn permuting_named_columns_does_not_change_means() {
    let opts = IngestionOptions::default();
    let a = normalize(&csv_upload("temperatura,umidade,co2\n20,50,400\n24,54,440\n"), &opts).unwrap();
    let b = normalize(&csv_upload("co2,temperatura,umidade\n400,20,50\n440,24,54\n"), &opts).unwrap();
    let c = normalize(&csv_upload("UMIDADE ; Co2 ; Temperatura\n50;400;20\n54;440;24\n"), &opts).unwrap();

    let ra = reduce(&a).unwrap();
    assert_eq!(ra, reduce(&b).unwrap());
    assert_eq!(ra, reduce(&c).unwrap());
    assert_eq!(ra.temperature, 22.0);
    assert_eq!(ra.humidity, 52.0);
    assert_eq!(ra.co2, 420.0);
}

#[test]
fn unlabeled_columns_map_left_to_right() {
    let table = normalize(
        &csv_upload("a,b,c\n1,2,3\n"),
        &IngestionOptions::default(),
    )
    .unwrap();
    let obs = reduce(&table).unwrap();
    assert_eq!((obs.temperature, obs.humidity, obs.co2), (1.0, 2.0, 3.0));
}

#[test]
fn row_with_bad_value_is_excluded_from_all_means() {
    let record = ingest(
        &csv_upload("temperatura,umidade,co2\n20.0,50.0,400.0\n22.0,60.0,bad\n"),
        &meta("Lab"),
        &IngestionOptions::default(),
    )
    .unwrap();
    assert_eq!(record.temperature(), 20.0);
    assert_eq!(record.humidity(), 50.0);
    assert_eq!(record.co2(), 400.0);
}

#[test]
fn windows_1252_semicolon_file_matches_by_name() {
    let upload = RawUpload::from_path("tests/fixtures/patio_tarde_cp1252.csv").unwrap();
    assert_eq!(upload.filename, "patio_tarde_cp1252.csv");

    let record = ingest(&upload, &meta("Pátio"), &IngestionOptions::default()).unwrap();
    assert_eq!(record.temperature(), 26.0);
    assert_eq!(record.humidity(), 42.0);
    assert_eq!(record.co2(), 400.0);
}

#[test]
fn pipe_delimited_with_bom_and_padded_labels() {
    let record = ingest_from_path(
        "tests/fixtures/pipe_bom.csv",
        &meta("Cozinha"),
        &IngestionOptions::default(),
    )
    .unwrap();
    assert_eq!(record.temperature(), 25.0);
    assert_eq!(record.humidity(), 66.0);
    assert_eq!(record.co2(), 610.0);
}

#[test]
fn single_line_without_header_is_read_headerless() {
    let record = ingest_from_path(
        "tests/fixtures/single_row.csv",
        &meta("Corredor"),
        &IngestionOptions::default(),
    )
    .unwrap();
    assert_eq!(record.temperature(), 19.5);
    assert_eq!(record.humidity(), 70.0);
    assert_eq!(record.co2(), 500.0);
}

#[test]
fn header_mode_wins_even_for_numeric_first_line() {
    // First-match-wins: a numeric first line is still taken as the header when the header
    // parse is acceptable, so only the second line contributes.
    let table = normalize(&csv_upload("10,20,30\n11,21,31\n"), &IngestionOptions::default()).unwrap();
    assert_eq!(table.row_count(), 1);
    assert_eq!(reduce(&table).unwrap().temperature, 11.0);
}

#[test]
fn two_column_file_is_unsupported() {
    let err = ingest_from_path(
        "tests/fixtures/two_columns.csv",
        &meta("X"),
        &IngestionOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, IngestionError::UnsupportedFormat { .. }));
}

#[test]
fn all_invalid_rows_fail_with_no_valid_rows() {
    let err = ingest_from_path(
        "tests/fixtures/no_valid_rows.csv",
        &meta("X"),
        &IngestionOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, IngestionError::NoValidRows));
    assert!(err.to_string().contains("no valid numeric rows"));
}

#[test]
fn empty_file_is_empty_input() {
    let err = ingest(&csv_upload(""), &meta("X"), &IngestionOptions::default()).unwrap_err();
    assert!(matches!(err, IngestionError::EmptyInput));
}

#[test]
fn whitespace_site_is_missing_site_even_for_valid_file() {
    let err = ingest(
        &csv_upload("temperatura,umidade,co2\n20,50,400\n"),
        &meta("  "),
        &IngestionOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, IngestionError::MissingSite));
}

#[test]
fn missing_file_is_io_error() {
    let err = ingest_from_path(
        "tests/fixtures/does_not_exist.csv",
        &meta("X"),
        &IngestionOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, IngestionError::Io(_)));
}

#[test]
fn huge_finite_values_average_to_a_finite_mean() {
    let record = ingest(
        &csv_upload("temperatura,umidade,co2\n1e308,1,1\n1e308,1,1\n"),
        &meta("Lab"),
        &IngestionOptions::default(),
    )
    .unwrap();
    assert!(record.temperature().is_finite());
    assert_eq!(record.temperature(), 1e308);
    assert_eq!(record.humidity(), 1.0);
}
