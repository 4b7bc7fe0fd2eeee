#![cfg(feature = "excel_test_writer")]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use air_sample_ingest::ingestion::excel::read_workbook;
use air_sample_ingest::ingestion::{
    ingest, ingest_from_path, normalize, ExcelSheetSelection, IngestionOptions,
};
use air_sample_ingest::types::{Cell, CollectionMetadata, Period, RawUpload};
use air_sample_ingest::IngestionError;
use chrono::NaiveDate;
use rust_xlsxwriter::Workbook;

fn tmp_file(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("air-sample-ingest-{name}-{nanos}.xlsx"))
}

fn meta() -> CollectionMetadata {
    CollectionMetadata::new(NaiveDate::from_ymd_opt(2024, 9, 9).unwrap(), "Ginásio", Period::Afternoon)
}

/// Header in row 0 (`headers`), then one row per entry of `rows` (`None` leaves the cell blank).
fn workbook_bytes(headers: &[&str], rows: &[&[Option<&str>]]) -> Vec<u8> {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("Dados").unwrap();

    for (c, h) in headers.iter().enumerate() {
        ws.write_string(0, c as u16, *h).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let (r, c) = (r as u32 + 1, c as u16);
            if let Some(v) = cell {
                match v.parse::<f64>() {
                    Ok(n) => ws.write_number(r, c, n).unwrap(),
                    Err(_) => ws.write_string(r, c, *v).unwrap(),
                };
            }
        }
    }

    wb.save_to_buffer().unwrap()
}

#[test]
fn excel_named_columns_in_any_order() {
    let bytes = workbook_bytes(
        &["CO2", "Temperatura", "Umidade", "Obs"],
        &[
            &[Some("400"), Some("20"), Some("50"), Some("ok")],
            &[Some("440"), Some("24"), Some("54"), None],
        ],
    );
    let record = ingest(&RawUpload::new("coleta.xlsx", bytes), &meta(), &IngestionOptions::default()).unwrap();
    assert_eq!(record.temperature(), 22.0);
    assert_eq!(record.humidity(), 52.0);
    assert_eq!(record.co2(), 420.0);
    assert_eq!(record.site(), "Ginásio");
}

#[test]
fn excel_text_and_blank_cells_drop_the_row() {
    let bytes = workbook_bytes(
        &["temperatura", "umidade", "co2"],
        &[
            &[Some("20"), Some("50"), Some("400")],
            &[Some("22"), Some("60"), Some("bad")],
            &[Some("30"), None, Some("500")],
        ],
    );
    let record = ingest(&RawUpload::new("c.xlsx", bytes), &meta(), &IngestionOptions::default()).unwrap();
    assert_eq!(record.temperature(), 20.0);
    assert_eq!(record.co2(), 400.0);
}

#[test]
fn excel_keeps_numeric_cells_numeric() {
    let bytes = workbook_bytes(&["a", "b", "c"], &[&[Some("1.5"), Some("x"), None]]);
    let table = read_workbook(&bytes, &ExcelSheetSelection::First).unwrap();
    assert_eq!(table.columns, vec!["a", "b", "c"]);
    assert_eq!(table.rows[0], vec![Cell::Number(1.5), Cell::Text("x".to_string()), Cell::Empty]);
}

#[test]
fn excel_with_two_columns_is_insufficient() {
    let bytes = workbook_bytes(&["temperatura", "umidade"], &[&[Some("20"), Some("50")]]);
    let err = normalize(&RawUpload::new("c.xlsx", bytes), &IngestionOptions::default()).unwrap_err();
    assert!(matches!(err, IngestionError::InsufficientColumns { .. }));
}

#[test]
fn excel_header_only_is_empty_input() {
    let bytes = workbook_bytes(&["temperatura", "umidade", "co2"], &[]);
    let err = normalize(&RawUpload::new("c.xlsx", bytes), &IngestionOptions::default()).unwrap_err();
    assert!(matches!(err, IngestionError::EmptyInput));
}

#[test]
fn excel_named_sheet_selection() {
    let mut wb = Workbook::new();
    let first = wb.add_worksheet();
    first.set_name("Resumo").unwrap();
    first.write_string(0, 0, "vazio").unwrap();
    let second = wb.add_worksheet();
    second.set_name("Medidas").unwrap();
    for (c, h) in ["temperatura", "umidade", "co2"].iter().enumerate() {
        second.write_string(0, c as u16, *h).unwrap();
    }
    second.write_number(1, 0, 19.0).unwrap();
    second.write_number(1, 1, 65.0).unwrap();
    second.write_number(1, 2, 480.0).unwrap();
    let bytes = wb.save_to_buffer().unwrap();

    let opts = IngestionOptions {
        excel_sheet_selection: ExcelSheetSelection::Sheet("Medidas".to_string()),
        ..Default::default()
    };
    let record = ingest(&RawUpload::new("multi.xlsx", bytes.clone()), &meta(), &opts).unwrap();
    assert_eq!(record.co2(), 480.0);

    // The first sheet has a header but no data.
    let err = ingest(&RawUpload::new("multi.xlsx", bytes), &meta(), &IngestionOptions::default())
        .unwrap_err();
    assert!(matches!(err, IngestionError::EmptyInput));
}

#[test]
fn excel_from_path() {
    let path = tmp_file("path");
    let bytes = workbook_bytes(&["temperatura", "umidade", "co2"], &[&[Some("21"), Some("55"), Some("410")]]);
    std::fs::write(&path, bytes).unwrap();

    let record = ingest_from_path(&path, &meta(), &IngestionOptions::default()).unwrap();
    assert_eq!(record.humidity(), 55.0);

    let _ = std::fs::remove_file(&path);
}
