//! End-to-end pipeline tests: file in, transformed file out.

use std::io::Write;
use std::path::PathBuf;

use scrub_core::pipeline::{self, NormalizeOptions, Plan, ResourceKind};
use scrub_core::{CsvCodec, DatasetCodec, WktBackend};

fn write_csv(dir: &std::path::Path, content: &str) -> PathBuf {
    let path = dir.join("input.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn test_csv_through_full_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        dir.path(),
        "id,name,joined,phone\n\
         1,Ελληνική Δημοκρατία,19-09-2015,+30 210-1234567\n\
         2,plain value,11/11/2015,210 7654321\n",
    );

    let codec = CsvCodec::new(None);
    let dataset = codec.read(&path).unwrap();

    let mut options = NormalizeOptions::new(ResourceKind::Csv);
    options.transliteration = vec!["name".to_string()];
    options.transliteration_lang = Some("el".to_string());
    options.date_normalization = vec!["joined".to_string()];
    options.phone_normalization = vec!["phone".to_string()];
    options.phone_exit_code = Some("00".to_string());
    options.column_name_normalization = true;

    let plan = Plan::from_options(&options).unwrap();
    let result = pipeline::run(dataset, &plan, &WktBackend);
    assert!(result.success, "{:?}", result.error);
    let dataset = result.dataset.unwrap();

    // Greek became Latin, other rows untouched; order preserved.
    assert_eq!(
        dataset.column_values("name").unwrap(),
        vec!["Elliniki Dimokratia", "plain value"]
    );
    // Dates reformatted to the default dd/mm/yyyy.
    assert_eq!(
        dataset.column_values("joined").unwrap(),
        vec!["19/09/2015", "11/11/2015"]
    );
    // Phone numbers cleaned, exit code substituted for +.
    assert_eq!(
        dataset.column_values("phone").unwrap(),
        vec!["00302101234567", "2107654321"]
    );
}

#[test]
fn test_written_output_preserves_row_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path(), "name\nGamma\nAlpha\nBeta\n");

    let codec = CsvCodec::new(None);
    let dataset = codec.read(&path).unwrap();

    let mut options = NormalizeOptions::new(ResourceKind::Csv);
    options.case_normalization = vec!["name".to_string()];

    let plan = Plan::from_options(&options).unwrap();
    let result = pipeline::run(dataset, &plan, &WktBackend);
    let dataset = result.dataset.unwrap();

    let out_dir = tempfile::tempdir().unwrap();
    let artifact = codec.write(&dataset, out_dir.path(), "out").unwrap();

    let reread = codec.read(&artifact).unwrap();
    assert_eq!(
        reread.column_values("name").unwrap(),
        vec!["gamma", "alpha", "beta"]
    );
}

#[test]
fn test_failure_reports_offending_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path(), "name\nvalue\n");

    let codec = CsvCodec::new(None);
    let dataset = codec.read(&path).unwrap();

    let mut options = NormalizeOptions::new(ResourceKind::Csv);
    options.date_normalization = vec!["created_at".to_string()];

    let plan = Plan::from_options(&options).unwrap();
    let result = pipeline::run(dataset, &plan, &WktBackend);

    assert!(!result.success);
    assert!(result.dataset.is_none());
    let message = result.error.unwrap();
    assert!(message.contains("created_at"), "{message}");
}

#[test]
fn test_wkt_column_normalized_in_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(
        dir.path(),
        "geometry;label\nPOLYGON((0 0,0 2,2 2,2 0));area\nPOINT(1 1);spot\n",
    );

    let codec = CsvCodec::new(Some(b';'));
    let dataset = codec.read(&path).unwrap();

    let mut options = NormalizeOptions::new(ResourceKind::Csv);
    options.csv_delimiter = Some(';');
    options.wkt_normalization = vec!["geometry".to_string()];

    let plan = Plan::from_options(&options).unwrap();
    let result = pipeline::run(dataset, &plan, &WktBackend);
    assert!(result.success);

    let dataset = result.dataset.unwrap();
    let values = dataset.column_values("geometry").unwrap();
    // The open ring was closed and the polygon rewritten canonically.
    assert!(values[0].starts_with("POLYGON"));
    assert!(values[0].matches("0 0").count() >= 2, "{}", values[0]);
    assert!(values[1].starts_with("POINT"));
}
