mod common;

use std::{fs, str::FromStr};

use common::{Harness, SAMPLE_FLOW};
use d0010_ingest::{report::LineDiagnostic, ImportError, ImportOptions, Importer};
use readings_client::{
    db::{directory_queries, reading_queries},
    domain::RegisterType,
};
use rust_decimal::Decimal;
use time::macros::date;

async fn counts(h: &Harness) -> (i64, i64, i64, i64) {
    (
        directory_queries::count_meter_points(&h.pool).await.unwrap(),
        directory_queries::count_meters(&h.pool).await.unwrap(),
        directory_queries::count_flow_files(&h.pool).await.unwrap(),
        reading_queries::count_readings(&h.pool).await.unwrap(),
    )
}

#[tokio::test]
async fn sample_flow_file_imports_point_meter_and_readings() {
    let h = Harness::new().await;
    let path = h.write_flow_file("DTC_0001.txt", &SAMPLE_FLOW);

    let report = h.importer().import_file(&path).await.unwrap();

    assert_eq!(report.filename, "DTC_0001.txt");
    assert_eq!((report.created, report.updated), (2, 0));
    assert_eq!((report.meter_points_created, report.meters_created), (1, 1));
    assert_eq!(report.ignored_lines, 2);
    assert!(report.skipped.is_empty());
    assert!(report.overwritten.is_empty());
    assert_eq!(counts(&h).await, (1, 1, 1, 2));

    let point = directory_queries::find_meter_point(&h.pool, "1234567890123").await.unwrap().unwrap();
    let meter = directory_queries::find_meter(&h.pool, "METER001").await.unwrap().unwrap();
    assert_eq!(meter.meter_point_id, point.id);

    let readings = reading_queries::readings_for_meter(&h.pool, meter.id).await.unwrap();
    let summary: Vec<_> = readings
        .iter()
        .map(|r| (r.reading_date, r.value.to_string(), r.register_type, r.register_id.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (date!(2024 - 01 - 01), "1234.56".to_string(), RegisterType::Standard, "00000"),
            (date!(2024 - 01 - 02), "1235.67".to_string(), RegisterType::Standard, "00000"),
        ]
    );
    assert!(readings.iter().all(|r| r.flow_file_id == report.flow_file_id));
}

#[tokio::test]
async fn reimport_overwrites_provenance_without_duplicating() {
    let h = Harness::new().await;
    let path = h.write_flow_file("DTC_0001.txt", &SAMPLE_FLOW);
    let importer = h.importer();

    let first = importer.import_file(&path).await.unwrap();
    let second = importer.import_file(&path).await.unwrap();

    assert_eq!((second.created, second.updated), (0, 2));
    assert_eq!((second.meter_points_created, second.meters_created), (0, 0));
    assert_ne!(first.flow_file_id, second.flow_file_id);
    assert_eq!(counts(&h).await, (1, 1, 2, 2));

    let notices: Vec<_> = second
        .overwritten
        .iter()
        .map(|n| (n.line_number, n.serial_number.as_str(), n.reading_date))
        .collect();
    assert_eq!(
        notices,
        vec![(2, "METER001", date!(2024 - 01 - 01)), (3, "METER001", date!(2024 - 01 - 02))]
    );

    let meter = directory_queries::find_meter(&h.pool, "METER001").await.unwrap().unwrap();
    let readings = reading_queries::readings_for_meter(&h.pool, meter.id).await.unwrap();
    assert!(readings.iter().all(|r| r.flow_file_id == second.flow_file_id));
    assert_eq!(readings[0].value, Decimal::from_str("1234.56").unwrap());
    assert_eq!(readings[1].value, Decimal::from_str("1235.67").unwrap());
}

#[tokio::test]
async fn later_value_wins_for_the_same_natural_key() {
    let h = Harness::new().await;
    let importer = h.importer();
    let a = h.write_flow_file("a.txt", &["030|1|1234567890123|S|METER001|20240101|S|kWh|00000|100.00|"]);
    let b = h.write_flow_file("b.txt", &["030|1|1234567890123|S|METER001|20240101|S|kWh|00000|150.25|"]);

    importer.import_file(&a).await.unwrap();
    let report = importer.import_file(&b).await.unwrap();
    assert_eq!(report.updated, 1);

    let meter = directory_queries::find_meter(&h.pool, "METER001").await.unwrap().unwrap();
    let stored = reading_queries::find_reading(&h.pool, meter.id, date!(2024 - 01 - 01), RegisterType::Standard, "00000")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.value.to_string(), "150.25");
    assert_eq!(stored.flow_file_id, report.flow_file_id);
    assert_eq!(reading_queries::count_readings(&h.pool).await.unwrap(), 1);
}

#[tokio::test]
async fn malformed_lines_are_skipped_and_the_rest_imported() {
    let h = Harness::new().await;
    let path = h.write_flow_file(
        "mixed.txt",
        &[
            "ZHV|P|NDLO001|UDMS|Z|20240101|202401011430|",
            "030|1|1234567890123|S|METER001|20240101|S|kWh|00000|1.00|",
            "030|1||S|METER001|20240102|S|kWh|00000|2.00|",
            "030|1|1234567890123|S|METER001|2024-01-03|S|kWh|00000|3.00|",
            "",
            "030|1|1234567890123|S|METER001|20240104|S|kWh|00000|four|",
            "030|1|1234567890123|S|METER001|20240105|X|kWh|00000|5.00|",
            "030|1|1234567890123|S|METER001|20240106|S|kWh|00000|6.00|",
            "ZPT|000008|",
        ],
    );

    let report = h.importer().import_file(&path).await.unwrap();

    assert_eq!(report.imported(), 2);
    assert_eq!(
        report.skipped,
        vec![
            LineDiagnostic { line_number: 3, reason: "missing required field(s): mpan".to_string() },
            LineDiagnostic { line_number: 4, reason: "invalid date format: 2024-01-03".to_string() },
            LineDiagnostic { line_number: 6, reason: "invalid reading value: four".to_string() },
            LineDiagnostic { line_number: 7, reason: "unknown register type: X".to_string() },
        ]
    );
    assert_eq!(counts(&h).await, (1, 1, 1, 2));
}

#[tokio::test]
async fn header_and_trailer_only_still_records_the_flow_file() {
    let h = Harness::new().await;
    let path = h.write_flow_file("empty.txt", &[SAMPLE_FLOW[0], SAMPLE_FLOW[3]]);

    let report = h.importer().import_file(&path).await.unwrap();

    assert_eq!(report.imported(), 0);
    assert!(report.skipped.is_empty());
    assert_eq!(report.ignored_lines, 2);
    assert_eq!(counts(&h).await, (0, 0, 1, 0));
}

#[tokio::test]
async fn blank_register_fields_default() {
    let h = Harness::new().await;
    let path = h.write_flow_file("defaults.txt", &["030|1|1234567890123|S|METER001|20240101||kWh||42|"]);

    let report = h.importer().import_file(&path).await.unwrap();
    assert_eq!(report.created, 1);

    let meter = directory_queries::find_meter(&h.pool, "METER001").await.unwrap().unwrap();
    let stored = reading_queries::find_reading(&h.pool, meter.id, date!(2024 - 01 - 01), RegisterType::Standard, "00000")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.value.to_string(), "42.00");
}

#[tokio::test]
async fn day_and_night_registers_are_stored_separately() {
    let h = Harness::new().await;
    let path = h.write_flow_file(
        "e7.txt",
        &[
            "030|1|1234567890123|S|METER001|20240101|E|kWh|00001|100.00|",
            "030|1|1234567890123|S|METER001|20240101|N|kWh|00002|50.00|",
        ],
    );

    let report = h.importer().import_file(&path).await.unwrap();
    assert_eq!(report.created, 2);

    let meter = directory_queries::find_meter(&h.pool, "METER001").await.unwrap().unwrap();
    let types: Vec<_> = reading_queries::readings_for_meter(&h.pool, meter.id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.register_type)
        .collect();
    assert_eq!(types, [RegisterType::Day, RegisterType::Night]);
}

#[tokio::test]
async fn short_reading_lines_are_silent_unless_configured() {
    let lines = [
        "030|1|1234567890123|S|METER001|20240101|S|kWh|00000",
        "030|1|1234567890123|S|METER001|20240102|S|kWh|00000|2.00|",
    ];

    let h = Harness::new().await;
    let path = h.write_flow_file("short.txt", &lines);
    let report = h.importer().import_file(&path).await.unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(report.short_reading_lines, 1);
    assert!(report.skipped.is_empty());

    let (h, importer) = Harness::with_options(ImportOptions {
        report_short_reading_lines: true,
    })
    .await;
    let path = h.write_flow_file("short.txt", &lines);
    let report = importer.import_file(&path).await.unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(
        report.skipped,
        vec![LineDiagnostic {
            line_number: 1,
            reason: "reading record has 9 fields, expected at least 10".to_string(),
        }]
    );
}

#[tokio::test]
async fn meter_keeps_first_meter_point_across_files() {
    let h = Harness::new().await;
    let importer = h.importer();
    let a = h.write_flow_file("a.txt", &["030|1|1111111111111|S|METER001|20240101|S|kWh|00000|1.00|"]);
    let b = h.write_flow_file("b.txt", &["030|1|2222222222222|S|METER001|20240102|S|kWh|00000|2.00|"]);

    importer.import_file(&a).await.unwrap();
    let report = importer.import_file(&b).await.unwrap();
    assert_eq!((report.meter_points_created, report.meters_created), (1, 0));

    let first = directory_queries::find_meter_point(&h.pool, "1111111111111").await.unwrap().unwrap();
    let meter = directory_queries::find_meter(&h.pool, "METER001").await.unwrap().unwrap();
    assert_eq!(meter.meter_point_id, first.id);
    assert_eq!(counts(&h).await, (2, 1, 2, 2));
}

#[tokio::test]
async fn persistence_failure_rolls_back_only_that_line() {
    let h = Harness::new().await;
    sqlx::query(
        r#"
        CREATE TRIGGER reject_broken_meter BEFORE INSERT ON meters
        WHEN NEW.serial_number = 'BROKEN'
        BEGIN
            SELECT RAISE(ABORT, 'meter rejected');
        END;
        "#,
    )
    .execute(&h.pool)
    .await
    .unwrap();

    let path = h.write_flow_file(
        "partial.txt",
        &[
            "030|1|1234567890123|S|METER001|20240101|S|kWh|00000|1.00|",
            "030|1|9999999999999|S|BROKEN|20240101|S|kWh|00000|2.00|",
            "030|1|1234567890123|S|METER001|20240102|S|kWh|00000|3.00|",
        ],
    );

    let report = h.importer().import_file(&path).await.unwrap();

    assert_eq!(report.created, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].line_number, 2);
    assert!(report.skipped[0].reason.contains("meter rejected"));
    // The meter point created for line 2 went with its savepoint.
    assert!(directory_queries::find_meter_point(&h.pool, "9999999999999").await.unwrap().is_none());
    assert_eq!(counts(&h).await, (1, 1, 1, 2));
}

#[tokio::test]
async fn unreadable_content_rolls_back_the_whole_file() {
    let h = Harness::new().await;
    let importer = h.importer();
    let good = h.write_flow_file("good.txt", &SAMPLE_FLOW);
    importer.import_file(&good).await.unwrap();

    let bad = h.dir.path().join("bad.txt");
    let mut bytes = b"030|1|5555555555555|S|METER555|20240101|S|kWh|00000|1.00|\n".to_vec();
    bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
    fs::write(&bad, bytes).unwrap();

    let err = importer.import_file(&bad).await.unwrap_err();
    assert!(matches!(err, ImportError::Read { line: 2, .. }));
    assert!(err.rolled_back());

    // Nothing from bad.txt survived, including its flow file; good.txt is intact.
    assert!(directory_queries::find_meter(&h.pool, "METER555").await.unwrap().is_none());
    assert_eq!(counts(&h).await, (1, 1, 1, 2));
}

#[tokio::test]
async fn missing_files_are_skipped_and_others_still_imported() {
    let h = Harness::new().await;
    let good = h.write_flow_file("good.txt", &SAMPLE_FLOW);
    let missing = h.dir.path().join("nonexistent.txt");

    let results = h.importer().import_files(&[missing.clone(), good.clone()][..]).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, missing);
    match &results[0].1 {
        Err(e @ ImportError::Open { .. }) => assert!(!e.rolled_back()),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(results[1].0, good);
    assert_eq!(results[1].1.as_ref().unwrap().imported(), 2);
    assert_eq!(counts(&h).await, (1, 1, 1, 2));
}

/// 200 readings over 60 meters on 10 meter points; each meter always sits on
/// the same point.
fn overlapping_flow(value: &str) -> Vec<String> {
    (0..200)
        .map(|i| {
            let meter = i % 60;
            format!(
                "030|1|{}|S|METER{meter:03}|202401{:02}|S|kWh|00000|{value}|",
                1_000_000_000_000u64 + meter as u64 % 10,
                i / 60 + 1,
            )
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_imports_do_not_duplicate_entities() {
    let h = Harness::new().await;
    let a_lines = overlapping_flow("1.00");
    let b_lines = overlapping_flow("2.00");
    let a = h.write_flow_file("a.txt", &a_lines.iter().map(String::as_str).collect::<Vec<_>>());
    let b = h.write_flow_file("b.txt", &b_lines.iter().map(String::as_str).collect::<Vec<_>>());

    let first = h.importer();
    let second = Importer::new(h.connect_again().await, ImportOptions::default());
    let (ra, rb) = tokio::join!(first.import_file(&a), second.import_file(&b));
    let (ra, rb) = (ra.unwrap(), rb.unwrap());

    assert!(ra.skipped.is_empty(), "{:?}", ra.skipped);
    assert!(rb.skipped.is_empty(), "{:?}", rb.skipped);
    assert_eq!(ra.created + rb.created, 200);
    assert_eq!(ra.imported() + rb.imported(), 400);
    assert_eq!(ra.meter_points_created + rb.meter_points_created, 10);
    assert_eq!(ra.meters_created + rb.meters_created, 60);
    assert_eq!(counts(&h).await, (10, 60, 2, 200));
}
