//! Integration tests for routing reports read from a local JSON document.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use bomviz::application::services::RoutingService;
use bomviz::cli::commands::format_routing_table;
use bomviz::domain::Complexity;
use bomviz::infrastructure::traits::{FetchError, FileBomSource};
use bomviz::application::ApplicationError;

const REPORT: &str = r#"{
  "work_centers": [
    {"wc_no": "WC01", "name": "Assembly"},
    {"wc_no": "WC02", "name": "Machining"},
    {"wc_no": "WC03", "name": "Painting"}
  ],
  "routing_data": {
    "item_no": "A0001", "description": "Gearbox", "item_type": "A", "level": 0,
    "work_centers": {"WC01": 45, "WC02": 0, "WC03": 10}, "total_time": 55,
    "children": [
      {"item_no": "A0002", "description": "Shaft assembly", "item_type": "A", "level": 1,
       "work_centers": {"WC01": 20, "WC02": 15, "WC03": 0}, "total_time": 35,
       "children": [
         {"item_no": "P0001", "description": "Shaft", "item_type": "P", "level": 2,
          "work_centers": {}, "total_time": 0, "children": []}
       ]},
      {"item_no": "P0002", "description": "Housing", "item_type": "P", "level": 1,
       "work_centers": {"WC02": 30}, "total_time": 30}
    ]
  }
}"#;

fn write_report(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("routing.json");
    fs::write(&path, body).unwrap();
    path
}

#[tokio::test]
async fn given_report_file_when_fetching_then_rows_follow_preorder_and_columns() {
    let dir = TempDir::new().unwrap();
    let service = RoutingService::new(Arc::new(FileBomSource::new(write_report(&dir, REPORT))));

    let report = service
        .fetch(&Complexity::parse("complex").unwrap())
        .await
        .expect("fetch report");
    let rows = report.rows();

    let items: Vec<&str> = rows.iter().map(|r| r.item_no.as_str()).collect();
    assert_eq!(items, vec!["A0001", "A0002", "P0001", "P0002"]);
    assert_eq!(rows[0].minutes, vec![45, 0, 10]);
    assert_eq!(rows[2].minutes, vec![0, 0, 0]);
    assert_eq!(rows[3].minutes, vec![0, 30, 0]);
    assert_eq!(rows[3].level, 1);
    assert_eq!(report.total_minutes(), 120);
}

#[tokio::test]
async fn given_report_when_formatting_table_then_every_item_listed_with_legend() {
    let dir = TempDir::new().unwrap();
    let service = RoutingService::new(Arc::new(FileBomSource::new(write_report(&dir, REPORT))));
    let report = service.fetch(&Complexity::parse("complex").unwrap()).await.unwrap();

    let table = format_routing_table(&report);

    // header, four items, blank line, legend, total
    assert_eq!(table.lines().count(), 8);
    assert!(table.contains("    P0001"));
    assert!(table.contains("WC01 = Assembly, WC02 = Machining, WC03 = Painting"));
    assert!(table.ends_with("Total minutes: 120"));
}

#[tokio::test]
async fn given_missing_file_when_fetching_then_read_error() {
    let dir = TempDir::new().unwrap();
    let service = RoutingService::new(Arc::new(FileBomSource::new(dir.path().join("nope.json"))));

    let err = service
        .fetch(&Complexity::parse("simple").unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, ApplicationError::Fetch(FetchError::Read { .. })));
}

#[tokio::test]
async fn given_tree_document_when_fetching_routing_then_malformed() {
    let dir = TempDir::new().unwrap();
    let path = write_report(&dir, r#"{"item_no": "A", "cost": 1, "level": 0}"#);
    let service = RoutingService::new(Arc::new(FileBomSource::new(path)));

    let err = service
        .fetch(&Complexity::parse("simple").unwrap())
        .await
        .unwrap_err();

    assert!(err.is_malformed());
}
