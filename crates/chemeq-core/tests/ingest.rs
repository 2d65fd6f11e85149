//! End-to-end ingest tests against the SQLite store.

use std::sync::Arc;

use chemeq_core::{IngestError, Pipeline};
use chemeq_store::{Store, UploadStore};
use chemeq_types::Field;
use tokio::sync::Mutex;

const HEADER: &str = "Equipment Name,Type,Flowrate,Pressure,Temperature\n";

fn dataset(rows: &[&str]) -> Vec<u8> {
    let mut csv = HEADER.to_string();
    for row in rows {
        csv.push_str(row);
        csv.push('\n');
    }
    csv.into_bytes()
}

fn small_dataset() -> Vec<u8> {
    dataset(&["P-1,Pump,10,2,30"])
}

#[test]
fn test_three_row_dataset_summary() {
    let mut store = Store::open_in_memory().unwrap();
    let bytes = dataset(&[
        "R-1,Reactor,100,50,80",
        "P-1,Pump,60,20,30",
        "R-2,Reactor,100,45,80",
    ]);

    let upload = Pipeline::default()
        .ingest(&mut store, &bytes, "plant.csv")
        .unwrap();

    let stored = store.get(&upload.id).unwrap().unwrap();
    let summary = stored.aggregates.rounded(2);
    assert_eq!(summary.count, 3);
    assert_eq!(summary.avg_flowrate, 86.67);
    assert_eq!(summary.avg_pressure, 38.33);
    assert_eq!(summary.avg_temperature, 63.33);
    assert_eq!(summary.category_counts.get("Reactor"), Some(&2));
    assert_eq!(summary.category_counts.get("Pump"), Some(&1));
    assert_eq!(stored.records, upload.records);
}

#[test]
fn test_reactor_pump_reactor_summary() {
    let mut store = Store::open_in_memory().unwrap();
    let bytes = dataset(&[
        "A,Reactor,100,50,80",
        "B,Pump,50,10,25",
        "C,Reactor,110,55,85",
    ]);

    let upload = Pipeline::default()
        .ingest(&mut store, &bytes, "reactors.csv")
        .unwrap();

    let summary = store.get(&upload.id).unwrap().unwrap().aggregates.rounded(2);
    assert_eq!(summary.count, 3);
    assert_eq!(summary.avg_flowrate, 86.67);
    assert_eq!(summary.avg_pressure, 38.33);
    assert_eq!(summary.avg_temperature, 63.33);
    assert_eq!(summary.category_counts.get("Reactor"), Some(&2));
    assert_eq!(summary.category_counts.get("Pump"), Some(&1));
    assert_eq!(summary.category_counts.len(), 2);
}

#[test]
fn test_missing_pressure_column() {
    let mut store = Store::open_in_memory().unwrap();
    let bytes = b"Equipment Name,Type,Flowrate,Temperature\nP-1,Pump,10,30\n";

    match Pipeline::default().ingest(&mut store, bytes, "plant.csv") {
        Err(IngestError::Schema(err)) => {
            assert_eq!(err.missing_fields, [Field::Pressure].into_iter().collect());
        }
        other => panic!("expected schema error, got {other:?}"),
    }
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_bad_row_leaves_history_unchanged() {
    let mut store = Store::open_in_memory().unwrap();
    let pipeline = Pipeline::default();
    for i in 0..3 {
        pipeline
            .ingest(&mut store, &small_dataset(), &format!("ok_{i}.csv"))
            .unwrap();
    }
    let before = store.list_recent(10).unwrap();
    let records_before = store.count_records().unwrap();

    let bytes = dataset(&[
        "R-1,Reactor,100,50,80",
        "P-1,Pump,60,20,30",
        "R-2,Reactor,100,45,very hot",
    ]);
    match pipeline.ingest(&mut store, &bytes, "bad.csv") {
        Err(IngestError::RowParse(err)) => {
            assert_eq!(err.row_index, 3);
            assert_eq!(err.field, Field::Temperature);
        }
        other => panic!("expected row error, got {other:?}"),
    }

    assert_eq!(store.list_recent(10).unwrap(), before);
    assert_eq!(store.count_records().unwrap(), records_before);
}

#[test]
fn test_retention_keeps_five_newest() {
    let mut store = Store::open_in_memory().unwrap();
    let pipeline = Pipeline::default();

    let mut ids = Vec::new();
    for i in 0..8 {
        let upload = pipeline
            .ingest(&mut store, &small_dataset(), &format!("batch_{i}.csv"))
            .unwrap();
        ids.push(upload.id);
    }

    let recent = store.list_recent(10).unwrap();
    let recent_ids: Vec<_> = recent.iter().map(|u| u.id.clone()).collect();
    let expected: Vec<_> = ids.iter().rev().take(5).cloned().collect();
    assert_eq!(recent_ids, expected);
    assert!(recent.windows(2).all(|w| w[0].created_at > w[1].created_at));
    assert_eq!(store.count_records().unwrap(), 5);
    assert!(store.get(&ids[0]).unwrap().is_none());
}

#[test]
fn test_on_disk_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chemeq.db");

    let id = {
        let mut store = Store::open(&path).unwrap();
        Pipeline::default()
            .ingest(&mut store, &small_dataset(), "plant.csv")
            .unwrap()
            .id
    };

    let store = Store::open(&path).unwrap();
    assert_eq!(store.latest().unwrap().unwrap().id, id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ingests_respect_retention() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(Mutex::new(Store::open(dir.path().join("chemeq.db")).unwrap()));
    let pipeline = Pipeline::default();

    {
        let mut guard = store.lock().await;
        for i in 0..5 {
            pipeline
                .ingest(&mut *guard, &small_dataset(), &format!("seed_{i}.csv"))
                .unwrap();
        }
    }

    let mut handles = Vec::new();
    for i in 0..2 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let prepared = pipeline
                .prepare(&small_dataset(), &format!("concurrent_{i}.csv"))
                .unwrap();
            let mut guard = store.lock().await;
            pipeline.commit(&mut *guard, prepared).unwrap()
        }));
    }

    let mut new_ids = Vec::new();
    for handle in handles {
        new_ids.push(handle.await.unwrap().id);
    }

    let guard = store.lock().await;
    let recent = guard.list_recent(10).unwrap();
    assert_eq!(recent.len(), 5);
    assert_eq!(guard.count_records().unwrap(), 5);
    for id in &new_ids {
        assert!(recent.iter().any(|u| &u.id == id));
    }
    assert!(recent.windows(2).all(|w| w[0].created_at > w[1].created_at));
}
