//! End-to-end tests for the scan-processing pipeline.

use motion_scan_agent::config::Config;
use motion_scan_agent::pipeline::ScanPipeline;
use motion_scan_agent::stats::create_shared_stats;
use std::time::{Duration, Instant};

fn test_config(capacity: usize) -> Config {
    Config {
        window_capacity: capacity,
        ..Config::default()
    }
}

/// Poll until `predicate` holds or the deadline passes.
fn wait_for(mut predicate: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !predicate() {
        assert!(Instant::now() < deadline, "condition not met in time");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_stream_split_across_chunks_reaches_window_and_subscribers() {
    let stats = create_shared_stats();
    let mut pipeline = ScanPipeline::new(&test_config(8), stats.clone());
    let receiver = pipeline.subscribe().expect("pipeline not started yet");
    let window = pipeline.window();
    let sender = pipeline.chunk_sender();
    pipeline.start().unwrap();

    // A realistic serial dump: noise, a complete scan, a scan split across
    // two chunks, and two scans sharing one chunk.
    let chunks = [
        "wifi driver: beacon loss",
        "[DEBUG] accelerometer.cpp L.39 log_acc : ST m:  10041 c:  57 x:  228 y:  270 z:  -369 EN ",
        "[DEBUG] accelerometer.cpp L.39 log_acc : ST m: 10141 c: 58 x:",
        " 230 y: 268 z: -371 EN ",
        "ST m: 10241 c: 59 x: 1 y: 2 z: 3 EN ST m: 10341 c: 60 x: 4 y: 5 z: 6 EN",
    ];
    for chunk in chunks {
        sender.send(chunk.to_string()).unwrap();
    }

    // All four records arrive at the subscriber, in emission order.
    let mut counters = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(2);
    while counters.len() < 4 {
        match receiver.recv_deadline(deadline) {
            Ok(record) => counters.push(record.counter),
            Err(_) => break,
        }
    }
    assert_eq!(
        counters,
        vec![Some(57), Some(58), Some(59), Some(60)]
    );

    // The window holds them in chronological order, fully annotated.
    wait_for(|| window.latest().map(|row| row.counter == 60.0).unwrap_or(false));
    let snapshot = window.snapshot();
    assert_eq!(snapshot.len(), 8);
    let tail: Vec<f64> = snapshot[4..].iter().map(|row| row.counter).collect();
    assert_eq!(tail, vec![57.0, 58.0, 59.0, 60.0]);
    assert!(snapshot[7].magnitude.is_finite());
    assert!(snapshot[0].is_unfilled());

    pipeline.stop();

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.scans_parsed, 4);
    assert_eq!(snapshot.chunks_rejected, 1);
    assert!(snapshot.fragments_carried >= 2);
}

#[test]
fn test_window_keeps_only_most_recent_rows() {
    let mut pipeline = ScanPipeline::new(&test_config(4), create_shared_stats());
    let window = pipeline.window();
    let sender = pipeline.chunk_sender();
    pipeline.start().unwrap();

    for i in 0..20i64 {
        let chunk = format!("ST m: {} c: {} x: 1 y: 1 z: 1 EN", i * 100, i);
        sender.send(chunk).unwrap();
    }

    wait_for(|| window.latest().map(|row| row.counter == 19.0).unwrap_or(false));

    let snapshot = window.snapshot();
    assert_eq!(snapshot.len(), 4);
    let counters: Vec<f64> = snapshot.iter().map(|row| row.counter).collect();
    assert_eq!(counters, vec![16.0, 17.0, 18.0, 19.0]);

    pipeline.stop();
}

#[test]
fn test_malformed_fields_flow_through_without_dropping_records() {
    let stats = create_shared_stats();
    let mut pipeline = ScanPipeline::new(&test_config(4), stats.clone());
    let window = pipeline.window();
    let sender = pipeline.chunk_sender();
    pipeline.start().unwrap();

    // y is absent and z is garbled; the record must still arrive.
    sender
        .send("ST m: 10041 c: 57 x: 228 z: oops EN".to_string())
        .unwrap();

    wait_for(|| window.latest().map(|row| row.counter == 57.0).unwrap_or(false));

    let row = window.latest().unwrap();
    assert_eq!(row.x, 228.0);
    assert!(row.y.is_nan());
    assert!(row.z.is_nan());
    // Derived columns stay unfilled when an axis is missing.
    assert!(row.magnitude.is_nan());

    pipeline.stop();
    assert_eq!(stats.snapshot().scans_parsed, 1);
    assert_eq!(stats.snapshot().fields_missing, 2);
}

#[test]
fn test_consumer_reads_idle_stream_without_blocking() {
    let mut pipeline = ScanPipeline::new(&test_config(6), create_shared_stats());
    let window = pipeline.window();
    pipeline.start().unwrap();

    // No data fed at all: snapshots are immediately available, full-size,
    // and unfilled.
    let snapshot = window.snapshot();
    assert_eq!(snapshot.len(), 6);
    assert!(snapshot.iter().all(|row| row.is_unfilled()));
    assert!(window.latest().unwrap().is_unfilled());

    pipeline.stop();
}

#[test]
fn test_stop_terminates_producer_promptly() {
    let mut pipeline = ScanPipeline::new(&test_config(4), create_shared_stats());
    let window = pipeline.window();
    let sender = pipeline.chunk_sender();
    pipeline.start().unwrap();

    sender
        .send("ST m: 1 c: 1 x: 1 y: 1 z: 1 EN".to_string())
        .unwrap();
    wait_for(|| window.latest().map(|row| row.counter == 1.0).unwrap_or(false));

    pipeline.stop();
    assert!(!pipeline.is_running());

    // Chunks sent after shutdown are simply never consumed; the window is
    // left at its final state.
    let _ = sender.send("ST m: 2 c: 2 x: 1 y: 1 z: 1 EN".to_string());
    assert_eq!(window.latest().unwrap().counter, 1.0);
}
