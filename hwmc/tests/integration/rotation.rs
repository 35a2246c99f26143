use std::fs;

use chrono::{NaiveDate, TimeZone, Utc};
use hwmc::bus::{BusHandle, MonitorBus};
use hwmc::config::MonitorConfig;
use hwmc_common::monitor::{Mjd, MonitorPointSet, MonitorValue};
use hwmc_common::shutdown::Shutdown;
use tempfile::TempDir;

fn set_at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, source: &str) -> MonitorPointSet {
    let at = Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap();
    MonitorPointSet {
        timestamp: Mjd::from_datetime(at),
        source: source.into(),
        points: vec![
            ("ant_el", MonitorValue::Float(45.0)),
            ("brake", MonitorValue::Bool(true)),
        ],
    }
}

#[test]
fn records_land_in_the_file_of_their_utc_date() {
    let dir = TempDir::new().unwrap();
    let config = MonitorConfig {
        file_prefix: dir.path().join("mp-"),
        idle_wait_ms: 10,
        ..MonitorConfig::default()
    };
    let (bus, ingest) = BusHandle::channel();
    let (fanout, fanout_rx) = flume::unbounded();
    let day_one = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let monitor = MonitorBus::open_for(&config, ingest, fanout, day_one).unwrap();

    assert!(bus.post(set_at(2024, 1, 1, 23, 59, 59, "ant1")));
    assert!(bus.post(set_at(2024, 1, 2, 0, 0, 1, "ant2")));
    drop(bus);
    monitor.run(&Shutdown::new());

    let first = fs::read_to_string(dir.path().join("mp-2024-01-01.mp")).unwrap();
    let second = fs::read_to_string(dir.path().join("mp-2024-01-02.mp")).unwrap();
    assert_eq!(first.lines().count(), 2);
    assert!(first.lines().all(|l| l.contains(",ant1,")));
    assert_eq!(second.lines().count(), 2);
    assert!(second.lines().all(|l| l.contains(",ant2,")));
    assert!(second.contains(",ant2,brake,1"));

    // Nothing is lost on the way to subscribers either.
    assert_eq!(fanout_rx.try_iter().count(), 4);
}

#[test]
fn queued_sets_are_drained_on_shutdown() {
    let dir = TempDir::new().unwrap();
    let config = MonitorConfig {
        file_prefix: dir.path().join("mp-"),
        idle_wait_ms: 10,
        ..MonitorConfig::default()
    };
    let (bus, ingest) = BusHandle::channel();
    let (fanout, _fanout_rx) = flume::unbounded();
    let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    let monitor = MonitorBus::open_for(&config, ingest, fanout, day).unwrap();

    for _ in 0..50 {
        bus.post(set_at(2024, 3, 5, 12, 0, 0, "ant9"));
    }
    let shutdown = Shutdown::new();
    shutdown.trigger();
    monitor.run(&shutdown);

    let text = fs::read_to_string(dir.path().join("mp-2024-03-05.mp")).unwrap();
    assert_eq!(text.lines().count(), 100);
    drop(bus);
}
