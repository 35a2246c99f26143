use std::io::Write;
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use hwmc::bus::{BroadcastServer, BusHandle, MonitorBus};
use hwmc::config::MonitorConfig;
use hwmc_common::monitor::{Mjd, MonitorPointSet, MonitorValue};
use hwmc_common::shutdown::Shutdown;
use tempfile::TempDir;

use super::support::{next_line, subscriber_reader};

fn sample(source: &str, elevation: f64) -> MonitorPointSet {
    MonitorPointSet {
        timestamp: Mjd::now(),
        source: source.into(),
        points: vec![
            ("ant_el", MonitorValue::Float(elevation)),
            ("brake", MonitorValue::Bool(true)),
            ("drive_state", MonitorValue::Int(0)),
        ],
    }
}

#[test]
fn subscribers_see_only_what_they_asked_for() {
    let dir = TempDir::new().unwrap();
    let config = MonitorConfig {
        file_prefix: dir.path().join("mp-"),
        idle_wait_ms: 10,
        ..MonitorConfig::default()
    };
    let (bus, ingest) = BusHandle::channel();
    let (fanout_tx, fanout_rx) = flume::unbounded();
    let monitor = MonitorBus::new(&config, ingest, fanout_tx).unwrap();
    let server = BroadcastServer::bind("127.0.0.1:0", fanout_rx, 256).unwrap();
    let addr = server.local_addr();

    let bus_stop = Shutdown::new();
    let server_stop = Shutdown::new();
    let producers_stop = Shutdown::new();
    let bus_thread = {
        let token = bus_stop.clone();
        thread::spawn(move || monitor.run(&token))
    };
    let server_thread = {
        let token = server_stop.clone();
        thread::spawn(move || server.run(&token))
    };
    let producers: Vec<_> = ["ant3", "ant4", "ant5"]
        .into_iter()
        .map(|source| {
            let bus = bus.clone();
            let stop = producers_stop.clone();
            thread::spawn(move || {
                let mut elevation = 10.0;
                while !stop.wait_timeout(Duration::from_millis(5)) {
                    bus.post(sample(source, elevation));
                    elevation += 0.5;
                }
            })
        })
        .collect();

    let mut picky = TcpStream::connect(addr).unwrap();
    picky
        .write_all(b"ANT3,ant_el\nnot a filter\nant4,BRAKE\n")
        .unwrap();
    let silent = TcpStream::connect(addr).unwrap();

    let mut reader = subscriber_reader(&picky);
    let (mut elevations, mut brakes) = (0, 0);
    for _ in 0..500 {
        if elevations >= 5 && brakes >= 5 {
            break;
        }
        let Some(line) = next_line(&mut reader) else {
            continue;
        };
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 4, "{line}");
        match (fields[1], fields[2]) {
            ("ant3", "ant_el") => elevations += 1,
            ("ant4", "brake") => {
                assert_eq!(fields[3], "1");
                brakes += 1;
            }
            other => panic!("unexpected record {other:?} in '{line}'"),
        }
    }
    assert!(elevations >= 5 && brakes >= 5);

    // No filters, no records.
    let mut silent_reader = subscriber_reader(&silent);
    assert_eq!(next_line(&mut silent_reader), None);

    producers_stop.trigger();
    for producer in producers {
        producer.join().unwrap();
    }
    server_stop.trigger();
    server_thread.join().unwrap().unwrap();
    bus_stop.trigger();
    drop(bus);
    bus_thread.join().unwrap();
}
