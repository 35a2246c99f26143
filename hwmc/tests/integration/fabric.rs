use std::fs;
use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::time::Duration;

use hwmc::config::FabricConfig;
use hwmc::context::FabricContext;
use hwmc::error::FabricError;
use hwmc::fabric::Fabric;
use hwmc_hal::DriverRegistry;
use tempfile::TempDir;

use super::support::{fast_simulation, next_line, subscriber_reader};

const DRIVER: &str = "fast-simulation";

fn registry() -> DriverRegistry {
    let mut registry = DriverRegistry::new();
    registry.register(DRIVER, fast_simulation);
    registry
}

fn config(dir: &Path) -> FabricConfig {
    let mut config = FabricConfig::default();
    config.logging.file_prefix = dir.join("log-");
    config.monitor.file_prefix = dir.join("mp-");
    config.monitor.bind = "127.0.0.1:0".to_string();
    config.monitor.idle_wait_ms = 10;
    config.command.bind = "127.0.0.1:0".to_string();
    config.command.console = false;
    config.hardware.driver = DRIVER.to_string();
    config.hardware.antennas = 3;
    config.hardware.polling_interval_ms = 50;
    config.motion.drive_rate_deg_per_min = 600.0;
    config.motion.sub_tick_ms = 10;
    config.motion.timeout_s = 10.0;
    config.shutdown.grace_ms = 0;
    config.validate().unwrap();
    config
}

#[test]
fn commands_in_monitor_points_out_then_orderly_stop() {
    let dir = TempDir::new().unwrap();
    let context = FabricContext::new();
    let fabric = Fabric::start(&config(dir.path()), &registry(), context.clone()).unwrap();
    assert_eq!(fabric.router().antennas().count(), 3);

    let mut subscriber = TcpStream::connect(fabric.monitor_addr()).unwrap();
    subscriber.write_all(b"ant2,brake\nant3,ant_el\n").unwrap();
    let mut reader = subscriber_reader(&subscriber);

    let mut operator = TcpStream::connect(fabric.command_addr()).unwrap();
    operator.write_all(b"2 brake off\n3 move 43\n").unwrap();

    let (mut released, mut arrived) = (false, false);
    for _ in 0..200 {
        if released && arrived {
            break;
        }
        let Some(line) = next_line(&mut reader) else {
            continue;
        };
        let fields: Vec<&str> = line.split(',').collect();
        match (fields[1], fields[2]) {
            ("ant2", "brake") => released |= fields[3] == "0",
            ("ant3", "ant_el") => {
                let elevation: f64 = fields[3].parse().unwrap();
                arrived |= (elevation - 43.0).abs() <= 0.2;
            }
            other => panic!("unexpected record {other:?}"),
        }
    }
    assert!(released, "brake release never published");
    assert!(arrived, "antenna 3 never reached 43 deg");

    operator.write_all(b"stop\n").unwrap();
    fabric.wait();
    assert!(context.stop_requested());
    fabric.shutdown();
    assert!(context.bus.is_triggered());

    let mut persisted = String::new();
    for entry in fs::read_dir(dir.path()).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().is_some_and(|ext| ext == "mp") {
            persisted.push_str(&fs::read_to_string(path).unwrap());
        }
    }
    for source in ["ant1", "ant2", "ant3"] {
        assert!(persisted.contains(&format!(",{source},ant_el,")), "{source}");
    }
    assert!(persisted.contains(",ant2,brake,0"));
}

#[test]
fn unknown_driver_fails_before_anything_starts() {
    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path());
    config.hardware.driver = "labjack".to_string();
    let result = Fabric::start(&config, &registry(), FabricContext::new());
    assert!(matches!(result, Err(FabricError::Discovery(_))));
}

#[test]
fn occupied_command_port_is_reported() {
    let dir = TempDir::new().unwrap();
    let taken = TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = config(dir.path());
    config.command.bind = taken.local_addr().unwrap().to_string();
    let result = Fabric::start(&config, &registry(), FabricContext::new());
    assert!(matches!(result, Err(FabricError::Server(_))));
}

#[test]
fn signal_style_stop_shuts_down_an_idle_fabric() {
    let dir = TempDir::new().unwrap();
    let context = FabricContext::new();
    let fabric = Fabric::start(&config(dir.path()), &registry(), context.clone()).unwrap();
    std::thread::sleep(Duration::from_millis(100));
    assert!(context.request_stop());
    assert!(!context.request_stop());
    fabric.wait();
    fabric.shutdown();
}
