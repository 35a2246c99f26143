use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use hwmc::bus::BusHandle;
use hwmc::command::{CommandRouter, RouteOutcome};
use hwmc::config::MotionConfig;
use hwmc::motion::{ControllerSettings, MotionController};
use hwmc::queue::CommandQueue;
use hwmc_common::shutdown::Shutdown;

use super::support::{StuckDriver, ant, eventually};

#[test]
fn full_queue_blocks_the_producer_until_the_move_ends() {
    let id = ant(6);
    let queue = Arc::new(CommandQueue::new(5));
    let router = CommandRouter::new([(id, Arc::clone(&queue))], Shutdown::new());
    let (bus, _rx) = BusHandle::channel();
    let shutdown = Shutdown::new();
    let ctrl = MotionController::new(
        id,
        Box::new(StuckDriver::default()),
        Arc::clone(&queue),
        bus,
        ControllerSettings {
            polling_interval: Duration::from_millis(20),
            motion: MotionConfig {
                timeout_s: 1.0,
                sub_tick_ms: 10,
                ..MotionConfig::default()
            },
        },
        shutdown.clone(),
    );
    let controller = thread::spawn(move || ctrl.run());

    // The stuck axis keeps the controller inside this move for a second.
    assert_eq!(router.route("6 move 60"), RouteOutcome::Queued(1));
    assert!(eventually(Duration::from_secs(2), || queue.is_empty()));

    for _ in 0..5 {
        assert_eq!(router.route("6 help"), RouteOutcome::Queued(1));
    }
    assert_eq!(queue.len(), 5);

    let done = Arc::new(AtomicBool::new(false));
    let producer = {
        let router = router.clone();
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let outcome = router.route("6 help");
            done.store(true, Ordering::SeqCst);
            outcome
        })
    };
    thread::sleep(Duration::from_millis(200));
    assert!(!done.load(Ordering::SeqCst), "sixth command did not block");

    assert!(eventually(Duration::from_secs(5), || done.load(Ordering::SeqCst)));
    assert_eq!(producer.join().unwrap(), RouteOutcome::Queued(1));

    shutdown.trigger();
    queue.close();
    controller.join().unwrap();
}
