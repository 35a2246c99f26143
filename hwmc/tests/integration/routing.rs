use std::io::Cursor;

use hwmc::command::console::PROMPT;
use hwmc::command::{CommandRouter, RouteOutcome, run_console};
use hwmc_common::command::Command;
use hwmc_common::shutdown::Shutdown;

use super::support::{ant, queues};

fn router(count: u16) -> (CommandRouter, Shutdown) {
    let stop = Shutdown::new();
    (CommandRouter::new(queues(count, 5), stop.clone()), stop)
}

#[test]
fn every_antenna_receives_only_its_own_commands() {
    let (router, _stop) = router(110);
    for id in 1..=110u16 {
        assert_eq!(
            router.route(&format!("{id} move up")),
            RouteOutcome::Queued(1)
        );
    }
    for id in router.antennas().collect::<Vec<_>>() {
        let queue = router.queue(id).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.try_pop(), Some(Command::new("move", ["up"])));
    }
}

#[test]
fn all_and_zero_reach_every_antenna_once() {
    let (router, _stop) = router(110);
    assert_eq!(router.route("all brake on"), RouteOutcome::Queued(110));
    assert_eq!(router.route("0 nd a off"), RouteOutcome::Queued(110));
    for id in 1..=110 {
        let queue = router.queue(ant(id)).unwrap();
        assert_eq!(queue.try_pop(), Some(Command::new("brake", ["on"])));
        assert_eq!(queue.try_pop(), Some(Command::new("nd", ["a", "off"])));
        assert!(queue.is_empty());
    }
}

#[test]
fn unknown_targets_change_nothing() {
    let (router, stop) = router(3);
    for line in ["111 move up", "4 move up", "ant1 move up", "-1 move up", "7"] {
        assert_eq!(router.route(line), RouteOutcome::Discarded, "{line}");
    }
    assert!(router.antennas().all(|id| router.queue(id).unwrap().is_empty()));
    assert!(!stop.is_triggered());
}

#[test]
fn stop_is_idempotent_and_closes_intake() {
    let (router, stop) = router(3);
    assert_eq!(router.route("STOP"), RouteOutcome::Shutdown);
    assert!(stop.is_triggered());
    assert_eq!(router.route("stop"), RouteOutcome::Shutdown);
    assert_eq!(router.route("2 move up"), RouteOutcome::Discarded);
    assert!(router.queue(ant(2)).unwrap().is_empty());
}

#[test]
fn console_session_routes_until_stop() {
    let (router, stop) = router(2);
    let input = Cursor::new("1 Move 45\n\nall help\nstop\n2 move down\n");
    let mut output = Vec::new();
    run_console(input, &mut output, &router, &stop);

    assert!(stop.is_triggered());
    let one = router.queue(ant(1)).unwrap();
    assert_eq!(one.try_pop(), Some(Command::new("move", ["45"])));
    assert_eq!(one.try_pop(), Some(Command::new("help", Vec::<String>::new())));
    let two = router.queue(ant(2)).unwrap();
    assert_eq!(two.len(), 1);
    assert!(String::from_utf8(output).unwrap().starts_with(PROMPT));
}

#[test]
fn verb_first_client_lines_reach_the_same_queues() {
    let (router, _stop) = router(110);
    assert_eq!(router.route("move 42 up"), RouteOutcome::Queued(1));
    assert_eq!(router.route("nd all a on"), RouteOutcome::Queued(110));
    let queue = router.queue(ant(42)).unwrap();
    assert_eq!(queue.try_pop(), Some(Command::new("move", ["up"])));
    assert_eq!(queue.try_pop(), Some(Command::new("nd", ["a", "on"])));
    assert_eq!(router.queue(ant(41)).unwrap().len(), 1);
}
