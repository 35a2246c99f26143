//! # Antenna Monitor & Control Fabric
//!
//! Telemetry and command plumbing for an array of antenna controllers:
//!
//! - **Motion Controller** ([`motion`]) - one thread per antenna: polls the
//!   hardware, publishes monitor points and executes queued commands,
//!   including closed-loop elevation moves.
//! - **Monitor Point Bus** ([`bus`]) - ingests every controller's points,
//!   persists them to a daily file and rebroadcasts them to filtered TCP
//!   subscribers.
//! - **Command Distribution Server** ([`command`]) - routes operator lines
//!   from the console and from TCP clients onto bounded per-antenna queues.
//!
//! All cross-thread traffic goes through queues; each piece of state has a
//! single owning thread. [`fabric::Fabric`] wires it together and tears it
//! down in order.

pub mod bus;
pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod fabric;
pub mod logging;
pub mod motion;
pub mod net;
pub mod queue;
pub mod storage;
