//! Command Distribution Server.
//!
//! - [`router`] - Target resolution and enqueueing, shared by both ingress paths
//! - [`console`] - Interactive stdin ingress
//! - [`server`] - TCP ingress

pub mod console;
pub mod router;
pub mod server;

pub use console::run_console;
pub use router::{CommandRouter, RouteOutcome};
pub use server::CommandServer;
