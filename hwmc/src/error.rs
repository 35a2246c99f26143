//! Startup and server errors.
//!
//! Steady-state failures are logged where they happen and never reach
//! these types; everything here aborts startup or ends a server thread.

use std::io;

use hwmc_common::config::ConfigError;
use hwmc_common::hal::driver::DriverError;
use thiserror::Error;

/// A TCP server could not start.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot start server runtime: {0}")]
    Runtime(#[source] io::Error),
}

/// Anything that stops the fabric from coming up.
#[derive(Debug, Error)]
pub enum FabricError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("hardware discovery failed: {0}")]
    Discovery(#[from] DriverError),

    #[error("cannot open {what} file: {source}")]
    Persistence {
        what: &'static str,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("cannot install signal handler: {0}")]
    Signal(String),

    #[error("cannot spawn {name} thread: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },
}
