//! Interactive command console.

use std::io::{BufRead, Write};

use hwmc_common::shutdown::Shutdown;
use tracing::{debug, info, warn};

use super::router::{CommandRouter, RouteOutcome};

/// Prompt printed before every line.
pub const PROMPT: &str = "Command: ";

/// Read and route lines until EOF, a `stop` line or `intake` is triggered.
///
/// A blocking read cannot be interrupted, so a trigger from elsewhere is
/// only noticed once the current line completes.
pub fn run_console<R, W>(input: R, mut prompt: W, router: &CommandRouter, intake: &Shutdown)
where
    R: BufRead,
    W: Write,
{
    let mut lines = input.lines();
    loop {
        if intake.is_triggered() {
            break;
        }
        let _ = write!(prompt, "{PROMPT}").and_then(|()| prompt.flush());
        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                warn!("Console read failed: {e}");
                break;
            }
            None => {
                info!("Console input closed");
                break;
            }
        };
        debug!("Command received: {line}");
        if router.route(&line) == RouteOutcome::Shutdown {
            break;
        }
    }
    debug!("Console stopped");
}
