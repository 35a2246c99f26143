//! Process-wide cancellation tokens, one per shutdown stage.
//!
//! Built once in `main` and handed to each component at construction.

use hwmc_common::shutdown::Shutdown;

/// Shutdown stages, triggered in field order.
#[derive(Debug, Clone, Default)]
pub struct FabricContext {
    /// Console and command server. Triggered by a `stop` line or SIGINT.
    pub intake: Shutdown,
    /// Motion controllers; aborts a move in progress.
    pub controllers: Shutdown,
    /// Monitor broadcast server.
    pub broadcast: Shutdown,
    /// Monitor bus; it drains what is queued before exiting.
    pub bus: Shutdown,
}

impl FabricContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a global shutdown. Safe to call any number of times.
    pub fn request_stop(&self) -> bool {
        self.intake.trigger()
    }

    /// Whether a global shutdown has been requested.
    pub fn stop_requested(&self) -> bool {
        self.intake.is_triggered()
    }
}
