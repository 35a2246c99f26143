//! Process wiring and ordered shutdown.
//!
//! Every fallible step (discovery, opening the monitor file, binding both
//! ports) happens before the first thread starts, so a startup failure
//! leaves nothing running.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use hwmc_hal::{DriverRegistry, discover};
use tracing::{error, info};

use crate::bus::{BroadcastServer, BusHandle, MonitorBus};
use crate::command::{CommandRouter, CommandServer, run_console};
use crate::config::FabricConfig;
use crate::context::FabricContext;
use crate::error::{FabricError, ServerError};
use crate::motion::{ControllerSettings, MotionController};
use crate::queue::CommandQueue;

/// A running fabric.
pub struct Fabric {
    context: FabricContext,
    router: CommandRouter,
    queues: Vec<Arc<CommandQueue>>,
    controllers: Vec<JoinHandle<()>>,
    command_server: JoinHandle<Result<(), ServerError>>,
    broadcast_server: JoinHandle<Result<(), ServerError>>,
    bus: JoinHandle<()>,
    bus_handle: BusHandle,
    command_addr: SocketAddr,
    monitor_addr: SocketAddr,
    grace: Duration,
}

fn spawn<T, F>(name: String, f: F) -> Result<JoinHandle<T>, FabricError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn(f)
        .map_err(|source| FabricError::Spawn { name, source })
}

impl Fabric {
    /// Discover the antennas and start every worker thread.
    ///
    /// The console is started only if `config.command.console` is set; it
    /// reads stdin on a detached thread.
    pub fn start(
        config: &FabricConfig,
        registry: &DriverRegistry,
        context: FabricContext,
    ) -> Result<Self, FabricError> {
        let antennas = discover(registry, &config.hardware.driver, config.hardware.antennas)?;

        let (bus_handle, ingest) = BusHandle::channel();
        let (fanout_tx, fanout_rx) = flume::unbounded();
        let bus = MonitorBus::new(&config.monitor, ingest, fanout_tx).map_err(|source| {
            FabricError::Persistence {
                what: "monitor point",
                source,
            }
        })?;
        let broadcast = BroadcastServer::bind(
            &config.monitor.bind,
            fanout_rx,
            config.monitor.subscriber_backlog,
        )?;

        let queues: Vec<_> = antennas
            .iter()
            .map(|a| (a.id, Arc::new(CommandQueue::new(config.command.queue_depth))))
            .collect();
        let router = CommandRouter::new(queues.iter().cloned(), context.intake.clone());
        let command = CommandServer::bind(&config.command.bind, router.clone())?;
        let command_addr = command.local_addr();
        let monitor_addr = broadcast.local_addr();

        let bus = {
            let token = context.bus.clone();
            spawn("mp-bus".to_string(), move || bus.run(&token))?
        };
        let broadcast_server = {
            let token = context.broadcast.clone();
            spawn("mp-server".to_string(), move || broadcast.run(&token))?
        };

        let settings = ControllerSettings::from(config);
        let mut controllers = Vec::with_capacity(antennas.len());
        for (antenna, (_, queue)) in antennas.into_iter().zip(&queues) {
            let controller = MotionController::new(
                antenna.id,
                antenna.driver,
                Arc::clone(queue),
                bus_handle.clone(),
                settings.clone(),
                context.controllers.clone(),
            );
            controllers.push(spawn(format!("ant-{}", antenna.id), move || {
                controller.run()
            })?);
        }

        let command_server = {
            let token = context.intake.clone();
            spawn("cmd-server".to_string(), move || command.run(&token))?
        };

        if config.command.console {
            let router = router.clone();
            let token = context.intake.clone();
            // Detached: a blocking stdin read cannot be interrupted.
            spawn("cmd-console".to_string(), move || {
                run_console(io::stdin().lock(), io::stdout(), &router, &token)
            })?;
        }

        info!(
            "Fabric up: {} antennas, commands on {command_addr}, monitor points on {monitor_addr}",
            controllers.len()
        );

        Ok(Self {
            context,
            router,
            queues: queues.into_iter().map(|(_, q)| q).collect(),
            controllers,
            command_server,
            broadcast_server,
            bus,
            bus_handle,
            command_addr,
            monitor_addr,
            grace: config.shutdown.grace(),
        })
    }

    /// Address of the command server.
    pub fn command_addr(&self) -> SocketAddr {
        self.command_addr
    }

    /// Address of the monitor broadcast server.
    pub fn monitor_addr(&self) -> SocketAddr {
        self.monitor_addr
    }

    /// Router shared by the console and the command server.
    pub fn router(&self) -> &CommandRouter {
        &self.router
    }

    /// Current depth of the monitor ingest queue.
    pub fn ingest_depth(&self) -> usize {
        self.bus_handle.depth()
    }

    /// Block until a global stop is requested.
    pub fn wait(&self) {
        self.context.intake.wait();
    }

    /// Stop every stage in order and join its threads.
    pub fn shutdown(self) {
        info!("Stopping command intake");
        self.context.intake.trigger();

        info!("Stopping {} antenna controllers", self.controllers.len());
        self.context.controllers.trigger();
        // Closing unblocks any router still waiting on a full queue.
        for queue in &self.queues {
            queue.close();
        }
        join_server("command server", self.command_server);
        for handle in self.controllers {
            if handle.join().is_err() {
                error!("An antenna controller panicked");
            }
        }

        thread::sleep(self.grace);
        info!("Stopping monitor broadcast server");
        self.context.broadcast.trigger();
        join_server("monitor broadcast server", self.broadcast_server);

        info!("Stopping monitor bus");
        self.context.bus.trigger();
        drop(self.bus_handle);
        if self.bus.join().is_err() {
            error!("Monitor bus panicked");
        }
        info!("All fabric threads stopped");
    }
}

fn join_server(what: &str, handle: JoinHandle<Result<(), ServerError>>) {
    match handle.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("{what} failed: {e}"),
        Err(_) => error!("{what} panicked"),
    }
}
