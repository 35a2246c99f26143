//! TCP command server.
//!
//! Fire-and-forget: clients send newline-terminated command lines and never
//! get a reply. All connections are served from one thread; each line is
//! routed on the blocking pool so a full antenna queue stalls only the
//! connection that filled it.

use std::net::{SocketAddr, TcpListener as StdListener};

use hwmc_common::shutdown::Shutdown;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use super::router::{CommandRouter, RouteOutcome};
use crate::error::ServerError;
use crate::net;

/// Line-oriented command ingress over TCP.
pub struct CommandServer {
    listener: StdListener,
    router: CommandRouter,
}

impl CommandServer {
    /// Bind the listening socket.
    pub fn bind(addr: &str, router: CommandRouter) -> Result<Self, ServerError> {
        Ok(Self {
            listener: net::bind(addr)?,
            router,
        })
    }

    /// Bound address.
    pub fn local_addr(&self) -> SocketAddr {
        net::local_addr(&self.listener)
    }

    /// Serve until `intake` is triggered. Blocks the calling thread.
    pub fn run(self, intake: &Shutdown) -> Result<(), ServerError> {
        net::runtime()?.block_on(self.serve(intake))
    }

    async fn serve(self, intake: &Shutdown) -> Result<(), ServerError> {
        let addr = self.local_addr();
        let listener = TcpListener::from_std(self.listener).map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        info!("Command server listening on {addr}");

        loop {
            tokio::select! {
                _ = intake.triggered() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        info!("Command client {peer} connected");
                        let router = self.router.clone();
                        let intake = intake.clone();
                        tokio::spawn(async move {
                            tokio::select! {
                                _ = intake.triggered() => {}
                                _ = serve_client(stream, peer, router) => {}
                            }
                        });
                    }
                    Err(e) => warn!("Command accept failed: {e}"),
                },
            }
        }
        info!("Stopping command server");
        Ok(())
    }
}

async fn serve_client(stream: TcpStream, peer: SocketAddr, router: CommandRouter) {
    let mut reader = BufReader::new(stream);
    loop {
        match net::read_line(&mut reader).await {
            Ok(Some(line)) => {
                debug!("Command from {peer}: {line}");
                let router = router.clone();
                match tokio::task::spawn_blocking(move || router.route(&line)).await {
                    Ok(RouteOutcome::Shutdown) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Routing task for {peer} failed: {e}");
                        break;
                    }
                }
            }
            Ok(None) => {
                info!("Command client {peer} disconnected");
                break;
            }
            Err(e) => {
                // Reset, abort or an overlong line: drop this client only.
                info!("Command client {peer} removed: {e}");
                break;
            }
        }
    }
}
