//! Monitor-point broadcast server.
//!
//! Clients connect, send `<source>,<point>` lines at any time and receive
//! every matching record line. A client that half-closes its side keeps
//! receiving; a write error, a read error or an overlong filter line removes
//! it. The accept loop owns
//! the subscriber table outright; per-connection reader and writer tasks
//! report to it over a channel.

use std::collections::HashMap;
use std::net::{SocketAddr, TcpListener as StdListener};
use std::sync::Arc;

use flume::Receiver;
use hwmc_common::shutdown::Shutdown;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::ingest::EncodedRecord;
use super::subscription::{Filter, Subscription};
use crate::error::ServerError;
use crate::net;

type ClientId = u64;

/// Reports from connection tasks to the accept loop.
#[derive(Debug)]
enum ClientEvent {
    Line(ClientId, String),
    Closed(ClientId),
}

struct Subscriber {
    addr: SocketAddr,
    subscription: Subscription,
    outbox: mpsc::Sender<Arc<str>>,
    reader: JoinHandle<()>,
}

/// TCP fan-out of monitor-point records.
pub struct BroadcastServer {
    listener: StdListener,
    fanout: Receiver<EncodedRecord>,
    backlog: usize,
}

impl BroadcastServer {
    /// Bind the listening socket.
    pub fn bind(
        addr: &str,
        fanout: Receiver<EncodedRecord>,
        backlog: usize,
    ) -> Result<Self, ServerError> {
        Ok(Self {
            listener: net::bind(addr)?,
            fanout,
            backlog: backlog.max(1),
        })
    }

    /// Bound address.
    pub fn local_addr(&self) -> SocketAddr {
        net::local_addr(&self.listener)
    }

    /// Serve until `shutdown` is triggered. Blocks the calling thread.
    pub fn run(self, shutdown: &Shutdown) -> Result<(), ServerError> {
        net::runtime()?.block_on(self.serve(shutdown))
    }

    async fn serve(self, shutdown: &Shutdown) -> Result<(), ServerError> {
        let addr = self.local_addr();
        let listener = TcpListener::from_std(self.listener).map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        info!("Monitor broadcast server listening on {addr}");

        let (events_tx, mut events) = mpsc::unbounded_channel();
        let mut subscribers: HashMap<ClientId, Subscriber> = HashMap::new();
        let mut next_id: ClientId = 0;
        let mut fanout_open = true;

        loop {
            tokio::select! {
                _ = shutdown.triggered() => break,

                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        next_id += 1;
                        let (read, write) = stream.into_split();
                        let (outbox, inbox) = mpsc::channel(self.backlog);
                        let reader = tokio::spawn(read_filters(next_id, read, events_tx.clone()));
                        tokio::spawn(write_records(next_id, write, inbox, events_tx.clone()));
                        subscribers.insert(next_id, Subscriber {
                            addr: peer,
                            subscription: Subscription::new(),
                            outbox,
                            reader,
                        });
                        info!("Monitor subscriber {peer} connected");
                    }
                    Err(e) => warn!("Monitor accept failed: {e}"),
                },

                Some(event) = events.recv() => match event {
                    ClientEvent::Line(id, line) => {
                        if let Some(sub) = subscribers.get_mut(&id) {
                            add_filter(sub, &line);
                        }
                    }
                    ClientEvent::Closed(id) => drop_subscriber(&mut subscribers, id, "disconnected"),
                },

                record = self.fanout.recv_async(), if fanout_open => match record {
                    Ok(record) => dispatch(&mut subscribers, &record),
                    Err(_) => {
                        debug!("Monitor fan-out queue closed");
                        fanout_open = false;
                    }
                },
            }
        }

        for (_, sub) in subscribers.drain() {
            sub.reader.abort();
        }
        info!("Stopping monitor broadcast server");
        Ok(())
    }
}

fn add_filter(sub: &mut Subscriber, line: &str) {
    if line.trim().is_empty() {
        return;
    }
    match line.parse::<Filter>() {
        Ok(filter) => {
            if sub.subscription.add(filter) {
                debug!(
                    "Subscriber {} filters on '{}' ({} total)",
                    sub.addr,
                    line.trim(),
                    sub.subscription.len()
                );
            }
        }
        Err(e) => warn!("Subscriber {}: {e}", sub.addr),
    }
}

fn dispatch(subscribers: &mut HashMap<ClientId, Subscriber>, record: &EncodedRecord) {
    let mut dead = Vec::new();
    for (&id, sub) in subscribers.iter() {
        if !sub.subscription.matches(&record.source, record.point) {
            continue;
        }
        match sub.outbox.try_send(Arc::clone(&record.line)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => dead.push((id, "fell too far behind")),
            Err(TrySendError::Closed(_)) => dead.push((id, "write failed")),
        }
    }
    for (id, reason) in dead {
        drop_subscriber(subscribers, id, reason);
    }
}

fn drop_subscriber(subscribers: &mut HashMap<ClientId, Subscriber>, id: ClientId, reason: &str) {
    if let Some(sub) = subscribers.remove(&id) {
        sub.reader.abort();
        info!("Monitor subscriber {} removed: {reason}", sub.addr);
    }
}

async fn read_filters(
    id: ClientId,
    read: OwnedReadHalf,
    events: mpsc::UnboundedSender<ClientEvent>,
) {
    let mut reader = BufReader::new(read);
    loop {
        match net::read_line(&mut reader).await {
            Ok(Some(line)) => {
                if events.send(ClientEvent::Line(id, line)).is_err() {
                    return;
                }
            }
            // Half-closed: no more filters, but keep streaming.
            Ok(None) => return,
            Err(e) => {
                debug!("Subscriber read error: {e}");
                break;
            }
        }
    }
    let _ = events.send(ClientEvent::Closed(id));
}

async fn write_records(
    id: ClientId,
    mut write: OwnedWriteHalf,
    mut inbox: mpsc::Receiver<Arc<str>>,
    events: mpsc::UnboundedSender<ClientEvent>,
) {
    while let Some(line) = inbox.recv().await {
        if let Err(e) = write.write_all(line.as_bytes()).await {
            debug!("Subscriber write error: {e}");
            let _ = events.send(ClientEvent::Closed(id));
            return;
        }
    }
    let _ = write.shutdown().await;
}
