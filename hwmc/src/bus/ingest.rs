//! Monitor-point ingestion and persistence.
//!
//! Every motion controller posts its point sets through a [`BusHandle`]. A
//! single [`MonitorBus`] thread drains them in arrival order, appends each
//! record to the day's file and forwards the encoded line to the broadcast
//! server.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use flume::{Receiver, RecvTimeoutError, Sender};
use hwmc_common::consts::MP_FILE_EXTENSION;
use hwmc_common::monitor::{MonitorPointRecord, MonitorPointSet};
use hwmc_common::shutdown::Shutdown;
use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::storage::DailyFile;

/// Producer side of the ingest queue. Cheap to clone, never blocks.
#[derive(Debug, Clone)]
pub struct BusHandle {
    tx: Sender<MonitorPointSet>,
}

impl BusHandle {
    /// Create an ingest queue, returning the producer handle and the
    /// receiver a [`MonitorBus`] consumes.
    pub fn channel() -> (Self, Receiver<MonitorPointSet>) {
        let (tx, rx) = flume::unbounded();
        (Self { tx }, rx)
    }

    /// Enqueue a point set. Returns `false` once the bus has gone away.
    pub fn post(&self, set: MonitorPointSet) -> bool {
        self.tx.send(set).is_ok()
    }

    /// Point sets waiting to be persisted.
    pub fn depth(&self) -> usize {
        self.tx.len()
    }
}

/// One record as encoded for subscribers, with the keys filters match on.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    pub source: Arc<str>,
    pub point: &'static str,
    /// `<mjd>,<source>,<point>,<value>\n`
    pub line: Arc<str>,
}

impl From<&MonitorPointRecord> for EncodedRecord {
    fn from(record: &MonitorPointRecord) -> Self {
        Self {
            source: Arc::clone(&record.source),
            point: record.point,
            line: Arc::from(record.to_line()),
        }
    }
}

/// Ingest queue depth bookkeeping.
#[derive(Debug, Default)]
struct DepthGauge {
    warn_at: usize,
    high_water: usize,
    above: bool,
}

impl DepthGauge {
    fn observe(&mut self, depth: usize) {
        self.high_water = self.high_water.max(depth);
        if depth >= self.warn_at && !self.above {
            self.above = true;
            warn!(
                "Monitor ingest queue at {} point sets (threshold {})",
                depth, self.warn_at
            );
        } else if depth < self.warn_at {
            self.above = false;
        }
    }
}

/// Single consumer of the ingest queue.
pub struct MonitorBus {
    ingest: Receiver<MonitorPointSet>,
    fanout: Sender<EncodedRecord>,
    file: DailyFile,
    idle_wait: Duration,
    gauge: DepthGauge,
    rotate_failed: bool,
    write_failed: bool,
}

impl MonitorBus {
    /// Open today's file. Failure here is fatal to startup.
    pub fn new(
        config: &MonitorConfig,
        ingest: Receiver<MonitorPointSet>,
        fanout: Sender<EncodedRecord>,
    ) -> std::io::Result<Self> {
        Self::open_for(config, ingest, fanout, Utc::now().date_naive())
    }

    /// Open the file for a given date.
    pub fn open_for(
        config: &MonitorConfig,
        ingest: Receiver<MonitorPointSet>,
        fanout: Sender<EncodedRecord>,
        date: NaiveDate,
    ) -> std::io::Result<Self> {
        let file = DailyFile::open(&config.file_prefix, MP_FILE_EXTENSION, date)?;
        Ok(Self {
            ingest,
            fanout,
            file,
            idle_wait: config.idle_wait(),
            gauge: DepthGauge {
                warn_at: config.ingest_warn_depth,
                ..DepthGauge::default()
            },
            rotate_failed: false,
            write_failed: false,
        })
    }

    /// Highest ingest depth seen so far.
    pub fn high_water(&self) -> usize {
        self.gauge.high_water
    }

    /// Persist and forward one point set.
    pub fn process(&mut self, set: &MonitorPointSet) {
        if let Some(date) = set.timestamp.date() {
            self.roll_to(date);
        }
        for record in set.records() {
            let encoded = EncodedRecord::from(&record);
            match self.file.write_line(&encoded.line) {
                Ok(()) => self.write_failed = false,
                Err(e) if !self.write_failed => {
                    self.write_failed = true;
                    error!("Cannot write {}: {e}", self.file.path().display());
                }
                Err(_) => {}
            }
            // No broadcast server is not an error.
            let _ = self.fanout.send(encoded);
        }
    }

    fn roll_to(&mut self, date: NaiveDate) {
        match self.file.roll_to(date) {
            Ok(true) => {
                self.rotate_failed = false;
                info!("Monitor points now written to {}", self.file.path().display());
            }
            Ok(false) => {}
            Err(e) => {
                if !self.rotate_failed {
                    self.rotate_failed = true;
                    error!(
                        "Cannot rotate monitor file to {date}, staying on {}: {e}",
                        self.file.path().display()
                    );
                }
            }
        }
    }

    fn drain_ready(&mut self) {
        while let Ok(set) = self.ingest.try_recv() {
            self.process(&set);
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.file.flush() {
            if !self.write_failed {
                self.write_failed = true;
                error!("Cannot flush {}: {e}", self.file.path().display());
            }
        }
    }

    /// Bus loop. Returns once `shutdown` is triggered and the queue has
    /// been drained, or every producer has gone away.
    pub fn run(mut self, shutdown: &Shutdown) {
        info!(
            "Monitor bus started, writing {}",
            self.file.path().display()
        );
        loop {
            let depth = self.ingest.len();
            match self.ingest.recv_timeout(self.idle_wait) {
                Ok(set) => {
                    self.gauge.observe(depth + 1);
                    self.process(&set);
                    self.drain_ready();
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.roll_to(Utc::now().date_naive());
                }
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("All monitor producers gone");
                    break;
                }
            }
            self.flush();
            if shutdown.is_triggered() {
                self.drain_ready();
                break;
            }
        }
        self.flush();
        info!(
            "Monitor bus stopped (ingest high-water mark {} point sets)",
            self.gauge.high_water
        );
    }
}
