//! Bounded per-antenna command queue.
//!
//! Many producers (console, TCP clients), exactly one consumer (the owning
//! motion controller). `push` blocks while the queue is full, which is the
//! backpressure a stuck controller applies to its senders.

use std::collections::VecDeque;
use std::time::Instant;

use hwmc_common::command::Command;
use parking_lot::{Condvar, Mutex};
use thiserror::Error;

/// The queue was closed; the command was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("command queue closed")]
pub struct QueueClosed;

/// Why `try_push` refused a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TryPushError {
    #[error("command queue full")]
    Full(Command),
    #[error("command queue closed")]
    Closed(Command),
}

#[derive(Debug)]
struct State {
    items: VecDeque<Command>,
    closed: bool,
}

/// Bounded FIFO of commands for one antenna.
#[derive(Debug)]
pub struct CommandQueue {
    state: Mutex<State>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl CommandQueue {
    /// Create a queue holding at most `capacity` commands (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    /// Enqueue, blocking while the queue is full.
    pub fn push(&self, command: Command) -> Result<(), QueueClosed> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Err(QueueClosed);
            }
            if state.items.len() < self.capacity {
                break;
            }
            self.not_full.wait(&mut state);
        }
        state.items.push_back(command);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Enqueue without blocking.
    pub fn try_push(&self, command: Command) -> Result<(), TryPushError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TryPushError::Closed(command));
        }
        if state.items.len() >= self.capacity {
            return Err(TryPushError::Full(command));
        }
        state.items.push_back(command);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Dequeue, blocking until a command arrives or `deadline` passes.
    ///
    /// Once closed, the remaining commands are still handed out; `None` then
    /// means closed and drained, or the deadline passed.
    pub fn pop_until(&self, deadline: Instant) -> Option<Command> {
        let mut state = self.state.lock();
        loop {
            if let Some(command) = state.items.pop_front() {
                self.not_full.notify_one();
                return Some(command);
            }
            if state.closed {
                return None;
            }
            if self.not_empty.wait_until(&mut state, deadline).timed_out() {
                let command = state.items.pop_front();
                if command.is_some() {
                    self.not_full.notify_one();
                }
                return command;
            }
        }
    }

    /// Dequeue without blocking.
    pub fn try_pop(&self) -> Option<Command> {
        let mut state = self.state.lock();
        let command = state.items.pop_front();
        if command.is_some() {
            self.not_full.notify_one();
        }
        command
    }

    /// Remove and return the oldest command matching `pred`, leaving the
    /// rest in order.
    pub fn take_first<F>(&self, pred: F) -> Option<Command>
    where
        F: Fn(&Command) -> bool,
    {
        let mut state = self.state.lock();
        let index = state.items.iter().position(pred)?;
        let command = state.items.remove(index);
        self.not_full.notify_one();
        command
    }

    /// Refuse further pushes and wake every waiter.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Commands currently queued.
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of queued commands.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
