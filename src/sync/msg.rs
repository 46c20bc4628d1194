//! Message endpoints on the task FIFOs
//!
//! Every task owns an inbox (`recv_fifo`) and an outbox (`send_fifo`).
//!
//! Task side, blocking:
//! - [`send`] puts into the caller's outbox, waits on `WAIT_SEND` while full
//! - [`send_to`] puts straight into another task's inbox, waits on
//!   `WAIT_SEND` while that inbox is full
//! - [`receive`] takes from the caller's inbox, waits on `WAIT_RECV` while
//!   empty
//!
//! Peer side, never blocking, usable from interrupt context:
//! - [`post`] puts into a task's inbox and releases its `WAIT_RECV`
//! - [`take`] takes from a task's outbox and releases its `WAIT_SEND`

use crate::critical::critical_section;
use crate::error::{KernelError, KernelResult};
use crate::sched::{self, TaskTable, TASKS};
use crate::sync::block_on;
use crate::types::{status, Message, TaskId, Tick};

impl<const N: usize> TaskTable<N> {
    /// Push into `dest`'s inbox, releasing a receiver blocked on it
    ///
    /// Returns whether a task became runnable, or the message if the inbox is
    /// full.
    pub fn deliver(&mut self, dest: TaskId, msg: Message) -> Result<bool, Message> {
        let tcb = self.get_mut(dest).ok_or(msg)?;
        tcb.recv_fifo.push(msg)?;
        Ok(self.release(dest, status::WAIT_RECV))
    }

    /// Pop from `id`'s own inbox, releasing tasks blocked on it in `send_to`
    pub fn accept(&mut self, id: TaskId) -> Option<(Message, bool)> {
        let msg = self.get_mut(id)?.recv_fifo.pop()?;
        let woke = self.release_where(status::WAIT_SEND, |tcb| tcb.send_dest == Some(id));
        Some((msg, woke))
    }

    /// Push into `id`'s own outbox
    pub fn enqueue(&mut self, id: TaskId, msg: Message) -> Result<(), Message> {
        let tcb = self.get_mut(id).ok_or(msg)?;
        tcb.send_dest = None;
        tcb.send_fifo.push(msg)
    }

    /// Pop from `src`'s outbox, releasing `src` if it waits for room there
    pub fn collect(&mut self, src: TaskId) -> Option<(Message, bool)> {
        let tcb = self.get_mut(src)?;
        let msg = tcb.send_fifo.pop()?;
        let woke = tcb.send_dest.is_none() && self.release(src, status::WAIT_SEND);
        Some((msg, woke))
    }
}

/// Send through the caller's outbox
pub fn send(msg: Message, timeout: Tick) -> KernelResult<()> {
    block_on(status::WAIT_SEND, timeout, |cs, id| {
        TASKS.get(cs).enqueue(id, msg).ok()
    })
}

/// Send directly into `dest`'s inbox
pub fn send_to(dest: TaskId, msg: Message, timeout: Tick) -> KernelResult<()> {
    if critical_section(|cs| TASKS.get(cs).get(dest).is_none()) {
        return Err(KernelError::TaskInvalid);
    }

    let sent = block_on(status::WAIT_SEND, timeout, |cs, id| {
        let table = TASKS.get(cs);
        if let Some(tcb) = table.get_mut(id) {
            tcb.send_dest = Some(dest);
        }
        match table.deliver(dest, msg) {
            Ok(woke) => {
                if let Some(tcb) = table.get_mut(id) {
                    tcb.send_dest = None;
                }
                if woke {
                    sched::schedule(cs);
                }
                Some(())
            }
            Err(_) => None,
        }
    });

    if sent.is_err() {
        critical_section(|cs| {
            if let Some(id) = sched::current(cs) {
                if let Some(tcb) = TASKS.get(cs).get_mut(id) {
                    tcb.send_dest = None;
                }
            }
        });
    }
    sent
}

/// Receive from the caller's inbox
pub fn receive(timeout: Tick) -> KernelResult<Message> {
    block_on(status::WAIT_RECV, timeout, |cs, id| {
        let (msg, woke) = TASKS.get(cs).accept(id)?;
        if woke {
            sched::schedule(cs);
        }
        Some(msg)
    })
}

/// Put a message into `dest`'s inbox without blocking
///
/// # Returns
/// * `Err(KernelError::TaskInvalid)` - no such task
/// * `Err(KernelError::QueueFull)` - inbox full, message dropped
pub fn post(dest: TaskId, msg: Message) -> KernelResult<()> {
    critical_section(|cs| {
        let table = TASKS.get(cs);
        if table.get(dest).is_none() {
            return Err(KernelError::TaskInvalid);
        }
        let woke = table.deliver(dest, msg).map_err(|_| KernelError::QueueFull)?;
        if woke {
            sched::schedule(cs);
        }
        Ok(())
    })
}

/// Take a message from `src`'s outbox without blocking
///
/// # Returns
/// * `Err(KernelError::TaskInvalid)` - no such task
/// * `Err(KernelError::QueueEmpty)` - outbox empty
pub fn take(src: TaskId) -> KernelResult<Message> {
    critical_section(|cs| {
        let table = TASKS.get(cs);
        if table.get(src).is_none() {
            return Err(KernelError::TaskInvalid);
        }
        let (msg, woke) = table.collect(src).ok_or(KernelError::QueueEmpty)?;
        if woke {
            sched::schedule(cs);
        }
        Ok(msg)
    })
}
