//! Task Control Block (TCB) definition
//!
//! The TCB contains all the information needed to manage a task.

use crate::config::FIFO_CAPACITY;
use crate::sync::fifo::Fifo;
use crate::types::{Message, StkElement, TaskId, TaskStatus, Tick};

/// Per-task message queue
pub type TaskFifo = Fifo<Message, FIFO_CAPACITY>;

/// Task Control Block
#[repr(C)]
pub struct Tcb {
    // ============ Stack pointer ============
    /// Saved stack pointer while the task is switched out
    pub stk_ptr: *mut StkElement,

    // ============ Stack information ============
    /// Base of stack
    pub stk_base: *mut StkElement,
    /// Stack size in words
    pub stk_size: usize,

    // ============ Task identification ============
    /// Task name
    pub name: &'static str,

    // ============ State ============
    /// Scheduled flag and waiting reasons
    pub status: TaskStatus,
    /// Wake deadline, meaningful only while `WAIT_TIMER` is set
    pub wait_until: Tick,
    /// Inbox a blocked `send_to` is waiting on
    pub send_dest: Option<TaskId>,

    // ============ Message queues ============
    /// Inbound FIFO
    pub recv_fifo: TaskFifo,
    /// Outbound FIFO
    pub send_fifo: TaskFifo,
}

impl Tcb {
    /// Create an empty, stopped TCB
    pub const fn new() -> Self {
        Tcb {
            stk_ptr: core::ptr::null_mut(),
            stk_base: core::ptr::null_mut(),
            stk_size: 0,

            name: "",

            status: TaskStatus::STOPPED,
            wait_until: 0,
            send_dest: None,

            recv_fifo: Fifo::new(),
            send_fifo: Fifo::new(),
        }
    }

    /// A runnable TCB whose initial context sits at `stk_ptr`
    pub fn with_stack(
        name: &'static str,
        stk_ptr: *mut StkElement,
        stk_base: *mut StkElement,
        stk_size: usize,
    ) -> Self {
        Tcb {
            stk_ptr,
            stk_base,
            stk_size,
            name,
            status: TaskStatus::SCHEDULED,
            ..Self::new()
        }
    }

    #[inline]
    pub fn is_runnable(&self) -> bool {
        self.status.is_runnable()
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.status.is_stopped()
    }
}

impl Default for Tcb {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl Send for Tcb {}
