//! Scheduler module
//!
//! Round-robin scheduler. Tasks run until they block in one of the
//! synchronization primitives or until the tick interrupt wakes another task:
//! every wake reschedules, and the scan then moves on to the slot after the
//! running task, which may switch away from it.
//!
//! Every entry point here takes a [`CriticalSection`] token: callers are
//! expected to already hold the guard, which keeps the tick interrupt path
//! free of nested guard overhead.

mod table;

pub use table::TaskTable;

use crate::core::cs_cell::CsCell;
use crate::critical::CriticalSection;
use crate::kernel;
use crate::types::{status, TaskId, Tick};

/// Global task table
pub(crate) static TASKS: CsCell<TaskTable> = CsCell::new(TaskTable::new());

/// Identity of the task presently executing
///
/// `None` before start and while the CPU idles.
#[inline]
pub fn current(cs: &CriticalSection) -> Option<TaskId> {
    TASKS.get(cs).current()
}

/// Main scheduling point
///
/// Re-evaluates which task should run and requests a context switch if it
/// differs from the current one. With no runnable task, control passes to the
/// idle context, which sleeps the CPU until the next interrupt.
///
/// The switch itself is carried out by the port (PendSV on Cortex-M) as soon
/// as the caller's guard is released or the running interrupt returns, so a
/// blocked caller does not resume until it is scheduled again.
pub fn schedule(cs: &CriticalSection) {
    if !kernel::KERNEL.is_running() {
        return;
    }

    let table = TASKS.get(cs);
    let next = table.select_next();
    if next == table.current() {
        return;
    }

    table.set_current(next);
    let tcb_next = match next {
        Some(id) => table.tcb_ptr(id),
        None => kernel::idle_tcb_ptr(),
    };

    unsafe { kernel::set_tcb_next(tcb_next) };
    crate::port::os_ctx_sw();
}

/// Timer integration point, called by the tick handler
///
/// Wakes every task whose timer deadline is `now`. When `cube_reclaimed` is
/// set, tasks waiting for a frame buffer are released as well. Reschedules if
/// anything became runnable.
pub fn handle_timer(cs: &CriticalSection, now: Tick, cube_reclaimed: bool) {
    let table = TASKS.get(cs);
    let mut wake = table.wake_expired(now);
    if cube_reclaimed {
        wake |= table.release_where(status::WAIT_CUBE, |_| true);
    }

    if wake {
        schedule(cs);
    }
}

/// Stack pointer swap performed by the port on every switch
///
/// Stores `cur_sp` into the outgoing TCB, makes the pending TCB current and
/// returns its saved stack pointer.
///
/// # Safety
/// Called from the context switch exception with interrupts masked.
#[inline(never)]
#[no_mangle]
pub(crate) unsafe extern "C" fn os_switch_context(
    cur_sp: *mut crate::types::StkElement,
) -> *mut crate::types::StkElement {
    unsafe {
        let (cur, next) = kernel::take_switch();
        if !cur.is_null() {
            (*cur).stk_ptr = cur_sp;
        }
        if next.is_null() {
            core::ptr::null_mut()
        } else {
            (*next).stk_ptr
        }
    }
}
