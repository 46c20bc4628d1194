//! Synchronization primitives
//!
//! Task FIFOs, the blocking message endpoints and the suspend/resume loop
//! they share with the frame wait.

pub mod fifo;
pub mod msg;

use crate::critical::{critical_section, is_isr_context, CriticalSection};
use crate::error::{KernelError, KernelResult};
use crate::sched::{self, TASKS};
use crate::time;
use crate::types::{TaskId, Tick, TIMER_INFINITE};

/// Retry `attempt` until it yields a value, blocking between tries
///
/// Each try runs in a guarded section. When it comes back empty the calling
/// task is blocked on `reason`, plus the timer for a finite `timeout`, and the
/// scheduler switches away in the same guarded section, so a release cannot
/// slip in between. After every resume the attempt is repeated before the
/// timeout is judged, so a condition met at the deadline still wins.
pub(crate) fn block_on<T, F>(reason: u8, timeout: Tick, mut attempt: F) -> KernelResult<T>
where
    F: FnMut(&CriticalSection, TaskId) -> Option<T>,
{
    if is_isr_context() {
        return Err(KernelError::IsrContext);
    }

    let start = time::now();

    loop {
        let ready = critical_section(|cs| {
            let id = sched::current(cs).ok_or(KernelError::OsNotRunning)?;
            if let Some(value) = attempt(cs, id) {
                return Ok(Some(value));
            }

            let deadline = if timeout == TIMER_INFINITE {
                None
            } else {
                let now = time::now_locked(cs);
                let spent = time::tick_elapsed(start, now);
                if spent >= timeout {
                    return Err(KernelError::Timeout);
                }
                Some(time::deadline(now, timeout - spent))
            };

            if let Err(e) = TASKS.get(cs).block(id, reason, deadline) {
                crate::cpu::fatal(e);
            }
            sched::schedule(cs);
            Ok(None)
        });

        match ready {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) => {
                crate::trace!("wait on {=u8} ended: {}", reason, e);
                return Err(e);
            }
        }
    }
}
