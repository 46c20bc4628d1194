//! Task management module
//!
//! Tasks are created once at boot into a slot of the task table and live for
//! the whole run. The only lifecycle transition is to STOPPED.

mod tcb;

pub use tcb::{TaskFifo, Tcb};

use crate::config::STACK_SIZE_MIN;
use crate::critical::critical_section;
use crate::error::{KernelError, KernelResult};
use crate::kernel;
use crate::sched::{self, TASKS};
use crate::types::{StkElement, TaskId};

/// Task entry point function type
///
/// Returning from the entry point stops the task.
pub type TaskFn = fn();

/// Create a new task using static references
///
/// The stack is owned by the task from now on. Its bounds are not checked at
/// run time; overflowing it corrupts whatever lies below.
///
/// # Arguments
/// * `stack` - Static mutable reference to the stack array
/// * `name` - Task name for debugging
/// * `task_fn` - Task entry point function
///
/// # Example
/// ```ignore
/// static mut TASK_STK: [StkElement; 256] = [0; 256];
///
/// fn my_task() {
///     loop { /* ... */ }
/// }
///
/// // In main:
/// task_create(unsafe { &mut TASK_STK }, "MyTask", my_task)
///     .expect("Task creation failed");
/// ```
pub fn task_create(
    stack: &'static mut [StkElement],
    name: &'static str,
    task_fn: TaskFn,
) -> KernelResult<TaskId> {
    if !kernel::KERNEL.is_initialized() {
        return Err(KernelError::OsNotInit);
    }

    if kernel::KERNEL.is_running() {
        return Err(KernelError::OsRunning);
    }

    if stack.len() < STACK_SIZE_MIN {
        return Err(KernelError::StkSizeInvalid);
    }

    let stk_base = stack.as_mut_ptr();
    let stk_size = stack.len();

    let id = critical_section(|cs| {
        let stk_ptr = unsafe { crate::port::os_task_stk_init(task_fn, stk_base, stk_size) };
        TASKS
            .get(cs)
            .insert(Tcb::with_stack(name, stk_ptr, stk_base, stk_size))
    })?;

    crate::debug!("task {} created as {}", name, id.index());
    Ok(id)
}

/// Stop a task for good
///
/// Frame buffers lent to the task go back to the pool. Stopping the current
/// task yields and never returns to it.
pub fn task_stop(id: TaskId) -> KernelResult<()> {
    critical_section(|cs| {
        TASKS.get(cs).stop(id)?;
        let woke = crate::cube::release_task(cs, id);
        if woke || sched::current(cs) == Some(id) {
            sched::schedule(cs);
        }
        Ok(())
    })?;

    crate::debug!("task {} stopped", id.index());
    Ok(())
}

/// Identity of the calling task
pub fn current_task() -> Option<TaskId> {
    critical_section(sched::current)
}

/// Landing point of a task entry function that returned
#[cfg_attr(not(target_arch = "arm"), allow(dead_code))]
pub(crate) extern "C" fn os_task_exit() -> ! {
    critical_section(|cs| {
        if let Some(id) = sched::current(cs) {
            let _ = TASKS.get(cs).stop(id);
            crate::cube::release_task(cs, id);
        }
        sched::schedule(cs);
    });

    loop {
        crate::port::cpu_sleep();
    }
}
