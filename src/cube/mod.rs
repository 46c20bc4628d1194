//! LED cube frame interface
//!
//! The kernel owns the frame pool and steps the refresh once per tick. The
//! multiplexing hardware stays behind [`CubePort`]; without a registered port
//! frames still cycle, nothing is driven.

mod frame;

pub use frame::{CubePort, Frame, FrameData, FrameInit, FramePool, FrameState, NullPort};

use crate::core::cs_cell::CsCell;
use crate::critical::{critical_section, CriticalSection};
use crate::error::{KernelError, KernelResult};
use crate::sched::{self, TASKS};
use crate::sync::block_on;
use crate::types::{status, TaskId, Tick};

struct Cube {
    pool: FramePool,
    port: Option<&'static mut dyn CubePort>,
}

static CUBE: CsCell<Cube> = CsCell::new(Cube {
    pool: FramePool::new(),
    port: None,
});

pub(crate) fn reset(cs: &CriticalSection) {
    let cube = CUBE.get(cs);
    cube.pool.reset();
    cube.port = None;
}

/// Register the hardware port driven by the refresh step
pub fn set_port(port: &'static mut dyn CubePort) {
    critical_section(|cs| CUBE.get(cs).port = Some(port));
}

/// Start driving the display
pub fn enable() {
    critical_section(|cs| CUBE.get(cs).pool.enable());
}

/// Blank the display; frames keep cycling
pub fn disable() {
    critical_section(|cs| {
        let cube = CUBE.get(cs);
        cube.pool.disable();
        if let Some(port) = cube.port.as_deref_mut() {
            port.blank();
        }
    });
}

/// Submit the previous frame and acquire the next one
///
/// `prev` is queued for display (pass `None` on the first call). If no buffer
/// is free the task waits for the refresh to reclaim one, at most `timeout`
/// ticks ([`TIMER_INFINITE`](crate::types::TIMER_INFINITE) waits forever).
///
/// # Returns
/// * `Err(KernelError::FrameNotOwned)` - `prev` is not lent to the caller
/// * `Err(KernelError::Timeout)` - no buffer became free in time
pub fn advance_frame(prev: Option<Frame>, init: FrameInit, timeout: Tick) -> KernelResult<Frame> {
    if let Some(frame) = prev {
        critical_section(|cs| {
            let owner = sched::current(cs).ok_or(KernelError::OsNotRunning)?;
            CUBE.get(cs).pool.submit(frame, owner)
        })?;
    }

    block_on(status::WAIT_CUBE, timeout, |cs, owner| {
        CUBE.get(cs).pool.acquire(owner, init)
    })
}

/// Hand an unused frame back to the pool
///
/// Tasks waiting for a buffer are released.
///
/// # Returns
/// * `Err(KernelError::FrameNotOwned)` - `frame` is not lent to the caller
pub fn release_frame(frame: Frame) -> KernelResult<()> {
    critical_section(|cs| {
        let owner = sched::current(cs).ok_or(KernelError::OsNotRunning)?;
        CUBE.get(cs).pool.release(frame, owner)?;
        if TASKS.get(cs).release_where(status::WAIT_CUBE, |_| true) {
            sched::schedule(cs);
        }
        Ok(())
    })
}

/// Free the buffers held by a stopped task
///
/// Returns true if a task waiting for a buffer became runnable.
pub(crate) fn release_task(cs: &CriticalSection, id: TaskId) -> bool {
    CUBE.get(cs).pool.release_owned(id)
        && TASKS.get(cs).release_where(status::WAIT_CUBE, |_| true)
}

/// One refresh step, called by the tick handler
///
/// Returns true if a frame buffer went back to the pool.
pub(crate) fn refresh(cs: &CriticalSection) -> bool {
    let cube = CUBE.get(cs);
    match cube.port.as_deref_mut() {
        Some(port) => cube.pool.refresh(port),
        None => cube.pool.refresh(&mut NullPort),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::testing::boot;
    use crate::config::{CUBE_FRAME_BUFFER_COUNT, CUBE_LAYER_COUNT};
    use crate::time::{self, deadline};

    const T0: TaskId = TaskId::new(0);
    const T1: TaskId = TaskId::new(1);

    fn waiting(id: TaskId) -> u8 {
        critical_section(|cs| TASKS.get(cs).get(id).map_or(0, |tcb| tcb.status.waiting()))
    }

    #[test]
    fn test_reclaim_releases_frame_waiter() {
        let _guard = boot(2);

        critical_section(|cs| {
            let pool = &mut CUBE.get(cs).pool;
            for _ in 0..2 {
                let frame = pool.acquire(T1, FrameInit::AsIs).unwrap();
                pool.submit(frame, T1).unwrap();
            }
            let until = deadline(time::now_locked(cs), 1000);
            TASKS.get(cs).block(T0, status::WAIT_CUBE, Some(until)).unwrap();
            sched::schedule(cs);
        });
        assert_eq!(sched_current(), Some(T1));
        assert_eq!(waiting(T0), status::WAIT_CUBE | status::WAIT_TIMER);

        // First frame goes up, nothing is reclaimed for a full frame
        for _ in 0..CUBE_LAYER_COUNT {
            time::os_tick_handler();
        }
        assert_eq!(waiting(T0), status::WAIT_CUBE | status::WAIT_TIMER);

        // Second frame replaces it
        time::os_tick_handler();
        assert_eq!(waiting(T0), 0);
        assert_eq!(sched_current(), Some(T0));
    }

    #[test]
    fn test_stopped_task_returns_its_frames() {
        let _guard = boot(2);

        critical_section(|cs| {
            let pool = &mut CUBE.get(cs).pool;
            let _ = pool.acquire(T1, FrameInit::AsIs);
            let _ = pool.acquire(T1, FrameInit::AsIs);
            TASKS.get(cs).block(T0, status::WAIT_CUBE, None).unwrap();
        });
        assert_eq!(free_count(), CUBE_FRAME_BUFFER_COUNT - 2);

        crate::task::task_stop(T1).unwrap();
        assert_eq!(free_count(), CUBE_FRAME_BUFFER_COUNT);
        assert_eq!(waiting(T0), 0);
    }

    #[test]
    fn test_release_frame_by_owner() {
        let _guard = boot(1);

        let frame = advance_frame(None, FrameInit::AsIs, 0).unwrap();
        assert_eq!(free_count(), CUBE_FRAME_BUFFER_COUNT - 1);
        release_frame(frame).unwrap();
        assert_eq!(free_count(), CUBE_FRAME_BUFFER_COUNT);
    }

    fn free_count() -> usize {
        critical_section(|cs| CUBE.get(cs).pool.free_count())
    }

    fn sched_current() -> Option<TaskId> {
        critical_section(sched::current)
    }
}
