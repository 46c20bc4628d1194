//! Time management module
//!
//! Millisecond tick counter, wraparound-safe elapsed time and the timed wait.
//!
//! Every query comes in two flavours. The `_locked` variants take a
//! [`CriticalSection`] token and assume the tick interrupt is already
//! excluded, which is the case inside the tick handler and inside any guarded
//! section. The plain variants enter a guarded section of their own around
//! the read.
//!
//! Elapsed times are computed with wrapping subtraction and are correct across
//! one wrap of the counter. Distances of more than `Tick::MAX` ticks between
//! two observations give an unspecified result.

use crate::config::{CPU_CLOCK_HZ, TICK_RATE_HZ};
use crate::core::cs_cell::CsCell;
use crate::critical::{critical_section, CriticalSection};
use crate::sched::{self, TASKS};
use crate::types::{status, Tick, TIMER_INFINITE};

/// Continuously incrementing value, one step per tick
static TICK: CsCell<Tick> = CsCell::new(0);

// ============ Tick arithmetic ============

/// Ticks from `since` to `now`
#[inline]
pub const fn tick_elapsed(since: Tick, now: Tick) -> Tick {
    now.wrapping_sub(since)
}

/// Whether `duration` ticks passed between `since` and `now`
///
/// Always false for [`TIMER_INFINITE`].
#[inline]
pub const fn tick_has_elapsed(since: Tick, now: Tick, duration: Tick) -> bool {
    duration != TIMER_INFINITE && tick_elapsed(since, now) >= duration
}

/// Tick at which a wait of `duration` started at `now` ends
#[inline]
pub const fn deadline(now: Tick, duration: Tick) -> Tick {
    now.wrapping_add(duration)
}

// ============ Timer control ============

/// Reset the counter to zero and arm the periodic tick
pub fn init() {
    critical_section(|cs| *TICK.get(cs) = 0);
    crate::port::os_cpu_systick_init(CPU_CLOCK_HZ / TICK_RATE_HZ);
}

/// Disarm the periodic tick
pub fn stop() {
    critical_section(|_cs| crate::port::os_cpu_systick_stop());
}

// ============ Queries ============

#[inline]
pub fn now_locked(cs: &CriticalSection) -> Tick {
    *TICK.get(cs)
}

/// Current tick
#[inline]
pub fn now() -> Tick {
    critical_section(now_locked)
}

#[inline]
pub fn elapsed_locked(cs: &CriticalSection, since: Tick) -> Tick {
    tick_elapsed(since, now_locked(cs))
}

/// Ticks elapsed since a value obtained from [`now`]
#[inline]
pub fn elapsed(since: Tick) -> Tick {
    critical_section(|cs| elapsed_locked(cs, since))
}

#[inline]
pub fn has_elapsed_locked(cs: &CriticalSection, since: Tick, duration: Tick) -> bool {
    tick_has_elapsed(since, now_locked(cs), duration)
}

/// Whether `duration` ticks have passed since `since`
#[inline]
pub fn has_elapsed(since: Tick, duration: Tick) -> bool {
    critical_section(|cs| has_elapsed_locked(cs, since, duration))
}

// ============ Timed wait ============

/// Suspend the calling task for `ticks` ticks
///
/// Returns at once for zero. Otherwise the task is marked as waiting on the
/// timer and the scheduler switches away; the tick handler releases it at the
/// matching tick.
pub fn wait(ticks: Tick) {
    if ticks == 0 {
        return;
    }

    critical_section(|cs| {
        let Some(id) = sched::current(cs) else {
            return;
        };
        let until = deadline(now_locked(cs), ticks);
        if let Err(e) = TASKS.get(cs).block(id, status::WAIT_TIMER, Some(until)) {
            crate::cpu::fatal(e);
        }

        // Yield; returns only once the deadline is reached
        sched::schedule(cs);
    });
}

/// Ticks in a duration given as hours, minutes, seconds, milliseconds
///
/// Fields are not range-checked; 90 seconds is the same as 1 minute 30.
pub const fn hmsm_ticks(hours: u16, minutes: u8, seconds: u8, milliseconds: u16) -> u64 {
    let total_ms = hours as u64 * 3_600_000
        + minutes as u64 * 60_000
        + seconds as u64 * 1000
        + milliseconds as u64;
    total_ms * TICK_RATE_HZ as u64 / 1000
}

/// Wait in hours, minutes, seconds, milliseconds
///
/// Durations longer than one counter period are cut into several waits.
pub fn wait_hmsm(hours: u16, minutes: u8, seconds: u8, milliseconds: u16) {
    let mut ticks = hmsm_ticks(hours, minutes, seconds, milliseconds);

    while ticks > 0 {
        let step = ticks.min((TIMER_INFINITE - 1) as u64);
        wait(step as Tick);
        ticks -= step;
    }
}

// ============ Tick handler ============

/// Body of the periodic interrupt
///
/// Advances the counter, steps the cube refresh, wakes due tasks and
/// reschedules if any task became runnable.
pub fn os_tick_handler() {
    critical_section(|cs| {
        let now = {
            let tick = TICK.get(cs);
            *tick = tick.wrapping_add(1);
            *tick
        };

        let reclaimed = crate::cube::refresh(cs);
        sched::handle_timer(cs, now, reclaimed);
    });
}

/// SysTick interrupt handler
#[cfg(target_arch = "arm")]
#[no_mangle]
pub extern "C" fn SysTick() {
    os_tick_handler();
}
