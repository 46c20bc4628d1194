//! Port layer - CPU-specific implementations
//!
//! This module provides the hardware abstraction layer for context switching,
//! the tick source and the CPU power states.

#[cfg(target_arch = "arm")]
pub mod cortex_m4;

#[cfg(target_arch = "arm")]
pub use cortex_m4::*;

// Stub implementations for non-ARM targets (for testing)
#[cfg(not(target_arch = "arm"))]
pub mod stub {
    use crate::task::TaskFn;
    use crate::types::StkElement;

    /// On the host the "first task" is simply whoever calls next.
    pub unsafe fn os_start_high_rdy() {}

    pub fn os_ctx_sw() {
        // No-op for testing
    }

    pub fn os_int_disable() {}

    pub unsafe fn os_task_stk_init(
        _task_fn: TaskFn,
        stk_base: *mut StkElement,
        stk_size: usize,
    ) -> *mut StkElement {
        // Return top of stack for testing
        unsafe { stk_base.add(stk_size - 1) }
    }

    pub fn os_cpu_systick_init(_reload: u32) {}

    pub fn os_cpu_systick_stop() {}

    pub fn cpu_sleep() {
        core::hint::spin_loop();
    }

    pub fn cpu_halt() -> ! {
        panic!("cpu halted");
    }

    pub fn cpu_reset() -> ! {
        panic!("cpu reset");
    }
}

#[cfg(not(target_arch = "arm"))]
pub use stub::*;
