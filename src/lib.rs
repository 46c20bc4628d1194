//! Cooperative tick kernel for an LED cube controller
//!
//! A small single-core kernel providing:
//! - Round-robin scheduling of a fixed task table with an idle fallback
//! - A 1 kHz 16-bit tick with timed waits
//! - Per-task message FIFOs with blocking and non-blocking endpoints
//! - A frame buffer pool refreshed layer by layer from the tick
//! - Context switching for ARM Cortex-M

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

#[cfg(test)]
extern crate std;

// ============ Critical Section ============

#[cfg(target_arch = "arm")]
mod cs_impl {
    use cortex_m::interrupt;
    use cortex_m::register::primask;
    use critical_section::{set_impl, Impl, RawRestoreState};

    struct SingleCoreCriticalSection;
    set_impl!(SingleCoreCriticalSection);

    unsafe impl Impl for SingleCoreCriticalSection {
        unsafe fn acquire() -> RawRestoreState {
            let was_active = primask::read().is_active();
            interrupt::disable();
            was_active
        }

        unsafe fn release(was_active: RawRestoreState) {
            if was_active {
                unsafe { interrupt::enable() }
            }
        }
    }
}

// ============ Modules ============

pub mod log;
mod lang_items;

pub mod core;
pub mod cube;
pub mod sync;
pub mod port;

// ============ Re-exports ============

pub use self::core::config;
pub use self::core::cpu;
pub use self::core::critical;
pub use self::core::error;
pub use self::core::error::{FatalError, KernelError, KernelResult};
pub use self::core::kernel;
pub use self::core::kernel::{os_init, os_start};
pub use self::core::sched;
pub use self::core::task;
pub use self::core::task::{current_task, task_create, task_stop};
pub use self::core::time;
pub use self::core::types;
pub use self::core::types::*;

pub use sync::msg;

#[cfg(feature = "pac")]
pub use stm32_metapac as pac;
