//! CPU lifecycle
//!
//! Power-up initialization is done by the Cortex-M runtime before `main`.
//! Reset and halt are the only ways out of the scheduling loop.

use crate::error::FatalError;

/// Restart the microcontroller
pub fn reset() -> ! {
    crate::warn!("cpu reset requested");
    crate::port::cpu_reset()
}

/// Stop the microcontroller for good
pub fn halt() -> ! {
    crate::port::cpu_halt()
}

/// Unrecoverable kernel condition
///
/// Stops the tick so no task is woken again, then halts.
pub fn fatal(reason: FatalError) -> ! {
    crate::error!("fatal: {}", reason);
    crate::port::os_cpu_systick_stop();
    halt()
}
