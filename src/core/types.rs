//! Core type definitions for the cube kernel
//!
//! These types provide strong typing for kernel primitives.

/// Tick counter type. Wraps silently at the 16-bit boundary.
pub type Tick = u16;

/// Stack element type
pub type StkElement = u32;

/// Element carried by the task FIFOs
pub type Message = u8;

/// Timeout value that never expires
pub const TIMER_INFINITE: Tick = Tick::MAX;

/// Task status bits
pub mod status {
    /// Terminal state, the task is never scheduled again
    pub const STOPPED: u8 = 0x00;
    /// Task is alive and takes part in scheduling
    pub const SCHEDULED: u8 = 0x80;
    /// Mask of all waiting reasons
    pub const WAITING: u8 = 0x0F;

    // Waiting reasons
    pub const WAIT_CUBE: u8 = 0x01;
    pub const WAIT_RECV: u8 = 0x02;
    pub const WAIT_SEND: u8 = 0x04;
    pub const WAIT_TIMER: u8 = 0x08;
}

/// Index of a slot in the task table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskId(u8);

impl TaskId {
    #[inline(always)]
    pub const fn new(index: u8) -> Self {
        TaskId(index)
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Packed scheduling state of a task
///
/// Bit 7 is the scheduled flag, the low nibble holds the waiting reasons.
/// The reasons are independent bits and may be combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct TaskStatus(u8);

impl TaskStatus {
    pub const STOPPED: Self = TaskStatus(status::STOPPED);
    pub const SCHEDULED: Self = TaskStatus(status::SCHEDULED);

    #[inline(always)]
    pub const fn from_bits(bits: u8) -> Self {
        TaskStatus(bits)
    }

    #[inline(always)]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Waiting reasons currently set
    #[inline(always)]
    pub const fn waiting(self) -> u8 {
        self.0 & status::WAITING
    }

    #[inline(always)]
    pub const fn is_stopped(self) -> bool {
        self.0 == status::STOPPED
    }

    #[inline(always)]
    pub const fn is_waiting_on(self, reason: u8) -> bool {
        self.0 & reason != 0
    }

    /// Runnable iff not stopped and no waiting reason is set
    #[inline(always)]
    pub const fn is_runnable(self) -> bool {
        !self.is_stopped() && self.waiting() == 0
    }

    #[inline(always)]
    pub fn block(&mut self, reasons: u8) {
        self.0 |= reasons & status::WAITING;
    }

    #[inline(always)]
    pub fn release(&mut self, reasons: u8) {
        self.0 &= !(reasons & status::WAITING);
    }
}
