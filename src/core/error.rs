//! Error types for the cube kernel
//!
//! Recoverable conditions are reported through `KernelResult`. Conditions the
//! kernel cannot recover from are described by `FatalError` and end in
//! [`crate::cpu::fatal`].

/// Kernel error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum KernelError {
    // ============ Task errors ============
    /// Task id does not name a created task
    TaskInvalid = 29007,
    /// Every slot of the task table is taken
    NoMoreTasks = 29008,
    /// Stack smaller than `STACK_SIZE_MIN`
    StkSizeInvalid = 28208,

    // ============ Kernel state errors ============
    /// Kernel not initialized
    OsNotInit = 24203,
    /// Kernel already running
    OsRunning = 24202,
    /// Kernel not running, or no task is current
    OsNotRunning = 24201,
    /// Blocking call made from interrupt context
    IsrContext = 25006,

    // ============ Blocking errors ============
    /// Timeout expired before the condition was met
    Timeout = 29401,
    /// Destination FIFO is full
    QueueFull = 26001,
    /// Source FIFO is empty
    QueueEmpty = 26002,

    // ============ Cube errors ============
    /// Frame submitted by a task that does not hold it
    FrameNotOwned = 22203,
}

/// Result type alias for kernel operations
pub type KernelResult<T> = Result<T, KernelError>;

/// Unrecoverable conditions, handled by halting the CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FatalError {
    /// Kernel started with an empty task table
    NoTask = 1,
    /// Wait reasons outside the waiting mask, or a timer wait without deadline
    IllegalWait = 2,
    /// CPU fault exception
    HardFault = 3,
}

impl KernelError {
    /// Errors that simply mean "the condition did not become true in time"
    #[inline]
    pub fn is_timeout(self) -> bool {
        matches!(self, KernelError::Timeout)
    }
}
