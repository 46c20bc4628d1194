//! Global kernel state and initialization
//!
//! This module manages the global kernel state: initialization, starting the
//! scheduler, the idle context and the pending context switch.

use portable_atomic::{AtomicBool, Ordering};

use crate::config::IDLE_STACK_SIZE;
use crate::critical::critical_section;
use crate::error::{FatalError, KernelError, KernelResult};
use crate::sched::TASKS;
use crate::task::Tcb;
use crate::types::StkElement;

// ============ Kernel State Structures ============

/// Atomic kernel flags
pub struct KernelFlags {
    initialized: AtomicBool,
    running: AtomicBool,
}

impl KernelFlags {
    const fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            running: AtomicBool::new(false),
        }
    }

    pub(crate) fn reset(&self) {
        self.initialized.store(false, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the scheduler is running
    #[inline(always)]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Check if the kernel is initialized
    #[inline(always)]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub(crate) fn set_initialized(&self, val: bool) {
        self.initialized.store(val, Ordering::SeqCst);
    }

    #[inline(always)]
    pub(crate) fn set_running(&self, val: bool) {
        self.running.store(val, Ordering::SeqCst);
    }
}

// ============ Global Instances ============

/// Global kernel state instance
pub(crate) static KERNEL: KernelFlags = KernelFlags::new();

/// Idle context, not part of the task table
static mut IDLE_TCB: Tcb = Tcb::new();

/// Idle context stack
static mut IDLE_STK: [StkElement; IDLE_STACK_SIZE] = [0; IDLE_STACK_SIZE];

// ============ CPU/Context Switch State ============

/// CPU context switch state
///
/// `tcb_cur` must stay the first field: the switch exception tests it for
/// null to skip saving on the very first switch.
#[repr(C)]
pub struct CpuState {
    /// TCB whose registers live on the CPU
    pub tcb_cur: *mut Tcb,
    /// TCB the pending switch will restore
    pub tcb_next: *mut Tcb,
}

impl CpuState {
    pub const fn new() -> Self {
        Self {
            tcb_cur: core::ptr::null_mut(),
            tcb_next: core::ptr::null_mut(),
        }
    }

    pub fn reset(&mut self) {
        self.tcb_cur = core::ptr::null_mut();
        self.tcb_next = core::ptr::null_mut();
    }
}

impl Default for CpuState {
    fn default() -> Self {
        Self::new()
    }
}

/// Global CPU state instance
#[no_mangle]
#[used]
pub static mut CPU_STATE: CpuState = CpuState::new();

/// Idle loop, entered whenever no task is runnable
fn os_idle_task() {
    loop {
        crate::port::cpu_sleep();
    }
}

/// Reset global kernel state
#[allow(static_mut_refs)]
unsafe fn os_reset_globals() {
    KERNEL.reset();

    unsafe {
        CPU_STATE.reset();
        IDLE_TCB = Tcb::new();
        TASKS.get_unchecked().reset();
    }
}

// ============ Public API ============

/// Initialize the kernel
///
/// Clears the task table, the frame pool and the idle context. Call once at
/// boot, before any task is created.
#[allow(static_mut_refs)]
pub fn os_init() -> KernelResult<()> {
    unsafe { os_reset_globals() };

    critical_section(|cs| {
        crate::cube::reset(cs);

        unsafe {
            let stk_ptr = crate::port::os_task_stk_init(
                os_idle_task,
                IDLE_STK.as_mut_ptr(),
                IDLE_STK.len(),
            );
            IDLE_TCB = Tcb::with_stack("Idle", stk_ptr, IDLE_STK.as_mut_ptr(), IDLE_STK.len());
        }

        KERNEL.set_initialized(true);
    });

    crate::debug!("kernel initialized");
    Ok(())
}

/// Start multitasking
///
/// Arms the tick and switches to the first runnable task. On the target this
/// does not return. An empty task table is fatal.
///
/// # Returns
/// * `Err(KernelError::OsNotInit)` - kernel not initialized
/// * `Err(KernelError::OsRunning)` - already running
pub fn os_start() -> KernelResult<()> {
    if !KERNEL.is_initialized() {
        return Err(KernelError::OsNotInit);
    }

    if KERNEL.is_running() {
        return Err(KernelError::OsRunning);
    }

    let first = critical_section(|cs| {
        let table = TASKS.get(cs);
        let first = table.select_next()?;
        table.set_current(Some(first));
        unsafe { set_tcb_next(table.tcb_ptr(first)) };
        KERNEL.set_running(true);
        Some(first)
    });

    let Some(first) = first else {
        crate::cpu::fatal(FatalError::NoTask);
    };
    crate::info!("starting scheduler with task {}", first.index());

    // The first tick must not arrive before the first switch
    crate::port::os_int_disable();
    crate::time::init();

    unsafe { crate::port::os_start_high_rdy() };

    Ok(())
}

// ============ Internal accessors for other modules ============

/// Pointer to the idle context
#[inline]
pub(crate) fn idle_tcb_ptr() -> *mut Tcb {
    &raw mut IDLE_TCB
}

/// Record the TCB the next switch restores
///
/// # Safety
/// Interrupts must be masked.
#[inline]
#[allow(static_mut_refs)]
pub(crate) unsafe fn set_tcb_next(tcb: *mut Tcb) {
    unsafe { CPU_STATE.tcb_next = tcb };
}

/// Commit the pending switch, returning (outgoing, incoming)
///
/// # Safety
/// Called only from the switch exception.
#[inline]
#[allow(static_mut_refs)]
pub(crate) unsafe fn take_switch() -> (*mut Tcb, *mut Tcb) {
    unsafe {
        let cur = CPU_STATE.tcb_cur;
        CPU_STATE.tcb_cur = CPU_STATE.tcb_next;
        (cur, CPU_STATE.tcb_cur)
    }
}
