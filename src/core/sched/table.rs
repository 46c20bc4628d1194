//! Task table - fixed array of TCBs
//!
//! The table never grows or shrinks after boot. Slots are filled in creation
//! order and addressed by [`TaskId`]. Selection is round-robin: the scan
//! starts at the slot after the task that ran last and the first runnable
//! task wins, so the task that ran last is its own last candidate.

use crate::config::TASK_COUNT;
use crate::error::{FatalError, KernelError, KernelResult};
use crate::task::Tcb;
use crate::types::{status, TaskId, Tick};

pub struct TaskTable<const N: usize = TASK_COUNT> {
    tasks: [Tcb; N],
    len: usize,
    /// Task executing now, `None` while idle
    current: Option<TaskId>,
    /// Task that ran last, start point of the round-robin scan
    last: Option<TaskId>,
}

impl<const N: usize> TaskTable<N> {
    pub const fn new() -> Self {
        TaskTable {
            tasks: [const { Tcb::new() }; N],
            len: 0,
            current: None,
            last: None,
        }
    }

    pub(crate) fn reset(&mut self) {
        for tcb in self.tasks.iter_mut() {
            *tcb = Tcb::new();
        }
        self.len = 0;
        self.current = None;
        self.last = None;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Put a TCB into the next free slot
    pub fn insert(&mut self, tcb: Tcb) -> KernelResult<TaskId> {
        if self.len >= N {
            return Err(KernelError::NoMoreTasks);
        }
        let id = TaskId::new(self.len as u8);
        self.tasks[self.len] = tcb;
        self.len += 1;
        Ok(id)
    }

    #[inline]
    pub fn get(&self, id: TaskId) -> Option<&Tcb> {
        self.tasks[..self.len].get(id.index())
    }

    #[inline]
    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Tcb> {
        self.tasks[..self.len].get_mut(id.index())
    }

    #[inline]
    pub fn current(&self) -> Option<TaskId> {
        self.current
    }

    pub(crate) fn set_current(&mut self, id: Option<TaskId>) {
        self.current = id;
        if id.is_some() {
            self.last = id;
        }
    }

    pub fn is_runnable(&self, id: TaskId) -> bool {
        self.get(id).map_or(false, Tcb::is_runnable)
    }

    /// Raw pointer to a slot, for the context switch
    pub(crate) fn tcb_ptr(&mut self, id: TaskId) -> *mut Tcb {
        &mut self.tasks[id.index()] as *mut Tcb
    }

    /// Pick the next task to run
    pub fn select_next(&self) -> Option<TaskId> {
        if self.len == 0 {
            return None;
        }
        let start = self.last.map_or(0, |id| id.index() + 1);
        (0..self.len)
            .map(|k| (start + k) % self.len)
            .find(|&i| self.tasks[i].is_runnable())
            .map(|i| TaskId::new(i as u8))
    }

    /// Set waiting reasons on a task
    ///
    /// With a deadline, `WAIT_TIMER` is added and the wake tick stored.
    pub fn block(
        &mut self,
        id: TaskId,
        reasons: u8,
        deadline: Option<Tick>,
    ) -> Result<(), FatalError> {
        if reasons == 0 || reasons & !status::WAITING != 0 {
            return Err(FatalError::IllegalWait);
        }
        if reasons & status::WAIT_TIMER != 0 && deadline.is_none() {
            return Err(FatalError::IllegalWait);
        }
        let tcb = self.get_mut(id).ok_or(FatalError::IllegalWait)?;
        if tcb.is_stopped() {
            return Err(FatalError::IllegalWait);
        }

        tcb.status.block(reasons);
        if let Some(until) = deadline {
            tcb.status.block(status::WAIT_TIMER);
            tcb.wait_until = until;
        }
        Ok(())
    }

    /// Clear one waiting reason set by a producer
    ///
    /// The companion timeout is cancelled along with it, so a task waiting on
    /// "condition or timeout" wakes on whichever happens first. Returns true
    /// if the task became runnable.
    pub fn release(&mut self, id: TaskId, reason: u8) -> bool {
        match self.get_mut(id) {
            Some(tcb) if tcb.status.is_waiting_on(reason) => {
                tcb.status.release(reason | status::WAIT_TIMER);
                tcb.is_runnable()
            }
            _ => false,
        }
    }

    /// Release `reason` on every task accepted by `pred`
    pub fn release_where<F>(&mut self, reason: u8, mut pred: F) -> bool
    where
        F: FnMut(&Tcb) -> bool,
    {
        let mut woke = false;
        for tcb in self.tasks[..self.len].iter_mut() {
            if tcb.status.is_waiting_on(reason) && pred(tcb) {
                tcb.status.release(reason | status::WAIT_TIMER);
                woke |= tcb.is_runnable();
            }
        }
        woke
    }

    /// Timer wake scan
    ///
    /// Every task waiting on the timer whose deadline equals `now` loses all
    /// of its waiting reasons. Returns true if any task was released.
    pub fn wake_expired(&mut self, now: Tick) -> bool {
        let mut woke = false;
        for tcb in self.tasks[..self.len].iter_mut() {
            if tcb.status.is_waiting_on(status::WAIT_TIMER) && tcb.wait_until == now {
                tcb.status.release(status::WAITING);
                woke = true;
            }
        }
        woke
    }

    /// Move a task to the terminal state
    pub fn stop(&mut self, id: TaskId) -> KernelResult<()> {
        let tcb = self.get_mut(id).ok_or(KernelError::TaskInvalid)?;
        tcb.status = crate::types::TaskStatus::STOPPED;
        tcb.send_dest = None;
        Ok(())
    }
}

impl<const N: usize> Default for TaskTable<N> {
    fn default() -> Self {
        Self::new()
    }
}
