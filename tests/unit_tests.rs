//! Unit tests for the kernel
//!
//! These tests run on the host (not embedded target). The port is a stub
//! there: switches are recorded in the task table but never carried out, so
//! the kernel can be stepped tick by tick from a single thread.

#[cfg(test)]
mod tick_tests {
    use cubekern::time::{deadline, tick_elapsed, tick_has_elapsed};
    use cubekern::TIMER_INFINITE;

    #[test]
    fn test_elapsed_over_wrap() {
        let start: u16 = 65500;
        let now = start.wrapping_add(100);
        assert_eq!(now, 64);
        assert_eq!(tick_elapsed(start, now), 100);
        assert!(tick_has_elapsed(start, now, 100));
        assert!(!tick_has_elapsed(start, now, 101));
    }

    #[test]
    fn test_infinite_timeout() {
        assert!(!tick_has_elapsed(0, 0xFFFE, TIMER_INFINITE));
        assert_eq!(deadline(1, TIMER_INFINITE), 0);
    }
}

#[cfg(test)]
mod table_tests {
    use cubekern::sched::TaskTable;
    use cubekern::status;
    use cubekern::task::Tcb;
    use cubekern::TaskId;

    const A: TaskId = TaskId::new(0);
    const B: TaskId = TaskId::new(1);

    fn two_tasks() -> TaskTable<2> {
        let mut table = TaskTable::new();
        for name in ["a", "b"] {
            table
                .insert(Tcb::with_stack(name, core::ptr::null_mut(), core::ptr::null_mut(), 0))
                .unwrap();
        }
        table
    }

    #[test]
    fn test_timed_wait_hands_over_and_back() {
        let mut table = two_tasks();
        assert_eq!(table.select_next(), Some(A));

        // A waits 250 ticks from tick 0
        table.block(A, status::WAIT_TIMER, Some(250)).unwrap();
        assert_eq!(table.select_next(), Some(B));

        for now in 1..250 {
            assert!(!table.wake_expired(now));
        }
        assert!(table.wake_expired(250));
        assert!(table.is_runnable(A));
    }

    #[test]
    fn test_wait_across_wrap() {
        let mut table = two_tasks();
        let until = cubekern::time::deadline(65500, 100);
        table.block(B, status::WAIT_TIMER, Some(until)).unwrap();

        assert!(!table.wake_expired(65535));
        assert!(!table.wake_expired(63));
        assert!(table.wake_expired(64));
        assert!(table.is_runnable(B));
    }

    #[test]
    fn test_nothing_runnable() {
        let mut table = two_tasks();
        table.block(A, status::WAIT_RECV, None).unwrap();
        table.block(B, status::WAIT_CUBE, None).unwrap();
        assert_eq!(table.select_next(), None);

        table.release(B, status::WAIT_CUBE);
        assert_eq!(table.select_next(), Some(B));
    }
}

#[cfg(test)]
mod fifo_tests {
    use cubekern::sync::fifo::Fifo;

    #[test]
    fn test_fifo_order_and_bounds() {
        let mut fifo: Fifo<u8, 4> = Fifo::new();
        for i in 0..4 {
            fifo.push(i).unwrap();
        }
        assert!(fifo.is_full());
        assert_eq!(fifo.push(9), Err(9));

        assert_eq!(fifo.pop(), Some(0));
        fifo.push(4).unwrap();
        assert_eq!(fifo.len(), 4);

        let drained: Vec<u8> = core::iter::from_fn(|| fifo.pop()).collect();
        assert_eq!(drained, [1, 2, 3, 4]);
        assert!(fifo.is_empty());
    }
}

#[cfg(test)]
mod error_tests {
    use cubekern::error::{FatalError, KernelError};

    #[test]
    fn test_error_variants() {
        assert!(KernelError::Timeout.is_timeout());
        assert!(!KernelError::QueueFull.is_timeout());
        assert_ne!(KernelError::QueueFull, KernelError::QueueEmpty);
    }

    #[test]
    fn test_error_debug() {
        let _ = format!("{:?}", KernelError::FrameNotOwned);
        let _ = format!("{:?}", FatalError::IllegalWait);
    }
}

#[cfg(test)]
mod config_tests {
    use cubekern::config::*;

    #[test]
    fn test_config_values() {
        assert!(TASK_COUNT >= 1);
        assert!(TASK_COUNT <= u8::MAX as usize);

        assert_eq!(TICK_RATE_HZ, 1000, "one tick per millisecond");
        assert_eq!(CPU_CLOCK_HZ % TICK_RATE_HZ, 0);

        assert_eq!(CUBE_LAYER_COUNT * CUBE_LAYER_SIZE, CUBE_FRAME_SIZE);
        assert!(CUBE_FRAME_BUFFER_COUNT >= 2);
    }
}

/// Tests driving the global kernel
///
/// They share one kernel instance and run one at a time.
#[cfg(test)]
mod kernel_tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Mutex, MutexGuard};

    use cubekern::cube::{self, CubePort, FrameInit};
    use cubekern::error::KernelError;
    use cubekern::msg;
    use cubekern::time;
    use cubekern::{current_task, os_init, os_start, task_create, TaskId, StkElement};

    static KERNEL_LOCK: Mutex<()> = Mutex::new(());

    fn lock() -> MutexGuard<'static, ()> {
        KERNEL_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn stack(size: usize) -> &'static mut [StkElement] {
        Box::leak(vec![0; size].into_boxed_slice())
    }

    fn task_body() {}

    /// Init, create `n` tasks and start; the first task is current
    fn boot(n: usize) -> Vec<TaskId> {
        os_init().unwrap();
        let ids = (0..n)
            .map(|_| task_create(stack(128), "task", task_body).unwrap())
            .collect();
        os_start().unwrap();
        ids
    }

    fn ticks(n: u32) {
        for _ in 0..n {
            time::os_tick_handler();
        }
    }

    #[test]
    fn test_wait_switches_and_resumes() {
        let _guard = lock();
        let ids = boot(2);
        assert_eq!(current_task(), Some(ids[0]));
        assert_eq!(time::now(), 0);

        time::wait(250);
        assert_eq!(current_task(), Some(ids[1]));

        ticks(249);
        assert_eq!(current_task(), Some(ids[1]));

        ticks(1);
        assert_eq!(time::now(), 250);
        assert_eq!(current_task(), Some(ids[0]));
    }

    #[test]
    fn test_idle_when_all_wait() {
        let _guard = lock();
        let ids = boot(1);

        time::wait(3);
        assert_eq!(current_task(), None);

        ticks(3);
        assert_eq!(current_task(), Some(ids[0]));
    }

    #[test]
    fn test_zero_wait_keeps_running() {
        let _guard = lock();
        let ids = boot(2);
        time::wait(0);
        assert_eq!(current_task(), Some(ids[0]));
    }

    #[test]
    fn test_elapsed_queries() {
        let _guard = lock();
        boot(1);

        let start = time::now();
        ticks(10);
        assert_eq!(time::elapsed(start), 10);
        assert!(time::has_elapsed(start, 10));
        assert!(!time::has_elapsed(start, 11));
        assert!(!time::has_elapsed(start, cubekern::TIMER_INFINITE));
    }

    #[test]
    fn test_multi_hour_wait_before_start() {
        let _guard = lock();
        os_init().unwrap();

        // No task is current yet, so every step returns at once
        time::wait_hmsm(2, 0, 0, 0);
        time::wait_hmsm(1500, 30, 0, 0);
        assert_eq!(time::hmsm_ticks(2, 0, 0, 0), 7_200_000);
    }

    #[test]
    fn test_start_and_create_errors() {
        let _guard = lock();
        os_init().unwrap();

        assert_eq!(
            task_create(stack(8), "tiny", task_body),
            Err(KernelError::StkSizeInvalid)
        );
        for _ in 0..cubekern::config::TASK_COUNT {
            task_create(stack(128), "task", task_body).unwrap();
        }
        assert_eq!(
            task_create(stack(128), "extra", task_body),
            Err(KernelError::NoMoreTasks)
        );

        os_start().unwrap();
        assert_eq!(os_start(), Err(KernelError::OsRunning));
        assert_eq!(
            task_create(stack(128), "late", task_body),
            Err(KernelError::OsRunning)
        );
    }

    #[test]
    #[should_panic(expected = "cpu halted")]
    fn test_start_without_tasks_is_fatal() {
        let _guard = lock();
        os_init().unwrap();
        let _ = os_start();
    }

    #[test]
    fn test_stop_current_task_hands_over() {
        let _guard = lock();
        let ids = boot(2);

        cubekern::task_stop(ids[0]).unwrap();
        assert_eq!(current_task(), Some(ids[1]));

        // A stopped task stays stopped across timer wakes
        ticks(100);
        assert_eq!(current_task(), Some(ids[1]));
    }

    #[test]
    fn test_inbox_and_outbox() {
        let _guard = lock();
        let ids = boot(2);
        let me = ids[0];

        msg::post(me, 5).unwrap();
        assert_eq!(msg::receive(0), Ok(5));
        assert_eq!(msg::receive(0), Err(KernelError::Timeout));

        msg::send(7, 0).unwrap();
        assert_eq!(msg::take(me), Ok(7));
        assert_eq!(msg::take(me), Err(KernelError::QueueEmpty));

        assert_eq!(msg::post(TaskId::new(9), 1), Err(KernelError::TaskInvalid));
        assert_eq!(msg::take(TaskId::new(9)), Err(KernelError::TaskInvalid));
        assert_eq!(msg::send_to(TaskId::new(9), 1, 0), Err(KernelError::TaskInvalid));
    }

    #[test]
    fn test_send_to_full_inbox_times_out() {
        let _guard = lock();
        let ids = boot(2);

        for i in 0..cubekern::config::FIFO_CAPACITY {
            msg::send_to(ids[1], i as u8, 0).unwrap();
        }
        assert_eq!(msg::send_to(ids[1], 0xFF, 0), Err(KernelError::Timeout));
        assert_eq!(msg::post(ids[1], 0xFF), Err(KernelError::QueueFull));
        assert_eq!(current_task(), Some(ids[0]));
    }

    #[test]
    fn test_post_reaches_other_task() {
        let _guard = lock();
        let ids = boot(2);

        time::wait(5);
        assert_eq!(current_task(), Some(ids[1]));
        ticks(5);
        assert_eq!(current_task(), Some(ids[0]));

        // Task 0 posts to task 1, then steps aside so task 1 can read it
        msg::post(ids[1], 3).unwrap();
        time::wait(1);
        assert_eq!(current_task(), Some(ids[1]));
        assert_eq!(msg::receive(0), Ok(3));
    }

    static SHOWN: AtomicU32 = AtomicU32::new(0);
    static BLANKED: AtomicU32 = AtomicU32::new(0);

    struct CountingPort;

    impl CubePort for CountingPort {
        fn show_layer(&mut self, _layer: u8, _data: &[u8]) {
            SHOWN.fetch_add(1, Ordering::SeqCst);
        }

        fn blank(&mut self) {
            BLANKED.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_frames_cycle_through_refresh() {
        let _guard = lock();
        boot(1);
        cube::set_port(Box::leak(Box::new(CountingPort)));
        cube::enable();
        SHOWN.store(0, Ordering::SeqCst);
        BLANKED.store(0, Ordering::SeqCst);

        let mut frame = cube::advance_frame(None, FrameInit::Clear, 0).unwrap();
        frame.data_mut()[0] = 0xAA;
        let first = frame.index();

        let next = cube::advance_frame(Some(frame), FrameInit::Copy, 0).unwrap();
        assert_ne!(next.index(), first);
        assert_eq!(next.data()[0], 0xAA);

        // One full frame of layers from the submitted buffer
        ticks(cubekern::config::CUBE_LAYER_COUNT as u32);
        assert_eq!(SHOWN.load(Ordering::SeqCst), cubekern::config::CUBE_LAYER_COUNT as u32);
        assert_eq!(BLANKED.load(Ordering::SeqCst), 0);

        cube::disable();
        ticks(1);
        assert!(BLANKED.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_frame_pool_exhaustion_times_out() {
        let _guard = lock();
        boot(1);

        let mut held = Vec::new();
        for _ in 0..cubekern::config::CUBE_FRAME_BUFFER_COUNT {
            held.push(cube::advance_frame(None, FrameInit::AsIs, 0).unwrap());
        }
        assert!(matches!(
            cube::advance_frame(None, FrameInit::AsIs, 0),
            Err(KernelError::Timeout)
        ));
    }
}
