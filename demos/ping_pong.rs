//! Ping pong demo - two tasks bounce a counter through their inboxes

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use cubekern::msg;
use cubekern::time;
use cubekern::{StkElement, TaskId, TIMER_INFINITE};

static mut PING_STK: [StkElement; 256] = [0; 256];
static mut PONG_STK: [StkElement; 256] = [0; 256];

const PING: TaskId = TaskId::new(0);
const PONG: TaskId = TaskId::new(1);

fn ping_task() {
    let mut ball = 0u8;
    loop {
        if msg::send_to(PONG, ball, TIMER_INFINITE).is_err() {
            continue;
        }
        match msg::receive(1000) {
            Ok(back) => {
                cubekern::info!("ping got {=u8}", back);
                ball = back.wrapping_add(1);
            }
            Err(e) => cubekern::warn!("pong is late: {}", e),
        }
        time::wait(100);
    }
}

fn pong_task() {
    loop {
        if let Ok(ball) = msg::receive(TIMER_INFINITE) {
            let _ = msg::send_to(PING, ball.wrapping_add(1), TIMER_INFINITE);
        }
    }
}

#[entry]
fn main() -> ! {
    cubekern::os_init().expect("kernel init failed");

    let ping = cubekern::task_create(unsafe { &mut *(&raw mut PING_STK) }, "Ping", ping_task)
        .expect("ping task creation failed");
    let pong = cubekern::task_create(unsafe { &mut *(&raw mut PONG_STK) }, "Pong", pong_task)
        .expect("pong task creation failed");
    debug_assert_eq!((ping, pong), (PING, PONG));

    cubekern::os_start().expect("kernel start failed");

    loop {
        cortex_m::asm::wfi();
    }
}
