//! Scroll demo - sweeps a lit plane through the cube on STM32F401
//!
//! One task renders frames, a second blinks the board LED so the scheduler
//! has somebody to hand over to while the renderer waits.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use cubekern::cube::{self, CubePort, Frame, FrameInit};
use cubekern::time;
use cubekern::{StkElement, TIMER_INFINITE};

#[cfg(feature = "pac")]
use stm32_metapac as pac;

// ============ Task Storage ============

static mut SCROLL_STK: [StkElement; 512] = [0; 512];
static mut BLINK_STK: [StkElement; 256] = [0; 256];

// ============ Board ============

/// Layer data goes out on GPIOB, the layer select on GPIOC
struct BoardPort;

#[cfg(feature = "pac")]
impl CubePort for BoardPort {
    fn show_layer(&mut self, layer: u8, data: &[u8]) {
        pac::GPIOC.odr().write(|w| w.0 = 0);
        pac::GPIOB.odr().write(|w| w.0 = data[0] as u32);
        pac::GPIOC.odr().write(|w| w.0 = 1 << layer);
    }

    fn blank(&mut self) {
        pac::GPIOC.odr().write(|w| w.0 = 0);
    }
}

#[cfg(not(feature = "pac"))]
impl CubePort for BoardPort {
    fn show_layer(&mut self, _layer: u8, _data: &[u8]) {}
    fn blank(&mut self) {}
}

static mut PORT: BoardPort = BoardPort;

#[cfg(feature = "pac")]
fn board_init() {
    pac::RCC.ahb1enr().modify(|w| {
        w.set_gpioaen(true);
        w.set_gpioben(true);
        w.set_gpiocen(true);
    });
    pac::GPIOA.moder().modify(|w| w.set_moder(5, pac::gpio::vals::Moder::OUTPUT));
    for pin in 0..8 {
        pac::GPIOB.moder().modify(|w| w.set_moder(pin, pac::gpio::vals::Moder::OUTPUT));
        pac::GPIOC.moder().modify(|w| w.set_moder(pin, pac::gpio::vals::Moder::OUTPUT));
    }
}

#[cfg(feature = "pac")]
fn led_toggle(on: bool) {
    pac::GPIOA.bsrr().write(|w| if on { w.set_bs(5, true) } else { w.set_br(5, true) });
}

#[cfg(not(feature = "pac"))]
fn board_init() {}
#[cfg(not(feature = "pac"))]
fn led_toggle(_on: bool) {}

// ============ Drawing ============

/// Light plane `pos` along `axis` (0 = x, 1 = y, 2 = z)
fn set_plane(frame: &mut Frame, axis: u8, pos: u8) {
    for (i, byte) in frame.data_mut().iter_mut().enumerate() {
        let (layer, row) = (i / 8, i % 8);
        *byte = match axis {
            0 => 1 << pos,
            1 if row == pos as usize => 0xFF,
            2 if layer == pos as usize => 0xFF,
            _ => 0,
        };
    }
}

// ============ Tasks ============

fn scroll_task() {
    cubekern::info!("scroll task started");
    cube::enable();

    let mut frame: Option<Frame> = None;
    let (mut axis, mut pos) = (0u8, 0u8);

    loop {
        let mut next = match cube::advance_frame(frame.take(), FrameInit::Clear, TIMER_INFINITE) {
            Ok(next) => next,
            Err(e) => {
                cubekern::warn!("no frame: {}", e);
                continue;
            }
        };
        set_plane(&mut next, axis, pos);
        frame = Some(next);

        pos += 1;
        if pos >= 8 {
            pos = 0;
            axis = (axis + 1) % 3;
        }

        time::wait(250);
    }
}

fn blink_task() {
    let mut on = false;
    loop {
        on = !on;
        led_toggle(on);
        time::wait(500);
    }
}

// ============ Main ============

#[entry]
fn main() -> ! {
    board_init();

    cubekern::os_init().expect("kernel init failed");
    cube::set_port(unsafe { &mut *(&raw mut PORT) });

    cubekern::task_create(unsafe { &mut *(&raw mut SCROLL_STK) }, "Scroll", scroll_task)
        .expect("scroll task creation failed");
    cubekern::task_create(unsafe { &mut *(&raw mut BLINK_STK) }, "Blink", blink_task)
        .expect("blink task creation failed");

    cubekern::os_start().expect("kernel start failed");

    loop {
        cortex_m::asm::wfi();
    }
}
