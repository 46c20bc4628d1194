//! Compile-time configuration for the cube kernel
//!
//! These constants fix the shape of every statically allocated table.

/// Number of task slots in the task table
pub const TASK_COUNT: usize = 4;

/// System tick rate in Hz
pub const TICK_RATE_HZ: u32 = 1000;

/// Core clock feeding SysTick
pub const CPU_CLOCK_HZ: u32 = 16_000_000;

/// Minimum task stack size in words
pub const STACK_SIZE_MIN: usize = 64;

/// Stack of the idle context in words
pub const IDLE_STACK_SIZE: usize = 128;

/// Capacity of each task FIFO (inbound and outbound)
pub const FIFO_CAPACITY: usize = 16;

/// Size of one 3D frame in bytes
pub const CUBE_FRAME_SIZE: usize = 64;

/// Number of frame buffers
pub const CUBE_FRAME_BUFFER_COUNT: usize = 16;

/// Number of multiplexed layers in a frame
pub const CUBE_LAYER_COUNT: usize = 8;

/// Bytes shown per multiplex step
pub const CUBE_LAYER_SIZE: usize = CUBE_FRAME_SIZE / CUBE_LAYER_COUNT;
