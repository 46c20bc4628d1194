//! Kernel core
//!
//! Task table, scheduler, tick and the guarded sections they share.

pub mod config;
pub mod cpu;
pub mod critical;
pub mod cs_cell;
pub mod error;
pub mod kernel;
pub mod sched;
pub mod task;
pub mod time;
pub mod types;
