//! Background Tasks Module
//!
//! # Tasks
//! - Expiry sweep: removes expired authorization entries at a fixed interval

mod sweep;

pub use sweep::spawn_sweep_task;
