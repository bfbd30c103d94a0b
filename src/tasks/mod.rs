//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a cache is open.
//!
//! # Tasks
//! - Sweep: Removes expired unreferenced records at a configured interval

mod sweep;

pub(crate) use sweep::spawn_sweep_task;
