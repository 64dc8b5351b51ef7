//! Intcode library.
//!
//! Provides a suspendable Intcode virtual machine and the drivers that run
//! one or many instances of it: batch runs, feedback rings, interactive hosts
//! and phase searches.

pub mod orchestration;
pub mod utils;
pub mod virtual_machine;
