//! Drivers built on the VM's step/suspend contract.
//!
//! # Modules
//!
//! - [`batch`]: run to completion on predetermined input, and serial chains
//! - [`ring`]: round-robin scheduling of machines wired output-to-input in a cycle
//! - [`interactive`]: a host that observes output and computes input on demand
//! - [`phases`]: phase-setting permutations and best-signal search

pub mod batch;
pub mod interactive;
pub mod phases;
pub mod ring;
