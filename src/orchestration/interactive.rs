//! Step-with-recompute driver.
//!
//! The host sees every output as soon as it is written. Whenever the machine
//! stalls on `IN`, the host is asked for a fresh value computed from what it
//! has observed so far, and the same instruction is retried with it.

use crate::debug;
use crate::virtual_machine::Word;
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::program::Program;
use crate::virtual_machine::vm::{MemoryModel, Step, VM};
use std::collections::VecDeque;

/// External party driving an interactive session.
pub trait Host {
    /// Receives one value written by the machine.
    fn observe(&mut self, value: Word);

    /// Computes the next input. Returning `None` ends the session with the
    /// machine still blocked.
    fn input(&mut self) -> Option<Word>;
}

/// Totals for a finished session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub outputs: usize,
    pub inputs: usize,
    /// False if the host ended the session early.
    pub halted: bool,
}

/// Loads `program` and drives it with `host` until it halts.
pub fn run_interactive<H: Host + ?Sized>(
    program: Program,
    host: &mut H,
) -> Result<Session, VMError> {
    run_interactive_with(program, MemoryModel::default(), host)
}

pub fn run_interactive_with<H: Host + ?Sized>(
    program: Program,
    model: MemoryModel,
    host: &mut H,
) -> Result<Session, VMError> {
    let mut vm = VM::with_memory_model(program, model, VecDeque::new(), Vec::new());
    drive(&mut vm, host)
}

/// Drives an already-loaded machine with `host`.
pub fn drive<H: Host + ?Sized>(
    vm: &mut VM<VecDeque<Word>, Vec<Word>>,
    host: &mut H,
) -> Result<Session, VMError> {
    let mut session = Session::default();

    while vm.is_running() {
        match vm.step()? {
            Step::Continue | Step::Halted => {
                for value in vm.output_mut().drain(..) {
                    host.observe(value);
                    session.outputs += 1;
                }
            }
            Step::Blocked => match host.input() {
                Some(value) => {
                    vm.input_mut().push_back(value);
                    session.inputs += 1;
                }
                None => {
                    debug!("host ended session at address {}", vm.ip());
                    return Ok(session);
                }
            },
        }
    }

    session.halted = true;
    Ok(session)
}
