use crate::debug;
use crate::virtual_machine::Word;
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::program::Program;
use crate::virtual_machine::vm::{MemoryModel, Step, VM};
use std::collections::VecDeque;

/// Result of running a program to completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchRun {
    /// Every value written, in order.
    pub outputs: Vec<Word>,
    /// Dense memory at halt.
    pub memory: Vec<Word>,
    /// Instructions executed.
    pub steps: u64,
}

/// Runs `program` until it halts, feeding it `inputs` in order.
///
/// Fails with [`VMError::InputExhausted`] if the program asks for more input
/// than supplied.
pub fn run_batch(program: Program, inputs: &[Word]) -> Result<BatchRun, VMError> {
    run_batch_with(program, MemoryModel::default(), inputs)
}

/// [`run_batch`] with an explicit memory model.
pub fn run_batch_with(
    program: Program,
    model: MemoryModel,
    inputs: &[Word],
) -> Result<BatchRun, VMError> {
    let queue: VecDeque<Word> = inputs.iter().copied().collect();
    let mut vm = VM::with_memory_model(program, model, queue, Vec::new());

    if vm.run()? == Step::Blocked {
        return Err(VMError::InputExhausted { ip: vm.ip() });
    }

    let memory = vm.memory().to_vec();
    let steps = vm.steps();
    let (_, outputs) = vm.into_ports();
    debug!("batch run halted after {steps} steps, {} outputs", outputs.len());

    Ok(BatchRun {
        outputs,
        memory,
        steps,
    })
}

/// Runs one instance per phase in sequence. Each gets inputs `[phase, signal]`
/// and its last output becomes the next instance's signal.
///
/// Returns the final signal, or `None` if some instance produced no output.
pub fn run_chain(
    program: &Program,
    phases: &[Word],
    signal: Word,
) -> Result<Option<Word>, VMError> {
    run_chain_with(program, MemoryModel::default(), phases, signal)
}

/// [`run_chain`] with an explicit memory model for every instance.
pub fn run_chain_with(
    program: &Program,
    model: MemoryModel,
    phases: &[Word],
    signal: Word,
) -> Result<Option<Word>, VMError> {
    let mut signal = signal;
    for &phase in phases {
        let run = run_batch_with(program.clone(), model, &[phase, signal])?;
        match run.outputs.last() {
            Some(&value) => signal = value,
            None => return Ok(None),
        }
    }
    Ok(Some(signal))
}
