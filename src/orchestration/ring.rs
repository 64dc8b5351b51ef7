//! Feedback ring of cooperatively scheduled machines.
//!
//! Machine `i` writes into the input queue of machine `(i + 1) % n`; the last
//! machine feeds the first. Each queue is owned by its consumer and the
//! producer only pushes into it. One control thread steps every live machine
//! once per round until all have halted.

use crate::virtual_machine::Word;
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::program::Program;
use crate::virtual_machine::vm::ports::{OutputPort, Pipe};
use crate::virtual_machine::vm::{MemoryModel, Step, VM};
use crate::{debug, info};
use std::cell::Cell;
use std::rc::Rc;

/// Producer end of a ring connection. Remembers the last value it pushed.
#[derive(Clone, Debug, Default)]
pub struct Link {
    pipe: Pipe,
    last: Rc<Cell<Option<Word>>>,
}

impl Link {
    fn new(pipe: Pipe) -> Self {
        Self {
            pipe,
            last: Rc::default(),
        }
    }

    /// Most recent value written through this link.
    pub fn last(&self) -> Option<Word> {
        self.last.get()
    }
}

impl OutputPort for Link {
    fn write(&mut self, value: Word) {
        self.last.set(Some(value));
        self.pipe.push(value);
    }
}

/// Outcome of one scheduling round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Round {
    /// Machines that executed an instruction (including halting).
    pub advanced: usize,
    /// Machines that stayed blocked on input.
    pub blocked: usize,
}

/// A ring of machines running the same program, one per phase setting.
pub struct FeedbackRing {
    machines: Vec<VM<Pipe, Link>>,
    /// `inlets[i]` is the input queue of machine `i`.
    inlets: Vec<Pipe>,
    rounds: u64,
}

impl FeedbackRing {
    /// Builds the ring. Each machine's queue starts with its phase.
    pub fn new(program: &Program, phases: &[Word]) -> Self {
        Self::with_memory_model(program, phases, MemoryModel::default())
    }

    pub fn with_memory_model(program: &Program, phases: &[Word], model: MemoryModel) -> Self {
        let inlets: Vec<Pipe> = phases.iter().map(|&p| Pipe::with_values([p])).collect();
        let n = inlets.len();
        let machines = (0..n)
            .map(|i| {
                let input = inlets[i].clone();
                let output = Link::new(inlets[(i + 1) % n].clone());
                VM::with_memory_model(program.clone(), model, input, output)
            })
            .collect();

        Self {
            machines,
            inlets,
            rounds: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Appends `signal` to the first machine's input queue.
    pub fn seed(&self, signal: Word) {
        if let Some(first) = self.inlets.first() {
            first.push(signal);
        }
    }

    /// Whether every machine has halted.
    pub fn is_halted(&self) -> bool {
        self.machines.iter().all(|vm| !vm.is_running())
    }

    /// Rounds completed so far.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    pub fn machine(&self, index: usize) -> Option<&VM<Pipe, Link>> {
        self.machines.get(index)
    }

    /// Last value the final machine fed back to the first.
    pub fn feedback(&self) -> Option<Word> {
        self.machines.last().and_then(|vm| vm.output().last())
    }

    /// Steps every live machine once, in ring order.
    pub fn step_round(&mut self) -> Result<Round, VMError> {
        let mut round = Round::default();
        for vm in self.machines.iter_mut().filter(|vm| vm.is_running()) {
            match vm.step()? {
                Step::Blocked => round.blocked += 1,
                Step::Continue | Step::Halted => round.advanced += 1,
            }
        }
        self.rounds += 1;
        Ok(round)
    }

    /// Seeds `signal` and drives the ring until every machine halts.
    ///
    /// Returns the final feedback value, or `None` if the last machine never
    /// wrote anything. Fails with [`VMError::Deadlock`] when a full round
    /// passes with every live machine blocked.
    pub fn run(&mut self, signal: Word) -> Result<Option<Word>, VMError> {
        self.seed(signal);
        while !self.is_halted() {
            let round = self.step_round()?;
            if round.advanced == 0 {
                return Err(VMError::Deadlock {
                    blocked: round.blocked,
                });
            }
            if round.blocked > 0 {
                debug!(
                    "round {}: {} advanced, {} blocked",
                    self.rounds, round.advanced, round.blocked
                );
            }
        }

        let result = self.feedback();
        info!(
            "ring of {} halted after {} rounds, feedback {:?}",
            self.len(),
            self.rounds,
            result
        );
        Ok(result)
    }
}

/// Runs a fresh ring over `phases` with initial signal `signal`.
pub fn run_ring(
    program: &Program,
    phases: &[Word],
    signal: Word,
) -> Result<Option<Word>, VMError> {
    FeedbackRing::new(program, phases).run(signal)
}
