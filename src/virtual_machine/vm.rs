//! Core virtual machine implementation.
//!
//! The VM executes Intcode one instruction per [`VM::step`]. A step either
//! completes an instruction, halts, or *blocks*: when `IN` finds no input
//! available the instruction pointer stays on the `IN` instruction and the
//! step reports [`Step::Blocked`], so the caller can supply input and step
//! again. This is the only suspension point; it lets a single-threaded
//! scheduler interleave any number of machines.
//!
//! All arithmetic uses wrapping semantics on 64-bit words.

mod memory;
pub mod ports;
#[cfg(test)]
mod tests;

pub use memory::MemoryModel;

use crate::virtual_machine::Word;
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::isa::Instruction;
use crate::virtual_machine::operand::Modes;
use crate::virtual_machine::program::Program;
use memory::{Memory, Site};
use ports::{InputPort, OutputPort};
use std::collections::VecDeque;

/// Lifecycle state of a VM.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// Loaded, no instruction executed yet.
    Ready,
    /// Executing normally.
    Running,
    /// Stalled on `IN` with no input available; the next step retries it.
    Blocked,
    /// Terminal. Further steps do nothing.
    Halted,
}

/// Outcome of a single [`VM::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// An instruction completed; more may follow.
    Continue,
    /// No progress is possible until input arrives.
    Blocked,
    /// The machine has halted.
    Halted,
}

/// Pointer update requested by an instruction handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    /// Move past the instruction and its parameters.
    Advance,
    /// Continue at the given address.
    Jump(usize),
    /// Leave the pointer on the current instruction and suspend.
    Block,
    Halt,
}

/// Parameter cursor for the instruction being executed.
struct Operands {
    modes: Modes,
    /// Zero-based index of the next parameter to consume.
    next: usize,
}

macro_rules! exec_vm {
    // Entry point
    (
        vm = $vm:ident,
        operands = $ops:ident,
        instr = $instr:ident,
        { $( $variant:ident => $handler:ident ( $( $field:ident : $kind:ident ),* $(,)? ) ),* $(,)? }
    ) => {{
        match $instr {
            $(
                Instruction::$variant => {
                    $( let $field = exec_vm!(@read $vm, $ops, $kind)?; )*
                    $vm.$handler($( $field ),*)
                }
            ),*
        }
    }};

    // Value of a source parameter
    (@read $vm:ident, $ops:ident, Src) => {{
        $vm.src($ops)
    }};

    // Address of a write-target parameter
    (@read $vm:ident, $ops:ident, Dst) => {{
        $vm.dst($ops)
    }};
}

/// Intcode virtual machine.
///
/// Owns its memory, instruction pointer and relative base exclusively. The
/// ports are whatever the owner supplies: owned queues, closures, `&mut`
/// references to host state, or [`Pipe`](ports::Pipe)s shared with other
/// machines.
pub struct VM<I = VecDeque<Word>, O = Vec<Word>> {
    /// Address space holding the loaded program.
    memory: Memory,
    /// Instruction pointer (address of the next instruction word).
    ip: usize,
    /// Offset applied to relative-mode parameters.
    relative_base: Word,
    status: Status,
    /// Instructions completed since load.
    steps: u64,
    input: I,
    output: O,
}

impl VM {
    /// Creates a VM with a queue of predetermined inputs and an output collector.
    pub fn with_inputs<P, T>(program: P, inputs: T) -> Self
    where
        P: Into<Program>,
        T: IntoIterator<Item = Word>,
    {
        VM::new(program.into(), inputs.into_iter().collect(), Vec::new())
    }
}

impl<I: InputPort, O: OutputPort> VM<I, O> {
    /// Creates a VM using the default [`MemoryModel::Extended`] address space.
    pub fn new(program: Program, input: I, output: O) -> Self {
        Self::with_memory_model(program, MemoryModel::default(), input, output)
    }

    /// Creates a VM with an explicit memory model.
    pub fn with_memory_model(program: Program, model: MemoryModel, input: I, output: O) -> Self {
        let mut vm = Self {
            memory: Memory::new(Vec::new(), model),
            ip: 0,
            relative_base: 0,
            status: Status::Halted,
            steps: 0,
            input,
            output,
        };
        vm.load(program);
        vm
    }

    /// Replaces memory with `program` and resets all registers.
    ///
    /// An empty program leaves the machine halted. Ports are kept.
    pub fn load(&mut self, program: Program) {
        self.memory = Memory::new(program.into_words(), self.memory.model());
        self.ip = 0;
        self.relative_base = 0;
        self.steps = 0;
        self.status = if self.memory.len() == 0 {
            Status::Halted
        } else {
            Status::Ready
        };
    }

    /// Executes at most one instruction.
    ///
    /// On [`Step::Blocked`] nothing has changed: memory, pointer and relative
    /// base are as they were, and no input was consumed. Errors are fatal and
    /// leave the machine state untouched.
    pub fn step(&mut self) -> Result<Step, VMError> {
        if self.status == Status::Halted {
            return Ok(Step::Halted);
        }

        let word = self.memory.get(self.ip)?;
        let (instruction, modes) = Instruction::decode(word, self.ip)?;
        let mut operands = Operands { modes, next: 0 };

        let flow = self.exec(instruction, &mut operands)?;
        debug_assert_eq!(operands.next, instruction.arity());

        match flow {
            Flow::Block => {
                self.status = Status::Blocked;
                return Ok(Step::Blocked);
            }
            Flow::Halt => {
                self.steps += 1;
                self.status = Status::Halted;
                return Ok(Step::Halted);
            }
            Flow::Advance => self.ip += instruction.size(),
            Flow::Jump(target) => self.ip = target,
        }
        self.steps += 1;

        if self.memory.model() == MemoryModel::Bounded && self.ip >= self.memory.len() {
            self.status = Status::Halted;
            return Ok(Step::Halted);
        }

        self.status = Status::Running;
        Ok(Step::Continue)
    }

    /// Steps until the machine halts or blocks, returning which.
    pub fn run(&mut self) -> Result<Step, VMError> {
        loop {
            match self.step()? {
                Step::Continue => {}
                stop => return Ok(stop),
            }
        }
    }

    /// Whether the machine can still make progress (anything but halted).
    pub fn is_running(&self) -> bool {
        self.status != Status::Halted
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Reads a memory cell for diagnostics. Unwritten cells read as 0.
    pub fn peek(&self, address: usize) -> Word {
        self.memory.peek(address)
    }

    /// Returns the dense (program) region of memory.
    pub fn memory(&self) -> &[Word] {
        self.memory.dense()
    }

    pub fn memory_model(&self) -> MemoryModel {
        self.memory.model()
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn relative_base(&self) -> Word {
        self.relative_base
    }

    /// Number of instructions completed since load. Blocked attempts do not count.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Consumes the VM, returning its ports.
    pub fn into_ports(self) -> (I, O) {
        (self.input, self.output)
    }

    /// Takes the next raw parameter word and where it came from.
    fn operand(&self, ops: &mut Operands) -> Result<(Word, Site), VMError> {
        let index = ops.next;
        ops.next += 1;
        let raw = self.memory.get(self.ip + 1 + index)?;
        let site = Site {
            ip: self.ip,
            param: index + 1,
        };
        Ok((raw, site))
    }

    /// Resolves the next parameter as a value.
    fn src(&self, ops: &mut Operands) -> Result<Word, VMError> {
        let mode = ops.modes.get(ops.next);
        let (raw, site) = self.operand(ops)?;
        self.memory.read(raw, mode, self.relative_base, site)
    }

    /// Resolves the next parameter as a write address.
    ///
    /// The address is checked for writability here, before the handler runs,
    /// so a failing instruction never consumes input or writes anything.
    fn dst(&self, ops: &mut Operands) -> Result<usize, VMError> {
        let mode = ops.modes.get(ops.next);
        let (raw, site) = self.operand(ops)?;
        let address = self.memory.address(raw, mode, self.relative_base, site)?;
        self.memory.check_writable(address)?;
        Ok(address)
    }

    /// Converts a jump target into an address.
    fn jump_target(&self, target: Word) -> Result<usize, VMError> {
        usize::try_from(target).map_err(|_| VMError::NegativeAddress {
            address: target,
            ip: self.ip,
        })
    }

    /// Executes a single decoded instruction without moving the pointer.
    fn exec(&mut self, instruction: Instruction, operands: &mut Operands) -> Result<Flow, VMError> {
        exec_vm! {
            vm = self,
            operands = operands,
            instr = instruction,
            {
                Add => op_add(a: Src, b: Src, dst: Dst),
                Mul => op_mul(a: Src, b: Src, dst: Dst),
                Input => op_input(dst: Dst),
                Output => op_output(a: Src),
                JumpIfTrue => op_jump_if_true(cond: Src, target: Src),
                JumpIfFalse => op_jump_if_false(cond: Src, target: Src),
                LessThan => op_less_than(a: Src, b: Src, dst: Dst),
                Equals => op_equals(a: Src, b: Src, dst: Dst),
                AdjustBase => op_adjust_base(a: Src),
                Halt => op_halt(),
            }
        }
    }

    fn op_add(&mut self, a: Word, b: Word, dst: usize) -> Result<Flow, VMError> {
        self.memory.set(dst, a.wrapping_add(b))?;
        Ok(Flow::Advance)
    }

    fn op_mul(&mut self, a: Word, b: Word, dst: usize) -> Result<Flow, VMError> {
        self.memory.set(dst, a.wrapping_mul(b))?;
        Ok(Flow::Advance)
    }

    fn op_input(&mut self, dst: usize) -> Result<Flow, VMError> {
        match self.input.read() {
            Some(value) => {
                self.memory.set(dst, value)?;
                Ok(Flow::Advance)
            }
            None => Ok(Flow::Block),
        }
    }

    fn op_output(&mut self, a: Word) -> Result<Flow, VMError> {
        self.output.write(a);
        Ok(Flow::Advance)
    }

    fn op_jump_if_true(&mut self, cond: Word, target: Word) -> Result<Flow, VMError> {
        if cond != 0 {
            return Ok(Flow::Jump(self.jump_target(target)?));
        }
        Ok(Flow::Advance)
    }

    fn op_jump_if_false(&mut self, cond: Word, target: Word) -> Result<Flow, VMError> {
        if cond == 0 {
            return Ok(Flow::Jump(self.jump_target(target)?));
        }
        Ok(Flow::Advance)
    }

    fn op_less_than(&mut self, a: Word, b: Word, dst: usize) -> Result<Flow, VMError> {
        self.memory.set(dst, Word::from(a < b))?;
        Ok(Flow::Advance)
    }

    fn op_equals(&mut self, a: Word, b: Word, dst: usize) -> Result<Flow, VMError> {
        self.memory.set(dst, Word::from(a == b))?;
        Ok(Flow::Advance)
    }

    fn op_adjust_base(&mut self, a: Word) -> Result<Flow, VMError> {
        self.relative_base = self.relative_base.wrapping_add(a);
        Ok(Flow::Advance)
    }

    fn op_halt(&mut self) -> Result<Flow, VMError> {
        Ok(Flow::Halt)
    }
}
