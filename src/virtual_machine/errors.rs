use intcode_derive::Error;

/// Fatal conditions raised while loading or executing an Intcode program.
///
/// None of these are recoverable: they indicate a malformed program or a
/// defective host. Running out of input is not an error; see
/// [`Step::Blocked`](crate::virtual_machine::vm::Step::Blocked).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VMError {
    /// The low two digits of the instruction word name no instruction.
    #[error("invalid opcode {opcode} in word {word} at address {ip}")]
    InvalidOpcode { opcode: i64, word: i64, ip: usize },
    /// A parameter mode digit is not 0, 1 or 2.
    #[error("invalid parameter mode {mode} for parameter {param} at address {ip}")]
    InvalidMode { mode: i64, param: usize, ip: usize },
    /// A parameter or jump target resolved to an address below zero.
    #[error("negative address {address} at instruction {ip}")]
    NegativeAddress { address: i64, ip: usize },
    /// A write target was encoded in immediate mode.
    #[error("write to immediate-mode parameter {param} at address {ip}")]
    ImmediateWrite { param: usize, ip: usize },
    /// Access beyond the loaded program under the bounded memory model.
    #[error("address {address} out of bounds (memory length {len})")]
    AddressOutOfBounds { address: usize, len: usize },
    /// A batch run asked for more input than it was given.
    #[error("input exhausted at address {ip}")]
    InputExhausted { ip: usize },
    /// Every live machine in a ring is waiting on input no one will produce.
    #[error("deadlock: {blocked} machines blocked on input")]
    Deadlock { blocked: usize },
    /// A token of the textual program form is not a base-10 integer.
    #[error("invalid word {token:?} at index {index}")]
    InvalidWord { token: String, index: usize },
    /// Reading a program from disk failed.
    #[error("io error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for VMError {
    fn from(err: std::io::Error) -> Self {
        VMError::IoError(err.to_string())
    }
}
