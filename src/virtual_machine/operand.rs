use crate::virtual_machine::Word;
use crate::virtual_machine::errors::VMError;

/// Maximum number of parameters any instruction takes.
pub const MAX_PARAMS: usize = 3;

/// Addressing mode of a single parameter.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// The parameter is an address.
    #[default]
    Position = 0,
    /// The parameter is the value itself. Illegal as a write target.
    Immediate = 1,
    /// The parameter is an address offset by the relative base.
    Relative = 2,
}

impl TryFrom<Word> for Mode {
    type Error = VMError;

    fn try_from(value: Word) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Position),
            1 => Ok(Self::Immediate),
            2 => Ok(Self::Relative),
            _ => Err(VMError::InvalidMode {
                mode: value,
                param: 0,
                ip: 0,
            }),
        }
    }
}

/// Modes for parameters 1..=3, taken from the digits above the opcode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modes([Mode; MAX_PARAMS]);

impl Modes {
    /// Splits the mode digits (the instruction word divided by 100),
    /// least-significant digit first. Absent digits default to position mode.
    pub fn from_digits(mut digits: Word) -> Result<Self, VMError> {
        let mut modes = [Mode::Position; MAX_PARAMS];
        for (param, slot) in modes.iter_mut().enumerate() {
            *slot = Mode::try_from(digits % 10).map_err(|_| VMError::InvalidMode {
                mode: digits % 10,
                param: param + 1,
                ip: 0,
            })?;
            digits /= 10;
        }
        Ok(Self(modes))
    }

    /// Mode of the zero-based parameter `index`.
    pub fn get(&self, index: usize) -> Mode {
        self.0.get(index).copied().unwrap_or_default()
    }
}
