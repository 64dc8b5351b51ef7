use crate::virtual_machine::Word;
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::operand::Mode;
use std::collections::HashMap;

/// Selects how the address space behaves past the loaded program.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MemoryModel {
    /// Dense program region plus an unbounded sparse overflow region.
    #[default]
    Extended,
    /// Program region only. Accesses past it fail, and the machine halts
    /// once the instruction pointer leaves it.
    Bounded,
}

/// Location of the parameter being resolved, used to report errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct Site {
    /// Address of the instruction word.
    pub(super) ip: usize,
    /// One-based parameter index.
    pub(super) param: usize,
}

/// Address space of a single VM.
///
/// Memory layout: `[dense region][sparse overflow]`
/// - **Dense region**: the loaded program, indexed directly.
/// - **Sparse overflow**: every address at or beyond the dense length, stored
///   only once written. Unwritten cells read as 0.
#[derive(Clone, Debug)]
pub(super) struct Memory {
    dense: Vec<Word>,
    overflow: HashMap<usize, Word>,
    model: MemoryModel,
}

impl Memory {
    pub(super) fn new(words: Vec<Word>, model: MemoryModel) -> Self {
        Self {
            dense: words,
            overflow: HashMap::new(),
            model,
        }
    }

    /// Length of the dense region.
    pub(super) fn len(&self) -> usize {
        self.dense.len()
    }

    pub(super) fn model(&self) -> MemoryModel {
        self.model
    }

    /// Returns the dense region.
    pub(super) fn dense(&self) -> &[Word] {
        &self.dense
    }

    /// Number of cells written past the dense region.
    #[cfg(test)]
    pub(super) fn overflow_len(&self) -> usize {
        self.overflow.len()
    }

    /// Reads a cell without bounds policy: anything unwritten is 0.
    pub(super) fn peek(&self, address: usize) -> Word {
        match self.dense.get(address) {
            Some(word) => *word,
            None => self.overflow.get(&address).copied().unwrap_or(0),
        }
    }

    /// Reads the cell at `address`.
    pub(super) fn get(&self, address: usize) -> Result<Word, VMError> {
        if let Some(word) = self.dense.get(address) {
            return Ok(*word);
        }
        match self.model {
            MemoryModel::Extended => Ok(self.overflow.get(&address).copied().unwrap_or(0)),
            MemoryModel::Bounded => Err(VMError::AddressOutOfBounds {
                address,
                len: self.dense.len(),
            }),
        }
    }

    /// Writes the cell at `address`.
    pub(super) fn set(&mut self, address: usize, value: Word) -> Result<(), VMError> {
        if let Some(slot) = self.dense.get_mut(address) {
            *slot = value;
            return Ok(());
        }
        match self.model {
            MemoryModel::Extended => {
                self.overflow.insert(address, value);
                Ok(())
            }
            MemoryModel::Bounded => Err(VMError::AddressOutOfBounds {
                address,
                len: self.dense.len(),
            }),
        }
    }

    /// Resolves a write-target parameter to the address it names.
    pub(super) fn address(
        &self,
        param: Word,
        mode: Mode,
        relative_base: Word,
        site: Site,
    ) -> Result<usize, VMError> {
        let address = match mode {
            Mode::Position => param,
            Mode::Relative => param.wrapping_add(relative_base),
            Mode::Immediate => {
                return Err(VMError::ImmediateWrite {
                    param: site.param,
                    ip: site.ip,
                });
            }
        };
        usize::try_from(address).map_err(|_| VMError::NegativeAddress {
            address,
            ip: site.ip,
        })
    }

    /// Resolves a source parameter to its value.
    pub(super) fn read(
        &self,
        param: Word,
        mode: Mode,
        relative_base: Word,
        site: Site,
    ) -> Result<Word, VMError> {
        match mode {
            Mode::Immediate => Ok(param),
            Mode::Position | Mode::Relative => {
                self.get(self.address(param, mode, relative_base, site)?)
            }
        }
    }

    /// Fails if `address` can never be written under the current model.
    pub(super) fn check_writable(&self, address: usize) -> Result<(), VMError> {
        if self.model == MemoryModel::Bounded && address >= self.dense.len() {
            return Err(VMError::AddressOutOfBounds {
                address,
                len: self.dense.len(),
            });
        }
        Ok(())
    }
}
