//! Intcode program representation.
//!
//! A [`Program`] is the ordered list of signed words loaded into the dense
//! memory region of a VM, indices `0..n-1`. Its textual form is a
//! comma-separated list of base-10 integers, optionally surrounded by
//! whitespace and ending with a newline.

use crate::virtual_machine::Word;
use crate::virtual_machine::errors::VMError;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Largest image [`Program::patch`] will grow to, in words.
pub const MAX_WORDS: usize = 1 << 20;

/// Initial memory image of a VM.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    words: Vec<Word>,
}

impl Program {
    /// Wraps already-decoded words.
    pub fn new(words: Vec<Word>) -> Self {
        Self { words }
    }

    /// Reads and parses a program file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, VMError> {
        std::fs::read_to_string(path)?.parse()
    }

    /// Returns the words in load order.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Consumes the program, returning its words.
    pub fn into_words(self) -> Vec<Word> {
        self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Overwrites the word at `address`, growing the image with zeros if needed.
    ///
    /// Used to switch a program into an alternate mode before loading, e.g.
    /// setting word 0 to 2. The image never grows past [`MAX_WORDS`].
    pub fn patch(&mut self, address: usize, value: Word) -> Result<&mut Self, VMError> {
        let needed = address
            .checked_add(1)
            .filter(|&len| len <= MAX_WORDS)
            .ok_or(VMError::AddressOutOfBounds {
                address,
                len: MAX_WORDS,
            })?;
        if needed > self.words.len() {
            self.words.resize(needed, 0);
        }
        self.words[address] = value;
        Ok(self)
    }

    /// Returns a copy with a single word replaced.
    pub fn patched(&self, address: usize, value: Word) -> Result<Self, VMError> {
        let mut copy = self.clone();
        copy.patch(address, value)?;
        Ok(copy)
    }
}

impl From<Vec<Word>> for Program {
    fn from(words: Vec<Word>) -> Self {
        Self::new(words)
    }
}

impl From<&[Word]> for Program {
    fn from(words: &[Word]) -> Self {
        Self::new(words.to_vec())
    }
}

impl<const N: usize> From<[Word; N]> for Program {
    fn from(words: [Word; N]) -> Self {
        Self::new(words.to_vec())
    }
}

impl FromStr for Program {
    type Err = VMError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let source = source.trim();
        if source.is_empty() {
            return Ok(Self::default());
        }

        source
            .split(',')
            .enumerate()
            .map(|(index, token)| {
                let token = token.trim();
                token.parse::<Word>().map_err(|_| VMError::InvalidWord {
                    token: token.to_string(),
                    index,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, word) in self.words.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{word}")?;
        }
        Ok(())
    }
}
