//! Instruction Set Architecture (ISA) definitions.
//!
//! The [`for_each_instruction!`](crate::for_each_instruction) macro holds the
//! canonical instruction table and invokes a callback macro for code
//! generation. The engine's `exec_vm!` dispatch lists each handler's
//! parameter roles again; the engine tests check both agree.
//!
//! This module generates:
//! - The [`Instruction`] enum with opcode mappings
//! - `TryFrom<Word>` for opcode lookup
//! - Per-instruction parameter roles and arity
//!
//! # Word format
//!
//! An instruction word is a non-negative decimal integer `MMMOO`:
//! - `OO` (word mod 100): the opcode
//! - `M..`: one mode digit per parameter, parameter 1 in the hundreds place,
//!   parameter 2 in the thousands place, parameter 3 in the ten-thousands place
//!
//! Parameters follow the instruction word directly, one word each.

use crate::virtual_machine::Word;
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::operand::Modes;

/// Invokes a callback macro with the complete instruction definition list.
///
/// Each parameter is either `Src` (resolved to a value through its mode) or
/// `Dst` (resolved to an address; immediate mode is illegal).
#[macro_export]
macro_rules! for_each_instruction {
    ($callback:ident) => {
        $callback! {
            /// ADD a, b, dst ; dst = a + b
            Add = 1, "ADD" => [a: Src, b: Src, dst: Dst],
            /// MUL a, b, dst ; dst = a * b
            Mul = 2, "MUL" => [a: Src, b: Src, dst: Dst],
            /// IN dst ; dst = next input, suspends when none is available
            Input = 3, "IN" => [dst: Dst],
            /// OUT a ; writes a to the output port
            Output = 4, "OUT" => [a: Src],
            /// JNZ cond, target ; if cond != 0 then IP = target
            JumpIfTrue = 5, "JNZ" => [cond: Src, target: Src],
            /// JZ cond, target ; if cond == 0 then IP = target
            JumpIfFalse = 6, "JZ" => [cond: Src, target: Src],
            /// LT a, b, dst ; dst = (a < b) as 1 or 0
            LessThan = 7, "LT" => [a: Src, b: Src, dst: Dst],
            /// EQ a, b, dst ; dst = (a == b) as 1 or 0
            Equals = 8, "EQ" => [a: Src, b: Src, dst: Dst],
            /// ARB a ; relative base += a
            AdjustBase = 9, "ARB" => [a: Src],
            /// HALT ; stops the machine for good
            Halt = 99, "HALT" => [],
        }
    };
}

/// Role of an instruction parameter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParamKind {
    /// Read through its addressing mode.
    Src,
    /// Resolved to the address the instruction writes.
    Dst,
}

#[macro_export]
macro_rules! define_instructions {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:literal, $mnemonic:literal => [
                $( $field:ident : $kind:ident ),* $(,)?
            ]
        ),* $(,)?
    ) => {
        #[derive(Copy, Clone, Debug, Eq, PartialEq)]
        pub enum Instruction {
            $(
                $(#[$doc])*
                $name = $opcode,
            )*
        }

        impl TryFrom<Word> for Instruction {
            type Error = VMError;

            fn try_from(value: Word) -> Result<Self, Self::Error> {
                match value {
                    $( $opcode => Ok(Instruction::$name), )*
                    _ => Err(VMError::InvalidOpcode {
                        opcode: value,
                        word: value,
                        ip: 0,
                    }),
                }
            }
        }

        impl Instruction {
            /// Every instruction in table order.
            pub const ALL: &'static [Instruction] = &[ $( Instruction::$name, )* ];

            /// Returns the role of each parameter, in order.
            pub const fn params(&self) -> &'static [ParamKind] {
                match self {
                    $( Instruction::$name => &[ $( ParamKind::$kind ),* ], )*
                }
            }
        }
    };
}

for_each_instruction!(define_instructions);

impl Instruction {
    /// Number of parameter words following the instruction word.
    pub const fn arity(&self) -> usize {
        self.params().len()
    }

    /// Total instruction length in words, including the instruction word.
    pub const fn size(&self) -> usize {
        1 + self.arity()
    }

    /// Splits an instruction word into its instruction and parameter modes.
    ///
    /// `ip` is only used to locate errors.
    pub fn decode(word: Word, ip: usize) -> Result<(Instruction, Modes), VMError> {
        if word < 0 {
            return Err(VMError::InvalidOpcode {
                opcode: word,
                word,
                ip,
            });
        }

        let instr = Instruction::try_from(word % 100).map_err(|_| VMError::InvalidOpcode {
            opcode: word % 100,
            word,
            ip,
        })?;
        let modes = Modes::from_digits(word / 100).map_err(|err| match err {
            VMError::InvalidMode { mode, param, .. } => VMError::InvalidMode { mode, param, ip },
            other => other,
        })?;
        Ok((instr, modes))
    }
}
