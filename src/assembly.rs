//! Triggered-instruction intermediate representation and machine code.
//!
//! [`instruction`] defines the operation set, triggers and instructions that
//! both the assembler front end and the functional simulator consume.
//! [`machine_code`] lowers validated instructions to the bit-exact,
//! parameter-driven instruction word layout. [`program`] groups the
//! per-processing-element register initialization and instruction list.

pub mod instruction;
pub mod machine_code;
pub mod program;

use std::error::Error as StdError;
use std::fmt;

/// A lexical, syntactic or semantic fault in assembly input, or an encoding
/// overflow. Messages name the offending token and, where known, the
/// instruction ordinal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssemblyError {
    message: String,
}

impl AssemblyError {
    pub fn new(message: impl Into<String>) -> AssemblyError {
        AssemblyError {
            message: message.into(),
        }
    }

    /// Wrap an error with the ordinal of the instruction it occurred in.
    pub fn in_instruction(self, number: i32) -> AssemblyError {
        AssemblyError {
            message: format!("Error in instruction {}: {}", number, self.message),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for AssemblyError {}
