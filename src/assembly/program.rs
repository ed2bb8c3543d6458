//! Per-processing-element programs.

use crate::assembly::instruction::Instruction;
use crate::assembly::machine_code::signed_bit_length;
use crate::assembly::AssemblyError;
use crate::parameters::CoreParameters;

/// A label, the initial register-file contents and the priority-ordered
/// instruction list for one processing element. Register values are kept as
/// abstract integers; sizing happens in the simulator and the machine-code
/// generator further down the pipeline.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProcessingElementProgram {
    pub label: String,
    pub register_values: Vec<i64>,
    pub instructions: Vec<Instruction>,
}

impl ProcessingElementProgram {
    pub fn new(
        label: impl Into<String>,
        register_values: Vec<i64>,
        instructions: Vec<Instruction>,
    ) -> ProcessingElementProgram {
        ProcessingElementProgram {
            label: label.into(),
            register_values,
            instructions,
        }
    }

    /// Validate the register file values and instructions against the
    /// architectural parameters.
    pub fn validate(&self, cp: &CoreParameters) -> Result<(), AssemblyError> {
        for (i, &register_value) in self.register_values.iter().enumerate() {
            let effective_bit_length = if register_value < 0 {
                signed_bit_length(register_value) + 1
            } else {
                signed_bit_length(register_value)
            };
            if effective_bit_length > cp.device_word_width {
                return Err(AssemblyError::new(format!(
                    "In program {}, register {} initialized to too wide of a value for this \
                     architecture: {}",
                    self.label, i, register_value
                )));
            }
        }

        for instruction in &self.instructions {
            instruction.validate(cp)?;
        }

        Ok(())
    }
}
