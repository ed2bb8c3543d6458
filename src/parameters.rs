//! Architectural parameter records for the assembler, encoder and simulator.
//!
//! The parameter objects are the single source of truth for every width,
//! count and feature flag in the toolchain. They are built once from a
//! name-to-value map (typically decoded from a configuration file by the
//! caller) and then threaded as read-only handles through every constructor
//! and encoder function.

use std::cmp;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;

use crate::assembly::instruction::{DestinationType, Op, SourceType};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParameterError {
    UnknownParameter(String),
    MissingParameter(&'static str),
    WrongValueType(&'static str),
    OversizedInstruction {
        width: u32,
        budget: u32,
        budget_name: &'static str,
    },
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParameterError::UnknownParameter(key) => {
                write!(f, "Unrecognized parameter: {}.", key)
            }
            ParameterError::MissingParameter(key) => {
                write!(f, "The parameter {} must be nonnull.", key)
            }
            ParameterError::WrongValueType(key) => {
                write!(f, "The parameter {} has the wrong value type.", key)
            }
            ParameterError::OversizedInstruction {
                width,
                budget,
                budget_name,
            } => write!(
                f,
                "The instruction with the given architectural parameters has a width of {} bits \
                 and cannot fit within the defined {} instruction width of {} bits.",
                width, budget_name, budget
            ),
        }
    }
}

impl StdError for ParameterError {}

/// A loosely typed configuration value. Building these maps from YAML or JSON
/// documents is the caller's concern.
#[derive(Clone, Debug, PartialEq)]
pub enum ParameterValue {
    Integer(u64),
    Boolean(bool),
    Text(String),
}

impl From<u64> for ParameterValue {
    fn from(value: u64) -> ParameterValue {
        ParameterValue::Integer(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> ParameterValue {
        ParameterValue::Boolean(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> ParameterValue {
        ParameterValue::Text(value.to_owned())
    }
}

pub type ParameterMap = HashMap<String, ParameterValue>;

fn integer(map: &ParameterMap, key: &'static str) -> Result<u32, ParameterError> {
    match map.get(key) {
        Some(ParameterValue::Integer(value)) => Ok(*value as u32),
        Some(_) => Err(ParameterError::WrongValueType(key)),
        None => Err(ParameterError::MissingParameter(key)),
    }
}

fn boolean(map: &ParameterMap, key: &'static str) -> Result<bool, ParameterError> {
    match map.get(key) {
        Some(ParameterValue::Boolean(value)) => Ok(*value),
        Some(_) => Err(ParameterError::WrongValueType(key)),
        None => Err(ParameterError::MissingParameter(key)),
    }
}

fn text(map: &ParameterMap, key: &'static str) -> Result<String, ParameterError> {
    match map.get(key) {
        Some(ParameterValue::Text(value)) => Ok(value.clone()),
        Some(_) => Err(ParameterError::WrongValueType(key)),
        None => Err(ParameterError::MissingParameter(key)),
    }
}

fn check_recognized(map: &ParameterMap, recognized: &[&str]) -> Result<(), ParameterError> {
    for key in map.keys() {
        if !recognized.contains(&key.as_str()) {
            return Err(ParameterError::UnknownParameter(key.clone()));
        }
    }
    Ok(())
}

fn ceil_log2(n: u32) -> u32 {
    if n <= 1 {
        0
    } else {
        32 - (n - 1).leading_zeros()
    }
}

const CORE_PARAMETER_KEYS: &[&str] = &[
    "architecture",
    "device_word_width",
    "immediate_width",
    "mm_instruction_width",
    "num_instructions",
    "num_predicates",
    "num_registers",
    "has_multiplier",
    "has_two_word_product_multiplier",
    "has_scratchpad",
    "num_scratchpad_words",
    "latch_based_instruction_memory",
    "ram_based_immediate_storage",
    "num_input_channels",
    "num_output_channels",
    "channel_buffer_depth",
    "max_num_input_channels_to_check",
    "num_tags",
    "has_speculative_predicate_unit",
    "has_effective_queue_status",
    "has_debug_monitor",
    "has_performance_counters",
];

/// Parameters for the physical processing element core targeted by the
/// assembler and simulator. Constructed once, never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct CoreParameters {
    pub architecture: String,
    pub device_word_width: u32,
    pub immediate_width: u32,
    pub mm_instruction_width: u32,
    pub num_instructions: u32,
    pub num_predicates: u32,
    pub num_registers: u32,
    pub has_multiplier: bool,
    pub has_two_word_product_multiplier: bool,
    pub has_scratchpad: bool,
    pub num_scratchpad_words: u32,
    pub latch_based_instruction_memory: bool,
    pub ram_based_immediate_storage: bool,
    pub num_input_channels: u32,
    pub num_output_channels: u32,
    pub channel_buffer_depth: u32,
    pub max_num_input_channels_to_check: u32,
    pub num_tags: u32,
    pub has_speculative_predicate_unit: bool,
    pub has_effective_queue_status: bool,
    pub has_debug_monitor: bool,
    pub has_performance_counters: bool,
}

impl CoreParameters {
    /// Build from a name-to-value map with the exact recognized key set.
    /// Unknown keys are errors; a missing key is reported by name.
    pub fn from_map(map: &ParameterMap) -> Result<CoreParameters, ParameterError> {
        check_recognized(map, CORE_PARAMETER_KEYS)?;
        Ok(CoreParameters {
            architecture: text(map, "architecture")?,
            device_word_width: integer(map, "device_word_width")?,
            immediate_width: integer(map, "immediate_width")?,
            mm_instruction_width: integer(map, "mm_instruction_width")?,
            num_instructions: integer(map, "num_instructions")?,
            num_predicates: integer(map, "num_predicates")?,
            num_registers: integer(map, "num_registers")?,
            has_multiplier: boolean(map, "has_multiplier")?,
            has_two_word_product_multiplier: boolean(map, "has_two_word_product_multiplier")?,
            has_scratchpad: boolean(map, "has_scratchpad")?,
            num_scratchpad_words: integer(map, "num_scratchpad_words")?,
            latch_based_instruction_memory: boolean(map, "latch_based_instruction_memory")?,
            ram_based_immediate_storage: boolean(map, "ram_based_immediate_storage")?,
            num_input_channels: integer(map, "num_input_channels")?,
            num_output_channels: integer(map, "num_output_channels")?,
            channel_buffer_depth: integer(map, "channel_buffer_depth")?,
            max_num_input_channels_to_check: integer(map, "max_num_input_channels_to_check")?,
            num_tags: integer(map, "num_tags")?,
            has_speculative_predicate_unit: boolean(map, "has_speculative_predicate_unit")?,
            has_effective_queue_status: boolean(map, "has_effective_queue_status")?,
            has_debug_monitor: boolean(map, "has_debug_monitor")?,
            has_performance_counters: boolean(map, "has_performance_counters")?,
        })
    }

    /// Make sure the proposed instruction encoding actually fits within both
    /// the memory-mapped and the physical instruction width budgets.
    pub fn validate_instruction_format(&self) -> Result<(), ParameterError> {
        let used = self.non_immediate_instruction_width() + self.immediate_width;
        if used > self.mm_instruction_width {
            return Err(ParameterError::OversizedInstruction {
                width: used,
                budget: self.mm_instruction_width,
                budget_name: "memory-mapped",
            });
        }
        if used > self.phy_instruction_width() {
            return Err(ParameterError::OversizedInstruction {
                width: used,
                budget: self.phy_instruction_width(),
                budget_name: "physical",
            });
        }
        Ok(())
    }

    // --- Derived widths, all in bits ---

    pub fn true_ptm_width(&self) -> u32 {
        self.num_predicates
    }

    pub fn false_ptm_width(&self) -> u32 {
        self.num_predicates
    }

    pub fn ptm_width(&self) -> u32 {
        self.true_ptm_width() + self.false_ptm_width()
    }

    /// Extra slot for the implied null value.
    pub fn single_ici_width(&self) -> u32 {
        ceil_log2(self.num_input_channels + 1)
    }

    pub fn ici_width(&self) -> u32 {
        self.max_num_input_channels_to_check * self.single_ici_width()
    }

    pub fn tag_width(&self) -> u32 {
        ceil_log2(self.num_tags)
    }

    pub fn ictb_width(&self) -> u32 {
        self.max_num_input_channels_to_check
    }

    pub fn ictv_width(&self) -> u32 {
        self.max_num_input_channels_to_check * self.tag_width()
    }

    pub fn op_width(&self) -> u32 {
        ceil_log2(Op::COUNT)
    }

    pub fn single_st_width(&self) -> u32 {
        ceil_log2(SourceType::COUNT)
    }

    pub fn st_width(&self) -> u32 {
        3 * self.single_st_width()
    }

    pub fn single_si_width(&self) -> u32 {
        ceil_log2(cmp::max(self.num_registers, self.num_input_channels))
    }

    pub fn si_width(&self) -> u32 {
        3 * self.single_si_width()
    }

    pub fn dt_width(&self) -> u32 {
        ceil_log2(DestinationType::COUNT)
    }

    pub fn di_width(&self) -> u32 {
        ceil_log2(cmp::max(
            cmp::max(self.num_registers, self.num_output_channels),
            self.num_predicates,
        ))
    }

    pub fn oci_width(&self) -> u32 {
        self.num_output_channels
    }

    pub fn oct_width(&self) -> u32 {
        self.tag_width()
    }

    pub fn icd_width(&self) -> u32 {
        self.num_input_channels
    }

    pub fn true_pum_width(&self) -> u32 {
        self.true_ptm_width()
    }

    pub fn false_pum_width(&self) -> u32 {
        self.false_ptm_width()
    }

    pub fn pum_width(&self) -> u32 {
        self.true_pum_width() + self.false_pum_width()
    }

    pub fn non_immediate_instruction_width(&self) -> u32 {
        1 // vi.
            + self.ptm_width()
            + self.ici_width()
            + self.ictb_width()
            + self.ictv_width()
            + self.op_width()
            + self.st_width()
            + self.si_width()
            + self.dt_width()
            + self.di_width()
            + self.oci_width()
            + self.oct_width()
            + self.icd_width()
            + self.pum_width()
    }

    pub fn phy_instruction_width(&self) -> u32 {
        self.non_immediate_instruction_width() + self.immediate_width
    }

    pub fn padding_width(&self) -> u32 {
        self.mm_instruction_width - self.phy_instruction_width()
    }
}

const INTERCONNECT_PARAMETER_KEYS: &[&str] = &[
    "router_type",
    "num_router_sources",
    "num_router_destinations",
    "num_input_channels",
    "num_output_channels",
    "router_buffer_depth",
    "num_physical_planes",
];

/// Parameters for routers and interconnect links.
#[derive(Clone, Debug, PartialEq)]
pub struct InterconnectParameters {
    pub router_type: String,
    pub num_router_sources: u32,
    pub num_router_destinations: u32,
    pub num_input_channels: u32,
    pub num_output_channels: u32,
    pub router_buffer_depth: u32,
    pub num_physical_planes: u32,
}

impl InterconnectParameters {
    pub fn from_map(map: &ParameterMap) -> Result<InterconnectParameters, ParameterError> {
        check_recognized(map, INTERCONNECT_PARAMETER_KEYS)?;
        Ok(InterconnectParameters {
            router_type: text(map, "router_type")?,
            num_router_sources: integer(map, "num_router_sources")?,
            num_router_destinations: integer(map, "num_router_destinations")?,
            num_input_channels: integer(map, "num_input_channels")?,
            num_output_channels: integer(map, "num_output_channels")?,
            router_buffer_depth: integer(map, "router_buffer_depth")?,
            num_physical_planes: integer(map, "num_physical_planes")?,
        })
    }
}

const SYSTEM_PARAMETER_KEYS: &[&str] = &[
    "host_word_width",
    "num_test_data_memory_words",
    "test_data_memory_buffer_depth",
];

/// Parameters for the surrounding test system: host access width and the
/// shared test data memory.
#[derive(Clone, Debug, PartialEq)]
pub struct SystemParameters {
    pub host_word_width: u32,
    pub num_test_data_memory_words: u32,
    pub test_data_memory_buffer_depth: u32,
}

impl SystemParameters {
    pub fn from_map(map: &ParameterMap) -> Result<SystemParameters, ParameterError> {
        check_recognized(map, SYSTEM_PARAMETER_KEYS)?;
        Ok(SystemParameters {
            host_word_width: integer(map, "host_word_width")?,
            num_test_data_memory_words: integer(map, "num_test_data_memory_words")?,
            test_data_memory_buffer_depth: integer(map, "test_data_memory_buffer_depth")?,
        })
    }
}
