//! Shared fixtures for the unit tests: the reference architecture used
//! throughout the test suite.

use crate::parameters::{CoreParameters, InterconnectParameters, SystemParameters};

/// 32-bit words, 8 predicates, 8 registers, 4 channels in and out, buffer
/// depth 4, 16 tags, at most 3 channels checked per trigger, 128 memory-mapped
/// instruction bits.
pub fn reference_core_parameters() -> CoreParameters {
    CoreParameters {
        architecture: "reference".to_owned(),
        device_word_width: 32,
        immediate_width: 32,
        mm_instruction_width: 128,
        num_instructions: 8,
        num_predicates: 8,
        num_registers: 8,
        has_multiplier: true,
        has_two_word_product_multiplier: true,
        has_scratchpad: true,
        num_scratchpad_words: 16,
        latch_based_instruction_memory: false,
        ram_based_immediate_storage: false,
        num_input_channels: 4,
        num_output_channels: 4,
        channel_buffer_depth: 4,
        max_num_input_channels_to_check: 3,
        num_tags: 16,
        has_speculative_predicate_unit: false,
        has_effective_queue_status: false,
        has_debug_monitor: false,
        has_performance_counters: false,
    }
}

pub fn reference_interconnect_parameters() -> InterconnectParameters {
    InterconnectParameters {
        router_type: "software".to_owned(),
        num_router_sources: 4,
        num_router_destinations: 4,
        num_input_channels: 4,
        num_output_channels: 4,
        router_buffer_depth: 4,
        num_physical_planes: 1,
    }
}

pub fn reference_system_parameters() -> SystemParameters {
    SystemParameters {
        host_word_width: 32,
        num_test_data_memory_words: 1024,
        test_data_memory_buffer_depth: 4,
    }
}
