use std::collections::HashMap;

use tia::assembly::instruction::{DestinationType, Op, SourceType};
use tia::direction::Direction;
use tia::parameters::CoreParameters;
use tia::simulator::core::Core;
use tia::simulator::processing_element::{connect_processing_elements, ProcessingElement};
use tia::simulator::system::System;

use crate::*;

mod pest;

macro_rules! hashmap {
    ($( $key: expr => $val: expr ),*) => {{
         let mut map = ::std::collections::HashMap::new();
         $( map.insert($key, $val); )*
         map
    }}
}

fn reference_core_parameters() -> CoreParameters {
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

fn reference_interconnect_parameters() -> tia::parameters::InterconnectParameters {
    tia::parameters::InterconnectParameters {
        router_type: "software".to_owned(),
        num_router_sources: 4,
        num_router_destinations: 4,
        num_input_channels: 4,
        num_output_channels: 4,
        router_buffer_depth: 4,
        num_physical_planes: 1,
    }
}

/// Parse a single-element program and run it on a bare core for the given
/// number of cycles.
fn run_single_core(source: &str, cycles: usize) -> Core {
    let cp = reference_core_parameters();
    let programs = parse_programs(source, &cp).unwrap();
    assert_eq!(programs.len(), 1);

    let mut core = Core::new("processing_element_0", &cp);
    core.program(&programs[0]).unwrap();
    for _ in 0..cycles {
        core.iterate(true).unwrap();
    }
    core
}

// --- Parsing ---

#[test]
fn sections_registers_and_ordinals() {
    let cp = reference_core_parameters();
    let source = "
# Two processing elements.
<pe_left>
init %r0, $3;
init %r2, $-1;
when %p == XXXXXXX0 : add %r1, %r0, $7; set %p = XXXXXXX1;
when %p == XXXXXXX1 : halt;

<pe_right>
init %r7, $0x10;
when %p == X : halt;
";
    let programs = parse_programs(source, &cp).unwrap();
    assert_eq!(programs.len(), 2);

    assert_eq!(programs[0].label, "pe_left");
    assert_eq!(programs[0].register_values, vec![3, 0, -1, 0, 0, 0, 0, 0]);
    assert_eq!(programs[0].instructions.len(), 2);
    assert_eq!(programs[0].instructions[0].number, 0);
    assert_eq!(programs[0].instructions[1].number, 1);

    assert_eq!(programs[1].label, "pe_right");
    assert_eq!(programs[1].register_values, vec![0, 0, 0, 0, 0, 0, 0, 16]);
}

#[test]
fn datapath_fields_are_extracted() {
    let cp = reference_core_parameters();
    let source =
        "<pe> when %p == 1X0X with %i1.3, !%i2.0 : add %o0.5, %i1, $9; deq %i1; set %p = 0X1X;";
    let programs = parse_programs(source, &cp).unwrap();
    let instruction = &programs[0].instructions[0];

    assert_eq!(instruction.op, Op::ADD);
    assert_eq!(instruction.trigger.true_predicates, vec![3]);
    assert_eq!(instruction.trigger.false_predicates, vec![1]);
    assert_eq!(instruction.trigger.input_channels, vec![1, 2]);
    assert_eq!(instruction.trigger.input_channel_tags, vec![3, 0]);
    assert_eq!(instruction.trigger.input_channel_tag_booleans, vec![true, false]);
    assert_eq!(instruction.trigger.output_channel_indices, vec![0]);

    assert_eq!(
        instruction.source_types,
        [SourceType::Channel, SourceType::Immediate, SourceType::Null]
    );
    assert_eq!(instruction.source_indices, [1, 0, 0]);
    assert_eq!(instruction.immediate, Some(9));
    assert_eq!(instruction.destination_type, DestinationType::Channel);
    assert_eq!(instruction.destination_index, Some(0));
    assert_eq!(instruction.output_channel_tag, Some(5));
    assert_eq!(instruction.input_channels_to_dequeue, vec![1]);

    // The update flips predicates 1 and 3 relative to the trigger string.
    assert_eq!(instruction.predicate_update_indices, vec![1, 3]);
    assert_eq!(instruction.predicate_update_values, vec![true, false]);
}

#[test]
fn multicast_destination_folds_into_the_trigger() {
    let cp = reference_core_parameters();
    let programs =
        parse_programs("<pe> when %p == X : mov %o{0, 2}.7, $1;", &cp).unwrap();
    let instruction = &programs[0].instructions[0];
    assert_eq!(instruction.destination_type, DestinationType::Channel);
    assert_eq!(instruction.destination_index, Some(0));
    assert_eq!(instruction.output_channel_indices, vec![0, 2]);
    assert_eq!(instruction.trigger.output_channel_indices, vec![0, 2]);
    assert_eq!(instruction.output_channel_tag, Some(7));
}

#[test]
fn ssw_stores_its_operands_as_sources() {
    let cp = reference_core_parameters();
    let programs = parse_programs("<pe> when %p == X : ssw %r1, $5;", &cp).unwrap();
    let instruction = &programs[0].instructions[0];
    assert_eq!(instruction.op, Op::SSW);
    assert_eq!(
        instruction.source_types,
        [SourceType::Register, SourceType::Immediate, SourceType::Null]
    );
    assert_eq!(instruction.source_indices, [1, 0, 0]);
    assert_eq!(instruction.immediate, Some(5));
    assert_eq!(instruction.destination_type, DestinationType::Null);
    assert_eq!(instruction.destination_index, None);
}

#[test]
fn macros_substitute_longest_first() {
    let macro_map: HashMap<String, String> = hashmap![
        "VAL".to_owned() => "3".to_owned(),
        "VALUE".to_owned() => "42".to_owned(),
        "ACC".to_owned() => "%r1".to_owned()
    ];
    let substituted = apply_macros(&macro_map, "init ACC, $VALUE;");
    assert_eq!(substituted, "init %r1, $42;");

    let cp = reference_core_parameters();
    let source = "<pe> init ACC, $VALUE; when %p == X : halt;";
    let programs = parse_programs_with_macros(source, &macro_map, &cp).unwrap();
    assert_eq!(programs[0].register_values[1], 42);
}

// --- Rejected programs ---

fn rejects(source: &str) {
    let cp = reference_core_parameters();
    assert!(
        parse_programs(source, &cp).is_err(),
        "expected a parse failure: {}",
        source
    );
}

#[test]
fn rejected_statements() {
    // Unknown mnemonic.
    rejects("<pe> when %p == X : frobnicate %r0;");
    // Out-of-range references.
    rejects("<pe> init %r9, $0;");
    rejects("<pe> when %p == 0XXXXXXXX : halt;");
    rejects("<pe> when %p == X with %i9.0 : halt;");
    rejects("<pe> when %p == X with %i0.99 : halt;");
    rejects("<pe> when %p == X : mov %r9, $1;");
    rejects("<pe> when %p == X : mov %o9.0, $1;");
    rejects("<pe> when %p == X : mov %r0, %i0; deq %i9;");
    // Conflicting clauses.
    rejects("<pe> when %p == X : nop %r0; deq %i0; deq %i1;");
    rejects("<pe> when %p == X : nop %r0; set %p = 1; set %p = 0;");
    // Duplicate multicast indices.
    rejects("<pe> when %p == X : mov %o{1, 1}.0, $1;");
    // Conflicting immediates in one instruction.
    rejects("<pe> when %p == X : add %r0, $1, $2;");
    // Missing tag on a channel condition.
    rejects("<pe> when %p == X with %i0 : halt;");
    // Too wide a register initializer.
    rejects("<pe> init %r0, $0x1FFFFFFFF;");
    // Channel sources never appear in destination position.
    rejects("<pe> when %p == X : mov %i0, $1;");
    // Brace syntax is reserved for the destination.
    rejects("<pe> when %p == X : mov %r0, %o{0, 1}.2;");
    // Too many checked channels for the architecture.
    rejects("<pe> when %p == X with %i0.0, %i1.0, %i2.0, %i3.0 : halt;");
}

#[test]
fn shared_immediate_may_repeat() {
    let cp = reference_core_parameters();
    let programs = parse_programs("<pe> when %p == X : add %r0, $3, $3;", &cp).unwrap();
    assert_eq!(programs[0].instructions[0].immediate, Some(3));
}

// --- End-to-end scenarios on the reference architecture ---

#[test]
fn add_immediate_fires_once() {
    let core = run_single_core(
        "<pe>
         init %r0, $3;
         when %p == XXXXXXX0 : add %r1, %r0, $7; set %p = XXXXXXX1;",
        3,
    );
    assert_eq!(core.register(1), 10);
    assert_eq!(core.instructions_retired(), 1);
    assert_eq!(core.execution_trace(), &[0, -1, -1]);
}

#[test]
fn halt_sticks() {
    let core = run_single_core("<pe> when %p == XXXXXXXX : halt;", 3);
    assert!(core.halt_register());
    assert_eq!(core.instructions_retired(), 1);
    assert_eq!(core.execution_trace(), &[0, -1, -1]);
}

#[test]
fn predicate_oscillation() {
    let core = run_single_core(
        "<pe>
         when %p == XXXXXXX0 : nop %r0; set %p = XXXXXXX1;
         when %p == XXXXXXX1 : add %r1, $1, $1; set %p = XXXXXXX0;",
        2,
    );
    assert_eq!(core.register(1), 2);
    assert_eq!(core.execution_trace(), &[0, 1]);
}

#[test]
fn scratchpad_round_trip() {
    let core = run_single_core(
        "<pe>
         init %r1, $1234;
         when %p == XXXXXX00 : ssw %r1, $5; set %p = XXXXXX01;
         when %p == XXXXXX01 : lsw %r2, $5; set %p = XXXXXX11;",
        2,
    );
    assert_eq!(core.scratchpad().unwrap()[5], 1234);
    assert_eq!(core.register(2), 1234);
}

#[test]
fn channel_transfer_between_processing_elements() {
    let cp = reference_core_parameters();
    let ip = reference_interconnect_parameters();

    // The sender pushes 42 east exactly once; the receiver moves it into r0
    // and dequeues. East is output channel 1; the matching input on the
    // receiver is its west channel 3.
    let source = "
<sender>
when %p == XXXXXXX0 : mov %o1.0, $42; set %p = XXXXXXX1;
when %p == XXXXXXX1 : halt;

<receiver>
when %p == XXXXXXX0 with %i3.0 : mov %r0, %i3; deq %i3; set %p = XXXXXXX1;
when %p == XXXXXXX1 : halt;
";
    let programs = parse_programs(source, &cp).unwrap();

    let pe0 = ProcessingElement::new("processing_element_0", &cp, &ip)
        .unwrap()
        .into_handle();
    let pe1 = ProcessingElement::new("processing_element_1", &cp, &ip)
        .unwrap()
        .into_handle();
    connect_processing_elements(&pe0, &pe1, Direction::East).unwrap();
    pe0.borrow_mut().core_mut().program(&programs[0]).unwrap();
    pe1.borrow_mut().core_mut().program(&programs[1]).unwrap();

    let mut system = System::new();
    system.register_processing_element(&pe0);
    system.register_processing_element(&pe1);
    system.finalize().unwrap();

    let mut halted = false;
    for _ in 0..10 {
        if system.iterate(false).unwrap() {
            halted = true;
            break;
        }
    }

    assert!(halted);
    assert_eq!(pe1.borrow().core().register(0), 42);
    assert!(pe1.borrow().core().input_channel_buffers()[3].is_empty());
}

// --- Binary images ---

#[test]
fn assembled_images_have_the_advertised_shape() {
    let cp = reference_core_parameters();
    let source = "
<pe_0>
init %r0, $3;
init %r1, $-1;
when %p == XXXXXXX0 : add %r1, %r0, $7; set %p = XXXXXXX1;
when %p == XXXXXXX1 : halt;
";
    let images = assemble(source, &cp).unwrap();
    assert_eq!(images.len(), 1);
    let (label, image) = &images[0];
    assert_eq!(label, "pe_0");

    assert_eq!(image.register_values(), &[3, 0xFFFF_FFFF, 0, 0, 0, 0, 0, 0]);
    // Eight slots of four little-endian words each; the two real
    // instructions carry their validity bits, the padding slots are zero.
    assert_eq!(image.instruction_words().len(), 32);
    assert!(image.instruction_words()[..4].iter().any(|&w| w != 0));
    assert!(image.instruction_words()[4..8].iter().any(|&w| w != 0));
    assert!(image.instruction_words()[8..].iter().all(|&w| w == 0));
}

#[test]
fn oversized_parameter_sets_produce_no_image() {
    let mut cp = reference_core_parameters();
    cp.num_predicates = 9;
    match assemble("<pe> when %p == X : halt;", &cp) {
        Err(Error::Parameter(_)) => {}
        other => panic!("expected a parameter error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn assembly_faults_name_the_instruction() {
    let mut cp = reference_core_parameters();
    cp.immediate_width = 8;
    // The oversized immediate passes the grammar and fails validation with
    // the instruction ordinal in the message.
    let error = parse_programs(
        "<pe>
         when %p == XXXXXXX0 : nop %r0; set %p = XXXXXXX1;
         when %p == XXXXXXX1 : add %r1, %r0, $4096;",
        &cp,
    )
    .unwrap_err();
    match error {
        Error::Assemble(error) => assert!(error.message().contains("instruction 1")),
        other => panic!("expected an assembly error, got {:?}", other),
    }
}
