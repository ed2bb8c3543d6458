//! Machine-code translation.
//!
//! Each instruction becomes an integer of exactly `mm_instruction_width`
//! bits, concatenated most- to least-significant: validity bit, PTM (true
//! half high), ICI, ICTB, ICTV, OP, ST, SI, DT, DI, OCI, OCT, ICD, PUM (true
//! half high), immediate, padding zeros. Every field is checked against its
//! declared width budget; an overflow is a hard error.

use num::BigUint;

use crate::assembly::instruction::{enum_to_u32, Instruction};
use crate::assembly::program::ProcessingElementProgram;
use crate::assembly::AssemblyError;
use crate::parameters::CoreParameters;

pub(crate) fn bit_length(value: u64) -> u32 {
    64 - value.leading_zeros()
}

/// Number of bits needed for the magnitude, the way arbitrary-precision
/// integers report it: the sign itself is not counted.
pub(crate) fn signed_bit_length(value: i64) -> u32 {
    bit_length(value.unsigned_abs())
}

pub(crate) fn low_mask(width: u32) -> u64 {
    if width == 0 {
        0
    } else if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

fn check_width(value: u64, width: u32, field: &str) -> Result<u64, AssemblyError> {
    if bit_length(value) > width {
        Err(AssemblyError::new(format!(
            "{} exceeds its allotted bit width.",
            field
        )))
    } else {
        Ok(value)
    }
}

fn check_predicate_range(predicate: u32, cp: &CoreParameters) -> Result<(), AssemblyError> {
    if predicate >= cp.num_predicates {
        Err(AssemblyError::new(format!(
            "Predicate {} is out of range on the target architecture with {} predicates.",
            predicate, cp.num_predicates
        )))
    } else {
        Ok(())
    }
}

pub fn build_true_ptm(cp: &CoreParameters, instruction: &Instruction) -> Result<u64, AssemblyError> {
    let mut true_ptm: u64 = 0;
    for &predicate in instruction.trigger.true_predicates.iter().rev() {
        check_predicate_range(predicate, cp)?;
        true_ptm |= 1 << predicate;
    }
    check_width(true_ptm, cp.true_ptm_width(), "True ptm")
}

pub fn build_false_ptm(
    cp: &CoreParameters,
    instruction: &Instruction,
) -> Result<u64, AssemblyError> {
    let mut false_ptm: u64 = 0;
    for &predicate in instruction.trigger.false_predicates.iter().rev() {
        check_predicate_range(predicate, cp)?;
        false_ptm |= 1 << predicate;
    }
    check_width(false_ptm, cp.false_ptm_width(), "False ptm")
}

pub fn build_ptm(cp: &CoreParameters, instruction: &Instruction) -> Result<u64, AssemblyError> {
    let mut ptm = build_true_ptm(cp, instruction)?;
    ptm <<= cp.false_ptm_width();
    ptm |= build_false_ptm(cp, instruction)?;
    check_width(ptm, cp.ptm_width(), "ptm")
}

/// Slots are filled right to left in listing order, each holding
/// `channel_index + 1`; a zero-filled slot is the implied null value. Unused
/// slots end up at the low-order end.
pub fn build_ici(cp: &CoreParameters, instruction: &Instruction) -> Result<u64, AssemblyError> {
    let input_channels = &instruction.trigger.input_channels;
    if input_channels.len() > cp.max_num_input_channels_to_check as usize {
        return Err(AssemblyError::new(format!(
            "The {} input channels to check exceed the architecture's specified maximum of {}.",
            input_channels.len(),
            cp.max_num_input_channels_to_check
        )));
    }

    let mut ici: u64 = 0;
    for (i, &input_channel) in input_channels.iter().rev().enumerate() {
        ici |= (input_channel + 1) as u64;
        if i != input_channels.len() - 1 {
            ici <<= cp.single_ici_width();
        }
    }

    let num_null_slots = cp.max_num_input_channels_to_check as usize - input_channels.len();
    ici <<= num_null_slots as u32 * cp.single_ici_width();

    check_width(ici, cp.ici_width(), "ici")
}

pub fn build_ictb(cp: &CoreParameters, instruction: &Instruction) -> Result<u64, AssemblyError> {
    let booleans = &instruction.trigger.input_channel_tag_booleans;
    if booleans.len() > cp.max_num_input_channels_to_check as usize {
        return Err(AssemblyError::new(format!(
            "The {} input channel tags to check exceed the architecture's specified maximum of {}.",
            booleans.len(),
            cp.max_num_input_channels_to_check
        )));
    }

    let mut ictb: u64 = 0;
    for (i, &boolean) in booleans.iter().rev().enumerate() {
        ictb |= boolean as u64;
        if i != booleans.len() - 1 {
            ictb <<= 1;
        }
    }

    let num_null_slots = cp.max_num_input_channels_to_check as usize - booleans.len();
    ictb <<= num_null_slots as u32;

    check_width(ictb, cp.ictb_width(), "ictb")
}

pub fn build_ictv(cp: &CoreParameters, instruction: &Instruction) -> Result<u64, AssemblyError> {
    let tags = &instruction.trigger.input_channel_tags;
    if tags.len() > cp.max_num_input_channels_to_check as usize {
        return Err(AssemblyError::new(format!(
            "The {} input channel tags to check exceed the architecture's specified maximum of {}.",
            tags.len(),
            cp.max_num_input_channels_to_check
        )));
    }

    let mut ictv: u64 = 0;
    for (i, &tag_value) in tags.iter().rev().enumerate() {
        ictv |= tag_value as u64;
        if i != tags.len() - 1 {
            ictv <<= cp.tag_width();
        }
    }

    let num_null_slots = cp.max_num_input_channels_to_check as usize - tags.len();
    ictv <<= num_null_slots as u32 * cp.tag_width();

    check_width(ictv, cp.ictv_width(), "ictv")
}

pub fn build_op(cp: &CoreParameters, instruction: &Instruction) -> Result<u64, AssemblyError> {
    check_width(enum_to_u32(instruction.op) as u64, cp.op_width(), "op")
}

/// Three slots concatenated, slot 0 at the low-order end.
pub fn build_st(cp: &CoreParameters, instruction: &Instruction) -> Result<u64, AssemblyError> {
    let mut st: u64 = enum_to_u32(instruction.source_types[2]) as u64;
    st <<= cp.single_st_width();
    st |= enum_to_u32(instruction.source_types[1]) as u64;
    st <<= cp.single_st_width();
    st |= enum_to_u32(instruction.source_types[0]) as u64;
    check_width(st, cp.st_width(), "st")
}

pub fn build_si(cp: &CoreParameters, instruction: &Instruction) -> Result<u64, AssemblyError> {
    let mut si: u64 = instruction.source_indices[2] as u64;
    si <<= cp.single_si_width();
    si |= instruction.source_indices[1] as u64;
    si <<= cp.single_si_width();
    si |= instruction.source_indices[0] as u64;
    check_width(si, cp.si_width(), "si")
}

pub fn build_dt(cp: &CoreParameters, instruction: &Instruction) -> Result<u64, AssemblyError> {
    check_width(
        enum_to_u32(instruction.destination_type) as u64,
        cp.dt_width(),
        "dt",
    )
}

pub fn build_di(cp: &CoreParameters, instruction: &Instruction) -> Result<u64, AssemblyError> {
    let di = instruction.destination_index.unwrap_or(0) as u64;
    check_width(di, cp.di_width(), "di")
}

/// One-hot mask over the output channels; duplicate fan-out indices are
/// rejected.
pub fn build_oci(cp: &CoreParameters, instruction: &Instruction) -> Result<u64, AssemblyError> {
    let indices = &instruction.output_channel_indices;
    for (i, &output_channel) in indices.iter().enumerate() {
        if indices[..i].contains(&output_channel) {
            return Err(AssemblyError::new(
                "The indices in a high-fan-out instruction must be unique.",
            ));
        }
    }

    let mut oci: u64 = 0;
    for output_channel in (0..cp.num_output_channels).rev() {
        if indices.contains(&output_channel) {
            oci |= 1;
        }
        if output_channel != 0 {
            oci <<= 1;
        }
    }

    check_width(oci, cp.oci_width(), "oci")
}

pub fn build_oct(cp: &CoreParameters, instruction: &Instruction) -> Result<u64, AssemblyError> {
    let oct = instruction.output_channel_tag.unwrap_or(0) as u64;
    check_width(oct, cp.oct_width(), "oct")
}

/// One-hot mask over the input channels to dequeue on fire.
pub fn build_icd(cp: &CoreParameters, instruction: &Instruction) -> Result<u64, AssemblyError> {
    let mut icd: u64 = 0;
    for input_channel in (0..cp.num_input_channels).rev() {
        if instruction.input_channels_to_dequeue.contains(&input_channel) {
            icd |= 1;
        }
        if input_channel != 0 {
            icd <<= 1;
        }
    }

    check_width(icd, cp.icd_width(), "icd")
}

pub fn build_true_pum(cp: &CoreParameters, instruction: &Instruction) -> Result<u64, AssemblyError> {
    let mut true_pum: u64 = 0;
    for (&predicate, &boolean) in instruction
        .predicate_update_indices
        .iter()
        .zip(&instruction.predicate_update_values)
    {
        check_predicate_range(predicate, cp)?;
        if boolean {
            true_pum |= 1 << predicate;
        }
    }
    check_width(true_pum, cp.true_pum_width(), "True pum")
}

pub fn build_false_pum(
    cp: &CoreParameters,
    instruction: &Instruction,
) -> Result<u64, AssemblyError> {
    let mut false_pum: u64 = 0;
    for (&predicate, &boolean) in instruction
        .predicate_update_indices
        .iter()
        .zip(&instruction.predicate_update_values)
    {
        check_predicate_range(predicate, cp)?;
        if !boolean {
            false_pum |= 1 << predicate;
        }
    }
    check_width(false_pum, cp.false_pum_width(), "False pum")
}

pub fn build_pum(cp: &CoreParameters, instruction: &Instruction) -> Result<u64, AssemblyError> {
    let mut pum = build_true_pum(cp, instruction)?;
    pum <<= cp.false_pum_width();
    pum |= build_false_pum(cp, instruction)?;
    check_width(pum, cp.pum_width(), "pum")
}

/// Canonicalize to an unsigned word, then mask to the immediate width. The
/// original signed value must fit the budget.
pub fn build_immediate(cp: &CoreParameters, instruction: &Instruction) -> Result<u64, AssemblyError> {
    let immediate = match instruction.immediate {
        None => return Ok(0),
        Some(immediate) => immediate,
    };

    if signed_bit_length(immediate) > cp.immediate_width {
        return Err(AssemblyError::new(
            "The immediate exceeds its allotted bit width.",
        ));
    }

    let unsigned = immediate as u32 as u64;
    Ok(unsigned & low_mask(cp.immediate_width))
}

/// Build the entire bit pattern for one instruction.
pub fn build_machine_code_instruction(
    cp: &CoreParameters,
    instruction: &Instruction,
) -> Result<BigUint, AssemblyError> {
    let mut machine_code = BigUint::from(1u32); // vi is valid.
    machine_code <<= cp.ptm_width() as usize;
    machine_code |= BigUint::from(build_ptm(cp, instruction)?);
    machine_code <<= cp.ici_width() as usize;
    machine_code |= BigUint::from(build_ici(cp, instruction)?);
    machine_code <<= cp.ictb_width() as usize;
    machine_code |= BigUint::from(build_ictb(cp, instruction)?);
    machine_code <<= cp.ictv_width() as usize;
    machine_code |= BigUint::from(build_ictv(cp, instruction)?);
    machine_code <<= cp.op_width() as usize;
    machine_code |= BigUint::from(build_op(cp, instruction)?);
    machine_code <<= cp.st_width() as usize;
    machine_code |= BigUint::from(build_st(cp, instruction)?);
    machine_code <<= cp.si_width() as usize;
    machine_code |= BigUint::from(build_si(cp, instruction)?);
    machine_code <<= cp.dt_width() as usize;
    machine_code |= BigUint::from(build_dt(cp, instruction)?);
    machine_code <<= cp.di_width() as usize;
    machine_code |= BigUint::from(build_di(cp, instruction)?);
    machine_code <<= cp.oci_width() as usize;
    machine_code |= BigUint::from(build_oci(cp, instruction)?);
    machine_code <<= cp.oct_width() as usize;
    machine_code |= BigUint::from(build_oct(cp, instruction)?);
    machine_code <<= cp.icd_width() as usize;
    machine_code |= BigUint::from(build_icd(cp, instruction)?);
    machine_code <<= cp.pum_width() as usize;
    machine_code |= BigUint::from(build_pum(cp, instruction)?);
    machine_code <<= cp.immediate_width as usize;
    machine_code |= BigUint::from(build_immediate(cp, instruction)?);
    machine_code <<= cp.padding_width() as usize;
    Ok(machine_code)
}

/// Convert a program to the two 32-bit word lists of the binary image: the
/// masked initial register file, then the instruction image sliced into
/// little-endian words and padded with empty instructions up to
/// `num_instructions`.
pub fn build_program_binary(
    cp: &CoreParameters,
    program: &ProcessingElementProgram,
) -> Result<(Vec<u32>, Vec<u32>), AssemblyError> {
    let mut register_words = Vec::with_capacity(program.register_values.len());
    for &register_value in &program.register_values {
        let unsigned = register_value as u32 as u64;
        register_words.push((unsigned & low_mask(cp.device_word_width)) as u32);
    }

    if cp.mm_instruction_width % 32 != 0 {
        return Err(AssemblyError::new(
            "Memory-mapped instructions must be in multiples of 32-bit words.",
        ));
    }
    let mm_instruction_word_width = (cp.mm_instruction_width / 32) as usize;

    let mut instruction_words = Vec::new();
    for instruction in &program.instructions {
        let machine_code = build_machine_code_instruction(cp, instruction)
            .map_err(|error| error.in_instruction(instruction.number))?;
        let mut words = machine_code.to_u32_digits();
        words.resize(mm_instruction_word_width, 0);
        instruction_words.extend_from_slice(&words);
    }

    // Append empty instructions to fill out the remaining instruction memory.
    if program.instructions.len() < cp.num_instructions as usize {
        let num_empty_instructions = cp.num_instructions as usize - program.instructions.len();
        instruction_words.extend(vec![0u32; num_empty_instructions * mm_instruction_word_width]);
    }

    Ok((register_words, instruction_words))
}
