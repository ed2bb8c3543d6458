//! Assembler for triggered-instruction processing element arrays.
//!
//! The main entry points are [`parse_programs`], which turns assembly text
//! into validated [`ProcessingElementProgram`]s, and [`assemble`], which
//! additionally lowers every program to a [`ProgramImage`] from the
//! [timage](../timage/index.html) crate. [`apply_macros`] performs the
//! optional textual macro substitution step beforehand.
//!
//! Parsing is implemented with [pest]; syntax errors are `pest` errors and
//! carry the offending span, so they format with the source line.
//!
//! # Assembly Language
//!
//! A program is divided into processing element sections by `<name>` labels;
//! everything from one label to the next belongs to that element. Comments
//! start with a hash symbol `#` and run to the end of the line. Statements
//! end with `;`.
//!
//! ## Register Initialization
//!
//! `init %rN, $VALUE;` presets register `N`; uninitialized registers start at
//! zero. Values are decimal or `0x`-prefixed hexadecimal, with an optional
//! leading minus.
//!
//! ## Triggered Instructions
//!
//! ```text
//! when %p == BITS [with CHANNELS] : OP [DST[, SRC...]] [; deq CHANNELS] [; set %p = BITS] ;
//! ```
//!
//! The trigger names the predicate states and channel conditions under which
//! the instruction may fire:
//!
//! * `%p == 1X0X` — predicate bit-string, right-indexed (the last character
//!   is predicate 0). `1` requires true, `0` requires false, `X` is don't
//!   care.
//! * `with %i1.3, !%i2.0` — the listed input channels must be non-empty and
//!   their head packets' tags must equal (or, with `!`, differ from) the
//!   given tag.
//!
//! The datapath names an operation, a destination and up to three sources:
//!
//!  Token          | Meaning
//! ----------------|--------------------------------------------
//! `$VALUE`        | immediate source (one shared value per instruction)
//! `%iN`           | input channel source (reads the head without popping)
//! `%rN`           | register source or destination
//! `%pN`           | predicate destination
//! `%oN.TAG`       | output channel destination with packet tag
//! `%o{N,M,..}.TAG`| multicast output channel destination (unique indices)
//!
//! A channel destination implicitly requires the named output channels to be
//! non-full for the trigger to fire. `ssw VALUE, ADDR` is the one datapath
//! without a destination: both operands are sources (the scratchpad word and
//! its address).
//!
//! The optional trailing clauses run when the instruction fires: `deq %iN,
//! ...` pops the named input channels, and `set %p = BITS` rewrites predicate
//! state. The update emits only the positions whose value differs from the
//! trigger string; `X` and `Z` positions are left alone.

mod error;
mod instructions;
mod int_util;
mod parser;
mod program;

#[cfg(test)]
mod test;

use std::collections::HashMap;

use pest::error::ErrorVariant;
use pest::iterators::Pair;
use pest::{Parser, Span};
use tia::assembly::machine_code::build_program_binary;
use tia::assembly::program::ProcessingElementProgram;
use tia::parameters::CoreParameters;
use timage::ProgramImage;

pub use crate::error::Error;
pub use crate::parser::{Rule, TiaParser};

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) type ParseResult<T> = std::result::Result<T, pest::error::Error<Rule>>;

pub(crate) fn new_parser_error(span: Span, message: String) -> pest::error::Error<Rule> {
    pest::error::Error::new_from_span(ErrorVariant::CustomError { message }, span)
}

/// Apply macros to the source as plain text substitution. Macros are applied
/// longest name first, so a macro that is a substring of another can never
/// match inside it.
pub fn apply_macros(macro_map: &HashMap<String, String>, program_string: &str) -> String {
    let mut macros: Vec<&String> = macro_map.keys().collect();
    macros.sort_by_key(|name| std::cmp::Reverse(name.len()));

    let mut program_string = program_string.to_owned();
    for name in macros {
        program_string = program_string.replace(name.as_str(), &macro_map[name]);
    }
    program_string
}

fn parse(input: &str) -> ParseResult<Pair<Rule>> {
    Ok(TiaParser::parse(Rule::program, input)?.next().unwrap())
}

/// Parse assembly text into one validated program per `<label>` section.
pub fn parse_programs(
    input: &str,
    cp: &CoreParameters,
) -> Result<Vec<ProcessingElementProgram>> {
    let program_pair = parse(input).map_err(Error::from)?;
    let mut programs = Vec::new();
    for section in program_pair.into_inner() {
        match section.as_rule() {
            Rule::pe_section => {
                let program = program::process_pe_section(section, cp).map_err(Error::from)?;
                program.validate(cp)?;
                programs.push(program);
            }
            Rule::EOI => {}
            _ => unreachable!(),
        }
    }
    Ok(programs)
}

/// [`parse_programs`] with a macro substitution pass in front.
pub fn parse_programs_with_macros(
    input: &str,
    macro_map: &HashMap<String, String>,
    cp: &CoreParameters,
) -> Result<Vec<ProcessingElementProgram>> {
    parse_programs(&apply_macros(macro_map, input), cp)
}

/// Assemble source text into a labeled binary image per processing element.
/// The parameter set is checked against its instruction width budgets before
/// any image is produced.
pub fn assemble(input: &str, cp: &CoreParameters) -> Result<Vec<(String, ProgramImage)>> {
    cp.validate_instruction_format()?;
    let programs = parse_programs(input, cp)?;
    let mut images = Vec::with_capacity(programs.len());
    for program in &programs {
        let (register_words, instruction_words) = build_program_binary(cp, program)?;
        images.push((
            program.label.clone(),
            ProgramImage::from(register_words, instruction_words),
        ));
    }
    Ok(images)
}

/// [`assemble`] with a macro substitution pass in front.
pub fn assemble_with_macros(
    input: &str,
    macro_map: &HashMap<String, String>,
    cp: &CoreParameters,
) -> Result<Vec<(String, ProgramImage)>> {
    assemble(&apply_macros(macro_map, input), cp)
}
