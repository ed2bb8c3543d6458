use matches::debug_assert_matches;
use pest::iterators::Pair;
use tia::assembly::program::ProcessingElementProgram;
use tia::parameters::CoreParameters;

use crate::instructions::process_instruction;
use crate::int_util::{process_index, process_int};
use crate::parser::Rule;
use crate::{new_parser_error, ParseResult};

/// Build one processing element program from a `pe_section` pair: the
/// register file starts zeroed and `init` statements overwrite single
/// entries; instructions keep their source order, which is their firing
/// priority.
pub fn process_pe_section(
    pair: Pair<Rule>,
    cp: &CoreParameters,
) -> ParseResult<ProcessingElementProgram> {
    debug_assert_matches!(pair.as_rule(), Rule::pe_section);
    let mut pairs = pair.into_inner();

    let pe_label = pairs.next().unwrap();
    debug_assert_matches!(pe_label.as_rule(), Rule::pe_label);
    let label = pe_label.into_inner().next().unwrap().as_str().to_owned();

    let mut register_values = vec![0i64; cp.num_registers as usize];
    let mut instructions = Vec::new();

    for statement in pairs {
        let inner = statement.into_inner().next().unwrap();
        match inner.as_rule() {
            Rule::init_statement => {
                let mut parts = inner.into_inner();
                let register_pair = parts.next().unwrap();
                let register_span = register_pair.as_span();
                let index_pair = register_pair.into_inner().next().unwrap();
                let register_index = process_index(&index_pair)? as usize;
                if register_index >= register_values.len() {
                    return Err(new_parser_error(
                        register_span,
                        format!(
                            "Register {} is out of range on the target architecture with {} \
                             registers.",
                            register_index, cp.num_registers
                        ),
                    ));
                }
                let immediate_pair = parts.next().unwrap();
                let int_pair = immediate_pair.into_inner().next().unwrap();
                register_values[register_index] = process_int(&int_pair)?;
            }
            Rule::instruction_statement => {
                let number = instructions.len() as i32;
                instructions.push(process_instruction(inner, number)?);
            }
            _ => unreachable!(),
        }
    }

    Ok(ProcessingElementProgram::new(
        label,
        register_values,
        instructions,
    ))
}
