use matches::debug_assert_matches;
use pest::iterators::Pair;
use tia::assembly::instruction::{DestinationType, Instruction, Op, SourceType, Trigger};

use crate::int_util::{process_index, process_int};
use crate::parser::Rule;
use crate::{new_parser_error, ParseResult};

/// Build one [`Instruction`] from an `instruction_statement` pair, assigning
/// it the given ordinal.
pub fn process_instruction(pair: Pair<Rule>, number: i32) -> ParseResult<Instruction> {
    debug_assert_matches!(pair.as_rule(), Rule::instruction_statement);
    let mut pairs = pair.into_inner();

    let predicate_conditions = pairs.next().unwrap();
    debug_assert_matches!(predicate_conditions.as_rule(), Rule::predicate_conditions);
    let trigger_bits_pair = predicate_conditions.into_inner().next().unwrap();
    let trigger_bits_span = trigger_bits_pair.as_span();
    let trigger_bits = trigger_bits_pair.as_str().to_owned();

    let mut instruction = Instruction::new();
    instruction.number = number;
    instruction
        .trigger
        .add_predicate_conditions_from_bin_string(&trigger_bits)
        .map_err(|error| new_parser_error(trigger_bits_span, error.to_string()))?;

    let mut next = pairs.next().unwrap();
    if next.as_rule() == Rule::with_clause {
        process_with_clause(next, &mut instruction.trigger)?;
        next = pairs.next().unwrap();
    }

    debug_assert_matches!(next.as_rule(), Rule::datapath);
    process_datapath(next, &mut instruction)?;

    let mut dequeue_seen = false;
    let mut update_seen = false;
    for clause in pairs {
        debug_assert_matches!(clause.as_rule(), Rule::secondary_clause);
        let inner = clause.into_inner().next().unwrap();
        match inner.as_rule() {
            Rule::dequeue_clause => {
                if dequeue_seen {
                    return Err(new_parser_error(
                        inner.as_span(),
                        "Cannot have two deq statements in an instruction. Group dequeuing \
                         operations into a single deq statement."
                            .to_owned(),
                    ));
                }
                dequeue_seen = true;
                process_dequeue_clause(inner, &mut instruction)?;
            }
            Rule::update_clause => {
                if update_seen {
                    return Err(new_parser_error(
                        inner.as_span(),
                        "Cannot set the predicates to multiple values in a single instruction."
                            .to_owned(),
                    ));
                }
                update_seen = true;
                process_update_clause(inner, &trigger_bits, &mut instruction)?;
            }
            _ => unreachable!(),
        }
    }

    Ok(instruction)
}

fn process_with_clause(pair: Pair<Rule>, trigger: &mut Trigger) -> ParseResult<()> {
    debug_assert_matches!(pair.as_rule(), Rule::with_clause);
    for channel_condition in pair.into_inner() {
        let mut inner = channel_condition.into_inner();
        let first = inner.next().unwrap();
        let (boolean, channel_pair) = if first.as_rule() == Rule::negation {
            (false, inner.next().unwrap())
        } else {
            (true, first)
        };
        let channel_span = channel_pair.as_span();
        let mut channel_inner = channel_pair.into_inner();
        let channel = process_index(&channel_inner.next().unwrap())?;
        let tag_pair = channel_inner.next().ok_or_else(|| {
            new_parser_error(
                channel_span,
                "Input channel conditions must specify a tag.".to_owned(),
            )
        })?;
        let tag = process_index(&tag_pair)?;
        trigger.add_input_channel_condition(channel, tag, boolean);
    }
    Ok(())
}

fn process_datapath(pair: Pair<Rule>, instruction: &mut Instruction) -> ParseResult<()> {
    debug_assert_matches!(pair.as_rule(), Rule::datapath);
    let span = pair.as_span();
    let mut pairs = pair.into_inner();

    let mnemonic = pairs.next().unwrap();
    let op: Op = mnemonic
        .as_str()
        .to_uppercase()
        .parse()
        .map_err(|_error: util::ParseEnumError| {
            new_parser_error(
                mnemonic.as_span(),
                format!("Unrecognized instruction: {}", mnemonic.as_str()),
            )
        })?;
    instruction.op = op;

    let operands: Vec<Pair<Rule>> = pairs
        .map(|operand| {
            debug_assert_matches!(operand.as_rule(), Rule::operand);
            operand.into_inner().next().unwrap()
        })
        .collect();

    if operands.is_empty() {
        return Ok(());
    }

    // A scratchpad store has no destination: its first operand is the value
    // and its second the scratchpad address, stored as source slots 0 and 1.
    if op == Op::SSW {
        if operands.len() != 2 {
            return Err(new_parser_error(
                span,
                "A scratchpad store takes exactly two sources.".to_owned(),
            ));
        }
        process_source(&operands[0], 0, instruction)?;
        process_source(&operands[1], 1, instruction)?;
        return Ok(());
    }

    if operands.len() > 4 {
        return Err(new_parser_error(
            span,
            "Illegal number of datapath tokens.".to_owned(),
        ));
    }

    process_destination(&operands[0], instruction)?;
    for (slot, operand) in operands[1..].iter().enumerate() {
        process_source(operand, slot, instruction)?;
    }
    Ok(())
}

fn process_source(
    operand: &Pair<Rule>,
    slot: usize,
    instruction: &mut Instruction,
) -> ParseResult<()> {
    match operand.as_rule() {
        Rule::immediate => {
            let int_pair = operand.clone().into_inner().next().unwrap();
            let value = process_int(&int_pair)?;
            if let Some(existing) = instruction.immediate {
                if existing != value {
                    return Err(new_parser_error(
                        operand.as_span(),
                        "An instruction shares one immediate across all sources.".to_owned(),
                    ));
                }
            }
            instruction.immediate = Some(value);
            instruction.source_types[slot] = SourceType::Immediate;
            instruction.source_indices[slot] = 0;
        }
        Rule::input_channel => {
            // A tag on a channel source has no datapath meaning.
            let index_pair = operand.clone().into_inner().next().unwrap();
            instruction.source_types[slot] = SourceType::Channel;
            instruction.source_indices[slot] = process_index(&index_pair)?;
        }
        Rule::register => {
            let index_pair = operand.clone().into_inner().next().unwrap();
            instruction.source_types[slot] = SourceType::Register;
            instruction.source_indices[slot] = process_index(&index_pair)?;
        }
        _ => {
            return Err(new_parser_error(
                operand.as_span(),
                format!("{} is not a valid source.", operand.as_str()),
            ));
        }
    }
    Ok(())
}

fn process_destination(operand: &Pair<Rule>, instruction: &mut Instruction) -> ParseResult<()> {
    match operand.as_rule() {
        Rule::register => {
            let index_pair = operand.clone().into_inner().next().unwrap();
            instruction.destination_type = DestinationType::Register;
            instruction.destination_index = Some(process_index(&index_pair)?);
        }
        Rule::predicate => {
            let index_pair = operand.clone().into_inner().next().unwrap();
            instruction.destination_type = DestinationType::Predicate;
            instruction.destination_index = Some(process_index(&index_pair)?);
        }
        Rule::output_channel => {
            let mut inner = operand.clone().into_inner();
            let index = process_index(&inner.next().unwrap())?;
            let tag = process_index(&inner.next().unwrap())?;
            instruction.destination_type = DestinationType::Channel;
            instruction.destination_index = Some(index);
            instruction.output_channel_tag = Some(tag);
            // A channel destination must also be non-full to trigger.
            instruction.output_channel_indices = vec![index];
            instruction.trigger.output_channel_indices = vec![index];
        }
        Rule::multi_output_channel => {
            let inner: Vec<Pair<Rule>> = operand.clone().into_inner().collect();
            let (tag_pair, index_pairs) = inner.split_last().unwrap();

            let mut indices = Vec::with_capacity(index_pairs.len());
            for index_pair in index_pairs {
                let index = process_index(index_pair)?;
                if indices.contains(&index) {
                    return Err(new_parser_error(
                        operand.as_span(),
                        "The indices in a high-fan-out instruction must be unique.".to_owned(),
                    ));
                }
                indices.push(index);
            }

            instruction.destination_type = DestinationType::Channel;
            instruction.destination_index = Some(0);
            instruction.output_channel_tag = Some(process_index(tag_pair)?);
            instruction.output_channel_indices = indices.clone();
            instruction.trigger.output_channel_indices = indices;
        }
        _ => {
            return Err(new_parser_error(
                operand.as_span(),
                format!("{} is not a valid destination.", operand.as_str()),
            ));
        }
    }
    Ok(())
}

fn process_dequeue_clause(pair: Pair<Rule>, instruction: &mut Instruction) -> ParseResult<()> {
    debug_assert_matches!(pair.as_rule(), Rule::dequeue_clause);
    for input_channel in pair.into_inner() {
        let index_pair = input_channel.into_inner().next().unwrap();
        instruction
            .input_channels_to_dequeue
            .push(process_index(&index_pair)?);
    }
    Ok(())
}

fn process_update_clause(
    pair: Pair<Rule>,
    trigger_bits: &str,
    instruction: &mut Instruction,
) -> ParseResult<()> {
    debug_assert_matches!(pair.as_rule(), Rule::update_clause);
    let update_bits = pair.into_inner().next().unwrap();
    instruction
        .add_predicate_updates_from_bin_strings(trigger_bits, update_bits.as_str())
        .map_err(|error| new_parser_error(update_bits.as_span(), error.to_string()))
}
