use pest::iterators::Pair;

use crate::parser::Rule;
use crate::{new_parser_error, ParseResult};

/// Parse a signed `int` token: decimal or `0x`-prefixed hexadecimal, with an
/// optional leading minus in either base.
pub fn process_int(pair: &Pair<Rule>) -> ParseResult<i64> {
    let span = pair.as_span();
    let text = pair.as_str();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let parsed = match digits.strip_prefix("0x") {
        Some(hex_digits) => i64::from_str_radix(hex_digits, 16),
        None => digits.parse::<i64>(),
    };
    let magnitude = parsed
        .map_err(|error| new_parser_error(span, format!("Parsing integer failed: {}", error)))?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Parse an unsigned `index` token.
pub fn process_index(pair: &Pair<Rule>) -> ParseResult<u32> {
    let span = pair.as_span();
    pair.as_str()
        .parse::<u32>()
        .map_err(|error| new_parser_error(span, format!("Parsing index failed: {}", error)))
}
