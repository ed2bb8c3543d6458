use ::pest::Parser;

use crate::parser::{Rule, TiaParser};

fn accepts(rule: Rule, input: &str) -> bool {
    TiaParser::parse(rule, input).is_ok()
}

fn accepts_program(input: &str) -> bool {
    accepts(Rule::program, input)
}

#[test]
fn init_statement_forms() {
    assert!(accepts(Rule::init_statement, "init %r0, $3;"));
    assert!(accepts(Rule::init_statement, "init %r7 , $-17 ;"));
    assert!(accepts(Rule::init_statement, "init %r1, $0x1F;"));
    assert!(accepts(Rule::init_statement, "init %r1, $-0x1F;"));
}

#[test]
fn instruction_statement_forms() {
    assert!(accepts(
        Rule::instruction_statement,
        "when %p == XXXXXXXX : halt;"
    ));
    assert!(accepts(
        Rule::instruction_statement,
        "when %p == XXXXXXX0 : add %r1, %r0, $7;"
    ));
    assert!(accepts(
        Rule::instruction_statement,
        "when %p == X1 with %i2.0, !%i1.3 : mov %o0.1, %i2; deq %i2; set %p = X0;"
    ));
    assert!(accepts(
        Rule::instruction_statement,
        "when %p == X : mov %o{0, 2, 3}.7, $42;"
    ));
    assert!(accepts(
        Rule::instruction_statement,
        "when %p == X : sb %r0, %r1, %r2;"
    ));
    assert!(accepts(
        Rule::instruction_statement,
        "when %p == X : ssw %r1, $5;"
    ));
}

#[test]
fn statements_require_their_punctuation() {
    assert!(!accepts_program("<pe> when %p == X halt;"));
    assert!(!accepts_program("<pe> when %p == X : halt"));
    assert!(!accepts_program("<pe> when %p == X : add %r1 %r0;"));
    assert!(!accepts_program("<pe> init %r0 $3;"));
}

#[test]
fn comments_and_layout_are_free() {
    let input = "# kernel of the day
<pe_0>
  init %r0, $3;   # three
  when %p == XXXXXXX0 :
      add %r1, %r0, $7;
      # a dangling comment
  when %p == XXXXXXX1 : halt;
<pe_1>
";
    assert!(accepts_program(input));
}

#[test]
fn labels_delimit_sections() {
    assert!(accepts_program("<a> <b> <c-2>"));
    assert!(!accepts_program("init %r0, $1;")); // No leading label.
    assert!(!accepts_program("<a b>"));
}

#[test]
fn bit_strings_are_checked_per_position() {
    assert!(accepts(
        Rule::instruction_statement,
        "when %p == 10xX : nop %r0; set %p = Zz10;"
    ));
    // Z is an update-only character; the trigger rule does not lex it.
    assert!(!accepts_program("<a> when %p == 1Z : halt;"));
}
