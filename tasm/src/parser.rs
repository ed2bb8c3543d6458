use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "tia.pest"]
pub struct TiaParser;
