use std::error::Error as StdError;
use std::fmt;

use pest::error::Error as PestError;
use tia::assembly::AssemblyError;
use tia::parameters::ParameterError;

use crate::parser::Rule;

/// Anything that can go wrong while assembling: a syntax error carrying a
/// source span, a semantic or encoding fault, or an inconsistent parameter
/// set.
#[derive(Clone, Debug)]
pub enum Error {
    Parse(Box<PestError<Rule>>),
    Assemble(AssemblyError),
    Parameter(ParameterError),
}

impl From<PestError<Rule>> for Error {
    fn from(error: PestError<Rule>) -> Error {
        Error::Parse(Box::new(error))
    }
}

impl From<AssemblyError> for Error {
    fn from(error: AssemblyError) -> Error {
        Error::Assemble(error)
    }
}

impl From<ParameterError> for Error {
    fn from(error: ParameterError) -> Error {
        Error::Parameter(error)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(error) => error.fmt(f),
            Error::Assemble(error) => error.fmt(f),
            Error::Parameter(error) => error.fmt(f),
        }
    }
}

impl StdError for Error {}
