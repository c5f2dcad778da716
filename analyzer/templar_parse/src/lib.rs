//! Template parser for the Templar analyzer.
//!
//! Turns raw template text into a [`ParsedTemplateFile`]: type hints,
//! dotted field chains, variable references, and pipeline call sites, each
//! tagged with a byte span. Two layers, mirroring raw scanning feeding a
//! logos token stream: [`scan`] walks `{{ ... }}` delimiters, [`parse`]
//! tokenizes each action interior and tracks lexical scope.

mod error;
mod parser;
mod scanner;
mod token;

pub use error::ParseError;
pub use parser::{
    parse, ActionSpan, ArgKind, CallArg, FunctionCallSite, ParsedTemplateFile, TypeHint,
    VariableLocation,
};
pub use scanner::{scan, RawAction};
pub use token::ActionToken;
