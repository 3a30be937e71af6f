pub mod ast;
pub mod error;
pub mod id_generator;
pub mod lexer;
pub mod parser;
mod reconcile;
pub mod result;

#[cfg(test)]
mod tests_identity;
#[cfg(test)]
mod tests_recovery;

pub use ast::{Node, NodeKind, NodeRef, Path, Prop, PropValue, Slot, Span, Tree};
pub use error::ParseError;
#[cfg(feature = "pretty-errors")]
pub use error::format_errors;
pub use parser::{parse, parse_with_path, ParseOptions, Parser};
pub use result::ParseResult;
