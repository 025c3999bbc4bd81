//! The request-file model and its parser.

pub mod model;
pub mod parser;

pub use model::{Case, Exchange, HttpFile};
pub use parser::{parse_file, parse_reader, parse_str};
