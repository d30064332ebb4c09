//! Input parsing and source metadata.

mod parser;
mod source;

pub use parser::{Parser, ParserConfig, DEFAULT_MISSING_TOKENS};
pub use source::SourceMetadata;
