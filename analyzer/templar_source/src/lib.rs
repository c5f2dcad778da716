//! Source text model for the Templar analyzer.
//!
//! Everything that carries a location does so as a byte-offset [`Span`];
//! line/column values are always derived from a span against the text it was
//! produced from. The [`position`] module bridges three coordinate systems:
//! raw byte offsets, 1-based line/column, and the LSP's 0-based line with
//! UTF-16 code-unit characters.

mod position;
mod span;

pub use position::{
    offset_from_protocol, position_from_offset, range_text, to_protocol, LineIndex, RawPosition,
};
pub use span::{Span, SpanError};
