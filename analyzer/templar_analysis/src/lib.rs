//! Analysis engine for Templar templates.
//!
//! Consumes [`templar_parse::ParsedTemplateFile`] output and a
//! [`templar_registry::TypeRegistry`], producing diagnostics, hover
//! content, completion candidates, and semantic tokens. Everything here is
//! synchronous, side-effect free, and protocol-agnostic; the serving layer
//! owns coordinate conversion and transport concerns.

mod completion;
mod diagnostic;
mod hover;
mod resolve;
pub mod semantic;

pub use completion::{completions, CompletionItem, CompletionKind};
pub use diagnostic::{check, Diagnostic, Severity};
pub use hover::{hover, HoverResult};
