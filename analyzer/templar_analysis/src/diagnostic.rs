//! Diagnostic generation.
//!
//! Protocol-agnostic: spans and severities here know nothing about LSP
//! coordinates; the serving layer converts them at the boundary.

use templar_parse::ParsedTemplateFile;
use templar_registry::{TypeRegistry, WorkspaceSnapshot};
use templar_source::Span;

use crate::resolve::effective_target;

/// Diagnostic severity, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

/// One diagnostic anchored at a span of the analyzed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub span: Span,
    pub severity: Severity,
    pub message: String,
}

/// Compute the full diagnostic set for one parsed template.
///
/// Per type hint: a hint the registry cannot resolve produces exactly one
/// error at the hint's span and suppresses every dependent reference check
/// in that scope (no cascading field errors). A resolved hint produces one
/// information diagnostic, then one error per reference in its scope that
/// fails field or function lookup. References in scopes with no hint are
/// skipped entirely. The result replaces any previous set wholesale and is
/// deterministic for identical input.
pub fn check(
    parsed: &ParsedTemplateFile,
    registry: &dyn TypeRegistry,
    snap: WorkspaceSnapshot<'_>,
) -> Vec<Diagnostic> {
    let mut out = Vec::new();

    for hint in &parsed.type_hints {
        let desc = match registry.validate_type(snap, &hint.type_path) {
            Ok(desc) => desc,
            Err(e) => {
                out.push(Diagnostic {
                    span: hint.span,
                    severity: Severity::Error,
                    message: e.to_string(),
                });
                continue;
            }
        };

        out.push(Diagnostic {
            span: hint.span,
            severity: Severity::Information,
            message: format!("type hint successfully loaded: {}", hint.type_path),
        });

        for var in &parsed.variables {
            let Some((scope, path)) = effective_target(&var.name, &var.scope) else {
                continue;
            };
            if scope != hint.scope || path.is_empty() {
                continue;
            }
            if let Err(e) = registry.validate_field(snap, &desc, path) {
                out.push(Diagnostic {
                    span: var.span,
                    severity: Severity::Error,
                    message: e.to_string(),
                });
            }
        }

        for call in &parsed.functions {
            if call.scope != hint.scope {
                continue;
            }
            if !registry.root_methods().contains_key(&call.name) {
                out.push(Diagnostic {
                    span: call.span,
                    severity: Severity::Error,
                    message: format!("function not found: {}", call.name),
                });
            }
        }
    }

    out.sort_by_key(|d| (d.span.start, d.span.end));
    tracing::debug!(count = out.len(), "diagnostics computed");
    out
}
