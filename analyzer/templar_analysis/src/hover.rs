//! Hover resolution.

use templar_parse::{ArgKind, FunctionCallSite, ParsedTemplateFile};
use templar_registry::{Resolved, TypeRegistry, WorkspaceSnapshot};
use templar_source::Span;

use crate::resolve::{effective_target, scope_type};

/// Markdown blocks for one hover, plus the span they describe.
///
/// Absence of hover information is `None` at the call site, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverResult {
    /// Markdown blocks, rendered in order.
    pub contents: Vec<String>,
    pub span: Span,
}

/// Resolve hover content for a byte offset.
///
/// Picks the most specific reference containing the offset — the longest
/// dotted chain whose span covers it. Returns `None` when no reference
/// contains the offset, the governing type hint does not resolve, or the
/// dotted path itself fails lookup.
pub fn hover(
    parsed: &ParsedTemplateFile,
    registry: &dyn TypeRegistry,
    snap: WorkspaceSnapshot<'_>,
    offset: u32,
) -> Option<HoverResult> {
    if let Some(var) = parsed
        .variables
        .iter()
        .filter(|v| v.span.contains(offset))
        .max_by_key(|v| v.span.len())
    {
        return hover_variable(parsed, registry, snap, &var.name, &var.scope, var.span);
    }

    let call = parsed
        .functions
        .iter()
        .find(|f| f.span.contains(offset))?;
    let method = registry.root_methods().get(&call.name)?;
    let mut contents = vec![fenced(&method.signature())];

    let args = resolved_arg_types(parsed, registry, snap, call);
    if !args.is_empty() {
        contents.push(fenced(&args.join("\n")));
    }

    Some(HoverResult {
        contents,
        span: call.span,
    })
}

/// Render the argument chains of a call site that resolve from context,
/// one `chain type` line each. Arguments that are not field or variable
/// chains, or that fail lookup, are left out.
fn resolved_arg_types(
    parsed: &ParsedTemplateFile,
    registry: &dyn TypeRegistry,
    snap: WorkspaceSnapshot<'_>,
    call: &FunctionCallSite,
) -> Vec<String> {
    call.args
        .iter()
        .filter(|arg| matches!(arg.kind, ArgKind::FieldChain | ArgKind::Variable))
        .filter_map(|arg| {
            let (target_scope, path) = effective_target(&arg.text, &call.scope)?;
            if path.is_empty() {
                return None;
            }
            let desc = scope_type(parsed, registry, snap, target_scope)?;
            let resolved = registry.validate_field(snap, &desc, path).ok()?;
            let ty = resolved.type_ref()?;
            Some(format!(".{path} {ty}"))
        })
        .collect()
}

fn hover_variable(
    parsed: &ParsedTemplateFile,
    registry: &dyn TypeRegistry,
    snap: WorkspaceSnapshot<'_>,
    name: &str,
    scope: &str,
    span: Span,
) -> Option<HoverResult> {
    let (target_scope, path) = effective_target(name, scope)?;
    let desc = scope_type(parsed, registry, snap, target_scope)?;
    let resolved = registry.validate_field(snap, &desc, path).ok()?;

    let mut contents = Vec::new();
    match &resolved {
        Resolved::Field(field) => contents.push(fenced(&format!("{} {}", field.name, field.ty))),
        Resolved::Method(method) => contents.push(fenced(&method.signature())),
    }

    // When the leaf is itself a declared type, show its full shape too.
    if let Some(leaf_path) = resolved.type_ref().and_then(|t| t.named_path()) {
        if let Ok(leaf) = registry.validate_type(snap, leaf_path) {
            contents.push(fenced(&leaf.render()));
        }
    }

    contents.push(format!("`.{path}`"));
    Some(HoverResult { contents, span })
}

fn fenced(code: &str) -> String {
    format!("```go\n{code}\n```")
}
