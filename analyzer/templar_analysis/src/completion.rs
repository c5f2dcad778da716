//! Completion resolution.
//!
//! The context is derived from the text immediately before the cursor:
//! after a dot inside an action the engine offers the fields and methods of
//! the type the chain-so-far resolves to; anywhere else inside an action it
//! offers the variables already referenced in scope plus the root
//! functions. Outside actions there is nothing to complete.

use templar_parse::ParsedTemplateFile;
use templar_registry::{TypeDescriptor, TypeRegistry, WorkspaceSnapshot};

use crate::resolve::{effective_target, scope_type};

/// What a completion item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    Field,
    Method,
    Variable,
    Function,
}

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionKind,
    pub detail: String,
}

/// Compute completion candidates for a byte offset.
pub fn completions(
    parsed: &ParsedTemplateFile,
    registry: &dyn TypeRegistry,
    snap: WorkspaceSnapshot<'_>,
    text: &str,
    offset: usize,
) -> Vec<CompletionItem> {
    let mut offset = offset.min(text.len());
    while offset > 0 && !text.is_char_boundary(offset) {
        offset -= 1;
    }

    let Some(action) = parsed.action_at(offset as u32) else {
        return Vec::new();
    };
    if action.comment {
        return Vec::new();
    }

    let inner_start = action.inner.start as usize;
    let before = &text[inner_start..offset];

    match chain_before_cursor(before) {
        Some(chain) => field_completions(parsed, registry, snap, &action.scope, &chain),
        None => variable_completions(parsed, registry, &action.scope),
    }
}

/// The dotted chain ending in a dot before the cursor, if the cursor sits
/// in a field-access position. `".Address.Str|"` yields `".Address"`;
/// `".|"` yields `""`; a non-dotted position yields `None`.
fn chain_before_cursor(before: &str) -> Option<String> {
    let bytes = before.as_bytes();
    let mut i = bytes.len();

    // Skip the partial segment being typed.
    while i > 0 && (bytes[i - 1].is_ascii_alphanumeric() || bytes[i - 1] == b'_') {
        i -= 1;
    }
    if i == 0 || bytes[i - 1] != b'.' {
        return None;
    }
    let dot = i - 1;

    // Walk back over the chain the final dot ends.
    let mut start = dot;
    while start > 0
        && (bytes[start - 1].is_ascii_alphanumeric()
            || matches!(bytes[start - 1], b'_' | b'.' | b'$'))
    {
        start -= 1;
    }
    Some(before[start..dot].to_owned())
}

fn field_completions(
    parsed: &ParsedTemplateFile,
    registry: &dyn TypeRegistry,
    snap: WorkspaceSnapshot<'_>,
    scope: &str,
    chain: &str,
) -> Vec<CompletionItem> {
    // Normalize the chain to an effective scope and remaining dotted path.
    let reference = chain.trim_start_matches('.');
    let (target_scope, path) = match effective_target(reference, scope) {
        Some(target) => target,
        None => return Vec::new(),
    };
    let Some(root) = scope_type(parsed, registry, snap, target_scope) else {
        return Vec::new();
    };

    let desc = if path.is_empty() {
        root
    } else {
        let Ok(resolved) = registry.validate_field(snap, &root, path) else {
            return Vec::new();
        };
        let Some(named) = resolved.type_ref().and_then(|t| t.named_path()) else {
            return Vec::new();
        };
        let Ok(desc) = registry.validate_type(snap, named) else {
            return Vec::new();
        };
        desc
    };

    members(&desc)
}

fn members(desc: &TypeDescriptor) -> Vec<CompletionItem> {
    let mut items = Vec::new();
    for field in &desc.fields {
        items.push(CompletionItem {
            label: field.name.clone(),
            kind: CompletionKind::Field,
            detail: field.ty.to_string(),
        });
    }
    for method in &desc.methods {
        items.push(CompletionItem {
            label: method.name.clone(),
            kind: CompletionKind::Method,
            detail: method.signature(),
        });
    }
    items
}

/// Variables referenced in the current scope first, outer (root) scope
/// appended without duplicates, then the root functions.
fn variable_completions(
    parsed: &ParsedTemplateFile,
    registry: &dyn TypeRegistry,
    scope: &str,
) -> Vec<CompletionItem> {
    let mut items: Vec<CompletionItem> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    add_scope(parsed, scope, &mut items, &mut seen);
    if !scope.is_empty() {
        add_scope(parsed, "", &mut items, &mut seen);
    }

    let mut functions: Vec<&String> = registry.root_methods().keys().collect();
    functions.sort();
    for name in functions {
        if let Some(method) = registry.root_methods().get(name) {
            items.push(CompletionItem {
                label: name.clone(),
                kind: CompletionKind::Function,
                detail: method.signature(),
            });
        }
    }

    items
}

fn add_scope<'p>(
    parsed: &'p ParsedTemplateFile,
    from_scope: &str,
    items: &mut Vec<CompletionItem>,
    seen: &mut Vec<&'p str>,
) {
    for var in parsed.variables.iter().filter(|v| v.scope == from_scope) {
        if var.name.is_empty() || seen.contains(&var.name.as_str()) {
            continue;
        }
        seen.push(&var.name);
        items.push(CompletionItem {
            label: var.name.clone(),
            kind: CompletionKind::Variable,
            detail: String::new(),
        });
    }
}
