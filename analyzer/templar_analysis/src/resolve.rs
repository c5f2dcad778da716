//! Shared scope and chain resolution.

use std::sync::Arc;

use templar_parse::ParsedTemplateFile;
use templar_registry::{TypeDescriptor, TypeRegistry, WorkspaceSnapshot};

/// The scope and dotted path a reference name actually resolves under.
///
/// `.Field` chains resolve in their own scope; `$.Field` chains jump to the
/// root scope, and the bare `$` is the root context itself (empty path);
/// `$var` chains have no type hint to resolve against and yield `None`
/// (they are skipped for diagnostics and hover, per the unresolved
/// reference policy).
pub(crate) fn effective_target<'a>(name: &'a str, scope: &'a str) -> Option<(&'a str, &'a str)> {
    if name == "$" {
        return Some(("", ""));
    }
    if let Some(rooted) = name.strip_prefix("$.") {
        return Some(("", rooted));
    }
    if name.starts_with('$') {
        return None;
    }
    Some((scope, name))
}

/// Resolve the type a scope's hint binds, if the scope has a hint the
/// registry can load.
pub(crate) fn scope_type(
    parsed: &ParsedTemplateFile,
    registry: &dyn TypeRegistry,
    snap: WorkspaceSnapshot<'_>,
    scope: &str,
) -> Option<Arc<TypeDescriptor>> {
    let hint = parsed.hint_for_scope(scope)?;
    registry.validate_type(snap, &hint.type_path).ok()
}
