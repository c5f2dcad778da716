//! The registry contract consumed by the analysis engine.
//!
//! The real registry inspects host-language declarations in the workspace;
//! it lives behind [`TypeRegistry`] and is free to do filesystem and parse
//! work, as long as each call is a bounded, side-effect-free read that is
//! safe to issue concurrently. The engine never holds live references into
//! registry internals: types cross the boundary as `Arc<TypeDescriptor>`
//! values looked up by dotted path.

use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{FieldDescriptor, MethodDescriptor, TypeDescriptor, TypeRef};

/// Structured lookup failure. Always names what was searched and where; a
/// registry must never surface a generic failure through this contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The dotted type path is not known to the registry.
    #[error("type not found: {path}")]
    TypeNotFound { path: String },

    /// A path segment matched neither a field nor a zero-argument method.
    #[error("field not found: {field} in type {ty}")]
    FieldNotFound { field: String, ty: String },
}

/// Workspace context for one registry call: the root the registry indexes
/// plus an overlay of unsaved editor content (normalized URI to text) that
/// must shadow on-disk files during resolution.
#[derive(Debug, Clone, Copy)]
pub struct WorkspaceSnapshot<'a> {
    pub root: &'a Path,
    pub overlay: &'a FxHashMap<String, Arc<str>>,
}

/// Outcome of resolving a dotted path: the final segment was a field, or a
/// zero-argument method used as one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Field(FieldDescriptor),
    Method(MethodDescriptor),
}

impl Resolved {
    /// The type the resolved member produces.
    pub fn type_ref(&self) -> Option<&TypeRef> {
        match self {
            Resolved::Field(f) => Some(&f.ty),
            Resolved::Method(m) => m.results.first(),
        }
    }

    /// Member name.
    pub fn name(&self) -> &str {
        match self {
            Resolved::Field(f) => &f.name,
            Resolved::Method(m) => &m.name,
        }
    }
}

/// The external type resolver.
pub trait TypeRegistry: Send + Sync {
    /// Resolve a dotted type path to its structural descriptor.
    fn validate_type(
        &self,
        snap: WorkspaceSnapshot<'_>,
        type_path: &str,
    ) -> Result<Arc<TypeDescriptor>, LookupError>;

    /// Built-in and global functions usable without a receiver.
    fn root_methods(&self) -> &FxHashMap<String, MethodDescriptor>;

    /// Walk a dotted path (`Address.Street`) through a descriptor.
    ///
    /// Each segment is looked up as a field first, descending through
    /// pointer/slice/map element types and resolving named refs through
    /// [`TypeRegistry::validate_type`]. A segment with no matching field
    /// falls back to a zero-parameter method. The error names the missing
    /// segment and the type it was searched against.
    fn validate_field(
        &self,
        snap: WorkspaceSnapshot<'_>,
        desc: &TypeDescriptor,
        dotted_path: &str,
    ) -> Result<Resolved, LookupError> {
        let mut current: Arc<TypeDescriptor> = Arc::new(desc.clone());
        let segments: Vec<&str> = dotted_path.split('.').collect();

        for (i, segment) in segments.iter().enumerate() {
            let last = i + 1 == segments.len();

            let member = if let Some(field) = current.field(segment) {
                Resolved::Field(field.clone())
            } else if let Some(method) = current.method(segment).filter(|m| m.params.is_empty()) {
                Resolved::Method(method.clone())
            } else {
                return Err(LookupError::FieldNotFound {
                    field: (*segment).to_owned(),
                    ty: current.path.clone(),
                });
            };

            if last {
                return Ok(member);
            }

            // Descend: the next segment is resolved against this member's
            // base type, which must be a named type with its own shape.
            let ty = member.type_ref().cloned();
            let Some(path) = ty.as_ref().and_then(TypeRef::named_path) else {
                return Err(LookupError::FieldNotFound {
                    field: segments[i + 1].to_owned(),
                    ty: ty.map_or_else(|| current.path.clone(), |t| t.to_string()),
                });
            };
            current = self.validate_type(snap, path)?;
        }

        // Unreachable for non-empty paths; an empty path has no segments.
        Err(LookupError::FieldNotFound {
            field: String::new(),
            ty: desc.path.clone(),
        })
    }
}
