//! In-memory registry.
//!
//! Serves two roles: the test double for the analysis engine, and the
//! tool's fallback registry, loaded from a `templar.types.json` manifest at
//! the workspace root when no host-language analyzer is wired in.

use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{
    LookupError, MethodDescriptor, TypeDescriptor, TypeRef, TypeRegistry, WorkspaceSnapshot,
};

/// Manifest file name looked up under the workspace root.
pub const MANIFEST_NAME: &str = "templar.types.json";

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default)]
    types: Vec<TypeDescriptor>,
    #[serde(default)]
    functions: Vec<MethodDescriptor>,
}

/// Registry backed by a fixed set of descriptors.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    types: FxHashMap<String, Arc<TypeDescriptor>>,
    functions: FxHashMap<String, MethodDescriptor>,
}

impl StaticRegistry {
    /// Empty registry with only the built-in template functions.
    pub fn new() -> Self {
        let mut registry = StaticRegistry::default();
        for builtin in builtins() {
            registry.functions.insert(builtin.name.clone(), builtin);
        }
        registry
    }

    /// Register a type descriptor under its own path.
    pub fn insert(&mut self, desc: TypeDescriptor) {
        self.types.insert(desc.path.clone(), Arc::new(desc));
    }

    /// Register a root-level function.
    pub fn insert_function(&mut self, method: MethodDescriptor) {
        self.functions.insert(method.name.clone(), method);
    }

    /// Parse a JSON manifest into a registry (built-ins included).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let manifest: Manifest = serde_json::from_str(json)?;
        let mut registry = StaticRegistry::new();
        for desc in manifest.types {
            registry.insert(desc);
        }
        for function in manifest.functions {
            registry.insert_function(function);
        }
        Ok(registry)
    }

    /// Load the manifest from a workspace root. A missing or unreadable
    /// manifest degrades to the built-ins-only registry; a malformed one is
    /// logged and degrades the same way.
    pub fn load(root: &Path) -> Self {
        let path = root.join(MANIFEST_NAME);
        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(registry) => {
                    tracing::info!(manifest = %path.display(), types = registry.types.len(), "loaded type manifest");
                    registry
                }
                Err(e) => {
                    tracing::warn!(manifest = %path.display(), error = %e, "malformed type manifest, using built-ins only");
                    StaticRegistry::new()
                }
            },
            Err(_) => StaticRegistry::new(),
        }
    }
}

impl TypeRegistry for StaticRegistry {
    fn validate_type(
        &self,
        _snap: WorkspaceSnapshot<'_>,
        type_path: &str,
    ) -> Result<Arc<TypeDescriptor>, LookupError> {
        self.types
            .get(type_path)
            .cloned()
            .ok_or_else(|| LookupError::TypeNotFound {
                path: type_path.to_owned(),
            })
    }

    fn root_methods(&self) -> &FxHashMap<String, MethodDescriptor> {
        &self.functions
    }
}

/// The template language's built-in global functions.
fn builtins() -> Vec<MethodDescriptor> {
    let any = |name: &str| MethodDescriptor {
        name: name.to_owned(),
        params: vec![],
        results: vec![TypeRef::primitive("any")],
    };
    let pred = |name: &str| MethodDescriptor {
        name: name.to_owned(),
        params: vec![TypeRef::primitive("any"), TypeRef::primitive("any")],
        results: vec![TypeRef::primitive("bool")],
    };

    let mut out = vec![
        MethodDescriptor {
            name: "len".to_owned(),
            params: vec![TypeRef::primitive("any")],
            results: vec![TypeRef::primitive("int")],
        },
        MethodDescriptor {
            name: "printf".to_owned(),
            params: vec![TypeRef::primitive("string")],
            results: vec![TypeRef::primitive("string")],
        },
        MethodDescriptor {
            name: "not".to_owned(),
            params: vec![TypeRef::primitive("any")],
            results: vec![TypeRef::primitive("bool")],
        },
    ];
    for name in ["and", "or", "index", "slice", "call", "print", "println"] {
        out.push(any(name));
    }
    for name in ["eq", "ne", "lt", "le", "gt", "ge"] {
        out.push(pred(name));
    }
    for name in ["html", "js", "urlquery"] {
        out.push(MethodDescriptor {
            name: name.to_owned(),
            params: vec![TypeRef::primitive("any")],
            results: vec![TypeRef::primitive("string")],
        });
    }
    out
}
