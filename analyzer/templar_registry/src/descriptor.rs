//! Structural type descriptors.
//!
//! These describe the declared shape of a host-language type: field names
//! with their types, method names with parameter and result types. They are
//! owned by the registry; the analysis engine only reads them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference to a type as it appears in a field or method signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum TypeRef {
    /// A built-in scalar: `string`, `int`, `bool`, ...
    Primitive { name: String },
    /// A named type resolvable through the registry by its dotted path.
    Named { path: String },
    /// Pointer to an element type.
    Pointer { elem: Box<TypeRef> },
    /// Slice or array of an element type.
    Slice { elem: Box<TypeRef> },
    /// Map from key type to value type.
    Map { key: Box<TypeRef>, value: Box<TypeRef> },
}

impl TypeRef {
    /// Shorthand for a primitive ref.
    pub fn primitive(name: &str) -> Self {
        TypeRef::Primitive {
            name: name.to_owned(),
        }
    }

    /// Shorthand for a named ref.
    pub fn named(path: &str) -> Self {
        TypeRef::Named {
            path: path.to_owned(),
        }
    }

    /// Strip pointer/slice/map wrappers down to the element type a dotted
    /// path descends into. Map access descends into the value type.
    pub fn base(&self) -> &TypeRef {
        match self {
            TypeRef::Pointer { elem } | TypeRef::Slice { elem } => elem.base(),
            TypeRef::Map { value, .. } => value.base(),
            _ => self,
        }
    }

    /// The dotted path when the base of this ref is a named type.
    pub fn named_path(&self) -> Option<&str> {
        match self.base() {
            TypeRef::Named { path } => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive { name } => write!(f, "{name}"),
            TypeRef::Named { path } => {
                // Display the short name; the full path stays in the data.
                let short = path.rsplit('/').next().unwrap_or(path);
                write!(f, "{short}")
            }
            TypeRef::Pointer { elem } => write!(f, "*{elem}"),
            TypeRef::Slice { elem } => write!(f, "[]{elem}"),
            TypeRef::Map { key, value } => write!(f, "map[{key}]{value}"),
        }
    }
}

/// A named field of a structural type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

/// A method of a structural type, or a root-level function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    #[serde(default)]
    pub params: Vec<TypeRef>,
    #[serde(default)]
    pub results: Vec<TypeRef>,
}

impl MethodDescriptor {
    /// Render a `func name(params) results` signature.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
        let mut sig = format!("func {}({})", self.name, params.join(", "));
        match self.results.len() {
            0 => {}
            1 => {
                sig.push(' ');
                sig.push_str(&self.results[0].to_string());
            }
            _ => {
                let results: Vec<String> = self.results.iter().map(ToString::to_string).collect();
                sig.push_str(&format!(" ({})", results.join(", ")));
            }
        }
        sig
    }
}

/// Structural shape of one resolved host-language type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Dotted path the type resolves under, e.g. `example.com/pkg.Person`.
    pub path: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
}

impl TypeDescriptor {
    /// Short name without the package path.
    pub fn short_name(&self) -> &str {
        let tail = self.path.rsplit('/').next().unwrap_or(&self.path);
        tail.rsplit('.').next().unwrap_or(tail)
    }

    /// Field lookup by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Method lookup by name.
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Render the full structural definition, struct-style.
    pub fn render(&self) -> String {
        let mut out = format!("type {} struct {{\n", self.short_name());
        for field in &self.fields {
            out.push_str(&format!("\t{} {}\n", field.name, field.ty));
        }
        for method in &self.methods {
            out.push_str(&format!("\t{}\n", method.signature()));
        }
        out.push('}');
        out
    }
}
