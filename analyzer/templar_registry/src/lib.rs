//! Type registry contract for the Templar analyzer.
//!
//! The analysis engine consumes structural type information through the
//! [`TypeRegistry`] trait: resolve a dotted type path to a
//! [`TypeDescriptor`], walk a dotted field chain through it, and enumerate
//! root-level functions. The production implementation — the host-language
//! analyzer that indexes workspace declarations — lives outside this
//! repository; [`StaticRegistry`] is the in-memory implementation used by
//! tests and as the tool's manifest-backed fallback.

mod descriptor;
mod registry;
mod static_registry;

pub use descriptor::{FieldDescriptor, MethodDescriptor, TypeDescriptor, TypeRef};
pub use registry::{LookupError, Resolved, TypeRegistry, WorkspaceSnapshot};
pub use static_registry::{StaticRegistry, MANIFEST_NAME};
