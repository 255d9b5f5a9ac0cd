//! Interface descriptors.
//!
//! The explicit, immutable description of listener interfaces that every
//! later stage works from. A descriptor graph is built once per generation
//! pass (by the syn frontend or by hand) and never queried against a live
//! type environment afterwards.

use crate::artifact::Visibility;
use crate::error::{ListenError, Result};
use std::collections::HashMap;
use std::fmt;

/// A type as written in source, e.g. `i32` or `&str`.
///
/// Type identity is textual; the syn frontend normalizes spacing by
/// re-printing the parsed tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef(String);

impl TypeRef {
    pub fn new(ty: impl Into<String>) -> Self {
        Self(ty.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeRef {
    fn from(ty: &str) -> Self {
        Self::new(ty)
    }
}

impl From<String> for TypeRef {
    fn from(ty: String) -> Self {
        Self(ty)
    }
}

/// Declared result of a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReturnKind {
    /// No value (`()` or no return type).
    Unit,
    /// Any other declared type.
    Value(TypeRef),
}

impl ReturnKind {
    pub fn is_unit(&self) -> bool {
        matches!(self, ReturnKind::Unit)
    }
}

/// A single method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterDescriptor {
    pub ty: TypeRef,
    pub ident: String,
    /// Replaces `ident` in all emitted code when present.
    pub name_override: Option<String>,
}

impl ParameterDescriptor {
    pub fn new(ident: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            ty: ty.into(),
            ident: ident.into(),
            name_override: None,
        }
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name_override = Some(name.into());
        self
    }
}

/// Identity of a method for de-duplication: name plus ordered parameter types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureKey {
    pub name: String,
    pub params: Vec<TypeRef>,
}

impl fmt::Display for SignatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, ty) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", ty)?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub params: Vec<ParameterDescriptor>,
    pub returns: ReturnKind,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: ReturnKind::Unit,
        }
    }

    pub fn param(mut self, param: ParameterDescriptor) -> Self {
        self.params.push(param);
        self
    }

    pub fn returning(mut self, ty: impl Into<TypeRef>) -> Self {
        self.returns = ReturnKind::Value(ty.into());
        self
    }

    pub fn key(&self) -> SignatureKey {
        SignatureKey {
            name: self.name.clone(),
            params: self.params.iter().map(|p| p.ty.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    /// Qualified name as a Rust path, e.g. `ClickListener` or `ui::ClickListener`.
    pub name: String,
    pub methods: Vec<MethodSignature>,
    /// Names of directly extended interfaces, in declaration order.
    pub extends: Vec<String>,
    /// Visibility given to generated items.
    pub vis: Visibility,
}

impl InterfaceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
            extends: Vec::new(),
            vis: Visibility::Public,
        }
    }

    pub fn visibility(mut self, vis: Visibility) -> Self {
        self.vis = vis;
        self
    }

    pub fn method(mut self, method: MethodSignature) -> Self {
        self.methods.push(method);
        self
    }

    pub fn extends(mut self, name: impl Into<String>) -> Self {
        self.extends.push(name.into());
        self
    }

    /// Last path segment of the qualified name.
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }
}

/// Last segment of a `::` path.
pub fn simple_name(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path).trim()
}

/// All interfaces known to one generation pass, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct InterfaceGraph {
    interfaces: Vec<InterfaceDescriptor>,
    index: HashMap<String, usize>,
}

impl InterfaceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor. Names must be unique within a graph.
    pub fn insert(&mut self, interface: InterfaceDescriptor) -> Result<()> {
        if self.index.contains_key(&interface.name) {
            return Err(ListenError::DuplicateInterface {
                name: interface.name,
            });
        }
        self.index
            .insert(interface.name.clone(), self.interfaces.len());
        self.interfaces.push(interface);
        Ok(())
    }

    pub fn with(mut self, interface: InterfaceDescriptor) -> Result<Self> {
        self.insert(interface)?;
        Ok(self)
    }

    /// Look up by qualified name, falling back to the simple name.
    pub fn get(&self, name: &str) -> Option<&InterfaceDescriptor> {
        self.index
            .get(name)
            .or_else(|| self.index.get(simple_name(name)))
            .map(|&i| &self.interfaces[i])
    }

    pub fn require(&self, name: &str) -> Result<&InterfaceDescriptor> {
        self.get(name).ok_or_else(|| ListenError::UnresolvedInterface {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InterfaceDescriptor> {
        self.interfaces.iter()
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}
