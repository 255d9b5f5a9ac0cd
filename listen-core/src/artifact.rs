//! Artifact tree.
//!
//! Emitters describe generated code as plain data: items, fields, methods and
//! statements. Nothing here knows about token syntax; turning a tree into
//! source is the job of a [`Renderer`](crate::render::Renderer).

use crate::descriptor::TypeRef;
use std::fmt;

/// What a generated unit is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// The multicast dispatcher struct and its impls.
    Dispatcher,
    /// The events module: records plus the closed `Event` enum.
    Events,
    /// The base trait routing every call to the sink method.
    Base,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArtifactKind::Dispatcher => "dispatcher",
            ArtifactKind::Events => "events",
            ArtifactKind::Base => "base",
        })
    }
}

/// One generated unit, emitted next to its source interface.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceArtifact {
    pub name: String,
    pub kind: ArtifactKind,
    /// Interface the artifact was generated from.
    pub interface: String,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Crate,
    Private,
    /// `pub(in path)` or `pub(super)`, holding the text inside the parens.
    Restricted(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Struct(StructDef),
    Enum(EnumDef),
    Trait(TraitDef),
    Impl(ImplDef),
    Module(ModuleDef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub vis: Visibility,
    pub doc: Option<String>,
    pub derives: Vec<String>,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeRef,
    pub vis: Visibility,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub name: String,
    pub vis: Visibility,
    pub doc: Option<String>,
    pub derives: Vec<String>,
    pub variants: Vec<VariantDef>,
}

/// A tuple variant with a single payload.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantDef {
    pub name: String,
    pub payload: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraitDef {
    pub name: String,
    pub vis: Visibility,
    pub doc: Option<String>,
    pub supertraits: Vec<String>,
    pub methods: Vec<FnDef>,
}

/// `impl<T: Bound + ?Sized>` style generic parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericParam {
    pub name: String,
    pub bounds: Vec<String>,
    pub maybe_unsized: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImplDef {
    pub generic: Option<GenericParam>,
    /// Trait path for trait impls, `None` for inherent impls.
    pub trait_path: Option<String>,
    pub self_ty: TypeRef,
    pub methods: Vec<FnDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDef {
    pub name: String,
    pub vis: Visibility,
    pub doc: Option<String>,
    /// Glob imports at the top of the module, e.g. `super`.
    pub glob_imports: Vec<String>,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnDef {
    pub name: String,
    pub vis: Visibility,
    pub doc: Option<String>,
    /// Takes `&self`.
    pub has_self: bool,
    pub params: Vec<ParamDef>,
    pub ret: Option<TypeRef>,
    /// `None` declares the method without a body.
    pub body: Option<Vec<Stmt>>,
}

impl FnDef {
    pub fn method(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vis: Visibility::Private,
            doc: None,
            has_self: true,
            params: Vec::new(),
            ret: None,
            body: Some(Vec::new()),
        }
    }

    pub fn associated(name: impl Into<String>) -> Self {
        Self {
            has_self: false,
            ..Self::method(name)
        }
    }

    pub fn public(mut self) -> Self {
        self.vis = Visibility::Public;
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        self.params.push(ParamDef {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    pub fn returns(mut self, ty: impl Into<TypeRef>) -> Self {
        self.ret = Some(ty.into());
        self
    }

    pub fn body(mut self, body: Vec<Stmt>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let {
        name: String,
        mutable: bool,
        value: Expr,
    },
    /// Expression followed by `;`.
    Expr(Expr),
    /// Trailing expression, the block's value.
    Tail(Expr),
    WhileLet {
        binding: String,
        value: Expr,
        body: Vec<Stmt>,
    },
    IfLet {
        binding: String,
        value: Expr,
        then: Vec<Stmt>,
    },
    AddAssign {
        target: String,
        value: Expr,
    },
    Return(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A local, parameter or `self`.
    Ident(String),
    Path(String),
    Int(u64),
    Bool(bool),
    /// `self.<field>`
    SelfField(String),
    Call {
        func: String,
        args: Vec<Expr>,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    Ref(Box<Expr>),
    Deref(Box<Expr>),
    Not(Box<Expr>),
    Ne(Box<Expr>, Box<Expr>),
    /// `Path { field: value, .. }`
    StructLit {
        path: String,
        fields: Vec<(String, Expr)>,
    },
    Closure {
        params: Vec<String>,
        body: Box<Expr>,
    },
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn path(path: impl Into<String>) -> Self {
        Expr::Path(path.into())
    }

    pub fn call(func: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            func: func.into(),
            args,
        }
    }

    pub fn method(self, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::MethodCall {
            receiver: Box::new(self),
            method: method.into(),
            args,
        }
    }

    pub fn by_ref(self) -> Self {
        Expr::Ref(Box::new(self))
    }

    pub fn deref(self) -> Self {
        Expr::Deref(Box::new(self))
    }
}
