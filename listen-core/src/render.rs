//! Rendering artifact trees to Rust.
//!
//! [`RustRenderer`] turns a [`SourceArtifact`] into a `proc_macro2`
//! token stream, which the attribute macro splices into the user's module,
//! or into source text for build scripts. Names and types from the tree are
//! parsed with `syn`, so anything that is not valid Rust surfaces as an
//! error here instead of as broken generated code.

use crate::artifact::{
    EnumDef, Expr, FnDef, GenericParam, ImplDef, Item, ModuleDef, SourceArtifact, Stmt,
    StructDef, TraitDef, Visibility,
};
use crate::descriptor::TypeRef;
use crate::error::{ListenError, Result};
use proc_macro2::{Ident, Literal, TokenStream};
use quote::quote;

pub trait Renderer {
    fn render_tokens(&self, artifact: &SourceArtifact) -> Result<TokenStream>;

    /// Source text for one artifact, starting with a generated-file header.
    fn render_source(&self, artifact: &SourceArtifact) -> Result<String> {
        let tokens = self.render_tokens(artifact)?;
        Ok(format!(
            "// @generated by listen from `{}` ({}). Do not edit.\n{}\n",
            artifact.interface, artifact.kind, tokens
        ))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RustRenderer;

impl RustRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for RustRenderer {
    fn render_tokens(&self, artifact: &SourceArtifact) -> Result<TokenStream> {
        let items = artifact
            .items
            .iter()
            .map(item)
            .collect::<Result<Vec<_>>>()?;
        Ok(quote! { #(#items)* })
    }
}

fn item(item: &Item) -> Result<TokenStream> {
    match item {
        Item::Struct(def) => struct_def(def),
        Item::Enum(def) => enum_def(def),
        Item::Trait(def) => trait_def(def),
        Item::Impl(def) => impl_def(def),
        Item::Module(def) => module_def(def),
    }
}

fn struct_def(def: &StructDef) -> Result<TokenStream> {
    let fields = def
        .fields
        .iter()
        .map(|f| {
            let vis = vis(&f.vis)?;
            let name = ident(&f.name)?;
            let ty = ty(&f.ty)?;
            Ok(quote! { #vis #name: #ty })
        })
        .collect::<Result<Vec<_>>>()?;
    let doc = doc(def.doc.as_deref());
    let derives = derives(&def.derives)?;
    let vis = vis(&def.vis)?;
    let name = ident(&def.name)?;

    Ok(quote! {
        #doc
        #derives
        #vis struct #name {
            #(#fields,)*
        }
    })
}

fn enum_def(def: &EnumDef) -> Result<TokenStream> {
    let doc = doc(def.doc.as_deref());
    let derives = derives(&def.derives)?;
    let vis = vis(&def.vis)?;
    let name = ident(&def.name)?;
    let variants = def
        .variants
        .iter()
        .map(|v| {
            let name = ident(&v.name)?;
            let payload = ty(&v.payload)?;
            Ok(quote! { #name(#payload) })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(quote! {
        #doc
        #derives
        #vis enum #name {
            #(#variants,)*
        }
    })
}

fn trait_def(def: &TraitDef) -> Result<TokenStream> {
    let doc = doc(def.doc.as_deref());
    let vis = vis(&def.vis)?;
    let name = ident(&def.name)?;
    let supertraits = def
        .supertraits
        .iter()
        .map(|s| path(s))
        .collect::<Result<Vec<_>>>()?;
    let bounds = if supertraits.is_empty() {
        quote! {}
    } else {
        quote! { : #(#supertraits)+* }
    };
    let methods = def.methods.iter().map(fn_def).collect::<Result<Vec<_>>>()?;

    Ok(quote! {
        #doc
        #vis trait #name #bounds {
            #(#methods)*
        }
    })
}

fn impl_def(def: &ImplDef) -> Result<TokenStream> {
    let generic = def.generic.as_ref().map(generic_param).transpose()?;
    let generics = match generic {
        Some(param) => quote! { <#param> },
        None => quote! {},
    };
    let self_ty = ty(&def.self_ty)?;
    let methods = def.methods.iter().map(fn_def).collect::<Result<Vec<_>>>()?;

    match &def.trait_path {
        Some(trait_path) => {
            let trait_path = path(trait_path)?;
            Ok(quote! {
                impl #generics #trait_path for #self_ty {
                    #(#methods)*
                }
            })
        }
        None => Ok(quote! {
            impl #generics #self_ty {
                #(#methods)*
            }
        }),
    }
}

fn module_def(def: &ModuleDef) -> Result<TokenStream> {
    let doc = doc(def.doc.as_deref());
    let vis = vis(&def.vis)?;
    let name = ident(&def.name)?;
    let imports = def
        .glob_imports
        .iter()
        .map(|p| {
            let p = path(p)?;
            Ok(quote! {
                #[allow(unused_imports)]
                use #p::*;
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let items = def.items.iter().map(item).collect::<Result<Vec<_>>>()?;

    Ok(quote! {
        #doc
        #vis mod #name {
            #(#imports)*
            #(#items)*
        }
    })
}

fn generic_param(param: &GenericParam) -> Result<TokenStream> {
    let name = ident(&param.name)?;
    let bounds = param
        .bounds
        .iter()
        .map(|b| path(b))
        .collect::<Result<Vec<_>>>()?;
    let unsized_bound = if param.maybe_unsized {
        quote! { + ?Sized }
    } else {
        quote! {}
    };
    Ok(quote! { #name: #(#bounds)+* #unsized_bound })
}

fn fn_def(def: &FnDef) -> Result<TokenStream> {
    let doc = doc(def.doc.as_deref());
    let vis = vis(&def.vis)?;
    let name = ident(&def.name)?;
    let receiver = if def.has_self {
        if def.params.is_empty() {
            quote! { &self }
        } else {
            quote! { &self, }
        }
    } else {
        quote! {}
    };
    let params = def
        .params
        .iter()
        .map(|p| {
            let name = ident(&p.name)?;
            let ty = ty(&p.ty)?;
            Ok(quote! { #name: #ty })
        })
        .collect::<Result<Vec<_>>>()?;
    let ret = match &def.ret {
        Some(ret) => {
            let ret = ty(ret)?;
            quote! { -> #ret }
        }
        None => quote! {},
    };
    let signature = quote! { fn #name(#receiver #(#params),*) #ret };

    match &def.body {
        Some(body) => {
            let body = block(body)?;
            Ok(quote! {
                #doc
                #vis #signature { #body }
            })
        }
        None => Ok(quote! {
            #doc
            #signature;
        }),
    }
}

fn block(stmts: &[Stmt]) -> Result<TokenStream> {
    let stmts = stmts.iter().map(stmt).collect::<Result<Vec<_>>>()?;
    Ok(quote! { #(#stmts)* })
}

fn stmt(stmt: &Stmt) -> Result<TokenStream> {
    Ok(match stmt {
        Stmt::Let {
            name,
            mutable,
            value,
        } => {
            let name = ident(name)?;
            let value = expr(value)?;
            if *mutable {
                quote! { let mut #name = #value; }
            } else {
                quote! { let #name = #value; }
            }
        }
        Stmt::Expr(e) => {
            let e = expr(e)?;
            quote! { #e; }
        }
        Stmt::Tail(e) => expr(e)?,
        Stmt::WhileLet {
            binding,
            value,
            body,
        } => {
            let binding = ident(binding)?;
            let value = expr(value)?;
            let body = block(body)?;
            quote! {
                while let ::core::option::Option::Some(#binding) = #value {
                    #body
                }
            }
        }
        Stmt::IfLet {
            binding,
            value,
            then,
        } => {
            let binding = ident(binding)?;
            let value = expr(value)?;
            let then = block(then)?;
            quote! {
                if let ::core::option::Option::Some(#binding) = #value {
                    #then
                }
            }
        }
        Stmt::AddAssign { target, value } => {
            let target = ident(target)?;
            let value = expr(value)?;
            quote! { #target += #value; }
        }
        Stmt::Return(e) => {
            let e = expr(e)?;
            quote! { return #e; }
        }
    })
}

fn expr(e: &Expr) -> Result<TokenStream> {
    Ok(match e {
        Expr::Ident(name) if name == "self" => quote! { self },
        Expr::Ident(name) => {
            let name = ident(name)?;
            quote! { #name }
        }
        Expr::Path(p) => {
            let p = path(p)?;
            quote! { #p }
        }
        Expr::Int(value) => {
            let lit = Literal::u64_unsuffixed(*value);
            quote! { #lit }
        }
        Expr::Bool(true) => quote! { true },
        Expr::Bool(false) => quote! { false },
        Expr::SelfField(field) => {
            let field = ident(field)?;
            quote! { self.#field }
        }
        Expr::Call { func, args } => {
            let func = path(func)?;
            let args = exprs(args)?;
            quote! { #func(#(#args),*) }
        }
        Expr::MethodCall {
            receiver,
            method,
            args,
        } => {
            let receiver = expr(receiver)?;
            let method = ident(method)?;
            let args = exprs(args)?;
            quote! { #receiver.#method(#(#args),*) }
        }
        Expr::Ref(inner) => {
            let inner = expr(inner)?;
            quote! { &#inner }
        }
        Expr::Deref(inner) => {
            let inner = expr(inner)?;
            quote! { *#inner }
        }
        Expr::Not(inner) => {
            let inner = expr(inner)?;
            quote! { !#inner }
        }
        Expr::Ne(lhs, rhs) => {
            let lhs = expr(lhs)?;
            let rhs = expr(rhs)?;
            quote! { #lhs != #rhs }
        }
        Expr::StructLit { path: p, fields } => {
            let p = path(p)?;
            let fields = fields
                .iter()
                .map(|(name, value)| {
                    let field = ident(name)?;
                    match value {
                        Expr::Ident(v) if v == name => Ok(quote! { #field }),
                        _ => {
                            let value = expr(value)?;
                            Ok(quote! { #field: #value })
                        }
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            quote! { #p { #(#fields),* } }
        }
        Expr::Closure { params, body } => {
            let params = params
                .iter()
                .map(|p| ident(p))
                .collect::<Result<Vec<_>>>()?;
            let body = expr(body)?;
            quote! { |#(#params),*| #body }
        }
    })
}

fn exprs(args: &[Expr]) -> Result<Vec<TokenStream>> {
    args.iter().map(expr).collect()
}

fn doc(text: Option<&str>) -> TokenStream {
    match text {
        Some(text) => {
            let lines = text.lines().map(|line| format!(" {}", line));
            quote! { #(#[doc = #lines])* }
        }
        None => quote! {},
    }
}

fn derives(derives: &[String]) -> Result<TokenStream> {
    if derives.is_empty() {
        return Ok(quote! {});
    }
    let paths = derives
        .iter()
        .map(|d| path(d))
        .collect::<Result<Vec<_>>>()?;
    Ok(quote! { #[derive(#(#paths),*)] })
}

fn vis(vis: &Visibility) -> Result<TokenStream> {
    Ok(match vis {
        Visibility::Public => quote! { pub },
        Visibility::Crate => quote! { pub(crate) },
        Visibility::Private => quote! {},
        Visibility::Restricted(scope) => {
            let parsed: syn::Visibility = syn::parse_str(&format!("pub({})", scope))
                .map_err(|e| ListenError::InvalidType {
                    ty: format!("pub({})", scope),
                    reason: e.to_string(),
                })?;
            quote! { #parsed }
        }
    })
}

fn ident(name: &str) -> Result<Ident> {
    syn::parse_str::<Ident>(name).map_err(|_| ListenError::InvalidIdentifier {
        name: name.to_string(),
    })
}

fn path(p: &str) -> Result<syn::Path> {
    syn::parse_str::<syn::Path>(p).map_err(|e| ListenError::InvalidType {
        ty: p.to_string(),
        reason: e.to_string(),
    })
}

fn ty(t: &TypeRef) -> Result<syn::Type> {
    syn::parse_str::<syn::Type>(t.as_str()).map_err(|e| ListenError::InvalidType {
        ty: t.to_string(),
        reason: e.to_string(),
    })
}
