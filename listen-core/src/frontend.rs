//! Syn frontend.
//!
//! Builds the descriptor graph and directive list from parsed Rust items.
//! Traits become interfaces, supertrait bounds become extended interfaces,
//! and three helper attributes drive generation:
//!
//! ```ignore
//! #[listener]
//! #[event_listener(events = "ClickEvents", base = "ClickAdapter")]
//! pub trait ClickListener: Lifecycle {
//!     fn on_click(&self, x: i32, #[param_name("label")] l: String);
//! }
//! ```
//!
//! Only traits reachable from a directive are turned into descriptors; other
//! traits in scope are left alone.

use crate::artifact::Visibility;
use crate::descriptor::{
    InterfaceDescriptor, InterfaceGraph, MethodSignature, ParameterDescriptor, ReturnKind, TypeRef,
};
use crate::directive::{Directive, DirectiveKind, Target};
use crate::error::{ListenError, Result};
use quote::ToTokens;
use std::collections::{HashMap, HashSet};
use syn::parse::{Parse, ParseStream};
use syn::{
    Attribute, FnArg, Ident, Item, ItemTrait, LitStr, Pat, ReturnType, Token, TraitItem,
    TraitItemFn, Type, TypeParamBound,
};

pub const LISTENER_ATTR: &str = "listener";
pub const EVENT_LISTENER_ATTR: &str = "event_listener";
pub const PARAM_NAME_ATTR: &str = "param_name";

/// Everything the driver needs from one scanned scope.
#[derive(Debug, Clone, Default)]
pub struct FrontendOutput {
    pub graph: InterfaceGraph,
    pub directives: Vec<Directive>,
}

/// Parse a whole source file and scan its top-level items.
pub fn parse_file(source: &str) -> Result<FrontendOutput> {
    let file = syn::parse_file(source)?;
    scan(&file.items)
}

/// Scan items for directives and build descriptors for every trait they
/// reach.
pub fn scan(items: &[Item]) -> Result<FrontendOutput> {
    let traits: HashMap<String, &ItemTrait> = items
        .iter()
        .filter_map(|item| match item {
            Item::Trait(t) => Some((t.ident.to_string(), t)),
            _ => None,
        })
        .collect();

    let mut directives = Vec::new();
    for item in items {
        for kind in directives_of(item_attrs(item))? {
            directives.push(Directive {
                target: target_of(item),
                kind,
            });
        }
    }

    // Traits reachable from directive targets, in source order.
    let mut reachable = HashSet::new();
    let mut pending: Vec<String> = directives
        .iter()
        .filter_map(|d| match &d.target {
            Target::Interface(name) => Some(name.clone()),
            Target::Other { .. } => None,
        })
        .collect();
    while let Some(name) = pending.pop() {
        if !reachable.insert(name.clone()) {
            continue;
        }
        if let Some(t) = traits.get(&name) {
            pending.extend(supertraits(t)?);
        }
    }

    let mut graph = InterfaceGraph::new();
    for item in items {
        if let Item::Trait(t) = item {
            if reachable.contains(&t.ident.to_string()) {
                graph.insert(describe(t)?)?;
            }
        }
    }

    Ok(FrontendOutput { graph, directives })
}

/// Remove the helper attributes from `items` so they compile unchanged.
pub fn strip_attributes(items: &mut [Item]) {
    for item in items {
        if let Some(attrs) = item_attrs_mut(item) {
            attrs.retain(|a| !is_directive(a));
        }
        if let Item::Trait(t) = item {
            for trait_item in &mut t.items {
                if let TraitItem::Fn(f) = trait_item {
                    for input in &mut f.sig.inputs {
                        if let FnArg::Typed(pt) = input {
                            pt.attrs.retain(|a| !a.path().is_ident(PARAM_NAME_ATTR));
                        }
                    }
                }
            }
        }
    }
}

fn describe(t: &ItemTrait) -> Result<InterfaceDescriptor> {
    let name = t.ident.to_string();
    if !t.generics.params.is_empty() || t.generics.where_clause.is_some() {
        return Err(unsupported(&name, "generic traits cannot be lowered"));
    }

    let mut interface = InterfaceDescriptor::new(name.clone()).visibility(visibility(&t.vis));
    for parent in supertraits(t)? {
        interface = interface.extends(parent);
    }

    for trait_item in &t.items {
        match trait_item {
            TraitItem::Fn(f) => interface = interface.method(method(&name, f)?),
            TraitItem::Type(ty) => {
                return Err(unsupported(
                    &name,
                    &format!("associated type `{}` is not supported", ty.ident),
                ));
            }
            TraitItem::Const(c) => {
                return Err(unsupported(
                    &name,
                    &format!("associated const `{}` is not supported", c.ident),
                ));
            }
            _ => {}
        }
    }
    Ok(interface)
}

fn method(interface: &str, f: &TraitItemFn) -> Result<MethodSignature> {
    let sig = &f.sig;
    let name = sig.ident.to_string();
    let reject = |what: &str| unsupported(interface, &format!("method `{}` {}", name, what));

    if !sig.generics.params.is_empty() || sig.generics.where_clause.is_some() {
        return Err(reject("is generic"));
    }
    if sig.asyncness.is_some() {
        return Err(reject("is async"));
    }
    if sig.unsafety.is_some() || sig.constness.is_some() || sig.variadic.is_some() {
        return Err(reject("must be a plain fn"));
    }

    let mut inputs = sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(r)) if r.reference.is_some() && r.mutability.is_none() => {}
        _ => return Err(reject("must take `&self`")),
    }

    let mut signature = MethodSignature::new(name.clone());
    let mut emitted: HashSet<String> = HashSet::new();
    for input in inputs {
        let FnArg::Typed(pt) = input else {
            return Err(reject("has a second receiver"));
        };
        if matches!(*pt.ty, Type::ImplTrait(_)) {
            return Err(reject("takes an `impl Trait` parameter"));
        }
        let name_override = param_name(&pt.attrs)?;
        let ident = match (&*pt.pat, &name_override) {
            (Pat::Ident(p), _) => p.ident.to_string(),
            (_, Some(rename)) => rename.clone(),
            _ => return Err(reject("has a parameter pattern without a name")),
        };
        let emitted_name = name_override.as_deref().unwrap_or(&ident);
        if !emitted.insert(emitted_name.to_string()) {
            return Err(reject(&format!(
                "has two parameters named `{}`",
                emitted_name
            )));
        }
        signature.params.push(ParameterDescriptor {
            ty: type_ref(&pt.ty),
            ident,
            name_override,
        });
    }

    signature.returns = match &sig.output {
        ReturnType::Default => ReturnKind::Unit,
        ReturnType::Type(_, ty) => match &**ty {
            Type::Tuple(t) if t.elems.is_empty() => ReturnKind::Unit,
            other => ReturnKind::Value(type_ref(other)),
        },
    };
    Ok(signature)
}

fn supertraits(t: &ItemTrait) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for bound in &t.supertraits {
        let TypeParamBound::Trait(tb) = bound else {
            continue;
        };
        if tb.path.segments.iter().any(|s| !s.arguments.is_empty()) {
            return Err(unsupported(
                &t.ident.to_string(),
                &format!("generic supertrait `{}`", tb.path.to_token_stream()),
            ));
        }
        let path = tb
            .path
            .segments
            .iter()
            .map(|s| s.ident.to_string())
            .collect::<Vec<_>>()
            .join("::");
        names.push(if tb.path.leading_colon.is_some() {
            format!("::{}", path)
        } else {
            path
        });
    }
    Ok(names)
}

/// Arguments of `#[event_listener(events = "..", base = "..")]`.
#[derive(Default)]
struct EventListenerArgs {
    events: Option<String>,
    base: Option<String>,
}

impl Parse for EventListenerArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = EventListenerArgs::default();

        while !input.is_empty() {
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let value: LitStr = input.parse()?;

            match key.to_string().as_str() {
                "events" => args.events = Some(value.value()),
                "base" => args.base = Some(value.value()),
                other => {
                    return Err(syn::Error::new(
                        key.span(),
                        format!("unknown event_listener option `{}`", other),
                    ));
                }
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

fn directives_of(attrs: &[Attribute]) -> Result<Vec<DirectiveKind>> {
    let mut kinds = Vec::new();
    for attr in attrs {
        if attr.path().is_ident(LISTENER_ATTR) {
            attr.meta.require_path_only()?;
            kinds.push(DirectiveKind::Dispatcher);
        } else if attr.path().is_ident(EVENT_LISTENER_ATTR) {
            let args = match &attr.meta {
                syn::Meta::Path(_) => EventListenerArgs::default(),
                _ => attr.parse_args::<EventListenerArgs>()?,
            };
            kinds.push(DirectiveKind::Events {
                events_name: args.events,
                base_name: args.base,
            });
        }
    }
    Ok(kinds)
}

fn param_name(attrs: &[Attribute]) -> Result<Option<String>> {
    for attr in attrs {
        if attr.path().is_ident(PARAM_NAME_ATTR) {
            let lit: LitStr = attr.parse_args()?;
            return Ok(Some(lit.value()));
        }
    }
    Ok(None)
}

fn is_directive(attr: &Attribute) -> bool {
    attr.path().is_ident(LISTENER_ATTR) || attr.path().is_ident(EVENT_LISTENER_ATTR)
}

fn target_of(item: &Item) -> Target {
    let other = |name: String, kind: &str| Target::Other {
        name,
        kind: kind.to_string(),
    };
    match item {
        Item::Trait(t) => Target::Interface(t.ident.to_string()),
        Item::Struct(s) => other(s.ident.to_string(), "struct"),
        Item::Enum(e) => other(e.ident.to_string(), "enum"),
        Item::Union(u) => other(u.ident.to_string(), "union"),
        Item::Fn(f) => other(f.sig.ident.to_string(), "fn"),
        Item::Type(t) => other(t.ident.to_string(), "type alias"),
        Item::Mod(m) => other(m.ident.to_string(), "module"),
        Item::TraitAlias(t) => other(t.ident.to_string(), "trait alias"),
        Item::Const(c) => other(c.ident.to_string(), "const"),
        Item::Static(s) => other(s.ident.to_string(), "static"),
        _ => other("<item>".to_string(), "item"),
    }
}

fn item_attrs(item: &Item) -> &[Attribute] {
    match item {
        Item::Trait(i) => &i.attrs,
        Item::Struct(i) => &i.attrs,
        Item::Enum(i) => &i.attrs,
        Item::Union(i) => &i.attrs,
        Item::Fn(i) => &i.attrs,
        Item::Type(i) => &i.attrs,
        Item::Mod(i) => &i.attrs,
        Item::TraitAlias(i) => &i.attrs,
        Item::Const(i) => &i.attrs,
        Item::Static(i) => &i.attrs,
        Item::Impl(i) => &i.attrs,
        _ => &[],
    }
}

fn item_attrs_mut(item: &mut Item) -> Option<&mut Vec<Attribute>> {
    match item {
        Item::Trait(i) => Some(&mut i.attrs),
        Item::Struct(i) => Some(&mut i.attrs),
        Item::Enum(i) => Some(&mut i.attrs),
        Item::Union(i) => Some(&mut i.attrs),
        Item::Fn(i) => Some(&mut i.attrs),
        Item::Type(i) => Some(&mut i.attrs),
        Item::Mod(i) => Some(&mut i.attrs),
        Item::TraitAlias(i) => Some(&mut i.attrs),
        Item::Const(i) => Some(&mut i.attrs),
        Item::Static(i) => Some(&mut i.attrs),
        Item::Impl(i) => Some(&mut i.attrs),
        _ => None,
    }
}

fn visibility(vis: &syn::Visibility) -> Visibility {
    match vis {
        syn::Visibility::Public(_) => Visibility::Public,
        syn::Visibility::Inherited => Visibility::Private,
        syn::Visibility::Restricted(r) => {
            let path = r.path.to_token_stream().to_string().replace(' ', "");
            if r.in_token.is_some() {
                Visibility::Restricted(format!("in {}", path))
            } else if path == "crate" {
                Visibility::Crate
            } else {
                Visibility::Restricted(path)
            }
        }
    }
}

fn type_ref(ty: &Type) -> TypeRef {
    TypeRef::new(ty.to_token_stream().to_string())
}

fn unsupported(interface: &str, reason: &str) -> ListenError {
    ListenError::UnsupportedSignature {
        interface: interface.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
        pub trait Lifecycle {
            fn closed(&self);
        }

        #[listener]
        #[event_listener(events = "ClickEvents", base = "ClickAdapter")]
        pub trait ClickListener: Lifecycle + 'static {
            fn on_click(&self, x: i32, #[param_name("value")] v: String);
        }

        trait Unrelated {
            type Output;
            fn make(&self) -> Self::Output;
        }
    "#;

    #[test]
    fn test_scan_builds_reachable_graph() {
        let out = parse_file(SOURCE).unwrap();

        assert_eq!(out.graph.len(), 2);
        assert!(out.graph.contains("ClickListener"));
        assert!(out.graph.contains("Lifecycle"));
        assert!(!out.graph.contains("Unrelated"));

        let click = out.graph.get("ClickListener").unwrap();
        assert_eq!(click.extends, vec!["Lifecycle"]);
        assert_eq!(click.vis, Visibility::Public);
    }

    #[test]
    fn test_scan_reads_directives() {
        let out = parse_file(SOURCE).unwrap();

        assert_eq!(
            out.directives,
            vec![
                Directive::dispatcher("ClickListener"),
                Directive::events_named("ClickListener", "ClickEvents", "ClickAdapter"),
            ]
        );
    }

    #[test]
    fn test_parameters_and_override() {
        let out = parse_file(SOURCE).unwrap();
        let method = &out.graph.get("ClickListener").unwrap().methods[0];

        assert_eq!(method.name, "on_click");
        assert_eq!(method.params[0].ident, "x");
        assert_eq!(method.params[0].ty.as_str(), "i32");
        assert_eq!(method.params[1].ident, "v");
        assert_eq!(method.params[1].name_override.as_deref(), Some("value"));
        assert!(method.returns.is_unit());
    }

    #[test]
    fn test_return_types() {
        let out = parse_file(
            r#"
            #[listener]
            trait Mixed {
                fn unit(&self) -> ();
                fn count(&self) -> usize;
            }
            "#,
        )
        .unwrap();
        let methods = &out.graph.get("Mixed").unwrap().methods;

        assert!(methods[0].returns.is_unit());
        assert_eq!(methods[1].returns, ReturnKind::Value(TypeRef::new("usize")));
    }

    #[test]
    fn test_directive_on_struct_targets_other() {
        let out = parse_file("#[listener] struct NotATrait;").unwrap();

        assert_eq!(
            out.directives[0].target,
            Target::Other {
                name: "NotATrait".to_string(),
                kind: "struct".to_string()
            }
        );
        assert!(out.graph.is_empty());
    }

    #[test]
    fn test_mut_receiver_is_rejected() {
        let err = parse_file("#[listener] trait Bad { fn m(&mut self); }").unwrap_err();
        assert!(matches!(err, ListenError::UnsupportedSignature { .. }));
    }

    #[test]
    fn test_generic_method_is_rejected() {
        let err = parse_file("#[listener] trait Bad { fn m<T>(&self, t: T); }").unwrap_err();
        assert!(matches!(err, ListenError::UnsupportedSignature { .. }));
    }

    #[test]
    fn test_parameter_renamed_onto_sibling_is_rejected() {
        let err = parse_file(
            r#"#[listener] trait Bad { fn m(&self, #[param_name("x")] y: i32, x: i32); }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ListenError::UnsupportedSignature { .. }));
    }

    #[test]
    fn test_unknown_event_option_is_parse_error() {
        let err = parse_file(r#"#[event_listener(colour = "red")] trait T { }"#).unwrap_err();
        assert!(matches!(err, ListenError::Parse(_)));
    }

    #[test]
    fn test_restricted_visibility() {
        let out = parse_file("#[listener] pub(crate) trait A {} #[listener] pub(super) trait B {}")
            .unwrap();

        assert_eq!(out.graph.get("A").unwrap().vis, Visibility::Crate);
        assert_eq!(
            out.graph.get("B").unwrap().vis,
            Visibility::Restricted("super".to_string())
        );
    }

    #[test]
    fn test_strip_attributes() {
        let mut file = syn::parse_file(SOURCE).unwrap();
        strip_attributes(&mut file.items);
        let text = file.to_token_stream().to_string();

        assert!(!text.contains("listener"));
        assert!(!text.contains("param_name"));
        assert!(text.contains("on_click"));
    }
}
