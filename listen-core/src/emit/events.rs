//! Event taxonomy emission.
//!
//! Produces two artifacts for an interface `I`:
//!
//! - a module holding one record struct per resolved method plus the closed
//!   `Event` enum with a variant per record;
//! - a base trait with a single `on_event` sink, and a blanket impl of `I`
//!   (and every interface it extends) for all implementors of the base trait.
//!   Each call builds its record from the arguments in order and hands it to
//!   `on_event` once.

use super::types::{self, borrows, rescope};
use super::{EmitContext, fresh_local};
use crate::artifact::{
    ArtifactKind, EnumDef, Expr, FieldDef, FnDef, GenericParam, ImplDef, Item, ModuleDef,
    SourceArtifact, Stmt, StructDef, TraitDef, VariantDef, Visibility,
};
use crate::descriptor::{InterfaceDescriptor, TypeRef};
use crate::error::{ListenError, Result};
use crate::naming::{event_type_name, module_name, parameter_name};
use crate::resolver::{ResolvedMethod, ResolvedMethodSet};
use std::collections::{HashMap, HashSet};
use tracing::debug;

const EVENT: &str = "Event";
const SINK: &str = "on_event";

pub fn emit_event_taxonomy(
    ctx: &mut EmitContext<'_>,
    interface: &InterfaceDescriptor,
    methods: &ResolvedMethodSet,
    events_name: &str,
    base_name: &str,
) -> Result<Vec<SourceArtifact>> {
    let module = module_name(events_name);
    let records = record_names(interface, methods)?;
    let shadowed: HashSet<String> = records
        .iter()
        .cloned()
        .chain([EVENT.to_string()])
        .collect();

    let mut module_items = Vec::new();
    let mut variants = Vec::new();
    for (method, record) in methods.iter().zip(&records) {
        module_items.extend(record_items(ctx, interface, method, record, &shadowed)?);
        variants.push(VariantDef {
            name: record.clone(),
            payload: TypeRef::new(record.clone()),
        });
    }
    module_items.push(Item::Enum(EnumDef {
        name: EVENT.to_string(),
        vis: Visibility::Public,
        doc: Some(format!(
            "Every call on [`{}`], one variant per method.",
            interface.name
        )),
        derives: ctx.config().event_derives.clone(),
        variants,
    }));

    let events = SourceArtifact {
        name: events_name.to_string(),
        kind: ArtifactKind::Events,
        interface: interface.name.clone(),
        items: vec![Item::Module(ModuleDef {
            name: module.clone(),
            vis: interface.vis.clone(),
            doc: Some(format!("Events generated from [`{}`].", interface.name)),
            glob_imports: vec!["super".to_string()],
            items: module_items,
        })],
    };

    let event_ty = format!("{}::{}", module, EVENT);
    let mut base_items = vec![Item::Trait(TraitDef {
        name: base_name.to_string(),
        vis: interface.vis.clone(),
        doc: Some(format!(
            "Implements [`{0}`] by turning each call into a [`{1}`] and passing it to \
             [`{2}`](Self::{2}).",
            interface.name, event_ty, SINK
        )),
        supertraits: Vec::new(),
        methods: vec![
            FnDef::method(SINK)
                .param("event", event_ty.as_str())
                .without_body(),
        ],
    })];

    let generic = GenericParam {
        name: generic_name(methods, base_name)?,
        bounds: vec![base_name.to_string()],
        maybe_unsized: true,
    };
    for owner in methods.interfaces() {
        let routed = methods
            .iter()
            .zip(&records)
            .filter(|(m, _)| m.is_owned_by(owner))
            .map(|(m, record)| route(base_name, &module, m, record))
            .collect();
        base_items.push(Item::Impl(ImplDef {
            generic: Some(generic.clone()),
            trait_path: Some(owner.clone()),
            self_ty: TypeRef::new(generic.name.clone()),
            methods: routed,
        }));
    }

    let base = SourceArtifact {
        name: base_name.to_string(),
        kind: ArtifactKind::Base,
        interface: interface.name.clone(),
        items: base_items,
    };

    ctx.claim(&interface.name, &[&module, base_name])?;
    debug!(
        interface = %interface.name,
        events = %module,
        base = %base_name,
        records = records.len(),
        "Emitted event taxonomy"
    );

    Ok(vec![events, base])
}

/// Record name for each resolved method, in order. Two methods mapping to the
/// same record, or a record named like the enum, cannot be emitted.
fn record_names(
    interface: &InterfaceDescriptor,
    methods: &ResolvedMethodSet,
) -> Result<Vec<String>> {
    let mut seen: HashMap<String, String> = HashMap::new();
    let mut names = Vec::with_capacity(methods.len());

    for method in methods.iter() {
        let record = event_type_name(method.name());
        let key = method.signature.key().to_string();
        if record == EVENT {
            return Err(unsupported(
                interface,
                format!("method `{}` maps to the reserved event name `{}`", key, EVENT),
            ));
        }
        if let Some(previous) = seen.insert(record.clone(), key.clone()) {
            return Err(unsupported(
                interface,
                format!(
                    "methods `{}` and `{}` both map to event `{}`",
                    previous, key, record
                ),
            ));
        }
        names.push(record);
    }
    Ok(names)
}

fn record_items(
    ctx: &EmitContext<'_>,
    interface: &InterfaceDescriptor,
    method: &ResolvedMethod,
    record: &str,
    shadowed: &HashSet<String>,
) -> Result<Vec<Item>> {
    let mut fields = Vec::with_capacity(method.signature.params.len());
    for param in &method.signature.params {
        let name = parameter_name(param);
        let ty = types::parse(&param.ty)?;
        if borrows(&ty) {
            return Err(unsupported(
                interface,
                format!(
                    "event records own their fields, but `{}` of `{}` is `{}`",
                    name,
                    method.name(),
                    param.ty
                ),
            ));
        }
        fields.push(FieldDef {
            name: name.to_string(),
            ty: rescope(&ty, shadowed),
            vis: Visibility::Public,
        });
    }

    let mut constructor = FnDef::associated("new")
        .public()
        .returns("Self")
        .body(vec![Stmt::Tail(Expr::StructLit {
            path: "Self".to_string(),
            fields: fields
                .iter()
                .map(|f| (f.name.clone(), Expr::ident(&f.name)))
                .collect(),
        })]);
    for field in &fields {
        constructor = constructor.param(field.name.clone(), field.ty.clone());
    }

    Ok(vec![
        Item::Struct(StructDef {
            name: record.to_string(),
            vis: Visibility::Public,
            doc: Some(format!("Arguments of `{}`.", method.name())),
            derives: ctx.config().event_derives.clone(),
            fields,
        }),
        Item::Impl(ImplDef {
            generic: None,
            trait_path: None,
            self_ty: TypeRef::new(record),
            methods: vec![constructor],
        }),
        Item::Impl(ImplDef {
            generic: None,
            trait_path: Some(format!("::core::convert::From<{}>", record)),
            self_ty: TypeRef::new(EVENT),
            methods: vec![
                FnDef::associated("from")
                    .param("event", record)
                    .returns("Self")
                    .body(vec![Stmt::Tail(Expr::call(
                        format!("Self::{}", record),
                        vec![Expr::ident("event")],
                    ))]),
            ],
        }),
    ])
}

/// `fn m(&self, ..) { Base::on_event(self, module::Event::M(module::M::new(..))); }`
fn route(base_name: &str, module: &str, method: &ResolvedMethod, record: &str) -> FnDef {
    let names: Vec<&str> = method.signature.params.iter().map(parameter_name).collect();
    let event = Expr::call(
        format!("{}::{}::{}", module, EVENT, record),
        vec![Expr::call(
            format!("{}::{}::new", module, record),
            names.iter().map(|n| Expr::ident(*n)).collect(),
        )],
    );

    let mut def = FnDef::method(method.name()).body(vec![Stmt::Expr(Expr::call(
        format!("{}::{}", base_name, SINK),
        vec![Expr::ident("self"), event],
    ))]);
    for param in &method.signature.params {
        def = def.param(parameter_name(param), param.ty.clone());
    }
    def
}

/// Name for the blanket impl's type parameter, clear of every identifier the
/// routed signatures mention.
fn generic_name(methods: &ResolvedMethodSet, base_name: &str) -> Result<String> {
    let mut taken = vec![base_name.to_string()];
    taken.extend(methods.interfaces().iter().map(|owner| owner.to_string()));
    for param in methods.iter().flat_map(|m| &m.signature.params) {
        taken.extend(types::idents(&types::parse(&param.ty)?));
    }
    Ok(fresh_local("T", &taken))
}

fn unsupported(interface: &InterfaceDescriptor, reason: String) -> ListenError {
    ListenError::UnsupportedSignature {
        interface: interface.name.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::descriptor::{InterfaceGraph, MethodSignature, ParameterDescriptor};
    use crate::resolver::resolve;

    fn clicks() -> InterfaceGraph {
        InterfaceGraph::new()
            .with(InterfaceDescriptor::new("Lifecycle").method(MethodSignature::new("closed")))
            .unwrap()
            .with(
                InterfaceDescriptor::new("Clicks")
                    .extends("Lifecycle")
                    .method(
                        MethodSignature::new("onClick")
                            .param(ParameterDescriptor::new("x", "i32"))
                            .param(ParameterDescriptor::new("label", "String")),
                    )
                    .method(
                        MethodSignature::new("on_scroll")
                            .param(ParameterDescriptor::new("v", "f64").renamed("value")),
                    ),
            )
            .unwrap()
    }

    fn emit(graph: &InterfaceGraph, root: &str) -> Result<Vec<SourceArtifact>> {
        let set = resolve(graph, root)?;
        let config = GeneratorConfig::default();
        let mut ctx = EmitContext::new(&config);
        emit_event_taxonomy(
            &mut ctx,
            graph.get(root).unwrap(),
            &set,
            "ClickEvents",
            "ClickAdapter",
        )
    }

    fn module_items(artifact: &SourceArtifact) -> &[Item] {
        match &artifact.items[0] {
            Item::Module(module) => &module.items,
            other => panic!("expected module, got {:?}", other),
        }
    }

    fn record<'a>(artifact: &'a SourceArtifact, name: &str) -> &'a StructDef {
        module_items(artifact)
            .iter()
            .find_map(|item| match item {
                Item::Struct(s) if s.name == name => Some(s),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_emits_events_and_base() {
        let artifacts = emit(&clicks(), "Clicks").unwrap();

        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].kind, ArtifactKind::Events);
        assert_eq!(artifacts[0].name, "ClickEvents");
        assert_eq!(artifacts[1].kind, ArtifactKind::Base);
        assert_eq!(artifacts[1].name, "ClickAdapter");
        match &artifacts[0].items[0] {
            Item::Module(module) => {
                assert_eq!(module.name, "click_events");
                assert_eq!(module.glob_imports, vec!["super"]);
            }
            other => panic!("expected module, got {:?}", other),
        }
    }

    #[test]
    fn test_record_fields_follow_parameter_order() {
        let artifacts = emit(&clicks(), "Clicks").unwrap();
        let on_click = record(&artifacts[0], "OnClick");

        let fields: Vec<(&str, &str)> = on_click
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.ty.as_str()))
            .collect();
        assert_eq!(fields, vec![("x", "i32"), ("label", "String")]);
    }

    #[test]
    fn test_record_field_uses_override() {
        let artifacts = emit(&clicks(), "Clicks").unwrap();
        let on_scroll = record(&artifacts[0], "OnScroll");

        assert_eq!(on_scroll.fields[0].name, "value");
    }

    #[test]
    fn test_event_enum_lists_every_record() {
        let artifacts = emit(&clicks(), "Clicks").unwrap();
        let variants: Vec<&str> = module_items(&artifacts[0])
            .iter()
            .find_map(|item| match item {
                Item::Enum(e) if e.name == EVENT => {
                    Some(e.variants.iter().map(|v| v.name.as_str()).collect())
                }
                _ => None,
            })
            .unwrap();

        assert_eq!(variants, vec!["OnClick", "OnScroll", "Closed"]);
    }

    #[test]
    fn test_base_routes_each_owner() {
        let artifacts = emit(&clicks(), "Clicks").unwrap();
        let impls: Vec<(&str, usize)> = artifacts[1]
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Impl(i) => Some((i.trait_path.as_deref().unwrap(), i.methods.len())),
                _ => None,
            })
            .collect();

        assert_eq!(impls, vec![("Clicks", 2), ("Lifecycle", 1)]);
    }

    #[test]
    fn test_route_constructs_record_positionally() {
        let set = resolve(&clicks(), "Clicks").unwrap();
        let def = route("ClickAdapter", "click_events", &set.methods()[0], "OnClick");

        let expected = Stmt::Expr(Expr::call(
            "ClickAdapter::on_event",
            vec![
                Expr::ident("self"),
                Expr::call(
                    "click_events::Event::OnClick",
                    vec![Expr::call(
                        "click_events::OnClick::new",
                        vec![Expr::ident("x"), Expr::ident("label")],
                    )],
                ),
            ],
        ));
        assert_eq!(def.body.unwrap(), vec![expected]);
    }

    #[test]
    fn test_colliding_record_names_fail() {
        let graph = InterfaceGraph::new()
            .with(
                InterfaceDescriptor::new("Twice")
                    .method(MethodSignature::new("onClick"))
                    .method(MethodSignature::new("on_click")),
            )
            .unwrap();

        assert!(matches!(
            emit(&graph, "Twice"),
            Err(ListenError::UnsupportedSignature { .. })
        ));
    }

    #[test]
    fn test_reference_parameter_fails() {
        let graph = InterfaceGraph::new()
            .with(
                InterfaceDescriptor::new("Borrowing").method(
                    MethodSignature::new("on_text").param(ParameterDescriptor::new("text", "& str")),
                ),
            )
            .unwrap();

        assert!(matches!(
            emit(&graph, "Borrowing"),
            Err(ListenError::UnsupportedSignature { .. })
        ));
    }

    fn single(name: &str, method: MethodSignature) -> InterfaceGraph {
        InterfaceGraph::new()
            .with(InterfaceDescriptor::new(name).method(method))
            .unwrap()
    }

    #[test]
    fn test_nested_reference_parameter_fails() {
        let graph = single(
            "Borrowing",
            MethodSignature::new("on_text").param(ParameterDescriptor::new("text", "Option<&str>")),
        );

        assert!(matches!(
            emit(&graph, "Borrowing"),
            Err(ListenError::UnsupportedSignature { .. })
        ));
    }

    #[test]
    fn test_static_and_callable_parameters_are_owned() {
        let graph = single(
            "Owning",
            MethodSignature::new("on_text")
                .param(ParameterDescriptor::new("text", "& 'static str"))
                .param(ParameterDescriptor::new("format", "Box < dyn Fn(&str) -> String >")),
        );

        assert!(emit(&graph, "Owning").is_ok());
    }

    #[test]
    fn test_record_field_reaches_shadowed_type() {
        let graph = single(
            "Chat",
            MethodSignature::new("message")
                .param(ParameterDescriptor::new("m", "Message"))
                .param(ParameterDescriptor::new("e", "Option<Event>")),
        );
        let artifacts = emit(&graph, "Chat").unwrap();
        let message = record(&artifacts[0], "Message");

        let types: Vec<String> = message
            .fields
            .iter()
            .map(|f| f.ty.as_str().replace(' ', ""))
            .collect();
        assert_eq!(types, vec!["super::Message", "Option<super::Event>"]);
    }

    #[test]
    fn test_blanket_generic_avoids_parameter_types() {
        let graph = single(
            "Generic",
            MethodSignature::new("on_value").param(ParameterDescriptor::new("v", "Vec<T>")),
        );
        let artifacts = emit(&graph, "Generic").unwrap();

        let generics: Vec<(&str, &str)> = artifacts[1]
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Impl(i) => {
                    Some((i.generic.as_ref().unwrap().name.as_str(), i.self_ty.as_str()))
                }
                _ => None,
            })
            .collect();
        assert_eq!(generics, vec![("T_", "T_")]);
    }

    #[test]
    fn test_unparseable_parameter_type_fails() {
        let graph = single(
            "Broken",
            MethodSignature::new("on_value").param(ParameterDescriptor::new("v", "Vec<")),
        );

        assert!(matches!(
            emit(&graph, "Broken"),
            Err(ListenError::InvalidType { .. })
        ));
    }
}
