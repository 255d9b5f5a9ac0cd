//! Multicast dispatcher emission.
//!
//! The generated struct keeps its listeners in a `RefCell<Vec<Rc<dyn I>>>`
//! and implements `I` (and every interface `I` extends) by calling each
//! listener in registration order. Iteration is index based and re-reads the
//! length on every step, so listeners added or removed from inside a
//! callback take effect during the same dispatch. The storage is not
//! synchronized; `Rc` and `RefCell` keep the dispatcher `!Send + !Sync`.

use super::{EmitContext, fresh_local};
use crate::artifact::{
    ArtifactKind, Expr, FieldDef, FnDef, ImplDef, Item, SourceArtifact, Stmt, StructDef,
    Visibility,
};
use crate::config::RemovalPolicy;
use crate::descriptor::{InterfaceDescriptor, TypeRef};
use crate::error::Result;
use crate::naming::{dispatcher_name, parameter_name};
use crate::resolver::{ResolvedMethod, ResolvedMethodSet};
use tracing::debug;

const LISTENERS: &str = "listeners";
const LISTENER_AT: &str = "listener_at";

pub fn emit_dispatcher(
    ctx: &mut EmitContext<'_>,
    interface: &InterfaceDescriptor,
    methods: &ResolvedMethodSet,
) -> Result<SourceArtifact> {
    let name = dispatcher_name(&interface.name);
    let listener_ty = format!("::std::rc::Rc<dyn {}>", interface.name);

    let mut items = vec![
        Item::Struct(StructDef {
            name: name.clone(),
            vis: interface.vis.clone(),
            doc: Some(format!(
                "Forwards every [`{0}`] call to each registered listener, in registration order.\n\n\
                 Not synchronized: the dispatcher is neither `Send` nor `Sync`.",
                interface.name
            )),
            derives: Vec::new(),
            fields: vec![FieldDef {
                name: LISTENERS.to_string(),
                ty: TypeRef::new(format!(
                    "::core::cell::RefCell<::std::vec::Vec<{}>>",
                    listener_ty
                )),
                vis: Visibility::Private,
            }],
        }),
        Item::Impl(ImplDef {
            generic: None,
            trait_path: None,
            self_ty: TypeRef::new(name.clone()),
            methods: vec![
                constructor(),
                add_listener(&listener_ty),
                remove_listener(&listener_ty, ctx.config().removal_policy),
                len(),
                is_empty(),
                listener_at(&listener_ty),
            ],
        }),
        Item::Impl(ImplDef {
            generic: None,
            trait_path: Some("::core::default::Default".to_string()),
            self_ty: TypeRef::new(name.clone()),
            methods: vec![
                FnDef::associated("default")
                    .returns("Self")
                    .body(vec![Stmt::Tail(Expr::call("Self::new", vec![]))]),
            ],
        }),
    ];

    for owner in methods.interfaces() {
        items.push(Item::Impl(ImplDef {
            generic: None,
            trait_path: Some(owner.clone()),
            self_ty: TypeRef::new(name.clone()),
            methods: methods.owned_by(owner).map(|m| forward(owner, m)).collect(),
        }));
    }

    ctx.claim(&interface.name, &[&name])?;
    debug!(
        interface = %interface.name,
        dispatcher = %name,
        methods = methods.len(),
        "Emitted dispatcher"
    );

    Ok(SourceArtifact {
        name,
        kind: ArtifactKind::Dispatcher,
        interface: interface.name.clone(),
        items,
    })
}

/// `owner::method` on every listener, each receiving its own clone of the
/// arguments.
fn forward(owner: &str, method: &ResolvedMethod) -> FnDef {
    let params: Vec<(String, TypeRef)> = method
        .signature
        .params
        .iter()
        .map(|p| (parameter_name(p).to_string(), p.ty.clone()))
        .collect();
    let taken: Vec<String> = params.iter().map(|(n, _)| n.clone()).collect();
    let index = fresh_local("index", &taken);
    let listener = fresh_local("listener", &taken);

    let mut args = vec![Expr::ident(&listener).deref().by_ref()];
    args.extend(
        params
            .iter()
            .map(|(n, _)| Expr::call("::core::clone::Clone::clone", vec![Expr::ident(n).by_ref()])),
    );

    let mut def = FnDef::method(method.name()).body(vec![
        Stmt::Let {
            name: index.clone(),
            mutable: true,
            value: Expr::Int(0),
        },
        Stmt::WhileLet {
            binding: listener,
            value: Expr::ident("self").method(LISTENER_AT, vec![Expr::ident(&index)]),
            body: vec![
                Stmt::Expr(Expr::call(format!("{}::{}", owner, method.name()), args)),
                Stmt::AddAssign {
                    target: index,
                    value: Expr::Int(1),
                },
            ],
        },
    ]);
    for (name, ty) in params {
        def = def.param(name, ty);
    }
    def
}

fn listeners() -> Expr {
    Expr::SelfField(LISTENERS.to_string())
}

fn constructor() -> FnDef {
    FnDef::associated("new")
        .public()
        .doc("Creates a dispatcher with no listeners.")
        .returns("Self")
        .body(vec![Stmt::Tail(Expr::StructLit {
            path: "Self".to_string(),
            fields: vec![(
                LISTENERS.to_string(),
                Expr::call(
                    "::core::cell::RefCell::new",
                    vec![Expr::call("::std::vec::Vec::new", vec![])],
                ),
            )],
        })])
}

fn add_listener(listener_ty: &str) -> FnDef {
    FnDef::method("add_listener")
        .public()
        .doc("Appends `listener`. Adding the same listener twice makes it receive every call twice.")
        .param("listener", listener_ty)
        .body(vec![Stmt::Expr(
            listeners()
                .method("borrow_mut", vec![])
                .method("push", vec![Expr::ident("listener")]),
        )])
}

fn remove_listener(listener_ty: &str, policy: RemovalPolicy) -> FnDef {
    let same = Expr::Closure {
        params: vec!["existing".to_string()],
        body: Box::new(Expr::call(
            "::std::rc::Rc::ptr_eq",
            vec![Expr::ident("existing"), Expr::ident("listener")],
        )),
    };
    let borrow = Stmt::Let {
        name: "listeners".to_string(),
        mutable: true,
        value: listeners().method("borrow_mut", vec![]),
    };

    let (doc, body) = match policy {
        RemovalPolicy::First => (
            "Removes the first occurrence of `listener`, compared by pointer. \
             Returns whether one was found.",
            vec![
                borrow,
                Stmt::IfLet {
                    binding: "position".to_string(),
                    value: Expr::ident("listeners")
                        .method("iter", vec![])
                        .method("position", vec![same]),
                    then: vec![
                        Stmt::Expr(
                            Expr::ident("listeners")
                                .method("remove", vec![Expr::ident("position")]),
                        ),
                        Stmt::Return(Expr::Bool(true)),
                    ],
                },
                Stmt::Tail(Expr::Bool(false)),
            ],
        ),
        RemovalPolicy::All => (
            "Removes every occurrence of `listener`, compared by pointer. \
             Returns whether any was found.",
            vec![
                borrow,
                Stmt::Let {
                    name: "before".to_string(),
                    mutable: false,
                    value: Expr::ident("listeners").method("len", vec![]),
                },
                Stmt::Expr(Expr::ident("listeners").method(
                    "retain",
                    vec![Expr::Closure {
                        params: vec!["existing".to_string()],
                        body: Box::new(Expr::Not(Box::new(Expr::call(
                            "::std::rc::Rc::ptr_eq",
                            vec![Expr::ident("existing"), Expr::ident("listener")],
                        )))),
                    }],
                )),
                Stmt::Tail(Expr::Ne(
                    Box::new(Expr::ident("listeners").method("len", vec![])),
                    Box::new(Expr::ident("before")),
                )),
            ],
        ),
    };

    FnDef::method("remove_listener")
        .public()
        .doc(doc)
        .param("listener", format!("&{}", listener_ty))
        .returns("bool")
        .body(body)
}

fn len() -> FnDef {
    FnDef::method("len")
        .public()
        .doc("Number of registered listeners, counting duplicates.")
        .returns("usize")
        .body(vec![Stmt::Tail(
            listeners().method("borrow", vec![]).method("len", vec![]),
        )])
}

fn is_empty() -> FnDef {
    FnDef::method("is_empty")
        .public()
        .returns("bool")
        .body(vec![Stmt::Tail(
            listeners().method("borrow", vec![]).method("is_empty", vec![]),
        )])
}

/// Clones the listener out so no borrow is held while it runs.
fn listener_at(listener_ty: &str) -> FnDef {
    FnDef::method(LISTENER_AT)
        .param("index", "usize")
        .returns(format!("::core::option::Option<{}>", listener_ty))
        .body(vec![Stmt::Tail(
            listeners()
                .method("borrow", vec![])
                .method("get", vec![Expr::ident("index")])
                .method("cloned", vec![]),
        )])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::descriptor::{InterfaceGraph, MethodSignature, ParameterDescriptor};
    use crate::resolver::resolve;

    fn graph() -> InterfaceGraph {
        InterfaceGraph::new()
            .with(InterfaceDescriptor::new("Base").method(MethodSignature::new("closed")))
            .unwrap()
            .with(
                InterfaceDescriptor::new("Clicks").extends("Base").method(
                    MethodSignature::new("on_click")
                        .param(ParameterDescriptor::new("x", "i32"))
                        .param(ParameterDescriptor::new("v", "String").renamed("value")),
                ),
            )
            .unwrap()
    }

    fn emit(config: &GeneratorConfig) -> SourceArtifact {
        let graph = graph();
        let set = resolve(&graph, "Clicks").unwrap();
        let mut ctx = EmitContext::new(config);
        emit_dispatcher(&mut ctx, graph.get("Clicks").unwrap(), &set).unwrap()
    }

    fn trait_impls(artifact: &SourceArtifact) -> Vec<(&str, Vec<&str>)> {
        artifact
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Impl(ImplDef {
                    trait_path: Some(path),
                    methods,
                    ..
                }) if !path.contains("Default") => Some((
                    path.as_str(),
                    methods.iter().map(|m| m.name.as_str()).collect(),
                )),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_implements_whole_hierarchy() {
        let artifact = emit(&GeneratorConfig::default());

        assert_eq!(artifact.name, "ClicksDispatcher");
        assert_eq!(artifact.kind, ArtifactKind::Dispatcher);
        assert_eq!(
            trait_impls(&artifact),
            vec![("Clicks", vec!["on_click"]), ("Base", vec!["closed"])]
        );
    }

    #[test]
    fn test_forward_uses_resolved_parameter_names() {
        let artifact = emit(&GeneratorConfig::default());
        let on_click = artifact
            .items
            .iter()
            .find_map(|item| match item {
                Item::Impl(ImplDef {
                    trait_path: Some(path),
                    methods,
                    ..
                }) if path == "Clicks" => methods.first(),
                _ => None,
            })
            .unwrap();

        let names: Vec<&str> = on_click.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["x", "value"]);
        assert!(on_click.has_self);
    }

    #[test]
    fn test_locals_do_not_shadow_parameters() {
        let method = ResolvedMethod {
            signature: MethodSignature::new("select")
                .param(ParameterDescriptor::new("index", "usize"))
                .param(ParameterDescriptor::new("listener", "u8")),
            owners: vec!["Picker".to_string()],
        };

        let def = forward("Picker", &method);
        let body = def.body.unwrap();
        match (&body[0], &body[1]) {
            (Stmt::Let { name, .. }, Stmt::WhileLet { binding, .. }) => {
                assert_eq!(name, "index_");
                assert_eq!(binding, "listener_");
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn test_removal_policy_changes_body() {
        let first = emit(&GeneratorConfig::default());
        let all = emit(&GeneratorConfig::default().with_removal_policy(RemovalPolicy::All));

        let remove = |artifact: &SourceArtifact| -> FnDef {
            artifact
                .items
                .iter()
                .find_map(|item| match item {
                    Item::Impl(ImplDef {
                        trait_path: None,
                        methods,
                        ..
                    }) => methods.iter().find(|m| m.name == "remove_listener").cloned(),
                    _ => None,
                })
                .unwrap()
        };

        let first_body = remove(&first).body.unwrap();
        let all_body = remove(&all).body.unwrap();
        assert!(first_body.iter().any(|s| matches!(s, Stmt::IfLet { .. })));
        assert!(!all_body.iter().any(|s| matches!(s, Stmt::IfLet { .. })));
        assert_eq!(remove(&first).ret, Some(TypeRef::new("bool")));
    }

    #[test]
    fn test_second_dispatcher_for_same_name_collides() {
        let graph = graph();
        let set = resolve(&graph, "Clicks").unwrap();
        let config = GeneratorConfig::default();
        let mut ctx = EmitContext::new(&config);
        let interface = graph.get("Clicks").unwrap();

        emit_dispatcher(&mut ctx, interface, &set).unwrap();
        assert!(emit_dispatcher(&mut ctx, interface, &set).is_err());
    }
}
