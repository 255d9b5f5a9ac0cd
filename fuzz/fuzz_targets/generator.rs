//! Fuzz target for resolution and emission.
//!
//! Builds descriptor graphs directly from arbitrary names, types and
//! extension edges, including cycles and missing parents, then runs a pass
//! with both failure policies.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use listen_core::{
    Directive, FailurePolicy, Generator, GeneratorConfig, InterfaceDescriptor, InterfaceGraph,
    MemorySink, MethodSignature, ParameterDescriptor,
};

#[derive(Debug, Arbitrary)]
struct FuzzMethod {
    name: String,
    params: Vec<(String, String)>,
    returns: Option<String>,
}

#[derive(Debug, Arbitrary)]
struct FuzzInterface {
    name: String,
    methods: Vec<FuzzMethod>,
    /// Indexes into the interface list; out of range names a missing parent.
    extends: Vec<u8>,
    events: bool,
}

fuzz_target!(|interfaces: Vec<FuzzInterface>| {
    let names: Vec<String> = interfaces.iter().map(|i| i.name.clone()).collect();
    let mut graph = InterfaceGraph::new();
    let mut directives = Vec::new();

    for fuzz in &interfaces {
        let mut interface = InterfaceDescriptor::new(fuzz.name.clone());
        for parent in &fuzz.extends {
            let parent = names
                .get(*parent as usize)
                .cloned()
                .unwrap_or_else(|| format!("Missing{}", parent));
            interface = interface.extends(parent);
        }
        for m in &fuzz.methods {
            let mut method = MethodSignature::new(m.name.clone());
            for (ident, ty) in &m.params {
                method = method.param(ParameterDescriptor::new(ident.clone(), ty.clone()));
            }
            if let Some(ty) = &m.returns {
                method = method.returning(ty.clone());
            }
            interface = interface.method(method);
        }
        if graph.insert(interface).is_err() {
            continue;
        }
        directives.push(Directive::dispatcher(fuzz.name.clone()));
        if fuzz.events {
            directives.push(Directive::events(fuzz.name.clone()));
        }
    }

    for policy in [FailurePolicy::Abort, FailurePolicy::Isolate] {
        let mut sink = MemorySink::new();
        let config = GeneratorConfig::default().with_failure_policy(policy);
        let _ = Generator::new(config).run(&graph, &directives, &mut sink);
    }
});
