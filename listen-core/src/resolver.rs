//! Method resolution.
//!
//! Flattens an interface and all of its transitive super-interfaces into a
//! single de-duplicated method set. Traversal is depth-first pre-order: an
//! interface's own methods come first, then each super-interface in the
//! order it was declared. The resulting order is stable, which keeps the
//! generated output reproducible.

use crate::descriptor::{InterfaceGraph, MethodSignature, SignatureKey};
use crate::error::{ListenError, Result};
use crate::validate::validate;
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// A method in the flattened set together with every interface declaring it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMethod {
    /// The first declaration found.
    pub signature: MethodSignature,
    /// Declaring interfaces, in discovery order.
    pub owners: Vec<String>,
}

impl ResolvedMethod {
    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn is_owned_by(&self, interface: &str) -> bool {
        self.owners.iter().any(|o| o == interface)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedMethodSet {
    root: String,
    methods: Vec<ResolvedMethod>,
    index: HashMap<SignatureKey, usize>,
    interfaces: Vec<String>,
}

impl ResolvedMethodSet {
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn methods(&self) -> &[ResolvedMethod] {
        &self.methods
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedMethod> {
        self.methods.iter()
    }

    /// Every interface in the hierarchy, root first, each once.
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// Methods that `interface` declares itself, in resolved order.
    pub fn owned_by<'a>(&'a self, interface: &'a str) -> impl Iterator<Item = &'a ResolvedMethod> {
        self.methods.iter().filter(move |m| m.is_owned_by(interface))
    }

    pub fn get(&self, key: &SignatureKey) -> Option<&ResolvedMethod> {
        self.index.get(key).map(|&i| &self.methods[i])
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    fn add(&mut self, owner: &str, method: &MethodSignature) {
        let key = method.key();
        match self.index.get(&key) {
            Some(&i) => {
                let entry = &mut self.methods[i];
                if !entry.is_owned_by(owner) {
                    entry.owners.push(owner.to_string());
                }
            }
            None => {
                self.index.insert(key, self.methods.len());
                self.methods.push(ResolvedMethod {
                    signature: method.clone(),
                    owners: vec![owner.to_string()],
                });
            }
        }
    }
}

/// Resolve the full method set of `root`, validating each method on the way.
///
/// Fails on the first method that returns a value, on a super-interface
/// missing from `graph`, or on a cycle in the extension graph.
pub fn resolve(graph: &InterfaceGraph, root: &str) -> Result<ResolvedMethodSet> {
    let root_name = graph.require(root)?.name.clone();
    let mut set = ResolvedMethodSet {
        root: root_name.clone(),
        ..Default::default()
    };
    let mut stack = Vec::new();
    let mut visited = HashSet::new();

    collect(graph, &root_name, &mut set, &mut stack, &mut visited)?;

    trace!(
        interface = %root_name,
        methods = set.len(),
        interfaces = set.interfaces.len(),
        "Resolved method set"
    );
    Ok(set)
}

fn collect(
    graph: &InterfaceGraph,
    name: &str,
    set: &mut ResolvedMethodSet,
    stack: &mut Vec<String>,
    visited: &mut HashSet<String>,
) -> Result<()> {
    let interface = graph.require(name)?;
    let name = interface.name.as_str();

    if stack.iter().any(|n| n == name) {
        return Err(ListenError::CyclicInterface {
            name: name.to_string(),
        });
    }
    // Diamonds: an ancestor reached twice contributes nothing new.
    if !visited.insert(name.to_string()) {
        return Ok(());
    }

    set.interfaces.push(name.to_string());
    for method in &interface.methods {
        validate(name, method)?;
        set.add(name, method);
    }

    stack.push(name.to_string());
    for parent in &interface.extends {
        collect(graph, parent, set, stack, visited)?;
    }
    stack.pop();

    Ok(())
}
