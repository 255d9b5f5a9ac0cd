//! Lowering of resolved method sets into artifact trees.
//!
//! Both emitters receive an [`EmitContext`] that carries the configuration
//! and the names already generated in this pass, so two interfaces cannot
//! silently produce the same item.

pub mod dispatcher;
pub mod events;
mod types;

pub use dispatcher::emit_dispatcher;
pub use events::emit_event_taxonomy;

use crate::artifact::SourceArtifact;
use crate::config::GeneratorConfig;
use crate::descriptor::InterfaceDescriptor;
use crate::directive::{Directive, DirectiveKind};
use crate::error::{ListenError, Result};
use crate::resolver::ResolvedMethodSet;
use std::collections::HashMap;

/// Per-pass emission state.
#[derive(Debug)]
pub struct EmitContext<'a> {
    config: &'a GeneratorConfig,
    /// Generated item name -> interface it was generated for.
    claimed: HashMap<String, String>,
}

impl<'a> EmitContext<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self {
            config,
            claimed: HashMap::new(),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        self.config
    }

    /// Reserve top-level names for `interface`. Either every name is
    /// reserved or none is.
    pub fn claim(&mut self, interface: &str, names: &[&str]) -> Result<()> {
        for name in names {
            if let Some(first) = self.claimed.get(*name) {
                return Err(ListenError::NameCollision {
                    name: name.to_string(),
                    first: first.clone(),
                    second: interface.to_string(),
                });
            }
        }
        for name in names {
            self.claimed.insert(name.to_string(), interface.to_string());
        }
        Ok(())
    }

    pub fn is_claimed(&self, name: &str) -> bool {
        self.claimed.contains_key(name)
    }
}

/// Emit every artifact a directive asks for.
pub fn emit(
    ctx: &mut EmitContext<'_>,
    directive: &Directive,
    interface: &InterfaceDescriptor,
    methods: &ResolvedMethodSet,
) -> Result<Vec<SourceArtifact>> {
    match &directive.kind {
        DirectiveKind::Dispatcher => Ok(vec![emit_dispatcher(ctx, interface, methods)?]),
        DirectiveKind::Events { .. } => {
            let (events_name, base_name) = directive
                .event_names()
                .ok_or_else(|| ListenError::InvalidDirective {
                    reason: "event directive without names".to_string(),
                })?;
            emit_event_taxonomy(ctx, interface, methods, &events_name, &base_name)
        }
    }
}

/// A local name starting from `base` that none of `taken` uses.
pub(crate) fn fresh_local(base: &str, taken: &[String]) -> String {
    let mut name = base.to_string();
    while taken.iter().any(|t| *t == name) {
        name.push('_');
    }
    name
}
