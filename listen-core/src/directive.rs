// Generation directives attached to interfaces

use crate::naming::{default_base_name, default_events_name};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveKind {
    /// Generate `<Interface>Dispatcher`.
    Dispatcher,
    /// Generate the events module and the base trait.
    Events {
        events_name: Option<String>,
        base_name: Option<String>,
    },
}

/// What a directive was attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Interface(String),
    /// Any other item; `kind` is a short description such as `struct`.
    Other { name: String, kind: String },
}

impl Target {
    pub fn name(&self) -> &str {
        match self {
            Target::Interface(name) | Target::Other { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub target: Target,
    pub kind: DirectiveKind,
}

impl Directive {
    pub fn dispatcher(interface: impl Into<String>) -> Self {
        Self {
            target: Target::Interface(interface.into()),
            kind: DirectiveKind::Dispatcher,
        }
    }

    pub fn events(interface: impl Into<String>) -> Self {
        Self {
            target: Target::Interface(interface.into()),
            kind: DirectiveKind::Events {
                events_name: None,
                base_name: None,
            },
        }
    }

    pub fn events_named(
        interface: impl Into<String>,
        events_name: impl Into<String>,
        base_name: impl Into<String>,
    ) -> Self {
        Self {
            target: Target::Interface(interface.into()),
            kind: DirectiveKind::Events {
                events_name: Some(events_name.into()),
                base_name: Some(base_name.into()),
            },
        }
    }

    pub fn is_dispatcher(&self) -> bool {
        matches!(self.kind, DirectiveKind::Dispatcher)
    }

    /// `(events_name, base_name)` with defaults filled in, for event directives.
    pub fn event_names(&self) -> Option<(String, String)> {
        match &self.kind {
            DirectiveKind::Dispatcher => None,
            DirectiveKind::Events {
                events_name,
                base_name,
            } => {
                let interface = self.target.name();
                Some((
                    events_name
                        .clone()
                        .unwrap_or_else(|| default_events_name(interface)),
                    base_name
                        .clone()
                        .unwrap_or_else(|| default_base_name(interface)),
                ))
            }
        }
    }
}
