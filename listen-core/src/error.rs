// Error types for listener code generation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListenError {
    #[error("Not an interface: `{name}` carries a generation directive but is not a trait")]
    NotAnInterface { name: String },

    #[error("Non-void return: `{interface}::{method}` must not return a value")]
    NonVoidReturn { interface: String, method: String },

    #[error("Failed to emit artifact `{artifact}`: {source}")]
    EmissionIo {
        artifact: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unresolved interface: `{name}` is not declared in this scope")]
    UnresolvedInterface { name: String },

    #[error("Duplicate interface: `{name}` is declared more than once")]
    DuplicateInterface { name: String },

    #[error("Cyclic interface: `{name}` extends itself")]
    CyclicInterface { name: String },

    #[error("Unsupported signature in `{interface}`: {reason}")]
    UnsupportedSignature { interface: String, reason: String },

    #[error("Invalid type `{ty}`: {reason}")]
    InvalidType { ty: String, reason: String },

    #[error("Invalid identifier `{name}`")]
    InvalidIdentifier { name: String },

    #[error("Name collision: `{name}` is generated for both `{first}` and `{second}`")]
    NameCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("Invalid directive: {reason}")]
    InvalidDirective { reason: String },

    #[error("Parse error: {0}")]
    Parse(#[from] syn::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{} interfaces failed to generate", .0.len())]
    Multiple(Vec<ListenError>),
}

impl ListenError {
    /// Flatten `Multiple` into its leaves; any other error yields itself.
    pub fn into_leaves(self) -> Vec<ListenError> {
        match self {
            ListenError::Multiple(errors) => errors
                .into_iter()
                .flat_map(ListenError::into_leaves)
                .collect(),
            other => vec![other],
        }
    }

    /// Name of the interface the error is about, when there is one.
    pub fn interface(&self) -> Option<&str> {
        match self {
            ListenError::NotAnInterface { name }
            | ListenError::UnresolvedInterface { name }
            | ListenError::DuplicateInterface { name }
            | ListenError::CyclicInterface { name } => Some(name),
            ListenError::NonVoidReturn { interface, .. }
            | ListenError::UnsupportedSignature { interface, .. } => Some(interface),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ListenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_method() {
        let err = ListenError::NonVoidReturn {
            interface: "Clicks".to_string(),
            method: "count".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Non-void return: `Clicks::count` must not return a value"
        );
        assert_eq!(err.interface(), Some("Clicks"));
    }

    #[test]
    fn test_into_leaves_flattens_nested() {
        let err = ListenError::Multiple(vec![
            ListenError::NotAnInterface {
                name: "A".to_string(),
            },
            ListenError::Multiple(vec![ListenError::CyclicInterface {
                name: "B".to_string(),
            }]),
        ]);

        let leaves = err.into_leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[1].interface(), Some("B"));
    }
}
