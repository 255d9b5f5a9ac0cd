// Listen - generated multicast dispatchers and event taxonomies for listener traits
//
// This library re-exports the generation pipeline from `listen-core`, the
// `#[listeners]` attribute from `listen-macro`, and a build-script host.

// Re-export core functionality
pub use listen_core::*;

// Re-export procedural macros
#[cfg(feature = "macros")]
pub use listen_macro::listeners;

pub mod build;

// Prelude for common imports
pub mod prelude {
    #[cfg(feature = "macros")]
    pub use crate::listeners;
    pub use crate::{
        FailurePolicy, GenerationReport, Generator, GeneratorConfig, ListenError, RemovalPolicy,
    };
}
