//! Listener interface resolution and code generation.
//!
//! Given traits whose methods all return `()`, this crate generates:
//!
//! - a multicast dispatcher (`<Trait>Dispatcher`) that implements the trait
//!   and its supertraits by forwarding every call to each registered
//!   listener in registration order
//! - an event taxonomy: one record struct per method, an `Event` enum over
//!   all records, and a base trait that turns every call into an event passed
//!   to a single `on_event` method
//!
//! The pipeline is frontend -> [`InterfaceGraph`] -> [`resolve`] -> emit ->
//! [`Renderer`] -> [`ArtifactSink`], driven by [`Generator`].

pub mod artifact;
pub mod config;
pub mod descriptor;
pub mod directive;
pub mod driver;
pub mod emit;
pub mod error;
pub mod frontend;
pub mod naming;
pub mod render;
pub mod resolver;
pub mod sink;
pub mod validate;

pub use artifact::{ArtifactKind, SourceArtifact, Visibility};
pub use config::{FailurePolicy, GeneratorConfig, RemovalPolicy};
pub use descriptor::{
    InterfaceDescriptor, InterfaceGraph, MethodSignature, ParameterDescriptor, ReturnKind,
    SignatureKey, TypeRef,
};
pub use directive::{Directive, DirectiveKind, Target};
pub use driver::{GenerationReport, Generator, ReportEntry};
pub use error::{ListenError, Result};
pub use frontend::{FrontendOutput, parse_file, scan, strip_attributes};
pub use render::{Renderer, RustRenderer};
pub use resolver::{ResolvedMethod, ResolvedMethodSet, resolve};
pub use sink::{ArtifactSink, DirSink, MemorySink, RenderedArtifact};
pub use validate::validate;
