//! Generator driver.
//!
//! Runs resolution, validation, emission and rendering for every directive
//! and hands the results to a sink. Dispatcher directives run first, then
//! event directives, each group in declaration order.
//!
//! Nothing reaches the sink until every directive has been processed, so a
//! failing interface never leaves part of its output behind.

use crate::artifact::{ArtifactKind, SourceArtifact};
use crate::config::{FailurePolicy, GeneratorConfig};
use crate::descriptor::InterfaceGraph;
use crate::directive::{Directive, Target};
use crate::emit::{EmitContext, emit};
use crate::error::{ListenError, Result};
use crate::render::{Renderer, RustRenderer};
use crate::resolver::resolve;
use crate::sink::{ArtifactSink, RenderedArtifact};
use std::collections::HashSet;
use tracing::{debug, error, info};

/// One artifact handed to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub name: String,
    pub kind: ArtifactKind,
    pub interface: String,
}

/// Summary of a successful pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub artifacts: Vec<ReportEntry>,
}

impl GenerationReport {
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

/// Code generator over a pluggable renderer.
#[derive(Debug, Clone)]
pub struct Generator<R = RustRenderer> {
    config: GeneratorConfig,
    renderer: R,
}

impl Generator<RustRenderer> {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            renderer: RustRenderer::new(),
        }
    }
}

impl Default for Generator<RustRenderer> {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl<R: Renderer> Generator<R> {
    pub fn with_renderer(config: GeneratorConfig, renderer: R) -> Self {
        Self { config, renderer }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate every artifact `directives` ask for and write them to `sink`.
    ///
    /// Under [`FailurePolicy::Abort`] the first error is returned; a build
    /// error leaves the sink untouched. Under [`FailurePolicy::Isolate`] failing
    /// interfaces are skipped, the rest are written, and the failures come
    /// back together as [`ListenError::Multiple`].
    pub fn run(
        &self,
        graph: &InterfaceGraph,
        directives: &[Directive],
        sink: &mut dyn ArtifactSink,
    ) -> Result<GenerationReport> {
        info!(
            interfaces = graph.len(),
            directives = directives.len(),
            "Starting generation pass"
        );

        let mut ctx = EmitContext::new(&self.config);
        let mut staged = Vec::new();
        let mut failures = Vec::new();
        let mut failed = HashSet::new();

        let ordered = directives
            .iter()
            .filter(|d| d.is_dispatcher())
            .chain(directives.iter().filter(|d| !d.is_dispatcher()));

        for directive in ordered {
            let target = directive.target.name().to_string();
            if failed.contains(&target) {
                continue;
            }
            match self.build(&mut ctx, graph, directive) {
                Ok(artifacts) => staged.extend(artifacts),
                Err(err) => {
                    error!(interface = %target, error = %err, "Generation failed");
                    self.fail(err, &mut failures)?;
                    failed.insert(target);
                }
            }
        }

        let mut report = GenerationReport::default();
        for artifact in staged {
            if failed.contains(&artifact.interface) {
                debug!(artifact = %artifact.name, "Skipping artifact of failed interface");
                continue;
            }
            if let Err(source) = sink.write(&artifact) {
                let err = ListenError::EmissionIo {
                    artifact: artifact.name.clone(),
                    source,
                };
                error!(interface = %artifact.interface, error = %err, "Write failed");
                self.fail(err, &mut failures)?;
                failed.insert(artifact.interface.clone());
                continue;
            }
            report.artifacts.push(ReportEntry {
                name: artifact.name,
                kind: artifact.kind,
                interface: artifact.interface,
            });
        }

        if !failures.is_empty() {
            return Err(ListenError::Multiple(failures));
        }

        info!(artifacts = report.len(), "Generation pass complete");
        Ok(report)
    }

    /// Under `Abort` return the error, under `Isolate` record it.
    fn fail(&self, err: ListenError, failures: &mut Vec<ListenError>) -> Result<()> {
        match self.config.failure_policy {
            FailurePolicy::Abort => Err(err),
            FailurePolicy::Isolate => {
                failures.push(err);
                Ok(())
            }
        }
    }

    fn build(
        &self,
        ctx: &mut EmitContext<'_>,
        graph: &InterfaceGraph,
        directive: &Directive,
    ) -> Result<Vec<RenderedArtifact>> {
        let name = match &directive.target {
            Target::Interface(name) => name,
            Target::Other { name, kind } => {
                debug!(target = %name, kind = %kind, "Directive on a non-trait item");
                return Err(ListenError::NotAnInterface { name: name.clone() });
            }
        };

        let interface = graph.require(name)?;
        let methods = resolve(graph, &interface.name)?;
        let artifacts = emit(ctx, directive, interface, &methods)?;

        artifacts
            .iter()
            .map(|artifact| self.render(artifact))
            .collect()
    }

    fn render(&self, artifact: &SourceArtifact) -> Result<RenderedArtifact> {
        let rendered = RenderedArtifact {
            name: artifact.name.clone(),
            kind: artifact.kind,
            interface: artifact.interface.clone(),
            tokens: self.renderer.render_tokens(artifact)?,
            source: self.renderer.render_source(artifact)?,
        };
        debug!(artifact = %rendered.name, kind = %rendered.kind, "Rendered artifact");
        Ok(rendered)
    }
}
