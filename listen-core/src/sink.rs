//! Artifact sinks.
//!
//! A sink receives each rendered artifact once, in generation order.

use crate::artifact::ArtifactKind;
use crate::naming::module_name;
use proc_macro2::TokenStream;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A generated artifact in both token and source form.
#[derive(Debug, Clone)]
pub struct RenderedArtifact {
    pub name: String,
    pub kind: ArtifactKind,
    pub interface: String,
    pub tokens: TokenStream,
    pub source: String,
}

impl RenderedArtifact {
    /// File name used when the artifact is written to disk.
    pub fn file_name(&self) -> String {
        format!("{}.rs", module_name(&self.name))
    }
}

/// Destination for rendered artifacts.
pub trait ArtifactSink {
    fn write(&mut self, artifact: &RenderedArtifact) -> io::Result<()>;
}

/// Keeps artifacts in memory, in the order they were written.
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: Vec<RenderedArtifact>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts(&self) -> &[RenderedArtifact] {
        &self.artifacts
    }

    pub fn into_artifacts(self) -> Vec<RenderedArtifact> {
        self.artifacts
    }

    /// Concatenated tokens of every artifact.
    pub fn tokens(&self) -> TokenStream {
        self.artifacts.iter().map(|a| a.tokens.clone()).collect()
    }
}

impl ArtifactSink for MemorySink {
    fn write(&mut self, artifact: &RenderedArtifact) -> io::Result<()> {
        self.artifacts.push(artifact.clone());
        Ok(())
    }
}

/// Writes one `.rs` file per artifact into a directory.
#[derive(Debug)]
pub struct DirSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn into_written(self) -> Vec<PathBuf> {
        self.written
    }
}

impl ArtifactSink for DirSink {
    fn write(&mut self, artifact: &RenderedArtifact) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(artifact.file_name());
        fs::write(&path, &artifact.source)?;
        debug!(path = %path.display(), artifact = %artifact.name, "Wrote artifact");
        self.written.push(path);
        Ok(())
    }
}
