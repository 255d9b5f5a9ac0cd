//! Build-script host.
//!
//! Reads a listener definition file that is not itself part of the module
//! tree, and writes into a directory (usually `OUT_DIR`):
//!
//! - one file per generated artifact, named after it in snake case
//! - a module file named after the source file, holding the definitions with
//!   the helper attributes removed followed by an `include!` of each artifact
//!
//! ```ignore
//! // build.rs
//! fn main() {
//!     listen::build::generate_from_env("listeners/ui.rs").unwrap();
//! }
//!
//! // src/ui.rs
//! include!(concat!(env!("OUT_DIR"), "/ui.rs"));
//! ```

use listen_core::{DirSink, GenerationReport, Generator, GeneratorConfig, ListenError, Result};
use quote::ToTokens;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Config file looked up in the package root by [`generate_from_env`].
pub const CONFIG_FILE: &str = "listen.toml";

/// What a build run produced.
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub report: GenerationReport,
    /// The module file to `include!`.
    pub module: PathBuf,
    /// Artifact files, in generation order.
    pub files: Vec<PathBuf>,
}

/// Generate code for the traits in `source_path` into `out_dir`.
pub fn generate(
    source_path: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &GeneratorConfig,
) -> Result<BuildOutput> {
    let source_path = source_path.as_ref();
    let out_dir = out_dir.as_ref();
    let source = fs::read_to_string(source_path).map_err(|e| {
        ListenError::Config(format!("Failed to read {}: {}", source_path.display(), e))
    })?;

    let mut file = syn::parse_file(&source)?;
    let scanned = listen_core::scan(&file.items)?;
    let mut sink = DirSink::new(out_dir);

    let report = match Generator::new(config.clone()).run(
        &scanned.graph,
        &scanned.directives,
        &mut sink,
    ) {
        Ok(report) => report,
        Err(err) => {
            match &err {
                ListenError::Multiple(errors) => {
                    for leaf in errors {
                        error!(source = %source_path.display(), error = %leaf, "Listener generation failed");
                    }
                }
                other => {
                    error!(source = %source_path.display(), error = %other, "Listener generation failed")
                }
            }
            return Err(err);
        }
    };
    let files = sink.into_written();

    listen_core::strip_attributes(&mut file.items);
    let module = out_dir.join(module_file_name(source_path)?);
    let emission_io = |source: std::io::Error| ListenError::EmissionIo {
        artifact: module.display().to_string(),
        source,
    };
    let mut text = format!(
        "// @generated by listen from `{}`. Do not edit.\n{}\n",
        source_path.display(),
        file.to_token_stream()
    );
    for path in &files {
        if let Some(name) = path.file_name() {
            text.push_str(&format!("include!(\"{}\");\n", name.to_string_lossy()));
        }
    }
    fs::create_dir_all(out_dir).map_err(emission_io)?;
    fs::write(&module, text).map_err(emission_io)?;
    debug!(path = %module.display(), "Wrote module file");

    info!(
        source = %source_path.display(),
        artifacts = report.len(),
        "Generated listener code"
    );
    Ok(BuildOutput {
        report,
        module,
        files,
    })
}

fn module_file_name(source_path: &Path) -> Result<PathBuf> {
    source_path
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| {
            ListenError::Config(format!("{} has no file name", source_path.display()))
        })
}

/// [`generate`] for use inside a build script.
///
/// Writes into `OUT_DIR`. The config is read from `listen.toml` in the
/// package root when present, then overridden by `LISTEN_*` variables. Also
/// tells cargo when to rerun.
pub fn generate_from_env(source_path: impl AsRef<Path>) -> Result<BuildOutput> {
    let out_dir = env::var_os("OUT_DIR")
        .ok_or_else(|| ListenError::Config("OUT_DIR is not set".to_string()))?;
    let config = config_from_env()?;

    println!("cargo:rerun-if-changed={}", source_path.as_ref().display());
    for key in ["FAILURE_POLICY", "REMOVAL_POLICY", "EVENT_DERIVES"] {
        println!("cargo:rerun-if-env-changed={}{}", listen_core::config::ENV_PREFIX, key);
    }

    generate(source_path, PathBuf::from(out_dir), &config)
}

fn config_from_env() -> Result<GeneratorConfig> {
    let file = env::var_os("CARGO_MANIFEST_DIR")
        .map(|dir| PathBuf::from(dir).join(CONFIG_FILE))
        .filter(|path| path.is_file());

    match file {
        Some(path) => {
            println!("cargo:rerun-if-changed={}", path.display());
            GeneratorConfig::load(path)?.apply_env()
        }
        None => GeneratorConfig::from_env(),
    }
}
