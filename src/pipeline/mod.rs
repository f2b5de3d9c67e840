//! Runs a shader translation unit through a sequence of translation passes.
//!
//! ```text
//! entry type -> binary -> tool passes -> snapshot -> final backend
//!                                           \-> debug passes
//! ```
//!
//! Every intermediate artifact is kept. Debug passes fork off the snapshot and never feed
//! the final backend.

use std::fmt;

use tracing::{debug, error, instrument};

use crate::codegen::SpirvBinaryBackend;
use crate::ir::{ShaderLibrary, TypeIndex};
use crate::pass::{Artifact, ArtifactKind, BinaryArtifact, PassError, TranslationPass};

pub use errors::PipelineError;
pub use stages::{
    EntryCategory, ShaderStage, StageDefinition, StageTranslation, TranslationEntry,
    compile_stage, compile_stages, group_entries, translate_stages,
};

pub mod errors;
mod stages;

/// The passes run after binary emission.
#[derive(Debug)]
pub struct PipelineDescription {
    tool_passes: Vec<Box<dyn TranslationPass>>,
    debug_passes: Vec<Box<dyn TranslationPass>>,
    backend: Box<dyn TranslationPass>,
}

impl PipelineDescription {
    pub fn builder() -> PipelineDescriptionBuilder {
        PipelineDescriptionBuilder::default()
    }

    pub fn tool_passes(&self) -> &[Box<dyn TranslationPass>] {
        &self.tool_passes
    }

    pub fn debug_passes(&self) -> &[Box<dyn TranslationPass>] {
        &self.debug_passes
    }

    pub fn backend(&self) -> &dyn TranslationPass {
        self.backend.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct PipelineDescriptionBuilder {
    tool_passes: Vec<Box<dyn TranslationPass>>,
    debug_passes: Vec<Box<dyn TranslationPass>>,
    backend: Option<Box<dyn TranslationPass>>,
}

impl PipelineDescriptionBuilder {
    pub fn tool_pass(self, pass: impl TranslationPass + 'static) -> Self {
        self.boxed_tool_pass(Box::new(pass))
    }

    pub fn boxed_tool_pass(mut self, pass: Box<dyn TranslationPass>) -> Self {
        self.tool_passes.push(pass);
        self
    }

    pub fn debug_pass(self, pass: impl TranslationPass + 'static) -> Self {
        self.boxed_debug_pass(Box::new(pass))
    }

    pub fn boxed_debug_pass(mut self, pass: Box<dyn TranslationPass>) -> Self {
        self.debug_passes.push(pass);
        self
    }

    /// Sets the final backend, replacing any previous one.
    pub fn backend(self, pass: impl TranslationPass + 'static) -> Self {
        self.boxed_backend(Box::new(pass))
    }

    pub fn boxed_backend(mut self, pass: Box<dyn TranslationPass>) -> Self {
        self.backend = Some(pass);
        self
    }

    /// Checks that every pass is handed the kind of artifact it consumes.
    pub fn build(self) -> Result<PipelineDescription, PipelineError> {
        let backend = self.backend.ok_or(PipelineError::MissingBackend)?;

        let mut current = ArtifactKind::Binary;
        for pass in &self.tool_passes {
            check_input(pass.as_ref(), current)?;
            current = pass.output_kind();
        }
        let snapshot = current;

        for pass in &self.debug_passes {
            check_input(pass.as_ref(), current)?;
            current = pass.output_kind();
        }
        check_input(backend.as_ref(), snapshot)?;

        Ok(PipelineDescription {
            tool_passes: self.tool_passes,
            debug_passes: self.debug_passes,
            backend,
        })
    }
}

fn check_input(pass: &dyn TranslationPass, found: ArtifactKind) -> Result<(), PipelineError> {
    if pass.input_kind() != found {
        return Err(PipelineError::IncompatiblePass {
            pass: pass.name().to_string(),
            expected: pass.input_kind(),
            found,
        });
    }
    Ok(())
}

/// An artifact tagged with the pass that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct PassOutput {
    pub pass: String,
    pub artifact: Artifact,
}

/// Where in the pipeline a pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    Tool,
    Debug,
    Backend,
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Branch::Tool => f.write_str("tool"),
            Branch::Debug => f.write_str("debug"),
            Branch::Backend => f.write_str("backend"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassFailure {
    pub pass: String,
    pub branch: Branch,
    pub error: PassError,
}

impl fmt::Display for PassFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pass {:?} failed: {}", self.branch, self.pass, self.error)
    }
}

/// Everything a pipeline run produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineResults {
    /// The binary, then one artifact per tool pass, then the final backend output.
    pub primary: Vec<PassOutput>,
    /// One artifact per debug pass.
    pub debug: Vec<PassOutput>,
    pub failures: Vec<PassFailure>,
}

impl PipelineResults {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// The output of the final backend, if it ran and succeeded.
    pub fn final_output(&self) -> Option<&PassOutput> {
        if self
            .failures
            .iter()
            .any(|failure| failure.branch != Branch::Debug)
        {
            return None;
        }
        self.primary.last()
    }

    /// The emitted binary, before any tool pass ran.
    pub fn binary(&self) -> Option<&BinaryArtifact> {
        self.primary.first()?.artifact.as_binary()
    }
}

fn run_pass(
    pass: &dyn TranslationPass,
    branch: Branch,
    input: &Artifact,
) -> Result<PassOutput, PassFailure> {
    debug!("running {branch} pass {:?}", pass.name());

    match pass.run(input) {
        Ok(artifact) => Ok(PassOutput {
            pass: pass.name().to_string(),
            artifact,
        }),
        Err(error) => {
            let failure = PassFailure {
                pass: pass.name().to_string(),
                branch,
                error,
            };
            error!("{failure}");
            Err(failure)
        }
    }
}

/// Emits `entry` and runs the result through the passes of `description`.
///
/// A failing tool pass ends the run. A failing debug pass only ends the debug branch,
/// the final backend still runs.
#[instrument(level = "debug", skip_all, fields(entry = ?entry))]
pub fn compile_pipeline(
    library: &ShaderLibrary,
    entry: Option<TypeIndex>,
    description: &PipelineDescription,
) -> Result<PipelineResults, PipelineError> {
    let entry = entry.ok_or(PipelineError::UnresolvedEntryType(None))?;
    let binary = SpirvBinaryBackend.translate_type(library, entry)?;

    let mut results = PipelineResults::default();
    results.primary.push(PassOutput {
        pass: SpirvBinaryBackend::NAME.to_string(),
        artifact: Artifact::Binary(binary),
    });

    for pass in &description.tool_passes {
        let input = &results.primary[results.primary.len() - 1].artifact;
        match run_pass(pass.as_ref(), Branch::Tool, input) {
            Ok(output) => results.primary.push(output),
            Err(failure) => {
                results.failures.push(failure);
                return Ok(results);
            }
        }
    }
    let snapshot = results.primary.len() - 1;

    for pass in &description.debug_passes {
        let input = match results.debug.last() {
            Some(previous) => &previous.artifact,
            None => &results.primary[snapshot].artifact,
        };
        match run_pass(pass.as_ref(), Branch::Debug, input) {
            Ok(output) => results.debug.push(output),
            Err(failure) => {
                results.failures.push(failure);
                break;
            }
        }
    }

    let input = &results.primary[snapshot].artifact;
    match run_pass(description.backend(), Branch::Backend, input) {
        Ok(output) => results.primary.push(output),
        Err(failure) => results.failures.push(failure),
    }

    Ok(results)
}
