//! Translation passes: units of work consuming one artifact and producing the next.

use std::fmt;

use serde::{Deserialize, Serialize};

mod artifact;
mod disassembler;
mod errors;
mod optimizer;
mod wgsl;

pub use artifact::{
    Artifact, ArtifactKind, BinaryArtifact, EntryPointReflection, GlobalReflection,
    ShaderStageReflection,
};
pub use disassembler::SpirvDisassemblerBackend;
pub use errors::PassError;
pub use optimizer::SpirvOptimizerPass;
pub use wgsl::WgslBackend;

pub trait TranslationPass: fmt::Debug {
    /// Name of the pass, used to tag its results.
    fn name(&self) -> &str;

    fn input_kind(&self) -> ArtifactKind {
        ArtifactKind::Binary
    }

    fn output_kind(&self) -> ArtifactKind;

    fn run(&self, input: &Artifact) -> Result<Artifact, PassError>;
}

/// Identifies one of the built-in passes in a pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PassId {
    Optimizer,
    Disassembler,
    Wgsl,
}

impl PassId {
    pub fn create(self) -> Box<dyn TranslationPass> {
        match self {
            PassId::Optimizer => Box::new(SpirvOptimizerPass::default()),
            PassId::Disassembler => Box::new(SpirvDisassemblerBackend),
            PassId::Wgsl => Box::new(WgslBackend),
        }
    }
}

/// Gets the binary input of a pass, failing if it was handed text.
pub fn expect_binary<'a>(
    pass: &dyn TranslationPass,
    input: &'a Artifact,
) -> Result<&'a BinaryArtifact, PassError> {
    input
        .as_binary()
        .ok_or_else(|| PassError::UnexpectedArtifact {
            pass: pass.name().to_string(),
            expected: ArtifactKind::Binary,
            found: input.kind(),
        })
}
