use rspirv::binary::Disassemble;
use tracing::instrument;

use super::{Artifact, ArtifactKind, PassError, TranslationPass, expect_binary};

/// Turns a binary artifact into human readable SPIR-V assembly.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpirvDisassemblerBackend;

impl TranslationPass for SpirvDisassemblerBackend {
    fn name(&self) -> &str {
        "disassembler"
    }

    fn output_kind(&self) -> ArtifactKind {
        ArtifactKind::Text
    }

    #[instrument(level = "debug", skip_all)]
    fn run(&self, input: &Artifact) -> Result<Artifact, PassError> {
        let binary = expect_binary(self, input)?;
        let module = rspirv::dr::load_words(&binary.words)
            .map_err(|err| PassError::Parse(format!("{err:?}")))?;

        Ok(Artifact::Text(module.disassemble()))
    }
}
