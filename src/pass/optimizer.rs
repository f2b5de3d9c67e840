use std::collections::HashSet;

use rspirv::{binary::Assemble, dr::Operand, spirv};
use tracing::{debug, instrument};

use super::{Artifact, ArtifactKind, BinaryArtifact, PassError, TranslationPass, expect_binary};

/// Binary to binary cleanup pass.
///
/// Drops debug names, duplicate capability declarations and `OpNop`s, then reassembles the module.
#[derive(Debug, Clone)]
pub struct SpirvOptimizerPass {
    pub strip_debug_names: bool,
}

impl Default for SpirvOptimizerPass {
    fn default() -> Self {
        Self {
            strip_debug_names: true,
        }
    }
}

impl TranslationPass for SpirvOptimizerPass {
    fn name(&self) -> &str {
        "optimizer"
    }

    fn output_kind(&self) -> ArtifactKind {
        ArtifactKind::Binary
    }

    #[instrument(level = "debug", skip_all)]
    fn run(&self, input: &Artifact) -> Result<Artifact, PassError> {
        let binary = expect_binary(self, input)?;
        let mut module = rspirv::dr::load_words(&binary.words)
            .map_err(|err| PassError::Parse(format!("{err:?}")))?;

        if self.strip_debug_names {
            module.debug_names.clear();
        }

        let mut seen = HashSet::new();
        module.capabilities.retain(|inst| match inst.operands.first() {
            Some(Operand::Capability(capability)) => seen.insert(*capability),
            _ => true,
        });

        for function in &mut module.functions {
            for block in &mut function.blocks {
                block
                    .instructions
                    .retain(|inst| inst.class.opcode != spirv::Op::Nop);
            }
        }

        let words = module.assemble();
        debug!(
            "optimized module from {} to {} words",
            binary.words.len(),
            words.len()
        );

        Ok(Artifact::Binary(BinaryArtifact {
            words,
            reflection: binary.reflection.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use rspirv::dr::Builder;

    use super::*;

    #[test]
    fn duplicate_capabilities_are_removed() {
        let mut builder = Builder::new();
        builder.capability(spirv::Capability::Shader);
        builder.capability(spirv::Capability::Shader);
        builder.capability(spirv::Capability::ImageQuery);
        builder.memory_model(spirv::AddressingModel::Logical, spirv::MemoryModel::GLSL450);
        let input = Artifact::Binary(BinaryArtifact {
            words: builder.module().assemble(),
            reflection: Default::default(),
        });

        let output = SpirvOptimizerPass::default().run(&input).unwrap();
        let module = rspirv::dr::load_words(&output.as_binary().unwrap().words).unwrap();

        assert_eq!(module.capabilities.len(), 2);
    }

    #[test]
    fn text_is_rejected() {
        let input = Artifact::Text(String::new());
        let result = SpirvOptimizerPass::default().run(&input);

        assert!(matches!(result, Err(PassError::UnexpectedArtifact { .. })));
    }
}
