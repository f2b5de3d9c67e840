use naga::{
    back::wgsl::WriterFlags,
    front::spv,
    valid::{Capabilities, ValidationFlags, Validator},
};
use tracing::{debug, instrument};

use super::{Artifact, ArtifactKind, PassError, TranslationPass, expect_binary};

/// Final backend producing WGSL source.
#[derive(Debug, Clone, Copy, Default)]
pub struct WgslBackend;

impl TranslationPass for WgslBackend {
    fn name(&self) -> &str {
        "wgsl"
    }

    fn output_kind(&self) -> ArtifactKind {
        ArtifactKind::Text
    }

    #[instrument(level = "debug", skip_all)]
    fn run(&self, input: &Artifact) -> Result<Artifact, PassError> {
        let binary = expect_binary(self, input)?;
        let bytes: Vec<u8> = binary
            .words
            .iter()
            .flat_map(|word| word.to_le_bytes())
            .collect();

        let module = spv::parse_u8_slice(&bytes, &spv::Options::default())
            .map_err(|err| PassError::Parse(err.to_string()))?;
        debug!("parsed module with {} functions", module.functions.len());

        let info = Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(&module)
            .map_err(|err| PassError::Validation(err.into_inner().to_string()))?;

        let source = naga::back::wgsl::write_string(&module, &info, WriterFlags::empty())
            .map_err(|err| PassError::Backend(err.to_string()))?;

        Ok(Artifact::Text(source))
    }
}
