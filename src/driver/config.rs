use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pass::PassId;
use crate::pipeline::{PipelineDescription, PipelineError, ShaderStage, StageDefinition};

/// A pipeline config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub stages: Vec<StageConfig>,
}

/// The passes to run after binary emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PipelineSection {
    /// Binary to binary passes, run in order.
    #[serde(default)]
    pub tool_passes: Vec<PassId>,
    /// Passes run on the output of the last tool pass, each on the output of the previous one.
    #[serde(default)]
    pub debug_passes: Vec<PassId>,
    /// The final backend.
    pub backend: Option<PassId>,
}

/// Defines a stage to translate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub stage: ShaderStage,
    /// Name of the type the stage is generated from.
    pub entry_type: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_description(&self) -> Result<PipelineDescription, PipelineError> {
        let mut builder = PipelineDescription::builder();
        for pass in &self.pipeline.tool_passes {
            builder = builder.boxed_tool_pass(pass.create());
        }
        for pass in &self.pipeline.debug_passes {
            builder = builder.boxed_debug_pass(pass.create());
        }
        if let Some(backend) = self.pipeline.backend {
            builder = builder.boxed_backend(backend.create());
        }
        builder.build()
    }

    pub fn stage_definitions(&self) -> Vec<StageDefinition> {
        self.stages
            .iter()
            .map(|stage| StageDefinition {
                stage: stage.stage,
                entry_type: stage.entry_type.clone(),
                source: None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let config = PipelineConfig::from_toml(
            r#"
            [pipeline]
            tool_passes = ["optimizer"]
            debug_passes = ["disassembler"]
            backend = "wgsl"

            [[stages]]
            stage = "vertex"
            entry_type = "DemoVertex"

            [[stages]]
            stage = "compute"
            "#,
        )
        .unwrap();

        assert_eq!(config.pipeline.tool_passes, vec![PassId::Optimizer]);
        assert_eq!(config.pipeline.debug_passes, vec![PassId::Disassembler]);
        assert_eq!(config.pipeline.backend, Some(PassId::Wgsl));
        assert_eq!(config.stages.len(), 2);
        assert_eq!(config.stages[1].entry_type, None);
    }

    #[test]
    fn unknown_pass() {
        let result = PipelineConfig::from_toml(
            r#"
            [pipeline]
            backend = "hlsl"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn backend_is_required() {
        let config = PipelineConfig::from_toml("[pipeline]\ntool_passes = []\n").unwrap();
        assert_eq!(
            config.to_description().unwrap_err(),
            PipelineError::MissingBackend
        );
    }
}
