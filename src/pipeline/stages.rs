use itertools::Itertools;
use rspirv::spirv::ExecutionModel;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::ir::ShaderLibrary;

use super::{PipelineDescription, PipelineError, PipelineResults, compile_pipeline};

/// A shader stage. The ordering is the order stages are presented in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ShaderStage {
    Vertex,
    Geometry,
    Pixel,
    Compute,
}

impl ShaderStage {
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "Vertex",
            ShaderStage::Geometry => "Geometry",
            ShaderStage::Pixel => "Pixel",
            ShaderStage::Compute => "Compute",
        }
    }

    pub fn execution_model(self) -> ExecutionModel {
        match self {
            ShaderStage::Vertex => ExecutionModel::Vertex,
            ShaderStage::Geometry => ExecutionModel::Geometry,
            ShaderStage::Pixel => ExecutionModel::Fragment,
            ShaderStage::Compute => ExecutionModel::GLCompute,
        }
    }
}

/// What to translate for a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDefinition {
    pub stage: ShaderStage,
    /// Name of the type the stage is generated from, stages without one are skipped.
    pub entry_type: Option<String>,
    /// The source the entry type was compiled from, shown next to the translations.
    pub source: Option<String>,
}

impl StageDefinition {
    pub fn new(stage: ShaderStage, entry_type: &str) -> Self {
        Self {
            stage,
            entry_type: Some(entry_type.to_string()),
            source: None,
        }
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryCategory {
    Source,
    Shader,
    Disassembly,
}

impl EntryCategory {
    fn prefix(self) -> &'static str {
        match self {
            EntryCategory::Source => "Source",
            EntryCategory::Shader => "Shader",
            EntryCategory::Disassembly => "SpirV",
        }
    }
}

/// A named piece of output, e.g. `ShaderPixel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationEntry {
    pub name: String,
    pub category: EntryCategory,
    pub value: String,
}

impl TranslationEntry {
    fn new(category: EntryCategory, stage: ShaderStage, value: String) -> Self {
        Self {
            name: format!("{}{}", category.prefix(), stage.name()),
            category,
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageTranslation {
    pub stage: ShaderStage,
    pub source: Option<String>,
    /// The pipeline run, or why the stage could not be run at all.
    pub results: Result<PipelineResults, PipelineError>,
}

/// Runs the pipeline for a single stage, `None` if it has no entry type.
pub fn compile_stage(
    library: &ShaderLibrary,
    definition: &StageDefinition,
    description: &PipelineDescription,
) -> Result<Option<PipelineResults>, PipelineError> {
    let Some(name) = &definition.entry_type else {
        debug!("skipping {:?}, no entry type", definition.stage);
        return Ok(None);
    };

    let entry = library
        .find_type(name)
        .ok_or_else(|| PipelineError::UnresolvedEntryType(Some(name.clone())))?;
    compile_pipeline(library, Some(entry), description).map(Some)
}

/// Translates every stage that has an entry type, in stage order.
///
/// A stage that fails keeps its error, the remaining stages still run.
#[instrument(level = "debug", skip_all)]
pub fn compile_stages(
    library: &ShaderLibrary,
    stages: &[StageDefinition],
    description: &PipelineDescription,
) -> Vec<StageTranslation> {
    let mut translations = Vec::new();

    for definition in stages.iter().sorted_by_key(|definition| definition.stage) {
        let results = match compile_stage(library, definition, description) {
            Ok(Some(results)) => Ok(results),
            Ok(None) => continue,
            Err(err) => {
                error!("{:?} stage failed: {err}", definition.stage);
                Err(err)
            }
        };
        translations.push(StageTranslation {
            stage: definition.stage,
            source: definition.source.clone(),
            results,
        });
    }

    translations
}

/// Lists every source first, then every backend output, then every disassembly.
pub fn group_entries(translations: &[StageTranslation]) -> Vec<TranslationEntry> {
    let sources = translations.iter().filter_map(|translation| {
        let source = translation.source.clone()?;
        Some(TranslationEntry::new(
            EntryCategory::Source,
            translation.stage,
            source,
        ))
    });

    let shaders = translations.iter().map(|translation| {
        let value = match &translation.results {
            Ok(results) => match results.final_output() {
                Some(output) => output.artifact.to_string(),
                None => results.failures.iter().join("\n"),
            },
            Err(err) => err.to_string(),
        };
        TranslationEntry::new(EntryCategory::Shader, translation.stage, value)
    });

    let disassembly = translations.iter().filter_map(|translation| {
        let output = translation.results.as_ref().ok()?.debug.first()?;
        Some(TranslationEntry::new(
            EntryCategory::Disassembly,
            translation.stage,
            output.artifact.to_string(),
        ))
    });

    sources.chain(shaders).chain(disassembly).collect()
}

pub fn translate_stages(
    library: &ShaderLibrary,
    stages: &[StageDefinition],
    description: &PipelineDescription,
) -> Vec<TranslationEntry> {
    group_entries(&compile_stages(library, stages, description))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_sort_in_presentation_order() {
        let mut stages = vec![ShaderStage::Compute, ShaderStage::Pixel, ShaderStage::Vertex];
        stages.sort();
        assert_eq!(
            stages,
            vec![ShaderStage::Vertex, ShaderStage::Pixel, ShaderStage::Compute]
        );
    }

    #[test]
    fn entry_names() {
        let entry = TranslationEntry::new(
            EntryCategory::Disassembly,
            ShaderStage::Pixel,
            String::new(),
        );
        assert_eq!(entry.name, "SpirVPixel");
        assert_eq!(ShaderStage::Pixel.execution_model(), ExecutionModel::Fragment);
    }
}
