use std::fmt;

use educe::Educe;
use itertools::Itertools;
use serde::Serialize;

/// The kind of data a translation pass consumes or produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Binary,
    Text,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Binary => f.write_str("binary"),
            ArtifactKind::Text => f.write_str("text"),
        }
    }
}

/// A SPIR-V word stream plus the reflection data gathered while emitting it.
#[derive(Clone, PartialEq, Educe)]
#[educe(Debug)]
pub struct BinaryArtifact {
    #[educe(Debug(method(debug_word_count)))]
    pub words: Vec<u32>,
    pub reflection: ShaderStageReflection,
}

#[allow(clippy::ptr_arg)]
fn debug_word_count(words: &Vec<u32>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[{} words]", words.len())
}

/// The result of a translation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Binary(BinaryArtifact),
    Text(String),
}

impl Artifact {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::Binary(_) => ArtifactKind::Binary,
            Artifact::Text(_) => ArtifactKind::Text,
        }
    }

    pub fn as_binary(&self) -> Option<&BinaryArtifact> {
        match self {
            Artifact::Binary(binary) => Some(binary),
            Artifact::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Artifact::Binary(_) => None,
            Artifact::Text(text) => Some(text),
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::Binary(binary) => {
                let dump = binary
                    .words
                    .chunks(8)
                    .map(|line| line.iter().map(|word| format!("{word:08x}")).join(" "))
                    .join("\n");
                f.write_str(&dump)
            }
            Artifact::Text(text) => f.write_str(text),
        }
    }
}

/// Reflection data of an emitted shader stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShaderStageReflection {
    pub id_bound: u32,
    pub capabilities: Vec<String>,
    pub extension_imports: Vec<String>,
    /// Functions that have to run as part of module initialization, in order.
    pub initializers: Vec<String>,
    pub entry_points: Vec<EntryPointReflection>,
    pub globals: Vec<GlobalReflection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryPointReflection {
    pub name: String,
    pub execution_model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalReflection {
    pub name: String,
    pub storage_class: String,
    pub type_name: String,
}
