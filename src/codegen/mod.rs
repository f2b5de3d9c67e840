//! Emission of shader translation units as SPIR-V binaries.

use compiler::CodegenCtx;
use tracing::{info, instrument};

use crate::collect::DependencyCollector;
use crate::ir::{IrRef, ShaderLibrary, TypeIndex};
use crate::pass::BinaryArtifact;

pub use errors::EmitError;

mod compiler;
pub mod errors;
mod reflection;
mod writer;

/// The initial pass of every pipeline: turns an entry type and everything it depends on
/// into a binary module.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpirvBinaryBackend;

impl SpirvBinaryBackend {
    pub const NAME: &'static str = "spirv-binary";

    /// Collects the dependencies of `entry` and emits them.
    #[instrument(level = "debug", skip_all, fields(entry = ?entry))]
    pub fn translate_type(
        &self,
        library: &ShaderLibrary,
        entry: TypeIndex,
    ) -> Result<BinaryArtifact, EmitError> {
        let mut collector = DependencyCollector::new(library);
        collector.collect(IrRef::Type(entry));
        let closure = collector.into_closure();

        let mut ctx = CodegenCtx::new(library, &closure);
        compiler::compile_module(&mut ctx)?;
        let id_bound = ctx.id_bound();
        let words = ctx.finish();

        info!(
            "emitted {:?}: {} words, {} types/constants/globals, {} functions",
            library.types[entry].name,
            words.len(),
            closure.types_constants_and_globals.len(),
            closure.referenced_functions.len()
        );

        Ok(BinaryArtifact {
            words,
            reflection: reflection::reflect(library, &closure, id_bound),
        })
    }
}
