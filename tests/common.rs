use rspirv::spirv::{self, ExecutionModel, StorageClass};
use shaderir::ir::{FnIndex, LibraryBuilder, Literal, OpIndex, ShaderLibrary, TypeIndex};
use shaderir::pass::{Artifact, ArtifactKind, PassError, TranslationPass};

/// The library of the end to end scenario:
/// `main` loads the `Output` global, whose initializer `initOutput` stores `0.0` in it.
#[allow(unused)]
#[derive(Debug)]
pub struct EndToEnd {
    pub library: ShaderLibrary,
    pub entry: TypeIndex,
    pub main: FnIndex,
    pub init_output: FnIndex,
    pub output: OpIndex,
    pub zero: OpIndex,
}

#[allow(unused)]
pub fn end_to_end_library() -> EndToEnd {
    let mut builder = LibraryBuilder::new();
    let void = builder.void_type();
    let f32_ty = builder.float_type(32);
    let fn_ty = builder.function_type(void, &[]);
    let output_ptr = builder.pointer_type(f32_ty, StorageClass::Output);
    let zero = builder.constant(f32_ty, Literal::Float(0.0));

    let init_output = builder.function(None, "initOutput", fn_ty);
    let output = builder.global_variable("Output", output_ptr, Some(init_output));
    let block = builder.append_block(init_output);
    builder.push_op(block, spirv::Op::Store, None, vec![output.into(), zero.into()]);
    builder.push_op(block, spirv::Op::Return, None, Vec::new());

    let entry = builder.struct_type("EndToEnd", &[f32_ty]);
    let main = builder.function(Some(entry), "main", fn_ty);
    builder.set_execution_model(main, ExecutionModel::Vertex);
    let block = builder.append_block(main);
    builder.push_op(block, spirv::Op::Load, Some(f32_ty), vec![output.into()]);
    builder.push_op(block, spirv::Op::Return, None, Vec::new());

    EndToEnd {
        library: builder.finish(),
        entry,
        main,
        init_output,
        output,
        zero,
    }
}

/// A `Trivial` type owning an empty `void main() {}` fragment entry point.
#[allow(unused)]
pub fn trivial_library() -> (ShaderLibrary, TypeIndex) {
    let mut builder = LibraryBuilder::new();
    let void = builder.void_type();
    let f32_ty = builder.float_type(32);
    let fn_ty = builder.function_type(void, &[]);

    let entry = builder.struct_type("Trivial", &[f32_ty]);
    let main = builder.function(Some(entry), "main", fn_ty);
    builder.set_execution_model(main, ExecutionModel::Fragment);
    let block = builder.append_block(main);
    builder.push_op(block, spirv::Op::Return, None, Vec::new());

    (builder.finish(), entry)
}

/// Hands its input back unchanged.
#[allow(unused)]
#[derive(Debug)]
pub struct IdentityPass(pub &'static str);

impl TranslationPass for IdentityPass {
    fn name(&self) -> &str {
        self.0
    }

    fn output_kind(&self) -> ArtifactKind {
        ArtifactKind::Binary
    }

    fn run(&self, input: &Artifact) -> Result<Artifact, PassError> {
        Ok(input.clone())
    }
}

/// Describes a binary as `words: N`.
#[allow(unused)]
#[derive(Debug)]
pub struct WordCountPass(pub &'static str);

impl TranslationPass for WordCountPass {
    fn name(&self) -> &str {
        self.0
    }

    fn output_kind(&self) -> ArtifactKind {
        ArtifactKind::Text
    }

    fn run(&self, input: &Artifact) -> Result<Artifact, PassError> {
        let binary = shaderir::pass::expect_binary(self, input)?;
        Ok(Artifact::Text(format!("words: {}", binary.words.len())))
    }
}

/// Appends a suffix to a text artifact.
#[allow(unused)]
#[derive(Debug)]
pub struct SuffixPass(pub &'static str);

impl TranslationPass for SuffixPass {
    fn name(&self) -> &str {
        "suffix"
    }

    fn input_kind(&self) -> ArtifactKind {
        ArtifactKind::Text
    }

    fn output_kind(&self) -> ArtifactKind {
        ArtifactKind::Text
    }

    fn run(&self, input: &Artifact) -> Result<Artifact, PassError> {
        match input {
            Artifact::Text(text) => Ok(Artifact::Text(format!("{text}{}", self.0))),
            Artifact::Binary(_) => Err(PassError::UnexpectedArtifact {
                pass: self.name().to_string(),
                expected: ArtifactKind::Text,
                found: ArtifactKind::Binary,
            }),
        }
    }
}

/// Always fails.
#[allow(unused)]
#[derive(Debug)]
pub struct FailingPass {
    pub name: &'static str,
    pub output: ArtifactKind,
}

impl TranslationPass for FailingPass {
    fn name(&self) -> &str {
        self.name
    }

    fn output_kind(&self) -> ArtifactKind {
        self.output
    }

    fn run(&self, _input: &Artifact) -> Result<Artifact, PassError> {
        Err(PassError::Backend(format!("{} always fails", self.name)))
    }
}
