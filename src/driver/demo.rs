//! A small built-in shader library, translated when no library is given.

use rspirv::spirv::{self, BuiltIn, StorageClass};

use crate::ir::{LibraryBuilder, Literal, ShaderLibrary};
use crate::pass::PassId;
use crate::pipeline::{ShaderStage, StageDefinition};

use super::config::{PipelineConfig, PipelineSection};

const VERTEX_SOURCE: &str = "\
[Vertex]
struct DemoVertex
{
    [Output] var Position : Real4;
    [Static] var Scale : Real = 1.0;

    function Main()
    {
        this.Position = Real4(0.0, 0.0, 0.0, 1.0);
    }
}";

const PIXEL_SOURCE: &str = "\
[Pixel]
struct DemoPixel
{
    [Output] var Color : Real4;

    function Main()
    {
        this.Color = Math.Abs(Real4(1.0, -0.5, 0.25, 1.0));
    }
}";

pub fn demo_library() -> ShaderLibrary {
    let mut builder = LibraryBuilder::new();

    let void = builder.void_type();
    let f32_ty = builder.float_type(32);
    let vec4 = builder.vector_type(f32_ty, 4);
    let main_ty = builder.function_type(void, &[]);
    let output_vec4 = builder.pointer_type(vec4, StorageClass::Output);
    let private_f32 = builder.pointer_type(f32_ty, StorageClass::Private);

    let zero = builder.constant(f32_ty, Literal::Float(0.0));
    let one = builder.constant(f32_ty, Literal::Float(1.0));

    // Vertex stage.
    let vertex = builder.struct_type("DemoVertex", &[vec4, f32_ty]);

    let init_scale = builder.function(None, "initScale", main_ty);
    let block = builder.append_block(init_scale);
    let scale = builder.global_variable("scale", private_f32, Some(init_scale));
    builder.push_op(block, spirv::Op::Store, None, vec![scale.into(), one.into()]);
    builder.push_op(block, spirv::Op::Return, None, Vec::new());

    let position = builder.global_variable("position", output_vec4, None);
    builder.decorate(position, spirv::Decoration::BuiltIn, &[BuiltIn::Position as u32]);
    let origin = builder.constant_composite(vec4, &[zero, zero, zero, one]);

    let main = builder.function(Some(vertex), "main", main_ty);
    builder.set_execution_model(main, ShaderStage::Vertex.execution_model());
    let block = builder.append_block(main);
    builder.push_op(block, spirv::Op::Load, Some(f32_ty), vec![scale.into()]);
    builder.push_op(block, spirv::Op::Store, None, vec![position.into(), origin.into()]);
    builder.push_op(block, spirv::Op::Return, None, Vec::new());

    // Pixel stage.
    let pixel = builder.struct_type("DemoPixel", &[vec4]);
    let glsl = builder.extension_import("GLSL.std.450");

    let color = builder.global_variable("outColor", output_vec4, None);
    builder.decorate(color, spirv::Decoration::Location, &[0]);
    let half = builder.constant(f32_ty, Literal::Float(-0.5));
    let quarter = builder.constant(f32_ty, Literal::Float(0.25));
    let tint = builder.constant_composite(vec4, &[one, half, quarter, one]);

    let main = builder.function(Some(pixel), "main", main_ty);
    builder.set_execution_model(main, ShaderStage::Pixel.execution_model());
    let block = builder.append_block(main);
    let abs_op = builder.literal(Literal::Int(spirv::GLOp::FAbs as u32));
    let abs = builder.push_op(
        block,
        spirv::Op::ExtInst,
        Some(vec4),
        vec![glsl.into(), abs_op, tint.into()],
    );
    builder.push_op(block, spirv::Op::Store, None, vec![color.into(), abs.into()]);
    builder.push_op(block, spirv::Op::Return, None, Vec::new());

    builder.finish()
}

/// Every stage, the geometry and compute stages have no entry type and are skipped.
pub fn demo_stages() -> Vec<StageDefinition> {
    vec![
        StageDefinition::new(ShaderStage::Vertex, "DemoVertex").with_source(VERTEX_SOURCE),
        StageDefinition {
            stage: ShaderStage::Geometry,
            entry_type: None,
            source: None,
        },
        StageDefinition::new(ShaderStage::Pixel, "DemoPixel").with_source(PIXEL_SOURCE),
        StageDefinition {
            stage: ShaderStage::Compute,
            entry_type: None,
            source: None,
        },
    ]
}

pub fn demo_config() -> PipelineConfig {
    PipelineConfig {
        pipeline: PipelineSection {
            tool_passes: Vec::new(),
            debug_passes: vec![PassId::Disassembler],
            backend: Some(PassId::Wgsl),
        },
        stages: Vec::new(),
    }
}
