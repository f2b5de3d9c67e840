use std::collections::HashMap;

use rspirv::spirv::{self, ExecutionModel, StorageClass};
use tracing::{debug, trace};

use crate::collect::DependencyClosure;
use crate::ir::{FnIndex, IrRef, Literal, OpIndex, ShaderLibrary, TypeIndex, TypeKind};

use super::{
    errors::EmitError,
    writer::{ByteStreamWriter, pack_string},
};

/// Emission context of a single translation unit.
#[derive(Debug)]
pub(crate) struct CodegenCtx<'a> {
    /// The IR library.
    pub library: &'a ShaderLibrary,
    /// What has to be emitted.
    pub closure: &'a DependencyClosure,
    /// Result ids, assigned the first time a node is referenced.
    ids: HashMap<IrRef, u32>,
    next_id: u32,
    writer: ByteStreamWriter,
}

impl<'a> CodegenCtx<'a> {
    pub fn new(library: &'a ShaderLibrary, closure: &'a DependencyClosure) -> Self {
        Self {
            library,
            closure,
            ids: HashMap::new(),
            next_id: 1,
            writer: ByteStreamWriter::new(),
        }
    }

    fn id_of(&mut self, node: IrRef) -> u32 {
        if let Some(id) = self.ids.get(&node) {
            return *id;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(node, id);
        id
    }

    /// The id bound of the module, one past the largest id handed out so far.
    pub fn id_bound(&self) -> u32 {
        self.next_id
    }

    /// Returns the words of the module, with the id bound patched in.
    pub fn finish(mut self) -> Vec<u32> {
        let bound = self.id_bound();
        self.writer.set_id_bound(bound);
        self.writer.finish()
    }

    /// Appends the encoding of an argument, literals are written inline.
    fn push_operand(&mut self, arg: IrRef, operands: &mut Vec<u32>) {
        match arg {
            IrRef::Literal(idx) => match &self.library.literals[idx] {
                Literal::Int(value) => operands.push(*value),
                Literal::Float(value) => operands.push(value.to_bits()),
                Literal::String(value) => operands.extend(pack_string(value)),
            },
            node => operands.push(self.id_of(node)),
        }
    }

    fn type_operand(
        &mut self,
        node: TypeIndex,
        operand: Option<TypeIndex>,
        what: &'static str,
    ) -> Result<u32, EmitError> {
        match operand {
            Some(ty) => Ok(self.id_of(IrRef::Type(ty))),
            None => Err(EmitError::MissingOperand {
                node: self.library.types[node].name.clone(),
                operand: what,
            }),
        }
    }
}

/// Emits the whole module, section by section.
pub(crate) fn compile_module(ctx: &mut CodegenCtx) -> Result<(), EmitError> {
    let library = ctx.library;
    let closure = ctx.closure;

    for capability in &closure.capabilities {
        ctx.writer
            .write_instruction(spirv::Op::Capability, &[*capability as u32])?;
    }

    for import in &closure.referenced_imports {
        let mut operands = vec![ctx.id_of(IrRef::Import(*import))];
        operands.extend(pack_string(&library.imports[*import].name));
        ctx.writer
            .write_instruction(spirv::Op::ExtInstImport, &operands)?;
    }

    ctx.writer.write_instruction(
        spirv::Op::MemoryModel,
        &[
            spirv::AddressingModel::Logical as u32,
            spirv::MemoryModel::GLSL450 as u32,
        ],
    )?;

    compile_entry_points(ctx)?;
    compile_debug_names(ctx)?;
    compile_decorations(ctx)?;

    for node in &closure.types_constants_and_globals {
        match node {
            IrRef::Type(idx) => compile_type(ctx, *idx)?,
            IrRef::Op(idx) => compile_op(ctx, *idx)?,
            _ => {}
        }
    }

    for function in &closure.referenced_functions {
        compile_function(ctx, *function)?;
    }

    debug!("emitted module with id bound {}", ctx.id_bound());
    Ok(())
}

fn compile_entry_points(ctx: &mut CodegenCtx) -> Result<(), EmitError> {
    let library = ctx.library;
    let closure = ctx.closure;

    // Under SPIR-V 1.0 the interface lists the Input and Output variables.
    let mut interface = Vec::new();
    for global in &closure.referenced_globals {
        let storage_class = library.storage_class_of(&library.ops[*global]);
        if matches!(
            storage_class,
            Some(StorageClass::Input | StorageClass::Output)
        ) {
            interface.push(ctx.id_of(IrRef::Op(*global)));
        }
    }

    let mut modes = Vec::new();
    for idx in &closure.referenced_functions {
        let function = &library.functions[*idx];
        let Some(model) = function.execution_model else {
            continue;
        };
        trace!("entry point {:?} ({:?})", function.name, model);

        let fn_id = ctx.id_of(IrRef::Function(*idx));
        let mut operands = vec![model as u32, fn_id];
        operands.extend(pack_string(&function.name));
        operands.extend_from_slice(&interface);
        ctx.writer
            .write_instruction(spirv::Op::EntryPoint, &operands)?;

        match model {
            ExecutionModel::Fragment => {
                modes.push(vec![fn_id, spirv::ExecutionMode::OriginUpperLeft as u32]);
            }
            ExecutionModel::GLCompute => {
                modes.push(vec![fn_id, spirv::ExecutionMode::LocalSize as u32, 1, 1, 1]);
            }
            _ => {}
        }
    }

    for mode in modes {
        ctx.writer
            .write_instruction(spirv::Op::ExecutionMode, &mode)?;
    }
    Ok(())
}

fn compile_debug_names(ctx: &mut CodegenCtx) -> Result<(), EmitError> {
    let library = ctx.library;
    let closure = ctx.closure;

    for node in &closure.types_constants_and_globals {
        let name = match node {
            IrRef::Type(idx) if library.types[*idx].kind == TypeKind::Struct => {
                &library.types[*idx].name
            }
            IrRef::Op(idx) => match &library.ops[*idx].debug_name {
                Some(name) => name,
                None => continue,
            },
            _ => continue,
        };
        write_name(ctx, *node, name)?;
    }

    for idx in &closure.referenced_functions {
        write_name(ctx, IrRef::Function(*idx), &library.functions[*idx].name)?;
    }
    Ok(())
}

fn write_name(ctx: &mut CodegenCtx, node: IrRef, name: &str) -> Result<(), EmitError> {
    let mut operands = vec![ctx.id_of(node)];
    operands.extend(pack_string(name));
    ctx.writer.write_instruction(spirv::Op::Name, &operands)
}

/// Decorations of module scope declarations.
fn compile_decorations(ctx: &mut CodegenCtx) -> Result<(), EmitError> {
    let library = ctx.library;
    let closure = ctx.closure;

    for node in &closure.types_constants_and_globals {
        let IrRef::Op(idx) = node else {
            continue;
        };

        for decoration in &library.ops[*idx].decorations {
            let mut operands = vec![ctx.id_of(*node), decoration.kind as u32];
            operands.extend_from_slice(&decoration.literals);
            ctx.writer
                .write_instruction(spirv::Op::Decorate, &operands)?;
        }
    }
    Ok(())
}

fn compile_type(ctx: &mut CodegenCtx, idx: TypeIndex) -> Result<(), EmitError> {
    let library = ctx.library;
    let ty = &library.types[idx];
    let id = ctx.id_of(IrRef::Type(idx));

    let (opcode, operands) = match ty.kind {
        TypeKind::Void => (spirv::Op::TypeVoid, vec![id]),
        TypeKind::Bool => (spirv::Op::TypeBool, vec![id]),
        TypeKind::Int { width, signed } => (spirv::Op::TypeInt, vec![id, width, signed as u32]),
        TypeKind::Float { width } => (spirv::Op::TypeFloat, vec![id, width]),
        TypeKind::Vector { count } => {
            let component = ctx.type_operand(idx, ty.component_type, "component type")?;
            (spirv::Op::TypeVector, vec![id, component, count])
        }
        TypeKind::Matrix { columns } => {
            let column = ctx.type_operand(idx, ty.component_type, "column type")?;
            (spirv::Op::TypeMatrix, vec![id, column, columns])
        }
        TypeKind::Array => {
            let element = ctx.type_operand(idx, ty.component_type, "element type")?;
            let length = ty.parameters.first().ok_or_else(|| EmitError::MissingOperand {
                node: ty.name.clone(),
                operand: "length",
            })?;
            let mut operands = vec![id, element];
            ctx.push_operand(*length, &mut operands);
            (spirv::Op::TypeArray, operands)
        }
        TypeKind::RuntimeArray => {
            let element = ctx.type_operand(idx, ty.component_type, "element type")?;
            (spirv::Op::TypeRuntimeArray, vec![id, element])
        }
        TypeKind::Struct => {
            let mut operands = vec![id];
            for member in &ty.parameters {
                ctx.push_operand(*member, &mut operands);
            }
            (spirv::Op::TypeStruct, operands)
        }
        TypeKind::Pointer { storage_class } => {
            let pointee = ctx.type_operand(idx, ty.dereference_type, "pointee type")?;
            (spirv::Op::TypePointer, vec![id, storage_class as u32, pointee])
        }
        TypeKind::Function => {
            let return_type = ctx.type_operand(idx, ty.component_type, "return type")?;
            let mut operands = vec![id, return_type];
            for param in &ty.parameters {
                ctx.push_operand(*param, &mut operands);
            }
            (spirv::Op::TypeFunction, operands)
        }
        TypeKind::Image {
            dim,
            depth,
            arrayed,
            multisampled,
            sampled,
        } => {
            let sampled_type = ctx.type_operand(idx, ty.component_type, "sampled type")?;
            (
                spirv::Op::TypeImage,
                vec![
                    id,
                    sampled_type,
                    dim as u32,
                    depth,
                    arrayed as u32,
                    multisampled as u32,
                    sampled,
                    spirv::ImageFormat::Unknown as u32,
                ],
            )
        }
        TypeKind::SampledImage => {
            let image = ctx.type_operand(idx, ty.component_type, "image type")?;
            (spirv::Op::TypeSampledImage, vec![id, image])
        }
        TypeKind::Sampler => (spirv::Op::TypeSampler, vec![id]),
    };

    ctx.writer.write_instruction(opcode, &operands)
}

/// Emits an instruction: result type and result id when it has a result, then its arguments.
fn compile_op(ctx: &mut CodegenCtx, idx: OpIndex) -> Result<(), EmitError> {
    let library = ctx.library;
    let op = &library.ops[idx];

    let mut operands = Vec::with_capacity(op.arguments.len() + 2);
    if let Some(result_type) = op.result_type {
        operands.push(ctx.id_of(IrRef::Type(result_type)));
        operands.push(ctx.id_of(IrRef::Op(idx)));
    }
    for arg in &op.arguments {
        ctx.push_operand(*arg, &mut operands);
    }

    ctx.writer.write_instruction(op.opcode, &operands)
}

fn compile_function(ctx: &mut CodegenCtx, idx: FnIndex) -> Result<(), EmitError> {
    let library = ctx.library;
    let function = &library.functions[idx];
    let function_type = &library.types[function.function_type];
    debug!("compiling function {:?}", function.name);

    let return_type = ctx.type_operand(
        function.function_type,
        function_type.component_type,
        "return type",
    )?;
    let operands = [
        return_type,
        ctx.id_of(IrRef::Function(idx)),
        spirv::FunctionControl::NONE.bits(),
        ctx.id_of(IrRef::Type(function.function_type)),
    ];
    ctx.writer.write_instruction(spirv::Op::Function, &operands)?;

    for param in &library.blocks[function.parameter_block].lines {
        compile_op(ctx, *param)?;
    }

    for block_idx in &function.blocks {
        let block = &library.blocks[*block_idx];
        let label = ctx.id_of(IrRef::Block(*block_idx));
        ctx.writer.write_instruction(spirv::Op::Label, &[label])?;

        for variable in &block.local_variables {
            compile_op(ctx, *variable)?;
        }
        for line in &block.lines {
            compile_op(ctx, *line)?;
        }
    }

    ctx.writer.write_instruction(spirv::Op::FunctionEnd, &[])
}
