use std::collections::HashMap;

use itertools::Itertools;
use rspirv::spirv::{self, ExecutionModel, StorageClass};
use tracing::debug;

use super::{
    BasicBlock, BlockIndex, Decoration, ExtensionImport, FnIndex, Function, GlobalVariableData,
    ImportIndex, IrRef, Literal, Op, OpIndex, ShaderLibrary, Type, TypeIndex, TypeKind,
};

/// Context to help build a [`ShaderLibrary`].
///
/// Structural types are interned, so asking twice for a `vec4<f32>` yields the same index.
#[derive(Debug, Default)]
pub struct LibraryBuilder {
    pub library: ShaderLibrary,
    interned_types: HashMap<Type, TypeIndex>,
    imports_by_name: HashMap<String, ImportIndex>,
}

impl LibraryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continues building an existing library, reusing its structural types and imports.
    pub fn from_library(library: ShaderLibrary) -> Self {
        let interned_types = library
            .types
            .iter()
            .filter(|(_, ty)| ty.kind != TypeKind::Struct)
            .map(|(idx, ty)| (ty.clone(), idx))
            .collect();
        let imports_by_name = library
            .imports
            .iter()
            .map(|(idx, import)| (import.name.clone(), idx))
            .collect();

        Self {
            library,
            interned_types,
            imports_by_name,
        }
    }

    pub fn finish(self) -> ShaderLibrary {
        self.library
    }

    pub fn get_type(&self, idx: TypeIndex) -> &Type {
        &self.library.types[idx]
    }

    pub fn get_function(&self, idx: FnIndex) -> &Function {
        &self.library.functions[idx]
    }

    pub fn get_op(&self, idx: OpIndex) -> &Op {
        &self.library.ops[idx]
    }

    fn intern_type(&mut self, ty: Type) -> TypeIndex {
        if let Some(idx) = self.interned_types.get(&ty) {
            return *idx;
        }

        let idx = self.library.types.insert(ty.clone());
        self.interned_types.insert(ty, idx);
        idx
    }

    pub fn void_type(&mut self) -> TypeIndex {
        self.intern_type(Type::new("void", TypeKind::Void))
    }

    pub fn bool_type(&mut self) -> TypeIndex {
        self.intern_type(Type::new("bool", TypeKind::Bool))
    }

    pub fn int_type(&mut self, width: u32, signed: bool) -> TypeIndex {
        let name = format!("{}{width}", if signed { "i" } else { "u" });
        self.intern_type(Type::new(name, TypeKind::Int { width, signed }))
    }

    pub fn float_type(&mut self, width: u32) -> TypeIndex {
        self.intern_type(Type::new(format!("f{width}"), TypeKind::Float { width }))
    }

    pub fn vector_type(&mut self, component: TypeIndex, count: u32) -> TypeIndex {
        let name = format!("vec{count}<{}>", self.get_type(component).name);
        let mut ty = Type::new(name, TypeKind::Vector { count });
        ty.component_type = Some(component);
        self.intern_type(ty)
    }

    pub fn matrix_type(&mut self, column: TypeIndex, columns: u32) -> TypeIndex {
        let name = format!("mat{columns}<{}>", self.get_type(column).name);
        let mut ty = Type::new(name, TypeKind::Matrix { columns });
        ty.component_type = Some(column);
        self.intern_type(ty)
    }

    /// An array type, `length` must be an integer constant.
    pub fn array_type(&mut self, element: TypeIndex, length: OpIndex) -> TypeIndex {
        let name = format!("array<{}>", self.get_type(element).name);
        let mut ty = Type::new(name, TypeKind::Array);
        ty.component_type = Some(element);
        ty.parameters.push(IrRef::Op(length));
        self.intern_type(ty)
    }

    pub fn runtime_array_type(&mut self, element: TypeIndex) -> TypeIndex {
        let name = format!("array<{}>", self.get_type(element).name);
        let mut ty = Type::new(name, TypeKind::RuntimeArray);
        ty.component_type = Some(element);
        self.intern_type(ty)
    }

    /// Declares a new named struct, registered so it can be found by name.
    pub fn struct_type(&mut self, name: &str, members: &[TypeIndex]) -> TypeIndex {
        let mut ty = Type::new(name, TypeKind::Struct);
        ty.parameters = members.iter().copied().map(IrRef::Type).collect();
        let idx = self.library.types.insert(ty);
        self.library.type_names.insert(name.to_string(), idx);
        debug!("declared struct type {name:?}");
        idx
    }

    /// Returns the pointer to `base` in the given storage class.
    ///
    /// The first pointer materialized for a type becomes its `pointer_type`.
    pub fn pointer_type(&mut self, base: TypeIndex, storage_class: StorageClass) -> TypeIndex {
        let name = format!("ptr<{:?}, {}>", storage_class, self.get_type(base).name);
        let mut ty = Type::new(name, TypeKind::Pointer { storage_class });
        ty.dereference_type = Some(base);
        let idx = self.intern_type(ty);

        let base_ty = &mut self.library.types[base];
        if base_ty.pointer_type.is_none() {
            base_ty.pointer_type = Some(idx);
        }
        idx
    }

    pub fn function_type(&mut self, return_type: TypeIndex, params: &[TypeIndex]) -> TypeIndex {
        let name = format!(
            "fn({}) -> {}",
            params
                .iter()
                .map(|p| self.get_type(*p).name.as_str())
                .join(", "),
            self.get_type(return_type).name
        );
        let mut ty = Type::new(name, TypeKind::Function);
        ty.component_type = Some(return_type);
        ty.parameters = params.iter().copied().map(IrRef::Type).collect();
        self.intern_type(ty)
    }

    pub fn image_type(&mut self, sampled_type: TypeIndex, dim: spirv::Dim) -> TypeIndex {
        let name = format!("image{:?}<{}>", dim, self.get_type(sampled_type).name);
        let mut ty = Type::new(
            name,
            TypeKind::Image {
                dim,
                depth: 0,
                arrayed: false,
                multisampled: false,
                sampled: 1,
            },
        );
        ty.component_type = Some(sampled_type);
        self.intern_type(ty)
    }

    pub fn sampled_image_type(&mut self, image: TypeIndex) -> TypeIndex {
        let name = format!("sampled<{}>", self.get_type(image).name);
        let mut ty = Type::new(name, TypeKind::SampledImage);
        ty.component_type = Some(image);
        self.intern_type(ty)
    }

    pub fn sampler_type(&mut self) -> TypeIndex {
        self.intern_type(Type::new("sampler", TypeKind::Sampler))
    }

    pub fn literal(&mut self, literal: Literal) -> IrRef {
        IrRef::Literal(self.library.literals.insert(literal))
    }

    pub fn extension_import(&mut self, name: &str) -> ImportIndex {
        if let Some(idx) = self.imports_by_name.get(name) {
            return *idx;
        }

        let idx = self.library.imports.insert(ExtensionImport {
            name: name.to_string(),
        });
        self.imports_by_name.insert(name.to_string(), idx);
        idx
    }

    /// Adds a free-standing instruction (constants, globals), not placed in any block.
    pub fn op(
        &mut self,
        opcode: spirv::Op,
        result_type: Option<TypeIndex>,
        arguments: Vec<IrRef>,
    ) -> OpIndex {
        self.library.ops.insert(Op::new(opcode, result_type, arguments))
    }

    pub fn constant(&mut self, ty: TypeIndex, value: Literal) -> OpIndex {
        let value = self.literal(value);
        self.op(spirv::Op::Constant, Some(ty), vec![value])
    }

    pub fn constant_composite(&mut self, ty: TypeIndex, constituents: &[OpIndex]) -> OpIndex {
        let args = constituents.iter().copied().map(IrRef::Op).collect();
        self.op(spirv::Op::ConstantComposite, Some(ty), args)
    }

    pub fn spec_constant(&mut self, ty: TypeIndex, default: Literal) -> OpIndex {
        let value = self.literal(default);
        self.op(spirv::Op::SpecConstant, Some(ty), vec![value])
    }

    /// Declares a module scope variable of the given pointer type.
    pub fn global_variable(
        &mut self,
        name: &str,
        pointer_ty: TypeIndex,
        initializer: Option<FnIndex>,
    ) -> OpIndex {
        let storage_class = match self.get_type(pointer_ty).kind {
            TypeKind::Pointer { storage_class } => storage_class,
            _ => StorageClass::Private,
        };
        let storage = self.literal(Literal::Int(storage_class as u32));
        let idx = self.op(spirv::Op::Variable, Some(pointer_ty), vec![storage]);
        self.library.ops[idx].debug_name = Some(name.to_string());
        self.library
            .global_variables
            .insert(idx, GlobalVariableData { initializer });
        debug!("declared global {name:?} in {storage_class:?}");
        idx
    }

    pub fn decorate(&mut self, op: OpIndex, kind: spirv::Decoration, literals: &[u32]) {
        self.library.ops[op].decorations.push(Decoration {
            kind,
            literals: literals.to_vec(),
        });
    }

    pub fn set_debug_name(&mut self, op: OpIndex, name: &str) {
        self.library.ops[op].debug_name = Some(name.to_string());
    }

    /// Declares a function, owned by `owner` when given.
    ///
    /// The function starts without blocks, see [`LibraryBuilder::append_block`].
    pub fn function(
        &mut self,
        owner: Option<TypeIndex>,
        name: &str,
        function_type: TypeIndex,
    ) -> FnIndex {
        let parameter_block = self.library.blocks.insert(BasicBlock::default());
        let idx = self.library.functions.insert(Function {
            name: name.to_string(),
            function_type,
            parameter_block,
            blocks: Vec::new(),
            execution_model: None,
        });

        if let Some(owner) = owner {
            self.library.types[owner].functions.push(idx);
        }
        idx
    }

    pub fn set_execution_model(&mut self, function: FnIndex, model: ExecutionModel) {
        self.library.functions[function].execution_model = Some(model);
    }

    pub fn function_parameter(&mut self, function: FnIndex, ty: TypeIndex) -> OpIndex {
        let idx = self.op(spirv::Op::FunctionParameter, Some(ty), Vec::new());
        let block = self.library.functions[function].parameter_block;
        self.library.blocks[block].lines.push(idx);
        idx
    }

    pub fn append_block(&mut self, function: FnIndex) -> BlockIndex {
        let idx = self.library.blocks.insert(BasicBlock::default());
        self.library.functions[function].blocks.push(idx);
        idx
    }

    /// Appends an instruction to the end of a block.
    pub fn push_op(
        &mut self,
        block: BlockIndex,
        opcode: spirv::Op,
        result_type: Option<TypeIndex>,
        arguments: Vec<IrRef>,
    ) -> OpIndex {
        let idx = self.op(opcode, result_type, arguments);
        self.library.blocks[block].lines.push(idx);
        idx
    }

    /// Declares a function scope variable in the given block.
    pub fn local_variable(&mut self, block: BlockIndex, pointer_ty: TypeIndex) -> OpIndex {
        let storage = self.literal(Literal::Int(StorageClass::Function as u32));
        let idx = self.op(spirv::Op::Variable, Some(pointer_ty), vec![storage]);
        self.library.blocks[block].local_variables.push(idx);
        idx
    }
}
