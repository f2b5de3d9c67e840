use std::collections::HashMap;

use educe::Educe;
use rspirv::spirv::{self, Capability, ExecutionModel, StorageClass};
use typed_generational_arena::{SmallSlab, SmallSlabIndex};

pub mod builder;

pub use builder::LibraryBuilder;

pub type TypeIndex = SmallSlabIndex<Type>;
pub type FnIndex = SmallSlabIndex<Function>;
pub type BlockIndex = SmallSlabIndex<BasicBlock>;
pub type OpIndex = SmallSlabIndex<Op>;
pub type LiteralIndex = SmallSlabIndex<Literal>;
pub type ImportIndex = SmallSlabIndex<ExtensionImport>;

pub type Types = SmallSlab<Type>;
pub type Functions = SmallSlab<Function>;
pub type Blocks = SmallSlab<BasicBlock>;
pub type Ops = SmallSlab<Op>;
pub type Literals = SmallSlab<Literal>;
pub type Imports = SmallSlab<ExtensionImport>;

/// A reference to any node of the shader IR graph.
///
/// Arguments of instructions and parameters of types are stored as node references,
/// the index doubles as the identity of the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrRef {
    Type(TypeIndex),
    Function(FnIndex),
    /// Blocks only appear as arguments when they are branch targets.
    Block(BlockIndex),
    Op(OpIndex),
    Literal(LiteralIndex),
    Import(ImportIndex),
}

impl From<TypeIndex> for IrRef {
    fn from(value: TypeIndex) -> Self {
        IrRef::Type(value)
    }
}

impl From<FnIndex> for IrRef {
    fn from(value: FnIndex) -> Self {
        IrRef::Function(value)
    }
}

impl From<BlockIndex> for IrRef {
    fn from(value: BlockIndex) -> Self {
        IrRef::Block(value)
    }
}

impl From<OpIndex> for IrRef {
    fn from(value: OpIndex) -> Self {
        IrRef::Op(value)
    }
}

impl From<LiteralIndex> for IrRef {
    fn from(value: LiteralIndex) -> Self {
        IrRef::Literal(value)
    }
}

impl From<ImportIndex> for IrRef {
    fn from(value: ImportIndex) -> Self {
        IrRef::Import(value)
    }
}

/// Holds a translated shader library: every node produced by the front end for
/// a set of shader fragments, plus the side tables needed by the backends.
///
/// The library is read-only once built, so several stages can be translated from it
/// at the same time.
#[derive(Debug, Clone, Default)]
pub struct ShaderLibrary {
    pub types: Types,
    pub functions: Functions,
    pub blocks: Blocks,
    pub ops: Ops,
    pub literals: Literals,
    pub imports: Imports,
    /// Named types, used to find the entry type of a stage.
    pub type_names: HashMap<String, TypeIndex>,
    /// Global variable declarations and their initializers.
    pub global_variables: HashMap<OpIndex, GlobalVariableData>,
}

impl ShaderLibrary {
    pub fn find_type(&self, name: &str) -> Option<TypeIndex> {
        self.type_names.get(name).copied()
    }

    pub fn find_global_variable(&self, op: OpIndex) -> Option<&GlobalVariableData> {
        self.global_variables.get(&op)
    }

    /// Returns the storage class of a `OpVariable`, read from its first argument.
    ///
    /// None if the op isn't a variable or the argument isn't a storage class literal.
    pub fn storage_class_of(&self, op: &Op) -> Option<StorageClass> {
        if op.opcode != spirv::Op::Variable {
            return None;
        }

        match op.arguments.first()? {
            IrRef::Literal(idx) => match &self.literals[*idx] {
                Literal::Int(value) => StorageClass::from_u32(*value),
                _ => None,
            },
            _ => None,
        }
    }

    /// A short name for a node, used in logs and reflection.
    pub fn display_name(&self, node: IrRef) -> String {
        match node {
            IrRef::Type(idx) => self.types[idx].name.clone(),
            IrRef::Function(idx) => self.functions[idx].name.clone(),
            IrRef::Block(idx) => format!("block{}", idx.to_idx()),
            IrRef::Op(idx) => {
                let op = &self.ops[idx];
                match &op.debug_name {
                    Some(name) => name.clone(),
                    None => format!("{:?}#{}", op.opcode, idx.to_idx()),
                }
            }
            IrRef::Literal(idx) => self.literals[idx].to_string(),
            IrRef::Import(idx) => self.imports[idx].name.clone(),
        }
    }
}

/// A shader type.
///
/// Equality and hashing only look at the structure of the type,
/// which is what the builder uses to intern them.
#[derive(Debug, Clone, Educe)]
#[educe(PartialEq, Eq, Hash)]
pub struct Type {
    #[educe(PartialEq(ignore), Hash(ignore))]
    pub name: String,
    pub kind: TypeKind,
    /// The pointed-to type, set on pointer types.
    pub dereference_type: Option<TypeIndex>,
    /// Element of vectors, matrices and arrays, return type of function types,
    /// sampled type of images and image of sampled images.
    pub component_type: Option<TypeIndex>,
    /// Struct members, function type parameters, array length constant.
    pub parameters: Vec<IrRef>,
    /// The pointer variant of this type, once it has been materialized.
    #[educe(PartialEq(ignore), Hash(ignore))]
    pub pointer_type: Option<TypeIndex>,
    /// Functions owned by this type, e.g. the methods of a shader fragment.
    #[educe(PartialEq(ignore), Hash(ignore))]
    pub functions: Vec<FnIndex>,
}

impl Type {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            dereference_type: None,
            component_type: None,
            parameters: Vec::new(),
            pointer_type: None,
            functions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Void,
    Bool,
    Int { width: u32, signed: bool },
    Float { width: u32 },
    Vector { count: u32 },
    Matrix { columns: u32 },
    Array,
    RuntimeArray,
    /// Struct types are nominal, two structs with the same members are different types.
    Struct,
    Pointer { storage_class: StorageClass },
    Function,
    Image {
        dim: spirv::Dim,
        depth: u32,
        arrayed: bool,
        multisampled: bool,
        sampled: u32,
    },
    SampledImage,
    Sampler,
}

/// A shader function.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub function_type: TypeIndex,
    /// Holds the `OpFunctionParameter` instructions.
    pub parameter_block: BlockIndex,
    /// The entry block goes first.
    pub blocks: Vec<BlockIndex>,
    /// Set when this function is the entry point of a shader stage.
    pub execution_model: Option<ExecutionModel>,
}

#[derive(Debug, Clone, Default)]
pub struct BasicBlock {
    pub lines: Vec<OpIndex>,
    pub local_variables: Vec<OpIndex>,
}

/// An instruction.
#[derive(Debug, Clone)]
pub struct Op {
    pub opcode: spirv::Op,
    pub result_type: Option<TypeIndex>,
    pub arguments: Vec<IrRef>,
    pub debug_name: Option<String>,
    pub decorations: Vec<Decoration>,
}

impl Op {
    pub fn new(opcode: spirv::Op, result_type: Option<TypeIndex>, arguments: Vec<IrRef>) -> Self {
        Self {
            opcode,
            result_type,
            arguments,
            debug_name: None,
            decorations: Vec::new(),
        }
    }

    /// Whether this instruction declares a constant value.
    pub fn is_constant(&self) -> bool {
        matches!(
            self.opcode,
            spirv::Op::Constant
                | spirv::Op::ConstantComposite
                | spirv::Op::SpecConstant
                | spirv::Op::SpecConstantComposite
                | spirv::Op::ConstantTrue
                | spirv::Op::ConstantFalse
                | spirv::Op::ConstantNull
                | spirv::Op::SpecConstantTrue
                | spirv::Op::SpecConstantFalse
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    pub kind: spirv::Decoration,
    pub literals: Vec<u32>,
}

/// Literal operands: storage classes, constant values, strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(u32),
    Float(f32),
    String(String),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Int(value) => write!(f, "{value}"),
            Literal::Float(value) => write!(f, "{value:?}"),
            Literal::String(value) => write!(f, "{value:?}"),
        }
    }
}

/// An extended instruction set import, e.g. `GLSL.std.450`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtensionImport {
    pub name: String,
}

/// Information about a global variable owned by the library that declared it.
#[derive(Debug, Clone, Default)]
pub struct GlobalVariableData {
    /// Function that computes the initial value of the variable, run at module initialization.
    pub initializer: Option<FnIndex>,
}

/// Storage classes whose variables live at module scope.
pub fn is_global_storage_class(storage_class: StorageClass) -> bool {
    matches!(
        storage_class,
        StorageClass::Uniform
            | StorageClass::UniformConstant
            | StorageClass::StorageBuffer
            | StorageClass::Input
            | StorageClass::Output
            | StorageClass::Private
    )
}

/// The capability an opcode requires beyond `Shader`, if any.
pub fn required_capability(opcode: spirv::Op) -> Option<Capability> {
    match opcode {
        spirv::Op::ImageQuerySize
        | spirv::Op::ImageQuerySizeLod
        | spirv::Op::ImageQueryLod
        | spirv::Op::ImageQueryLevels => Some(Capability::ImageQuery),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_storage_classes() {
        assert!(is_global_storage_class(StorageClass::Output));
        assert!(is_global_storage_class(StorageClass::UniformConstant));
        assert!(is_global_storage_class(StorageClass::Private));
        assert!(!is_global_storage_class(StorageClass::Function));
        assert!(!is_global_storage_class(StorageClass::Workgroup));
    }

    #[test]
    fn image_queries_require_capability() {
        assert_eq!(
            required_capability(spirv::Op::ImageQueryLevels),
            Some(Capability::ImageQuery)
        );
        assert_eq!(required_capability(spirv::Op::FAdd), None);
    }
}
