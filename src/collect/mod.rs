//! Collects everything a shader translation unit depends on.
//!
//! Starting from one or more roots, the collector walks the IR graph and records the types,
//! constants, globals, functions, capabilities and extension imports a backend has to emit.
//! Types, constants and globals are recorded in declare-before-use order.

use std::collections::HashSet;

use indexmap::IndexSet;
use rspirv::spirv::{self, Capability};
use tracing::{debug, instrument, trace};

use crate::ir::{
    BlockIndex, FnIndex, ImportIndex, IrRef, Op, OpIndex, ShaderLibrary, TypeIndex,
    is_global_storage_class, required_capability,
};

/// The dependency closure of a translation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyClosure {
    pub referenced_types: IndexSet<TypeIndex>,
    pub referenced_functions: IndexSet<FnIndex>,
    pub referenced_constants: IndexSet<OpIndex>,
    pub referenced_globals: IndexSet<OpIndex>,
    pub referenced_imports: IndexSet<ImportIndex>,
    /// Types, constants and globals in the order they have to be declared.
    pub types_constants_and_globals: IndexSet<IrRef>,
    pub capabilities: IndexSet<Capability>,
    /// Initializer functions of the referenced globals, in discovery order.
    pub global_initializers: Vec<FnIndex>,
}

impl Default for DependencyClosure {
    fn default() -> Self {
        let mut capabilities = IndexSet::new();
        capabilities.insert(Capability::Shader);

        Self {
            referenced_types: IndexSet::new(),
            referenced_functions: IndexSet::new(),
            referenced_constants: IndexSet::new(),
            referenced_globals: IndexSet::new(),
            referenced_imports: IndexSet::new(),
            types_constants_and_globals: IndexSet::new(),
            capabilities,
            global_initializers: Vec::new(),
        }
    }
}

/// Walks the IR graph of a library, scoped to a single translation unit.
#[derive(Debug)]
pub struct DependencyCollector<'a> {
    library: &'a ShaderLibrary,
    closure: DependencyClosure,
    /// Types whose dependencies are being walked, to break pointer cycles.
    types_in_progress: HashSet<TypeIndex>,
    visited_ops: HashSet<OpIndex>,
}

impl<'a> DependencyCollector<'a> {
    pub fn new(library: &'a ShaderLibrary) -> Self {
        Self {
            library,
            closure: DependencyClosure::default(),
            types_in_progress: HashSet::new(),
            visited_ops: HashSet::new(),
        }
    }

    pub fn closure(&self) -> &DependencyClosure {
        &self.closure
    }

    pub fn into_closure(self) -> DependencyClosure {
        self.closure
    }

    /// Adds the given node and everything it depends on to the closure.
    ///
    /// Passing `None` does nothing.
    #[instrument(level = "debug", skip_all, fields(root = tracing::field::Empty))]
    pub fn collect(&mut self, root: impl Into<Option<IrRef>>) {
        let Some(root) = root.into() else {
            return;
        };
        let name = self.library.display_name(root);
        tracing::Span::current().record("root", name.as_str());

        self.collect_node(root);
    }

    fn collect_node(&mut self, node: IrRef) {
        match node {
            IrRef::Type(idx) => self.collect_type(idx),
            IrRef::Function(idx) => self.collect_function(idx),
            IrRef::Block(idx) => self.collect_block(idx),
            IrRef::Op(idx) => self.collect_op(idx),
            IrRef::Import(idx) => {
                self.closure.referenced_imports.insert(idx);
            }
            IrRef::Literal(_) => {}
        }
    }

    fn collect_type(&mut self, idx: TypeIndex) {
        if self.closure.referenced_types.contains(&idx) || !self.types_in_progress.insert(idx) {
            return;
        }
        let library = self.library;
        let ty = &library.types[idx];

        // Value types have to be declared before the pointers to them.
        if let Some(dereference) = ty.dereference_type {
            if !self.closure.referenced_types.contains(&dereference) {
                self.collect_type(dereference);
            }
        }

        if let Some(component) = ty.component_type {
            self.collect_type(component);
        }

        for param in &ty.parameters {
            self.collect_node(*param);
        }

        self.types_in_progress.remove(&idx);
        if !self.closure.referenced_types.contains(&idx) {
            self.add_type_reference(idx);
        }

        if let Some(pointer) = ty.pointer_type {
            self.collect_type(pointer);
        }

        for function in &ty.functions {
            self.collect_function(*function);
        }
    }

    fn collect_function(&mut self, idx: FnIndex) {
        // Marked before walking the body, functions can reference themselves.
        if !self.closure.referenced_functions.insert(idx) {
            return;
        }
        let library = self.library;
        let function = &library.functions[idx];
        trace!("collecting function {:?}", function.name);

        self.collect_type(function.function_type);
        self.collect_block(function.parameter_block);
        for block in &function.blocks {
            self.collect_block(*block);
        }
    }

    fn collect_block(&mut self, idx: BlockIndex) {
        let library = self.library;
        let block = &library.blocks[idx];

        for line in &block.lines {
            self.collect_op(*line);
        }
        for variable in &block.local_variables {
            self.collect_op(*variable);
        }
    }

    fn collect_op(&mut self, idx: OpIndex) {
        if !self.visited_ops.insert(idx) {
            return;
        }
        let library = self.library;
        let op = &library.ops[idx];

        if let Some(result_type) = op.result_type {
            self.collect_type(result_type);
        }

        if let Some(storage_class) = library.storage_class_of(op) {
            if is_global_storage_class(storage_class) {
                // An inline constant initializer has to be declared before the variable.
                self.collect_arguments(op);
                self.add_global_reference(idx);
                return;
            }
        }

        if let Some(capability) = required_capability(op.opcode) {
            if self.closure.capabilities.insert(capability) {
                debug!("{:?} requires capability {:?}", op.opcode, capability);
            }
        }

        if op.opcode == spirv::Op::BranchConditional {
            // Only the condition, the targets are walked through the function's block list.
            if let Some(condition) = op.arguments.first() {
                self.collect_node(*condition);
            }
            return;
        }

        self.collect_arguments(op);

        // Constants go after their arguments so composites follow their constituents.
        if op.is_constant() {
            self.add_constant_reference(idx);
        }
    }

    fn collect_arguments(&mut self, op: &Op) {
        for arg in &op.arguments {
            if matches!(arg, IrRef::Block(_)) {
                continue;
            }
            self.collect_node(*arg);
        }
    }

    fn add_type_reference(&mut self, idx: TypeIndex) {
        self.closure.referenced_types.insert(idx);
        self.closure
            .types_constants_and_globals
            .insert(IrRef::Type(idx));
    }

    fn add_constant_reference(&mut self, idx: OpIndex) {
        if self.closure.referenced_constants.insert(idx) {
            debug!("referenced constant {}", self.library.display_name(IrRef::Op(idx)));
        }
        self.closure
            .types_constants_and_globals
            .insert(IrRef::Op(idx));
    }

    fn add_global_reference(&mut self, idx: OpIndex) {
        if self
            .closure
            .types_constants_and_globals
            .contains(&IrRef::Op(idx))
        {
            return;
        }

        self.closure.referenced_globals.insert(idx);
        self.closure
            .types_constants_and_globals
            .insert(IrRef::Op(idx));
        debug!("referenced global {}", self.library.display_name(IrRef::Op(idx)));

        let library = self.library;
        let initializer = library
            .find_global_variable(idx)
            .and_then(|data| data.initializer);
        if let Some(initializer) = initializer {
            // The whole initializer has to be collected before it's listed.
            self.collect_function(initializer);
            if !self.closure.global_initializers.contains(&initializer) {
                self.closure.global_initializers.push(initializer);
            }
        }
    }
}

/// Collects the closure of a single root.
pub fn collect_dependencies(library: &ShaderLibrary, root: IrRef) -> DependencyClosure {
    let mut collector = DependencyCollector::new(library);
    collector.collect(root);
    collector.into_closure()
}

#[cfg(test)]
mod tests {
    use rspirv::spirv::StorageClass;

    use super::*;
    use crate::ir::{LibraryBuilder, Literal};

    #[test]
    fn none_root_is_a_noop() {
        let library = ShaderLibrary::default();
        let mut collector = DependencyCollector::new(&library);
        collector.collect(None::<IrRef>);

        assert_eq!(collector.closure(), &DependencyClosure::default());
    }

    #[test]
    fn shader_capability_is_always_required() {
        let closure = DependencyClosure::default();
        assert_eq!(
            closure.capabilities.iter().copied().collect::<Vec<_>>(),
            vec![Capability::Shader]
        );
    }

    #[test]
    fn pointer_cycle_terminates() {
        let mut builder = LibraryBuilder::new();
        let node = builder.struct_type("Node", &[]);
        let ptr = builder.pointer_type(node, StorageClass::Private);
        builder.library.types[node]
            .parameters
            .push(IrRef::Type(ptr));

        let closure = collect_dependencies(&builder.library, IrRef::Type(ptr));

        assert_eq!(closure.referenced_types.len(), 2);
        assert!(closure.referenced_types.contains(&node));
        assert!(closure.referenced_types.contains(&ptr));
    }

    #[test]
    fn literals_are_ignored() {
        let mut builder = LibraryBuilder::new();
        let literal = builder.literal(Literal::Int(4));
        let closure = collect_dependencies(&builder.library, literal);

        assert!(closure.types_constants_and_globals.is_empty());
    }
}
