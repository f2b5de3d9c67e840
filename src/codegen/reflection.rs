use crate::collect::DependencyClosure;
use crate::ir::{IrRef, ShaderLibrary};
use crate::pass::{EntryPointReflection, GlobalReflection, ShaderStageReflection};

/// Gathers the reflection data of an emitted translation unit.
pub(crate) fn reflect(
    library: &ShaderLibrary,
    closure: &DependencyClosure,
    id_bound: u32,
) -> ShaderStageReflection {
    let entry_points = closure
        .referenced_functions
        .iter()
        .filter_map(|idx| {
            let function = &library.functions[*idx];
            let model = function.execution_model?;
            Some(EntryPointReflection {
                name: function.name.clone(),
                execution_model: format!("{model:?}"),
            })
        })
        .collect();

    let globals = closure
        .referenced_globals
        .iter()
        .map(|idx| {
            let op = &library.ops[*idx];
            let storage_class = library
                .storage_class_of(op)
                .map(|class| format!("{class:?}"))
                .unwrap_or_default();
            let type_name = op
                .result_type
                .and_then(|ptr| library.types[ptr].dereference_type)
                .map(|ty| library.types[ty].name.clone())
                .unwrap_or_default();

            GlobalReflection {
                name: library.display_name(IrRef::Op(*idx)),
                storage_class,
                type_name,
            }
        })
        .collect();

    ShaderStageReflection {
        id_bound,
        capabilities: closure
            .capabilities
            .iter()
            .map(|capability| format!("{capability:?}"))
            .collect(),
        extension_imports: closure
            .referenced_imports
            .iter()
            .map(|idx| library.imports[*idx].name.clone())
            .collect(),
        initializers: closure
            .global_initializers
            .iter()
            .map(|idx| library.functions[*idx].name.clone())
            .collect(),
        entry_points,
        globals,
    }
}
