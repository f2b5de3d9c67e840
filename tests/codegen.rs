use rspirv::spirv::{self, ExecutionModel, StorageClass};
use shaderir::codegen::{EmitError, SpirvBinaryBackend};
use shaderir::ir::{LibraryBuilder, Literal, Type, TypeKind};

#[test]
fn every_type_kind_is_emitted() {
    let mut builder = LibraryBuilder::new();
    let void = builder.void_type();
    let f32_ty = builder.float_type(32);
    let u32_ty = builder.int_type(32, false);
    let vec4 = builder.vector_type(f32_ty, 4);
    let mat4 = builder.matrix_type(vec4, 4);
    let length = builder.constant(u32_ty, Literal::Int(8));
    let array = builder.array_type(f32_ty, length);
    let runtime_array = builder.runtime_array_type(u32_ty);
    let image = builder.image_type(f32_ty, spirv::Dim::Dim2D);
    let sampled_image = builder.sampled_image_type(image);
    let sampler = builder.sampler_type();
    let fn_ty = builder.function_type(void, &[f32_ty]);

    let entry = builder.struct_type("Everything", &[array, mat4, runtime_array]);

    let sampler_ptr = builder.pointer_type(sampler, StorageClass::UniformConstant);
    let texture_ptr = builder.pointer_type(sampled_image, StorageClass::UniformConstant);
    let linear = builder.global_variable("linear", sampler_ptr, None);
    let texture = builder.global_variable("texture", texture_ptr, None);
    builder.decorate(texture, spirv::Decoration::DescriptorSet, &[0]);
    builder.decorate(texture, spirv::Decoration::Binding, &[1]);

    let main = builder.function(Some(entry), "main", fn_ty);
    builder.set_execution_model(main, ExecutionModel::GLCompute);
    let param = builder.function_parameter(main, f32_ty);
    builder.set_debug_name(param, "scale");
    let block = builder.append_block(main);
    let local_ptr = builder.pointer_type(f32_ty, StorageClass::Function);
    let local = builder.local_variable(block, local_ptr);
    builder.push_op(block, spirv::Op::Store, None, vec![local.into(), param.into()]);
    builder.push_op(block, spirv::Op::Load, Some(sampler), vec![linear.into()]);
    builder.push_op(block, spirv::Op::Load, Some(sampled_image), vec![texture.into()]);
    builder.push_op(block, spirv::Op::Return, None, Vec::new());

    assert_eq!(builder.get_op(local).arguments.len(), 1);
    assert_eq!(builder.get_type(vec4).pointer_type, None);
    let library = builder.finish();

    let binary = SpirvBinaryBackend.translate_type(&library, entry).unwrap();
    let module = rspirv::dr::load_words(&binary.words).unwrap();

    assert_eq!(binary.words[3], binary.reflection.id_bound);
    assert_eq!(module.functions.len(), 1);
    assert_eq!(module.functions[0].parameters.len(), 1);
    assert_eq!(module.annotations.len(), 2);
    assert_eq!(module.execution_modes.len(), 1);
    assert!(
        module
            .types_global_values
            .iter()
            .any(|inst| inst.class.opcode == spirv::Op::TypeSampledImage)
    );

    let globals = &binary.reflection.globals;
    assert_eq!(globals.len(), 2);
    assert_eq!(globals[0].name, "linear");
    assert_eq!(globals[0].storage_class, "UniformConstant");
    assert_eq!(globals[1].type_name, "sampled<imageDim2D<f32>>");
    assert_eq!(binary.reflection.entry_points[0].execution_model, "GLCompute");
}

#[test]
fn structural_types_are_interned() {
    let mut builder = LibraryBuilder::new();
    let f32_ty = builder.float_type(32);
    let a = builder.vector_type(f32_ty, 4);
    let b = builder.vector_type(f32_ty, 4);
    let c = builder.vector_type(f32_ty, 3);
    let first = builder.struct_type("Same", &[a]);
    let second = builder.struct_type("Other", &[a]);

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(first, second);
    assert_eq!(builder.library.find_type("Other"), Some(second));

    let output = builder.pointer_type(a, StorageClass::Output);
    let input = builder.pointer_type(a, StorageClass::Input);
    assert_eq!(builder.get_type(a).pointer_type, Some(output));
    assert_eq!(builder.get_type(input).dereference_type, Some(a));
}

#[test]
fn malformed_types_are_reported() {
    let mut builder = LibraryBuilder::new();
    let broken = builder
        .library
        .types
        .insert(Type::new("broken", TypeKind::Vector { count: 4 }));
    let entry = builder.struct_type("Broken", &[broken]);
    let library = builder.finish();

    let result = SpirvBinaryBackend.translate_type(&library, entry);
    assert_eq!(
        result.unwrap_err(),
        EmitError::MissingOperand {
            node: "broken".to_string(),
            operand: "component type",
        }
    );
}
