//! Binary emitter tests pinning exact output bytes for small modules.

use crate::tests::init_logging;
use crate::{
    emit_module, ClassName, Export, ExportKind, FieldType, Function, FunctionName,
    FunctionType, FunctionTypeName, GlobalName, Import, ImportDesc, Instr, LabelGen, LocalName,
    Module, Signature, StructType, TypeName, ValType,
};
use crate::{BlockType, Global};

const PREAMBLE: [u8; 8] = [0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00];

fn emitted(module: &Module) -> Vec<u8> {
    init_logging();
    emit_module(module).unwrap()
}

fn nullary_type(module: &mut Module) -> FunctionTypeName {
    let name = FunctionTypeName(0);
    module.add_function_type(FunctionType::new(name, Signature::new(vec![], vec![])));
    name
}

#[test]
fn empty_modules_emit_the_builtin_itables_array_only() {
    let module = Module::new();
    let bytes = emitted(&module);

    let mut expected = PREAMBLE.to_vec();
    expected.extend([
        0x01, 0x07, // type section
        0x01, // one recursive group
        0x4E, // rectype
        0x01, // one subtype
        0x5E, 0x64, 0x6B, 0x00, // array of immutable (ref struct)
    ]);
    // No imports, functions, globals, exports, start or code sections
    assert_eq!(bytes, expected);
}

#[test]
fn struct_types_emit_topologically_with_super_indices() {
    let a = TypeName::ClassStruct(ClassName::new("A"));
    let b = TypeName::ClassStruct(ClassName::new("B"));
    let mut module = Module::new();
    // Declared most-derived first; the emitter must reorder
    module.add_struct_type(StructType {
        name: b,
        fields: vec![],
        super_type: Some(a.clone()),
    });
    module.add_struct_type(StructType {
        name: a,
        fields: vec![FieldType::mutable(ValType::I32)],
        super_type: None,
    });

    let bytes = emitted(&module);
    let mut expected = PREAMBLE.to_vec();
    expected.extend([
        0x01, 0x12, // type section
        0x01, 0x4E, 0x03, // one group, three subtypes
        0x50, 0x00, 0x5F, 0x01, 0x7F, 0x01, // A: sub, no super, one mutable i32 field
        0x50, 0x01, 0x00, 0x5F, 0x00, // B: sub, super A (index 0), no fields
        0x5E, 0x64, 0x6B, 0x00, // itables array
    ]);
    assert_eq!(bytes, expected);
}

#[test]
fn function_bodies_index_params_before_locals() {
    let mut module = Module::new();
    let typ = FunctionTypeName(0);
    module.add_function_type(FunctionType::new(
        typ,
        Signature::new(vec![ValType::I32], vec![ValType::I32]),
    ));
    module.add_function(Function {
        name: FunctionName::Start,
        typ,
        params: vec![(LocalName::new("x"), ValType::I32)],
        locals: vec![(LocalName::new("tmp"), ValType::I32)],
        body: vec![
            Instr::LocalGet(LocalName::new("x")),
            Instr::LocalSet(LocalName::new("tmp")),
            Instr::LocalGet(LocalName::new("tmp")),
        ],
    });

    let bytes = emitted(&module);
    let mut expected = PREAMBLE.to_vec();
    expected.extend([
        0x01, 0x0C, // type section
        0x01, 0x4E, 0x02, // one group, two subtypes
        0x60, 0x01, 0x7F, 0x01, 0x7F, // (i32) -> (i32)
        0x5E, 0x64, 0x6B, 0x00, // itables array
    ]);
    expected.extend([0x03, 0x02, 0x01, 0x00]); // function section: one function of type 0
    expected.extend([
        0x0A, 0x0C, // code section
        0x01, // one body
        0x0A, // body length
        0x01, 0x01, 0x7F, // one i32 local (parameters are implicit)
        0x20, 0x00, // local.get x (param, index 0)
        0x21, 0x01, // local.set tmp (first non-parameter local, index 1)
        0x20, 0x01, // local.get tmp
        0x0B, // end
    ]);
    assert_eq!(bytes, expected);
}

#[test]
fn globals_and_exports_emit_types_flags_and_indices() {
    let mut module = Module::new();
    module.add_global(Global {
        name: GlobalName::StringConstant(1),
        typ: ValType::ref_any(),
        mutable: true,
        init: vec![Instr::I32Const(0), Instr::RefI31],
    });
    module.add_export(Export {
        name: String::from("s"),
        kind: ExportKind::Global(GlobalName::StringConstant(1)),
    });

    let bytes = emitted(&module);
    let mut expected = PREAMBLE.to_vec();
    expected.extend([0x01, 0x07, 0x01, 0x4E, 0x01, 0x5E, 0x64, 0x6B, 0x00]);
    expected.extend([
        0x06, 0x09, // global section
        0x01, // one global
        0x64, 0x6E, // ref any
        0x01, // mutable
        0x41, 0x00, // i32.const 0
        0xFB, 0x1C, // ref.i31 placeholder
        0x0B, // end
    ]);
    expected.extend([
        0x07, 0x05, // export section
        0x01, // one export
        0x01, 0x73, // "s"
        0x03, 0x00, // global kind, index 0
    ]);
    assert_eq!(bytes, expected);
}

#[test]
fn imports_take_the_leading_function_indices() {
    let mut module = Module::new();
    let typ = nullary_type(&mut module);
    module.add_import(Import {
        module: String::from("m"),
        field: String::from("f"),
        desc: ImportDesc::Func {
            name: FunctionName::Helper("m", "f"),
            typ,
        },
    });
    module.add_function(Function {
        name: FunctionName::Start,
        typ,
        params: vec![],
        locals: vec![],
        body: vec![
            Instr::Call(FunctionName::Helper("m", "f")),
            Instr::Call(FunctionName::Start),
        ],
    });

    let bytes = emitted(&module);
    let mut expected = PREAMBLE.to_vec();
    expected.extend([
        0x01, 0x0A, 0x01, 0x4E, 0x02, 0x60, 0x00, 0x00, 0x5E, 0x64, 0x6B, 0x00,
    ]);
    expected.extend([
        0x02, 0x07, // import section
        0x01, // one import
        0x01, 0x6D, // "m"
        0x01, 0x66, // "f"
        0x00, 0x00, // func of type 0
    ]);
    expected.extend([0x03, 0x02, 0x01, 0x00]);
    expected.extend([
        0x0A, 0x08, // code section
        0x01, 0x06, // one body of six bytes
        0x00, // no locals
        0x10, 0x00, // call the import (index 0)
        0x10, 0x01, // call the defined function (index 1)
        0x0B,
    ]);
    assert_eq!(bytes, expected);
}

#[test]
fn start_sections_are_emitted_only_when_set() {
    let mut module = Module::new();
    let typ = nullary_type(&mut module);
    module.add_function(Function {
        name: FunctionName::Start,
        typ,
        params: vec![],
        locals: vec![],
        body: vec![],
    });

    let without_start = emitted(&module);
    module.set_start(FunctionName::Start);
    let with_start = emitted(&module);

    let mut expected = PREAMBLE.to_vec();
    expected.extend([
        0x01, 0x0A, 0x01, 0x4E, 0x02, 0x60, 0x00, 0x00, 0x5E, 0x64, 0x6B, 0x00,
    ]);
    expected.extend([0x03, 0x02, 0x01, 0x00]);
    let code = [0x0A, 0x04, 0x01, 0x02, 0x00, 0x0B];

    let mut expected_without = expected.clone();
    expected_without.extend(code);
    assert_eq!(without_start, expected_without);

    let mut expected_with = expected;
    expected_with.extend([0x08, 0x01, 0x00]); // start section: function index 0
    expected_with.extend(code);
    assert_eq!(with_start, expected_with);
}

#[test]
fn structured_bodies_encode_relative_labels() {
    let mut labels = LabelGen::new();
    let label = labels.fresh();
    let mut module = Module::new();
    let typ = nullary_type(&mut module);
    module.add_function(Function {
        name: FunctionName::Start,
        typ,
        params: vec![],
        locals: vec![],
        body: vec![
            Instr::Block(BlockType::Empty, Some(label)),
            Instr::Br(label),
            Instr::End,
        ],
    });

    let bytes = emitted(&module);
    let mut expected = PREAMBLE.to_vec();
    expected.extend([
        0x01, 0x0A, 0x01, 0x4E, 0x02, 0x60, 0x00, 0x00, 0x5E, 0x64, 0x6B, 0x00,
    ]);
    expected.extend([0x03, 0x02, 0x01, 0x00]);
    expected.extend([
        0x0A, 0x09, // code section
        0x01, 0x07, // one body of seven bytes
        0x00, // no locals
        0x02, 0x40, // block (empty)
        0x0C, 0x00, // br to the enclosing block, depth 0
        0x0B, // end of block
        0x0B, // end of expression
    ]);
    assert_eq!(bytes, expected);
}
