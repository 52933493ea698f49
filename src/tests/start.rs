//! Start-function assembly tests: string-constant construction and module initializers.

use crate::tests::*;
use crate::{
    emit_module, ClassKind, ClassName, Function, FunctionName, GlobalName, HeapType, Instr,
    ModuleInitializer, Signature, SimpleHeapType, ValType,
};

fn build_string(s: &str, global: GlobalName) -> Vec<Instr> {
    let mut instrs = vec![Instr::Call(FunctionName::helper("emptyString"))];
    for unit in s.encode_utf16() {
        instrs.push(Instr::I32Const(unit as i32));
        instrs.push(Instr::Call(FunctionName::helper("charToString")));
        instrs.push(Instr::Call(FunctionName::helper("stringConcat")));
    }
    instrs.push(Instr::GlobalSet(global));
    instrs
}

#[test]
fn complete_builds_strings_and_runs_void_main() {
    let main_class = ClassName::new("Main");
    let cls = linked_class("Main", ClassKind::ModuleClass, None, &[], vec![concrete("main")]);
    let mut ctx = preprocessed(&[cls]);

    // One class info with one concrete method
    let info = ctx.class_info(&main_class).unwrap();
    assert_eq!(info.methods.len(), 1);
    assert!(!info.methods[0].is_abstract);

    let global = ctx.intern_string("hi");
    ctx.complete(&[ModuleInitializer::VoidMainMethod(main_class.clone(), m("main"))]);

    assert_eq!(ctx.module().start(), Some(&FunctionName::Start));
    let start = ctx
        .module()
        .functions()
        .iter()
        .find(|f| f.name == FunctionName::Start)
        .expect("start function");

    let mut expected = build_string("hi", global);
    expected.push(Instr::Call(FunctionName::LoadModule(main_class.clone())));
    expected.push(Instr::RefAsNonNull);
    expected.push(Instr::Call(FunctionName::Method(main_class, m("main"))));
    assert_eq!(start.body, expected);
    assert!(start.params.is_empty());
    assert!(start.locals.is_empty());
}

#[test]
fn strings_are_built_in_interning_order() {
    let mut ctx = preprocessed(&[]);
    let first = ctx.intern_string("a");
    let second = ctx.intern_string("b");
    ctx.complete(&[]);

    let start = &ctx.module().functions()[0];
    let mut expected = build_string("a", first);
    expected.extend(build_string("b", second));
    assert_eq!(start.body, expected);
}

#[test]
fn empty_string_constants_skip_concatenation() {
    let mut ctx = preprocessed(&[]);
    let global = ctx.intern_string("");
    ctx.complete(&[]);

    let start = &ctx.module().functions()[0];
    assert_eq!(
        start.body,
        vec![
            Instr::Call(FunctionName::helper("emptyString")),
            Instr::GlobalSet(global),
        ]
    );
}

#[test]
fn main_with_args_is_recognized_but_ignored() {
    let mut ctx = preprocessed(&[]);
    ctx.complete(&[ModuleInitializer::MainMethodWithArgs(
        ClassName::new("Main"),
        m("main"),
        vec![String::from("--verbose")],
    )]);
    assert!(ctx.module().start().is_none());
    assert!(ctx.module().functions().is_empty());
}

#[test]
fn completed_modules_emit_end_to_end() {
    let main_class = ClassName::new("Main");
    let cls = linked_class("Main", ClassKind::ModuleClass, None, &[], vec![concrete("main")]);
    let mut ctx = preprocessed(&[cls]);

    ctx.intern_string("hello");
    ctx.complete(&[ModuleInitializer::VoidMainMethod(main_class.clone(), m("main"))]);

    // The class emitter normally provides the module loader and the method bodies; stub them in
    let loader_typ = ctx.intern_signature(Signature::new(vec![], vec![ValType::AnyRef]));
    let main_typ = ctx.intern_signature(Signature::new(vec![ValType::AnyRef], vec![]));
    ctx.module_mut().add_function(Function {
        name: FunctionName::LoadModule(main_class.clone()),
        typ: loader_typ,
        params: vec![],
        locals: vec![],
        body: vec![Instr::RefNull(HeapType::Simple(SimpleHeapType::None))],
    });
    ctx.module_mut().add_function(Function {
        name: FunctionName::Method(main_class, m("main")),
        typ: main_typ,
        params: vec![(crate::LocalName::new("this"), ValType::AnyRef)],
        locals: vec![],
        body: vec![],
    });

    let bytes = emit_module(ctx.module()).unwrap();
    assert_eq!(&bytes[..8], &[0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00]);
    // The module declares a start section
    assert!(bytes.len() > 8);
}
