//! Catalogue of the externally provided runtime helpers: primitive boxing, string operations and
//! JS interop. Every helper is registered as a function import when a context is created, under
//! its class name as the import module and its method name as the import field.

use crate::context::Context;
use crate::wasm::{FunctionName, Import, ImportDesc, Signature, ValType};

/// Import module name of the core, boxing and string helpers.
pub const HELPER_CLASS: &str = "__runtime";
/// Import module name of the JS unary operator helpers.
pub const JS_UNARY_OPS_CLASS: &str = "__unaryOps";
/// Import module name of the JS binary operator helpers.
pub const JS_BINARY_OPS_CLASS: &str = "__binaryOps";

/// A single entry of the helper catalogue.
pub struct Helper {
    pub class: &'static str,
    pub name: &'static str,
    pub params: Vec<ValType>,
    pub results: Vec<ValType>,
}

impl Helper {
    fn new(
        class: &'static str,
        name: &'static str,
        params: Vec<ValType>,
        results: Vec<ValType>,
    ) -> Self {
        Self {
            class,
            name,
            params,
            results,
        }
    }
}

lazy_static! {
    /// The full helper catalogue, in registration order.
    pub static ref HELPERS: Vec<Helper> = build_helpers();
}

fn build_helpers() -> Vec<Helper> {
    use ValType::{AnyRef, F32, F64, I32, I64};
    let ref_any = ValType::ref_any;

    let mut list = Vec::new();
    let mut h = |name, params, results| list.push(Helper::new(HELPER_CLASS, name, params, results));

    // Core
    h("is", vec![AnyRef, AnyRef], vec![I32]);
    h("undef", vec![], vec![ref_any()]);
    h("isUndef", vec![AnyRef], vec![I32]);

    // Primitive boxing: box, unbox, unboxOrNull and typeTest per primitive
    macro_rules! prim_helpers {
        ($prim:literal, $wasm_type:expr) => {
            h(concat!("box", $prim), vec![$wasm_type], vec![AnyRef]);
            h(concat!("unbox", $prim), vec![AnyRef], vec![$wasm_type]);
            h(concat!("unboxOrNull", $prim), vec![AnyRef], vec![AnyRef]);
            h(concat!("typeTest", $prim), vec![AnyRef], vec![I32]);
        };
    }
    prim_helpers!("Boolean", I32);
    prim_helpers!("Byte", I32);
    prim_helpers!("Short", I32);
    prim_helpers!("Int", I32);
    prim_helpers!("Float", F32);
    prim_helpers!("Double", F64);

    // Strings
    h("emptyString", vec![], vec![ref_any()]);
    h("stringLength", vec![ref_any()], vec![I32]);
    h("stringCharAt", vec![ref_any(), I32], vec![I32]);
    h("jsValueToString", vec![AnyRef], vec![ref_any()]);
    h("booleanToString", vec![I32], vec![ref_any()]);
    h("charToString", vec![I32], vec![ref_any()]);
    h("intToString", vec![I32], vec![ref_any()]);
    h("longToString", vec![I64], vec![ref_any()]);
    h("doubleToString", vec![F64], vec![ref_any()]);
    h("stringConcat", vec![ref_any(), ref_any()], vec![ref_any()]);
    h("isString", vec![AnyRef], vec![I32]);

    // JS interop
    h("jsValueHashCode", vec![AnyRef], vec![I32]);
    h("jsGlobalRefGet", vec![ref_any()], vec![AnyRef]);
    h("jsGlobalRefSet", vec![ref_any(), AnyRef], vec![]);
    h("jsGlobalRefTypeof", vec![ref_any()], vec![ref_any()]);
    h("jsNewArray", vec![], vec![AnyRef]);
    h("jsArrayPush", vec![AnyRef, AnyRef], vec![AnyRef]);
    h("jsArraySpreadPush", vec![AnyRef, AnyRef], vec![AnyRef]);
    h("jsNewObject", vec![], vec![AnyRef]);
    h("jsObjectPush", vec![AnyRef, AnyRef, AnyRef], vec![AnyRef]);
    h("jsSelect", vec![AnyRef, AnyRef], vec![AnyRef]);
    h("jsSelectSet", vec![AnyRef, AnyRef, AnyRef], vec![]);
    h("jsNew", vec![AnyRef, AnyRef], vec![AnyRef]);
    h("jsFunctionApply", vec![AnyRef, AnyRef], vec![AnyRef]);
    h("jsMethodApply", vec![AnyRef, AnyRef, AnyRef], vec![AnyRef]);
    h("jsDelete", vec![AnyRef, AnyRef], vec![]);
    h("jsIsTruthy", vec![AnyRef], vec![I32]);
    h("jsLinkingInfo", vec![], vec![AnyRef]);

    // JS operators: one helper per unary and binary operator. Strict (in)equality returns i32,
    // everything else an arbitrary JS value.
    const JS_UNARY_OPS: [&str; 5] = ["+", "-", "~", "!", "typeof"];
    for op in &JS_UNARY_OPS {
        list.push(Helper::new(JS_UNARY_OPS_CLASS, *op, vec![AnyRef], vec![AnyRef]));
    }
    const JS_BINARY_OPS: [&str; 20] = [
        "===", "!==", "+", "-", "*", "/", "%", "|", "&", "^", "<<", ">>", ">>>", "<", "<=", ">",
        ">=", "**", "in", "instanceof",
    ];
    for op in &JS_BINARY_OPS {
        let results = match *op {
            "===" | "!==" => vec![I32],
            _ => vec![AnyRef],
        };
        list.push(Helper::new(JS_BINARY_OPS_CLASS, *op, vec![AnyRef, AnyRef], results));
    }

    list
}

/// Registers every catalogue helper as a function import on the context's module.
pub(crate) fn register_helper_imports(ctx: &mut Context) {
    for helper in HELPERS.iter() {
        let typ = ctx.intern_signature(Signature::new(helper.params.clone(), helper.results.clone()));
        ctx.module_mut().add_import(Import {
            module: helper.class.to_string(),
            field: helper.name.to_string(),
            desc: ImportDesc::Func {
                name: FunctionName::Helper(helper.class, helper.name),
                typ,
            },
        });
    }
}
