//! Common testing helper functions

use crate::{
    preprocess, ApplyFlags, ClassKind, ClassName, Context, FieldDef, FieldName, LinkedClass,
    MemberNamespace, MethodDef, MethodName, Tree, Type, TypeRef,
};
use std::collections::HashMap;

/// Initialises the test logger once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .format_timestamp(None)
        .try_init();
}

/// Returns a nullary void method name.
pub fn m(simple: &str) -> MethodName {
    MethodName::new(simple, vec![], TypeRef::Void)
}

pub fn method(namespace: MemberNamespace, name: MethodName, body: Option<Tree>) -> MethodDef {
    MethodDef {
        namespace,
        name,
        args: vec![],
        result_type: Type::Void,
        body,
    }
}

/// A public method with a trivial body.
pub fn concrete(simple: &str) -> MethodDef {
    method(MemberNamespace::Public, m(simple), Some(Tree::Skip))
}

/// A public method without a body.
pub fn abstract_method(simple: &str) -> MethodDef {
    method(MemberNamespace::Public, m(simple), None)
}

/// A call to `method` on a receiver statically typed as `receiver_class`.
pub fn call_on(receiver_class: &str, method: MethodName) -> Tree {
    Tree::Apply {
        flags: ApplyFlags::empty(),
        receiver: Box::new(Tree::VarRef {
            name: String::from("x"),
            tpe: Type::Class(ClassName::new(receiver_class)),
        }),
        method,
        args: vec![],
        tpe: Type::Void,
    }
}

pub fn field(name: &str, tpe: Type) -> FieldDef {
    FieldDef {
        name: FieldName::new(name),
        tpe,
    }
}

/// Builds a linked class with a naive ancestor list (fixtures never need the transitive one).
pub fn linked_class(
    name: &str,
    kind: ClassKind,
    super_class: Option<&str>,
    interfaces: &[&str],
    methods: Vec<MethodDef>,
) -> LinkedClass {
    let class_name = ClassName::new(name);
    let mut ancestors = vec![class_name.clone()];
    ancestors.extend(super_class.iter().map(|s| ClassName::new(*s)));
    ancestors.extend(interfaces.iter().map(|s| ClassName::new(*s)));
    LinkedClass {
        name: class_name,
        kind,
        super_class: super_class.map(ClassName::new),
        interfaces: interfaces.iter().map(|s| ClassName::new(*s)).collect(),
        ancestors,
        methods,
        fields: vec![],
        js_native_load_spec: None,
        js_native_members: HashMap::new(),
        exported_members: vec![],
    }
}

/// Runs the preprocessor over `classes` in a fresh context.
pub fn preprocessed(classes: &[LinkedClass]) -> Context {
    init_logging();
    let mut ctx = Context::new();
    preprocess(classes, &mut ctx).expect("preprocessing failed");
    ctx.dump();
    ctx
}
