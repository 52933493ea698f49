//! The class-hierarchy preprocessor. Pass 1 turns every linked class into a [`ClassInfo`];
//! pass 2 walks all method bodies and exported member trees to reintroduce the abstract method
//! slots the upstream linker erased.

use crate::classes::types::{ClassInfo, FieldInfo, FunctionInfo};
use crate::context::Context;
use crate::ir::{type_ref_to_type, ApplyFlags, ClassName, LinkedClass, MethodName, Tree, Type};

/// Runs both preprocessor passes over the linked classes, populating the context's class-info
/// table.
pub fn preprocess(classes: &[LinkedClass], ctx: &mut Context) -> anyhow::Result<()> {
    // Pass 1: build class infos
    for class in classes {
        let info = build_class_info(class);
        info.dump();
        ctx.add_class_info(info);
    }

    // Pass 2: recover abstract method slots from call sites
    for class in classes {
        recover_abstract_methods(class, ctx)?;
    }

    Ok(())
}

/// Builds the class info for a single linked class.
///
/// Constructors are excluded from `methods`: they are never virtually dispatched, so they get no
/// vtable slot.
fn build_class_info(class: &LinkedClass) -> ClassInfo {
    let methods = class
        .methods
        .iter()
        .filter(|m| !m.namespace.is_constructor())
        .map(|m| FunctionInfo {
            class: class.name.clone(),
            method: m.name.clone(),
            arg_types: m.args.iter().map(|(_, tpe)| tpe.clone()).collect(),
            result_type: m.result_type.clone(),
            is_abstract: m.body.is_none(),
        })
        .collect();

    let fields = class
        .fields
        .iter()
        .map(|f| FieldInfo {
            name: f.name.clone(),
            tpe: f.tpe.clone(),
        })
        .collect();

    ClassInfo {
        name: class.name.clone(),
        kind: class.kind,
        methods,
        fields,
        super_class: class.super_class.clone(),
        interfaces: class.interfaces.clone(),
        ancestors: class.ancestors.clone(),
        js_native_load_spec: class.js_native_load_spec.clone(),
        js_native_members: class.js_native_members.clone(),
    }
}

/// Walks every method body and exported member tree of `class`, appending a synthetic abstract
/// slot to the receiver's class for each call whose target slot the linker erased.
///
/// The linker drops abstract method declarations whose only role was to be overridden, because
/// concrete overrides suffice for its own dispatch semantics. Virtual dispatch through a
/// reference typed as the abstract base still needs a slot at the declaring level, so those
/// slots are reinstated conservatively from actual call sites. Running this pass twice is a
/// no-op: a slot is only appended while no method of that name exists.
fn recover_abstract_methods(class: &LinkedClass, ctx: &mut Context) -> anyhow::Result<()> {
    for method in &class.methods {
        if let Some(body) = &method.body {
            walk(body, ctx)?;
        }
    }
    for tree in &class.exported_members {
        walk(tree, ctx)?;
    }
    Ok(())
}

fn walk(tree: &Tree, ctx: &mut Context) -> anyhow::Result<()> {
    if let Tree::Apply {
        flags,
        receiver,
        method,
        ..
    } = tree
    {
        // Private calls are statically dispatched and never go through a vtable slot
        if !flags.contains(ApplyFlags::PRIVATE) {
            if let Type::Class(receiver_class) = receiver.tpe() {
                register_abstract_slot(ctx, &receiver_class, method)?;
            }
        }
    }
    for child in tree.children() {
        walk(child, ctx)?;
    }
    Ok(())
}

/// Appends an abstract slot for `method` to `class` unless a method of that name already exists.
/// The slot's signature is reconstructed from the type references embedded in the method name.
fn register_abstract_slot(
    ctx: &mut Context,
    class: &ClassName,
    method: &MethodName,
) -> anyhow::Result<()> {
    let info = ctx.class_info_mut(class)?;
    if !info.has_method(method) {
        debug!("Recovering abstract slot {} on {}", method, class);
        info.methods.push(FunctionInfo {
            class: class.clone(),
            method: method.clone(),
            arg_types: method.param_refs().iter().map(type_ref_to_type).collect(),
            result_type: type_ref_to_type(method.result_ref()),
            is_abstract: true,
        });
    }
    Ok(())
}
