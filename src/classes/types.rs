use crate::error::CodegenError;
use crate::ir::{ClassKind, ClassName, FieldName, LoadSpec, MethodName, Type};
use crate::wasm::FunctionName;
use log::Level;
use std::collections::HashMap;

/// Number of implicit leading slots in every class struct: slot 0 holds the vtable reference,
/// slot 1 the itables reference. User fields start after these.
pub const IMPLICIT_FIELDS: u32 = 2;

/// A virtually dispatchable method of a class, concrete or abstract.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInfo {
    pub class: ClassName,
    pub method: MethodName,
    pub arg_types: Vec<Type>,
    pub result_type: Type,
    /// `true` iff the method has no body, including slots synthesized by abstract-method
    /// recovery.
    pub is_abstract: bool,
}

impl FunctionInfo {
    /// Returns the Wasm function name implementing this method.
    pub fn function_name(&self) -> FunctionName {
        FunctionName::Method(self.class.clone(), self.method.clone())
    }
}

/// A declared instance field.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FieldInfo {
    pub name: FieldName,
    pub tpe: Type,
}

/// Per-class information assembled by the preprocessor and consumed by the vtable/itable planner
/// and the external instruction selector.
///
/// Created once per class; after construction, the only permitted mutation is the append-only
/// abstract-method recovery pass. Method order follows source appearance and stays stable.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub name: ClassName,
    pub kind: ClassKind,
    pub methods: Vec<FunctionInfo>,
    pub fields: Vec<FieldInfo>,
    pub super_class: Option<ClassName>,
    pub interfaces: Vec<ClassName>,
    pub ancestors: Vec<ClassName>,
    pub js_native_load_spec: Option<LoadSpec>,
    pub js_native_members: HashMap<MethodName, LoadSpec>,
}

impl ClassInfo {
    pub fn is_interface(&self) -> bool {
        self.kind.is_interface()
    }

    /// Returns `true` if this class declares (or has recovered) a slot for `method`.
    pub fn has_method(&self, method: &MethodName) -> bool {
        self.methods.iter().any(|m| m.method == *method)
    }

    /// Returns the struct field index of a user field. Slots 0 and 1 are the vtable and itables
    /// references, so user fields start at 2 in declaration order.
    pub fn field_idx(&self, field: &FieldName) -> anyhow::Result<u32> {
        match self.fields.iter().position(|f| f.name == *field) {
            Some(index) => Ok(index as u32 + IMPLICIT_FIELDS),
            None => bail!(CodegenError::FieldNotFound {
                class: self.name.clone(),
                field: field.clone(),
            }),
        }
    }

    /// Logs this class's methods and fields at debug/trace level.
    pub fn dump(&self) {
        if !log_enabled!(Level::Debug) {
            return;
        }
        debug!("Class: {} ({:?})", self.name, self.kind);
        if let Some(super_class) = &self.super_class {
            debug!("  extends {}", super_class);
        }
        for interface in &self.interfaces {
            debug!("  implements {}", interface);
        }
        for (i, field) in self.fields.iter().enumerate() {
            trace!("{:>6}: {} ({:?})", i as u32 + IMPLICIT_FIELDS, field.name, field.tpe);
        }
        for method in &self.methods {
            debug!(
                "  Method: {}{}",
                method.method,
                if method.is_abstract { " (abstract)" } else { "" },
            );
        }
    }
}
