use crate::ir::types::TypeRef;
use std::fmt;
use std::fmt::Formatter;
use std::sync::Arc;

/// Shared base class of every class in the input IR, the root of the hierarchy.
pub const OBJECT_CLASS: &str = "java/lang/Object";

/// Fully qualified name of a class, interface or module class.
///
/// Names are cheap to clone and are used as keys throughout the back-end, so they wrap an
/// [`Arc<String>`] rather than owning their bytes.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ClassName(Arc<String>);

impl ClassName {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self(Arc::new(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this is the shared base class of the hierarchy.
    pub fn is_object_class(&self) -> bool {
        self.as_str() == OBJECT_CLASS
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ClassName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ClassName {{ {} }}", self)
    }
}

/// Name of an instance field, unique within its declaring class.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct FieldName(Arc<String>);

impl FieldName {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self(Arc::new(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for FieldName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "FieldName {{ {} }}", self)
    }
}

/// Name of a method, including the type references of its parameters and result.
///
/// Two methods occupy the same virtual-dispatch slot if and only if their `MethodName`s are
/// equal, which is exactly equality of their mangled [`MethodName::name_string`] renderings.
/// The embedded type references also let the preprocessor reconstruct the signature of an
/// abstract method the linker erased, from nothing but a call site.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct MethodName {
    simple_name: Arc<String>,
    param_refs: Vec<TypeRef>,
    result_ref: TypeRef,
}

impl MethodName {
    pub fn new<S: Into<String>>(simple_name: S, param_refs: Vec<TypeRef>, result_ref: TypeRef) -> Self {
        Self {
            simple_name: Arc::new(simple_name.into()),
            param_refs,
            result_ref,
        }
    }

    pub fn simple_name(&self) -> &str {
        &self.simple_name
    }

    pub fn param_refs(&self) -> &[TypeRef] {
        &self.param_refs
    }

    pub fn result_ref(&self) -> &TypeRef {
        &self.result_ref
    }

    /// Returns the mangled `name(params)result` rendering, e.g. `compare(I,I)Z`.
    pub fn name_string(&self) -> String {
        format!("{}", self)
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.simple_name)?;
        for (i, param) in self.param_refs.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            fmt::Display::fmt(param, f)?;
        }
        write!(f, "){}", self.result_ref)
    }
}

impl fmt::Debug for MethodName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "MethodName {{ {} }}", self)
    }
}
