use crate::ir::{ClassName, MethodName};
use std::fmt;
use std::fmt::Formatter;
use std::sync::Arc;

/// Name of an interned function signature. The wrapped index is dense in interning order and is
/// only assigned by the context's signature interner.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct FunctionTypeName(pub(crate) u32);

impl FunctionTypeName {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FunctionTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fun.{}", self.0)
    }
}

/// Name of a declared Wasm type definition.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum TypeName {
    /// The struct type representing instances of a class.
    ClassStruct(ClassName),
    /// The struct type of a class's virtual-dispatch table.
    VTableStruct(ClassName),
    /// The always-present array type holding the interface-dispatch tables of an instance.
    ItableArray,
    Function(FunctionTypeName),
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::ClassStruct(class) => write!(f, "struct.{}", class),
            TypeName::VTableStruct(class) => write!(f, "vtable.{}", class),
            TypeName::ItableArray => f.write_str("itables"),
            TypeName::Function(name) => fmt::Display::fmt(name, f),
        }
    }
}

/// Name of a function, imported or defined.
#[derive(Clone, Eq, PartialEq, Hash)]
pub enum FunctionName {
    /// A method of a class.
    Method(ClassName, MethodName),
    /// The loader of a module class's singleton instance, provided by the class emitter.
    LoadModule(ClassName),
    /// An imported runtime helper, identified by its class and method name.
    Helper(&'static str, &'static str),
    /// The synthesized start function.
    Start,
}

impl FunctionName {
    /// Returns the name of a helper in the default helper class.
    pub fn helper(name: &'static str) -> Self {
        FunctionName::Helper(crate::helpers::HELPER_CLASS, name)
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionName::Method(class, method) => write!(f, "{}.{}", class, method),
            FunctionName::LoadModule(class) => write!(f, "loadModule.{}", class),
            FunctionName::Helper(class, name) => write!(f, "{}.{}", class, name),
            FunctionName::Start => f.write_str("start"),
        }
    }
}

impl fmt::Debug for FunctionName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionName {{ {} }}", self)
    }
}

/// Name of a declared global.
#[derive(Clone, Eq, PartialEq, Hash)]
pub enum GlobalName {
    /// An interned constant string; indices are dense and start at 1.
    StringConstant(u32),
    /// The vtable instance of a class, provided by the class emitter.
    VTable(ClassName),
    /// The cached singleton instance of a module class, provided by the class emitter.
    ModuleInstance(ClassName),
}

impl fmt::Display for GlobalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlobalName::StringConstant(index) => write!(f, "string.{}", index),
            GlobalName::VTable(class) => write!(f, "vtable.{}", class),
            GlobalName::ModuleInstance(class) => write!(f, "module.{}", class),
        }
    }
}

impl fmt::Debug for GlobalName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "GlobalName {{ {} }}", self)
    }
}

/// Name of a function parameter or local.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct LocalName(Arc<String>);

impl LocalName {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self(Arc::new(name.into()))
    }
}

impl fmt::Display for LocalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for LocalName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "LocalName {{ {} }}", self)
    }
}

/// Opaque identity of a structured control-flow label. Instructions reference labels by identity;
/// the emitter resolves them to relative depths when serializing.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct LabelId(u32);

/// Allocator of fresh label identities, one per function body under construction.
#[derive(Debug, Default)]
pub struct LabelGen {
    next: u32,
}

impl LabelGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> LabelId {
        let label = LabelId(self.next);
        self.next += 1;
        label
    }
}
