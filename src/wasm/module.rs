use crate::error::CodegenError;
use crate::wasm::instructions::Instr;
use crate::wasm::names::{FunctionName, FunctionTypeName, GlobalName, LocalName, TypeName};
use crate::wasm::types::{ArrayType, FieldType, FunctionType, StructType, ValType};
use itertools::Itertools;

/// A defined global variable with its constant initializer expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    pub name: GlobalName,
    pub typ: ValType,
    pub mutable: bool,
    pub init: Vec<Instr>,
}

/// What an import provides. Only functions are imported by this back-end.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportDesc {
    Func {
        name: FunctionName,
        typ: FunctionTypeName,
    },
}

/// A single import, keyed by module and field name on the host side.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub module: String,
    pub field: String,
    pub desc: ImportDesc,
}

/// What an export exposes to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportKind {
    Func(FunctionName),
    Global(GlobalName),
}

/// A single export.
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub name: String,
    pub kind: ExportKind,
}

/// A defined function. Parameters are implicit in the function's type; their names here assign
/// the leading local indices, followed by the non-parameter locals.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: FunctionName,
    pub typ: FunctionTypeName,
    pub params: Vec<(LocalName, ValType)>,
    pub locals: Vec<(LocalName, ValType)>,
    pub body: Vec<Instr>,
}

/// The module store: append-only collections of every declaration, filled during the build phase
/// and read by the binary emitter.
///
/// Struct and array types live in the module's single recursive type group; function types are
/// appended by the context's signature interner. The itables array type is always present.
#[derive(Debug)]
pub struct Module {
    struct_types: Vec<StructType>,
    array_types: Vec<ArrayType>,
    function_types: Vec<FunctionType>,
    imports: Vec<Import>,
    functions: Vec<Function>,
    globals: Vec<Global>,
    exports: Vec<Export>,
    start: Option<FunctionName>,
}

impl Module {
    pub fn new() -> Self {
        Self {
            struct_types: Vec::new(),
            array_types: vec![ArrayType {
                name: TypeName::ItableArray,
                field: FieldType::immutable(ValType::ref_struct()),
            }],
            function_types: Vec::new(),
            imports: Vec::new(),
            functions: Vec::new(),
            globals: Vec::new(),
            exports: Vec::new(),
            start: None,
        }
    }

    pub fn add_struct_type(&mut self, typ: StructType) {
        self.struct_types.push(typ);
    }

    pub fn add_array_type(&mut self, typ: ArrayType) {
        self.array_types.push(typ);
    }

    pub(crate) fn add_function_type(&mut self, typ: FunctionType) {
        self.function_types.push(typ);
    }

    pub fn add_import(&mut self, import: Import) {
        self.imports.push(import);
    }

    pub fn add_function(&mut self, function: Function) {
        self.functions.push(function);
    }

    pub fn add_global(&mut self, global: Global) {
        self.globals.push(global);
    }

    pub fn add_export(&mut self, export: Export) {
        self.exports.push(export);
    }

    pub fn set_start(&mut self, name: FunctionName) {
        self.start = Some(name);
    }

    pub fn array_types(&self) -> &[ArrayType] {
        &self.array_types
    }

    pub fn function_types(&self) -> &[FunctionType] {
        &self.function_types
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn globals(&self) -> &[Global] {
        &self.globals
    }

    pub fn exports(&self) -> &[Export] {
        &self.exports
    }

    pub fn start(&self) -> Option<&FunctionName> {
        self.start.as_ref()
    }

    /// Returns the struct types of the recursive group, topologically sorted so every type
    /// appears after its declared super type.
    ///
    /// Each pass emits the remaining types whose super is absent or already emitted, in
    /// declaration order. An input already in topological order is returned unchanged. Fails with
    /// [`CodegenError::CyclicSubtype`] if a fixed point is reached with types left over.
    pub fn rec_group_types(&self) -> anyhow::Result<Vec<&StructType>> {
        let mut sorted: Vec<&StructType> = Vec::with_capacity(self.struct_types.len());
        let mut remaining: Vec<&StructType> = self.struct_types.iter().collect();

        while !remaining.is_empty() {
            let mut progressed = false;
            let mut deferred = Vec::new();
            for typ in remaining {
                let ready = match &typ.super_type {
                    None => true,
                    Some(super_type) => sorted.iter().any(|t| t.name == *super_type),
                };
                if ready {
                    sorted.push(typ);
                    progressed = true;
                } else {
                    deferred.push(typ);
                }
            }
            if !progressed {
                let names = deferred.iter().map(|t| t.name.to_string()).join(", ");
                bail!(CodegenError::CyclicSubtype(names));
            }
            remaining = deferred;
        }

        Ok(sorted)
    }
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}
