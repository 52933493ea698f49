//! Index spaces of the Wasm binary format. Declarations are referenced by name while the module
//! is built; this registry assigns them their dense indices at emission time.

use crate::error::CodegenError;
use crate::wasm::{
    FunctionName, GlobalName, ImportDesc, LocalName, Module, StructType, TypeName, ValType,
};
use std::collections::HashMap;

/// Maps every declared name to its index in its Wasm index space.
///
/// - **type**: recursive-group struct types (topologically sorted), then interned function
///   types, then array types
/// - **func**: imports first, then defined functions, in declaration order
/// - **global**: declaration order
/// - **local**: per-function frame, parameters first, then non-parameter locals, dense from 0
pub struct NameRegistry {
    types: HashMap<TypeName, u32>,
    functions: HashMap<FunctionName, u32>,
    globals: HashMap<GlobalName, u32>,
    locals: Option<HashMap<LocalName, u32>>,
}

impl NameRegistry {
    /// Builds the type, function and global index spaces for a module. `rec_structs` must be the
    /// module's struct types in the topological order they will be emitted in.
    pub fn new(module: &Module, rec_structs: &[&StructType]) -> Self {
        let mut types = HashMap::new();
        let mut next_type = 0u32;
        for typ in rec_structs {
            types.insert(typ.name.clone(), next_type);
            next_type += 1;
        }
        for typ in module.function_types() {
            types.insert(TypeName::Function(typ.name), next_type);
            next_type += 1;
        }
        for typ in module.array_types() {
            types.insert(typ.name.clone(), next_type);
            next_type += 1;
        }

        let mut functions = HashMap::new();
        let mut next_function = 0u32;
        for import in module.imports() {
            let ImportDesc::Func { name, .. } = &import.desc;
            functions.insert(name.clone(), next_function);
            next_function += 1;
        }
        for function in module.functions() {
            functions.insert(function.name.clone(), next_function);
            next_function += 1;
        }

        let globals = module
            .globals()
            .iter()
            .enumerate()
            .map(|(i, g)| (g.name.clone(), i as u32))
            .collect();

        Self {
            types,
            functions,
            globals,
            locals: None,
        }
    }

    pub fn type_idx(&self, name: &TypeName) -> anyhow::Result<u32> {
        match self.types.get(name) {
            Some(index) => Ok(*index),
            None => bail!("Type not declared: {}", name),
        }
    }

    pub fn func_idx(&self, name: &FunctionName) -> anyhow::Result<u32> {
        match self.functions.get(name) {
            Some(index) => Ok(*index),
            None => bail!("Function not declared: {}", name),
        }
    }

    pub fn global_idx(&self, name: &GlobalName) -> anyhow::Result<u32> {
        match self.globals.get(name) {
            Some(index) => Ok(*index),
            None => bail!("Global not declared: {}", name),
        }
    }

    /// Opens the local-index frame of a function body: parameters first, then non-parameter
    /// locals, both in declaration order.
    pub fn push_local_frame(
        &mut self,
        params: &[(LocalName, ValType)],
        locals: &[(LocalName, ValType)],
    ) {
        let frame = params
            .iter()
            .chain(locals.iter())
            .enumerate()
            .map(|(i, (name, _))| (name.clone(), i as u32))
            .collect();
        self.locals = Some(frame);
    }

    /// Closes the current local-index frame.
    pub fn pop_local_frame(&mut self) {
        self.locals = None;
    }

    /// Looks up a local's index in the current frame. Fails with
    /// [`CodegenError::LocalsUnavailable`] outside a function body.
    pub fn local_idx(&self, name: &LocalName) -> anyhow::Result<u32> {
        let frame = match &self.locals {
            Some(frame) => frame,
            None => bail!(CodegenError::LocalsUnavailable),
        };
        match frame.get(name) {
            Some(index) => Ok(*index),
            None => bail!("Local not declared: {}", name),
        }
    }
}
