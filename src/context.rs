use crate::classes::ClassInfo;
use crate::error::CodegenError;
use crate::helpers;
use crate::ir::{ClassName, ModuleInitializer};
use crate::wasm::{
    Function, FunctionName, FunctionType, FunctionTypeName, Global, GlobalName, Instr, Module,
    Signature, ValType,
};
use itertools::Itertools;
use std::collections::HashMap;

/// Shared state of a single compilation: the module store, the class-info table and the
/// deduplicating interners.
///
/// The context exclusively owns the module and the class infos. The preprocessor mutates the
/// class-info table through a mutable borrow; the planner and the emitter only ever read. All
/// collections are append-only until emission, which is a read-only phase.
pub struct Context {
    module: Module,
    class_infos: HashMap<ClassName, ClassInfo>,
    signatures: HashMap<Signature, FunctionTypeName>,
    strings: HashMap<String, GlobalName>,
    /// Interned strings in first-encounter order, so start instructions are deterministic.
    string_order: Vec<String>,
    next_string_index: u32,
}

impl Context {
    /// Creates a context with an empty module and every runtime helper registered as a function
    /// import.
    pub fn new() -> Self {
        let mut ctx = Self {
            module: Module::new(),
            class_infos: HashMap::new(),
            signatures: HashMap::new(),
            strings: HashMap::new(),
            string_order: Vec::new(),
            next_string_index: 1,
        };
        helpers::register_helper_imports(&mut ctx);
        ctx
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut Module {
        &mut self.module
    }

    pub fn add_class_info(&mut self, info: ClassInfo) {
        self.class_infos.insert(info.name.clone(), info);
    }

    pub fn class_info(&self, name: &ClassName) -> anyhow::Result<&ClassInfo> {
        match self.class_infos.get(name) {
            Some(info) => Ok(info),
            None => bail!(CodegenError::ClassNotFound(name.clone())),
        }
    }

    pub(crate) fn class_info_mut(&mut self, name: &ClassName) -> anyhow::Result<&mut ClassInfo> {
        match self.class_infos.get_mut(name) {
            Some(info) => Ok(info),
            None => bail!(CodegenError::ClassNotFound(name.clone())),
        }
    }

    /// Interns a function signature, returning the existing name if an equal signature was seen
    /// before and otherwise registering a fresh function type under the next dense index.
    pub fn intern_signature(&mut self, signature: Signature) -> FunctionTypeName {
        if let Some(name) = self.signatures.get(&signature) {
            return *name;
        }
        let name = FunctionTypeName(self.signatures.len() as u32);
        self.signatures.insert(signature.clone(), name);
        self.module.add_function_type(FunctionType::new(name, signature));
        name
    }

    /// Interns a constant string, returning its global.
    ///
    /// On first encounter this registers a mutable global of type `ref any` whose initializer is
    /// a placeholder `i31` (a legal constant expression of a compatible type); the real string is
    /// constructed by the start function. Indices are dense and start at 1.
    pub fn intern_string(&mut self, s: &str) -> GlobalName {
        if let Some(name) = self.strings.get(s) {
            return name.clone();
        }
        let name = GlobalName::StringConstant(self.next_string_index);
        self.next_string_index += 1;
        self.strings.insert(s.to_string(), name.clone());
        self.string_order.push(s.to_string());
        self.module.add_global(Global {
            name: name.clone(),
            typ: ValType::ref_any(),
            mutable: true,
            init: vec![Instr::I32Const(0), Instr::RefI31],
        });
        name
    }

    /// Assembles the start function: string-constant construction first, then the module
    /// initializers. If nothing needs to run at instantiation, no start function is synthesized.
    pub fn complete(&mut self, module_initializers: &[ModuleInitializer]) {
        let mut instrs = Vec::new();

        // Build each interned string from its UTF-16 units and store it into its global
        for s in &self.string_order {
            let global = self.strings[s].clone();
            instrs.push(Instr::Call(FunctionName::helper("emptyString")));
            for unit in s.encode_utf16() {
                instrs.push(Instr::I32Const(unit as i32));
                instrs.push(Instr::Call(FunctionName::helper("charToString")));
                instrs.push(Instr::Call(FunctionName::helper("stringConcat")));
            }
            instrs.push(Instr::GlobalSet(global));
        }

        for initializer in module_initializers {
            match initializer {
                ModuleInitializer::VoidMainMethod(class, method) => {
                    instrs.push(Instr::Call(FunctionName::LoadModule(class.clone())));
                    instrs.push(Instr::RefAsNonNull);
                    instrs.push(Instr::Call(FunctionName::Method(class.clone(), method.clone())));
                }
                ModuleInitializer::MainMethodWithArgs(class, method, _) => {
                    // TODO: build the argument array once the runtime exposes a string-array
                    //  constructor, then dispatch like the void form
                    warn!("Ignoring main-with-args initializer {}.{}", class, method);
                }
            }
        }

        if !instrs.is_empty() {
            let typ = self.intern_signature(Signature::new(vec![], vec![]));
            self.module.add_function(Function {
                name: FunctionName::Start,
                typ,
                params: vec![],
                locals: vec![],
                body: instrs,
            });
            self.module.set_start(FunctionName::Start);
        }
    }

    /// Logs the class-info table at debug level, sorted by class name.
    pub fn dump(&self) {
        for name in self.class_infos.keys().sorted() {
            self.class_infos[name].dump();
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::{HELPERS, HELPER_CLASS};
    use crate::wasm::ImportDesc;

    #[test]
    fn intern_signature_deduplicates() {
        let mut ctx = Context::new();
        let sig = Signature::new(vec![ValType::I32], vec![ValType::I64]);
        let first = ctx.intern_signature(sig.clone());
        let second = ctx.intern_signature(sig);
        assert_eq!(first, second);

        let other = ctx.intern_signature(Signature::new(vec![ValType::I64], vec![ValType::I32]));
        assert_ne!(first, other);
        assert_eq!(other.index(), first.index() + 1);
    }

    #[test]
    fn interned_signatures_appear_exactly_once() {
        let mut ctx = Context::new();
        let sig = Signature::new(vec![ValType::F64], vec![]);
        ctx.intern_signature(sig.clone());
        ctx.intern_signature(sig.clone());
        let matching = ctx
            .module()
            .function_types()
            .iter()
            .filter(|t| t.params == sig.params && t.results == sig.results)
            .count();
        assert_eq!(matching, 1);
        // Names are dense in interning order
        for (i, typ) in ctx.module().function_types().iter().enumerate() {
            assert_eq!(typ.name.index(), i as u32);
        }
    }

    #[test]
    fn intern_string_allocates_dense_indices_from_one() {
        let mut ctx = Context::new();
        let globals_before = ctx.module().globals().len();
        let first = ctx.intern_string("a");
        let again = ctx.intern_string("a");
        let second = ctx.intern_string("b");
        assert_eq!(first, GlobalName::StringConstant(1));
        assert_eq!(again, GlobalName::StringConstant(1));
        assert_eq!(second, GlobalName::StringConstant(2));
        assert_eq!(ctx.module().globals().len(), globals_before + 2);

        // Placeholder initializer is an i31, the real value is built at start
        let global = &ctx.module().globals()[globals_before];
        assert!(global.mutable);
        assert_eq!(global.typ, ValType::ref_any());
        assert_eq!(global.init, vec![Instr::I32Const(0), Instr::RefI31]);
    }

    #[test]
    fn new_context_registers_the_helper_catalogue() {
        let ctx = Context::new();
        let imports = ctx.module().imports();
        assert_eq!(imports.len(), HELPERS.len());
        let char_to_string = imports
            .iter()
            .find(|i| i.field == "charToString")
            .expect("charToString import");
        assert_eq!(char_to_string.module, HELPER_CLASS);
        let ImportDesc::Func { name, .. } = &char_to_string.desc;
        assert_eq!(*name, FunctionName::helper("charToString"));
    }

    #[test]
    fn complete_without_work_synthesizes_no_start() {
        let mut ctx = Context::new();
        ctx.complete(&[]);
        assert!(ctx.module().start().is_none());
        assert!(ctx.module().functions().is_empty());
    }
}
