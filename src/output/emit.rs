//! The binary emitter. Serializes a fully populated [`Module`] to bytes following the Wasm core
//! binary format extended with the typed-references and GC proposals.
//!
//! Emission is a read-only phase: the module must not be mutated once it starts. Declarations
//! are referenced by name throughout the build phase; this pass resolves every name to its dense
//! index, every label identity to its relative depth, and every section to its byte length.

use crate::error::CodegenError;
use crate::output::buffer::Buffer;
use crate::output::registry::NameRegistry;
use crate::wasm::{
    BlockType, CastFlags, ExportKind, FieldType, Function, HeapType, ImportDesc, Instr, LabelId,
    Module, StorageType, StructType, TypeName, ValType,
};
use std::mem;

const SECTION_TYPE: u8 = 0x01;
const SECTION_IMPORT: u8 = 0x02;
const SECTION_FUNCTION: u8 = 0x03;
const SECTION_GLOBAL: u8 = 0x06;
const SECTION_EXPORT: u8 = 0x07;
const SECTION_START: u8 = 0x08;
const SECTION_CODE: u8 = 0x0A;

/// Serializes the module to a `.wasm` byte vector.
pub fn emit_module(module: &Module) -> anyhow::Result<Vec<u8>> {
    info!(
        "Emitting WebAssembly module ({} imports, {} functions, {} globals)...",
        module.imports().len(),
        module.functions().len(),
        module.globals().len(),
    );
    let mut emitter = Emitter::new(module)?;
    emitter.emit()?;
    Ok(emitter.buf.into_bytes())
}

struct Emitter<'a> {
    module: &'a Module,
    /// Struct types in the topological order they are emitted in.
    rec_structs: Vec<&'a StructType>,
    registry: NameRegistry,
    buf: Buffer,
    /// Scope stack of open structured instructions; unlabeled frames still consume a depth slot.
    labels: Vec<Option<LabelId>>,
}

impl<'a> Emitter<'a> {
    fn new(module: &'a Module) -> anyhow::Result<Self> {
        let rec_structs = module.rec_group_types()?;
        let registry = NameRegistry::new(module, &rec_structs);
        Ok(Self {
            module,
            rec_structs,
            registry,
            buf: Buffer::new(),
            labels: Vec::new(),
        })
    }

    fn emit(&mut self) -> anyhow::Result<()> {
        // Preamble: magic and version
        self.buf.extend(b"\0asm");
        self.buf.extend(&[0x01, 0x00, 0x00, 0x00]);

        self.type_section()?;
        if !self.module.imports().is_empty() {
            self.import_section()?;
        }
        if !self.module.functions().is_empty() {
            self.function_section()?;
        }
        if !self.module.globals().is_empty() {
            self.global_section()?;
        }
        if !self.module.exports().is_empty() {
            self.export_section()?;
        }
        if let Some(start) = self.module.start() {
            let index = self.registry.func_idx(start)?;
            self.section(SECTION_START, |e| {
                e.buf.u32(index);
                Ok(())
            })?;
        }
        if !self.module.functions().is_empty() {
            self.code_section()?;
        }
        Ok(())
    }

    /// Emits the bytes produced by `f` prefixed with their byte length.
    fn byte_length_sub_section<F>(&mut self, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut Self) -> anyhow::Result<()>,
    {
        let outer = mem::take(&mut self.buf);
        f(self)?;
        let inner = mem::replace(&mut self.buf, outer);
        self.buf.u32(inner.len() as u32);
        self.buf.extend(inner.as_slice());
        Ok(())
    }

    fn section<F>(&mut self, id: u8, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut Self) -> anyhow::Result<()>,
    {
        self.buf.byte(id);
        self.byte_length_sub_section(f)
    }

    /// Emits the type section: a single recursive group containing every struct type
    /// (topologically sorted), then every interned function type, then every array type. Dense
    /// type indices are assigned in exactly this order.
    fn type_section(&mut self) -> anyhow::Result<()> {
        self.section(SECTION_TYPE, |e| {
            let module = e.module;
            let rec_structs = e.rec_structs.clone();
            e.buf.u32(1); // one recursive group
            e.buf.byte(0x4E); // rectype
            let count =
                rec_structs.len() + module.function_types().len() + module.array_types().len();
            e.buf.u32(count as u32);
            for typ in rec_structs {
                e.struct_type(typ)?;
            }
            for typ in module.function_types() {
                e.buf.byte(0x60); // func
                e.result_type(&typ.params)?;
                e.result_type(&typ.results)?;
            }
            for typ in module.array_types() {
                e.buf.byte(0x5E); // array
                e.field_type(&typ.field)?;
            }
            Ok(())
        })
    }

    fn struct_type(&mut self, typ: &StructType) -> anyhow::Result<()> {
        self.buf.byte(0x50); // sub
        let super_idx = match &typ.super_type {
            Some(name) => Some(self.registry.type_idx(name)?),
            None => None,
        };
        self.buf.opt(super_idx.as_ref(), |b, idx| b.u32(*idx));
        self.buf.byte(0x5F); // struct
        self.buf.u32(typ.fields.len() as u32);
        for field in &typ.fields {
            self.field_type(field)?;
        }
        Ok(())
    }

    fn field_type(&mut self, field: &FieldType) -> anyhow::Result<()> {
        self.storage_type(&field.typ)?;
        self.buf.boolean(field.mutable);
        Ok(())
    }

    fn result_type(&mut self, types: &[ValType]) -> anyhow::Result<()> {
        self.buf.u32(types.len() as u32);
        for typ in types {
            self.val_type(typ)?;
        }
        Ok(())
    }

    fn import_section(&mut self) -> anyhow::Result<()> {
        self.section(SECTION_IMPORT, |e| {
            let module = e.module;
            e.buf.u32(module.imports().len() as u32);
            for import in module.imports() {
                e.buf.name(&import.module);
                e.buf.name(&import.field);
                let ImportDesc::Func { typ, .. } = &import.desc;
                let index = e.registry.type_idx(&TypeName::Function(*typ))?;
                e.buf.byte(0x00); // func
                e.buf.u32(index);
            }
            Ok(())
        })
    }

    fn function_section(&mut self) -> anyhow::Result<()> {
        self.section(SECTION_FUNCTION, |e| {
            let module = e.module;
            e.buf.u32(module.functions().len() as u32);
            for function in module.functions() {
                let index = e.registry.type_idx(&TypeName::Function(function.typ))?;
                e.buf.u32(index);
            }
            Ok(())
        })
    }

    fn global_section(&mut self) -> anyhow::Result<()> {
        self.section(SECTION_GLOBAL, |e| {
            let module = e.module;
            e.buf.u32(module.globals().len() as u32);
            for global in module.globals() {
                e.val_type(&global.typ)?;
                e.buf.boolean(global.mutable);
                e.expr(&global.init)?;
            }
            Ok(())
        })
    }

    fn export_section(&mut self) -> anyhow::Result<()> {
        self.section(SECTION_EXPORT, |e| {
            let module = e.module;
            e.buf.u32(module.exports().len() as u32);
            for export in module.exports() {
                e.buf.name(&export.name);
                match &export.kind {
                    ExportKind::Func(name) => {
                        let index = e.registry.func_idx(name)?;
                        e.buf.byte(0x00);
                        e.buf.u32(index);
                    }
                    ExportKind::Global(name) => {
                        let index = e.registry.global_idx(name)?;
                        e.buf.byte(0x03);
                        e.buf.u32(index);
                    }
                }
            }
            Ok(())
        })
    }

    fn code_section(&mut self) -> anyhow::Result<()> {
        self.section(SECTION_CODE, |e| {
            let module = e.module;
            e.buf.u32(module.functions().len() as u32);
            for function in module.functions() {
                e.byte_length_sub_section(|e| e.function_body(function))?;
            }
            Ok(())
        })
    }

    /// Emits a function body: the non-parameter locals (one count-1 run each), then the body
    /// expression. Parameters are implicit in the function's type and take the leading local
    /// indices.
    fn function_body(&mut self, function: &Function) -> anyhow::Result<()> {
        self.registry.push_local_frame(&function.params, &function.locals);
        self.buf.u32(function.locals.len() as u32);
        for (_, typ) in &function.locals {
            self.buf.u32(1);
            self.val_type(typ)?;
        }
        self.expr(&function.body)?;
        if !self.labels.is_empty() {
            bail!("Unbalanced structured instructions in {}", function.name);
        }
        self.registry.pop_local_frame();
        Ok(())
    }

    fn expr(&mut self, instrs: &[Instr]) -> anyhow::Result<()> {
        for instr in instrs {
            self.instr(instr)?;
        }
        self.buf.byte(0x0B); // end
        Ok(())
    }

    /// Emits one instruction: its opcode, then its immediates, then the scope-stack bookkeeping
    /// for structured instructions.
    fn instr(&mut self, instr: &Instr) -> anyhow::Result<()> {
        // Declared but unsupported immediates are rejected before any byte is written
        match instr {
            Instr::BrTable(..) => bail!(CodegenError::UnsupportedImmediate("LabelIdxVector")),
            Instr::CallIndirect(..) => bail!(CodegenError::UnsupportedImmediate("TableIdx")),
            Instr::Throw(_) => bail!(CodegenError::UnsupportedImmediate("TagIdx")),
            _ => {}
        }

        self.opcode(instr.opcode())?;

        match instr {
            Instr::Block(block_type, _) | Instr::Loop(block_type, _) | Instr::If(block_type, _) => {
                self.block_type(block_type)?;
            }
            Instr::Br(label)
            | Instr::BrIf(label)
            | Instr::BrOnNull(label)
            | Instr::BrOnNonNull(label) => {
                let depth = self.resolve_label(label)?;
                self.buf.u32(depth);
            }
            Instr::Call(name) | Instr::RefFunc(name) => {
                let index = self.registry.func_idx(name)?;
                self.buf.u32(index);
            }
            Instr::CallRef(typ) => {
                let index = self.registry.type_idx(&TypeName::Function(*typ))?;
                self.buf.u32(index);
            }
            Instr::LocalGet(name) | Instr::LocalSet(name) | Instr::LocalTee(name) => {
                let index = self.registry.local_idx(name)?;
                self.buf.u32(index);
            }
            Instr::GlobalGet(name) | Instr::GlobalSet(name) => {
                let index = self.registry.global_idx(name)?;
                self.buf.u32(index);
            }
            Instr::I32Load(mem_arg)
            | Instr::I64Load(mem_arg)
            | Instr::I32Store(mem_arg)
            | Instr::I64Store(mem_arg) => {
                self.buf.u32(mem_arg.offset);
                self.buf.u32(mem_arg.align);
            }
            Instr::I32Const(v) => self.buf.i32(*v),
            Instr::I64Const(v) => self.buf.i64(*v),
            Instr::F32Const(v) => self.buf.f32(*v),
            Instr::F64Const(v) => self.buf.f64(*v),
            Instr::RefNull(heap_type)
            | Instr::RefTest(heap_type)
            | Instr::RefTestNull(heap_type)
            | Instr::RefCast(heap_type)
            | Instr::RefCastNull(heap_type) => self.heap_type(heap_type)?,
            Instr::StructNew(typ)
            | Instr::StructNewDefault(typ)
            | Instr::ArrayNew(typ)
            | Instr::ArrayNewDefault(typ)
            | Instr::ArrayGet(typ)
            | Instr::ArraySet(typ) => {
                let index = self.registry.type_idx(typ)?;
                self.buf.u32(index);
            }
            Instr::StructGet(typ, field) | Instr::StructSet(typ, field) => {
                let index = self.registry.type_idx(typ)?;
                self.buf.u32(index);
                self.buf.u32(*field);
            }
            Instr::ArrayNewFixed(typ, len) => {
                let index = self.registry.type_idx(typ)?;
                self.buf.u32(index);
                self.buf.u32(*len);
            }
            Instr::BrOnCast(flags, label, from, to)
            | Instr::BrOnCastFail(flags, label, from, to) => {
                self.cast_flags(flags);
                let depth = self.resolve_label(label)?;
                self.buf.u32(depth);
                self.heap_type(from)?;
                self.heap_type(to)?;
            }
            // Everything else is opcode-only
            Instr::Unreachable
            | Instr::Nop
            | Instr::Else
            | Instr::End
            | Instr::Return
            | Instr::Drop
            | Instr::Select
            | Instr::I32Eqz
            | Instr::I32Eq
            | Instr::I32Ne
            | Instr::I32LtS
            | Instr::I32GtS
            | Instr::I32LeS
            | Instr::I32GeS
            | Instr::I64Eqz
            | Instr::I64Eq
            | Instr::F64Eq
            | Instr::F64Lt
            | Instr::I32Add
            | Instr::I32Sub
            | Instr::I32Mul
            | Instr::I32DivS
            | Instr::I32RemS
            | Instr::I32And
            | Instr::I32Or
            | Instr::I32Xor
            | Instr::I32Shl
            | Instr::I32ShrS
            | Instr::I32ShrU
            | Instr::I64Add
            | Instr::I64Sub
            | Instr::I64Mul
            | Instr::F64Add
            | Instr::F64Sub
            | Instr::F64Mul
            | Instr::F64Div
            | Instr::I32WrapI64
            | Instr::I64ExtendI32S
            | Instr::F64ConvertI32S
            | Instr::RefIsNull
            | Instr::RefEq
            | Instr::RefAsNonNull
            | Instr::ArrayLen
            | Instr::AnyConvertExtern
            | Instr::ExternConvertAny
            | Instr::RefI31
            | Instr::I31GetS
            | Instr::I31GetU => {}
            // Rejected above
            Instr::BrTable(..) | Instr::CallIndirect(..) | Instr::Throw(_) => unreachable!(),
        }

        if let Some(label) = instr.structured_label() {
            self.labels.push(label);
        } else if let Instr::End = instr {
            if self.labels.pop().is_none() {
                bail!("Unbalanced end instruction");
            }
        }
        Ok(())
    }

    /// Writes a 1-byte opcode directly, or a 2-byte opcode big-endian. Anything wider is an
    /// error.
    fn opcode(&mut self, opcode: u32) -> anyhow::Result<()> {
        if opcode <= 0xFF {
            self.buf.byte(opcode as u8);
        } else if opcode <= 0xFFFF {
            self.buf.byte((opcode >> 8) as u8);
            self.buf.byte((opcode & 0xFF) as u8);
        } else {
            bail!(CodegenError::OpcodeTooWide(opcode));
        }
        Ok(())
    }

    /// Resolves a label identity to its relative depth: the distance from the top of the scope
    /// stack to the nearest enclosing frame carrying that identity.
    fn resolve_label(&self, label: &LabelId) -> anyhow::Result<u32> {
        match self.labels.iter().rev().position(|l| *l == Some(*label)) {
            Some(depth) => Ok(depth as u32),
            None => bail!(CodegenError::LabelOutOfScope(*label)),
        }
    }

    fn cast_flags(&mut self, flags: &CastFlags) {
        self.buf
            .byte(flags.nullable_from as u8 | (flags.nullable_to as u8) << 1);
    }

    fn block_type(&mut self, block_type: &BlockType) -> anyhow::Result<()> {
        match block_type {
            BlockType::Empty => self.buf.byte(0x40),
            BlockType::Value(typ) => self.val_type(typ)?,
            BlockType::Func(typ) => {
                let index = self.registry.type_idx(&TypeName::Function(*typ))?;
                self.buf.s33_of_u32(index);
            }
        }
        Ok(())
    }

    fn val_type(&mut self, typ: &ValType) -> anyhow::Result<()> {
        match typ {
            ValType::I32 => self.buf.byte(0x7F),
            ValType::I64 => self.buf.byte(0x7E),
            ValType::F32 => self.buf.byte(0x7D),
            ValType::F64 => self.buf.byte(0x7C),
            ValType::AnyRef => self.buf.byte(0x6E),
            ValType::Ref(heap_type) => {
                self.buf.byte(0x64);
                self.heap_type(heap_type)?;
            }
            ValType::RefNull(heap_type) => {
                self.buf.byte(0x63);
                self.heap_type(heap_type)?;
            }
        }
        Ok(())
    }

    fn storage_type(&mut self, typ: &StorageType) -> anyhow::Result<()> {
        match typ {
            StorageType::Val(typ) => self.val_type(typ)?,
            StorageType::I8 => self.buf.byte(0x78),
            StorageType::I16 => self.buf.byte(0x77),
        }
        Ok(())
    }

    /// A simple heap type is one byte; a type reference is an s33-encoded type index so the high
    /// bit of a large index is not mistaken for a simple heap-type code.
    fn heap_type(&mut self, heap_type: &HeapType) -> anyhow::Result<()> {
        match heap_type {
            HeapType::Simple(simple) => self.buf.byte(simple.code()),
            HeapType::Type(name) => {
                let index = self.registry.type_idx(name)?;
                self.buf.s33_of_u32(index);
            }
            HeapType::Func(typ) => {
                let index = self.registry.type_idx(&TypeName::Function(*typ))?;
                self.buf.s33_of_u32(index);
            }
        }
        Ok(())
    }
}
