//! Back-end lowering a linked, class-based intermediate representation into a WebAssembly module
//! using the GC and typed-reference proposals.
//!
//! The pipeline is single-threaded and phase-separated: the preprocessor builds per-class
//! information (recovering the abstract method slots the upstream linker erased), the planner
//! derives vtable and itable layouts, the external instruction selector emits function bodies
//! through the [`Context`], and finally the binary emitter serializes the module store to bytes.

mod classes;
mod context;
mod error;
pub mod helpers;
mod ir;
mod output;
#[cfg(test)]
mod tests;
mod virtuals;
mod wasm;

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[cfg(test)]
#[macro_use]
extern crate maplit;

pub use crate::classes::{preprocess, ClassInfo, FieldInfo, FunctionInfo, IMPLICIT_FIELDS};
pub use crate::context::Context;
pub use crate::error::CodegenError;
pub use crate::ir::*;
pub use crate::output::{emit_module, Buffer, NameRegistry};
pub use crate::virtuals::{VTable, VirtualTables};
pub use crate::wasm::*;
