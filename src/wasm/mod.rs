//! The Wasm object model: names, type definitions, instructions and the module store the binary
//! emitter serializes.

mod instructions;
mod module;
mod names;
mod types;

pub use self::instructions::*;
pub use self::module::*;
pub use self::names::*;
pub use self::types::*;
