mod buffer;
mod emit;
mod registry;

pub use buffer::Buffer;
pub use emit::emit_module;
pub use registry::NameRegistry;
