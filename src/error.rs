use crate::ir::{ClassName, FieldName};
use crate::wasm::LabelId;
use thiserror::Error;

/// Programmer errors raised by the back-end.
///
/// Every variant indicates a malformed or internally inconsistent input; none is recoverable at
/// run time. The back-end fails fast with a diagnostic naming the offending entity and never
/// retries. Errors travel inside [`anyhow::Error`] values, so callers and tests can
/// `downcast_ref` to this enum.
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("class not found: {0}")]
    ClassNotFound(ClassName),
    #[error("method not found: {method} on {class}")]
    MethodNotFound { class: ClassName, method: String },
    #[error("field not found: {field} on {class}")]
    FieldNotFound { class: ClassName, field: FieldName },
    #[error("label out of scope: {0:?}")]
    LabelOutOfScope(LabelId),
    #[error("local index requested outside a function body")]
    LocalsUnavailable,
    #[error("opcode too wide: {0:#x}")]
    OpcodeTooWide(u32),
    #[error("cyclic subtype relation among struct types: {0}")]
    CyclicSubtype(String),
    #[error("unsupported immediate: {0}")]
    UnsupportedImmediate(&'static str),
}
