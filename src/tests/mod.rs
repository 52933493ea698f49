//! Integration tests and common testing helper functions. Unit tests are located within their
//! related implementation files.

mod emit;
mod helpers;
mod start;

pub use helpers::*;
