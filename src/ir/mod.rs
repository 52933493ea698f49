//! Definitions of the input IR: names, the type lattice, expression trees and linked classes.
//! This is the contract between the upstream linker and the back-end.

mod names;
mod trees;
mod types;

pub use self::names::*;
pub use self::trees::*;
pub use self::types::*;
