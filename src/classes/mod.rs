mod preprocess;
mod types;

pub use self::preprocess::*;
pub use self::types::*;
