//! Python source units, read with tree-sitter.

pub mod calls;
pub mod collector;
pub mod syntax;

pub use calls::TreeSitterCallParser;
pub use collector::{ModuleLocation, PythonCollector};
