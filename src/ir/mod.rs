//! The typed symbol graph data model (spec §3, component C2).

pub mod file;
pub mod import;
pub mod module;
pub mod package;
pub mod position;
pub mod reference;
pub mod symbol;

pub use file::File;
pub use import::Import;
pub use module::Module;
pub use package::{Package, TypeInfo};
pub use position::{PositionTable, SourceRange};
pub use reference::Reference;
pub use symbol::{is_exported_name, ReferenceKind, Symbol, SymbolId, SymbolKind};
