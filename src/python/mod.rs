//! Static introspection of Python packages.
//!
//! Packages are located on a list of search paths and parsed straight from source into a
//! tree of [`Object`]s. Nothing is imported or executed.

/// Docstring model and Google-style parsing.
pub mod docstring;
mod error;
/// Package discovery and path resolution.
pub mod loader;
/// Object tree types.
pub mod model;
/// Source parsing into objects.
pub mod parse;
/// Function signatures.
pub mod signature;

pub use self::docstring::{Docstring, DocstringSection, SectionItem, cleandoc, normalize, parse_google};
pub use self::error::LoadError;
pub use self::loader::{Loader, Package, interpreter_search_paths, parent_prefix, split_module_path};
pub use self::model::{Location, Object, ObjectCategory, ObjectKind};
pub use self::signature::{Parameter, ParameterKind};
