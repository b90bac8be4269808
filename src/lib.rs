//! Core library for pydocmd, which expands `:::` placeholder blocks in markdown into
//! generated Python API documentation.
//!
//! Python packages are introspected statically from source on disk; the high-level
//! [`Processor`] API scans a document, resolves each block's object, and substitutes the
//! rendered markdown in place.

/// Placeholder block scanning and parsing.
pub mod blocks;

/// Core API for pydocmd operations.
pub mod core_api;

/// Static introspection of Python packages.
pub mod python;

/// Rendering of Python objects to markdown.
pub mod render;

// Re-export main public API from core_api
pub use crate::core_api::{
	BlockFailure, ListTreeNode, ProcessReport, Processor, PydocError, Result, build_list_tree,
	list_tree_json, load_options_file, parse_option_override,
};
pub use crate::render::{RenderConfig, default_options};
