//! Core library for pydocmd, providing the main API for expanding placeholder blocks.
//!
//! The [`Processor`] orchestrates block scanning, package loading, docstring normalization
//! and rendering. It is UI-agnostic and can be driven by the CLI or embedded in other tools.

/// Error helpers for the core API.
pub mod error;
/// Hierarchical tree structure for inspect output.
pub mod list_tree;

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

pub use self::error::{PydocError, Result};
pub use self::list_tree::{ListItem, ListTreeNode, build_list_tree, list_items, list_tree_json};
use crate::blocks::{RawBlock, Token, parse_block, scan};
use crate::python::{Loader, Package, normalize, parent_prefix, split_module_path};
use crate::render::{RenderConfig, block_options, render_object_docs, strip_heading_prefix};

/// A block whose expansion failed and was replaced by an error comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFailure {
	/// 1-based line of the block's marker.
	pub line: usize,
	/// Module path written after the marker.
	pub module_path: String,
	/// The error comment emitted in place of the block.
	pub message: String,
}

/// Outcome of processing one document.
#[derive(Debug, Clone, Default)]
pub struct ProcessReport {
	/// The assembled document.
	pub output: String,
	/// Number of placeholder blocks found.
	pub blocks: usize,
	/// Blocks that produced an error comment.
	pub failures: Vec<BlockFailure>,
}

/// Expands `:::` placeholder blocks in markdown into generated Python API documentation.
#[derive(Debug, Clone)]
pub struct Processor {
	/// Directories searched for packages, in order.
	search_paths: Vec<PathBuf>,

	/// User-level default options, layered between built-in defaults and block options.
	default_options: Mapping,
}

impl Default for Processor {
	fn default() -> Self {
		Self::new()
	}
}

/// Inline comment that replaces a block whose expansion failed.
fn failure_comment(module_path: &str, error: &PydocError) -> String {
	match error {
		PydocError::Block(e) => format!("<!-- Error processing block: {e} -->"),
		e => format!("<!-- Error generating docs for {module_path}: {e} -->"),
	}
}

impl Processor {
	/// Creates a processor that searches the current directory.
	pub fn new() -> Self {
		Self {
			search_paths: vec![PathBuf::from(".")],
			default_options: Mapping::new(),
		}
	}

	/// Replaces the package search paths.
	pub fn with_search_paths(mut self, search_paths: Vec<PathBuf>) -> Self {
		self.search_paths = search_paths;
		self
	}

	/// Appends a package search path.
	pub fn with_search_path(mut self, search_path: impl Into<PathBuf>) -> Self {
		self.search_paths.push(search_path.into());
		self
	}

	/// Sets user-level default render options.
	pub fn with_default_options(mut self, options: Mapping) -> Self {
		self.default_options = options;
		self
	}

	/// Returns the configured search paths.
	pub fn search_paths(&self) -> &[PathBuf] {
		&self.search_paths
	}

	/// Returns the user-level default options.
	pub fn default_options(&self) -> &Mapping {
		&self.default_options
	}

	fn loader(&self) -> Loader {
		Loader::new(self.search_paths.clone())
	}

	/// Read `input`, expand every block, write the result to `output` when given, and return it.
	pub fn process_file(&self, input: impl AsRef<Path>, output: Option<&Path>) -> Result<String> {
		Ok(self.process_file_report(input, output)?.output)
	}

	/// Like [`Processor::process_file`], also reporting per-block failures.
	pub fn process_file_report(&self, input: impl AsRef<Path>, output: Option<&Path>) -> Result<ProcessReport> {
		let input = input.as_ref();
		debug!(path = %input.display(), "processing file");
		let content = fs::read_to_string(input)?;
		let report = self.process_markdown_report(&content);
		if let Some(output) = output {
			fs::write(output, &report.output)?;
		}
		Ok(report)
	}

	/// Expand every block in `content` in one left-to-right pass.
	pub fn process_markdown(&self, content: &str) -> String {
		self.process_markdown_report(content).output
	}

	/// Like [`Processor::process_markdown`], also reporting per-block failures.
	pub fn process_markdown_report(&self, content: &str) -> ProcessReport {
		let mut report = ProcessReport {
			output: String::with_capacity(content.len()),
			..ProcessReport::default()
		};

		for token in scan(content) {
			let block = match token {
				Token::Text(text) => {
					report.output.push_str(text);
					continue;
				}
				Token::Block(block) => block,
			};
			report.blocks += 1;

			let fragment = match self.expand_block(&block) {
				Ok(fragment) => fragment,
				Err(comment) => {
					report.failures.push(BlockFailure {
						line: block.line,
						module_path: block.module_path().to_string(),
						message: comment.clone(),
					});
					comment
				}
			};
			report.output.push_str(fragment.trim_end_matches('\n'));
			if block.ends_with_newline() {
				report.output.push('\n');
			}
		}
		report
	}

	/// Expand one block; a failure carries the comment that replaces it.
	fn expand_block(&self, block: &RawBlock<'_>) -> std::result::Result<String, String> {
		let parsed = parse_block(block.text).map_err(|e| {
			let e = PydocError::from(e);
			warn!(line = block.line, error = %e, "failed to process block");
			failure_comment(block.module_path(), &e)
		})?;
		debug!(line = block.line, module_path = %parsed.module_path, handler = %parsed.handler, "expanding block");

		block_options(&parsed.options)
			.map_err(PydocError::from)
			.and_then(|options| self.render(&parsed.module_path, &options))
			.map_err(|e| {
				warn!(line = block.line, module_path = %parsed.module_path, error = %e, "failed to generate docs");
				failure_comment(&parsed.module_path, &e)
			})
	}

	/// Render documentation for `module_path`, returning an error comment on failure.
	pub fn generate_documentation(&self, module_path: &str, options: &Mapping) -> String {
		self.render(module_path, options)
			.unwrap_or_else(|e| failure_comment(module_path, &e))
	}

	/// Resolve `module_path`, normalize its docstrings, and render it with `options` layered
	/// over the defaults.
	pub fn render(&self, module_path: &str, options: &Mapping) -> Result<String> {
		let (package_name, object_path) = split_module_path(module_path);
		let to_replace = parent_prefix(package_name, object_path);

		let package = self.loader().load(package_name)?;
		let mut obj = package.get(object_path)?.clone();
		// Headings show the path as requested, even when it was reached through an alias.
		obj.path = module_path.to_string();
		normalize(&mut obj);

		let config = RenderConfig::effective(&[&self.default_options, options])?;
		let markdown = render_object_docs(&obj, &config)?;
		Ok(strip_heading_prefix(&markdown, &to_replace))
	}

	/// Load a package for inspection.
	pub fn inspect(&self, package_name: &str) -> Result<Package> {
		Ok(self.loader().load(package_name)?)
	}
}

/// Read a YAML mapping of default render options from `path`.
pub fn load_options_file(path: &Path) -> Result<Mapping> {
	let content = fs::read_to_string(path)?;
	match serde_yaml::from_str::<Value>(&content)? {
		Value::Mapping(mapping) => Ok(mapping),
		Value::Null => Ok(Mapping::new()),
		_ => Err(PydocError::InvalidOption(format!(
			"{} must contain a mapping of render options",
			path.display()
		))),
	}
}

/// Parse a `key=value` option override; the value is read as YAML.
pub fn parse_option_override(text: &str) -> Result<(String, Value)> {
	let (key, value) = text
		.split_once('=')
		.ok_or_else(|| PydocError::InvalidOption(format!("expected key=value, got `{text}`")))?;
	let key = key.trim();
	if key.is_empty() {
		return Err(PydocError::InvalidOption(format!("missing option name in `{text}`")));
	}
	let value = serde_yaml::from_str::<Value>(value.trim())?;
	Ok((key.to_string(), value))
}
