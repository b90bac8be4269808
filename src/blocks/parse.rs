//! Parsing of a placeholder block into its path, handler, and options.

use serde_yaml::{Mapping, Value};
use tracing::warn;

use super::BlockError;
use super::scan::MARKER;

/// Handler used when a block does not name one.
pub const DEFAULT_HANDLER: &str = "python";

/// A parsed placeholder block.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderBlock {
	/// Dotted path of the object to document.
	pub module_path: String,
	/// Docstring flavour selector; only recorded.
	pub handler: String,
	/// The block's `options` value as written; [`crate::render::block_options`] reads it as a
	/// mapping when the block is rendered.
	pub options: Value,
}

/// Describe a YAML value's type for error messages.
pub(crate) fn value_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Sequence(_) => "a sequence",
		Value::Mapping(_) => "a mapping",
		Value::Tagged(_) => "a tagged value",
	}
}

/// Remove the common leading indentation from the body lines.
fn dedent(lines: &[&str]) -> String {
	let margin = lines
		.iter()
		.filter(|line| !line.trim().is_empty())
		.map(|line| line.chars().take_while(|c| *c == ' ' || *c == '\t').count())
		.min()
		.unwrap_or(0);
	lines
		.iter()
		.map(|line| line.chars().skip(margin).collect::<String>())
		.collect::<Vec<_>>()
		.join("\n")
}

/// Parse the text of one block (marker line plus indented YAML body).
///
/// Malformed YAML is recovered as an empty configuration; a configuration that parses but
/// is not a mapping is an error. The `options` value is kept unchecked.
pub fn parse_block(block: &str) -> Result<PlaceholderBlock, BlockError> {
	let block = block.trim();
	let mut lines = block.lines();
	let first = lines.next().unwrap_or("");
	let module_path = first.trim_start().trim_start_matches(MARKER).trim().to_string();
	if module_path.is_empty() {
		return Err(BlockError::MissingPath);
	}

	let body: Vec<&str> = lines.collect();
	let yaml = dedent(&body);
	let config = match serde_yaml::from_str::<Value>(&yaml) {
		Ok(value) => value,
		Err(err) => {
			warn!(module_path = %module_path, error = %err, "ignoring malformed block configuration");
			Value::Null
		}
	};

	let config = match config {
		Value::Null => Mapping::new(),
		Value::Mapping(mapping) => mapping,
		other => return Err(BlockError::InvalidConfig(value_kind(&other))),
	};

	let handler = match config.get("handler") {
		Some(Value::String(handler)) => handler.clone(),
		Some(Value::Null) | None => DEFAULT_HANDLER.to_string(),
		Some(other) => serde_yaml::to_string(other)
			.map(|s| s.trim().to_string())
			.unwrap_or_else(|_| DEFAULT_HANDLER.to_string()),
	};

	let options = config.get("options").cloned().unwrap_or(Value::Null);

	Ok(PlaceholderBlock {
		module_path,
		handler,
		options,
	})
}
