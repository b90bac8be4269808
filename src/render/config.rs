//! Render options: built-in defaults, layering, and the typed configuration.

use std::collections::BTreeMap;

use bitflags::bitflags;
use serde::{Deserialize, Deserializer};
use serde_yaml::{Mapping, Value};
use tracing::debug;

use super::error::RenderError;
use crate::blocks::parse::value_kind;

/// Option keys understood by the renderer.
pub const KNOWN_OPTIONS: &[&str] = &[
	"heading_level",
	"members",
	"show_root_heading",
	"show_root_full_path",
	"show_source",
	"show_signature",
	"show_bases",
	"show_if_no_docstring",
	"show_submodules",
	"docstring_section_style",
	"summary",
	"show_docstring_functions",
	"show_docstring_classes",
	"show_docstring_modules",
	"show_docstring_attributes",
	"show_docstring_description",
	"members_order",
	"filters",
];

/// Fixed defaults applied beneath every block's options.
pub fn default_options() -> Mapping {
	let mut options = Mapping::new();
	options.insert("docstring_section_style".into(), "table".into());
	options.insert("heading_level".into(), 3.into());
	options.insert("show_root_heading".into(), true.into());
	options.insert("show_source".into(), true.into());
	options.insert("show_docstring_functions".into(), false.into());
	options
}

/// Read a block's `options` value as an option mapping; `null` means no options.
pub fn block_options(value: &Value) -> Result<Mapping, RenderError> {
	match value {
		Value::Mapping(options) => Ok(options.clone()),
		Value::Null => Ok(Mapping::new()),
		other => Err(RenderError::OptionsNotMapping(value_kind(other))),
	}
}

/// Overlay `layers` onto [`default_options`], later layers winning key by key.
///
/// A `null` value leaves the underlying value in place.
pub fn merge_options(layers: &[&Mapping]) -> Mapping {
	let mut merged = default_options();
	for layer in layers {
		for (key, value) in layer.iter() {
			if value.is_null() {
				continue;
			}
			merged.insert(key.clone(), value.clone());
		}
	}
	merged
}

/// How docstring sections are laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStyle {
	/// Markdown tables with one row per item.
	#[default]
	Table,
	/// Bullet lists.
	List,
	/// Two-column tables with type and default folded into the description.
	Spacy,
}

/// Member ordering when no explicit list is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembersOrder {
	/// Sorted by name.
	#[default]
	Alphabetical,
	/// Declaration order.
	Source,
}

/// Which members to render.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MembersOption {
	/// `true` renders every member passing the filters, `false` renders none.
	All(bool),
	/// Exactly these members, in this order.
	Only(Vec<String>),
}

impl Default for MembersOption {
	fn default() -> Self {
		Self::All(true)
	}
}

bitflags! {
	/// Member categories that get a summary table.
	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub struct SummaryCategories: u8 {
		/// Attribute summaries.
		const ATTRIBUTES = 1 << 0;
		/// Function and method summaries.
		const FUNCTIONS = 1 << 1;
		/// Class summaries.
		const CLASSES = 1 << 2;
		/// Submodule summaries.
		const MODULES = 1 << 3;
	}
}

impl Default for SummaryCategories {
	fn default() -> Self {
		Self::empty()
	}
}

/// `summary: true`, `summary: false`, or a per-category mapping.
#[derive(Deserialize)]
#[serde(untagged)]
enum SummaryOption {
	Flag(bool),
	Categories(BTreeMap<String, bool>),
}

fn deserialize_summary<'de, D>(deserializer: D) -> Result<SummaryCategories, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match SummaryOption::deserialize(deserializer)? {
		SummaryOption::Flag(true) => SummaryCategories::all(),
		SummaryOption::Flag(false) => SummaryCategories::empty(),
		SummaryOption::Categories(map) => {
			let mut categories = SummaryCategories::empty();
			for (name, enabled) in map {
				let flag = match name.as_str() {
					"attributes" => SummaryCategories::ATTRIBUTES,
					"functions" => SummaryCategories::FUNCTIONS,
					"classes" => SummaryCategories::CLASSES,
					"modules" => SummaryCategories::MODULES,
					other => {
						debug!(category = other, "ignoring unknown summary category");
						continue;
					}
				};
				categories.set(flag, enabled);
			}
			categories
		}
	})
}

fn default_filters() -> Vec<String> {
	vec!["!^_[^_]".to_string()]
}

/// Effective options for rendering one object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
	/// Heading level of the root object.
	pub heading_level: usize,
	/// Member selection.
	pub members: MembersOption,
	/// Render a heading for the root object.
	pub show_root_heading: bool,
	/// Use the full dotted path in the root heading.
	pub show_root_full_path: bool,
	/// Append the object's source excerpt.
	pub show_source: bool,
	/// Render signatures of functions, classes and attributes.
	pub show_signature: bool,
	/// Render a class's bases.
	pub show_bases: bool,
	/// Render members that have no docstring.
	pub show_if_no_docstring: bool,
	/// Render submodules of a module.
	pub show_submodules: bool,
	/// Layout of docstring sections.
	pub docstring_section_style: SectionStyle,
	/// Categories that get summary tables.
	#[serde(deserialize_with = "deserialize_summary")]
	pub summary: SummaryCategories,
	/// Render `Functions:` docstring sections.
	pub show_docstring_functions: bool,
	/// Render `Classes:` docstring sections.
	pub show_docstring_classes: bool,
	/// Render `Modules:` docstring sections.
	pub show_docstring_modules: bool,
	/// Render `Attributes:` docstring sections.
	pub show_docstring_attributes: bool,
	/// Render free text of docstrings.
	pub show_docstring_description: bool,
	/// Member ordering.
	pub members_order: MembersOrder,
	/// Member name filters; a leading `!` excludes.
	pub filters: Vec<String>,
}

impl Default for RenderConfig {
	fn default() -> Self {
		Self {
			heading_level: 2,
			members: MembersOption::default(),
			show_root_heading: false,
			show_root_full_path: true,
			show_source: true,
			show_signature: true,
			show_bases: true,
			show_if_no_docstring: false,
			show_submodules: false,
			docstring_section_style: SectionStyle::Table,
			summary: SummaryCategories::empty(),
			show_docstring_functions: true,
			show_docstring_classes: true,
			show_docstring_modules: true,
			show_docstring_attributes: true,
			show_docstring_description: true,
			members_order: MembersOrder::Alphabetical,
			filters: default_filters(),
		}
	}
}

impl RenderConfig {
	/// Build the configuration from a merged option mapping.
	pub fn from_options(options: &Mapping) -> Result<Self, RenderError> {
		let mut known = Mapping::new();
		for (key, value) in options {
			match key.as_str() {
				Some(name) if KNOWN_OPTIONS.contains(&name) => {
					known.insert(key.clone(), value.clone());
				}
				_ => debug!(option = ?key, "ignoring unknown render option"),
			}
		}
		Ok(serde_yaml::from_value(Value::Mapping(known))?)
	}

	/// Merge `layers` over the defaults and build the configuration.
	pub fn effective(layers: &[&Mapping]) -> Result<Self, RenderError> {
		Self::from_options(&merge_options(layers))
	}
}
