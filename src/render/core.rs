use regex::Regex;
use tracing::debug;

use super::config::{MembersOption, MembersOrder, RenderConfig, SectionStyle, SummaryCategories};
use super::error::RenderError;
use super::utils::{escape_cell, extract_source, heading};
use crate::python::{DocstringSection, Object, ObjectCategory, ObjectKind, Parameter, SectionItem};
use crate::python::signature::format_signature;

/// Member groups in the order they are rendered.
const CATEGORY_ORDER: [ObjectCategory; 4] = [
	ObjectCategory::Attribute,
	ObjectCategory::Class,
	ObjectCategory::Function,
	ObjectCategory::Module,
];

/// A compiled `filters` entry.
#[derive(Debug, Clone)]
struct MemberFilter {
	regex: Regex,
	exclude: bool,
}

/// Renders objects to markdown under one [`RenderConfig`].
#[derive(Debug, Clone)]
pub struct Renderer {
	/// Effective options.
	pub config: RenderConfig,
	filters: Vec<MemberFilter>,
}

impl Renderer {
	/// Create a renderer, compiling the configured member filters.
	pub fn new(config: RenderConfig) -> Result<Self, RenderError> {
		let filters = config
			.filters
			.iter()
			.map(|filter| {
				let (pattern, exclude) = match filter.strip_prefix('!') {
					Some(rest) => (rest, true),
					None => (filter.as_str(), false),
				};
				Regex::new(pattern)
					.map(|regex| MemberFilter { regex, exclude })
					.map_err(|source| RenderError::InvalidFilter {
						pattern: pattern.to_string(),
						source,
					})
			})
			.collect::<Result<Vec<_>, _>>()?;
		Ok(Self { config, filters })
	}

	/// Render `obj` as the root of a documentation fragment.
	pub fn render(&self, obj: &Object) -> String {
		let mut out = String::new();
		self.render_object(obj, self.config.heading_level, true, &mut out);
		let trimmed = out.trim_end().len();
		out.truncate(trimmed);
		out.push('\n');
		out
	}

	fn render_object(&self, obj: &Object, level: usize, root: bool, out: &mut String) {
		let child_level = if root && !self.config.show_root_heading {
			level
		} else {
			let shown = if root && self.config.show_root_full_path {
				obj.path.as_str()
			} else {
				obj.name.as_str()
			};
			out.push_str(&heading(level, &format!("`{shown}`")));
			if !obj.labels.is_empty() {
				let labels: Vec<String> = obj.labels.iter().map(|l| format!("`{l}`")).collect();
				out.push_str(&labels.join(" "));
				out.push_str("\n\n");
			}
			level + 1
		};

		if self.config.show_signature {
			if let Some(signature) = signature_of(obj) {
				out.push_str("```python\n");
				out.push_str(&signature);
				out.push_str("\n```\n\n");
			}
		}

		if let ObjectKind::Class { bases, .. } = &obj.kind {
			if self.config.show_bases && !bases.is_empty() {
				let bases: Vec<String> = bases.iter().map(|b| format!("`{b}`")).collect();
				out.push_str(&format!("Bases: {}\n\n", bases.join(", ")));
			}
		}

		if let Some(docstring) = &obj.docstring {
			for section in &docstring.parsed {
				self.render_section(section, out);
			}
		}

		if self.config.show_source && obj.category() != ObjectCategory::Module {
			out.push_str(&format!(
				"Source code in `{}`\n\n```python\n{}\n```\n\n",
				obj.location.relative_filepath.display(),
				extract_source(&obj.location)
			));
		}

		self.render_members(obj, child_level, out);
	}

	/// Members selected for rendering, in output order.
	fn select_members<'a>(&self, obj: &'a Object) -> Vec<&'a Object> {
		let Some(members) = obj.members() else {
			return Vec::new();
		};

		match &self.config.members {
			MembersOption::All(false) => Vec::new(),
			MembersOption::Only(names) => names
				.iter()
				.filter_map(|name| {
					let member = obj.member(name).filter(|m| !m.is_alias());
					if member.is_none() {
						debug!(object = %obj.path, member = %name, "requested member not found");
					}
					member
				})
				.collect(),
			MembersOption::All(true) => {
				let mut selected: Vec<&Object> = members
					.iter()
					.filter(|m| !m.is_alias())
					.filter(|m| m.category() != ObjectCategory::Module || self.config.show_submodules)
					.filter(|m| self.keep_name(&m.name))
					.filter(|m| m.docstring.is_some() || self.config.show_if_no_docstring)
					.collect();
				if self.config.members_order == MembersOrder::Alphabetical {
					selected.sort_by(|a, b| a.name.cmp(&b.name));
				}
				selected
			}
		}
	}

	/// Apply the member filters; the last matching filter decides.
	fn keep_name(&self, name: &str) -> bool {
		let mut keep = None;
		let mut has_exclude = false;
		for filter in &self.filters {
			has_exclude |= filter.exclude;
			if filter.regex.is_match(name) {
				keep = Some(!filter.exclude);
			}
		}
		// Include-only filter lists reject anything they do not match.
		keep.unwrap_or(self.filters.is_empty() || has_exclude)
	}

	fn render_members(&self, obj: &Object, level: usize, out: &mut String) {
		let selected = self.select_members(obj);
		if selected.is_empty() {
			return;
		}
		let explicit = matches!(self.config.members, MembersOption::Only(_));

		for category in CATEGORY_ORDER {
			let group: Vec<&Object> = selected.iter().copied().filter(|m| m.category() == category).collect();
			if group.is_empty() || !self.config.summary.contains(summary_flag(category)) {
				continue;
			}
			out.push_str(&format!("**{}:**\n\n| Name | Description |\n| ---- | ----------- |\n", summary_title(category)));
			for member in group {
				let summary = member.docstring.as_ref().map(|d| d.summary()).unwrap_or("");
				out.push_str(&format!("| `{}` | {} |\n", member.name, escape_cell(summary)));
			}
			out.push('\n');
		}

		if explicit {
			for member in selected {
				self.render_object(member, level, false, out);
			}
			return;
		}
		for category in CATEGORY_ORDER {
			for member in selected.iter().filter(|m| m.category() == category) {
				self.render_object(member, level, false, out);
			}
		}
	}

	fn render_section(&self, section: &DocstringSection, out: &mut String) {
		let config = &self.config;
		match section {
			DocstringSection::Text(text) => {
				if config.show_docstring_description && !text.trim().is_empty() {
					out.push_str(text.trim());
					out.push_str("\n\n");
				}
			}
			DocstringSection::Parameters(items) | DocstringSection::OtherParameters(items) => {
				self.render_items(section.title(), items, ItemShape::Parameter, out);
			}
			DocstringSection::Returns(items) | DocstringSection::Yields(items) | DocstringSection::Receives(items) => {
				let shape = if items.iter().any(|i| !i.name.is_empty()) {
					ItemShape::NamedValue
				} else {
					ItemShape::Value
				};
				self.render_items(section.title(), items, shape, out);
			}
			DocstringSection::Raises(items) | DocstringSection::Warns(items) => {
				self.render_items(section.title(), items, ItemShape::Exception, out);
			}
			DocstringSection::Attributes(items) => {
				if config.show_docstring_attributes {
					self.render_items(section.title(), items, ItemShape::NamedValue, out);
				}
			}
			DocstringSection::Functions(items) if config.show_docstring_functions => {
				self.render_items(section.title(), items, ItemShape::Name, out);
			}
			DocstringSection::Classes(items) if config.show_docstring_classes => {
				self.render_items(section.title(), items, ItemShape::Name, out);
			}
			DocstringSection::Modules(items) if config.show_docstring_modules => {
				self.render_items(section.title(), items, ItemShape::Name, out);
			}
			DocstringSection::Functions(_) | DocstringSection::Classes(_) | DocstringSection::Modules(_) => {}
			DocstringSection::Examples(text) => {
				out.push_str("**Examples:**\n\n");
				out.push_str(&render_examples(text));
				out.push_str("\n\n");
			}
			DocstringSection::Admonition { title, text, .. } => {
				out.push_str(&format!("**{title}:**\n\n"));
				for line in text.trim().lines() {
					if line.trim().is_empty() {
						out.push_str(">\n");
					} else {
						out.push_str(&format!("> {line}\n"));
					}
				}
				out.push('\n');
			}
		}
	}

	fn render_items(&self, title: &str, items: &[SectionItem], shape: ItemShape, out: &mut String) {
		if items.is_empty() {
			return;
		}
		out.push_str(&format!("**{title}:**\n\n"));
		match self.config.docstring_section_style {
			SectionStyle::Table => render_table(items, shape, out),
			SectionStyle::List => render_list(items, shape, out),
			SectionStyle::Spacy => render_spacy(items, shape, out),
		}
		out.push('\n');
	}
}

/// Columns shown for the items of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemShape {
	/// Name, type, description, default.
	Parameter,
	/// Name, type, description.
	NamedValue,
	/// Type, description.
	Value,
	/// Exception type, description.
	Exception,
	/// Name, description.
	Name,
}

fn code(text: Option<&str>) -> String {
	match text {
		Some(text) if !text.is_empty() => format!("`{}`", text.replace('|', "\\|")),
		_ => String::new(),
	}
}

fn default_cell(item: &SectionItem) -> String {
	match &item.default {
		Some(default) => code(Some(default.as_str())),
		None if item.name.starts_with('*') => String::new(),
		None => "*required*".to_string(),
	}
}

fn render_table(items: &[SectionItem], shape: ItemShape, out: &mut String) {
	let header = match shape {
		ItemShape::Parameter => "| Name | Type | Description | Default |\n| ---- | ---- | ----------- | ------- |\n",
		ItemShape::NamedValue => "| Name | Type | Description |\n| ---- | ---- | ----------- |\n",
		ItemShape::Value | ItemShape::Exception => "| Type | Description |\n| ---- | ----------- |\n",
		ItemShape::Name => "| Name | Description |\n| ---- | ----------- |\n",
	};
	out.push_str(header);
	for item in items {
		let description = escape_cell(&item.description);
		let row = match shape {
			ItemShape::Parameter => format!(
				"| `{}` | {} | {} | {} |",
				item.name,
				code(item.annotation.as_deref()),
				description,
				default_cell(item)
			),
			ItemShape::NamedValue => {
				format!("| `{}` | {} | {} |", item.name, code(item.annotation.as_deref()), description)
			}
			ItemShape::Value => format!("| {} | {} |", code(item.annotation.as_deref()), description),
			ItemShape::Exception => format!("| {} | {} |", code(item.annotation.as_deref()), description),
			ItemShape::Name => format!("| `{}` | {} |", item.name, description),
		};
		out.push_str(&row);
		out.push('\n');
	}
}

fn render_list(items: &[SectionItem], shape: ItemShape, out: &mut String) {
	for item in items {
		let annotation = code(item.annotation.as_deref());
		let description = escape_cell(&item.description);
		let mut line = match shape {
			ItemShape::Value | ItemShape::Exception if annotation.is_empty() => "-".to_string(),
			ItemShape::Value | ItemShape::Exception => format!("- {annotation}"),
			_ if annotation.is_empty() => format!("- **`{}`**", item.name),
			_ => format!("- **`{}`** ({annotation})", item.name),
		};
		if !description.is_empty() {
			line.push_str(" – ");
			line.push_str(&description);
		}
		if shape == ItemShape::Parameter {
			if let Some(default) = &item.default {
				line.push_str(&format!(" (default: `{default}`)"));
			}
		}
		out.push_str(&line);
		out.push('\n');
	}
}

fn render_spacy(items: &[SectionItem], shape: ItemShape, out: &mut String) {
	let first = match shape {
		ItemShape::Value => "Type",
		ItemShape::Exception => "Exception",
		_ => "Name",
	};
	out.push_str(&format!("| {first} | Description |\n| ---- | ----------- |\n"));
	for item in items {
		let mut description = escape_cell(&item.description);
		let first_cell = match shape {
			ItemShape::Value | ItemShape::Exception => code(item.annotation.as_deref()),
			_ => {
				if let Some(annotation) = item.annotation.as_deref().filter(|a| !a.is_empty()) {
					description.push_str(&format!("<br>**TYPE:** {}", code(Some(annotation))));
				}
				format!("`{}`", item.name)
			}
		};
		if shape == ItemShape::Parameter {
			description.push_str(&format!("<br>**DEFAULT:** {}", default_cell(item)));
		}
		out.push_str(&format!("| {first_cell} | {description} |\n"));
	}
}

/// Fence runs of doctest lines (`>>>` prompts and their output) as Python code.
fn render_examples(text: &str) -> String {
	if text.contains("```") || !text.contains(">>>") {
		return text.trim().to_string();
	}
	let mut out = Vec::new();
	let mut in_code = false;
	for line in text.trim().lines() {
		let is_prompt = line.trim_start().starts_with(">>>") || line.trim_start().starts_with("...");
		if is_prompt && !in_code {
			out.push("```python".to_string());
			in_code = true;
		} else if in_code && line.trim().is_empty() {
			out.push("```".to_string());
			in_code = false;
		}
		out.push(line.to_string());
	}
	if in_code {
		out.push("```".to_string());
	}
	out.join("\n")
}

fn summary_flag(category: ObjectCategory) -> SummaryCategories {
	match category {
		ObjectCategory::Attribute => SummaryCategories::ATTRIBUTES,
		ObjectCategory::Class => SummaryCategories::CLASSES,
		ObjectCategory::Function => SummaryCategories::FUNCTIONS,
		ObjectCategory::Module => SummaryCategories::MODULES,
		ObjectCategory::Alias => SummaryCategories::empty(),
	}
}

fn summary_title(category: ObjectCategory) -> &'static str {
	match category {
		ObjectCategory::Attribute => "Attributes",
		ObjectCategory::Class => "Classes",
		ObjectCategory::Function => "Functions",
		ObjectCategory::Module => "Modules",
		ObjectCategory::Alias => "Aliases",
	}
}

/// Parameters as shown to callers: a leading `self` or `cls` is dropped.
fn visible_parameters(params: &[Parameter]) -> &[Parameter] {
	match params.first() {
		Some(first) if first.name == "self" || first.name == "cls" => &params[1..],
		_ => params,
	}
}

/// Signature line for functions, classes and attributes.
fn signature_of(obj: &Object) -> Option<String> {
	match &obj.kind {
		ObjectKind::Function { parameters, returns, .. } => {
			Some(format_signature(&obj.name, visible_parameters(parameters), returns.as_deref()))
		}
		ObjectKind::Class { .. } => {
			let params = obj.parameters().map(visible_parameters).unwrap_or(&[]);
			Some(format_signature(&obj.name, params, None))
		}
		ObjectKind::Attribute { annotation, value } => {
			let mut line = obj.name.clone();
			if let Some(annotation) = annotation {
				line.push_str(": ");
				line.push_str(annotation);
			}
			if let Some(value) = value {
				line.push_str(" = ");
				line.push_str(value);
			}
			Some(line)
		}
		ObjectKind::Module { .. } | ObjectKind::Alias { .. } => None,
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::python::{Docstring, Location, normalize};
	use crate::python::signature::parse_parameters;

	fn function(name: &str, doc: Option<&str>, params: &str) -> Object {
		Object {
			name: name.to_string(),
			path: format!("pkg.Model.{name}"),
			docstring: doc.map(|d| Docstring::new(d, None)),
			location: Location::default(),
			labels: Vec::new(),
			kind: ObjectKind::Function {
				parameters: parse_parameters(params),
				returns: Some("Self".to_string()),
				decorators: Vec::new(),
			},
		}
	}

	fn model() -> Object {
		let mut class = Object {
			name: "Model".to_string(),
			path: "pkg.Model".to_string(),
			docstring: Some(Docstring::new("A model.\n\nArgs:\n    order (int): AR order.", None)),
			location: Location::default(),
			labels: Vec::new(),
			kind: ObjectKind::Class {
				bases: vec!["Base".to_string()],
				decorators: Vec::new(),
				members: vec![
					function("__init__", None, "self, order, season=1"),
					function("predict", Some("Predict values."), "self, h"),
					function("fit", Some("Fit the model.\n\nArgs:\n    y: series."), "self, y"),
					function("_helper", Some("Private."), "self"),
				],
			},
		};
		normalize(&mut class);
		class
	}

	fn config(yaml: &str) -> RenderConfig {
		let block: serde_yaml::Mapping = serde_yaml::from_str(yaml).expect("yaml");
		let mut config = RenderConfig::effective(&[&block]).expect("config");
		config.show_source = false;
		config
	}

	#[test]
	fn renders_class_with_parameters_table() {
		let renderer = Renderer::new(config("heading_level: 2")).expect("renderer");
		let out = renderer.render(&model());
		assert!(out.starts_with("## `pkg.Model`\n\n```python\nModel(order, season=1)\n```\n\nBases: `Base`\n\nA model.\n\n"));
		assert!(out.contains("| `order` | `int` | AR order. | *required* |"));
		assert!(out.contains("### `fit`"));
		assert!(!out.contains("`_helper`"));
		assert!(!out.contains("`__init__`"), "members without docstrings are hidden:\n{out}");
		let fit = out.find("### `fit`").expect("fit");
		let predict = out.find("### `predict`").expect("predict");
		assert!(fit < predict);
	}

	#[test]
	fn explicit_members_keep_order_and_bypass_filters() {
		let renderer = Renderer::new(config("members: [predict, _helper, missing]")).expect("renderer");
		let out = renderer.render(&model());
		let predict = out.find("#### `predict`").expect("predict");
		let helper = out.find("#### `_helper`").expect("helper");
		assert!(predict < helper);
		assert!(!out.contains("`fit`"));
	}

	#[test]
	fn members_false_renders_only_root() {
		let renderer = Renderer::new(config("members: false")).expect("renderer");
		let out = renderer.render(&model());
		assert!(!out.contains("#### "));
	}

	#[test]
	fn list_style_and_summary() {
		let renderer = Renderer::new(config("docstring_section_style: list\nsummary:\n  functions: true")).expect("renderer");
		let out = renderer.render(&model());
		assert!(out.contains("- **`order`** (`int`) – AR order."));
		assert!(out.contains("**Functions:**\n\n| Name | Description |\n| ---- | ----------- |\n| `fit` | Fit the model. |\n| `predict` | Predict values. |\n"));
	}

	#[test]
	fn hidden_root_heading_keeps_member_level() {
		let renderer = Renderer::new(config("show_root_heading: false")).expect("renderer");
		let out = renderer.render(&model());
		assert!(!out.contains("`pkg.Model`"));
		assert!(out.contains("\n### `fit`\n"));
	}

	#[test]
	fn filters_follow_last_match() {
		let renderer = Renderer::new(config("filters: ['^p']")).expect("renderer");
		assert!(renderer.keep_name("predict"));
		assert!(!renderer.keep_name("fit"));

		let renderer = Renderer::new(config("filters: ['!^_', '^__init__$']")).expect("renderer");
		assert!(renderer.keep_name("__init__"));
		assert!(!renderer.keep_name("_helper"));
		assert!(renderer.keep_name("fit"));
	}

	#[test]
	fn invalid_filter_is_an_error() {
		let err = Renderer::new(config("filters: ['![']")).unwrap_err();
		assert!(matches!(err, RenderError::InvalidFilter { ref pattern, .. } if pattern == "["));
	}

	fn loader_function() -> Object {
		let mut obj = function(
			"load",
			Some("Load a file.\n\nArgs:\n    path (str): File to read.\n\nRaises:\n    ValueError: If the file is empty.\n\nWarnings:\n    UserWarning: When the file is large."),
			"path",
		);
		normalize(&mut obj);
		obj
	}

	#[test]
	fn exception_sections_show_types_in_table_style() {
		let out = Renderer::new(config("heading_level: 2")).expect("renderer").render(&loader_function());
		assert!(
			out.contains("**Raises:**\n\n| Type | Description |\n| ---- | ----------- |\n| `ValueError` | If the file is empty. |\n"),
			"{out}"
		);
		assert!(
			out.contains("**Warns:**\n\n| Type | Description |\n| ---- | ----------- |\n| `UserWarning` | When the file is large. |\n"),
			"{out}"
		);
	}

	#[test]
	fn exception_sections_show_types_in_list_style() {
		let out = Renderer::new(config("docstring_section_style: list")).expect("renderer").render(&loader_function());
		assert!(out.contains("**Raises:**\n\n- `ValueError` – If the file is empty.\n"), "{out}");
		assert!(out.contains("**Warns:**\n\n- `UserWarning` – When the file is large.\n"), "{out}");
		assert!(out.contains("- **`path`** (`str`) – File to read.\n"), "{out}");
	}

	#[test]
	fn spacy_style_puts_types_and_defaults_in_the_description() {
		let out = Renderer::new(config("docstring_section_style: spacy")).expect("renderer").render(&loader_function());
		assert!(
			out.contains("**Raises:**\n\n| Exception | Description |\n| ---- | ----------- |\n| `ValueError` | If the file is empty. |\n"),
			"{out}"
		);
		assert!(out.contains("| `UserWarning` | When the file is large. |"), "{out}");
		assert!(
			out.contains("| Name | Description |\n| ---- | ----------- |\n| `path` | File to read.<br>**TYPE:** `str`<br>**DEFAULT:** *required* |\n"),
			"{out}"
		);
	}

	#[test]
	fn doctest_examples_are_fenced() {
		assert_eq!(
			render_examples(">>> add(1, 2)\n3\n\nMore text."),
			"```python\n>>> add(1, 2)\n3\n```\n\nMore text."
		);
	}
}
