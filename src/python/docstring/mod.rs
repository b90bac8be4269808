//! Docstring model and the normalization pass.

mod google;

use serde::Serialize;
use tracing::debug;

pub use self::google::parse_google;
use super::model::Object;
use super::signature::Parameter;

/// A docstring together with its structured parse.
#[derive(Debug, Clone, Serialize)]
pub struct Docstring {
	/// Cleaned docstring text.
	pub value: String,
	/// 1-based line of the docstring literal.
	pub lineno: Option<usize>,
	/// Parsed sections. Freshly loaded docstrings hold a single text section.
	pub parsed: Vec<DocstringSection>,
}

impl Docstring {
	/// Build a docstring whose parse is the raw text, as found at load time.
	pub fn new(value: impl Into<String>, lineno: Option<usize>) -> Self {
		let value = value.into();
		let parsed = if value.trim().is_empty() {
			Vec::new()
		} else {
			vec![DocstringSection::Text(value.clone())]
		};
		Self { value, lineno, parsed }
	}

	/// First paragraph line, used for summaries.
	pub fn summary(&self) -> &str {
		self.value.lines().next().unwrap_or("").trim()
	}
}

/// A named element of a docstring section (parameter, exception, attribute, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionItem {
	/// Item name; empty for unnamed return values.
	pub name: String,
	/// Annotation, from the docstring or filled in from the signature.
	pub annotation: Option<String>,
	/// Free-form description.
	pub description: String,
	/// Default value, filled in from the signature.
	pub default: Option<String>,
}

/// One section of a parsed docstring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DocstringSection {
	/// Free text.
	Text(String),
	/// `Args:` and friends.
	Parameters(Vec<SectionItem>),
	/// `Keyword Args:` / `Other Parameters:`.
	OtherParameters(Vec<SectionItem>),
	/// `Returns:`.
	Returns(Vec<SectionItem>),
	/// `Yields:`.
	Yields(Vec<SectionItem>),
	/// `Receives:`.
	Receives(Vec<SectionItem>),
	/// `Raises:`.
	Raises(Vec<SectionItem>),
	/// `Warns:`.
	Warns(Vec<SectionItem>),
	/// `Attributes:`.
	Attributes(Vec<SectionItem>),
	/// `Functions:` / `Methods:`.
	Functions(Vec<SectionItem>),
	/// `Classes:`.
	Classes(Vec<SectionItem>),
	/// `Modules:`.
	Modules(Vec<SectionItem>),
	/// `Examples:`; kept verbatim.
	Examples(String),
	/// `Note:`, `Warning:` and any other titled block.
	Admonition {
		/// Lowercase, dash-separated kind, e.g. `see-also`.
		kind: String,
		/// Title as written.
		title: String,
		/// Body text.
		text: String,
	},
}

impl DocstringSection {
	/// Display title used by the renderer.
	pub fn title(&self) -> &str {
		match self {
			Self::Text(_) => "",
			Self::Parameters(_) => "Parameters",
			Self::OtherParameters(_) => "Other Parameters",
			Self::Returns(_) => "Returns",
			Self::Yields(_) => "Yields",
			Self::Receives(_) => "Receives",
			Self::Raises(_) => "Raises",
			Self::Warns(_) => "Warns",
			Self::Attributes(_) => "Attributes",
			Self::Functions(_) => "Functions",
			Self::Classes(_) => "Classes",
			Self::Modules(_) => "Modules",
			Self::Examples(_) => "Examples",
			Self::Admonition { title, .. } => title,
		}
	}
}

/// Width of a line's leading whitespace, in chars.
pub(crate) fn indent_of(line: &str) -> usize {
	line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Drop up to `margin` leading whitespace chars from `line`.
pub(crate) fn strip_margin(line: &str, margin: usize) -> &str {
	let mut rest = line;
	for _ in 0..margin {
		let mut chars = rest.chars();
		match chars.next() {
			Some(c) if c.is_whitespace() => rest = chars.as_str(),
			_ => break,
		}
	}
	rest
}

/// Clean up docstring indentation the way `inspect.cleandoc` does.
pub fn cleandoc(doc: &str) -> String {
	let expanded = doc.replace('\t', "        ");
	let lines: Vec<&str> = expanded.lines().collect();
	let Some((first, rest)) = lines.split_first() else {
		return String::new();
	};

	let margin = rest
		.iter()
		.filter(|line| !line.trim().is_empty())
		.map(|line| indent_of(line))
		.min()
		.unwrap_or(0);

	let mut cleaned: Vec<&str> = Vec::with_capacity(lines.len());
	cleaned.push(first.trim_start());
	cleaned.extend(rest.iter().map(|line| strip_margin(line, margin).trim_end()));

	while cleaned.first().is_some_and(|line| line.trim().is_empty()) {
		cleaned.remove(0);
	}
	while cleaned.last().is_some_and(|line| line.trim().is_empty()) {
		cleaned.pop();
	}
	cleaned.join("\n")
}

/// Re-parse the docstrings of `obj` and, for containers, of its direct members with the
/// Google grammar.
pub fn normalize(obj: &mut Object) {
	let params = obj.parameters().map(<[Parameter]>::to_vec);
	let returns = obj.returns().map(str::to_string);
	if let Some(docstring) = obj.docstring.as_mut() {
		docstring.parsed = parse_google(&docstring.value, params.as_deref(), returns.as_deref());
		debug!(path = %obj.path, sections = docstring.parsed.len(), "normalized docstring");
	}

	if let Some(members) = obj.members_mut() {
		for member in members.iter_mut() {
			let params = member.parameters().map(<[Parameter]>::to_vec);
			let returns = member.returns().map(str::to_string);
			if let Some(docstring) = member.docstring.as_mut() {
				docstring.parsed = parse_google(&docstring.value, params.as_deref(), returns.as_deref());
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::python::model::{Location, ObjectKind};
	use crate::python::signature::parse_parameters;

	fn function(name: &str, doc: &str, params: &str) -> Object {
		Object {
			name: name.to_string(),
			path: format!("pkg.{name}"),
			docstring: Some(Docstring::new(doc, Some(2))),
			location: Location::default(),
			labels: Vec::new(),
			kind: ObjectKind::Function {
				parameters: parse_parameters(params),
				returns: Some("int".to_string()),
				decorators: Vec::new(),
			},
		}
	}

	#[test]
	fn fresh_docstring_is_plain_text() {
		let doc = Docstring::new("Add.\n\nArgs:\n    a: first.", None);
		assert_eq!(doc.parsed.len(), 1);
		assert!(matches!(doc.parsed[0], DocstringSection::Text(_)));
		assert_eq!(doc.summary(), "Add.");
	}

	#[test]
	fn cleandoc_strips_common_margin() {
		assert_eq!(cleandoc("Summary.\n\n    More (unbalanced.\n    "), "Summary.\n\nMore (unbalanced.");
		assert_eq!(cleandoc("\n    First.\n      Indented.\n"), "First.\n  Indented.");
		assert_eq!(cleandoc("A.\n    \u{a0} b\n    c"), "A.\n\u{a0} b\nc");
		assert_eq!(cleandoc(""), "");
	}

	#[test]
	fn normalize_reparses_object_and_members() {
		let method = function("fit", "Fit.\n\nArgs:\n    y: series.", "self, y");
		let mut class = Object {
			name: "Model".to_string(),
			path: "pkg.Model".to_string(),
			docstring: Some(Docstring::new("Model.\n\nAttributes:\n    order: the order.", None)),
			location: Location::default(),
			labels: Vec::new(),
			kind: ObjectKind::Class {
				bases: Vec::new(),
				decorators: Vec::new(),
				members: vec![method],
			},
		};

		normalize(&mut class);

		let parsed = &class.docstring.as_ref().expect("doc").parsed;
		assert!(parsed.iter().any(|s| matches!(s, DocstringSection::Attributes(items) if items[0].name == "order")));
		let member_doc = class.member("fit").and_then(|m| m.docstring.as_ref()).expect("member doc");
		assert!(member_doc.parsed.iter().any(|s| matches!(s, DocstringSection::Parameters(_))));
	}
}
