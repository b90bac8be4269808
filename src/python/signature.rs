//! Function signatures: parameters read from the syntax tree, and call-style formatting.

use serde::Serialize;
use tree_sitter::Node;

use super::parse::named_children;

/// How a parameter can be passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParameterKind {
	/// Declared before a `/` marker.
	PositionalOnly,
	/// Ordinary parameter.
	PositionalOrKeyword,
	/// `*args`.
	VarPositional,
	/// Declared after `*` or `*args`.
	KeywordOnly,
	/// `**kwargs`.
	VarKeyword,
}

/// A single function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
	/// Parameter name without star prefixes.
	pub name: String,
	/// Annotation as written.
	pub annotation: Option<String>,
	/// Default value expression as written.
	pub default: Option<String>,
	/// Passing convention.
	pub kind: ParameterKind,
}

impl Parameter {
	/// Render the parameter the way it is written in a signature.
	pub fn display(&self) -> String {
		let mut out = match self.kind {
			ParameterKind::VarPositional => format!("*{}", self.name),
			ParameterKind::VarKeyword => format!("**{}", self.name),
			_ => self.name.clone(),
		};
		if let Some(annotation) = &self.annotation {
			out.push_str(": ");
			out.push_str(annotation);
		}
		if let Some(default) = &self.default {
			if self.annotation.is_some() {
				out.push_str(" = ");
			} else {
				out.push('=');
			}
			out.push_str(default);
		}
		out
	}
}

/// Read the parameters of a `def` from its `parameters` node.
pub(crate) fn parameters_from_node(node: Node<'_>, source: &str) -> Vec<Parameter> {
	let text = |node: Node<'_>| source.get(node.byte_range()).unwrap_or("").trim().to_string();
	let children = named_children(node);

	let has_positional_marker = children.iter().any(|child| child.kind() == "positional_separator");
	let mut kind = if has_positional_marker {
		ParameterKind::PositionalOnly
	} else {
		ParameterKind::PositionalOrKeyword
	};

	let mut params = Vec::with_capacity(children.len());
	for child in children {
		let (target, annotation, default) = match child.kind() {
			"positional_separator" => {
				kind = ParameterKind::PositionalOrKeyword;
				continue;
			}
			"keyword_separator" => {
				kind = ParameterKind::KeywordOnly;
				continue;
			}
			"identifier" | "list_splat_pattern" | "dictionary_splat_pattern" => (Some(child), None, None),
			"typed_parameter" => (
				named_children(child).into_iter().next(),
				child.child_by_field_name("type"),
				None,
			),
			"default_parameter" | "typed_default_parameter" => (
				child.child_by_field_name("name"),
				child.child_by_field_name("type"),
				child.child_by_field_name("value"),
			),
			_ => continue,
		};
		let Some(target) = target else {
			continue;
		};

		let this_kind = match target.kind() {
			"list_splat_pattern" => {
				kind = ParameterKind::KeywordOnly;
				ParameterKind::VarPositional
			}
			"dictionary_splat_pattern" => ParameterKind::VarKeyword,
			_ => kind,
		};
		params.push(Parameter {
			name: text(target).trim_start_matches('*').to_string(),
			annotation: annotation.map(text).filter(|a| !a.is_empty()),
			default: default.map(text).filter(|d| !d.is_empty()),
			kind: this_kind,
		});
	}
	params
}

/// Render a call-style signature such as `fit(self, y, X=None) -> Self`.
pub fn format_signature(name: &str, params: &[Parameter], returns: Option<&str>) -> String {
	let mut parts: Vec<String> = Vec::with_capacity(params.len() + 2);
	let mut previous: Option<ParameterKind> = None;
	for param in params {
		if previous == Some(ParameterKind::PositionalOnly) && param.kind != ParameterKind::PositionalOnly {
			parts.push("/".to_string());
		}
		if param.kind == ParameterKind::KeywordOnly
			&& !matches!(previous, Some(ParameterKind::KeywordOnly | ParameterKind::VarPositional))
		{
			parts.push("*".to_string());
		}
		parts.push(param.display());
		previous = Some(param.kind);
	}
	if previous == Some(ParameterKind::PositionalOnly) {
		parts.push("/".to_string());
	}

	let mut signature = format!("{name}({})", parts.join(", "));
	if let Some(returns) = returns {
		signature.push_str(" -> ");
		signature.push_str(returns);
	}
	signature
}

/// Parameters of `def f(<text>)`, for building test fixtures.
#[cfg(test)]
pub(crate) fn parse_parameters(text: &str) -> Vec<Parameter> {
	let source = format!("def f({text}):\n    pass\n");
	let tree = super::parse::syntax_tree(&source).expect("python grammar");
	let root = tree.root_node();
	named_children(root)
		.into_iter()
		.find(|node| node.kind() == "function_definition")
		.and_then(|function| function.child_by_field_name("parameters"))
		.map(|params| parameters_from_node(params, &source))
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_all_parameter_kinds() {
		let params = parse_parameters("a, /, b: int = 1, *args, c: Dict[str, int] = {}, **kw");
		let summary: Vec<(&str, ParameterKind)> = params.iter().map(|p| (p.name.as_str(), p.kind)).collect();
		assert_eq!(
			summary,
			vec![
				("a", ParameterKind::PositionalOnly),
				("b", ParameterKind::PositionalOrKeyword),
				("args", ParameterKind::VarPositional),
				("c", ParameterKind::KeywordOnly),
				("kw", ParameterKind::VarKeyword),
			]
		);
		assert_eq!(params[1].annotation.as_deref(), Some("int"));
		assert_eq!(params[1].default.as_deref(), Some("1"));
		assert_eq!(params[3].annotation.as_deref(), Some("Dict[str, int]"));
		assert_eq!(params[3].default.as_deref(), Some("{}"));
		assert_eq!(params[0].default, None);
	}

	#[test]
	fn formats_signature_with_markers() {
		let params = parse_parameters("self, x, *, season_length: int = 1");
		assert_eq!(
			format_signature("fit", &params, Some("AutoARIMA")),
			"fit(self, x, *, season_length: int = 1) -> AutoARIMA"
		);
	}

	#[test]
	fn typed_splats_and_multiline_defaults() {
		let params = parse_parameters("\n    *args: int,\n    key: Callable[[int], str] = (\n        lambda x: str(x)\n    ),\n    **kwargs: Any,\n");
		let names: Vec<(&str, ParameterKind)> = params.iter().map(|p| (p.name.as_str(), p.kind)).collect();
		assert_eq!(
			names,
			vec![
				("args", ParameterKind::VarPositional),
				("key", ParameterKind::KeywordOnly),
				("kwargs", ParameterKind::VarKeyword),
			]
		);
		assert_eq!(params[0].annotation.as_deref(), Some("int"));
		assert_eq!(params[1].annotation.as_deref(), Some("Callable[[int], str]"));
		assert!(params[1].default.as_deref().is_some_and(|d| d.contains("lambda x: str(x)")));
		assert_eq!(params[0].display(), "*args: int");
	}

	#[test]
	fn default_containing_colon_is_not_an_annotation() {
		let params = parse_parameters("key=lambda x: x");
		assert_eq!(params[0].name, "key");
		assert_eq!(params[0].annotation, None);
		assert_eq!(params[0].default.as_deref(), Some("lambda x: x"));
	}
}
