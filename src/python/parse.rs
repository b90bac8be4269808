//! Python modules parsed into [`Object`] trees with the tree-sitter Python grammar.

use std::path::PathBuf;

use tree_sitter::{Node, Parser, Tree};

use super::docstring::{Docstring, cleandoc};
use super::error::LoadError;
use super::model::{Location, Object, ObjectKind, dotted};
use super::signature::parameters_from_node;

/// File-level facts shared by every object defined in one module.
#[derive(Debug, Clone)]
pub struct ModuleFile {
	/// Dotted path of the module, e.g. `pkg.models`.
	pub module_path: String,
	/// Absolute path of the source file.
	pub filepath: PathBuf,
	/// Path relative to the search path root.
	pub relative_filepath: PathBuf,
	/// Whether the file is a package `__init__.py`.
	pub is_package: bool,
}

impl ModuleFile {
	fn location(&self, lineno: usize, endlineno: usize) -> Location {
		Location {
			filepath: self.filepath.clone(),
			relative_filepath: self.relative_filepath.clone(),
			lineno: Some(lineno),
			endlineno: Some(endlineno),
		}
	}

	/// Absolute module that a `from` import with `level` leading dots refers to.
	fn resolve_relative(&self, level: usize, module: &str) -> Option<String> {
		if level == 0 {
			return Some(module.to_string());
		}
		let mut base: Vec<&str> = self.module_path.split('.').collect();
		if !self.is_package {
			base.pop();
		}
		for _ in 1..level {
			base.pop()?;
		}
		if base.is_empty() {
			return None;
		}
		let base = base.join(".");
		Some(if module.is_empty() { base } else { dotted(&base, module) })
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
	Module,
	Class,
}

/// Members collected from one body, plus the module-level export facts.
#[derive(Debug, Default)]
struct Members {
	objects: Vec<Object>,
	exports: Option<Vec<String>>,
	wildcards: Vec<String>,
}

impl Members {
	/// Add or replace a member; rebinding a name keeps the original position.
	fn insert(&mut self, obj: Object) {
		match self.objects.iter_mut().find(|existing| existing.name == obj.name) {
			Some(existing) => *existing = obj,
			None => self.objects.push(obj),
		}
	}
}

/// Parse Python source with the tree-sitter grammar.
pub(crate) fn syntax_tree(source: &str) -> Result<Tree, String> {
	let mut parser = Parser::new();
	parser
		.set_language(&tree_sitter_python::LANGUAGE.into())
		.map_err(|e| format!("failed to load Python grammar: {e}"))?;
	parser
		.parse(source, None)
		.ok_or_else(|| "tree-sitter parse returned None".to_string())
}

/// Named children of `node`, comments excluded.
pub(crate) fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
	let mut cursor = node.walk();
	node.named_children(&mut cursor)
		.filter(|child| child.kind() != "comment")
		.collect()
}

/// Parse a module's source into a `Module` object (without submodules).
pub fn parse_module(file: &ModuleFile, source: &str) -> Result<Object, LoadError> {
	let tree = syntax_tree(source).map_err(|message| LoadError::Parse {
		path: file.filepath.clone(),
		message,
	})?;
	let scanner = Scanner { file, source };
	let statements = named_children(tree.root_node());

	let mut members = Members::default();
	scanner.scan_body(&statements, &file.module_path, Scope::Module, &mut members);

	let name = file.module_path.rsplit('.').next().unwrap_or(&file.module_path).to_string();
	let endlineno = source.lines().count().max(1);
	Ok(Object {
		name,
		path: file.module_path.clone(),
		docstring: scanner.leading_docstring(&statements),
		location: file.location(1, endlineno),
		labels: Vec::new(),
		kind: ObjectKind::Module {
			members: members.objects,
			is_package: file.is_package,
			exports: members.exports,
			wildcards: members.wildcards,
		},
	})
}

/// Walks statement nodes of one source file.
struct Scanner<'s> {
	file: &'s ModuleFile,
	source: &'s str,
}

impl<'s> Scanner<'s> {
	fn text(&self, node: Node<'_>) -> &'s str {
		self.source.get(node.byte_range()).unwrap_or("")
	}

	fn field_text(&self, node: Node<'_>, field: &str) -> Option<&'s str> {
		node.child_by_field_name(field).map(|child| self.text(child))
	}

	fn location(&self, node: Node<'_>) -> Location {
		self.file.location(node.start_position().row + 1, node.end_position().row + 1)
	}

	fn scan_body(&self, statements: &[Node<'_>], prefix: &str, scope: Scope, out: &mut Members) {
		for (index, &node) in statements.iter().enumerate() {
			match node.kind() {
				"class_definition" => out.insert(self.class(node, node, Vec::new(), prefix)),
				"function_definition" => self.function(node, node, Vec::new(), prefix, scope, out),
				"decorated_definition" => self.decorated(node, prefix, scope, out),
				"import_statement" | "import_from_statement" => self.import(node, prefix, out),
				"expression_statement" => {
					if let Some(mut attribute) = self.attribute(node, prefix, scope, out) {
						attribute.docstring = statements.get(index + 1).and_then(|next| self.docstring(*next));
						out.insert(attribute);
					}
				}
				"if_statement" | "try_statement" | "with_statement" | "for_statement" | "while_statement" => {
					for block in nested_blocks(node) {
						self.scan_body(&named_children(block), prefix, scope, out);
					}
				}
				"ERROR" => self.scan_body(&named_children(node), prefix, scope, out),
				_ => {}
			}
		}
	}

	/// Decoded docstring when `statement` is a bare string literal.
	fn docstring(&self, statement: Node<'_>) -> Option<Docstring> {
		if statement.kind() != "expression_statement" {
			return None;
		}
		let children = named_children(statement);
		let [literal] = children.as_slice() else {
			return None;
		};
		let value = self.string_value(*literal)?;
		Some(Docstring::new(cleandoc(&value), Some(statement.start_position().row + 1)))
	}

	fn leading_docstring(&self, body: &[Node<'_>]) -> Option<Docstring> {
		body.first().and_then(|first| self.docstring(*first))
	}

	/// Value of a plain or raw string literal; f-strings and bytes yield `None`.
	fn string_value(&self, node: Node<'_>) -> Option<String> {
		if node.kind() != "string" {
			return None;
		}
		let mut cursor = node.walk();
		let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
		if children.iter().any(|child| child.kind() == "interpolation") {
			return None;
		}
		let start = children.iter().find(|child| child.kind() == "string_start")?;
		let end = children.iter().find(|child| child.kind() == "string_end")?;

		let prefix = self
			.text(*start)
			.chars()
			.take_while(char::is_ascii_alphabetic)
			.collect::<String>()
			.to_ascii_lowercase();
		if prefix.contains(['f', 'b', 't']) {
			return None;
		}
		let inner = self.source.get(start.end_byte()..end.start_byte())?;
		Some(if prefix.contains('r') { inner.to_string() } else { unescape(inner) })
	}

	/// String items of a list or tuple literal.
	fn string_list(&self, node: Node<'_>) -> Option<Vec<String>> {
		if !matches!(node.kind(), "list" | "tuple" | "parenthesized_expression") {
			return None;
		}
		let items = named_children(node);
		if node.kind() == "parenthesized_expression" {
			return items.first().and_then(|inner| self.string_list(*inner));
		}
		Some(items.into_iter().filter_map(|item| self.string_value(item)).collect())
	}

	fn decorated(&self, node: Node<'_>, prefix: &str, scope: Scope, out: &mut Members) {
		let decorators: Vec<String> = named_children(node)
			.into_iter()
			.filter(|child| child.kind() == "decorator")
			.map(|decorator| self.text(decorator).trim_start_matches('@').trim().to_string())
			.collect();
		let Some(definition) = node.child_by_field_name("definition") else {
			return;
		};
		match definition.kind() {
			"class_definition" => out.insert(self.class(definition, node, decorators, prefix)),
			"function_definition" => self.function(definition, node, decorators, prefix, scope, out),
			_ => {}
		}
	}

	/// `definition` is the `class` node; `outer` includes its decorators.
	fn class(&self, definition: Node<'_>, outer: Node<'_>, decorators: Vec<String>, prefix: &str) -> Object {
		let name = self.field_text(definition, "name").unwrap_or_default();
		let path = dotted(prefix, name);
		let bases = definition
			.child_by_field_name("superclasses")
			.map(|arguments| {
				named_children(arguments)
					.into_iter()
					.filter(|arg| !matches!(arg.kind(), "keyword_argument" | "dictionary_splat"))
					.map(|arg| self.text(arg).to_string())
					.collect()
			})
			.unwrap_or_default();

		let body = definition.child_by_field_name("body").map(named_children).unwrap_or_default();
		let mut members = Members::default();
		self.scan_body(&body, &path, Scope::Class, &mut members);

		Object {
			name: name.to_string(),
			docstring: self.leading_docstring(&body),
			location: self.location(outer),
			labels: Vec::new(),
			kind: ObjectKind::Class {
				bases,
				decorators,
				members: members.objects,
			},
			path,
		}
	}

	fn function(
		&self,
		definition: Node<'_>,
		outer: Node<'_>,
		decorators: Vec<String>,
		prefix: &str,
		scope: Scope,
		out: &mut Members,
	) {
		if decorators.iter().any(|d| d.ends_with(".setter") || d.ends_with(".deleter")) {
			return;
		}
		let name = self.field_text(definition, "name").unwrap_or_default();
		let parameters = definition
			.child_by_field_name("parameters")
			.map(|params| parameters_from_node(params, self.source))
			.unwrap_or_default();
		let returns = self
			.field_text(definition, "return_type")
			.map(|r| r.trim().to_string())
			.filter(|r| !r.is_empty());
		let body = definition.child_by_field_name("body").map(named_children).unwrap_or_default();

		let mut labels = Vec::new();
		let mut cursor = definition.walk();
		if definition.children(&mut cursor).any(|child| child.kind() == "async") {
			labels.push("async".to_string());
		}
		for decorator in &decorators {
			let bare = decorator.rsplit('.').next().unwrap_or(decorator);
			match bare {
				"property" | "cached_property" => labels.push("property".to_string()),
				"staticmethod" => labels.push("staticmethod".to_string()),
				"classmethod" => labels.push("classmethod".to_string()),
				"abstractmethod" => labels.push("abstractmethod".to_string()),
				_ => {}
			}
		}
		if scope == Scope::Class && labels.iter().any(|l| l == "property") {
			labels.push("class-attribute".to_string());
		}

		if scope == Scope::Class && name == "__init__" {
			for attr in self.instance_attributes(&body, prefix) {
				if !out.objects.iter().any(|m| m.name == attr.name) {
					out.objects.push(attr);
				}
			}
		}

		out.insert(Object {
			name: name.to_string(),
			path: dotted(prefix, name),
			docstring: self.leading_docstring(&body),
			location: self.location(outer),
			labels,
			kind: ObjectKind::Function {
				parameters,
				returns,
				decorators,
			},
		});
	}

	/// The single assignment-like child of an expression statement.
	fn assignment_of<'t>(&self, statement: Node<'t>) -> Option<Node<'t>> {
		let children = named_children(statement);
		match children.as_slice() {
			[node] if matches!(node.kind(), "assignment" | "augmented_assignment") => Some(*node),
			_ => None,
		}
	}

	/// Attribute declared by `name[: annotation] [= value]`; records `__all__` on the way.
	fn attribute(&self, statement: Node<'_>, prefix: &str, scope: Scope, out: &mut Members) -> Option<Object> {
		let assignment = self.assignment_of(statement)?;
		let left = assignment.child_by_field_name("left")?;
		if left.kind() != "identifier" {
			return None;
		}
		let name = self.text(left);
		let right = assignment.child_by_field_name("right");

		if scope == Scope::Module && name == "__all__" {
			let names = right.and_then(|value| self.string_list(value));
			if assignment.kind() == "augmented_assignment" {
				if let (Some(exports), Some(names)) = (out.exports.as_mut(), names) {
					exports.extend(names);
				}
				return None;
			}
			out.exports = names;
		}
		if assignment.kind() != "assignment" {
			return None;
		}

		let label = match scope {
			Scope::Module => "module-attribute",
			Scope::Class => "class-attribute",
		};
		Some(Object {
			name: name.to_string(),
			path: dotted(prefix, name),
			docstring: None,
			location: self.location(statement),
			labels: vec![label.to_string()],
			kind: ObjectKind::Attribute {
				annotation: self.field_text(assignment, "type").map(str::to_string),
				value: right.map(|value| self.text(value).to_string()),
			},
		})
	}

	/// `self.x = ...` assignments directly in an `__init__` body.
	fn instance_attributes(&self, body: &[Node<'_>], class_path: &str) -> Vec<Object> {
		let mut out: Vec<Object> = Vec::new();
		for (index, &statement) in body.iter().enumerate() {
			let Some(assignment) = self.assignment_of(statement).filter(|a| a.kind() == "assignment") else {
				continue;
			};
			let Some(target) = assignment.child_by_field_name("left").filter(|left| left.kind() == "attribute") else {
				continue;
			};
			if self.field_text(target, "object") != Some("self") {
				continue;
			}
			let Some(name) = self.field_text(target, "attribute") else {
				continue;
			};
			if out.iter().any(|o| o.name == name) {
				continue;
			}
			out.push(Object {
				name: name.to_string(),
				path: dotted(class_path, name),
				docstring: body.get(index + 1).and_then(|next| self.docstring(*next)),
				location: self.location(statement),
				labels: vec!["instance-attribute".to_string()],
				kind: ObjectKind::Attribute {
					annotation: self.field_text(assignment, "type").map(str::to_string),
					value: self.field_text(assignment, "right").map(str::to_string),
				},
			});
		}
		out
	}

	fn import(&self, node: Node<'_>, prefix: &str, out: &mut Members) {
		let mut cursor = node.walk();
		let names: Vec<Node<'_>> = node.children_by_field_name("name", &mut cursor).collect();

		if node.kind() == "import_statement" {
			// A plain `import a.b` binds the top-level module only; only `as` forms become aliases.
			for name in names.into_iter().filter(|name| name.kind() == "aliased_import") {
				if let (Some(original), Some(bound)) = (self.field_text(name, "name"), self.field_text(name, "alias")) {
					out.insert(self.alias(node, prefix, bound, original.to_string()));
				}
			}
			return;
		}

		let Some(module) = node.child_by_field_name("module_name") else {
			return;
		};
		let (level, module_name) = if module.kind() == "relative_import" {
			let children = named_children(module);
			let level = children
				.iter()
				.find(|child| child.kind() == "import_prefix")
				.map(|dots| self.text(*dots).matches('.').count())
				.unwrap_or(0);
			let module_name = children
				.iter()
				.find(|child| child.kind() == "dotted_name")
				.map(|name| self.text(*name))
				.unwrap_or("");
			(level, module_name)
		} else {
			(0, self.text(module))
		};
		let Some(base) = self.file.resolve_relative(level, module_name) else {
			return;
		};

		if named_children(node).iter().any(|child| child.kind() == "wildcard_import") {
			out.wildcards.push(base);
			return;
		}
		for name in names {
			let (original, bound) = if name.kind() == "aliased_import" {
				match (self.field_text(name, "name"), self.field_text(name, "alias")) {
					(Some(original), Some(bound)) => (original, bound),
					_ => continue,
				}
			} else {
				(self.text(name), self.text(name))
			};
			out.insert(self.alias(node, prefix, bound, dotted(&base, original)));
		}
	}

	fn alias(&self, statement: Node<'_>, prefix: &str, name: &str, target_path: String) -> Object {
		Object {
			name: name.to_string(),
			path: dotted(prefix, name),
			docstring: None,
			location: self.location(statement),
			labels: Vec::new(),
			kind: ObjectKind::Alias { target_path },
		}
	}
}

/// Bodies of a compound statement and of its `elif`/`else`/`except`/`finally` clauses.
fn nested_blocks(node: Node<'_>) -> Vec<Node<'_>> {
	let mut out = Vec::new();
	for child in named_children(node) {
		match child.kind() {
			"block" => out.push(child),
			"elif_clause" | "else_clause" | "except_clause" | "except_group_clause" | "finally_clause" => {
				out.extend(nested_blocks(child));
			}
			_ => {}
		}
	}
	out
}

/// Resolve the backslash escapes that commonly appear in docstrings.
fn unescape(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut chars = text.chars();
	while let Some(c) = chars.next() {
		if c != '\\' {
			out.push(c);
			continue;
		}
		match chars.next() {
			Some('n') => out.push('\n'),
			Some('t') => out.push('\t'),
			Some('r') => out.push('\r'),
			Some('\\') => out.push('\\'),
			Some('\'') => out.push('\''),
			Some('"') => out.push('"'),
			Some('\n') => {}
			Some(other) => {
				out.push('\\');
				out.push(other);
			}
			None => out.push('\\'),
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::python::model::ObjectCategory;

	fn file(module_path: &str, is_package: bool) -> ModuleFile {
		ModuleFile {
			module_path: module_path.to_string(),
			filepath: PathBuf::from("/tmp/x.py"),
			relative_filepath: PathBuf::from("x.py"),
			is_package,
		}
	}

	fn parse(module_path: &str, is_package: bool, source: &str) -> Object {
		parse_module(&file(module_path, is_package), source).expect("parse")
	}

	const SOURCE: &str = r#""""Models module."""

from .utils import helper, other as renamed
import numpy as np

DEFAULT: int = 3
"""Default order."""


class AutoARIMA(_TS, metaclass=ABCMeta):
    """Automatic ARIMA.

    Args:
        season_length (int): Season.
    """

    uses_exog = True

    def __init__(
        self,
        season_length: int = 1,
    ):
        self.season_length = season_length
        """Stored season."""
        if season_length > 1:
            self.hidden = 1

    @property
    def name(self) -> str:
        """Alias."""
        return "AutoARIMA"

    @name.setter
    def name(self, value):
        pass

    async def fit(self, y, X=None) -> "AutoARIMA":
        """Fit."""
        return self

if TYPE_CHECKING:
    def checked() -> None: ...

def _private():
    pass
"#;

	#[test]
	fn scans_module_structure() {
		let module = parse("pkg.models", false, SOURCE);
		assert_eq!(module.docstring.as_ref().map(|d| d.value.as_str()), Some("Models module."));

		let names: Vec<&str> = module.members().expect("members").iter().map(|m| m.name.as_str()).collect();
		assert_eq!(names, vec!["helper", "renamed", "np", "DEFAULT", "AutoARIMA", "checked", "_private"]);

		let helper = module.member("helper").expect("helper");
		assert!(matches!(&helper.kind, ObjectKind::Alias { target_path } if target_path == "pkg.utils.helper"));
		let renamed = module.member("renamed").expect("renamed");
		assert!(matches!(&renamed.kind, ObjectKind::Alias { target_path } if target_path == "pkg.utils.other"));

		let default = module.member("DEFAULT").expect("DEFAULT");
		assert_eq!(default.docstring.as_ref().map(|d| d.value.as_str()), Some("Default order."));
		assert!(matches!(&default.kind, ObjectKind::Attribute { annotation: Some(a), value: Some(v) } if a == "int" && v == "3"));
	}

	#[test]
	fn scans_class_members() {
		let module = parse("pkg.models", false, SOURCE);
		let class = module.member("AutoARIMA").expect("class");
		assert_eq!(class.path, "pkg.models.AutoARIMA");
		assert_eq!(class.location.lineno, Some(10));
		assert!(matches!(&class.kind, ObjectKind::Class { bases, .. } if bases == &vec!["_TS".to_string()]));
		assert!(class.docstring.as_ref().expect("doc").value.starts_with("Automatic ARIMA.\n\nArgs:"));

		let names: Vec<&str> = class.members().expect("members").iter().map(|m| m.name.as_str()).collect();
		assert_eq!(names, vec!["uses_exog", "season_length", "__init__", "name", "fit"]);

		let season = class.member("season_length").expect("attr");
		assert!(season.has_label("instance-attribute"));
		assert_eq!(season.docstring.as_ref().map(|d| d.value.as_str()), Some("Stored season."));

		let name = class.member("name").expect("property");
		assert!(name.has_label("property"));
		assert_eq!(name.returns(), Some("str"));
		assert_eq!(name.location.lineno, Some(28));

		let fit = class.member("fit").expect("fit");
		assert_eq!(fit.category(), ObjectCategory::Function);
		assert!(fit.has_label("async"));
		assert_eq!(fit.returns(), Some("\"AutoARIMA\""));
		assert_eq!(fit.parameters().map(|p| p.len()), Some(3));

		let init = class.member("__init__").expect("init");
		assert_eq!(init.location.lineno, Some(19));
		assert_eq!(init.location.endlineno, Some(26));
		assert_eq!(class.parameters().map(|p| p[1].name.as_str()), Some("season_length"));
	}

	#[test]
	fn relative_imports_from_package_init() {
		let init = file("pkg", true);
		assert_eq!(init.resolve_relative(1, "models").as_deref(), Some("pkg.models"));
		assert_eq!(init.resolve_relative(2, "x"), None);
		let module = file("pkg.sub.mod", false);
		assert_eq!(module.resolve_relative(2, "core").as_deref(), Some("pkg.core"));
		assert_eq!(module.resolve_relative(1, "").as_deref(), Some("pkg.sub"));
	}

	#[test]
	fn import_forms_without_spaces_or_with_parentheses() {
		let module = parse(
			"pkg",
			true,
			"from .x import(a)\nfrom . import (\n    core,\n    utils as u,  # helpers\n)\nfrom ..outside import z\n",
		);
		let targets: Vec<(&str, &str)> = module
			.members()
			.expect("members")
			.iter()
			.filter_map(|m| match &m.kind {
				ObjectKind::Alias { target_path } => Some((m.name.as_str(), target_path.as_str())),
				_ => None,
			})
			.collect();
		assert_eq!(targets, vec![("a", "pkg.x.a"), ("core", "pkg.core"), ("u", "pkg.utils")]);
	}

	#[test]
	fn records_wildcards_and_literal_all() {
		let module = parse(
			"pkg",
			true,
			"from .core import *\nfrom .extra import *\n__all__ = ['Foo', \"bar\"]\n__all__ += ('baz',)\n",
		);
		let ObjectKind::Module { exports, wildcards, .. } = &module.kind else {
			panic!("expected module");
		};
		assert_eq!(wildcards, &vec!["pkg.core".to_string(), "pkg.extra".to_string()]);
		assert_eq!(exports.as_deref(), Some(&["Foo".to_string(), "bar".to_string(), "baz".to_string()][..]));
		assert!(module.exports_name("bar"));
		assert!(!module.exports_name("Other"));
	}

	#[test]
	fn assignments_that_declare_nothing_are_skipped() {
		let module = parse("pkg.m", false, "x += 1\nx == 1\nprint(a=1)\na, b = 1, 2\nobj.attr = 3\nf = lambda a: a\n");
		let names: Vec<&str> = module.members().expect("members").iter().map(|m| m.name.as_str()).collect();
		assert_eq!(names, vec!["f"]);
	}

	#[test]
	fn docstring_literals_decode_escapes_and_skip_fstrings() {
		let module = parse(
			"pkg.m",
			false,
			"def raw():\n    r\"\"\"Keep \\n raw.\"\"\"\n\ndef escaped():\n    'Quote \\' here.\\n'\n\ndef formatted():\n    f\"\"\"Not {a} docstring.\"\"\"\n\ndef joined():\n    \"a\" \"b\"\n",
		);
		let doc = |name: &str| module.member(name).and_then(|m| m.docstring.as_ref()).map(|d| d.value.clone());
		assert_eq!(doc("raw").as_deref(), Some("Keep \\n raw."));
		assert_eq!(doc("escaped").as_deref(), Some("Quote ' here."));
		assert_eq!(doc("formatted"), None);
		assert_eq!(doc("joined"), None);
	}
}
