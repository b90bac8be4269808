//! Static object model for a loaded Python package.

use std::path::PathBuf;

use serde::Serialize;

use super::docstring::Docstring;
use super::signature::Parameter;

/// A node in a package tree: module, class, function, attribute, or import alias.
#[derive(Debug, Clone, Serialize)]
pub struct Object {
	/// Short name of the object.
	pub name: String,
	/// Fully qualified dotted path, e.g. `pkg.models.AutoARIMA`.
	pub path: String,
	/// Docstring attached to the object, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub docstring: Option<Docstring>,
	/// Where the object is defined.
	pub location: Location,
	/// Extra traits such as `property`, `classmethod` or `module-attribute`.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub labels: Vec<String>,
	/// Kind-specific data.
	#[serde(flatten)]
	pub kind: ObjectKind,
}

/// Kind-specific payload for an [`Object`].
///
/// Only containers carry a `members` collection.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectKind {
	/// A module or package.
	Module {
		/// Members in source order.
		members: Vec<Object>,
		/// Whether this module is a package (`__init__.py`).
		is_package: bool,
		/// Names listed in a literal `__all__`, when the module declares one.
		#[serde(skip_serializing_if = "Option::is_none")]
		exports: Option<Vec<String>>,
		/// Modules re-exported with `from <module> import *`, in source order.
		#[serde(skip_serializing_if = "Vec::is_empty")]
		wildcards: Vec<String>,
	},
	/// A class definition.
	Class {
		/// Base class expressions as written.
		bases: Vec<String>,
		/// Decorator expressions as written.
		decorators: Vec<String>,
		/// Members in source order.
		members: Vec<Object>,
	},
	/// A function or method.
	Function {
		/// Parameters in declaration order.
		parameters: Vec<Parameter>,
		/// Return annotation as written.
		returns: Option<String>,
		/// Decorator expressions as written.
		decorators: Vec<String>,
	},
	/// A module, class, or instance attribute.
	Attribute {
		/// Annotation as written.
		annotation: Option<String>,
		/// Assigned value expression as written.
		value: Option<String>,
	},
	/// A name imported from elsewhere.
	Alias {
		/// Dotted path of the imported object.
		target_path: String,
	},
}

/// Source location of an object.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Location {
	/// Absolute path of the defining file.
	pub filepath: PathBuf,
	/// Path relative to the search path the package was found on.
	pub relative_filepath: PathBuf,
	/// 1-based first line, when known.
	pub lineno: Option<usize>,
	/// 1-based last line, when known.
	pub endlineno: Option<usize>,
}

/// Classification used for listings and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectCategory {
	/// Modules and packages.
	Module,
	/// Classes.
	Class,
	/// Functions and methods.
	Function,
	/// Attributes.
	Attribute,
	/// Unresolved import aliases.
	Alias,
}

impl ObjectCategory {
	/// Short label used in listings.
	pub fn label(self) -> &'static str {
		match self {
			Self::Module => "module",
			Self::Class => "class",
			Self::Function => "function",
			Self::Attribute => "attribute",
			Self::Alias => "alias",
		}
	}
}

impl Object {
	/// Category of this object.
	pub fn category(&self) -> ObjectCategory {
		match self.kind {
			ObjectKind::Module { .. } => ObjectCategory::Module,
			ObjectKind::Class { .. } => ObjectCategory::Class,
			ObjectKind::Function { .. } => ObjectCategory::Function,
			ObjectKind::Attribute { .. } => ObjectCategory::Attribute,
			ObjectKind::Alias { .. } => ObjectCategory::Alias,
		}
	}

	/// Members of a container object; `None` for functions, attributes and aliases.
	pub fn members(&self) -> Option<&[Object]> {
		match &self.kind {
			ObjectKind::Module { members, .. } | ObjectKind::Class { members, .. } => Some(members),
			_ => None,
		}
	}

	/// Mutable access to the members of a container object.
	pub fn members_mut(&mut self) -> Option<&mut Vec<Object>> {
		match &mut self.kind {
			ObjectKind::Module { members, .. } | ObjectKind::Class { members, .. } => Some(members),
			_ => None,
		}
	}

	/// Look up a direct member by name.
	pub fn member(&self, name: &str) -> Option<&Object> {
		self.members()?.iter().find(|member| member.name == name)
	}

	/// Mutable lookup of a direct member by name.
	pub fn member_mut(&mut self, name: &str) -> Option<&mut Object> {
		self.members_mut()?.iter_mut().find(|member| member.name == name)
	}

	/// Modules whose public names this module re-exports through `import *`.
	pub fn wildcards(&self) -> &[String] {
		match &self.kind {
			ObjectKind::Module { wildcards, .. } => wildcards,
			_ => &[],
		}
	}

	/// Whether `import *` from this module binds `name`: listed in `__all__`, or public when
	/// there is no `__all__`.
	pub fn exports_name(&self, name: &str) -> bool {
		match &self.kind {
			ObjectKind::Module { exports: Some(exports), .. } => exports.iter().any(|e| e == name),
			_ => !name.starts_with('_'),
		}
	}

	/// Whether the object carries the given label.
	pub fn has_label(&self, label: &str) -> bool {
		self.labels.iter().any(|l| l == label)
	}

	/// Whether this object is an import alias.
	pub fn is_alias(&self) -> bool {
		matches!(self.kind, ObjectKind::Alias { .. })
	}

	/// Parameters of a function, or of a class's `__init__` method.
	pub fn parameters(&self) -> Option<&[Parameter]> {
		match &self.kind {
			ObjectKind::Function { parameters, .. } => Some(parameters),
			ObjectKind::Class { .. } => self.member("__init__").and_then(|init| init.parameters()),
			_ => None,
		}
	}

	/// Return annotation of a function.
	pub fn returns(&self) -> Option<&str> {
		match &self.kind {
			ObjectKind::Function { returns, .. } => returns.as_deref(),
			_ => None,
		}
	}

	/// Iterate over this object and all of its descendants, depth first.
	pub fn walk(&self) -> Vec<&Object> {
		let mut out = vec![self];
		if let Some(members) = self.members() {
			for member in members {
				out.extend(member.walk());
			}
		}
		out
	}
}

/// Append `name` to a dotted path prefix.
pub fn dotted(prefix: &str, name: &str) -> String {
	if prefix.is_empty() {
		name.to_string()
	} else {
		format!("{prefix}.{name}")
	}
}
