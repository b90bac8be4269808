//! Hierarchical tree structure for `inspect` output.

use super::Result;
use crate::python::{Object, ObjectCategory, ObjectKind};

/// A tree node describing an object and its members.
/// This provides a nested structure that reduces verbosity in JSON output.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ListTreeNode {
	/// Name of this object (not the full path).
	pub name: String,
	/// Kind classification for the object.
	pub kind: ObjectCategory,
	/// Source location if known (format: "path/to/file.py:line").
	#[serde(skip_serializing_if = "Option::is_none", rename = "src")]
	pub source: Option<String>,
	/// Import target for aliases.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub target: Option<String>,
	/// Members nested under this object.
	#[serde(skip_serializing_if = "Vec::is_empty", default)]
	pub children: Vec<ListTreeNode>,
}

/// One row of a flat listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
	/// Kind classification.
	pub kind: ObjectCategory,
	/// Fully qualified dotted path.
	pub path: String,
	/// Source location if known.
	pub source: Option<String>,
}

fn source_of(obj: &Object) -> Option<String> {
	if obj.is_alias() {
		return None;
	}
	let path = obj.location.relative_filepath.display().to_string();
	if path.is_empty() {
		return None;
	}
	Some(match obj.location.lineno {
		Some(line) => format!("{path}:{line}"),
		None => path,
	})
}

/// Build the member tree rooted at `obj`, children sorted by name.
pub fn build_list_tree(obj: &Object) -> ListTreeNode {
	let mut children: Vec<ListTreeNode> = obj.members().unwrap_or(&[]).iter().map(build_list_tree).collect();
	children.sort_by(|a, b| a.name.cmp(&b.name));
	ListTreeNode {
		name: obj.name.clone(),
		kind: obj.category(),
		source: source_of(obj),
		target: match &obj.kind {
			ObjectKind::Alias { target_path } => Some(target_path.clone()),
			_ => None,
		},
		children,
	}
}

/// Encode the member tree rooted at `obj` as pretty-printed JSON.
pub fn list_tree_json(obj: &Object) -> Result<String> {
	Ok(serde_json::to_string_pretty(&build_list_tree(obj))?)
}

/// Flatten `obj` and its descendants into listing rows, depth first in source order.
pub fn list_items(obj: &Object) -> Vec<ListItem> {
	obj.walk()
		.into_iter()
		.map(|item| ListItem {
			kind: item.category(),
			path: item.path.clone(),
			source: source_of(item),
		})
		.collect()
}
