use std::fs;
use std::ops::Range;

use pulldown_cmark::{Event, Parser, Tag};

use crate::python::Location;

/// Deepest ATX heading level.
const MAX_HEADING_LEVEL: usize = 6;

/// Build an ATX heading line; levels are clamped to 1..=6.
pub fn heading(level: usize, text: &str) -> String {
	let level = level.clamp(1, MAX_HEADING_LEVEL);
	format!("{} {text}\n\n", "#".repeat(level))
}

/// Offset where the text of the ATX heading spanning `range` begins; `None` for setext.
fn atx_text_start(markdown: &str, range: Range<usize>) -> Option<usize> {
	let line = markdown.get(range.clone())?;
	let rest = line.trim_start_matches(' ').strip_prefix('#')?.trim_start_matches('#');
	let text = rest.trim_start_matches([' ', '\t']);
	Some(range.start + line.len() - text.len())
}

/// Shorten heading code spans that start with `` `<prefix>. `` to the remaining name.
///
/// Only ATX headings are touched; code blocks and prose are copied unchanged.
pub fn strip_heading_prefix(markdown: &str, prefix: &str) -> String {
	if prefix.is_empty() {
		return markdown.to_string();
	}
	let needle = format!("`{prefix}.");
	let mut out = String::with_capacity(markdown.len());
	let mut copied = 0usize;

	for (event, range) in Parser::new(markdown).into_offset_iter() {
		if !matches!(event, Event::Start(Tag::Heading { .. })) {
			continue;
		}
		let Some(start) = atx_text_start(markdown, range) else {
			continue;
		};
		if start >= copied && markdown[start..].starts_with(&needle) {
			out.push_str(&markdown[copied..start]);
			out.push('`');
			copied = start + needle.len();
		}
	}
	out.push_str(&markdown[copied..]);
	out
}

/// Make text safe for a single markdown table cell.
pub fn escape_cell(text: &str) -> String {
	text.trim()
		.split("\n\n")
		.map(|paragraph| paragraph.split_whitespace().collect::<Vec<_>>().join(" "))
		.collect::<Vec<_>>()
		.join("<br><br>")
		.replace('|', "\\|")
}

/// Read the lines an object spans in its defining file.
///
/// Unreadable files yield an inline HTML comment instead of failing the render.
pub fn extract_source(location: &Location) -> String {
	let content = match fs::read_to_string(&location.filepath) {
		Ok(content) => content,
		Err(e) => {
			return format!(
				"<!-- failed to read source file {}: {e} -->",
				location.filepath.display()
			);
		}
	};
	let lines: Vec<&str> = content.lines().collect();
	let start = location.lineno.unwrap_or(1).saturating_sub(1).min(lines.len());
	let end = location.endlineno.unwrap_or(lines.len()).clamp(start, lines.len());
	lines[start..end].join("\n")
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn strips_prefix_on_headings_only() {
		let markdown = "### `pkg.sub.Obj`\n\nSee `pkg.sub.Obj` for details.\n\n#### `pkg.sub.Obj.fit`\n";
		let stripped = strip_heading_prefix(markdown, "pkg.sub");
		assert_eq!(
			stripped,
			"### `Obj`\n\nSee `pkg.sub.Obj` for details.\n\n#### `Obj.fit`\n"
		);
	}

	#[test]
	fn leaves_fenced_headings_and_other_prefixes() {
		let markdown = "```python\n# `pkg.sub.x` comment\n```\n## `other.sub.Obj`\n## `pkg.subway.X`\n";
		assert_eq!(strip_heading_prefix(markdown, "pkg.sub"), markdown);
	}

	#[test]
	fn closing_hashes_and_tilde_fences() {
		let markdown = "~~~\n## `pkg.sub.Hidden`\n~~~\n\n## `pkg.sub.Obj` ##\n\n`pkg.sub.Obj`\n---\n";
		assert_eq!(
			strip_heading_prefix(markdown, "pkg.sub"),
			"~~~\n## `pkg.sub.Hidden`\n~~~\n\n## `Obj` ##\n\n`pkg.sub.Obj`\n---\n"
		);
	}

	#[test]
	fn heading_levels_are_clamped() {
		assert_eq!(heading(0, "`a`"), "# `a`\n\n");
		assert_eq!(heading(9, "`a`"), "###### `a`\n\n");
	}

	#[test]
	fn cells_are_single_line() {
		assert_eq!(escape_cell("first\nline | pipe\n\nsecond"), "first line \\| pipe<br><br>second");
	}

	#[test]
	fn extracts_line_range() {
		let dir = tempfile::tempdir().expect("tempdir");
		let path = dir.path().join("m.py");
		fs::write(&path, "a = 1\ndef f():\n    pass\nb = 2\n").expect("write");
		let location = Location {
			filepath: path,
			relative_filepath: "m.py".into(),
			lineno: Some(2),
			endlineno: Some(3),
		};
		assert_eq!(extract_source(&location), "def f():\n    pass");
	}
}
