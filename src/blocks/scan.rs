//! Line-based scanner that splits a markdown document into text and placeholder blocks.
//!
//! Marker lines inside code blocks are left alone; code block spans come from
//! `pulldown-cmark`.

use std::ops::Range;

use pulldown_cmark::{Event, Parser, Tag};

/// The marker that opens a placeholder block.
pub const MARKER: &str = ":::";

/// A piece of the scanned document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
	/// Text passed through unchanged.
	Text(&'a str),
	/// A placeholder block to be substituted.
	Block(RawBlock<'a>),
}

/// The exact span of a placeholder block in the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock<'a> {
	/// Full text of the span: marker line, body lines, and the final newline if consumed.
	pub text: &'a str,
	/// 1-based line number of the marker line.
	pub line: usize,
}

impl<'a> RawBlock<'a> {
	/// Module path written after the marker.
	pub fn module_path(&self) -> &'a str {
		let first = self.text.lines().next().unwrap_or("");
		first.trim_start().trim_start_matches(MARKER).trim()
	}

	/// Whether the span ends with a line break.
	pub fn ends_with_newline(&self) -> bool {
		self.text.ends_with('\n')
	}
}

/// Leading-space count, or `None` when the line starts with a tab.
fn leading_spaces(line: &str) -> Option<usize> {
	let count = line.chars().take_while(|c| *c == ' ').count();
	if line[count..].starts_with('\t') {
		None
	} else {
		Some(count)
	}
}

fn is_blank(line: &str) -> bool {
	line.trim().is_empty()
}

fn is_body_line(line: &str) -> bool {
	!is_blank(line) && (line.starts_with("    ") || line.starts_with('\t'))
}

/// Byte ranges of the code blocks in `markdown`, in document order.
pub(crate) fn code_block_ranges(markdown: &str) -> Vec<Range<usize>> {
	Parser::new(markdown)
		.into_offset_iter()
		.filter_map(|(event, range)| matches!(event, Event::Start(Tag::CodeBlock(_))).then_some(range))
		.collect()
}

/// Whether `span` overlaps any of `ranges`.
pub(crate) fn overlaps(ranges: &[Range<usize>], span: &Range<usize>) -> bool {
	ranges.iter().any(|range| range.start < span.end && span.start < range.end)
}

/// Module path if this line opens a placeholder block.
fn marker_path(line: &str) -> Option<&str> {
	let indent = leading_spaces(line)?;
	if indent > 3 {
		return None;
	}
	let path = line[indent..].strip_prefix(MARKER)?.trim();
	(!path.is_empty() && !path.starts_with(':')).then_some(path)
}

/// Split `content` into a token stream. Concatenating all token texts yields `content`.
pub fn scan(content: &str) -> Vec<Token<'_>> {
	let lines: Vec<(usize, &str)> = content
		.split_inclusive('\n')
		.scan(0usize, |offset, line| {
			let start = *offset;
			*offset += line.len();
			Some((start, line))
		})
		.collect();

	let code_blocks = code_block_ranges(content);
	let mut tokens = Vec::new();
	let mut text_start = 0usize;
	let mut i = 0usize;

	while i < lines.len() {
		let (start, line) = lines[i];
		let span = start..start + line.trim_end_matches(['\n', '\r']).len();

		if marker_path(line).is_none() || overlaps(&code_blocks, &span) {
			i += 1;
			continue;
		}

		// Extend over the indented body; interior blank lines only count when more body follows.
		let mut end = i + 1;
		let mut cursor = i + 1;
		while cursor < lines.len() {
			let candidate = lines[cursor].1;
			if is_body_line(candidate) {
				cursor += 1;
				end = cursor;
			} else if is_blank(candidate) {
				cursor += 1;
			} else {
				break;
			}
		}

		if start > text_start {
			tokens.push(Token::Text(&content[text_start..start]));
		}
		let block_end = lines
			.get(end)
			.map(|(offset, _)| *offset)
			.unwrap_or(content.len());
		tokens.push(Token::Block(RawBlock {
			text: &content[start..block_end],
			line: i + 1,
		}));
		text_start = block_end;
		i = end;
	}

	if text_start < content.len() {
		tokens.push(Token::Text(&content[text_start..]));
	}
	tokens
}

/// Iterate only the placeholder blocks of `content`, in document order.
pub fn blocks(content: &str) -> impl Iterator<Item = RawBlock<'_>> {
	scan(content).into_iter().filter_map(|token| match token {
		Token::Block(block) => Some(block),
		Token::Text(_) => None,
	})
}
