//! Google-style docstring grammar.
//!
//! ```text
//! Summary line.
//!
//! Args:
//!     name (type): Description that may
//!         continue on indented lines.
//!
//! Returns:
//!     type: Description.
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use super::{DocstringSection, SectionItem, indent_of, strip_margin};
use crate::python::signature::{Parameter, ParameterKind};

static SECTION_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z ]*[A-Za-z]|[A-Za-z]):\s*$").unwrap());
static ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\*{0,2}[\w.]+)\s*(?:\(([^)]*)\))?\s*:\s*(.*)$").unwrap());
static DEFAULT_IN_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*(?:optional|default(?:s)?\s*[:=]?\s*(.+))\s*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
	Parameters,
	OtherParameters,
	Returns,
	Yields,
	Receives,
	Raises,
	Warns,
	Attributes,
	Functions,
	Classes,
	Modules,
	Examples,
}

fn section_kind(title: &str) -> Option<SectionKind> {
	match title.to_ascii_lowercase().as_str() {
		"args" | "arguments" | "params" | "parameters" => Some(SectionKind::Parameters),
		"keyword args" | "keyword arguments" | "other args" | "other arguments" | "other params"
		| "other parameters" => Some(SectionKind::OtherParameters),
		"returns" | "return" => Some(SectionKind::Returns),
		"yields" | "yield" => Some(SectionKind::Yields),
		"receives" | "receive" => Some(SectionKind::Receives),
		"raises" | "raise" | "exceptions" | "except" => Some(SectionKind::Raises),
		"warns" | "warnings" => Some(SectionKind::Warns),
		"attributes" => Some(SectionKind::Attributes),
		"functions" | "methods" => Some(SectionKind::Functions),
		"classes" => Some(SectionKind::Classes),
		"modules" => Some(SectionKind::Modules),
		"examples" | "example" => Some(SectionKind::Examples),
		_ => None,
	}
}

/// Parse a docstring with the Google grammar.
///
/// `params` and `returns` come from the documented function's signature and fill in
/// annotations and defaults that the docstring leaves out.
pub fn parse_google(text: &str, params: Option<&[Parameter]>, returns: Option<&str>) -> Vec<DocstringSection> {
	let lines: Vec<&str> = text.lines().collect();
	let mut sections = Vec::new();
	let mut current_text: Vec<&str> = Vec::new();
	let mut in_fence = false;
	let mut i = 0;

	while i < lines.len() {
		let line = lines[i];
		let trimmed = line.trim();
		if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
			in_fence = !in_fence;
		}

		let header = if in_fence || indent_of(line) != 0 {
			None
		} else {
			SECTION_HEADER.captures(trimmed).map(|c| c[1].to_string())
		};
		let body_start = i + 1;
		let has_body = lines
			.get(body_start)
			.is_some_and(|next| !next.trim().is_empty() && indent_of(next) > 0);

		match header {
			Some(title) if has_body => {
				let (body, next) = read_block(&lines, body_start);
				flush_text(&mut sections, &mut current_text);
				sections.push(build_section(&title, &body, params, returns));
				i = next;
			}
			_ => {
				current_text.push(line);
				i += 1;
			}
		}
	}
	flush_text(&mut sections, &mut current_text);
	sections
}


/// Collect the indented block that starts at `start`, dedented; returns it with the next index.
fn read_block(lines: &[&str], start: usize) -> (Vec<String>, usize) {
	let mut end = start;
	while end < lines.len() {
		let line = lines[end];
		if line.trim().is_empty() {
			let continues = lines[end + 1..]
				.iter()
				.find(|l| !l.trim().is_empty())
				.is_some_and(|l| indent_of(l) > 0);
			if !continues {
				break;
			}
		} else if indent_of(line) == 0 {
			break;
		}
		end += 1;
	}

	let block = &lines[start..end];
	let margin = block
		.iter()
		.filter(|l| !l.trim().is_empty())
		.map(|l| indent_of(l))
		.min()
		.unwrap_or(0);
	let dedented = block
		.iter()
		.map(|l| strip_margin(l, margin).to_string())
		.collect();
	(dedented, end)
}

fn flush_text(sections: &mut Vec<DocstringSection>, text: &mut Vec<&str>) {
	let joined = text.join("\n");
	let trimmed = joined.trim_matches('\n').trim_end();
	if !trimmed.trim().is_empty() {
		sections.push(DocstringSection::Text(trimmed.to_string()));
	}
	text.clear();
}

fn build_section(title: &str, body: &[String], params: Option<&[Parameter]>, returns: Option<&str>) -> DocstringSection {
	let Some(kind) = section_kind(title) else {
		return DocstringSection::Admonition {
			kind: title.to_ascii_lowercase().replace(' ', "-"),
			title: title.to_string(),
			text: body.join("\n").trim().to_string(),
		};
	};

	match kind {
		SectionKind::Examples => DocstringSection::Examples(body.join("\n").trim().to_string()),
		SectionKind::Parameters => DocstringSection::Parameters(fill_from_signature(named_items(body), params)),
		SectionKind::OtherParameters => {
			DocstringSection::OtherParameters(fill_from_signature(named_items(body), params))
		}
		SectionKind::Raises => DocstringSection::Raises(typed_items(body)),
		SectionKind::Warns => DocstringSection::Warns(typed_items(body)),
		SectionKind::Attributes => DocstringSection::Attributes(named_items(body)),
		SectionKind::Functions => DocstringSection::Functions(named_items(body)),
		SectionKind::Classes => DocstringSection::Classes(named_items(body)),
		SectionKind::Modules => DocstringSection::Modules(named_items(body)),
		SectionKind::Returns => DocstringSection::Returns(return_items(body, returns)),
		SectionKind::Yields => DocstringSection::Yields(return_items(body, None)),
		SectionKind::Receives => DocstringSection::Receives(return_items(body, None)),
	}
}

/// Group a dedented section body into (first line, continuation lines) entries.
fn entries(body: &[String]) -> Vec<(String, Vec<String>)> {
	let mut out: Vec<(String, Vec<String>)> = Vec::new();
	for line in body {
		if line.trim().is_empty() {
			if let Some((_, cont)) = out.last_mut() {
				cont.push(String::new());
			}
			continue;
		}
		if indent_of(line) == 0 || out.is_empty() {
			out.push((line.trim().to_string(), Vec::new()));
		} else if let Some((_, cont)) = out.last_mut() {
			cont.push(line.to_string());
		}
	}
	out
}

fn join_description(first: &str, continuation: &[String]) -> String {
	let margin = continuation
		.iter()
		.filter(|l| !l.trim().is_empty())
		.map(|l| indent_of(l))
		.min()
		.unwrap_or(0);
	let mut lines = vec![first.trim().to_string()];
	for line in continuation {
		lines.push(strip_margin(line, margin).to_string());
	}
	lines.join("\n").trim().to_string()
}

/// Items written as `name (type): description`.
fn named_items(body: &[String]) -> Vec<SectionItem> {
	entries(body)
		.into_iter()
		.map(|(first, cont)| match ITEM.captures(&first) {
			Some(caps) => {
				let raw_type = caps.get(2).map(|m| m.as_str().trim().to_string());
				let (annotation, default) = split_type_default(raw_type);
				SectionItem {
					name: caps[1].to_string(),
					annotation,
					description: join_description(&caps[3], &cont),
					default,
				}
			}
			None => SectionItem {
				name: first.trim_end_matches(':').to_string(),
				annotation: None,
				description: join_description("", &cont),
				default: None,
			},
		})
		.collect()
}

/// Items written as `ExceptionType: description`.
fn typed_items(body: &[String]) -> Vec<SectionItem> {
	entries(body)
		.into_iter()
		.map(|(first, cont)| {
			let (annotation, description) = match first.split_once(':') {
				Some((ty, desc)) => (Some(ty.trim().to_string()), desc.to_string()),
				None => (None, first.clone()),
			};
			SectionItem {
				name: String::new(),
				annotation,
				description: join_description(&description, &cont),
				default: None,
			}
		})
		.collect()
}

/// Return-like sections: either one `type: description` item or a free description.
fn return_items(body: &[String], returns: Option<&str>) -> Vec<SectionItem> {
	let grouped = entries(body);
	let looks_named = grouped.len() > 1 && grouped.iter().all(|(first, _)| ITEM.is_match(first));
	if looks_named {
		return named_items(body)
			.into_iter()
			.map(|mut item| {
				if item.annotation.is_none() {
					item.annotation = Some(std::mem::take(&mut item.name));
				}
				item
			})
			.collect();
	}

	let text = body.join("\n").trim().to_string();
	let (annotation, description) = match text.split_once(':') {
		Some((ty, desc)) if is_type_like(ty) => (Some(ty.trim().to_string()), desc.trim().to_string()),
		_ => (returns.map(str::to_string), text),
	};
	vec![SectionItem {
		name: String::new(),
		annotation,
		description: dedent_tail(&description),
		default: None,
	}]
}

fn is_type_like(text: &str) -> bool {
	let text = text.trim();
	!text.is_empty() && !text.contains('\n') && !text.ends_with('.') && text.split_whitespace().count() <= 3
}

fn dedent_tail(text: &str) -> String {
	let lines: Vec<String> = text.lines().map(str::to_string).collect();
	match lines.split_first() {
		Some((first, rest)) => join_description(first, rest),
		None => String::new(),
	}
}

fn split_type_default(raw: Option<String>) -> (Option<String>, Option<String>) {
	let Some(raw) = raw else {
		return (None, None);
	};
	match DEFAULT_IN_TYPE.captures(&raw) {
		Some(caps) => {
			let start = caps.get(0).map(|m| m.start()).unwrap_or(raw.len());
			let default = caps.get(1).map(|m| m.as_str().trim().to_string());
			let annotation = raw[..start].trim().to_string();
			((!annotation.is_empty()).then_some(annotation), default)
		}
		None => ((!raw.is_empty()).then_some(raw), None),
	}
}

fn fill_from_signature(mut items: Vec<SectionItem>, params: Option<&[Parameter]>) -> Vec<SectionItem> {
	let Some(params) = params else {
		return items;
	};
	for item in &mut items {
		let bare = item.name.trim_start_matches('*');
		let Some(param) = params.iter().find(|p| p.name == bare) else {
			continue;
		};
		if item.annotation.is_none() {
			item.annotation = param.annotation.clone();
		}
		if item.default.is_none() {
			item.default = param.default.clone();
		}
		match param.kind {
			ParameterKind::VarPositional if !item.name.starts_with('*') => item.name = format!("*{}", item.name),
			ParameterKind::VarKeyword if !item.name.starts_with('*') => item.name = format!("**{}", item.name),
			_ => {}
		}
	}
	items
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::python::signature::parse_parameters;

	const DOC: &str = "Automatic ARIMA model.\n\nLonger description\nspanning lines.\n\nArgs:\n    y (np.ndarray): Time series.\n    season_length: Number of observations\n        per unit of time.\n    **kwargs: Extra options.\n\nReturns:\n    self: Fitted model.\n\nRaises:\n    ValueError: If `y` is empty.\n\nNote:\n    Requires numpy.\n\nExamples:\n    >>> AutoARIMA().fit(y)";

	#[test]
	fn parses_google_sections() {
		let params = parse_parameters("self, y, season_length: int = 1, **kwargs");
		let sections = parse_google(DOC, Some(&params), Some("AutoARIMA"));

		assert_eq!(
			sections[0],
			DocstringSection::Text("Automatic ARIMA model.\n\nLonger description\nspanning lines.".to_string())
		);

		let DocstringSection::Parameters(items) = &sections[1] else {
			panic!("expected parameters, got {:?}", sections[1]);
		};
		assert_eq!(items.len(), 3);
		assert_eq!(items[0].name, "y");
		assert_eq!(items[0].annotation.as_deref(), Some("np.ndarray"));
		assert_eq!(items[1].annotation.as_deref(), Some("int"));
		assert_eq!(items[1].default.as_deref(), Some("1"));
		assert_eq!(items[1].description, "Number of observations\nper unit of time.");
		assert_eq!(items[2].name, "**kwargs");

		let DocstringSection::Returns(returns) = &sections[2] else {
			panic!("expected returns, got {:?}", sections[2]);
		};
		assert_eq!(returns[0].annotation.as_deref(), Some("self"));
		assert_eq!(returns[0].description, "Fitted model.");

		let DocstringSection::Raises(raises) = &sections[3] else {
			panic!("expected raises");
		};
		assert_eq!(raises[0].annotation.as_deref(), Some("ValueError"));

		assert!(matches!(&sections[4], DocstringSection::Admonition { kind, .. } if kind == "note"));
		assert_eq!(sections[5], DocstringSection::Examples(">>> AutoARIMA().fit(y)".to_string()));
	}

	#[test]
	fn return_annotation_filled_from_signature() {
		let sections = parse_google("Count.\n\nReturns:\n    The number of items.", None, Some("int"));
		let DocstringSection::Returns(items) = &sections[1] else {
			panic!("expected returns");
		};
		assert_eq!(items[0].annotation.as_deref(), Some("int"));
		assert_eq!(items[0].description, "The number of items.");
	}

	#[test]
	fn header_without_body_stays_text() {
		let sections = parse_google("Summary.\n\nArgs:\nnot indented", None, None);
		assert_eq!(sections.len(), 1);
		assert!(matches!(&sections[0], DocstringSection::Text(t) if t.contains("Args:")));
	}

	#[test]
	fn non_ascii_indentation_is_measured_in_chars() {
		let sections = parse_google("Add.\n\nArgs:\n    x: first.\n   \u{a0}y: b\n        continued", None, None);
		let DocstringSection::Parameters(items) = &sections[1] else {
			panic!("expected parameters, got {:?}", sections[1]);
		};
		assert_eq!(items.len(), 2);
		assert_eq!(items[1].name, "y");
		assert_eq!(items[1].description, "b\ncontinued");
	}

	#[test]
	fn warnings_title_is_a_warns_section() {
		let sections = parse_google("Load.\n\nWarnings:\n    UserWarning: When large.", None, None);
		let DocstringSection::Warns(items) = &sections[1] else {
			panic!("expected warns, got {:?}", sections[1]);
		};
		assert_eq!(items[0].annotation.as_deref(), Some("UserWarning"));
		assert_eq!(items[0].description, "When large.");
	}

	#[test]
	fn optional_marker_is_stripped_from_type() {
		let sections = parse_google("F.\n\nArgs:\n    x (int, optional): value.", None, None);
		let DocstringSection::Parameters(items) = &sections[1] else {
			panic!("expected parameters");
		};
		assert_eq!(items[0].annotation.as_deref(), Some("int"));
	}
}
