//! Discovery of `doc-inject:configure` blocks written in a document's own
//! comment syntax.
//!
//! The locator never parses the host format. It derives candidate comment
//! syntaxes from the file name, tries each extraction strategy as a pure
//! function over the text, and parses the first block it finds. Once a block
//! has been found, parse and validation failures are final.

use std::path::Path;

use regex::Regex;
use regex::RegexBuilder;
use serde_json::Value;

use crate::DocInjectError;
use crate::DocInjectResult;
use crate::InjectionConfig;
use crate::files::read_document;
use crate::item::describe_value;

/// Literal token that marks a comment as a configuration block.
pub const CONFIG_DIRECTIVE: &str = "doc-inject:configure";

/// Candidate extensions used when a file name has no extension at all.
pub const DEFAULT_EXTENSION_CHAIN: [&str; 2] = ["html", "json"];

/// How the comments of a host format are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
	/// AsciiDoc: `////` fences, `[comment]` blocks and `//` line comments.
	AsciiDoc,
	/// Every comment line starts with the same prefix (`#`, `//`, `;`).
	Line,
	/// Comments are wrapped in an opening and closing delimiter.
	Paired,
}

/// The comment syntax of one host format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentSyntax {
	pub prefix: &'static str,
	pub suffix: &'static str,
	pub style: CommentStyle,
}

impl CommentSyntax {
	const fn line(prefix: &'static str) -> Self {
		Self {
			prefix,
			suffix: prefix,
			style: CommentStyle::Line,
		}
	}

	const fn paired(prefix: &'static str, suffix: &'static str) -> Self {
		Self {
			prefix,
			suffix,
			style: CommentStyle::Paired,
		}
	}
}

/// Host file extension to comment syntax.
pub const COMMENT_SYNTAX: [(&str, CommentSyntax); 13] = [
	(
		"adoc",
		CommentSyntax {
			prefix: "//",
			suffix: "//",
			style: CommentStyle::AsciiDoc,
		},
	),
	(
		"asciidoc",
		CommentSyntax {
			prefix: "//",
			suffix: "//",
			style: CommentStyle::AsciiDoc,
		},
	),
	("json", CommentSyntax::line("//")),
	("json5", CommentSyntax::line("//")),
	("html", CommentSyntax::paired("<!--", "-->")),
	("md", CommentSyntax::paired("<!--", "-->")),
	("ini", CommentSyntax::line(";")),
	("j2", CommentSyntax::paired("{#", "#}")),
	("jinja2", CommentSyntax::paired("{#", "#}")),
	("py", CommentSyntax::line("#")),
	("toml", CommentSyntax::line("#")),
	("yaml", CommentSyntax::line("#")),
	("yml", CommentSyntax::line("#")),
];

/// Look up the comment syntax for an extension (without the leading dot).
pub fn comment_syntax(extension: &str) -> Option<CommentSyntax> {
	COMMENT_SYNTAX
		.iter()
		.find(|(ext, _)| *ext == extension)
		.map(|(_, syntax)| *syntax)
}

/// Candidate extensions for a file name, innermost first.
///
/// `report.jinja2.json5` yields `["json5", "jinja2"]`; a name without any
/// extension yields [`DEFAULT_EXTENSION_CHAIN`].
pub fn extension_chain(file_name: &str) -> Vec<String> {
	let mut chain: Vec<String> = file_name.split('.').skip(1).map(str::to_ascii_lowercase).collect();
	chain.reverse();

	if chain.is_empty() {
		DEFAULT_EXTENSION_CHAIN.iter().map(ToString::to_string).collect()
	} else {
		chain
	}
}

/// Locate, parse and validate the embedded config of the document at `path`.
/// Items are based at the document's directory.
pub fn locate(path: &Path) -> DocInjectResult<InjectionConfig> {
	let content = read_document(path)?;
	let file_name = path
		.file_name()
		.map(|name| name.to_string_lossy().to_string())
		.unwrap_or_default();
	let base = path.parent().unwrap_or_else(|| Path::new("."));

	let Some(value) = locate_in_text(&content, &file_name)? else {
		return Err(DocInjectError::NoConfigBlock(path.display().to_string()));
	};

	InjectionConfig::from_value(value, base)
}

/// Find and parse the config block in `content`, using `file_name` to pick
/// candidate comment syntaxes. Returns `Ok(None)` when no candidate yields a
/// block.
pub fn locate_in_text(content: &str, file_name: &str) -> DocInjectResult<Option<Value>> {
	for extension in extension_chain(file_name) {
		let Some(syntax) = comment_syntax(&extension) else {
			tracing::trace!(%extension, "no comment syntax for extension");
			continue;
		};

		let Some(block) = extract_config_block(content, syntax) else {
			tracing::trace!(%extension, "no config block for extension");
			continue;
		};

		tracing::debug!(%extension, "found embedded config block");
		let value = parse_config_block(&block)
			.map_err(|e| DocInjectError::ConfigBlockParse(Box::new(e)))?;
		return Ok(Some(value));
	}

	Ok(None)
}

/// Run the extraction strategies that apply to `syntax` in priority order and
/// return the first raw block found.
pub fn extract_config_block(content: &str, syntax: CommentSyntax) -> Option<String> {
	if syntax.style == CommentStyle::AsciiDoc {
		if let Some(block) = extract_delimited_block(content, "////") {
			return Some(block);
		}
		if let Some(block) = extract_attribute_block(content, "[comment]", "--") {
			return Some(block);
		}
		if let Some(block) = extract_attribute_paragraph(content, "[comment]") {
			return Some(block);
		}
	}

	match syntax.style {
		CommentStyle::AsciiDoc | CommentStyle::Line => extract_line_comments(content, syntax.prefix),
		CommentStyle::Paired => extract_paired_comment(content, syntax.prefix, syntax.suffix),
	}
}

/// A block fenced by lines consisting solely of `fence`. The first non-empty
/// line inside must carry the directive; the rest is dedented.
pub fn extract_delimited_block(content: &str, fence: &str) -> Option<String> {
	let lines: Vec<&str> = content.lines().collect();
	let mut index = 0;

	while index < lines.len() {
		if lines[index].trim() != fence {
			index += 1;
			continue;
		}

		let body_start = index + 1;
		let body_len = lines[body_start..]
			.iter()
			.position(|line| line.trim() == fence)
			.unwrap_or(lines.len() - body_start);
		let body = &lines[body_start..body_start + body_len];

		if let Some(block) = directive_body(body) {
			return Some(block);
		}

		// Skip past the closing fence.
		index = body_start + body_len + 1;
	}

	None
}

/// An `attribute` line directly followed by an opening `closer` line; the
/// block runs to the next `closer` line.
pub fn extract_attribute_block(content: &str, attribute: &str, closer: &str) -> Option<String> {
	let lines: Vec<&str> = content.lines().collect();

	for (index, line) in lines.iter().enumerate() {
		if !line.trim().eq_ignore_ascii_case(attribute) || index + 2 >= lines.len() {
			continue;
		}
		if lines[index + 1].trim() != closer {
			continue;
		}

		let body: Vec<&str> = lines[index + 2..]
			.iter()
			.take_while(|inner| inner.trim() != closer)
			.copied()
			.collect();

		if let Some(block) = directive_body(&body) {
			return Some(block);
		}
	}

	None
}

/// An `attribute` line followed by a paragraph that ends at the first blank
/// line.
pub fn extract_attribute_paragraph(content: &str, attribute: &str) -> Option<String> {
	let lines: Vec<&str> = content.lines().collect();

	for (index, line) in lines.iter().enumerate() {
		if !line.trim().eq_ignore_ascii_case(attribute) || index + 1 >= lines.len() {
			continue;
		}

		let body: Vec<&str> = lines[index + 1..]
			.iter()
			.take_while(|inner| !inner.trim().is_empty())
			.copied()
			.collect();

		if let Some(block) = directive_body(&body) {
			return Some(block);
		}
	}

	None
}

/// Consecutive `prefix` comment lines after a `<prefix> doc-inject:configure`
/// line. The prefix is stripped from each line and the result dedented as a
/// whole.
pub fn extract_line_comments(content: &str, prefix: &str) -> Option<String> {
	let directive = Regex::new(&format!(
		r"(?i)^{}\s+{}\b",
		regex::escape(prefix),
		regex::escape(CONFIG_DIRECTIVE)
	))
	.ok()?;

	let mut lines = content.lines();
	lines.find(|line| directive.is_match(line.trim_start()))?;

	let block: Vec<&str> = lines
		.map(str::trim_start)
		.map_while(|line| line.strip_prefix(prefix))
		.collect();

	if block.is_empty() {
		return None;
	}

	Some(dedent(&block.join("\n")))
}

/// A single `prefix … doc-inject:configure … suffix` comment, possibly
/// spanning several lines. The body is trimmed.
pub fn extract_paired_comment(content: &str, prefix: &str, suffix: &str) -> Option<String> {
	let pattern = format!(
		r"{}\s*{}\s*(.*?)\s*{}",
		regex::escape(prefix),
		regex::escape(CONFIG_DIRECTIVE),
		regex::escape(suffix)
	);
	let regex = RegexBuilder::new(&pattern)
		.case_insensitive(true)
		.dot_matches_new_line(true)
		.build()
		.ok()?;

	regex
		.captures(content)
		.and_then(|captures| captures.get(1))
		.map(|body| body.as_str().trim().to_string())
}

/// When the first non-empty line carries the directive, return the remaining
/// lines dedented.
fn directive_body(body: &[&str]) -> Option<String> {
	let first = body.iter().position(|line| !line.trim().is_empty())?;
	if !body[first].contains(CONFIG_DIRECTIVE) {
		return None;
	}

	Some(dedent(&body[first + 1..].join("\n")))
}

/// Remove the whitespace prefix common to every non-blank line. Blank lines
/// become empty.
pub fn dedent(text: &str) -> String {
	let margin = text
		.lines()
		.filter(|line| !line.trim().is_empty())
		.map(|line| &line[..line.len() - line.trim_start().len()])
		.reduce(|common, indent| {
			let shared = common
				.char_indices()
				.zip(indent.chars())
				.take_while(|((_, a), b)| a == b)
				.last()
				.map_or(0, |((index, c), _)| index + c.len_utf8());
			&common[..shared]
		})
		.unwrap_or("");

	text.lines()
		.map(|line| {
			if line.trim().is_empty() {
				""
			} else {
				line.strip_prefix(margin).unwrap_or(line)
			}
		})
		.collect::<Vec<_>>()
		.join("\n")
}

type ConfigParser = fn(&str) -> Result<Value, String>;

/// Parsers tried in order on a raw config block.
const CONFIG_BLOCK_PARSERS: [(&str, ConfigParser); 2] = [("yaml", parse_yaml_block), ("json5", parse_json5_block)];

fn parse_yaml_block(text: &str) -> Result<Value, String> {
	serde_yaml_ng::from_str(text).map_err(|e| e.to_string())
}

fn parse_json5_block(text: &str) -> Result<Value, String> {
	json5::from_str(text).map_err(|e| e.to_string())
}

/// Parse a raw config block, trying YAML first and JSON5 second. The first
/// attempt producing a mapping wins. When none does, the error lists why each
/// attempt was rejected.
pub fn parse_config_block(block: &str) -> DocInjectResult<Value> {
	let mut failures = Vec::new();

	for (parser, parse) in CONFIG_BLOCK_PARSERS {
		match parse(block) {
			Ok(value @ Value::Object(_)) => return Ok(value),
			Ok(other) => {
				tracing::debug!(parser, "config block is not a mapping");
				failures.push(format!(
					"{parser}: expected a mapping, found {}",
					describe_value(&other)
				));
			}
			Err(reason) => {
				tracing::debug!(parser, %reason, "config block attempt failed");
				failures.push(format!("{parser}: {reason}"));
			}
		}
	}

	Err(DocInjectError::UnparseableConfigBlock(failures.join("; ")))
}
