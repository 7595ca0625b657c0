use std::ops::Range;
use std::path::Path;
use std::path::PathBuf;

use regex::Regex;

use crate::DocInjectError;
use crate::DocInjectResult;
use crate::InjectionConfig;
use crate::files::read_document;
use crate::resolve::resolve;

/// Start and end markers, e.g. `<!-- DOC_INJECT_START name -->` or
/// `# DOC_INJECT_END name`. Hyphens in a name join word characters, so a
/// closer written directly after the name is not part of it.
pub const MARKER_PATTERN: &str =
	r"(?:<!--|\{#|//|#|;)[ \t]*DOC_INJECT_(START|END)[ \t]+(\w+(?:-\w+)*)(?:[ \t]*(?:-->|#\}))?";

/// Options controlling how a document is injected.
#[derive(Debug, Clone, Copy)]
pub struct InjectOptions {
	/// Default template strictness for items without `strict_template`.
	pub strict: bool,
}

impl Default for InjectOptions {
	fn default() -> Self {
		Self { strict: true }
	}
}

/// A start/end marker pair found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionBlock {
	/// The block name shared by both markers.
	pub name: String,
	/// Byte range of the start marker.
	pub start: Range<usize>,
	/// Byte range of the end marker.
	pub end: Range<usize>,
	/// 1-indexed line of the start marker.
	pub line: usize,
	/// Nesting depth. Outermost blocks have depth `0`.
	pub depth: usize,
}

impl InjectionBlock {
	/// Byte range covering both markers and everything between them.
	pub fn span(&self) -> Range<usize> {
		self.start.start..self.end.end
	}
}

fn line_of(content: &str, offset: usize) -> usize {
	content[..offset].matches('\n').count() + 1
}

/// Find every marker pair in `content`, ordered by start offset.
///
/// Markers may nest but must not overlap. An end marker must close the
/// innermost open block with the same name.
pub fn find_blocks(content: &str) -> DocInjectResult<Vec<InjectionBlock>> {
	let markers = Regex::new(MARKER_PATTERN).map_err(|e| {
		DocInjectError::InvalidRegex {
			pattern: MARKER_PATTERN.to_string(),
			reason: e.to_string(),
		}
	})?;
	let mut open: Vec<(String, Range<usize>, usize)> = Vec::new();
	let mut blocks = Vec::new();

	for captures in markers.captures_iter(content) {
		let (Some(whole), Some(kind), Some(name)) = (captures.get(0), captures.get(1), captures.get(2))
		else {
			continue;
		};
		let line = line_of(content, whole.start());
		let name = name.as_str().to_string();

		if kind.as_str() == "START" {
			open.push((name, whole.range(), line));
			continue;
		}

		let Some((open_name, start, start_line)) = open.pop() else {
			return Err(DocInjectError::UnexpectedEndMarker { name, line });
		};
		if open_name != name {
			return Err(DocInjectError::MismatchedMarker {
				expected: open_name,
				found: name,
				line,
			});
		}

		blocks.push(InjectionBlock {
			name,
			start,
			end: whole.range(),
			line: start_line,
			depth: open.len(),
		});
	}

	if let Some((name, _, line)) = open.pop() {
		return Err(DocInjectError::UnclosedMarker { name, line });
	}

	blocks.sort_by_key(|block| block.start.start);
	Ok(blocks)
}

/// Render every injection block of `content` and return the updated text.
///
/// All blocks are rendered before anything is assembled, so any failure leaves
/// no partial result. Every marker name, nested or not, must have an item in
/// `config`.
pub fn render_document(content: &str, config: &InjectionConfig, options: &InjectOptions) -> DocInjectResult<String> {
	let blocks = find_blocks(content)?;

	if let Some(block) = blocks.iter().find(|block| !config.contains_key(&block.name)) {
		return Err(DocInjectError::MissingBlockConfig(block.name.clone()));
	}

	let mut result = String::with_capacity(content.len());
	let mut cursor = 0;

	for block in blocks.iter().filter(|block| block.depth == 0) {
		let Some(item) = config.get(&block.name) else {
			return Err(DocInjectError::MissingBlockConfig(block.name.clone()));
		};

		let strict = item.strict_template().unwrap_or(options.strict);
		let rendered = resolve(item)?.render(item.template(), strict)?;
		tracing::debug!(block = %block.name, line = block.line, strict, "rendered injection block");

		result.push_str(&content[cursor..block.start.start]);
		result.push_str(&content[block.start.clone()]);
		result.push('\n');
		result.push_str(&rendered);
		result.push('\n');
		result.push_str(&content[block.end.clone()]);
		cursor = block.end.end;
	}

	result.push_str(&content[cursor..]);
	Ok(result)
}

/// A rendered document that has not necessarily been written yet.
#[derive(Debug, Clone)]
pub struct Injection {
	/// Path of the document.
	pub path: PathBuf,
	/// Content read from disk.
	pub original: String,
	/// Content after every block was rendered.
	pub updated: String,
}

impl Injection {
	/// Returns true when rendering changed the document.
	pub fn is_changed(&self) -> bool {
		self.original != self.updated
	}

	/// Write the updated content back to the document. Unchanged documents are
	/// not touched.
	pub fn write(&self) -> DocInjectResult<()> {
		if self.is_changed() {
			std::fs::write(&self.path, &self.updated)?;
		}
		Ok(())
	}
}

/// Read the document at `path` and render it in memory.
pub fn prepare(path: &Path, config: &InjectionConfig, options: &InjectOptions) -> DocInjectResult<Injection> {
	let original = read_document(path)?;
	let updated = render_document(&original, config, options)?;

	Ok(Injection {
		path: path.to_path_buf(),
		original,
		updated,
	})
}

/// Render the document at `path` and write the result back.
pub fn apply(path: &Path, config: &InjectionConfig, options: &InjectOptions) -> DocInjectResult<Injection> {
	let injection = prepare(path, config, options)?;
	injection.write()?;
	Ok(injection)
}
