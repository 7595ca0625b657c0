use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use derive_more::Deref;
use serde::Deserialize;
use serde::Serialize;

use crate::DocInjectError;
use crate::DocInjectResult;
use crate::files::absolute_path;
use crate::files::expand_glob;
use crate::files::resolve_file;

/// Fixed table mapping a lowercase file extension to the parser used to read
/// it.
pub const EXTENSION_PARSERS: [(&str, ParserKind); 10] = [
	("json", ParserKind::Json),
	("json5", ParserKind::Json),
	("yaml", ParserKind::Yaml),
	("yml", ParserKind::Yaml),
	("toml", ParserKind::Toml),
	("txt", ParserKind::Text),
	("md", ParserKind::Text),
	("html", ParserKind::Text),
	("j2", ParserKind::Text),
	("jinja2", ParserKind::Text),
];

/// How a data source is read before its query is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
	Json,
	Yaml,
	Toml,
	Text,
}

impl ParserKind {
	/// Look up the parser for a file extension (without the leading dot).
	/// Matching is case-insensitive.
	pub fn from_extension(extension: &str) -> Option<Self> {
		let extension = extension.to_ascii_lowercase();
		EXTENSION_PARSERS
			.iter()
			.find(|(ext, _)| *ext == extension)
			.map(|(_, parser)| *parser)
	}

	/// Returns true for parsers that produce a tree of maps, lists and
	/// scalars.
	pub fn is_structured(self) -> bool {
		!matches!(self, Self::Text)
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Json => "json",
			Self::Yaml => "yaml",
			Self::Toml => "toml",
			Self::Text => "text",
		}
	}
}

impl fmt::Display for ParserKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Where an item reads its data from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
	/// A single file path.
	File(PathBuf),
	/// A recursive glob pattern.
	Glob(String),
}

impl Source {
	pub fn is_glob(&self) -> bool {
		matches!(self, Self::Glob(_))
	}

	/// The extension written in the source value itself, lowercased, without
	/// the leading dot. Empty when there is none.
	fn literal_extension(&self) -> String {
		let path = match self {
			Self::File(path) => path.as_path(),
			Self::Glob(pattern) => Path::new(pattern.as_str()),
		};
		extension_of(path)
	}
}

fn extension_of(path: &Path) -> String {
	path.extension()
		.map(|ext| ext.to_string_lossy().to_ascii_lowercase())
		.unwrap_or_default()
}

/// How values are pulled out of each source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
	/// One expression, bound to `value` (or to the named groups of a text
	/// regex).
	Query(String),
	/// Output variable name mapped to an expression, each evaluated against
	/// the same source.
	Vars(BTreeMap<String, String>),
}

/// Item fields exactly as written in a configuration, before validation.
#[derive(Debug, Default, Deserialize)]
struct RawItem {
	#[serde(default)]
	file: Option<String>,
	#[serde(default)]
	glob: Option<String>,
	#[serde(default)]
	parser: Option<ParserKind>,
	#[serde(default)]
	query: Option<String>,
	#[serde(default)]
	vars: Option<BTreeMap<String, String>>,
	#[serde(default)]
	template: Option<String>,
	#[serde(default)]
	strict_template: Option<bool>,
}

/// The shape-checked part of an item. Produced without touching the
/// filesystem.
struct CheckedItem {
	source: Source,
	parser: Option<ParserKind>,
	extraction: Extraction,
	template: String,
	strict_template: Option<bool>,
}

/// One named injection rule.
#[derive(Debug, Clone)]
pub struct InjectionItem {
	name: String,
	source: Source,
	parser: ParserKind,
	extraction: Extraction,
	template: String,
	strict_template: Option<bool>,
	base_path: PathBuf,
	resolved_files: Vec<PathBuf>,
}

impl InjectionItem {
	/// Build and validate an item from an untyped field map.
	///
	/// Checks run in order and fail on the first violation: source
	/// exclusivity, extraction exclusivity, non-blank strings, then parser
	/// inference. Relative `file`/`glob` values are resolved against `base`.
	pub fn from_value(name: &str, value: serde_json::Value, base: &Path) -> DocInjectResult<Self> {
		if !value.is_object() {
			return Err(DocInjectError::InvalidItem {
				name: name.to_string(),
				reason: "item must be a mapping of field names to values".to_string(),
			});
		}

		let raw: RawItem = serde_json::from_value(value).map_err(|e| {
			DocInjectError::InvalidItem {
				name: name.to_string(),
				reason: e.to_string(),
			}
		})?;

		let checked = check_fields(name, raw)?;

		// Parsers inferred from the file path itself need no I/O.
		let parser = match (checked.parser, &checked.source) {
			(Some(parser), _) => Some(parser),
			(None, Source::File(_)) => Some(infer_parser(name, &checked.source, &[])?),
			(None, Source::Glob(_)) => None,
		};
		if let Some(parser) = parser {
			ensure_parser_fits(name, parser, &checked.extraction)?;
		}

		let base_path = absolute_path(base)?;
		let resolved_files = resolve_source(&checked.source, &base_path)?;

		let parser = match parser {
			Some(parser) => parser,
			None => {
				let inferred = infer_parser(name, &checked.source, &resolved_files)?;
				ensure_parser_fits(name, inferred, &checked.extraction)?;
				inferred
			}
		};

		tracing::trace!(
			item = name,
			%parser,
			files = resolved_files.len(),
			"validated injection item"
		);

		Ok(Self {
			name: name.to_string(),
			source: checked.source,
			parser,
			extraction: checked.extraction,
			template: checked.template,
			strict_template: checked.strict_template,
			base_path,
			resolved_files,
		})
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn source(&self) -> &Source {
		&self.source
	}

	pub fn parser(&self) -> ParserKind {
		self.parser
	}

	pub fn extraction(&self) -> &Extraction {
		&self.extraction
	}

	pub fn template(&self) -> &str {
		&self.template
	}

	/// The item-level strictness override. `None` defers to the process-wide
	/// default.
	pub fn strict_template(&self) -> Option<bool> {
		self.strict_template
	}

	pub fn base_path(&self) -> &Path {
		&self.base_path
	}

	/// Concrete files the source expands to, relative to the base path.
	pub fn resolved_files(&self) -> &[PathBuf] {
		&self.resolved_files
	}

	/// Rebase the item onto `dir` and recompute its resolved files.
	pub fn set_base_path(&mut self, dir: &Path) -> DocInjectResult<()> {
		let base_path = absolute_path(dir)?;
		self.resolved_files = resolve_source(&self.source, &base_path)?;
		self.base_path = base_path;
		Ok(())
	}
}

fn check_fields(name: &str, raw: RawItem) -> DocInjectResult<CheckedItem> {
	let RawItem {
		file,
		glob,
		parser,
		query,
		vars,
		template,
		strict_template,
	} = raw;

	let source = match (file, glob) {
		(Some(file), None) => Source::File(PathBuf::from(file)),
		(None, Some(glob)) => Source::Glob(glob),
		_ => return Err(DocInjectError::AmbiguousSource(name.to_string())),
	};

	let vars = vars.filter(|vars| !vars.is_empty());
	let extraction = match (query, vars) {
		(Some(query), None) => Extraction::Query(query),
		(None, Some(vars)) => Extraction::Vars(vars),
		(Some(_), Some(_)) => return Err(DocInjectError::AmbiguousExtraction(name.to_string())),
		(None, None) => return Err(DocInjectError::MissingExtraction(name.to_string())),
	};

	match &source {
		Source::File(file) => ensure_not_blank(name, "file", &file.to_string_lossy())?,
		Source::Glob(glob) => ensure_not_blank(name, "glob", glob)?,
	}
	match &extraction {
		Extraction::Query(query) => ensure_not_blank(name, "query", query)?,
		Extraction::Vars(vars) => {
			for (var, expression) in vars {
				ensure_not_blank(name, "vars", var)?;
				ensure_not_blank(name, &format!("vars.{var}"), expression)?;
			}
		}
	}

	let Some(template) = template else {
		return Err(DocInjectError::MissingField {
			name: name.to_string(),
			field: "template".to_string(),
		});
	};
	ensure_not_blank(name, "template", &template)?;

	Ok(CheckedItem {
		source,
		parser,
		extraction,
		template,
		strict_template,
	})
}

fn ensure_not_blank(name: &str, field: &str, value: &str) -> DocInjectResult<()> {
	if value.trim().is_empty() {
		return Err(DocInjectError::BlankField {
			name: name.to_string(),
			field: field.to_string(),
		});
	}
	Ok(())
}

/// `vars` are evaluated with the structured accessor only.
fn ensure_parser_fits(name: &str, parser: ParserKind, extraction: &Extraction) -> DocInjectResult<()> {
	if !parser.is_structured() && matches!(extraction, Extraction::Vars(_)) {
		return Err(DocInjectError::VarsWithTextParser(name.to_string()));
	}
	Ok(())
}

/// Infer the parser from the source. Globs prefer the first resolved match
/// and fall back to the pattern's own extension.
fn infer_parser(name: &str, source: &Source, resolved: &[PathBuf]) -> DocInjectResult<ParserKind> {
	let mut extension = source.literal_extension();

	if source.is_glob() {
		if let Some(first) = resolved.first() {
			extension = extension_of(first);
		}
	}

	ParserKind::from_extension(&extension).ok_or_else(|| {
		DocInjectError::UninferableParser {
			name: name.to_string(),
			extension: if extension.is_empty() {
				String::new()
			} else {
				format!(".{extension}")
			},
		}
	})
}

fn resolve_source(source: &Source, base: &Path) -> DocInjectResult<Vec<PathBuf>> {
	match source {
		Source::File(file) => Ok(vec![resolve_file(base, file)]),
		Source::Glob(pattern) => expand_glob(base, pattern),
	}
}

/// A validated mapping from block name to [`InjectionItem`].
#[derive(Debug, Clone, Default, Deref)]
pub struct InjectionConfig(BTreeMap<String, InjectionItem>);

impl InjectionConfig {
	/// Validate every entry of a parsed configuration tree. `value` must be a
	/// mapping of block name to item fields.
	pub fn from_value(value: serde_json::Value, base: &Path) -> DocInjectResult<Self> {
		let serde_json::Value::Object(entries) = value else {
			return Err(DocInjectError::InvalidConfig(format!(
				"expected a mapping of block names, found {}",
				describe_value(&value)
			)));
		};

		let mut items = BTreeMap::new();
		for (name, fields) in entries {
			let item = InjectionItem::from_value(&name, fields, base)?;
			items.insert(name, item);
		}

		Ok(Self(items))
	}

	pub fn items(&self) -> &BTreeMap<String, InjectionItem> {
		&self.0
	}

	/// Rebase every item onto `dir`.
	pub fn set_base_path(&mut self, dir: &Path) -> DocInjectResult<()> {
		for item in self.0.values_mut() {
			item.set_base_path(dir)?;
		}
		Ok(())
	}

	/// Consuming form of [`InjectionConfig::set_base_path`].
	pub fn with_base_path(mut self, dir: &Path) -> DocInjectResult<Self> {
		self.set_base_path(dir)?;
		Ok(self)
	}
}

impl FromIterator<InjectionItem> for InjectionConfig {
	fn from_iter<T: IntoIterator<Item = InjectionItem>>(iter: T) -> Self {
		Self(
			iter.into_iter()
				.map(|item| (item.name.clone(), item))
				.collect(),
		)
	}
}

pub(crate) fn describe_value(value: &serde_json::Value) -> &'static str {
	match value {
		serde_json::Value::Null => "null",
		serde_json::Value::Bool(_) => "a boolean",
		serde_json::Value::Number(_) => "a number",
		serde_json::Value::String(_) => "a string",
		serde_json::Value::Array(_) => "a list",
		serde_json::Value::Object(_) => "a mapping",
	}
}
