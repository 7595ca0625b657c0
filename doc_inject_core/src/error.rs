use miette::Diagnostic;
use thiserror::Error;

/// Broad classification of a [`DocInjectError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
	/// Malformed item or configuration shape.
	Validation,
	/// A file, query match, key, block name or marker could not be found.
	NotFound,
	/// A document, data file or config body could not be parsed.
	Parse,
	/// The template engine failed to render.
	Render,
	/// A file extension, parser or query kind is not recognized.
	UnsupportedFormat,
	/// Reading or writing a file failed.
	Io,
}

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum DocInjectError {
	#[error(transparent)]
	#[diagnostic(code(doc_inject::io_error))]
	Io(#[from] std::io::Error),

	#[error("invalid configuration: {0}")]
	#[diagnostic(
		code(doc_inject::invalid_config),
		help("the configuration must be a mapping of block name to item fields")
	)]
	InvalidConfig(String),

	#[error("invalid item `{name}`: {reason}")]
	#[diagnostic(code(doc_inject::invalid_item))]
	InvalidItem { name: String, reason: String },

	#[error("item `{0}`: exactly one of 'file' or 'glob' must be provided")]
	#[diagnostic(code(doc_inject::ambiguous_source))]
	AmbiguousSource(String),

	#[error("item `{0}`: either 'query' or 'vars' must be defined")]
	#[diagnostic(code(doc_inject::missing_extraction))]
	MissingExtraction(String),

	#[error("item `{0}`: provide either 'query' or 'vars', not both")]
	#[diagnostic(code(doc_inject::ambiguous_extraction))]
	AmbiguousExtraction(String),

	#[error("item `{name}`: missing required field `{field}`")]
	#[diagnostic(code(doc_inject::missing_field))]
	MissingField { name: String, field: String },

	#[error("item `{name}`: field `{field}` must not be blank")]
	#[diagnostic(code(doc_inject::blank_field))]
	BlankField { name: String, field: String },

	#[error("item `{name}`: cannot infer parser from file extension '{extension}'")]
	#[diagnostic(
		code(doc_inject::uninferable_parser),
		help("set `parser` to one of: json, yaml, toml, text")
	)]
	UninferableParser { name: String, extension: String },

	#[error("item `{0}`: 'vars' requires a structured parser (json, yaml or toml)")]
	#[diagnostic(
		code(doc_inject::vars_with_text_parser),
		help("use a single `query` with `regex:` named groups for text sources")
	)]
	VarsWithTextParser(String),

	#[error("invalid glob pattern `{pattern}`: {reason}")]
	#[diagnostic(code(doc_inject::invalid_glob))]
	InvalidGlob { pattern: String, reason: String },

	#[error("document not found: `{0}`")]
	#[diagnostic(code(doc_inject::document_not_found))]
	DocumentNotFound(String),

	#[error("data file not found: `{0}`")]
	#[diagnostic(code(doc_inject::data_file_not_found))]
	DataFileNotFound(String),

	#[error("no match found for JSONPath query `{query}` in `{path}`")]
	#[diagnostic(code(doc_inject::no_query_match))]
	NoQueryMatch { path: String, query: String },

	#[error("key '{key}' not found while traversing `{query}` in `{path}`")]
	#[diagnostic(code(doc_inject::key_not_found))]
	KeyNotFound {
		path: String,
		query: String,
		key: String,
	},

	#[error("no match found for regex pattern `{pattern}` in `{path}`")]
	#[diagnostic(code(doc_inject::no_regex_match))]
	NoRegexMatch { path: String, pattern: String },

	#[error("no config found for injection block: `{0}`")]
	#[diagnostic(
		code(doc_inject::missing_block_config),
		help("add an item named `{0}` to the configuration or remove the markers")
	)]
	MissingBlockConfig(String),

	#[error("config file not found: `{0}`")]
	#[diagnostic(code(doc_inject::config_file_not_found))]
	ConfigFileNotFound(String),

	#[error("invalid config query: '{query}' (missing key '{key}')")]
	#[diagnostic(code(doc_inject::config_query))]
	ConfigQueryKeyNotFound { query: String, key: String },

	#[error("no usable config block found in `{0}`")]
	#[diagnostic(
		code(doc_inject::no_config_block),
		help("add a comment containing `doc-inject:configure` or pass an explicit config file")
	)]
	NoConfigBlock(String),

	#[error("failed to parse data file `{path}`: {reason}")]
	#[diagnostic(code(doc_inject::data_file_parse))]
	DataFileParse { path: String, reason: String },

	#[error("failed to parse config file `{path}`: {reason}")]
	#[diagnostic(code(doc_inject::config_file_parse))]
	ConfigFileParse { path: String, reason: String },

	#[error("unable to parse config block as YAML or JSON5 ({0})")]
	#[diagnostic(code(doc_inject::unparseable_config_block))]
	UnparseableConfigBlock(String),

	#[error("config block found but failed to parse: {0}")]
	#[diagnostic(code(doc_inject::config_block_parse))]
	ConfigBlockParse(Box<DocInjectError>),

	#[error("invalid JSONPath query `{query}`: {reason}")]
	#[diagnostic(code(doc_inject::invalid_jsonpath))]
	InvalidJsonPath { query: String, reason: String },

	#[error("invalid regex pattern `{pattern}`: {reason}")]
	#[diagnostic(code(doc_inject::invalid_regex))]
	InvalidRegex { pattern: String, reason: String },

	#[error("invalid slice syntax in query: '{0}'")]
	#[diagnostic(
		code(doc_inject::invalid_slice),
		help("use `slice:<start>:<end>` with integer bounds, e.g. `slice:0:10`")
	)]
	InvalidSlice(String),

	#[error("missing end marker for injection block `{name}` opened on line {line}")]
	#[diagnostic(
		code(doc_inject::unclosed_marker),
		help("add `<!-- DOC_INJECT_END {name} -->` to close this block")
	)]
	UnclosedMarker { name: String, line: usize },

	#[error("end marker for injection block `{name}` on line {line} has no start marker")]
	#[diagnostic(code(doc_inject::unexpected_end_marker))]
	UnexpectedEndMarker { name: String, line: usize },

	#[error("end marker `{found}` on line {line} does not close the open block `{expected}`")]
	#[diagnostic(
		code(doc_inject::mismatched_marker),
		help("injection blocks must nest without overlapping")
	)]
	MismatchedMarker {
		expected: String,
		found: String,
		line: usize,
	},

	#[error("failed to render template: {0}")]
	#[diagnostic(code(doc_inject::template_render))]
	TemplateRender(String),

	#[error("unsupported config file format: `{0}`")]
	#[diagnostic(
		code(doc_inject::unsupported_config_format),
		help("supported formats: json, json5, yaml, yml, toml")
	)]
	UnsupportedConfigFormat(String),

	#[error("unsupported text query: '{0}'")]
	#[diagnostic(
		code(doc_inject::unsupported_text_query),
		help("text queries start with `regex:` or `slice:`")
	)]
	UnsupportedTextQuery(String),

	#[error("parser `{0}` cannot evaluate structured queries")]
	#[diagnostic(code(doc_inject::unsupported_parser))]
	UnsupportedParser(String),

	#[error("symlink cycle detected at: `{0}`")]
	#[diagnostic(
		code(doc_inject::symlink_cycle),
		help("remove the circular symlink or narrow the glob pattern")
	)]
	SymlinkCycle(String),
}

impl DocInjectError {
	/// The taxonomy category this error belongs to.
	pub fn category(&self) -> ErrorCategory {
		match self {
			Self::Io(_) => ErrorCategory::Io,
			Self::InvalidConfig(_)
			| Self::InvalidItem { .. }
			| Self::AmbiguousSource(_)
			| Self::MissingExtraction(_)
			| Self::AmbiguousExtraction(_)
			| Self::MissingField { .. }
			| Self::BlankField { .. }
			| Self::UninferableParser { .. }
			| Self::VarsWithTextParser(_)
			| Self::InvalidGlob { .. } => ErrorCategory::Validation,
			Self::DocumentNotFound(_)
			| Self::DataFileNotFound(_)
			| Self::NoQueryMatch { .. }
			| Self::KeyNotFound { .. }
			| Self::NoRegexMatch { .. }
			| Self::MissingBlockConfig(_)
			| Self::ConfigFileNotFound(_)
			| Self::ConfigQueryKeyNotFound { .. }
			| Self::NoConfigBlock(_) => ErrorCategory::NotFound,
			Self::DataFileParse { .. }
			| Self::ConfigFileParse { .. }
			| Self::UnparseableConfigBlock(_)
			| Self::ConfigBlockParse(_)
			| Self::InvalidJsonPath { .. }
			| Self::InvalidRegex { .. }
			| Self::InvalidSlice(_)
			| Self::UnclosedMarker { .. }
			| Self::UnexpectedEndMarker { .. }
			| Self::MismatchedMarker { .. }
			| Self::SymlinkCycle(_) => ErrorCategory::Parse,
			Self::TemplateRender(_) => ErrorCategory::Render,
			Self::UnsupportedConfigFormat(_)
			| Self::UnsupportedTextQuery(_)
			| Self::UnsupportedParser(_) => ErrorCategory::UnsupportedFormat,
		}
	}
}

pub type DocInjectResult<T> = Result<T, DocInjectError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
