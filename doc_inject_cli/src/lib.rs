use std::path::PathBuf;

use clap::Parser;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter(verbose: bool) -> &'static str {
	if verbose { "debug" } else { "warn" }
}

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Render data-driven snippets into marked blocks of your documents.",
	long_about = "doc-inject replaces the contents of `DOC_INJECT_START` / `DOC_INJECT_END` \
	              marker pairs with text rendered from your project's data files.\n\nEach \
	              document carries its own configuration in a `doc-inject:configure` comment, \
	              or shares an external config file passed with `--config`.\n\nExamples:\n  \
	              doc-inject README.md             Update a document in place\n  doc-inject \
	              --check docs/*.md     Fail when any document is out of date\n  doc-inject \
	              --config pyproject.toml README.md"
)]
#[allow(clippy::struct_excessive_bools)]
pub struct DocInjectCli {
	/// Documents to process, in order.
	#[arg(required = true, value_name = "FILES")]
	pub files: Vec<PathBuf>,

	/// External config file (json, json5, yaml, yml or toml). When omitted,
	/// each document's embedded `doc-inject:configure` block is used.
	#[arg(long, short)]
	pub config: Option<PathBuf>,

	/// Dot-separated key path selecting the items inside `--config`. TOML
	/// files default to `tool.doc-inject`.
	#[arg(long, short, requires = "config")]
	pub query: Option<String>,

	/// Print each rendered document to stdout instead of writing it.
	#[arg(long, default_value_t = false, conflicts_with = "check")]
	pub dry_run: bool,

	/// Exit with status 1 and print a diff when any document would change.
	/// Nothing is written.
	#[arg(long, default_value_t = false)]
	pub check: bool,

	/// Enable verbose output.
	#[arg(long, short, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, default_value_t = false)]
	pub no_color: bool,
}
