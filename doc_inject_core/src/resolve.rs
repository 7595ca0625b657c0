use serde_json::Map;
use serde_json::Value;

use crate::DocInjectResult;
use crate::Extraction;
use crate::InjectionItem;
use crate::ParserKind;
use crate::Source;
use crate::structured;
use crate::template::render_template;
use crate::text;

/// Key that single-query results are bound to.
pub const VALUE_KEY: &str = "value";

/// Variables made available to an item's template.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderContext {
	/// Render the template once with this map.
	Single(Map<String, Value>),
	/// Render the template once per map, in order.
	Each(Vec<Map<String, Value>>),
}

impl RenderContext {
	/// Render `template` against this context. [`RenderContext::Each`]
	/// renders once per map and joins the results with newlines.
	pub fn render(&self, template: &str, strict: bool) -> DocInjectResult<String> {
		match self {
			Self::Single(context) => render_template(template, context, strict),
			Self::Each(contexts) => {
				let rendered = contexts
					.iter()
					.map(|context| render_template(template, context, strict))
					.collect::<DocInjectResult<Vec<_>>>()?;
				Ok(rendered.join("\n"))
			}
		}
	}
}

/// Evaluate an item's extraction against its resolved files.
///
/// - `vars`: one map of variable name to value per file.
/// - `query` with the `text` parser: one map of named captures per file.
/// - `query` with a structured parser: the result bound to `value`. For a glob
///   every file's result is collected into one list bound to `value`.
///
/// File sources produce a [`RenderContext::Single`]; a missing file is a
/// [`crate::DocInjectError::DataFileNotFound`]. Glob sources produce
/// [`RenderContext::Each`], except for the aggregated structured query, and
/// zero matches is not an error.
pub fn resolve(item: &InjectionItem) -> DocInjectResult<RenderContext> {
	let files = item.resolved_files();
	tracing::debug!(item = item.name(), files = files.len(), "resolving item");

	let per_file = files
		.iter()
		.map(|path| {
			match item.extraction() {
				Extraction::Vars(vars) => {
					vars.iter()
						.map(|(name, query)| {
							structured::evaluate(path, query, item.parser())
								.map(|value| (name.clone(), value))
						})
						.collect::<DocInjectResult<Map<String, Value>>>()
				}
				Extraction::Query(query) if item.parser() == ParserKind::Text => {
					let captures = text::evaluate(path, query)?;
					Ok(captures
						.into_iter()
						.map(|(name, value)| (name, Value::String(value)))
						.collect())
				}
				Extraction::Query(query) => {
					let value = structured::evaluate(path, query, item.parser())?;
					Ok(Map::from_iter([(VALUE_KEY.to_string(), value)]))
				}
			}
		})
		.collect::<DocInjectResult<Vec<Map<String, Value>>>>()?;

	let aggregate = matches!(item.extraction(), Extraction::Query(_)) && item.parser().is_structured();

	Ok(match item.source() {
		Source::File(_) => RenderContext::Single(per_file.into_iter().next().unwrap_or_default()),
		Source::Glob(_) if aggregate => {
			let values = per_file
				.into_iter()
				.filter_map(|mut map| map.remove(VALUE_KEY))
				.collect();
			RenderContext::Single(Map::from_iter([(VALUE_KEY.to_string(), Value::Array(values))]))
		}
		Source::Glob(_) => RenderContext::Each(per_file),
	})
}
