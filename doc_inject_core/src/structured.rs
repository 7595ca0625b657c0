use std::path::Path;

use serde_json::Value;
use serde_json_path::JsonPath;

use crate::DocInjectError;
use crate::DocInjectResult;
use crate::ParserKind;

/// Evaluate `query` against the structured data file at `path`.
///
/// `json` sources take a JSONPath expression, `yaml` and `toml` sources a
/// dotted key path.
pub fn evaluate(path: &Path, query: &str, parser: ParserKind) -> DocInjectResult<Value> {
	let data = load_structured(path, parser)?;
	let path_display = path.display().to_string();

	match parser {
		ParserKind::Json => query_json_path(&data, query, &path_display),
		ParserKind::Yaml | ParserKind::Toml => query_dotted_path(&data, query, &path_display),
		ParserKind::Text => Err(DocInjectError::UnsupportedParser(parser.to_string())),
	}
}

/// Read and parse a whole data file.
pub fn load_structured(path: &Path, parser: ParserKind) -> DocInjectResult<Value> {
	let content = read_data_file(path)?;
	parse_structured(&content, parser, &path.display().to_string())
}

pub(crate) fn read_data_file(path: &Path) -> DocInjectResult<String> {
	std::fs::read_to_string(path).map_err(|e| {
		if e.kind() == std::io::ErrorKind::NotFound {
			DocInjectError::DataFileNotFound(path.display().to_string())
		} else {
			DocInjectError::Io(e)
		}
	})
}

/// Parse `content` into a `serde_json::Value`. JSON that fails strict
/// parsing is retried as JSON5, which accepts comments and trailing commas.
pub fn parse_structured(content: &str, parser: ParserKind, path_display: &str) -> DocInjectResult<Value> {
	let parse_error = |reason: String| {
		DocInjectError::DataFileParse {
			path: path_display.to_string(),
			reason,
		}
	};

	match parser {
		ParserKind::Json => {
			serde_json::from_str::<Value>(content).or_else(|json_error| {
				json5::from_str::<Value>(content).map_err(|json5_error| {
					parse_error(format!("not valid JSON ({json_error}) or JSON5 ({json5_error})"))
				})
			})
		}
		ParserKind::Yaml => serde_yaml_ng::from_str(content).map_err(|e| parse_error(e.to_string())),
		ParserKind::Toml => {
			let value: toml::Value = toml::from_str(content).map_err(|e| parse_error(e.to_string()))?;
			Ok(toml_to_json(value))
		}
		ParserKind::Text => Err(DocInjectError::UnsupportedParser(parser.to_string())),
	}
}

/// Evaluate a JSONPath expression. One match yields the value itself, several
/// matches yield a list of them, and no match is an error.
pub fn query_json_path(data: &Value, query: &str, path_display: &str) -> DocInjectResult<Value> {
	let json_path = JsonPath::parse(query).map_err(|e| {
		DocInjectError::InvalidJsonPath {
			query: query.to_string(),
			reason: e.to_string(),
		}
	})?;

	let mut matches = json_path.query(data).all();
	match matches.len() {
		0 => {
			Err(DocInjectError::NoQueryMatch {
				path: path_display.to_string(),
				query: query.to_string(),
			})
		}
		1 => Ok(matches.remove(0).clone()),
		_ => Ok(Value::Array(matches.into_iter().cloned().collect())),
	}
}

/// Walk `query` as `.`-separated mapping keys.
pub fn query_dotted_path(data: &Value, query: &str, path_display: &str) -> DocInjectResult<Value> {
	let mut current = data;

	for key in query.split('.') {
		current = current
			.as_object()
			.and_then(|map| map.get(key))
			.ok_or_else(|| {
				DocInjectError::KeyNotFound {
					path: path_display.to_string(),
					query: query.to_string(),
					key: key.to_string(),
				}
			})?;
	}

	Ok(current.clone())
}

/// Convert a `toml::Value` to a `serde_json::Value`. Non-finite floats have no
/// JSON number form and become `null`.
pub(crate) fn toml_to_json(value: toml::Value) -> Value {
	match value {
		toml::Value::String(s) => Value::String(s),
		toml::Value::Integer(i) => Value::Number(i.into()),
		toml::Value::Float(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
		toml::Value::Boolean(b) => Value::Bool(b),
		toml::Value::Datetime(dt) => Value::String(dt.to_string()),
		toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
		toml::Value::Table(table) => {
			Value::Object(
				table
					.into_iter()
					.map(|(key, value)| (key, toml_to_json(value)))
					.collect(),
			)
		}
	}
}
