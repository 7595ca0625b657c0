use std::path::Path;

use serde_json::Value;

use crate::DocInjectError;
use crate::DocInjectResult;
use crate::InjectionConfig;
use crate::structured::toml_to_json;

/// Query applied to TOML config files when none is given.
pub const DEFAULT_TOML_QUERY: &str = "tool.doc-inject";

/// Extensions accepted for external config files.
pub const CONFIG_EXTENSIONS: [&str; 5] = ["json", "json5", "yaml", "yml", "toml"];

/// Load an external config file. Items are based at the current working
/// directory.
pub fn load_from_file(path: &Path, query: Option<&str>) -> DocInjectResult<InjectionConfig> {
	let cwd = std::env::current_dir()?;
	load_from_file_with_base(path, query, &cwd)
}

/// Load an external config file with items based at `base`.
///
/// The file is parsed by extension (`json`, `json5`, `yaml`, `yml`, `toml`).
/// When `query` is given it is walked as dot-separated keys into the parsed
/// tree. TOML files without a query default to [`DEFAULT_TOML_QUERY`].
pub fn load_from_file_with_base(path: &Path, query: Option<&str>, base: &Path) -> DocInjectResult<InjectionConfig> {
	let extension = path
		.extension()
		.map(|ext| ext.to_string_lossy().to_ascii_lowercase())
		.unwrap_or_default();

	if !CONFIG_EXTENSIONS.contains(&extension.as_str()) {
		return Err(DocInjectError::UnsupportedConfigFormat(path.display().to_string()));
	}

	let content = std::fs::read_to_string(path).map_err(|e| {
		if e.kind() == std::io::ErrorKind::NotFound {
			DocInjectError::ConfigFileNotFound(path.display().to_string())
		} else {
			DocInjectError::Io(e)
		}
	})?;

	let data = parse_config_file(&content, &extension, &path.display().to_string())?;
	let query = query.or((extension == "toml").then_some(DEFAULT_TOML_QUERY));

	let data = match query {
		Some(query) => select_config(data, query)?,
		None => data,
	};

	tracing::debug!(path = %path.display(), ?query, "loaded config file");
	InjectionConfig::from_value(data, base)
}

fn parse_config_file(content: &str, extension: &str, path_display: &str) -> DocInjectResult<Value> {
	let parse_error = |reason: String| {
		DocInjectError::ConfigFileParse {
			path: path_display.to_string(),
			reason,
		}
	};

	match extension {
		"json" => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
		"json5" => json5::from_str(content).map_err(|e| parse_error(e.to_string())),
		"yaml" | "yml" => serde_yaml_ng::from_str(content).map_err(|e| parse_error(e.to_string())),
		"toml" => {
			let value: toml::Value = toml::from_str(content).map_err(|e| parse_error(e.to_string()))?;
			Ok(toml_to_json(value))
		}
		_ => Err(DocInjectError::UnsupportedConfigFormat(path_display.to_string())),
	}
}

/// Walk `query` as dot-separated keys and return the selected sub-tree.
pub fn select_config(mut data: Value, query: &str) -> DocInjectResult<Value> {
	for key in query.split('.') {
		data = match data {
			Value::Object(mut map) => map.remove(key),
			_ => None,
		}
		.ok_or_else(|| {
			DocInjectError::ConfigQueryKeyNotFound {
				query: query.to_string(),
				key: key.to_string(),
			}
		})?;
	}

	Ok(data)
}
