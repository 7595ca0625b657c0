use minijinja::Environment;
use minijinja::UndefinedBehavior;
use serde_json::Map;
use serde_json::Value;

use crate::DocInjectError;
use crate::DocInjectResult;

/// Environment variable holding the process-wide default strictness.
pub const STRICT_ENV_VAR: &str = "DOC_INJECT_STRICT";

/// Interpret a strictness flag value. `0`, `false` and `no` (in any case)
/// turn strict rendering off; anything else, including no value, keeps it on.
pub fn parse_strict_flag(value: Option<&str>) -> bool {
	value.is_none_or(|value| {
		!matches!(
			value.trim().to_ascii_lowercase().as_str(),
			"0" | "false" | "no"
		)
	})
}

/// Read [`STRICT_ENV_VAR`] from the process environment. Call this once at the
/// program boundary and pass the result down.
pub fn strict_from_env() -> bool {
	let value = std::env::var(STRICT_ENV_VAR).ok();
	parse_strict_flag(value.as_deref())
}

/// Render `template` with `context`.
///
/// In strict mode any reference to an unbound variable fails the render.
/// Otherwise unbound variables render as empty text.
pub fn render_template(template: &str, context: &Map<String, Value>, strict: bool) -> DocInjectResult<String> {
	let mut env = Environment::new();
	env.set_undefined_behavior(if strict {
		UndefinedBehavior::Strict
	} else {
		UndefinedBehavior::Lenient
	});
	env.add_template("__inline__", template)
		.map_err(|e| DocInjectError::TemplateRender(e.to_string()))?;

	let template = env
		.get_template("__inline__")
		.map_err(|e| DocInjectError::TemplateRender(e.to_string()))?;

	let ctx = minijinja::Value::from_serialize(context);
	template
		.render(ctx)
		.map_err(|e| DocInjectError::TemplateRender(e.to_string()))
}
