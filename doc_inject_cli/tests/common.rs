use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub const README: &str = "# Demo\n\n<!-- doc-inject:configure\nt:\n  file: data.json\n  query: $.uid\n  \
                          template: \"ID:{{ value }}\"\n-->\n\n<!-- DOC_INJECT_START t -->\nold\n<!-- \
                          DOC_INJECT_END t -->\n";

pub const UPDATED_BLOCK: &str = "<!-- DOC_INJECT_START t -->\nID:abc\n<!-- DOC_INJECT_END t -->\n";

pub fn doc_inject_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("doc-inject"));
	cmd.env("NO_COLOR", "1")
		.env_remove("DOC_INJECT_STRICT")
		.env_remove("RUST_LOG");
	cmd
}
