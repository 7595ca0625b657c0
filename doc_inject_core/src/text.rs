use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;

use crate::DocInjectError;
use crate::DocInjectResult;
use crate::structured::read_data_file;

const REGEX_PREFIX: &str = "regex:";
const SLICE_PREFIX: &str = "slice:";

/// Evaluate a `regex:` or `slice:` directive against the text file at `path`.
pub fn evaluate(path: &Path, query: &str) -> DocInjectResult<BTreeMap<String, String>> {
	let content = read_data_file(path)?;
	evaluate_text(&content, query, &path.display().to_string())
}

/// Evaluate a text directive against already loaded content.
pub fn evaluate_text(
	content: &str,
	query: &str,
	path_display: &str,
) -> DocInjectResult<BTreeMap<String, String>> {
	let lines: Vec<&str> = content.lines().collect();

	if let Some(pattern) = query.strip_prefix(REGEX_PREFIX) {
		match_regex(&lines, pattern, path_display)
	} else if let Some(range) = query.strip_prefix(SLICE_PREFIX) {
		let (start, end) = parse_slice(range).ok_or_else(|| DocInjectError::InvalidSlice(query.to_string()))?;
		let (from, to) = slice_bounds(lines.len(), start, end);
		let value = if from < to { lines[from..to].join("\n") } else { String::new() };
		Ok(BTreeMap::from([("value".to_string(), value)]))
	} else {
		Err(DocInjectError::UnsupportedTextQuery(query.to_string()))
	}
}

/// Patterns opening with an inline flag group such as `(?ms)` or `(?i:` are
/// matched against the whole content. Everything else is matched line by line
/// and the first matching line wins.
fn match_regex(lines: &[&str], pattern: &str, path_display: &str) -> DocInjectResult<BTreeMap<String, String>> {
	let regex = Regex::new(pattern).map_err(|e| {
		DocInjectError::InvalidRegex {
			pattern: pattern.to_string(),
			reason: e.to_string(),
		}
	})?;

	let captures = if starts_with_inline_flags(pattern) {
		let text = lines.join("\n");
		regex.captures(&text).map(|captures| capture_map(&regex, &captures))
	} else {
		lines
			.iter()
			.find_map(|line| regex.captures(line).map(|captures| capture_map(&regex, &captures)))
	};

	captures.ok_or_else(|| {
		DocInjectError::NoRegexMatch {
			path: path_display.to_string(),
			pattern: pattern.to_string(),
		}
	})
}

/// Named groups when the pattern declares any, otherwise the full match under
/// `value`. Named groups that did not take part in the match are empty.
fn capture_map(regex: &Regex, captures: &regex::Captures<'_>) -> BTreeMap<String, String> {
	let named: BTreeMap<String, String> = regex
		.capture_names()
		.flatten()
		.map(|name| {
			let text = captures.name(name).map_or("", |m| m.as_str());
			(name.to_string(), text.to_string())
		})
		.collect();

	if named.is_empty() {
		let full = captures.get(0).map_or("", |m| m.as_str());
		BTreeMap::from([("value".to_string(), full.to_string())])
	} else {
		named
	}
}

fn starts_with_inline_flags(pattern: &str) -> bool {
	let Some(rest) = pattern.trim_start().strip_prefix("(?") else {
		return false;
	};
	let flags_len = rest
		.find(|c: char| !(c.is_ascii_alphabetic() || c == '-'))
		.unwrap_or(rest.len());
	let (flags, after) = rest.split_at(flags_len);

	!flags.is_empty()
		&& flags.chars().all(|c| matches!(c, 'i' | 'm' | 's' | 'x' | 'u' | 'U' | 'R' | '-'))
		&& (after.starts_with(')') || after.starts_with(':'))
}

fn parse_slice(range: &str) -> Option<(i64, i64)> {
	let (start, end) = range.split_once(':')?;
	Some((start.trim().parse().ok()?, end.trim().parse().ok()?))
}

/// Clamp `start..end` to `0..len`, counting negative indices from the end.
fn slice_bounds(len: usize, start: i64, end: i64) -> (usize, usize) {
	let len = len as i64;
	let clamp = |index: i64| {
		let index = if index < 0 { index + len } else { index };
		index.clamp(0, len) as usize
	};
	(clamp(start), clamp(end))
}
