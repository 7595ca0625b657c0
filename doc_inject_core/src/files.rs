use std::collections::HashSet;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use globset::GlobBuilder;
use globset::GlobMatcher;

use crate::DocInjectError;
use crate::DocInjectResult;

/// Make `path` absolute against the current working directory without
/// touching the filesystem.
pub fn absolute_path(path: &Path) -> DocInjectResult<PathBuf> {
	let absolute = if path.is_absolute() {
		path.to_path_buf()
	} else {
		std::env::current_dir()?.join(path)
	};

	Ok(normalize_lexically(&absolute))
}

/// Remove `.` components and fold `..` into their parent, purely on the path
/// text. Symlinks are not resolved.
pub fn normalize_lexically(path: &Path) -> PathBuf {
	let mut normalized = PathBuf::new();

	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				if !normalized.pop() {
					normalized.push(component);
				}
			}
			other => normalized.push(other),
		}
	}

	normalized
}

/// Convert a path to a string with forward slashes.
pub fn to_posix(path: &Path) -> String {
	path.to_string_lossy().replace('\\', "/")
}

/// Join a relative `file` value onto `base` and return the absolute, lexically
/// normalized path.
pub fn resolve_file(base: &Path, file: &Path) -> PathBuf {
	normalize_lexically(&base.join(file))
}

fn has_glob_meta(segment: &str) -> bool {
	segment.contains(['*', '?', '[', '{'])
}

/// Expand a recursive glob `pattern` relative to `base`.
///
/// The pattern is joined onto `base` with `/`, split into the literal
/// directory prefix and a wildcard remainder, and the prefix directory is
/// walked. `*` stays inside one path segment while `**` crosses segments.
/// Without `**` the walk stops at the remainder's depth. A directory reached a
/// second time through a symlink is skipped, and a symlink back to one of its
/// own ancestors is a [`DocInjectError::SymlinkCycle`]. The result is sorted.
pub fn expand_glob(base: &Path, pattern: &str) -> DocInjectResult<Vec<PathBuf>> {
	let joined = if Path::new(pattern).is_absolute() {
		pattern.replace('\\', "/")
	} else {
		format!("{}/{}", to_posix(base).trim_end_matches('/'), pattern)
	};

	let segments: Vec<&str> = joined.split('/').collect();
	let split_at = segments
		.iter()
		.position(|segment| has_glob_meta(segment))
		.unwrap_or(segments.len());

	let literal = segments[..split_at].join("/");
	let root_text = if literal.is_empty() { "/" } else { literal.as_str() };
	let root = normalize_lexically(Path::new(root_text));

	if split_at == segments.len() {
		return Ok(if root.is_file() { vec![root] } else { vec![] });
	}

	let remainder = normalize_glob_remainder(&segments[split_at..]);
	let matcher = build_matcher(pattern, &remainder)?;

	let max_depth = if remainder.split('/').any(|segment| segment == "**") {
		None
	} else {
		Some(remainder.split('/').count())
	};

	let mut walk = GlobWalk {
		root: &root,
		matcher: &matcher,
		max_depth,
		files: Vec::new(),
		visited_dirs: HashSet::new(),
		ancestors: Vec::new(),
	};
	walk.walk(&root, 0)?;
	let mut files = walk.files;
	files.sort();

	tracing::trace!(pattern, root = %root.display(), matched = files.len(), "expanded glob");

	Ok(files)
}

/// Fold `.` and `..` segments that appear after the first wildcard segment.
/// `..` directly after a wildcard is kept, it cannot be folded textually.
fn normalize_glob_remainder(segments: &[&str]) -> String {
	let mut out: Vec<&str> = Vec::new();
	for segment in segments {
		match *segment {
			"" | "." => {}
			".." if out.last().is_some_and(|last| !has_glob_meta(last) && *last != "..") => {
				out.pop();
			}
			other => out.push(other),
		}
	}
	out.join("/")
}

fn build_matcher(pattern: &str, remainder: &str) -> DocInjectResult<GlobMatcher> {
	GlobBuilder::new(remainder)
		.literal_separator(true)
		.build()
		.map(|glob| glob.compile_matcher())
		.map_err(|e| {
			DocInjectError::InvalidGlob {
				pattern: pattern.to_string(),
				reason: e.to_string(),
			}
		})
}

struct GlobWalk<'a> {
	root: &'a Path,
	matcher: &'a GlobMatcher,
	/// Deepest directory level that can still hold a match, `None` when the
	/// remainder contains `**`.
	max_depth: Option<usize>,
	files: Vec<PathBuf>,
	visited_dirs: HashSet<PathBuf>,
	ancestors: Vec<PathBuf>,
}

impl GlobWalk<'_> {
	fn walk(&mut self, dir: &Path, depth: usize) -> DocInjectResult<()> {
		if !dir.is_dir() {
			return Ok(());
		}

		let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
		if self.ancestors.contains(&canonical) {
			return Err(DocInjectError::SymlinkCycle(dir.display().to_string()));
		}
		// Reached again through a symlink. Its matches are already listed.
		if !self.visited_dirs.insert(canonical.clone()) {
			return Ok(());
		}

		let mut entries = std::fs::read_dir(dir)?
			.map(|entry| entry.map(|entry| entry.path()))
			.collect::<Result<Vec<_>, _>>()?;
		entries.sort();

		self.ancestors.push(canonical);
		for path in entries {
			// Wildcards never match hidden entries.
			if path
				.file_name()
				.and_then(|name| name.to_str())
				.is_some_and(|name| name.starts_with('.'))
			{
				continue;
			}

			if path.is_dir() {
				if self.max_depth.is_none_or(|max| depth + 1 < max) {
					self.walk(&path, depth + 1)?;
				}
			} else if let Ok(relative) = path.strip_prefix(self.root) {
				if self.matcher.is_match(to_posix(relative)) {
					self.files.push(path);
				}
			}
		}
		self.ancestors.pop();

		Ok(())
	}
}

/// Read a document, reporting a missing file as
/// [`DocInjectError::DocumentNotFound`].
pub fn read_document(path: &Path) -> DocInjectResult<String> {
	std::fs::read_to_string(path).map_err(|e| {
		if e.kind() == std::io::ErrorKind::NotFound {
			DocInjectError::DocumentNotFound(path.display().to_string())
		} else {
			DocInjectError::Io(e)
		}
	})
}
