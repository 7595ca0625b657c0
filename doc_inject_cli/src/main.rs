use std::path::Path;
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use clap::Parser;
use doc_inject_cli::DocInjectCli;
use doc_inject_cli::default_log_filter;
use doc_inject_core::InjectOptions;
use doc_inject_core::InjectionConfig;
use doc_inject_core::config::load_from_file;
use doc_inject_core::locator::locate;
use doc_inject_core::prepare;
use doc_inject_core::strict_from_env;
use miette::WrapErr;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: AtomicBool = AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,dimmed) => {
		if color_enabled() {
			format!("{}", $text.dimmed())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = DocInjectCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, Ordering::Relaxed);
	}

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	match run(&args) {
		Ok(true) => process::exit(1),
		Ok(false) => {}
		Err(report) => {
			eprintln!("{report:?}");
			process::exit(2);
		}
	}
}

fn init_tracing(verbose: bool, use_color: bool) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose)));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.with_ansi(use_color)
		.init();
}

/// Process every document in order. Returns whether drift was found in check
/// mode.
fn run(args: &DocInjectCli) -> miette::Result<bool> {
	let options = InjectOptions {
		strict: strict_from_env(),
	};

	let shared = match &args.config {
		Some(path) => {
			Some(
				load_from_file(path, args.query.as_deref())
					.wrap_err_with(|| format!("failed to load config `{}`", path.display()))?,
			)
		}
		None => None,
	};

	let mut drift = false;

	for path in &args.files {
		let stale = process_document(args, path, shared.as_ref(), &options)
			.wrap_err_with(|| format!("failed to process `{}`", path.display()))?;
		drift |= stale;
	}

	if args.check && !drift {
		println!("Check passed: all documents are up to date.");
	}

	Ok(drift)
}

fn process_document(
	args: &DocInjectCli,
	path: &Path,
	shared: Option<&InjectionConfig>,
	options: &InjectOptions,
) -> doc_inject_core::DocInjectResult<bool> {
	let located;
	let config = if let Some(config) = shared {
		config
	} else {
		located = locate(path)?;
		&located
	};

	tracing::debug!(path = %path.display(), items = config.len(), "processing document");
	let injection = prepare(path, config, options)?;

	if args.check {
		if injection.is_changed() {
			println!("{} {}", colored!("stale:", yellow), path.display());
			print_diff(&path.display().to_string(), &injection.original, &injection.updated);
		}
		return Ok(injection.is_changed());
	}

	if args.dry_run {
		print!("{}", injection.updated);
		return Ok(false);
	}

	injection.write()?;
	if injection.is_changed() {
		println!("{} {}", colored!("updated:", green), path.display());
	} else {
		println!("{} {}", colored!("unchanged:", dimmed), path.display());
	}

	Ok(false)
}

/// Print a unified diff between the current and rendered document, colorized.
fn print_diff(name: &str, current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	let mut unified = diff.unified_diff();
	unified.context_radius(3);

	println!("--- {name}");
	println!("+++ {name}");
	for hunk in unified.iter_hunks() {
		println!("{}", colored!(hunk.header(), dimmed));
		for change in hunk.iter_changes() {
			let line = change.to_string_lossy();
			let newline = if change.missing_newline() { "\n" } else { "" };
			match change.tag() {
				ChangeTag::Delete => print!("{}{newline}", colored!(format!("-{line}"), red)),
				ChangeTag::Insert => print!("{}{newline}", colored!(format!("+{line}"), green)),
				ChangeTag::Equal => print!(" {line}{newline}"),
			}
		}
	}
}
