//! `doc_inject_core` keeps generated sections of text documents in sync with
//! the data they describe. Each section is wrapped in a pair of markers:
//!
//! ```markdown
//! <!-- DOC_INJECT_START version -->
//! stale text
//! <!-- DOC_INJECT_END version -->
//! ```
//!
//! and a small configuration says where the data lives, how to query it and
//! which template renders it.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Document (Markdown, AsciiDoc, YAML, TOML, Jinja, ...)
//!   → Locator (finds the `doc-inject:configure` comment block) or external config file
//!   → Item model (validates each block's source, parser and extraction)
//!   → Resolution (runs JSONPath, dotted-path, regex or slice queries per file)
//!   → Template (renders the result with minijinja)
//!   → Engine (replaces marker contents and writes the document back)
//! ```
//!
//! ## Embedded Configuration
//!
//! The configuration may live in the document itself, written in that
//! document's comment syntax:
//!
//! ```markdown
//! <!-- doc-inject:configure
//! version:
//!   file: package.json
//!   query: $.version
//!   template: "Current version: {{ value }}"
//! -->
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use doc_inject_core::InjectOptions;
//! use doc_inject_core::apply;
//! use doc_inject_core::locator::locate;
//!
//! let path = Path::new("README.md");
//! let config = locate(path).unwrap();
//! let injection = apply(path, &config, &InjectOptions::default()).unwrap();
//! if injection.is_changed() {
//!     println!("updated {}", path.display());
//! }
//! ```

pub use engine::*;
pub use error::*;
pub use item::*;
pub use resolve::*;
pub use template::*;

pub mod config;
mod engine;
#[allow(unused_assignments)]
mod error;
pub mod files;
mod item;
pub mod locator;
mod resolve;
pub mod structured;
mod template;
pub mod text;
