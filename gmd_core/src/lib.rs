//! `gmd_core` converts GMD documents, markdown files with embedded `${...}`
//! expressions, into markdown, HTML or PDF.
//!
//! ## Processing Pipeline
//!
//! ```text
//! *.gmd source file
//!   → Evaluator (substitutes `${...}` expressions from the RenderContext)
//!   → Parser (recovers markdown structure into a BlockSequence)
//!   → Renderer (markdown, or HTML; PDF lays the HTML out through a LayoutEngine)
//!   → Artifact written under the target directory at the same relative path
//! ```
//!
//! Each document moves through `Discovered → Evaluated → Parsed → Rendered →
//! Written`. A failing document becomes `Failed` without stopping the others.
//!
//! ## Modules
//!
//! - [`config`] loads `gmd.toml` from the source directory.
//! - [`diagnostics`] translates parser and layout events into the caller's
//!   logging categories and levels.
//! - [`layout`] is the built-in PDF layout engine.
//!
//! ## Key Types
//!
//! - [`Processor`] runs a conversion and returns a [`RunSummary`].
//! - [`RenderContext`] holds the names available to expressions.
//! - [`BlockSequence`] is the renderer-agnostic form of a parsed document.
//! - [`DiagnosticsBridge`] routes [`DiagnosticEvent`]s to a [`DiagnosticSink`].
//! - [`GmdConfig`] is the configuration loaded from `gmd.toml`.
//!
//! ## Expressions
//!
//! Expressions use the [`minijinja`](https://docs.rs/minijinja) expression
//! language. Every document can read `today`, `time`, `now`, `year`, `file`
//! and `file_name`, plus the `[variables]` table of `gmd.toml`:
//!
//! ```text
//! Today is ${today} and the time is ${time}.
//! Written by ${author | upper} in ${year}.
//! ```
//!
//! Write `\${` for a literal `${`. A backslash pair is copied unchanged and
//! does not escape what follows, so `\\${year}` renders as `\\2024`, which
//! markdown then shows as `\2024`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! let summary = gmd_core::process(Path::new("src/main/gmd"), Path::new("target/gmd"), "html")?;
//! for report in summary.failed() {
//! 	eprintln!("{}: {:?}", report.source.display(), report.error);
//! }
//! # Ok::<(), gmd_core::GmdError>(())
//! ```

pub use blocks::*;
pub use compositor::*;
pub use config::*;
pub use context::*;
pub use diagnostics::*;
pub use error::*;
pub use evaluator::*;
pub use html::*;
pub use layout::BoxLayoutEngine;
pub use layout::PageSize;
pub use layout::PdfSettings;
pub use markdown::*;
pub use output::*;
pub use parser::*;
pub use pipeline::*;
pub use position::*;

mod blocks;
mod compositor;
pub mod config;
mod context;
pub mod diagnostics;
#[allow(unused_assignments)]
mod error;
mod evaluator;
mod html;
pub mod layout;
pub(crate) mod lexer;
mod markdown;
mod output;
mod parser;
mod pipeline;
mod position;

#[cfg(test)]
mod __fixtures;
