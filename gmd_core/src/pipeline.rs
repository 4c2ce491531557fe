use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use chrono::NaiveDateTime;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use rayon::prelude::*;

use crate::BoxLayoutEngine;
use crate::DiagnosticEvent;
use crate::DiagnosticSink;
use crate::DiagnosticsBridge;
use crate::Evaluator;
use crate::GmdConfig;
use crate::GmdError;
use crate::GmdResult;
use crate::HtmlOptions;
use crate::LayoutEngine;
use crate::OutputType;
use crate::ParseNote;
use crate::PdfCompositor;
use crate::PdfSettings;
use crate::RenderContext;
use crate::Severity;
use crate::TracingSink;
use crate::diagnostics::subsystem;
use crate::parse_with_diagnostics;
use crate::render_html;
use crate::render_markdown;

/// Extension of GMD source files, without the dot.
pub const SOURCE_EXTENSION: &str = "gmd";

/// Where a document is in its conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentState {
	Discovered,
	Evaluated,
	Parsed,
	Rendered,
	Written,
	Failed,
}

/// The step a document was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
	Read,
	Evaluate,
	Parse,
	Render,
	Write,
}

/// A discovered source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
	/// Path used to read the file.
	pub path: PathBuf,
	/// Path relative to the source root, preserved in the target tree.
	pub relative: PathBuf,
}

impl SourceDocument {
	/// Resolve `path` (absolute, or relative to `source_root`) to a document
	/// under `source_root`.
	///
	/// The root and the file may be spelled differently (`src/../src`, a
	/// symlink, a relative root with absolute listings). Files that do not
	/// live under the root are rejected.
	pub fn new(source_root: &Path, path: &Path) -> GmdResult<Self> {
		let path = if path.is_absolute() {
			path.to_path_buf()
		} else {
			source_root.join(path)
		};
		let relative = path
			.strip_prefix(source_root)
			.ok()
			.filter(|relative| is_nested(relative))
			.map(Path::to_path_buf)
			.or_else(|| canonical_relative(source_root, &path))
			.ok_or_else(|| {
				GmdError::OutsideSourceRoot {
					path: path.display().to_string(),
					root: source_root.display().to_string(),
				}
			})?;

		Ok(Self { path, relative })
	}
}

/// A non-empty path made only of normal components.
fn is_nested(relative: &Path) -> bool {
	relative.components().next().is_some()
		&& relative
			.components()
			.all(|component| matches!(component, Component::Normal(_)))
}

fn canonical_relative(source_root: &Path, path: &Path) -> Option<PathBuf> {
	let root = source_root.canonicalize().ok()?;
	let file = path.canonicalize().ok()?;
	let relative = file.strip_prefix(&root).ok()?;
	is_nested(relative).then(|| relative.to_path_buf())
}

/// The outcome of converting one document.
#[derive(Debug)]
pub struct DocumentReport {
	pub source: PathBuf,
	pub artifact: PathBuf,
	pub state: DocumentState,
	pub failed_stage: Option<Stage>,
	pub error: Option<GmdError>,
	stage: Stage,
}

impl DocumentReport {
	fn new(source: PathBuf, artifact: PathBuf) -> Self {
		Self {
			source,
			artifact,
			state: DocumentState::Discovered,
			failed_stage: None,
			error: None,
			stage: Stage::Read,
		}
	}

	pub fn is_written(&self) -> bool {
		self.state == DocumentState::Written
	}

	fn fail(&mut self, error: GmdError) {
		self.state = DocumentState::Failed;
		self.failed_stage = Some(self.stage);
		self.error = Some(error);
	}
}

/// The result of a run, with one report per document in discovery order.
#[derive(Debug)]
pub struct RunSummary {
	pub output_type: OutputType,
	pub documents: Vec<DocumentReport>,
}

impl RunSummary {
	/// Whether every document was written.
	pub fn is_ok(&self) -> bool {
		self.documents.iter().all(DocumentReport::is_written)
	}

	pub fn written(&self) -> impl Iterator<Item = &DocumentReport> {
		self.documents.iter().filter(|report| report.is_written())
	}

	pub fn failed(&self) -> impl Iterator<Item = &DocumentReport> {
		self.documents
			.iter()
			.filter(|report| report.state == DocumentState::Failed)
	}

	/// Turn a run with failed documents into [`GmdError::RunFailed`].
	pub fn into_result(self) -> GmdResult<Self> {
		let failed = self.failed().count();
		if failed == 0 {
			Ok(self)
		} else {
			Err(GmdError::RunFailed {
				failed,
				total: self.documents.len(),
			})
		}
	}
}

/// Settings for a [`Processor`].
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
	/// Worker count. Defaults to the available parallelism.
	pub jobs: Option<usize>,
	pub variables: BTreeMap<String, serde_json::Value>,
	/// Gitignore-style patterns excluded from discovery.
	pub exclude: Vec<String>,
	pub html: HtmlOptions,
	pub pdf: PdfSettings,
	/// Time bound to `today`, `time`, `now` and `year`. Defaults to the
	/// start of the run.
	pub timestamp: Option<NaiveDateTime>,
}

impl From<GmdConfig> for ProcessOptions {
	fn from(config: GmdConfig) -> Self {
		Self {
			jobs: config.jobs,
			html: config.html.options(),
			variables: config.variables,
			exclude: config.exclude.patterns,
			pdf: config.pdf,
			timestamp: None,
		}
	}
}

/// Converts GMD documents into one output type.
pub struct Processor {
	options: ProcessOptions,
	bridge: DiagnosticsBridge,
	engine: Arc<dyn LayoutEngine>,
	evaluator: Evaluator,
}

impl std::fmt::Debug for Processor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Processor")
			.field("options", &self.options)
			.field("bridge", &self.bridge)
			.finish_non_exhaustive()
	}
}

impl Default for Processor {
	fn default() -> Self {
		Self::new(ProcessOptions::default())
	}
}

impl Processor {
	pub fn new(options: ProcessOptions) -> Self {
		let engine = Arc::new(BoxLayoutEngine::new(options.pdf));
		Self {
			options,
			bridge: DiagnosticsBridge::new(Arc::new(TracingSink)),
			engine,
			evaluator: Evaluator::new(),
		}
	}

	/// Send parser and layout diagnostics to `sink` instead of `tracing`.
	#[must_use]
	pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
		self.bridge = DiagnosticsBridge::new(sink);
		self
	}

	/// Lay out PDF output with `engine` instead of the built-in engine.
	#[must_use]
	pub fn with_layout_engine(mut self, engine: Arc<dyn LayoutEngine>) -> Self {
		self.engine = engine;
		self
	}

	pub fn options(&self) -> &ProcessOptions {
		&self.options
	}

	pub fn bridge(&self) -> &DiagnosticsBridge {
		&self.bridge
	}

	/// Convert every `*.gmd` file under `source` into `target`.
	///
	/// The output type is validated before anything is read.
	pub fn process(&self, source: &Path, target: &Path, output_type: &str) -> GmdResult<RunSummary> {
		let output_type: OutputType = output_type.parse()?;
		self.process_directory(source, target, output_type)
	}

	/// Discover and convert every `*.gmd` file under `source`.
	pub fn process_directory(
		&self,
		source: &Path,
		target: &Path,
		output_type: OutputType,
	) -> GmdResult<RunSummary> {
		prepare_target(target)?;
		let files = collect_files(source, &self.options.exclude)?;
		self.process_files(source, &files, target, output_type)
	}

	/// Convert an explicit list of files. Relative entries in `files` are
	/// resolved against `source_root`; entries outside it fail at the read
	/// stage, and two entries converting to the same artifact fail the run.
	pub fn process_files(
		&self,
		source_root: &Path,
		files: &[PathBuf],
		target: &Path,
		output_type: OutputType,
	) -> GmdResult<RunSummary> {
		let documents = resolve_documents(source_root, files, target, output_type)?;
		prepare_target(target)?;
		let pool = build_pool(self.options.jobs)?;
		let timestamp = self
			.options
			.timestamp
			.unwrap_or_else(|| Local::now().naive_local());
		let compositor = PdfCompositor::new(Arc::clone(&self.engine), self.bridge.clone());

		tracing::info!(
			documents = documents.len(),
			output_type = %output_type,
			target = %target.display(),
			"converting documents"
		);

		let run = Run {
			processor: self,
			target,
			output_type,
			timestamp,
			compositor: &compositor,
		};
		let reports: Vec<DocumentReport> = pool.install(|| {
			documents
				.into_par_iter()
				.map(|entry| {
					match entry {
						Resolved::Document(document) => run.convert(&document),
						Resolved::Rejected(report) => report,
					}
				})
				.collect()
		});

		let summary = RunSummary {
			output_type,
			documents: reports,
		};
		tracing::info!(
			written = summary.written().count(),
			failed = summary.failed().count(),
			"conversion finished"
		);

		Ok(summary)
	}
}

/// Convert every `*.gmd` file under `source` into `target` as `output_type`,
/// using `gmd.toml` from `source` when there is one. Diagnostics go to
/// `tracing`.
pub fn process(source: &Path, target: &Path, output_type: &str) -> GmdResult<RunSummary> {
	let output_type: OutputType = output_type.parse()?;
	let options = GmdConfig::load(source)?
		.map(ProcessOptions::from)
		.unwrap_or_default();
	Processor::new(options).process_directory(source, target, output_type)
}

/// A listed file after resolution against the source root.
enum Resolved {
	Document(SourceDocument),
	/// Failed before reading; converted no further.
	Rejected(DocumentReport),
}

/// Resolve every listed file, keeping the listing order.
///
/// Files outside the root fail on their own. Two documents that would write
/// the same artifact fail the run before anything is written.
fn resolve_documents(
	source_root: &Path,
	files: &[PathBuf],
	target: &Path,
	output_type: OutputType,
) -> GmdResult<Vec<Resolved>> {
	let mut artifacts: HashMap<PathBuf, PathBuf> = HashMap::with_capacity(files.len());
	let mut resolved = Vec::with_capacity(files.len());

	for file in files {
		let document = match SourceDocument::new(source_root, file) {
			Ok(document) => document,
			Err(error) => {
				tracing::warn!(source = %file.display(), "{error}");
				let mut report = DocumentReport::new(file.clone(), PathBuf::new());
				report.fail(error);
				resolved.push(Resolved::Rejected(report));
				continue;
			}
		};

		let artifact = output_type.artifact_path(target, &document.relative);
		if let Some(first) = artifacts.insert(artifact.clone(), document.relative.clone()) {
			return Err(GmdError::DuplicateArtifact {
				artifact: artifact.display().to_string(),
				first: first.display().to_string(),
				second: document.relative.display().to_string(),
			});
		}
		resolved.push(Resolved::Document(document));
	}

	Ok(resolved)
}

/// Per-run state shared by all documents.
struct Run<'a> {
	processor: &'a Processor,
	target: &'a Path,
	output_type: OutputType,
	timestamp: NaiveDateTime,
	compositor: &'a PdfCompositor,
}

impl Run<'_> {
	fn convert(&self, document: &SourceDocument) -> DocumentReport {
		let artifact = self
			.output_type
			.artifact_path(self.target, &document.relative);
		let mut report = DocumentReport::new(document.relative.clone(), artifact);

		match self.stages(document, &mut report) {
			Ok(()) => {
				tracing::debug!(
					source = %report.source.display(),
					artifact = %report.artifact.display(),
					"wrote artifact"
				);
			}
			Err(error) => {
				tracing::warn!(source = %report.source.display(), "{error}");
				report.fail(error);
			}
		}

		report
	}

	fn stages(&self, document: &SourceDocument, report: &mut DocumentReport) -> GmdResult<()> {
		let processor = self.processor;

		let raw = std::fs::read_to_string(&document.path).map_err(|source| {
			GmdError::ReadSource {
				path: document.path.display().to_string(),
				source,
			}
		})?;

		report.stage = Stage::Evaluate;
		let context = RenderContext::builder(self.timestamp)
			.variables(processor.options.variables.clone())
			.file(&document.relative)
			.build();
		let evaluated = processor
			.evaluator
			.evaluate(&normalize_line_endings(&raw), &context)?;
		report.state = DocumentState::Evaluated;

		report.stage = Stage::Parse;
		let (blocks, notes) = parse_with_diagnostics(&evaluated)?;
		for note in &notes {
			processor.bridge.route(&parse_event(note, &document.relative));
		}
		report.state = DocumentState::Parsed;

		report.stage = Stage::Render;
		let bytes = match self.output_type {
			OutputType::Markdown => render_markdown(&blocks).into_bytes(),
			OutputType::Html => render_html(&blocks, &self.html_options(document)).into_bytes(),
			OutputType::Pdf => {
				let html = render_html(&blocks, &self.html_options(document));
				self.compositor.compose(&html, &document.path)?
			}
		};
		report.state = DocumentState::Rendered;

		report.stage = Stage::Write;
		write_artifact(&report.artifact, &bytes)?;
		report.state = DocumentState::Written;

		Ok(())
	}

	fn html_options(&self, document: &SourceDocument) -> HtmlOptions {
		let stem = document
			.relative
			.file_stem()
			.map(|stem| stem.to_string_lossy().into_owned())
			.unwrap_or_default();
		self.processor.options.html.clone().with_fallback_title(stem)
	}
}

fn parse_event(note: &ParseNote, relative: &Path) -> DiagnosticEvent {
	let severity = match note {
		ParseNote::DefinitionResolved { .. } => Severity::Fine,
		_ => Severity::Warning,
	};
	DiagnosticEvent::new(
		subsystem::PARSE,
		severity,
		format!("{}: {}", relative.display(), note.message()),
	)
}

fn write_artifact(path: &Path, bytes: &[u8]) -> GmdResult<()> {
	let to_error = |source| {
		GmdError::WriteArtifact {
			path: path.display().to_string(),
			source,
		}
	};

	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).map_err(to_error)?;
	}
	std::fs::write(path, bytes).map_err(to_error)
}

/// Create the target root, failing the run if that is impossible.
fn prepare_target(target: &Path) -> GmdResult<()> {
	if target.exists() && !target.is_dir() {
		return Err(GmdError::UnwritableTarget {
			path: target.display().to_string(),
			reason: "path exists and is not a directory".to_string(),
		});
	}

	std::fs::create_dir_all(target).map_err(|e| {
		GmdError::UnwritableTarget {
			path: target.display().to_string(),
			reason: e.to_string(),
		}
	})
}

fn build_pool(jobs: Option<usize>) -> GmdResult<rayon::ThreadPool> {
	let threads = match jobs {
		Some(0) => return Err(GmdError::InvalidJobs("`jobs` must be at least 1".to_string())),
		Some(jobs) => jobs,
		None => std::thread::available_parallelism().map_or(1, usize::from),
	};

	rayon::ThreadPoolBuilder::new()
		.num_threads(threads)
		.thread_name(|index| format!("gmd-worker-{index}"))
		.build()
		.map_err(|e| GmdError::InvalidJobs(e.to_string()))
}

/// Convert `\r\n` and lone `\r` line endings to `\n`.
pub fn normalize_line_endings(content: &str) -> String {
	if !content.contains('\r') {
		return content.to_string();
	}
	content.replace("\r\n", "\n").replace('\r', "\n")
}

/// `[exclude]` patterns, read with gitignore syntax relative to the source
/// root.
struct Exclusions(Gitignore);

impl Exclusions {
	fn new(root: &Path, patterns: &[String]) -> GmdResult<Self> {
		let mut rules = GitignoreBuilder::new(root);
		for pattern in patterns {
			if let Err(error) = rules.add_line(None, pattern) {
				return Err(GmdError::ConfigParse(format!(
					"`[exclude]` pattern `{pattern}` is not valid: {error}"
				)));
			}
		}

		match rules.build() {
			Ok(matcher) => Ok(Self(matcher)),
			Err(error) => Err(GmdError::ConfigParse(format!("`[exclude]` patterns: {error}"))),
		}
	}

	fn skips(&self, path: &Path, is_dir: bool) -> bool {
		self.0.matched(path, is_dir).is_ignore()
	}
}

/// Collect every `*.gmd` file under `root`, sorted. Hidden directories and
/// files matching `exclude_patterns` are skipped.
pub fn collect_files(root: &Path, exclude_patterns: &[String]) -> GmdResult<Vec<PathBuf>> {
	let exclusions = Exclusions::new(root, exclude_patterns)?;
	let mut files = Vec::new();
	let mut visited = HashSet::new();
	walk_dir(root, &exclusions, &mut files, &mut visited)?;
	files.sort();
	Ok(files)
}

fn walk_dir(
	dir: &Path,
	exclusions: &Exclusions,
	files: &mut Vec<PathBuf>,
	visited: &mut HashSet<PathBuf>,
) -> GmdResult<()> {
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !visited.insert(canonical) {
		tracing::warn!(path = %dir.display(), "skipping directory already visited through a symlink");
		return Ok(());
	}

	for entry in std::fs::read_dir(dir)? {
		let path = entry?.path();

		if path
			.file_name()
			.and_then(|name| name.to_str())
			.is_some_and(|name| name.starts_with('.'))
		{
			continue;
		}

		let is_dir = path.is_dir();
		if exclusions.skips(&path, is_dir) {
			continue;
		}

		if is_dir {
			walk_dir(&path, exclusions, files, visited)?;
		} else if path
			.extension()
			.is_some_and(|extension| extension == SOURCE_EXTENSION)
		{
			files.push(path);
		}
	}

	Ok(())
}
