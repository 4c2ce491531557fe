use miette::Diagnostic;
use thiserror::Error;

/// The coarse classification of a [`GmdError`], used by callers to tell
/// content problems apart from storage and configuration problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// An embedded expression could not be evaluated.
	Evaluation,
	/// The markdown structure could not be recovered.
	Parse,
	/// HTML or PDF generation failed.
	Render,
	/// The run was configured incorrectly. Aborts the whole run.
	Configuration,
	/// Reading a source or writing an artifact failed.
	Io,
	/// One or more documents in a run failed.
	Run,
}

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum GmdError {
	#[error(transparent)]
	#[diagnostic(code(gmd::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to read source `{path}`: {source}")]
	#[diagnostic(code(gmd::read_source))]
	ReadSource {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("source `{path}` is not inside the source directory `{root}`")]
	#[diagnostic(
		code(gmd::outside_source_root),
		help("only files under the source directory can be converted")
	)]
	OutsideSourceRoot { path: String, root: String },

	#[error("failed to write artifact `{path}`: {source}")]
	#[diagnostic(
		code(gmd::write_artifact),
		help("check that the target directory is writable")
	)]
	WriteArtifact {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("cannot evaluate expression `${{{expression}}}` at {line}:{column}: {reason}")]
	#[diagnostic(
		code(gmd::evaluation),
		help("available names: today, time, now, year, file, file_name and any configured variables")
	)]
	Evaluation {
		expression: String,
		line: usize,
		column: usize,
		reason: String,
	},

	#[error("unterminated expression starting at {line}:{column}")]
	#[diagnostic(
		code(gmd::unterminated_expression),
		help("close the expression with `}}` or escape the opening as `\\${{`")
	)]
	UnterminatedExpression { line: usize, column: usize },

	#[error("failure to parse markdown: {0}")]
	#[diagnostic(code(gmd::parse))]
	Parse(String),

	#[error("failed to render `{path}`: {reason}")]
	#[diagnostic(code(gmd::render))]
	Render { path: String, reason: String },

	#[error("unsupported output type: `{0}`")]
	#[diagnostic(
		code(gmd::unsupported_output_type),
		help("supported output types: md, html, pdf")
	)]
	UnsupportedOutputType(String),

	#[error("target directory `{path}` is not writable: {reason}")]
	#[diagnostic(code(gmd::unwritable_target))]
	UnwritableTarget { path: String, reason: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(gmd::config_parse),
		help("check that gmd.toml is valid TOML with [variables], [exclude], [html] and/or [pdf] sections")
	)]
	ConfigParse(String),

	#[error("`{first}` and `{second}` both convert to `{artifact}`")]
	#[diagnostic(code(gmd::duplicate_artifact), help("list each source document once"))]
	DuplicateArtifact {
		artifact: String,
		first: String,
		second: String,
	},

	#[error("invalid worker count: {0}")]
	#[diagnostic(code(gmd::invalid_jobs), help("use a positive number of jobs"))]
	InvalidJobs(String),

	#[error("refusing to set level of logger `{logger}`")]
	#[diagnostic(
		code(gmd::logger_reconfiguration),
		help("log levels are owned by the embedding application")
	)]
	LoggerReconfiguration { logger: String },

	#[error("{failed} of {total} document(s) failed to convert")]
	#[diagnostic(code(gmd::run_failed))]
	RunFailed { failed: usize, total: usize },
}

impl GmdError {
	/// Classify this error.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Io(_)
			| Self::ReadSource { .. }
			| Self::OutsideSourceRoot { .. }
			| Self::WriteArtifact { .. } => ErrorKind::Io,
			Self::Evaluation { .. } | Self::UnterminatedExpression { .. } => ErrorKind::Evaluation,
			Self::Parse(_) => ErrorKind::Parse,
			Self::Render { .. } => ErrorKind::Render,
			Self::UnsupportedOutputType(_)
			| Self::UnwritableTarget { .. }
			| Self::ConfigParse(_)
			| Self::DuplicateArtifact { .. }
			| Self::InvalidJobs(_)
			| Self::LoggerReconfiguration { .. } => ErrorKind::Configuration,
			Self::RunFailed { .. } => ErrorKind::Run,
		}
	}
}

pub type GmdResult<T> = Result<T, GmdError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
