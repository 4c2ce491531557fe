//! Routes diagnostic events from the parser and the layout engine into the
//! embedding application's logging facility.
//!
//! The translation is a pure function: subsystem names map to logger
//! categories through [`CATEGORY_TABLE`] (unknown names fall back to
//! [`DEFAULT_CATEGORY`]) and every [`Severity`] maps to exactly one
//! [`LogLevel`].

use std::fmt::Display;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use crate::GmdError;
use crate::GmdResult;

/// Subsystem identifiers used by the parser and the built-in layout engine.
pub mod subsystem {
	pub const CONFIG: &str = "config";
	pub const EXCEPTION: &str = "exception";
	pub const GENERAL: &str = "general";
	pub const INIT: &str = "init";
	pub const LOAD: &str = "load";
	pub const MATCH: &str = "match";
	pub const CASCADE: &str = "cascade";
	pub const XML_ENTITIES: &str = "xml-entities";
	pub const CSS_PARSE: &str = "css-parse";
	pub const LAYOUT: &str = "layout";
	pub const RENDER: &str = "render";
	pub const PARSE: &str = "parse";
}

/// Category for subsystems missing from [`CATEGORY_TABLE`].
pub const DEFAULT_CATEGORY: &str = "gmd.general";

/// Subsystem name to logger category.
pub const CATEGORY_TABLE: [(&str, &str); 12] = [
	(subsystem::CONFIG, "gmd.layout.config"),
	(subsystem::EXCEPTION, "gmd.layout.exception"),
	(subsystem::GENERAL, "gmd.layout.general"),
	(subsystem::INIT, "gmd.layout.init"),
	(subsystem::LOAD, "gmd.layout.load"),
	(subsystem::MATCH, "gmd.layout.match"),
	(subsystem::CASCADE, "gmd.layout.cascade"),
	(subsystem::XML_ENTITIES, "gmd.layout.load.xmlentities"),
	(subsystem::CSS_PARSE, "gmd.layout.cssparse"),
	(subsystem::LAYOUT, "gmd.layout.layout"),
	(subsystem::RENDER, "gmd.layout.render"),
	(subsystem::PARSE, "gmd.parse"),
];

/// Look up the logger category of a subsystem.
pub fn category_for(subsystem: &str) -> &'static str {
	CATEGORY_TABLE
		.iter()
		.find(|(name, _)| *name == subsystem)
		.map_or(DEFAULT_CATEGORY, |(_, category)| category)
}

/// Severity scale used by the layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
	Severe,
	Warning,
	Info,
	Config,
	Fine,
	Finer,
	Finest,
}

impl Severity {
	pub const ALL: [Severity; 7] = [
		Self::Severe,
		Self::Warning,
		Self::Info,
		Self::Config,
		Self::Fine,
		Self::Finer,
		Self::Finest,
	];
}

/// Severity scale of the embedding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogLevel {
	Error,
	Warn,
	Info,
	Debug,
	Trace,
}

impl From<Severity> for LogLevel {
	fn from(severity: Severity) -> Self {
		match severity {
			Severity::Severe => Self::Error,
			Severity::Warning => Self::Warn,
			Severity::Info | Severity::Config => Self::Info,
			Severity::Fine => Self::Debug,
			Severity::Finer | Severity::Finest => Self::Trace,
		}
	}
}

impl From<LogLevel> for tracing::Level {
	fn from(level: LogLevel) -> Self {
		match level {
			LogLevel::Error => Self::ERROR,
			LogLevel::Warn => Self::WARN,
			LogLevel::Info => Self::INFO,
			LogLevel::Debug => Self::DEBUG,
			LogLevel::Trace => Self::TRACE,
		}
	}
}

impl Display for LogLevel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			Self::Error => "error",
			Self::Warn => "warn",
			Self::Info => "info",
			Self::Debug => "debug",
			Self::Trace => "trace",
		};
		f.write_str(name)
	}
}

/// A diagnostic emitted by one of the pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEvent {
	/// Subsystem that produced the event, e.g. `"layout"`.
	pub source: String,
	pub severity: Severity,
	pub message: String,
	pub cause: Option<String>,
}

impl DiagnosticEvent {
	pub fn new(source: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			severity,
			message: message.into(),
			cause: None,
		}
	}

	#[must_use]
	pub fn with_cause(mut self, cause: impl Display) -> Self {
		self.cause = Some(cause.to_string());
		self
	}
}

/// A translated event, ready for the caller's logging facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord<'a> {
	pub category: &'static str,
	pub level: LogLevel,
	pub message: &'a str,
	pub cause: Option<&'a str>,
}

/// Error returned by a sink that could not record a message.
#[derive(Debug, thiserror::Error)]
#[error("diagnostic sink failure: {0}")]
pub struct SinkError(pub String);

/// The caller's logging facility.
pub trait DiagnosticSink: Send + Sync {
	/// Record a single message. Called at most once per routed event.
	fn emit(&self, record: &LogRecord<'_>) -> Result<(), SinkError>;

	/// Whether records for `category` at `level` would be kept.
	fn enabled(&self, _category: &str, _level: LogLevel) -> bool {
		true
	}
}

/// Forwards records as `tracing` events, leaving filtering to the
/// subscriber installed by the embedding application.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
	fn emit(&self, record: &LogRecord<'_>) -> Result<(), SinkError> {
		let LogRecord {
			category,
			message,
			cause,
			..
		} = *record;

		match record.level {
			LogLevel::Error => tracing::error!(category, cause, "{message}"),
			LogLevel::Warn => tracing::warn!(category, cause, "{message}"),
			LogLevel::Info => tracing::info!(category, cause, "{message}"),
			LogLevel::Debug => tracing::debug!(category, cause, "{message}"),
			LogLevel::Trace => tracing::trace!(category, cause, "{message}"),
		}

		Ok(())
	}
}

/// A record kept by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedRecord {
	pub category: String,
	pub level: LogLevel,
	pub message: String,
	pub cause: Option<String>,
}

/// Keeps every record in memory, at or above an optional minimum level.
#[derive(Debug, Default)]
pub struct MemorySink {
	records: Mutex<Vec<OwnedRecord>>,
	max_level: Option<LogLevel>,
}

impl MemorySink {
	pub fn new() -> Self {
		Self::default()
	}

	/// Only keep records at `level` or more severe.
	pub fn with_max_level(level: LogLevel) -> Self {
		Self {
			records: Mutex::default(),
			max_level: Some(level),
		}
	}

	pub fn records(&self) -> Vec<OwnedRecord> {
		self.records
			.lock()
			.map(|records| records.clone())
			.unwrap_or_default()
	}
}

impl DiagnosticSink for MemorySink {
	fn emit(&self, record: &LogRecord<'_>) -> Result<(), SinkError> {
		let mut records = self
			.records
			.lock()
			.map_err(|e| SinkError(e.to_string()))?;
		records.push(OwnedRecord {
			category: record.category.to_string(),
			level: record.level,
			message: record.message.to_string(),
			cause: record.cause.map(ToString::to_string),
		});
		Ok(())
	}

	fn enabled(&self, _category: &str, level: LogLevel) -> bool {
		self.max_level.is_none_or(|max| level <= max)
	}
}

/// Logging seam handed to layout engines.
pub trait EngineLogger: Send + Sync {
	/// Record an event. Never fails.
	fn log(&self, event: DiagnosticEvent);

	/// Whether an event from `subsystem` at `severity` would be recorded.
	fn is_enabled(&self, subsystem: &str, severity: Severity) -> bool;

	/// Engines may ask to change logger levels; implementations may refuse.
	fn set_level(&self, subsystem: &str, severity: Severity) -> GmdResult<()>;
}

/// Translates [`DiagnosticEvent`]s and hands them to an externally owned
/// [`DiagnosticSink`].
#[derive(Clone)]
pub struct DiagnosticsBridge {
	sink: Arc<dyn DiagnosticSink>,
	dropped: Arc<AtomicUsize>,
}

impl std::fmt::Debug for DiagnosticsBridge {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DiagnosticsBridge")
			.field("dropped", &self.dropped())
			.finish_non_exhaustive()
	}
}

impl Default for DiagnosticsBridge {
	fn default() -> Self {
		Self::new(Arc::new(TracingSink))
	}
}

impl DiagnosticsBridge {
	pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
		Self {
			sink,
			dropped: Arc::new(AtomicUsize::new(0)),
		}
	}

	/// Translate and forward one event. Sink failures are counted, never
	/// propagated.
	pub fn route(&self, event: &DiagnosticEvent) {
		let category = category_for(&event.source);
		let level = LogLevel::from(event.severity);
		if !self.sink.enabled(category, level) {
			return;
		}

		let record = LogRecord {
			category,
			level,
			message: &event.message,
			cause: event.cause.as_deref(),
		};
		if self.sink.emit(&record).is_err() {
			self.dropped.fetch_add(1, Ordering::Relaxed);
		}
	}

	/// Number of records the sink failed to accept.
	pub fn dropped(&self) -> usize {
		self.dropped.load(Ordering::Relaxed)
	}
}

impl EngineLogger for DiagnosticsBridge {
	fn log(&self, event: DiagnosticEvent) {
		self.route(&event);
	}

	fn is_enabled(&self, subsystem: &str, severity: Severity) -> bool {
		self.sink
			.enabled(category_for(subsystem), LogLevel::from(severity))
	}

	fn set_level(&self, subsystem: &str, _severity: Severity) -> GmdResult<()> {
		Err(GmdError::LoggerReconfiguration {
			logger: category_for(subsystem).to_string(),
		})
	}
}
