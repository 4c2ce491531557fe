use std::path::Path;

use chrono::NaiveDate;
use chrono::NaiveDateTime;

use crate::DiagnosticSink;
use crate::EngineLogger;
use crate::LayoutEngine;
use crate::LayoutFault;
use crate::LogRecord;
use crate::ProcessOptions;
use crate::RenderContext;
use crate::SinkError;

/// 2024-03-05 14:30:00, bound to every fixture context.
pub fn fixed_timestamp() -> NaiveDateTime {
	NaiveDate::from_ymd_opt(2024, 3, 5)
		.and_then(|date| date.and_hms_opt(14, 30, 0))
		.unwrap_or_else(|| panic!("valid fixture timestamp"))
}

pub fn fixture_context() -> RenderContext {
	RenderContext::builder(fixed_timestamp())
		.variable("author", "Jane")
		.variable("version", "1.2.0")
		.file(Path::new("guide/intro.gmd"))
		.build()
}

pub fn pinned_options() -> ProcessOptions {
	ProcessOptions {
		jobs: Some(2),
		timestamp: Some(fixed_timestamp()),
		..ProcessOptions::default()
	}
}

/// Write `files` (relative path, content) under `root`.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
	for (relative, content) in files {
		let path = root.join(relative);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create dir: {e}"));
		}
		std::fs::write(&path, content).unwrap_or_else(|e| panic!("write {relative}: {e}"));
	}
}

pub fn read_artifact(path: &Path) -> String {
	std::fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

/// A sink that rejects every record.
pub struct FailingSink;

impl DiagnosticSink for FailingSink {
	fn emit(&self, _record: &LogRecord<'_>) -> Result<(), SinkError> {
		Err(SinkError("disk full".to_string()))
	}
}

/// A layout engine that always fails.
pub struct FaultyEngine;

impl LayoutEngine for FaultyEngine {
	fn render(&self, _html: &str, _logger: &dyn EngineLogger) -> Result<Vec<u8>, LayoutFault> {
		Err(LayoutFault::Layout("no fonts available".to_string()))
	}
}

pub const SAMPLE_DOCUMENT: &str = "# Release notes\n\nVersion ${version} by ${author}.\n\n- \
                                   fixes\n- features\n";
