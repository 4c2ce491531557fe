use std::path::Path;
use std::sync::Arc;

use crate::DiagnosticsBridge;
use crate::EngineLogger;
use crate::GmdError;
use crate::GmdResult;
use crate::layout::BoxLayoutEngine;

/// A failure reported by a [`LayoutEngine`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LayoutFault {
	#[error("malformed html: {0}")]
	MalformedHtml(String),
	#[error("layout failed: {0}")]
	Layout(String),
}

/// Turns HTML into a paginated PDF.
///
/// Engines receive a logger instead of writing to any fixed stream. All of
/// their diagnostics flow through it.
pub trait LayoutEngine: Send + Sync {
	fn render(&self, html: &str, logger: &dyn EngineLogger) -> Result<Vec<u8>, LayoutFault>;
}

/// Converts rendered HTML into PDF bytes by delegating to a [`LayoutEngine`].
#[derive(Clone)]
pub struct PdfCompositor {
	engine: Arc<dyn LayoutEngine>,
	bridge: DiagnosticsBridge,
}

impl std::fmt::Debug for PdfCompositor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PdfCompositor")
			.field("bridge", &self.bridge)
			.finish_non_exhaustive()
	}
}

impl PdfCompositor {
	pub fn new(engine: Arc<dyn LayoutEngine>, bridge: DiagnosticsBridge) -> Self {
		Self { engine, bridge }
	}

	/// A compositor using the built-in [`BoxLayoutEngine`] with default
	/// settings.
	pub fn with_bridge(bridge: DiagnosticsBridge) -> Self {
		Self::new(Arc::new(BoxLayoutEngine::default()), bridge)
	}

	pub fn bridge(&self) -> &DiagnosticsBridge {
		&self.bridge
	}

	/// Lay out `html` and return the PDF bytes. Engine failures become
	/// [`GmdError::Render`] tagged with `source_path`.
	pub fn compose(&self, html: &str, source_path: &Path) -> GmdResult<Vec<u8>> {
		self.engine
			.render(html, &self.bridge)
			.map_err(|fault| {
				GmdError::Render {
					path: source_path.display().to_string(),
					reason: fault.to_string(),
				}
			})
	}
}
