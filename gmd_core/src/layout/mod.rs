//! The built-in [`LayoutEngine`]: a small box layout over the HTML produced by
//! [`render_html`](crate::render_html).
//!
//! The engine reads the markup into flow blocks ([`html_flow`]), wraps and
//! paginates them with the PDF base-14 font metrics ([`paginate`],
//! [`metrics`]) and serializes the pages with `pdf-writer` ([`writer`]).
//! Nothing time-dependent is written, so the same HTML always produces the
//! same bytes.

use serde::Deserialize;
use serde::Serialize;

use crate::DiagnosticEvent;
use crate::EngineLogger;
use crate::LayoutEngine;
use crate::LayoutFault;
use crate::Severity;
use crate::diagnostics::subsystem;

pub mod html_flow;
pub mod metrics;
pub mod paginate;
pub mod writer;

/// Paper sizes supported by the built-in engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
	#[default]
	A4,
	Letter,
}

impl PageSize {
	/// Width and height in points.
	pub fn dimensions(self) -> (f32, f32) {
		match self {
			Self::A4 => (595.28, 841.89),
			Self::Letter => (612.0, 792.0),
		}
	}
}

/// Page geometry and base typography, read from the `[pdf]` section of
/// `gmd.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfSettings {
	pub page_size: PageSize,
	/// Margin on every side, in points.
	pub margin: f32,
	/// Body text size, in points. Headings scale from it.
	pub font_size: f32,
}

impl Default for PdfSettings {
	fn default() -> Self {
		Self {
			page_size: PageSize::A4,
			margin: 56.0,
			font_size: 11.0,
		}
	}
}

impl PdfSettings {
	fn validate(&self) -> Result<(), LayoutFault> {
		let (width, height) = self.page_size.dimensions();
		if self.font_size.is_nan() || self.font_size <= 0.0 {
			return Err(LayoutFault::Layout(format!(
				"font size must be positive, got {}",
				self.font_size
			)));
		}
		if self.margin.is_nan()
			|| self.margin < 0.0
			|| self.margin * 2.0 >= width
			|| self.margin * 2.0 >= height
		{
			return Err(LayoutFault::Layout(format!(
				"a margin of {}pt leaves no printable area on a {width}x{height}pt page",
				self.margin
			)));
		}
		Ok(())
	}
}

/// Lays out HTML with the standard PDF fonts. See the module docs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoxLayoutEngine {
	settings: PdfSettings,
}

impl BoxLayoutEngine {
	pub fn new(settings: PdfSettings) -> Self {
		Self { settings }
	}

	pub fn settings(&self) -> &PdfSettings {
		&self.settings
	}
}

impl LayoutEngine for BoxLayoutEngine {
	fn render(&self, html: &str, logger: &dyn EngineLogger) -> Result<Vec<u8>, LayoutFault> {
		self.settings.validate()?;
		let (width, height) = self.settings.page_size.dimensions();
		logger.log(DiagnosticEvent::new(
			subsystem::INIT,
			Severity::Config,
			format!(
				"page {width}x{height}pt, margin {}pt, base font {}pt",
				self.settings.margin, self.settings.font_size
			),
		));

		let document = html_flow::read_flow(html, logger)?;
		let pages = paginate::paginate(&document.blocks, &self.settings, logger);

		if logger.is_enabled(subsystem::LAYOUT, Severity::Fine) {
			logger.log(DiagnosticEvent::new(
				subsystem::LAYOUT,
				Severity::Fine,
				format!(
					"laid out {} block(s) on {} page(s)",
					document.blocks.len(),
					pages.len()
				),
			));
		}

		let bytes = writer::write_pdf(&pages, &self.settings, document.title.as_deref(), logger);
		logger.log(DiagnosticEvent::new(
			subsystem::RENDER,
			Severity::Fine,
			format!("wrote {} byte(s) of pdf", bytes.len()),
		));

		Ok(bytes)
	}
}
