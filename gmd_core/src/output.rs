use std::fmt::Display;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::GmdError;

/// The encoding a document is converted into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
	/// Canonical markdown with all expressions evaluated.
	#[default]
	#[serde(rename = "md")]
	Markdown,
	/// A standalone HTML document.
	Html,
	/// A paginated PDF document.
	Pdf,
}

impl OutputType {
	pub const ALL: [OutputType; 3] = [Self::Markdown, Self::Html, Self::Pdf];

	/// The file extension of artifacts of this type, without the dot.
	pub fn extension(self) -> &'static str {
		match self {
			Self::Markdown => "md",
			Self::Html => "html",
			Self::Pdf => "pdf",
		}
	}

	/// Map a source-relative path to the artifact path under `target`. Only
	/// the extension changes.
	pub fn artifact_path(self, target: &Path, relative: &Path) -> PathBuf {
		target.join(relative).with_extension(self.extension())
	}
}

impl Display for OutputType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.extension())
	}
}

impl FromStr for OutputType {
	type Err = GmdError;

	/// Parse an output type case-insensitively. An empty value selects the
	/// default (`md`).
	fn from_str(value: &str) -> Result<Self, Self::Err> {
		let normalized = value.trim().to_ascii_lowercase();
		match normalized.as_str() {
			"" | "md" => Ok(Self::Markdown),
			"html" => Ok(Self::Html),
			"pdf" => Ok(Self::Pdf),
			_ => Err(GmdError::UnsupportedOutputType(value.to_string())),
		}
	}
}
