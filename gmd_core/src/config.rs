use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::GmdError;
use crate::GmdResult;
use crate::HtmlOptions;
use crate::PdfSettings;

/// Supported config file locations in discovery order (highest precedence
/// first), relative to the source directory.
pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["gmd.toml", ".gmd.toml"];

/// Configuration loaded from a `gmd.toml` file in the source directory.
///
/// ```toml
/// jobs = 4
///
/// [variables]
/// author = "Jane"
/// version = "1.2.0"
///
/// [exclude]
/// patterns = ["drafts/", "*.wip.gmd"]
///
/// [html]
/// lang = "en"
///
/// [pdf]
/// page_size = "a4"
/// margin = 56.0
/// font_size = 11.0
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct GmdConfig {
	/// Number of documents converted in parallel. Defaults to the available
	/// parallelism.
	#[serde(default)]
	pub jobs: Option<usize>,
	/// Extra names available to every expression.
	#[serde(default)]
	pub variables: BTreeMap<String, serde_json::Value>,
	/// Exclusion configuration using gitignore-style patterns.
	#[serde(default)]
	pub exclude: ExcludeConfig,
	#[serde(default)]
	pub html: HtmlConfig,
	#[serde(default)]
	pub pdf: PdfSettings,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ExcludeConfig {
	/// Gitignore-style patterns, matched relative to the source directory.
	#[serde(default)]
	pub patterns: Vec<String>,
}

/// The `[html]` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct HtmlConfig {
	/// `lang` attribute of the generated `<html>` element.
	#[serde(default)]
	pub lang: Option<String>,
	/// Title used for every document instead of its first heading.
	#[serde(default)]
	pub title: Option<String>,
}

impl HtmlConfig {
	pub fn options(&self) -> HtmlOptions {
		HtmlOptions {
			title: self.title.clone(),
			fallback_title: None,
			lang: self.lang.clone(),
		}
	}
}

impl GmdConfig {
	/// The first config file candidate that exists in `root`.
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from `root`. Returns `Ok(None)` when there is no
	/// config file.
	pub fn load(root: &Path) -> GmdResult<Option<GmdConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: GmdConfig =
			toml::from_str(&content).map_err(|e| GmdError::ConfigParse(e.to_string()))?;
		config.validate()?;

		tracing::debug!(path = %config_path.display(), "loaded config");
		Ok(Some(config))
	}

	fn validate(&self) -> GmdResult<()> {
		if self.jobs == Some(0) {
			return Err(GmdError::InvalidJobs("`jobs` must be at least 1".to_string()));
		}
		Ok(())
	}
}
