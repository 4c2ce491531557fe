use std::collections::BTreeMap;
use std::path::Path;

use chrono::Datelike;
use chrono::Local;
use chrono::NaiveDateTime;
use serde_json::Value;

/// Names always present in a [`RenderContext`]. Caller variables can't
/// shadow them.
pub const BUILTIN_NAMES: [&str; 6] = ["today", "time", "now", "year", "file", "file_name"];

/// The read-only set of named values available to embedded expressions.
///
/// A context is built once per document and never changes afterwards. The
/// values are plain JSON values so they can be fed straight into the
/// expression engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
	values: BTreeMap<String, Value>,
}

impl RenderContext {
	/// Start building a context pinned to `timestamp`.
	pub fn builder(timestamp: NaiveDateTime) -> RenderContextBuilder {
		RenderContextBuilder {
			timestamp,
			variables: BTreeMap::new(),
			file: None,
		}
	}

	/// Start building a context pinned to the current local time.
	pub fn builder_now() -> RenderContextBuilder {
		Self::builder(Local::now().naive_local())
	}

	pub fn get(&self, name: &str) -> Option<&Value> {
		self.values.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.values.contains_key(name)
	}

	/// All names defined in this context, sorted.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.values.keys().map(String::as_str)
	}

	pub(crate) fn values(&self) -> &BTreeMap<String, Value> {
		&self.values
	}
}

/// Collects the inputs of a [`RenderContext`].
#[derive(Debug, Clone)]
pub struct RenderContextBuilder {
	timestamp: NaiveDateTime,
	variables: BTreeMap<String, Value>,
	file: Option<String>,
}

impl RenderContextBuilder {
	/// Add a caller-supplied variable.
	pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.variables.insert(name.into(), value.into());
		self
	}

	/// Add several caller-supplied variables.
	pub fn variables<I, K>(mut self, variables: I) -> Self
	where
		I: IntoIterator<Item = (K, Value)>,
		K: Into<String>,
	{
		for (name, value) in variables {
			self.variables.insert(name.into(), value);
		}
		self
	}

	/// Bind the document's source-relative path.
	pub fn file(mut self, relative: &Path) -> Self {
		self.file = Some(relative.to_string_lossy().replace('\\', "/"));
		self
	}

	pub fn build(self) -> RenderContext {
		let mut values = BTreeMap::new();

		for (name, value) in self.variables {
			if BUILTIN_NAMES.contains(&name.as_str()) {
				tracing::warn!(variable = %name, "ignoring variable that shadows a built-in name");
				continue;
			}
			values.insert(name, value);
		}

		let timestamp = self.timestamp;
		values.insert(
			"today".to_string(),
			Value::from(timestamp.format("%Y-%m-%d").to_string()),
		);
		values.insert(
			"time".to_string(),
			Value::from(timestamp.format("%H:%M:%S").to_string()),
		);
		values.insert(
			"now".to_string(),
			Value::from(timestamp.format("%Y-%m-%d %H:%M:%S").to_string()),
		);
		values.insert("year".to_string(), Value::from(timestamp.year()));

		let file = self.file.unwrap_or_default();
		let file_name = Path::new(&file)
			.file_stem()
			.map(|stem| stem.to_string_lossy().into_owned())
			.unwrap_or_default();
		values.insert("file".to_string(), Value::from(file));
		values.insert("file_name".to_string(), Value::from(file_name));

		RenderContext { values }
	}
}
