use serde::Deserialize;
use serde::Serialize;

/// A location in source text. `line` and `column` are 1-indexed, `offset` is
/// the 0-indexed byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
	pub line: usize,
	pub column: usize,
	pub offset: usize,
}

impl Default for Point {
	fn default() -> Self {
		Self {
			line: 1,
			column: 1,
			offset: 0,
		}
	}
}

impl Point {
	pub fn new(line: usize, column: usize, offset: usize) -> Self {
		Self {
			line,
			column,
			offset,
		}
	}

	/// Advance this point past the given text. Columns count characters, not
	/// bytes.
	pub fn advance_str(&mut self, text: &str) {
		for ch in text.chars() {
			if ch == '\n' {
				self.line += 1;
				self.column = 1;
			} else {
				self.column += 1;
			}
		}
		self.offset += text.len();
	}

	/// Locate the byte `offset` within `source`. Offsets past the end clamp to
	/// the end of the source.
	pub fn locate(source: &str, offset: usize) -> Self {
		let mut end = offset.min(source.len());
		while !source.is_char_boundary(end) {
			end -= 1;
		}

		let mut point = Self::default();
		point.advance_str(&source[..end]);
		point
	}
}
