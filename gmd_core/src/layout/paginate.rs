use super::PdfSettings;
use super::html_flow::FlowBlock;
use super::html_flow::FlowKind;
use super::html_flow::Piece;
use super::metrics::Face;
use super::metrics::text_width;
use crate::DiagnosticEvent;
use crate::EngineLogger;
use crate::Severity;
use crate::diagnostics::subsystem;

/// Horizontal offset per nesting level of lists and block quotes.
pub const INDENT_STEP: f32 = 18.0;
/// Line height as a multiple of the font size.
pub const LINE_SPACING: f32 = 1.35;

/// A run of text at an absolute position, `baseline` measured from the
/// bottom of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
	pub x: f32,
	pub baseline: f32,
	pub size: f32,
	pub face: Face,
	pub text: String,
}

/// A horizontal rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedRule {
	pub from: f32,
	pub to: f32,
	pub y: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
	pub texts: Vec<PlacedText>,
	pub rules: Vec<PlacedRule>,
}

pub(crate) type Line = Vec<(Face, String)>;

/// Font size of a block relative to the base size.
fn scale(kind: FlowKind) -> f32 {
	match kind {
		FlowKind::Heading(1) => 2.0,
		FlowKind::Heading(2) => 1.6,
		FlowKind::Heading(3) => 1.3,
		FlowKind::Heading(4) => 1.15,
		FlowKind::Heading(6) | FlowKind::Preformatted => 0.9,
		_ => 1.0,
	}
}

struct Cursor {
	pages: Vec<Page>,
	top: f32,
	bottom: f32,
	y: f32,
}

impl Cursor {
	fn at_top(&self) -> bool {
		(self.y - self.top).abs() < f32::EPSILON
	}

	/// Start a new page unless `height` still fits on the current one. A
	/// page always takes at least one line.
	fn reserve(&mut self, height: f32) {
		if self.y - height < self.bottom && !self.at_top() {
			self.pages.push(Page::default());
			self.y = self.top;
		}
	}

	fn gap(&mut self, height: f32) {
		if !self.at_top() {
			self.y -= height;
		}
	}

	fn page(&mut self) -> &mut Page {
		if self.pages.is_empty() {
			self.pages.push(Page::default());
		}
		let last = self.pages.len() - 1;
		&mut self.pages[last]
	}
}

/// Place flow blocks on pages. Always returns at least one page.
pub fn paginate(blocks: &[FlowBlock], settings: &PdfSettings, logger: &dyn EngineLogger) -> Vec<Page> {
	let (width, height) = settings.page_size.dimensions();
	let left = settings.margin;
	let right = width - settings.margin;
	let top = height - settings.margin;
	let mut cursor = Cursor {
		pages: vec![Page::default()],
		top,
		bottom: settings.margin,
		y: top,
	};

	for (index, block) in blocks.iter().enumerate() {
		let size = settings.font_size * scale(block.kind);
		let line_height = size * LINE_SPACING;
		let x = left + block.indent as f32 * INDENT_STEP;
		let available = (right - x).max(size);

		match block.kind {
			FlowKind::Heading(_) => cursor.gap(size * 0.9),
			_ => cursor.gap(settings.font_size * 0.5),
		}

		if block.kind == FlowKind::Rule {
			cursor.reserve(size);
			let y = cursor.y - size * 0.5;
			cursor.page().rules.push(PlacedRule { from: x, to: right, y });
			cursor.y -= size;
			continue;
		}

		let lines = if block.kind == FlowKind::Preformatted {
			preformatted_lines(&block.pieces)
		} else {
			wrap(&block.pieces, available, size)
		};

		let mut overflow = false;
		for line in lines {
			cursor.reserve(line_height);
			let baseline = cursor.y - size;
			let mut offset = x;
			for (face, text) in line {
				let advance = text_width(face, &text, size);
				cursor.page().texts.push(PlacedText {
					x: offset,
					baseline,
					size,
					face,
					text,
				});
				offset += advance;
			}
			overflow |= offset - right > 0.01;
			cursor.y -= line_height;
		}

		if overflow {
			logger.log(DiagnosticEvent::new(
				subsystem::LAYOUT,
				Severity::Warning,
				format!("block {} is wider than the text area and overflows the right margin", index + 1),
			));
		}
	}

	cursor.pages
}

fn preformatted_lines(pieces: &[Piece]) -> Vec<Line> {
	let mut text = String::new();
	for piece in pieces {
		match piece {
			Piece::Text { text: value, .. } => text.push_str(value),
			Piece::Break => text.push('\n'),
		}
	}

	text.strip_suffix('\n')
		.unwrap_or(&text)
		.split('\n')
		.map(|line| {
			if line.is_empty() {
				Vec::new()
			} else {
				vec![(Face::Mono, line.replace('\t', "    "))]
			}
		})
		.collect()
}

enum Item {
	Word(Line),
	Break,
}

/// Greedy line filling. Words wider than `available` get a line of their
/// own.
pub(crate) fn wrap(pieces: &[Piece], available: f32, size: f32) -> Vec<Line> {
	let items = words(pieces);
	let space = text_width(Face::Regular, " ", size);
	let mut lines = Vec::new();
	let mut line: Line = Vec::new();
	let mut line_width = 0.0;

	for item in items {
		let word = match item {
			Item::Break => {
				lines.push(std::mem::take(&mut line));
				line_width = 0.0;
				continue;
			}
			Item::Word(word) => word,
		};

		let word_width: f32 = word
			.iter()
			.map(|(face, text)| text_width(*face, text, size))
			.sum();

		if !line.is_empty() && line_width + space + word_width > available {
			lines.push(std::mem::take(&mut line));
			line_width = 0.0;
		}

		if let Some((_, last)) = line.last_mut() {
			last.push(' ');
			line_width += space;
		}

		for (face, text) in word {
			match line.last_mut() {
				Some((last_face, last)) if *last_face == face => last.push_str(&text),
				_ => line.push((face, text)),
			}
		}
		line_width += word_width;
	}

	if !line.is_empty() {
		lines.push(line);
	}
	lines
}

fn words(pieces: &[Piece]) -> Vec<Item> {
	let mut items = Vec::new();
	let mut current: Line = Vec::new();

	for piece in pieces {
		match piece {
			Piece::Text { text, face } => {
				for (index, part) in text.split(' ').enumerate() {
					if index > 0 && !current.is_empty() {
						items.push(Item::Word(std::mem::take(&mut current)));
					}
					if !part.is_empty() {
						current.push((*face, part.to_string()));
					}
				}
			}
			Piece::Break => {
				if !current.is_empty() {
					items.push(Item::Word(std::mem::take(&mut current)));
				}
				items.push(Item::Break);
			}
		}
	}

	if !current.is_empty() {
		items.push(Item::Word(current));
	}
	items
}
