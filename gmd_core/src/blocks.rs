use derive_more::Deref;
use serde::Deserialize;
use serde::Serialize;

/// The renderer-agnostic form of a parsed document: an ordered, immutable
/// sequence of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, Serialize, Deserialize)]
pub struct BlockSequence(#[deref] Vec<Block>);

impl BlockSequence {
	pub fn new(blocks: Vec<Block>) -> Self {
		Self(blocks)
	}

	pub fn into_inner(self) -> Vec<Block> {
		self.0
	}

	/// Plain text of the first heading, if the document has one.
	pub fn first_heading(&self) -> Option<String> {
		self.0.iter().find_map(|block| {
			match block {
				Block::Heading { content, .. } => Some(plain_text(content)),
				_ => None,
			}
		})
	}
}

impl From<Vec<Block>> for BlockSequence {
	fn from(blocks: Vec<Block>) -> Self {
		Self(blocks)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Block {
	/// `# Title` with a level between 1 and 6.
	Heading { level: u8, content: Vec<Inline> },
	Paragraph(Vec<Inline>),
	List(List),
	/// A fenced or indented code block. `code` has no trailing newline.
	CodeBlock { lang: Option<String>, code: String },
	BlockQuote(Vec<Block>),
	ThematicBreak,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
	pub ordered: bool,
	/// First number of an ordered list.
	pub start: u32,
	/// Tight lists render items without paragraph wrappers.
	pub tight: bool,
	pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
	/// `Some` for task list items (`- [x] done`).
	pub checked: Option<bool>,
	pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Inline {
	Text(String),
	Emphasis(Vec<Inline>),
	Strong(Vec<Inline>),
	Strikethrough(Vec<Inline>),
	Code(String),
	Link {
		url: String,
		title: Option<String>,
		content: Vec<Inline>,
	},
	Image {
		url: String,
		title: Option<String>,
		alt: String,
	},
	LineBreak,
}

/// Concatenate the text of `inlines`, dropping all markup.
pub fn plain_text(inlines: &[Inline]) -> String {
	let mut text = String::new();
	collect_text(inlines, &mut text);
	text
}

fn collect_text(inlines: &[Inline], text: &mut String) {
	for inline in inlines {
		match inline {
			Inline::Text(value) | Inline::Code(value) => text.push_str(value),
			Inline::Emphasis(children)
			| Inline::Strong(children)
			| Inline::Strikethrough(children)
			| Inline::Link {
				content: children, ..
			} => collect_text(children, text),
			Inline::Image { alt, .. } => text.push_str(alt),
			Inline::LineBreak => text.push(' '),
		}
	}
}
