use std::fmt::Write;

use crate::Block;
use crate::BlockSequence;
use crate::Inline;
use crate::List;

/// Options for the HTML shell around rendered content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlOptions {
	/// Document title. Defaults to the first heading of the document.
	pub title: Option<String>,
	/// Title used when neither `title` nor a heading is available.
	pub fallback_title: Option<String>,
	/// Value of the `lang` attribute on `<html>`.
	pub lang: Option<String>,
}

impl HtmlOptions {
	#[must_use]
	pub fn with_fallback_title(mut self, title: impl Into<String>) -> Self {
		self.fallback_title = Some(title.into());
		self
	}
}

/// Render a block sequence as a standalone HTML document.
///
/// The markup is well-formed (every element closed, void elements written as
/// `<br />`) so the result can be fed straight to the PDF compositor.
pub fn render_html(blocks: &BlockSequence, options: &HtmlOptions) -> String {
	let title = options
		.title
		.clone()
		.or_else(|| blocks.first_heading())
		.or_else(|| options.fallback_title.clone())
		.unwrap_or_default();

	let mut html = String::with_capacity(256);
	html.push_str("<!DOCTYPE html>\n");
	match &options.lang {
		Some(lang) => {
			let _ = writeln!(html, "<html lang=\"{}\">", escape_html(lang));
		}
		None => html.push_str("<html>\n"),
	}
	html.push_str("<head>\n<meta charset=\"utf-8\" />\n");
	let _ = writeln!(html, "<title>{}</title>", escape_html(&title));
	html.push_str("</head>\n<body>\n");
	html.push_str(&render_html_fragment(blocks));
	html.push_str("</body>\n</html>\n");
	html
}

/// Render only the body content of a block sequence.
pub fn render_html_fragment(blocks: &[Block]) -> String {
	let mut html = String::new();
	write_blocks(blocks, &mut html);
	html
}

/// Escape the characters with special meaning in HTML text and attribute
/// values.
pub fn escape_html(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());
	for ch in text.chars() {
		match ch {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			_ => escaped.push(ch),
		}
	}
	escaped
}

fn write_blocks(blocks: &[Block], html: &mut String) {
	for block in blocks {
		write_block(block, html);
	}
}

fn write_block(block: &Block, html: &mut String) {
	match block {
		Block::Heading { level, content } => {
			let _ = write!(html, "<h{level}>");
			write_inlines(content, html);
			let _ = writeln!(html, "</h{level}>");
		}
		Block::Paragraph(content) => {
			html.push_str("<p>");
			write_inlines(content, html);
			html.push_str("</p>\n");
		}
		Block::List(list) => write_list(list, html),
		Block::CodeBlock { lang, code } => {
			html.push_str("<pre><code");
			if let Some(lang) = lang {
				let _ = write!(html, " class=\"language-{}\"", escape_html(lang));
			}
			html.push('>');
			html.push_str(&escape_html(code));
			html.push_str("</code></pre>\n");
		}
		Block::BlockQuote(children) => {
			html.push_str("<blockquote>\n");
			write_blocks(children, html);
			html.push_str("</blockquote>\n");
		}
		Block::ThematicBreak => html.push_str("<hr />\n"),
	}
}

fn write_list(list: &List, html: &mut String) {
	if !list.ordered {
		html.push_str("<ul>\n");
	} else if list.start == 1 {
		html.push_str("<ol>\n");
	} else {
		let _ = writeln!(html, "<ol start=\"{}\">", list.start);
	}

	for item in &list.items {
		html.push_str("<li>");
		match item.checked {
			Some(true) => html.push_str("<input type=\"checkbox\" checked=\"checked\" disabled=\"disabled\" /> "),
			Some(false) => html.push_str("<input type=\"checkbox\" disabled=\"disabled\" /> "),
			None => {}
		}

		if list.tight {
			// Tight items inline their paragraphs; nested blocks keep their
			// own markup.
			for (index, block) in item.blocks.iter().enumerate() {
				match block {
					Block::Paragraph(content) => {
						if index > 0 {
							html.push('\n');
						}
						write_inlines(content, html);
					}
					other => {
						html.push('\n');
						write_block(other, html);
					}
				}
			}
		} else {
			html.push('\n');
			write_blocks(&item.blocks, html);
		}
		html.push_str("</li>\n");
	}

	html.push_str(if list.ordered { "</ol>\n" } else { "</ul>\n" });
}

fn write_inlines(inlines: &[Inline], html: &mut String) {
	for inline in inlines {
		write_inline(inline, html);
	}
}

fn write_inline(inline: &Inline, html: &mut String) {
	match inline {
		Inline::Text(text) => html.push_str(&escape_html(text)),
		Inline::Emphasis(children) => {
			html.push_str("<em>");
			write_inlines(children, html);
			html.push_str("</em>");
		}
		Inline::Strong(children) => {
			html.push_str("<strong>");
			write_inlines(children, html);
			html.push_str("</strong>");
		}
		Inline::Strikethrough(children) => {
			html.push_str("<del>");
			write_inlines(children, html);
			html.push_str("</del>");
		}
		Inline::Code(code) => {
			html.push_str("<code>");
			html.push_str(&escape_html(code));
			html.push_str("</code>");
		}
		Inline::Link {
			url,
			title,
			content,
		} => {
			let _ = write!(html, "<a href=\"{}\"", escape_html(url));
			if let Some(title) = title {
				let _ = write!(html, " title=\"{}\"", escape_html(title));
			}
			html.push('>');
			write_inlines(content, html);
			html.push_str("</a>");
		}
		Inline::Image { url, title, alt } => {
			let _ = write!(
				html,
				"<img src=\"{}\" alt=\"{}\"",
				escape_html(url),
				escape_html(alt)
			);
			if let Some(title) = title {
				let _ = write!(html, " title=\"{}\"", escape_html(title));
			}
			html.push_str(" />");
		}
		Inline::LineBreak => html.push_str("<br />\n"),
	}
}
