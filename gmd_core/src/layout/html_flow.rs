use std::borrow::Cow;
use std::collections::BTreeSet;

use quick_xml::Reader;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;

use super::metrics::Face;
use crate::DiagnosticEvent;
use crate::EngineLogger;
use crate::LayoutFault;
use crate::Severity;
use crate::diagnostics::subsystem;

/// How a flow block is typeset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
	Heading(u8),
	Paragraph,
	/// Monospaced, whitespace preserved, never wrapped.
	Preformatted,
	Rule,
}

/// A styled piece of inline content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
	Text { text: String, face: Face },
	Break,
}

/// A block-level box in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowBlock {
	pub kind: FlowKind,
	/// Nesting depth from lists and block quotes.
	pub indent: usize,
	pub pieces: Vec<Piece>,
}

impl FlowBlock {
	fn is_empty(&self) -> bool {
		self.kind != FlowKind::Rule
			&& self.pieces.iter().all(|piece| {
				match piece {
					Piece::Text { text, .. } => text.trim().is_empty(),
					Piece::Break => true,
				}
			})
	}
}

/// The flow content of an HTML document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowDocument {
	pub title: Option<String>,
	pub blocks: Vec<FlowBlock>,
}

/// Read well-formed HTML into flow blocks.
pub fn read_flow(html: &str, logger: &dyn EngineLogger) -> Result<FlowDocument, LayoutFault> {
	logger.log(DiagnosticEvent::new(
		subsystem::LOAD,
		Severity::Fine,
		format!("loading {} byte(s) of html", html.len()),
	));

	let mut reader = Reader::from_str(html);
	let mut flow = FlowReader::new(logger);

	loop {
		let event = reader.read_event().map_err(|e| {
			LayoutFault::MalformedHtml(format!(
				"at byte {}: {e}",
				reader.error_position()
			))
		})?;

		match event {
			Event::Start(element) => flow.open(&element, false),
			Event::Empty(element) => flow.open(&element, true),
			Event::End(element) => flow.close(&String::from_utf8_lossy(element.name().as_ref())),
			Event::Text(text) => flow.text(&text),
			Event::CData(data) => flow.push_text(&String::from_utf8_lossy(&data)),
			Event::Eof => break,
			_ => {}
		}
	}

	Ok(flow.finish())
}

struct ListState {
	ordered: bool,
	next: u32,
}

struct FlowReader<'l> {
	logger: &'l dyn EngineLogger,
	document: FlowDocument,
	pending: Option<FlowBlock>,
	kind: FlowKind,
	marker: Option<String>,
	lists: Vec<ListState>,
	quotes: usize,
	bold: usize,
	italic: usize,
	mono: usize,
	/// Depth inside elements whose text is not laid out.
	hidden: usize,
	in_title: bool,
	title: String,
	unmatched: BTreeSet<String>,
}

impl<'l> FlowReader<'l> {
	fn new(logger: &'l dyn EngineLogger) -> Self {
		Self {
			logger,
			document: FlowDocument::default(),
			pending: None,
			kind: FlowKind::Paragraph,
			marker: None,
			lists: Vec::new(),
			quotes: 0,
			bold: 0,
			italic: 0,
			mono: 0,
			hidden: 0,
			in_title: false,
			title: String::new(),
			unmatched: BTreeSet::new(),
		}
	}

	fn open(&mut self, element: &BytesStart<'_>, empty: bool) {
		let name = String::from_utf8_lossy(element.name().as_ref()).to_ascii_lowercase();

		match name.as_str() {
			"html" | "head" | "body" | "meta" | "a" | "span" | "del" | "s" => {}
			"title" => self.in_title = true,
			"style" | "script" => {
				let (source, kind) = if name == "style" {
					(subsystem::CSS_PARSE, "stylesheet")
				} else {
					(subsystem::GENERAL, "script")
				};
				self.log(source, Severity::Warning, format!("<{name}> {kind} ignored"));
				self.hidden += 1;
			}
			"h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
				self.flush();
				let level = name[1..].parse().unwrap_or(1);
				self.kind = FlowKind::Heading(level);
			}
			"p" | "div" => {
				self.flush();
				self.kind = FlowKind::Paragraph;
			}
			"pre" => {
				self.flush();
				self.kind = FlowKind::Preformatted;
			}
			"blockquote" => {
				self.flush();
				self.quotes += 1;
			}
			"ul" | "ol" => {
				self.flush();
				let start = attribute(element, "start")
					.and_then(|value| value.trim().parse().ok())
					.unwrap_or(1);
				self.lists.push(ListState {
					ordered: name == "ol",
					next: start,
				});
			}
			"li" => {
				self.flush();
				self.marker = Some(match self.lists.last_mut() {
					Some(list) if list.ordered => {
						let marker = format!("{}. ", list.next);
						list.next += 1;
						marker
					}
					_ => "\u{2022} ".to_string(),
				});
			}
			"hr" => {
				self.flush();
				self.document.blocks.push(FlowBlock {
					kind: FlowKind::Rule,
					indent: self.indent(),
					pieces: Vec::new(),
				});
			}
			"br" => self.pending().pieces.push(Piece::Break),
			"strong" | "b" => self.bold += 1,
			"em" | "i" => self.italic += 1,
			"code" | "kbd" | "samp" | "tt" => self.mono += 1,
			"input" => {
				let checked = attribute(element, "checked").is_some();
				self.push_text(if checked { "[x] " } else { "[ ] " });
			}
			"img" => {
				let alt = attribute(element, "alt").unwrap_or_default();
				let src = attribute(element, "src").unwrap_or_default();
				self.log(
					subsystem::LOAD,
					Severity::Warning,
					format!("image `{src}` is not embedded, laying out its alt text"),
				);
				if !alt.is_empty() {
					self.push_text(&format!("[{alt}]"));
				}
			}
			_ => {
				if self.unmatched.insert(name.clone()) {
					self.log(
						subsystem::MATCH,
						Severity::Info,
						format!("no layout rule for <{name}>, its content flows as text"),
					);
				}
			}
		}

		if empty {
			self.close(&name);
		}
	}

	fn close(&mut self, name: &str) {
		match name.to_ascii_lowercase().as_str() {
			"title" => {
				self.in_title = false;
				let title = self.title.trim();
				if !title.is_empty() {
					self.document.title = Some(title.to_string());
				}
			}
			"style" | "script" => self.hidden = self.hidden.saturating_sub(1),
			"h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "p" | "div" | "pre" => {
				self.flush();
				self.kind = FlowKind::Paragraph;
			}
			"blockquote" => {
				self.flush();
				self.quotes = self.quotes.saturating_sub(1);
			}
			"ul" | "ol" => {
				self.flush();
				self.lists.pop();
			}
			"li" => {
				self.flush();
				self.marker = None;
			}
			"strong" | "b" => self.bold = self.bold.saturating_sub(1),
			"em" | "i" => self.italic = self.italic.saturating_sub(1),
			"code" | "kbd" | "samp" | "tt" => self.mono = self.mono.saturating_sub(1),
			_ => {}
		}
	}

	fn text(&mut self, text: &BytesText<'_>) {
		let decoded = match text.unescape() {
			Ok(decoded) => decoded,
			Err(e) => {
				self.log_with_cause(
					subsystem::XML_ENTITIES,
					Severity::Warning,
					"unknown entity, text kept undecoded".to_string(),
					&e,
				);
				Cow::Owned(String::from_utf8_lossy(text).into_owned())
			}
		};
		self.push_text(&decoded);
	}

	fn push_text(&mut self, text: &str) {
		if self.in_title {
			self.title.push_str(text);
			return;
		}
		if self.hidden > 0 {
			return;
		}

		if self.kind == FlowKind::Preformatted {
			let face = Face::Mono;
			self.pending().pieces.push(Piece::Text {
				text: text.to_string(),
				face,
			});
			return;
		}

		// Whitespace between blocks carries no content.
		if self.pending.is_none() && text.trim().is_empty() {
			return;
		}

		let face = Face::styled(
			self.bold > 0 || matches!(self.kind, FlowKind::Heading(_)),
			self.italic > 0,
			self.mono > 0,
		);
		let mut after_space = self.ends_with_space();
		let mut collapsed = String::with_capacity(text.len());
		for ch in text.chars() {
			if ch.is_whitespace() {
				if !after_space {
					collapsed.push(' ');
				}
				after_space = true;
			} else {
				collapsed.push(ch);
				after_space = false;
			}
		}

		if !collapsed.is_empty() {
			self.pending().pieces.push(Piece::Text {
				text: collapsed,
				face,
			});
		}
	}

	fn ends_with_space(&self) -> bool {
		match self.pending.as_ref().and_then(|block| block.pieces.last()) {
			Some(Piece::Text { text, .. }) => text.ends_with(' '),
			Some(Piece::Break) | None => true,
		}
	}

	fn pending(&mut self) -> &mut FlowBlock {
		let kind = self.kind;
		let indent = self.indent();
		let marker = self.marker.take();
		self.pending.get_or_insert_with(|| {
			let pieces = marker
				.map(|text| {
					vec![Piece::Text {
						text,
						face: Face::Regular,
					}]
				})
				.unwrap_or_default();
			FlowBlock {
				kind,
				indent,
				pieces,
			}
		})
	}

	fn flush(&mut self) {
		if let Some(block) = self.pending.take() {
			if !block.is_empty() {
				self.document.blocks.push(block);
			}
		}
	}

	fn indent(&self) -> usize {
		self.lists.len() + self.quotes
	}

	fn log(&self, source: &str, severity: Severity, message: String) {
		self.logger
			.log(DiagnosticEvent::new(source, severity, message));
	}

	fn log_with_cause(
		&self,
		source: &str,
		severity: Severity,
		message: String,
		cause: &dyn std::fmt::Display,
	) {
		self.logger
			.log(DiagnosticEvent::new(source, severity, message).with_cause(cause));
	}

	fn finish(mut self) -> FlowDocument {
		self.flush();
		self.document
	}
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Option<String> {
	element
		.attributes()
		.flatten()
		.find(|attribute| attribute.key.as_ref().eq_ignore_ascii_case(name.as_bytes()))
		.map(|attribute| {
			attribute
				.unescape_value()
				.map_or_else(|_| String::from_utf8_lossy(&attribute.value).into_owned(), Cow::into_owned)
		})
}
