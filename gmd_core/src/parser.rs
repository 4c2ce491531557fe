use std::collections::HashMap;

use markdown::ParseOptions;
use markdown::mdast;
use markdown::mdast::Node;
use markdown::to_mdast;

use crate::Block;
use crate::BlockSequence;
use crate::GmdError;
use crate::GmdResult;
use crate::Inline;
use crate::List;
use crate::ListItem;
use crate::Point;

/// A construct the parser could not represent faithfully. These never fail
/// the document; they are reported through the diagnostics bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseNote {
	/// The construct was kept as literal paragraph or inline text.
	Flattened {
		construct: &'static str,
		line: usize,
		column: usize,
	},
	/// A link reference definition was folded into the links that use it.
	DefinitionResolved {
		label: String,
		line: usize,
		column: usize,
	},
	/// A reference to an undefined link label was kept as literal text.
	UnresolvedReference {
		label: String,
		line: usize,
		column: usize,
	},
}

impl ParseNote {
	pub fn message(&self) -> String {
		match self {
			Self::Flattened {
				construct,
				line,
				column,
			} => format!("{construct} at {line}:{column} rendered as plain text"),
			Self::DefinitionResolved {
				label,
				line,
				column,
			} => format!("link definition `{label}` at {line}:{column} inlined into its references"),
			Self::UnresolvedReference {
				label,
				line,
				column,
			} => format!("reference `{label}` at {line}:{column} has no definition"),
		}
	}
}

/// Parse substituted GMD text into a block sequence.
pub fn parse(content: impl AsRef<str>) -> GmdResult<BlockSequence> {
	parse_with_diagnostics(content).map(|(blocks, _)| blocks)
}

/// Parse substituted GMD text and also return notes about constructs that
/// were flattened or resolved along the way.
pub fn parse_with_diagnostics(
	content: impl AsRef<str>,
) -> GmdResult<(BlockSequence, Vec<ParseNote>)> {
	let content = content.as_ref();
	let options = ParseOptions::gfm();
	let mdast = to_mdast(content, &options).map_err(|e| GmdError::Parse(e.to_string()))?;

	let mut lowering = Lowering {
		source: content,
		definitions: HashMap::new(),
		notes: Vec::new(),
	};
	let children = mdast.children().map(Vec::as_slice).unwrap_or_default();
	lowering.collect_definitions(children);
	let blocks = lowering.blocks(children);

	Ok((BlockSequence::new(blocks), lowering.notes))
}

/// Turns the markdown AST into [`Block`]s in one pass over the tree.
struct Lowering<'a> {
	source: &'a str,
	definitions: HashMap<String, (String, Option<String>)>,
	notes: Vec<ParseNote>,
}

impl Lowering<'_> {
	fn collect_definitions(&mut self, nodes: &[Node]) {
		for node in nodes {
			match node {
				Node::Definition(definition) => {
					self.definitions
						.entry(definition.identifier.clone())
						.or_insert_with(|| (definition.url.clone(), definition.title.clone()));
				}
				_ => {
					if let Some(children) = node.children() {
						self.collect_definitions(children);
					}
				}
			}
		}
	}

	fn blocks(&mut self, nodes: &[Node]) -> Vec<Block> {
		nodes.iter().filter_map(|node| self.block(node)).collect()
	}

	fn block(&mut self, node: &Node) -> Option<Block> {
		let block = match node {
			Node::Heading(heading) => {
				Block::Heading {
					level: heading.depth.clamp(1, 6),
					content: self.inlines(&heading.children),
				}
			}
			Node::Paragraph(paragraph) => Block::Paragraph(self.inlines(&paragraph.children)),
			Node::List(list) => Block::List(self.list(list)),
			Node::Code(code) => {
				Block::CodeBlock {
					lang: code.lang.clone(),
					code: code.value.clone(),
				}
			}
			Node::Blockquote(quote) => Block::BlockQuote(self.blocks(&quote.children)),
			Node::ThematicBreak(_) => Block::ThematicBreak,
			Node::Definition(definition) => {
				let start = start_of(node);
				self.notes.push(ParseNote::DefinitionResolved {
					label: definition
						.label
						.clone()
						.unwrap_or_else(|| definition.identifier.clone()),
					line: start.line,
					column: start.column,
				});
				return None;
			}
			Node::Html(_) => {
				self.flattened("raw html", node);
				Block::Paragraph(vec![Inline::Text(self.raw(node).trim_end().to_string())])
			}
			other => {
				self.flattened(construct_name(other), other);
				Block::Paragraph(vec![Inline::Text(self.raw(other).trim_end().to_string())])
			}
		};

		Some(block)
	}

	fn list(&mut self, list: &mdast::List) -> List {
		let mut tight = !list.spread;
		let mut items = Vec::with_capacity(list.children.len());

		for child in &list.children {
			let Node::ListItem(item) = child else {
				continue;
			};
			tight &= !item.spread;
			items.push(ListItem {
				checked: item.checked,
				blocks: self.blocks(&item.children),
			});
		}

		List {
			ordered: list.ordered,
			start: list.start.unwrap_or(1),
			tight,
			items,
		}
	}

	fn inlines(&mut self, nodes: &[Node]) -> Vec<Inline> {
		let mut inlines: Vec<Inline> = Vec::with_capacity(nodes.len());

		for node in nodes {
			let inline = self.inline(node);
			// Keep adjacent text runs merged so renderers see one node.
			if let (Some(Inline::Text(previous)), Inline::Text(next)) = (inlines.last_mut(), &inline) {
				previous.push_str(next);
				continue;
			}
			inlines.push(inline);
		}

		inlines
	}

	fn inline(&mut self, node: &Node) -> Inline {
		match node {
			Node::Text(text) => Inline::Text(text.value.clone()),
			Node::Emphasis(emphasis) => Inline::Emphasis(self.inlines(&emphasis.children)),
			Node::Strong(strong) => Inline::Strong(self.inlines(&strong.children)),
			Node::Delete(delete) => Inline::Strikethrough(self.inlines(&delete.children)),
			Node::InlineCode(code) => Inline::Code(code.value.clone()),
			Node::Break(_) => Inline::LineBreak,
			Node::Link(link) => {
				Inline::Link {
					url: link.url.clone(),
					title: link.title.clone(),
					content: self.inlines(&link.children),
				}
			}
			Node::Image(image) => {
				Inline::Image {
					url: image.url.clone(),
					title: image.title.clone(),
					alt: image.alt.clone(),
				}
			}
			Node::LinkReference(reference) => {
				match self.definitions.get(&reference.identifier).cloned() {
					Some((url, title)) => {
						Inline::Link {
							url,
							title,
							content: self.inlines(&reference.children),
						}
					}
					None => self.unresolved(node, &reference.identifier),
				}
			}
			Node::ImageReference(reference) => {
				match self.definitions.get(&reference.identifier).cloned() {
					Some((url, title)) => {
						Inline::Image {
							url,
							title,
							alt: reference.alt.clone(),
						}
					}
					None => self.unresolved(node, &reference.identifier),
				}
			}
			Node::Html(html) => {
				self.flattened("inline html", node);
				Inline::Text(html.value.clone())
			}
			other => {
				self.flattened(construct_name(other), other);
				Inline::Text(self.raw(other).to_string())
			}
		}
	}

	fn unresolved(&mut self, node: &Node, label: &str) -> Inline {
		let start = start_of(node);
		self.notes.push(ParseNote::UnresolvedReference {
			label: label.to_string(),
			line: start.line,
			column: start.column,
		});
		Inline::Text(self.raw(node).to_string())
	}

	fn flattened(&mut self, construct: &'static str, node: &Node) {
		let start = start_of(node);
		self.notes.push(ParseNote::Flattened {
			construct,
			line: start.line,
			column: start.column,
		});
	}

	/// The exact source text of `node`, falling back to its textual content
	/// when the node carries no position.
	fn raw(&self, node: &Node) -> std::borrow::Cow<'_, str> {
		node.position()
			.and_then(|position| self.source.get(position.start.offset..position.end.offset))
			.map_or_else(|| node.to_string().into(), Into::into)
	}
}

fn start_of(node: &Node) -> Point {
	node.position().map_or_else(Point::default, |position| {
		Point::new(
			position.start.line,
			position.start.column,
			position.start.offset,
		)
	})
}

fn construct_name(node: &Node) -> &'static str {
	match node {
		Node::Table(_) | Node::TableRow(_) | Node::TableCell(_) => "table",
		Node::FootnoteDefinition(_) => "footnote definition",
		Node::FootnoteReference(_) => "footnote reference",
		Node::Math(_) | Node::InlineMath(_) => "math",
		Node::Yaml(_) | Node::Toml(_) => "frontmatter",
		_ => "unsupported construct",
	}
}
