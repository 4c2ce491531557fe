use crate::Block;
use crate::BlockSequence;
use crate::Inline;
use crate::List;

/// Serialize a block sequence back to canonical markdown.
///
/// Blocks are separated by one blank line and the output ends with a single
/// newline. Emphasis is always written with `*`, bullets with `-`, and code
/// blocks are fenced. Literal text is backslash-escaped wherever it would
/// otherwise read back as markup, so parsing the output again yields the same
/// blocks.
pub fn render_markdown(blocks: &BlockSequence) -> String {
	let mut output = write_blocks(blocks, "\n\n");
	if !output.is_empty() {
		output.push('\n');
	}
	output
}

fn write_blocks(blocks: &[Block], separator: &str) -> String {
	blocks
		.iter()
		.map(write_block)
		.collect::<Vec<_>>()
		.join(separator)
}

fn write_block(block: &Block) -> String {
	match block {
		Block::Heading { level, content } => {
			let mut text = write_inlines(content);
			// A trailing `#` would be read as a closing sequence.
			if text.ends_with('#') && !text.ends_with("\\#") {
				text.insert(text.len() - 1, '\\');
			}
			format!("{} {text}", "#".repeat(usize::from(*level)))
		}
		Block::Paragraph(content) => write_inlines(content),
		Block::List(list) => write_list(list),
		Block::CodeBlock { lang, code } => {
			let fence = fence_for(code);
			format!(
				"{fence}{}\n{code}\n{fence}",
				lang.as_deref().unwrap_or_default()
			)
		}
		Block::BlockQuote(children) => {
			let inner = write_blocks(children, "\n\n");
			inner
				.lines()
				.map(|line| {
					if line.is_empty() {
						">".to_string()
					} else {
						format!("> {line}")
					}
				})
				.collect::<Vec<_>>()
				.join("\n")
		}
		Block::ThematicBreak => "---".to_string(),
	}
}

fn write_list(list: &List) -> String {
	let separator = if list.tight { "\n" } else { "\n\n" };
	let mut items = Vec::with_capacity(list.items.len());

	for (index, item) in list.items.iter().enumerate() {
		let mut marker = if list.ordered {
			format!("{}. ", list.start as usize + index)
		} else {
			"- ".to_string()
		};
		let indent = " ".repeat(marker.len());

		match item.checked {
			Some(true) => marker.push_str("[x] "),
			Some(false) => marker.push_str("[ ] "),
			None => {}
		}

		let body = write_blocks(&item.blocks, separator);
		if body.is_empty() {
			items.push(marker.trim_end().to_string());
			continue;
		}

		let mut rendered = String::with_capacity(body.len() + marker.len());
		for (line_index, line) in body.lines().enumerate() {
			if line_index == 0 {
				rendered.push_str(&marker);
			} else {
				rendered.push('\n');
				if !line.is_empty() {
					rendered.push_str(&indent);
				}
			}
			rendered.push_str(line);
		}
		items.push(rendered);
	}

	items.join(separator)
}

fn write_inlines(inlines: &[Inline]) -> String {
	let mut output = String::new();
	for inline in inlines {
		write_inline(inline, &mut output);
	}
	output
}

fn write_inline(inline: &Inline, output: &mut String) {
	match inline {
		Inline::Text(text) => {
			let line_start = output.is_empty() || output.ends_with('\n');
			escape_text(text, line_start, output);
		}
		Inline::Emphasis(children) => {
			output.push('*');
			output.push_str(&write_inlines(children));
			output.push('*');
		}
		Inline::Strong(children) => {
			output.push_str("**");
			output.push_str(&write_inlines(children));
			output.push_str("**");
		}
		Inline::Strikethrough(children) => {
			output.push_str("~~");
			output.push_str(&write_inlines(children));
			output.push_str("~~");
		}
		Inline::Code(code) => {
			if code.contains('`') {
				output.push_str("`` ");
				output.push_str(code);
				output.push_str(" ``");
			} else {
				output.push('`');
				output.push_str(code);
				output.push('`');
			}
		}
		Inline::Link {
			url,
			title,
			content,
		} => {
			output.push('[');
			output.push_str(&write_inlines(content));
			output.push_str("](");
			write_destination(url, title.as_deref(), output);
			output.push(')');
		}
		Inline::Image { url, title, alt } => {
			output.push_str("![");
			escape_text(alt, false, output);
			output.push_str("](");
			write_destination(url, title.as_deref(), output);
			output.push(')');
		}
		Inline::LineBreak => output.push_str("\\\n"),
	}
}

/// Append `text` so that it reads back as literal text.
///
/// Inline markup characters are escaped everywhere. Characters that only open
/// a block (headings, quotes, bullets, ordered markers, setext underlines) are
/// escaped when they start a line.
fn escape_text(text: &str, line_start: bool, output: &mut String) {
	let chars: Vec<char> = text.chars().collect();
	let mut at_line_start = line_start;
	let mut index = 0;

	while index < chars.len() {
		if at_line_start {
			if let Some(digits) = ordered_marker(&chars[index..]) {
				output.extend(&chars[index..index + digits]);
				output.push('\\');
				output.push(chars[index + digits]);
				index += digits + 1;
				at_line_start = false;
				continue;
			}
		}

		let ch = chars[index];
		let previous = index.checked_sub(1).map(|i| chars[i]);
		let next = chars.get(index + 1).copied();
		let escape = match ch {
			'\\' | '*' | '`' | '[' | ']' | '<' | '~' => true,
			'_' => {
				!(previous.is_some_and(char::is_alphanumeric)
					&& next.is_some_and(char::is_alphanumeric))
			}
			'!' => next.is_none_or(|next| next == '['),
			'&' => starts_entity(&chars[index + 1..]),
			'#' | '>' | '+' | '-' | '=' => at_line_start,
			_ => false,
		};

		if escape {
			output.push('\\');
		}
		output.push(ch);
		at_line_start = ch == '\n';
		index += 1;
	}
}

/// Length of the digit run when `chars` opens with an ordered list marker.
fn ordered_marker(chars: &[char]) -> Option<usize> {
	let digits = chars.iter().take_while(|ch| ch.is_ascii_digit()).count();
	let delimiter = chars.get(digits)?;
	((1..=9).contains(&digits) && matches!(delimiter, '.' | ')')).then_some(digits)
}

/// Whether `rest` (the text after an `&`) would be decoded as an entity.
fn starts_entity(rest: &[char]) -> bool {
	let body = rest.strip_prefix(&['#']).unwrap_or(rest);
	let name = body.iter().take_while(|ch| ch.is_ascii_alphanumeric()).count();
	name > 0 && body.get(name) == Some(&';')
}

fn write_destination(url: &str, title: Option<&str>, output: &mut String) {
	if url.contains(' ') {
		output.push('<');
		output.push_str(url);
		output.push('>');
	} else {
		output.push_str(url);
	}

	if let Some(title) = title {
		output.push_str(" \"");
		output.push_str(&title.replace('"', "\\\""));
		output.push('"');
	}
}

/// A code fence longer than any backtick run inside `code`.
fn fence_for(code: &str) -> String {
	let mut longest = 0;
	let mut current = 0;
	for ch in code.chars() {
		if ch == '`' {
			current += 1;
			longest = longest.max(current);
		} else {
			current = 0;
		}
	}
	"`".repeat(longest.max(2) + 1)
}
