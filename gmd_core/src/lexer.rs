use std::ops::Range;

use logos::Lexer;
use logos::Logos;

use crate::GmdError;
use crate::GmdResult;
use crate::Point;

/// Tokens of the document text surrounding expressions.
#[derive(Logos, Debug, PartialEq)]
enum TextToken {
	#[token("${")]
	ExpressionOpen,
	#[token("\\${")]
	EscapedOpen,
	/// Kept as written, so `\\${` is a backslash pair before an expression.
	#[token("\\\\")]
	BackslashPair,
	#[token("$")]
	Dollar,
	#[token("\\")]
	Backslash,
	#[regex(r"[^$\\]+")]
	Text,
}

/// Tokens inside an expression. Only braces and quoted strings matter: they
/// decide where the expression ends.
#[derive(Logos, Debug, PartialEq)]
enum ExpressionToken {
	#[token("{")]
	BraceOpen,
	#[token("}")]
	BraceClose,
	#[regex(r#""([^"\\]|\\.)*""#)]
	DoubleQuotedString,
	#[regex(r"'([^'\\]|\\.)*'")]
	SingleQuotedString,
	#[regex(r#"[^{}"']+"#)]
	Code,
}

/// A piece of a scanned document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
	/// Literal text copied to the output unchanged.
	Literal(&'a str),
	/// An embedded expression. `source` excludes the `${` and `}` delimiters
	/// and `span` covers the whole `${...}` match.
	Expression {
		source: &'a str,
		span: Range<usize>,
		start: Point,
	},
}

/// Split `source` into literal text and `${...}` expressions in a single
/// forward pass. `\${` produces a literal `${`. A backslash pair is copied
/// unchanged and does not escape a following `${`.
pub fn scan(source: &str) -> GmdResult<Vec<Segment<'_>>> {
	let mut segments = Vec::new();
	// Start of the literal run not yet pushed.
	let mut literal_start = 0;
	let mut lexer = TextToken::lexer(source);

	while let Some(token) = lexer.next() {
		let span = lexer.span();
		match token {
			Ok(TextToken::ExpressionOpen) => {
				push_literal(&mut segments, source, literal_start..span.start);
				let (inner, close) = scan_expression(lexer.morph(), span.start, source)?;
				segments.push(Segment::Expression {
					source: &source[span.end..close],
					span: span.start..close + 1,
					start: Point::locate(source, span.start),
				});
				literal_start = close + 1;
				lexer = inner.morph();
			}
			Ok(TextToken::EscapedOpen) => {
				// Drop the backslash, keep `${` in the next literal run.
				push_literal(&mut segments, source, literal_start..span.start);
				literal_start = span.start + 1;
			}
			Ok(
				TextToken::BackslashPair | TextToken::Dollar | TextToken::Backslash | TextToken::Text,
			)
			| Err(()) => {}
		}
	}

	push_literal(&mut segments, source, literal_start..source.len());
	Ok(segments)
}

/// Walk the expression tokens until the brace matching `${` closes. Returns
/// the lexer positioned after the closing brace together with the byte
/// offset of that brace.
fn scan_expression<'a>(
	mut lexer: Lexer<'a, ExpressionToken>,
	open: usize,
	source: &'a str,
) -> GmdResult<(Lexer<'a, ExpressionToken>, usize)> {
	let mut depth = 0_usize;

	while let Some(token) = lexer.next() {
		match token {
			Ok(ExpressionToken::BraceOpen) => depth += 1,
			Ok(ExpressionToken::BraceClose) => {
				if depth == 0 {
					let close = lexer.span().start;
					return Ok((lexer, close));
				}
				depth -= 1;
			}
			// An unbalanced quote is left for the expression parser to report.
			Ok(
				ExpressionToken::DoubleQuotedString
				| ExpressionToken::SingleQuotedString
				| ExpressionToken::Code,
			)
			| Err(()) => {}
		}
	}

	let start = Point::locate(source, open);
	Err(GmdError::UnterminatedExpression {
		line: start.line,
		column: start.column,
	})
}

fn push_literal<'a>(segments: &mut Vec<Segment<'a>>, source: &'a str, range: Range<usize>) {
	if !range.is_empty() {
		segments.push(Segment::Literal(&source[range]));
	}
}
