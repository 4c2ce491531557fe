use minijinja::Environment;
use minijinja::UndefinedBehavior;
use minijinja::Value;

use crate::GmdError;
use crate::GmdResult;
use crate::Point;
use crate::RenderContext;
use crate::lexer::Segment;
use crate::lexer::scan;

/// Evaluates `${...}` expressions embedded in GMD text.
///
/// Expressions use the minijinja expression language with strict undefined
/// handling, so every name must resolve against the [`RenderContext`]. The
/// environment has no loader and no custom functions: an expression can read
/// the context and transform values, nothing else.
pub struct Evaluator {
	env: Environment<'static>,
}

impl std::fmt::Debug for Evaluator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Evaluator").finish_non_exhaustive()
	}
}

impl Default for Evaluator {
	fn default() -> Self {
		Self::new()
	}
}

impl Evaluator {
	pub fn new() -> Self {
		let mut env = Environment::new();
		env.set_undefined_behavior(UndefinedBehavior::Strict);
		Self { env }
	}

	/// Replace every expression in `raw` with its evaluated text. The first
	/// expression that fails aborts the evaluation; no partial output is
	/// returned.
	pub fn evaluate(&self, raw: &str, context: &RenderContext) -> GmdResult<String> {
		let segments = scan(raw)?;
		let ctx = Value::from_serialize(context.values());
		let mut output = String::with_capacity(raw.len());

		for segment in segments {
			match segment {
				Segment::Literal(text) => output.push_str(text),
				Segment::Expression { source, start, .. } => {
					let value = self.evaluate_expression(source, start, &ctx)?;
					output.push_str(&value);
				}
			}
		}

		Ok(output)
	}

	fn evaluate_expression(&self, source: &str, start: Point, ctx: &Value) -> GmdResult<String> {
		let fail = |reason: String| {
			GmdError::Evaluation {
				expression: source.to_string(),
				line: start.line,
				column: start.column,
				reason,
			}
		};

		if source.trim().is_empty() {
			return Err(fail("empty expression".to_string()));
		}

		let expression = self
			.env
			.compile_expression(source)
			.map_err(|e| fail(e.to_string()))?;
		let value = expression.eval(ctx).map_err(|e| fail(e.to_string()))?;

		if value.is_undefined() {
			return Err(fail(format!(
				"`{}` is not defined in the rendering context",
				source.trim()
			)));
		}

		Ok(value.to_string())
	}
}

/// Evaluate `raw` against `context` with a fresh [`Evaluator`].
pub fn evaluate(raw: &str, context: &RenderContext) -> GmdResult<String> {
	Evaluator::new().evaluate(raw, context)
}
