//! Ariadne-based diagnostic rendering for type errors.
//!
//! Output is colorless so it is stable in tests and logs. Each error gets
//! a code, a single label on the offending node and, where there is an
//! obvious fix, a help line.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use crate::error::{ConstraintReason, TypeError};
use crate::ty::Type;

// ── Error Codes ────────────────────────────────────────────────────────

/// A stable code per error kind, shown as `[E0001]` in rendered output.
pub fn error_code(err: &TypeError) -> &'static str {
    match err {
        TypeError::UnresolvedCall { .. } => "E0001",
        TypeError::TypeConstraintMismatch { .. } => "E0002",
        TypeError::ConstraintConflict { .. } => "E0003",
        TypeError::IncompatibleTypes { .. } => "E0004",
        TypeError::LambdaArgumentExpected { .. } => "E0005",
        TypeError::AmbiguousCall { .. } => "E0006",
        TypeError::InfiniteType { .. } => "E0007",
        TypeError::IncompleteLambda { .. } => "E0008",
    }
}

// ── Labels and Help ────────────────────────────────────────────────────

fn label_message(err: &TypeError) -> String {
    match err {
        TypeError::UnresolvedCall { name, .. } => format!("no overload of `{name}` fits here"),
        TypeError::TypeConstraintMismatch { ty, .. } => format!("this has type `{ty}`"),
        TypeError::ConstraintConflict { what, .. } => format!("{what} requirements disagree here"),
        TypeError::IncompatibleTypes { found, .. } => format!("found `{found}`"),
        TypeError::LambdaArgumentExpected { .. } => "expected `param => body`".to_string(),
        TypeError::AmbiguousCall { .. } => "ambiguous call".to_string(),
        TypeError::InfiniteType { .. } => "recursive type".to_string(),
        TypeError::IncompleteLambda { .. } => "lambda used outside a typed context".to_string(),
    }
}

fn help(err: &TypeError) -> Option<String> {
    match err {
        TypeError::UnresolvedCall { .. } => {
            Some("check the function name and the types of its arguments".to_string())
        }
        TypeError::TypeConstraintMismatch {
            ty,
            reason: ConstraintReason::Nullable { expected: true },
            ..
        } if ty.is_value_type() => Some(format!(
            "`{ty}` cannot be null; declare it as `{}` to allow null",
            Type::nullable(ty.clone())
        )),
        TypeError::IncompatibleTypes {
            expected, found, ..
        } if found.is_numeric() && expected.is_numeric() => {
            Some("numeric types do not convert implicitly".to_string())
        }
        TypeError::AmbiguousCall { .. } => {
            Some("register fewer overlapping resolvers or use the first-match policy".to_string())
        }
        _ => None,
    }
}

// ── Rendering ──────────────────────────────────────────────────────────

/// Render a type error against the query text it came from.
pub fn render_diagnostic(error: &TypeError, source: &str) -> String {
    let config = Config::default().with_color(false);
    let source_len = source.len();

    // Clamp to the source and keep at least one character underlined.
    let clamp = |r: Range<usize>| -> Range<usize> {
        let s = r.start.min(source_len.saturating_sub(1));
        let e = r.end.clamp(s + 1, source_len.max(s + 1));
        s..e
    };
    let span = clamp(error.span().to_range());

    let mut builder = Report::build(ReportKind::Error, span.clone())
        .with_code(error_code(error))
        .with_message(error.to_string())
        .with_config(config)
        .with_label(
            Label::new(span)
                .with_message(label_message(error))
                .with_color(Color::Red),
        );
    if let Some(help) = help(error) {
        builder = builder.with_help(help);
    }

    let mut buf = Vec::new();
    match builder.finish().write(Source::from(source), &mut buf) {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => format!("error[{}]: {error}", error_code(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_common::span::Span;
    use std::sync::Arc;

    #[test]
    fn codes_and_messages_appear_in_output() {
        let source = "o => frobnicate(o.num)";
        let err = TypeError::UnresolvedCall {
            name: Arc::from("frobnicate"),
            args: "int".to_string(),
            span: Span::new(5, 22),
        };
        let out = render_diagnostic(&err, source);
        assert!(out.contains("[E0001]"), "{out}");
        assert!(out.contains("no function matches `frobnicate(int)`"), "{out}");
        assert!(out.contains("no overload of `frobnicate` fits here"), "{out}");
        assert!(out.contains("check the function name"), "{out}");
    }

    #[test]
    fn nullable_mismatch_suggests_a_nullable_declaration() {
        let err = TypeError::TypeConstraintMismatch {
            ty: Type::Int32,
            reason: ConstraintReason::Nullable { expected: true },
            span: Span::new(5, 10),
        };
        let out = render_diagnostic(&err, "o => o.num = null");
        assert!(out.contains("type `int` is not nullable"), "{out}");
        assert!(out.contains("declare it as `int?`"), "{out}");
    }

    #[test]
    fn spans_past_the_end_are_clamped() {
        let err = TypeError::InfiniteType { span: Span::new(40, 50) };
        let out = render_diagnostic(&err, "o => o");
        assert!(out.contains("[E0007]"), "{out}");
    }
}
