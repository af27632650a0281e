//! Human and machine-readable rendering of [`QueryError`]s.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use serde_json::json;
use sift_common::LineIndex;
use sift_typeck::diagnostics::{error_code, render_diagnostic};

use crate::error::{QueryError, QueryErrorKind};

/// Stable error code for any pipeline failure.
pub fn code(err: &QueryError) -> &'static str {
    match &err.kind {
        QueryErrorKind::Parse(_) => "P0001",
        QueryErrorKind::Type(e) => error_code(e),
        QueryErrorKind::Compile(_) => "C0001",
        QueryErrorKind::Eval(_) => "R0001",
    }
}

/// An ariadne report against the query text, without color.
pub fn render(err: &QueryError) -> String {
    let QueryErrorKind::Type(type_error) = &err.kind else {
        return render_plain(err);
    };
    render_diagnostic(type_error, &err.input)
}

fn render_plain(err: &QueryError) -> String {
    let Some(span) = err.span() else {
        return format!("error[{}]: {err}\n", code(err));
    };
    let len = err.input.len();
    let range: Range<usize> = {
        let r = span.to_range();
        let s = r.start.min(len.saturating_sub(1));
        s..r.end.clamp(s + 1, len.max(s + 1))
    };
    let report = Report::build(ReportKind::Error, range.clone())
        .with_code(code(err))
        .with_message(err.to_string())
        .with_config(Config::default().with_color(false))
        .with_label(Label::new(range).with_message("here").with_color(Color::Red))
        .finish();
    let mut buf = Vec::new();
    match report.write(Source::from(err.input.as_str()), &mut buf) {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => format!("error[{}]: {err}\n", code(err)),
    }
}

/// One JSON object per error, for editors and scripts.
pub fn to_json(err: &QueryError) -> serde_json::Value {
    let span = err.span().map(|span| {
        let (line, column) = LineIndex::new(&err.input).line_col(span.start);
        json!({ "start": span.start, "end": span.end, "line": line, "column": column })
    });
    json!({
        "code": code(err),
        "message": err.to_string(),
        "input": err.input,
        "root_type": err.root_type.as_ref().map(ToString::to_string),
        "span": span,
    })
}
