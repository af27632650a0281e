//! Parser integration tests.
//!
//! Tree shapes are snapshotted as s-expressions so precedence and
//! associativity are visible at a glance; canonical strings are snapshotted
//! as printed.

use insta::assert_snapshot;
use sift_common::span::Span;
use sift_common::token::TokenKind;
use sift_parser::{parse, parse_lambda, parse_with, Node, NodeKind, ParseError, ParseOptions};

fn sexpr(node: &Node) -> String {
    match &node.kind {
        NodeKind::Binary { left, op, right } => {
            format!("({op} {} {})", sexpr(left), sexpr(right))
        }
        NodeKind::Call { name, args } => {
            let mut out = format!("(call {name}");
            for arg in args {
                out.push(' ');
                out.push_str(&sexpr(arg));
            }
            out.push(')');
            out
        }
        NodeKind::Constant { raw: Some(raw) } => format!("{raw:?}"),
        NodeKind::Constant { raw: None } => "null".to_string(),
        NodeKind::Identifier { symbol } => symbol.name().to_string(),
        NodeKind::Lambda { param, body } => {
            format!("(=> {} {})", param.symbol.name(), sexpr(body))
        }
        NodeKind::Member { instance, name } => format!("(. {} {name})", sexpr(instance)),
    }
}

fn tree(source: &str) -> String {
    match parse(source) {
        Ok(node) => sexpr(&node),
        Err(err) => format!("error: {err}"),
    }
}

fn canonical(source: &str) -> String {
    match parse(source) {
        Ok(node) => node.to_string(),
        Err(err) => format!("error: {err}"),
    }
}

// ── Precedence ─────────────────────────────────────────────────────────

#[test]
fn precedence_ladder() {
    assert_snapshot!(
        tree("o => o.a + o.b * 2 > 3 && o.c || o.d"),
        @r#"(=> o (|| (&& (> (+ (. o a) (* (. o b) "2")) "3") (. o c)) (. o d)))"#
    );
}

#[test]
fn additive_is_left_associative() {
    assert_snapshot!(
        tree("o => o.a - o.b - o.c"),
        @"(=> o (- (- (. o a) (. o b)) (. o c)))"
    );
}

#[test]
fn parentheses_group() {
    assert_snapshot!(
        tree("o => o.a * (o.b + 1)"),
        @r#"(=> o (* (. o a) (+ (. o b) "1")))"#
    );
}

#[test]
fn member_chains_bind_tightest() {
    assert_snapshot!(tree("o => o.a.b.c % 2"), @r#"(=> o (% (. (. (. o a) b) c) "2"))"#);
}

#[test]
fn calls_with_lambda_arguments() {
    assert_snapshot!(
        tree("o => any(o.items, x => x.n = o.n)"),
        @"(=> o (call any (. o items) (=> x (= (. x n) (. o n)))))"
    );
}

#[test]
fn empty_argument_list() {
    assert_snapshot!(tree("o => now()"), @"(=> o (call now))");
}

#[test]
fn literal_keywords() {
    assert_snapshot!(
        tree("o => o.flag = true || o.value != null"),
        @r#"(=> o (|| (= (. o flag) "true") (!= (. o value) null)))"#
    );
}

#[test]
fn string_and_decimal_constants() {
    assert_snapshot!(
        tree(r#"o => o.name = "a\"b" && o.ratio >= 0.25"#),
        @r#"(=> o (&& (= (. o name) "a\"b") (>= (. o ratio) "0.25")))"#
    );
}

// ── Canonical form ─────────────────────────────────────────────────────

#[test]
fn canonical_spacing_and_parentheses() {
    assert_snapshot!(canonical("o=>o.num+1>2"), @"o => (o.num + 1) > 2");
    assert_snapshot!(
        canonical("o => includes(array(1,2,3), o.id)"),
        @"o => includes(array(1, 2, 3), o.id)"
    );
    assert_snapshot!(canonical("o => (o.a + o.b).c"), @"o => (o.a + o.b).c");
    assert_snapshot!(canonical("o => ((o.a))"), @"o => o.a");
}

#[test]
fn canonical_constants() {
    assert_snapshot!(canonical(r#"o => o.s = """#), @r#"o => o.s = """#);
    assert_snapshot!(canonical(r#"o => o.s = "a\"b""#), @r#"o => o.s = "a\"b""#);
    assert_snapshot!(canonical(r#"o => o.s = "\\""#), @r#"o => o.s = "\\""#);
    assert_snapshot!(canonical("o => o.v = null"), @"o => o.v = null");
    assert_snapshot!(canonical("o => o.b = false"), @r#"o => o.b = "false""#);
}

#[test]
fn escaped_constant_reparses_equal() {
    let first = parse(r#"o => o.s = "a\"b""#).unwrap();
    let second = parse(&first.to_string()).unwrap();
    assert_eq!(first, second);
}

// ── Binding ────────────────────────────────────────────────────────────

#[test]
fn identifiers_share_their_binder_symbol() {
    let node = parse("x => y => x").unwrap();
    let NodeKind::Lambda { param: outer, body } = &node.kind else {
        panic!("expected lambda");
    };
    let NodeKind::Lambda { body: inner_body, .. } = &body.kind else {
        panic!("expected inner lambda");
    };
    let NodeKind::Identifier { symbol } = &inner_body.kind else {
        panic!("expected identifier");
    };
    assert_eq!(symbol, &outer.symbol);
}

#[test]
fn inner_parameter_shadows_outer() {
    let node = parse("o => any(o.items, o => o.n)").unwrap();
    let NodeKind::Lambda { param: outer, body } = &node.kind else {
        panic!("expected lambda");
    };
    let NodeKind::Call { args, .. } = &body.kind else {
        panic!("expected call");
    };
    let NodeKind::Lambda { param: inner, body } = &args[1].kind else {
        panic!("expected lambda argument");
    };
    let NodeKind::Member { instance, .. } = &body.kind else {
        panic!("expected member");
    };
    let NodeKind::Identifier { symbol } = &instance.kind else {
        panic!("expected identifier");
    };
    assert_eq!(symbol, &inner.symbol);
    assert_ne!(symbol, &outer.symbol);
}

#[test]
fn bound_name_beats_keyword() {
    assert_snapshot!(tree("true => true"), @"(=> true true)");
}

#[test]
fn parameter_scope_ends_with_lambda_body() {
    let err = parse("o => any(o.items, x => x.n) && x.m").unwrap_err();
    assert_eq!(
        err,
        ParseError::UnboundIdentifier {
            name: "x".to_string(),
            span: Span::new(31, 32),
        }
    );
}

// ── Equality ───────────────────────────────────────────────────────────

#[test]
fn alpha_equivalent_queries() {
    let a = parse("o => o.num > 2").unwrap();
    let b = parse("x => x.num > 2").unwrap();
    let c = parse("o => o.num > 3").unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);

    use std::hash::{Hash, Hasher};
    let hash = |n: &Node| {
        let mut h = std::collections::hash_map::DefaultHasher::new();
        n.hash(&mut h);
        h.finish()
    };
    assert_eq!(hash(&a), hash(&b));
}

#[test]
fn member_case_is_ignored() {
    assert_eq!(parse("o => o.Num").unwrap(), parse("o => o.num").unwrap());
    assert_eq!(
        parse("o => LENGTH(o.s)").unwrap(),
        parse("o => length(o.s)").unwrap()
    );
}

// ── Spans ──────────────────────────────────────────────────────────────

#[test]
fn spans_cover_source() {
    let node = parse("o => o.num > 2").unwrap();
    assert_eq!(node.span, Span::new(0, 14));
    let NodeKind::Lambda { param, body } = &node.kind else {
        panic!("expected lambda");
    };
    assert_eq!(param.span, Span::new(0, 1));
    assert_eq!(body.span, Span::new(5, 14));
}

// ── Errors ─────────────────────────────────────────────────────────────

#[test]
fn missing_operand() {
    assert_snapshot!(tree("o => o.num >"), @"error: expected an expression, found end of input");
}

#[test]
fn trailing_tokens() {
    assert_snapshot!(tree("o => o.num 2"), @"error: expected end of input, found number");
}

#[test]
fn unclosed_call() {
    assert_snapshot!(tree("o => f(1,"), @"error: expected an expression, found end of input");
    assert_snapshot!(tree("o => f(1"), @"error: expected `)`, found end of input");
}

#[test]
fn member_needs_a_name() {
    assert_snapshot!(tree("o => o.(x)"), @"error: expected identifier, found `(`");
}

#[test]
fn unbound_identifier() {
    assert_snapshot!(tree("o => p.num"), @"error: unbound identifier `p`");
}

#[test]
fn lex_errors_surface() {
    let err = parse(r#"o => "abc"#).unwrap_err();
    assert!(matches!(err, ParseError::Lex(_)));
    assert_eq!(err.span(), Span::at(5));

    let err = parse("o => o.a & o.b").unwrap_err();
    assert!(matches!(err, ParseError::Lex(_)));
}

#[test]
fn query_root_must_be_lambda() {
    let err = parse_lambda("o.num > 2", &ParseOptions::default()).unwrap_err();
    assert!(matches!(err, ParseError::UnboundIdentifier { .. }));

    let err = parse_lambda("1 + 2", &ParseOptions::default()).unwrap_err();
    assert!(matches!(err, ParseError::ExpectedLambda { shape: "binary", .. }));

    assert!(parse_lambda("o => o.num", &ParseOptions::default()).is_ok());
}

#[test]
fn nesting_limit() {
    let shallow = ParseOptions { max_depth: 4 };
    assert!(parse_with("o => o.a", &shallow).is_ok());
    let err = parse_with("o => o.a.b.c.d", &shallow).unwrap_err();
    assert!(matches!(err, ParseError::TooDeep { max_depth: 4, .. }));

    let deep = format!("o => {}o.a{}", "(".repeat(300), ")".repeat(300));
    let err = parse(&deep).unwrap_err();
    assert!(matches!(err, ParseError::TooDeep { max_depth: 256, .. }));
}

#[test]
fn error_kind_is_reported() {
    let err = parse("o => )").unwrap_err();
    assert!(matches!(
        err,
        ParseError::UnexpectedToken {
            found: TokenKind::RParen,
            ..
        }
    ));
}
