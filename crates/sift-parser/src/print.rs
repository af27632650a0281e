//! Canonical string form of a query.
//!
//! The canonical form is the wire format: it is what gets logged, cached and
//! sent between processes, and parsing it yields an alpha-equal tree.
//!
//! Output is produced in two passes over the tree, [`measure`] and [`emit`].
//! The first computes the exact byte length so the second writes into a
//! buffer that never reallocates. The two functions mirror each other arm by
//! arm; any change to one must be made to the other.
//!
//! A binary or lambda expression is parenthesized when it is nested, that is
//! when it is an operand of a binary operator or the instance of a member
//! access. Call arguments and lambda bodies are never nested.

use std::fmt;

use crate::ast::{Node, NodeKind};

/// Render `node` in canonical form.
pub fn to_canonical_string<A>(node: &Node<A>) -> String {
    let size = measure(node, false);
    let mut out = String::with_capacity(size);
    emit(node, false, &mut out);
    debug_assert_eq!(out.len(), size, "measure and emit disagree");
    out
}

impl<A> fmt::Display for Node<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_canonical_string(self))
    }
}

fn wraps<A>(node: &Node<A>, nested: bool) -> bool {
    nested && matches!(node.kind, NodeKind::Binary { .. } | NodeKind::Lambda { .. })
}

// ── Pass 1: size ───────────────────────────────────────────────────────

fn measure<A>(node: &Node<A>, nested: bool) -> usize {
    let inner = match &node.kind {
        NodeKind::Binary { left, op, right } => {
            measure(left, true) + 1 + op.symbol().len() + 1 + measure(right, true)
        }
        NodeKind::Call { name, args } => {
            let separators = args.len().saturating_sub(1) * 2;
            name.len() + 1 + args.iter().map(|a| measure(a, false)).sum::<usize>() + separators + 1
        }
        NodeKind::Constant { raw } => measure_constant(raw.as_deref()),
        NodeKind::Identifier { symbol } => symbol.name().len(),
        NodeKind::Lambda { param, body } => param.symbol.name().len() + 4 + measure(body, false),
        NodeKind::Member { instance, name } => measure(instance, true) + 1 + name.len(),
    };
    if wraps(node, nested) {
        inner + 2
    } else {
        inner
    }
}

fn measure_constant(raw: Option<&str>) -> usize {
    match raw {
        None => 4,
        Some(text) if is_numeric_literal(text) => text.len(),
        Some(text) => {
            let escapes = text.bytes().filter(|b| matches!(b, b'\\' | b'"')).count();
            text.len() + escapes + 2
        }
    }
}

// ── Pass 2: emit ───────────────────────────────────────────────────────

fn emit<A>(node: &Node<A>, nested: bool, out: &mut String) {
    let wrap = wraps(node, nested);
    if wrap {
        out.push('(');
    }
    match &node.kind {
        NodeKind::Binary { left, op, right } => {
            emit(left, true, out);
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            emit(right, true, out);
        }
        NodeKind::Call { name, args } => {
            out.push_str(name);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                emit(arg, false, out);
            }
            out.push(')');
        }
        NodeKind::Constant { raw } => emit_constant(raw.as_deref(), out),
        NodeKind::Identifier { symbol } => out.push_str(symbol.name()),
        NodeKind::Lambda { param, body } => {
            out.push_str(param.symbol.name());
            out.push_str(" => ");
            emit(body, false, out);
        }
        NodeKind::Member { instance, name } => {
            emit(instance, true, out);
            out.push('.');
            out.push_str(name);
        }
    }
    if wrap {
        out.push(')');
    }
}

fn emit_constant(raw: Option<&str>, out: &mut String) {
    match raw {
        None => out.push_str("null"),
        Some(text) if is_numeric_literal(text) => out.push_str(text),
        Some(text) => {
            out.push('"');
            for c in text.chars() {
                if c == '\\' || c == '"' {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push('"');
        }
    }
}

/// Whether `text` lexes as a single number token: a digit run with an
/// optional single fraction.
pub fn is_numeric_literal(text: &str) -> bool {
    let (int, frac) = match text.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (text, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(int) && frac.map_or(true, digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Symbol};

    #[test]
    fn numeric_literal_shapes() {
        assert!(is_numeric_literal("12"));
        assert!(is_numeric_literal("1.25"));
        assert!(!is_numeric_literal("1."));
        assert!(!is_numeric_literal(".5"));
        assert!(!is_numeric_literal("-1"));
        assert!(!is_numeric_literal("1e5"));
        assert!(!is_numeric_literal(""));
    }

    #[test]
    fn constants_are_quoted_unless_numeric() {
        assert_eq!(Node::constant("42").to_string(), "42");
        assert_eq!(Node::constant("abc").to_string(), "\"abc\"");
        assert_eq!(Node::constant("").to_string(), "\"\"");
        assert_eq!(Node::constant("a\"b").to_string(), r#""a\"b""#);
        assert_eq!(Node::constant(r"a\b").to_string(), r#""a\\b""#);
        assert_eq!(Node::null().to_string(), "null");
    }

    #[test]
    fn nested_binaries_are_parenthesized() {
        let o = Symbol::fresh("o");
        let num = || Node::member(Node::identifier(&o), "num");
        let sum = Node::binary(num(), BinaryOp::Add, Node::constant("1"));
        let cmp = Node::binary(sum, BinaryOp::GreaterThan, Node::constant("2"));
        let query = Node::lambda(o.clone(), cmp);
        assert_eq!(query.to_string(), "o => (o.num + 1) > 2");
    }

    #[test]
    fn call_arguments_and_lambda_bodies_stay_bare() {
        let o = Symbol::fresh("o");
        let x = Symbol::fresh("x");
        let pred = Node::lambda(
            x.clone(),
            Node::binary(
                Node::member(Node::identifier(&x), "n"),
                BinaryOp::Equal,
                Node::constant("1"),
            ),
        );
        let call = Node::call("any", vec![Node::member(Node::identifier(&o), "items"), pred]);
        let query = Node::lambda(o, call);
        assert_eq!(query.to_string(), "o => any(o.items, x => x.n = 1)");
    }

    #[test]
    fn binary_member_instance_is_parenthesized() {
        let o = Symbol::fresh("o");
        let sum = Node::binary(
            Node::member(Node::identifier(&o), "a"),
            BinaryOp::Add,
            Node::member(Node::identifier(&o), "b"),
        );
        let query = Node::lambda(o, Node::member(sum, "c"));
        assert_eq!(query.to_string(), "o => (o.a + o.b).c");
    }

    #[test]
    fn measure_matches_emit_for_multibyte_text() {
        let node = Node::constant("caf\u{e9} \"ol\u{e9}\"");
        let text = to_canonical_string(&node);
        assert_eq!(text.len(), measure(&node, false));
    }
}
