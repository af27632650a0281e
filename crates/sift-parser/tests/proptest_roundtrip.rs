//! Property tests for the canonical form and alpha-equivalence.
//!
//! Trees are generated directly rather than as text, so every shape the
//! parser can produce is covered, including nested lambdas, shadowing and
//! constants full of quotes and backslashes.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use proptest::prelude::*;
use sift_parser::{parse, BinaryOp, Node, Symbol};

#[derive(Debug, Clone)]
enum Shape {
    Number(String),
    Text(String),
    Null,
    Bool(bool),
    Param(usize),
    Member(Box<Shape>, String),
    Binary(Box<Shape>, BinaryOp, Box<Shape>),
    Call(String, Vec<Shape>),
    Lambda(String, Box<Shape>),
}

fn ident() -> impl Strategy<Value = String> {
    "[a-z_][a-zA-Z0-9_]{0,5}"
        .prop_filter("keyword", |s| !matches!(s.as_str(), "null" | "true" | "false"))
}

fn op() -> impl Strategy<Value = BinaryOp> {
    prop::sample::select(vec![
        BinaryOp::Equal,
        BinaryOp::NotEqual,
        BinaryOp::LessThan,
        BinaryOp::LessOrEqual,
        BinaryOp::GreaterThan,
        BinaryOp::GreaterOrEqual,
        BinaryOp::OrElse,
        BinaryOp::AndAlso,
        BinaryOp::Add,
        BinaryOp::Subtract,
        BinaryOp::Multiply,
        BinaryOp::Divide,
        BinaryOp::Modulo,
    ])
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        "[0-9]{1,4}(\\.[0-9]{1,3})?".prop_map(Shape::Number),
        "[ -~\t\n]{0,8}".prop_map(Shape::Text),
        Just(Shape::Null),
        any::<bool>().prop_map(Shape::Bool),
        any::<usize>().prop_map(Shape::Param),
    ];
    leaf.prop_recursive(5, 48, 3, |inner| {
        prop_oneof![
            (inner.clone(), ident()).prop_map(|(i, n)| Shape::Member(Box::new(i), n)),
            (inner.clone(), op(), inner.clone())
                .prop_map(|(l, op, r)| Shape::Binary(Box::new(l), op, Box::new(r))),
            (ident(), prop::collection::vec(inner.clone(), 0..3))
                .prop_map(|(n, args)| Shape::Call(n, args)),
            (ident(), inner).prop_map(|(n, body)| Shape::Lambda(n, Box::new(body))),
        ]
    })
}

/// Build a tree, appending `suffix` to every binder name. References only
/// pick binders that are not shadowed, as the parser would.
fn build(shape: &Shape, scope: &mut Vec<Symbol>, suffix: &str) -> Node {
    match shape {
        Shape::Number(text) | Shape::Text(text) => Node::constant(text),
        Shape::Null => Node::null(),
        Shape::Bool(b) => Node::constant(if *b { "true" } else { "false" }),
        Shape::Param(i) => {
            let visible: Vec<&Symbol> = scope
                .iter()
                .enumerate()
                .filter(|(at, s)| !scope[at + 1..].iter().any(|later| later.name() == s.name()))
                .map(|(_, s)| s)
                .collect();
            Node::identifier(visible[i % visible.len()])
        }
        Shape::Member(instance, name) => Node::member(build(instance, scope, suffix), name),
        Shape::Binary(l, op, r) => {
            let left = build(l, scope, suffix);
            let right = build(r, scope, suffix);
            Node::binary(left, *op, right)
        }
        Shape::Call(name, args) => {
            let args = args.iter().map(|a| build(a, scope, suffix)).collect();
            Node::call(name, args)
        }
        Shape::Lambda(name, body) => {
            let symbol = Symbol::fresh(&format!("{name}{suffix}"));
            scope.push(symbol.clone());
            let body = build(body, scope, suffix);
            scope.pop();
            Node::lambda(symbol, body)
        }
    }
}

fn query(body: &Shape, suffix: &str) -> Node {
    build(&Shape::Lambda("o".to_string(), Box::new(body.clone())), &mut Vec::new(), suffix)
}

fn hash_of(node: &Node) -> u64 {
    let mut hasher = DefaultHasher::new();
    node.hash(&mut hasher);
    hasher.finish()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// reparse(stringify(ast)) is alpha-equal to ast.
    #[test]
    fn canonical_form_round_trips(body in shape()) {
        let node = query(&body, "");
        let text = node.to_string();
        let reparsed = parse(&text).map_err(|e| TestCaseError::fail(format!("{text}: {e}")))?;
        prop_assert_eq!(&reparsed, &node, "{}", text);
        prop_assert_eq!(reparsed.to_string(), text);
    }

    /// Consistent renaming of every binder preserves equality and hash.
    #[test]
    fn renaming_binders_preserves_identity(body in shape()) {
        let plain = query(&body, "");
        let renamed = query(&body, "_r");
        prop_assert_eq!(&plain, &renamed);
        prop_assert_eq!(hash_of(&plain), hash_of(&renamed));
    }

    /// Parsing the same text twice yields equal trees despite fresh symbols.
    #[test]
    fn parsing_is_deterministic(body in shape()) {
        let text = query(&body, "").to_string();
        let a = parse(&text).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let b = parse(&text).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(hash_of(&a), hash_of(&b));
        prop_assert_eq!(a, b);
    }
}
