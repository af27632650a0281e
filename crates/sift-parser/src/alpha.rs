//! Alpha-equivalence for query nodes.
//!
//! Two nodes are equal when they have the same shape, the same operators and
//! constants, case-insensitively equal member and call names, and lambda
//! parameters that can be renamed consistently onto each other. The hash
//! agrees with this: a bound identifier hashes by the distance to its binder,
//! never by the binder's identity or spelling.

use std::hash::{Hash, Hasher};

use crate::ast::{hash_name, names_eq, Node, NodeKind, Symbol};

/// Structural equality under a stack of `(left binder, right binder)` pairs.
fn deep_eq<'a, A, B>(
    a: &'a Node<A>,
    b: &'a Node<B>,
    bindings: &mut Vec<(&'a Symbol, &'a Symbol)>,
) -> bool {
    match (&a.kind, &b.kind) {
        (
            NodeKind::Binary {
                left: l1,
                op: op1,
                right: r1,
            },
            NodeKind::Binary {
                left: l2,
                op: op2,
                right: r2,
            },
        ) => op1 == op2 && deep_eq(l1, l2, bindings) && deep_eq(r1, r2, bindings),
        (NodeKind::Call { name: n1, args: a1 }, NodeKind::Call { name: n2, args: a2 }) => {
            names_eq(n1, n2)
                && a1.len() == a2.len()
                && a1.iter().zip(a2).all(|(x, y)| deep_eq(x, y, bindings))
        }
        (NodeKind::Constant { raw: r1 }, NodeKind::Constant { raw: r2 }) => r1 == r2,
        (NodeKind::Identifier { symbol: s1 }, NodeKind::Identifier { symbol: s2 }) => {
            let left = bindings.iter().rev().find(|(l, _)| *l == s1);
            let right = bindings.iter().rev().find(|(_, r)| *r == s2);
            match (left, right) {
                (Some((_, mapped)), Some((l, _))) => *mapped == s2 && *l == s1,
                // Free on both sides: only the very same symbol matches.
                (None, None) => s1 == s2,
                _ => false,
            }
        }
        (
            NodeKind::Lambda {
                param: p1,
                body: b1,
            },
            NodeKind::Lambda {
                param: p2,
                body: b2,
            },
        ) => {
            bindings.push((&p1.symbol, &p2.symbol));
            let eq = deep_eq(b1, b2, bindings);
            bindings.pop();
            eq
        }
        (
            NodeKind::Member {
                instance: i1,
                name: n1,
            },
            NodeKind::Member {
                instance: i2,
                name: n2,
            },
        ) => names_eq(n1, n2) && deep_eq(i1, i2, bindings),
        _ => false,
    }
}

/// Whether two nodes are alpha-equivalent, regardless of their annotations.
pub fn alpha_eq<A, B>(a: &Node<A>, b: &Node<B>) -> bool {
    deep_eq(a, b, &mut Vec::new())
}

fn hash_node<'a, A, H: Hasher>(node: &'a Node<A>, binders: &mut Vec<&'a Symbol>, state: &mut H) {
    std::mem::discriminant(&node.kind).hash(state);
    match &node.kind {
        NodeKind::Binary { left, op, right } => {
            op.hash(state);
            hash_node(left, binders, state);
            hash_node(right, binders, state);
        }
        NodeKind::Call { name, args } => {
            hash_name(name, state);
            args.len().hash(state);
            for arg in args {
                hash_node(arg, binders, state);
            }
        }
        NodeKind::Constant { raw } => raw.hash(state),
        NodeKind::Identifier { symbol } => {
            match binders.iter().rev().position(|b| *b == symbol) {
                Some(depth) => depth.hash(state),
                None => {
                    usize::MAX.hash(state);
                    symbol.hash(state);
                }
            }
        }
        NodeKind::Lambda { param, body } => {
            binders.push(&param.symbol);
            hash_node(body, binders, state);
            binders.pop();
        }
        NodeKind::Member { instance, name } => {
            hash_name(name, state);
            hash_node(instance, binders, state);
        }
    }
}

impl<A> PartialEq for Node<A> {
    fn eq(&self, other: &Self) -> bool {
        alpha_eq(self, other)
    }
}

impl<A> Eq for Node<A> {}

impl<A> Hash for Node<A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_node(self, &mut Vec::new(), state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOp;
    use rustc_hash::FxHasher;

    fn fx_hash(node: &Node) -> u64 {
        let mut hasher = FxHasher::default();
        node.hash(&mut hasher);
        hasher.finish()
    }

    fn num_gt(param: &str, bound: &str) -> Node {
        let o = Symbol::fresh(param);
        Node::lambda(
            o.clone(),
            Node::binary(
                Node::member(Node::identifier(&o), "num"),
                BinaryOp::GreaterThan,
                Node::constant(bound),
            ),
        )
    }

    #[test]
    fn renamed_parameters_are_equal_with_equal_hash() {
        let a = num_gt("o", "2");
        let b = num_gt("x", "2");
        assert_eq!(a, b);
        assert_eq!(fx_hash(&a), fx_hash(&b));
    }

    #[test]
    fn different_constants_differ() {
        assert_ne!(num_gt("o", "2"), num_gt("o", "3"));
    }

    #[test]
    fn member_names_compare_case_insensitively() {
        let o = Symbol::fresh("o");
        let a = Node::lambda(o.clone(), Node::member(Node::identifier(&o), "Num"));
        let b = Node::lambda(o.clone(), Node::member(Node::identifier(&o), "num"));
        assert_eq!(a, b);
        assert_eq!(fx_hash(&a), fx_hash(&b));
    }

    #[test]
    fn binder_position_matters() {
        // x => y => x   vs   x => y => y
        let (x1, y1) = (Symbol::fresh("x"), Symbol::fresh("y"));
        let outer = Node::lambda(x1.clone(), Node::lambda(y1, Node::identifier(&x1)));
        let (x2, y2) = (Symbol::fresh("x"), Symbol::fresh("y"));
        let inner = Node::lambda(x2, Node::lambda(y2.clone(), Node::identifier(&y2)));
        assert_ne!(outer, inner);
        assert_ne!(fx_hash(&outer), fx_hash(&inner));
    }

    #[test]
    fn free_identifiers_compare_by_identity() {
        let a = Symbol::fresh("a");
        let b = Symbol::fresh("a");
        assert_eq!(Node::identifier(&a), Node::identifier(&a));
        assert_ne!(Node::identifier(&a), Node::identifier(&b));
    }

    #[test]
    fn null_differs_from_the_text_null() {
        assert_ne!(Node::null(), Node::constant("null"));
    }
}
