//! The untyped (and annotatable) query AST.
//!
//! A query is a tree of six node shapes: binary operators, name-based calls,
//! raw constants, identifiers, single-parameter lambdas and member accesses.
//! Nodes are immutable once built; children sit behind `Arc` so clones and
//! re-annotated copies share structure.
//!
//! `Node<A>` carries one annotation per node. The parser produces `Node<()>`;
//! the type checker re-annotates the same shape with inference slots and
//! then with concrete types.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use sift_common::span::Span;

// ── Symbols ────────────────────────────────────────────────────────────

static NEXT_SYMBOL: AtomicU32 = AtomicU32::new(0);

/// A lambda binder.
///
/// Symbols compare by identity, never by name: two parameters both spelled
/// `o` in different lambdas are different symbols, while every reference to
/// one parameter shares that parameter's symbol.
#[derive(Clone)]
pub struct Symbol {
    id: u32,
    name: Arc<str>,
}

impl Symbol {
    /// Allocate a symbol distinct from every other symbol in the process.
    pub fn fresh(name: &str) -> Self {
        Symbol {
            id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
            name: Arc::from(name),
        }
    }

    /// The name the binder was written with.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

// ── Operators ──────────────────────────────────────────────────────────

/// Binary operators, in the order they appear in the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    OrElse,
    AndAlso,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOp {
    /// The operator as written in query text.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Equal => "=",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::OrElse => "||",
            BinaryOp::AndAlso => "&&",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::LessThan
                | BinaryOp::LessOrEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterOrEqual
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::OrElse | BinaryOp::AndAlso)
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Subtract
                | BinaryOp::Multiply
                | BinaryOp::Divide
                | BinaryOp::Modulo
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// ── Nodes ──────────────────────────────────────────────────────────────

/// A query expression node with annotation `A`.
///
/// Equality and hashing (see [`crate::alpha`]) are alpha-equivalence: they
/// ignore spans and annotations, compare member and call names
/// case-insensitively, and allow consistent renaming of lambda parameters.
#[derive(Clone, Debug)]
pub struct Node<A = ()> {
    pub kind: NodeKind<A>,
    pub ann: A,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum NodeKind<A = ()> {
    Binary {
        left: Arc<Node<A>>,
        op: BinaryOp,
        right: Arc<Node<A>>,
    },
    Call {
        name: Arc<str>,
        args: Vec<Node<A>>,
    },
    /// Raw literal text, typed only once inference knows the context.
    /// `None` is the `null` keyword.
    Constant { raw: Option<Arc<str>> },
    Identifier { symbol: Symbol },
    Lambda {
        param: Param<A>,
        body: Arc<Node<A>>,
    },
    Member {
        instance: Arc<Node<A>>,
        name: Arc<str>,
    },
}

/// The bound parameter of a lambda.
#[derive(Clone, Debug)]
pub struct Param<A = ()> {
    pub symbol: Symbol,
    pub ann: A,
    pub span: Span,
}

impl<A> Node<A> {
    pub fn new(kind: NodeKind<A>, ann: A, span: Span) -> Self {
        Node { kind, ann, span }
    }

    /// Short name of the node's shape, for diagnostics and logs.
    pub fn shape(&self) -> &'static str {
        match &self.kind {
            NodeKind::Binary { .. } => "binary",
            NodeKind::Call { .. } => "call",
            NodeKind::Constant { .. } => "constant",
            NodeKind::Identifier { .. } => "identifier",
            NodeKind::Lambda { .. } => "lambda",
            NodeKind::Member { .. } => "member",
        }
    }

    pub fn is_lambda(&self) -> bool {
        matches!(self.kind, NodeKind::Lambda { .. })
    }

    /// Whether this is the `null` constant.
    pub fn is_null(&self) -> bool {
        matches!(self.kind, NodeKind::Constant { raw: None })
    }
}

/// Builders for untyped nodes with empty spans, used by tests and by
/// embedders constructing queries programmatically.
impl Node {
    pub fn binary(left: Node, op: BinaryOp, right: Node) -> Node {
        Node::new(
            NodeKind::Binary {
                left: Arc::new(left),
                op,
                right: Arc::new(right),
            },
            (),
            Span::default(),
        )
    }

    pub fn call(name: &str, args: Vec<Node>) -> Node {
        Node::new(
            NodeKind::Call {
                name: Arc::from(name),
                args,
            },
            (),
            Span::default(),
        )
    }

    pub fn constant(raw: &str) -> Node {
        Node::new(
            NodeKind::Constant {
                raw: Some(Arc::from(raw)),
            },
            (),
            Span::default(),
        )
    }

    pub fn null() -> Node {
        Node::new(NodeKind::Constant { raw: None }, (), Span::default())
    }

    pub fn identifier(symbol: &Symbol) -> Node {
        Node::new(
            NodeKind::Identifier {
                symbol: symbol.clone(),
            },
            (),
            Span::default(),
        )
    }

    pub fn lambda(symbol: Symbol, body: Node) -> Node {
        Node::new(
            NodeKind::Lambda {
                param: Param {
                    symbol,
                    ann: (),
                    span: Span::default(),
                },
                body: Arc::new(body),
            },
            (),
            Span::default(),
        )
    }

    pub fn member(instance: Node, name: &str) -> Node {
        Node::new(
            NodeKind::Member {
                instance: Arc::new(instance),
                name: Arc::from(name),
            },
            (),
            Span::default(),
        )
    }
}

// ── Case-folded names ──────────────────────────────────────────────────

/// Case-insensitive name comparison used for member and call names.
pub fn names_eq(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Hash a name consistently with [`names_eq`].
pub fn hash_name<H: Hasher>(name: &str, state: &mut H) {
    for c in name.chars().flat_map(char::to_lowercase) {
        c.hash(state);
    }
    0xffu8.hash(state);
}
