//! The typed AST produced by inference.

use std::sync::Arc;

use sift_parser::ast::{Node, NodeKind};

use crate::functions::FunctionDescriptor;
use crate::ty::Type;

/// Per-node result of inference.
#[derive(Clone, Debug)]
pub struct TypeInfo {
    pub ty: Type,
    /// The resolved function, on `Call` nodes only.
    pub function: Option<Arc<FunctionDescriptor>>,
}

impl TypeInfo {
    pub fn new(ty: Type) -> Self {
        TypeInfo { ty, function: None }
    }
}

pub type TypedNode = Node<TypeInfo>;

/// An indented one-node-per-line rendering of a typed tree.
pub fn render_typed(node: &TypedNode) -> String {
    let mut out = String::new();
    render_into(node, 0, &mut out);
    out
}

fn render_into(node: &TypedNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let ty = &node.ann.ty;
    let line = match &node.kind {
        NodeKind::Binary { op, .. } => format!("{op} : {ty}"),
        NodeKind::Call { .. } => match &node.ann.function {
            Some(function) => format!("call {function:?}"),
            None => format!("call ? : {ty}"),
        },
        NodeKind::Constant { raw: Some(raw) } => format!("{raw:?} : {ty}"),
        NodeKind::Constant { raw: None } => format!("null : {ty}"),
        NodeKind::Identifier { symbol } => format!("{} : {ty}", symbol.name()),
        NodeKind::Lambda { param, .. } => format!("{} => : {ty}", param.symbol.name()),
        NodeKind::Member { name, .. } => format!(".{name} : {ty}"),
    };
    out.push_str(&indent);
    out.push_str(&line);
    out.push('\n');
    match &node.kind {
        NodeKind::Binary { left, right, .. } => {
            render_into(left, depth + 1, out);
            render_into(right, depth + 1, out);
        }
        NodeKind::Call { args, .. } => {
            for arg in args {
                render_into(arg, depth + 1, out);
            }
        }
        NodeKind::Lambda { body, .. } => render_into(body, depth + 1, out),
        NodeKind::Member { instance, .. } => render_into(instance, depth + 1, out),
        NodeKind::Constant { .. } | NodeKind::Identifier { .. } => {}
    }
}
