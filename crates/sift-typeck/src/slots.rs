//! Slot assignment.
//!
//! One top-down walk gives every node a fresh slot. Identifiers do not get
//! their own: every occurrence of a bound parameter shares the slot of the
//! parameter itself.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use sift_parser::ast::{Node, NodeKind, Param, Symbol};

use crate::ty::Slot;
use crate::unify::InferCtx;

pub(crate) fn assign(node: &Node, ctx: &mut InferCtx<'_>) -> Node<Slot> {
    annotate(node, ctx, &mut FxHashMap::default())
}

fn annotate(node: &Node, ctx: &mut InferCtx<'_>, env: &mut FxHashMap<Symbol, Slot>) -> Node<Slot> {
    if let NodeKind::Identifier { symbol } = &node.kind {
        // A free identifier gets a slot on first sight, shared afterwards.
        let slot = *env
            .entry(symbol.clone())
            .or_insert_with(|| ctx.fresh_slot(node.span));
        let kind = NodeKind::Identifier {
            symbol: symbol.clone(),
        };
        return Node::new(kind, slot, node.span);
    }

    let slot = ctx.fresh_slot(node.span);
    let kind = match &node.kind {
        NodeKind::Binary { left, op, right } => NodeKind::Binary {
            left: Arc::new(annotate(left, ctx, env)),
            op: *op,
            right: Arc::new(annotate(right, ctx, env)),
        },
        NodeKind::Call { name, args } => NodeKind::Call {
            name: name.clone(),
            args: args.iter().map(|arg| annotate(arg, ctx, env)).collect(),
        },
        NodeKind::Constant { raw } => NodeKind::Constant { raw: raw.clone() },
        NodeKind::Lambda { param, body } => {
            let param_slot = ctx.fresh_slot(param.span);
            env.insert(param.symbol.clone(), param_slot);
            NodeKind::Lambda {
                param: Param {
                    symbol: param.symbol.clone(),
                    ann: param_slot,
                    span: param.span,
                },
                body: Arc::new(annotate(body, ctx, env)),
            }
        }
        NodeKind::Member { instance, name } => NodeKind::Member {
            instance: Arc::new(annotate(instance, ctx, env)),
            name: name.clone(),
        },
        NodeKind::Identifier { symbol } => NodeKind::Identifier {
            symbol: symbol.clone(),
        },
    };
    Node::new(kind, slot, node.span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::DefaultPropertyResolver;
    use sift_parser::parse;

    fn slots(node: &Node<Slot>, out: &mut Vec<String>) {
        match &node.kind {
            NodeKind::Binary { left, op, right } => {
                out.push(format!("{op}{}", node.ann));
                slots(left, out);
                slots(right, out);
            }
            NodeKind::Call { name, args } => {
                out.push(format!("{name}{}", node.ann));
                args.iter().for_each(|arg| slots(arg, out));
            }
            NodeKind::Constant { raw } => {
                out.push(format!("{}{}", raw.as_deref().unwrap_or("null"), node.ann));
            }
            NodeKind::Identifier { symbol } => out.push(format!("{}{}", symbol.name(), node.ann)),
            NodeKind::Lambda { param, body } => {
                out.push(format!("=>{} {}{}", node.ann, param.symbol.name(), param.ann));
                slots(body, out);
            }
            NodeKind::Member { instance, name } => {
                out.push(format!(".{name}{}", node.ann));
                slots(instance, out);
            }
        }
    }

    #[test]
    fn pre_order_with_shared_binder_slots() {
        let node = parse("o => o.a + o.b > length(o.c)").unwrap();
        let mut ctx = InferCtx::new(&DefaultPropertyResolver);
        let slotted = assign(&node, &mut ctx);
        let mut out = Vec::new();
        slots(&slotted, &mut out);
        insta::assert_snapshot!(out.join(" "), @"=>?0 o?1 >?2 +?3 .a?4 o?1 .b?5 o?1 length?6 .c?7 o?1");
        assert_eq!(ctx.slot_count(), 8);
    }

    #[test]
    fn shadowing_binders_get_distinct_slots() {
        let node = parse("x => any(x.items, x => x.ok)").unwrap();
        let mut ctx = InferCtx::new(&DefaultPropertyResolver);
        let slotted = assign(&node, &mut ctx);
        let mut out = Vec::new();
        slots(&slotted, &mut out);
        insta::assert_snapshot!(out.join(" "), @"=>?0 x?1 any?2 .items?3 x?1 =>?4 x?5 .ok?6 x?5");
    }
}
