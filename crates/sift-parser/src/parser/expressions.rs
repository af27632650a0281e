//! Pratt expression parser for Sift.
//!
//! Operator precedence is driven by a binding power table. Lambdas bind
//! loosest and extend as far right as possible; member access binds tighter
//! than every infix operator.

use std::sync::Arc;

use sift_common::span::Span;
use sift_common::token::TokenKind;

use crate::ast::{BinaryOp, Node, NodeKind, Param, Symbol};
use crate::error::ParseError;

use super::Parser;

// ── Binding Power Tables ───────────────────────────────────────────────

/// Returns `(left_bp, right_bp)` and the operator for infix tokens.
///
/// Every level is left-associative, comparisons included: `a < b < c`
/// parses as `(a < b) < c` and is left to the type checker.
fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8, BinaryOp)> {
    let entry = match kind {
        TokenKind::OrElse => (1, 2, BinaryOp::OrElse),
        TokenKind::AndAlso => (3, 4, BinaryOp::AndAlso),

        TokenKind::Equal => (5, 6, BinaryOp::Equal),
        TokenKind::NotEqual => (5, 6, BinaryOp::NotEqual),
        TokenKind::LessThan => (5, 6, BinaryOp::LessThan),
        TokenKind::LessOrEqual => (5, 6, BinaryOp::LessOrEqual),
        TokenKind::GreaterThan => (5, 6, BinaryOp::GreaterThan),
        TokenKind::GreaterOrEqual => (5, 6, BinaryOp::GreaterOrEqual),

        TokenKind::Plus => (7, 8, BinaryOp::Add),
        TokenKind::Minus => (7, 8, BinaryOp::Subtract),

        TokenKind::Star => (9, 10, BinaryOp::Multiply),
        TokenKind::Slash => (9, 10, BinaryOp::Divide),
        TokenKind::Percent => (9, 10, BinaryOp::Modulo),

        _ => return None,
    };
    Some(entry)
}

// ── Expression Entry Point ─────────────────────────────────────────────

/// Parse a complete input: one expression followed by end of input.
pub(crate) fn root(p: &mut Parser) -> Result<Node, ParseError> {
    let node = expr_bp(p, 0)?;
    if !p.at(TokenKind::Eof)? {
        return Err(p.unexpected("end of input")?);
    }
    Ok(node)
}

/// The core Pratt loop: parse an atom, then fold postfix member accesses
/// and infix operators whose binding power is at least `min_bp`.
///
/// Each fold deepens the tree by one, so each one counts against the
/// nesting limit until the loop returns.
fn expr_bp(p: &mut Parser, min_bp: u8) -> Result<Node, ParseError> {
    let span = p.nth(0)?.span;
    p.enter(span)?;
    let mut levels = 1;
    let result = fold(p, min_bp, &mut levels);
    for _ in 0..levels {
        p.leave();
    }
    result
}

fn fold(p: &mut Parser, min_bp: u8, levels: &mut usize) -> Result<Node, ParseError> {
    let mut lhs = lhs(p)?;

    loop {
        let current = p.nth(0)?;
        let (kind, span) = (current.kind, current.span);

        // ── Postfix: member access ──
        if kind == TokenKind::Dot {
            *levels += 1;
            p.enter(span)?;
            p.bump()?; // .
            let name = p.expect(TokenKind::Identifier)?;
            let span = lhs.span.merge(name.span);
            lhs = Node::new(
                NodeKind::Member {
                    instance: Arc::new(lhs),
                    name: Arc::from(name.text()),
                },
                (),
                span,
            );
            continue;
        }

        // ── Infix operators ──
        if let Some((l_bp, r_bp, op)) = infix_binding_power(kind) {
            if l_bp < min_bp {
                break;
            }
            *levels += 1;
            p.enter(span)?;
            p.bump()?; // operator
            let rhs = expr_bp(p, r_bp)?;
            let span = lhs.span.merge(rhs.span);
            lhs = Node::new(
                NodeKind::Binary {
                    left: Arc::new(lhs),
                    op,
                    right: Arc::new(rhs),
                },
                (),
                span,
            );
            continue;
        }

        break;
    }

    Ok(lhs)
}

// ── Atoms ──────────────────────────────────────────────────────────────

/// Parse the left-hand side of an expression.
fn lhs(p: &mut Parser) -> Result<Node, ParseError> {
    match p.current()? {
        TokenKind::Number | TokenKind::String => {
            let token = p.bump()?;
            let raw = Arc::from(token.text());
            Ok(Node::new(NodeKind::Constant { raw: Some(raw) }, (), token.span))
        }

        TokenKind::Identifier => identifier_like(p),

        // Grouping. Parentheses leave no trace in the tree.
        TokenKind::LParen => {
            p.bump()?; // (
            let inner = expr_bp(p, 0)?;
            p.expect(TokenKind::RParen)?;
            Ok(inner)
        }

        _ => Err(p.unexpected("an expression")?),
    }
}

/// Every form that starts with a name: lambdas, calls, the literal
/// keywords and references to a lambda parameter.
fn identifier_like(p: &mut Parser) -> Result<Node, ParseError> {
    let next = p.nth(1)?.kind;
    let token = p.bump()?;
    let name = token.text();

    if next == TokenKind::Arrow && name != "null" {
        return lambda(p, name.to_string(), token.span);
    }

    if next == TokenKind::LParen {
        return call(p, name.to_string(), token.span);
    }

    if name == "null" {
        return Ok(Node::new(NodeKind::Constant { raw: None }, (), token.span));
    }

    if let Some(symbol) = p.lookup_binder(name) {
        let symbol = symbol.clone();
        return Ok(Node::new(NodeKind::Identifier { symbol }, (), token.span));
    }

    // Boolean keywords only when no parameter shadows them.
    if name == "true" || name == "false" {
        let raw = Some(Arc::from(name));
        return Ok(Node::new(NodeKind::Constant { raw }, (), token.span));
    }

    Err(ParseError::UnboundIdentifier {
        name: name.to_string(),
        span: token.span,
    })
}

/// `param => body`. The parameter name token is already consumed.
fn lambda(p: &mut Parser, name: String, param_span: Span) -> Result<Node, ParseError> {
    p.expect(TokenKind::Arrow)?;

    let symbol = Symbol::fresh(&name);
    p.push_binder(symbol.clone());
    let body = expr_bp(p, 0);
    p.pop_binder();
    let body = body?;

    let span = param_span.merge(body.span);
    Ok(Node::new(
        NodeKind::Lambda {
            param: Param {
                symbol,
                ann: (),
                span: param_span,
            },
            body: Arc::new(body),
        },
        (),
        span,
    ))
}

/// `name(arg, ...)`. The name token is already consumed.
fn call(p: &mut Parser, name: String, name_span: Span) -> Result<Node, ParseError> {
    p.expect(TokenKind::LParen)?;

    let mut args = Vec::new();
    if !p.at(TokenKind::RParen)? {
        loop {
            args.push(expr_bp(p, 0)?);
            if p.eat(TokenKind::Comma)?.is_none() {
                break;
            }
        }
    }
    let close = p.expect(TokenKind::RParen)?;

    Ok(Node::new(
        NodeKind::Call {
            name: Arc::from(name),
            args,
        },
        (),
        name_span.merge(close.span),
    ))
}
