//! Typed AST to executable expression translation.
//!
//! One [`Expr`] is emitted per node. Lambda parameters become [`ParamId`]s
//! taken from the binder's symbol id, so nested lambdas that close over an
//! outer parameter see it through the evaluation scope.

use sift_parser::ast::{BinaryOp, NodeKind};
use sift_rt::ops::{self, ArithOp, CmpOp};
use sift_rt::{EvalResult, Expr, ParamId, Value};
use sift_typeck::{PropertyResolver, Type, TypedNode};

use crate::constant::materialize;
use crate::error::CompileError;

pub(crate) struct Compiler<'a> {
    props: &'a dyn PropertyResolver,
}

impl<'a> Compiler<'a> {
    pub(crate) fn new(props: &'a dyn PropertyResolver) -> Self {
        Compiler { props }
    }

    pub(crate) fn compile(&self, node: &TypedNode) -> Result<Expr, CompileError> {
        match &node.kind {
            NodeKind::Binary { left, op, right } => {
                if op.is_logical() {
                    for operand in [left, right] {
                        if operand.ann.ty.underlying() != &Type::Bool {
                            return Err(CompileError::NonBooleanOperand {
                                op: op.symbol(),
                                ty: operand.ann.ty.clone(),
                                span: operand.span,
                            });
                        }
                    }
                }
                let left = self.compile(left)?;
                let right = self.compile(right)?;
                Ok(binary(*op, left, right))
            }

            NodeKind::Call { name, args } => {
                let Some(function) = &node.ann.function else {
                    return Err(CompileError::MissingFunction {
                        name: name.clone(),
                        span: node.span,
                    });
                };
                let args = args
                    .iter()
                    .map(|arg| self.compile(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(function.create_expression(args))
            }

            // Materialized once and captured, so equal queries compile to
            // expressions that behave identically.
            NodeKind::Constant { raw } => {
                let value = materialize(raw.as_ref(), &node.ann.ty, node.span)?;
                Ok(Expr::constant(value))
            }

            NodeKind::Identifier { symbol } => Ok(Expr::param(ParamId(symbol.id()))),

            NodeKind::Lambda { param, body } => {
                let body = self.compile(body)?;
                Ok(Expr::lambda(ParamId(param.symbol.id()), body))
            }

            NodeKind::Member { instance, name } => {
                let owner = &instance.ann.ty;
                let instance = self.compile(instance)?;
                match self.props.try_resolve_property(owner, name) {
                    Some(prop) => Ok(prop.access(instance)),
                    None => {
                        tracing::trace!(%owner, %name, "member falls back to field lookup");
                        Ok(Expr::field(instance, name.clone()))
                    }
                }
            }
        }
    }
}

/// Operands of `T` and `T?` share one runtime representation, so mixing
/// them needs no conversion step.
fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let cmp = match op {
        BinaryOp::AndAlso => return short_circuit(false, left, right),
        BinaryOp::OrElse => return short_circuit(true, left, right),
        BinaryOp::Add => return arith(ArithOp::Add, left, right),
        BinaryOp::Subtract => return arith(ArithOp::Subtract, left, right),
        BinaryOp::Multiply => return arith(ArithOp::Multiply, left, right),
        BinaryOp::Divide => return arith(ArithOp::Divide, left, right),
        BinaryOp::Modulo => return arith(ArithOp::Modulo, left, right),
        BinaryOp::Equal => CmpOp::Equal,
        BinaryOp::NotEqual => CmpOp::NotEqual,
        BinaryOp::LessThan => CmpOp::LessThan,
        BinaryOp::LessOrEqual => CmpOp::LessOrEqual,
        BinaryOp::GreaterThan => CmpOp::GreaterThan,
        BinaryOp::GreaterOrEqual => CmpOp::GreaterOrEqual,
    };
    Expr::apply(vec![left, right], move |v| ops::compare(cmp, &v[0], &v[1]))
}

fn arith(op: ArithOp, left: Expr, right: Expr) -> Expr {
    Expr::apply(vec![left, right], move |v| ops::arith(op, &v[0], &v[1]))
}

/// `&&` and `||`: the right operand is skipped once the left one equals
/// `decided`. A null operand reads as false.
fn short_circuit(decided: bool, left: Expr, right: Expr) -> Expr {
    Expr::new(move |scope| {
        if truth(&left.eval(scope)?)? == decided {
            return Ok(Value::Bool(decided));
        }
        Ok(Value::Bool(truth(&right.eval(scope)?)?))
    })
}

fn truth(value: &Value) -> EvalResult<bool> {
    match value {
        Value::Null => Ok(false),
        other => other.as_bool(),
    }
}
