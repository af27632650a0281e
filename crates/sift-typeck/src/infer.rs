//! Constraint-based type inference for query lambdas.
//!
//! Inference runs in four passes over one [`InferCtx`]:
//!
//! 1. every node gets a slot ([`crate::slots`]);
//! 2. every slot starts with an empty type variable;
//! 3. constraints are collected, seeded by binding the root parameter to
//!    the root type; calls that cannot be resolved yet are retried until a
//!    fixpoint;
//! 4. every slot is instantiated to a concrete type, falling back to an
//!    ordered list of defaults for slots that are still open.
//!
//! Deferred member accesses are checked once all owners are concrete.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use sift_common::span::Span;
use sift_parser::ast::{Node, NodeKind, Param};

use crate::constraints::{TypeConstraints, TypeVariable};
use crate::error::{ConstraintReason, TypeError};
use crate::functions::{FunctionDescriptor, FunctionRegistry};
use crate::properties::PropertyResolver;
use crate::slots;
use crate::ty::{Slot, Type};
use crate::typed::{TypeInfo, TypedNode};
use crate::unify::InferCtx;

/// Infer the type of every node of `node`, whose root lambda's parameter
/// has type `root`.
#[tracing::instrument(level = "debug", skip_all, fields(root = %root))]
pub fn infer(
    node: &Node,
    root: &Type,
    registry: &FunctionRegistry,
    props: &dyn PropertyResolver,
) -> Result<TypedNode, TypeError> {
    let mut ctx = InferCtx::new(props);
    let slotted = slots::assign(node, &mut ctx);

    let mut collector = Collector {
        ctx: &mut ctx,
        registry,
        calls: FxHashMap::default(),
        pending: Vec::new(),
        links: Vec::new(),
    };
    if let NodeKind::Lambda { param, .. } = &slotted.kind {
        collector.ctx.bind(param.ann, root.clone())?;
    }
    collector.visit(&slotted)?;
    collector.settle_pending()?;
    let Collector { calls, links, .. } = collector;

    let mut instantiator = Instantiator {
        ctx: &mut ctx,
        types: Vec::new(),
        in_progress: FxHashSet::default(),
    };
    let types = instantiator.instantiate_all()?;
    check_member_links(&links, &types, props)?;

    tracing::debug!(slots = types.len(), calls = calls.len(), "inferred");
    Ok(build_typed(&slotted, &types, &calls))
}

// ── Pass 3: constraint collection ──────────────────────────────────────

/// A member access whose instance type was unknown when it was visited.
struct MemberLink {
    owner: Slot,
    name: Arc<str>,
    member: Slot,
    span: Span,
}

struct Collector<'a, 'p, 'n> {
    ctx: &'a mut InferCtx<'p>,
    registry: &'a FunctionRegistry,
    calls: FxHashMap<Slot, Arc<FunctionDescriptor>>,
    /// Calls no resolver matched yet.
    pending: Vec<&'n Node<Slot>>,
    links: Vec<MemberLink>,
}

impl<'n> Collector<'_, '_, 'n> {
    fn visit(&mut self, node: &'n Node<Slot>) -> Result<(), TypeError> {
        let slot = node.ann;
        match &node.kind {
            NodeKind::Binary { left, op, right } => {
                if op.is_comparison() || op.is_logical() {
                    self.ctx.bind(slot, Type::Bool)?;
                } else {
                    for operand in [slot, left.ann, right.ann] {
                        self.ctx.require(operand, TypeConstraints::numeric())?;
                    }
                    self.ctx.same_as(slot, left.ann);
                }
                self.ctx.same_as(left.ann, right.ann);
                self.visit(left)?;
                self.visit(right)
            }
            NodeKind::Call { args, .. } => {
                for arg in args {
                    self.visit(arg)?;
                }
                if !self.try_call(node)? {
                    tracing::trace!(%slot, "call deferred");
                    self.pending.push(node);
                }
                Ok(())
            }
            NodeKind::Constant { raw: None } => {
                self.ctx.require(slot, TypeConstraints::nullable())
            }
            NodeKind::Constant { .. } | NodeKind::Identifier { .. } => Ok(()),
            NodeKind::Lambda { param, body } => {
                self.visit(body)?;
                self.ctx.require(slot, TypeConstraints::lambda())?;
                self.ctx.link_lambda(slot, param.ann, body.ann);
                Ok(())
            }
            NodeKind::Member { instance, name } => {
                self.visit(instance)?;
                self.member(node, instance, name)
            }
        }
    }

    fn member(
        &mut self,
        node: &Node<Slot>,
        instance: &Node<Slot>,
        name: &Arc<str>,
    ) -> Result<(), TypeError> {
        match self.ctx.constraints(instance.ann)? {
            TypeVariable::Resolved(ty) => match self.ctx.props.try_resolve_property(&ty, name) {
                Some(prop) => self.ctx.bind(node.ann, prop.ty),
                None => Err(TypeError::TypeConstraintMismatch {
                    ty,
                    reason: ConstraintReason::MissingMember { name: name.clone() },
                    span: node.span,
                }),
            },
            TypeVariable::Unresolved(_) => {
                self.ctx.require(instance.ann, TypeConstraints::member(name))?;
                self.ctx
                    .require(node.ann, TypeConstraints::member_of(instance.ann, name))?;
                self.links.push(MemberLink {
                    owner: instance.ann,
                    name: name.clone(),
                    member: node.ann,
                    span: node.span,
                });
                Ok(())
            }
        }
    }

    /// Try to resolve a call against what is known now. `Ok(false)` means
    /// no resolver matched yet.
    fn try_call(&mut self, node: &Node<Slot>) -> Result<bool, TypeError> {
        let NodeKind::Call { name, args } = &node.kind else {
            return Ok(true);
        };
        let result = self.ctx.constraints(node.ann)?;
        let arg_vars = args
            .iter()
            .map(|arg| self.ctx.constraints(arg.ann))
            .collect::<Result<Vec<_>, _>>()?;
        let Some(function) = self.registry.resolve(name, &result, &arg_vars, node.span)? else {
            return Ok(false);
        };
        tracing::trace!(slot = %node.ann, ?function, "call resolved");

        self.ctx.bind(node.ann, function.result.clone())?;
        for (index, (arg, declared)) in args.iter().zip(&function.args).enumerate() {
            if let Type::Function(param_ty, result_ty) = declared {
                let NodeKind::Lambda { param, body } = &arg.kind else {
                    return Err(TypeError::LambdaArgumentExpected {
                        function: function.name.clone(),
                        index,
                        span: arg.span,
                    });
                };
                self.ctx.bind(param.ann, (**param_ty).clone())?;
                self.ctx.bind(body.ann, (**result_ty).clone())?;
            }
            self.ctx.bind(arg.ann, declared.clone())?;
        }
        self.calls.insert(node.ann, function);
        Ok(true)
    }

    /// Retry deferred calls until none makes progress.
    fn settle_pending(&mut self) -> Result<(), TypeError> {
        while !self.pending.is_empty() {
            let before = self.pending.len();
            let mut still = Vec::new();
            for node in std::mem::take(&mut self.pending) {
                if !self.try_call(node)? {
                    still.push(node);
                }
            }
            self.pending = still;
            if self.pending.len() == before {
                break;
            }
        }

        let Some(node) = self.pending.iter().copied().min_by_key(|node| node.span.start) else {
            return Ok(());
        };
        let NodeKind::Call { name, args } = &node.kind else {
            return Ok(());
        };
        let rendered = args
            .iter()
            .map(|arg| self.ctx.constraints(arg.ann).map(|var| var.to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        Err(TypeError::UnresolvedCall {
            name: name.clone(),
            args: rendered.join(", "),
            span: node.span,
        })
    }
}

// ── Pass 4: instantiation ──────────────────────────────────────────────

struct Instantiator<'a, 'p> {
    ctx: &'a mut InferCtx<'p>,
    /// Memoized results, indexed by `Slot.0`.
    types: Vec<Option<Type>>,
    in_progress: FxHashSet<Slot>,
}

impl Instantiator<'_, '_> {
    fn instantiate_all(&mut self) -> Result<Vec<Type>, TypeError> {
        let count = self.ctx.slot_count();
        self.types = vec![None; count];
        (0..count as u32)
            .map(|i| self.instantiate(Slot(i)))
            .collect()
    }

    fn instantiate(&mut self, slot: Slot) -> Result<Type, TypeError> {
        if let Some(ty) = &self.types[slot.index()] {
            return Ok(ty.clone());
        }
        if !self.in_progress.insert(slot) {
            return Err(TypeError::InfiniteType {
                span: self.ctx.span(slot),
            });
        }
        let ty = self.compute(slot)?;
        self.in_progress.remove(&slot);
        tracing::trace!(%slot, %ty, "instantiated");
        self.types[slot.index()] = Some(ty.clone());
        Ok(ty)
    }

    fn compute(&mut self, slot: Slot) -> Result<Type, TypeError> {
        // Merging the whole class surfaces conflicts even for slots that
        // are concrete on their own.
        let merged = self.ctx.constraints(slot)?;
        if let Some(ty) = self.ctx.own(slot).resolved() {
            return Ok(ty.clone());
        }
        let bag = match merged {
            TypeVariable::Resolved(ty) => return Ok(ty),
            TypeVariable::Unresolved(bag) => bag,
        };
        let ty = self.default_for(slot, &bag)?;
        match bag.validate(&ty, self.ctx.props) {
            Ok(()) => Ok(ty),
            Err(reason) => Err(TypeError::TypeConstraintMismatch {
                ty,
                reason,
                span: self.ctx.span(slot),
            }),
        }
    }

    /// The fallback order for a slot nothing has pinned down. Reordering
    /// these changes which programs type-check.
    fn default_for(&mut self, slot: Slot, bag: &TypeConstraints) -> Result<Type, TypeError> {
        let span = self.ctx.span(slot);
        if bag.lambda == Some(true) {
            let Some((param, body)) = self.ctx.lambda_edges(slot) else {
                return Err(TypeError::IncompleteLambda { span });
            };
            return Ok(Type::function(
                self.instantiate(param)?,
                self.instantiate(body)?,
            ));
        }
        if let Some(base) = &bag.base {
            return Ok(base.clone());
        }
        if let Some((first_owner, first_name)) = bag.member_of.first() {
            return self.member_type(bag, *first_owner, first_name, span);
        }
        if let [interface] = bag.interfaces.as_slice() {
            return Ok(interface.clone());
        }
        if bag.numeric == Some(true) && bag.nullable != Some(true) {
            return Ok(Type::Int32);
        }
        Ok(Type::String)
    }

    /// The most specific type among the resolvable member-of references.
    fn member_type(
        &mut self,
        bag: &TypeConstraints,
        first_owner: Slot,
        first_name: &Arc<str>,
        span: Span,
    ) -> Result<Type, TypeError> {
        let mut found: Option<Type> = None;
        for (owner, name) in &bag.member_of {
            let owner_ty = self.instantiate(*owner)?;
            let Some(prop) = self.ctx.props.try_resolve_property(&owner_ty, name) else {
                continue;
            };
            found = Some(match found {
                None => prop.ty,
                Some(prev) => Type::more_specific(&prev, &prop.ty).ok_or(
                    TypeError::IncompatibleTypes {
                        expected: prev.clone(),
                        found: prop.ty.clone(),
                        span,
                    },
                )?,
            });
        }
        match found {
            Some(ty) => Ok(ty),
            None => Err(TypeError::TypeConstraintMismatch {
                ty: self.instantiate(first_owner)?,
                reason: ConstraintReason::MissingMember {
                    name: first_name.clone(),
                },
                span,
            }),
        }
    }
}

fn check_member_links(
    links: &[MemberLink],
    types: &[Type],
    props: &dyn PropertyResolver,
) -> Result<(), TypeError> {
    for link in links {
        let owner = &types[link.owner.index()];
        let member = &types[link.member.index()];
        let Some(prop) = props.try_resolve_property(owner, &link.name) else {
            return Err(TypeError::TypeConstraintMismatch {
                ty: owner.clone(),
                reason: ConstraintReason::MissingMember {
                    name: link.name.clone(),
                },
                span: link.span,
            });
        };
        if !prop.ty.is_assignable_to(member) {
            return Err(TypeError::IncompatibleTypes {
                expected: member.clone(),
                found: prop.ty,
                span: link.span,
            });
        }
    }
    Ok(())
}

// ── Typed tree ─────────────────────────────────────────────────────────

fn build_typed(
    node: &Node<Slot>,
    types: &[Type],
    calls: &FxHashMap<Slot, Arc<FunctionDescriptor>>,
) -> TypedNode {
    let info = |slot: Slot| TypeInfo {
        ty: types[slot.index()].clone(),
        function: calls.get(&slot).cloned(),
    };
    let kind = match &node.kind {
        NodeKind::Binary { left, op, right } => NodeKind::Binary {
            left: Arc::new(build_typed(left, types, calls)),
            op: *op,
            right: Arc::new(build_typed(right, types, calls)),
        },
        NodeKind::Call { name, args } => NodeKind::Call {
            name: name.clone(),
            args: args.iter().map(|arg| build_typed(arg, types, calls)).collect(),
        },
        NodeKind::Constant { raw } => NodeKind::Constant { raw: raw.clone() },
        NodeKind::Identifier { symbol } => NodeKind::Identifier {
            symbol: symbol.clone(),
        },
        NodeKind::Lambda { param, body } => NodeKind::Lambda {
            param: Param {
                symbol: param.symbol.clone(),
                ann: info(param.ann),
                span: param.span,
            },
            body: Arc::new(build_typed(body, types, calls)),
        },
        NodeKind::Member { instance, name } => NodeKind::Member {
            instance: Arc::new(build_typed(instance, types, calls)),
            name: name.clone(),
        },
    };
    Node::new(kind, info(node.ann), node.span)
}
