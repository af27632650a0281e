//! The inference context.
//!
//! Owns one inference pass's slots: a union-find table of `SameAs` classes
//! (ena), the constraints recorded on each slot, and the `ArgOf`/`ResultOf`
//! edges of lambdas. Nothing here outlives the pass.

use ena::unify::InPlaceUnificationTable;
use rustc_hash::{FxHashMap, FxHashSet};
use sift_common::span::Span;

use crate::constraints::{merge, TypeConstraints, TypeVariable};
use crate::error::TypeError;
use crate::properties::PropertyResolver;
use crate::ty::{Slot, Type};

pub(crate) struct InferCtx<'p> {
    /// `SameAs` classes.
    classes: InPlaceUnificationTable<Slot>,
    /// What each slot itself has been told. Indexed by `Slot.0`.
    vars: Vec<TypeVariable>,
    spans: Vec<Span>,
    /// Lambda slot to its parameter slot.
    arg_of: FxHashMap<Slot, Slot>,
    /// Lambda slot to its body slot.
    result_of: FxHashMap<Slot, Slot>,
    pub(crate) props: &'p dyn PropertyResolver,
}

impl<'p> InferCtx<'p> {
    pub(crate) fn new(props: &'p dyn PropertyResolver) -> Self {
        InferCtx {
            classes: InPlaceUnificationTable::new(),
            vars: Vec::new(),
            spans: Vec::new(),
            arg_of: FxHashMap::default(),
            result_of: FxHashMap::default(),
            props,
        }
    }

    // ── Slots ───────────────────────────────────────────────────────────

    /// A fresh slot with an empty type variable.
    pub(crate) fn fresh_slot(&mut self, span: Span) -> Slot {
        let slot = self.classes.new_key(());
        self.vars.push(TypeVariable::empty());
        self.spans.push(span);
        slot
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.vars.len()
    }

    pub(crate) fn span(&self, slot: Slot) -> Span {
        self.spans[slot.index()]
    }

    /// The slot's own variable, without anything from its class.
    pub(crate) fn own(&self, slot: Slot) -> &TypeVariable {
        &self.vars[slot.index()]
    }

    // ── Recording constraints ───────────────────────────────────────────

    /// Merge `var` into the slot's own variable.
    pub(crate) fn constrain(&mut self, slot: Slot, var: TypeVariable) -> Result<(), TypeError> {
        let merged = merge(self.own(slot).clone(), var, self.span(slot), self.props)?;
        tracing::trace!(%slot, var = %merged, "constrain");
        self.vars[slot.index()] = merged;
        Ok(())
    }

    pub(crate) fn bind(&mut self, slot: Slot, ty: Type) -> Result<(), TypeError> {
        self.constrain(slot, TypeVariable::Resolved(ty))
    }

    pub(crate) fn require(&mut self, slot: Slot, bag: TypeConstraints) -> Result<(), TypeError> {
        self.constrain(slot, TypeVariable::Unresolved(bag))
    }

    pub(crate) fn same_as(&mut self, a: Slot, b: Slot) {
        self.classes.union(a, b);
    }

    pub(crate) fn link_lambda(&mut self, lambda: Slot, param: Slot, body: Slot) {
        self.arg_of.insert(lambda, param);
        self.result_of.insert(lambda, body);
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Every slot sharing a `SameAs` class with `slot`, in slot order.
    pub(crate) fn class_of(&mut self, slot: Slot) -> Vec<Slot> {
        let root = self.classes.find(slot);
        (0..self.slot_count() as u32)
            .map(Slot)
            .filter(|other| self.classes.find(*other) == root)
            .collect()
    }

    /// Parameter and body slots of a lambda in the class of `slot`.
    pub(crate) fn lambda_edges(&mut self, slot: Slot) -> Option<(Slot, Slot)> {
        self.class_of(slot).into_iter().find_map(|member| {
            Some((*self.arg_of.get(&member)?, *self.result_of.get(&member)?))
        })
    }

    /// Everything known about the slot's type: its class's variables
    /// merged together, plus the types of members whose owners are already
    /// concrete.
    pub(crate) fn constraints(&mut self, slot: Slot) -> Result<TypeVariable, TypeError> {
        self.collect(slot, &mut FxHashSet::default())
    }

    fn collect(
        &mut self,
        slot: Slot,
        visiting: &mut FxHashSet<Slot>,
    ) -> Result<TypeVariable, TypeError> {
        let span = self.span(slot);
        let mut acc = TypeVariable::empty();
        for member in self.class_of(slot) {
            acc = merge(acc, self.own(member).clone(), span, self.props)?;
        }

        let TypeVariable::Unresolved(bag) = &acc else {
            return Ok(acc);
        };
        let root = self.classes.find(slot);
        if bag.member_of.is_empty() || !visiting.insert(root) {
            return Ok(acc);
        }
        for (owner, name) in bag.member_of.clone() {
            let TypeVariable::Resolved(owner_ty) = self.collect(owner, visiting)? else {
                continue;
            };
            if let Some(prop) = self.props.try_resolve_property(&owner_ty, &name) {
                acc = merge(acc, TypeVariable::Resolved(prop.ty), span, self.props)?;
            }
        }
        visiting.remove(&root);
        Ok(acc)
    }
}
