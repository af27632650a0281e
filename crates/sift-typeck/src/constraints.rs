//! Type variables and structural constraint bags.
//!
//! A slot's knowledge is a [`TypeVariable`]: either a concrete type or a
//! [`TypeConstraints`] bag describing what the type must support. Two
//! variables for the same slot (or for slots joined by `SameAs`) combine
//! through [`merge`], which either refines the knowledge or fails.

use std::fmt;
use std::sync::Arc;

use sift_common::span::Span;
use sift_parser::ast::names_eq;

use crate::error::{ConstraintReason, TypeError};
use crate::properties::PropertyResolver;
use crate::ty::{Slot, Type};

/// Structural requirements on a not-yet-known type.
///
/// The three flags are tri-state: `None` means unconstrained, `Some(true)`
/// requires the capability and `Some(false)` forbids it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeConstraints {
    /// Member names the type must expose, compared case-insensitively.
    pub members: Vec<Arc<str>>,
    /// Interface types the type must implement.
    pub interfaces: Vec<Type>,
    /// A type the eventual type must be related to.
    pub base: Option<Type>,
    pub numeric: Option<bool>,
    pub nullable: Option<bool>,
    pub lambda: Option<bool>,
    /// "This type is member `name` of whatever `owner` turns out to be."
    pub member_of: Vec<(Slot, Arc<str>)>,
}

impl TypeConstraints {
    pub fn is_empty(&self) -> bool {
        *self == TypeConstraints::default()
    }

    pub fn numeric() -> Self {
        TypeConstraints {
            numeric: Some(true),
            ..Default::default()
        }
    }

    pub fn nullable() -> Self {
        TypeConstraints {
            nullable: Some(true),
            ..Default::default()
        }
    }

    pub fn lambda() -> Self {
        TypeConstraints {
            lambda: Some(true),
            ..Default::default()
        }
    }

    pub fn member(name: &str) -> Self {
        TypeConstraints {
            members: vec![Arc::from(name)],
            ..Default::default()
        }
    }

    pub fn member_of(owner: Slot, name: &str) -> Self {
        TypeConstraints {
            member_of: vec![(owner, Arc::from(name))],
            ..Default::default()
        }
    }

    /// Check a concrete type against every requirement except `member_of`,
    /// which is verified once owners are resolved.
    pub fn validate(
        &self,
        ty: &Type,
        props: &dyn PropertyResolver,
    ) -> Result<(), ConstraintReason> {
        for name in &self.members {
            if props.try_resolve_property(ty, name).is_none() {
                return Err(ConstraintReason::MissingMember { name: name.clone() });
            }
        }
        for interface in &self.interfaces {
            if !ty.is_assignable_to(interface) {
                return Err(ConstraintReason::MissingInterface {
                    interface: interface.clone(),
                });
            }
        }
        if let Some(base) = &self.base {
            if Type::more_specific(ty, base).is_none() {
                return Err(ConstraintReason::IncompatibleBase { base: base.clone() });
            }
        }
        self.validate_flags(ty)
    }

    fn validate_flags(&self, ty: &Type) -> Result<(), ConstraintReason> {
        if flag_violated(self.numeric, ty.is_numeric()) {
            return Err(ConstraintReason::Numeric {
                expected: self.numeric == Some(true),
            });
        }
        if flag_violated(self.nullable, ty.is_nullable()) {
            return Err(ConstraintReason::Nullable {
                expected: self.nullable == Some(true),
            });
        }
        if flag_violated(self.lambda, ty.is_function()) {
            return Err(ConstraintReason::Lambda {
                expected: self.lambda == Some(true),
            });
        }
        Ok(())
    }

    /// Union two bags. Flags must agree where both are set.
    fn union(mut self, other: TypeConstraints) -> Result<Self, &'static str> {
        for name in other.members {
            if !self.members.iter().any(|m| names_eq(m, &name)) {
                self.members.push(name);
            }
        }
        for interface in other.interfaces {
            if !self.interfaces.contains(&interface) {
                self.interfaces.push(interface);
            }
        }
        self.base = match (self.base, other.base) {
            (Some(a), Some(b)) => Some(Type::more_specific(&a, &b).ok_or("base type")?),
            (a, b) => a.or(b),
        };
        self.numeric = union_flag(self.numeric, other.numeric).ok_or("numeric")?;
        self.nullable = union_flag(self.nullable, other.nullable).ok_or("nullable")?;
        self.lambda = union_flag(self.lambda, other.lambda).ok_or("lambda")?;
        for (owner, name) in other.member_of {
            if !self
                .member_of
                .iter()
                .any(|(o, n)| *o == owner && names_eq(n, &name))
            {
                self.member_of.push((owner, name));
            }
        }
        Ok(self)
    }
}

fn flag_violated(flag: Option<bool>, actual: bool) -> bool {
    matches!(flag, Some(required) if required != actual)
}

/// `Some(merged)` when the flags agree, `None` on conflict.
fn union_flag(a: Option<bool>, b: Option<bool>) -> Option<Option<bool>> {
    match (a, b) {
        (Some(x), Some(y)) if x != y => None,
        (a, b) => Some(a.or(b)),
    }
}

impl fmt::Display for TypeConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        for name in &self.members {
            parts.push(format!(".{name}"));
        }
        for interface in &self.interfaces {
            parts.push(format!(": {interface}"));
        }
        if let Some(base) = &self.base {
            parts.push(format!("~ {base}"));
        }
        for (label, flag) in [
            ("numeric", self.numeric),
            ("nullable", self.nullable),
            ("lambda", self.lambda),
        ] {
            match flag {
                Some(true) => parts.push(label.to_string()),
                Some(false) => parts.push(format!("!{label}")),
                None => {}
            }
        }
        for (owner, name) in &self.member_of {
            parts.push(format!("{owner}.{name}"));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

// ── Type variables ─────────────────────────────────────────────────────

/// What is known about one slot.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeVariable {
    Resolved(Type),
    Unresolved(TypeConstraints),
}

impl TypeVariable {
    pub fn empty() -> Self {
        TypeVariable::Unresolved(TypeConstraints::default())
    }

    pub fn resolved(&self) -> Option<&Type> {
        match self {
            TypeVariable::Resolved(ty) => Some(ty),
            TypeVariable::Unresolved(_) => None,
        }
    }

    /// Whether nothing at all is known.
    pub fn is_unconstrained(&self) -> bool {
        matches!(self, TypeVariable::Unresolved(bag) if bag.is_empty())
    }

    /// Whether a value of this variable could be passed where `declared` is
    /// expected. Member requirements are not checked here.
    pub fn admits(&self, declared: &Type) -> bool {
        match self {
            TypeVariable::Resolved(ty) => ty.is_assignable_to(declared),
            TypeVariable::Unresolved(bag) => {
                bag.validate_flags(declared).is_ok()
                    && bag.interfaces.iter().all(|i| declared.is_assignable_to(i))
                    && bag
                        .base
                        .as_ref()
                        .map_or(true, |base| Type::more_specific(declared, base).is_some())
            }
        }
    }
}

impl fmt::Display for TypeVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeVariable::Resolved(ty) => write!(f, "{ty}"),
            TypeVariable::Unresolved(bag) => write!(f, "{bag}"),
        }
    }
}

/// Combine two pieces of knowledge about the same type.
///
/// - two concrete types must be related; the more specific one is kept
/// - a concrete type must satisfy the other side's constraint bag
/// - two bags are unioned
pub fn merge(
    a: TypeVariable,
    b: TypeVariable,
    span: Span,
    props: &dyn PropertyResolver,
) -> Result<TypeVariable, TypeError> {
    match (a, b) {
        (TypeVariable::Resolved(x), TypeVariable::Resolved(y)) => Type::more_specific(&x, &y)
            .map(TypeVariable::Resolved)
            .ok_or(TypeError::IncompatibleTypes {
                expected: x,
                found: y,
                span,
            }),
        (TypeVariable::Resolved(ty), TypeVariable::Unresolved(bag))
        | (TypeVariable::Unresolved(bag), TypeVariable::Resolved(ty)) => {
            match bag.validate(&ty, props) {
                Ok(()) => Ok(TypeVariable::Resolved(ty)),
                Err(reason) => Err(TypeError::TypeConstraintMismatch { ty, reason, span }),
            }
        }
        (TypeVariable::Unresolved(x), TypeVariable::Unresolved(y)) => x
            .union(y)
            .map(TypeVariable::Unresolved)
            .map_err(|what| TypeError::ConstraintConflict { what, span }),
    }
}
