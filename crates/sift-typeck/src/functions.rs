//! The function registry.
//!
//! Calls are resolved by name against an ordered list of pluggable
//! [`FunctionResolver`]s. A resolver sees the constraints inference has
//! gathered for the call's result and each argument, and either declines or
//! returns a [`FunctionDescriptor`] with exact types.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use sift_common::span::Span;
use sift_rt::Expr;

use crate::constraints::TypeVariable;
use crate::error::TypeError;
use crate::ty::Type;

type Builder = Arc<dyn Fn(Vec<Expr>) -> Expr + Send + Sync>;

/// A resolved, concretely typed function.
#[derive(Clone)]
pub struct FunctionDescriptor {
    pub name: Arc<str>,
    pub result: Type,
    pub args: Vec<Type>,
    build: Builder,
}

impl FunctionDescriptor {
    pub fn new(
        name: &str,
        result: Type,
        args: Vec<Type>,
        build: impl Fn(Vec<Expr>) -> Expr + Send + Sync + 'static,
    ) -> Self {
        FunctionDescriptor {
            name: Arc::from(name),
            result,
            args,
            build: Arc::new(build),
        }
    }

    /// Build the call expression from the compiled arguments.
    pub fn create_expression(&self, args: Vec<Expr>) -> Expr {
        (self.build)(args)
    }
}

impl fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ") -> {}", self.result)
    }
}

/// A source of functions.
pub trait FunctionResolver: Send + Sync {
    /// Match `name` against what is known about the call's result and
    /// arguments. `None` declines the call.
    fn resolve(
        &self,
        name: &str,
        result: &TypeVariable,
        args: &[TypeVariable],
    ) -> Option<FunctionDescriptor>;
}

/// What to do when more than one resolver matches a call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmbiguityPolicy {
    /// The first resolver in registration order wins.
    #[default]
    FirstMatch,
    /// Every resolver is asked; two or more matches is an error.
    Reject,
}

type CacheKey = (String, Option<Type>, Vec<Type>);

/// An ordered composite of resolvers with a shared descriptor cache.
pub struct FunctionRegistry {
    resolvers: Vec<Arc<dyn FunctionResolver>>,
    policy: AmbiguityPolicy,
    cache: RwLock<FxHashMap<CacheKey, Option<Arc<FunctionDescriptor>>>>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        FunctionRegistry::new()
    }
}

impl FunctionRegistry {
    /// A registry with no resolvers.
    pub fn new() -> Self {
        FunctionRegistry {
            resolvers: Vec::new(),
            policy: AmbiguityPolicy::default(),
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// A registry with the built-in string, collection, array and date
    /// functions, in that order.
    pub fn with_builtins() -> Self {
        let mut registry = FunctionRegistry::new();
        crate::builtins::register_builtins(&mut registry);
        registry
    }

    pub fn with_policy(mut self, policy: AmbiguityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> AmbiguityPolicy {
        self.policy
    }

    /// Append a resolver. Later resolvers are consulted after earlier ones.
    pub fn register(&mut self, resolver: impl FunctionResolver + 'static) {
        self.resolvers.push(Arc::new(resolver));
        self.cache.get_mut().clear();
    }

    /// Resolve a call, consulting the cache when every argument (and the
    /// result, if constrained at all) is already concrete.
    pub fn resolve(
        &self,
        name: &str,
        result: &TypeVariable,
        args: &[TypeVariable],
        span: Span,
    ) -> Result<Option<Arc<FunctionDescriptor>>, TypeError> {
        let key = cache_key(name, result, args);
        if let Some(key) = &key {
            if let Some(hit) = self.cache.read().get(key) {
                tracing::trace!(name, "function cache hit");
                return Ok(hit.clone());
            }
        }

        let resolved = self.resolve_uncached(name, result, args, span)?.map(Arc::new);
        if let Some(key) = key {
            self.cache.write().insert(key, resolved.clone());
        }
        Ok(resolved)
    }

    fn resolve_uncached(
        &self,
        name: &str,
        result: &TypeVariable,
        args: &[TypeVariable],
        span: Span,
    ) -> Result<Option<FunctionDescriptor>, TypeError> {
        let mut matches = self
            .resolvers
            .iter()
            .filter_map(|resolver| resolver.resolve(name, result, args))
            .filter(|desc| desc.args.len() == args.len());
        match self.policy {
            AmbiguityPolicy::FirstMatch => Ok(matches.next()),
            AmbiguityPolicy::Reject => {
                let all: Vec<FunctionDescriptor> = matches.collect();
                if all.len() > 1 {
                    return Err(TypeError::AmbiguousCall {
                        name: Arc::from(name),
                        candidates: all.len(),
                        span,
                    });
                }
                Ok(all.into_iter().next())
            }
        }
    }
}

fn cache_key(name: &str, result: &TypeVariable, args: &[TypeVariable]) -> Option<CacheKey> {
    let result = match result {
        TypeVariable::Resolved(ty) => Some(ty.clone()),
        unresolved if unresolved.is_unconstrained() => None,
        TypeVariable::Unresolved(_) => return None,
    };
    let args = args
        .iter()
        .map(|arg| arg.resolved().cloned())
        .collect::<Option<Vec<_>>>()?;
    Some((name.to_lowercase(), result, args))
}
