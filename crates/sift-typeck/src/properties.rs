//! Property resolution.
//!
//! Inference asks a [`PropertyResolver`] what `instance.name` means for a
//! concrete instance type; the compiler then asks the returned
//! [`Property`] to build the access expression.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use sift_rt::{collections, datetime, string, Expr};

use crate::ty::Type;

type Getter = Arc<dyn Fn(Expr) -> Expr + Send + Sync>;

/// A resolved member of some type.
#[derive(Clone)]
pub struct Property {
    pub name: Arc<str>,
    pub ty: Type,
    getter: Option<Getter>,
}

impl Property {
    /// A stored record field, read by name.
    pub fn field(name: &str, ty: Type) -> Self {
        Property {
            name: Arc::from(name),
            ty,
            getter: None,
        }
    }

    /// A property computed from the instance by `getter`.
    pub fn computed(
        name: &str,
        ty: Type,
        getter: impl Fn(Expr) -> Expr + Send + Sync + 'static,
    ) -> Self {
        Property {
            name: Arc::from(name),
            ty,
            getter: Some(Arc::new(getter)),
        }
    }

    /// Build the expression reading this property from `instance`.
    pub fn access(&self, instance: Expr) -> Expr {
        match &self.getter {
            Some(getter) => getter(instance),
            None => Expr::field(instance, self.name.clone()),
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("computed", &self.getter.is_some())
            .finish()
    }
}

/// Looks up members of concrete types.
pub trait PropertyResolver: Send + Sync {
    fn try_resolve_property(&self, ty: &Type, name: &str) -> Option<Property>;
}

/// Record fields plus the built-in properties of strings, collections and
/// dates. Nullable value types expose the members of their underlying type.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPropertyResolver;

impl PropertyResolver for DefaultPropertyResolver {
    fn try_resolve_property(&self, ty: &Type, name: &str) -> Option<Property> {
        let lower = name.to_lowercase();
        match (ty.underlying(), lower.as_str()) {
            (Type::Record(record), _) => record
                .find_field(name)
                .map(|field| Property::field(&field.name, field.ty.clone())),
            (Type::String, "length") => Some(unary("length", Type::Int32, string::length)),
            (Type::Array(_) | Type::Sequence(_), "count") => {
                Some(unary("count", Type::Int32, collections::count))
            }
            (Type::DateTimeOffset, "year") => Some(unary("year", Type::Int32, datetime::year)),
            (Type::DateTimeOffset, "month") => Some(unary("month", Type::Int32, datetime::month)),
            (Type::DateTimeOffset, "day") => Some(unary("day", Type::Int32, datetime::day)),
            (Type::DateTimeOffset, "ticks") => Some(unary("ticks", Type::Int64, datetime::ticks)),
            _ => None,
        }
    }
}

fn unary(name: &str, ty: Type, op: fn(&sift_rt::Value) -> sift_rt::EvalResult) -> Property {
    Property::computed(name, ty, move |instance| {
        Expr::apply(vec![instance], move |values| op(&values[0]))
    })
}

/// Memoizes another resolver by `(type, lowercased name)`. Safe to share
/// between threads inferring different queries.
pub struct CachingPropertyResolver<R> {
    inner: R,
    cache: RwLock<FxHashMap<(Type, String), Option<Property>>>,
}

impl<R: PropertyResolver> CachingPropertyResolver<R> {
    pub fn new(inner: R) -> Self {
        CachingPropertyResolver {
            inner,
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

impl<R: PropertyResolver> PropertyResolver for CachingPropertyResolver<R> {
    fn try_resolve_property(&self, ty: &Type, name: &str) -> Option<Property> {
        let key = (ty.clone(), name.to_lowercase());
        if let Some(hit) = self.cache.read().get(&key) {
            return hit.clone();
        }
        let resolved = self.inner.try_resolve_property(ty, name);
        self.cache.write().insert(key, resolved.clone());
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::RecordType;
    use sift_rt::{RecordValue, Scope, Value};

    #[test]
    fn record_fields_resolve_case_insensitively() {
        let order = Type::record(RecordType::new("Order").with_field("Num", Type::Int32));
        let prop = DefaultPropertyResolver
            .try_resolve_property(&order, "num")
            .unwrap();
        assert_eq!(&*prop.name, "Num");
        assert_eq!(prop.ty, Type::Int32);

        let instance = Expr::constant(Value::Record(RecordValue::new(
            "Order",
            [("Num", Value::Int32(5))],
        )));
        let read = prop.access(instance).eval(&Scope::empty()).unwrap();
        assert_eq!(read, Value::Int32(5));
    }

    #[test]
    fn builtin_properties() {
        let resolver = DefaultPropertyResolver;
        let len = resolver.try_resolve_property(&Type::String, "Length").unwrap();
        assert_eq!(len.ty, Type::Int32);
        let n = len
            .access(Expr::constant(Value::string("héllo")))
            .eval(&Scope::empty())
            .unwrap();
        assert_eq!(n, Value::Int32(5));

        let ticks = resolver
            .try_resolve_property(&Type::nullable(Type::DateTimeOffset), "ticks")
            .unwrap();
        assert_eq!(ticks.ty, Type::Int64);
        assert!(resolver.try_resolve_property(&Type::Int32, "length").is_none());
    }

    #[test]
    fn caching_resolver_remembers_misses_too() {
        let resolver = CachingPropertyResolver::new(DefaultPropertyResolver);
        assert!(resolver.try_resolve_property(&Type::Int32, "x").is_none());
        assert!(resolver.try_resolve_property(&Type::String, "LENGTH").is_some());
        assert!(resolver.try_resolve_property(&Type::String, "length").is_some());
        assert_eq!(resolver.len(), 2);
    }
}
