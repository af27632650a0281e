//! The end-to-end pipeline: text to parsed query, typed tree, compiled
//! callable and result.

use sift_codegen::{compile_query, CompiledQuery};
use sift_parser::{parse_lambda, Node};
use sift_rt::Value;
use sift_typeck::{
    infer, CachingPropertyResolver, DefaultPropertyResolver, FunctionRegistry, FunctionResolver,
    Type, TypedNode,
};

use crate::cache::{CacheStats, QueryCache};
use crate::config::SiftConfig;
use crate::error::QueryError;

/// Parses, checks and compiles queries with one function registry and one
/// set of caches. Shareable across threads.
pub struct Engine {
    config: SiftConfig,
    registry: FunctionRegistry,
    props: CachingPropertyResolver<DefaultPropertyResolver>,
    cache: Option<QueryCache>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(SiftConfig::default())
    }
}

impl Engine {
    pub fn new(config: SiftConfig) -> Self {
        let registry = FunctionRegistry::with_builtins().with_policy(config.functions.ambiguity);
        let cache = config
            .cache
            .enabled
            .then(|| QueryCache::new(config.cache.capacity));
        Engine {
            config,
            registry,
            props: CachingPropertyResolver::new(DefaultPropertyResolver),
            cache,
        }
    }

    pub fn config(&self) -> &SiftConfig {
        &self.config
    }

    /// Add a function resolver after the built-in ones. Compiled queries
    /// cached so far are dropped since they may resolve differently now.
    pub fn register_function(&mut self, resolver: impl FunctionResolver + 'static) {
        self.registry.register(resolver);
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Parse a query; the root must be a lambda.
    pub fn parse(&self, text: &str) -> Result<Node, QueryError> {
        self.parse_for(text, None)
    }

    /// Parse on behalf of a query checked against `root`, so a failure
    /// still names the root type.
    fn parse_for(&self, text: &str, root: Option<&Type>) -> Result<Node, QueryError> {
        parse_lambda(text, &self.config.parse_options()).map_err(|e| QueryError::new(text, root, e))
    }

    /// Canonical form of a query, the form used on the wire.
    pub fn format(&self, text: &str) -> Result<String, QueryError> {
        Ok(self.parse(text)?.to_string())
    }

    #[tracing::instrument(level = "debug", skip(self, root), fields(root = %root))]
    pub fn check(&self, text: &str, root: &Type) -> Result<TypedNode, QueryError> {
        let node = self.parse_for(text, Some(root))?;
        self.check_node(text, &node, root)
    }

    fn check_node(&self, text: &str, node: &Node, root: &Type) -> Result<TypedNode, QueryError> {
        infer(node, root, &self.registry, &self.props).map_err(|e| QueryError::new(text, Some(root), e))
    }

    #[tracing::instrument(level = "debug", skip(self, root), fields(root = %root))]
    pub fn compile(&self, text: &str, root: &Type) -> Result<CompiledQuery, QueryError> {
        let node = self.parse_for(text, Some(root))?;
        if let Some(hit) = self.cache.as_ref().and_then(|cache| cache.get(&node, root)) {
            return Ok(hit);
        }
        let typed = self.check_node(text, &node, root)?;
        let query =
            compile_query(&typed, &self.props).map_err(|e| QueryError::new(text, Some(root), e))?;
        if let Some(cache) = &self.cache {
            cache.insert(node, root.clone(), query.clone());
        }
        Ok(query)
    }

    /// Compile `text` and apply it to `input`.
    pub fn evaluate(&self, text: &str, root: &Type, input: Value) -> Result<Value, QueryError> {
        let query = self.compile(text, root)?;
        query.call(input).map_err(|e| QueryError::new(text, Some(root), e))
    }

    /// Keep the elements of `items` the predicate `text` holds for.
    pub fn filter(&self, text: &str, root: &Type, items: &[Value]) -> Result<Vec<Value>, QueryError> {
        let query = self.compile(text, root)?;
        let mut kept = Vec::new();
        for item in items {
            let holds = query
                .call(item.clone())
                .and_then(|v| v.as_bool())
                .map_err(|e| QueryError::new(text, Some(root), e))?;
            if holds {
                kept.push(item.clone());
            }
        }
        Ok(kept)
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(QueryCache::stats)
    }
}
