//! # Layout Resolvers
//!
//! A row stores only the [`SchemaId`] of its root schema and of every nested
//! UDT. A [`LayoutResolver`] maps those ids back to layouts.
//!
//! | Resolver | Source of layouts |
//! |----------|-------------------|
//! | [`LayoutResolverSimple`] | a caller-supplied function, e.g. a static table |
//! | [`LayoutResolverNamespace`] | compiles the schemas of a namespace on first use and caches them |
//!
//! Resolvers are shared between rows as `Arc<dyn LayoutResolver>`; the namespace
//! resolver's cache is guarded by a `parking_lot::RwLock` so lookups from
//! several threads only contend on a cache miss.

use std::sync::Arc;

use eyre::{eyre, Result};
use hashbrown::HashMap;
use log::{debug, warn};
use parking_lot::RwLock;

use super::compiler::LayoutCompiler;
use super::layout::Layout;
use super::type_argument::SchemaId;
use crate::schemas::Namespace;

pub trait LayoutResolver: Send + Sync {
    fn resolve(&self, schema_id: SchemaId) -> Result<Arc<Layout>>;
}

type ResolveFn = dyn Fn(SchemaId) -> Option<Arc<Layout>> + Send + Sync;

pub struct LayoutResolverSimple {
    resolver: Box<ResolveFn>,
}

impl LayoutResolverSimple {
    pub fn new<F>(resolver: F) -> Self
    where
        F: Fn(SchemaId) -> Option<Arc<Layout>> + Send + Sync + 'static,
    {
        Self {
            resolver: Box::new(resolver),
        }
    }

    /// Resolves from a fixed set of layouts, keyed by their schema ids.
    pub fn from_layouts(layouts: impl IntoIterator<Item = Arc<Layout>>) -> Self {
        let table: HashMap<SchemaId, Arc<Layout>> = layouts
            .into_iter()
            .map(|layout| (layout.schema_id(), layout))
            .collect();
        Self::new(move |id| table.get(&id).cloned())
    }
}

impl LayoutResolver for LayoutResolverSimple {
    fn resolve(&self, schema_id: SchemaId) -> Result<Arc<Layout>> {
        (self.resolver)(schema_id).ok_or_else(|| {
            warn!("no layout registered for schema {}", schema_id);
            eyre!("failed to resolve schema {}", schema_id)
        })
    }
}

pub struct LayoutResolverNamespace {
    namespace: Namespace,
    parent: Option<Arc<dyn LayoutResolver>>,
    cache: RwLock<HashMap<SchemaId, Arc<Layout>>>,
}

impl LayoutResolverNamespace {
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            parent: None,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Falls back to `parent` for ids not defined in this namespace.
    pub fn with_parent(mut self, parent: Arc<dyn LayoutResolver>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }
}

impl LayoutResolver for LayoutResolverNamespace {
    fn resolve(&self, schema_id: SchemaId) -> Result<Arc<Layout>> {
        if let Some(layout) = self.cache.read().get(&schema_id) {
            return Ok(Arc::clone(layout));
        }

        if let Some(schema) = self.namespace.find_schema(schema_id) {
            let layout = Arc::new(LayoutCompiler::compile(&self.namespace, schema)?);
            debug!(
                "resolved schema {} ('{}') in namespace '{}'",
                schema_id, schema.name, self.namespace.name
            );
            let mut cache = self.cache.write();
            let cached = cache.entry(schema_id).or_insert(layout);
            return Ok(Arc::clone(cached));
        }

        match &self.parent {
            Some(parent) => {
                debug!(
                    "schema {} not in namespace '{}', asking parent resolver",
                    schema_id, self.namespace.name
                );
                parent.resolve(schema_id)
            }
            None => {
                warn!(
                    "schema {} not found in namespace '{}'",
                    schema_id, self.namespace.name
                );
                Err(eyre!(
                    "failed to resolve schema {} in namespace '{}'",
                    schema_id,
                    self.namespace.name
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::{PropertyType, Schema, TypeKind};

    fn namespace() -> Namespace {
        Namespace::new("test").with_schema(
            Schema::new("Person", SchemaId(1))
                .with_property("name", PropertyType::sparse(TypeKind::Utf8)),
        )
    }

    #[test]
    fn namespace_resolver_caches_layouts() {
        let resolver = LayoutResolverNamespace::new(namespace());
        let a = resolver.resolve(SchemaId(1)).unwrap();
        let b = resolver.resolve(SchemaId(1)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.name(), "Person");
    }

    #[test]
    fn unknown_ids_fall_through_to_parent() {
        let other = Namespace::new("other").with_schema(Schema::new("Other", SchemaId(9)));
        let parent: Arc<dyn LayoutResolver> = Arc::new(LayoutResolverNamespace::new(other));
        let resolver = LayoutResolverNamespace::new(namespace()).with_parent(parent);

        assert_eq!(resolver.resolve(SchemaId(9)).unwrap().name(), "Other");
        assert!(resolver.resolve(SchemaId(10)).is_err());
    }

    #[test]
    fn simple_resolver_uses_supplied_table() {
        let layout = Arc::new(
            LayoutCompiler::compile(&namespace(), &namespace().schemas[0]).unwrap(),
        );
        let resolver = LayoutResolverSimple::from_layouts([layout]);
        assert!(resolver.resolve(SchemaId(1)).is_ok());
        assert!(resolver.resolve(SchemaId(2)).is_err());
    }
}
