//! Common superclass computation without class loading.
//!
//! Bytecode writers ask for the nearest shared ancestor of two types whenever
//! two control-flow edges merge with different static types. The answer only
//! has to be a valid supertype of both inputs, so an incomplete classpath
//! degrades to `java/lang/Object` instead of failing the class.

use crate::class::OBJECT;
use crate::registry::ClassRegistry;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    /// Both chains were fully resolved and met at this class.
    Shared,
    /// A chain was cut short and the root was used as the answer.
    RootFallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonSuperclass {
    pub name: String,
    pub kind: ResolutionKind,
}

impl CommonSuperclass {
    pub fn is_fallback(&self) -> bool {
        self.kind == ResolutionKind::RootFallback
    }
}

pub struct CommonSuperclassResolver {
    registry: Arc<ClassRegistry>,
    fallbacks: AtomicUsize,
}

impl CommonSuperclassResolver {
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        Self {
            registry,
            fallbacks: AtomicUsize::new(0),
        }
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    pub fn resolve(&self, type1: &str, type2: &str) -> CommonSuperclass {
        let chain1 = self.registry.ancestor_chain(type1);
        let hierarchy: HashSet<&str> = chain1.iter().collect();
        let chain2 = self.registry.ancestor_chain(type2);

        let shared = chain2
            .iter()
            .find(|name| hierarchy.contains(name))
            .unwrap_or(OBJECT);

        if shared == OBJECT && !(chain1.is_complete() && chain2.is_complete()) {
            self.fallbacks.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                "[common_superclass]: {} & {} = NOT FOUND, using {}",
                type1,
                type2,
                OBJECT
            );
            return CommonSuperclass {
                name: OBJECT.to_string(),
                kind: ResolutionKind::RootFallback,
            };
        }

        tracing::debug!("[common_superclass]: {} & {} = {}", type1, type2, shared);
        CommonSuperclass {
            name: shared.to_string(),
            kind: ResolutionKind::Shared,
        }
    }

    pub fn common_superclass(&self, type1: &str, type2: &str) -> String {
        self.resolve(type1, type2).name
    }

    /// How many answers so far had to fall back to the root. A high count
    /// usually means the classpath handed to the weaver is incomplete.
    pub fn fallback_count(&self) -> usize {
        self.fallbacks.load(Ordering::Relaxed)
    }
}
