//! Read-only class hierarchy index for one weaving run.
//!
//! Combines the classes being processed, the auxiliary classpath and the boot
//! classpath. Lookups consult the layers in that order so that in-flight
//! classes shadow whatever the jars provide.

use crate::class::{ClassMetadata, OBJECT};
use crate::error::RegistryError;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

/// Where a class was found. Declaration order is lookup priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassSource {
    Processed,
    Classpath,
    BootClasspath,
}

impl ClassSource {
    pub const ALL: [ClassSource; 3] = [
        ClassSource::Processed,
        ClassSource::Classpath,
        ClassSource::BootClasspath,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ClassSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassSource::Processed => f.write_str("processed"),
            ClassSource::Classpath => f.write_str("classpath"),
            ClassSource::BootClasspath => f.write_str("bootclasspath"),
        }
    }
}

pub struct ClassRegistry {
    layers: [HashMap<String, Arc<ClassMetadata>>; 3],
}

#[derive(Default)]
pub struct ClassRegistryBuilder {
    layers: [HashMap<String, Arc<ClassMetadata>>; 3],
}

impl ClassRegistryBuilder {
    /// Adds one class to a layer. Within a layer the first definition wins,
    /// matching classpath semantics.
    pub fn add(&mut self, source: ClassSource, class: ClassMetadata) {
        let layer = &mut self.layers[source.index()];
        if layer.contains_key(&class.name) {
            tracing::debug!("Duplicate class {} in {} ignored", class.name, source);
            return;
        }
        layer.insert(class.name.clone(), Arc::new(class));
    }

    pub fn extend(&mut self, source: ClassSource, classes: impl IntoIterator<Item = ClassMetadata>) {
        for class in classes {
            self.add(source, class);
        }
    }

    pub fn processed(mut self, classes: impl IntoIterator<Item = ClassMetadata>) -> Self {
        self.extend(ClassSource::Processed, classes);
        self
    }

    pub fn classpath(mut self, classes: impl IntoIterator<Item = ClassMetadata>) -> Self {
        self.extend(ClassSource::Classpath, classes);
        self
    }

    pub fn boot_classpath(mut self, classes: impl IntoIterator<Item = ClassMetadata>) -> Self {
        self.extend(ClassSource::BootClasspath, classes);
        self
    }

    pub fn build(self) -> ClassRegistry {
        let registry = ClassRegistry {
            layers: self.layers,
        };
        tracing::debug!(
            "Class registry built: {} processed, {} classpath, {} boot",
            registry.layers[0].len(),
            registry.layers[1].len(),
            registry.layers[2].len()
        );
        registry
    }
}

/// Superclass chain of one class, from the class itself up to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorChain {
    names: Vec<String>,
    complete: bool,
}

impl AncestorChain {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// `false` when a missing class or a cycle cut the walk short and the
    /// root was appended in its place.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl ClassRegistry {
    pub fn builder() -> ClassRegistryBuilder {
        ClassRegistryBuilder::default()
    }

    pub fn metadata_of(&self, name: &str) -> Result<Arc<ClassMetadata>, RegistryError> {
        self.layers
            .iter()
            .find_map(|layer| layer.get(name))
            .cloned()
            .ok_or_else(|| RegistryError::ClassNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layers.iter().any(|layer| layer.contains_key(name))
    }

    /// The layer that satisfies a lookup of `name`, if any.
    pub fn layer_of(&self, name: &str) -> Option<ClassSource> {
        ClassSource::ALL
            .into_iter()
            .find(|source| self.layers[source.index()].contains_key(name))
    }

    /// Number of distinct class names across all layers.
    pub fn len(&self) -> usize {
        let mut names = HashSet::new();
        for layer in &self.layers {
            names.extend(layer.keys().map(String::as_str));
        }
        names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(HashMap::is_empty)
    }

    /// Names of the classes in one layer, unordered.
    pub fn classes_in(&self, source: ClassSource) -> impl Iterator<Item = &str> {
        self.layers[source.index()].keys().map(String::as_str)
    }

    pub fn ancestor_chain(&self, name: &str) -> AncestorChain {
        let mut names = vec![name.to_string()];
        let mut visited: HashSet<String> = HashSet::from([name.to_string()]);
        let mut complete = true;
        let mut current = name.to_string();

        while current != OBJECT {
            let class = match self.metadata_of(&current) {
                Ok(class) => class,
                Err(e) => {
                    tracing::warn!("Ancestor chain of {} cut short: {}", name, e);
                    complete = false;
                    names.push(OBJECT.to_string());
                    break;
                }
            };

            let Some(super_name) = class.super_name.as_ref() else {
                names.push(OBJECT.to_string());
                break;
            };

            if !visited.insert(super_name.clone()) {
                tracing::warn!(
                    "Inheritance cycle through {} while walking ancestors of {}",
                    super_name,
                    name
                );
                complete = false;
                names.push(OBJECT.to_string());
                break;
            }

            names.push(super_name.clone());
            current = super_name.clone();
        }

        AncestorChain { names, complete }
    }

    /// Whether a value of type `subtype` can be stored in a `supertype` slot,
    /// following superclasses and interfaces. Unknown classes contribute no
    /// supertypes beyond the root.
    pub fn is_assignable_from(&self, supertype: &str, subtype: &str) -> bool {
        if supertype == subtype || supertype == OBJECT {
            return true;
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([subtype.to_string()]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if current == supertype {
                return true;
            }
            let Ok(class) = self.metadata_of(&current) else {
                continue;
            };
            if let Some(super_name) = &class.super_name {
                queue.push_back(super_name.clone());
            }
            queue.extend(class.interfaces.iter().cloned());
        }

        false
    }
}
