//! Injection target descriptors.
//!
//! Produced by an external annotation scanner and consumed by the patcher.
//! The on-disk form is a JSON array:
//!
//! ```json
//! [{ "class": "com/example/Foo",
//!    "fields": [{ "name": "bar", "descriptor": "Lcom/example/Bar;" }],
//!    "methods": [{ "name": "setBaz", "descriptor": "(Lcom/example/Baz;)V" }] }]
//! ```

use crate::class::{FieldDescriptor, MethodDescriptor, internal_name};
use crate::error::{Result, SaberError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionTarget {
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(default)]
    pub fields: BTreeSet<FieldDescriptor>,
    #[serde(default)]
    pub methods: BTreeSet<MethodDescriptor>,
}

impl InjectionTarget {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        self.fields.insert(FieldDescriptor::new(name, descriptor));
        self
    }

    pub fn with_method(mut self, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        self.methods.insert(MethodDescriptor::new(name, descriptor));
        self
    }

    pub fn is_injectable_field(&self, field: &FieldDescriptor) -> bool {
        self.fields.contains(field)
    }

    pub fn is_injectable_method(&self, method: &MethodDescriptor) -> bool {
        self.methods.contains(method)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.methods.is_empty()
    }
}

/// All injection targets of one weaving run, keyed by class internal name.
#[derive(Debug, Clone, Default)]
pub struct InjectionTargets {
    by_class: HashMap<String, InjectionTarget>,
}

impl InjectionTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a target, merging member sets if the class is already present.
    pub fn insert(&mut self, mut target: InjectionTarget) {
        target.class_name = internal_name(&target.class_name);
        match self.by_class.get_mut(&target.class_name) {
            Some(existing) => {
                existing.fields.extend(target.fields);
                existing.methods.extend(target.methods);
            }
            None => {
                self.by_class.insert(target.class_name.clone(), target);
            }
        }
    }

    pub fn get(&self, class_name: &str) -> Option<&InjectionTarget> {
        self.by_class.get(class_name)
    }

    pub fn len(&self) -> usize {
        self.by_class.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_class.is_empty()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let targets: Vec<InjectionTarget> = serde_json::from_str(json)?;
        Ok(targets.into_iter().collect())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SaberError::Config(format!("cannot read targets {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }
}

impl FromIterator<InjectionTarget> for InjectionTargets {
    fn from_iter<I: IntoIterator<Item = InjectionTarget>>(iter: I) -> Self {
        let mut targets = Self::new();
        for target in iter {
            targets.insert(target);
        }
        targets
    }
}
