//! Class metadata as seen by the weaver.
//!
//! Names are JVM internal names (`com/example/Foo`), descriptors are raw JVM
//! descriptors (`Ljava/lang/String;`, `(I)V`).

use crate::access::AccessFlags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal name of the universal root type.
pub const OBJECT: &str = "java/lang/Object";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub descriptor: String,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.descriptor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub descriptor: String,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    pub fn is_default_constructor(&self) -> bool {
        self.is_constructor() && self.descriptor == "()V"
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.descriptor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMetadata {
    pub field: FieldDescriptor,
    pub access: AccessFlags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMetadata {
    pub method: MethodDescriptor,
    pub access: AccessFlags,
}

/// Parsed shape of one class file. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMetadata {
    pub name: String,
    /// `None` only for [`OBJECT`] (and for module-info, which has no superclass).
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub access: AccessFlags,
    pub fields: Vec<FieldMetadata>,
    pub methods: Vec<MethodMetadata>,
}

impl ClassMetadata {
    /// A public class extending `java/lang/Object` with no members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            super_name: Some(OBJECT.to_string()),
            interfaces: Vec::new(),
            access: AccessFlags::PUBLIC | AccessFlags::SUPER,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Metadata for the root type itself.
    pub fn object() -> Self {
        Self {
            super_name: None,
            ..Self::new(OBJECT)
        }
    }

    pub fn with_super(mut self, super_name: impl Into<String>) -> Self {
        self.super_name = Some(super_name.into());
        self
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn with_access(mut self, access: AccessFlags) -> Self {
        self.access = access;
        self
    }

    pub fn with_field(
        mut self,
        name: impl Into<String>,
        descriptor: impl Into<String>,
        access: AccessFlags,
    ) -> Self {
        self.fields.push(FieldMetadata {
            field: FieldDescriptor::new(name, descriptor),
            access,
        });
        self
    }

    pub fn with_method(
        mut self,
        name: impl Into<String>,
        descriptor: impl Into<String>,
        access: AccessFlags,
    ) -> Self {
        self.methods.push(MethodMetadata {
            method: MethodDescriptor::new(name, descriptor),
            access,
        });
        self
    }

    pub fn is_root(&self) -> bool {
        self.name == OBJECT
    }

    pub fn find_field(&self, field: &FieldDescriptor) -> Option<&FieldMetadata> {
        self.fields.iter().find(|f| &f.field == field)
    }

    pub fn find_method(&self, method: &MethodDescriptor) -> Option<&MethodMetadata> {
        self.methods.iter().find(|m| &m.method == method)
    }
}

/// Converts `com.example.Foo` or `com/example/Foo` to the internal form.
pub fn internal_name(name: &str) -> String {
    name.replace('.', "/")
}
