//! Access widening for injection targets.
//!
//! Generated injectors live in other classes of the same package and assign
//! fields / call setters after construction. That requires the target class
//! to be public, and the injectable members to be neither private, protected
//! nor final.

use crate::access::AccessFlags;
use crate::class::{ClassMetadata, FieldDescriptor, MethodDescriptor};
use crate::target::InjectionTarget;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchedMember {
    Class,
    Field(FieldDescriptor),
    Method(MethodDescriptor),
}

impl fmt::Display for PatchedMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchedMember::Class => f.write_str("<class>"),
            PatchedMember::Field(field) => write!(f, "field {field}"),
            PatchedMember::Method(method) => write!(f, "method {method}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessChange {
    pub member: PatchedMember,
    pub before: AccessFlags,
    pub after: AccessFlags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchedClass {
    pub class: ClassMetadata,
    /// Any emitted flag differs from its input.
    pub dirty: bool,
    changes: Vec<AccessChange>,
    missing: Vec<PatchedMember>,
}

impl PatchedClass {
    pub fn changes(&self) -> &[AccessChange] {
        &self.changes
    }

    /// Target members the class does not declare.
    pub fn missing_members(&self) -> &[PatchedMember] {
        &self.missing
    }
}

/// Widens `class` for `target`. A target that designates no members leaves
/// the class untouched, including its own access.
pub fn patch(class: &ClassMetadata, target: &InjectionTarget) -> PatchedClass {
    if target.is_empty() {
        return PatchedClass {
            class: class.clone(),
            dirty: false,
            changes: Vec::new(),
            missing: Vec::new(),
        };
    }

    let mut changes = Vec::new();
    let mut record = |member: PatchedMember, before: AccessFlags, after: AccessFlags| {
        if before != after {
            changes.push(AccessChange {
                member,
                before,
                after,
            });
        }
        after
    };

    let access = record(
        PatchedMember::Class,
        class.access,
        class.access.widened_to_public(),
    );

    let fields = class
        .fields
        .iter()
        .map(|field| {
            let mut field = field.clone();
            if target.is_injectable_field(&field.field) {
                field.access = record(
                    PatchedMember::Field(field.field.clone()),
                    field.access,
                    field.access.opened_for_injection(),
                );
            }
            field
        })
        .collect();

    let methods = class
        .methods
        .iter()
        .map(|method| {
            let mut method = method.clone();
            if target.is_injectable_method(&method.method) {
                method.access = record(
                    PatchedMember::Method(method.method.clone()),
                    method.access,
                    method.access.opened_for_injection(),
                );
            }
            method
        })
        .collect();

    let mut missing = Vec::new();
    for field in &target.fields {
        if class.find_field(field).is_none() {
            tracing::warn!("Injectable field {} not declared by {}", field, class.name);
            missing.push(PatchedMember::Field(field.clone()));
        }
    }
    for method in &target.methods {
        if class.find_method(method).is_none() {
            tracing::warn!("Injectable method {} not declared by {}", method, class.name);
            missing.push(PatchedMember::Method(method.clone()));
        }
    }

    PatchedClass {
        class: ClassMetadata {
            access,
            fields,
            methods,
            ..class.clone()
        },
        dirty: !changes.is_empty(),
        changes,
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ClassMetadata {
        ClassMetadata::new("app/Service")
            .with_access(AccessFlags::SUPER)
            .with_field("repo", "Lapp/Repo;", AccessFlags::PRIVATE | AccessFlags::FINAL)
            .with_field("cache", "Lapp/Cache;", AccessFlags::PRIVATE)
            .with_method("<init>", "()V", AccessFlags::PUBLIC)
            .with_method(
                "setClock",
                "(Lapp/Clock;)V",
                AccessFlags::PROTECTED | AccessFlags::FINAL,
            )
    }

    #[test]
    fn test_widens_targets_only() {
        let target = InjectionTarget::new("app/Service")
            .with_field("repo", "Lapp/Repo;")
            .with_method("setClock", "(Lapp/Clock;)V");
        let patched = patch(&service(), &target);

        assert!(patched.dirty);
        assert_eq!(patched.class.access, AccessFlags::PUBLIC | AccessFlags::SUPER);
        assert_eq!(patched.class.fields[0].access, AccessFlags::empty());
        assert_eq!(patched.class.fields[1].access, AccessFlags::PRIVATE);
        assert_eq!(patched.class.methods[1].access, AccessFlags::empty());
        assert_eq!(patched.changes().len(), 3);
        assert!(patched.missing_members().is_empty());
    }

    #[test]
    fn test_public_class_without_targets_is_clean() {
        let class = service().with_access(AccessFlags::PUBLIC | AccessFlags::SUPER);
        let patched = patch(&class, &InjectionTarget::new("app/Service"));
        assert!(!patched.dirty);
        assert_eq!(patched.class, class);
    }

    #[test]
    fn test_package_private_class_without_targets_is_clean() {
        let class = ClassMetadata::new("app/Hidden")
            .with_access(AccessFlags::SUPER)
            .with_field("x", "I", AccessFlags::PRIVATE);
        let patched = patch(&class, &InjectionTarget::new("app/Hidden"));

        assert!(!patched.dirty);
        assert!(patched.changes().is_empty());
        assert_eq!(patched.class.access, AccessFlags::SUPER);
        assert_eq!(patched.class, class);
    }

    #[test]
    fn test_single_private_field_is_dirty() {
        let class = ClassMetadata::new("app/Holder").with_field(
            "value",
            "Ljava/lang/String;",
            AccessFlags::PRIVATE,
        );
        let target = InjectionTarget::new("app/Holder").with_field("value", "Ljava/lang/String;");
        let patched = patch(&class, &target);
        assert!(patched.dirty);
        assert_eq!(
            patched.changes()[0].member,
            PatchedMember::Field(FieldDescriptor::new("value", "Ljava/lang/String;"))
        );
    }

    #[test]
    fn test_patch_is_idempotent() {
        let target = InjectionTarget::new("app/Service")
            .with_field("repo", "Lapp/Repo;")
            .with_field("cache", "Lapp/Cache;")
            .with_method("setClock", "(Lapp/Clock;)V");
        let first = patch(&service(), &target);
        assert!(first.dirty);

        let second = patch(&first.class, &target);
        assert!(!second.dirty);
        assert_eq!(second.class, first.class);
    }

    #[test]
    fn test_descriptor_must_match_exactly() {
        let target = InjectionTarget::new("app/Service").with_field("repo", "Lapp/OtherRepo;");
        let class = service().with_access(AccessFlags::PUBLIC);
        let patched = patch(&class, &target);
        assert!(!patched.dirty);
        assert_eq!(patched.missing_members().len(), 1);
    }
}
