//! Class hierarchy, common-superclass resolution and access patching for the
//! saber injection weaver. Nothing in this crate touches the filesystem
//! except [`logging`] and [`target::InjectionTargets::load`].

pub mod access;
pub mod class;
pub mod error;
pub mod logging;
pub mod patcher;
pub mod registry;
pub mod resolver;
pub mod target;

pub use access::AccessFlags;
pub use class::{ClassMetadata, FieldDescriptor, MethodDescriptor, OBJECT};
pub use error::{RegistryError, Result, SaberError};
pub use patcher::{PatchedClass, patch};
pub use registry::{AncestorChain, ClassRegistry, ClassSource};
pub use resolver::{CommonSuperclass, CommonSuperclassResolver, ResolutionKind};
pub use target::{InjectionTarget, InjectionTargets};
