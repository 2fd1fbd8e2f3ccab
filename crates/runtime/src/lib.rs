//! Runtime side of saber: a parent/child injector hierarchy with
//! qualifier-aware binding keys and per-owner singleton caching.

pub mod error;
pub mod injector;
pub mod key;
pub mod module;

pub use error::{InjectorError, Result};
pub use injector::{Injector, InjectorTree, Instance};
pub use key::{BindingKey, Key};
pub use module::{Binding, Module, Scope};
