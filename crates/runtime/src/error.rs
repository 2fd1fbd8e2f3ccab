use crate::key::BindingKey;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InjectorError {
    /// A module declared a key that is already visible at the node being built.
    #[error("binding for {key} declared by module '{module}' is already bound")]
    Configuration { key: BindingKey, module: String },
    #[error("no binding for {key}")]
    MissingBinding { key: BindingKey },
    #[error("dependency cycle while resolving {key}")]
    /// Only cycles re-entered on the resolving thread are detected. A cycle
    /// split across threads (one thread initializing X and needing Y while
    /// another initializes Y and needs X) blocks both on the singleton slots.
    DependencyCycle { key: BindingKey },
    #[error("binding for {key} produced a value that is not a {expected}")]
    TypeMismatch {
        key: BindingKey,
        expected: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, InjectorError>;
